//! ## Streaming Runtime
//!
//! The runtime takes a [`Flowgraph`] of [`Block`]s, validates it, allocates the
//! ring [`buffer`]s between connected ports and drives every block's
//! [`Kernel`] until all sources are exhausted or the run is stopped.
use thiserror::Error;

mod block;
mod block_meta;
pub mod buffer;
pub mod config;
mod detail;
mod endpoint;
mod flowgraph;
mod kernel;
mod logging;
mod mocker;
mod pmt;
#[allow(clippy::module_inception)]
mod runtime;
pub mod scheduler;
mod signature;
mod topology;
mod work_io;

pub use block::Block;
pub use block::BlockStats;
pub use block_meta::BlockMeta;
pub use block_meta::BlockMetaBuilder;
pub use block_meta::RelativeRate;
pub use detail::Detail;
pub use detail::StreamInput;
pub use detail::StreamOutput;
pub use endpoint::BlockId;
pub use endpoint::Edge;
pub use endpoint::Endpoint;
pub use endpoint::PortDirection;
pub use flowgraph::Flowgraph;
pub use flowgraph::FlowgraphHandle;
pub use kernel::Kernel;
pub use mocker::Mocker;
pub use pmt::Pmt;
pub use pmt::PmtConversionError;
pub use runtime::Runtime;
pub use signature::IoSignature;
pub use topology::Topology;
pub use work_io::WorkIo;

pub(crate) use flowgraph::BlockMessage;

/// Initialize logging.
///
/// Installs a `tracing` subscriber with the log level from the global
/// [`config`]. Calling it more than once has no effect.
pub fn init() {
    logging::init();
}

/// Result type of the runtime.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why a block's port usage is not acceptable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyViolation {
    /// Used ports are not contiguous starting at zero.
    MissingPort {
        /// Direction of the ports.
        direction: PortDirection,
        /// First port index without a connection.
        port: usize,
    },
    /// Fewer streams connected than the signature requires.
    TooFewStreams {
        /// Direction of the ports.
        direction: PortDirection,
        /// Required minimum.
        min: usize,
        /// Connected streams.
        connected: usize,
    },
    /// More streams connected than the signature allows.
    TooManyStreams {
        /// Direction of the ports.
        direction: PortDirection,
        /// Allowed maximum.
        max: usize,
        /// Connected streams.
        connected: usize,
    },
    /// The kernel's `check_topology` rejected the port counts.
    Rejected {
        /// Connected inputs.
        ninputs: usize,
        /// Connected outputs.
        noutputs: usize,
    },
}

impl std::fmt::Display for TopologyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologyViolation::MissingPort { direction, port } => {
                write!(f, "missing connection on {direction} port {port}")
            }
            TopologyViolation::TooFewStreams {
                direction,
                min,
                connected,
            } => write!(
                f,
                "insufficient connected {direction} ports ({min} needed, {connected} connected)"
            ),
            TopologyViolation::TooManyStreams {
                direction,
                max,
                connected,
            } => write!(
                f,
                "too many {direction} ports ({max} max, {connected} connected)"
            ),
            TopologyViolation::Rejected { ninputs, noutputs } => write!(
                f,
                "check_topology rejected {ninputs} inputs and {noutputs} outputs"
            ),
        }
    }
}

/// Runtime error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The endpoint does not refer to a block of the flowgraph.
    #[error("invalid endpoint {0}: block is not part of the flowgraph")]
    InvalidEndpoint(Endpoint),
    /// Port index exceeds what the block's signature allows.
    #[error("{block}: {direction} port {port} out of range (max {max})")]
    PortOutOfRange {
        /// Block name
        block: String,
        /// Port direction
        direction: PortDirection,
        /// Requested port
        port: usize,
        /// Maximum number of streams of the signature
        max: usize,
    },
    /// The destination endpoint already has an incoming edge.
    #[error("{block}: destination port {port} already in use")]
    DestinationInUse {
        /// Block name
        block: String,
        /// Input port
        port: usize,
    },
    /// Item sizes of the connected ports differ.
    #[error("item size mismatch: {src} ({src_size} bytes) -> {dst} ({dst_size} bytes)")]
    TypeMismatch {
        /// Source description
        src: String,
        /// Item size of the source port
        src_size: usize,
        /// Destination description
        dst: String,
        /// Item size of the destination port
        dst_size: usize,
    },
    /// No edge between the given endpoints.
    #[error("edge {0} not found")]
    EdgeNotFound(Edge),
    /// Port usage of a block is invalid.
    #[error("{block}: {violation}")]
    TopologyError {
        /// Block name
        block: String,
        /// Violation
        violation: TopologyViolation,
    },
    /// The graph contains a cycle.
    #[error("flowgraph is not a DAG: cycle through {block}")]
    CyclicGraph {
        /// Block on the cycle
        block: String,
    },
    /// The operation requires an idle runtime.
    #[error("scheduler already running")]
    SchedulerAlreadyRunning,
    /// A reader consumed more items than available.
    #[error("consume of {requested} items exceeds {available} available items")]
    ConsumeOverrun {
        /// Requested items
        requested: usize,
        /// Available items
        available: usize,
    },
    /// A writer produced more items than granted.
    #[error("produce of {requested} items exceeds {available} writable items")]
    ProduceOverrun {
        /// Requested items
        requested: usize,
        /// Writable items
        available: usize,
    },
    /// A block failed while running.
    #[error("{block}: {message}")]
    BlockError {
        /// Block name
        block: String,
        /// Error message
        message: String,
    },
    /// Block does not exist.
    #[error("block {0} does not exist")]
    InvalidBlock(BlockId),
    /// Block has no message handler with this name.
    #[error("{block}: no message handler {port}")]
    InvalidMessagePort {
        /// Block name
        block: String,
        /// Port name
        port: String,
    },
    /// The flowgraph is no longer running.
    #[error("flowgraph terminated")]
    FlowgraphTerminated,
    /// Runtime failure.
    #[error("runtime error: {0}")]
    RuntimeError(String),
}
