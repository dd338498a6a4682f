use futures::channel::mpsc::Sender;
use futures::channel::oneshot;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::runtime::Block;
use crate::runtime::BlockId;
use crate::runtime::BlockStats;
use crate::runtime::Edge;
use crate::runtime::Endpoint;
use crate::runtime::Error;
use crate::runtime::Kernel;
use crate::runtime::Pmt;
use crate::runtime::Result;
use crate::runtime::Topology;

/// Streaming flowgraph
///
/// A set of blocks and the stream connections between them. Structural
/// errors are reported when connecting and when a
/// [`Runtime`](crate::runtime::Runtime) starts the flowgraph.
pub struct Flowgraph {
    pub(crate) topology: Topology,
}

impl Flowgraph {
    /// Creates a new [`Flowgraph`] with an empty [`Topology`]
    pub fn new() -> Flowgraph {
        Flowgraph {
            topology: Topology::new(),
        }
    }

    /// Add block
    pub fn add_block(&mut self, block: Block) -> BlockId {
        self.topology.add_block(block)
    }

    /// Remove block and its edges
    pub fn remove_block(&mut self, id: BlockId) -> Option<Block> {
        self.topology.remove_block(id)
    }

    /// Connect consecutive pairs of endpoints (see [`Topology::connect`]).
    pub fn connect(&mut self, endpoints: &[Endpoint]) -> Result<()> {
        self.topology.connect(endpoints)
    }

    /// Connect output `src` to input `dst`.
    pub fn connect_stream(
        &mut self,
        src: impl Into<Endpoint>,
        dst: impl Into<Endpoint>,
    ) -> Result<()> {
        self.topology.connect(&[src.into(), dst.into()])
    }

    /// Remove the edge `src -> dst`.
    pub fn disconnect(&mut self, src: impl Into<Endpoint>, dst: impl Into<Endpoint>) -> Result<()> {
        self.topology.disconnect(src.into(), dst.into())
    }

    /// Remove all edges.
    pub fn disconnect_all(&mut self) {
        self.topology.disconnect_all();
    }

    /// All edges
    pub fn edges(&self) -> &[Edge] {
        self.topology.edges()
    }

    /// Check port usage of all blocks.
    pub fn validate(&self) -> Result<()> {
        self.topology.validate()
    }

    /// All blocks in topological order.
    pub fn topological_sort(&self) -> Result<Vec<BlockId>> {
        self.topology.topological_sort(&self.topology.block_ids())
    }

    /// Weakly connected components, each topologically sorted.
    pub fn partition_graph(&self) -> Result<Vec<Vec<BlockId>>> {
        self.topology.partition_graph(&self.topology.block_ids())
    }

    /// The underlying graph
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Get block
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.topology.block_ref(id)
    }

    /// Get block mutably
    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.topology.block_mut(id)
    }

    /// Get id of a block by its instance name.
    pub fn block_id(&self, name: &str) -> Option<BlockId> {
        self.topology.block_id(name)
    }

    /// Try to get the kernel of a block as concrete type.
    pub fn kernel<K: Kernel + 'static>(&self, id: BlockId) -> Option<&K> {
        self.topology.block_ref(id).and_then(|b| b.kernel())
    }

    /// Try to get the kernel of a block mutably as concrete type.
    pub fn kernel_mut<K: Kernel + 'static>(&mut self, id: BlockId) -> Option<&mut K> {
        self.topology.block_mut(id).and_then(|b| b.kernel_mut())
    }

    /// Statistics of the last run of a block.
    pub fn block_stats(&self, id: BlockId) -> Option<BlockStats> {
        self.topology.block_ref(id).map(|b| b.stats())
    }
}

impl Default for Flowgraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Flowgraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flowgraph")
            .field("blocks", &self.topology.block_ids().len())
            .field("edges", &self.topology.edges().len())
            .finish()
    }
}

/// Messages to the inbox of a running block
#[derive(Debug)]
pub(crate) enum BlockMessage {
    /// Deliver to handler, discard the result
    Post {
        /// Handler name
        port: String,
        /// Value
        data: Pmt,
    },
    /// Deliver to handler and send back the result
    Call {
        /// Handler name
        port: String,
        /// Value
        data: Pmt,
        /// Result channel
        tx: oneshot::Sender<Result<Pmt>>,
    },
}

/// Handle to send messages to the blocks of a running flowgraph
///
/// Messages are delivered by the worker that drives the block, between two
/// `work()` invocations.
#[derive(Clone)]
pub struct FlowgraphHandle {
    inboxes: Arc<HashMap<BlockId, Sender<BlockMessage>>>,
}

impl FlowgraphHandle {
    pub(crate) fn new(inboxes: HashMap<BlockId, Sender<BlockMessage>>) -> FlowgraphHandle {
        FlowgraphHandle {
            inboxes: Arc::new(inboxes),
        }
    }

    fn send(&self, block: BlockId, msg: BlockMessage) -> Result<()> {
        let mut inbox = self
            .inboxes
            .get(&block)
            .ok_or(Error::InvalidBlock(block))?
            .clone();
        inbox.try_send(msg).map_err(|e| {
            if e.is_disconnected() {
                Error::FlowgraphTerminated
            } else {
                Error::RuntimeError(format!("inbox of {block} is full"))
            }
        })
    }

    /// Post a message to handler `port` of `block` without waiting.
    pub fn post(&self, block: BlockId, port: &str, data: impl Into<Pmt>) -> Result<()> {
        self.send(
            block,
            BlockMessage::Post {
                port: port.to_string(),
                data: data.into(),
            },
        )
    }

    /// Call handler `port` of `block` and wait for its result.
    pub fn call(&self, block: BlockId, port: &str, data: impl Into<Pmt>) -> Result<Pmt> {
        futures::executor::block_on(self.call_async(block, port, data))
    }

    /// Call handler `port` of `block`, resolving to its result.
    pub async fn call_async(
        &self,
        block: BlockId,
        port: &str,
        data: impl Into<Pmt>,
    ) -> Result<Pmt> {
        let (tx, rx) = oneshot::channel::<Result<Pmt>>();
        self.send(
            block,
            BlockMessage::Call {
                port: port.to_string(),
                data: data.into(),
                tx,
            },
        )?;
        rx.await.map_err(|_| Error::FlowgraphTerminated)?
    }
}

impl fmt::Debug for FlowgraphHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowgraphHandle")
            .field("blocks", &self.inboxes.len())
            .finish()
    }
}
