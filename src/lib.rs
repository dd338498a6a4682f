#![warn(missing_docs)]
#![allow(clippy::new_ret_no_self)]

//! A streaming flowgraph runtime that is:
//! * **Typed**: blocks declare port signatures, connections are checked for matching item sizes.
//! * **Zero-copy**: producers and consumers share lock-free, mirrored ring buffers.
//! * **Parallel**: every weakly connected part of a flowgraph runs on its own thread.
//!
//! ## Example
//! An example flowgraph that forwards 123 zeros into a sink:
//! ```
//! use sdrflow::blocks::Head;
//! use sdrflow::blocks::NullSink;
//! use sdrflow::blocks::NullSource;
//! use sdrflow::connect;
//! use sdrflow::runtime::Error;
//! use sdrflow::runtime::Flowgraph;
//! use sdrflow::runtime::Runtime;
//!
//! fn main() -> Result<(), Error> {
//!     let mut fg = Flowgraph::new();
//!
//!     let src = fg.add_block(NullSource::<u8>::new());
//!     let head = fg.add_block(Head::<u8>::new(123));
//!     let snk = fg.add_block(NullSink::<u8>::new());
//!
//!     connect!(fg, src > head > snk);
//!
//!     Runtime::new(fg).run()?;
//!
//!     Ok(())
//! }
//! ```

/// Logging macro
#[macro_use]
pub extern crate tracing;

// re-exports
pub use anyhow;
pub use futures;
pub use num_integer;

pub mod blocks;
pub mod runtime;

/// Connect blocks of a [`Flowgraph`](runtime::Flowgraph).
///
/// Every `a > b` in a chain adds the edge from an output of `a` to an input
/// of `b`. A block without port suffix is connected at port 0, `b:1` uses
/// port 1 (as input port on the left of `>` and output port on the right of
/// it). Several chains are separated by `;`. Errors are returned with `?`.
///
/// ```
/// use sdrflow::blocks::Combine;
/// use sdrflow::blocks::NullSink;
/// use sdrflow::blocks::NullSource;
/// use sdrflow::connect;
/// use sdrflow::runtime::Flowgraph;
///
/// # fn main() -> sdrflow::runtime::Result<()> {
/// let mut fg = Flowgraph::new();
/// let a = fg.add_block(NullSource::<f32>::new());
/// let b = fg.add_block(NullSource::<f32>::new());
/// let add = fg.add_block(Combine::new(|a: &f32, b: &f32| a + b));
/// let snk = fg.add_block(NullSink::<f32>::new());
///
/// connect!(fg, a > add; b > add:1; add > snk);
/// assert_eq!(fg.edges().len(), 3);
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! connect {
    (@port) => {
        0
    };
    (@port $p:literal) => {
        $p
    };
    ($fg:expr, $($($b:ident $(: $p:literal)?)>+);+) => {
        $(
            $fg.connect(&[
                $($crate::runtime::Endpoint::new($b, $crate::connect!(@port $($p)?))),+
            ])?;
        )+
    };
}

/// Common imports
pub mod prelude {
    pub use crate::anyhow;
    pub use crate::connect;
    pub use crate::runtime::Block;
    pub use crate::runtime::BlockId;
    pub use crate::runtime::BlockMeta;
    pub use crate::runtime::BlockMetaBuilder;
    pub use crate::runtime::Detail;
    pub use crate::runtime::Error;
    pub use crate::runtime::Flowgraph;
    pub use crate::runtime::FlowgraphHandle;
    pub use crate::runtime::IoSignature;
    pub use crate::runtime::Kernel;
    pub use crate::runtime::Pmt;
    pub use crate::runtime::Runtime;
    pub use crate::runtime::WorkIo;
    pub use crate::runtime::scheduler::SingleThreadScheduler;
    pub use crate::runtime::scheduler::ThreadScheduler;
}
