//! Schedulers
//!
//! A scheduler maps the weakly connected components of a flowgraph to worker
//! threads. Within a component, blocks are invoked in topological order,
//! over and over, until all of them are done.
mod component;
pub use component::Component;
pub use component::Outcome;
pub(crate) use component::BlockRun;

#[allow(clippy::module_inception)]
mod scheduler;
pub use scheduler::Scheduler;
pub use scheduler::StartFailure;

mod single;
pub use single::SingleThreadScheduler;

mod thread;
pub use thread::ThreadScheduler;
