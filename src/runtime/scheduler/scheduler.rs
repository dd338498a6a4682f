use std::sync::atomic::Ordering;
use std::thread::JoinHandle;

use crate::runtime::Error;
use crate::runtime::config::Config;
use crate::runtime::scheduler::Component;
use crate::runtime::scheduler::Outcome;

/// Workers of a run could not be started.
///
/// Workers that did start were stopped and joined. Together, the outcomes
/// hold every block of the run, so they can be returned to the flowgraph.
#[derive(Debug)]
pub struct StartFailure {
    /// Why starting failed
    pub error: Error,
    /// Blocks of all components
    pub outcomes: Vec<Outcome>,
}

impl StartFailure {
    /// Stop and join the `started` workers and abort the components that
    /// were not handed to a worker.
    pub fn new(
        error: Error,
        started: Vec<JoinHandle<Outcome>>,
        pending: impl IntoIterator<Item = Component>,
    ) -> StartFailure {
        let pending: Vec<Component> = pending.into_iter().collect();
        for c in pending.iter() {
            c.stop.store(true, Ordering::Release);
        }

        let mut outcomes = Vec::with_capacity(started.len() + pending.len());
        for worker in started {
            match worker.join() {
                Ok(outcome) => outcomes.push(outcome),
                Err(_) => error!("worker thread panicked while aborting start"),
            }
        }
        outcomes.extend(pending.into_iter().map(Component::abort));

        StartFailure { error, outcomes }
    }
}

/// Scheduler trait
///
/// Decides how the components of a flowgraph are mapped to worker threads.
/// Every component has to be driven by exactly one thread through
/// [`Component::run`].
pub trait Scheduler: Send + 'static {
    /// Spawn the workers for the given components.
    ///
    /// If not all of them can be started, none may keep running and all
    /// blocks are handed back through the [`StartFailure`].
    fn run_components(
        &self,
        components: Vec<Component>,
        config: &Config,
    ) -> Result<Vec<JoinHandle<Outcome>>, StartFailure>;
}
