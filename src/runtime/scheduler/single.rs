use std::thread::JoinHandle;

use crate::runtime::config::Config;
use crate::runtime::scheduler::Component;
use crate::runtime::scheduler::Outcome;
use crate::runtime::scheduler::Scheduler;
use crate::runtime::scheduler::StartFailure;
use crate::runtime::scheduler::thread::spawn_worker;

/// Single-threaded scheduler
///
/// Drives all components round-robin on one worker thread. Gives the same
/// results as [`ThreadScheduler`](super::ThreadScheduler) with a fully
/// deterministic invocation order.
#[derive(Clone, Debug, Default)]
pub struct SingleThreadScheduler;

impl SingleThreadScheduler {
    /// Create scheduler
    pub fn new() -> SingleThreadScheduler {
        SingleThreadScheduler
    }
}

impl Scheduler for SingleThreadScheduler {
    fn run_components(
        &self,
        components: Vec<Component>,
        config: &Config,
    ) -> Result<Vec<JoinHandle<Outcome>>, StartFailure> {
        let core = if config.pin_workers {
            core_affinity::get_core_ids().and_then(|c| c.first().copied())
        } else {
            None
        };

        match Component::merge(components) {
            Some(c) => match spawn_worker(0, c, config, core) {
                Ok(w) => Ok(vec![w]),
                Err((error, c)) => Err(StartFailure::new(error, Vec::new(), [c])),
            },
            None => Ok(Vec::new()),
        }
    }
}
