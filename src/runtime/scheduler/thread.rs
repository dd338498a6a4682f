use futures::channel::oneshot;
use futures::executor::block_on;
use std::iter;
use std::thread;
use std::thread::JoinHandle;

use crate::runtime::Error;
use crate::runtime::config::Config;
use crate::runtime::scheduler::Component;
use crate::runtime::scheduler::Outcome;
use crate::runtime::scheduler::Scheduler;
use crate::runtime::scheduler::StartFailure;

/// Thread-per-component scheduler
///
/// Runs every weakly connected component on its own OS thread. Optionally,
/// the threads are pinned to CPU cores round-robin.
#[derive(Clone, Debug, Default)]
pub struct ThreadScheduler;

impl ThreadScheduler {
    /// Create scheduler
    pub fn new() -> ThreadScheduler {
        ThreadScheduler
    }
}

/// Spawn a worker for `component`.
///
/// The component is sent to the thread once it exists, so it is handed back
/// if the thread cannot be created.
pub(crate) fn spawn_worker(
    n: usize,
    component: Component,
    config: &Config,
    core: Option<core_affinity::CoreId>,
) -> Result<JoinHandle<Outcome>, (Error, Component)> {
    let (tx, rx) = oneshot::channel::<Component>();

    let spawned = thread::Builder::new()
        .name(format!("sdrflow-{n}"))
        .stack_size(config.stack_size)
        .spawn(move || {
            if let Some(core) = core {
                if !core_affinity::set_for_current(core) {
                    warn!("could not pin worker to core {}", core.id);
                }
            }
            match block_on(rx) {
                Ok(component) => {
                    debug!("worker running {} blocks", component.len());
                    component.run()
                }
                Err(_) => Outcome {
                    blocks: Vec::new(),
                    error: None,
                },
            }
        });

    match spawned {
        Ok(handle) => match tx.send(component) {
            Ok(()) => Ok(handle),
            Err(component) => Err((
                Error::RuntimeError("worker thread exited before start".to_string()),
                component,
            )),
        },
        Err(e) => Err((
            Error::RuntimeError(format!("cannot spawn worker thread: {e}")),
            component,
        )),
    }
}

impl Scheduler for ThreadScheduler {
    fn run_components(
        &self,
        components: Vec<Component>,
        config: &Config,
    ) -> Result<Vec<JoinHandle<Outcome>>, StartFailure> {
        let cores = if config.pin_workers {
            core_affinity::get_core_ids().unwrap_or_default()
        } else {
            Vec::new()
        };

        let mut workers = Vec::with_capacity(components.len());
        let mut components = components.into_iter().enumerate();
        while let Some((n, component)) = components.next() {
            let core = if cores.is_empty() {
                None
            } else {
                Some(cores[n % cores.len()])
            };
            match spawn_worker(n, component, config, core) {
                Ok(w) => workers.push(w),
                Err((error, component)) => {
                    let pending = iter::once(component).chain(components.map(|(_, c)| c));
                    return Err(StartFailure::new(error, workers, pending));
                }
            }
        }
        Ok(workers)
    }
}
