use futures::channel::mpsc::channel;
use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;

use crate::runtime;
use crate::runtime::BlockMessage;
use crate::runtime::Detail;
use crate::runtime::Error;
use crate::runtime::Flowgraph;
use crate::runtime::FlowgraphHandle;
use crate::runtime::Result;
use crate::runtime::StreamInput;
use crate::runtime::StreamOutput;
use crate::runtime::buffer::allocator;
use crate::runtime::config;
use crate::runtime::config::Config;
use crate::runtime::scheduler::BlockRun;
use crate::runtime::scheduler::Component;
use crate::runtime::scheduler::Outcome;
use crate::runtime::scheduler::Scheduler;
use crate::runtime::scheduler::ThreadScheduler;

struct Running {
    stop: Arc<AtomicBool>,
    workers: Vec<JoinHandle<Outcome>>,
    handle: FlowgraphHandle,
}

/// This is the [Runtime] that runs a [Flowgraph] to completion.
///
/// The runtime owns the flowgraph. It is either idle, in which case the
/// flowgraph can be inspected and reconnected, or running, in which case the
/// blocks are owned by the worker threads of the [Scheduler].
///
/// ```
/// use sdrflow::blocks::Head;
/// use sdrflow::blocks::NullSink;
/// use sdrflow::blocks::NullSource;
/// use sdrflow::prelude::*;
///
/// let mut fg = Flowgraph::new();
/// let src = fg.add_block(NullSource::<f32>::new());
/// let head = fg.add_block(Head::<f32>::new(1234));
/// let snk = fg.add_block(NullSink::<f32>::new());
/// connect!(fg, src > head > snk);
///
/// let mut rt = Runtime::new(fg);
/// rt.run()?;
/// assert_eq!(rt.flowgraph().block_stats(snk).map(|s| s.items_consumed), Some(1234));
/// # Ok::<(), sdrflow::runtime::Error>(())
/// ```
pub struct Runtime<S: Scheduler = ThreadScheduler> {
    flowgraph: Flowgraph,
    scheduler: S,
    config: Config,
    running: Option<Running>,
}

impl Runtime<ThreadScheduler> {
    /// Constructs a new [Runtime] using [ThreadScheduler] and the global
    /// configuration.
    pub fn new(flowgraph: Flowgraph) -> Self {
        Self::with_scheduler(flowgraph, ThreadScheduler::new())
    }
}

impl<S: Scheduler> Runtime<S> {
    /// Create a [Runtime] with a given [Scheduler]
    pub fn with_scheduler(flowgraph: Flowgraph, scheduler: S) -> Self {
        Self::with_config(flowgraph, scheduler, config::config())
    }

    /// Create a [Runtime] with a given [Scheduler] and [Config]
    ///
    /// The global configuration is not consulted for runs of this runtime.
    pub fn with_config(flowgraph: Flowgraph, scheduler: S, config: Config) -> Self {
        runtime::init();
        Runtime {
            flowgraph,
            scheduler,
            config,
            running: None,
        }
    }

    /// Start the flowgraph.
    ///
    /// Validates the topology, initializes all blocks, allocates fresh
    /// buffers and hands the weakly connected components to the scheduler.
    /// On error, the runtime stays idle and the flowgraph is unchanged.
    pub fn start(&mut self) -> Result<FlowgraphHandle> {
        if self.running.is_some() {
            return Err(Error::SchedulerAlreadyRunning);
        }

        let topology = &mut self.flowgraph.topology;
        topology.validate()?;
        let ids = topology.block_ids();
        let components = topology.partition_graph(&ids)?;

        // before allocation, so kernels can adapt their meta data
        for (i, id) in ids.iter().enumerate() {
            let res = topology
                .block_mut(*id)
                .ok_or(Error::InvalidBlock(*id))
                .and_then(|b| b.init());
            if let Err(e) = res {
                for id in ids[..i].iter() {
                    if let Some(b) = topology.block_mut(*id) {
                        if let Err(e) = b.deinit() {
                            warn!("{e}");
                        }
                    }
                }
                return Err(e);
            }
        }

        let mut buffers = match allocator::allocate(topology, self.config.buffer_size) {
            Ok(b) => b,
            Err(e) => {
                for id in ids.iter() {
                    if let Some(b) = topology.block_mut(*id) {
                        if let Err(e) = b.deinit() {
                            warn!("{e}");
                        }
                    }
                }
                return Err(e);
            }
        };

        let stop = Arc::new(AtomicBool::new(false));
        let mut inboxes = HashMap::new();
        let mut runs = Vec::with_capacity(components.len());

        for component in components {
            let mut blocks = Vec::with_capacity(component.len());
            for id in component {
                let Some(block) = topology.take_block(id) else {
                    warn!("block {id} vanished before start");
                    continue;
                };
                let io = buffers.remove(&id).unwrap_or_default();
                let history = block.history();
                let detail = Detail::new(
                    io.inputs
                        .into_iter()
                        .map(|r| StreamInput::new(r, history))
                        .collect(),
                    io.outputs.into_iter().map(StreamOutput::new).collect(),
                );
                let (tx, rx) = channel::<BlockMessage>(self.config.queue_size);
                inboxes.insert(id, tx);
                blocks.push(BlockRun {
                    id,
                    block,
                    detail,
                    inbox: rx,
                    done: false,
                });
            }
            runs.push(Component {
                blocks,
                stop: stop.clone(),
                config: self.config.clone(),
            });
        }

        debug!(
            "starting {} blocks in {} components",
            ids.len(),
            runs.len()
        );
        let workers = match self.scheduler.run_components(runs, &self.config) {
            Ok(w) => w,
            Err(failure) => {
                error!("cannot start workers: {}", failure.error);
                stop.store(true, Ordering::Release);
                for outcome in failure.outcomes {
                    for (id, block) in outcome.blocks {
                        topology.restore_block(id, block);
                    }
                }
                let lost = topology.purge_missing();
                if !lost.is_empty() {
                    warn!("blocks {lost:?} lost with their worker");
                }
                return Err(failure.error);
            }
        };
        let handle = FlowgraphHandle::new(inboxes);
        self.running = Some(Running {
            stop,
            workers,
            handle: handle.clone(),
        });
        Ok(handle)
    }

    /// Ask all workers to exit after their current block invocation.
    ///
    /// Does not wait. Has no effect if the runtime is idle.
    pub fn stop(&self) {
        if let Some(running) = self.running.as_ref() {
            debug!("stop requested");
            running.stop.store(true, Ordering::Release);
        }
    }

    /// Block until all workers have exited.
    ///
    /// Hands the blocks back to the flowgraph and returns the first fatal
    /// error of the run. Returns immediately if the runtime is idle.
    pub fn wait(&mut self) -> Result<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        let topology = &mut self.flowgraph.topology;
        let mut error = None;
        for worker in running.workers {
            match worker.join() {
                Ok(outcome) => {
                    for (id, block) in outcome.blocks {
                        topology.restore_block(id, block);
                    }
                    if let Some(e) = outcome.error {
                        error.get_or_insert(e);
                    }
                }
                Err(_) => {
                    error!("worker thread panicked");
                    error.get_or_insert(Error::RuntimeError("worker thread panicked".to_string()));
                }
            }
        }

        let lost = topology.purge_missing();
        if !lost.is_empty() {
            warn!("blocks {lost:?} lost with their worker");
        }

        debug!("flowgraph terminated");
        match error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Start the flowgraph and wait for it to terminate.
    pub fn run(&mut self) -> Result<()> {
        self.start()?;
        self.wait()
    }

    /// True between [`start`](Self::start) and [`wait`](Self::wait).
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// True if the runtime is running and all of its workers have exited.
    pub fn is_finished(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| r.workers.iter().all(|w| w.is_finished()))
    }

    /// Handle to send messages to the blocks of the current run.
    pub fn handle(&self) -> Option<FlowgraphHandle> {
        self.running.as_ref().map(|r| r.handle.clone())
    }

    /// The flowgraph.
    ///
    /// While running, the blocks are not accessible through it.
    pub fn flowgraph(&self) -> &Flowgraph {
        &self.flowgraph
    }

    /// The flowgraph for reconnection. Fails while running.
    pub fn flowgraph_mut(&mut self) -> Result<&mut Flowgraph> {
        if self.running.is_some() {
            return Err(Error::SchedulerAlreadyRunning);
        }
        Ok(&mut self.flowgraph)
    }

    /// Stop, wait and return the flowgraph.
    pub fn into_flowgraph(mut self) -> Flowgraph {
        self.stop();
        if let Err(e) = self.wait() {
            warn!("flowgraph terminated with error: {e}");
        }
        mem::take(&mut self.flowgraph)
    }

    /// The configuration used for runs.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the [`Scheduler`] that is associated with the [`Runtime`].
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}

impl<S: Scheduler> Drop for Runtime<S> {
    fn drop(&mut self) {
        if self.running.is_some() {
            self.stop();
            if let Err(e) = self.wait() {
                warn!("flowgraph terminated with error: {e}");
            }
        }
        debug!("Runtime dropped");
    }
}

impl<S: Scheduler> fmt::Debug for Runtime<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("flowgraph", &self.flowgraph)
            .field("running", &self.running.is_some())
            .finish()
    }
}
