use crossbeam_utils::Backoff;
use futures::FutureExt;
use futures::StreamExt;
use futures::channel::mpsc::Receiver;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use crate::runtime::Block;
use crate::runtime::BlockId;
use crate::runtime::BlockMessage;
use crate::runtime::Detail;
use crate::runtime::Error;
use crate::runtime::Result;
use crate::runtime::block::WorkStatus;
use crate::runtime::config::Config;

pub(crate) struct BlockRun {
    pub(crate) id: BlockId,
    pub(crate) block: Block,
    pub(crate) detail: Detail,
    pub(crate) inbox: Receiver<BlockMessage>,
    pub(crate) done: bool,
}

impl BlockRun {
    // returns true if there was at least one message
    fn handle_messages(&mut self) -> bool {
        let mut any = false;
        while let Some(Some(msg)) = self.inbox.next().now_or_never() {
            any = true;
            match msg {
                BlockMessage::Post { port, data } => {
                    if let Err(e) = self.block.handle_message(&port, data) {
                        warn!("{}: message to {port} failed ({e})", self.block.label());
                    }
                }
                BlockMessage::Call { port, data, tx } => {
                    let _ = tx.send(self.block.handle_message(&port, data));
                }
            }
        }
        any
    }

    fn finish(&mut self) -> Result<()> {
        self.done = true;
        debug!("{} done", self.block.label());
        self.block.finish(&self.detail)
    }
}

/// Backoff of a worker that found nothing to do.
///
/// Spins and yields first, then sleeps with exponentially growing duration up
/// to a maximum.
struct Idle {
    backoff: Backoff,
    sleep: Duration,
    max: Duration,
}

impl Idle {
    fn new(max_us: u64) -> Idle {
        Idle {
            backoff: Backoff::new(),
            sleep: Duration::from_micros(1),
            max: Duration::from_micros(max_us.max(1)),
        }
    }

    fn snooze(&mut self) {
        if !self.backoff.is_completed() {
            self.backoff.snooze();
            return;
        }
        thread::sleep(self.sleep);
        self.sleep = (self.sleep * 2).min(self.max);
    }

    fn reset(&mut self) {
        self.backoff.reset();
        self.sleep = Duration::from_micros(1);
    }
}

/// Blocks of a weakly connected subgraph in topological order.
///
/// A component is driven by exactly one worker thread through [`run`](Self::run).
pub struct Component {
    pub(crate) blocks: Vec<BlockRun>,
    pub(crate) stop: Arc<AtomicBool>,
    pub(crate) config: Config,
}

/// Blocks and first error of a finished [`Component`]
#[derive(Debug)]
pub struct Outcome {
    pub(crate) blocks: Vec<(BlockId, Block)>,
    pub(crate) error: Option<Error>,
}

impl Outcome {
    /// First fatal error, if any
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }
}

impl Component {
    /// Blocks of the component in scheduling order.
    pub fn block_ids(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|b| b.id).collect()
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True if there are no blocks
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Concatenate components, so that one worker drives all of them.
    pub fn merge(components: Vec<Component>) -> Option<Component> {
        let mut iter = components.into_iter();
        let mut first = iter.next()?;
        for c in iter {
            first.blocks.extend(c.blocks);
        }
        Some(first)
    }

    /// Hand back the blocks of a component that never ran.
    ///
    /// All blocks are de-initialized.
    pub fn abort(self) -> Outcome {
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for mut b in self.blocks {
            if let Err(e) = b.block.deinit() {
                warn!("{e}");
            }
            blocks.push((b.id, b.block));
        }
        Outcome {
            blocks,
            error: None,
        }
    }

    /// Drive all blocks until they are done, the run is stopped or a block
    /// fails.
    ///
    /// Blocks have to be initialized already. Every block is finished before
    /// this returns.
    pub fn run(mut self) -> Outcome {
        let mut error = None;

        if let Err(e) = self.run_loop() {
            error!("{e}. Terminating component.");
            error = Some(e);
        }

        for b in self.blocks.iter_mut().filter(|b| !b.done) {
            if let Err(e) = b.finish() {
                warn!("{e}");
                error.get_or_insert(e);
            }
        }

        Outcome {
            blocks: self.blocks.into_iter().map(|b| (b.id, b.block)).collect(),
            error,
        }
    }

    fn run_loop(&mut self) -> Result<()> {
        let mut idle = Idle::new(self.config.backoff_max);
        let max_noutput_items = self.config.max_noutput_items;

        loop {
            let mut progress = false;

            for b in self.blocks.iter_mut() {
                if self.stop.load(Ordering::Acquire) {
                    debug!("stop requested");
                    return Ok(());
                }

                progress |= b.handle_messages();
                if b.done {
                    continue;
                }

                let status = b.block.work(&mut b.detail, max_noutput_items)?;
                if self.config.debug {
                    trace!("{}: {:?}", b.block.label(), status);
                }
                match status {
                    WorkStatus::Progress => progress = true,
                    WorkStatus::Blocked => {}
                    WorkStatus::Done => {
                        b.finish()?;
                        progress = true;
                    }
                }
            }

            if self.blocks.iter().all(|b| b.done) {
                return Ok(());
            }

            if progress {
                idle.reset();
            } else {
                idle.snooze();
            }
        }
    }
}
