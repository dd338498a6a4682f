use std::any::Any;
use std::fmt;

use crate::runtime::BlockMeta;
use crate::runtime::Detail;
use crate::runtime::Error;
use crate::runtime::IoSignature;
use crate::runtime::Kernel;
use crate::runtime::Pmt;
use crate::runtime::Result;
use crate::runtime::WorkIo;

pub(crate) trait AnyKernel: Kernel {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<K: Kernel + 'static> AnyKernel for K {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Counters of the last run of a block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockStats {
    /// Number of `work()` calls
    pub work_calls: u64,
    /// Items consumed, summed over all inputs
    pub items_consumed: u64,
    /// Items produced, summed over all outputs
    pub items_produced: u64,
}

/// Outcome of one scheduling attempt of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkStatus {
    /// Items were consumed or produced.
    Progress,
    /// Not enough input or output room. Try again later.
    Blocked,
    /// The block will not process any more items.
    Done,
}

/// Block
///
/// A [`Kernel`] together with its metadata and port signatures.
pub struct Block {
    meta: BlockMeta,
    input_signature: IoSignature,
    output_signature: IoSignature,
    kernel: Box<dyn AnyKernel>,
    stats: BlockStats,
}

impl Block {
    /// Create block
    pub fn new<K: Kernel + 'static>(
        meta: BlockMeta,
        input_signature: IoSignature,
        output_signature: IoSignature,
        kernel: K,
    ) -> Block {
        Block {
            meta,
            input_signature,
            output_signature,
            kernel: Box::new(kernel),
            stats: BlockStats::default(),
        }
    }

    /// Block metadata
    pub fn meta(&self) -> &BlockMeta {
        &self.meta
    }

    /// Mutable block metadata
    pub fn meta_mut(&mut self) -> &mut BlockMeta {
        &mut self.meta
    }

    /// Type name
    pub fn type_name(&self) -> &str {
        self.meta.type_name()
    }

    /// Instance name
    pub fn instance_name(&self) -> Option<&str> {
        self.meta.instance_name()
    }

    pub(crate) fn set_instance_name(&mut self, name: &str) {
        self.meta.set_instance_name(name);
    }

    pub(crate) fn label(&self) -> String {
        self.instance_name().unwrap_or(self.type_name()).to_string()
    }

    /// Input signature
    pub fn input_signature(&self) -> &IoSignature {
        &self.input_signature
    }

    /// Output signature
    pub fn output_signature(&self) -> &IoSignature {
        &self.output_signature
    }

    /// History (see [`BlockMeta::history`])
    pub fn history(&self) -> usize {
        self.meta.history()
    }

    /// Relative rate (see [`BlockMeta::relative_rate`])
    pub fn relative_rate(&self) -> f64 {
        self.meta.relative_rate()
    }

    /// Output multiple (see [`BlockMeta::output_multiple`])
    pub fn output_multiple(&self) -> usize {
        self.meta.output_multiple()
    }

    /// Ask the kernel whether it accepts the number of connected ports.
    pub fn check_topology(&self, ninputs: usize, noutputs: usize) -> bool {
        self.kernel.check_topology(ninputs, noutputs)
    }

    /// Try to cast the kernel to a concrete type.
    pub fn kernel<K: Kernel + 'static>(&self) -> Option<&K> {
        self.kernel.as_any().downcast_ref::<K>()
    }

    /// Try to cast the kernel mutably to a concrete type.
    pub fn kernel_mut<K: Kernel + 'static>(&mut self) -> Option<&mut K> {
        self.kernel.as_any_mut().downcast_mut::<K>()
    }

    /// Statistics of the last (or current) run
    pub fn stats(&self) -> BlockStats {
        self.stats
    }

    fn block_error(&self, e: impl fmt::Display) -> Error {
        Error::BlockError {
            block: self.label(),
            message: e.to_string(),
        }
    }

    pub(crate) fn init(&mut self) -> Result<()> {
        self.stats = BlockStats::default();
        if let Err(e) = self.kernel.init(&mut self.meta) {
            return Err(self.block_error(format!("init failed: {e:#}")));
        }
        Ok(())
    }

    pub(crate) fn deinit(&mut self) -> Result<()> {
        if let Err(e) = self.kernel.deinit(&mut self.meta) {
            return Err(self.block_error(format!("deinit failed: {e:#}")));
        }
        Ok(())
    }

    pub(crate) fn handle_message(&mut self, port: &str, p: Pmt) -> Result<Pmt> {
        self.kernel.handle_message(&mut self.meta, port, p)
    }

    /// Number of items the block may produce now.
    ///
    /// Limited by the usable input, the room in the output buffers and the
    /// configured cap. Always a multiple of the output multiple. A cap below
    /// the output multiple is raised to it.
    pub(crate) fn budget(&self, detail: &Detail, max_noutput_items: Option<usize>) -> usize {
        let multiple = self.meta.output_multiple();
        let cap = self
            .meta
            .max_noutput_items()
            .or(max_noutput_items)
            .and_then(|c| c.max(1).checked_next_multiple_of(multiple))
            .unwrap_or(usize::MAX);
        let room = detail
            .outputs()
            .iter()
            .map(|o| o.writer_space())
            .min()
            .unwrap_or(usize::MAX)
            .min(cap);

        let from_input = detail
            .inputs()
            .iter()
            .map(|i| self.meta.rate().output_for_input(i.items_usable()))
            .min()
            .unwrap_or(usize::MAX);

        let n = from_input.min(room);
        n - n % multiple
    }

    /// Give the block one chance to process items.
    pub(crate) fn work(
        &mut self,
        detail: &mut Detail,
        max_noutput_items: Option<usize>,
    ) -> Result<WorkStatus> {
        if detail.noutputs() > 0 && detail.outputs().iter().all(|o| o.readers_done()) {
            return Ok(WorkStatus::Done);
        }

        // done flags have to be read before the items available
        let mut input_finished = false;
        let mut input_exhausted = false;
        for i in detail.inputs() {
            if i.finished() {
                input_finished = true;
                let n = self.meta.rate().output_for_input(i.items_usable());
                if n < self.meta.output_multiple() {
                    input_exhausted = true;
                }
            }
        }
        if input_exhausted {
            return Ok(WorkStatus::Done);
        }

        let noutput_items = self.budget(detail, max_noutput_items);
        if noutput_items == 0 {
            return Ok(WorkStatus::Blocked);
        }

        for o in detail.split().1.iter_mut() {
            o.set_budget(noutput_items);
        }

        let mut io = WorkIo::new(noutput_items);
        let res = self.kernel.work(&mut io, detail, &mut self.meta);

        let (inputs, outputs) = detail.split();
        let consumed: usize = inputs.iter_mut().map(|i| i.take_consumed()).sum();
        let produced: usize = outputs.iter_mut().map(|o| o.take_produced()).sum();
        self.stats.work_calls += 1;
        self.stats.items_consumed += consumed as u64;
        self.stats.items_produced += produced as u64;

        if let Err(e) = res {
            return Err(self.block_error(format!("{e:#}")));
        }

        if io.finished {
            return Ok(WorkStatus::Done);
        }
        if consumed == 0 && produced == 0 {
            if input_finished && !io.call_again {
                return Ok(WorkStatus::Done);
            }
            return Ok(WorkStatus::Blocked);
        }
        Ok(WorkStatus::Progress)
    }

    /// Propagate done to adjacent blocks and de-initialize the kernel.
    pub(crate) fn finish(&mut self, detail: &Detail) -> Result<()> {
        for o in detail.outputs() {
            o.set_done();
        }
        for i in detail.inputs() {
            i.set_done();
        }
        self.deinit()
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("type_name", &self.type_name())
            .field("instance_name", &self.instance_name())
            .field("history", &self.history())
            .field("relative_rate", &self.meta.rate())
            .field("output_multiple", &self.output_multiple())
            .finish()
    }
}
