use std::mem;

use crate::runtime::Block;
use crate::runtime::BlockStats;
use crate::runtime::Detail;
use crate::runtime::Kernel;
use crate::runtime::Pmt;
use crate::runtime::Result;
use crate::runtime::StreamInput;
use crate::runtime::StreamOutput;
use crate::runtime::block::WorkStatus;
use crate::runtime::buffer::Buffer;
use crate::runtime::buffer::BufferReader;

/// Mocker for a block
///
/// A harness to run a block without a runtime. Used for unit tests and
/// benchmarking. Inputs and outputs have to be set up in port order.
pub struct Mocker {
    block: Block,
    detail: Detail,
    outputs: Vec<BufferReader>,
    finished: bool,
}

impl Mocker {
    /// Create mocker
    pub fn new(block: Block) -> Self {
        Mocker {
            block,
            detail: Detail::default(),
            outputs: Vec::new(),
            finished: false,
        }
    }

    /// Add the next input with the given data.
    ///
    /// The upstream end of the input is done, so the block sees no more items
    /// after `data`.
    pub fn input<T: Copy>(&mut self, port: usize, data: Vec<T>) {
        assert_eq!(port, self.detail.ninputs(), "inputs have to be added in order");
        let history = self.block.history();
        let mut buffer = Buffer::new(data.len() + history, mem::size_of::<T>());
        buffer.add_reader(history - 1);
        let (mut writer, mut readers) = buffer.split();

        writer.slice::<T>()[..data.len()].copy_from_slice(&data);
        // fits by construction
        let _ = writer.produce(data.len());
        writer.set_done();

        if let Some(reader) = readers.pop() {
            self.detail.add_input(StreamInput::new(reader, history));
        }
    }

    /// Add the next output with room for `size` items.
    pub fn init_output<T: Copy>(&mut self, port: usize, size: usize) {
        assert_eq!(port, self.detail.noutputs(), "outputs have to be added in order");
        let mut buffer = Buffer::new(size.max(1), mem::size_of::<T>());
        buffer.add_reader(0);
        let (writer, mut readers) = buffer.split();
        if let Some(reader) = readers.pop() {
            self.outputs.push(reader);
        }
        self.detail.add_output(StreamOutput::new(writer));
    }

    /// Call `init()` of the kernel.
    pub fn init(&mut self) -> Result<()> {
        self.block.init()
    }

    /// Give the block one chance to process items.
    pub fn run(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        if self.block.work(&mut self.detail, None)? == WorkStatus::Done {
            self.finished = true;
        }
        Ok(())
    }

    /// Run the block until it is done or stops making progress.
    pub fn run_to_completion(&mut self) -> Result<()> {
        while !self.finished {
            let before = self.block.stats().work_calls;
            self.run()?;
            if !self.finished && self.block.stats().work_calls == before {
                break;
            }
        }
        Ok(())
    }

    /// Call `deinit()` of the kernel.
    pub fn deinit(&mut self) -> Result<()> {
        self.block.deinit()
    }

    /// True if the block signaled that it is done.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Post a PMT to a message handler of the block.
    pub fn post(&mut self, port: &str, p: impl Into<Pmt>) -> Result<Pmt> {
        self.block.handle_message(port, p.into())
    }

    /// Take all items produced on an output so far.
    pub fn output<T: Copy>(&mut self, port: usize) -> Vec<T> {
        let reader = &mut self.outputs[port];
        let items = reader.slice::<T>().to_vec();
        // all available items
        let _ = reader.consume(items.len());
        items
    }

    /// Get the kernel as concrete type.
    pub fn kernel<K: Kernel + 'static>(&self) -> Option<&K> {
        self.block.kernel()
    }

    /// Statistics of the block
    pub fn stats(&self) -> BlockStats {
        self.block.stats()
    }

    /// Get back the block.
    pub fn into_block(self) -> Block {
        self.block
    }
}
