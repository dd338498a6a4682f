use crate::runtime::Error;
use crate::runtime::Result;
use crate::runtime::buffer::BufferReader;
use crate::runtime::buffer::BufferWriter;

/// Input stream of a block during a run
#[derive(Debug)]
pub struct StreamInput {
    reader: BufferReader,
    history: usize,
    consumed: usize,
}

impl StreamInput {
    pub(crate) fn new(reader: BufferReader, history: usize) -> StreamInput {
        StreamInput {
            reader,
            history,
            consumed: 0,
        }
    }

    /// Size of one item in bytes
    pub fn item_size(&self) -> usize {
        self.reader.buffer().item_size()
    }

    /// Readable items, including the `history - 1` items of the window.
    pub fn items_available(&self) -> usize {
        self.reader.items_available()
    }

    /// Readable items beyond the history window.
    pub fn items_usable(&self) -> usize {
        self.items_available().saturating_sub(self.history - 1)
    }

    /// All readable items.
    ///
    /// The first `history - 1` items are the history window. Panics if `T`
    /// does not have the item size of the stream.
    pub fn slice<T: Copy>(&self) -> &[T] {
        self.reader.slice::<T>()
    }

    /// Mark `n` items as read.
    pub fn consume(&mut self, n: usize) -> Result<()> {
        self.reader.consume(n)?;
        self.consumed += n;
        Ok(())
    }

    /// True if the upstream block is done. Items may still be available.
    pub fn finished(&self) -> bool {
        self.reader.finished()
    }

    /// Items consumed since the start of the run.
    pub fn nitems_read(&self) -> u64 {
        self.reader.nitems_read()
    }

    pub(crate) fn take_consumed(&mut self) -> usize {
        std::mem::take(&mut self.consumed)
    }

    pub(crate) fn set_done(&self) {
        self.reader.set_done();
    }
}

/// Output stream of a block during a run
#[derive(Debug)]
pub struct StreamOutput {
    writer: BufferWriter,
    budget: usize,
    produced: usize,
}

impl StreamOutput {
    pub(crate) fn new(writer: BufferWriter) -> StreamOutput {
        StreamOutput {
            writer,
            budget: 0,
            produced: 0,
        }
    }

    /// Size of one item in bytes
    pub fn item_size(&self) -> usize {
        self.writer.buffer().item_size()
    }

    /// Items that can still be produced in this call.
    pub fn space_available(&self) -> usize {
        self.budget
            .saturating_sub(self.produced)
            .min(self.writer.space_available())
    }

    /// Writable slice of exactly the remaining budget of this call.
    ///
    /// Panics if `T` does not have the item size of the stream.
    pub fn slice<T: Copy>(&mut self) -> &mut [T] {
        let n = self.space_available();
        &mut self.writer.slice::<T>()[..n]
    }

    /// Publish `n` items written to the front of [`slice`](Self::slice).
    pub fn produce(&mut self, n: usize) -> Result<()> {
        let available = self.space_available();
        if n > available {
            return Err(Error::ProduceOverrun {
                requested: n,
                available,
            });
        }
        self.writer.produce(n)?;
        self.produced += n;
        Ok(())
    }

    /// Items produced since the start of the run.
    pub fn nitems_written(&self) -> u64 {
        self.writer.nitems_written()
    }

    pub(crate) fn writer_space(&self) -> usize {
        self.writer.space_available()
    }

    pub(crate) fn set_budget(&mut self, budget: usize) {
        self.budget = budget;
        self.produced = 0;
    }

    pub(crate) fn take_produced(&mut self) -> usize {
        self.budget = 0;
        std::mem::take(&mut self.produced)
    }

    pub(crate) fn readers_done(&self) -> bool {
        self.writer.readers_done()
    }

    pub(crate) fn set_done(&self) {
        self.writer.set_done();
    }
}

/// Per-run binding of a block to its buffers
///
/// Holds one reader per input port and one writer per output port. Created
/// fresh on every start.
#[derive(Debug, Default)]
pub struct Detail {
    inputs: Vec<StreamInput>,
    outputs: Vec<StreamOutput>,
}

impl Detail {
    pub(crate) fn new(inputs: Vec<StreamInput>, outputs: Vec<StreamOutput>) -> Detail {
        Detail { inputs, outputs }
    }

    pub(crate) fn add_input(&mut self, input: StreamInput) {
        self.inputs.push(input);
    }

    pub(crate) fn add_output(&mut self, output: StreamOutput) {
        self.outputs.push(output);
    }

    /// Input `i`
    pub fn input(&mut self, i: usize) -> &mut StreamInput {
        &mut self.inputs[i]
    }

    /// Output `i`
    pub fn output(&mut self, i: usize) -> &mut StreamOutput {
        &mut self.outputs[i]
    }

    /// All inputs
    pub fn inputs(&self) -> &[StreamInput] {
        &self.inputs
    }

    /// All outputs
    pub fn outputs(&self) -> &[StreamOutput] {
        &self.outputs
    }

    /// Number of connected inputs
    pub fn ninputs(&self) -> usize {
        self.inputs.len()
    }

    /// Number of connected outputs
    pub fn noutputs(&self) -> usize {
        self.outputs.len()
    }

    /// Borrow inputs and outputs at the same time.
    pub fn split(&mut self) -> (&mut [StreamInput], &mut [StreamOutput]) {
        (&mut self.inputs, &mut self.outputs)
    }
}
