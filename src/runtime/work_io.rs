use std::fmt;

/// Work IO
///
/// Communicate between `work()` and the runtime.
pub struct WorkIo {
    /// Number of items that may be produced on each output in this call
    pub noutput_items: usize,
    /// Mark block as finished
    pub finished: bool,
    /// Block is not done, even if it made no progress with finished inputs
    pub call_again: bool,
}

impl WorkIo {
    pub(crate) fn new(noutput_items: usize) -> WorkIo {
        WorkIo {
            noutput_items,
            finished: false,
            call_again: false,
        }
    }
}

impl fmt::Debug for WorkIo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("WorkIo")
            .field("noutput_items", &self.noutput_items)
            .field("call_again", &self.call_again)
            .field("finished", &self.finished)
            .finish()
    }
}
