use crate::runtime::BlockMeta;
use crate::runtime::Detail;
use crate::runtime::Error;
use crate::runtime::Pmt;
use crate::runtime::Result;
use crate::runtime::WorkIo;

/// Kernel
///
/// Central trait to implement a block. The scheduler only sees blocks through
/// this interface and never inspects their concrete type.
pub trait Kernel: Send {
    /// Processes stream data
    ///
    /// `io.noutput_items` is the number of items that may be produced on every
    /// output in this call. Inputs expose all readable items, including the
    /// history window.
    fn work(
        &mut self,
        io: &mut WorkIo,
        detail: &mut Detail,
        meta: &mut BlockMeta,
    ) -> anyhow::Result<()>;

    /// Initialize kernel
    ///
    /// Called on every start, before the buffers of the run are allocated.
    /// Changes to `meta` (history, rate, output multiple) take effect for
    /// this run.
    fn init(&mut self, _meta: &mut BlockMeta) -> anyhow::Result<()> {
        Ok(())
    }

    /// De-initialize kernel
    ///
    /// Called once per run, when the block is done or the run is stopped.
    fn deinit(&mut self, _meta: &mut BlockMeta) -> anyhow::Result<()> {
        Ok(())
    }

    /// Accept or reject the number of connected inputs and outputs.
    fn check_topology(&self, _ninputs: usize, _noutputs: usize) -> bool {
        true
    }

    /// Handle a message posted to the block
    ///
    /// Called between `work()` invocations.
    fn handle_message(&mut self, meta: &mut BlockMeta, port: &str, _p: Pmt) -> Result<Pmt> {
        Err(Error::InvalidMessagePort {
            block: meta.instance_name().unwrap_or(meta.type_name()).to_string(),
            port: port.to_string(),
        })
    }
}
