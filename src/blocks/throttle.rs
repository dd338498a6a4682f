use std::marker::PhantomData;
use std::time::Instant;

use crate::anyhow::Result;
use crate::runtime::Block;
use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::Detail;
use crate::runtime::Error;
use crate::runtime::IoSignature;
use crate::runtime::Kernel;
use crate::runtime::Pmt;
use crate::runtime::WorkIo;

/// Limit sample rate.
///
/// Forwards at most as many items as correspond to the wall-clock time since
/// the start of the run.
///
/// # Message Handlers
///
/// `rate`: Set the rate in items per second with a `F64`. Replies with the
/// rate.
///
/// # Usage
/// ```
/// use sdrflow::blocks::Throttle;
/// use sdrflow::runtime::Flowgraph;
///
/// let mut fg = Flowgraph::new();
///
/// let throttle = fg.add_block(Throttle::<f32>::new(1_000_000.0));
/// ```
pub struct Throttle<T: Copy + Send + 'static> {
    rate: f64,
    t_init: Instant,
    n_items: usize,
    _type: PhantomData<T>,
}

impl<T: Copy + Send + 'static> Throttle<T> {
    /// Creates a new Throttle block which will throttle to the specified rate.
    pub fn new(rate: f64) -> Block {
        Block::new(
            BlockMetaBuilder::new("Throttle").build(),
            IoSignature::of::<T>(),
            IoSignature::of::<T>(),
            Throttle::<T> {
                rate,
                t_init: Instant::now(),
                n_items: 0,
                _type: PhantomData,
            },
        )
    }

    fn restart(&mut self) {
        self.t_init = Instant::now();
        self.n_items = 0;
    }
}

#[doc(hidden)]
impl<T: Copy + Send + 'static> Kernel for Throttle<T> {
    fn work(&mut self, io: &mut WorkIo, detail: &mut Detail, _meta: &mut BlockMeta) -> Result<()> {
        let (inputs, outputs) = detail.split();
        let i = inputs[0].slice::<T>();
        let o = outputs[0].slice::<T>();

        let pending = i.len().min(o.len());

        let target_items = (self.t_init.elapsed().as_secs_f64() * self.rate).floor() as usize;
        let m = io
            .noutput_items
            .min(pending)
            .min(target_items.saturating_sub(self.n_items));

        if m > 0 {
            o[..m].copy_from_slice(&i[..m]);
            self.n_items += m;
            inputs[0].consume(m)?;
            outputs[0].produce(m)?;
        }

        if m < pending {
            io.call_again = true;
        }

        Ok(())
    }

    fn init(&mut self, _meta: &mut BlockMeta) -> Result<()> {
        self.restart();
        Ok(())
    }

    fn handle_message(
        &mut self,
        meta: &mut BlockMeta,
        port: &str,
        p: Pmt,
    ) -> crate::runtime::Result<Pmt> {
        match (port, p) {
            ("rate", Pmt::F64(r)) if r > 0.0 => {
                self.rate = r;
                self.restart();
                Ok(Pmt::F64(self.rate))
            }
            ("rate", Pmt::Null) => Ok(Pmt::F64(self.rate)),
            ("rate", _) => Ok(Pmt::InvalidValue),
            _ => Err(Error::InvalidMessagePort {
                block: meta.instance_name().unwrap_or(meta.type_name()).to_string(),
                port: port.to_string(),
            }),
        }
    }
}
