use std::marker::PhantomData;

use crate::anyhow::Result;
use crate::runtime::Block;
use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::Detail;
use crate::runtime::IoSignature;
use crate::runtime::Kernel;
use crate::runtime::WorkIo;

/// Copies only a given number of samples and stops.
///
/// # Inputs
///
/// `0`: Input
///
/// # Outputs
///
/// `0`: Output
///
/// # Usage
/// ```
/// use sdrflow::blocks::Head;
/// use sdrflow::runtime::Flowgraph;
///
/// let mut fg = Flowgraph::new();
///
/// let head = fg.add_block(Head::<f32>::new(1_000_000));
/// ```
pub struct Head<T: Copy + Send + 'static> {
    n_items: u64,
    remaining: u64,
    _type: PhantomData<T>,
}

impl<T: Copy + Send + 'static> Head<T> {
    /// Create Head block
    pub fn new(n_items: u64) -> Block {
        Block::new(
            BlockMetaBuilder::new("Head").build(),
            IoSignature::of::<T>(),
            IoSignature::of::<T>(),
            Head::<T> {
                n_items,
                remaining: n_items,
                _type: PhantomData,
            },
        )
    }
}

#[doc(hidden)]
impl<T: Copy + Send + 'static> Kernel for Head<T> {
    fn work(&mut self, io: &mut WorkIo, detail: &mut Detail, _meta: &mut BlockMeta) -> Result<()> {
        let (inputs, outputs) = detail.split();
        let i = inputs[0].slice::<T>();
        let o = outputs[0].slice::<T>();

        let m = (self.remaining.min(usize::MAX as u64) as usize)
            .min(i.len())
            .min(o.len());

        if m > 0 {
            o[..m].copy_from_slice(&i[..m]);
            self.remaining -= m as u64;
            inputs[0].consume(m)?;
            outputs[0].produce(m)?;
        }

        if self.remaining == 0 {
            io.finished = true;
        }

        Ok(())
    }

    fn init(&mut self, _meta: &mut BlockMeta) -> Result<()> {
        self.remaining = self.n_items;
        Ok(())
    }
}
