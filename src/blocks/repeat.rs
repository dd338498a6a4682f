use std::marker::PhantomData;

use crate::anyhow::Result;
use crate::runtime::Block;
use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::Detail;
use crate::runtime::IoSignature;
use crate::runtime::Kernel;
use crate::runtime::WorkIo;

/// Interpolate by repeating every sample `n` times.
///
/// The block produces multiples of `n` items, so a sample is never split
/// across two calls.
pub struct Repeat<T: Copy + Send + 'static> {
    n: usize,
    _type: PhantomData<T>,
}

impl<T: Copy + Send + 'static> Repeat<T> {
    /// Create Repeat block
    ///
    /// # Panics
    /// Panics if `n` is zero.
    pub fn new(n: usize) -> Block {
        assert!(n > 0, "Repeat: n has to be positive");
        Block::new(
            BlockMetaBuilder::new("Repeat")
                .rate(n as u64, 1)
                .output_multiple(n)
                .build(),
            IoSignature::of::<T>(),
            IoSignature::of::<T>(),
            Repeat::<T> {
                n,
                _type: PhantomData,
            },
        )
    }
}

#[doc(hidden)]
impl<T: Copy + Send + 'static> Kernel for Repeat<T> {
    fn work(&mut self, io: &mut WorkIo, detail: &mut Detail, _meta: &mut BlockMeta) -> Result<()> {
        let (inputs, outputs) = detail.split();
        let i = inputs[0].slice::<T>();
        let o = outputs[0].slice::<T>();

        let m = (io.noutput_items.min(o.len()) / self.n).min(i.len());
        if m > 0 {
            for (chunk, v) in o[..m * self.n].chunks_exact_mut(self.n).zip(i.iter()) {
                chunk.fill(*v);
            }
            inputs[0].consume(m)?;
            outputs[0].produce(m * self.n)?;
        }

        Ok(())
    }
}
