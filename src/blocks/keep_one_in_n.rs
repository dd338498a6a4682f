use std::marker::PhantomData;

use crate::anyhow::Result;
use crate::runtime::Block;
use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::Detail;
use crate::runtime::IoSignature;
use crate::runtime::Kernel;
use crate::runtime::WorkIo;

/// Decimate by forwarding the first of every `n` samples.
///
/// # Inputs
///
/// `0`: Input
///
/// # Outputs
///
/// `0`: Output, one item per `n` input items
///
/// # Usage
/// ```
/// use sdrflow::blocks::KeepOneInN;
/// use sdrflow::runtime::Flowgraph;
///
/// let mut fg = Flowgraph::new();
///
/// let decim = fg.add_block(KeepOneInN::<f32>::new(4));
/// ```
pub struct KeepOneInN<T: Copy + Send + 'static> {
    n: usize,
    _type: PhantomData<T>,
}

impl<T: Copy + Send + 'static> KeepOneInN<T> {
    /// Create KeepOneInN block
    ///
    /// # Panics
    /// Panics if `n` is zero.
    pub fn new(n: usize) -> Block {
        assert!(n > 0, "KeepOneInN: n has to be positive");
        Block::new(
            BlockMetaBuilder::new("KeepOneInN")
                .rate(1, n as u64)
                .build(),
            IoSignature::of::<T>(),
            IoSignature::of::<T>(),
            KeepOneInN::<T> {
                n,
                _type: PhantomData,
            },
        )
    }
}

#[doc(hidden)]
impl<T: Copy + Send + 'static> Kernel for KeepOneInN<T> {
    fn work(&mut self, io: &mut WorkIo, detail: &mut Detail, _meta: &mut BlockMeta) -> Result<()> {
        let (inputs, outputs) = detail.split();
        let i = inputs[0].slice::<T>();
        let o = outputs[0].slice::<T>();

        let m = io.noutput_items.min(o.len()).min(i.len() / self.n);
        if m > 0 {
            for (k, v) in o[..m].iter_mut().enumerate() {
                *v = i[k * self.n];
            }
            inputs[0].consume(m * self.n)?;
            outputs[0].produce(m)?;
        }

        Ok(())
    }
}
