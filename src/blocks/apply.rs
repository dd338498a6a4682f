use std::marker::PhantomData;

use crate::anyhow::Result;
use crate::runtime::Block;
use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::Detail;
use crate::runtime::IoSignature;
use crate::runtime::Kernel;
use crate::runtime::WorkIo;

/// Apply a function to each sample.
///
/// # Inputs
///
/// `0`: Input
///
/// # Outputs
///
/// `0`: Output, corresponding to input with function applied
///
/// # Usage
/// ```
/// use sdrflow::blocks::Apply;
/// use sdrflow::runtime::Flowgraph;
///
/// let mut fg = Flowgraph::new();
///
/// // Double each sample
/// let doubler = fg.add_block(Apply::new(|i: &f32| i * 2.0));
///
/// // Note that the closure can also hold state
/// let mut last_value = 0.0;
/// let moving_average = fg.add_block(Apply::new(move |i: &f32| {
///     let new_value = (last_value + i) / 2.0;
///     last_value = *i;
///     new_value
/// }));
///
/// // Additionally, the closure can change the type of the sample
/// let to_bits = fg.add_block(Apply::new(|i: &f32| i.to_bits()));
/// ```
pub struct Apply<F, A, B>
where
    F: FnMut(&A) -> B + Send + 'static,
    A: Copy + Send + 'static,
    B: Copy + Send + 'static,
{
    f: F,
    _p: PhantomData<(A, B)>,
}

impl<F, A, B> Apply<F, A, B>
where
    F: FnMut(&A) -> B + Send + 'static,
    A: Copy + Send + 'static,
    B: Copy + Send + 'static,
{
    /// Create [`Apply`] block
    ///
    /// ## Parameter
    /// - `f`: Function to apply on each sample
    pub fn new(f: F) -> Block {
        Block::new(
            BlockMetaBuilder::new("Apply").build(),
            IoSignature::of::<A>(),
            IoSignature::of::<B>(),
            Apply { f, _p: PhantomData },
        )
    }
}

#[doc(hidden)]
impl<F, A, B> Kernel for Apply<F, A, B>
where
    F: FnMut(&A) -> B + Send + 'static,
    A: Copy + Send + 'static,
    B: Copy + Send + 'static,
{
    fn work(&mut self, io: &mut WorkIo, detail: &mut Detail, _meta: &mut BlockMeta) -> Result<()> {
        let (inputs, outputs) = detail.split();
        let i = inputs[0].slice::<A>();
        let o = outputs[0].slice::<B>();

        let m = io.noutput_items.min(i.len()).min(o.len());
        if m > 0 {
            for (v, r) in i[..m].iter().zip(o[..m].iter_mut()) {
                *r = (self.f)(v);
            }

            inputs[0].consume(m)?;
            outputs[0].produce(m)?;
        }

        Ok(())
    }
}
