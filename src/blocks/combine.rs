use std::marker::PhantomData;

use crate::anyhow::Result;
use crate::runtime::Block;
use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::Detail;
use crate::runtime::IoSignature;
use crate::runtime::Kernel;
use crate::runtime::WorkIo;

/// Apply a function to combine two streams into one.
///
/// # Inputs
///
/// `0`: Input A
///
/// `1`: Input B
///
/// # Outputs
///
/// `0`: Combined output
///
/// # Usage
/// ```
/// use sdrflow::blocks::Combine;
/// use sdrflow::runtime::Flowgraph;
///
/// let mut fg = Flowgraph::new();
///
/// let adder = fg.add_block(Combine::new(|a: &f32, b: &f32| {
///     a + b
/// }));
/// ```
#[allow(clippy::type_complexity)]
pub struct Combine<F, A, B, C>
where
    F: FnMut(&A, &B) -> C + Send + 'static,
    A: Copy + Send + 'static,
    B: Copy + Send + 'static,
    C: Copy + Send + 'static,
{
    f: F,
    _p: PhantomData<(A, B, C)>,
}

impl<F, A, B, C> Combine<F, A, B, C>
where
    F: FnMut(&A, &B) -> C + Send + 'static,
    A: Copy + Send + 'static,
    B: Copy + Send + 'static,
    C: Copy + Send + 'static,
{
    /// Create [`Combine`] block
    pub fn new(f: F) -> Block {
        Block::new(
            BlockMetaBuilder::new("Combine").build(),
            IoSignature::with_sizes(
                2,
                Some(2),
                vec![std::mem::size_of::<A>(), std::mem::size_of::<B>()],
            ),
            IoSignature::of::<C>(),
            Combine { f, _p: PhantomData },
        )
    }
}

#[doc(hidden)]
impl<F, A, B, C> Kernel for Combine<F, A, B, C>
where
    F: FnMut(&A, &B) -> C + Send + 'static,
    A: Copy + Send + 'static,
    B: Copy + Send + 'static,
    C: Copy + Send + 'static,
{
    fn work(&mut self, io: &mut WorkIo, detail: &mut Detail, _meta: &mut BlockMeta) -> Result<()> {
        let (inputs, outputs) = detail.split();
        let i0 = inputs[0].slice::<A>();
        let i1 = inputs[1].slice::<B>();
        let o0 = outputs[0].slice::<C>();

        let m = io
            .noutput_items
            .min(i0.len())
            .min(i1.len())
            .min(o0.len());

        if m > 0 {
            for ((x0, x1), y) in i0.iter().zip(i1.iter()).zip(o0[..m].iter_mut()) {
                *y = (self.f)(x0, x1);
            }

            inputs[0].consume(m)?;
            inputs[1].consume(m)?;
            outputs[0].produce(m)?;
        }

        Ok(())
    }
}
