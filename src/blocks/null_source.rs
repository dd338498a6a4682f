use std::marker::PhantomData;

use crate::anyhow::Result;
use crate::runtime::Block;
use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::Detail;
use crate::runtime::IoSignature;
use crate::runtime::Kernel;
use crate::runtime::WorkIo;

/// Generate a stream of zeroes.
///
/// # Inputs
///
/// No inputs
///
/// # Outputs
///
/// `0`: Output
///
/// # Usage
/// ```
/// use sdrflow::blocks::NullSource;
/// use sdrflow::runtime::Flowgraph;
///
/// let mut fg = Flowgraph::new();
///
/// let source = fg.add_block(NullSource::<f32>::new());
/// ```
pub struct NullSource<T: Copy + Default + Send + 'static> {
    _type: PhantomData<T>,
}

impl<T: Copy + Default + Send + 'static> NullSource<T> {
    /// Create Null Source block
    pub fn new() -> Block {
        Block::new(
            BlockMetaBuilder::new("NullSource").build(),
            IoSignature::empty(),
            IoSignature::of::<T>(),
            NullSource::<T> { _type: PhantomData },
        )
    }
}

#[doc(hidden)]
impl<T: Copy + Default + Send + 'static> Kernel for NullSource<T> {
    fn work(&mut self, io: &mut WorkIo, detail: &mut Detail, _meta: &mut BlockMeta) -> Result<()> {
        let o = detail.output(0).slice::<T>();
        let n = o.len().min(io.noutput_items);
        o[..n].fill(T::default());
        detail.output(0).produce(n)?;
        Ok(())
    }
}
