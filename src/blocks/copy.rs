use std::marker::PhantomData;

use crate::anyhow::Result;
use crate::runtime::Block;
use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::Detail;
use crate::runtime::IoSignature;
use crate::runtime::Kernel;
use crate::runtime::WorkIo;

/// Copy input samples to the output.
pub struct Copy<T: core::marker::Copy + Send + 'static> {
    _type: PhantomData<T>,
}

impl<T: core::marker::Copy + Send + 'static> Copy<T> {
    /// Create [`struct@Copy`] block
    pub fn new() -> Block {
        Block::new(
            BlockMetaBuilder::new("Copy").build(),
            IoSignature::of::<T>(),
            IoSignature::of::<T>(),
            Self { _type: PhantomData },
        )
    }
}

#[doc(hidden)]
impl<T: core::marker::Copy + Send + 'static> Kernel for Copy<T> {
    fn work(&mut self, io: &mut WorkIo, detail: &mut Detail, _meta: &mut BlockMeta) -> Result<()> {
        let (inputs, outputs) = detail.split();
        let i = inputs[0].slice::<T>();
        let o = outputs[0].slice::<T>();

        let m = io.noutput_items.min(i.len()).min(o.len());
        if m > 0 {
            o[..m].copy_from_slice(&i[..m]);
            inputs[0].consume(m)?;
            outputs[0].produce(m)?;
        }

        Ok(())
    }
}
