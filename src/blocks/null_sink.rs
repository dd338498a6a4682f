use std::marker::PhantomData;

use crate::anyhow::Result;
use crate::runtime::Block;
use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::Detail;
use crate::runtime::IoSignature;
use crate::runtime::Kernel;
use crate::runtime::WorkIo;

/// Drop samples.
///
/// # Inputs
///
/// `0`: Input
///
/// # Outputs
///
/// No outputs
///
/// # Usage
/// ```
/// use sdrflow::blocks::NullSink;
/// use sdrflow::runtime::Flowgraph;
///
/// let mut fg = Flowgraph::new();
///
/// let sink = fg.add_block(NullSink::<f32>::new());
/// ```
pub struct NullSink<T: Copy + Send + 'static> {
    n_received: usize,
    _type: PhantomData<T>,
}

impl<T: Copy + Send + 'static> NullSink<T> {
    /// Create Null Sink block
    pub fn new() -> Block {
        Block::new(
            BlockMetaBuilder::new("NullSink").build(),
            IoSignature::of::<T>(),
            IoSignature::empty(),
            NullSink::<T> {
                n_received: 0,
                _type: PhantomData,
            },
        )
    }

    /// Number of items received during the last run
    pub fn n_received(&self) -> usize {
        self.n_received
    }
}

#[doc(hidden)]
impl<T: Copy + Send + 'static> Kernel for NullSink<T> {
    fn work(&mut self, _io: &mut WorkIo, detail: &mut Detail, _meta: &mut BlockMeta) -> Result<()> {
        let n = detail.input(0).items_available();
        if n > 0 {
            self.n_received += n;
            detail.input(0).consume(n)?;
        }
        Ok(())
    }

    fn init(&mut self, _meta: &mut BlockMeta) -> Result<()> {
        self.n_received = 0;
        Ok(())
    }
}
