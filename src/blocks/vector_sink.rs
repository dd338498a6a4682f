use crate::anyhow::Result;
use crate::runtime::Block;
use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::Detail;
use crate::runtime::IoSignature;
use crate::runtime::Kernel;
use crate::runtime::WorkIo;

/// Store received samples in vector.
///
/// Read the items after the run with
/// [`Flowgraph::kernel`](crate::runtime::Flowgraph::kernel).
pub struct VectorSink<T> {
    items: Vec<T>,
}

impl<T: Copy + Send + 'static> VectorSink<T> {
    /// Create VectorSink block with an initial capacity
    pub fn new(capacity: usize) -> Block {
        Block::new(
            BlockMetaBuilder::new("VectorSink").build(),
            IoSignature::of::<T>(),
            IoSignature::empty(),
            VectorSink {
                items: Vec::<T>::with_capacity(capacity),
            },
        )
    }

    /// Received items
    pub fn items(&self) -> &Vec<T> {
        &self.items
    }
}

#[doc(hidden)]
impl<T: Copy + Send + 'static> Kernel for VectorSink<T> {
    fn work(&mut self, _io: &mut WorkIo, detail: &mut Detail, _meta: &mut BlockMeta) -> Result<()> {
        let i = detail.input(0).slice::<T>();
        let n = i.len();

        self.items.extend_from_slice(i);
        detail.input(0).consume(n)?;

        Ok(())
    }

    fn init(&mut self, _meta: &mut BlockMeta) -> Result<()> {
        self.items.clear();
        Ok(())
    }
}
