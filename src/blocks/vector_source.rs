use crate::anyhow::Result;
use crate::runtime::Block;
use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::Detail;
use crate::runtime::IoSignature;
use crate::runtime::Kernel;
use crate::runtime::WorkIo;

/// Stream samples from vector.
///
/// Finishes after all items are written. A restarted flowgraph streams the
/// vector again.
pub struct VectorSource<T: Copy + Send + 'static> {
    items: Vec<T>,
    n_copied: usize,
}

impl<T: Copy + Send + 'static> VectorSource<T> {
    /// Create VectorSource block
    pub fn new(items: Vec<T>) -> Block {
        Block::new(
            BlockMetaBuilder::new("VectorSource").build(),
            IoSignature::empty(),
            IoSignature::of::<T>(),
            VectorSource { items, n_copied: 0 },
        )
    }
}

#[doc(hidden)]
impl<T: Copy + Send + 'static> Kernel for VectorSource<T> {
    fn work(&mut self, io: &mut WorkIo, detail: &mut Detail, _meta: &mut BlockMeta) -> Result<()> {
        let out = detail.output(0).slice::<T>();
        let n = out.len().min(self.items.len() - self.n_copied);

        if n > 0 {
            out[..n].copy_from_slice(&self.items[self.n_copied..self.n_copied + n]);
            self.n_copied += n;
            detail.output(0).produce(n)?;
        }

        if self.n_copied == self.items.len() {
            io.finished = true;
        }

        Ok(())
    }

    fn init(&mut self, _meta: &mut BlockMeta) -> Result<()> {
        self.n_copied = 0;
        Ok(())
    }
}
