use crate::anyhow::Result;
use crate::runtime::Block;
use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::Detail;
use crate::runtime::IoSignature;
use crate::runtime::Kernel;
use crate::runtime::WorkIo;

/// Sliding window mean over the last `length` samples.
///
/// Uses the block history, so the first outputs average over the zeros that
/// precede the stream.
///
/// # Inputs
///
/// `0`: Input
///
/// # Outputs
///
/// `0`: Mean of the current and the `length - 1` previous input samples
pub struct MovingAverage {
    length: usize,
}

impl MovingAverage {
    /// Create MovingAverage block
    ///
    /// # Panics
    /// Panics if `length` is zero.
    pub fn new(length: usize) -> Block {
        assert!(length > 0, "MovingAverage: length has to be positive");
        Block::new(
            BlockMetaBuilder::new("MovingAverage")
                .history(length)
                .build(),
            IoSignature::of::<f32>(),
            IoSignature::of::<f32>(),
            MovingAverage { length },
        )
    }
}

#[doc(hidden)]
impl Kernel for MovingAverage {
    fn work(&mut self, io: &mut WorkIo, detail: &mut Detail, _meta: &mut BlockMeta) -> Result<()> {
        let (inputs, outputs) = detail.split();
        let i = inputs[0].slice::<f32>();
        let o = outputs[0].slice::<f32>();

        let m = io
            .noutput_items
            .min(o.len())
            .min(i.len().saturating_sub(self.length - 1));
        if m == 0 {
            return Ok(());
        }

        let scale = 1.0 / self.length as f32;
        let mut sum: f32 = i[..self.length - 1].iter().sum();
        for k in 0..m {
            sum += i[k + self.length - 1];
            o[k] = sum * scale;
            sum -= i[k];
        }

        inputs[0].consume(m)?;
        outputs[0].produce(m)?;
        Ok(())
    }
}
