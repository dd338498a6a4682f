use crate::anyhow::Result;
use crate::runtime::Block;
use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::Detail;
use crate::runtime::Error;
use crate::runtime::IoSignature;
use crate::runtime::Kernel;
use crate::runtime::Pmt;
use crate::runtime::WorkIo;

/// Multiply samples with a constant that can be changed while running.
///
/// # Message Handlers
///
/// `const`: Set the constant with a `F32` or `F64`. `Null` only queries.
/// Replies with the constant.
///
/// # Usage
/// ```
/// use sdrflow::blocks::MultiplyConst;
/// use sdrflow::runtime::Flowgraph;
///
/// let mut fg = Flowgraph::new();
///
/// let gain = fg.add_block(MultiplyConst::new(0.5));
/// ```
pub struct MultiplyConst {
    constant: f32,
}

impl MultiplyConst {
    /// Create MultiplyConst block
    pub fn new(constant: f32) -> Block {
        Block::new(
            BlockMetaBuilder::new("MultiplyConst").build(),
            IoSignature::of::<f32>(),
            IoSignature::of::<f32>(),
            MultiplyConst { constant },
        )
    }

    /// Current constant
    pub fn constant(&self) -> f32 {
        self.constant
    }
}

#[doc(hidden)]
impl Kernel for MultiplyConst {
    fn work(&mut self, io: &mut WorkIo, detail: &mut Detail, _meta: &mut BlockMeta) -> Result<()> {
        let (inputs, outputs) = detail.split();
        let i = inputs[0].slice::<f32>();
        let o = outputs[0].slice::<f32>();

        let m = io.noutput_items.min(i.len()).min(o.len());
        if m > 0 {
            for (v, r) in i[..m].iter().zip(o[..m].iter_mut()) {
                *r = v * self.constant;
            }
            inputs[0].consume(m)?;
            outputs[0].produce(m)?;
        }

        Ok(())
    }

    fn handle_message(
        &mut self,
        meta: &mut BlockMeta,
        port: &str,
        p: Pmt,
    ) -> crate::runtime::Result<Pmt> {
        if port != "const" {
            return Err(Error::InvalidMessagePort {
                block: meta.instance_name().unwrap_or(meta.type_name()).to_string(),
                port: port.to_string(),
            });
        }

        match p {
            Pmt::F32(v) => self.constant = v,
            Pmt::F64(v) => self.constant = v as f32,
            Pmt::Null => {}
            _ => return Ok(Pmt::InvalidValue),
        }
        debug!("MultiplyConst: constant {}", self.constant);
        Ok(Pmt::F32(self.constant))
    }
}
