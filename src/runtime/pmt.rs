use thiserror::Error;

/// Polymorphic value for messages to blocks
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum Pmt {
    /// Handler succeeded without a result
    Ok,
    /// Handler got a value it cannot work with
    InvalidValue,
    /// Empty value
    Null,
    /// String
    String(String),
    /// Boolean
    Bool(bool),
    /// Usize
    Usize(usize),
    /// U32
    U32(u32),
    /// U64
    U64(u64),
    /// F32
    F32(f32),
    /// F64
    F64(f64),
    /// Vector of f32
    VecF32(Vec<f32>),
    /// Raw bytes
    Blob(Vec<u8>),
    /// The receiver is done
    Finished,
}

impl Pmt {
    /// Check if string
    pub fn is_string(&self) -> bool {
        matches!(self, Pmt::String(_))
    }
}

/// Conversion failed because the [`Pmt`] has a different variant.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("PMT conversion error: {0:?} is not a {1}")]
pub struct PmtConversionError(pub Pmt, pub &'static str);

macro_rules! pmt_conversions {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Pmt {
                fn from(v: $t) -> Self {
                    Pmt::$variant(v)
                }
            }

            impl TryFrom<&Pmt> for $t {
                type Error = PmtConversionError;

                fn try_from(p: &Pmt) -> Result<$t, Self::Error> {
                    match p {
                        Pmt::$variant(v) => Ok(v.clone()),
                        _ => Err(PmtConversionError(p.clone(), stringify!($t))),
                    }
                }
            }

            impl TryFrom<Pmt> for $t {
                type Error = PmtConversionError;

                fn try_from(p: Pmt) -> Result<$t, Self::Error> {
                    match p {
                        Pmt::$variant(v) => Ok(v),
                        _ => Err(PmtConversionError(p, stringify!($t))),
                    }
                }
            }
        )*
    };
}

pmt_conversions!(
    String => String,
    bool => Bool,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    Vec<f32> => VecF32,
    Vec<u8> => Blob,
);

impl From<usize> for Pmt {
    fn from(v: usize) -> Self {
        Pmt::Usize(v)
    }
}

impl TryFrom<&Pmt> for usize {
    type Error = PmtConversionError;

    fn try_from(p: &Pmt) -> Result<usize, Self::Error> {
        match p {
            Pmt::Usize(v) => Ok(*v),
            Pmt::U32(v) => Ok(*v as usize),
            Pmt::U64(v) => usize::try_from(*v).map_err(|_| PmtConversionError(p.clone(), "usize")),
            _ => Err(PmtConversionError(p.clone(), "usize")),
        }
    }
}

impl TryFrom<Pmt> for usize {
    type Error = PmtConversionError;

    fn try_from(p: Pmt) -> Result<usize, Self::Error> {
        usize::try_from(&p)
    }
}

impl From<&str> for Pmt {
    fn from(v: &str) -> Self {
        Pmt::String(v.to_string())
    }
}

impl From<()> for Pmt {
    fn from(_: ()) -> Self {
        Pmt::Null
    }
}
