use std::fmt::Display;

use thiserror::Error;

/// Which length-prefixed shape a length field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthKind {
    String,
    Bytes,
    Sequence,
}

impl Display for LengthKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LengthKind::String => f.write_str("string"),
            LengthKind::Bytes => f.write_str("byte array"),
            LengthKind::Sequence => f.write_str("sequence"),
        }
    }
}

/// Every failure the codec can report.
///
/// Decoding errors are terminal: once one is returned the reader position is
/// unspecified and the enclosing value must be abandoned.
#[derive(Debug, Error)]
pub enum BsatnError {
    #[error("buffer underrun: requested {requested} bytes, {available} available")]
    BufferUnderrun { requested: usize, available: usize },

    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),

    #[error("invalid UTF-8 in string: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("invalid char scalar value {0:#x}")]
    InvalidChar(u32),

    #[error("invalid option tag {0}")]
    InvalidOptionTag(u8),

    #[error("invalid sum tag {tag} for {variants} variants")]
    InvalidSumTag { tag: u8, variants: usize },

    #[error("option has no value")]
    Absent,

    #[error("requested alternative {requested} but tag {active} is active")]
    WrongAlternative { requested: &'static str, active: u8 },

    #[error("{kind} length {len} exceeds sanity limit {limit}")]
    LengthLimit {
        kind: LengthKind,
        len: u32,
        limit: u32,
    },

    #[error("{kind} length {len} does not fit in a 32-bit length prefix")]
    LengthOverflow { kind: LengthKind, len: usize },

    #[error("variant index {0} does not fit in a single tag byte")]
    TooManyVariants(u32),

    #[error("{0} trailing bytes after the decoded value")]
    TrailingBytes(usize),

    #[error("unsupported by BSATN: {0}")]
    Unsupported(&'static str),

    #[error("{0}")]
    Custom(String),
}

impl serde::ser::Error for BsatnError {
    fn custom<T: Display>(msg: T) -> Self {
        BsatnError::Custom(msg.to_string())
    }
}

impl serde::de::Error for BsatnError {
    fn custom<T: Display>(msg: T) -> Self {
        BsatnError::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BsatnError>;
