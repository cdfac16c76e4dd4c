//! # BSATN
//!
//! An encoder/decoder for BSATN, the Binary Spacetime Algebraic Type
//! Notation: a compact, non-self-describing binary format whose bytes are
//! fixed by the static type of the value, so independent implementations
//! agree byte for byte.
//!
//! ## Wire format
//! | Value | Encoding |
//! |---|---|
//! | `bool` | 1 byte, `0` or `1` |
//! | `u8`/`i8` | 1 byte |
//! | `u16`..`i64` | little-endian, 2/4/8 bytes |
//! | `u128`/`i128` | 16 bytes, low 64 bits first, each half little-endian |
//! | [`U256`]/[`I256`] | 32 bytes, least significant 64-bit word first |
//! | `f32`/`f64` | IEEE-754 bits, little-endian |
//! | string | u32 byte length + UTF-8 |
//! | bytes | u32 length + raw bytes |
//! | `Option<T>` | tag `0` (none) or `1` followed by `T` |
//! | sequence | u32 element count + elements |
//! | sum / enum | 1-byte variant index + the variant's payload |
//! | struct / tuple | fields in declaration order, nothing else |
//!
//! Maps are written as a sequence of `(key, value)` pairs and `char` as its
//! u32 scalar value.
//!
//! ## Dispatch
//! Any type implementing serde's `Serialize`/`Deserialize` can be encoded.
//! [`Writer`] implements `serde::Serializer` and [`Reader`] implements
//! `serde::Deserializer`, so derived impls work unchanged. Types without an
//! impl are rejected at compile time.
//!
//! A derived enum is a sum: its tag is the zero-based variant index. C-like
//! enums that must carry their numeric discriminant, such as `High = 5`,
//! use `#[repr(u8)]` with the re-exported [`Serialize_repr`] and
//! [`Deserialize_repr`] derives instead:
//!
//! ```rust
//! use bsatn::{Deserialize_repr, Serialize_repr, from_slice, to_vec};
//!
//! #[derive(Debug, PartialEq, Serialize_repr, Deserialize_repr)]
//! #[repr(u8)]
//! enum Level {
//!     Low = 1,
//!     High = 5,
//! }
//!
//! assert_eq!(to_vec(&Level::High).unwrap(), [5]);
//! assert_eq!(from_slice::<Level>(&[1]).unwrap(), Level::Low);
//! assert!(from_slice::<Level>(&[2]).is_err());
//! ```
//!
//! ## Safety limits
//! Decoded length prefixes are checked against the ceilings in [`Limits`]
//! before the remaining input is consulted. Use [`from_slice_with_limits`]
//! or [`Reader::with_limits`] to change them.
//!
//! ## Example
//! ```rust
//! use bsatn::{from_slice, to_vec};
//! use serde::{Deserialize, Serialize};
//! use serde_bytes::ByteBuf;
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Player {
//!     id: u64,
//!     name: String,
//!     avatar: Option<ByteBuf>,
//! }
//!
//! let player = Player { id: 1, name: "ana".to_string(), avatar: None };
//! let bytes = to_vec(&player).unwrap();
//! assert_eq!(bytes, [1, 0, 0, 0, 0, 0, 0, 0, 3, 0, 0, 0, b'a', b'n', b'a', 0]);
//! assert_eq!(from_slice::<Player>(&bytes).unwrap(), player);
//! ```

use serde::{Deserialize, Serialize};

mod de;
pub mod error;
pub mod limits;
mod reader;
mod ser;
mod sum;
pub mod types;
mod writer;

pub use error::{BsatnError, LengthKind, Result};
pub use limits::Limits;
pub use reader::Reader;
pub use ser::Compound;
pub use sum::{Alternative, OptionExt, SumType};
pub use types::{ConnectionId, I256, Identity, ScheduleAt, TimeDuration, Timestamp, U256};
pub use writer::Writer;

pub use serde_repr::{Deserialize_repr, Serialize_repr};

pub use error::BsatnError as Error;

/// Encodes `value` into a fresh buffer.
pub fn to_vec<T: ?Sized + Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut writer = Writer::new();
    writer.serialize(value).inspect_err(|e| {
        tracing::debug!(error = %e, "bsatn encode failed");
    })?;
    Ok(writer.into_buffer())
}

/// Decodes a `T` from the front of `slice` using the default [`Limits`].
///
/// Bytes after the value are left alone; use [`from_slice_exact`] to reject
/// them.
pub fn from_slice<'de, T: Deserialize<'de>>(slice: &'de [u8]) -> Result<T> {
    from_slice_with_limits(slice, Limits::default())
}

pub fn from_slice_with_limits<'de, T: Deserialize<'de>>(
    slice: &'de [u8],
    limits: Limits,
) -> Result<T> {
    let mut reader = Reader::with_limits(slice, limits);
    reader.deserialize().inspect_err(|e| {
        tracing::debug!(
            error = %e,
            position = reader.position(),
            len = slice.len(),
            "bsatn decode failed"
        );
    })
}

/// Like [`from_slice`], but fails with [`BsatnError::TrailingBytes`] unless
/// the value consumes the whole buffer.
pub fn from_slice_exact<'de, T: Deserialize<'de>>(slice: &'de [u8]) -> Result<T> {
    let mut reader = Reader::new(slice);
    let value = reader.deserialize()?;
    match reader.remaining_bytes() {
        0 => Ok(value),
        n => Err(BsatnError::TrailingBytes(n)),
    }
}
