use serde::Deserialize;

use crate::error::{BsatnError, LengthKind, Result};
use crate::limits::Limits;
use crate::types::{I256, U256};

/// Cursor-based BSATN decoder over a borrowed buffer.
///
/// Every read goes through [`Reader::ensure_bytes`], so no read can run past
/// the end of the input. The cursor only moves forward. After an error the
/// cursor position is unspecified and the value being decoded must be
/// abandoned.
///
/// ```
/// use bsatn::Reader;
///
/// let bytes = [0x02, 0x00, 0x00, 0x00, b'h', b'i', 0x01];
/// let mut reader = Reader::new(&bytes);
/// assert_eq!(reader.read_str().unwrap(), "hi");
/// assert!(reader.read_bool().unwrap());
/// assert!(reader.is_eos());
/// ```
#[derive(Debug, Clone)]
pub struct Reader<'de> {
    input: &'de [u8],
    consumed: usize,
    limits: Limits,
}

impl<'de> Reader<'de> {
    pub fn new(input: &'de [u8]) -> Self {
        Self::with_limits(input, Limits::default())
    }

    pub fn with_limits(input: &'de [u8], limits: Limits) -> Self {
        Reader {
            input,
            consumed: 0,
            limits,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Fails with [`BsatnError::BufferUnderrun`] unless at least `count`
    /// bytes remain.
    pub fn ensure_bytes(&self, count: usize) -> Result<()> {
        if self.input.len() < count {
            return Err(BsatnError::BufferUnderrun {
                requested: count,
                available: self.input.len(),
            });
        }
        Ok(())
    }

    fn take(&mut self, count: usize) -> Result<&'de [u8]> {
        self.ensure_bytes(count)?;
        let (head, rest) = self.input.split_at(count);
        self.input = rest;
        self.consumed += count;
        Ok(head)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Strict: only `0` and `1` are valid.
    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(BsatnError::InvalidBool(other)),
        }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        self.take_array().map(u16::from_le_bytes)
    }

    pub fn read_i16_le(&mut self) -> Result<i16> {
        self.take_array().map(i16::from_le_bytes)
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        self.take_array().map(u32::from_le_bytes)
    }

    pub fn read_i32_le(&mut self) -> Result<i32> {
        self.take_array().map(i32::from_le_bytes)
    }

    pub fn read_u64_le(&mut self) -> Result<u64> {
        self.take_array().map(u64::from_le_bytes)
    }

    pub fn read_i64_le(&mut self) -> Result<i64> {
        self.take_array().map(i64::from_le_bytes)
    }

    pub fn read_u128_le(&mut self) -> Result<u128> {
        self.take_array().map(u128::from_le_bytes)
    }

    pub fn read_i128_le(&mut self) -> Result<i128> {
        self.take_array().map(i128::from_le_bytes)
    }

    pub fn read_u256_le(&mut self) -> Result<U256> {
        self.take_array().map(U256::from_le_bytes)
    }

    pub fn read_i256_le(&mut self) -> Result<I256> {
        self.take_array().map(I256::from_le_bytes)
    }

    pub fn read_f32_le(&mut self) -> Result<f32> {
        self.read_u32_le().map(f32::from_bits)
    }

    pub fn read_f64_le(&mut self) -> Result<f64> {
        self.read_u64_le().map(f64::from_bits)
    }

    /// Reads a length-prefixed string without copying it out of the input.
    pub fn read_str(&mut self) -> Result<&'de str> {
        let len = self.read_len(LengthKind::String)?;
        Ok(std::str::from_utf8(self.take(len)?)?)
    }

    pub fn read_string(&mut self) -> Result<String> {
        self.read_str().map(str::to_owned)
    }

    /// Reads a length-prefixed byte array without copying it out of the input.
    pub fn read_slice(&mut self) -> Result<&'de [u8]> {
        let len = self.read_len(LengthKind::Bytes)?;
        self.take(len)
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        self.read_slice().map(<[u8]>::to_vec)
    }

    /// Reads exactly `count` bytes with no length prefix.
    pub fn read_fixed_bytes(&mut self, count: usize) -> Result<&'de [u8]> {
        self.take(count)
    }

    pub fn read_optional<T: Deserialize<'de>>(&mut self) -> Result<Option<T>> {
        match self.read_u8()? {
            0 => Ok(None),
            1 => self.deserialize().map(Some),
            tag => Err(BsatnError::InvalidOptionTag(tag)),
        }
    }

    pub fn read_vector<T: Deserialize<'de>>(&mut self) -> Result<Vec<T>> {
        let count = self.read_len(LengthKind::Sequence)?;
        let mut items = Vec::with_capacity(count.min(self.remaining_bytes()));
        for _ in 0..count {
            items.push(self.deserialize()?);
        }
        Ok(items)
    }

    /// Decodes any deserializable value through the serde dispatch layer.
    pub fn deserialize<T: Deserialize<'de>>(&mut self) -> Result<T> {
        T::deserialize(self)
    }

    pub fn is_eos(&self) -> bool {
        self.input.is_empty()
    }

    pub fn remaining_bytes(&self) -> usize {
        self.input.len()
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.consumed
    }

    /// Reads a u32 length prefix and checks it against the configured
    /// ceiling for `kind`. The ceiling is checked before the remaining
    /// input, so a corrupt prefix never drives an allocation.
    pub(crate) fn read_len(&mut self, kind: LengthKind) -> Result<usize> {
        let len = self.read_u32_le()?;
        let limit = match kind {
            LengthKind::String => self.limits.max_string_len,
            LengthKind::Bytes => self.limits.max_bytes_len,
            LengthKind::Sequence => self.limits.max_sequence_len,
        };
        if len > limit {
            tracing::warn!(
                %kind,
                len,
                limit,
                position = self.consumed,
                "rejecting length prefix above sanity limit"
            );
            return Err(BsatnError::LengthLimit { kind, len, limit });
        }
        Ok(len as usize)
    }
}
