use serde::Serialize;

use crate::error::{BsatnError, LengthKind, Result};
use crate::types::{I256, U256};

/// Append-only BSATN encoder.
///
/// The writer owns the buffer it fills. Fixed-width primitives cannot fail;
/// only length-prefixed shapes can, when their length does not fit in the
/// 32-bit prefix. Nothing is written in that case.
///
/// ```
/// use bsatn::Writer;
///
/// let mut writer = Writer::new();
/// writer.write_u64_le(0x0123_4567_89AB_CDEF);
/// writer.write_string("hi").unwrap();
/// assert_eq!(
///     writer.into_buffer(),
///     [0xEF, 0xCD, 0xAB, 0x89, 0x67, 0x45, 0x23, 0x01, 2, 0, 0, 0, b'h', b'i']
/// );
/// ```
#[derive(Debug, Default, Clone)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Writer { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Writer {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn write_i8(&mut self, v: i8) {
        self.buf.push(v as u8);
    }

    pub fn write_u16_le(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i16_le(&mut self, v: i16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u32_le(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i32_le(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u64_le(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i64_le(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Writes the low 64-bit half first, then the high half, each
    /// little-endian. That is exactly the native little-endian layout.
    pub fn write_u128_le(&mut self, v: u128) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Same layout as [`Writer::write_u128_le`]; the sign lives in the high half.
    pub fn write_i128_le(&mut self, v: i128) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_u256_le(&mut self, v: &U256) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_i256_le(&mut self, v: &I256) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_f32_le(&mut self, v: f32) {
        self.write_u32_le(v.to_bits());
    }

    pub fn write_f64_le(&mut self, v: f64) {
        self.write_u64_le(v.to_bits());
    }

    /// Writes a u32 byte length (not a code point count) followed by the
    /// UTF-8 bytes.
    pub fn write_string(&mut self, v: &str) -> Result<()> {
        self.write_len(v.len(), LengthKind::String)?;
        self.buf.extend_from_slice(v.as_bytes());
        Ok(())
    }

    pub fn write_bytes(&mut self, v: &[u8]) -> Result<()> {
        self.write_len(v.len(), LengthKind::Bytes)?;
        self.buf.extend_from_slice(v);
        Ok(())
    }

    /// Writes `v` verbatim, without a length prefix.
    pub fn write_fixed_bytes(&mut self, v: &[u8]) {
        self.buf.extend_from_slice(v);
    }

    pub fn write_optional<T: Serialize>(&mut self, v: &Option<T>) -> Result<()> {
        self.all_or_nothing(|w| match v {
            Some(value) => {
                w.write_u8(1);
                value.serialize(w)
            }
            None => {
                w.write_u8(0);
                Ok(())
            }
        })
    }

    pub fn write_vector<T: Serialize>(&mut self, v: &[T]) -> Result<()> {
        self.all_or_nothing(|w| {
            w.write_len(v.len(), LengthKind::Sequence)?;
            v.iter().try_for_each(|item| item.serialize(&mut *w))
        })
    }

    /// Encodes any serializable value through the serde dispatch layer.
    ///
    /// On failure the buffer is left exactly as it was before the call.
    pub fn serialize<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.all_or_nothing(|w| value.serialize(w))
    }

    /// Runs `f`, dropping whatever it appended if it fails.
    fn all_or_nothing(&mut self, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        let start = self.buf.len();
        f(self).inspect_err(|_| self.buf.truncate(start))
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buf
    }

    /// Moves the encoded bytes out, consuming the writer.
    pub fn into_buffer(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub(crate) fn write_len(&mut self, len: usize, kind: LengthKind) -> Result<()> {
        let len = u32::try_from(len).map_err(|_| BsatnError::LengthOverflow { kind, len })?;
        self.write_u32_le(len);
        Ok(())
    }

    /// Reserves a zeroed count prefix to be filled by [`Writer::patch_len`].
    pub(crate) fn reserve_len(&mut self) -> usize {
        let at = self.buf.len();
        self.buf.extend_from_slice(&[0; 4]);
        at
    }

    pub(crate) fn patch_len(&mut self, at: usize, len: usize, kind: LengthKind) -> Result<()> {
        let len = u32::try_from(len).map_err(|_| BsatnError::LengthOverflow { kind, len })?;
        self.buf[at..at + 4].copy_from_slice(&len.to_le_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_layouts() {
        let mut w = Writer::new();
        w.write_u16_le(0x0102);
        w.write_i32_le(-2);
        w.write_i8(-1);
        assert_eq!(w.buffer(), [0x02, 0x01, 0xFE, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_u128_low_half_first() {
        let mut w = Writer::new();
        w.write_u128_le((0x1111_2222_3333_4444u128 << 64) | 0x5555_6666_7777_8888);
        let bytes = w.into_buffer();
        assert_eq!(bytes[..8], 0x5555_6666_7777_8888u64.to_le_bytes());
        assert_eq!(bytes[8..], 0x1111_2222_3333_4444u64.to_le_bytes());
    }

    #[test]
    fn test_i128_sign_in_high_half() {
        let mut w = Writer::new();
        w.write_i128_le(-2);
        let bytes = w.into_buffer();
        assert_eq!(bytes[..8], (-2i64 as u64).to_le_bytes());
        assert_eq!(bytes[8..], (-1i64).to_le_bytes());
    }

    #[test]
    fn test_floats_use_bit_pattern() {
        let mut w = Writer::new();
        w.write_f32_le(1.0);
        w.write_f64_le(-0.0);
        assert_eq!(
            w.buffer(),
            [0x00, 0x00, 0x80, 0x3F, 0, 0, 0, 0, 0, 0, 0, 0x80]
        );
    }

    #[test]
    fn test_string_length_is_byte_length() {
        let mut w = Writer::new();
        w.write_string("é").unwrap();
        assert_eq!(w.buffer(), [2, 0, 0, 0, 0xC3, 0xA9]);
    }

    #[test]
    fn test_empty_containers() {
        let mut w = Writer::new();
        w.write_string("").unwrap();
        w.write_bytes(&[]).unwrap();
        w.write_vector::<u64>(&[]).unwrap();
        assert_eq!(w.buffer(), [0; 12]);
    }

    #[test]
    fn test_optional() {
        let mut w = Writer::new();
        w.write_optional(&Some(-1i32)).unwrap();
        w.write_optional::<String>(&None).unwrap();
        assert_eq!(w.buffer(), [1, 0xFF, 0xFF, 0xFF, 0xFF, 0]);
    }

    #[test]
    fn test_vector_of_strings() {
        let mut w = Writer::new();
        w.write_vector(&["a", "bc"]).unwrap();
        assert_eq!(
            w.buffer(),
            [2, 0, 0, 0, 1, 0, 0, 0, b'a', 2, 0, 0, 0, b'b', b'c']
        );
    }

    #[test]
    fn test_patch_len() {
        let mut w = Writer::new();
        let at = w.reserve_len();
        w.write_u8(9);
        w.patch_len(at, 1, LengthKind::Sequence).unwrap();
        assert_eq!(w.buffer(), [1, 0, 0, 0, 9]);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_oversize_length_rejected_before_writing() {
        let mut w = Writer::new();
        let err = w
            .write_len(u32::MAX as usize + 1, LengthKind::Bytes)
            .unwrap_err();
        assert!(matches!(
            err,
            BsatnError::LengthOverflow {
                kind: LengthKind::Bytes,
                ..
            }
        ));
        assert!(w.is_empty());
    }

    struct Fails;

    impl Serialize for Fails {
        fn serialize<S>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            Err(serde::ser::Error::custom("refused"))
        }
    }

    #[derive(Serialize)]
    struct Row {
        id: u32,
        bad: Fails,
    }

    #[test]
    fn test_failed_serialize_leaves_buffer_untouched() {
        let mut w = Writer::new();
        w.write_u8(0xAA);
        let err = w.serialize(&Row { id: 7, bad: Fails }).unwrap_err();
        assert!(matches!(err, BsatnError::Custom(ref m) if m == "refused"));
        assert_eq!(w.buffer(), [0xAA]);

        w.serialize(&7u32).unwrap();
        assert_eq!(w.buffer(), [0xAA, 7, 0, 0, 0]);
    }

    #[test]
    fn test_failed_optional_and_vector_roll_back() {
        let mut w = Writer::new();
        assert!(w.write_optional(&Some(Fails)).is_err());
        assert!(w.is_empty());

        assert!(w.write_vector(&[Some(Fails)]).is_err());
        assert!(w.is_empty());

        assert!(w.write_vector(&[(1u8, None), (2u8, Some(Fails))]).is_err());
        assert!(w.is_empty());
    }
}
