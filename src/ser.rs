//! serde `Serializer` for [`Writer`].
//!
//! This is the dispatch layer on the encode side: any `Serialize` type is
//! decomposed into the writer primitives. Enum variants become a one-byte
//! tag, structs and tuples become bare field concatenations, and sequences
//! and maps get a u32 element count.

use serde::Serialize;
use serde::ser::{
    SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant, SerializeTuple,
    SerializeTupleStruct, SerializeTupleVariant,
};

use crate::error::{BsatnError, LengthKind, Result};
use crate::writer::Writer;

fn variant_tag(variant_index: u32) -> Result<u8> {
    u8::try_from(variant_index).map_err(|_| BsatnError::TooManyVariants(variant_index))
}

/// State shared by every compound serializer.
///
/// `patch` is set for sequences and maps whose length was not known up
/// front: the count prefix was reserved at that offset and is filled in by
/// `end`.
pub struct Compound<'a> {
    writer: &'a mut Writer,
    patch: Option<usize>,
    count: usize,
}

impl<'a> Compound<'a> {
    fn bare(writer: &'a mut Writer) -> Self {
        Compound {
            writer,
            patch: None,
            count: 0,
        }
    }

    fn counted(writer: &'a mut Writer, len: Option<usize>) -> Result<Self> {
        let patch = match len {
            Some(len) => {
                writer.write_len(len, LengthKind::Sequence)?;
                None
            }
            None => Some(writer.reserve_len()),
        };
        Ok(Compound {
            writer,
            patch,
            count: 0,
        })
    }

    fn element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.count += 1;
        value.serialize(&mut *self.writer)
    }

    fn finish(self) -> Result<()> {
        match self.patch {
            Some(at) => self.writer.patch_len(at, self.count, LengthKind::Sequence),
            None => Ok(()),
        }
    }
}

impl<'a> serde::Serializer for &'a mut Writer {
    type Ok = ();
    type Error = BsatnError;
    type SerializeSeq = Compound<'a>;
    type SerializeTuple = Compound<'a>;
    type SerializeTupleStruct = Compound<'a>;
    type SerializeTupleVariant = Compound<'a>;
    type SerializeMap = Compound<'a>;
    type SerializeStruct = Compound<'a>;
    type SerializeStructVariant = Compound<'a>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.write_bool(v);
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.write_i8(v);
        Ok(())
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.write_i16_le(v);
        Ok(())
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.write_i32_le(v);
        Ok(())
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.write_i64_le(v);
        Ok(())
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        self.write_i128_le(v);
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.write_u8(v);
        Ok(())
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.write_u16_le(v);
        Ok(())
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.write_u32_le(v);
        Ok(())
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.write_u64_le(v);
        Ok(())
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        self.write_u128_le(v);
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.write_f32_le(v);
        Ok(())
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.write_f64_le(v);
        Ok(())
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.write_u32_le(u32::from(v));
        Ok(())
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.write_string(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.write_bytes(v)
    }

    fn serialize_none(self) -> Result<()> {
        self.write_u8(0);
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        self.write_u8(1);
        value.serialize(self)
    }

    // The unit type is the empty product.
    fn serialize_unit(self) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
    ) -> Result<()> {
        self.write_u8(variant_tag(variant_index)?);
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<()> {
        self.write_u8(variant_tag(variant_index)?);
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        Compound::counted(self, len)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Ok(Compound::bare(self))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Ok(Compound::bare(self))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.write_u8(variant_tag(variant_index)?);
        Ok(Compound::bare(self))
    }

    // Maps have no dedicated wire shape; they are written exactly like a
    // sequence of (key, value) pairs.
    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        Compound::counted(self, len)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(Compound::bare(self))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.write_u8(variant_tag(variant_index)?);
        Ok(Compound::bare(self))
    }

    fn is_human_readable(&self) -> bool {
        false
    }
}

impl SerializeSeq for Compound<'_> {
    type Ok = ();
    type Error = BsatnError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl SerializeTuple for Compound<'_> {
    type Ok = ();
    type Error = BsatnError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl SerializeTupleStruct for Compound<'_> {
    type Ok = ();
    type Error = BsatnError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl SerializeTupleVariant for Compound<'_> {
    type Ok = ();
    type Error = BsatnError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl SerializeMap for Compound<'_> {
    type Ok = ();
    type Error = BsatnError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        self.element(key)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(&mut *self.writer)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

// Field names never reach the wire.
impl SerializeStruct for Compound<'_> {
    type Ok = ();
    type Error = BsatnError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

impl SerializeStructVariant for Compound<'_> {
    type Ok = ();
    type Error = BsatnError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn encode<T: Serialize>(value: &T) -> Vec<u8> {
        let mut writer = Writer::new();
        writer.serialize(value).unwrap();
        writer.into_buffer()
    }

    #[derive(Serialize)]
    struct Row {
        id: u32,
        name: String,
        active: bool,
    }

    #[derive(Serialize)]
    enum Color {
        Red,
        Green,
        Blue,
    }

    #[derive(Serialize)]
    enum Shape {
        Circle(f32),
        Rect { w: u8, h: u8 },
        Line(u8, u8),
    }

    #[test]
    fn test_struct_is_bare_concatenation() {
        let row = Row {
            id: 7,
            name: "a".to_string(),
            active: true,
        };
        assert_eq!(encode(&row), [7, 0, 0, 0, 1, 0, 0, 0, b'a', 1]);
    }

    #[test]
    fn test_fieldless_enum_is_one_byte() {
        assert_eq!(encode(&Color::Red), [0]);
        assert_eq!(encode(&Color::Blue), [2]);
        assert_eq!(encode(&vec![Color::Green, Color::Blue]), [2, 0, 0, 0, 1, 2]);
    }

    #[test]
    fn test_sum_variants() {
        assert_eq!(encode(&Shape::Circle(1.0)), [0, 0x00, 0x00, 0x80, 0x3F]);
        assert_eq!(encode(&Shape::Rect { w: 3, h: 4 }), [1, 3, 4]);
        assert_eq!(encode(&Shape::Line(5, 6)), [2, 5, 6]);
    }

    #[test]
    fn test_unit_and_tuples() {
        assert_eq!(encode(&()), Vec::<u8>::new());
        assert_eq!(encode(&(1u8, 2u16)), [1, 2, 0]);
        assert_eq!(encode(&[9u8; 3]), [9, 9, 9]);
    }

    #[test]
    fn test_vec_u8_matches_bytes_framing() {
        let mut writer = Writer::new();
        writer.write_bytes(&[1, 2]).unwrap();
        assert_eq!(encode(&vec![1u8, 2]), writer.into_buffer());
    }

    #[test]
    fn test_map_is_sequence_of_pairs() {
        let map = BTreeMap::from([(1u8, true), (2u8, false)]);
        let pairs = vec![(1u8, true), (2u8, false)];
        assert_eq!(encode(&map), encode(&pairs));
        assert_eq!(encode(&map), [2, 0, 0, 0, 1, 1, 2, 0]);
    }

    #[test]
    fn test_unknown_length_sequence_is_backpatched() {
        struct Odd(Vec<u16>);

        impl Serialize for Odd {
            fn serialize<S: serde::Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                serializer.collect_seq(self.0.iter().filter(|v| *v % 2 == 1))
            }
        }

        assert_eq!(encode(&Odd(vec![1, 2, 3, 4])), [2, 0, 0, 0, 1, 0, 3, 0]);
    }

    #[test]
    fn test_char_is_scalar_value() {
        assert_eq!(encode(&'A'), [0x41, 0, 0, 0]);
    }

    #[test]
    fn test_variant_index_must_fit_in_byte() {
        let mut writer = Writer::new();
        let err = serde::Serializer::serialize_unit_variant(&mut writer, "Big", 256, "V256")
            .unwrap_err();
        assert!(matches!(err, BsatnError::TooManyVariants(256)));
    }
}
