#![forbid(unsafe_code)]

//! Binary framing for columns.
//!
//! A serialized column is a kind byte followed by the body of that kind.
//! Fixed-width kinds (bool, int, long, double) write a format byte, a `u32`
//! row count, and the raw big-endian values; format 2 puts the validity map
//! (as `u64` words) in front of the values and writes null slots as zero.
//! Date, string and object columns write every row through an
//! [`ObjectCodec`]. A constant column writes its row count and fill value.

use crate::bitmap::BitVec;
use crate::column::{dispatch, Column};
use crate::constant::ConstColumn;
use crate::element::{ensure_remaining, Element};
use crate::error::CodecError;
use crate::typed::TypedColumn;
use crate::types::{ColumnKind, Value};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::{Datelike, NaiveDate};

const FORMAT_PLAIN: u8 = 1;
const FORMAT_NULLABLE: u8 = 2;

const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_LONG: u8 = 3;
const TAG_DOUBLE: u8 = 4;
const TAG_DATE: u8 = 5;
const TAG_STRING: u8 = 6;

/// Writes and reads single boxed values.
pub trait ObjectCodec: Send + Sync {
    fn write_value(&self, value: &Value, out: &mut BytesMut);
    fn read_value(&self, input: &mut Bytes) -> Result<Value, CodecError>;
}

/// Tag-prefixed encoding of every [`Value`] variant.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryObjectCodec;

impl ObjectCodec for BinaryObjectCodec {
    fn write_value(&self, value: &Value, out: &mut BytesMut) {
        match value {
            Value::Null => out.put_u8(TAG_NULL),
            Value::Bool(v) => {
                out.put_u8(TAG_BOOL);
                out.put_u8(*v as u8);
            }
            Value::Int(v) => {
                out.put_u8(TAG_INT);
                out.put_i32(*v);
            }
            Value::Long(v) => {
                out.put_u8(TAG_LONG);
                out.put_i64(*v);
            }
            Value::Double(v) => {
                out.put_u8(TAG_DOUBLE);
                out.put_f64(*v);
            }
            Value::Date(d) => {
                out.put_u8(TAG_DATE);
                out.put_i32(d.num_days_from_ce());
            }
            Value::String(s) => {
                out.put_u8(TAG_STRING);
                out.put_u32(s.len() as u32);
                out.put_slice(s.as_bytes());
            }
        }
    }

    fn read_value(&self, input: &mut Bytes) -> Result<Value, CodecError> {
        ensure_remaining(input, 1)?;
        Ok(match input.get_u8() {
            TAG_NULL => Value::Null,
            TAG_BOOL => {
                ensure_remaining(input, 1)?;
                Value::Bool(input.get_u8() != 0)
            }
            TAG_INT => {
                ensure_remaining(input, 4)?;
                Value::Int(input.get_i32())
            }
            TAG_LONG => {
                ensure_remaining(input, 8)?;
                Value::Long(input.get_i64())
            }
            TAG_DOUBLE => {
                ensure_remaining(input, 8)?;
                Value::Double(input.get_f64())
            }
            TAG_DATE => {
                ensure_remaining(input, 4)?;
                let days = input.get_i32();
                Value::Date(
                    NaiveDate::from_num_days_from_ce_opt(days)
                        .ok_or(CodecError::InvalidDate(days))?,
                )
            }
            TAG_STRING => {
                ensure_remaining(input, 4)?;
                let len = input.get_u32() as usize;
                ensure_remaining(input, len)?;
                let raw = input.split_to(len);
                let text = std::str::from_utf8(&raw).map_err(|_| CodecError::InvalidUtf8)?;
                Value::String(text.into())
            }
            other => return Err(CodecError::UnknownValueTag(other)),
        })
    }
}

impl<T: Element> TypedColumn<T> {
    pub fn write_to(&self, codec: &dyn ObjectCodec, out: &mut BytesMut) {
        let buf = self.buffer();
        let validity = buf.validity().filter(|_| T::FIXED_WIDTH);
        out.put_u8(if validity.is_some() {
            FORMAT_NULLABLE
        } else {
            FORMAT_PLAIN
        });
        out.put_u32(buf.len() as u32);

        if !T::FIXED_WIDTH {
            for row in buf.iter() {
                codec.write_value(&row.map_or(Value::Null, Element::to_value), out);
            }
            return;
        }
        if let Some(bits) = validity {
            for word in bits.as_words() {
                out.put_u64(*word);
            }
        }
        for (i, v) in buf.values().iter().enumerate() {
            if buf.is_null(i) {
                T::placeholder().put_fixed(out);
            } else {
                v.put_fixed(out);
            }
        }
    }

    /// Reads a body written by [`TypedColumn::write_to`]. The result is not
    /// temporary.
    pub fn read_from(codec: &dyn ObjectCodec, input: &mut Bytes) -> Result<Self, CodecError> {
        ensure_remaining(input, 5)?;
        let format = input.get_u8();
        let len = input.get_u32() as usize;

        if !T::FIXED_WIDTH {
            if format != FORMAT_PLAIN {
                return Err(CodecError::UnknownFormat(format));
            }
            let mut rows = Vec::with_capacity(len.min(input.remaining()));
            for _ in 0..len {
                let value = codec.read_value(input)?;
                if value.is_null() {
                    rows.push(None);
                    continue;
                }
                let elem = T::from_value(&value).ok_or(CodecError::KindMismatch {
                    expected: T::KIND.label(),
                    actual: value.kind_label(),
                })?;
                rows.push(Some(elem));
            }
            let mut col = Self::from_options(rows);
            col.set_temporary(false);
            return Ok(col);
        }

        let validity = match format {
            FORMAT_PLAIN => None,
            FORMAT_NULLABLE => {
                let words = len.div_ceil(64);
                ensure_remaining(input, words * 8)?;
                let words = (0..words).map(|_| input.get_u64()).collect();
                Some(BitVec::from_words(words, len))
            }
            other => return Err(CodecError::UnknownFormat(other)),
        };
        ensure_remaining(input, len * T::width())?;
        let mut values = Vec::with_capacity(len);
        for _ in 0..len {
            values.push(T::get_fixed(input)?);
        }
        Ok(Self::from_parts(values, validity, false))
    }
}

impl ConstColumn {
    pub fn write_to(&self, codec: &dyn ObjectCodec, out: &mut BytesMut) {
        out.put_u32(self.len() as u32);
        codec.write_value(self.value(), out);
    }

    pub fn read_from(codec: &dyn ObjectCodec, input: &mut Bytes) -> Result<Self, CodecError> {
        ensure_remaining(input, 4)?;
        let len = input.get_u32() as usize;
        let value = codec.read_value(input)?;
        let mut col = ConstColumn::new(value, len);
        col.set_temporary(false);
        Ok(col)
    }
}

impl Column {
    /// Kind byte plus body, using [`BinaryObjectCodec`] for boxed rows.
    pub fn serialize(&self) -> Bytes {
        self.serialize_with(&BinaryObjectCodec)
    }

    pub fn serialize_with(&self, codec: &dyn ObjectCodec) -> Bytes {
        let mut out = BytesMut::new();
        out.put_u8(self.kind().tag());
        dispatch!(self, c => c.write_to(codec, &mut out), k => k.write_to(codec, &mut out));
        out.freeze()
    }

    pub fn deserialize(input: &[u8]) -> Result<Column, CodecError> {
        Self::deserialize_with(&BinaryObjectCodec, input)
    }

    pub fn deserialize_with(codec: &dyn ObjectCodec, input: &[u8]) -> Result<Column, CodecError> {
        let mut input = Bytes::copy_from_slice(input);
        ensure_remaining(&input, 1)?;
        let tag = input.get_u8();
        let kind = ColumnKind::from_tag(tag).ok_or(CodecError::UnknownKind(tag))?;
        let column = match kind {
            ColumnKind::Bool => Column::Bool(TypedColumn::read_from(codec, &mut input)?),
            ColumnKind::Int => Column::Int(TypedColumn::read_from(codec, &mut input)?),
            ColumnKind::Long => Column::Long(TypedColumn::read_from(codec, &mut input)?),
            ColumnKind::Double => Column::Double(TypedColumn::read_from(codec, &mut input)?),
            ColumnKind::Date => Column::Date(TypedColumn::read_from(codec, &mut input)?),
            ColumnKind::String => Column::String(TypedColumn::read_from(codec, &mut input)?),
            ColumnKind::Object => Column::Object(TypedColumn::read_from(codec, &mut input)?),
            ColumnKind::Const => Column::Const(ConstColumn::read_from(codec, &mut input)?),
        };
        if input.has_remaining() {
            log::debug!(
                "{} trailing bytes after serialized {} column",
                input.remaining(),
                kind
            );
        }
        Ok(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed::{IntColumn, StringColumn};
    use pretty_assertions::assert_eq;

    #[test]
    fn fixed_width_picks_format_by_nulls() {
        let plain = Column::from(IntColumn::from_slice(&[1, 2])).serialize();
        assert_eq!(plain[1], FORMAT_PLAIN);
        assert_eq!(plain.len(), 1 + 1 + 4 + 2 * 4);

        let nullable = Column::from(IntColumn::from_options([Some(1), None])).serialize();
        assert_eq!(nullable[1], FORMAT_NULLABLE);
        assert_eq!(nullable.len(), 1 + 1 + 4 + 8 + 2 * 4);
    }

    #[test]
    fn strings_go_through_the_codec() {
        let col = Column::from(StringColumn::from_options([Some("héllo".into()), None]));
        let back = Column::deserialize(&col.serialize()).unwrap();
        assert_eq!(back, col);
        assert!(!back.is_temporary());
    }

    #[test]
    fn truncated_and_unknown_inputs_fail() {
        let bytes = Column::from(IntColumn::from_slice(&[1, 2, 3])).serialize();
        assert!(matches!(
            Column::deserialize(&bytes[..bytes.len() - 1]),
            Err(CodecError::UnexpectedEof { .. })
        ));
        assert_eq!(Column::deserialize(&[42]), Err(CodecError::UnknownKind(42)));
        assert_eq!(
            BinaryObjectCodec.read_value(&mut Bytes::from_static(&[9])),
            Err(CodecError::UnknownValueTag(9))
        );
    }
}
