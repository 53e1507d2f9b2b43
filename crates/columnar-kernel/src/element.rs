#![forbid(unsafe_code)]

use crate::column::Column;
use crate::error::{CodecError, ColumnError};
use crate::typed::TypedColumn;
use crate::types::{ColumnKind, Num, Value};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::{Datelike, NaiveDate};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Per-kind behavior of the values stored in a [`crate::TypedColumn`].
pub trait Element: Clone + fmt::Debug + Send + Sync + 'static {
    const KIND: ColumnKind;

    /// Elements of fixed-width kinds are framed raw behind a validity map;
    /// the others go through the object codec.
    const FIXED_WIDTH: bool = false;

    /// Filler stored in null slots.
    fn placeholder() -> Self;

    fn to_value(&self) -> Value;

    /// Unboxes a non-null value whose runtime type is exactly this kind.
    fn from_value(value: &Value) -> Option<Self>;

    /// Like [`Element::from_value`] but also accepts a numeric value of
    /// another kind: one that widens to this kind, or a `Long` that fits an
    /// `Int`.
    fn coerce(value: &Value) -> Option<Self> {
        Self::from_value(value)
    }

    fn compare(&self, other: &Self) -> Result<Ordering, ColumnError>;

    /// A present element is true unless it is a boolean `false`.
    fn is_truthy(&self) -> bool {
        true
    }

    /// Object elements may hold `Null`; such slots count as null rows.
    fn is_null_value(&self) -> bool {
        false
    }

    fn to_num(&self) -> Option<Num> {
        None
    }

    /// Narrows an operator result computed at this kind's width.
    fn from_num(_n: Num) -> Option<Self> {
        None
    }

    fn to_date(&self) -> Option<NaiveDate> {
        None
    }

    fn to_str(&self) -> Option<&str> {
        None
    }

    fn hash_elem(&self) -> u64;

    /// Borrows `column` as the typed variant holding this element.
    fn typed(column: &Column) -> Option<&TypedColumn<Self>>;

    fn into_column(column: TypedColumn<Self>) -> Column;

    fn put_fixed(&self, _out: &mut BytesMut) {}

    fn get_fixed(_input: &mut Bytes) -> Result<Self, CodecError> {
        Err(CodecError::KindMismatch {
            expected: Self::KIND.label(),
            actual: "fixed-width",
        })
    }

    /// Encoded size of one fixed-width element.
    fn width() -> usize {
        0
    }
}

pub(crate) fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// FNV-1a, stable across runs (not cryptographic).
pub(crate) fn fnv1a(bytes: &[u8]) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in bytes {
        h ^= *b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    splitmix64(h)
}

pub(crate) fn ensure_remaining(input: &Bytes, needed: usize) -> Result<(), CodecError> {
    if input.remaining() < needed {
        return Err(CodecError::UnexpectedEof {
            needed,
            remaining: input.remaining(),
        });
    }
    Ok(())
}

impl Element for bool {
    const KIND: ColumnKind = ColumnKind::Bool;
    const FIXED_WIDTH: bool = true;

    fn placeholder() -> Self {
        false
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    fn compare(&self, other: &Self) -> Result<Ordering, ColumnError> {
        Ok(self.cmp(other))
    }

    fn is_truthy(&self) -> bool {
        *self
    }

    fn typed(column: &Column) -> Option<&TypedColumn<Self>> {
        match column {
            Column::Bool(c) => Some(c),
            _ => None,
        }
    }

    fn into_column(column: TypedColumn<Self>) -> Column {
        Column::Bool(column)
    }

    fn hash_elem(&self) -> u64 {
        splitmix64(*self as u64)
    }

    fn put_fixed(&self, out: &mut BytesMut) {
        out.put_u8(*self as u8);
    }

    fn get_fixed(input: &mut Bytes) -> Result<Self, CodecError> {
        ensure_remaining(input, 1)?;
        Ok(input.get_u8() != 0)
    }

    fn width() -> usize {
        1
    }
}

impl Element for i32 {
    const KIND: ColumnKind = ColumnKind::Int;
    const FIXED_WIDTH: bool = true;

    fn placeholder() -> Self {
        0
    }

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            Value::Long(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }

    fn compare(&self, other: &Self) -> Result<Ordering, ColumnError> {
        Ok(self.cmp(other))
    }

    fn to_num(&self) -> Option<Num> {
        Some(Num::Int(*self))
    }

    fn typed(column: &Column) -> Option<&TypedColumn<Self>> {
        match column {
            Column::Int(c) => Some(c),
            _ => None,
        }
    }

    fn into_column(column: TypedColumn<Self>) -> Column {
        Column::Int(column)
    }

    fn from_num(n: Num) -> Option<Self> {
        match n {
            Num::Int(v) => Some(v),
            _ => None,
        }
    }

    fn hash_elem(&self) -> u64 {
        splitmix64(*self as i64 as u64)
    }

    fn put_fixed(&self, out: &mut BytesMut) {
        out.put_i32(*self);
    }

    fn get_fixed(input: &mut Bytes) -> Result<Self, CodecError> {
        ensure_remaining(input, 4)?;
        Ok(input.get_i32())
    }

    fn width() -> usize {
        4
    }
}

impl Element for i64 {
    const KIND: ColumnKind = ColumnKind::Long;
    const FIXED_WIDTH: bool = true;

    fn placeholder() -> Self {
        0
    }

    fn to_value(&self) -> Value {
        Value::Long(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    fn coerce(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v as i64),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    fn compare(&self, other: &Self) -> Result<Ordering, ColumnError> {
        Ok(self.cmp(other))
    }

    fn to_num(&self) -> Option<Num> {
        Some(Num::Long(*self))
    }

    fn typed(column: &Column) -> Option<&TypedColumn<Self>> {
        match column {
            Column::Long(c) => Some(c),
            _ => None,
        }
    }

    fn into_column(column: TypedColumn<Self>) -> Column {
        Column::Long(column)
    }

    fn from_num(n: Num) -> Option<Self> {
        Some(n.as_long())
    }

    fn hash_elem(&self) -> u64 {
        splitmix64(*self as u64)
    }

    fn put_fixed(&self, out: &mut BytesMut) {
        out.put_i64(*self);
    }

    fn get_fixed(input: &mut Bytes) -> Result<Self, CodecError> {
        ensure_remaining(input, 8)?;
        Ok(input.get_i64())
    }

    fn width() -> usize {
        8
    }
}

impl Element for f64 {
    const KIND: ColumnKind = ColumnKind::Double;
    const FIXED_WIDTH: bool = true;

    fn placeholder() -> Self {
        0.0
    }

    fn to_value(&self) -> Value {
        Value::Double(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    fn coerce(value: &Value) -> Option<Self> {
        value.as_num().map(Num::as_double)
    }

    fn compare(&self, other: &Self) -> Result<Ordering, ColumnError> {
        Ok(OrderedFloat(*self).cmp(&OrderedFloat(*other)))
    }

    fn to_num(&self) -> Option<Num> {
        Some(Num::Double(*self))
    }

    fn typed(column: &Column) -> Option<&TypedColumn<Self>> {
        match column {
            Column::Double(c) => Some(c),
            _ => None,
        }
    }

    fn into_column(column: TypedColumn<Self>) -> Column {
        Column::Double(column)
    }

    fn from_num(n: Num) -> Option<Self> {
        Some(n.as_double())
    }

    fn hash_elem(&self) -> u64 {
        // Equal under the column ordering must hash equal: fold -0.0 and NaNs.
        let canonical = if *self == 0.0 {
            0.0f64
        } else if self.is_nan() {
            f64::NAN
        } else {
            *self
        };
        splitmix64(canonical.to_bits())
    }

    fn put_fixed(&self, out: &mut BytesMut) {
        out.put_f64(*self);
    }

    fn get_fixed(input: &mut Bytes) -> Result<Self, CodecError> {
        ensure_remaining(input, 8)?;
        Ok(input.get_f64())
    }

    fn width() -> usize {
        8
    }
}

impl Element for NaiveDate {
    const KIND: ColumnKind = ColumnKind::Date;

    fn placeholder() -> Self {
        NaiveDate::MIN
    }

    fn to_value(&self) -> Value {
        Value::Date(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_date()
    }

    fn compare(&self, other: &Self) -> Result<Ordering, ColumnError> {
        Ok(self.cmp(other))
    }

    fn to_date(&self) -> Option<NaiveDate> {
        Some(*self)
    }

    fn typed(column: &Column) -> Option<&TypedColumn<Self>> {
        match column {
            Column::Date(c) => Some(c),
            _ => None,
        }
    }

    fn into_column(column: TypedColumn<Self>) -> Column {
        Column::Date(column)
    }

    fn hash_elem(&self) -> u64 {
        splitmix64(self.num_days_from_ce() as i64 as u64)
    }
}

impl Element for Arc<str> {
    const KIND: ColumnKind = ColumnKind::String;

    fn placeholder() -> Self {
        Arc::from("")
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn compare(&self, other: &Self) -> Result<Ordering, ColumnError> {
        Ok(self.as_ref().cmp(other.as_ref()))
    }

    fn to_str(&self) -> Option<&str> {
        Some(self.as_ref())
    }

    fn typed(column: &Column) -> Option<&TypedColumn<Self>> {
        match column {
            Column::String(c) => Some(c),
            _ => None,
        }
    }

    fn into_column(column: TypedColumn<Self>) -> Column {
        Column::String(column)
    }

    fn hash_elem(&self) -> u64 {
        fnv1a(self.as_bytes())
    }
}

impl Element for Value {
    const KIND: ColumnKind = ColumnKind::Object;

    fn placeholder() -> Self {
        Value::Null
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }

    fn compare(&self, other: &Self) -> Result<Ordering, ColumnError> {
        self.try_compare(other)
    }

    fn is_truthy(&self) -> bool {
        self.is_true()
    }

    fn is_null_value(&self) -> bool {
        self.is_null()
    }

    fn to_num(&self) -> Option<Num> {
        self.as_num()
    }

    fn from_num(n: Num) -> Option<Self> {
        Some(n.into_value())
    }

    fn to_date(&self) -> Option<NaiveDate> {
        self.as_date()
    }

    fn to_str(&self) -> Option<&str> {
        self.as_str()
    }

    fn typed(column: &Column) -> Option<&TypedColumn<Self>> {
        match column {
            Column::Object(c) => Some(c),
            _ => None,
        }
    }

    fn into_column(column: TypedColumn<Self>) -> Column {
        Column::Object(column)
    }

    fn hash_elem(&self) -> u64 {
        match self {
            Value::Null => 0,
            Value::Bool(v) => v.hash_elem(),
            // Numbers hash through their widened form so 1 and 1L agree.
            Value::Int(v) => (*v as i64).hash_elem(),
            Value::Long(v) => v.hash_elem(),
            Value::Double(v) => {
                if v.fract() == 0.0 && v.abs() < 9.0e15 {
                    (*v as i64).hash_elem()
                } else {
                    v.hash_elem()
                }
            }
            Value::Date(d) => d.hash_elem(),
            Value::String(s) => s.hash_elem(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_widens_and_narrows_fitting_longs() {
        assert_eq!(i32::coerce(&Value::Long(7)), Some(7));
        assert_eq!(i32::coerce(&Value::Long(i64::from(i32::MAX) + 1)), None);
        assert_eq!(i32::coerce(&Value::Double(7.0)), None);
        assert_eq!(i64::coerce(&Value::Int(-3)), Some(-3));
        assert_eq!(f64::coerce(&Value::Long(2)), Some(2.0));
        assert_eq!(bool::coerce(&Value::Int(1)), None);
    }
}
