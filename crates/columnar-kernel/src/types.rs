#![forbid(unsafe_code)]

use crate::error::ColumnError;
use chrono::{Datelike, NaiveDate};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// The concrete variant of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Bool,
    Int,
    Long,
    Double,
    Date,
    String,
    Object,
    Const,
}

impl ColumnKind {
    /// Human readable variant name used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            ColumnKind::Bool => "Boolean",
            ColumnKind::Int => "Integer",
            ColumnKind::Long => "Long",
            ColumnKind::Double => "Double",
            ColumnKind::Date => "Date",
            ColumnKind::String => "String",
            ColumnKind::Object => "Object",
            ColumnKind::Const => "Constant",
        }
    }

    /// Position in the dispatch order. Binary operators always run with the
    /// lower-ranked operand on the left.
    pub(crate) fn rank(self) -> u8 {
        match self {
            ColumnKind::Bool => 0,
            ColumnKind::Int => 1,
            ColumnKind::Long => 2,
            ColumnKind::Double => 3,
            ColumnKind::Date => 4,
            ColumnKind::String => 5,
            ColumnKind::Object => 6,
            ColumnKind::Const => 7,
        }
    }

    pub(crate) fn tag(self) -> u8 {
        self.rank() + 1
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            1 => ColumnKind::Bool,
            2 => ColumnKind::Int,
            3 => ColumnKind::Long,
            4 => ColumnKind::Double,
            5 => ColumnKind::Date,
            6 => ColumnKind::String,
            7 => ColumnKind::Object,
            8 => ColumnKind::Const,
            _ => return None,
        })
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Int | ColumnKind::Long | ColumnKind::Double)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single boxed element.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Date(NaiveDate),
    String(Arc<str>),
}

/// A numeric element lifted out of its column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Num {
    Int(i32),
    Long(i64),
    Double(f64),
}

impl Num {
    pub fn as_long(self) -> i64 {
        match self {
            Num::Int(v) => v as i64,
            Num::Long(v) => v,
            Num::Double(v) => v as i64,
        }
    }

    pub fn as_double(self) -> f64 {
        match self {
            Num::Int(v) => v as f64,
            Num::Long(v) => v as f64,
            Num::Double(v) => v,
        }
    }

    pub fn is_double(self) -> bool {
        matches!(self, Num::Double(_))
    }

    pub fn into_value(self) -> Value {
        match self {
            Num::Int(v) => Value::Int(v),
            Num::Long(v) => Value::Long(v),
            Num::Double(v) => Value::Double(v),
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Presence logic: `Null` and `false` are false, every other value is true.
    pub fn is_true(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    /// The column kind that stores this value natively (`None` for `Null`).
    pub fn kind(&self) -> Option<ColumnKind> {
        Some(match self {
            Value::Null => return None,
            Value::Bool(_) => ColumnKind::Bool,
            Value::Int(_) => ColumnKind::Int,
            Value::Long(_) => ColumnKind::Long,
            Value::Double(_) => ColumnKind::Double,
            Value::Date(_) => ColumnKind::Date,
            Value::String(_) => ColumnKind::String,
        })
    }

    pub fn kind_label(&self) -> &'static str {
        match self.kind() {
            Some(kind) => kind.label(),
            None => "Null",
        }
    }

    pub fn as_num(&self) -> Option<Num> {
        match self {
            Value::Int(v) => Some(Num::Int(*v)),
            Value::Long(v) => Some(Num::Long(*v)),
            Value::Double(v) => Some(Num::Double(*v)),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Generic ordering shared by Object columns and mixed-kind comparisons.
    ///
    /// `Null` sorts below every other value and equals itself. Numbers compare
    /// after widening; every other pair must share a kind.
    pub fn try_compare(&self, other: &Value) -> Result<Ordering, ColumnError> {
        match (self, other) {
            (Value::Null, Value::Null) => Ok(Ordering::Equal),
            (Value::Null, _) => Ok(Ordering::Less),
            (_, Value::Null) => Ok(Ordering::Greater),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Ok(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Ok(a.as_ref().cmp(b.as_ref())),
            (a, b) => match (a.as_num(), b.as_num()) {
                (Some(x), Some(y)) => Ok(compare_nums(x, y)),
                _ => Err(ColumnError::incomparable(a.kind_label(), b.kind_label())),
            },
        }
    }

    /// Equality without ordering: values of unrelated kinds are simply unequal.
    pub fn loose_eq(&self, other: &Value) -> bool {
        matches!(self.try_compare(other), Ok(Ordering::Equal))
    }
}

pub(crate) fn compare_nums(a: Num, b: Num) -> Ordering {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => x.cmp(&y),
        (Num::Double(_), _) | (_, Num::Double(_)) => {
            OrderedFloat(a.as_double()).cmp(&OrderedFloat(b.as_double()))
        }
        _ => a.as_long().cmp(&b.as_long()),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => OrderedFloat(*a) == OrderedFloat(*b),
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Date(d) => write!(f, "{:04}-{:02}-{:02}", d.year(), d.month(), d.day()),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<Arc<str>> for Value {
    fn from(value: Arc<str>) -> Self {
        Value::String(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
