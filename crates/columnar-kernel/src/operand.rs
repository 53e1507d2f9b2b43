#![forbid(unsafe_code)]

//! Right-hand sides of binary operators and typed row readers over them.

use crate::column::{dispatch, Column};
use crate::element::Element;
use crate::types::{ColumnKind, Num, Value};
use chrono::NaiveDate;

/// Reads one row (0-based) of an operand as `X`; `None` is a null row.
pub(crate) type Lane<'a, X> = Box<dyn Fn(usize) -> Option<X> + 'a>;

/// A column or a broadcast scalar. Constants are always decoded to
/// [`Operand::Scalar`].
#[derive(Clone, Copy, Debug)]
pub(crate) enum Operand<'a> {
    Column(&'a Column),
    Scalar(&'a Value),
}

impl<'a> Operand<'a> {
    pub fn of(column: &'a Column) -> Self {
        match column {
            Column::Const(k) => Operand::Scalar(k.value()),
            other => Operand::Column(other),
        }
    }

    /// Runtime kind; `None` for a null scalar.
    pub fn kind(self) -> Option<ColumnKind> {
        match self {
            Operand::Column(c) => Some(c.kind()),
            Operand::Scalar(v) => v.kind(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Operand::Column(c) => c.data_type(),
            Operand::Scalar(v) => v.kind_label(),
        }
    }

    pub fn values(self) -> Lane<'a, Value> {
        match self {
            Operand::Scalar(v) => Box::new(move |_| Some(v.clone())),
            Operand::Column(col) => dispatch!(col,
                c => Box::new(move |i| Some(c.buffer().get(i).map_or(Value::Null, Element::to_value))),
                k => Operand::Scalar(k.value()).values()),
        }
    }

    pub fn nums(self) -> Lane<'a, Num> {
        match self {
            Operand::Scalar(v) => {
                let n = v.as_num();
                Box::new(move |_| n)
            }
            Operand::Column(col) => dispatch!(col,
                c => Box::new(move |i| c.buffer().get(i).and_then(Element::to_num)),
                k => Operand::Scalar(k.value()).nums()),
        }
    }

    pub fn dates(self) -> Lane<'a, NaiveDate> {
        match self {
            Operand::Scalar(v) => {
                let d = v.as_date();
                Box::new(move |_| d)
            }
            Operand::Column(col) => dispatch!(col,
                c => Box::new(move |i| c.buffer().get(i).and_then(Element::to_date)),
                k => Operand::Scalar(k.value()).dates()),
        }
    }

    pub fn strs(self) -> Lane<'a, &'a str> {
        match self {
            Operand::Scalar(v) => {
                let s = v.as_str();
                Box::new(move |_| s)
            }
            Operand::Column(col) => dispatch!(col,
                c => Box::new(move |i| c.buffer().get(i).and_then(Element::to_str)),
                k => Operand::Scalar(k.value()).strs()),
        }
    }

    pub fn bools(self) -> Lane<'a, bool> {
        match self {
            Operand::Scalar(Value::Bool(b)) => {
                let b = *b;
                Box::new(move |_| Some(b))
            }
            Operand::Scalar(_) => Box::new(|_| None),
            Operand::Column(col) => dispatch!(col,
                c => Box::new(move |i| c.buffer().get(i).map(Element::is_truthy)),
                k => Operand::Scalar(k.value()).bools()),
        }
    }

    /// Presence truthiness of each row.
    pub fn truths(self) -> Box<dyn Fn(usize) -> bool + 'a> {
        match self {
            Operand::Scalar(v) => {
                let t = v.is_true();
                Box::new(move |_| t)
            }
            Operand::Column(col) => dispatch!(col,
                c => Box::new(move |i| c.buffer().get(i).is_some_and(Element::is_truthy)),
                k => Operand::Scalar(k.value()).truths()),
        }
    }
}
