//! In-memory typed columns and the vectorized operators over them.
//!
//! This crate focuses on:
//! - Typed column storage (bool, int, long, double, date, string, object) with
//!   an optional validity map, plus a broadcast constant column.
//! - Copy-on-write buffers: an operator reuses its receiver's storage only when
//!   the receiver is a temporary nobody else shares.
//! - Row-wise relations, arithmetic, and mask refinement between two columns or
//!   a column and a scalar.
//! - Selection, merging, top-k, binary search, sorting, and a binary frame for
//!   persisting columns.
//!
//! Row positions in the public API are 1-based.

#![forbid(unsafe_code)]

mod arith;
mod bitmap;
mod buffer;
mod calendar;
mod codec;
mod column;
mod combine;
mod constant;
mod element;
mod error;
mod operand;
mod relation;
mod search;
mod select;
mod sort;
mod stats;
mod topk;
mod typed;
mod types;

pub use crate::arith::{ArithOp, BitOp};
pub use crate::bitmap::BitVec;
pub use crate::calendar::{add_days, day_interval};
pub use crate::codec::{BinaryObjectCodec, ObjectCodec};
pub use crate::column::Column;
pub use crate::constant::ConstColumn;
pub use crate::element::Element;
pub use crate::error::{CodecError, ColumnError};
pub use crate::relation::Relation;
pub use crate::sort::{ParallelSort, RowComparator, SequentialSort, SortOptions, SortService};
pub use crate::stats::ColumnStats;
pub use crate::typed::{
    BoolColumn, DateColumn, DoubleColumn, IntColumn, LongColumn, ObjectColumn, StringColumn,
    TypedColumn,
};
pub use crate::types::{ColumnKind, Num, Value};
