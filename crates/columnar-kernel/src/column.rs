#![forbid(unsafe_code)]

use crate::constant::ConstColumn;
use crate::element::Element;
use crate::error::ColumnError;
use crate::typed::{
    BoolColumn, DateColumn, DoubleColumn, IntColumn, LongColumn, ObjectColumn, StringColumn,
    TypedColumn,
};
use crate::types::{ColumnKind, Value};
use std::cmp::Ordering;

/// Any column: one of the typed variants or a broadcast constant.
#[derive(Clone, Debug)]
pub enum Column {
    Bool(BoolColumn),
    Int(IntColumn),
    Long(LongColumn),
    Double(DoubleColumn),
    Date(DateColumn),
    String(StringColumn),
    Object(ObjectColumn),
    Const(ConstColumn),
}

/// Runs `$typed` with `$c` bound to the typed variant, or `$constant` with
/// `$k` bound to the constant.
macro_rules! dispatch {
    ($column:expr, $c:ident => $typed:expr, $k:ident => $constant:expr) => {
        match $column {
            Column::Bool($c) => $typed,
            Column::Int($c) => $typed,
            Column::Long($c) => $typed,
            Column::Double($c) => $typed,
            Column::Date($c) => $typed,
            Column::String($c) => $typed,
            Column::Object($c) => $typed,
            Column::Const($k) => $constant,
        }
    };
}
pub(crate) use dispatch;

impl Column {
    /// Builds a column of `kind` from boxed values; `Null` is accepted
    /// everywhere, other values must fit the kind.
    pub fn from_values(kind: ColumnKind, values: &[Value]) -> Result<Column, ColumnError> {
        Ok(match kind {
            ColumnKind::Bool => Column::Bool(TypedColumn::try_from_values(values)?),
            ColumnKind::Int => Column::Int(TypedColumn::try_from_values(values)?),
            ColumnKind::Long => Column::Long(TypedColumn::try_from_values(values)?),
            ColumnKind::Double => Column::Double(TypedColumn::try_from_values(values)?),
            ColumnKind::Date => Column::Date(TypedColumn::try_from_values(values)?),
            ColumnKind::String => Column::String(TypedColumn::try_from_values(values)?),
            ColumnKind::Object => Column::Object(TypedColumn::try_from_values(values)?),
            ColumnKind::Const => {
                let first = values.first().cloned().unwrap_or_default();
                if let Some(other) = values.iter().find(|v| **v != first) {
                    return Err(ColumnError::TypeMismatch {
                        expected: ColumnKind::Const.label(),
                        actual: other.kind_label(),
                    });
                }
                Column::Const(ConstColumn::new(first, values.len()))
            }
        })
    }

    /// Picks the narrowest kind holding every value: a single runtime kind
    /// stays typed, anything mixed (or all-null) becomes Object.
    pub fn infer(values: &[Value]) -> Column {
        let mut kinds = values.iter().filter_map(Value::kind);
        let kind = match kinds.next() {
            Some(first) if kinds.all(|k| k == first) => first,
            _ => ColumnKind::Object,
        };
        Column::from_values(kind, values)
            .unwrap_or_else(|_| Column::Object(ObjectColumn::from_options(values.iter().cloned().map(Some))))
    }

    pub fn kind(&self) -> ColumnKind {
        dispatch!(self, c => c.kind(), _k => ColumnKind::Const)
    }

    /// Variant label, for diagnostics only.
    pub fn data_type(&self) -> &'static str {
        self.kind().label()
    }

    pub fn len(&self) -> usize {
        dispatch!(self, c => c.len(), k => k.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_temporary(&self) -> bool {
        dispatch!(self, c => c.is_temporary(), k => k.is_temporary())
    }

    pub fn set_temporary(&mut self, temporary: bool) {
        dispatch!(self, c => c.set_temporary(temporary), k => k.set_temporary(temporary))
    }

    /// See [`TypedColumn::retain`].
    pub fn retain(self, ref_origin: bool) -> Column {
        dispatch!(self, c => c.retain(ref_origin).into_column(), k => {
            let mut k = k;
            k.set_temporary(false);
            Column::Const(k)
        })
    }

    pub fn dup(&self) -> Column {
        dispatch!(self, c => c.dup().into_column(), k => {
            let mut k = k.clone();
            k.set_temporary(true);
            Column::Const(k)
        })
    }

    /// Value at 1-based `pos`, boxed.
    pub fn value_at(&self, pos: usize) -> Value {
        dispatch!(self, c => c.get_value(pos), k => k.value().clone())
    }

    pub fn is_null(&self, pos: usize) -> bool {
        dispatch!(self, c => c.is_null(pos), k => k.value().is_null())
    }

    pub fn to_values(&self) -> Vec<Value> {
        dispatch!(self, c => c.to_values(), k => vec![k.value().clone(); k.len()])
    }

    /// Boxes every row into a generic Object column.
    pub fn to_object(&self) -> ObjectColumn {
        match self {
            Column::Object(c) => c.clone(),
            other => ObjectColumn::from_options(other.to_values().into_iter().map(Some)),
        }
    }

    /// Expands a constant; typed columns are returned unchanged.
    pub fn materialize(self) -> Column {
        match self {
            Column::Const(k) => k.materialize(),
            other => other,
        }
    }

    /// Copies positions `start..end` (end exclusive).
    pub fn slice(&self, start: usize, end: usize) -> Column {
        dispatch!(self, c => c.slice(start, end).into_column(), k => {
            Column::Const(ConstColumn::new(k.value().clone(), end - start))
        })
    }

    pub fn take(&self, positions: &[usize]) -> Column {
        dispatch!(self, c => c.take(positions).into_column(), k => {
            Column::Const(ConstColumn::new(k.value().clone(), positions.len()))
        })
    }

    /// Gathers rows; position `0` yields a null row.
    pub fn take_checked(&self, positions: &[usize]) -> Column {
        dispatch!(self, c => c.take_checked(positions).into_column(), k => {
            let values: Vec<Value> = positions
                .iter()
                .map(|&p| if p == 0 { Value::Null } else { k.value().clone() })
                .collect();
            Column::infer(&values)
        })
    }

    pub fn reverse(&self) -> Column {
        dispatch!(self, c => c.reverse().into_column(), k => Column::Const(k.clone()))
    }

    pub fn count(&self) -> usize {
        dispatch!(self, c => c.count(), k => if k.value().is_null() { 0 } else { k.len() })
    }

    pub fn first_non_null(&self) -> Option<Value> {
        dispatch!(self, c => c.first_non_null(), k => {
            (!k.value().is_null() && !k.is_empty()).then(|| k.value().clone())
        })
    }

    pub fn contains(&self, value: &Value) -> bool {
        dispatch!(self, c => c.contains(value), k => !k.is_empty() && k.value().loose_eq(value))
    }

    pub fn first_index_of(&self, value: &Value, start: usize) -> Option<usize> {
        dispatch!(self, c => c.first_index_of(value, start), k => {
            (k.value().loose_eq(value) && start.max(1) <= k.len()).then(|| start.max(1))
        })
    }

    pub fn last_index_of(&self, value: &Value, start: usize) -> Option<usize> {
        dispatch!(self, c => c.last_index_of(value, start), k => {
            let pos = start.min(k.len());
            (k.value().loose_eq(value) && pos >= 1).then_some(pos)
        })
    }

    /// See [`TypedColumn::index_of_all`].
    pub fn index_of_all(
        &self,
        value: &Value,
        start: usize,
        is_sorted: bool,
        from_head: bool,
    ) -> Result<Vec<usize>, ColumnError> {
        dispatch!(self, c => c.index_of_all(value, start, is_sorted, from_head), k => {
            if !k.value().loose_eq(value) || k.is_empty() {
                return Ok(Vec::new());
            }
            Ok(if from_head {
                (start.max(1)..=k.len()).collect()
            } else {
                (1..=start.min(k.len())).rev().collect()
            })
        })
    }

    pub fn member_compare(&self, i: usize, j: usize) -> Result<Ordering, ColumnError> {
        dispatch!(self, c => c.member_compare(i, j), _k => Ok(Ordering::Equal))
    }

    pub fn is_member_equals(&self, i: usize, j: usize) -> bool {
        matches!(self.member_compare(i, j), Ok(Ordering::Equal))
    }

    pub fn hash_row(&self, pos: usize) -> u64 {
        dispatch!(self, c => c.hash_row(pos), k => k.value().hash_elem())
    }

    /// Lexicographic comparison with `other`; a proper prefix sorts first.
    pub fn compare_to(&self, other: &Column) -> Result<Ordering, ColumnError> {
        match (self, other) {
            (Column::Bool(a), Column::Bool(b)) => a.compare_to(b),
            (Column::Int(a), Column::Int(b)) => a.compare_to(b),
            (Column::Long(a), Column::Long(b)) => a.compare_to(b),
            (Column::Double(a), Column::Double(b)) => a.compare_to(b),
            (Column::Date(a), Column::Date(b)) => a.compare_to(b),
            (Column::String(a), Column::String(b)) => a.compare_to(b),
            (Column::Object(a), Column::Object(b)) => a.compare_to(b),
            (a, b) => {
                for pos in 1..=a.len().min(b.len()) {
                    let ord = a.value_at(pos).try_compare(&b.value_at(pos))?;
                    if ord != Ordering::Equal {
                        return Ok(ord);
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
        }
    }

    pub fn is_true(&self) -> BoolColumn {
        dispatch!(self, c => c.is_true(), k => BoolColumn::filled(Some(k.value().is_true()), k.len()))
    }

    pub fn is_false(&self) -> BoolColumn {
        dispatch!(self, c => c.is_false(), k => BoolColumn::filled(Some(!k.value().is_true()), k.len()))
    }

    /// See [`TypedColumn::not`]; a constant gives a filled mask.
    pub fn not(&self) -> BoolColumn {
        dispatch!(self, c => c.not(), k => BoolColumn::filled(Some(!k.value().is_true()), k.len()))
    }

    pub fn is_true_at(&self, pos: usize) -> bool {
        dispatch!(self, c => c.is_true_at(pos), k => k.value().is_true())
    }

    pub fn is_false_at(&self, pos: usize) -> bool {
        !self.is_true_at(pos)
    }

    pub fn contains_true(&self) -> bool {
        dispatch!(self, c => c.contains_true(), k => !k.is_empty() && k.value().is_true())
    }

    pub fn min(&self) -> Result<Option<Value>, ColumnError> {
        dispatch!(self, c => c.min(), k => k.materialize().min())
    }

    pub fn max(&self) -> Result<Option<Value>, ColumnError> {
        dispatch!(self, c => c.max(), k => k.materialize().max())
    }

    pub fn sum(&self) -> Value {
        dispatch!(self, c => c.sum(), k => k.materialize().sum())
    }

    pub fn average(&self) -> Option<f64> {
        dispatch!(self, c => c.average(), k => k.materialize().average())
    }
}

impl PartialEq for Column {
    /// Kind and row-wise equality.
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && matches!(self.compare_to(other), Ok(Ordering::Equal))
    }
}

macro_rules! impl_from_typed {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Column {
                fn from(column: $ty) -> Self {
                    Column::$variant(column)
                }
            }
        )*
    };
}

impl_from_typed! {
    Bool => BoolColumn,
    Int => IntColumn,
    Long => LongColumn,
    Double => DoubleColumn,
    Date => DateColumn,
    String => StringColumn,
    Object => ObjectColumn,
    Const => ConstColumn,
}
