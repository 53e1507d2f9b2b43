#![forbid(unsafe_code)]

use crate::column::{dispatch, Column};
use crate::element::Element;
use crate::error::ColumnError;
use crate::operand::Operand;
use crate::typed::{ObjectColumn, TypedColumn};
use crate::types::{ColumnKind, Value};

type Fill<'a, T> = Box<dyn Fn(usize) -> Option<T> + 'a>;

/// Rows of `other` readable as `T`, or `None` when the kinds don't line up.
fn fill_for<'a, T: Element>(other: Operand<'a>) -> Option<Fill<'a, T>> {
    match other {
        Operand::Column(col) => {
            if let Some(src) = T::typed(col) {
                return Some(Box::new(move |i| src.buffer().get(i).cloned()));
            }
            if T::KIND == ColumnKind::Object {
                let values = other.values();
                return Some(Box::new(move |i| values(i).and_then(|v| T::from_value(&v))));
            }
            None
        }
        Operand::Scalar(v) if v.is_null() => Some(Box::new(|_| None)),
        Operand::Scalar(v) => {
            let fill = T::from_value(v)?;
            Some(Box::new(move |_| Some(fill.clone())))
        }
    }
}

fn merge_typed<T: Element>(
    lhs: TypedColumn<T>,
    keep: &dyn Fn(usize) -> bool,
    fill: Fill<'_, T>,
) -> Result<TypedColumn<T>, ColumnError> {
    lhs.update_or_copy(|i, row| Ok(if keep(i) { row.cloned() } else { fill(i) }))
}

fn combine(lhs: Column, mask: &Column, other: Operand<'_>) -> Result<Column, ColumnError> {
    let keep = Operand::of(mask).truths();
    let lhs = lhs.materialize();

    let merged = dispatch!(lhs, c => match fill_for(other) {
        Some(fill) => return Ok(merge_typed(c, &*keep, fill)?.into_column()),
        None => c.into_column(),
    }, k => Column::Const(k));

    log::trace!(
        "combining {} with {}; result degrades to Object",
        merged.data_type(),
        other.label()
    );
    let (left, right) = (Operand::of(&merged).values(), other.values());
    let out = ObjectColumn::from_options((0..merged.len()).map(|i| {
        let v = if keep(i) { left(i) } else { right(i) };
        v.filter(|v| !v.is_null())
    }));
    Ok(Column::Object(out))
}

impl Column {
    /// Row `i` comes from `self` where `mask` is true and from `other`
    /// elsewhere. Mismatched kinds give an Object column.
    pub fn combine(self, mask: &Column, other: &Column) -> Result<Column, ColumnError> {
        combine(self, mask, Operand::of(other))
    }

    pub fn combine_value(self, mask: &Column, value: &Value) -> Result<Column, ColumnError> {
        combine(self, mask, Operand::Scalar(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed::{BoolColumn, IntColumn, StringColumn};
    use pretty_assertions::assert_eq;

    #[test]
    fn same_kind_stays_typed() {
        let a = Column::from(IntColumn::from_slice(&[1, 2, 3]));
        let b = Column::from(IntColumn::from_slice(&[10, 20, 30]));
        let mask = Column::from(BoolColumn::from_slice(&[true, false, true]));
        let out = a.combine(&mask, &b).unwrap();
        assert_eq!(out.kind(), ColumnKind::Int);
        assert_eq!(out.to_values(), vec![Value::Int(1), Value::Int(20), Value::Int(3)]);
    }

    #[test]
    fn mismatched_kinds_degrade_to_object() {
        let a = Column::from(IntColumn::from_slice(&[1, 2]));
        let b = Column::from(StringColumn::from_slice(&["x".into(), "y".into()]));
        let mask = Column::from(BoolColumn::from_slice(&[false, true]));
        let out = a.combine(&mask, &b).unwrap();
        assert_eq!(out.kind(), ColumnKind::Object);
        assert_eq!(out.to_values(), vec![Value::from("x"), Value::Int(2)]);
    }

    #[test]
    fn null_scalar_fills_any_kind() {
        let a = Column::from(IntColumn::from_slice(&[1, 2]));
        let mask = Column::from(BoolColumn::from_slice(&[false, true]));
        let out = a.combine_value(&mask, &Value::Null).unwrap();
        assert_eq!(out.kind(), ColumnKind::Int);
        assert_eq!(out.to_values(), vec![Value::Null, Value::Int(2)]);
    }
}
