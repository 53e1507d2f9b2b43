#![forbid(unsafe_code)]

use crate::calendar::{add_days, day_interval};
use crate::column::Column;
use crate::constant::ConstColumn;
use crate::element::Element;
use crate::error::ColumnError;
use crate::operand::{Lane, Operand};
use crate::typed::{DateColumn, LongColumn, ObjectColumn, StringColumn, TypedColumn};
use crate::types::{ColumnKind, Num, Value};
use chrono::NaiveDate;
use std::sync::Arc;

/// Elementwise arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    IntDivide,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Subtract => "-",
            ArithOp::Multiply => "*",
            ArithOp::Divide => "/",
            ArithOp::Modulo => "%",
            ArithOp::IntDivide => "\\",
        }
    }
}

/// Bitwise operators on Integer and Long columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BitOp {
    And,
    Or,
    Xor,
}

impl BitOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BitOp::And => "&",
            BitOp::Or => "|",
            BitOp::Xor => "^",
        }
    }

    fn apply(self, a: i64, b: i64) -> i64 {
        match self {
            BitOp::And => a & b,
            BitOp::Or => a | b,
            BitOp::Xor => a ^ b,
        }
    }
}

/// How a pair of operand kinds is evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Plan {
    /// Numeric kernel computed at the given width.
    Numeric(ColumnKind),
    /// A date shifted by a day count; `date_on_right` for `days + date`.
    DateShift { negate: bool, date_on_right: bool },
    /// `date - date` as a signed day count.
    DateInterval,
    /// A date receiver shifted by the day counts held in an Object column.
    DateShiftObjects,
    /// A date receiver minus the dates held in an Object column.
    DateIntervalObjects,
    Concat,
    /// Per-row generic arithmetic over boxed values.
    Object,
    /// Both operands are null scalars.
    Null,
}

fn numeric_width(op: ArithOp, l: ColumnKind, r: ColumnKind) -> ColumnKind {
    match op {
        ArithOp::Divide => ColumnKind::Double,
        ArithOp::IntDivide if l == ColumnKind::Int && r == ColumnKind::Int => ColumnKind::Int,
        ArithOp::IntDivide => ColumnKind::Long,
        _ if l.rank() >= r.rank() => l,
        _ => r,
    }
}

fn plan(op: ArithOp, lk: Option<ColumnKind>, rk: Option<ColumnKind>) -> Result<Plan, ColumnError> {
    use ColumnKind::*;
    let label = |k: Option<ColumnKind>| k.map_or("Null", ColumnKind::label);
    let additive = matches!(op, ArithOp::Add | ArithOp::Subtract);
    let subtract = op == ArithOp::Subtract;

    if lk == Some(Date) && rk == Some(Object) && additive {
        return Ok(if subtract {
            Plan::DateIntervalObjects
        } else {
            Plan::DateShiftObjects
        });
    }
    if lk == Some(Object) || rk == Some(Object) {
        return Ok(Plan::Object);
    }
    if lk == Some(Bool) || rk == Some(Bool) {
        return Err(ColumnError::illegal_with(op.symbol(), label(lk), label(rk)));
    }

    match (lk, rk) {
        (None, None) => Ok(Plan::Null),
        (Some(Date), _) | (_, Some(Date)) if !additive => {
            Err(ColumnError::illegal_with(op.symbol(), label(lk), label(rk)))
        }
        (Some(String), _) | (_, Some(String)) if op != ArithOp::Add => {
            Err(ColumnError::illegal_with(op.symbol(), label(lk), label(rk)))
        }
        (Some(Date), Some(Date)) | (None, Some(Date)) if subtract => Ok(Plan::DateInterval),
        (None, Some(Date)) => Ok(Plan::DateShift {
            negate: false,
            date_on_right: true,
        }),
        (Some(Date), None) => Ok(Plan::DateShift {
            negate: subtract,
            date_on_right: false,
        }),
        (Some(Date), Some(r)) if r.is_numeric() => Ok(Plan::DateShift {
            negate: subtract,
            date_on_right: false,
        }),
        (Some(l), Some(Date)) if l.is_numeric() && !subtract => Ok(Plan::DateShift {
            negate: false,
            date_on_right: true,
        }),
        (Some(String), Some(String)) | (Some(String), None) | (None, Some(String)) => {
            Ok(Plan::Concat)
        }
        (Some(l), Some(r)) if l.is_numeric() && r.is_numeric() => {
            Ok(Plan::Numeric(numeric_width(op, l, r)))
        }
        (Some(k), None) | (None, Some(k)) if k.is_numeric() => {
            Ok(Plan::Numeric(numeric_width(op, k, k)))
        }
        _ => Err(ColumnError::TypeMismatch {
            expected: label(lk),
            actual: label(rk),
        }),
    }
}

/// One numeric row at the result width. Integer division or remainder by
/// zero is a null row.
fn num_op(op: ArithOp, a: Num, b: Num, width: ColumnKind) -> Option<Num> {
    match width {
        ColumnKind::Double if op == ArithOp::IntDivide => {
            let q = a.as_double() / b.as_double();
            q.is_finite().then(|| Num::Long(q.trunc() as i64))
        }
        ColumnKind::Double => {
            let (x, y) = (a.as_double(), b.as_double());
            Some(Num::Double(match op {
                ArithOp::Add => x + y,
                ArithOp::Subtract => x - y,
                ArithOp::Multiply => x * y,
                ArithOp::Divide => x / y,
                ArithOp::Modulo | ArithOp::IntDivide => x % y,
            }))
        }
        ColumnKind::Long if op == ArithOp::IntDivide && (a.is_double() || b.is_double()) => {
            num_op(op, a, b, ColumnKind::Double)
        }
        ColumnKind::Int => {
            let (x, y) = (a.as_long() as i32, b.as_long() as i32);
            Some(Num::Int(match op {
                ArithOp::Add => x.wrapping_add(y),
                ArithOp::Subtract => x.wrapping_sub(y),
                ArithOp::Multiply => x.wrapping_mul(y),
                ArithOp::Divide | ArithOp::IntDivide if y == 0 => return None,
                ArithOp::Divide | ArithOp::IntDivide => x.wrapping_div(y),
                ArithOp::Modulo if y == 0 => return None,
                ArithOp::Modulo => x.wrapping_rem(y),
            }))
        }
        _ => {
            let (x, y) = (a.as_long(), b.as_long());
            Some(Num::Long(match op {
                ArithOp::Add => x.wrapping_add(y),
                ArithOp::Subtract => x.wrapping_sub(y),
                ArithOp::Multiply => x.wrapping_mul(y),
                ArithOp::Divide | ArithOp::IntDivide if y == 0 => return None,
                ArithOp::Divide | ArithOp::IntDivide => x.wrapping_div(y),
                ArithOp::Modulo if y == 0 => return None,
                ArithOp::Modulo => x.wrapping_rem(y),
            }))
        }
    }
}

fn shift(date: Option<NaiveDate>, days: Option<Num>, negate: bool) -> Option<NaiveDate> {
    let date = date?;
    match days {
        None => Some(date),
        Some(n) => {
            let n = n.as_long();
            add_days(date, if negate { n.wrapping_neg() } else { n })
        }
    }
}

fn interval(lhs: Option<NaiveDate>, rhs: Option<NaiveDate>) -> Option<i64> {
    Some(day_interval(rhs?, lhs?))
}

fn concat(lhs: Option<&str>, rhs: Option<&str>) -> Option<Arc<str>> {
    let (a, b) = (lhs?, rhs?);
    let mut out = String::with_capacity(a.len() + b.len());
    out.push_str(a);
    out.push_str(b);
    Some(Arc::from(out))
}

impl Value {
    /// Scalar arithmetic with the same kind rules as the column kernels.
    pub fn arith(&self, op: ArithOp, rhs: &Value) -> Result<Value, ColumnError> {
        Ok(match plan(op, self.kind(), rhs.kind())? {
            Plan::Numeric(width) => match (self.as_num(), rhs.as_num()) {
                (Some(a), Some(b)) => num_op(op, a, b, width).map_or(Value::Null, Num::into_value),
                _ => Value::Null,
            },
            Plan::DateShift {
                negate,
                date_on_right,
            } => {
                let (date, days) = if date_on_right {
                    (rhs, self)
                } else {
                    (self, rhs)
                };
                shift(date.as_date(), days.as_num(), negate).into()
            }
            Plan::DateInterval => interval(self.as_date(), rhs.as_date()).into(),
            Plan::Concat => concat(self.as_str(), rhs.as_str()).into(),
            Plan::DateShiftObjects
            | Plan::DateIntervalObjects
            | Plan::Object
            | Plan::Null => Value::Null,
        })
    }
}

/// Rewrites a typed receiver in place (when it owns its buffer) with the
/// receiver row and the right-hand lane.
fn in_place<T, F>(lhs: TypedColumn<T>, rhs: Lane<'_, Num>, f: F) -> Result<TypedColumn<T>, ColumnError>
where
    T: Element,
    F: Fn(Option<Num>, Option<Num>) -> Option<Num>,
{
    lhs.update_or_copy(|i, a| Ok(f(a.and_then(Element::to_num), rhs(i)).and_then(T::from_num)))
}

fn build<T: Element>(len: usize, mut f: impl FnMut(usize) -> Option<T>) -> TypedColumn<T> {
    TypedColumn::from_options((0..len).map(&mut f))
}

fn numeric(lhs: Column, rhs: Operand<'_>, op: ArithOp, width: ColumnKind) -> Result<Column, ColumnError> {
    let row = move |a: Option<Num>, b: Option<Num>| num_op(op, a?, b?, width);
    let len = lhs.len();
    Ok(match (lhs, width) {
        (Column::Int(c), ColumnKind::Int) => Column::Int(in_place(c, rhs.nums(), row)?),
        (Column::Long(c), ColumnKind::Long) => Column::Long(in_place(c, rhs.nums(), row)?),
        (Column::Double(c), ColumnKind::Double) => Column::Double(in_place(c, rhs.nums(), row)?),
        (lhs, width) => {
            let (l, r) = (Operand::of(&lhs).nums(), rhs.nums());
            match width {
                ColumnKind::Int => {
                    Column::Int(build(len, |i| row(l(i), r(i)).and_then(i32::from_num)))
                }
                ColumnKind::Double => {
                    Column::Double(build(len, |i| row(l(i), r(i)).and_then(f64::from_num)))
                }
                _ => Column::Long(build(len, |i| row(l(i), r(i)).and_then(i64::from_num))),
            }
        }
    })
}

fn date_shift(
    lhs: Column,
    rhs: Operand<'_>,
    negate: bool,
    date_on_right: bool,
) -> Result<Column, ColumnError> {
    let len = lhs.len();
    if !date_on_right {
        if let Column::Date(c) = lhs {
            let days = rhs.nums();
            return Ok(Column::Date(
                c.update_or_copy(|i, d| Ok(shift(d.copied(), days(i), negate)))?,
            ));
        }
    }
    let this = Operand::of(&lhs);
    let (dates, days) = if date_on_right {
        (rhs.dates(), this.nums())
    } else {
        (this.dates(), rhs.nums())
    };
    Ok(Column::Date(build(len, |i| shift(dates(i), days(i), negate))))
}

/// Reads one Object row that must hold `expected` (or null).
fn object_row<X>(
    values: &Lane<'_, Value>,
    i: usize,
    expected: ColumnKind,
    read: fn(&Value) -> Option<X>,
) -> Result<Option<X>, ColumnError> {
    match values(i) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => read(&v).map(Some).ok_or(ColumnError::TypeMismatch {
            expected: expected.label(),
            actual: v.kind_label(),
        }),
    }
}

/// `date ± objects`: every Object row must hold a day count for `+` and a
/// date for `-`; the result is a Date or Long column like the typed kernels.
fn date_objects(lhs: Column, rhs: Operand<'_>, subtract: bool) -> Result<Column, ColumnError> {
    let values = rhs.values();
    if subtract {
        let dates = Operand::of(&lhs).dates();
        let rows = (0..lhs.len())
            .map(|i| {
                let other = object_row(&values, i, ColumnKind::Date, Value::as_date)?;
                Ok(interval(dates(i), other))
            })
            .collect::<Result<Vec<_>, ColumnError>>()?;
        return Ok(Column::Long(LongColumn::from_options(rows)));
    }

    let days = |i: usize| object_row(&values, i, ColumnKind::Long, Value::as_num);
    if let Column::Date(c) = lhs {
        return Ok(Column::Date(
            c.update_or_copy(|i, d| Ok(shift(d.copied(), days(i)?, false)))?,
        ));
    }
    let dates = Operand::of(&lhs).dates();
    let rows = (0..lhs.len())
        .map(|i| Ok(shift(dates(i), days(i)?, false)))
        .collect::<Result<Vec<_>, ColumnError>>()?;
    Ok(Column::Date(DateColumn::from_options(rows)))
}

fn object(lhs: Column, rhs: Operand<'_>, op: ArithOp) -> Result<Column, ColumnError> {
    let values = rhs.values();
    let out = match lhs {
        Column::Object(c) => c.update_or_copy(|i, a| {
            let a = a.cloned().unwrap_or_default();
            Ok(Some(a.arith(op, &values(i).unwrap_or_default())?))
        })?,
        lhs => {
            let left = Operand::of(&lhs).values();
            let mut out = ObjectColumn::with_capacity(lhs.len());
            for i in 0..lhs.len() {
                let a = left(i).unwrap_or_default();
                out.push(a.arith(op, &values(i).unwrap_or_default())?);
            }
            out
        }
    };
    Ok(Column::Object(out))
}

fn arith(lhs: Column, rhs: Operand<'_>, op: ArithOp) -> Result<Column, ColumnError> {
    if let (Column::Const(k), Operand::Scalar(v)) = (&lhs, rhs) {
        return Ok(Column::Const(ConstColumn::new(k.value().arith(op, v)?, k.len())));
    }

    let len = lhs.len();
    match plan(op, Operand::of(&lhs).kind(), rhs.kind())? {
        Plan::Numeric(width) => numeric(lhs, rhs, op, width),
        Plan::DateShift {
            negate,
            date_on_right,
        } => date_shift(lhs, rhs, negate, date_on_right),
        Plan::DateInterval => {
            let (l, r) = (Operand::of(&lhs).dates(), rhs.dates());
            Ok(Column::Long(LongColumn::from_options(
                (0..len).map(|i| interval(l(i), r(i))),
            )))
        }
        Plan::Concat => {
            let r = rhs.strs();
            if let Column::String(c) = lhs {
                return Ok(Column::String(
                    c.update_or_copy(|i, a| Ok(concat(a.map(|s| s.as_ref()), r(i))))?,
                ));
            }
            let l = Operand::of(&lhs).strs();
            Ok(Column::String(StringColumn::from_options(
                (0..len).map(|i| concat(l(i), r(i))),
            )))
        }
        Plan::DateShiftObjects => date_objects(lhs, rhs, false),
        Plan::DateIntervalObjects => date_objects(lhs, rhs, true),
        Plan::Object => object(lhs, rhs, op),
        Plan::Null => Ok(Column::Object(ObjectColumn::filled(None, len))),
    }
}

fn bitwise(lhs: Column, rhs: Operand<'_>, op: BitOp) -> Result<Column, ColumnError> {
    use ColumnKind::{Int, Long};
    let (lk, rk) = (Operand::of(&lhs).kind(), rhs.kind());
    let integral = |k: Option<ColumnKind>| matches!(k, None | Some(Int) | Some(Long));
    if !integral(lk) || !integral(rk) {
        return Err(ColumnError::illegal_with(op.symbol(), Operand::of(&lhs).label(), rhs.label()));
    }

    let len = lhs.len();
    let narrow = lk.unwrap_or(Int) == Int && rk.unwrap_or(Int) == Int;
    let r = rhs.nums();
    let row = move |a: Option<Num>, b: Option<Num>| Some(op.apply(a?.as_long(), b?.as_long()));
    Ok(match lhs {
        Column::Int(c) if narrow => Column::Int(
            c.update_or_copy(|i, a| Ok(row(a.map(|v| Num::Int(*v)), r(i)).map(|v| v as i32)))?,
        ),
        Column::Long(c) => Column::Long(
            c.update_or_copy(|i, a| Ok(row(a.map(|v| Num::Long(*v)), r(i))))?,
        ),
        lhs => {
            let l = Operand::of(&lhs).nums();
            if narrow {
                Column::Int(build(len, |i| row(l(i), r(i)).map(|v| v as i32)))
            } else {
                Column::Long(build(len, |i| row(l(i), r(i))))
            }
        }
    })
}

/// Negation and absolute value on a single value.
fn unary_num(value: &Value, op: &'static str, f: fn(Num) -> Num) -> Result<Value, ColumnError> {
    match value {
        Value::Null => Ok(Value::Null),
        v => v
            .as_num()
            .map(|n| f(n).into_value())
            .ok_or_else(|| ColumnError::illegal(op, v.kind_label())),
    }
}

fn neg(n: Num) -> Num {
    match n {
        Num::Int(v) => Num::Int(v.wrapping_neg()),
        Num::Long(v) => Num::Long(v.wrapping_neg()),
        Num::Double(v) => Num::Double(-v),
    }
}

fn abs(n: Num) -> Num {
    match n {
        Num::Int(v) => Num::Int(v.wrapping_abs()),
        Num::Long(v) => Num::Long(v.wrapping_abs()),
        Num::Double(v) => Num::Double(v.abs()),
    }
}

fn unary(column: Column, op: &'static str, f: fn(Num) -> Num) -> Result<Column, ColumnError> {
    fn typed<T: Element>(c: TypedColumn<T>, f: fn(Num) -> Num) -> Result<TypedColumn<T>, ColumnError> {
        c.update_or_copy(|_, v| Ok(v.and_then(Element::to_num).map(f).and_then(T::from_num)))
    }

    Ok(match column {
        Column::Int(c) => Column::Int(typed(c, f)?),
        Column::Long(c) => Column::Long(typed(c, f)?),
        Column::Double(c) => Column::Double(typed(c, f)?),
        Column::Object(c) => {
            Column::Object(c.update_or_copy(|_, v| match v {
                None => Ok(None),
                Some(v) => unary_num(v, op, f).map(Some),
            })?)
        }
        Column::Const(k) => Column::Const(ConstColumn::new(unary_num(k.value(), op, f)?, k.len())),
        other => return Err(ColumnError::illegal(op, other.data_type())),
    })
}

impl Column {
    /// `self op other`, consuming the receiver so an exclusively held
    /// temporary buffer can be reused.
    pub fn arith(self, op: ArithOp, other: &Column) -> Result<Column, ColumnError> {
        arith(self, Operand::of(other), op)
    }

    pub fn arith_value(self, op: ArithOp, value: &Value) -> Result<Column, ColumnError> {
        arith(self, Operand::Scalar(value), op)
    }

    pub fn add(self, other: &Column) -> Result<Column, ColumnError> {
        self.arith(ArithOp::Add, other)
    }

    pub fn subtract(self, other: &Column) -> Result<Column, ColumnError> {
        self.arith(ArithOp::Subtract, other)
    }

    pub fn multiply(self, other: &Column) -> Result<Column, ColumnError> {
        self.arith(ArithOp::Multiply, other)
    }

    pub fn divide(self, other: &Column) -> Result<Column, ColumnError> {
        self.arith(ArithOp::Divide, other)
    }

    pub fn modulo(self, other: &Column) -> Result<Column, ColumnError> {
        self.arith(ArithOp::Modulo, other)
    }

    pub fn int_divide(self, other: &Column) -> Result<Column, ColumnError> {
        self.arith(ArithOp::IntDivide, other)
    }

    pub fn bitwise(self, op: BitOp, other: &Column) -> Result<Column, ColumnError> {
        bitwise(self, Operand::of(other), op)
    }

    pub fn bitwise_value(self, op: BitOp, value: &Value) -> Result<Column, ColumnError> {
        bitwise(self, Operand::Scalar(value), op)
    }

    pub fn negate(self) -> Result<Column, ColumnError> {
        unary(self, "negate", neg)
    }

    pub fn abs(self) -> Result<Column, ColumnError> {
        unary(self, "abs", abs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed::{DoubleColumn, IntColumn};

    #[test]
    fn numeric_widths() {
        assert_eq!(
            plan(ArithOp::Add, Some(ColumnKind::Int), Some(ColumnKind::Long)),
            Ok(Plan::Numeric(ColumnKind::Long))
        );
        assert_eq!(
            plan(ArithOp::Divide, Some(ColumnKind::Int), Some(ColumnKind::Int)),
            Ok(Plan::Numeric(ColumnKind::Double))
        );
        assert_eq!(
            plan(ArithOp::IntDivide, Some(ColumnKind::Int), Some(ColumnKind::Int)),
            Ok(Plan::Numeric(ColumnKind::Int))
        );
        assert_eq!(
            plan(ArithOp::IntDivide, Some(ColumnKind::Double), Some(ColumnKind::Int)),
            Ok(Plan::Numeric(ColumnKind::Long))
        );
    }

    #[test]
    fn fixed_width_wraps_and_zero_divisor_is_null() {
        let ints = Column::from(IntColumn::from_slice(&[i32::MAX, 7, 7]));
        let rhs = Column::from(IntColumn::from_slice(&[1, 0, 2]));
        let sum = ints.clone().add(&rhs).unwrap();
        assert_eq!(sum.value_at(1), Value::Int(i32::MIN));

        let q = ints.int_divide(&rhs).unwrap();
        assert_eq!(q.to_values(), vec![Value::Int(i32::MAX), Value::Null, Value::Int(3)]);
    }

    #[test]
    fn double_int_divide_truncates_to_long() {
        let d = Column::from(DoubleColumn::from_slice(&[7.9, -7.9]));
        let q = d.arith_value(ArithOp::IntDivide, &Value::Int(2)).unwrap();
        assert_eq!(q.to_values(), vec![Value::Long(3), Value::Long(-3)]);
    }

    #[test]
    fn scalar_rules_match_columns() {
        assert_eq!(Value::Int(2).arith(ArithOp::Multiply, &Value::Long(3)), Ok(Value::Long(6)));
        assert_eq!(Value::from("a").arith(ArithOp::Add, &Value::from("b")), Ok(Value::from("ab")));
        assert_eq!(Value::Int(1).arith(ArithOp::Add, &Value::Null), Ok(Value::Null));
        assert!(matches!(
            Value::Bool(true).arith(ArithOp::Add, &Value::Int(1)),
            Err(ColumnError::IllegalOperation { .. })
        ));
        assert!(matches!(
            Value::Int(1).arith(ArithOp::Add, &Value::from("b")),
            Err(ColumnError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn bitwise_on_integers_only() {
        let ints = Column::from(IntColumn::from_slice(&[0b1100, 0b1010]));
        let out = ints.bitwise_value(BitOp::Xor, &Value::Int(0b0110)).unwrap();
        assert_eq!(out.to_values(), vec![Value::Int(0b1010), Value::Int(0b1100)]);

        let d = Column::from(DoubleColumn::from_slice(&[1.0]));
        assert!(d.bitwise_value(BitOp::And, &Value::Int(1)).is_err());
    }

    #[test]
    fn negate_and_abs() {
        let ints = Column::from(IntColumn::from_options([Some(-3), None, Some(i32::MIN)]));
        let out = ints.clone().negate().unwrap();
        assert_eq!(out.to_values(), vec![Value::Int(3), Value::Null, Value::Int(i32::MIN)]);
        let out = ints.abs().unwrap();
        assert_eq!(out.value_at(1), Value::Int(3));
    }
}
