#![forbid(unsafe_code)]

use crate::column::Column;
use crate::error::ColumnError;
use crate::operand::Operand;
use crate::typed::BoolColumn;
use crate::types::{compare_nums, ColumnKind, Num, Value};
use std::cmp::Ordering;

/// Row-wise relational operators. `And`/`Or` use presence truthiness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    And,
    Or,
}

impl Relation {
    /// The relation that holds with the operands swapped.
    pub fn inverse(self) -> Relation {
        match self {
            Relation::Greater => Relation::Less,
            Relation::GreaterEqual => Relation::LessEqual,
            Relation::Less => Relation::Greater,
            Relation::LessEqual => Relation::GreaterEqual,
            other => other,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Relation::Equal => "==",
            Relation::NotEqual => "!=",
            Relation::Greater => ">",
            Relation::GreaterEqual => ">=",
            Relation::Less => "<",
            Relation::LessEqual => "<=",
            Relation::And => "&&",
            Relation::Or => "||",
        }
    }

    fn is_logical(self) -> bool {
        matches!(self, Relation::And | Relation::Or)
    }

    /// Whether an ordering satisfies a comparison relation.
    pub fn test(self, ord: Ordering) -> bool {
        match self {
            Relation::Equal => ord == Ordering::Equal,
            Relation::NotEqual => ord != Ordering::Equal,
            Relation::Greater => ord == Ordering::Greater,
            Relation::GreaterEqual => ord != Ordering::Less,
            Relation::Less => ord == Ordering::Less,
            Relation::LessEqual => ord != Ordering::Greater,
            Relation::And | Relation::Or => false,
        }
    }
}

/// Evaluates one relation at a 0-based row.
pub(crate) type RowTest<'a> = Box<dyn Fn(usize) -> Result<bool, ColumnError> + 'a>;

type RowOrder<'a> = Box<dyn Fn(usize) -> Result<Ordering, ColumnError> + 'a>;

fn cmp_nums(a: Option<Num>, b: Option<Num>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare_nums(a, b),
        (a, b) => a.is_some().cmp(&b.is_some()),
    }
}

/// Builds the row test for `lhs rel rhs`.
///
/// Operands are put in dispatch order first (lower-ranked kind on the left,
/// null scalars last) with the relation inverted on a swap, so both operand
/// orders run the same kernel.
pub(crate) fn row_test<'a>(
    lhs: Operand<'a>,
    rhs: Operand<'a>,
    rel: Relation,
) -> Result<RowTest<'a>, ColumnError> {
    let rank = |op: Operand<'_>| op.kind().map_or(u8::MAX, ColumnKind::rank);
    let (lhs, rhs, rel) = if rank(lhs) > rank(rhs) {
        (rhs, lhs, rel.inverse())
    } else {
        (lhs, rhs, rel)
    };

    if rel.is_logical() {
        let (l, r) = (lhs.truths(), rhs.truths());
        let conjunction = rel == Relation::And;
        return Ok(Box::new(move |i| {
            Ok(if conjunction {
                l(i) && r(i)
            } else {
                l(i) || r(i)
            })
        }));
    }

    use ColumnKind::*;
    let order: RowOrder<'a> = match (lhs.kind(), rhs.kind()) {
        (None, _) | (_, None) | (Some(Object), _) | (_, Some(Object)) => {
            let (l, r) = (lhs.values(), rhs.values());
            Box::new(move |i| {
                l(i).unwrap_or_default()
                    .try_compare(&r(i).unwrap_or_default())
            })
        }
        (Some(a), Some(b)) if a.is_numeric() && b.is_numeric() => {
            let (l, r) = (lhs.nums(), rhs.nums());
            Box::new(move |i| Ok(cmp_nums(l(i), r(i))))
        }
        (Some(Bool), Some(Bool)) => {
            let (l, r) = (lhs.bools(), rhs.bools());
            Box::new(move |i| Ok(l(i).cmp(&r(i))))
        }
        (Some(Date), Some(Date)) => {
            let (l, r) = (lhs.dates(), rhs.dates());
            Box::new(move |i| Ok(l(i).cmp(&r(i))))
        }
        (Some(String), Some(String)) => {
            let (l, r) = (lhs.strs(), rhs.strs());
            Box::new(move |i| Ok(l(i).cmp(&r(i))))
        }
        _ => return Err(ColumnError::incomparable(lhs.label(), rhs.label())),
    };
    Ok(Box::new(move |i| Ok(rel.test(order(i)?))))
}

fn relation_mask(
    lhs: Operand<'_>,
    rhs: Operand<'_>,
    len: usize,
    rel: Relation,
) -> Result<BoolColumn, ColumnError> {
    let test = row_test(lhs, rhs, rel)?;
    let mut values = Vec::with_capacity(len);
    for i in 0..len {
        values.push(test(i)?);
    }
    Ok(BoolColumn::from_parts(values, None, true))
}

/// Refines `mask` with one more predicate, evaluating only the live rows:
/// under AND the rows still true, under OR the rows not yet true.
fn refine_mask(
    lhs: Operand<'_>,
    rhs: Operand<'_>,
    rel: Relation,
    mask: &mut BoolColumn,
    is_and: bool,
) -> Result<(), ColumnError> {
    if rel.is_logical() {
        return Err(ColumnError::illegal_with(rel.symbol(), lhs.label(), rhs.label()));
    }
    let test = row_test(lhs, rhs, rel)?;

    let mut flips = Vec::new();
    for pos in 1..=mask.len() {
        if mask.is_true_at(pos) != is_and {
            continue;
        }
        if test(pos - 1)? != is_and {
            flips.push(pos);
        }
    }
    for pos in flips {
        mask.set(pos, Some(!is_and));
    }
    Ok(())
}

impl Column {
    /// Evaluates `self rel other` at every row.
    pub fn calc_relation(&self, other: &Column, rel: Relation) -> Result<BoolColumn, ColumnError> {
        relation_mask(Operand::of(self), Operand::of(other), self.len(), rel)
    }

    pub fn calc_relation_value(&self, value: &Value, rel: Relation) -> Result<BoolColumn, ColumnError> {
        relation_mask(Operand::of(self), Operand::Scalar(value), self.len(), rel)
    }

    /// Folds `self rel other` into `mask` (AND when `is_and`, else OR).
    ///
    /// Rows that the fold cannot change are not evaluated. `And`/`Or` are
    /// rejected as `rel`; the caller composes them through `is_and`.
    pub fn calc_relations(
        &self,
        other: &Column,
        rel: Relation,
        mask: &mut BoolColumn,
        is_and: bool,
    ) -> Result<(), ColumnError> {
        refine_mask(Operand::of(self), Operand::of(other), rel, mask, is_and)
    }

    pub fn calc_relations_value(
        &self,
        value: &Value,
        rel: Relation,
        mask: &mut BoolColumn,
        is_and: bool,
    ) -> Result<(), ColumnError> {
        refine_mask(Operand::of(self), Operand::Scalar(value), rel, mask, is_and)
    }
}

impl Column {
    /// IN-list refinement: clears every live `mask` row whose `values` row is
    /// not a member of `self`.
    ///
    /// With `is_sorted` the receiver must be ascending and each row is found
    /// by bisection; otherwise the receiver is scanned. Rows already false
    /// are not looked up, and on error the mask is left as it was.
    pub fn contains_into(
        &self,
        is_sorted: bool,
        values: &Column,
        mask: &mut BoolColumn,
    ) -> Result<(), ColumnError> {
        let mut misses = Vec::new();
        for pos in 1..=mask.len() {
            if !mask.is_true_at(pos) {
                continue;
            }
            let value = values.value_at(pos);
            let found = if is_sorted {
                self.binary_search(&value)? > 0
            } else {
                self.contains(&value)
            };
            if !found {
                misses.push(pos);
            }
        }
        for pos in misses {
            mask.set(pos, Some(false));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed::{DoubleColumn, IntColumn, LongColumn, StringColumn};

    fn rows(mask: &BoolColumn) -> Vec<bool> {
        (1..=mask.len()).map(|p| mask.is_true_at(p)).collect()
    }

    #[test]
    fn mixed_numeric_kinds_widen() {
        let ints = Column::from(IntColumn::from_slice(&[1, 2, 3]));
        let doubles = Column::from(DoubleColumn::from_slice(&[1.5, 2.0, 2.5]));
        let gt = ints.calc_relation(&doubles, Relation::Greater).unwrap();
        assert_eq!(rows(&gt), vec![false, false, true]);

        let longs = Column::from(LongColumn::from_slice(&[3, 2, 1]));
        let eq = longs.calc_relation(&ints, Relation::Equal).unwrap();
        assert_eq!(rows(&eq), vec![false, true, false]);
    }

    #[test]
    fn nulls_sort_low_and_equal_each_other() {
        let a = Column::from(IntColumn::from_options([None, None, Some(1)]));
        let b = Column::from(IntColumn::from_options([None, Some(0), None]));
        assert_eq!(
            rows(&a.calc_relation(&b, Relation::Equal).unwrap()),
            vec![true, false, false]
        );
        assert_eq!(
            rows(&a.calc_relation(&b, Relation::Less).unwrap()),
            vec![false, true, false]
        );
    }

    #[test]
    fn presence_logic_for_and_or() {
        let words = Column::from(StringColumn::from_options([Some("a".into()), None]));
        let and = words
            .calc_relation_value(&Value::Int(0), Relation::And)
            .unwrap();
        assert_eq!(rows(&and), vec![true, false]);
        let or = words
            .calc_relation_value(&Value::Null, Relation::Or)
            .unwrap();
        assert_eq!(rows(&or), vec![true, false]);
    }

    #[test]
    fn incomparable_kinds_are_rejected() {
        let words = Column::from(StringColumn::from_slice(&["a".into()]));
        let err = words
            .calc_relation_value(&Value::Int(1), Relation::Less)
            .unwrap_err();
        assert_eq!(err, ColumnError::incomparable("Integer", "String"));
    }

    #[test]
    fn logical_relation_cannot_refine_a_mask() {
        let ints = Column::from(IntColumn::from_slice(&[1]));
        let mut mask = BoolColumn::from_slice(&[true]);
        assert!(ints
            .calc_relations_value(&Value::Int(1), Relation::And, &mut mask, true)
            .is_err());
    }

    #[test]
    fn or_fold_only_sets_rows() {
        let ints = Column::from(IntColumn::from_slice(&[1, 5, 9]));
        let mut mask = BoolColumn::from_slice(&[true, false, false]);
        ints.calc_relations_value(&Value::Int(4), Relation::Greater, &mut mask, false)
            .unwrap();
        assert_eq!(rows(&mask), vec![true, true, true]);
    }
}
