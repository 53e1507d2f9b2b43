#![forbid(unsafe_code)]

//! Bisection over sorted columns.
//!
//! Searches return the 1-based position of a matching row, or the negated
//! 1-based insertion position when the value is absent. Sortedness is the
//! caller's responsibility.

use crate::column::{dispatch, Column};
use crate::element::Element;
use crate::error::ColumnError;
use crate::typed::{cmp_rows, TypedColumn};
use crate::types::{compare_nums, Value};
use std::cmp::Ordering;

type Seek<'a, T> = Box<dyn Fn(Option<&T>) -> Result<Ordering, ColumnError> + 'a>;

/// Orders a row against the search value (row first).
fn seeker<'a, T: Element>(value: &'a Value) -> Result<Seek<'a, T>, ColumnError> {
    if value.is_null() {
        return Ok(Box::new(|row: Option<&T>| {
            Ok(if row.is_some() {
                Ordering::Greater
            } else {
                Ordering::Equal
            })
        }));
    }
    if let Some(target) = T::coerce(value) {
        return Ok(Box::new(move |row: Option<&T>| cmp_rows(row, Some(&target))));
    }
    match value.as_num() {
        Some(n) if T::KIND.is_numeric() => Ok(Box::new(move |row: Option<&T>| {
            Ok(match row.and_then(Element::to_num) {
                Some(r) => compare_nums(r, n),
                None => Ordering::Less,
            })
        })),
        _ => Err(ColumnError::incomparable(T::KIND.label(), value.kind_label())),
    }
}

fn bisect<T: Element>(
    column: &TypedColumn<T>,
    value: &Value,
    start: usize,
    end: usize,
    descending: bool,
) -> Result<isize, ColumnError> {
    let seek = seeker::<T>(value)?;
    let (mut low, mut high) = (start as isize, end as isize);
    while low <= high {
        let mid = low + (high - low) / 2;
        let ord = seek(column.get(mid as usize))?;
        let ord = if descending { ord.reverse() } else { ord };
        match ord {
            Ordering::Less => low = mid + 1,
            Ordering::Greater => high = mid - 1,
            Ordering::Equal => return Ok(mid),
        }
    }
    Ok(-low)
}

impl<T: Element> TypedColumn<T> {
    /// Searches an ascending column.
    pub fn binary_search(&self, value: &Value) -> Result<isize, ColumnError> {
        bisect(self, value, 1, self.len(), false)
    }

    /// Searches positions `start..=end` of an ascending column.
    pub fn binary_search_range(
        &self,
        value: &Value,
        start: usize,
        end: usize,
    ) -> Result<isize, ColumnError> {
        bisect(self, value, start, end, false)
    }

    /// Searches a descending column.
    pub fn desc_binary_search(&self, value: &Value) -> Result<isize, ColumnError> {
        bisect(self, value, 1, self.len(), true)
    }

    pub fn desc_binary_search_range(
        &self,
        value: &Value,
        start: usize,
        end: usize,
    ) -> Result<isize, ColumnError> {
        bisect(self, value, start, end, true)
    }
}

impl Column {
    pub fn binary_search(&self, value: &Value) -> Result<isize, ColumnError> {
        self.binary_search_range(value, 1, self.len())
    }

    pub fn binary_search_range(
        &self,
        value: &Value,
        start: usize,
        end: usize,
    ) -> Result<isize, ColumnError> {
        dispatch!(self, c => c.binary_search_range(value, start, end),
            k => const_search(k.value(), value, start, end, false))
    }

    pub fn desc_binary_search(&self, value: &Value) -> Result<isize, ColumnError> {
        dispatch!(self, c => c.desc_binary_search(value),
            k => const_search(k.value(), value, 1, k.len(), true))
    }
}

fn const_search(
    fill: &Value,
    value: &Value,
    start: usize,
    end: usize,
    descending: bool,
) -> Result<isize, ColumnError> {
    if start > end {
        return Ok(-(start as isize));
    }
    let ord = fill.try_compare(value)?;
    let ord = if descending { ord.reverse() } else { ord };
    Ok(match ord {
        Ordering::Equal => start as isize,
        Ordering::Less => -((end + 1) as isize),
        Ordering::Greater => -(start as isize),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed::{IntColumn, StringColumn};

    #[test]
    fn found_and_insertion_points() {
        let col = IntColumn::from_slice(&[10, 20, 30]);
        assert_eq!(col.binary_search(&Value::Int(20)).unwrap(), 2);
        assert_eq!(col.binary_search(&Value::Int(5)).unwrap(), -1);
        assert_eq!(col.binary_search(&Value::Int(25)).unwrap(), -3);
        assert_eq!(col.binary_search(&Value::Int(35)).unwrap(), -4);
        assert_eq!(col.binary_search(&Value::Double(20.0)).unwrap(), 2);
        assert_eq!(col.binary_search(&Value::Double(20.5)).unwrap(), -3);
    }

    #[test]
    fn descending_mirrors_the_comparator() {
        let col = IntColumn::from_slice(&[30, 20, 10]);
        assert_eq!(col.desc_binary_search(&Value::Int(10)).unwrap(), 3);
        assert_eq!(col.desc_binary_search(&Value::Int(25)).unwrap(), -2);
    }

    #[test]
    fn nulls_sort_first_and_foreign_kinds_fail() {
        let col = IntColumn::from_options([None, Some(1), Some(2)]);
        assert_eq!(col.binary_search(&Value::Null).unwrap(), 1);
        assert_eq!(col.binary_search_range(&Value::Int(2), 2, 3).unwrap(), 3);

        let words = StringColumn::from_slice(&["a".into()]);
        assert!(matches!(
            words.binary_search(&Value::Int(1)),
            Err(ColumnError::IncomparableOperands { .. })
        ));
    }
}
