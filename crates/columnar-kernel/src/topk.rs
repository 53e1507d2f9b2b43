#![forbid(unsafe_code)]

use crate::column::{dispatch, Column};
use crate::element::Element;
use crate::error::ColumnError;
use crate::typed::{cmp_rows, TypedColumn};
use std::cmp::Ordering;

impl<T: Element> TypedColumn<T> {
    /// Positions of the extreme rows.
    ///
    /// `count > 0` asks for the smallest `count` rows and `count < 0` for the
    /// largest `-count`, best first. For `|count| == 1`, `is_all` returns every
    /// row tied with the extreme and `is_last` otherwise prefers the last of
    /// the tied rows. Nulls rank lowest unless `ignore_null` drops them.
    pub fn ptop(
        &self,
        count: i32,
        is_all: bool,
        is_last: bool,
        ignore_null: bool,
    ) -> Result<Vec<usize>, ColumnError> {
        if count == 0 || self.is_empty() {
            return Ok(Vec::new());
        }
        let smallest = count > 0;
        let buf = self.buffer();
        let rank = |a: usize, b: usize| -> Result<Ordering, ColumnError> {
            let ord = cmp_rows(buf.get(a), buf.get(b))?;
            Ok(if smallest { ord } else { ord.reverse() })
        };
        let candidates = (0..buf.len()).filter(|&i| !(ignore_null && buf.is_null(i)));

        if count == 1 || count == -1 {
            let mut best: Option<usize> = None;
            let mut ties = Vec::new();
            for idx in candidates {
                let ord = match best {
                    None => Ordering::Less,
                    Some(b) => rank(idx, b)?,
                };
                match ord {
                    Ordering::Less => {
                        best = Some(idx);
                        ties.clear();
                        ties.push(idx + 1);
                    }
                    Ordering::Equal => {
                        ties.push(idx + 1);
                        if is_last {
                            best = Some(idx);
                        }
                    }
                    Ordering::Greater => {}
                }
            }
            return Ok(if is_all {
                ties
            } else {
                best.map(|b| vec![b + 1]).unwrap_or_default()
            });
        }

        let k = count.unsigned_abs() as usize;
        let mut top: Vec<usize> = Vec::with_capacity(k + 1);
        for idx in candidates {
            if top.len() == k {
                let weakest = top[k - 1];
                if rank(idx, weakest)? != Ordering::Less {
                    continue;
                }
            }
            // Upper bound, so an equal candidate already kept stays ahead.
            let (mut lo, mut hi) = (0, top.len());
            while lo < hi {
                let mid = lo + (hi - lo) / 2;
                if rank(top[mid], idx)? == Ordering::Greater {
                    hi = mid;
                } else {
                    lo = mid + 1;
                }
            }
            top.insert(lo, idx);
            top.truncate(k);
        }
        Ok(top.into_iter().map(|i| i + 1).collect())
    }
}

impl Column {
    /// See [`TypedColumn::ptop`].
    pub fn ptop(
        &self,
        count: i32,
        is_all: bool,
        is_last: bool,
        ignore_null: bool,
    ) -> Result<Vec<usize>, ColumnError> {
        dispatch!(self, c => c.ptop(count, is_all, is_last, ignore_null), k => {
            let len = k.len();
            if count == 0 || len == 0 || (ignore_null && k.value().is_null()) {
                return Ok(Vec::new());
            }
            Ok(match count {
                1 | -1 if is_all => (1..=len).collect(),
                1 | -1 => vec![if is_last { len } else { 1 }],
                _ => (1..=len.min(count.unsigned_abs() as usize)).collect(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed::IntColumn;

    #[test]
    fn single_extreme_tie_policies() {
        let col = IntColumn::from_slice(&[3, 1, 4, 1, 5]);
        assert_eq!(col.ptop(1, false, false, false).unwrap(), vec![2]);
        assert_eq!(col.ptop(1, false, true, false).unwrap(), vec![4]);
        assert_eq!(col.ptop(1, true, false, false).unwrap(), vec![2, 4]);
        assert_eq!(col.ptop(-1, false, false, false).unwrap(), vec![5]);
    }

    #[test]
    fn k_smallest_and_largest() {
        let col = IntColumn::from_options([Some(5), None, Some(2), Some(8), Some(2), Some(9)]);
        assert_eq!(col.ptop(3, false, false, false).unwrap(), vec![2, 3, 5]);
        assert_eq!(col.ptop(3, false, false, true).unwrap(), vec![3, 5, 1]);
        assert_eq!(col.ptop(-2, false, false, false).unwrap(), vec![6, 4]);
        assert_eq!(col.ptop(-10, false, false, true).unwrap().len(), 5);
    }
}
