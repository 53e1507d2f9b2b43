#![forbid(unsafe_code)]

use crate::column::{dispatch, Column};
use crate::element::Element;
use crate::typed::TypedColumn;
use crate::types::{ColumnKind, Value};
use std::collections::HashSet;

/// Summary of a column's rows.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnStats {
    pub kind: ColumnKind,
    pub len: usize,
    pub null_count: usize,
    /// Exact for small columns, a HyperLogLog estimate beyond that.
    pub distinct_count: u64,
    /// `None` when every row is null or the rows are not mutually comparable.
    pub min: Option<Value>,
    pub max: Option<Value>,
    /// Present for numeric kinds and for object columns holding only numbers.
    pub sum: Option<Value>,
}

#[derive(Clone, Debug)]
struct HyperLogLog {
    p: u8,
    registers: Vec<u8>,
}

impl HyperLogLog {
    fn with_precision(p: u8) -> Self {
        debug_assert!((4..=16).contains(&p));
        Self {
            p,
            registers: vec![0u8; 1 << p],
        }
    }

    fn insert_hash(&mut self, hash: u64) {
        let idx = (hash >> (64 - self.p)) as usize;
        let rank = ((hash << self.p).leading_zeros() + 1) as u8;
        self.registers[idx] = self.registers[idx].max(rank);
    }

    fn estimate(&self) -> u64 {
        let m = self.registers.len() as f64;
        let alpha = 0.7213 / (1.0 + 1.079 / m);
        let (inv_sum, zeros) = self.registers.iter().fold((0.0, 0u32), |(sum, zeros), &r| {
            (sum + 2f64.powi(-(r as i32)), zeros + (r == 0) as u32)
        });
        let raw = alpha * m * m / inv_sum;
        if raw <= 2.5 * m && zeros > 0 {
            return (m * (m / zeros as f64).ln()).round() as u64;
        }
        raw.round() as u64
    }
}

/// Distinct row hashes, counted exactly until the set outgrows
/// `EXACT_LIMIT` and estimated from then on.
#[derive(Clone, Debug)]
enum DistinctCounter {
    Exact(HashSet<u64>),
    Hll(HyperLogLog),
}

const EXACT_LIMIT: usize = 2048;

impl DistinctCounter {
    fn new() -> Self {
        Self::Exact(HashSet::new())
    }

    fn insert<T: Element>(&mut self, elem: &T) {
        let hash = elem.hash_elem();
        match self {
            Self::Exact(set) if set.len() >= EXACT_LIMIT && !set.contains(&hash) => {
                let mut hll = HyperLogLog::with_precision(10);
                set.iter().for_each(|&h| hll.insert_hash(h));
                hll.insert_hash(hash);
                *self = Self::Hll(hll);
            }
            Self::Exact(set) => {
                set.insert(hash);
            }
            Self::Hll(hll) => hll.insert_hash(hash),
        }
    }

    fn estimate(&self) -> u64 {
        match self {
            Self::Exact(set) => set.len() as u64,
            Self::Hll(hll) => hll.estimate(),
        }
    }
}

impl<T: Element> TypedColumn<T> {
    pub fn stats(&self) -> ColumnStats {
        let mut distinct = DistinctCounter::new();
        self.iter().flatten().for_each(|v| distinct.insert(v));

        let sum = match T::KIND {
            k if k.is_numeric() => Some(self.sum()),
            ColumnKind::Object if self.iter().flatten().all(|v| v.to_num().is_some()) => {
                Some(self.sum())
            }
            _ => None,
        };
        ColumnStats {
            kind: T::KIND,
            len: self.len(),
            null_count: self.null_count(),
            distinct_count: distinct.estimate(),
            min: self.min().ok().flatten(),
            max: self.max().ok().flatten(),
            sum,
        }
    }
}

impl Column {
    /// Stats of the rows; a constant column reports its fill kind.
    pub fn stats(&self) -> ColumnStats {
        dispatch!(self, c => c.stats(), k => k.materialize().stats())
    }
}
