#![forbid(unsafe_code)]

use crate::bitmap::BitVec;
use crate::element::Element;

/// Backing storage of a typed column: the element slots plus an optional
/// validity map.
///
/// Indices here are 0-based; the 1-based row positions of the public API are
/// translated by [`crate::TypedColumn`]. `validity == None` means every slot is
/// present; the map is only materialized once the first null arrives. Null
/// slots hold [`Element::placeholder`] so no referenced value outlives its row.
#[derive(Clone, Debug)]
pub(crate) struct Buffer<T> {
    values: Vec<T>,
    validity: Option<BitVec>,
}

impl<T: Element> Buffer<T> {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            validity: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            validity: None,
        }
    }

    pub fn filled(value: Option<&T>, len: usize) -> Self {
        let mut out = Self::with_capacity(len);
        out.extend_filled(value, len);
        out
    }

    pub fn from_options<I: IntoIterator<Item = Option<T>>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut out = Self::with_capacity(iter.size_hint().0);
        for value in iter {
            out.push(value);
        }
        out
    }

    pub fn from_parts(values: Vec<T>, validity: Option<BitVec>) -> Self {
        debug_assert!(validity.as_ref().map_or(true, |v| v.len() == values.len()));
        Self { values, validity }.compact()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        if self.is_null(idx) {
            None
        } else {
            Some(&self.values[idx])
        }
    }

    pub fn is_null(&self, idx: usize) -> bool {
        debug_assert!(idx < self.values.len(), "row index out of bounds");
        self.validity.as_ref().is_some_and(|bits| !bits.get(idx))
    }

    pub fn null_count(&self) -> usize {
        self.validity.as_ref().map_or(0, BitVec::count_zeros)
    }

    pub fn validity(&self) -> Option<&BitVec> {
        self.validity.as_ref()
    }

    /// Raw slots, placeholders included.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&T>> + '_ {
        (0..self.values.len()).map(move |idx| self.get(idx))
    }

    /// Grows capacity to at least `min` slots: by half again, or to `min + 1`
    /// when that is larger.
    pub fn ensure_capacity(&mut self, min: usize) {
        let capacity = self.values.capacity();
        if capacity < min {
            let target = (capacity * 3 / 2).max(min + 1);
            self.values.reserve_exact(target - self.values.len());
        }
    }

    pub fn trim_to_size(&mut self) {
        self.values.shrink_to_fit();
    }

    fn normalize(value: Option<T>) -> Option<T> {
        value.filter(|v| !v.is_null_value())
    }

    /// Materializes the validity map for the current length.
    fn validity_mut(&mut self) -> &mut BitVec {
        let len = self.values.len();
        self.validity
            .get_or_insert_with(|| BitVec::with_len_all_true(len))
    }

    /// Drops the validity map once it no longer records any null.
    pub fn compact(mut self) -> Self {
        if self.validity.as_ref().is_some_and(BitVec::all_true) {
            self.validity = None;
        }
        self
    }

    /// Appends one row, growing by [`Buffer::ensure_capacity`] when full.
    pub fn push(&mut self, value: Option<T>) {
        self.ensure_capacity(self.values.len() + 1);
        match Self::normalize(value) {
            Some(v) => {
                if let Some(bits) = &mut self.validity {
                    bits.push(true);
                }
                self.values.push(v);
            }
            None => {
                self.validity_mut().push(false);
                self.values.push(T::placeholder());
            }
        }
    }

    pub fn set(&mut self, idx: usize, value: Option<T>) {
        match Self::normalize(value) {
            Some(v) => {
                self.values[idx] = v;
                if let Some(bits) = &mut self.validity {
                    bits.set(idx, true);
                }
            }
            None => {
                self.values[idx] = T::placeholder();
                self.validity_mut().set(idx, false);
            }
        }
    }

    pub fn insert(&mut self, idx: usize, value: Option<T>) {
        self.ensure_capacity(self.values.len() + 1);
        match Self::normalize(value) {
            Some(v) => {
                if let Some(bits) = &mut self.validity {
                    bits.insert(idx, true);
                }
                self.values.insert(idx, v);
            }
            None => {
                self.validity_mut().insert(idx, false);
                self.values.insert(idx, T::placeholder());
            }
        }
    }

    /// Appends `count` slots of `other` starting at `start`.
    pub fn extend_from(&mut self, other: &Buffer<T>, start: usize, count: usize) {
        self.ensure_capacity(self.values.len() + count);
        match &other.validity {
            Some(src) => self.validity_mut().extend_from(src, start, count),
            None => {
                if let Some(bits) = &mut self.validity {
                    bits.extend_constant(true, count);
                }
            }
        }
        self.values
            .extend_from_slice(&other.values[start..start + count]);
    }

    pub fn extend_filled(&mut self, value: Option<&T>, count: usize) {
        self.ensure_capacity(self.values.len() + count);
        match value.filter(|v| !v.is_null_value()) {
            Some(v) => {
                if let Some(bits) = &mut self.validity {
                    bits.extend_constant(true, count);
                }
                self.values.extend(std::iter::repeat(v).take(count).cloned());
            }
            None => {
                self.validity_mut().extend_constant(false, count);
                self.values
                    .extend(std::iter::repeat_with(T::placeholder).take(count));
            }
        }
    }

    /// Inserts `count` slots of `other` (from `start`) before `idx`.
    pub fn insert_from(&mut self, idx: usize, other: &Buffer<T>, start: usize, count: usize) {
        self.ensure_capacity(self.values.len() + count);
        if self.validity.is_some() || other.validity.is_some() {
            let bits = self.validity_mut().clone();
            let mut spliced = BitVec::with_capacity_bits(bits.len() + count);
            spliced.extend_from(&bits, 0, idx);
            match &other.validity {
                Some(src) => spliced.extend_from(src, start, count),
                None => spliced.extend_constant(true, count),
            }
            spliced.extend_from(&bits, idx, bits.len() - idx);
            self.validity = Some(spliced);
        }
        self.values.splice(
            idx..idx,
            other.values[start..start + count].iter().cloned(),
        );
    }

    pub fn remove(&mut self, idx: usize) {
        self.values.remove(idx);
        if let Some(bits) = &mut self.validity {
            bits.remove(idx);
        }
    }

    /// Removes the slots in `[from, to)`.
    pub fn remove_range(&mut self, from: usize, to: usize) {
        self.values.drain(from..to);
        if let Some(bits) = &mut self.validity {
            bits.remove_range(from, to);
        }
    }

    /// Removes the slots at the given ascending indices in one pass.
    pub fn remove_sorted(&mut self, indices: &[usize]) {
        let len = self.values.len();
        let mut keep = vec![true; len];
        for &idx in indices {
            keep[idx] = false;
        }

        let mut flags = keep.iter();
        self.values.retain(|_| *flags.next().unwrap_or(&true));

        if let Some(bits) = &self.validity {
            let kept: BitVec = keep
                .iter()
                .enumerate()
                .filter(|(_, k)| **k)
                .map(|(idx, _)| bits.get(idx))
                .collect();
            self.validity = Some(kept);
        }
    }

    pub fn truncate(&mut self, len: usize) {
        self.values.truncate(len);
        if let Some(bits) = &mut self.validity {
            bits.truncate(len);
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.validity = None;
    }

    /// Detaches `[from, to)` into a new buffer, closing the gap in place.
    pub fn drain_range(&mut self, from: usize, to: usize) -> Buffer<T> {
        let detached = self.slice(from, to);
        self.remove_range(from, to);
        detached
    }

    /// Copies `[start, end)` into a new buffer.
    pub fn slice(&self, start: usize, end: usize) -> Buffer<T> {
        let mut out = Buffer::with_capacity(end - start);
        out.extend_from(self, start, end - start);
        out.compact()
    }

    /// Builds a new buffer from the slots at `indices`; `None` yields a null.
    pub fn gather<I: IntoIterator<Item = Option<usize>>>(&self, indices: I) -> Buffer<T> {
        Buffer::from_options(
            indices
                .into_iter()
                .map(|idx| idx.and_then(|idx| self.get(idx).cloned())),
        )
    }

    pub fn reverse(&mut self) {
        self.values.reverse();
        if let Some(bits) = &self.validity {
            let reversed: BitVec = (0..bits.len()).rev().map(|idx| bits.get(idx)).collect();
            self.validity = Some(reversed);
        }
    }
}
