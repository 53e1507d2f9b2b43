#![forbid(unsafe_code)]

use crate::bitmap::BitVec;
use crate::buffer::Buffer;
use crate::column::Column;
use crate::element::Element;
use crate::error::ColumnError;
use crate::types::{ColumnKind, Num, Value};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::sync::Arc;

/// A growable column of one element kind.
///
/// Row positions are 1-based. The buffer is shared copy-on-write: cloning a
/// column is cheap, and any mutation through one handle leaves the other
/// handles untouched. `temporary` marks a column freshly produced by the
/// current computation; consuming operators may only reuse the buffer of a
/// temporary column that no other handle can see.
#[derive(Clone, Debug)]
pub struct TypedColumn<T> {
    data: Arc<Buffer<T>>,
    temporary: bool,
}

pub type BoolColumn = TypedColumn<bool>;
pub type IntColumn = TypedColumn<i32>;
pub type LongColumn = TypedColumn<i64>;
pub type DoubleColumn = TypedColumn<f64>;
pub type DateColumn = TypedColumn<NaiveDate>;
pub type StringColumn = TypedColumn<Arc<str>>;
pub type ObjectColumn = TypedColumn<Value>;

/// Row ordering shared by every kind: null sorts below any present element.
pub(crate) fn cmp_rows<T: Element>(a: Option<&T>, b: Option<&T>) -> Result<Ordering, ColumnError> {
    match (a, b) {
        (None, None) => Ok(Ordering::Equal),
        (None, Some(_)) => Ok(Ordering::Less),
        (Some(_), None) => Ok(Ordering::Greater),
        (Some(a), Some(b)) => a.compare(b),
    }
}

impl<T: Element> TypedColumn<T> {
    pub fn new() -> Self {
        Self::from_buffer(Buffer::new(), true)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_buffer(Buffer::with_capacity(capacity), true)
    }

    pub fn from_options<I: IntoIterator<Item = Option<T>>>(values: I) -> Self {
        Self::from_buffer(Buffer::from_options(values).compact(), true)
    }

    pub fn from_slice(values: &[T]) -> Self {
        Self::from_options(values.iter().cloned().map(Some))
    }

    /// `len` copies of `value` (`None` fills with nulls).
    pub fn filled(value: Option<T>, len: usize) -> Self {
        Self::from_buffer(Buffer::filled(value.as_ref(), len), true)
    }

    /// Builds a column from boxed values, rejecting values of another kind.
    pub fn try_from_values(values: &[Value]) -> Result<Self, ColumnError> {
        let mut buf = Buffer::with_capacity(values.len());
        for value in values {
            buf.push(decode_scalar::<T>(value)?);
        }
        Ok(Self::from_buffer(buf.compact(), true))
    }

    pub(crate) fn from_buffer(data: Buffer<T>, temporary: bool) -> Self {
        Self {
            data: Arc::new(data),
            temporary,
        }
    }

    pub(crate) fn from_parts(values: Vec<T>, validity: Option<BitVec>, temporary: bool) -> Self {
        Self::from_buffer(Buffer::from_parts(values, validity), temporary)
    }

    pub(crate) fn buffer(&self) -> &Buffer<T> {
        &self.data
    }

    fn buffer_mut(&mut self) -> &mut Buffer<T> {
        Arc::make_mut(&mut self.data)
    }

    pub fn kind(&self) -> ColumnKind {
        T::KIND
    }

    pub fn into_column(self) -> Column {
        T::into_column(self)
    }

    // ---- ownership -------------------------------------------------------

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    pub fn set_temporary(&mut self, temporary: bool) {
        self.temporary = temporary;
    }

    /// Hands the column to a longer-lived owner.
    ///
    /// A temporary column is frozen and returned as-is. A shared column is
    /// returned as-is when the caller references the origin, and duplicated
    /// otherwise.
    pub fn retain(mut self, ref_origin: bool) -> Self {
        if self.temporary {
            self.temporary = false;
            self
        } else if ref_origin {
            self
        } else {
            self.dup()
        }
    }

    /// Deep copy with its own buffer, marked temporary.
    pub fn dup(&self) -> Self {
        Self::from_buffer(Buffer::clone(&self.data), true)
    }

    /// Rewrites every row through `f`, in place when the receiver is temporary
    /// and exclusively held, otherwise into a new temporary column.
    pub(crate) fn update_or_copy<F>(mut self, mut f: F) -> Result<Self, ColumnError>
    where
        F: FnMut(usize, Option<&T>) -> Result<Option<T>, ColumnError>,
    {
        if self.temporary {
            if let Some(buf) = Arc::get_mut(&mut self.data) {
                for idx in 0..buf.len() {
                    let next = f(idx, buf.get(idx))?;
                    buf.set(idx, next);
                }
                return Ok(self);
            }
        }

        log::trace!(
            "{} column of {} rows is shared; writing result to a new buffer",
            T::KIND.label(),
            self.len()
        );
        let src = &*self.data;
        let mut out = Buffer::with_capacity(src.len());
        for idx in 0..src.len() {
            out.push(f(idx, src.get(idx))?);
        }
        Ok(Self::from_buffer(out.compact(), true))
    }

    // ---- element access --------------------------------------------------

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn get(&self, pos: usize) -> Option<&T> {
        self.data.get(pos - 1)
    }

    pub fn get_value(&self, pos: usize) -> Value {
        self.get(pos).map_or(Value::Null, T::to_value)
    }

    pub fn is_null(&self, pos: usize) -> bool {
        self.data.is_null(pos - 1)
    }

    pub fn null_count(&self) -> usize {
        self.data.null_count()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&T>> + '_ {
        self.data.iter()
    }

    pub fn to_values(&self) -> Vec<Value> {
        self.iter().map(|v| v.map_or(Value::Null, T::to_value)).collect()
    }

    pub fn set(&mut self, pos: usize, value: Option<T>) {
        self.buffer_mut().set(pos - 1, value);
    }

    pub fn set_value(&mut self, pos: usize, value: &Value) -> Result<(), ColumnError> {
        let value = decode_scalar::<T>(value)?;
        self.set(pos, value);
        Ok(())
    }

    // ---- growth ----------------------------------------------------------

    /// Appends without a type check or growth step.
    pub fn push(&mut self, value: T) {
        self.buffer_mut().push(Some(value));
    }

    pub fn push_null(&mut self) {
        self.buffer_mut().push(None);
    }

    pub fn add_value(&mut self, value: &Value) -> Result<(), ColumnError> {
        let value = decode_scalar::<T>(value)?;
        let buf = self.buffer_mut();
        buf.ensure_capacity(buf.len() + 1);
        buf.push(value);
        Ok(())
    }

    pub fn add_all(&mut self, other: &Column) -> Result<(), ColumnError> {
        self.add_range(other, 1, other.len())
    }

    /// Appends `count` rows of `other` starting at position `from`.
    pub fn add_range(&mut self, other: &Column, from: usize, count: usize) -> Result<(), ColumnError> {
        if let Some(src) = T::typed(other) {
            self.buffer_mut().extend_from(src.buffer(), from - 1, count);
            return Ok(());
        }
        match other {
            Column::Const(c) => {
                let value = decode_scalar::<T>(c.value())?;
                self.buffer_mut().extend_filled(value.as_ref(), count);
                Ok(())
            }
            _ if T::KIND == ColumnKind::Object => {
                let buf = self.buffer_mut();
                buf.ensure_capacity(buf.len() + count);
                for pos in from..from + count {
                    buf.push(T::from_value(&other.value_at(pos)));
                }
                Ok(())
            }
            _ => Err(ColumnError::TypeMismatch {
                expected: T::KIND.label(),
                actual: other.kind().label(),
            }),
        }
    }

    pub fn insert(&mut self, pos: usize, value: Option<T>) {
        self.buffer_mut().insert(pos - 1, value);
    }

    pub fn insert_value(&mut self, pos: usize, value: &Value) -> Result<(), ColumnError> {
        let value = decode_scalar::<T>(value)?;
        self.insert(pos, value);
        Ok(())
    }

    /// Inserts every row of `other` before position `pos`.
    pub fn insert_all(&mut self, pos: usize, other: &Column) -> Result<(), ColumnError> {
        if let Some(src) = T::typed(other) {
            let count = src.len();
            self.buffer_mut().insert_from(pos - 1, src.buffer(), 0, count);
            return Ok(());
        }
        let staged = match other {
            Column::Const(c) => {
                let value = decode_scalar::<T>(c.value())?;
                Buffer::filled(value.as_ref(), c.len())
            }
            _ if T::KIND == ColumnKind::Object => {
                Buffer::from_options(other.to_values().iter().map(T::from_value))
            }
            _ => {
                return Err(ColumnError::TypeMismatch {
                    expected: T::KIND.label(),
                    actual: other.kind().label(),
                })
            }
        };
        let count = staged.len();
        self.buffer_mut().insert_from(pos - 1, &staged, 0, count);
        Ok(())
    }

    pub fn ensure_capacity(&mut self, min: usize) {
        self.buffer_mut().ensure_capacity(min);
    }

    pub fn trim_to_size(&mut self) {
        self.buffer_mut().trim_to_size();
    }

    // ---- removal ---------------------------------------------------------

    pub fn remove(&mut self, pos: usize) {
        self.buffer_mut().remove(pos - 1);
    }

    pub fn remove_last(&mut self) {
        let len = self.len();
        if len > 0 {
            self.buffer_mut().truncate(len - 1);
        }
    }

    /// Removes positions `from..=to`.
    pub fn remove_range(&mut self, from: usize, to: usize) {
        self.buffer_mut().remove_range(from - 1, to);
    }

    /// Removes the given positions, which must be ascending.
    pub fn remove_positions(&mut self, positions: &[usize]) {
        let indices: Vec<usize> = positions.iter().map(|p| p - 1).collect();
        self.buffer_mut().remove_sorted(&indices);
    }

    /// Keeps only positions `start..=end`.
    pub fn reserve_range(&mut self, start: usize, end: usize) {
        let buf = self.buffer_mut();
        buf.truncate(end);
        buf.remove_range(0, start - 1);
    }

    pub fn clear(&mut self) {
        self.buffer_mut().clear();
    }

    /// Detaches positions `pos..=len` into a new column.
    pub fn split_off(&mut self, pos: usize) -> Self {
        let len = self.len();
        self.split_range(pos, len)
    }

    /// Detaches positions `from..=to` into a new column, closing the gap.
    pub fn split_range(&mut self, from: usize, to: usize) -> Self {
        let detached = self.buffer_mut().drain_range(from - 1, to);
        Self::from_buffer(detached, true)
    }

    // ---- extraction ------------------------------------------------------

    /// Copies positions `start..end` (end exclusive).
    pub fn slice(&self, start: usize, end: usize) -> Self {
        Self::from_buffer(self.data.slice(start - 1, end - 1), true)
    }

    /// Gathers the rows at `positions`.
    pub fn take(&self, positions: &[usize]) -> Self {
        let out = self.data.gather(positions.iter().map(|p| Some(p - 1)));
        Self::from_buffer(out.compact(), true)
    }

    /// Like [`TypedColumn::take`], with position `0` producing a null row.
    pub fn take_checked(&self, positions: &[usize]) -> Self {
        let out = self
            .data
            .gather(positions.iter().map(|&p| p.checked_sub(1)));
        Self::from_buffer(out.compact(), true)
    }

    pub fn reverse(&self) -> Self {
        let mut out = Buffer::clone(&self.data);
        out.reverse();
        Self::from_buffer(out, true)
    }

    // ---- inspection ------------------------------------------------------

    /// Number of non-null rows.
    pub fn count(&self) -> usize {
        self.len() - self.null_count()
    }

    /// First non-null element, boxed.
    pub fn first_non_null(&self) -> Option<Value> {
        self.iter().flatten().next().map(T::to_value)
    }

    fn matcher<'a>(target: &'a Value) -> impl Fn(Option<&T>) -> bool + 'a {
        let typed = T::coerce(target).filter(|_| !target.is_null());
        move |row: Option<&T>| match (row, &typed) {
            (None, _) => target.is_null(),
            (Some(v), Some(t)) => matches!(v.compare(t), Ok(Ordering::Equal)),
            (Some(v), None) => v.to_value().loose_eq(target),
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        let hit = Self::matcher(value);
        self.iter().any(hit)
    }

    /// First position at or after `start` holding `value`.
    pub fn first_index_of(&self, value: &Value, start: usize) -> Option<usize> {
        let hit = Self::matcher(value);
        (start.max(1)..=self.len()).find(|&pos| hit(self.get(pos)))
    }

    /// Last position at or before `start` holding `value`.
    pub fn last_index_of(&self, value: &Value, start: usize) -> Option<usize> {
        let hit = Self::matcher(value);
        (1..=start.min(self.len())).rev().find(|&pos| hit(self.get(pos)))
    }

    /// Every position holding `value`, scanning from `start` towards the end
    /// (`from_head`) or towards the first row.
    ///
    /// With `is_sorted` the column must be ascending; the equal run is found
    /// by bisection instead of a full scan.
    pub fn index_of_all(
        &self,
        value: &Value,
        start: usize,
        is_sorted: bool,
        from_head: bool,
    ) -> Result<Vec<usize>, ColumnError> {
        let len = self.len();
        if len == 0 {
            return Ok(Vec::new());
        }

        let (lo, hi) = if is_sorted {
            let target = if value.is_null() {
                None
            } else {
                match T::coerce(value) {
                    Some(t) => Some(t),
                    None => {
                        return Err(ColumnError::incomparable(
                            T::KIND.label(),
                            value.kind_label(),
                        ))
                    }
                }
            };
            let first = self.partition_point(|row| {
                Ok(cmp_rows(row, target.as_ref())? == Ordering::Less)
            })?;
            let end = self.partition_point(|row| {
                Ok(cmp_rows(row, target.as_ref())? != Ordering::Greater)
            })?;
            (first + 1, end)
        } else {
            (1, len)
        };

        let hit = Self::matcher(value);
        let out = if from_head {
            (lo.max(start)..=hi)
                .filter(|&pos| hit(self.get(pos)))
                .collect()
        } else {
            (lo..=hi.min(start))
                .rev()
                .filter(|&pos| hit(self.get(pos)))
                .collect()
        };
        Ok(out)
    }

    /// Count of leading rows for which `pred` holds (0-based boundary).
    pub(crate) fn partition_point<F>(&self, mut pred: F) -> Result<usize, ColumnError>
    where
        F: FnMut(Option<&T>) -> Result<bool, ColumnError>,
    {
        let (mut lo, mut hi) = (0usize, self.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if pred(self.data.get(mid))? {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(lo)
    }

    pub fn member_compare(&self, i: usize, j: usize) -> Result<Ordering, ColumnError> {
        cmp_rows(self.get(i), self.get(j))
    }

    pub fn is_member_equals(&self, i: usize, j: usize) -> bool {
        matches!(self.member_compare(i, j), Ok(Ordering::Equal))
    }

    /// Lexicographic comparison; a proper prefix sorts first.
    pub fn compare_to(&self, other: &Self) -> Result<Ordering, ColumnError> {
        for (a, b) in self.iter().zip(other.iter()) {
            let ord = cmp_rows(a, b)?;
            if ord != Ordering::Equal {
                return Ok(ord);
            }
        }
        Ok(self.len().cmp(&other.len()))
    }

    /// Stable hash of one row; null rows hash to zero.
    pub fn hash_row(&self, pos: usize) -> u64 {
        self.get(pos).map_or(0, Element::hash_elem)
    }

    // ---- truthiness ------------------------------------------------------

    pub fn is_true_at(&self, pos: usize) -> bool {
        self.get(pos).is_some_and(Element::is_truthy)
    }

    pub fn is_false_at(&self, pos: usize) -> bool {
        !self.is_true_at(pos)
    }

    pub fn contains_true(&self) -> bool {
        self.iter().any(|v| v.is_some_and(Element::is_truthy))
    }

    /// Row-wise truth mask: present and not `false`.
    pub fn is_true(&self) -> BoolColumn {
        BoolColumn::from_options(
            self.iter()
                .map(|v| Some(v.is_some_and(Element::is_truthy))),
        )
    }

    /// Row-wise negation of [`TypedColumn::is_true`].
    pub fn is_false(&self) -> BoolColumn {
        BoolColumn::from_options(
            self.iter()
                .map(|v| Some(!v.is_some_and(Element::is_truthy))),
        )
    }

    /// Logical NOT under presence logic: null and `false` rows become `true`,
    /// every other row `false`.
    pub fn not(&self) -> BoolColumn {
        self.is_false()
    }

    // ---- aggregates ------------------------------------------------------

    fn extreme(&self, wanted: Ordering) -> Result<Option<Value>, ColumnError> {
        let mut best: Option<&T> = None;
        for v in self.iter().flatten() {
            let replace = match best {
                None => true,
                Some(b) => v.compare(b)? == wanted,
            };
            if replace {
                best = Some(v);
            }
        }
        Ok(best.map(T::to_value))
    }

    /// Smallest non-null element.
    pub fn min(&self) -> Result<Option<Value>, ColumnError> {
        self.extreme(Ordering::Less)
    }

    /// Largest non-null element.
    pub fn max(&self) -> Result<Option<Value>, ColumnError> {
        self.extreme(Ordering::Greater)
    }

    /// Running total of the numeric rows and how many there were. Rows that
    /// hold no number (any row of a Bool, Date or String column, or a
    /// non-numeric Object row) are skipped.
    fn numeric_total(&self) -> (Option<Num>, usize) {
        let mut total: Option<Num> = None;
        let mut rows = 0;
        for n in self.iter().flatten().filter_map(Element::to_num) {
            rows += 1;
            total = Some(match total {
                None => match n {
                    Num::Int(x) => Num::Long(x as i64),
                    other => other,
                },
                Some(acc) if acc.is_double() || n.is_double() => {
                    Num::Double(acc.as_double() + n.as_double())
                }
                Some(acc) => Num::Long(acc.as_long().wrapping_add(n.as_long())),
            });
        }
        (total, rows)
    }

    /// Sum of the non-null numeric rows.
    ///
    /// Integer rows accumulate as Long (wrapping); any Double row turns the
    /// total into a Double. No numeric row at all gives `Null`.
    pub fn sum(&self) -> Value {
        self.numeric_total().0.map_or(Value::Null, Num::into_value)
    }

    /// Mean of the non-null numeric rows; `None` when there are none.
    pub fn average(&self) -> Option<f64> {
        match self.numeric_total() {
            (Some(total), rows) if rows > 0 => Some(total.as_double() / rows as f64),
            _ => None,
        }
    }
}

impl<T: Element> Default for TypedColumn<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> FromIterator<Option<T>> for TypedColumn<T> {
    fn from_iter<I: IntoIterator<Item = Option<T>>>(iter: I) -> Self {
        Self::from_options(iter)
    }
}

impl<T: Element> PartialEq for TypedColumn<T> {
    /// Row-wise equality; the temporary flag is ignored.
    fn eq(&self, other: &Self) -> bool {
        matches!(self.compare_to(other), Ok(Ordering::Equal))
    }
}

/// Unboxes `value` for a column of kind `T`; `Null` is always accepted.
pub(crate) fn decode_scalar<T: Element>(value: &Value) -> Result<Option<T>, ColumnError> {
    if value.is_null() {
        return Ok(None);
    }
    T::coerce(value).map(Some).ok_or(ColumnError::TypeMismatch {
        expected: T::KIND.label(),
        actual: value.kind_label(),
    })
}
