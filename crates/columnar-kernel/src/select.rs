#![forbid(unsafe_code)]

use crate::bitmap::BitVec;
use crate::column::{dispatch, Column};
use crate::constant::ConstColumn;
use crate::element::Element;
use crate::operand::Operand;
use crate::typed::TypedColumn;

/// Truth of mask positions `start..end`, bit 0 being position `start`.
fn selection(start: usize, end: usize, mask: &Column) -> BitVec {
    let keep = Operand::of(mask).truths();
    (start - 1..end - 1).map(|i| keep(i)).collect()
}

impl<T: Element> TypedColumn<T> {
    /// Rows whose mask row is true, in order.
    ///
    /// Any column can act as the mask; its rows are read with presence
    /// truthiness.
    pub fn select(&self, mask: &Column) -> Self {
        self.select_range(1, self.len() + 1, mask)
    }

    /// Like [`TypedColumn::select`] restricted to positions `start..end`.
    pub fn select_range(&self, start: usize, end: usize, mask: &Column) -> Self {
        let hits = selection(start, end, mask);
        let picked = self
            .buffer()
            .gather(hits.iter_ones().map(|i| Some(start - 1 + i)));
        Self::from_buffer(picked.compact(), true)
    }
}

impl Column {
    pub fn select(&self, mask: &Column) -> Column {
        self.select_range(1, self.len() + 1, mask)
    }

    pub fn select_range(&self, start: usize, end: usize, mask: &Column) -> Column {
        dispatch!(self, c => c.select_range(start, end, mask).into_column(), k => {
            let hits = selection(start, end, mask).count_ones();
            Column::Const(ConstColumn::new(k.value().clone(), hits))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed::{BoolColumn, IntColumn, StringColumn};
    use crate::types::Value;

    #[test]
    fn any_column_can_mask() {
        let ints = IntColumn::from_slice(&[1, 2, 3, 4]);
        let mask = Column::from(StringColumn::from_options([
            Some("x".into()),
            None,
            None,
            Some("y".into()),
        ]));
        assert_eq!(ints.select(&mask), IntColumn::from_slice(&[1, 4]));
    }

    #[test]
    fn ranged_select_and_constants() {
        let ints = IntColumn::from_slice(&[1, 2, 3, 4]);
        let mask = Column::from(BoolColumn::from_slice(&[true, true, false, true]));
        assert_eq!(ints.select_range(2, 5, &mask), IntColumn::from_slice(&[2, 4]));

        let k = Column::from(ConstColumn::new(7, 4));
        let picked = k.select(&mask);
        assert_eq!(picked.len(), 3);
        assert_eq!(picked.value_at(1), Value::Int(7));
    }
}
