#![forbid(unsafe_code)]

use crate::column::Column;
use crate::typed::{
    BoolColumn, DateColumn, DoubleColumn, IntColumn, LongColumn, ObjectColumn, StringColumn,
};
use crate::types::Value;

/// One value broadcast over a logical length.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstColumn {
    value: Value,
    len: usize,
    temporary: bool,
}

impl ConstColumn {
    pub fn new(value: impl Into<Value>, len: usize) -> Self {
        Self {
            value: value.into(),
            len,
            temporary: true,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    pub fn set_temporary(&mut self, temporary: bool) {
        self.temporary = temporary;
    }

    /// Extends or shrinks the logical length.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
    }

    /// Expands into a typed column of the value's kind (Object for `Null`).
    pub fn materialize(&self) -> Column {
        let len = self.len;
        match &self.value {
            Value::Null => Column::Object(ObjectColumn::filled(None, len)),
            Value::Bool(v) => Column::Bool(BoolColumn::filled(Some(*v), len)),
            Value::Int(v) => Column::Int(IntColumn::filled(Some(*v), len)),
            Value::Long(v) => Column::Long(LongColumn::filled(Some(*v), len)),
            Value::Double(v) => Column::Double(DoubleColumn::filled(Some(*v), len)),
            Value::Date(v) => Column::Date(DateColumn::filled(Some(*v), len)),
            Value::String(v) => Column::String(StringColumn::filled(Some(v.clone()), len)),
        }
    }
}
