use chrono::NaiveDate;
use columnar_kernel::{
    Column, ColumnError, ConstColumn, DateColumn, IntColumn, LongColumn, ObjectColumn,
    StringColumn, Value,
};
use pretty_assertions::assert_eq;

fn ints(col: &IntColumn) -> Vec<Option<i32>> {
    col.iter().map(|v| v.copied()).collect()
}

#[test]
fn add_value_checks_the_kind_and_grows() {
    let mut col = IntColumn::new();
    for i in 0..10 {
        col.add_value(&Value::Int(i)).unwrap();
    }
    col.add_value(&Value::Null).unwrap();
    assert_eq!(col.len(), 11);
    assert!(col.capacity() >= 11);
    assert!(col.is_null(11));

    col.add_value(&Value::Long(12)).unwrap();
    let err = col.add_value(&Value::Long(i64::MAX)).unwrap_err();
    assert_eq!(
        err,
        ColumnError::TypeMismatch {
            expected: "Integer",
            actual: "Long",
        }
    );
    assert_eq!(col.len(), 12);

    col.trim_to_size();
    assert!(col.capacity() >= col.len());
}

#[test]
fn add_all_accepts_same_kind_and_constants() {
    let mut col = IntColumn::from_slice(&[1]);
    col.add_all(&Column::from(IntColumn::from_options([Some(2), None])))
        .unwrap();
    col.add_all(&Column::from(ConstColumn::new(Value::Int(7), 2)))
        .unwrap();
    assert_eq!(ints(&col), vec![Some(1), Some(2), None, Some(7), Some(7)]);

    let err = col
        .add_all(&Column::from(LongColumn::from_slice(&[1])))
        .unwrap_err();
    assert!(matches!(err, ColumnError::TypeMismatch { .. }));
    assert_eq!(col.len(), 5);
}

#[test]
fn object_columns_absorb_any_kind() {
    let mut col = ObjectColumn::new();
    col.add_all(&Column::from(IntColumn::from_slice(&[1, 2])))
        .unwrap();
    col.insert_all(1, &Column::from(StringColumn::from_slice(&["a".into()])))
        .unwrap();
    col.add_range(&Column::from(LongColumn::from_slice(&[5, 6, 7])), 2, 2)
        .unwrap();
    assert_eq!(
        col.to_values(),
        vec![
            Value::from("a"),
            Value::Int(1),
            Value::Int(2),
            Value::Long(6),
            Value::Long(7),
        ]
    );
}

#[test]
fn insert_and_remove_keep_nulls_aligned() {
    let mut col = IntColumn::from_slice(&[1, 2, 3, 4, 5]);
    col.insert(2, None);
    col.insert_all(1, &Column::from(IntColumn::from_slice(&[9, 8])))
        .unwrap();
    assert_eq!(
        ints(&col),
        vec![Some(9), Some(8), Some(1), None, Some(2), Some(3), Some(4), Some(5)]
    );

    col.remove(1);
    col.remove_range(2, 3);
    assert_eq!(ints(&col), vec![Some(8), Some(2), Some(3), Some(4), Some(5)]);

    col.remove_positions(&[1, 3, 5]);
    assert_eq!(ints(&col), vec![Some(2), Some(4)]);

    col.remove_last();
    assert_eq!(ints(&col), vec![Some(2)]);
    assert_eq!(col.null_count(), 0);
}

#[test]
fn split_and_reserve_ranges() {
    let mut col = IntColumn::from_options((1..=8).map(|i| (i != 6).then_some(i)));
    let tail = col.split_off(7);
    assert_eq!(ints(&tail), vec![Some(7), Some(8)]);

    let middle = col.split_range(2, 3);
    assert_eq!(ints(&middle), vec![Some(2), Some(3)]);
    assert_eq!(ints(&col), vec![Some(1), Some(4), Some(5), None]);

    col.reserve_range(2, 3);
    assert_eq!(ints(&col), vec![Some(4), Some(5)]);

    col.clear();
    assert!(col.is_empty());
}

#[test]
fn slices_takes_and_reversal() {
    let col = Column::from(IntColumn::from_options([Some(1), None, Some(3), Some(4)]));
    assert_eq!(col.slice(2, 4).to_values(), vec![Value::Null, Value::Int(3)]);
    assert_eq!(
        col.take(&[4, 1, 1]).to_values(),
        vec![Value::Int(4), Value::Int(1), Value::Int(1)]
    );
    assert_eq!(
        col.take_checked(&[0, 3]).to_values(),
        vec![Value::Null, Value::Int(3)]
    );
    assert_eq!(
        col.reverse().to_values(),
        vec![Value::Int(4), Value::Int(3), Value::Null, Value::Int(1)]
    );
}

#[test]
fn lookups_and_aggregates() {
    let col = Column::from(IntColumn::from_options([Some(3), None, Some(3), Some(-1)]));
    assert_eq!(col.count(), 3);
    assert_eq!(col.first_index_of(&Value::Int(3), 2), Some(3));
    assert_eq!(col.last_index_of(&Value::Int(3), 4), Some(3));
    assert_eq!(col.first_index_of(&Value::Null, 1), Some(2));
    assert!(col.contains(&Value::Double(-1.0)));
    assert_eq!(col.min().unwrap(), Some(Value::Int(-1)));
    assert_eq!(col.max().unwrap(), Some(Value::Int(3)));
    assert_eq!(col.sum(), Value::Long(5));
    assert_eq!(col.average(), Some(5.0 / 3.0));

    let dates = Column::from(DateColumn::from_slice(&[NaiveDate::MIN]));
    assert_eq!(dates.sum(), Value::Null);
    assert_eq!(dates.average(), None);
}
