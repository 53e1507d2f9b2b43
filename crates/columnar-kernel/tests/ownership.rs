use columnar_kernel::{
    ArithOp, BoolColumn, Column, DoubleColumn, IntColumn, ObjectColumn, StringColumn, Value,
};
use pretty_assertions::assert_eq;

#[test]
fn shared_receiver_is_left_untouched() {
    let base = Column::from(IntColumn::from_slice(&[1, 2, 3]));
    let held = base.clone();
    let doubled = base
        .arith_value(ArithOp::Multiply, &Value::Int(2))
        .unwrap();
    assert_eq!(doubled.to_values(), vec![Value::Int(2), Value::Int(4), Value::Int(6)]);
    assert_eq!(held.to_values(), vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn retained_columns_stop_being_temporary() {
    let scratch = IntColumn::from_slice(&[5, 6]);
    assert!(scratch.is_temporary());

    let kept = scratch.retain(false);
    assert!(!kept.is_temporary());

    let again = kept.clone().retain(true);
    assert!(!again.is_temporary());
    let copy = kept.clone().retain(false);
    assert!(copy.is_temporary());

    let result = Column::from(kept.clone())
        .arith_value(ArithOp::Add, &Value::Int(1))
        .unwrap();
    assert!(result.is_temporary());
    assert_eq!(kept.to_values(), vec![Value::Int(5), Value::Int(6)]);
}

#[test]
fn mutating_a_clone_copies_its_buffer() {
    let original = StringColumn::from_slice(&["a".into(), "b".into()]);
    let mut edited = original.clone();
    edited.set(1, Some("z".into()));
    edited.push("c".into());
    assert_eq!(original.to_values(), vec![Value::from("a"), Value::from("b")]);
    assert_eq!(
        edited.to_values(),
        vec![Value::from("z"), Value::from("b"), Value::from("c")]
    );
}

#[test]
fn dup_is_independent_and_temporary() {
    let mut original = DoubleColumn::from_slice(&[1.0]);
    original.set_temporary(false);
    let mut copy = original.dup();
    assert!(copy.is_temporary());
    copy.set(1, None);
    assert_eq!(original.get(1), Some(&1.0));
    assert!(copy.is_null(1));
}

#[test]
fn chained_temporaries_give_the_same_answer_as_shared_inputs() {
    let a = Column::from(IntColumn::from_slice(&[1, 2, 3, 4]));
    let b = Column::from(IntColumn::from_slice(&[10, 20, 30, 40]));
    let shared = a.clone();

    let chained = a
        .add(&b)
        .unwrap()
        .subtract(&shared)
        .unwrap()
        .negate()
        .unwrap();
    assert_eq!(
        chained.to_values(),
        vec![Value::Int(-10), Value::Int(-20), Value::Int(-30), Value::Int(-40)]
    );
    assert_eq!(shared.value_at(4), Value::Int(4));
}

#[test]
fn merging_into_a_shared_column_copies_first() {
    let base = Column::from(ObjectColumn::from_slice(&[Value::Int(1), Value::from("s")]));
    let held = base.clone();
    let mask = Column::from(BoolColumn::from_slice(&[false, true]));
    let merged = base.combine_value(&mask, &Value::Double(0.5)).unwrap();
    assert_eq!(merged.to_values(), vec![Value::Double(0.5), Value::from("s")]);
    assert_eq!(held.to_values(), vec![Value::Int(1), Value::from("s")]);
}
