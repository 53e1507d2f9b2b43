use bytes::{Bytes, BytesMut};
use chrono::NaiveDate;
use columnar_kernel::{
    BinaryObjectCodec, BoolColumn, CodecError, Column, ConstColumn, DateColumn,
    DoubleColumn, IntColumn, LongColumn, ObjectCodec, ObjectColumn, StringColumn, Value,
};
use pretty_assertions::assert_eq;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn columns() -> Vec<Column> {
    vec![
        BoolColumn::from_options([Some(true), None, Some(false)]).into(),
        IntColumn::from_slice(&[i32::MIN, 0, i32::MAX]).into(),
        LongColumn::from_options((0..130).map(|i| (i % 3 != 0).then_some(i as i64 * -7))).into(),
        DoubleColumn::from_options([Some(1.5), None, Some(-0.25)]).into(),
        DateColumn::from_options([Some(date(1999, 12, 31)), None, Some(date(2024, 2, 29))]).into(),
        StringColumn::from_options([Some("".into()), Some("naïve".into()), None]).into(),
        ObjectColumn::from_slice(&[
            Value::Int(1),
            Value::Null,
            Value::Long(-2),
            Value::Double(3.5),
            Value::Bool(true),
            Value::Date(date(2020, 1, 1)),
            Value::from("x"),
        ])
        .into(),
        ConstColumn::new(Value::from("fill"), 5).into(),
        ConstColumn::new(Value::Null, 2).into(),
        IntColumn::new().into(),
    ]
}

#[test]
fn every_kind_survives_a_round_trip() {
    for col in columns() {
        let bytes = col.serialize();
        let back = Column::deserialize(&bytes).unwrap();
        assert_eq!(back.kind(), col.kind());
        assert_eq!(back.len(), col.len());
        assert_eq!(back.to_values(), col.to_values());
        assert!(!back.is_temporary(), "{} came back temporary", col.data_type());
    }
}

#[test]
fn nullable_frames_carry_the_validity_words() {
    let col = Column::from(LongColumn::from_options((0..130).map(|i| (i != 64).then_some(i))));
    let bytes = col.serialize();
    // kind, format, count, three validity words, then the values
    assert_eq!(bytes.len(), 1 + 1 + 4 + 3 * 8 + 130 * 8);
    assert_eq!(bytes[0], 3);
    assert_eq!(bytes[1], 2);
    let back = Column::deserialize(&bytes).unwrap();
    assert!(back.is_null(65));
    assert_eq!(back.value_at(66), Value::Long(65));
}

#[test]
fn codec_rejects_bad_payloads() {
    let codec = BinaryObjectCodec;
    let mut bad_utf8 = Bytes::from_static(&[6, 0, 0, 0, 2, 0xff, 0xfe]);
    assert_eq!(codec.read_value(&mut bad_utf8), Err(CodecError::InvalidUtf8));

    let mut short = Bytes::from_static(&[3, 0, 0]);
    assert!(matches!(
        codec.read_value(&mut short),
        Err(CodecError::UnexpectedEof { .. })
    ));
}

#[test]
fn object_frames_reject_foreign_values() {
    let codec = BinaryObjectCodec;
    let mut out = BytesMut::new();
    ObjectColumn::from_slice(&[Value::Int(1)]).write_to(&codec, &mut out);
    let mut input = out.freeze();
    assert_eq!(
        StringColumn::read_from(&codec, &mut input),
        Err(CodecError::KindMismatch {
            expected: "String",
            actual: "Integer",
        })
    );
}
