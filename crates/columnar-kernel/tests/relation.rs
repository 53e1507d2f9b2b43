use chrono::{Duration, NaiveDate};
use columnar_kernel::{
    BoolColumn, Column, ColumnError, ConstColumn, DateColumn, DoubleColumn, IntColumn,
    LongColumn, Relation, StringColumn, Value,
};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::sync::Arc;

const RELATIONS: [Relation; 8] = [
    Relation::Equal,
    Relation::NotEqual,
    Relation::Greater,
    Relation::GreaterEqual,
    Relation::Less,
    Relation::LessEqual,
    Relation::And,
    Relation::Or,
];

fn rows(mask: &BoolColumn) -> Vec<bool> {
    (1..=mask.len()).map(|p| mask.is_true_at(p)).collect()
}

fn small_double() -> impl Strategy<Value = f64> {
    (-50i32..50).prop_map(|n| n as f64 / 2.0)
}

const WORDS: [&str; 4] = ["", "b", "bb", "c"];

fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 2, 20).unwrap() + Duration::days(offset)
}

fn assert_swaps(a: &Column, b: &Column, rel: Relation) -> Result<(), TestCaseError> {
    let forward = a.calc_relation(b, rel).unwrap();
    let backward = b.calc_relation(a, rel.inverse()).unwrap();
    prop_assert_eq!(rows(&forward), rows(&backward), "{:?} {:?} {:?}", a.kind(), rel, b.kind());
    Ok(())
}

type Row = (
    Option<i32>,
    Option<i64>,
    Option<f64>,
    Option<i64>,
    Option<usize>,
    Option<bool>,
);

fn row() -> impl Strategy<Value = Row> {
    (
        proptest::option::of(-5i32..5),
        proptest::option::of(-5i64..5),
        proptest::option::of(small_double()),
        proptest::option::of(-3i64..3),
        proptest::option::of(0usize..WORDS.len()),
        proptest::option::of(any::<bool>()),
    )
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        rng_seed: proptest::test_runner::RngSeed::Fixed(0),
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn swapping_operands_inverts_the_relation(
        pairs in proptest::collection::vec(
            (proptest::option::of(-25i32..25), proptest::option::of(small_double())),
            0..40,
        ),
        rel in 0usize..RELATIONS.len(),
    ) {
        let rel = RELATIONS[rel];
        let ints = Column::from(IntColumn::from_options(pairs.iter().map(|p| p.0)));
        let doubles = Column::from(DoubleColumn::from_options(pairs.iter().map(|p| p.1)));

        let forward = ints.calc_relation(&doubles, rel).unwrap();
        let backward = doubles.calc_relation(&ints, rel.inverse()).unwrap();
        prop_assert_eq!(rows(&forward), rows(&backward));
    }

    #[test]
    fn swapping_operands_inverts_the_relation_on_every_kind_pair(
        table in proptest::collection::vec(row(), 0..30),
        rel in 0usize..RELATIONS.len(),
        word in 0usize..WORDS.len(),
    ) {
        let rel = RELATIONS[rel];
        let n = table.len();
        let ints = Column::from(IntColumn::from_options(table.iter().map(|r| r.0)));
        let longs = Column::from(LongColumn::from_options(table.iter().map(|r| r.1)));
        let doubles = Column::from(DoubleColumn::from_options(table.iter().map(|r| r.2)));
        let dates = Column::from(DateColumn::from_options(table.iter().map(|r| r.3.map(day))));
        let words = Column::from(StringColumn::from_options(
            table.iter().map(|r| r.4.map(|i| Arc::<str>::from(WORDS[i]))),
        ));
        let bools = Column::from(BoolColumn::from_options(table.iter().map(|r| r.5)));

        assert_swaps(&longs, &ints, rel)?;
        assert_swaps(&dates, &dates.reverse(), rel)?;
        assert_swaps(&words, &Column::from(ConstColumn::new(WORDS[word], n)), rel)?;
        assert_swaps(&ints, &Column::from(ConstColumn::new(Value::Null, n)), rel)?;
        assert_swaps(&words, &Column::from(ConstColumn::new(Value::Null, n)), rel)?;

        assert_swaps(&Column::from(longs.to_object()), &ints, rel)?;
        assert_swaps(&Column::from(ints.to_object()), &longs, rel)?;
        assert_swaps(&Column::from(ints.to_object()), &doubles, rel)?;
        assert_swaps(&Column::from(dates.reverse().to_object()), &dates, rel)?;
        assert_swaps(&Column::from(words.reverse().to_object()), &words, rel)?;
        assert_swaps(&Column::from(bools.reverse().to_object()), &bools, rel)?;
    }

    #[test]
    fn null_scalar_matches_boxed_comparison(
        values in proptest::collection::vec(proptest::option::of(-5i32..5), 0..30),
        rel in 0usize..RELATIONS.len(),
    ) {
        let rel = RELATIONS[rel];
        let ints = Column::from(IntColumn::from_options(values.iter().copied()));
        let mask = ints.calc_relation_value(&Value::Null, rel).unwrap();
        let swapped = Column::from(ConstColumn::new(Value::Null, values.len()))
            .calc_relation(&ints, rel.inverse())
            .unwrap();

        let expected: Vec<bool> = values
            .iter()
            .map(|v| {
                let row = v.map_or(Value::Null, Value::Int);
                match rel {
                    Relation::And => false,
                    Relation::Or => row.is_true(),
                    _ => rel.test(row.try_compare(&Value::Null).unwrap()),
                }
            })
            .collect();
        prop_assert_eq!(rows(&mask), expected.clone());
        prop_assert_eq!(rows(&swapped), expected);
    }

    #[test]
    fn column_against_scalar_matches_boxed_comparison(
        values in proptest::collection::vec(proptest::option::of(-25i64..25), 0..40),
        scalar in -25i64..25,
        rel in 0usize..6,
    ) {
        let rel = RELATIONS[rel];
        let longs = LongColumn::from_options(values.iter().copied());
        let mask = Column::from(longs)
            .calc_relation_value(&Value::Int(scalar as i32), rel)
            .unwrap();

        let expected: Vec<bool> = values
            .iter()
            .map(|v| {
                let row = v.map_or(Value::Null, Value::Long);
                rel.test(row.try_compare(&Value::Int(scalar as i32)).unwrap())
            })
            .collect();
        prop_assert_eq!(rows(&mask), expected);
    }
}

#[test]
fn null_rows_equal_each_other_and_sort_below_values() {
    let a = Column::from(IntColumn::from_options([None, None, Some(1)]));
    let b = Column::from(IntColumn::from_options([None, Some(0), None]));
    assert_eq!(rows(&a.calc_relation(&b, Relation::Equal).unwrap()), vec![true, false, false]);
    assert_eq!(rows(&a.calc_relation(&b, Relation::Less).unwrap()), vec![false, true, false]);
    assert_eq!(rows(&a.calc_relation(&b, Relation::Greater).unwrap()), vec![false, false, true]);
}

#[test]
fn bool_against_int_is_incomparable() {
    let bools = Column::from(BoolColumn::from_slice(&[true]));
    let ints = Column::from(IntColumn::from_slice(&[1]));
    assert!(matches!(
        bools.calc_relation(&ints, Relation::Equal),
        Err(ColumnError::IncomparableOperands { .. })
    ));
    assert!(matches!(
        ints.calc_relation(&bools, Relation::Equal),
        Err(ColumnError::IncomparableOperands { .. })
    ));
}
