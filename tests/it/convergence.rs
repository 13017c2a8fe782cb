//! Property tests: every transformed pair converges when applied to a model

use crate::helpers::{model_with, TARGET};
use otsync_core::model::{DataValue, Model};
use chrono::{DateTime, TimeZone, Utc};
use otsync_core::ot::ops::{
    ArrayInsertOperation, ArrayMoveOperation, ArrayRemoveOperation, ArrayReplaceOperation,
    ArraySetOperation, BooleanSetOperation, DateSetOperation, DiscreteOperation,
    NumberDeltaOperation, NumberSetOperation, ObjectAddPropertyOperation,
    ObjectRemovePropertyOperation, ObjectSetOperation, ObjectSetPropertyOperation,
    StringInsertOperation, StringRemoveOperation, StringSetOperation,
};
use otsync_core::ot::{transform_discrete, RangeTransformer};
use otsync_core::util::{range_range_relationship, IndexRange};
use otsync_core::OtError;
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;

fn fail(err: OtError) -> TestCaseError {
    TestCaseError::fail(err.to_string())
}

/// Apply `s` then `c'` and `c` then `s'` and compare the resulting documents
fn assert_converges(
    base: &Model,
    s: &DiscreteOperation,
    c: &DiscreteOperation,
) -> Result<(), TestCaseError> {
    let pair = transform_discrete(s, c).map_err(fail)?;

    let mut server_first = base.clone();
    server_first.apply(s).map_err(fail)?;
    server_first.apply(&pair.c).map_err(fail)?;

    let mut client_first = base.clone();
    client_first.apply(c).map_err(fail)?;
    client_first.apply(&pair.s).map_err(fail)?;

    prop_assert_eq!(
        server_first.to_json(),
        client_first.to_json(),
        "s = {:?}, c = {:?}",
        s,
        c
    );
    Ok(())
}

fn array_op(len: usize, kind: u8, a: usize, b: usize, tag: &str) -> DiscreteOperation {
    let value = DataValue::number(format!("{}:1", tag), (a * 10 + b) as f64);
    if len == 0 {
        return match kind % 2 {
            0 => ArrayInsertOperation::new(TARGET, 0, value).into(),
            _ => ArraySetOperation::new(TARGET, vec![value], None).into(),
        };
    }
    match kind % 5 {
        0 => ArrayInsertOperation::new(TARGET, a % (len + 1), value).into(),
        1 => ArrayRemoveOperation::new(TARGET, a % len, None).into(),
        2 => ArrayReplaceOperation::new(TARGET, a % len, value, None).into(),
        3 => ArrayMoveOperation::new(TARGET, a % len, b % len).into(),
        _ => ArraySetOperation::new(TARGET, vec![value], None).into(),
    }
}

fn string_op(text: &str, kind: u8, a: usize, b: usize, inserted: &str) -> DiscreteOperation {
    let len = text.chars().count();
    let kind = if len == 0 { (kind % 2) * 2 } else { kind % 3 };
    match kind {
        0 => StringInsertOperation::new(TARGET, a % (len + 1), inserted).into(),
        1 => {
            let start = a % len;
            let length = 1 + b % (len - start);
            let removed: String = text.chars().skip(start).take(length).collect();
            StringRemoveOperation::new(TARGET, start, removed).into()
        }
        _ => StringSetOperation::new(TARGET, inserted.repeat(3), None).into(),
    }
}

/// Operations on `{"a": 1, "b": 2}`; adds only target the absent key "n"
fn object_op(kind: u8, key: usize, n: i32, tag: &str) -> DiscreteOperation {
    let existing = ["a", "b"][key % 2];
    let value = DataValue::number(format!("{}:1", tag), f64::from(n));
    match kind % 4 {
        0 => ObjectAddPropertyOperation::new(TARGET, "n", value).into(),
        1 => ObjectSetPropertyOperation::new(TARGET, existing, value, None).into(),
        2 => ObjectRemovePropertyOperation::new(TARGET, existing, None).into(),
        _ => {
            let values = BTreeMap::from([("z".to_string(), value)]);
            ObjectSetOperation::new(TARGET, values, None).into()
        }
    }
}

fn number_op(kind: u8, n: i32) -> DiscreteOperation {
    match kind % 2 {
        0 => NumberDeltaOperation::new(TARGET, f64::from(n)).into(),
        _ => NumberSetOperation::new(TARGET, f64::from(n), None).into(),
    }
}

fn date(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap()
}

/// Model `{"v": <date>}` with the date at [`TARGET`]
fn date_model(secs: i64) -> Model {
    let fields = BTreeMap::from([("v".to_string(), DataValue::date(TARGET, date(secs)))]);
    Model::new(DataValue::object("m:1", fields)).unwrap()
}

/// `transform(c, s)` hands back the same two operations with the roles swapped
fn assert_mirrored(s: &DiscreteOperation, c: &DiscreteOperation) -> Result<(), TestCaseError> {
    let pair = transform_discrete(s, c).map_err(fail)?;
    let swapped = transform_discrete(c, s).map_err(fail)?;
    prop_assert_eq!(&swapped.s, &pair.c, "s = {:?}, c = {:?}", s, c);
    prop_assert_eq!(&swapped.c, &pair.s, "s = {:?}, c = {:?}", s, c);
    Ok(())
}

type Placement = (u8, usize, usize);

fn placement() -> impl Strategy<Value = Placement> {
    (0u8..6, 0usize..8, 0usize..8)
}

proptest! {
    #[test]
    fn array_pairs_converge(len in 0usize..6, s in placement(), c in placement()) {
        let base = model_with(json!((0..len).collect::<Vec<_>>()));
        let s = array_op(len, s.0, s.1, s.2, "s");
        let c = array_op(len, c.0, c.1, c.2, "c");
        assert_converges(&base, &s, &c)?;
    }

    #[test]
    fn string_pairs_converge(text in "[a-dé]{0,8}", s in placement(), c in placement()) {
        let base = model_with(json!(text));
        let s = string_op(&text, s.0, s.1, s.2, "XY");
        let c = string_op(&text, c.0, c.1, c.2, "Z");
        assert_converges(&base, &s, &c)?;
    }

    #[test]
    fn object_pairs_converge(
        s in (0u8..4, 0usize..2, -9i32..9),
        c in (0u8..4, 0usize..2, -9i32..9),
    ) {
        let base = model_with(json!({"a": 1, "b": 2}));
        let s = object_op(s.0, s.1, s.2, "s");
        let c = object_op(c.0, c.1, c.2, "c");
        assert_converges(&base, &s, &c)?;
    }

    #[test]
    fn number_pairs_converge(start in -50i32..50, s in (0u8..2, -20i32..20), c in (0u8..2, -20i32..20)) {
        let base = model_with(json!(start));
        assert_converges(&base, &number_op(s.0, s.1), &number_op(c.0, c.1))?;
    }

    #[test]
    fn boolean_pairs_converge(start: bool, s: bool, c: bool) {
        let base = model_with(json!(start));
        let s: DiscreteOperation = BooleanSetOperation::new(TARGET, s, None).into();
        let c: DiscreteOperation = BooleanSetOperation::new(TARGET, c, None).into();
        assert_converges(&base, &s, &c)?;
    }

    #[test]
    fn date_pairs_converge(start in 0i64..1_000, s in 0i64..1_000, c in 0i64..1_000) {
        let base = date_model(start);
        let s: DiscreteOperation = DateSetOperation::new(TARGET, date(s), None).into();
        let c: DiscreteOperation = DateSetOperation::new(TARGET, date(c), None).into();
        assert_converges(&base, &s, &c)?;
    }

    #[test]
    fn string_pairs_mirror_without_ties(
        text in "[a-dé]{1,8}",
        s in placement(),
        c in placement(),
    ) {
        // Inserts and removals only; two inserts at one position are a tie
        let s = string_op(&text, s.0 % 2, s.1, s.2, "XY");
        let c = string_op(&text, c.0 % 2, c.1, c.2, "Z");
        if let (DiscreteOperation::StringInsert(a), DiscreteOperation::StringInsert(b)) = (&s, &c) {
            prop_assume!(a.index != b.index);
        }
        assert_mirrored(&s, &c)?;
    }

    #[test]
    fn array_inserts_mirror_without_ties(len in 0usize..6, a in 0usize..8, b in 0usize..8) {
        let (a, b) = (a % (len + 1), b % (len + 1));
        prop_assume!(a != b);
        let s: DiscreteOperation = ArrayInsertOperation::new(TARGET, a, DataValue::null("s:1")).into();
        let c: DiscreteOperation = ArrayInsertOperation::new(TARGET, b, DataValue::null("c:1")).into();
        assert_mirrored(&s, &c)?;
    }

    #[test]
    fn range_reorder_keeps_ranges_ordered(
        start in 0usize..6,
        length in 0usize..4,
        from in 0usize..10,
        to in 0usize..10,
    ) {
        let ranges = [IndexRange::new(start, start + length)];
        let moved = RangeTransformer::handle_reorder(&ranges, from, to);
        prop_assert_eq!(moved.len(), 1);
        prop_assert!(moved[0].start <= moved[0].end);
        if from == to {
            prop_assert_eq!(moved[0], ranges[0]);
        }
    }

    #[test]
    fn array_set_dominates(len in 1usize..6, c in placement()) {
        let set: DiscreteOperation =
            ArraySetOperation::new(TARGET, vec![DataValue::null("s:1")], None).into();
        let c = array_op(len, c.0, c.1, c.2, "c");
        let pair = transform_discrete(&set, &c).map_err(fail)?;
        prop_assert!(pair.c.is_no_op());
        prop_assert!(!pair.s.is_no_op());
    }

    #[test]
    fn string_set_dominates(text in "[a-d]{1,8}", c in placement()) {
        let set: DiscreteOperation = StringSetOperation::new(TARGET, "new", None).into();
        let c = string_op(&text, c.0 % 2, c.1, c.2, "Z");
        let pair = transform_discrete(&set, &c).map_err(fail)?;
        prop_assert!(pair.c.is_no_op());
    }

    #[test]
    fn range_relationship_inverse(
        s in (0usize..10, 1usize..6),
        c in (0usize..10, 1usize..6),
    ) {
        let (s_start, s_end) = (s.0, s.0 + s.1);
        let (c_start, c_end) = (c.0, c.0 + c.1);
        let forward = range_range_relationship(s_start, s_end, c_start, c_end);
        let backward = range_range_relationship(c_start, c_end, s_start, s_end);
        prop_assert_eq!(forward.inverse(), backward);
        prop_assert_eq!(forward == backward, (s_start, s_end) == (c_start, c_end));
    }
}

#[test]
fn converges_on_multibyte_text() {
    let base = model_with(json!("héllo wörld"));
    let s: DiscreteOperation = StringRemoveOperation::new(TARGET, 1, "éllo wö").into();
    let c: DiscreteOperation = StringInsertOperation::new(TARGET, 7, "ß").into();
    assert_converges(&base, &s, &c).unwrap();

    let mut model = base.clone();
    let pair = transform_discrete(&s, &c).unwrap();
    model.apply(&c).unwrap();
    model.apply(&pair.s).unwrap();
    assert_eq!(model.to_json()["v"], json!("hrld"));
}

#[test]
fn same_key_add_and_set_conflict() {
    let add: DiscreteOperation =
        ObjectAddPropertyOperation::new(TARGET, "a", DataValue::number("s:1", 5.0)).into();
    let set: DiscreteOperation =
        ObjectSetPropertyOperation::new(TARGET, "a", DataValue::number("c:1", 6.0), None).into();

    assert!(transform_discrete(&add, &set).unwrap_err().is_conflict());
    assert!(transform_discrete(&set, &add).unwrap_err().is_conflict());

    // A different key is no conflict at all
    let other: DiscreteOperation =
        ObjectAddPropertyOperation::new(TARGET, "n", DataValue::number("s:2", 5.0)).into();
    assert_converges(&model_with(json!({"a": 1})), &other, &set).unwrap();
}

#[test]
fn range_reference_follows_a_move() {
    // "abcde" with "bcd" selected; moving "a" to the end pulls the selection forward
    let selected = [IndexRange::new(1, 4)];
    assert_eq!(
        RangeTransformer::handle_reorder(&selected, 0, 4),
        vec![IndexRange::new(0, 3)]
    );
    // "bc" selected; moving "e" to the front pushes it back
    assert_eq!(
        RangeTransformer::handle_reorder(&[IndexRange::new(1, 3)], 4, 0),
        vec![IndexRange::new(2, 4)]
    );
}
