//! Number, boolean and date transformation functions

use crate::ot::ops::{BooleanSetOperation, DateSetOperation, NumberDeltaOperation, NumberOperation};
use crate::ot::OperationPair;

pub(super) fn transform_number(s: NumberOperation<'_>, c: NumberOperation<'_>) -> OperationPair {
    use NumberOperation::*;

    match (s, c) {
        (Delta(s), Delta(c)) => delta_delta(s, c),
        (Set(s), Set(c)) => {
            if s.value == c.value {
                OperationPair::new(s.as_no_op(), c.as_no_op())
            } else {
                OperationPair::new(s.with_old_value(Some(c.value)), c.as_no_op())
            }
        }
        (Set(s), Delta(c)) => OperationPair::new(s.clone(), c.as_no_op()),
        (Delta(s), Set(c)) => OperationPair::new(s.as_no_op(), c.clone()),
    }
}

/// Additions commute
fn delta_delta(s: &NumberDeltaOperation, c: &NumberDeltaOperation) -> OperationPair {
    OperationPair::new(s.clone(), c.clone())
}

pub(super) fn transform_boolean(s: &BooleanSetOperation, c: &BooleanSetOperation) -> OperationPair {
    if s.value == c.value {
        OperationPair::new(s.as_no_op(), c.as_no_op())
    } else {
        OperationPair::new(s.with_old_value(Some(c.value)), c.as_no_op())
    }
}

pub(super) fn transform_date(s: &DateSetOperation, c: &DateSetOperation) -> OperationPair {
    if s.value == c.value {
        OperationPair::new(s.as_no_op(), c.as_no_op())
    } else {
        OperationPair::new(s.with_old_value(Some(c.value)), c.as_no_op())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ot::ops::{DiscreteOperation, NumberSetOperation};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_deltas_commute() {
        let s = NumberDeltaOperation::new("n", 2.0);
        let c = NumberDeltaOperation::new("n", -5.0);
        let pair = transform_number(NumberOperation::Delta(&s), NumberOperation::Delta(&c));
        assert_eq!(pair.s, DiscreteOperation::from(s));
        assert_eq!(pair.c, DiscreteOperation::from(c));
    }

    #[test]
    fn test_set_against_delta() {
        let set = NumberSetOperation::new("n", 10.0, None);
        let delta = NumberDeltaOperation::new("n", 1.0);

        let pair = transform_number(NumberOperation::Set(&set), NumberOperation::Delta(&delta));
        assert!(!pair.s.is_no_op());
        assert!(pair.c.is_no_op());

        let pair = transform_number(NumberOperation::Delta(&delta), NumberOperation::Set(&set));
        assert!(pair.s.is_no_op());
        assert!(!pair.c.is_no_op());
    }

    #[test]
    fn test_concurrent_sets() {
        let s = BooleanSetOperation::new("b", true, None);
        let c = BooleanSetOperation::new("b", false, None);
        let pair = transform_boolean(&s, &c);
        assert_eq!(pair.s, DiscreteOperation::from(s.with_old_value(Some(false))));
        assert!(pair.c.is_no_op());

        let when = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let s = DateSetOperation::new("d", when, None);
        let pair = transform_date(&s, &s.clone());
        assert!(pair.s.is_no_op());
        assert!(pair.c.is_no_op());
    }
}
