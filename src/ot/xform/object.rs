//! Object transformation functions
//!
//! Operations on different keys never interact. On the same key an add racing
//! with anything other than another add means the two sides disagree about
//! whether the property exists, which is a conflict.

use crate::error::{OtError, Result};
use crate::ot::ops::{
    ObjectAddPropertyOperation, ObjectOperation, ObjectRemovePropertyOperation,
    ObjectSetOperation, ObjectSetPropertyOperation,
};
use crate::ot::OperationPair;

pub(super) fn transform(s: ObjectOperation<'_>, c: ObjectOperation<'_>) -> Result<OperationPair> {
    use ObjectOperation::*;

    match (s, c) {
        (Set(s), Set(c)) => Ok(set_set(s, c)),
        (Set(s), c) => Ok(OperationPair::new(s.clone(), c.to_operation().as_no_op())),
        (s, Set(c)) => Ok(OperationPair::new(s.to_operation().as_no_op(), c.clone())),
        (s, c) if key_of(s) != key_of(c) => {
            Ok(OperationPair::new(s.to_operation(), c.to_operation()))
        }
        (AddProperty(s), AddProperty(c)) => Ok(add_add(s, c)),
        (SetProperty(s), SetProperty(c)) => Ok(set_property_set_property(s, c)),
        (SetProperty(s), RemoveProperty(c)) => Ok(set_property_remove(s, c)),
        (RemoveProperty(s), SetProperty(c)) => Ok(remove_set_property(s, c)),
        (RemoveProperty(s), RemoveProperty(c)) => {
            Ok(OperationPair::new(s.as_no_op(), c.as_no_op()))
        }
        (AddProperty(s), SetProperty(_) | RemoveProperty(_)) => Err(add_conflict(&s.id, &s.key)),
        (SetProperty(s), AddProperty(_)) => Err(add_conflict(&s.id, &s.key)),
        (RemoveProperty(s), AddProperty(_)) => Err(add_conflict(&s.id, &s.key)),
    }
}

fn key_of(op: ObjectOperation<'_>) -> Option<&str> {
    match op {
        ObjectOperation::AddProperty(op) => Some(&op.key),
        ObjectOperation::SetProperty(op) => Some(&op.key),
        ObjectOperation::RemoveProperty(op) => Some(&op.key),
        ObjectOperation::Set(_) => None,
    }
}

fn add_conflict(id: &str, key: &str) -> OtError {
    OtError::conflict(
        id,
        format!("property '{}' added concurrently with an edit that assumes it exists", key),
    )
}

/// Two adds of the same key: the server's value wins and becomes a set
fn add_add(s: &ObjectAddPropertyOperation, c: &ObjectAddPropertyOperation) -> OperationPair {
    if s.value == c.value {
        return OperationPair::new(s.as_no_op(), c.as_no_op());
    }
    let set = ObjectSetPropertyOperation {
        id: s.id.clone(),
        no_op: false,
        key: s.key.clone(),
        value: s.value.clone(),
        old_value: Some(c.value.clone()),
    };
    OperationPair::new(set, c.as_no_op())
}

fn set_property_set_property(
    s: &ObjectSetPropertyOperation,
    c: &ObjectSetPropertyOperation,
) -> OperationPair {
    if s.value == c.value {
        OperationPair::new(s.as_no_op(), c.as_no_op())
    } else {
        OperationPair::new(s.with_old_value(Some(c.value.clone())), c.as_no_op())
    }
}

fn set_property_remove(
    s: &ObjectSetPropertyOperation,
    c: &ObjectRemovePropertyOperation,
) -> OperationPair {
    OperationPair::new(s.as_no_op(), c.with_old_value(Some(s.value.clone())))
}

fn remove_set_property(
    s: &ObjectRemovePropertyOperation,
    c: &ObjectSetPropertyOperation,
) -> OperationPair {
    OperationPair::new(s.with_old_value(Some(c.value.clone())), c.as_no_op())
}

fn set_set(s: &ObjectSetOperation, c: &ObjectSetOperation) -> OperationPair {
    if s.values == c.values {
        OperationPair::new(s.as_no_op(), c.as_no_op())
    } else {
        OperationPair::new(s.with_old_values(Some(c.values.clone())), c.as_no_op())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataValue;
    use crate::ot::ops::DiscreteOperation;

    #[test]
    fn test_distinct_keys_unchanged() {
        let s = ObjectAddPropertyOperation::new("o", "a", DataValue::boolean("b:1", true));
        let c = ObjectRemovePropertyOperation::new("o", "b", None);
        let pair =
            transform(ObjectOperation::AddProperty(&s), ObjectOperation::RemoveProperty(&c))
                .unwrap();
        assert_eq!(pair.s, DiscreteOperation::from(s));
        assert_eq!(pair.c, DiscreteOperation::from(c));
    }

    #[test]
    fn test_add_add_becomes_set() {
        let s = ObjectAddPropertyOperation::new("o", "k", DataValue::number("n:1", 1.0));
        let c = ObjectAddPropertyOperation::new("o", "k", DataValue::number("n:2", 2.0));
        let pair =
            transform(ObjectOperation::AddProperty(&s), ObjectOperation::AddProperty(&c)).unwrap();

        match pair.s {
            DiscreteOperation::ObjectSetProperty(op) => {
                assert_eq!(op.value, s.value);
                assert_eq!(op.old_value, Some(c.value.clone()));
            }
            other => panic!("expected set property, got {:?}", other),
        }
        assert!(pair.c.is_no_op());
    }

    #[test]
    fn test_add_against_remove_conflicts() {
        let s = ObjectAddPropertyOperation::new("o", "k", DataValue::null("x"));
        let c = ObjectRemovePropertyOperation::new("o", "k", None);
        let err =
            transform(ObjectOperation::AddProperty(&s), ObjectOperation::RemoveProperty(&c))
                .unwrap_err();
        assert!(err.is_conflict());

        let err =
            transform(ObjectOperation::RemoveProperty(&c), ObjectOperation::AddProperty(&s))
                .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_add_against_set_property_conflicts() {
        let add = ObjectAddPropertyOperation::new("o", "k", DataValue::null("x"));
        let set = ObjectSetPropertyOperation::new("o", "k", DataValue::null("y"), None);
        let err =
            transform(ObjectOperation::SetProperty(&set), ObjectOperation::AddProperty(&add))
                .unwrap_err();
        assert!(err.is_conflict());

        let err =
            transform(ObjectOperation::AddProperty(&add), ObjectOperation::SetProperty(&set))
                .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_set_against_remove() {
        let s = ObjectSetPropertyOperation::new("o", "k", DataValue::string("s:1", "v"), None);
        let c = ObjectRemovePropertyOperation::new("o", "k", None);
        let pair =
            transform(ObjectOperation::SetProperty(&s), ObjectOperation::RemoveProperty(&c))
                .unwrap();
        assert!(pair.s.is_no_op());
        match pair.c {
            DiscreteOperation::ObjectRemoveProperty(op) => {
                assert!(!op.no_op);
                assert_eq!(op.old_value, Some(s.value.clone()));
            }
            other => panic!("expected remove, got {:?}", other),
        }
    }
}
