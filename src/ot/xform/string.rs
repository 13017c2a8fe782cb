//! String transformation functions
//!
//! Positions and lengths count chars. Two removals are classified with the
//! range utility and each keeps only the text the other one did not already
//! remove. An insert that lands strictly inside a concurrent removal is
//! swallowed by it.

use crate::ot::ops::{
    StringInsertOperation, StringOperation, StringRemoveOperation, StringSetOperation,
};
use crate::ot::OperationPair;
use crate::util::{range_range_relationship, RangeRangeRelationship};

pub(super) fn transform(s: StringOperation<'_>, c: StringOperation<'_>) -> OperationPair {
    use StringOperation::*;

    match (s, c) {
        (Insert(s), Insert(c)) => insert_insert(s, c),
        (Insert(s), Remove(c)) => insert_remove(s, c),
        (Remove(s), Insert(c)) => remove_insert(s, c),
        (Remove(s), Remove(c)) => remove_remove(s, c),
        (Set(s), Set(c)) => set_set(s, c),
        (Set(s), c) => OperationPair::new(s.clone(), c.to_operation().as_no_op()),
        (s, Set(c)) => OperationPair::new(s.to_operation().as_no_op(), c.clone()),
    }
}

/// Chars `[start, end)` of `text`
fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end.saturating_sub(start)).collect()
}

/// `text` with chars `[start, end)` cut out
fn char_cut(text: &str, start: usize, end: usize) -> String {
    text.chars()
        .enumerate()
        .filter(|(i, _)| *i < start || *i >= end)
        .map(|(_, ch)| ch)
        .collect()
}

/// `text` with `inserted` placed before char `at`
fn char_splice(text: &str, at: usize, inserted: &str) -> String {
    let mut out: String = text.chars().take(at).collect();
    out.push_str(inserted);
    out.extend(text.chars().skip(at));
    out
}

fn insert_insert(s: &StringInsertOperation, c: &StringInsertOperation) -> OperationPair {
    if s.index <= c.index {
        OperationPair::new(s.clone(), c.with_index(c.index + s.len()))
    } else {
        OperationPair::new(s.with_index(s.index + c.len()), c.clone())
    }
}

fn insert_remove(s: &StringInsertOperation, c: &StringRemoveOperation) -> OperationPair {
    if s.index <= c.index {
        OperationPair::new(s.clone(), c.with_index(c.index + s.len()))
    } else if s.index >= c.end() {
        OperationPair::new(s.with_index(s.index - c.len()), c.clone())
    } else {
        let swallowed = char_splice(&c.old_value, s.index - c.index, &s.value);
        OperationPair::new(s.as_no_op(), c.with_old_value(swallowed))
    }
}

fn remove_insert(s: &StringRemoveOperation, c: &StringInsertOperation) -> OperationPair {
    if c.index <= s.index {
        OperationPair::new(s.with_index(s.index + c.len()), c.clone())
    } else if c.index >= s.end() {
        OperationPair::new(s.clone(), c.with_index(c.index - s.len()))
    } else {
        let swallowed = char_splice(&s.old_value, c.index - s.index, &c.value);
        OperationPair::new(s.with_old_value(swallowed), c.as_no_op())
    }
}

fn remove_remove(s: &StringRemoveOperation, c: &StringRemoveOperation) -> OperationPair {
    use RangeRangeRelationship::*;

    let (s_start, s_end) = (s.index, s.end());
    let (c_start, c_end) = (c.index, c.end());

    match range_range_relationship(s_start, s_end, c_start, c_end) {
        Precedes | Meets => OperationPair::new(s.clone(), c.with_index(c_start - s.len())),
        PrecededBy | MetBy => OperationPair::new(s.with_index(s_start - c.len()), c.clone()),
        Overlaps => {
            // s keeps its head, c keeps its tail which now starts at s_start
            let s_text = char_slice(&s.old_value, 0, c_start - s_start);
            let c_text = char_slice(&c.old_value, s_end - c_start, c.len());
            OperationPair::new(
                s.with_old_value(s_text),
                c.with_index(s_start).with_old_value(c_text),
            )
        }
        OverlappedBy => {
            let s_text = char_slice(&s.old_value, c_end - s_start, s.len());
            let c_text = char_slice(&c.old_value, 0, s_start - c_start);
            OperationPair::new(
                s.with_index(c_start).with_old_value(s_text),
                c.with_old_value(c_text),
            )
        }
        Starts => {
            let c_text = char_slice(&c.old_value, s.len(), c.len());
            OperationPair::new(s.as_no_op(), c.with_old_value(c_text))
        }
        StartedBy => {
            let s_text = char_slice(&s.old_value, c.len(), s.len());
            OperationPair::new(s.with_old_value(s_text), c.as_no_op())
        }
        Contains => {
            let offset = c_start - s_start;
            let s_text = char_cut(&s.old_value, offset, offset + c.len());
            OperationPair::new(s.with_old_value(s_text), c.as_no_op())
        }
        ContainedBy => {
            let offset = s_start - c_start;
            let c_text = char_cut(&c.old_value, offset, offset + s.len());
            OperationPair::new(s.as_no_op(), c.with_old_value(c_text))
        }
        Finishes => {
            let c_text = char_slice(&c.old_value, 0, s_start - c_start);
            OperationPair::new(s.as_no_op(), c.with_old_value(c_text))
        }
        FinishedBy => {
            let s_text = char_slice(&s.old_value, 0, c_start - s_start);
            OperationPair::new(s.with_old_value(s_text), c.as_no_op())
        }
        EqualTo => OperationPair::new(s.as_no_op(), c.as_no_op()),
    }
}

fn set_set(s: &StringSetOperation, c: &StringSetOperation) -> OperationPair {
    if s.value == c.value {
        OperationPair::new(s.as_no_op(), c.as_no_op())
    } else {
        OperationPair::new(s.with_old_value(Some(c.value.clone())), c.as_no_op())
    }
}
