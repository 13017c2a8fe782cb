//! Array transformation functions
//!
//! Moves are classified by direction and by where the other operation's index
//! falls inside the move's span `[min(from, to), max(from, to)]`:
//!
//! ```text
//!            Before  Start   Within   End    After
//! Forward      .    [from ... ... ... to]      .
//! Backward     .    [to   ... ... ... from]    .
//! ```
//!
//! When an insert lands in the same gap as a moved element, the moved element
//! stays in front of the inserted one.

use crate::ot::ops::{
    ArrayInsertOperation, ArrayMoveOperation, ArrayOperation, ArrayRemoveOperation,
    ArrayReplaceOperation, ArraySetOperation, MoveDirection,
};
use crate::ot::OperationPair;
use crate::util::{range_index_relationship, RangeIndexRelationship};

use RangeIndexRelationship::{After, Before, End, Start, Within};

pub(super) fn transform(s: ArrayOperation<'_>, c: ArrayOperation<'_>) -> OperationPair {
    use ArrayOperation::*;

    match (s, c) {
        (Insert(s), Insert(c)) => insert_insert(s, c),
        (Insert(s), Remove(c)) => insert_remove(s, c),
        (Insert(s), Replace(c)) => insert_replace(s, c),
        (Insert(s), Move(c)) => insert_move(s, c),
        (Remove(s), Insert(c)) => remove_insert(s, c),
        (Remove(s), Remove(c)) => remove_remove(s, c),
        (Remove(s), Replace(c)) => remove_replace(s, c),
        (Remove(s), Move(c)) => remove_move(s, c),
        (Replace(s), Insert(c)) => replace_insert(s, c),
        (Replace(s), Remove(c)) => replace_remove(s, c),
        (Replace(s), Replace(c)) => replace_replace(s, c),
        (Replace(s), Move(c)) => replace_move(s, c),
        (Move(s), Insert(c)) => move_insert(s, c),
        (Move(s), Remove(c)) => move_remove(s, c),
        (Move(s), Replace(c)) => move_replace(s, c),
        (Move(s), Move(c)) => move_move(s, c),
        (Set(s), Set(c)) => set_set(s, c),
        (Set(s), c) => OperationPair::new(s.clone(), c.to_operation().as_no_op()),
        (s, Set(c)) => OperationPair::new(s.to_operation().as_no_op(), c.clone()),
    }
}

// ── Move helpers ──────────────────────────────────────────────────────────

fn move_relationship(op: &ArrayMoveOperation, index: usize) -> RangeIndexRelationship {
    let (start, end) = op.span();
    range_index_relationship(start, end, index)
}

/// Position the element at `index` occupies once `op` has been applied
pub(crate) fn transform_element_index(op: &ArrayMoveOperation, index: usize) -> usize {
    reorder_index(op.from_index, op.to_index, index)
}

/// Position the element at `index` occupies after moving `from_index` to `to_index`
pub(crate) fn reorder_index(from_index: usize, to_index: usize, index: usize) -> usize {
    use std::cmp::Ordering;
    match from_index.cmp(&to_index) {
        Ordering::Equal => index,
        Ordering::Less => match range_index_relationship(from_index, to_index, index) {
            Before | After => index,
            Start => to_index,
            Within | End => index - 1,
        },
        Ordering::Greater => match range_index_relationship(to_index, from_index, index) {
            Before | After => index,
            End => to_index,
            Start | Within => index + 1,
        },
    }
}

// ── Insert ────────────────────────────────────────────────────────────────

fn insert_insert(s: &ArrayInsertOperation, c: &ArrayInsertOperation) -> OperationPair {
    if s.index <= c.index {
        OperationPair::new(s.clone(), c.with_index(c.index + 1))
    } else {
        OperationPair::new(s.with_index(s.index + 1), c.clone())
    }
}

fn insert_remove(s: &ArrayInsertOperation, c: &ArrayRemoveOperation) -> OperationPair {
    if s.index <= c.index {
        OperationPair::new(s.clone(), c.with_index(c.index + 1))
    } else {
        OperationPair::new(s.with_index(s.index - 1), c.clone())
    }
}

fn insert_replace(s: &ArrayInsertOperation, c: &ArrayReplaceOperation) -> OperationPair {
    if s.index <= c.index {
        OperationPair::new(s.clone(), c.with_index(c.index + 1))
    } else {
        OperationPair::new(s.clone(), c.clone())
    }
}

fn insert_move(s: &ArrayInsertOperation, c: &ArrayMoveOperation) -> OperationPair {
    let shifted = || c.with_indices(c.from_index + 1, c.to_index + 1);

    match c.direction() {
        MoveDirection::Forward => match move_relationship(c, s.index) {
            Before | Start => OperationPair::new(s.clone(), shifted()),
            Within | End => {
                OperationPair::new(s.with_index(s.index - 1), c.with_to_index(c.to_index + 1))
            }
            After => OperationPair::new(s.clone(), c.clone()),
        },
        MoveDirection::Backward => match move_relationship(c, s.index) {
            Before => OperationPair::new(s.clone(), shifted()),
            Start | Within | End => OperationPair::new(
                s.with_index(s.index + 1),
                c.with_from_index(c.from_index + 1),
            ),
            After => OperationPair::new(s.clone(), c.clone()),
        },
        MoveDirection::Identity => {
            if s.index <= c.from_index {
                OperationPair::new(s.clone(), shifted())
            } else {
                OperationPair::new(s.clone(), c.clone())
            }
        }
    }
}

// ── Remove ────────────────────────────────────────────────────────────────

fn remove_insert(s: &ArrayRemoveOperation, c: &ArrayInsertOperation) -> OperationPair {
    if s.index < c.index {
        OperationPair::new(s.clone(), c.with_index(c.index - 1))
    } else {
        OperationPair::new(s.with_index(s.index + 1), c.clone())
    }
}

fn remove_remove(s: &ArrayRemoveOperation, c: &ArrayRemoveOperation) -> OperationPair {
    use std::cmp::Ordering;
    match s.index.cmp(&c.index) {
        Ordering::Less => OperationPair::new(s.clone(), c.with_index(c.index - 1)),
        Ordering::Greater => OperationPair::new(s.with_index(s.index - 1), c.clone()),
        Ordering::Equal => OperationPair::new(s.as_no_op(), c.as_no_op()),
    }
}

fn remove_replace(s: &ArrayRemoveOperation, c: &ArrayReplaceOperation) -> OperationPair {
    use std::cmp::Ordering;
    match s.index.cmp(&c.index) {
        Ordering::Less => OperationPair::new(s.clone(), c.with_index(c.index - 1)),
        Ordering::Greater => OperationPair::new(s.clone(), c.clone()),
        // The replaced element is gone either way
        Ordering::Equal => {
            OperationPair::new(s.with_old_value(Some(c.value.clone())), c.as_no_op())
        }
    }
}

fn remove_move(s: &ArrayRemoveOperation, c: &ArrayMoveOperation) -> OperationPair {
    let shifted = || c.with_indices(c.from_index - 1, c.to_index - 1);

    match c.direction() {
        MoveDirection::Forward => match move_relationship(c, s.index) {
            Before => OperationPair::new(s.clone(), shifted()),
            Start => OperationPair::new(s.with_index(c.to_index), c.as_no_op()),
            Within | End => {
                OperationPair::new(s.with_index(s.index - 1), c.with_to_index(c.to_index - 1))
            }
            After => OperationPair::new(s.clone(), c.clone()),
        },
        MoveDirection::Backward => match move_relationship(c, s.index) {
            Before => OperationPair::new(s.clone(), shifted()),
            Start | Within => OperationPair::new(
                s.with_index(s.index + 1),
                c.with_from_index(c.from_index - 1),
            ),
            End => OperationPair::new(s.with_index(c.to_index), c.as_no_op()),
            After => OperationPair::new(s.clone(), c.clone()),
        },
        MoveDirection::Identity => {
            use std::cmp::Ordering;
            match s.index.cmp(&c.from_index) {
                Ordering::Less => OperationPair::new(s.clone(), shifted()),
                Ordering::Equal => OperationPair::new(s.clone(), c.as_no_op()),
                Ordering::Greater => OperationPair::new(s.clone(), c.clone()),
            }
        }
    }
}

// ── Replace ───────────────────────────────────────────────────────────────

fn replace_insert(s: &ArrayReplaceOperation, c: &ArrayInsertOperation) -> OperationPair {
    if c.index <= s.index {
        OperationPair::new(s.with_index(s.index + 1), c.clone())
    } else {
        OperationPair::new(s.clone(), c.clone())
    }
}

fn replace_remove(s: &ArrayReplaceOperation, c: &ArrayRemoveOperation) -> OperationPair {
    use std::cmp::Ordering;
    match s.index.cmp(&c.index) {
        Ordering::Less => OperationPair::new(s.clone(), c.clone()),
        Ordering::Greater => OperationPair::new(s.with_index(s.index - 1), c.clone()),
        Ordering::Equal => {
            OperationPair::new(s.as_no_op(), c.with_old_value(Some(s.value.clone())))
        }
    }
}

fn replace_replace(s: &ArrayReplaceOperation, c: &ArrayReplaceOperation) -> OperationPair {
    if s.index != c.index {
        OperationPair::new(s.clone(), c.clone())
    } else if s.value == c.value {
        OperationPair::new(s.as_no_op(), c.as_no_op())
    } else {
        OperationPair::new(s.with_old_value(Some(c.value.clone())), c.as_no_op())
    }
}

fn replace_move(s: &ArrayReplaceOperation, c: &ArrayMoveOperation) -> OperationPair {
    OperationPair::new(s.with_index(transform_element_index(c, s.index)), c.clone())
}

// ── Move ──────────────────────────────────────────────────────────────────

fn move_insert(s: &ArrayMoveOperation, c: &ArrayInsertOperation) -> OperationPair {
    let shifted = || s.with_indices(s.from_index + 1, s.to_index + 1);

    match s.direction() {
        MoveDirection::Forward => match move_relationship(s, c.index) {
            Before | Start => OperationPair::new(shifted(), c.clone()),
            Within | End => {
                OperationPair::new(s.with_to_index(s.to_index + 1), c.with_index(c.index - 1))
            }
            After => OperationPair::new(s.clone(), c.clone()),
        },
        MoveDirection::Backward => match move_relationship(s, c.index) {
            Before => OperationPair::new(shifted(), c.clone()),
            Start | Within | End => OperationPair::new(
                s.with_from_index(s.from_index + 1),
                c.with_index(c.index + 1),
            ),
            After => OperationPair::new(s.clone(), c.clone()),
        },
        MoveDirection::Identity => {
            if c.index <= s.from_index {
                OperationPair::new(shifted(), c.clone())
            } else {
                OperationPair::new(s.clone(), c.clone())
            }
        }
    }
}

fn move_remove(s: &ArrayMoveOperation, c: &ArrayRemoveOperation) -> OperationPair {
    let shifted = || s.with_indices(s.from_index - 1, s.to_index - 1);

    match s.direction() {
        MoveDirection::Forward => match move_relationship(s, c.index) {
            Before => OperationPair::new(shifted(), c.clone()),
            Start => OperationPair::new(s.as_no_op(), c.with_index(s.to_index)),
            Within | End => {
                OperationPair::new(s.with_to_index(s.to_index - 1), c.with_index(c.index - 1))
            }
            After => OperationPair::new(s.clone(), c.clone()),
        },
        MoveDirection::Backward => match move_relationship(s, c.index) {
            Before => OperationPair::new(shifted(), c.clone()),
            Start | Within => OperationPair::new(
                s.with_from_index(s.from_index - 1),
                c.with_index(c.index + 1),
            ),
            End => OperationPair::new(s.as_no_op(), c.with_index(s.to_index)),
            After => OperationPair::new(s.clone(), c.clone()),
        },
        MoveDirection::Identity => {
            use std::cmp::Ordering;
            match c.index.cmp(&s.from_index) {
                Ordering::Less => OperationPair::new(shifted(), c.clone()),
                Ordering::Equal => OperationPair::new(s.as_no_op(), c.clone()),
                Ordering::Greater => OperationPair::new(s.clone(), c.clone()),
            }
        }
    }
}

fn move_replace(s: &ArrayMoveOperation, c: &ArrayReplaceOperation) -> OperationPair {
    OperationPair::new(s.clone(), c.with_index(transform_element_index(s, c.index)))
}

/// Two concurrent moves
///
/// Both moved elements are placed relative to the array that contains neither
/// of them; when they target the same gap the element moved by `s` goes first.
fn move_move(s: &ArrayMoveOperation, c: &ArrayMoveOperation) -> OperationPair {
    let s_identity = s.direction() == MoveDirection::Identity;
    let c_identity = c.direction() == MoveDirection::Identity;

    if s_identity {
        let from = transform_element_index(c, s.from_index);
        return OperationPair::new(s.with_indices(from, from), c.clone());
    }
    if c_identity {
        let from = transform_element_index(s, c.from_index);
        return OperationPair::new(s.clone(), c.with_indices(from, from));
    }
    if s.from_index == c.from_index {
        // Same element: s decides where it ends up
        return OperationPair::new(s.with_from_index(c.to_index), c.as_no_op());
    }

    // Each element's position once the other one is taken out
    let c_elem = c.from_index - usize::from(s.from_index < c.from_index);
    let s_elem = s.from_index - usize::from(c.from_index < s.from_index);

    // Target gaps in the array holding neither element
    let s_gap = s.to_index - usize::from(c_elem < s.to_index);
    let c_gap = c.to_index - usize::from(s_elem < c.to_index);

    let s_final = s_gap + usize::from(c_gap < s_gap);
    let c_final = c_gap + usize::from(s_gap <= c_gap);

    OperationPair::new(
        s.with_indices(transform_element_index(c, s.from_index), s_final),
        c.with_indices(transform_element_index(s, c.from_index), c_final),
    )
}

// ── Set ───────────────────────────────────────────────────────────────────

fn set_set(s: &ArraySetOperation, c: &ArraySetOperation) -> OperationPair {
    if s.values == c.values {
        OperationPair::new(s.as_no_op(), c.as_no_op())
    } else {
        OperationPair::new(s.with_old_values(Some(c.values.clone())), c.as_no_op())
    }
}
