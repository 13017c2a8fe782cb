//! Reference transformation
//!
//! References follow the same position rules as operations: an insert at or
//! before a position pushes it back, a removal before it pulls it forward and
//! a reorder maps it through the move. A position that a removal strictly
//! covers no longer exists and `None` is returned, after which the owning
//! reference is disposed.

use super::array::reorder_index;
use crate::ot::ops::DiscreteOperation;
use crate::reference::ReferenceValues;
use crate::util::IndexRange;

/// Position rules for Index references
pub struct IndexTransformer;

impl IndexTransformer {
    pub fn handle_insert(values: &[usize], index: usize, length: usize) -> Vec<usize> {
        values
            .iter()
            .map(|&value| {
                if value >= index {
                    value.saturating_add(length)
                } else {
                    value
                }
            })
            .collect()
    }

    pub fn handle_remove(values: &[usize], index: usize, length: usize) -> Option<Vec<usize>> {
        values
            .iter()
            .map(|&value| {
                if value <= index {
                    Some(value)
                } else if value >= index.saturating_add(length) {
                    Some(value - length)
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn handle_reorder(values: &[usize], from_index: usize, to_index: usize) -> Vec<usize> {
        values
            .iter()
            .map(|&value| reorder_index(from_index, to_index, value))
            .collect()
    }
}

/// Position rules for Range references
pub struct RangeTransformer;

impl RangeTransformer {
    pub fn handle_insert(values: &[IndexRange], index: usize, length: usize) -> Vec<IndexRange> {
        let shift = |value: usize| {
            if value >= index {
                value.saturating_add(length)
            } else {
                value
            }
        };
        values
            .iter()
            .map(|range| IndexRange::new(shift(range.start), shift(range.end)))
            .collect()
    }

    /// Endpoints inside the removal clamp to its start; a non-empty range the
    /// removal covers entirely is gone
    pub fn handle_remove(
        values: &[IndexRange],
        index: usize,
        length: usize,
    ) -> Option<Vec<IndexRange>> {
        let end = index.saturating_add(length);
        let clamp = |value: usize| {
            if value <= index {
                value
            } else if value >= end {
                value - length
            } else {
                index
            }
        };

        values
            .iter()
            .map(|range| {
                if !range.is_empty() && index <= range.start && range.end <= end {
                    None
                } else {
                    Some(IndexRange::new(clamp(range.start), clamp(range.end)))
                }
            })
            .collect()
    }

    pub fn handle_reorder(
        values: &[IndexRange],
        from_index: usize,
        to_index: usize,
    ) -> Vec<IndexRange> {
        values
            .iter()
            .map(|range| {
                let start = reorder_index(from_index, to_index, range.start);
                let end = reorder_index(from_index, to_index, range.end);
                IndexRange::new(start.min(end), start.max(end))
            })
            .collect()
    }
}

/// Adjusts reference values against an operation on the reference's source
pub struct ReferenceTransformer;

impl ReferenceTransformer {
    /// New values after `op`, or `None` when the reference must be disposed
    pub fn transform(op: &DiscreteOperation, values: &ReferenceValues) -> Option<ReferenceValues> {
        use DiscreteOperation as D;
        use ReferenceValues as V;

        if op.is_no_op() {
            return Some(values.clone());
        }

        match (op, values) {
            (D::StringInsert(op), V::Index(v)) => {
                Some(V::Index(IndexTransformer::handle_insert(v, op.index, op.len())))
            }
            (D::StringInsert(op), V::Range(v)) => {
                Some(V::Range(RangeTransformer::handle_insert(v, op.index, op.len())))
            }
            (D::StringRemove(op), V::Index(v)) => {
                IndexTransformer::handle_remove(v, op.index, op.len()).map(V::Index)
            }
            (D::StringRemove(op), V::Range(v)) => {
                RangeTransformer::handle_remove(v, op.index, op.len()).map(V::Range)
            }
            (D::ArrayInsert(op), V::Index(v)) => {
                Some(V::Index(IndexTransformer::handle_insert(v, op.index, 1)))
            }
            (D::ArrayInsert(op), V::Range(v)) => {
                Some(V::Range(RangeTransformer::handle_insert(v, op.index, 1)))
            }
            // The removed element itself is gone
            (D::ArrayRemove(op), V::Index(v)) if v.contains(&op.index) => None,
            (D::ArrayRemove(op), V::Index(v)) => {
                IndexTransformer::handle_remove(v, op.index, 1).map(V::Index)
            }
            (D::ArrayRemove(op), V::Range(v)) => {
                RangeTransformer::handle_remove(v, op.index, 1).map(V::Range)
            }
            (D::ArrayMove(op), V::Index(v)) => Some(V::Index(IndexTransformer::handle_reorder(
                v,
                op.from_index,
                op.to_index,
            ))),
            (D::ArrayMove(op), V::Range(v)) => Some(V::Range(RangeTransformer::handle_reorder(
                v,
                op.from_index,
                op.to_index,
            ))),
            (D::StringSet(_) | D::ArraySet(_), V::Index(_) | V::Range(_)) => None,
            (D::ObjectRemoveProperty(op), V::Property(keys)) => Some(V::Property(
                keys.iter().filter(|key| **key != op.key).cloned().collect(),
            )),
            (D::ObjectSet(_), V::Property(_)) => Some(V::Property(Vec::new())),
            (_, values) => Some(values.clone()),
        }
    }
}
