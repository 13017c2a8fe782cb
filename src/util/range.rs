//! Range relationships: how two index ranges (or a range and an index) relate
//!
//! Range/range classification follows Allen's interval algebra over half-open
//! ranges `[start, end)`. Every pair of well formed ranges maps to exactly one
//! of the 13 relationships, and swapping the arguments always yields the
//! [`inverse`](RangeRangeRelationship::inverse) relationship.
//!
//! Range/index classification is used by array moves, whose span
//! `[min(from, to), max(from, to)]` is closed on both ends.
//!
//! # Example
//!
//! ```
//! use otsync_core::util::range::{range_range_relationship, RangeRangeRelationship};
//!
//! // "the grey wizard": removing "grey " vs removing "wizard"
//! let rel = range_range_relationship(4, 9, 9, 15);
//! assert_eq!(rel, RangeRangeRelationship::Meets);
//! assert_eq!(rel.inverse(), RangeRangeRelationship::MetBy);
//! ```

use serde::{Deserialize, Serialize};

/// Relationship of a range `s` to a range `c`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeRangeRelationship {
    /// `s` ends strictly before `c` starts
    Precedes,
    /// `s` starts strictly after `c` ends
    PrecededBy,
    /// `s` ends exactly where `c` starts
    Meets,
    /// `s` starts exactly where `c` ends
    MetBy,
    /// `s` starts first and ends inside `c`
    Overlaps,
    /// `c` starts first and ends inside `s`
    OverlappedBy,
    /// Same start, `s` ends first
    Starts,
    /// Same start, `c` ends first
    StartedBy,
    /// `c` lies strictly inside `s`
    Contains,
    /// `s` lies strictly inside `c`
    ContainedBy,
    /// Same end, `s` starts later
    Finishes,
    /// Same end, `c` starts later
    FinishedBy,
    /// Identical ranges
    EqualTo,
}

impl RangeRangeRelationship {
    /// Relationship obtained when the two ranges swap roles
    pub fn inverse(self) -> Self {
        use RangeRangeRelationship::*;
        match self {
            Precedes => PrecededBy,
            PrecededBy => Precedes,
            Meets => MetBy,
            MetBy => Meets,
            Overlaps => OverlappedBy,
            OverlappedBy => Overlaps,
            Starts => StartedBy,
            StartedBy => Starts,
            Contains => ContainedBy,
            ContainedBy => Contains,
            Finishes => FinishedBy,
            FinishedBy => Finishes,
            EqualTo => EqualTo,
        }
    }

    /// True if the ranges share at least one position
    pub fn intersects(self) -> bool {
        !matches!(
            self,
            RangeRangeRelationship::Precedes
                | RangeRangeRelationship::PrecededBy
                | RangeRangeRelationship::Meets
                | RangeRangeRelationship::MetBy
        )
    }
}

/// Position of an index relative to a closed span `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeIndexRelationship {
    Before,
    Start,
    Within,
    End,
    After,
}

/// Classify the half-open range `[s_start, s_end)` against `[c_start, c_end)`
///
/// Callers must pass well formed ranges (`start <= end`); this is checked in
/// debug builds only.
pub fn range_range_relationship(
    s_start: usize,
    s_end: usize,
    c_start: usize,
    c_end: usize,
) -> RangeRangeRelationship {
    debug_assert!(s_start <= s_end && c_start <= c_end, "malformed range");

    use RangeRangeRelationship::*;

    if s_start == c_start && s_end == c_end {
        EqualTo
    } else if s_end < c_start {
        Precedes
    } else if s_end == c_start {
        Meets
    } else if c_end < s_start {
        PrecededBy
    } else if c_end == s_start {
        MetBy
    } else if s_start == c_start {
        if s_end < c_end {
            Starts
        } else {
            StartedBy
        }
    } else if s_end == c_end {
        if s_start > c_start {
            Finishes
        } else {
            FinishedBy
        }
    } else if s_start < c_start {
        if s_end < c_end {
            Overlaps
        } else {
            Contains
        }
    } else if s_end > c_end {
        OverlappedBy
    } else {
        ContainedBy
    }
}

/// Classify `index` against the closed span `[start, end]`
pub fn range_index_relationship(start: usize, end: usize, index: usize) -> RangeIndexRelationship {
    debug_assert!(start <= end, "malformed range");

    if index < start {
        RangeIndexRelationship::Before
    } else if index == start {
        RangeIndexRelationship::Start
    } else if index < end {
        RangeIndexRelationship::Within
    } else if index == end {
        RangeIndexRelationship::End
    } else {
        RangeIndexRelationship::After
    }
}

/// Half-open `[start, end)` pair tracked by range references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexRange {
    pub start: usize,
    pub end: usize,
}

impl IndexRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

impl std::fmt::Display for IndexRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
