//! Pure helpers shared by the transformation functions and references

pub mod range;

pub use range::{
    range_index_relationship, range_range_relationship, IndexRange, RangeIndexRelationship,
    RangeRangeRelationship,
};
