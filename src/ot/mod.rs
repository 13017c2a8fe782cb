//! Operational transformation: operations and the functions that reconcile them

pub mod ops;
mod pair;
pub mod xform;

pub use ops::{
    CompoundOperation, ContainerKind, DiscreteOperation, Operation, OperationType,
};
pub use pair::OperationPair;
pub use xform::{
    transform, transform_discrete, IndexTransformer, RangeTransformer, ReferenceTransformer,
};
