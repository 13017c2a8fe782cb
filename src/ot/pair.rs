//! OperationPair: result of transforming two concurrent operations

use super::ops::DiscreteOperation;

/// The reconciled pair `(s', c')`
///
/// `s'` is the first input adjusted to apply after `c`, and `c'` is the second
/// input adjusted to apply after `s`. Applying `s` then `c'` leaves the
/// document in the same state as applying `c` then `s'`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationPair<T = DiscreteOperation> {
    pub s: T,
    pub c: T,
}

impl<T> OperationPair<T> {
    pub fn new(s: impl Into<T>, c: impl Into<T>) -> Self {
        Self {
            s: s.into(),
            c: c.into(),
        }
    }

    pub fn into_tuple(self) -> (T, T) {
        (self.s, self.c)
    }
}
