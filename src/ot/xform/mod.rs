//! Transformation function registry
//!
//! [`transform`] reconciles an operation `s` that the server has already
//! ordered with a concurrent operation `c`. Dispatch happens in two levels:
//! first on the container kind, then inside each container module on the
//! ordered pair of operation kinds. Both levels are exhaustive matches, so a
//! new operation kind does not compile until every pair it takes part in has
//! a transformation function.
//!
//! Pairs that never interact short-circuit before dispatch:
//!
//! * operations on different elements are independent
//! * a no-op on either side passes the other operation through unchanged

mod array;
mod object;
pub mod reference;
mod scalar;
mod string;

pub use reference::{IndexTransformer, RangeTransformer, ReferenceTransformer};

use crate::error::{OtError, Result};
use crate::ot::ops::{CompoundOperation, ContainerOperation, DiscreteOperation, Operation};
use crate::ot::OperationPair;

/// Transform two concurrent operations, either of which may be compound
///
/// A compound `s` is applied member by member: `c` is carried through every
/// member in order, and each member is adjusted against the version of `c`
/// that reached it. A compound `c` is handled the same way from the other
/// side. Members that become no-ops stay in the compound so it keeps its
/// shape.
pub fn transform(s: &Operation, c: &Operation) -> Result<OperationPair<Operation>> {
    match (s, c) {
        (Operation::Discrete(s), Operation::Discrete(c)) => {
            let pair = transform_discrete(s, c)?;
            Ok(OperationPair::new(pair.s, pair.c))
        }
        (Operation::Compound(s), c) => {
            let mut c = c.clone();
            let mut ops = Vec::with_capacity(s.len());
            for member in &s.ops {
                let pair = transform(&Operation::Discrete(member.clone()), &c)?;
                ops.extend(pair.s.into_ops());
                c = pair.c;
            }
            Ok(OperationPair::new(CompoundOperation::new(ops), c))
        }
        (s, Operation::Compound(c)) => {
            let mut s = s.clone();
            let mut ops = Vec::with_capacity(c.len());
            for member in &c.ops {
                let pair = transform(&s, &Operation::Discrete(member.clone()))?;
                s = pair.s;
                ops.extend(pair.c.into_ops());
            }
            Ok(OperationPair::new(s, CompoundOperation::new(ops)))
        }
    }
}

/// Transform two concurrent discrete operations
pub fn transform_discrete(s: &DiscreteOperation, c: &DiscreteOperation) -> Result<OperationPair> {
    s.check_bounds()?;
    c.check_bounds()?;
    if s.id() != c.id() || s.is_no_op() || c.is_no_op() {
        return Ok(OperationPair::new(s.clone(), c.clone()));
    }

    use ContainerOperation as C;
    let pair = match (s.view(), c.view()) {
        (C::Array(s), C::Array(c)) => array::transform(s, c),
        (C::Object(s), C::Object(c)) => object::transform(s, c)?,
        (C::String(s), C::String(c)) => string::transform(s, c),
        (C::Number(s), C::Number(c)) => scalar::transform_number(s, c),
        (C::Boolean(s), C::Boolean(c)) => scalar::transform_boolean(s, c),
        (C::Date(s), C::Date(c)) => scalar::transform_date(s, c),
        (s_view, c_view) => {
            return Err(OtError::invalid(format!(
                "{} ({:?}) and {} ({:?}) target the same element {}",
                s.operation_type(),
                s_view.kind(),
                c.operation_type(),
                c_view.kind(),
                s.id()
            )));
        }
    };

    tracing::trace!(
        element = %s.id(),
        s = %s.operation_type(),
        c = %c.operation_type(),
        s_no_op = pair.s.is_no_op(),
        c_no_op = pair.c.is_no_op(),
        "Transformed operation pair"
    );

    Ok(pair)
}
