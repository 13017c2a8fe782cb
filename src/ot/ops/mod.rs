//! Operation model: discrete and compound edits over the supported value types
//!
//! Every discrete operation targets exactly one element (`id`) of one
//! container kind. Operations are never mutated in place: transformation
//! functions build adjusted copies (`with_index`, `with_old_value`,
//! `as_no_op`, ...) so the original stays available for change reporting.
//!
//! An operation with `no_op == true` has no observable effect when applied but
//! is still sent and acknowledged, since it occupies a slot in the server's
//! total order.

use crate::error::{OtError, Result};
use serde::{Deserialize, Serialize};

/// Accessors shared by every discrete operation struct
macro_rules! discrete_operation_common {
    ($($op:ident),+ $(,)?) => {
        $(
            impl $op {
                /// Element targeted by this operation
                pub fn id(&self) -> &str {
                    &self.id
                }

                pub fn is_no_op(&self) -> bool {
                    self.no_op
                }

                /// Copy of this operation that has no remaining effect
                pub fn as_no_op(&self) -> Self {
                    Self {
                        no_op: true,
                        ..self.clone()
                    }
                }
            }
        )+
    };
}
pub(crate) use discrete_operation_common;

mod array;
mod object;
mod scalar;
mod string;

pub use array::{
    ArrayInsertOperation, ArrayMoveOperation, ArrayRemoveOperation, ArrayReplaceOperation,
    ArraySetOperation, MoveDirection,
};
pub use object::{
    ObjectAddPropertyOperation, ObjectRemovePropertyOperation, ObjectSetOperation,
    ObjectSetPropertyOperation,
};
pub use scalar::{BooleanSetOperation, DateSetOperation, NumberDeltaOperation, NumberSetOperation};
pub use string::{StringInsertOperation, StringRemoveOperation, StringSetOperation};

/// Type tag of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    ArrayInsert,
    ArrayRemove,
    ArrayReplace,
    ArrayMove,
    ArraySet,
    ObjectAddProperty,
    ObjectSetProperty,
    ObjectRemoveProperty,
    ObjectSet,
    StringInsert,
    StringRemove,
    StringSet,
    NumberDelta,
    NumberSet,
    BooleanSet,
    DateSet,
    Compound,
}

/// Kind of element a discrete operation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    Array,
    Object,
    String,
    Number,
    Boolean,
    Date,
}

impl OperationType {
    /// Container kind, `None` for compound operations
    pub fn container(self) -> Option<ContainerKind> {
        use OperationType::*;
        match self {
            ArrayInsert | ArrayRemove | ArrayReplace | ArrayMove | ArraySet => {
                Some(ContainerKind::Array)
            }
            ObjectAddProperty | ObjectSetProperty | ObjectRemoveProperty | ObjectSet => {
                Some(ContainerKind::Object)
            }
            StringInsert | StringRemove | StringSet => Some(ContainerKind::String),
            NumberDelta | NumberSet => Some(ContainerKind::Number),
            BooleanSet => Some(ContainerKind::Boolean),
            DateSet => Some(ContainerKind::Date),
            Compound => None,
        }
    }

    /// True for operations that replace the whole value of their element
    pub fn is_whole_value_set(self) -> bool {
        use OperationType::*;
        matches!(
            self,
            ArraySet | ObjectSet | StringSet | NumberSet | BooleanSet | DateSet
        )
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

macro_rules! discrete_operations {
    ($($variant:ident($op:ident)),+ $(,)?) => {
        /// One atomic edit to one element
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type", rename_all = "snake_case")]
        pub enum DiscreteOperation {
            $($variant($op),)+
        }

        impl DiscreteOperation {
            /// Element targeted by this operation
            pub fn id(&self) -> &str {
                match self {
                    $(DiscreteOperation::$variant(op) => &op.id,)+
                }
            }

            pub fn is_no_op(&self) -> bool {
                match self {
                    $(DiscreteOperation::$variant(op) => op.no_op,)+
                }
            }

            /// Copy of this operation that has no remaining effect
            pub fn as_no_op(&self) -> Self {
                match self {
                    $(DiscreteOperation::$variant(op) => DiscreteOperation::$variant(op.as_no_op()),)+
                }
            }

            pub fn operation_type(&self) -> OperationType {
                match self {
                    $(DiscreteOperation::$variant(_) => OperationType::$variant,)+
                }
            }
        }

        $(
            impl From<$op> for DiscreteOperation {
                fn from(op: $op) -> Self {
                    DiscreteOperation::$variant(op)
                }
            }
        )+
    };
}

discrete_operations!(
    ArrayInsert(ArrayInsertOperation),
    ArrayRemove(ArrayRemoveOperation),
    ArrayReplace(ArrayReplaceOperation),
    ArrayMove(ArrayMoveOperation),
    ArraySet(ArraySetOperation),
    ObjectAddProperty(ObjectAddPropertyOperation),
    ObjectSetProperty(ObjectSetPropertyOperation),
    ObjectRemoveProperty(ObjectRemovePropertyOperation),
    ObjectSet(ObjectSetOperation),
    StringInsert(StringInsertOperation),
    StringRemove(StringRemoveOperation),
    StringSet(StringSetOperation),
    NumberDelta(NumberDeltaOperation),
    NumberSet(NumberSetOperation),
    BooleanSet(BooleanSetOperation),
    DateSet(DateSetOperation),
);

/// Largest position an operation may address
///
/// No string or vector holds more than `isize::MAX` items. Positions at or
/// below this bound can be shifted by any real length without overflowing.
pub const MAX_POSITION: usize = isize::MAX as usize;

impl DiscreteOperation {
    /// Reject positions no model can have
    pub fn check_bounds(&self) -> Result<()> {
        use DiscreteOperation as D;

        let (label, end) = match self {
            D::ArrayInsert(op) => ("array insert", Some(op.index)),
            D::ArrayRemove(op) => ("array remove", Some(op.index)),
            D::ArrayReplace(op) => ("array replace", Some(op.index)),
            D::ArrayMove(op) => ("array move", Some(op.from_index.max(op.to_index))),
            D::StringInsert(op) => ("string insert", Some(op.index)),
            D::StringRemove(op) => ("string remove", op.index.checked_add(op.len())),
            _ => return Ok(()),
        };
        match end {
            Some(end) if end <= MAX_POSITION => Ok(()),
            _ => Err(OtError::invalid(format!(
                "{} on {} addresses a position past {}",
                label,
                self.id(),
                MAX_POSITION
            ))),
        }
    }

    pub fn container(&self) -> ContainerKind {
        self.view().kind()
    }

    pub fn is_whole_value_set(&self) -> bool {
        self.operation_type().is_whole_value_set()
    }

    /// Borrowed view grouped by container kind
    ///
    /// The transformation registry matches on pairs of these views, so adding
    /// an operation kind forces every affected transform match to handle it.
    pub fn view(&self) -> ContainerOperation<'_> {
        use DiscreteOperation as D;
        match self {
            D::ArrayInsert(op) => ContainerOperation::Array(ArrayOperation::Insert(op)),
            D::ArrayRemove(op) => ContainerOperation::Array(ArrayOperation::Remove(op)),
            D::ArrayReplace(op) => ContainerOperation::Array(ArrayOperation::Replace(op)),
            D::ArrayMove(op) => ContainerOperation::Array(ArrayOperation::Move(op)),
            D::ArraySet(op) => ContainerOperation::Array(ArrayOperation::Set(op)),
            D::ObjectAddProperty(op) => ContainerOperation::Object(ObjectOperation::AddProperty(op)),
            D::ObjectSetProperty(op) => ContainerOperation::Object(ObjectOperation::SetProperty(op)),
            D::ObjectRemoveProperty(op) => {
                ContainerOperation::Object(ObjectOperation::RemoveProperty(op))
            }
            D::ObjectSet(op) => ContainerOperation::Object(ObjectOperation::Set(op)),
            D::StringInsert(op) => ContainerOperation::String(StringOperation::Insert(op)),
            D::StringRemove(op) => ContainerOperation::String(StringOperation::Remove(op)),
            D::StringSet(op) => ContainerOperation::String(StringOperation::Set(op)),
            D::NumberDelta(op) => ContainerOperation::Number(NumberOperation::Delta(op)),
            D::NumberSet(op) => ContainerOperation::Number(NumberOperation::Set(op)),
            D::BooleanSet(op) => ContainerOperation::Boolean(op),
            D::DateSet(op) => ContainerOperation::Date(op),
        }
    }
}

/// A discrete operation viewed through its container kind
#[derive(Debug, Clone, Copy)]
pub enum ContainerOperation<'a> {
    Array(ArrayOperation<'a>),
    Object(ObjectOperation<'a>),
    String(StringOperation<'a>),
    Number(NumberOperation<'a>),
    Boolean(&'a BooleanSetOperation),
    Date(&'a DateSetOperation),
}

impl ContainerOperation<'_> {
    pub fn kind(&self) -> ContainerKind {
        match self {
            ContainerOperation::Array(_) => ContainerKind::Array,
            ContainerOperation::Object(_) => ContainerKind::Object,
            ContainerOperation::String(_) => ContainerKind::String,
            ContainerOperation::Number(_) => ContainerKind::Number,
            ContainerOperation::Boolean(_) => ContainerKind::Boolean,
            ContainerOperation::Date(_) => ContainerKind::Date,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ArrayOperation<'a> {
    Insert(&'a ArrayInsertOperation),
    Remove(&'a ArrayRemoveOperation),
    Replace(&'a ArrayReplaceOperation),
    Move(&'a ArrayMoveOperation),
    Set(&'a ArraySetOperation),
}

impl ArrayOperation<'_> {
    pub fn to_operation(self) -> DiscreteOperation {
        match self {
            ArrayOperation::Insert(op) => op.clone().into(),
            ArrayOperation::Remove(op) => op.clone().into(),
            ArrayOperation::Replace(op) => op.clone().into(),
            ArrayOperation::Move(op) => op.clone().into(),
            ArrayOperation::Set(op) => op.clone().into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ObjectOperation<'a> {
    AddProperty(&'a ObjectAddPropertyOperation),
    SetProperty(&'a ObjectSetPropertyOperation),
    RemoveProperty(&'a ObjectRemovePropertyOperation),
    Set(&'a ObjectSetOperation),
}

impl ObjectOperation<'_> {
    pub fn to_operation(self) -> DiscreteOperation {
        match self {
            ObjectOperation::AddProperty(op) => op.clone().into(),
            ObjectOperation::SetProperty(op) => op.clone().into(),
            ObjectOperation::RemoveProperty(op) => op.clone().into(),
            ObjectOperation::Set(op) => op.clone().into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum StringOperation<'a> {
    Insert(&'a StringInsertOperation),
    Remove(&'a StringRemoveOperation),
    Set(&'a StringSetOperation),
}

impl StringOperation<'_> {
    pub fn to_operation(self) -> DiscreteOperation {
        match self {
            StringOperation::Insert(op) => op.clone().into(),
            StringOperation::Remove(op) => op.clone().into(),
            StringOperation::Set(op) => op.clone().into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum NumberOperation<'a> {
    Delta(&'a NumberDeltaOperation),
    Set(&'a NumberSetOperation),
}

impl NumberOperation<'_> {
    pub fn to_operation(self) -> DiscreteOperation {
        match self {
            NumberOperation::Delta(op) => op.clone().into(),
            NumberOperation::Set(op) => op.clone().into(),
        }
    }
}

/// Ordered group of discrete operations applied as one atomic unit
///
/// Each member is expressed against the state left by the members before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundOperation {
    pub ops: Vec<DiscreteOperation>,
}

impl CompoundOperation {
    pub fn new(ops: Vec<DiscreteOperation>) -> Self {
        Self { ops }
    }

    /// True when no member has an effect left
    pub fn is_no_op(&self) -> bool {
        self.ops.iter().all(DiscreteOperation::is_no_op)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Any operation exchanged with the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    Discrete(DiscreteOperation),
    Compound(CompoundOperation),
}

impl Operation {
    pub fn is_no_op(&self) -> bool {
        match self {
            Operation::Discrete(op) => op.is_no_op(),
            Operation::Compound(op) => op.is_no_op(),
        }
    }

    pub fn operation_type(&self) -> OperationType {
        match self {
            Operation::Discrete(op) => op.operation_type(),
            Operation::Compound(_) => OperationType::Compound,
        }
    }

    /// Discrete members in application order
    pub fn ops(&self) -> &[DiscreteOperation] {
        match self {
            Operation::Discrete(op) => std::slice::from_ref(op),
            Operation::Compound(op) => &op.ops,
        }
    }

    pub fn into_ops(self) -> Vec<DiscreteOperation> {
        match self {
            Operation::Discrete(op) => vec![op],
            Operation::Compound(op) => op.ops,
        }
    }
}

impl From<DiscreteOperation> for Operation {
    fn from(op: DiscreteOperation) -> Self {
        Operation::Discrete(op)
    }
}

impl From<CompoundOperation> for Operation {
    fn from(op: CompoundOperation) -> Self {
        Operation::Compound(op)
    }
}
