//! Document model: element values, the element tree and change events

mod document;
mod event;
mod value;

pub use document::{ElementChange, Model};
pub use event::ModelEvent;
pub use value::{DataValue, DataValueKind, IdGenerator, ValueType};
