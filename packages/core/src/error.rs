//! Error types for the core layer.

use thiserror::Error;

use crate::id::SubscriptionId;
use crate::name::{Name, NameError};

/// Errors raised by class registration, composition and invocation.
///
/// Conflicts and cycles are programmer errors in the class graph and fail
/// the offending call. A missing parent is not an error: composition logs a
/// warning and continues with the child alone.
#[derive(Debug, Clone, Error)]
pub enum ClassError {
    /// Re-registration tried to merge a field over an operation (or the
    /// reverse) under the same member name.
    #[error("cannot merge member '{member}' of {class}: {existing} is already defined, got {incoming}")]
    DuplicateDefinitionConflict {
        class: Name,
        member: String,
        existing: &'static str,
        incoming: &'static str,
    },

    /// No class registered under this name.
    #[error("class not found: {0}")]
    ClassNotFound(Name),

    /// The parent chain loops back on itself.
    #[error("inheritance cycle: {}", format_cycle(.0))]
    InheritanceCycle(Vec<Name>),

    /// The instance has no operation with this name.
    #[error("operation not found: {0}")]
    OperationNotFound(String),

    /// The member exists but is a field.
    #[error("member '{0}' is a field, not an operation")]
    NotAnOperation(String),

    /// The member exists but is an operation.
    #[error("member '{0}' is an operation, not a field")]
    NotAField(String),

    /// A parent call was made from an operation that overrides nothing.
    #[error("operation '{0}' has no parent operation to call")]
    NoParentOperation(String),

    /// Invalid class name.
    #[error("invalid class name: {0}")]
    InvalidName(#[from] NameError),

    /// An operation body reported a failure.
    #[error("operation '{operation}' failed: {message}")]
    OperationFailed { operation: String, message: String },
}

impl ClassError {
    /// Convenience constructor for operation bodies.
    pub fn failed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        ClassError::OperationFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

fn format_cycle(names: &[Name]) -> String {
    names
        .iter()
        .map(Name::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors raised by the event buses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// Channel names must be non-empty.
    #[error("channel name must not be empty")]
    EmptyChannel,
}

/// A batch subscription stopped part way through.
///
/// Subscriptions made before the failure stay registered; their ids are
/// listed in `registered` so the caller can roll them back if needed.
#[derive(Debug, Clone, Error)]
#[error("batch subscription failed after {} listener(s): {error}", .registered.len())]
pub struct BatchSubscribeError {
    pub registered: Vec<(String, SubscriptionId)>,
    pub error: EventError,
}
