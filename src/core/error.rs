use crate::editable::EditableId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Property '{property}' not found on '{type_name}'")]
    PropertyNotFound {
        type_name: &'static str,
        property: String,
    },

    #[error("Item {0} not found in editable set")]
    ItemNotFound(EditableId),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Commit of property '{property}' failed: {reason}")]
    CommitFailed { property: String, reason: String },

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EditError>;

impl<T> From<std::sync::PoisonError<T>> for EditError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
