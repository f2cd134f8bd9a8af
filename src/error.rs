//! Error type for the variable layer.
//!
//! `VariableError` bridges the errors of the lower layers (`EditError`, `ParseError`,
//! `ValidationError`) into one type and maps every variant onto a stable
//! [`ErrorCode`].
//!
//! ## Error Code Mapping
//!
//! - `IllegalState` → `2` (operation not supported by the current variable kind)
//! - `UnreachableTarget` → `3`
//! - `InvalidName` → `4`
//! - `Parse` → `5`, `Edit` → `6`, `Config` → `7`
//! - `UnknownComponent` → `10`

use jvar_core::ErrorCode;
use jvar_java::{EditError, ParseError, ValidationError};
use thiserror::Error;

use crate::model::ComponentId;

/// Errors from variable operations.
#[derive(Debug, Error)]
pub enum VariableError {
    /// Contract violation: the operation does not apply to the current variable.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// The component cannot be referenced at a target and no conversion helps.
    #[error("{component} is not reachable at {target} in {method}")]
    UnreachableTarget {
        component: String,
        method: String,
        target: String,
    },

    /// A variable name is malformed or collides with another declaration.
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// A component id that the design does not know (or that was deleted).
    #[error("unknown component {0}")]
    UnknownComponent(ComponentId),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Preferences or toolkit description could not be loaded.
    #[error("configuration error: {message}")]
    Config { message: String },
}

pub type VariableResult<T> = Result<T, VariableError>;

impl VariableError {
    pub fn illegal_state(message: impl Into<String>) -> Self {
        VariableError::IllegalState(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        VariableError::Config {
            message: message.into(),
        }
    }

    /// The stable code for this error.
    pub fn code(&self) -> ErrorCode {
        ErrorCode::from(self)
    }
}

impl From<&VariableError> for ErrorCode {
    fn from(err: &VariableError) -> Self {
        match err {
            VariableError::IllegalState(_) => ErrorCode::IllegalOperation,
            VariableError::UnreachableTarget { .. } => ErrorCode::UnreachableTarget,
            VariableError::InvalidName { .. } => ErrorCode::InvalidName,
            VariableError::UnknownComponent(_) => ErrorCode::InternalError,
            VariableError::Edit(_) => ErrorCode::EditError,
            VariableError::Parse(_) => ErrorCode::ParseError,
            VariableError::Config { .. } => ErrorCode::ConfigError,
        }
    }
}

// ============================================================================
// Bridge: ValidationError -> VariableError
// ============================================================================

impl From<ValidationError> for VariableError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidName { name, reason } => VariableError::InvalidName { name, reason },
        }
    }
}

impl From<std::io::Error> for VariableError {
    fn from(err: std::io::Error) -> Self {
        VariableError::config(err.to_string())
    }
}

impl From<serde_json::Error> for VariableError {
    fn from(err: serde_json::Error) -> Self {
        VariableError::config(err.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_variants() {
        assert_eq!(VariableError::illegal_state("x").code(), ErrorCode::IllegalOperation);
        assert_eq!(
            VariableError::UnreachableTarget {
                component: "button".into(),
                method: "run()".into(),
                target: "after #3".into(),
            }
            .code()
            .code(),
            3
        );
        assert_eq!(VariableError::config("bad").code().code(), 7);
        assert_eq!(VariableError::UnknownComponent(ComponentId(4)).code(), ErrorCode::InternalError);
    }

    #[test]
    fn validation_errors_become_invalid_names() {
        let err = jvar_java::validate_java_identifier("while").unwrap_err();
        let err = VariableError::from(err);
        assert!(matches!(err, VariableError::InvalidName { ref name, .. } if name == "while"));
        assert_eq!(err.code(), ErrorCode::InvalidName);
    }

    #[test]
    fn edit_errors_keep_their_message() {
        let err = VariableError::from(EditError::Structure("no block".into()));
        assert_eq!(err.to_string(), "no block");
        assert_eq!(err.code().code(), 6);
    }
}
