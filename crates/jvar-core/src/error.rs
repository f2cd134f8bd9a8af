//! Stable error codes shared by every jvar layer.
//!
//! ## Error Code Mapping
//!
//! - `2`: Illegal operation (a variant does not support the requested mutation)
//! - `3`: Unreachable target (no expression can reference a component at a target)
//! - `4`: Invalid name (identifier syntax or collision)
//! - `5`: Parse error (source or snippet failed to parse)
//! - `6`: Edit error (a text or tree edit could not be applied)
//! - `7`: Configuration error (preferences or toolkit description)
//! - `10`: Internal errors (bugs, unexpected state)
//!
//! Each layer keeps its own `thiserror` enum and maps variants onto an [`ErrorCode`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable numeric error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ErrorCode {
    /// A mutator was called on a variant that does not support it.
    IllegalOperation = 2,
    /// A component cannot be referenced at the requested target.
    UnreachableTarget = 3,
    /// An identifier is malformed or collides with another declaration.
    InvalidName = 4,
    /// Source text failed to parse.
    ParseError = 5,
    /// A text or tree edit could not be applied.
    EditError = 6,
    /// Preferences or toolkit description could not be loaded.
    ConfigError = 7,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl ErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
