//! Summary of one edit bracket.

use jvar_core::ContentHash;
use serde::Serialize;

use crate::model::VariableEvent;

/// What an edit changed: content hashes around it, the diff and the events it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditRecord {
    pub before: ContentHash,
    pub after: ContentHash,
    /// Unified diff of the compilation unit, empty when nothing changed.
    pub diff: String,
    pub events: Vec<VariableEvent>,
}

impl EditRecord {
    pub fn is_noop(&self) -> bool {
        self.before == self.after
    }
}
