//! Events produced by variable operations.
//!
//! Operations push events to the design, which forwards them to subscribers and keeps
//! them until drained. No events are produced while the design is being built.

use serde::Serialize;

use crate::model::ComponentId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum VariableEvent {
    /// A variable and all of its references were renamed.
    Renamed {
        component: ComponentId,
        old_name: String,
        new_name: String,
    },
    /// An unnamed expression is about to become a named variable.
    EmptyMaterializeBefore { component: ComponentId },
    /// The component's variable changed kind.
    Converted {
        component: ComponentId,
        from: &'static str,
        to: &'static str,
    },
    /// A statement stayed in place during conversion to a lazy accessor.
    LazyStatementSkipped { component: ComponentId, statement: String },
}

impl VariableEvent {
    pub fn component(&self) -> ComponentId {
        match self {
            VariableEvent::Renamed { component, .. }
            | VariableEvent::EmptyMaterializeBefore { component }
            | VariableEvent::Converted { component, .. }
            | VariableEvent::LazyStatementSkipped { component, .. } => *component,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_tag() {
        let event = VariableEvent::Renamed {
            component: ComponentId(2),
            old_name: "b".into(),
            new_name: "btn".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "renamed");
        assert_eq!(json["component"], 2);
        assert_eq!(json["new_name"], "btn");
        assert_eq!(event.component(), ComponentId(2));
    }
}
