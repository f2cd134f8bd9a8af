//! Modeled components.

use std::fmt;

use jvar_java::NodeId;
use serde::{Deserialize, Serialize};

use crate::variable::Variable;

/// Identity of a component within a [`Design`](crate::model::Design).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component {}", self.0)
    }
}

/// How a component is attached to its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Association {
    /// `parent.method(child)`; `invocation` is the method call node.
    Invocation { invocation: NodeId, method: String },
    /// The parent is passed to the child's constructor.
    Constructor { creation: NodeId },
    /// A child the parent exposes through a getter or field.
    Exposed,
    /// A child the parent creates by itself.
    Implicit,
    /// A control owned by its wrapper.
    Wrapped,
}

/// One modeled widget.
#[derive(Debug, Clone)]
pub struct Component {
    pub(crate) id: ComponentId,
    pub(crate) class_name: String,
    pub(crate) parent: Option<ComponentId>,
    pub(crate) children: Vec<ComponentId>,
    /// The expression creating the component, if it is created in this source.
    pub(crate) creation: Option<NodeId>,
    /// Source expressions representing the component: references, invocations on it,
    /// association invocations. May contain nodes that were detached by later edits.
    pub(crate) related: Vec<NodeId>,
    pub(crate) association: Option<Association>,
    pub(crate) variable: Variable,
}

impl Component {
    pub(crate) fn new(id: ComponentId, class_name: impl Into<String>, variable: Variable) -> Self {
        Component {
            id,
            class_name: class_name.into(),
            parent: None,
            children: Vec::new(),
            creation: None,
            related: Vec::new(),
            association: None,
            variable,
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Qualified class name.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn parent(&self) -> Option<ComponentId> {
        self.parent
    }

    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }

    pub fn creation(&self) -> Option<NodeId> {
        self.creation
    }

    pub fn related(&self) -> &[NodeId] {
        &self.related
    }

    pub fn association(&self) -> Option<&Association> {
        self.association.as_ref()
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub(crate) fn add_related(&mut self, node: NodeId) {
        if !self.related.contains(&node) {
            self.related.push(node);
        }
    }
}
