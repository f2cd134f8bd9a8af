//! The component model of one compilation unit.
//!
//! A [`Design`] owns the [`SourceEditor`] and the tree of components built from it. All
//! variable operations are methods on `Design` taking a [`ComponentId`]: they need the
//! editor, the flow, the preferences and other components (a child references its
//! parent's access expression) at the same time.
//!
//! Edits are bracketed by [`Design::edit`], which records the diff and the events of the
//! bracket and restores the previous state when the operation fails.

mod builder;
mod component;
mod events;
mod lifecycle;
mod record;

use std::collections::HashMap;
use std::fmt;

use jvar_core::diff::generate_unified_diff;
use jvar_java::{Ast, FlowDescription, NodeId, NodeKind, NodeTarget, SourceEditor, StatementTarget};
use tracing::debug;

use crate::config::VariablePreferences;
use crate::error::{VariableError, VariableResult};
use crate::names::NamesManager;
use crate::toolkit::ToolkitDescription;
use crate::variable::Variable;

pub use component::{Association, Component, ComponentId};
pub use events::VariableEvent;
pub use lifecycle::{AddAssociation, AddStrategy};
pub use record::EditRecord;

/// Whether the model is being built from source or edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    /// Initial detection; no events are delivered.
    Parsing,
    Editing,
}

type Listener = Box<dyn FnMut(&VariableEvent)>;

pub struct Design {
    pub(crate) editor: SourceEditor,
    pub(crate) toolkit: ToolkitDescription,
    pub(crate) preferences: VariablePreferences,
    pub(crate) components: Vec<Option<Component>>,
    pub(crate) root: Option<ComponentId>,
    /// The top-level type the components live in.
    pub(crate) ty: NodeId,
    pub(crate) flow: FlowDescription,
    pub(crate) mode: EditMode,
    pub(crate) events: Vec<VariableEvent>,
    /// Statements rewritten under a new identity, old to new.
    replaced: HashMap<NodeId, NodeId>,
    listeners: Vec<Listener>,
}

impl fmt::Debug for Design {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Design")
            .field("toolkit", &self.toolkit.id)
            .field("components", &self.component_ids().len())
            .field("root", &self.root)
            .field("mode", &self.mode)
            .finish()
    }
}

impl Design {
    /// Parse `source` and detect the components and their variables.
    pub fn parse(
        source: impl Into<String>,
        toolkit: ToolkitDescription,
        preferences: VariablePreferences,
    ) -> VariableResult<Design> {
        builder::build(SourceEditor::parse(source)?, toolkit, preferences)
    }

    pub(crate) fn new(
        editor: SourceEditor,
        toolkit: ToolkitDescription,
        preferences: VariablePreferences,
        ty: NodeId,
        flow: FlowDescription,
    ) -> Self {
        Design {
            editor,
            toolkit,
            preferences,
            components: Vec::new(),
            root: None,
            ty,
            flow,
            mode: EditMode::Parsing,
            events: Vec::new(),
            replaced: HashMap::new(),
            listeners: Vec::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn source(&self) -> &str {
        self.editor.source()
    }

    pub fn editor(&self) -> &SourceEditor {
        &self.editor
    }

    pub fn ast(&self) -> &Ast {
        self.editor.ast()
    }

    pub fn toolkit(&self) -> &ToolkitDescription {
        &self.toolkit
    }

    pub fn preferences(&self) -> &VariablePreferences {
        &self.preferences
    }

    pub fn set_preferences(&mut self, preferences: VariablePreferences) {
        self.preferences = preferences;
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn flow(&self) -> &FlowDescription {
        &self.flow
    }

    pub fn root(&self) -> Option<ComponentId> {
        self.root
    }

    pub fn names(&self) -> NamesManager<'_> {
        NamesManager::new(&self.toolkit, &self.preferences)
    }

    pub fn component(&self, id: ComponentId) -> VariableResult<&Component> {
        self.components
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(VariableError::UnknownComponent(id))
    }

    pub(crate) fn component_mut(&mut self, id: ComponentId) -> VariableResult<&mut Component> {
        self.components
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(VariableError::UnknownComponent(id))
    }

    /// Live components in creation order.
    pub fn component_ids(&self) -> Vec<ComponentId> {
        self.components.iter().flatten().map(|c| c.id).collect()
    }

    pub fn variable(&self, id: ComponentId) -> VariableResult<&Variable> {
        Ok(&self.component(id)?.variable)
    }

    /// The component whose variable is named `name`.
    pub fn find(&self, name: &str) -> Option<ComponentId> {
        self.component_ids()
            .into_iter()
            .find(|&id| self.name(id).ok().as_deref() == Some(name))
    }

    /// Components of a class, by simple or qualified name, in creation order.
    pub fn find_by_class(&self, class_name: &str) -> Vec<ComponentId> {
        self.components
            .iter()
            .flatten()
            .filter(|c| {
                c.class_name == class_name || crate::toolkit::simple_name(&c.class_name) == class_name
            })
            .map(|c| c.id)
            .collect()
    }

    /// `id` and all of its descendants, parents first.
    pub fn subtree(&self, id: ComponentId) -> Vec<ComponentId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Ok(component) = self.component(next) {
                stack.extend(component.children.iter().rev().copied());
            }
        }
        out
    }

    pub(crate) fn add_component_record(&mut self, class_name: &str, variable: Variable) -> ComponentId {
        let id = ComponentId(self.components.len() as u32);
        self.components.push(Some(Component::new(id, class_name, variable)));
        id
    }

    pub(crate) fn link_child(&mut self, parent: ComponentId, child: ComponentId, association: Association) -> VariableResult<()> {
        self.component_mut(child)?.parent = Some(parent);
        self.component_mut(child)?.association = Some(association);
        let children = &mut self.component_mut(parent)?.children;
        if !children.contains(&child) {
            children.push(child);
        }
        Ok(())
    }

    // ========================================================================
    // Variables and events
    // ========================================================================

    /// Install a new variable value on a component.
    pub(crate) fn set_variable(&mut self, id: ComponentId, variable: Variable) -> VariableResult<()> {
        let component = self.component_mut(id)?;
        let from = component.variable.kind();
        let to = variable.kind();
        component.variable = variable;
        if from != to {
            debug!(component = %id, from, to, "variable swap");
            self.emit(VariableEvent::Converted { component: id, from, to });
        }
        Ok(())
    }

    pub(crate) fn emit(&mut self, event: VariableEvent) {
        if self.mode == EditMode::Parsing {
            return;
        }
        for listener in &mut self.listeners {
            listener(&event);
        }
        self.events.push(event);
    }

    /// Register a listener called with every event as it is produced.
    pub fn subscribe(&mut self, listener: impl FnMut(&VariableEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Take the events produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<VariableEvent> {
        std::mem::take(&mut self.events)
    }

    /// Run `operation` as one edit. On failure the source and the model are restored.
    /// Listeners have already seen the events of a failed edit.
    pub fn edit<T>(
        &mut self,
        operation: impl FnOnce(&mut Design) -> VariableResult<T>,
    ) -> VariableResult<(T, EditRecord)> {
        let editor = self.editor.clone();
        let components = self.components.clone();
        let root = self.root;
        let replaced = self.replaced.clone();
        let first_event = self.events.len();
        match operation(self) {
            Ok(value) => {
                let record = EditRecord {
                    before: editor.content_hash(),
                    after: self.editor.content_hash(),
                    diff: generate_unified_diff(&self.file_name(), editor.source(), self.editor.source()),
                    events: self.events.get(first_event..).unwrap_or_default().to_vec(),
                };
                Ok((value, record))
            }
            Err(err) => {
                debug!(error = %err, "edit failed, restoring source");
                self.editor = editor;
                self.components = components;
                self.root = root;
                self.replaced = replaced;
                self.events.truncate(first_event);
                Err(err)
            }
        }
    }

    fn file_name(&self) -> String {
        let ast = self.ast();
        let name = match ast.kind(self.ty) {
            NodeKind::TypeDeclaration { name, .. } => ast.identifier(*name).unwrap_or("Unit"),
            _ => "Unit",
        };
        format!("{}.java", name)
    }

    // ========================================================================
    // Rewritten statements
    // ========================================================================

    pub(crate) fn record_replacement(&mut self, old: NodeId, new: NodeId) {
        if old != new {
            self.replaced.insert(old, new);
        }
    }

    /// The current identity of a statement that may have been rewritten.
    pub(crate) fn follow_statement(&self, mut statement: NodeId) -> NodeId {
        while let Some(&next) = self.replaced.get(&statement) {
            statement = next;
        }
        statement
    }

    /// `target` re-anchored on the current identity of its statement.
    pub fn follow_statement_target(&self, target: StatementTarget) -> StatementTarget {
        match target.statement() {
            Some(statement) => target.with_statement(self.follow_statement(statement)),
            None => target,
        }
    }

    pub fn follow_target(&self, target: NodeTarget) -> NodeTarget {
        match target {
            NodeTarget::Statement(t) => NodeTarget::Statement(self.follow_statement_target(t)),
            other => other,
        }
    }

    // ========================================================================
    // Shared queries
    // ========================================================================

    /// Strip parentheses and casts around an expression.
    pub(crate) fn bare(&self, mut node: NodeId) -> NodeId {
        let ast = self.ast();
        loop {
            match ast.kind(node) {
                NodeKind::Parenthesized { expression } | NodeKind::Cast { expression, .. } => node = *expression,
                _ => return node,
            }
        }
    }

    /// The outermost parenthesis or cast wrapping `node`, or `node` itself.
    pub(crate) fn wrapped(&self, mut node: NodeId) -> NodeId {
        let ast = self.ast();
        while let Some(parent) = ast.parent(node) {
            match ast.kind(parent) {
                NodeKind::Parenthesized { .. } => node = parent,
                NodeKind::Cast { expression, .. } if *expression == node => node = parent,
                _ => break,
            }
        }
        node
    }

    /// Attached related nodes of a component, its creation included.
    pub(crate) fn live_related(&self, id: ComponentId) -> VariableResult<Vec<NodeId>> {
        let component = self.component(id)?;
        let ast = self.ast();
        let mut nodes: Vec<NodeId> = component.creation.into_iter().collect();
        for &node in &component.related {
            if !nodes.contains(&node) {
                nodes.push(node);
            }
        }
        nodes.retain(|&n| ast.is_attached(n));
        Ok(nodes)
    }

    /// Human-readable method description for diagnostics.
    pub(crate) fn describe_method(&self, node: NodeId) -> String {
        let ast = self.ast();
        match ast.enclosing_method(node) {
            Some(method) => format!("{}()", ast.method_name(method).unwrap_or("<init>")),
            None => "<type body>".to_string(),
        }
    }

    pub(crate) fn describe_target(&self, target: &NodeTarget) -> String {
        match target {
            NodeTarget::Statement(t) => format!("{} ({})", t, self.editor.describe(t.node())),
            NodeTarget::BodyDeclaration(t) => t.to_string(),
        }
    }

    pub(crate) fn describe_component(&self, id: ComponentId) -> String {
        match self.name(id) {
            Ok(name) => name,
            Err(_) => match self.component(id) {
                Ok(c) => format!("{} ({})", crate::toolkit::simple_name(&c.class_name), id),
                Err(_) => id.to_string(),
            },
        }
    }

    pub(crate) fn unreachable(&self, id: ComponentId, target: &NodeTarget) -> VariableError {
        VariableError::UnreachableTarget {
            component: self.describe_component(id),
            method: self.describe_method(target.anchor()),
            target: self.describe_target(target),
        }
    }
}
