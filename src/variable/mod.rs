//! Variables: how a component is referenced in source.
//!
//! Every component holds exactly one [`Variable`]. The variant decides whether the
//! component has a name, how it is referenced at a target and which conversions apply.
//! Conversions install a new variant on the component; callers must re-query targets
//! after any call that may convert.
//!
//! | Family | Variants |
//! |---|---|
//! | named | `LocalUnique`, `LocalReuse`, `FieldUnique`, `FieldReuse`, `FieldInitializer`, `Lazy`, `MethodParameter` |
//! | empty | `Empty` (plain, invocation, pure) |
//! | no name | `This`, `Implicit`, `ExposedProperty`, `ExposedField`, `VoidInvocation`, `WrapperControl` |

mod empty;
mod field;
mod lazy;
pub mod lazy_utils;
mod local;
mod named;
mod noname;
mod parameter;

use jvar_java::{NodeId, NodeKind, NodeTarget, StatementTarget};
use tracing::debug;

use crate::error::{VariableError, VariableResult};
use crate::model::{ComponentId, Design};
use crate::names::{decorate, NamesManager};

pub(crate) use field::{add_field, first_declared_name};
pub(crate) use lazy::invocations as lazy_invocations;
pub(crate) use named::{check_name, reuse_references};
pub use lazy::LazyConversion;
pub use lazy_utils::LazyAccessor;

/// A variable with a declared name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedVariable {
    /// The name written where this component is assigned: the declaring name for
    /// initialized declarations, the left side of an assignment otherwise.
    pub variable: NodeId,
    /// The declaring name (local fragment, field fragment or parameter).
    pub declaration: NodeId,
}

impl NamedVariable {
    pub fn declared(name: NodeId) -> Self {
        NamedVariable {
            variable: name,
            declaration: name,
        }
    }
}

/// How an unnamed creation expression sits in source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyFlavor {
    /// Nested in another expression: `panel.add(new JButton())`.
    Plain,
    /// Created as part of an association invocation added by the designer.
    Invocation,
    /// The whole expression statement: `new JButton();`.
    Pure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyVariable {
    pub initializer: NodeId,
    pub flavor: EmptyFlavor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variable {
    LocalUnique(NamedVariable),
    /// A local assigned more than once; each assignment is a different component.
    LocalReuse(NamedVariable),
    FieldUnique(NamedVariable),
    FieldReuse(NamedVariable),
    /// A field initialized by its declaration.
    FieldInitializer(NamedVariable),
    Lazy(LazyAccessor),
    /// A component passed into an entry method.
    MethodParameter(NamedVariable),
    Empty(EmptyVariable),
    /// The instance of the edited class.
    This,
    /// A child the parent creates itself; materializes into a local on first use.
    Implicit { getter: String },
    ExposedProperty { getter: String },
    ExposedField { field: String },
    /// Created by a `void` factory invocation; cannot be referenced.
    VoidInvocation { invocation: NodeId },
    /// A control reached through its wrapper's `method()`.
    WrapperControl { method: String },
}

impl Variable {
    pub fn kind(&self) -> &'static str {
        match self {
            Variable::LocalUnique(_) => "local unique",
            Variable::LocalReuse(_) => "local reuse",
            Variable::FieldUnique(_) => "field unique",
            Variable::FieldReuse(_) => "field reuse",
            Variable::FieldInitializer(_) => "field initializer",
            Variable::Lazy(_) => "lazy",
            Variable::MethodParameter(_) => "method parameter",
            Variable::Empty(_) => "empty",
            Variable::This => "this",
            Variable::Implicit { .. } => "implicit",
            Variable::ExposedProperty { .. } => "exposed property",
            Variable::ExposedField { .. } => "exposed field",
            Variable::VoidInvocation { .. } => "void invocation",
            Variable::WrapperControl { .. } => "wrapper control",
        }
    }

    pub fn has_name(&self) -> bool {
        self.named().is_some()
    }

    /// The name record of named variants. Lazy variables are named by their field.
    pub fn named(&self) -> Option<NamedVariable> {
        match self {
            Variable::LocalUnique(nv)
            | Variable::LocalReuse(nv)
            | Variable::FieldUnique(nv)
            | Variable::FieldReuse(nv)
            | Variable::FieldInitializer(nv)
            | Variable::MethodParameter(nv) => Some(*nv),
            Variable::Lazy(accessor) => Some(NamedVariable::declared(accessor.field)),
            _ => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Variable::LocalUnique(_) | Variable::LocalReuse(_))
    }

    pub fn is_field(&self) -> bool {
        matches!(
            self,
            Variable::FieldUnique(_) | Variable::FieldReuse(_) | Variable::FieldInitializer(_) | Variable::Lazy(_)
        )
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Variable::Empty(_))
    }

    fn scope(&self) -> named::Scope {
        named::Scope {
            local: self.is_local(),
            reuse: matches!(self, Variable::LocalReuse(_) | Variable::FieldReuse(_)),
        }
    }
}

// ============================================================================
// Contract
// ============================================================================

impl Design {
    pub fn has_name(&self, id: ComponentId) -> VariableResult<bool> {
        Ok(self.component(id)?.variable.has_name())
    }

    /// The variable name. Fails for variants without a name.
    pub fn name(&self, id: ComponentId) -> VariableResult<String> {
        let variable = &self.component(id)?.variable;
        match variable.named() {
            Some(nv) => named::identifier(self.ast(), nv.declaration),
            None => Err(VariableError::illegal_state(format!(
                "{} variable has no name",
                variable.kind()
            ))),
        }
    }

    /// Rename the variable and every reference to it.
    ///
    /// Unnamed expressions are materialized first and reused variables are split into a
    /// dedicated declaration, so only this component is renamed.
    pub fn set_name(&mut self, id: ComponentId, new_name: &str) -> VariableResult<()> {
        let variable = self.component(id)?.variable.clone();
        match variable {
            Variable::LocalUnique(nv)
            | Variable::FieldUnique(nv)
            | Variable::FieldInitializer(nv)
            | Variable::MethodParameter(nv) => named::rename(self, id, nv.declaration, new_name),
            Variable::LocalReuse(nv) => {
                local::reuse_to_field(self, id, nv)?;
                self.set_name(id, new_name)
            }
            Variable::FieldReuse(nv) => {
                field::split_reuse(self, id, nv)?;
                self.set_name(id, new_name)
            }
            Variable::Lazy(accessor) => lazy::rename(self, id, accessor, new_name),
            Variable::Empty(_) | Variable::Implicit { .. } => {
                self.materialize(id)?;
                self.set_name(id, new_name)
            }
            other => Err(VariableError::illegal_state(format!(
                "cannot rename a {} variable",
                other.kind()
            ))),
        }
    }

    /// Rename to a unique name derived from `base`: `button` becomes `button_1` when
    /// `button` is taken.
    pub fn set_name_base(&mut self, id: ComponentId, base: &str) -> VariableResult<()> {
        if matches!(self.component(id)?.variable, Variable::Empty(_) | Variable::Implicit { .. }) {
            self.materialize(id)?;
        }
        let nv = self.component(id)?.variable.named().ok_or_else(|| {
            VariableError::illegal_state("cannot rename a variable without a name")
        })?;
        let position = self.ast().span(nv.declaration).start;
        let name = self.editor.unique_variable_name(position, base, Some(nv.declaration));
        self.set_name(id, &name)
    }

    /// Rename after the component's text changed, following the text rename mode.
    pub fn rename_for_text(&mut self, id: ComponentId, text: &str) -> VariableResult<()> {
        use crate::config::TextRenameMode;

        let Some(nv) = self.component(id)?.variable.named() else {
            return Ok(());
        };
        let class_name = self.component(id)?.class_name.clone();
        let current = self.name(id)?;
        let names = NamesManager::new(&self.toolkit, &self.preferences);
        match self.preferences.text_rename_mode {
            TextRenameMode::Never => return Ok(()),
            TextRenameMode::Default if !names.is_default_name(&class_name, &current) => return Ok(()),
            _ => {}
        }
        let Some(base) = names.name_for_text(&class_name, text) else {
            return Ok(());
        };
        let base = if self.component(id)?.variable.is_field() {
            decorate(&base, &self.preferences.field_prefix, &self.preferences.field_suffix)
        } else {
            decorate(&base, &self.preferences.local_prefix, &self.preferences.local_suffix)
        };
        let position = self.ast().span(nv.declaration).start;
        let name = self.editor.unique_variable_name(position, &base, Some(nv.declaration));
        if name != current {
            self.set_name(id, &name)?;
        }
        Ok(())
    }

    /// Source text referencing the component at `target`.
    ///
    /// May convert the variable (materialize, local to field, split a reused field) so
    /// that the reference is reachable. `target` is updated when a conversion rewrites
    /// its anchor statement.
    pub fn reference_expression(&mut self, id: ComponentId, target: &mut NodeTarget) -> VariableResult<String> {
        let variable = self.component(id)?.variable.clone();
        match variable {
            Variable::LocalUnique(nv) | Variable::LocalReuse(nv) => {
                if named::is_visible_at(self, nv, variable.scope(), target) {
                    return named::identifier(self.ast(), nv.declaration);
                }
                debug!(component = %id, target = %self.describe_target(target), "local not visible, converting to field");
                self.convert_local_to_field(id)?;
                *target = self.follow_target(*target);
                self.reference_expression(id, target)
            }
            Variable::FieldUnique(nv) | Variable::FieldInitializer(nv) => field::reference(self, nv, target),
            Variable::FieldReuse(nv) => {
                if named::is_visible_at(self, nv, variable.scope(), target) {
                    return field::reference(self, nv, target);
                }
                field::split_reuse(self, id, nv)?;
                self.reference_expression(id, target)
            }
            Variable::Lazy(accessor) => lazy::reference(self, accessor, target),
            Variable::MethodParameter(nv) => parameter::reference(self, id, nv, target),
            Variable::Empty(_) | Variable::Implicit { .. } => {
                self.materialize(id)?;
                *target = self.follow_target(*target);
                self.reference_expression(id, target)
            }
            Variable::This => Ok("this".to_string()),
            Variable::ExposedProperty { getter } => {
                Ok(format!("{}{}()", noname::parent_access(self, id, target)?, getter))
            }
            Variable::ExposedField { field } => Ok(format!("{}{}", noname::parent_access(self, id, target)?, field)),
            Variable::VoidInvocation { .. } => Err(VariableError::illegal_state(
                "a component created by a void invocation cannot be referenced",
            )),
            Variable::WrapperControl { method } => {
                Ok(format!("{}{}()", noname::parent_access(self, id, target)?, method))
            }
        }
    }

    /// Prefix for invoking methods on the component at `target`: `"button."`, or `""` for
    /// the edited instance itself.
    pub fn access_expression(&mut self, id: ComponentId, target: &mut NodeTarget) -> VariableResult<String> {
        if matches!(self.component(id)?.variable, Variable::This) {
            return Ok(String::new());
        }
        Ok(format!("{}.", self.reference_expression(id, target)?))
    }

    /// Check if the component's current expression can be referenced at `target` without
    /// conversion.
    pub fn is_visible_at(&self, id: ComponentId, target: &NodeTarget) -> VariableResult<bool> {
        let variable = &self.component(id)?.variable;
        Ok(match variable {
            Variable::LocalUnique(nv) | Variable::LocalReuse(nv) | Variable::FieldUnique(nv) | Variable::FieldReuse(nv) => {
                named::is_visible_at(self, *nv, variable.scope(), target)
            }
            Variable::FieldInitializer(_) | Variable::Lazy(_) | Variable::This => true,
            Variable::MethodParameter(nv) => parameter::is_visible_at(self, *nv, target),
            Variable::Empty(_) | Variable::Implicit { .. } => false,
            Variable::VoidInvocation { invocation } => named::is_ordered_before(self, *invocation, target),
            Variable::ExposedProperty { .. } | Variable::ExposedField { .. } | Variable::WrapperControl { .. } => {
                match self.component(id)?.parent {
                    Some(parent) => self.is_visible_at(parent, target)?,
                    None => false,
                }
            }
        })
    }

    pub fn can_convert_local_to_field(&self, id: ComponentId) -> VariableResult<bool> {
        Ok(match &self.component(id)?.variable {
            Variable::LocalUnique(nv) | Variable::LocalReuse(nv) => local::single_fragment(self.ast(), *nv),
            Variable::Empty(_) => true,
            _ => false,
        })
    }

    pub fn can_convert_field_to_local(&self, id: ComponentId) -> VariableResult<bool> {
        Ok(match &self.component(id)?.variable {
            Variable::FieldUnique(nv) => field::can_convert_to_local(self, *nv),
            Variable::Empty(_) => true,
            _ => false,
        })
    }

    pub fn convert_local_to_field(&mut self, id: ComponentId) -> VariableResult<()> {
        let variable = self.component(id)?.variable.clone();
        match variable {
            Variable::LocalUnique(nv) => local::to_field(self, id, nv),
            Variable::LocalReuse(nv) => local::reuse_to_field(self, id, nv),
            Variable::Empty(_) => {
                self.materialize(id)?;
                if self.component(id)?.variable.is_local() {
                    self.convert_local_to_field(id)?;
                }
                Ok(())
            }
            other => Err(VariableError::illegal_state(format!(
                "cannot convert a {} variable to a field",
                other.kind()
            ))),
        }
    }

    pub fn convert_field_to_local(&mut self, id: ComponentId) -> VariableResult<()> {
        let variable = self.component(id)?.variable.clone();
        match variable {
            Variable::FieldUnique(nv) if field::can_convert_to_local(self, nv) => field::to_local(self, id, nv),
            Variable::Empty(_) => self.materialize(id),
            other => Err(VariableError::illegal_state(format!(
                "cannot convert this {} variable to a local",
                other.kind()
            ))),
        }
    }

    /// Where a new statement for the component belongs. Materializes unnamed variables.
    pub fn statement_target(&mut self, id: ComponentId) -> VariableResult<StatementTarget> {
        let variable = self.component(id)?.variable.clone();
        match variable {
            Variable::LocalUnique(nv) | Variable::LocalReuse(nv) | Variable::FieldUnique(nv) | Variable::FieldReuse(nv) => {
                named::statement_target(self, nv)
            }
            Variable::FieldInitializer(_) | Variable::This => self.flow_start_target(),
            Variable::MethodParameter(nv) => parameter::statement_target(self, nv),
            Variable::Lazy(accessor) => Ok(StatementTarget::After(accessor.assignment)),
            Variable::Empty(_) | Variable::Implicit { .. } => {
                self.materialize(id)?;
                self.statement_target(id)
            }
            Variable::ExposedProperty { .. } | Variable::ExposedField { .. } | Variable::WrapperControl { .. } => {
                let parent = noname::parent_of(self, id)?;
                self.statement_target(parent)
            }
            Variable::VoidInvocation { invocation } => Ok(StatementTarget::After(self.editor.block_statement_of(invocation)?)),
        }
    }

    /// Where the statement associating the component with its parent belongs: after the
    /// last invocation that must precede the association, else the statement target.
    pub fn association_target(&mut self, id: ComponentId, target: StatementTarget) -> VariableResult<StatementTarget> {
        if matches!(self.component(id)?.variable, Variable::Empty(_) | Variable::Lazy(_)) {
            return Ok(target);
        }
        let component = self.component(id)?;
        let before: Vec<String> = self
            .toolkit
            .component(&component.class_name)
            .map(|d| d.before_association.clone())
            .unwrap_or_default();
        let ast = self.ast();
        let mut invocations: Vec<NodeId> = self
            .live_related(id)?
            .into_iter()
            .filter_map(|node| ast.parent(self.wrapped(node)))
            .filter(|&node| match ast.kind(node) {
                NodeKind::MethodCall {
                    target: Some(receiver),
                    name,
                    ..
                } => {
                    ast.identifier(*name).is_some_and(|n| before.iter().any(|b| b == n))
                        && self.represented_by(id, *receiver)
                }
                _ => false,
            })
            .collect();
        self.flow.sort(ast, &mut invocations);
        invocations.dedup();
        match invocations.last() {
            Some(&last) => Ok(StatementTarget::After(self.editor.block_statement_of(last)?)),
            None => self.statement_target(id),
        }
    }

    /// Make the component usable by code inserted at `target`, moving its statements
    /// there when needed. `target` is updated to stay after the moved statements.
    pub fn ensure_instance_ready_at(&mut self, id: ComponentId, target: &mut StatementTarget) -> VariableResult<()> {
        let variable = self.component(id)?.variable.clone();
        match variable {
            Variable::LocalUnique(_)
            | Variable::LocalReuse(_)
            | Variable::FieldUnique(_)
            | Variable::FieldReuse(_)
            | Variable::VoidInvocation { .. } => named::move_statements(self, id, target),
            Variable::FieldInitializer(_) | Variable::Lazy(_) | Variable::MethodParameter(_) | Variable::This => Ok(()),
            Variable::Empty(empty) => {
                if empty.flavor == EmptyFlavor::Pure && self.component(id)?.children.is_empty() {
                    return named::move_statements(self, id, target);
                }
                self.materialize(id)?;
                *target = self.follow_statement_target(*target);
                self.ensure_instance_ready_at(id, target)
            }
            Variable::Implicit { .. } => {
                self.materialize(id)?;
                self.ensure_instance_ready_at(id, target)
            }
            Variable::ExposedProperty { .. } | Variable::ExposedField { .. } | Variable::WrapperControl { .. } => {
                let parent = noname::parent_of(self, id)?;
                self.ensure_instance_ready_at(parent, target)
            }
        }
    }

    /// Turn an unnamed expression into a named variable. No-op for other variants.
    pub fn materialize(&mut self, id: ComponentId) -> VariableResult<()> {
        match self.component(id)?.variable.clone() {
            Variable::Empty(empty) => empty::materialize(self, id, empty),
            Variable::Implicit { getter } => noname::materialize_implicit(self, id, &getter),
            _ => Ok(()),
        }
    }

    /// Replace the single use of a local with its initializer and drop the declaration.
    pub fn inline(&mut self, id: ComponentId) -> VariableResult<()> {
        match self.component(id)?.variable.clone() {
            Variable::LocalUnique(nv) => local::inline(self, id, nv),
            other => Err(VariableError::illegal_state(format!(
                "cannot inline a {} variable",
                other.kind()
            ))),
        }
    }

    pub fn can_convert_to_lazy(&self, id: ComponentId) -> VariableResult<bool> {
        lazy_utils::can_convert(self, id)
    }

    /// Move the creation of a unique local or field into a new `getX()` accessor.
    pub fn convert_to_lazy(&mut self, id: ComponentId) -> VariableResult<LazyConversion> {
        lazy::convert(self, id)
    }

    /// Check if `node` (ignoring parentheses and casts) is an expression for the component.
    pub fn represented_by(&self, id: ComponentId, node: NodeId) -> bool {
        let Ok(component) = self.component(id) else {
            return false;
        };
        let ast = self.ast();
        let node = self.bare(node);
        if component.creation == Some(node) || component.related.contains(&node) {
            return true;
        }
        match &component.variable {
            Variable::This => matches!(ast.kind(node), NodeKind::This),
            Variable::LocalUnique(nv) | Variable::FieldUnique(nv) | Variable::FieldInitializer(nv) | Variable::MethodParameter(nv) => {
                named::resolves_to(ast, node, nv.declaration)
            }
            Variable::Lazy(accessor) => lazy::is_invocation(ast, node, accessor),
            _ => false,
        }
    }

    /// Start of the execution flow: after `super(...)` in the first entry, or its start.
    pub(crate) fn flow_start_target(&self) -> VariableResult<StatementTarget> {
        let ast = self.ast();
        let body = self
            .flow
            .entries()
            .iter()
            .find_map(|&m| ast.method_body(m))
            .ok_or_else(|| VariableError::illegal_state("the type has no execution flow"))?;
        Ok(body_start(ast, body))
    }
}

/// `After(super(...))` when a body starts with a constructor call, else its start.
pub(crate) fn body_start(ast: &jvar_java::Ast, body: NodeId) -> StatementTarget {
    match ast.block_statements(body).first() {
        Some(&first) if matches!(ast.kind(first), NodeKind::SuperConstructorCall { .. }) => StatementTarget::After(first),
        _ => StatementTarget::BlockStart(body),
    }
}
