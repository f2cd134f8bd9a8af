//! Variables without a name of their own: exposed, implicit and wrapped children.

use jvar_java::{NodeKind, NodeTarget};

use crate::error::{VariableError, VariableResult};
use crate::model::{ComponentId, Design};
use crate::names::decorate;
use crate::variable::{field, NamedVariable, Variable};

pub(super) fn parent_of(design: &Design, id: ComponentId) -> VariableResult<ComponentId> {
    design
        .component(id)?
        .parent
        .ok_or_else(|| VariableError::illegal_state(format!("{} has no parent", id)))
}

/// How code at `target` invokes methods on the parent: `"panel."` or `""`.
pub(super) fn parent_access(design: &mut Design, id: ComponentId, target: &mut NodeTarget) -> VariableResult<String> {
    let parent = parent_of(design, id)?;
    design.access_expression(parent, target)
}

/// `T name = (T) parent.getter();` right where the parent is ready.
pub(super) fn materialize_implicit(design: &mut Design, id: ComponentId, getter: &str) -> VariableResult<()> {
    let parent = parent_of(design, id)?;
    let class_name = design.component(id)?.class_name.clone();
    let target = design.statement_target(parent)?;
    let mut node_target = NodeTarget::Statement(target);
    let access = design.access_expression(parent, &mut node_target)?;
    let target = node_target.statement_target().unwrap_or(target);

    let ty = design.editor.type_source(&class_name)?;
    let base = decorate(
        &design.names().name(&class_name),
        &design.preferences.local_prefix,
        &design.preferences.local_suffix,
    );
    let name = design
        .editor
        .unique_variable_name(target.position(design.ast()), &base, None);
    let source = format!("{ty} {name} = ({ty}) {access}{getter}();");
    let statement = design.editor.add_statement(&source, &target)?;
    let declaration = field::first_declared_name(design, statement)?;

    let ast = design.ast();
    let invocation = ast
        .parent(declaration)
        .and_then(|fragment| match ast.kind(fragment) {
            NodeKind::Fragment {
                initializer: Some(init), ..
            } => Some(design.bare(*init)),
            _ => None,
        })
        .ok_or_else(|| VariableError::illegal_state("implicit declaration has no initializer"))?;
    let component = design.component_mut(id)?;
    component.creation = Some(invocation);
    component.add_related(invocation);
    design.set_variable(id, Variable::LocalUnique(NamedVariable::declared(declaration)))?;

    if design.names().should_use_field(&class_name) {
        design.convert_local_to_field(id)?;
    }
    Ok(())
}
