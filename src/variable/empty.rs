//! Unnamed creation expressions.

use jvar_java::{flow, BodyDeclarationTarget, NodeKind};
use tracing::debug;

use crate::error::VariableResult;
use crate::model::{ComponentId, Design, VariableEvent};
use crate::names::decorate;
use crate::variable::{EmptyVariable, NamedVariable, Variable};

/// Give the creation expression a name: a new field when it sits in a field
/// initializer, a local declared before its statement otherwise.
pub(super) fn materialize(design: &mut Design, id: ComponentId, empty: EmptyVariable) -> VariableResult<()> {
    design.emit(VariableEvent::EmptyMaterializeBefore { component: id });
    let class_name = design.component(id)?.class_name.clone();

    let expression = empty.initializer;
    while let Some(parent) = design.ast().parent(expression) {
        if !matches!(design.ast().kind(parent), NodeKind::Parenthesized { .. }) {
            break;
        }
        design.editor.replace_with_existing(parent, expression)?;
    }

    let ty = match design.ast().kind(design.bare(expression)) {
        NodeKind::New { ty, .. } => design.editor.node_source(*ty).to_string(),
        _ => design.editor.type_source(&class_name)?,
    };
    let base = design.names().name(&class_name);
    let ast = design.ast();
    let in_field = ast.enclosing_method(expression).is_none() && ast.enclosing_field_declaration(expression).is_some();

    if in_field {
        let is_static = flow::is_static_context(ast, expression);
        let base = decorate(&base, &design.preferences.field_prefix, &design.preferences.field_suffix);
        let position = BodyDeclarationTarget::TypeStart(design.ty).position(ast);
        let name = design.editor.unique_variable_name(position, &base, None);
        let head = format!(
            "{}{}{}",
            design.preferences.field_modifier,
            if is_static { "static " } else { "" },
            ty
        );
        let (declaration, use_name) = design.editor.extract_to_field(expression, &head, &name)?;
        design.component_mut(id)?.add_related(use_name);
        design.set_variable(id, Variable::FieldInitializer(NamedVariable::declared(declaration)))?;
        debug!(component = %id, name = %name, "materialized into field");
        return Ok(());
    }

    let base = decorate(&base, &design.preferences.local_prefix, &design.preferences.local_suffix);
    let statement = design.editor.block_statement_of(expression)?;
    let name = design
        .editor
        .unique_variable_name(design.ast().span(statement).start, &base, None);
    let whole_statement = design.ast().parent(expression) == Some(statement)
        && matches!(design.ast().kind(statement), NodeKind::ExpressionStatement { .. });
    let declaration = if whole_statement {
        let declaration = design.editor.expression_statement_to_declaration(statement, &ty, &name)?;
        if let Some(new_statement) = flow::declaration_statement(design.ast(), declaration) {
            design.record_replacement(statement, new_statement);
        }
        declaration
    } else {
        let (declaration, use_name) = design.editor.extract_to_local(expression, &ty, &name)?;
        design.component_mut(id)?.add_related(use_name);
        declaration
    };
    design.set_variable(id, Variable::LocalUnique(NamedVariable::declared(declaration)))?;
    debug!(component = %id, name = %name, "materialized into local");

    if design.names().should_use_field(&class_name) {
        design.convert_local_to_field(id)?;
    }
    Ok(())
}
