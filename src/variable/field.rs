//! Field variables.

use jvar_java::flow::{self, DeclarationKind};
use jvar_java::{BodyDeclarationTarget, NodeId, NodeKind, NodeTarget};

use crate::error::{VariableError, VariableResult};
use crate::model::{ComponentId, Design};
use crate::names::field_to_local_name;
use crate::variable::{named, NamedVariable, Variable};

/// Declare `<modifier>[static ]T name;` after the last field. Returns the chosen name
/// and its declaring node.
pub(crate) fn add_field(
    design: &mut Design,
    ty: &str,
    base: &str,
    is_static: bool,
    exclude: Option<NodeId>,
) -> VariableResult<(String, NodeId)> {
    let ast = design.ast();
    let position = BodyDeclarationTarget::TypeStart(design.ty).position(ast);
    let name = design.editor.unique_variable_name(position, base, exclude);
    let target = match ast.fields(design.ty).last() {
        Some(&last) => BodyDeclarationTarget::After(last),
        None => BodyDeclarationTarget::TypeStart(design.ty),
    };
    let source = format!(
        "{}{}{} {};",
        design.preferences.field_modifier,
        if is_static { "static " } else { "" },
        ty,
        name
    );
    let member = design.editor.add_field_declaration(&source, &target)?;
    let declaration = first_declared_name(design, member)?;
    Ok((name, declaration))
}

pub(crate) fn first_declared_name(design: &Design, declaration: NodeId) -> VariableResult<NodeId> {
    let ast = design.ast();
    ast.fragments(declaration)
        .first()
        .and_then(|&f| match ast.kind(f) {
            NodeKind::Fragment { name, .. } => Some(*name),
            _ => None,
        })
        .ok_or_else(|| VariableError::illegal_state("declaration declares no variable"))
}

fn is_static_field(design: &Design, declaration: NodeId) -> bool {
    let ast = design.ast();
    match flow::declaration_statement(ast, declaration).map(|d| ast.kind(d)) {
        Some(NodeKind::FieldDeclaration { modifiers, .. }) => modifiers.is_static(),
        _ => false,
    }
}

/// `name` or `this.name`: qualified when preferred, or when a local or parameter
/// shadows the field at the target.
pub(super) fn reference(design: &Design, nv: NamedVariable, target: &NodeTarget) -> VariableResult<String> {
    let ast = design.ast();
    let name = named::identifier(ast, nv.declaration)?;
    let NodeTarget::Statement(statement_target) = target else {
        return Ok(name);
    };
    if is_static_field(design, nv.declaration) || flow::is_static_context(ast, statement_target.node()) {
        return Ok(name);
    }
    let shadowed = flow::visible_declarations(ast, statement_target.position(ast))
        .into_iter()
        .any(|d| d.kind != DeclarationKind::Field && ast.identifier(d.name) == Some(name.as_str()));
    if shadowed || design.preferences.prefix_this {
        Ok(format!("this.{}", name))
    } else {
        Ok(name)
    }
}

/// The assignment statement of a field, when it sits directly in a block.
pub(super) fn assignment_statement(design: &Design, nv: NamedVariable) -> Option<NodeId> {
    let ast = design.ast();
    let statement = design.editor.block_statement_of(nv.variable).ok()?;
    match ast.kind(statement) {
        NodeKind::ExpressionStatement { expression } => match ast.kind(ast.unparenthesized(*expression)) {
            NodeKind::Assignment { left, .. } if ast.contains(*left, nv.variable) => Some(statement),
            _ => None,
        },
        _ => None,
    }
}

/// A field can become a local when it is assigned once, declared alone without an
/// initializer, and used only after the assignment inside the same block.
pub(super) fn can_convert_to_local(design: &Design, nv: NamedVariable) -> bool {
    let ast = design.ast();
    if nv.variable == nv.declaration {
        return false;
    }
    let Some(declaration) = flow::declaration_statement(ast, nv.declaration) else {
        return false;
    };
    let [fragment] = ast.fragments(declaration) else {
        return false;
    };
    if !matches!(ast.kind(*fragment), NodeKind::Fragment { initializer: None, .. }) {
        return false;
    }
    if flow::assignments(ast, nv.declaration).len() != 1 {
        return false;
    }
    let Some(statement) = assignment_statement(design, nv) else {
        return false;
    };
    let Some(block) = ast.parent(statement) else {
        return false;
    };
    let method = ast.enclosing_method(statement);
    named::references(ast, nv.declaration)
        .into_iter()
        .filter(|&r| r != nv.variable)
        .all(|r| {
            ast.enclosing_method(r) == method
                && ast.contains(block, r)
                && flow::is_ordered_in_block(ast, statement, r, false)
        })
}

/// `f = new T();` becomes `T f = new T();` and the field declaration goes away.
pub(super) fn to_local(design: &mut Design, id: ComponentId, nv: NamedVariable) -> VariableResult<()> {
    let statement = assignment_statement(design, nv)
        .ok_or_else(|| VariableError::illegal_state("field is not assigned by a statement"))?;
    let ast = design.ast();
    let field_declaration = flow::declaration_statement(ast, nv.declaration)
        .ok_or_else(|| VariableError::illegal_state("field has no declaration"))?;
    let fragment = flow::declaration_node(ast, nv.declaration)
        .ok_or_else(|| VariableError::illegal_state("field has no declaration"))?;
    let ty = ast
        .declared_type(field_declaration)
        .map(|t| design.editor.node_source(t).to_string())
        .ok_or_else(|| VariableError::illegal_state("field declaration has no type"))?;
    let field_name = named::identifier(ast, nv.declaration)?;
    let references: Vec<NodeId> = named::references(ast, nv.declaration)
        .into_iter()
        .filter(|&r| r != nv.variable)
        .collect();
    let base = field_to_local_name(&design.preferences, &field_name);
    let local_name = design
        .editor
        .unique_variable_name(ast.span(statement).start, &base, Some(nv.declaration));
    let declaration_type = if design.preferences.declare_final {
        format!("final {}", ty)
    } else {
        ty
    };

    let declaration = design.editor.assignment_to_declaration(statement, &declaration_type)?;
    if let Some(new_statement) = flow::declaration_statement(design.ast(), declaration) {
        design.record_replacement(statement, new_statement);
    }
    design.editor.remove_variable_declaration(fragment)?;
    design.editor.replace_identifier(declaration, &local_name)?;
    for reference in references {
        let parent = design.ast().parent(reference);
        match parent.map(|p| design.ast().kind(p)) {
            Some(NodeKind::FieldAccess { .. }) => {
                let access = parent.ok_or_else(|| VariableError::illegal_state("detached reference"))?;
                let replacement = design.editor.replace_expression(access, &local_name)?;
                design.component_mut(id)?.add_related(replacement);
            }
            _ => design.editor.replace_identifier(reference, &local_name)?,
        }
    }
    design.component_mut(id)?.add_related(declaration);
    design.set_variable(id, Variable::LocalUnique(NamedVariable::declared(declaration)))
}

/// Give one assignment of a reused field its own field.
pub(super) fn split_reuse(design: &mut Design, id: ComponentId, nv: NamedVariable) -> VariableResult<()> {
    let own = named::own_references(design, id, nv)?;
    let ast = design.ast();
    let declaration = flow::declaration_statement(ast, nv.declaration)
        .ok_or_else(|| VariableError::illegal_state("field has no declaration"))?;
    let ty = ast
        .declared_type(declaration)
        .map(|t| design.editor.node_source(t).to_string())
        .ok_or_else(|| VariableError::illegal_state("field declaration has no type"))?;
    let base = named::identifier(ast, nv.declaration)?;
    let is_static = is_static_field(design, nv.declaration);
    let (name, field_declaration) = add_field(design, &ty, &base, is_static, None)?;
    design.editor.replace_identifier(nv.variable, &name)?;
    for reference in own {
        design.editor.replace_identifier(reference, &name)?;
    }
    design.set_variable(
        id,
        Variable::FieldUnique(NamedVariable {
            variable: nv.variable,
            declaration: field_declaration,
        }),
    )
}
