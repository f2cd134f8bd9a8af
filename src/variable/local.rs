//! Local variables: conversion to fields and inlining.

use jvar_java::{flow, Ast, NodeId, NodeKind};

use crate::error::{VariableError, VariableResult};
use crate::model::{ComponentId, Design};
use crate::names::local_to_field_name;
use crate::variable::{field, named, EmptyFlavor, EmptyVariable, NamedVariable, Variable};

pub(super) fn single_fragment(ast: &Ast, nv: NamedVariable) -> bool {
    flow::declaration_statement(ast, nv.declaration).is_some_and(|d| ast.fragments(d).len() == 1)
}

fn declaration_parts(design: &Design, nv: NamedVariable) -> VariableResult<(NodeId, NodeId, String)> {
    let ast = design.ast();
    let declaration = flow::declaration_statement(ast, nv.declaration)
        .ok_or_else(|| VariableError::illegal_state("local variable has no declaration"))?;
    let fragment = flow::declaration_node(ast, nv.declaration)
        .ok_or_else(|| VariableError::illegal_state("local variable has no declaration"))?;
    let ty = ast
        .declared_type(declaration)
        .map(|t| design.editor.node_source(t).to_string())
        .ok_or_else(|| VariableError::illegal_state("local declaration has no type"))?;
    Ok((declaration, fragment, ty))
}

/// The name written by an assignment statement.
pub(super) fn assigned_in(ast: &Ast, statement: NodeId) -> Option<NodeId> {
    let NodeKind::ExpressionStatement { expression } = ast.kind(statement) else {
        return None;
    };
    match ast.kind(ast.unparenthesized(*expression)) {
        NodeKind::Assignment { left, .. } => flow::assigned_name(ast, *left),
        _ => None,
    }
}

/// `T x = new T();` becomes a field `x` assigned in place.
pub(super) fn to_field(design: &mut Design, id: ComponentId, nv: NamedVariable) -> VariableResult<()> {
    if !single_fragment(design.ast(), nv) {
        return Err(VariableError::illegal_state(
            "cannot convert a declaration of several variables to a field",
        ));
    }
    let (declaration, fragment, ty) = declaration_parts(design, nv)?;
    let ast = design.ast();
    let local_name = named::identifier(ast, nv.declaration)?;
    let references: Vec<NodeId> = named::references(ast, nv.declaration)
        .into_iter()
        .filter(|&r| r != nv.variable)
        .collect();
    let is_static = flow::is_static_context(ast, declaration);

    let base = local_to_field_name(&design.preferences, &local_name);
    let (field_name, field_declaration) = field::add_field(design, &ty, &base, is_static, Some(nv.declaration))?;
    let qualifier = if design.preferences.prefix_this && !is_static {
        "this."
    } else {
        ""
    };
    let variable = match design.editor.declaration_to_assignment(fragment, qualifier)? {
        Some(statement) => {
            design.record_replacement(declaration, statement);
            assigned_in(design.ast(), statement)
                .ok_or_else(|| VariableError::illegal_state("rewritten declaration assigns nothing"))?
        }
        None => nv.variable,
    };
    design.editor.replace_identifier(variable, &field_name)?;
    for reference in references {
        design.editor.replace_identifier(reference, &field_name)?;
    }
    design.component_mut(id)?.add_related(variable);
    design.set_variable(
        id,
        Variable::FieldUnique(NamedVariable {
            variable,
            declaration: field_declaration,
        }),
    )
}

/// Give one assignment of a reused local its own field.
pub(super) fn reuse_to_field(design: &mut Design, id: ComponentId, nv: NamedVariable) -> VariableResult<()> {
    let (declaration, fragment, ty) = declaration_parts(design, nv)?;
    let nv = if nv.variable == nv.declaration {
        let statement = design.editor.split_declaration(fragment)?;
        let variable = assigned_in(design.ast(), statement)
            .ok_or_else(|| VariableError::illegal_state("split declaration assigns nothing"))?;
        design.component_mut(id)?.add_related(variable);
        NamedVariable {
            variable,
            declaration: nv.declaration,
        }
    } else {
        nv
    };
    let own = named::own_references(design, id, nv)?;
    let is_static = flow::is_static_context(design.ast(), declaration);
    let local_name = named::identifier(design.ast(), nv.declaration)?;
    let base = local_to_field_name(&design.preferences, &local_name);
    let (field_name, field_declaration) = field::add_field(design, &ty, &base, is_static, None)?;

    let variable = if design.preferences.prefix_this && !is_static {
        let access = design.editor.replace_expression(nv.variable, &format!("this.{}", field_name))?;
        match design.ast().kind(access) {
            NodeKind::FieldAccess { name, .. } => *name,
            _ => return Err(VariableError::illegal_state("field access expected")),
        }
    } else {
        design.editor.replace_identifier(nv.variable, &field_name)?;
        nv.variable
    };
    for reference in own {
        design.editor.replace_identifier(reference, &field_name)?;
    }
    design.component_mut(id)?.add_related(variable);
    design.set_variable(
        id,
        Variable::FieldUnique(NamedVariable {
            variable,
            declaration: field_declaration,
        }),
    )
}

/// Replace the single use of `T x = init;` with `init`.
pub(super) fn inline(design: &mut Design, id: ComponentId, nv: NamedVariable) -> VariableResult<()> {
    let ast = design.ast();
    let references = named::references(ast, nv.declaration);
    let [use_site] = references.as_slice() else {
        return Err(VariableError::illegal_state("only a variable used once can be inlined"));
    };
    let use_site = *use_site;
    if nv.variable != nv.declaration || !single_fragment(ast, nv) {
        return Err(VariableError::illegal_state(
            "only a variable initialized by its own declaration can be inlined",
        ));
    }
    let (declaration, fragment, _) = declaration_parts(design, nv)?;
    let NodeKind::Fragment {
        initializer: Some(initializer),
        ..
    } = design.ast().kind(fragment)
    else {
        return Err(VariableError::illegal_state("variable has no initializer"));
    };
    let initializer = *initializer;
    design.editor.replace_with_existing(use_site, initializer)?;
    design.editor.remove_statement(declaration)?;
    let flavor = match design.ast().parent(initializer).map(|p| design.ast().kind(p)) {
        Some(NodeKind::ExpressionStatement { .. }) => EmptyFlavor::Pure,
        _ => EmptyFlavor::Plain,
    };
    design.set_variable(id, Variable::Empty(EmptyVariable { initializer, flavor }))
}
