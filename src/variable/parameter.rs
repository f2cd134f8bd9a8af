//! Components passed into an entry method.

use jvar_java::{Ast, NodeId, NodeKind, NodeTarget, StatementTarget};

use crate::error::{VariableError, VariableResult};
use crate::model::{ComponentId, Design};
use crate::variable::{body_start, named, NamedVariable};

/// A parameter is visible anywhere inside its own method, and inside any other method
/// declaring a parameter with the same name.
pub(super) fn is_visible_at(design: &Design, nv: NamedVariable, target: &NodeTarget) -> bool {
    let ast = design.ast();
    let Some(method) = target.method(ast) else {
        return false;
    };
    Some(method) == ast.enclosing_method(nv.declaration) || matching_parameter(ast, nv, method).is_some()
}

/// The name of a parameter of `method` spelled like the declaration of `nv`.
fn matching_parameter(ast: &Ast, nv: NamedVariable, method: NodeId) -> Option<NodeId> {
    let identifier = ast.identifier(nv.declaration)?;
    ast.method_parameters(method).iter().find_map(|&parameter| match ast.kind(parameter) {
        NodeKind::Parameter { name, .. } if ast.identifier(*name) == Some(identifier) => Some(*name),
        _ => None,
    })
}

pub(super) fn reference(
    design: &Design,
    id: ComponentId,
    nv: NamedVariable,
    target: &NodeTarget,
) -> VariableResult<String> {
    let ast = design.ast();
    let method = target.method(ast);
    if method.is_some() && method == ast.enclosing_method(nv.declaration) {
        return named::identifier(ast, nv.declaration);
    }
    match method.and_then(|method| matching_parameter(ast, nv, method)) {
        Some(name) => named::identifier(ast, name),
        None => Err(design.unreachable(id, target)),
    }
}

pub(super) fn statement_target(design: &Design, nv: NamedVariable) -> VariableResult<StatementTarget> {
    let ast = design.ast();
    let body = ast
        .enclosing_method(nv.declaration)
        .and_then(|m| ast.method_body(m))
        .ok_or_else(|| VariableError::illegal_state("parameter of a method without body"))?;
    Ok(body_start(ast, body))
}
