//! Shared behavior of variables with a declared name.

use std::collections::HashSet;

use jvar_java::flow::{self, DeclarationKind};
use jvar_java::{validate_java_identifier, Ast, NodeId, NodeKind, NodeTarget, StatementTarget, UniqueNameGenerator};
use tracing::debug;

use crate::error::{VariableError, VariableResult};
use crate::model::{ComponentId, Design, VariableEvent};
use crate::variable::{NamedVariable, Variable};

/// Visibility rules that differ between named variants.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scope {
    /// Locals are visible only inside their block.
    pub local: bool,
    /// Reused variables stop representing the component at the next assignment.
    pub reuse: bool,
}

pub(crate) fn identifier(ast: &Ast, name: NodeId) -> VariableResult<String> {
    ast.identifier(name)
        .map(str::to_string)
        .ok_or_else(|| VariableError::illegal_state(format!("{} is not a name", name)))
}

/// Check if `node` is a simple name or `this.name` resolving to `declaration`.
pub(crate) fn resolves_to(ast: &Ast, node: NodeId, declaration: NodeId) -> bool {
    flow::assigned_name(ast, node).and_then(|name| flow::resolve(ast, name)) == Some(declaration)
}

/// References to a declaration, without the declaring name.
pub(crate) fn references(ast: &Ast, declaration: NodeId) -> Vec<NodeId> {
    flow::references(ast, declaration)
        .into_iter()
        .filter(|&n| n != declaration)
        .collect()
}

/// The references of a reused variable that still see the value assigned at
/// `variable`: later in the block and before the next assignment.
pub(crate) fn reuse_references(ast: &Ast, nv: NamedVariable) -> Vec<NodeId> {
    let later = later_assignments(ast, nv);
    references(ast, nv.declaration)
        .into_iter()
        .filter(|&r| r != nv.variable)
        .filter(|&r| flow::is_ordered_in_block(ast, nv.variable, r, false))
        .filter(|&r| !later.iter().any(|&a| flow::is_ordered_in_block(ast, a, r, true)))
        .collect()
}

/// Related names of the component that resolve to its declaration, excluding the
/// assigned and the declaring name.
pub(crate) fn own_references(design: &Design, id: ComponentId, nv: NamedVariable) -> VariableResult<Vec<NodeId>> {
    let ast = design.ast();
    Ok(design
        .live_related(id)?
        .into_iter()
        .filter(|&n| n != nv.variable && n != nv.declaration)
        .filter(|&n| ast.identifier(n).is_some() && flow::resolve(ast, n) == Some(nv.declaration))
        .collect())
}

// ============================================================================
// Visibility
// ============================================================================

pub(crate) fn is_visible_at(design: &Design, nv: NamedVariable, scope: Scope, target: &NodeTarget) -> bool {
    let ast = design.ast();
    if !ast.is_attached(nv.variable) {
        return false;
    }
    let statement_target = match target {
        NodeTarget::BodyDeclaration(_) => return !scope.local,
        NodeTarget::Statement(t) => *t,
    };
    if scope.local {
        let Some(block) = ast.enclosing_block(nv.declaration) else {
            return false;
        };
        if !ast.contains(block, statement_target.node()) {
            return false;
        }
    }
    let (anchor, or_equal) = match statement_target {
        StatementTarget::Before(s) | StatementTarget::BlockStart(s) => (s, false),
        StatementTarget::After(s) => (s, true),
        StatementTarget::BlockEnd(b) if ast.contains(b, nv.variable) => {
            return !scope.reuse || !reassigned_within(ast, nv, b);
        }
        StatementTarget::BlockEnd(b) => (b, true),
    };
    if ast.common_block(nv.variable, anchor).is_none() {
        return !scope.local && ordered_in_flow(design, nv.variable, anchor, or_equal);
    }
    flow::is_ordered_in_block(ast, nv.variable, anchor, or_equal)
        && !(scope.reuse && reassigned_between(ast, nv, anchor, or_equal))
}

/// Check if `node` runs before code at `target`.
pub(crate) fn is_ordered_before(design: &Design, node: NodeId, target: &NodeTarget) -> bool {
    let ast = design.ast();
    let Some(statement_target) = target.statement_target() else {
        return false;
    };
    let (anchor, or_equal) = match statement_target {
        StatementTarget::Before(s) | StatementTarget::BlockStart(s) => (s, false),
        StatementTarget::After(s) | StatementTarget::BlockEnd(s) => (s, true),
    };
    if ast.common_block(node, anchor).is_none() {
        return ordered_in_flow(design, node, anchor, or_equal);
    }
    flow::is_ordered_in_block(ast, node, anchor, or_equal)
}

/// Compare positions in the execution flow, for nodes in different methods.
fn ordered_in_flow(design: &Design, first: NodeId, second: NodeId, or_equal: bool) -> bool {
    let ast = design.ast();
    let statements = design.flow.statements(ast);
    let index = |node: NodeId| {
        statements
            .iter()
            .position(|&s| ast.contains(s, node))
            .or_else(|| statements.iter().position(|&s| ast.contains(node, s)))
    };
    match (index(first), index(second)) {
        (Some(a), Some(b)) if or_equal => a <= b,
        (Some(a), Some(b)) => a < b,
        _ => false,
    }
}

/// Later assignments of the declaration that do not write `variable`.
fn later_assignments(ast: &Ast, nv: NamedVariable) -> Vec<NodeId> {
    flow::assignments(ast, nv.declaration)
        .into_iter()
        .filter(|&a| !ast.contains(a, nv.variable))
        .filter(|&a| flow::is_ordered_in_block(ast, nv.variable, a, false))
        .collect()
}

fn reassigned_between(ast: &Ast, nv: NamedVariable, anchor: NodeId, or_equal: bool) -> bool {
    later_assignments(ast, nv)
        .into_iter()
        .any(|a| flow::is_ordered_in_block(ast, a, anchor, or_equal))
}

fn reassigned_within(ast: &Ast, nv: NamedVariable, block: NodeId) -> bool {
    later_assignments(ast, nv).into_iter().any(|a| ast.contains(block, a))
}

pub(crate) fn statement_target(design: &Design, nv: NamedVariable) -> VariableResult<StatementTarget> {
    Ok(StatementTarget::After(design.editor.block_statement_of(nv.variable)?))
}

// ============================================================================
// Renaming
// ============================================================================

/// Reject names that are not identifiers or that collide with a declaration visible
/// from, or declared after, the declaration being renamed.
pub(crate) fn check_name(design: &Design, declaration: NodeId, new_name: &str) -> VariableResult<()> {
    validate_java_identifier(new_name)?;
    let ast = design.ast();
    let kind = flow::declaration_kind(ast, declaration);
    let position = flow::declaration_statement(ast, declaration)
        .map_or_else(|| ast.span(declaration).start, |s| ast.span(s).start);
    let mut candidates: Vec<NodeId> = flow::visible_declarations(ast, position)
        .into_iter()
        .chain(flow::declarations_after(ast, position))
        .map(|d| d.name)
        .collect();
    if kind == Some(DeclarationKind::Parameter) {
        if let Some(body) = ast.enclosing_method(declaration).and_then(|m| ast.method_body(m)) {
            candidates.extend(
                ast.descendants(body)
                    .into_iter()
                    .filter(|&n| flow::declaration_kind(ast, n).is_some()),
            );
        }
    }
    let collides = candidates
        .into_iter()
        .any(|d| d != declaration && ast.identifier(d) == Some(new_name));
    if collides {
        return Err(VariableError::InvalidName {
            name: new_name.to_string(),
            reason: "a variable with this name already exists".to_string(),
        });
    }
    Ok(())
}

/// Retext the declaring name and every reference.
pub(crate) fn retext(design: &mut Design, declaration: NodeId, new_name: &str) -> VariableResult<()> {
    for name in flow::references(design.ast(), declaration) {
        design.editor.replace_identifier(name, new_name)?;
    }
    Ok(())
}

pub(crate) fn rename(design: &mut Design, id: ComponentId, declaration: NodeId, new_name: &str) -> VariableResult<()> {
    let old_name = identifier(design.ast(), declaration)?;
    if old_name == new_name {
        return Ok(());
    }
    check_name(design, declaration, new_name)?;
    retext(design, declaration, new_name)?;
    debug!(component = %id, old = %old_name, new = %new_name, "renamed variable");
    design.emit(VariableEvent::Renamed {
        component: id,
        old_name,
        new_name: new_name.to_string(),
    });
    Ok(())
}

// ============================================================================
// Moving
// ============================================================================

/// Move the statements of the component and its subtree to `target`, keeping their
/// order. `target` ends up after the moved statements, or stays before its anchor when
/// the anchor did not move.
pub(crate) fn move_statements(design: &mut Design, id: ComponentId, target: &mut StatementTarget) -> VariableResult<()> {
    let original = *target;
    let statements = statements_to_move(design, id, original)?;
    if statements.is_empty() {
        return Ok(());
    }
    ensure_unique_variables_during_move(design, &statements, original)?;
    for &statement in &statements {
        if target.statement() != Some(statement) {
            design.editor.move_statement(statement, target)?;
        }
        *target = StatementTarget::After(statement);
    }
    if let StatementTarget::Before(anchor) = original {
        if !statements.contains(&anchor) {
            *target = original;
        }
    }
    debug!(component = %id, count = statements.len(), "moved statements");
    Ok(())
}

fn statements_to_move(design: &Design, id: ComponentId, target: StatementTarget) -> VariableResult<Vec<NodeId>> {
    let ast = design.ast();
    let target_method = ast.enclosing_method(target.node());
    let creation_method = design.component(id)?.creation.and_then(|c| ast.enclosing_method(c));
    let mut selected: Vec<NodeId> = Vec::new();
    for member in design.subtree(id) {
        for node in design.live_related(member)? {
            let Ok(statement) = design.editor.block_statement_of(node) else {
                continue;
            };
            let method = ast.enclosing_method(statement);
            let same_method = target_method.is_none() || method == target_method || method == creation_method;
            if same_method && !ast.contains(statement, target.node()) && !selected.contains(&statement) {
                selected.push(statement);
            }
        }
    }
    collapse_covered_blocks(ast, &mut selected);
    let all = selected.clone();
    selected.retain(|&s| !all.iter().any(|&other| other != s && ast.contains(other, s)));
    selected.sort_by_key(|&s| ast.span(s).start);
    Ok(selected)
}

/// Replace the statements of a nested block by the block when all of them are selected.
fn collapse_covered_blocks(ast: &Ast, selected: &mut Vec<NodeId>) {
    loop {
        let blocks: HashSet<NodeId> = selected
            .iter()
            .filter_map(|&s| ast.parent(s))
            .filter(|&b| matches!(ast.kind(b), NodeKind::Block { .. }))
            .filter(|&b| ast.parent(b).is_some_and(|p| matches!(ast.kind(p), NodeKind::Block { .. })))
            .filter(|b| !selected.contains(b))
            .collect();
        let covered: Vec<NodeId> = blocks
            .into_iter()
            .filter(|&b| ast.block_statements(b).iter().all(|s| selected.contains(s)))
            .collect();
        if covered.is_empty() {
            return;
        }
        selected.extend(covered);
    }
}

/// Rename locals declared by moved statements that would collide with declarations at
/// the target. Declarations following the target only matter for locals that land
/// directly in the target block, not for those scoped inside a moved block.
fn ensure_unique_variables_during_move(
    design: &mut Design,
    statements: &[NodeId],
    target: StatementTarget,
) -> VariableResult<()> {
    let ast = design.ast();
    let moved: Vec<(NodeId, bool)> = statements
        .iter()
        .flat_map(|&s| ast.descendants(s))
        .filter(|&n| flow::declaration_kind(ast, n) == Some(DeclarationKind::Local))
        .map(|n| {
            let scoped = ast
                .enclosing_block(n)
                .is_some_and(|block| statements.iter().any(|&s| ast.contains(s, block)));
            (n, scoped)
        })
        .collect();
    if moved.is_empty() {
        return Ok(());
    }
    let position = target.position(ast);
    let names = |declarations: Vec<flow::Declaration>| -> Vec<String> {
        declarations
            .into_iter()
            .map(|d| d.name)
            .filter(|d| !moved.iter().any(|&(m, _)| m == *d))
            .filter_map(|d| ast.identifier(d).map(str::to_string))
            .collect()
    };
    let visible = names(flow::visible_declarations(ast, position));
    let after = names(flow::declarations_after(ast, position));
    let mut scoped_names = UniqueNameGenerator::with_used_names(visible.iter().cloned());
    let mut target_names = UniqueNameGenerator::with_used_names(visible.into_iter().chain(after));
    for (declaration, scoped) in moved {
        let name = identifier(design.ast(), declaration)?;
        let generator = if scoped { &scoped_names } else { &target_names };
        if !generator.is_in_use(&name) {
            scoped_names.mark_used(&name);
            target_names.mark_used(&name);
            continue;
        }
        let new_name = generator.generate(&name);
        scoped_names.mark_used(&new_name);
        target_names.mark_used(&new_name);
        retext(design, declaration, &new_name)?;
        debug!(old = %name, new = %new_name, "renamed moved local");
        let owner = owner_of(design, declaration);
        if let Some(component) = owner {
            design.emit(VariableEvent::Renamed {
                component,
                old_name: name,
                new_name,
            });
        }
    }
    Ok(())
}

/// The component owning `declaration` as a named variable.
pub(crate) fn owner_of(design: &Design, declaration: NodeId) -> Option<ComponentId> {
    design.component_ids().into_iter().find(|&c| {
        design
            .component(c)
            .ok()
            .map(|c| &c.variable)
            .and_then(Variable::named)
            .is_some_and(|nv| nv.declaration == declaration)
    })
}
