//! Lazy accessors: a field created on first call of `getX()`.

use std::collections::HashSet;

use jvar_java::flow::{self, DeclarationKind};
use jvar_java::{Ast, BodyDeclarationTarget, NodeId, NodeKind, NodeTarget, StatementTarget};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{VariableError, VariableResult};
use crate::model::{ComponentId, Design, VariableEvent};
use crate::names::{capitalize, strip_decoration};
use crate::variable::{lazy_utils, named, LazyAccessor, NamedVariable, Variable};

/// Outcome of [`Design::convert_to_lazy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LazyConversion {
    /// Name of the new accessor method.
    pub accessor: String,
    /// Statements that stayed where they were, as source text.
    pub skipped: Vec<String>,
}

fn method_name_node(ast: &Ast, method: NodeId) -> Option<NodeId> {
    match ast.kind(method) {
        NodeKind::MethodDeclaration { name, .. } => Some(*name),
        _ => None,
    }
}

/// Check if `node` is `getX()` or `this.getX()` for the accessor.
pub(super) fn is_invocation(ast: &Ast, node: NodeId, accessor: &LazyAccessor) -> bool {
    let NodeKind::MethodCall { target, name, arguments } = ast.kind(node) else {
        return false;
    };
    arguments.is_empty()
        && target.map_or(true, |t| matches!(ast.kind(t), NodeKind::This))
        && ast.identifier(*name).is_some()
        && ast.identifier(*name) == ast.method_name(accessor.method)
}

/// Invocations of the accessor anywhere in the type.
pub(crate) fn invocations(ast: &Ast, ty: NodeId, accessor: &LazyAccessor) -> Vec<NodeId> {
    ast.descendants(ty)
        .into_iter()
        .filter(|&n| is_invocation(ast, n, accessor))
        .collect()
}

/// The field inside the accessor, `getX()` elsewhere.
pub(super) fn reference(design: &Design, accessor: LazyAccessor, target: &NodeTarget) -> VariableResult<String> {
    let ast = design.ast();
    if target.method(ast) == Some(accessor.method) {
        return named::identifier(ast, accessor.field);
    }
    let method = ast
        .method_name(accessor.method)
        .ok_or_else(|| VariableError::illegal_state("accessor has no name"))?;
    Ok(format!("{}()", method))
}

/// Rename the field, and the accessor with its invocations while it still follows the
/// `get` + field naming.
pub(super) fn rename(design: &mut Design, id: ComponentId, accessor: LazyAccessor, new_name: &str) -> VariableResult<()> {
    let old_name = named::identifier(design.ast(), accessor.field)?;
    if old_name == new_name {
        return Ok(());
    }
    named::check_name(design, accessor.field, new_name)?;
    let prefs = &design.preferences;
    let expected = format!(
        "get{}",
        capitalize(strip_decoration(&old_name, &prefs.field_prefix, &prefs.field_suffix))
    );
    let wanted = format!(
        "get{}",
        capitalize(strip_decoration(new_name, &prefs.field_prefix, &prefs.field_suffix))
    );
    named::retext(design, accessor.field, new_name)?;

    let ast = design.ast();
    if ast.method_name(accessor.method) == Some(expected.as_str()) {
        let method_name = design.editor.unique_method_name(design.ty, &wanted);
        let calls: Vec<NodeId> = invocations(ast, design.ty, &accessor)
            .into_iter()
            .filter_map(|call| match ast.kind(call) {
                NodeKind::MethodCall { name, .. } => Some(*name),
                _ => None,
            })
            .collect();
        let declared = method_name_node(ast, accessor.method)
            .ok_or_else(|| VariableError::illegal_state("accessor has no name"))?;
        design.editor.replace_identifier(declared, &method_name)?;
        for call in calls {
            design.editor.replace_identifier(call, &method_name)?;
        }
    }
    design.emit(VariableEvent::Renamed {
        component: id,
        old_name,
        new_name: new_name.to_string(),
    });
    Ok(())
}

// ============================================================================
// Conversion
// ============================================================================

/// Move the creation into a new `getX()` accessor together with the statements
/// configuring the component and its children.
pub(crate) fn convert(design: &mut Design, id: ComponentId) -> VariableResult<LazyConversion> {
    if !lazy_utils::can_convert(design, id)? {
        return Err(VariableError::illegal_state(format!(
            "{} cannot be converted to a lazy accessor",
            design.describe_component(id)
        )));
    }
    if design.component(id)?.variable.is_local() {
        design.convert_local_to_field(id)?;
    }
    let Variable::FieldUnique(nv) = design.component(id)?.variable.clone() else {
        return Err(VariableError::illegal_state("lazy conversion needs a unique field"));
    };
    let (assignment, creation) = field_assignment(design, nv)?;
    let ast = design.ast();
    let creation_method = ast.enclosing_method(assignment);
    let field_name = named::identifier(ast, nv.declaration)?;
    let field_declaration = flow::declaration_statement(ast, nv.declaration)
        .ok_or_else(|| VariableError::illegal_state("field has no declaration"))?;
    let (ty, is_static) = match ast.kind(field_declaration) {
        NodeKind::FieldDeclaration { ty, modifiers, .. } => {
            (design.editor.node_source(*ty).to_string(), modifiers.is_static())
        }
        _ => return Err(VariableError::illegal_state("field has no declaration")),
    };

    let base = strip_decoration(
        &field_name,
        &design.preferences.field_prefix,
        &design.preferences.field_suffix,
    );
    let method_name = design
        .editor
        .unique_method_name(design.ty, &format!("get{}", capitalize(base)));
    let header = format!(
        "{}{}{} {}()",
        design.preferences.lazy_method_modifier,
        if is_static { "static " } else { "" },
        ty,
        method_name
    );
    let body = vec![
        format!("if ({} == null) {{", field_name),
        format!("\t{} = null;", field_name),
        "}".to_string(),
        format!("return {};", field_name),
    ];
    let method = design
        .editor
        .add_method_declaration(&header, &body, &BodyDeclarationTarget::TypeEnd(design.ty))?;
    let (accessor_assignment, placeholder) = placeholder_of(design.ast(), method)?;
    design.editor.replace_with_existing(placeholder, creation)?;
    design.editor.remove_statement(assignment)?;

    let skipped = move_into_accessor(design, id, creation_method, accessor_assignment)?;

    let ast = design.ast();
    let outside: Vec<NodeId> = named::references(ast, nv.declaration)
        .into_iter()
        .filter(|&r| !ast.contains(method, r))
        .map(|r| match ast.parent(r) {
            Some(p) if matches!(ast.kind(p), NodeKind::FieldAccess { .. }) => p,
            _ => r,
        })
        .collect();
    let call = format!("{}()", method_name);
    for reference in outside {
        let replacement = design.editor.replace_expression(reference, &call)?;
        design.component_mut(id)?.add_related(replacement);
    }

    let accessor = LazyAccessor {
        method,
        field: nv.declaration,
        assignment: accessor_assignment,
        creation,
    };
    design.set_variable(id, Variable::Lazy(accessor))?;
    info!(component = %id, accessor = %method_name, skipped = skipped.len(), "converted to lazy accessor");
    Ok(LazyConversion {
        accessor: method_name,
        skipped,
    })
}

fn field_assignment(design: &Design, nv: NamedVariable) -> VariableResult<(NodeId, NodeId)> {
    let ast = design.ast();
    let statement = design.editor.block_statement_of(nv.variable)?;
    if let NodeKind::ExpressionStatement { expression } = ast.kind(statement) {
        if let NodeKind::Assignment { right, .. } = ast.kind(ast.unparenthesized(*expression)) {
            return Ok((statement, ast.unparenthesized(*right)));
        }
    }
    Err(VariableError::illegal_state("field is not assigned by a statement"))
}

/// The `f = null;` statement of a fresh accessor and its `null`.
fn placeholder_of(ast: &Ast, method: NodeId) -> VariableResult<(NodeId, NodeId)> {
    let found = ast
        .method_body(method)
        .and_then(|body| ast.block_statements(body).first().copied())
        .and_then(|check| match ast.kind(check) {
            NodeKind::If { then_branch, .. } => ast.block_statements(*then_branch).first().copied(),
            _ => None,
        })
        .and_then(|statement| match ast.kind(statement) {
            NodeKind::ExpressionStatement { expression } => match ast.kind(*expression) {
                NodeKind::Assignment { right, .. } => Some((statement, *right)),
                _ => None,
            },
            _ => None,
        });
    found.ok_or_else(|| VariableError::illegal_state("accessor template has no assignment"))
}

/// Why a statement cannot move into the accessor.
enum Blocker {
    /// Invokes a method of the edited instance; stays silently.
    Instance,
    Parameter,
    OutsideComponent,
    /// Uses a local that stays behind.
    Local,
}

/// Move the statements of the component's subtree after `assignment`. A statement
/// moves unless it depends on something unavailable inside the accessor.
fn move_into_accessor(
    design: &mut Design,
    id: ComponentId,
    method: Option<NodeId>,
    assignment: NodeId,
) -> VariableResult<Vec<String>> {
    let subtree = design.subtree(id);
    let mut candidates: Vec<NodeId> = Vec::new();
    for &member in &subtree {
        for node in design.live_related(member)? {
            let Ok(statement) = design.editor.block_statement_of(node) else {
                continue;
            };
            let ast = design.ast();
            if method.is_some() && ast.enclosing_method(statement) == method && !candidates.contains(&statement) {
                candidates.push(statement);
            }
        }
    }
    let ast = design.ast();
    let all = candidates.clone();
    candidates.retain(|&s| !all.iter().any(|&other| other != s && ast.contains(other, s)));
    candidates.sort_by_key(|&s| ast.span(s).start);

    let mut moving: Vec<NodeId> = candidates.clone();
    let mut blocked: Vec<(NodeId, Blocker)> = Vec::new();
    loop {
        let declared: HashSet<NodeId> = moving
            .iter()
            .flat_map(|&s| ast.descendants(s))
            .filter(|&n| flow::declaration_kind(ast, n) == Some(DeclarationKind::Local))
            .collect();
        let staying: Vec<NodeId> = method
            .and_then(|m| ast.method_body(m))
            .map(|body| ast.descendants(body))
            .unwrap_or_default()
            .into_iter()
            .filter(|&n| !moving.iter().any(|&s| ast.contains(s, n)))
            .collect();
        let mut changed = false;
        for &statement in &moving.clone() {
            let blocker = blocker_of(design, &subtree, statement, &declared).or_else(|| {
                let declares_used = staying.iter().any(|&n| {
                    ast.identifier(n).is_some()
                        && flow::resolve(ast, n).is_some_and(|d| ast.contains(statement, d) && d != n)
                });
                declares_used.then_some(Blocker::Local)
            });
            if let Some(blocker) = blocker {
                moving.retain(|&s| s != statement);
                blocked.push((statement, blocker));
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let mut skipped = Vec::new();
    for (statement, blocker) in blocked {
        if matches!(blocker, Blocker::Parameter | Blocker::OutsideComponent) {
            let text = design.editor.node_source(statement).trim().to_string();
            warn!(component = %id, statement = %text, "statement stays outside the lazy accessor");
            design.emit(VariableEvent::LazyStatementSkipped {
                component: id,
                statement: text.clone(),
            });
            skipped.push(text);
        }
    }

    let mut target = StatementTarget::After(assignment);
    for statement in moving {
        design.editor.move_statement(statement, &target)?;
        target = StatementTarget::After(statement);
    }
    Ok(skipped)
}

fn blocker_of(design: &Design, subtree: &[ComponentId], statement: NodeId, declared: &HashSet<NodeId>) -> Option<Blocker> {
    let ast = design.ast();
    for node in ast.descendants(statement) {
        match ast.kind(node) {
            NodeKind::MethodCall { target: None, .. } => return Some(Blocker::Instance),
            NodeKind::MethodCall { target: Some(receiver), .. } => {
                if matches!(ast.kind(design.bare(*receiver)), NodeKind::This) {
                    return Some(Blocker::Instance);
                }
                let outside = design
                    .component_ids()
                    .into_iter()
                    .filter(|c| !subtree.contains(c))
                    .any(|c| design.represented_by(c, *receiver));
                if outside {
                    return Some(Blocker::OutsideComponent);
                }
            }
            NodeKind::Name { .. } => match flow::resolve(ast, node) {
                Some(d) if d == node => {}
                Some(d) => match flow::declaration_kind(ast, d) {
                    Some(DeclarationKind::Parameter) => return Some(Blocker::Parameter),
                    Some(DeclarationKind::Local) if !declared.contains(&d) => return Some(Blocker::Local),
                    _ => {}
                },
                None => {}
            },
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{assert_code, named, swing};

    fn lazy_button() -> Design {
        let mut design = swing(&[
            "class Test extends JPanel {",
            "\tTest() {",
            "\t\tJButton button = new JButton();",
            "\t\tadd(button);",
            "\t}",
            "}",
        ]);
        let button = named(&design, "button");
        design.convert_to_lazy(button).unwrap();
        design
    }

    // ========================================================================
    // Conversion
    // ========================================================================

    mod conversion {
        use super::*;

        #[test]
        fn configuration_moves_into_accessor() {
            let mut design = swing(&[
                "class Test extends JPanel {",
                "\tTest() {",
                "\t\tBorderLayout borderLayout = new BorderLayout();",
                "\t\tborderLayout.setVgap(5);",
                "\t\tsetLayout(borderLayout);",
                "\t}",
                "}",
            ]);
            let layout = named(&design, "borderLayout");
            let conversion = design.convert_to_lazy(layout).unwrap();
            assert_eq!(conversion.accessor, "getBorderLayout");
            assert!(conversion.skipped.is_empty());
            assert_code(
                &design,
                &[
                    "class Test extends JPanel {",
                    "private BorderLayout borderLayout;",
                    "Test() {",
                    "setLayout(getBorderLayout());",
                    "}",
                    "private BorderLayout getBorderLayout() {",
                    "if (borderLayout == null) {",
                    "borderLayout = new BorderLayout();",
                    "borderLayout.setVgap(5);",
                    "}",
                    "return borderLayout;",
                    "}",
                    "}",
                ],
            );
            assert!(matches!(design.variable(layout).unwrap(), Variable::Lazy(_)));
        }

        #[test]
        fn children_move_with_parent() {
            let mut design = swing(&[
                "class Test extends JPanel {",
                "\tTest() {",
                "\t\tsetLayout(null);",
                "\t\tJPanel panel = new JPanel();",
                "\t\tadd(panel);",
                "\t\tJButton button = new JButton();",
                "\t\tpanel.add(button);",
                "\t}",
                "}",
            ]);
            let panel = named(&design, "panel");
            let conversion = design.convert_to_lazy(panel).unwrap();
            assert!(conversion.skipped.is_empty());
            assert_code(
                &design,
                &[
                    "class Test extends JPanel {",
                    "private JPanel panel;",
                    "Test() {",
                    "setLayout(null);",
                    "add(getPanel());",
                    "}",
                    "private JPanel getPanel() {",
                    "if (panel == null) {",
                    "panel = new JPanel();",
                    "JButton button = new JButton();",
                    "panel.add(button);",
                    "}",
                    "return panel;",
                    "}",
                    "}",
                ],
            );
        }

        #[test]
        fn parameter_use_is_skipped() {
            let mut design = swing(&[
                "class Test extends JPanel {",
                "\tTest(String text) {",
                "\t\tJButton button = new JButton();",
                "\t\tbutton.setText(text);",
                "\t\tadd(button);",
                "\t}",
                "}",
            ]);
            let button = named(&design, "button");
            let conversion = design.convert_to_lazy(button).unwrap();
            assert_eq!(conversion.skipped, vec!["button.setText(text);".to_string()]);
            assert!(design.drain_events().iter().any(|e| matches!(
                e,
                VariableEvent::LazyStatementSkipped { statement, .. } if statement == "button.setText(text);"
            )));
            assert_code(
                &design,
                &[
                    "class Test extends JPanel {",
                    "private JButton button;",
                    "Test(String text) {",
                    "getButton().setText(text);",
                    "add(getButton());",
                    "}",
                    "private JButton getButton() {",
                    "if (button == null) {",
                    "button = new JButton();",
                    "}",
                    "return button;",
                    "}",
                    "}",
                ],
            );
        }

        #[test]
        fn root_is_rejected() {
            let mut design = lazy_button();
            let root = design.root().unwrap();
            assert!(!design.can_convert_to_lazy(root).unwrap());
            let err = design.convert_to_lazy(root).unwrap_err();
            assert!(matches!(err, VariableError::IllegalState(_)), "{err}");
        }
    }

    // ========================================================================
    // Naming
    // ========================================================================

    mod naming {
        use super::*;

        #[test]
        fn rename_follows_accessor() {
            let mut design = lazy_button();
            let button = named(&design, "button");
            design.set_name(button, "okButton").unwrap();
            assert_code(
                &design,
                &[
                    "class Test extends JPanel {",
                    "private JButton okButton;",
                    "Test() {",
                    "add(getOkButton());",
                    "}",
                    "private JButton getOkButton() {",
                    "if (okButton == null) {",
                    "okButton = new JButton();",
                    "}",
                    "return okButton;",
                    "}",
                    "}",
                ],
            );
        }

        #[test]
        fn reference_depends_on_position() {
            let design = lazy_button();
            let Variable::Lazy(accessor) = *design.variable(named(&design, "button")).unwrap() else {
                panic!("not lazy");
            };
            let ast = design.ast();
            let inside = NodeTarget::Statement(StatementTarget::After(accessor.assignment));
            assert_eq!(reference(&design, accessor, &inside).unwrap(), "button");
            let constructor = ast.find_method(design.ty, "Test", 0).unwrap();
            let body = ast.method_body(constructor).unwrap();
            let outside = NodeTarget::Statement(StatementTarget::BlockEnd(body));
            assert_eq!(reference(&design, accessor, &outside).unwrap(), "getButton()");
        }
    }
}
