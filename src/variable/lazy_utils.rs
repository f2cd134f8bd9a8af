//! Recognizing lazy accessors.
//!
//! A lazy accessor is a method without parameters shaped like
//!
//! ```java
//! private JButton getButton() {
//!     if (button == null) {
//!         button = new JButton();
//!         button.setText("OK");
//!     }
//!     return button;
//! }
//! ```
//!
//! The assignment may also sit one level down, in the body of a `try` statement.

use jvar_java::flow::{self, DeclarationKind};
use jvar_java::{Ast, NodeId, NodeKind};

use crate::error::VariableResult;
use crate::model::{ComponentId, Design};
use crate::variable::{field, local, Variable};

/// The parts of a detected accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LazyAccessor {
    /// The accessor method declaration.
    pub method: NodeId,
    /// The declaring name of the field.
    pub field: NodeId,
    /// The statement assigning the field inside the accessor.
    pub assignment: NodeId,
    /// The right side of that assignment.
    pub creation: NodeId,
}

/// The field declaration a name or `this.name` refers to, if it is a field.
fn field_of(ast: &Ast, expression: NodeId) -> Option<NodeId> {
    let declaration = flow::assigned_name(ast, expression).and_then(|n| flow::resolve(ast, n))?;
    (flow::declaration_kind(ast, declaration) == Some(DeclarationKind::Field)).then_some(declaration)
}

/// Recognize `method` as a lazy accessor.
pub fn detect(ast: &Ast, method: NodeId) -> Option<LazyAccessor> {
    if !ast.method_parameters(method).is_empty() {
        return None;
    }
    let body = ast.method_body(method)?;
    let [check, ret] = ast.block_statements(body) else {
        return None;
    };
    let NodeKind::If {
        condition,
        then_branch,
        else_branch: None,
    } = ast.kind(*check)
    else {
        return None;
    };
    let NodeKind::Return {
        expression: Some(returned),
    } = ast.kind(*ret)
    else {
        return None;
    };
    if !matches!(ast.kind(*then_branch), NodeKind::Block { .. }) {
        return None;
    }
    let NodeKind::Binary { operator, left, right } = ast.kind(ast.unparenthesized(*condition)) else {
        return None;
    };
    if operator != "==" || !matches!(ast.kind(ast.unparenthesized(*right)), NodeKind::Null) {
        return None;
    }
    let field = field_of(ast, *left)?;
    if field_of(ast, *returned) != Some(field) {
        return None;
    }
    let (assignment, creation) = find_assignment(ast, *then_branch, field, false)?;
    Some(LazyAccessor {
        method,
        field,
        assignment,
        creation: ast.unparenthesized(creation),
    })
}

fn find_assignment(ast: &Ast, block: NodeId, field: NodeId, nested: bool) -> Option<(NodeId, NodeId)> {
    ast.block_statements(block).iter().find_map(|&statement| match ast.kind(statement) {
        NodeKind::ExpressionStatement { expression } => match ast.kind(ast.unparenthesized(*expression)) {
            NodeKind::Assignment { left, right } if field_of(ast, *left) == Some(field) => Some((statement, *right)),
            _ => None,
        },
        NodeKind::Try { body, .. } if !nested => find_assignment(ast, *body, field, true),
        _ => None,
    })
}

/// Check if a component can be turned into a lazy accessor: a unique local or field
/// created by `new` inside a method and assigned exactly once.
pub fn can_convert(design: &Design, id: ComponentId) -> VariableResult<bool> {
    let component = design.component(id)?;
    if design.root() == Some(id) {
        return Ok(false);
    }
    let ast = design.ast();
    let Some(creation) = component.creation else {
        return Ok(false);
    };
    if !matches!(ast.kind(design.bare(creation)), NodeKind::New { .. }) || ast.enclosing_method(creation).is_none() {
        return Ok(false);
    }
    Ok(match &component.variable {
        Variable::LocalUnique(nv) => nv.variable == nv.declaration && local::single_fragment(ast, *nv),
        Variable::FieldUnique(nv) => {
            nv.variable != nv.declaration
                && flow::assignments(ast, nv.declaration).len() == 1
                && field::assignment_statement(design, *nv).is_some()
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{only, swing};

    fn accessor(design: &Design) -> Option<LazyAccessor> {
        let ast = design.ast();
        let method = ast.find_method(ast.types()[0], "getButton", 0).unwrap();
        detect(ast, method)
    }

    fn with_accessor(body: &[&str]) -> Design {
        let mut lines = vec![
            "class Test extends JPanel {",
            "\tprivate JButton button;",
            "\tTest() {",
            "\t\tadd(getButton());",
            "\t}",
            "\tprivate JButton getButton() {",
        ];
        lines.extend_from_slice(body);
        lines.extend_from_slice(&["\t}", "}"]);
        swing(&lines)
    }

    // ========================================================================
    // Detection
    // ========================================================================

    mod detection {
        use super::*;

        #[test]
        fn accepts_canonical_accessor() {
            let design = with_accessor(&[
                "\t\tif (button == null) {",
                "\t\t\tbutton = new JButton();",
                "\t\t\tbutton.setText(\"OK\");",
                "\t\t}",
                "\t\treturn button;",
            ]);
            let found = accessor(&design).unwrap();
            assert_eq!(design.editor().node_source(found.creation), "new JButton()");
            assert_eq!(design.ast().identifier(found.field), Some("button"));

            let button = only(&design, "JButton");
            assert_eq!(design.variable(button).unwrap(), &Variable::Lazy(found));
            assert_eq!(design.name(button).unwrap(), "button");
            assert_eq!(design.component(button).unwrap().parent(), design.root());
        }

        #[test]
        fn accepts_assignment_inside_try() {
            let design = with_accessor(&[
                "\t\tif (button == null) {",
                "\t\t\ttry {",
                "\t\t\t\tbutton = new JButton();",
                "\t\t\t} catch (Exception e) {",
                "\t\t\t}",
                "\t\t}",
                "\t\treturn button;",
            ]);
            assert!(accessor(&design).is_some());
        }

        #[test]
        fn rejects_three_statements() {
            let design = with_accessor(&[
                "\t\tif (button == null) {",
                "\t\t\tbutton = new JButton();",
                "\t\t}",
                "\t\tfoo();",
                "\t\treturn button;",
            ]);
            assert!(accessor(&design).is_none());
        }

        #[test]
        fn rejects_other_field_returned() {
            let design = with_accessor(&[
                "\t\tif (button == null) {",
                "\t\t\tbutton = new JButton();",
                "\t\t}",
                "\t\treturn other;",
            ]);
            assert!(accessor(&design).is_none());
        }

        #[test]
        fn rejects_not_equal_guard() {
            let design = with_accessor(&[
                "\t\tif (button != null) {",
                "\t\t\tbutton = new JButton();",
                "\t\t}",
                "\t\treturn button;",
            ]);
            assert!(accessor(&design).is_none());
        }
    }

    // ========================================================================
    // Convertibility
    // ========================================================================

    mod convertibility {
        use super::*;

        #[test]
        fn local_and_root() {
            let design = swing(&[
                "class Test extends JPanel {",
                "\tprivate JLabel label = new JLabel();",
                "\tTest() {",
                "\t\tJButton button = new JButton();",
                "\t\tadd(button);",
                "\t\tadd(new JTextField());",
                "\t}",
                "}",
            ]);
            assert!(can_convert(&design, only(&design, "JButton")).unwrap());
            assert!(!can_convert(&design, only(&design, "JLabel")).unwrap());
            assert!(!can_convert(&design, only(&design, "JTextField")).unwrap());
            assert!(!can_convert(&design, design.root().unwrap()).unwrap());
        }
    }
}
