// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A sequence of edits through the public `SourceEditor` API, checking that node ids
//! survive and that the tree stays usable for name resolution after every step.

use jvar_java::flow::{self, DeclarationKind};
use jvar_java::{NodeId, NodeKind, SourceEditor, StatementTarget};

const SOURCE: &str = "import javax.swing.*;\n\nclass Test extends JPanel {\n\tTest() {\n\t\tJButton button = new JButton();\n\t\tadd(button);\n\t}\n\tvoid other() {\n\t}\n}\n";

fn statement(editor: &SourceEditor, text: &str) -> NodeId {
    let ast = editor.ast();
    ast.descendants(ast.root())
        .into_iter()
        .find(|&n| ast.kind(n).is_statement() && editor.node_source(n) == text)
        .unwrap_or_else(|| panic!("no statement `{text}` in\n{}", editor.source()))
}

fn body(editor: &SourceEditor, method: &str) -> NodeId {
    let ast = editor.ast();
    let method = ast
        .methods(ast.types()[0])
        .into_iter()
        .find(|&m| ast.method_name(m) == Some(method))
        .unwrap();
    ast.method_body(method).unwrap()
}

fn declared(editor: &SourceEditor, identifier: &str) -> NodeId {
    let ast = editor.ast();
    ast.descendants(ast.root())
        .into_iter()
        .find(|&n| ast.identifier(n) == Some(identifier) && flow::declaration_kind(ast, n).is_some())
        .unwrap()
}

#[test]
fn ids_survive_a_sequence_of_edits() {
    let mut editor = SourceEditor::parse(SOURCE).unwrap();
    let before = editor.content_hash();
    let add = statement(&editor, "add(button);");
    let declaration = declared(&editor, "button");

    let text = editor
        .add_statement("button.setText(\"OK\");", &StatementTarget::Before(add))
        .unwrap();
    assert_eq!(editor.node_source(text), "button.setText(\"OK\");");
    assert_eq!(editor.node_source(add), "add(button);");

    let other = body(&editor, "other");
    editor.move_statement(text, &StatementTarget::BlockEnd(other)).unwrap();
    assert_eq!(editor.node_source(text), "button.setText(\"OK\");");
    assert!(editor.ast().contains(other, text));

    editor.remove_statement(add).unwrap();
    assert!(!editor.ast().is_attached(add));
    assert_eq!(
        editor.source(),
        "import javax.swing.*;\n\nclass Test extends JPanel {\n\tTest() {\n\t\tJButton button = new JButton();\n\t}\n\tvoid other() {\n\t\tbutton.setText(\"OK\");\n\t}\n}\n"
    );

    // The moved use no longer sees the constructor's local.
    let ast = editor.ast();
    let moved_use = ast
        .descendants(text)
        .into_iter()
        .find(|&n| ast.identifier(n) == Some("button"))
        .unwrap();
    assert_eq!(flow::resolve(ast, moved_use), None);
    assert_eq!(flow::declaration_kind(ast, declaration), Some(DeclarationKind::Local));
    assert_ne!(editor.content_hash(), before);
    assert!(!editor.edits().is_empty());
}

#[test]
fn names_and_types_for_new_code() {
    let mut editor = SourceEditor::parse(SOURCE).unwrap();
    let add = statement(&editor, "add(button);");
    let position = StatementTarget::After(add).position(editor.ast());
    assert_eq!(editor.unique_variable_name(position, "button", None), "button_1");
    assert_eq!(editor.unique_variable_name(position, "label", None), "label");

    assert_eq!(editor.type_source("javax.swing.JLabel").unwrap(), "JLabel");
    assert_eq!(editor.type_source("java.lang.String").unwrap(), "String");
    assert_eq!(editor.type_source("java.awt.BorderLayout").unwrap(), "BorderLayout");
    assert!(editor.source().contains("import java.awt.BorderLayout;"));

    let ty = editor.ast().types()[0];
    assert_eq!(editor.unique_method_name(ty, "other"), "other_1");
    assert_eq!(editor.unique_method_name(ty, "getButton"), "getButton");
}

#[test]
fn malformed_statement_is_rejected_without_change() {
    let mut editor = SourceEditor::parse(SOURCE).unwrap();
    let add = statement(&editor, "add(button);");
    assert!(editor.add_statement("add(button", &StatementTarget::After(add)).is_err());
    assert_eq!(editor.source(), SOURCE);
    assert!(matches!(editor.ast().kind(add), NodeKind::ExpressionStatement { .. }));
}
