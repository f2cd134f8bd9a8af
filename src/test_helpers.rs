//! Helpers shared by unit tests.

use jvar_java::NodeId;

use crate::config::VariablePreferences;
use crate::model::{ComponentId, Design};
use crate::toolkit::ToolkitDescription;

/// Parse a Swing class written as tab-indented lines.
pub fn swing(lines: &[&str]) -> Design {
    with_preferences(lines, VariablePreferences::default())
}

pub fn with_preferences(lines: &[&str], preferences: VariablePreferences) -> Design {
    let source = format!("import java.awt.*;\nimport javax.swing.*;\n{}\n", lines.join("\n"));
    Design::parse(source, ToolkitDescription::swing(), preferences).expect("test source parses")
}

/// The trimmed non-empty lines of the class body, imports dropped.
pub fn code(design: &Design) -> Vec<String> {
    design
        .source()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("import "))
        .map(str::to_string)
        .collect()
}

/// Assert that the class reads as `expected`, ignoring indentation and blank lines.
pub fn assert_code(design: &Design, expected: &[&str]) {
    assert_eq!(code(design), expected, "\n{}", design.source());
}

/// The only component of a class.
pub fn only(design: &Design, class: &str) -> ComponentId {
    let found = design.find_by_class(class);
    assert_eq!(found.len(), 1, "components of {class}: {found:?}");
    found[0]
}

/// The first component named `name`.
pub fn named(design: &Design, name: &str) -> ComponentId {
    design
        .find(name)
        .unwrap_or_else(|| panic!("no component named {name}:\n{}", design.source()))
}

/// The statement whose source is `text`.
pub fn statement(design: &Design, text: &str) -> NodeId {
    let ast = design.ast();
    ast.descendants(ast.root())
        .into_iter()
        .find(|&n| ast.kind(n).is_statement() && design.editor().node_source(n).trim() == text)
        .unwrap_or_else(|| panic!("no statement `{text}`:\n{}", design.source()))
}
