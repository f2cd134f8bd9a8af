//! The variable name as an editable property.
//!
//! Validation failures are returned as messages so an editor can show them without
//! unwinding the surrounding edit.

use jvar_java::validate_java_identifier;
use tracing::debug;

use crate::error::{VariableError, VariableResult};
use crate::model::{ComponentId, Design, EditRecord};
use crate::variable::Variable;

/// The "Variable" property of one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableProperty {
    component: ComponentId,
}

impl VariableProperty {
    pub const TITLE: &'static str = "Variable";

    pub fn new(component: ComponentId) -> Self {
        VariableProperty { component }
    }

    pub fn component(&self) -> ComponentId {
        self.component
    }

    pub fn title(&self) -> &'static str {
        Self::TITLE
    }

    /// Only components that have, or can be given, a name show the property.
    pub fn is_present(&self, design: &Design) -> bool {
        design.variable(self.component).is_ok_and(|v| v.has_name() || renamable_unnamed(v))
    }

    /// The current name, `None` for variables without one.
    pub fn value(&self, design: &Design) -> Option<String> {
        design.name(self.component).ok()
    }

    /// A message describing why `new_name` cannot be used, or `None`.
    pub fn validate(&self, design: &Design, new_name: &str) -> Option<String> {
        let variable = match design.variable(self.component) {
            Ok(variable) => variable,
            Err(err) => return Some(err.to_string()),
        };
        let result = match variable.named() {
            Some(nv) => crate::variable::check_name(design, nv.declaration, new_name),
            None if renamable_unnamed(variable) => validate_java_identifier(new_name).map_err(VariableError::from),
            None => Err(VariableError::illegal_state(format!(
                "a {} variable has no name",
                variable.kind()
            ))),
        };
        match result {
            Ok(()) => None,
            Err(VariableError::InvalidName { name, reason }) => Some(format!("'{name}': {reason}")),
            Err(err) => Some(err.to_string()),
        }
    }

    /// Rename the component. Returns the validation message instead when the name is
    /// rejected; the source is unchanged then.
    pub fn set_value(&self, design: &mut Design, new_name: &str) -> VariableResult<Result<EditRecord, String>> {
        let new_name = new_name.trim();
        if self.value(design).as_deref() == Some(new_name) {
            return Ok(Err(format!("'{new_name}' is already the name")));
        }
        if let Some(message) = self.validate(design, new_name) {
            debug!(component = %self.component, name = %new_name, %message, "rejected variable name");
            return Ok(Err(message));
        }
        let id = self.component;
        match design.edit(|design| design.set_name(id, new_name)) {
            Ok(((), record)) => Ok(Ok(record)),
            Err(VariableError::InvalidName { name, reason }) => Ok(Err(format!("'{name}': {reason}"))),
            Err(err) => Err(err),
        }
    }
}

fn renamable_unnamed(variable: &Variable) -> bool {
    matches!(variable, Variable::Empty(_) | Variable::Implicit { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VariablePreferences;
    use crate::toolkit::ToolkitDescription;

    fn design(lines: &[&str]) -> Design {
        Design::parse(lines.join("\n"), ToolkitDescription::swing(), VariablePreferences::default())
            .expect("source parses")
    }

    fn two_buttons() -> Design {
        design(&[
            "import javax.swing.*;",
            "class Test extends JPanel {",
            "    Test() {",
            "        JButton button = new JButton();",
            "        add(button);",
            "        JButton button_2 = new JButton();",
            "        add(button_2);",
            "    }",
            "}",
        ])
    }

    // ========================================================================
    // Validation
    // ========================================================================

    mod validation {
        use super::*;

        #[test]
        fn accepts_fresh_identifier() {
            let design = two_buttons();
            let property = VariableProperty::new(design.find("button").unwrap());
            assert_eq!(property.validate(&design, "okButton"), None);
        }

        #[test]
        fn rejects_malformed_identifier() {
            let design = two_buttons();
            let property = VariableProperty::new(design.find("button").unwrap());
            let message = property.validate(&design, "in-valid").unwrap();
            assert!(message.contains("identifier"), "{message}");
        }

        #[test]
        fn rejects_collision_with_later_declaration() {
            let design = two_buttons();
            let property = VariableProperty::new(design.find("button").unwrap());
            assert!(property.validate(&design, "button_2").is_some());
        }

        #[test]
        fn root_has_no_property() {
            let design = two_buttons();
            let property = VariableProperty::new(design.root().unwrap());
            assert!(!property.is_present(&design));
            assert_eq!(property.value(&design), None);
        }
    }

    // ========================================================================
    // Editing
    // ========================================================================

    mod editing {
        use super::*;

        #[test]
        fn set_value_renames() {
            let mut design = two_buttons();
            let id = design.find("button").unwrap();
            let property = VariableProperty::new(id);
            assert_eq!(property.title(), "Variable");
            assert_eq!(property.value(&design).as_deref(), Some("button"));

            let record = property.set_value(&mut design, "abc").unwrap().unwrap();
            assert!(design.source().contains("JButton abc = new JButton();"));
            assert!(design.source().contains("add(abc);"));
            assert!(record.diff.contains("+        add(abc);"));
            assert_eq!(property.value(&design).as_deref(), Some("abc"));
        }

        #[test]
        fn duplicate_leaves_source_unchanged() {
            let mut design = two_buttons();
            let before = design.source().to_string();
            let property = VariableProperty::new(design.find("button").unwrap());
            let message = property.set_value(&mut design, "button_2").unwrap().unwrap_err();
            assert!(message.contains("already exists"), "{message}");
            assert_eq!(design.source(), before);
        }
    }
}
