//! Toolkit descriptions: which classes are components and how they relate.
//!
//! A toolkit is loaded from JSON or taken from the built-in Swing description. The model
//! builder uses it to recognize creations, associations and exposed or implicit children.

use std::fs;
use std::path::Path;

use jvar_java::{Ast, NodeKind};
use serde::{Deserialize, Serialize};

use crate::error::VariableResult;

/// A child the parent exposes through a getter or a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposedChild {
    pub class_name: String,
    /// Getter method name for properties, field name for fields.
    pub member: String,
    #[serde(default)]
    pub is_field: bool,
}

/// A child the parent creates by itself, reachable through `getter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplicitChild {
    pub class_name: String,
    pub getter: String,
    /// Association method that replaces the implicit child (`setLayout`).
    #[serde(default)]
    pub replaced_by: Option<String>,
}

/// A control owned by a wrapper object (a viewer owning its table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapperDescription {
    pub control_class: String,
    pub method: String,
}

/// A `void` method that creates a component from its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoidFactory {
    pub method: String,
    pub class_name: String,
    pub parent_argument: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescription {
    pub class_name: String,
    /// Default variable name override.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub acronym: Option<String>,
    /// Methods that must be invoked before the component is associated with its parent.
    #[serde(default)]
    pub before_association: Vec<String>,
    #[serde(default)]
    pub exposed: Vec<ExposedChild>,
    #[serde(default)]
    pub implicit_children: Vec<ImplicitChild>,
    #[serde(default)]
    pub wrapper: Option<WrapperDescription>,
    /// Index of the constructor argument that names the parent.
    #[serde(default)]
    pub constructor_parent: Option<usize>,
}

impl ComponentDescription {
    pub fn new(class_name: impl Into<String>) -> Self {
        ComponentDescription {
            class_name: class_name.into(),
            name: None,
            acronym: None,
            before_association: Vec::new(),
            exposed: Vec::new(),
            implicit_children: Vec::new(),
            wrapper: None,
            constructor_parent: None,
        }
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.class_name)
    }
}

/// The component classes of one toolkit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolkitDescription {
    pub id: String,
    /// Methods that start the execution flow besides constructors.
    #[serde(default)]
    pub entry_methods: Vec<String>,
    /// Methods whose invocation on a parent associates a child argument with it.
    #[serde(default)]
    pub association_methods: Vec<String>,
    #[serde(default)]
    pub void_factories: Vec<VoidFactory>,
    pub components: Vec<ComponentDescription>,
}

/// `javax.swing.JButton` → `JButton`.
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

fn package_of(qualified: &str) -> &str {
    qualified.rsplit_once('.').map_or("", |(package, _)| package)
}

impl ToolkitDescription {
    pub fn load(path: &Path) -> VariableResult<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn component(&self, class_name: &str) -> Option<&ComponentDescription> {
        self.components.iter().find(|c| c.class_name == class_name)
    }

    pub fn void_factory(&self, method: &str) -> Option<&VoidFactory> {
        self.void_factories.iter().find(|f| f.method == method)
    }

    /// Resolve a type as written in `ast` to a component class of this toolkit.
    ///
    /// Single-type imports win over on-demand imports; a qualified name must match exactly.
    pub fn resolve(&self, ast: &Ast, type_text: &str) -> Option<&ComponentDescription> {
        let raw = type_text.split('<').next().unwrap_or(type_text).trim();
        if raw.contains('.') {
            return self.component(raw);
        }
        let mut on_demand = Vec::new();
        for &import in ast.imports() {
            if let NodeKind::Import {
                name,
                is_static: false,
                on_demand: star,
            } = ast.kind(import)
            {
                if *star {
                    on_demand.push(name.as_str());
                } else if simple_name(name) == raw {
                    return self.component(name);
                }
            }
        }
        let package = ast.package().unwrap_or("");
        self.components.iter().find(|c| {
            c.simple_name() == raw
                && (on_demand.contains(&package_of(&c.class_name))
                    || package_of(&c.class_name) == package
                    || package_of(&c.class_name) == "java.lang")
        })
    }

    /// The built-in Swing toolkit.
    pub fn swing() -> Self {
        let plain = |class: &str| ComponentDescription::new(class);
        let window = |class: &str| ComponentDescription {
            exposed: vec![ExposedChild {
                class_name: "java.awt.Container".to_string(),
                member: "getContentPane".to_string(),
                is_field: false,
            }],
            ..ComponentDescription::new(class)
        };
        let mut components = vec![
            window("javax.swing.JFrame"),
            window("javax.swing.JDialog"),
            ComponentDescription {
                before_association: vec!["setModel".to_string()],
                ..ComponentDescription::new("javax.swing.JComboBox")
            },
        ];
        components.extend(
            [
                "java.awt.Container",
                "java.awt.BorderLayout",
                "java.awt.FlowLayout",
                "java.awt.GridLayout",
                "javax.swing.JPanel",
                "javax.swing.JButton",
                "javax.swing.JLabel",
                "javax.swing.JTextField",
                "javax.swing.JTextArea",
                "javax.swing.JCheckBox",
                "javax.swing.JList",
                "javax.swing.JTable",
                "javax.swing.JScrollPane",
                "javax.swing.JSplitPane",
                "javax.swing.JTabbedPane",
                "javax.swing.JMenuBar",
                "javax.swing.JMenu",
                "javax.swing.JMenuItem",
            ]
            .into_iter()
            .map(plain),
        );
        ToolkitDescription {
            id: "swing".to_string(),
            entry_methods: ["initComponents", "initialize", "createContents", "jbInit"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            association_methods: [
                "add",
                "setLayout",
                "setContentPane",
                "setJMenuBar",
                "setViewportView",
                "setLeftComponent",
                "setRightComponent",
                "addTab",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            void_factories: Vec::new(),
            components,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jvar_java::SourceEditor;

    fn ast(source: &str) -> Ast {
        SourceEditor::parse(source).unwrap().ast().clone()
    }

    #[test]
    fn resolves_through_single_type_import() {
        let toolkit = ToolkitDescription::swing();
        let ast = ast("import javax.swing.JButton;\nclass Test {}");
        let found = toolkit.resolve(&ast, "JButton").unwrap();
        assert_eq!(found.class_name, "javax.swing.JButton");
        assert!(toolkit.resolve(&ast, "JLabel").is_none());
    }

    #[test]
    fn resolves_through_on_demand_import_and_generics() {
        let toolkit = ToolkitDescription::swing();
        let ast = ast("import javax.swing.*;\nclass Test {}");
        assert_eq!(
            toolkit.resolve(&ast, "JComboBox<String>").unwrap().before_association,
            vec!["setModel".to_string()]
        );
        assert!(toolkit.resolve(&ast, "javax.swing.JLabel").is_some());
    }

    #[test]
    fn loads_from_json() {
        let json = r#"{
            "id": "test",
            "components": [
                {"class_name": "test.Shell", "implicit_children": [
                    {"class_name": "test.Layout", "getter": "getLayout", "replaced_by": "setLayout"}
                ]}
            ]
        }"#;
        let toolkit: ToolkitDescription = serde_json::from_str(json).unwrap();
        let shell = toolkit.component("test.Shell").unwrap();
        assert_eq!(shell.implicit_children[0].getter, "getLayout");
        assert!(toolkit.entry_methods.is_empty());
        assert_eq!(shell.simple_name(), "Shell");
    }
}
