//! Adding components to source and deleting them.
//!
//! Adding runs the two-phase protocol of the chosen [`AddStrategy`]: phase one renders
//! the statement to insert (if any), phase two binds the new variable to what was
//! inserted. The association with the parent is written afterwards at the child's
//! association target.

use jvar_java::flow::{self, DeclarationKind};
use jvar_java::{BodyDeclarationTarget, NodeId, NodeKind, NodeTarget, StatementTarget};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{VariableError, VariableResult};
use crate::model::{Association, ComponentId, Design};
use crate::names::decorate;
use crate::variable::lazy_utils;
use crate::variable::{add_field, first_declared_name, EmptyFlavor, EmptyVariable, NamedVariable, Variable};

/// How a new component is written into source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AddStrategy {
    /// `T name = init;`
    LocalUnique,
    /// A new field assigned at the target: `name = init;`.
    FieldUnique,
    /// A new field initialized by its declaration.
    FieldInitializer,
    /// A new field with a `getX()` accessor creating it.
    Lazy,
    /// The creation is written as the argument of the association invocation.
    Empty,
    /// The creation is written into an invocation template such as
    /// `%parent%.add(%child%)`.
    EmptyInvocation { template: String },
    /// `init;`
    EmptyPure,
}

/// How a new component is associated with its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddAssociation {
    None,
    /// `parent.method(child);`
    Invocation(String),
    /// The initializer passes the parent to the constructor.
    Constructor,
}

fn type_and_base(design: &mut Design, class_name: &str, field: bool) -> VariableResult<(String, String)> {
    let ty = design.editor.type_source(class_name)?;
    let name = design.names().name(class_name);
    let prefs = &design.preferences;
    let base = if field {
        decorate(&name, &prefs.field_prefix, &prefs.field_suffix)
    } else {
        decorate(&name, &prefs.local_prefix, &prefs.local_suffix)
    };
    Ok((ty, base))
}

fn field_target(design: &Design) -> BodyDeclarationTarget {
    match design.ast().fields(design.ty).last() {
        Some(&last) => BodyDeclarationTarget::After(last),
        None => BodyDeclarationTarget::TypeStart(design.ty),
    }
}

fn initializer_of(design: &Design, declaration: NodeId) -> VariableResult<NodeId> {
    let ast = design.ast();
    match ast.parent(declaration).map(|f| ast.kind(f)) {
        Some(NodeKind::Fragment {
            initializer: Some(init), ..
        }) => Ok(design.bare(*init)),
        _ => Err(VariableError::illegal_state("declaration has no initializer")),
    }
}

impl AddStrategy {
    /// Phase one: source of the statement to insert at `target`, or `None` when the
    /// variable is declared elsewhere.
    pub fn add_get_variable_statement_source(
        &self,
        design: &mut Design,
        class_name: &str,
        target: &StatementTarget,
        initializer: &str,
    ) -> VariableResult<Option<String>> {
        Ok(match self {
            AddStrategy::LocalUnique => {
                let (ty, base) = type_and_base(design, class_name, false)?;
                let name = design
                    .editor
                    .unique_variable_name(target.position(design.ast()), &base, None);
                let modifier = if design.preferences.declare_final { "final " } else { "" };
                Some(format!("{modifier}{ty} {name} = {initializer};"))
            }
            AddStrategy::FieldUnique => {
                let (ty, base) = type_and_base(design, class_name, true)?;
                let is_static = flow::is_static_context(design.ast(), target.node());
                let (name, _) = add_field(design, &ty, &base, is_static, None)?;
                let qualifier = if design.preferences.prefix_this && !is_static {
                    "this."
                } else {
                    ""
                };
                Some(format!("{qualifier}{name} = {initializer};"))
            }
            AddStrategy::FieldInitializer | AddStrategy::Lazy | AddStrategy::Empty => None,
            AddStrategy::EmptyInvocation { template } => Some(format!("{};", template.replace("%child%", initializer))),
            AddStrategy::EmptyPure => Some(format!("{initializer};")),
        })
    }

    /// Phase two: the variable for what phase one inserted, and the creation node.
    /// `statement` is the inserted statement, or the association invocation for
    /// [`AddStrategy::Empty`].
    pub fn add_set_variable_statement(
        &self,
        design: &mut Design,
        class_name: &str,
        initializer: &str,
        statement: Option<NodeId>,
    ) -> VariableResult<(Variable, NodeId)> {
        let inserted = || statement.ok_or_else(|| VariableError::illegal_state("no statement was inserted"));
        match self {
            AddStrategy::LocalUnique => {
                let declaration = first_declared_name(design, inserted()?)?;
                let creation = initializer_of(design, declaration)?;
                Ok((Variable::LocalUnique(NamedVariable::declared(declaration)), creation))
            }
            AddStrategy::FieldUnique => {
                let ast = design.ast();
                let statement = inserted()?;
                let parts = match ast.kind(statement) {
                    NodeKind::ExpressionStatement { expression } => match ast.kind(*expression) {
                        NodeKind::Assignment { left, right } => flow::assigned_name(ast, *left)
                            .and_then(|variable| flow::resolve(ast, variable).map(|d| (variable, d, *right))),
                        _ => None,
                    },
                    _ => None,
                };
                let (variable, declaration, right) =
                    parts.ok_or_else(|| VariableError::illegal_state("inserted statement assigns no field"))?;
                Ok((
                    Variable::FieldUnique(NamedVariable { variable, declaration }),
                    design.bare(right),
                ))
            }
            AddStrategy::FieldInitializer => {
                let (ty, base) = type_and_base(design, class_name, true)?;
                let position = BodyDeclarationTarget::TypeStart(design.ty).position(design.ast());
                let name = design.editor.unique_variable_name(position, &base, None);
                let source = format!("{}{} {} = {};", design.preferences.field_modifier, ty, name, initializer);
                let target = field_target(design);
                let member = design.editor.add_field_declaration(&source, &target)?;
                let declaration = first_declared_name(design, member)?;
                let creation = initializer_of(design, declaration)?;
                Ok((Variable::FieldInitializer(NamedVariable::declared(declaration)), creation))
            }
            AddStrategy::Lazy => {
                let (ty, base) = type_and_base(design, class_name, true)?;
                let (name, _) = add_field(design, &ty, &base, false, None)?;
                let prefs = &design.preferences;
                let stripped = crate::names::strip_decoration(&name, &prefs.field_prefix, &prefs.field_suffix);
                let method_name = design
                    .editor
                    .unique_method_name(design.ty, &format!("get{}", crate::names::capitalize(stripped)));
                let header = format!("{}{} {}()", design.preferences.lazy_method_modifier, ty, method_name);
                let body = vec![
                    format!("if ({name} == null) {{"),
                    format!("\t{name} = {initializer};"),
                    "}".to_string(),
                    format!("return {name};"),
                ];
                let method = design
                    .editor
                    .add_method_declaration(&header, &body, &BodyDeclarationTarget::TypeEnd(design.ty))?;
                let accessor = lazy_utils::detect(design.ast(), method)
                    .ok_or_else(|| VariableError::illegal_state("generated accessor is not recognized"))?;
                Ok((Variable::Lazy(accessor), accessor.creation))
            }
            AddStrategy::Empty | AddStrategy::EmptyInvocation { .. } | AddStrategy::EmptyPure => {
                let statement = inserted()?;
                let ast = design.ast();
                let wanted = initializer.trim();
                let creation = ast
                    .descendants(statement)
                    .into_iter()
                    .find(|&n| ast.kind(n).is_expression() && design.editor.node_source(n).trim() == wanted)
                    .ok_or_else(|| VariableError::illegal_state("inserted statement lost the initializer"))?;
                let flavor = match self {
                    AddStrategy::EmptyPure => EmptyFlavor::Pure,
                    AddStrategy::EmptyInvocation { .. } => EmptyFlavor::Invocation,
                    _ => EmptyFlavor::Plain,
                };
                Ok((
                    Variable::Empty(EmptyVariable {
                        initializer: creation,
                        flavor,
                    }),
                    design.bare(creation),
                ))
            }
        }
    }
}

/// The method invocation whose argument is `creation`.
fn enclosing_invocation(design: &Design, creation: NodeId) -> Option<NodeId> {
    let ast = design.ast();
    ast.parent(design.wrapped(creation))
        .filter(|&p| matches!(ast.kind(p), NodeKind::MethodCall { .. }))
}

impl Design {
    /// Where code for a new child of `parent` goes: after the last statement of the
    /// parent's subtree, or at the end of the flow entry for the edited class itself.
    pub fn child_target(&mut self, parent: ComponentId) -> VariableResult<StatementTarget> {
        if matches!(self.component(parent)?.variable, Variable::This) {
            let ast = self.ast();
            let body = self
                .flow
                .entries()
                .iter()
                .find_map(|&m| ast.method_body(m))
                .ok_or_else(|| VariableError::illegal_state("the type has no execution flow"))?;
            return Ok(StatementTarget::BlockEnd(body));
        }
        let base = self.statement_target(parent)?;
        let ast = self.ast();
        let block = base.statement().and_then(|s| ast.parent(s));
        let mut last: Option<NodeId> = None;
        for member in self.subtree(parent) {
            for node in self.live_related(member)? {
                let Ok(statement) = self.editor.block_statement_of(node) else {
                    continue;
                };
                if block.is_some() && ast.parent(statement) == block
                    && last.map_or(true, |l| ast.span(statement).start > ast.span(l).start)
                {
                    last = Some(statement);
                }
            }
        }
        Ok(match (last, base.statement()) {
            (Some(l), Some(b)) if ast.span(l).start > ast.span(b).start => StatementTarget::After(l),
            _ => base,
        })
    }

    /// Write a new component into source and add it to the model.
    ///
    /// `initializer` is the creation expression; `%parent%` in it is replaced with a
    /// reference to the parent.
    pub fn add_component(
        &mut self,
        parent: Option<ComponentId>,
        class_name: &str,
        strategy: AddStrategy,
        target: StatementTarget,
        initializer: &str,
        association: AddAssociation,
    ) -> VariableResult<ComponentId> {
        let mut target = target;
        let (parent_access, parent_reference) = match parent {
            Some(p) => {
                let mut node_target = NodeTarget::Statement(target);
                let access = self.access_expression(p, &mut node_target)?;
                target = node_target.statement_target().unwrap_or(target);
                let reference = access.strip_suffix('.').map_or_else(|| "this".to_string(), str::to_string);
                (access, reference)
            }
            None => (String::new(), "this".to_string()),
        };
        let initializer = initializer.replace("%parent%", &parent_reference);
        let strategy = match strategy {
            AddStrategy::LocalUnique if self.names().should_use_field(class_name) => AddStrategy::FieldUnique,
            AddStrategy::EmptyInvocation { template } => AddStrategy::EmptyInvocation {
                template: template
                    .replace("%parent%.", &parent_access)
                    .replace("%parent%", &parent_reference),
            },
            other => other,
        };

        let statement = match (&strategy, &association) {
            (AddStrategy::Empty, AddAssociation::Invocation(method)) if parent.is_some() => {
                let source = format!("{}{}({});", parent_access, method, initializer);
                Some(self.editor.add_statement(&source, &target)?)
            }
            (AddStrategy::Empty, _) => {
                return Err(VariableError::illegal_state(
                    "an empty variable needs a parent association invocation",
                ))
            }
            _ => match strategy.add_get_variable_statement_source(self, class_name, &target, &initializer)? {
                Some(source) => Some(self.editor.add_statement(&source, &target)?),
                None => None,
            },
        };
        let (variable, creation) = strategy.add_set_variable_statement(self, class_name, &initializer, statement)?;
        let named = variable.named();
        let id = self.add_component_record(class_name, variable);
        {
            let component = self.component_mut(id)?;
            component.creation = Some(creation);
            if let Some(nv) = named {
                component.add_related(nv.declaration);
                component.add_related(nv.variable);
            }
        }

        if let Some(p) = parent {
            let link = match association {
                AddAssociation::None => None,
                AddAssociation::Constructor => Some(Association::Constructor { creation }),
                AddAssociation::Invocation(method) => {
                    let invocation = match strategy {
                        AddStrategy::Empty | AddStrategy::EmptyInvocation { .. } => enclosing_invocation(self, creation)
                            .ok_or_else(|| VariableError::illegal_state("association invocation not found"))?,
                        _ => self.write_association(id, p, &method, statement, target)?,
                    };
                    self.component_mut(id)?.add_related(invocation);
                    Some(Association::Invocation { invocation, method })
                }
            };
            match link {
                Some(association) => self.link_child(p, id, association)?,
                None => {
                    self.component_mut(id)?.parent = Some(p);
                    self.component_mut(p)?.children.push(id);
                }
            }
        }
        info!(component = %id, class = %class_name, kind = self.component(id)?.variable.kind(), "added component");
        Ok(id)
    }

    /// `parent.method(child);` at the child's association target. Returns the invocation.
    fn write_association(
        &mut self,
        id: ComponentId,
        parent: ComponentId,
        method: &str,
        statement: Option<NodeId>,
        target: StatementTarget,
    ) -> VariableResult<NodeId> {
        let after = match statement {
            Some(s) => self.association_target(id, StatementTarget::After(s))?,
            None => target,
        };
        let mut node_target = NodeTarget::Statement(after);
        let access = self.access_expression(parent, &mut node_target)?;
        let child = self.reference_expression(id, &mut node_target)?;
        let after = node_target.statement_target().unwrap_or(after);
        let written = self
            .editor
            .add_statement(&format!("{}{}({});", access, method, child), &after)?;
        let ast = self.ast();
        let invocation = match ast.kind(written) {
            NodeKind::ExpressionStatement { expression } => *expression,
            _ => return Err(VariableError::illegal_state("association is not an invocation")),
        };
        if let NodeKind::MethodCall { arguments, .. } = ast.kind(invocation) {
            let arguments = arguments.clone();
            let component = self.component_mut(id)?;
            for argument in arguments {
                component.add_related(argument);
            }
        }
        debug!(component = %id, method, "wrote association");
        Ok(invocation)
    }

    // ========================================================================
    // Delete
    // ========================================================================

    /// Remove a component and its subtree from source and from the model.
    pub fn delete_component(&mut self, id: ComponentId) -> VariableResult<()> {
        let component = self.component(id)?;
        if matches!(component.variable, Variable::This) {
            return Err(VariableError::illegal_state("the edited class cannot be deleted"));
        }
        if matches!(component.association, Some(Association::Exposed)) {
            return Err(VariableError::illegal_state("an exposed child cannot be deleted"));
        }
        let subtree = self.subtree(id);
        for &member in &subtree {
            self.delete_before(member)?;
        }

        let ast = self.ast();
        let accessors: Vec<NodeId> = subtree
            .iter()
            .filter_map(|&c| match self.component(c).map(|c| &c.variable) {
                Ok(Variable::Lazy(accessor)) => Some(accessor.method),
                _ => None,
            })
            .collect();
        let mut statements: Vec<NodeId> = Vec::new();
        for &member in &subtree {
            for node in self.live_related(member)? {
                let Ok(statement) = self.editor.block_statement_of(node) else {
                    continue;
                };
                let in_accessor = accessors.iter().any(|&m| ast.contains(m, statement));
                let shared_declaration = ast.fragments(statement).len() > 1;
                if !in_accessor && !shared_declaration && !statements.contains(&statement) {
                    statements.push(statement);
                }
            }
        }
        let all = statements.clone();
        statements.retain(|&s| !all.iter().any(|&other| other != s && ast.contains(other, s)));
        for statement in statements {
            self.editor.remove_statement(statement)?;
        }

        for &member in subtree.iter().rev() {
            if self.root != Some(member) {
                self.delete_after(member)?;
            }
        }

        if let Some(parent) = self.component(id)?.parent {
            self.component_mut(parent)?.children.retain(|&c| c != id);
        }
        for member in subtree {
            if let Some(slot) = self.components.get_mut(member.0 as usize) {
                *slot = None;
            }
        }
        info!(component = %id, "deleted component");
        Ok(())
    }

    /// Before statements are removed: take the component's fragment out of a declaration
    /// shared with other variables, so removing statements leaves the others in place.
    pub fn delete_before(&mut self, id: ComponentId) -> VariableResult<()> {
        let Some(nv) = self.component(id)?.variable.named() else {
            return Ok(());
        };
        let ast = self.ast();
        if !ast.is_attached(nv.declaration) {
            return Ok(());
        }
        let shared = flow::declaration_statement(ast, nv.declaration)
            .is_some_and(|d| flow::declaration_kind(ast, nv.declaration) != Some(DeclarationKind::Parameter) && ast.fragments(d).len() > 1);
        if shared && nv.variable == nv.declaration {
            let fragment = flow::declaration_node(ast, nv.declaration)
                .ok_or_else(|| VariableError::illegal_state("declaration without fragment"))?;
            self.editor.remove_variable_declaration(fragment)?;
        }
        Ok(())
    }

    /// After statements are removed: drop the declaration when nothing references it
    /// any more, and the accessor of a lazy variable.
    pub fn delete_after(&mut self, id: ComponentId) -> VariableResult<()> {
        match self.component(id)?.variable.clone() {
            Variable::Lazy(accessor) => {
                if self.ast().is_attached(accessor.method) {
                    self.editor.remove_body_declaration(accessor.method)?;
                }
                self.remove_unreferenced(accessor.field)
            }
            Variable::LocalUnique(nv)
            | Variable::LocalReuse(nv)
            | Variable::FieldUnique(nv)
            | Variable::FieldReuse(nv)
            | Variable::FieldInitializer(nv) => self.remove_unreferenced(nv.declaration),
            _ => Ok(()),
        }
    }

    fn remove_unreferenced(&mut self, declaration: NodeId) -> VariableResult<()> {
        let ast = self.ast();
        if !ast.is_attached(declaration) || flow::references(ast, declaration).len() > 1 {
            return Ok(());
        }
        let Some(fragment) = flow::declaration_node(ast, declaration) else {
            return Ok(());
        };
        if flow::declaration_kind(ast, declaration) == Some(DeclarationKind::Parameter) {
            return Ok(());
        }
        self.editor.remove_variable_declaration(fragment)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{assert_code, code, named, only, swing};

    const EMPTY_CLASS: &[&str] = &["class Test extends JPanel {", "\tTest() {", "\t}", "}"];

    fn add_button(design: &mut Design, strategy: AddStrategy) -> ComponentId {
        let root = design.root().unwrap();
        let target = design.child_target(root).unwrap();
        design
            .add_component(
                Some(root),
                "javax.swing.JButton",
                strategy,
                target,
                "new JButton()",
                AddAssociation::Invocation("add".to_string()),
            )
            .unwrap()
    }

    // ========================================================================
    // Adding
    // ========================================================================

    mod adding {
        use super::*;

        #[test]
        fn local_unique() {
            let mut design = swing(EMPTY_CLASS);
            let id = add_button(&mut design, AddStrategy::LocalUnique);
            assert_code(
                &design,
                &[
                    "class Test extends JPanel {",
                    "Test() {",
                    "JButton button = new JButton();",
                    "add(button);",
                    "}",
                    "}",
                ],
            );
            let component = design.component(id).unwrap();
            assert_eq!(component.parent(), design.root());
            assert!(matches!(component.association(), Some(Association::Invocation { method, .. }) if method == "add"));
            assert_eq!(design.name(id).unwrap(), "button");
        }

        #[test]
        fn second_local_gets_suffix() {
            let mut design = swing(EMPTY_CLASS);
            add_button(&mut design, AddStrategy::LocalUnique);
            let second = add_button(&mut design, AddStrategy::LocalUnique);
            assert_eq!(design.name(second).unwrap(), "button_1");
            assert!(code(&design).contains(&"add(button_1);".to_string()));
        }

        #[test]
        fn field_unique() {
            let mut design = swing(EMPTY_CLASS);
            let id = add_button(&mut design, AddStrategy::FieldUnique);
            assert_code(
                &design,
                &[
                    "class Test extends JPanel {",
                    "private JButton button;",
                    "Test() {",
                    "button = new JButton();",
                    "add(button);",
                    "}",
                    "}",
                ],
            );
            assert!(matches!(design.variable(id).unwrap(), Variable::FieldUnique(_)));
        }

        #[test]
        fn lazy() {
            let mut design = swing(EMPTY_CLASS);
            let id = add_button(&mut design, AddStrategy::Lazy);
            assert_code(
                &design,
                &[
                    "class Test extends JPanel {",
                    "private JButton button;",
                    "Test() {",
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
            assert!(matches!(design.variable(id).unwrap(), Variable::Lazy(_)));
        }

        #[test]
        fn empty_inside_association() {
            let mut design = swing(EMPTY_CLASS);
            let id = add_button(&mut design, AddStrategy::Empty);
            assert_code(&design, &["class Test extends JPanel {", "Test() {", "add(new JButton());", "}", "}"]);
            assert!(matches!(design.variable(id).unwrap(), Variable::Empty(_)));
            assert_eq!(design.component(id).unwrap().parent(), design.root());
        }

        #[test]
        fn empty_without_invocation_is_rejected() {
            let mut design = swing(EMPTY_CLASS);
            let root = design.root().unwrap();
            let target = design.child_target(root).unwrap();
            let err = design
                .add_component(
                    Some(root),
                    "javax.swing.JButton",
                    AddStrategy::Empty,
                    target,
                    "new JButton()",
                    AddAssociation::None,
                )
                .unwrap_err();
            assert!(matches!(err, VariableError::IllegalState(_)));
        }

        #[test]
        fn empty_invocation_template_on_child_panel() {
            let mut design = swing(&[
                "class Test extends JPanel {",
                "\tTest() {",
                "\t\tJPanel panel = new JPanel();",
                "\t\tadd(panel);",
                "\t}",
                "}",
            ]);
            let panel = named(&design, "panel");
            let target = design.child_target(panel).unwrap();
            let id = design
                .add_component(
                    Some(panel),
                    "javax.swing.JButton",
                    AddStrategy::EmptyInvocation {
                        template: "%parent%.add(%child%)".to_string(),
                    },
                    target,
                    "new JButton()",
                    AddAssociation::Invocation("add".to_string()),
                )
                .unwrap();
            assert_code(
                &design,
                &[
                    "class Test extends JPanel {",
                    "Test() {",
                    "JPanel panel = new JPanel();",
                    "add(panel);",
                    "panel.add(new JButton());",
                    "}",
                    "}",
                ],
            );
            assert_eq!(design.component(id).unwrap().parent(), Some(panel));
        }

        #[test]
        fn parent_placeholder_in_initializer() {
            let mut design = swing(EMPTY_CLASS);
            let root = design.root().unwrap();
            let target = design.child_target(root).unwrap();
            design
                .add_component(
                    Some(root),
                    "javax.swing.JButton",
                    AddStrategy::EmptyPure,
                    target,
                    "new JButton(%parent%)",
                    AddAssociation::None,
                )
                .unwrap();
            assert_code(&design, &["class Test extends JPanel {", "Test() {", "new JButton(this);", "}", "}"]);
        }

        #[test]
        fn strategy_serializes_with_tag() {
            let json = serde_json::to_string(&AddStrategy::EmptyInvocation {
                template: "%parent%.add(%child%)".to_string(),
            })
            .unwrap();
            assert_eq!(json, r#"{"kind":"empty_invocation","template":"%parent%.add(%child%)"}"#);
            let back: AddStrategy = serde_json::from_str(r#"{"kind":"field_initializer"}"#).unwrap();
            assert_eq!(back, AddStrategy::FieldInitializer);
        }
    }

    // ========================================================================
    // Deleting
    // ========================================================================

    mod deleting {
        use super::*;

        #[test]
        fn local_restores_source() {
            let mut design = swing(EMPTY_CLASS);
            let id = add_button(&mut design, AddStrategy::LocalUnique);
            design.delete_component(id).unwrap();
            assert_code(&design, &["class Test extends JPanel {", "Test() {", "}", "}"]);
            assert!(design.component(id).is_err());
            assert!(design.component(design.root().unwrap()).unwrap().children().is_empty());
        }

        #[test]
        fn lazy_removes_accessor_and_field() {
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
            design.convert_to_lazy(layout).unwrap();
            design.delete_component(layout).unwrap();
            assert_code(&design, &["class Test extends JPanel {", "Test() {", "}", "}"]);
        }

        #[test]
        fn subtree_goes_with_parent() {
            let mut design = swing(&[
                "class Test extends JPanel {",
                "\tTest() {",
                "\t\tJPanel panel = new JPanel();",
                "\t\tadd(panel);",
                "\t\tJButton button = new JButton();",
                "\t\tpanel.add(button);",
                "\t\tsetEnabled(true);",
                "\t}",
                "}",
            ]);
            let panel = named(&design, "panel");
            let button = named(&design, "button");
            design.delete_component(panel).unwrap();
            assert_code(&design, &["class Test extends JPanel {", "Test() {", "setEnabled(true);", "}", "}"]);
            assert!(design.component(button).is_err());
        }

        #[test]
        fn shared_declaration_keeps_sibling() {
            let mut design = swing(&[
                "class Test extends JPanel {",
                "\tTest() {",
                "\t\tJButton a = new JButton(), b = new JButton();",
                "\t\tadd(a);",
                "\t\tadd(b);",
                "\t}",
                "}",
            ]);
            let a = named(&design, "a");
            design.delete_component(a).unwrap();
            assert_code(
                &design,
                &[
                    "class Test extends JPanel {",
                    "Test() {",
                    "JButton b = new JButton();",
                    "add(b);",
                    "}",
                    "}",
                ],
            );
            assert_eq!(only(&design, "JButton"), named(&design, "b"));
        }

        #[test]
        fn root_cannot_be_deleted() {
            let mut design = swing(EMPTY_CLASS);
            let root = design.root().unwrap();
            let err = design.delete_component(root).unwrap_err();
            assert!(matches!(err, VariableError::IllegalState(_)));
        }
    }
}
