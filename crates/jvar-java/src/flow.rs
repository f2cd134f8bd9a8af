// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Name resolution, visibility and execution-flow ordering.
//!
//! Resolution is purely lexical: a simple name binds to the nearest local declared
//! earlier in an enclosing block, then to a parameter of the enclosing method or catch
//! clause, then to a field of an enclosing type. Bindings are represented by the
//! declaring name node.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::ast::{Ast, NodeId};
use crate::syntax::NodeKind;

/// What kind of declaration a declaring name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Field,
    Local,
    Parameter,
}

/// A declaring name and its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Declaration {
    pub name: NodeId,
    pub kind: DeclarationKind,
}

/// The kind of declaration `name` declares, if it is a declaring name.
pub fn declaration_kind(ast: &Ast, name: NodeId) -> Option<DeclarationKind> {
    let parent = ast.parent(name)?;
    match ast.kind(parent) {
        NodeKind::Fragment { name: n, .. } if *n == name => match ast.kind(ast.parent(parent)?) {
            NodeKind::LocalDeclaration { .. } => Some(DeclarationKind::Local),
            NodeKind::FieldDeclaration { .. } => Some(DeclarationKind::Field),
            _ => None,
        },
        NodeKind::Parameter { name: n, .. } if *n == name => Some(DeclarationKind::Parameter),
        _ => None,
    }
}

/// The fragment or parameter node owning a declaring name.
pub fn declaration_node(ast: &Ast, name: NodeId) -> Option<NodeId> {
    declaration_kind(ast, name).and_then(|_| ast.parent(name))
}

/// The local or field declaration statement/member owning a declaring name.
pub fn declaration_statement(ast: &Ast, name: NodeId) -> Option<NodeId> {
    match declaration_kind(ast, name)? {
        DeclarationKind::Parameter => ast.parent(name),
        _ => ast.parent(ast.parent(name)?),
    }
}

fn declared_in_fragments(ast: &Ast, fragments: &[NodeId], identifier: &str) -> Option<NodeId> {
    fragments.iter().find_map(|&f| match ast.kind(f) {
        NodeKind::Fragment { name, .. } if ast.identifier(*name) == Some(identifier) => Some(*name),
        _ => None,
    })
}

fn parameter_named(ast: &Ast, parameters: &[NodeId], identifier: &str) -> Option<NodeId> {
    parameters.iter().find_map(|&p| match ast.kind(p) {
        NodeKind::Parameter { name, .. } if ast.identifier(*name) == Some(identifier) => Some(*name),
        _ => None,
    })
}

fn field_in_members(ast: &Ast, members: &[NodeId], identifier: &str) -> Option<NodeId> {
    members.iter().find_map(|&m| match ast.kind(m) {
        NodeKind::FieldDeclaration { fragments, .. } => declared_in_fragments(ast, fragments, identifier),
        _ => None,
    })
}

/// Check if `name` is a simple name used as a value (not a method, type or member name).
pub fn is_reference(ast: &Ast, name: NodeId) -> bool {
    if ast.identifier(name).is_none() || declaration_kind(ast, name).is_some() {
        return false;
    }
    let Some(parent) = ast.parent(name) else {
        return false;
    };
    match ast.kind(parent) {
        NodeKind::MethodCall { name: n, .. } => *n != name,
        NodeKind::FieldAccess { target, name: n } if *n == name => {
            matches!(ast.kind(*target), NodeKind::This)
        }
        NodeKind::MethodDeclaration { .. } | NodeKind::TypeDeclaration { .. } => false,
        _ => true,
    }
}

/// Resolve a simple name to its declaring name node.
pub fn resolve(ast: &Ast, name: NodeId) -> Option<NodeId> {
    if declaration_kind(ast, name).is_some() {
        return Some(name);
    }
    if !is_reference(ast, name) {
        return None;
    }
    let identifier = ast.identifier(name)?;
    let parent = ast.parent(name)?;
    if matches!(ast.kind(parent), NodeKind::FieldAccess { name: n, .. } if *n == name) {
        let ty = ast.enclosing_type(parent)?;
        return field_in_members(ast, ast.type_members(ty), identifier);
    }

    let mut child = name;
    for ancestor in ast.ancestors(name).skip(1) {
        let found = match ast.kind(ancestor) {
            NodeKind::Block { statements } => {
                let index = statements.iter().position(|&s| s == child).unwrap_or(0);
                statements[..index].iter().rev().find_map(|&s| match ast.kind(s) {
                    NodeKind::LocalDeclaration { fragments, .. } => declared_in_fragments(ast, fragments, identifier),
                    _ => None,
                })
            }
            NodeKind::LocalDeclaration { fragments, .. } => {
                // earlier fragments of the same declaration
                let index = fragments.iter().position(|&f| f == child).unwrap_or(0);
                declared_in_fragments(ast, &fragments[..index], identifier)
            }
            NodeKind::MethodDeclaration { parameters, .. } => parameter_named(ast, parameters, identifier),
            NodeKind::CatchClause { parameter, .. } => parameter_named(ast, &[*parameter], identifier),
            NodeKind::TypeDeclaration { members, .. } => field_in_members(ast, members, identifier),
            NodeKind::New {
                body: Some(members), ..
            } if members.contains(&child) => field_in_members(ast, members, identifier),
            _ => None,
        };
        if found.is_some() {
            return found;
        }
        child = ancestor;
    }
    None
}

/// The kind of the declaration `name` resolves to.
pub fn resolved_kind(ast: &Ast, name: NodeId) -> Option<DeclarationKind> {
    resolve(ast, name).and_then(|d| declaration_kind(ast, d))
}

/// The subtree in which references to `declaration` can occur.
fn reference_scope(ast: &Ast, declaration: NodeId) -> NodeId {
    let scope = match declaration_kind(ast, declaration) {
        Some(DeclarationKind::Field) => ast.enclosing_type(declaration),
        Some(DeclarationKind::Parameter) => ast
            .enclosing(declaration, |k| {
                matches!(k, NodeKind::MethodDeclaration { .. } | NodeKind::CatchClause { .. })
            }),
        _ => ast.enclosing_block(declaration),
    };
    scope.unwrap_or_else(|| ast.root())
}

/// Every name resolving to `declaration`, the declaring name included, in source order.
pub fn references(ast: &Ast, declaration: NodeId) -> Vec<NodeId> {
    let Some(identifier) = ast.identifier(declaration) else {
        return Vec::new();
    };
    ast.descendants(reference_scope(ast, declaration))
        .into_iter()
        .filter(|&n| ast.identifier(n) == Some(identifier))
        .filter(|&n| resolve(ast, n) == Some(declaration))
        .collect()
}

/// The variable name written by an assignment's left side, if any.
pub fn assigned_name(ast: &Ast, left: NodeId) -> Option<NodeId> {
    let left = ast.unparenthesized(left);
    match ast.kind(left) {
        NodeKind::Name { .. } => Some(left),
        NodeKind::FieldAccess { target, name } if matches!(ast.kind(*target), NodeKind::This) => Some(*name),
        _ => None,
    }
}

/// Every write to `declaration`: the initialized fragment and `Assignment` nodes, in
/// source order.
pub fn assignments(ast: &Ast, declaration: NodeId) -> Vec<NodeId> {
    ast.descendants(reference_scope(ast, declaration))
        .into_iter()
        .filter(|&n| match ast.kind(n) {
            NodeKind::Fragment {
                name,
                initializer: Some(_),
            } => *name == declaration,
            NodeKind::Assignment { left, .. } => {
                assigned_name(ast, *left).and_then(|name| resolve(ast, name)) == Some(declaration)
            }
            _ => false,
        })
        .collect()
}

/// The deepest node whose span strictly contains `position`.
fn innermost_at(ast: &Ast, position: usize) -> NodeId {
    let mut current = ast.root();
    'descend: loop {
        for child in ast.children(current) {
            let span = ast.span(child);
            if span.start < position && position < span.end {
                current = child;
                continue 'descend;
            }
        }
        return current;
    }
}

fn local_declarations_in(ast: &Ast, statement: NodeId) -> Vec<NodeId> {
    match ast.kind(statement) {
        NodeKind::LocalDeclaration { fragments, .. } => fragments
            .iter()
            .filter_map(|&f| match ast.kind(f) {
                NodeKind::Fragment { name, .. } => Some(*name),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn declaration(ast: &Ast, name: NodeId) -> Option<Declaration> {
    declaration_kind(ast, name).map(|kind| Declaration { name, kind })
}

/// Declarations visible at `position`.
pub fn visible_declarations(ast: &Ast, position: usize) -> Vec<Declaration> {
    let mut names = Vec::new();
    for ancestor in ast.ancestors(innermost_at(ast, position)) {
        match ast.kind(ancestor) {
            NodeKind::Block { statements } => {
                for &statement in statements {
                    if ast.span(statement).end <= position {
                        names.extend(local_declarations_in(ast, statement));
                    }
                }
            }
            NodeKind::MethodDeclaration { parameters, .. } => {
                names.extend(parameters.iter().filter_map(|&p| match ast.kind(p) {
                    NodeKind::Parameter { name, .. } => Some(*name),
                    _ => None,
                }));
            }
            NodeKind::CatchClause { parameter, .. } => {
                if let NodeKind::Parameter { name, .. } = ast.kind(*parameter) {
                    names.push(*name);
                }
            }
            NodeKind::TypeDeclaration { members, .. } | NodeKind::New { body: Some(members), .. } => {
                for &member in members {
                    if let NodeKind::FieldDeclaration { fragments, .. } = ast.kind(member) {
                        names.extend(fragments.iter().filter_map(|&f| match ast.kind(f) {
                            NodeKind::Fragment { name, .. } => Some(*name),
                            _ => None,
                        }));
                    }
                }
            }
            _ => {}
        }
    }
    names.into_iter().filter_map(|n| declaration(ast, n)).collect()
}

/// Local and parameter declarations that a new declaration at `position` would shadow
/// or collide with.
///
/// Inside a method these are the declarations in the rest of the innermost block. At type
/// level they are all locals and parameters of the type.
pub fn declarations_after(ast: &Ast, position: usize) -> Vec<Declaration> {
    let container = innermost_at(ast, position);
    let in_method = ast.enclosing_method(container).is_some();
    let scope_nodes: Vec<NodeId> = if in_method {
        match ast.enclosing_block(container) {
            Some(block) => ast
                .block_statements(block)
                .iter()
                .copied()
                .filter(|&s| ast.span(s).start >= position)
                .flat_map(|s| ast.descendants(s))
                .collect(),
            None => Vec::new(),
        }
    } else {
        match ast.enclosing_type(container) {
            Some(ty) => ast
                .methods(ty)
                .into_iter()
                .flat_map(|m| ast.descendants(m))
                .collect(),
            None => Vec::new(),
        }
    };
    scope_nodes
        .into_iter()
        .filter_map(|n| declaration(ast, n))
        .filter(|d| d.kind != DeclarationKind::Field)
        .collect()
}

/// Check if `first` comes before `second` (or in the same statement, when `or_equal`)
/// inside their smallest common block.
///
/// A node that is the common block itself counts as index `-1`.
pub fn is_ordered_in_block(ast: &Ast, first: NodeId, second: NodeId, or_equal: bool) -> bool {
    let Some(block) = ast.common_block(first, second) else {
        return false;
    };
    let index = |n: NodeId| -> isize {
        ast.statement_within_block(block, n)
            .and_then(|s| ast.index_in_parent(s))
            .map_or(-1, |i| i as isize)
    };
    let (i1, i2) = (index(first), index(second));
    if or_equal {
        i1 <= i2
    } else {
        i1 < i2
    }
}

/// Check if code at `node` runs without an instance (static method or static field).
pub fn is_static_context(ast: &Ast, node: NodeId) -> bool {
    if let Some(method) = ast.enclosing_method(node) {
        return ast.is_static_method(method);
    }
    match ast.enclosing_field_declaration(node).map(|f| ast.kind(f)) {
        Some(NodeKind::FieldDeclaration { modifiers, .. }) => modifiers.is_static(),
        _ => false,
    }
}

/// The expressions that belong to `statement` itself: descendants that are not inside a
/// nested statement or an anonymous class body. Source order.
pub fn statement_expressions(ast: &Ast, statement: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack: Vec<NodeId> = ast.children(statement).into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        let kind = ast.kind(node);
        if kind.is_statement() || kind.is_body_declaration() {
            continue;
        }
        out.push(node);
        let mut children = ast.children(node);
        children.reverse();
        stack.extend(children);
    }
    out
}

// ============================================================================
// FlowDescription
// ============================================================================

/// The execution flow of a type: entry methods and everything they reach through
/// invocations of methods of the same type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowDescription {
    entries: Vec<NodeId>,
}

impl FlowDescription {
    pub fn new(entries: Vec<NodeId>) -> Self {
        FlowDescription { entries }
    }

    /// Entry points of `ty`: its constructors plus methods named in `entry_methods`, or
    /// `main` when neither exists.
    pub fn detect(ast: &Ast, ty: NodeId, entry_methods: &[String]) -> Self {
        let methods = ast.methods(ty);
        let mut entries: Vec<NodeId> = methods.iter().copied().filter(|&m| ast.is_constructor(m)).collect();
        entries.extend(methods.iter().copied().filter(|&m| {
            !ast.is_constructor(m)
                && ast
                    .method_name(m)
                    .is_some_and(|name| entry_methods.iter().any(|e| e == name))
        }));
        if entries.is_empty() {
            entries.extend(
                methods
                    .iter()
                    .copied()
                    .filter(|&m| ast.method_name(m) == Some("main") && ast.is_static_method(m)),
            );
        }
        FlowDescription { entries }
    }

    pub fn entries(&self) -> &[NodeId] {
        &self.entries
    }

    /// Statements in execution order. Invoked methods of the same type are visited
    /// once, right after the statement invoking them.
    pub fn statements(&self, ast: &Ast) -> Vec<NodeId> {
        let mut walker = FlowWalker {
            ast,
            visited: HashSet::new(),
            statements: Vec::new(),
            methods: Vec::new(),
        };
        for &entry in &self.entries {
            walker.visit_method(entry);
        }
        walker.statements
    }

    /// Methods reached by the flow, in visiting order.
    pub fn methods(&self, ast: &Ast) -> Vec<NodeId> {
        let mut walker = FlowWalker {
            ast,
            visited: HashSet::new(),
            statements: Vec::new(),
            methods: Vec::new(),
        };
        for &entry in &self.entries {
            walker.visit_method(entry);
        }
        walker.methods
    }

    /// Sort nodes by the flow order of their enclosing statements, then by position.
    /// Nodes outside the flow come last.
    pub fn sort(&self, ast: &Ast, nodes: &mut [NodeId]) {
        let order: HashMap<NodeId, usize> = self
            .statements(ast)
            .into_iter()
            .enumerate()
            .map(|(i, s)| (s, i))
            .collect();
        nodes.sort_by_key(|&n| {
            let index = ast
                .enclosing_statement(n)
                .and_then(|s| order.get(&s).copied())
                .unwrap_or(usize::MAX);
            (index, ast.span(n).start)
        });
    }
}

struct FlowWalker<'a> {
    ast: &'a Ast,
    visited: HashSet<NodeId>,
    statements: Vec<NodeId>,
    methods: Vec<NodeId>,
}

impl FlowWalker<'_> {
    fn visit_method(&mut self, method: NodeId) {
        if !self.visited.insert(method) {
            return;
        }
        self.methods.push(method);
        if let Some(body) = self.ast.method_body(method) {
            self.visit_statement(body);
        }
    }

    fn visit_statement(&mut self, statement: NodeId) {
        let ast = self.ast;
        self.statements.push(statement);
        for expression in statement_expressions(ast, statement) {
            if let NodeKind::MethodCall {
                target,
                name,
                arguments,
            } = ast.kind(expression)
            {
                let local = match target {
                    None => true,
                    Some(t) => matches!(ast.kind(*t), NodeKind::This),
                };
                let invoked = ast.identifier(*name).zip(ast.enclosing_type(expression));
                if let (true, Some((name, ty))) = (local, invoked) {
                    if let Some(method) = ast.find_method(ty, name, arguments.len()) {
                        self.visit_method(method);
                    }
                }
            }
        }
        for child in ast.children(statement) {
            match ast.kind(child) {
                kind if kind.is_statement() => self.visit_statement(child),
                NodeKind::CatchClause { body, .. } => self.visit_statement(*body),
                _ => {}
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_compilation_unit;

    fn parse(source: &str) -> Ast {
        Ast::from_syntax(parse_compilation_unit(source).unwrap())
    }

    fn names(ast: &Ast, identifier: &str) -> Vec<NodeId> {
        ast.descendants(ast.root())
            .into_iter()
            .filter(|&n| ast.identifier(n) == Some(identifier))
            .collect()
    }

    fn position_of(source: &str, needle: &str) -> usize {
        source.find(needle).unwrap()
    }

    mod resolution {
        use super::*;

        #[test]
        fn local_shadows_field() {
            let source = "class Test {\n  JButton button;\n  void a() {\n    JButton button = null;\n    button.setText(null);\n  }\n  void b() {\n    button.setText(null);\n  }\n}";
            let ast = parse(source);
            let all = names(&ast, "button");
            // field decl, local decl, use in a(), use in b()
            assert_eq!(all.len(), 4);
            assert_eq!(resolve(&ast, all[2]), Some(all[1]));
            assert_eq!(resolve(&ast, all[3]), Some(all[0]));
            assert_eq!(declaration_kind(&ast, all[0]), Some(DeclarationKind::Field));
            assert_eq!(declaration_kind(&ast, all[1]), Some(DeclarationKind::Local));
            assert_eq!(references(&ast, all[0]), vec![all[0], all[3]]);
        }

        #[test]
        fn this_field_access_resolves_to_field() {
            let source = "class Test {\n  JButton button;\n  Test() {\n    this.button = new JButton();\n  }\n}";
            let ast = parse(source);
            let all = names(&ast, "button");
            assert_eq!(resolve(&ast, all[1]), Some(all[0]));
            assert_eq!(assignments(&ast, all[0]).len(), 1);
        }

        #[test]
        fn method_names_are_not_references() {
            let source = "class Test {\n  void add() {\n    add();\n  }\n}";
            let ast = parse(source);
            let all = names(&ast, "add");
            assert!(all.iter().all(|&n| !is_reference(&ast, n)));
        }

        #[test]
        fn parameters_and_reuse_assignments() {
            let source = "class Test {\n  void a(JPanel parent) {\n    JButton b = new JButton();\n    parent.add(b);\n    b = new JButton();\n    parent.add(b);\n  }\n}";
            let ast = parse(source);
            let parent = names(&ast, "parent");
            assert_eq!(declaration_kind(&ast, parent[0]), Some(DeclarationKind::Parameter));
            assert_eq!(references(&ast, parent[0]).len(), 3);
            let b = names(&ast, "b");
            assert_eq!(assignments(&ast, b[0]).len(), 2);
        }
    }

    mod visibility {
        use super::*;

        #[test]
        fn visible_and_after_sets() {
            let source = "class Test {\n  JPanel panel;\n  void a(int x) {\n    JButton first = null;\n    foo();\n    JButton second = null;\n    {\n      JButton nested = null;\n    }\n  }\n}";
            let ast = parse(source);
            let position = position_of(source, "foo();");
            let visible: Vec<&str> = visible_declarations(&ast, position)
                .iter()
                .filter_map(|d| ast.identifier(d.name))
                .collect();
            assert!(visible.contains(&"first"));
            assert!(visible.contains(&"x"));
            assert!(visible.contains(&"panel"));
            assert!(!visible.contains(&"second"));
            let after: Vec<&str> = declarations_after(&ast, position)
                .iter()
                .filter_map(|d| ast.identifier(d.name))
                .collect();
            assert_eq!(after, vec!["second", "nested"]);
        }

        #[test]
        fn type_level_after_set_holds_all_locals() {
            let source = "class Test {\n  JPanel panel;\n  void a(int x) {\n    JButton first = null;\n  }\n}";
            let ast = parse(source);
            let position = position_of(source, "JPanel panel;");
            let after: Vec<&str> = declarations_after(&ast, position)
                .iter()
                .filter_map(|d| ast.identifier(d.name))
                .collect();
            assert_eq!(after, vec!["x", "first"]);
        }

        #[test]
        fn ordering_in_common_block() {
            let source = "class Test {\n  void a() {\n    JButton b = null;\n    foo(b);\n  }\n}";
            let ast = parse(source);
            let b = names(&ast, "b");
            assert!(is_ordered_in_block(&ast, b[0], b[1], false));
            assert!(!is_ordered_in_block(&ast, b[1], b[0], true));
            let body = ast.enclosing_block(b[0]).unwrap();
            assert!(!is_ordered_in_block(&ast, b[0], body, true));
        }

        #[test]
        fn static_context() {
            let source = "class Test {\n  static void main(String[] args) {\n    foo();\n  }\n  void bar() {\n    foo();\n  }\n}";
            let ast = parse(source);
            let foo = names(&ast, "foo");
            assert!(is_static_context(&ast, foo[0]));
            assert!(!is_static_context(&ast, foo[1]));
        }
    }

    mod flow {
        use super::*;

        #[test]
        fn constructor_flow_follows_local_invocations() {
            let source = "class Test {\n  Test() {\n    init();\n    done();\n  }\n  void init() {\n    a();\n  }\n  void unused() {\n    b();\n  }\n}";
            let ast = parse(source);
            let ty = ast.types()[0];
            let flow = FlowDescription::detect(&ast, ty, &[]);
            assert_eq!(flow.entries().len(), 1);
            let methods: Vec<&str> = flow
                .methods(&ast)
                .into_iter()
                .filter_map(|m| ast.method_name(m))
                .collect();
            assert_eq!(methods, vec!["Test", "init"]);
            let text: Vec<&str> = flow
                .statements(&ast)
                .into_iter()
                .filter(|&s| !matches!(ast.kind(s), NodeKind::Block { .. }))
                .map(|s| &source[ast.span(s).start..ast.span(s).end])
                .collect();
            assert_eq!(text, vec!["init();", "a();", "done();"]);
        }

        #[test]
        fn main_is_entry_without_constructor() {
            let source = "class Test {\n  public static void main(String[] args) {\n  }\n}";
            let ast = parse(source);
            let flow = FlowDescription::detect(&ast, ast.types()[0], &[]);
            assert_eq!(flow.entries().len(), 1);
        }

        #[test]
        fn sort_uses_flow_order() {
            let source = "class Test {\n  Test() {\n    init();\n    x.second();\n  }\n  void init() {\n    x.first();\n  }\n}";
            let ast = parse(source);
            let flow = FlowDescription::detect(&ast, ast.types()[0], &[]);
            let mut calls = vec![names(&ast, "second")[0], names(&ast, "first")[0]];
            flow.sort(&ast, &mut calls);
            assert_eq!(ast.identifier(calls[0]), Some("first"));
        }
    }
}
