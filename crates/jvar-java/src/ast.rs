// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Arena syntax tree with stable node identities.
//!
//! Nodes are never freed: a node removed from the tree is only detached (its parent link
//! is cleared and its parent no longer lists it). Detached nodes keep their ids and spans,
//! which lets callers move a subtree to a new location without changing its identity.

use std::fmt;

use jvar_core::Span;
use serde::Serialize;

use crate::syntax::{NodeKind, Syntax};

/// Identity of a node in an [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind<NodeId>,
    pub span: Span,
    pub parent: Option<NodeId>,
}

/// The tree of one compilation unit.
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Ast {
    /// Lower a parsed compilation unit into an arena.
    pub fn from_syntax(unit: Syntax) -> Self {
        let mut ast = Ast {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        ast.root = ast.lower(unit, 0);
        ast
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind<NodeId> {
        &self.node(id).kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id).children().into_iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `id` and all of its descendants in pre-order (source order).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            let mut children = self.children(next);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Ancestors of `id`, starting with `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&n| self.parent(n))
    }

    /// Check if `ancestor` is `node` or one of its ancestors.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|n| n == ancestor)
    }

    /// Check if `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// Reachability of every node from the root, indexed by node id.
    pub(crate) fn attached_mask(&self) -> Vec<bool> {
        let mut mask = vec![false; self.nodes.len()];
        for id in self.descendants(self.root) {
            mask[id.0 as usize] = true;
        }
        mask
    }

    /// The identifier of a `Name` node.
    pub fn identifier(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Name { identifier } => Some(identifier),
            _ => None,
        }
    }

    // ========================================================================
    // Structural queries
    // ========================================================================

    /// The nearest node (including `id`) matching `pred`.
    pub fn enclosing(&self, id: NodeId, pred: impl Fn(&NodeKind<NodeId>) -> bool) -> Option<NodeId> {
        self.ancestors(id).find(|&n| pred(self.kind(n)))
    }

    pub fn enclosing_statement(&self, id: NodeId) -> Option<NodeId> {
        self.enclosing(id, |k| k.is_statement())
    }

    pub fn enclosing_block(&self, id: NodeId) -> Option<NodeId> {
        self.enclosing(id, |k| matches!(k, NodeKind::Block { .. }))
    }

    pub fn enclosing_method(&self, id: NodeId) -> Option<NodeId> {
        self.enclosing(id, |k| matches!(k, NodeKind::MethodDeclaration { .. }))
    }

    pub fn enclosing_type(&self, id: NodeId) -> Option<NodeId> {
        self.enclosing(id, |k| matches!(k, NodeKind::TypeDeclaration { .. }))
    }

    pub fn enclosing_field_declaration(&self, id: NodeId) -> Option<NodeId> {
        self.enclosing(id, |k| matches!(k, NodeKind::FieldDeclaration { .. }))
    }

    /// The statements of a `Block`, empty for any other node.
    pub fn block_statements(&self, block: NodeId) -> &[NodeId] {
        match self.kind(block) {
            NodeKind::Block { statements } => statements,
            _ => &[],
        }
    }

    /// The members of a type declaration, empty for any other node.
    pub fn type_members(&self, ty: NodeId) -> &[NodeId] {
        match self.kind(ty) {
            NodeKind::TypeDeclaration { members, .. } => members,
            _ => &[],
        }
    }

    /// Top-level type declarations.
    pub fn types(&self) -> &[NodeId] {
        match self.kind(self.root) {
            NodeKind::CompilationUnit { types, .. } => types,
            _ => &[],
        }
    }

    pub fn imports(&self) -> &[NodeId] {
        match self.kind(self.root) {
            NodeKind::CompilationUnit { imports, .. } => imports,
            _ => &[],
        }
    }

    pub fn package(&self) -> Option<&str> {
        match self.kind(self.root) {
            NodeKind::CompilationUnit { package, .. } => package.as_deref(),
            _ => None,
        }
    }

    /// The child of `block` that contains `node`, if `node` lies inside `block`.
    pub fn statement_within_block(&self, block: NodeId, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            if parent == block {
                return Some(current);
            }
            current = parent;
        }
        None
    }

    /// The innermost block containing both nodes.
    pub fn common_block(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        self.ancestors(a)
            .filter(|&n| matches!(self.kind(n), NodeKind::Block { .. }))
            .find(|&block| self.contains(block, b))
    }

    /// Position of `child` in its parent block or type body.
    pub fn index_in_parent(&self, child: NodeId) -> Option<usize> {
        let parent = self.parent(child)?;
        match self.kind(parent) {
            NodeKind::Block { statements } => statements.iter().position(|&s| s == child),
            NodeKind::TypeDeclaration { members, .. } => members.iter().position(|&m| m == child),
            _ => None,
        }
    }

    /// The name identifier of a method declaration.
    pub fn method_name(&self, method: NodeId) -> Option<&str> {
        match self.kind(method) {
            NodeKind::MethodDeclaration { name, .. } => self.identifier(*name),
            _ => None,
        }
    }

    pub fn method_parameters(&self, method: NodeId) -> &[NodeId] {
        match self.kind(method) {
            NodeKind::MethodDeclaration { parameters, .. } => parameters,
            _ => &[],
        }
    }

    pub fn method_body(&self, method: NodeId) -> Option<NodeId> {
        match self.kind(method) {
            NodeKind::MethodDeclaration { body, .. } => *body,
            _ => None,
        }
    }

    pub fn is_constructor(&self, method: NodeId) -> bool {
        matches!(
            self.kind(method),
            NodeKind::MethodDeclaration {
                return_type: None,
                ..
            }
        )
    }

    pub fn is_static_method(&self, method: NodeId) -> bool {
        matches!(self.kind(method), NodeKind::MethodDeclaration { modifiers, .. } if modifiers.is_static())
    }

    /// Methods (and constructors) declared directly in `ty`.
    pub fn methods(&self, ty: NodeId) -> Vec<NodeId> {
        self.type_members(ty)
            .iter()
            .copied()
            .filter(|&m| matches!(self.kind(m), NodeKind::MethodDeclaration { .. }))
            .collect()
    }

    /// Field declarations declared directly in `ty`.
    pub fn fields(&self, ty: NodeId) -> Vec<NodeId> {
        self.type_members(ty)
            .iter()
            .copied()
            .filter(|&m| matches!(self.kind(m), NodeKind::FieldDeclaration { .. }))
            .collect()
    }

    /// The first method of `ty` named `name` taking `arity` parameters.
    pub fn find_method(&self, ty: NodeId, name: &str, arity: usize) -> Option<NodeId> {
        self.methods(ty).into_iter().find(|&m| {
            self.method_name(m) == Some(name) && self.method_parameters(m).len() == arity
        })
    }

    /// The fragments of a local or field declaration.
    pub fn fragments(&self, declaration: NodeId) -> &[NodeId] {
        match self.kind(declaration) {
            NodeKind::LocalDeclaration { fragments, .. } | NodeKind::FieldDeclaration { fragments, .. } => fragments,
            _ => &[],
        }
    }

    /// The declared type node of a local, field or parameter declaration.
    pub fn declared_type(&self, declaration: NodeId) -> Option<NodeId> {
        match self.kind(declaration) {
            NodeKind::LocalDeclaration { ty, .. }
            | NodeKind::FieldDeclaration { ty, .. }
            | NodeKind::Parameter { ty, .. } => Some(*ty),
            _ => None,
        }
    }

    /// Strip any enclosing parentheses from an expression.
    pub fn unparenthesized(&self, mut id: NodeId) -> NodeId {
        while let NodeKind::Parenthesized { expression } = self.kind(id) {
            id = *expression;
        }
        id
    }

    // ========================================================================
    // Mutation (crate-internal, driven by the editor)
    // ========================================================================

    /// Lower an owned syntax tree into the arena, offsetting spans by `base`.
    pub(crate) fn lower(&mut self, syntax: Syntax, base: usize) -> NodeId {
        let span = syntax.span.offset_by(base);
        let kind = syntax.kind.map(|child| self.lower(*child, base));
        let id = NodeId(self.nodes.len() as u32);
        for child in kind.children() {
            self.nodes[child.0 as usize].parent = Some(id);
        }
        self.nodes.push(Node {
            kind,
            span,
            parent: None,
        });
        id
    }

    /// Create a detached node from an already-lowered kind, adopting its children.
    pub(crate) fn alloc(&mut self, kind: NodeKind<NodeId>, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for child in kind.children() {
            self.nodes[child.0 as usize].parent = Some(id);
        }
        self.nodes.push(Node {
            kind,
            span,
            parent: None,
        });
        id
    }

    pub(crate) fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind<NodeId> {
        &mut self.nodes[id.0 as usize].kind
    }

    pub(crate) fn set_span(&mut self, id: NodeId, span: Span) {
        self.nodes[id.0 as usize].span = span;
    }

    pub(crate) fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        self.nodes[id.0 as usize].parent = parent;
    }

    pub(crate) fn set_identifier(&mut self, id: NodeId, new_identifier: &str) {
        if let NodeKind::Name { identifier } = self.kind_mut(id) {
            *identifier = new_identifier.to_string();
        }
    }

    /// Put `new` into the child slot of `old`'s parent and detach `old`.
    pub(crate) fn replace_child(&mut self, old: NodeId, new: NodeId) -> bool {
        let Some(parent) = self.parent(old) else {
            return false;
        };
        let mut replaced = false;
        for slot in self.kind_mut(parent).children_mut() {
            if *slot == old {
                *slot = new;
                replaced = true;
            }
        }
        if replaced {
            self.set_parent(old, None);
            self.set_parent(new, Some(parent));
        }
        replaced
    }

    /// Remove `child` from the list it lives in (block statements, type members,
    /// declaration fragments, imports) and detach it.
    pub(crate) fn remove_from_list(&mut self, child: NodeId) -> bool {
        let Some(parent) = self.parent(child) else {
            return false;
        };
        let list = match self.kind_mut(parent) {
            NodeKind::Block { statements } => statements,
            NodeKind::TypeDeclaration { members, .. } => members,
            NodeKind::LocalDeclaration { fragments, .. } | NodeKind::FieldDeclaration { fragments, .. } => fragments,
            NodeKind::CompilationUnit { imports, .. } if imports.contains(&child) => imports,
            _ => return false,
        };
        let before = list.len();
        list.retain(|&c| c != child);
        let removed = list.len() != before;
        if removed {
            self.set_parent(child, None);
        }
        removed
    }

    /// Insert `child` into the statement list of `block` at `index`.
    pub(crate) fn insert_statement(&mut self, block: NodeId, index: usize, child: NodeId) {
        if let NodeKind::Block { statements } = self.kind_mut(block) {
            let index = index.min(statements.len());
            statements.insert(index, child);
            self.set_parent(child, Some(block));
        }
    }

    /// Insert `child` into the members of type `ty` at `index`.
    pub(crate) fn insert_member(&mut self, ty: NodeId, index: usize, child: NodeId) {
        if let NodeKind::TypeDeclaration { members, .. } = self.kind_mut(ty) {
            let index = index.min(members.len());
            members.insert(index, child);
            self.set_parent(child, Some(ty));
        }
    }

    pub(crate) fn push_import(&mut self, import: NodeId) {
        let root = self.root;
        if let NodeKind::CompilationUnit { imports, .. } = self.kind_mut(root) {
            imports.push(import);
            self.set_parent(import, Some(root));
        }
    }

    /// Shift or resize the spans of attached nodes after a text edit.
    pub(crate) fn adjust_spans(&mut self, pos: usize, removed: usize, inserted: usize) {
        let mask = self.attached_mask();
        for (node, attached) in self.nodes.iter_mut().zip(mask) {
            if attached {
                node.span.adjust(pos, removed, inserted);
            }
        }
    }

    /// Overwrite the spans of the subtree at `id` with those of `fresh`, a re-parse of the
    /// same subtree's new text placed at `base`. The shapes must agree.
    pub(crate) fn respan(&mut self, id: NodeId, fresh: &Syntax, base: usize) -> bool {
        let children = self.children(id);
        let fresh_children = fresh.kind.children();
        if children.len() != fresh_children.len() {
            return false;
        }
        self.nodes[id.0 as usize].span = fresh.span.offset_by(base);
        children
            .into_iter()
            .zip(fresh_children)
            .all(|(child, fresh_child)| self.respan(child, fresh_child, base))
    }

    /// Copy the spans of the subtree at `fresh` onto the same-shaped subtree at `id`.
    pub(crate) fn respan_from(&mut self, id: NodeId, fresh: NodeId) -> bool {
        let children = self.children(id);
        let fresh_children = self.children(fresh);
        if children.len() != fresh_children.len() {
            return false;
        }
        self.nodes[id.0 as usize].span = self.span(fresh);
        children
            .into_iter()
            .zip(fresh_children)
            .all(|(child, fresh_child)| self.respan_from(child, fresh_child))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_compilation_unit;

    const SOURCE: &str = "class Test {\n  public Test() {\n    JButton button = new JButton();\n    {\n      add(button);\n    }\n  }\n}";

    fn ast() -> Ast {
        Ast::from_syntax(parse_compilation_unit(SOURCE).unwrap())
    }

    fn find_name(ast: &Ast, identifier: &str) -> Vec<NodeId> {
        ast.descendants(ast.root())
            .into_iter()
            .filter(|&n| ast.identifier(n) == Some(identifier))
            .collect()
    }

    #[test]
    fn parents_are_linked() {
        let ast = ast();
        for id in ast.descendants(ast.root()) {
            for child in ast.children(id) {
                assert_eq!(ast.parent(child), Some(id));
            }
        }
        assert!(ast.parent(ast.root()).is_none());
    }

    #[test]
    fn enclosing_queries() {
        let ast = ast();
        let uses = find_name(&ast, "button");
        assert_eq!(uses.len(), 2);
        let statement = ast.enclosing_statement(uses[1]).unwrap();
        assert_eq!(&SOURCE[ast.span(statement).start..ast.span(statement).end], "add(button);");
        let method = ast.enclosing_method(uses[1]).unwrap();
        assert!(ast.is_constructor(method));
        assert_eq!(ast.enclosing_type(method), ast.types().first().copied());
    }

    #[test]
    fn common_block_and_statement_within_block() {
        let ast = ast();
        let uses = find_name(&ast, "button");
        let body = ast.method_body(ast.enclosing_method(uses[0]).unwrap()).unwrap();
        assert_eq!(ast.common_block(uses[0], uses[1]), Some(body));
        let inner = ast.statement_within_block(body, uses[1]).unwrap();
        assert_eq!(ast.index_in_parent(inner), Some(1));
        assert_eq!(ast.statement_within_block(body, body), None);
    }

    #[test]
    fn detach_keeps_identity() {
        let mut ast = ast();
        let uses = find_name(&ast, "button");
        let statement = ast.enclosing_statement(uses[1]).unwrap();
        assert!(ast.remove_from_list(statement));
        assert!(!ast.is_attached(statement));
        assert!(!ast.is_attached(uses[1]));
        assert!(ast.is_attached(uses[0]));
        assert_eq!(ast.identifier(uses[1]), Some("button"));
    }
}
