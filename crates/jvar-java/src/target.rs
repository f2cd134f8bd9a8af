// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Insertion and visibility coordinates.

use std::fmt;

use crate::ast::{Ast, NodeId};

/// A position among statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementTarget {
    /// Immediately before a statement.
    Before(NodeId),
    /// Immediately after a statement.
    After(NodeId),
    /// First position inside a block.
    BlockStart(NodeId),
    /// Last position inside a block.
    BlockEnd(NodeId),
}

impl StatementTarget {
    /// The anchor statement, for `Before`/`After`.
    pub fn statement(&self) -> Option<NodeId> {
        match *self {
            StatementTarget::Before(s) | StatementTarget::After(s) => Some(s),
            _ => None,
        }
    }

    /// The anchor node: the statement or the block.
    pub fn node(&self) -> NodeId {
        match *self {
            StatementTarget::Before(n)
            | StatementTarget::After(n)
            | StatementTarget::BlockStart(n)
            | StatementTarget::BlockEnd(n) => n,
        }
    }

    pub fn is_before(&self) -> bool {
        matches!(self, StatementTarget::Before(_) | StatementTarget::BlockStart(_))
    }

    /// Source offset where code inserted at this target would begin.
    pub fn position(&self, ast: &Ast) -> usize {
        match *self {
            StatementTarget::Before(s) => ast.span(s).start,
            StatementTarget::After(s) => ast.span(s).end,
            StatementTarget::BlockStart(b) => ast.span(b).start + 1,
            StatementTarget::BlockEnd(b) => ast.span(b).end.saturating_sub(1),
        }
    }

    /// The same target with the anchor statement replaced.
    pub fn with_statement(&self, statement: NodeId) -> StatementTarget {
        match *self {
            StatementTarget::Before(_) => StatementTarget::Before(statement),
            StatementTarget::After(_) => StatementTarget::After(statement),
            other => other,
        }
    }
}

impl fmt::Display for StatementTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementTarget::Before(n) => write!(f, "before {}", n),
            StatementTarget::After(n) => write!(f, "after {}", n),
            StatementTarget::BlockStart(n) => write!(f, "start of block {}", n),
            StatementTarget::BlockEnd(n) => write!(f, "end of block {}", n),
        }
    }
}

/// A position among the members of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyDeclarationTarget {
    Before(NodeId),
    After(NodeId),
    TypeStart(NodeId),
    TypeEnd(NodeId),
}

impl BodyDeclarationTarget {
    pub fn position(&self, ast: &Ast) -> usize {
        match *self {
            BodyDeclarationTarget::Before(d) => ast.span(d).start,
            BodyDeclarationTarget::After(d) => ast.span(d).end,
            BodyDeclarationTarget::TypeStart(t) => ast
                .type_members(t)
                .first()
                .map_or_else(|| ast.span(t).end.saturating_sub(1), |&m| ast.span(m).start),
            BodyDeclarationTarget::TypeEnd(t) => ast.span(t).end.saturating_sub(1),
        }
    }
}

impl fmt::Display for BodyDeclarationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyDeclarationTarget::Before(n) => write!(f, "before declaration {}", n),
            BodyDeclarationTarget::After(n) => write!(f, "after declaration {}", n),
            BodyDeclarationTarget::TypeStart(n) => write!(f, "start of type {}", n),
            BodyDeclarationTarget::TypeEnd(n) => write!(f, "end of type {}", n),
        }
    }
}

/// Either kind of target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeTarget {
    Statement(StatementTarget),
    BodyDeclaration(BodyDeclarationTarget),
}

impl NodeTarget {
    pub fn position(&self, ast: &Ast) -> usize {
        match self {
            NodeTarget::Statement(t) => t.position(ast),
            NodeTarget::BodyDeclaration(t) => t.position(ast),
        }
    }

    pub fn statement_target(&self) -> Option<StatementTarget> {
        match self {
            NodeTarget::Statement(t) => Some(*t),
            NodeTarget::BodyDeclaration(_) => None,
        }
    }

    /// The node whose enclosing method decides the target's method.
    pub fn anchor(&self) -> NodeId {
        match *self {
            NodeTarget::Statement(t) => t.node(),
            NodeTarget::BodyDeclaration(BodyDeclarationTarget::Before(n))
            | NodeTarget::BodyDeclaration(BodyDeclarationTarget::After(n))
            | NodeTarget::BodyDeclaration(BodyDeclarationTarget::TypeStart(n))
            | NodeTarget::BodyDeclaration(BodyDeclarationTarget::TypeEnd(n)) => n,
        }
    }

    /// The method the target lies in, `None` for body-declaration targets.
    pub fn method(&self, ast: &Ast) -> Option<NodeId> {
        match self {
            NodeTarget::Statement(t) => ast.enclosing_method(t.node()),
            NodeTarget::BodyDeclaration(_) => None,
        }
    }
}

impl From<StatementTarget> for NodeTarget {
    fn from(target: StatementTarget) -> Self {
        NodeTarget::Statement(target)
    }
}

impl From<BodyDeclarationTarget> for NodeTarget {
    fn from(target: BodyDeclarationTarget) -> Self {
        NodeTarget::BodyDeclaration(target)
    }
}

impl fmt::Display for NodeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeTarget::Statement(t) => t.fmt(f),
            NodeTarget::BodyDeclaration(t) => t.fmt(f),
        }
    }
}
