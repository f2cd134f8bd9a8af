// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The source editor: one owner for the text of a compilation unit and its tree.
//!
//! Every operation edits the text and the tree together. Text edits shift the spans of
//! attached nodes, new code is parsed and lowered at its final offset, and nodes that
//! survive a rewrite (a moved statement, an initializer turned into a declaration) keep
//! their ids and only receive fresh spans.

use jvar_core::text;
use jvar_core::{ContentHash, Span, SpanError, TextEdit};
use thiserror::Error;
use tracing::{debug, trace};

use crate::ast::{Ast, NodeId};
use crate::flow;
use crate::parser::{
    parse_compilation_unit, parse_expression, parse_import, parse_member, parse_statement, ParseError,
};
use crate::syntax::{NodeKind, Syntax};
use crate::target::{BodyDeclarationTarget, StatementTarget};
use crate::validation::UniqueNameGenerator;

/// Errors from editing operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("node {0} is not attached to the tree")]
    NodeNotAttached(NodeId),

    #[error("node {0} is not a statement of a block")]
    NotInBlock(NodeId),

    #[error("node {0} is not a member of a type")]
    NotInType(NodeId),

    #[error(transparent)]
    Span(#[from] SpanError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Structure(String),
}

pub type EditResult<T> = Result<T, EditError>;

/// Text to splice: literal, or copied from a node that keeps its identity.
enum Piece {
    Literal(String),
    Node(NodeId),
}

fn literal(text: impl Into<String>) -> Piece {
    Piece::Literal(text.into())
}

/// Assembled text plus the spans (relative to the text) of nodes copied into it.
struct Assembled {
    text: String,
    kept: Vec<(NodeId, Span)>,
}

/// Where a new statement or member goes, and the text surrounding it.
struct Slot {
    parent: NodeId,
    index: usize,
    span: Span,
    prefix: String,
    suffix: String,
    indent: String,
}

#[derive(Debug, Clone)]
pub struct SourceEditor {
    source: String,
    ast: Ast,
    eol: &'static str,
    indent_unit: String,
    edits: Vec<TextEdit>,
}

impl SourceEditor {
    pub fn parse(source: impl Into<String>) -> EditResult<Self> {
        let source = source.into();
        let ast = Ast::from_syntax(parse_compilation_unit(&source)?);
        let eol = text::detect_line_ending(&source);
        let indent_unit = text::detect_indent_unit(&source);
        Ok(SourceEditor {
            source,
            ast,
            eol,
            indent_unit,
            edits: Vec::new(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Every edit applied since parsing, in order.
    pub fn edits(&self) -> &[TextEdit] {
        &self.edits
    }

    pub fn content_hash(&self) -> ContentHash {
        ContentHash::compute(self.source.as_bytes())
    }

    pub fn end_of_line(&self) -> &'static str {
        self.eol
    }

    pub fn indent_unit(&self) -> &str {
        &self.indent_unit
    }

    /// The current text of a node.
    pub fn node_source(&self, id: NodeId) -> &str {
        let span = self.ast.span(id);
        self.source.get(span.start..span.end).unwrap_or("")
    }

    pub fn whitespace_to_left(&self, position: usize) -> &str {
        text::whitespace_to_left(&self.source, position)
    }

    /// Leading whitespace of the line on which `node` starts.
    pub fn indentation(&self, node: NodeId) -> &str {
        text::line_indentation(&self.source, self.ast.span(node).start)
    }

    /// One-based line and column of a node.
    pub fn location(&self, node: NodeId) -> (u32, u32) {
        let (line, column) = text::byte_offset_to_position(&self.source, self.ast.span(node).start);
        (line + 1, column + 1)
    }

    /// Human-readable description of a node for diagnostics.
    pub fn describe(&self, node: NodeId) -> String {
        let (line, column) = self.location(node);
        let text = self.node_source(node);
        let first_line = text.lines().next().unwrap_or("");
        format!("{}:{} `{}`", line, column, first_line)
    }

    // ========================================================================
    // Primitives
    // ========================================================================

    fn splice(&mut self, span: Span, replacement: &str) -> EditResult<()> {
        let edit = TextEdit::apply(&mut self.source, span, replacement)?;
        self.ast.adjust_spans(span.start, span.len(), replacement.len());
        let root = self.ast.root();
        self.ast.set_span(root, Span::new(0, self.source.len()));
        trace!(span = %span, inserted = replacement.len(), "splice");
        self.edits.push(edit);
        Ok(())
    }

    fn require_attached(&self, id: NodeId) -> EditResult<()> {
        if self.ast.is_attached(id) {
            Ok(())
        } else {
            Err(EditError::NodeNotAttached(id))
        }
    }

    fn assemble(&self, pieces: Vec<Piece>) -> Assembled {
        let mut assembled = Assembled {
            text: String::new(),
            kept: Vec::new(),
        };
        for piece in pieces {
            match piece {
                Piece::Literal(text) => assembled.text.push_str(&text),
                Piece::Node(node) => {
                    let start = assembled.text.len();
                    assembled.text.push_str(self.node_source(node));
                    assembled.kept.push((node, Span::new(start, assembled.text.len())));
                }
            }
        }
        assembled
    }

    /// Take `node` out of its parent, leaving a `null` placeholder in expression slots.
    fn detach(&mut self, node: NodeId) {
        if self.ast.parent(node).is_none() {
            return;
        }
        if !self.ast.remove_from_list(node) {
            let placeholder = self.ast.alloc(NodeKind::Null, self.ast.span(node));
            self.ast.replace_child(node, placeholder);
        }
    }

    /// Swap freshly lowered copies of `kept` nodes for the originals inside `fresh`.
    fn adopt(&mut self, fresh: NodeId, base: usize, kept: &[(NodeId, Span)]) -> EditResult<NodeId> {
        let mut root = fresh;
        for &(node, relative) in kept {
            let span = relative.offset_by(base);
            let label = self.ast.kind(node).label();
            let found = self
                .ast
                .descendants(root)
                .into_iter()
                .find(|&d| self.ast.span(d) == span && self.ast.kind(d).label() == label)
                .ok_or_else(|| EditError::Structure(format!("cannot locate {} in rewritten code", label)))?;
            self.detach(node);
            if !self.ast.respan_from(node, found) {
                return Err(EditError::Structure(format!("{} changed shape when rewritten", label)));
            }
            if found == root {
                root = node;
            } else {
                self.ast.replace_child(found, node);
            }
        }
        Ok(root)
    }

    /// Replace the text and subtree of `old` with new code built from `pieces`.
    fn rewrite(
        &mut self,
        old: NodeId,
        pieces: Vec<Piece>,
        parse: fn(&str) -> Result<Syntax, ParseError>,
    ) -> EditResult<NodeId> {
        self.require_attached(old)?;
        if self.ast.parent(old).is_none() {
            return Err(EditError::Structure(format!("cannot rewrite the root {}", old)));
        }
        let assembled = self.assemble(pieces);
        let syntax = parse(&assembled.text)?;
        let span = self.ast.span(old);
        self.splice(span, &assembled.text)?;
        let fresh = self.ast.lower(syntax, span.start);
        let node = self.adopt(fresh, span.start, &assembled.kept)?;
        self.ast.replace_child(old, node);
        Ok(node)
    }

    /// Lay out multi-line code at `indent`: leading tabs of continuation lines become
    /// indentation units.
    fn layout(&self, source: &str, indent: &str) -> String {
        let mut out = String::with_capacity(source.len());
        for (i, line) in source.lines().enumerate() {
            if i == 0 {
                out.push_str(line.trim_start());
                continue;
            }
            out.push_str(self.eol);
            let rest = line.trim_start_matches('\t');
            if rest.trim().is_empty() {
                continue;
            }
            out.push_str(indent);
            for _ in 0..line.len() - rest.len() {
                out.push_str(&self.indent_unit);
            }
            out.push_str(rest);
        }
        out
    }

    /// Remove a statement or member's text, taking its whole lines when nothing else
    /// shares them.
    fn remove_text(&mut self, span: Span) -> EditResult<()> {
        let span = if text::occupies_whole_lines(&self.source, span) {
            Span::new(
                text::line_start(&self.source, span.start),
                text::next_line_start(&self.source, span.end),
            )
        } else {
            let rest = &self.source[span.end..];
            let trailing = rest.len() - rest.trim_start_matches([' ', '\t']).len();
            Span::new(span.start, span.end + trailing)
        };
        self.splice(span, "")
    }

    fn empty_body_slot(&self, parent: NodeId, open: usize, close: usize, at_start: bool) -> Slot {
        let outer = text::line_indentation(&self.source, open).to_string();
        let indent = format!("{}{}", outer, self.indent_unit);
        let prefix = format!("{}{}", self.eol, indent);
        let interior = self.source.get(open + 1..close).unwrap_or("");
        if interior.trim().is_empty() {
            return Slot {
                parent,
                index: 0,
                span: Span::new(open + 1, close),
                prefix,
                suffix: format!("{}{}", self.eol, outer),
                indent,
            };
        }
        let position = if at_start {
            open + 1
        } else {
            open + 1 + interior.trim_end().len()
        };
        Slot {
            parent,
            index: 0,
            span: Span::new(position, position),
            prefix,
            suffix: String::new(),
            indent,
        }
    }

    fn sibling_slot(&self, parent: NodeId, index: usize, anchor: NodeId, after: bool) -> Slot {
        let span = self.ast.span(anchor);
        let indent = text::line_indentation(&self.source, span.start).to_string();
        let separator = format!("{}{}", self.eol, indent);
        if after {
            Slot {
                parent,
                index: index + 1,
                span: Span::new(span.end, span.end),
                prefix: separator,
                suffix: String::new(),
                indent,
            }
        } else {
            Slot {
                parent,
                index,
                span: Span::new(span.start, span.start),
                prefix: String::new(),
                suffix: separator,
                indent,
            }
        }
    }

    /// Splice `body` into a slot, returning the offset where `body` begins.
    fn insert_at(&mut self, slot: &Slot, body: &str) -> EditResult<usize> {
        let text = format!("{}{}{}", slot.prefix, body, slot.suffix);
        self.splice(slot.span, &text)?;
        Ok(slot.span.start + slot.prefix.len())
    }

    fn link(&mut self, slot: &Slot, node: NodeId) {
        if matches!(self.ast.kind(slot.parent), NodeKind::Block { .. }) {
            self.ast.insert_statement(slot.parent, slot.index, node);
        } else {
            self.ast.insert_member(slot.parent, slot.index, node);
        }
    }

    fn place(&mut self, slot: Slot, body: &str, syntax: Syntax, kept: &[(NodeId, Span)]) -> EditResult<NodeId> {
        let base = self.insert_at(&slot, body)?;
        let fresh = self.ast.lower(syntax, base);
        let node = self.adopt(fresh, base, kept)?;
        self.link(&slot, node);
        Ok(node)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn block_position(&self, statement: NodeId) -> EditResult<(NodeId, usize)> {
        self.require_attached(statement)?;
        let parent = self.ast.parent(statement).ok_or(EditError::NotInBlock(statement))?;
        self.ast
            .block_statements(parent)
            .iter()
            .position(|&s| s == statement)
            .map(|index| (parent, index))
            .ok_or(EditError::NotInBlock(statement))
    }

    fn statement_slot(&self, target: &StatementTarget) -> EditResult<Slot> {
        let target = match *target {
            StatementTarget::BlockStart(b) => self
                .ast
                .block_statements(b)
                .first()
                .map_or(*target, |&s| StatementTarget::Before(s)),
            StatementTarget::BlockEnd(b) => self
                .ast
                .block_statements(b)
                .last()
                .map_or(*target, |&s| StatementTarget::After(s)),
            other => other,
        };
        match target {
            StatementTarget::Before(s) | StatementTarget::After(s) => {
                let (block, index) = self.block_position(s)?;
                Ok(self.sibling_slot(block, index, s, matches!(target, StatementTarget::After(_))))
            }
            StatementTarget::BlockStart(b) | StatementTarget::BlockEnd(b) => {
                self.require_attached(b)?;
                if !matches!(self.ast.kind(b), NodeKind::Block { .. }) {
                    return Err(EditError::Structure(format!("{} is not a block", b)));
                }
                let span = self.ast.span(b);
                Ok(self.empty_body_slot(
                    b,
                    span.start,
                    span.end.saturating_sub(1),
                    matches!(target, StatementTarget::BlockStart(_)),
                ))
            }
        }
    }

    /// The statement containing `node` that sits directly in a block.
    pub fn block_statement_of(&self, node: NodeId) -> EditResult<NodeId> {
        self.ast
            .ancestors(node)
            .find(|&n| {
                self.ast
                    .parent(n)
                    .is_some_and(|p| matches!(self.ast.kind(p), NodeKind::Block { .. }))
            })
            .ok_or(EditError::NotInBlock(node))
    }

    /// Insert a statement at `target`. Continuation lines of `source` are indented with
    /// one unit per leading tab.
    pub fn add_statement(&mut self, source: &str, target: &StatementTarget) -> EditResult<NodeId> {
        let slot = self.statement_slot(target)?;
        let body = self.layout(source, &slot.indent);
        let syntax = parse_statement(&body)?;
        let node = self.place(slot, &body, syntax, &[])?;
        debug!(statement = %node, target = %target, "added statement");
        Ok(node)
    }

    /// Move a statement to `target`, keeping its identity and re-indenting it.
    pub fn move_statement(&mut self, statement: NodeId, target: &StatementTarget) -> EditResult<()> {
        if target.statement() == Some(statement) {
            return Ok(());
        }
        if self.ast.contains(statement, target.node()) {
            return Err(EditError::Structure(format!(
                "cannot move statement {} into itself",
                statement
            )));
        }
        self.block_position(statement)?;
        self.statement_slot(target)?;

        let span = self.ast.span(statement);
        let code = self.node_source(statement).to_string();
        let old_indent = self.indentation(statement).to_string();
        self.ast.remove_from_list(statement);
        self.remove_text(span)?;

        let slot = self.statement_slot(target)?;
        let body = text::reindent(&code, &old_indent, &slot.indent);
        let syntax = parse_statement(&body)?;
        let base = self.insert_at(&slot, &body)?;
        if !self.ast.respan(statement, &syntax, base) {
            return Err(EditError::Structure(format!(
                "statement {} changed shape when moved",
                statement
            )));
        }
        self.link(&slot, statement);
        debug!(statement = %statement, target = %target, "moved statement");
        Ok(())
    }

    pub fn remove_statement(&mut self, statement: NodeId) -> EditResult<()> {
        self.block_position(statement)?;
        let span = self.ast.span(statement);
        self.ast.remove_from_list(statement);
        self.remove_text(span)?;
        debug!(statement = %statement, "removed statement");
        Ok(())
    }

    // ========================================================================
    // Body declarations
    // ========================================================================

    fn type_position(&self, member: NodeId) -> EditResult<(NodeId, usize)> {
        self.require_attached(member)?;
        let parent = self.ast.parent(member).ok_or(EditError::NotInType(member))?;
        self.ast
            .type_members(parent)
            .iter()
            .position(|&m| m == member)
            .map(|index| (parent, index))
            .ok_or(EditError::NotInType(member))
    }

    /// Offset of the `{` opening the body of a type declaration.
    fn type_body_open(&self, ty: NodeId) -> EditResult<usize> {
        let NodeKind::TypeDeclaration {
            name,
            superclass,
            interfaces,
            ..
        } = self.ast.kind(ty)
        else {
            return Err(EditError::Structure(format!("{} is not a type declaration", ty)));
        };
        let header_end = std::iter::once(name)
            .chain(superclass)
            .chain(interfaces)
            .map(|&n| self.ast.span(n).end)
            .max()
            .unwrap_or(self.ast.span(ty).start);
        self.source[header_end..]
            .find('{')
            .map(|p| header_end + p)
            .ok_or_else(|| EditError::Structure(format!("type {} has no body", ty)))
    }

    fn member_slot(&self, target: &BodyDeclarationTarget) -> EditResult<Slot> {
        let target = match *target {
            BodyDeclarationTarget::TypeStart(t) => self
                .ast
                .type_members(t)
                .first()
                .map_or(*target, |&m| BodyDeclarationTarget::Before(m)),
            BodyDeclarationTarget::TypeEnd(t) => self
                .ast
                .type_members(t)
                .last()
                .map_or(*target, |&m| BodyDeclarationTarget::After(m)),
            other => other,
        };
        match target {
            BodyDeclarationTarget::Before(m) | BodyDeclarationTarget::After(m) => {
                let (ty, index) = self.type_position(m)?;
                Ok(self.sibling_slot(ty, index, m, matches!(target, BodyDeclarationTarget::After(_))))
            }
            BodyDeclarationTarget::TypeStart(t) | BodyDeclarationTarget::TypeEnd(t) => {
                self.require_attached(t)?;
                let open = self.type_body_open(t)?;
                let close = self.ast.span(t).end.saturating_sub(1);
                Ok(self.empty_body_slot(
                    t,
                    open,
                    close,
                    matches!(target, BodyDeclarationTarget::TypeStart(_)),
                ))
            }
        }
    }

    fn add_member(&mut self, source: &str, target: &BodyDeclarationTarget) -> EditResult<NodeId> {
        let slot = self.member_slot(target)?;
        let body = self.layout(source, &slot.indent);
        let syntax = parse_member(&body)?;
        let node = self.place(slot, &body, syntax, &[])?;
        debug!(member = %node, target = %target, "added body declaration");
        Ok(node)
    }

    pub fn add_field_declaration(&mut self, source: &str, target: &BodyDeclarationTarget) -> EditResult<NodeId> {
        self.add_member(source, target)
    }

    /// Add a method. `header` is everything before the body, each of `body_lines` is one
    /// line of the body with one leading tab per nesting level.
    pub fn add_method_declaration(
        &mut self,
        header: &str,
        body_lines: &[String],
        target: &BodyDeclarationTarget,
    ) -> EditResult<NodeId> {
        let mut source = format!("{} {{", header.trim_end());
        for line in body_lines {
            source.push_str("\n\t");
            source.push_str(line);
        }
        source.push_str("\n}");
        self.add_member(&source, target)
    }

    pub fn remove_body_declaration(&mut self, member: NodeId) -> EditResult<()> {
        self.type_position(member)?;
        let span = self.ast.span(member);
        self.ast.remove_from_list(member);
        self.remove_text(span)?;
        debug!(member = %member, "removed body declaration");
        Ok(())
    }

    /// Remove one fragment of a local or field declaration, or the whole declaration when
    /// it is the only fragment.
    pub fn remove_variable_declaration(&mut self, fragment: NodeId) -> EditResult<()> {
        self.require_attached(fragment)?;
        let declaration = self
            .ast
            .parent(fragment)
            .ok_or(EditError::NodeNotAttached(fragment))?;
        let fragments = self.ast.fragments(declaration).to_vec();
        if fragments.len() <= 1 {
            return match self.ast.kind(declaration) {
                NodeKind::LocalDeclaration { .. } => self.remove_statement(declaration),
                NodeKind::FieldDeclaration { .. } => self.remove_body_declaration(declaration),
                other => Err(EditError::Structure(format!(
                    "{} is not a variable declaration",
                    other.label()
                ))),
            };
        }
        let index = fragments
            .iter()
            .position(|&f| f == fragment)
            .ok_or_else(|| EditError::Structure(format!("{} is not a fragment", fragment)))?;
        let span = if index == 0 {
            Span::new(self.ast.span(fragment).start, self.ast.span(fragments[1]).start)
        } else {
            Span::new(self.ast.span(fragments[index - 1]).end, self.ast.span(fragment).end)
        };
        self.ast.remove_from_list(fragment);
        self.splice(span, "")
    }

    // ========================================================================
    // Expressions and names
    // ========================================================================

    /// Replace an expression with new code.
    pub fn replace_expression(&mut self, expression: NodeId, source: &str) -> EditResult<NodeId> {
        self.rewrite(expression, vec![literal(source)], parse_expression)
    }

    /// Move the existing `expression` into the place of `target`. The expression's old
    /// slot holds a `null` placeholder until the caller removes its surroundings.
    pub fn replace_with_existing(&mut self, target: NodeId, expression: NodeId) -> EditResult<()> {
        self.rewrite(target, vec![Piece::Node(expression)], parse_expression)?;
        Ok(())
    }

    /// Retext a name node.
    pub fn replace_identifier(&mut self, name: NodeId, identifier: &str) -> EditResult<()> {
        self.require_attached(name)?;
        if self.ast.identifier(name).is_none() {
            return Err(EditError::Structure(format!("{} is not a name", name)));
        }
        self.splice(self.ast.span(name), identifier)?;
        self.ast.set_identifier(name, identifier);
        Ok(())
    }

    // ========================================================================
    // Declaration reshaping
    // ========================================================================

    fn fragment_parts(&self, fragment: NodeId) -> EditResult<(NodeId, NodeId, Option<NodeId>)> {
        self.require_attached(fragment)?;
        let NodeKind::Fragment { name, initializer } = self.ast.kind(fragment) else {
            return Err(EditError::Structure(format!("{} is not a fragment", fragment)));
        };
        let declaration = self
            .ast
            .parent(fragment)
            .ok_or(EditError::NodeNotAttached(fragment))?;
        Ok((declaration, *name, *initializer))
    }

    fn identifier_of(&self, name: NodeId) -> EditResult<String> {
        self.ast
            .identifier(name)
            .map(str::to_string)
            .ok_or_else(|| EditError::Structure(format!("{} is not a name", name)))
    }

    /// The name of the first fragment of a declaration.
    fn declared_name(&self, declaration: NodeId) -> EditResult<NodeId> {
        self.ast
            .fragments(declaration)
            .first()
            .and_then(|&f| match self.ast.kind(f) {
                NodeKind::Fragment { name, .. } => Some(*name),
                _ => None,
            })
            .ok_or_else(|| EditError::Structure(format!("{} declares no variable", declaration)))
    }

    /// Cut ` = initializer` out of a fragment and return the detached initializer.
    pub fn remove_fragment_initializer(&mut self, fragment: NodeId) -> EditResult<Option<NodeId>> {
        let (_, name, initializer) = self.fragment_parts(fragment)?;
        let Some(initializer) = initializer else {
            return Ok(None);
        };
        let name_end = self.ast.span(name).end;
        let init_span = self.ast.span(initializer);
        let between = &self.source[name_end..init_span.start];
        let cut_start = match between.find('=') {
            Some(eq) => name_end + between[..eq].trim_end().len(),
            None => name_end,
        };
        if let NodeKind::Fragment { initializer, .. } = self.ast.kind_mut(fragment) {
            *initializer = None;
        }
        self.ast.set_parent(initializer, None);
        self.splice(Span::new(cut_start, init_span.end), "")?;
        Ok(Some(initializer))
    }

    /// Split `T x = init;` into `T x;` followed by `x = init;`. Returns the assignment
    /// statement; the initializer keeps its identity.
    pub fn split_declaration(&mut self, fragment: NodeId) -> EditResult<NodeId> {
        let (declaration, name, initializer) = self.fragment_parts(fragment)?;
        if !matches!(self.ast.kind(declaration), NodeKind::LocalDeclaration { .. }) {
            return Err(EditError::NotInBlock(declaration));
        }
        let initializer =
            initializer.ok_or_else(|| EditError::Structure(format!("{} has no initializer", fragment)))?;
        let identifier = self.identifier_of(name)?;
        let assembled = self.assemble(vec![
            literal(format!("{} = ", identifier)),
            Piece::Node(initializer),
            literal(";"),
        ]);
        let syntax = parse_statement(&assembled.text)?;
        self.remove_fragment_initializer(fragment)?;
        let slot = self.statement_slot(&StatementTarget::After(declaration))?;
        let statement = self.place(slot, &assembled.text, syntax, &assembled.kept)?;
        debug!(declaration = %declaration, assignment = %statement, "split declaration");
        Ok(statement)
    }

    /// Turn `T x = init;` into `<qualifier>x = init;`, or remove `T x;` outright. Returns
    /// the assignment statement when one was written.
    pub fn declaration_to_assignment(&mut self, fragment: NodeId, qualifier: &str) -> EditResult<Option<NodeId>> {
        let (declaration, name, initializer) = self.fragment_parts(fragment)?;
        if !matches!(self.ast.kind(declaration), NodeKind::LocalDeclaration { .. }) {
            return Err(EditError::NotInBlock(declaration));
        }
        if self.ast.fragments(declaration).len() != 1 {
            return Err(EditError::Structure(format!(
                "declaration {} declares several variables",
                declaration
            )));
        }
        let Some(initializer) = initializer else {
            self.remove_statement(declaration)?;
            return Ok(None);
        };
        let identifier = self.identifier_of(name)?;
        let statement = self.rewrite(
            declaration,
            vec![
                literal(format!("{}{} = ", qualifier, identifier)),
                Piece::Node(initializer),
                literal(";"),
            ],
            parse_statement,
        )?;
        Ok(Some(statement))
    }

    /// Turn `x = init;` (or `this.x = init;`) into `<declaration_type> x = init;`. Returns
    /// the new declaring name.
    pub fn assignment_to_declaration(&mut self, statement: NodeId, declaration_type: &str) -> EditResult<NodeId> {
        let NodeKind::ExpressionStatement { expression } = self.ast.kind(statement) else {
            return Err(EditError::Structure(format!("{} is not an expression statement", statement)));
        };
        let NodeKind::Assignment { left, right } = self.ast.kind(self.ast.unparenthesized(*expression)) else {
            return Err(EditError::Structure(format!("{} is not an assignment", statement)));
        };
        let right = *right;
        let name = flow::assigned_name(&self.ast, *left)
            .ok_or_else(|| EditError::Structure(format!("{} does not assign a variable", statement)))?;
        let identifier = self.identifier_of(name)?;
        let declaration = self.rewrite(
            statement,
            vec![
                literal(format!("{} {} = ", declaration_type, identifier)),
                Piece::Node(right),
                literal(";"),
            ],
            parse_statement,
        )?;
        self.declared_name(declaration)
    }

    /// Turn the expression statement `init;` into `<declaration_type> name = init;`.
    /// Returns the new declaring name.
    pub fn expression_statement_to_declaration(
        &mut self,
        statement: NodeId,
        declaration_type: &str,
        name: &str,
    ) -> EditResult<NodeId> {
        let NodeKind::ExpressionStatement { expression } = self.ast.kind(statement) else {
            return Err(EditError::Structure(format!("{} is not an expression statement", statement)));
        };
        let expression = *expression;
        let declaration = self.rewrite(
            statement,
            vec![
                literal(format!("{} {} = ", declaration_type, name)),
                Piece::Node(expression),
                literal(";"),
            ],
            parse_statement,
        )?;
        self.declared_name(declaration)
    }

    /// Declare `<declaration_type> name = expression;` before the statement containing
    /// `expression` and use `name` in its place. Returns the declaring name and the use.
    pub fn extract_to_local(
        &mut self,
        expression: NodeId,
        declaration_type: &str,
        name: &str,
    ) -> EditResult<(NodeId, NodeId)> {
        let statement = self.block_statement_of(expression)?;
        let assembled = self.assemble(vec![
            literal(format!("{} {} = ", declaration_type, name)),
            Piece::Node(expression),
            literal(";"),
        ]);
        let syntax = parse_statement(&assembled.text)?;
        let use_name = self.replace_expression(expression, name)?;
        let slot = self.statement_slot(&StatementTarget::Before(statement))?;
        let declaration = self.place(slot, &assembled.text, syntax, &assembled.kept)?;
        Ok((self.declared_name(declaration)?, use_name))
    }

    /// Declare a field `<declaration_head> name = expression;` before the field whose
    /// initializer contains `expression`, and use `name` in its place. Returns the
    /// declaring name and the use.
    pub fn extract_to_field(
        &mut self,
        expression: NodeId,
        declaration_head: &str,
        name: &str,
    ) -> EditResult<(NodeId, NodeId)> {
        let field = self
            .ast
            .enclosing_field_declaration(expression)
            .ok_or(EditError::NotInType(expression))?;
        let assembled = self.assemble(vec![
            literal(format!("{} {} = ", declaration_head, name)),
            Piece::Node(expression),
            literal(";"),
        ]);
        let syntax = parse_member(&assembled.text)?;
        let use_name = self.replace_expression(expression, name)?;
        let slot = self.member_slot(&BodyDeclarationTarget::Before(field))?;
        let declaration = self.place(slot, &assembled.text, syntax, &assembled.kept)?;
        Ok((self.declared_name(declaration)?, use_name))
    }

    // ========================================================================
    // Names and types
    // ========================================================================

    /// A name based on `base` that collides with nothing visible at `position` and with
    /// no local declared after it. `exclude` is a declaring name to ignore.
    pub fn unique_variable_name(&self, position: usize, base: &str, exclude: Option<NodeId>) -> String {
        let used = flow::visible_declarations(&self.ast, position)
            .into_iter()
            .chain(flow::declarations_after(&self.ast, position))
            .filter(|d| Some(d.name) != exclude)
            .filter_map(|d| self.ast.identifier(d.name).map(str::to_string));
        UniqueNameGenerator::with_used_names(used).generate(base)
    }

    /// A method name based on `base` unused in `ty`.
    pub fn unique_method_name(&self, ty: NodeId, base: &str) -> String {
        let used = self
            .ast
            .methods(ty)
            .into_iter()
            .filter_map(|m| self.ast.method_name(m).map(str::to_string));
        UniqueNameGenerator::with_used_names(used).generate(base)
    }

    /// Source for a qualified type name: the simple name when it is imported or importable,
    /// adding the import when needed.
    pub fn type_source(&mut self, qualified: &str) -> EditResult<String> {
        let Some((package, simple)) = qualified.rsplit_once('.') else {
            return Ok(qualified.to_string());
        };
        if package == "java.lang" || self.ast.package() == Some(package) {
            return Ok(simple.to_string());
        }
        let mut conflict = false;
        for &import in self.ast.imports() {
            if let NodeKind::Import {
                name,
                is_static: false,
                on_demand,
            } = self.ast.kind(import)
            {
                if *on_demand {
                    if name == package {
                        return Ok(simple.to_string());
                    }
                } else if name == qualified {
                    return Ok(simple.to_string());
                } else if name.rsplit('.').next() == Some(simple) {
                    conflict = true;
                }
            }
        }
        let declares_simple = self.ast.types().iter().any(|&t| match self.ast.kind(t) {
            NodeKind::TypeDeclaration { name, .. } => self.ast.identifier(*name) == Some(simple),
            _ => false,
        });
        if conflict || declares_simple {
            return Ok(qualified.to_string());
        }
        self.add_import(qualified)?;
        Ok(simple.to_string())
    }

    fn package_line_end(&self) -> Option<usize> {
        self.ast.package()?;
        let mut offset = 0;
        for line in self.source.split_inclusive('\n') {
            if line.trim_start().starts_with("package ") {
                return Some(text::line_end(&self.source, offset));
            }
            offset += line.len();
        }
        None
    }

    fn add_import(&mut self, qualified: &str) -> EditResult<NodeId> {
        let declaration = format!("import {};", qualified);
        let syntax = parse_import(&declaration)?;
        let (position, prefix, suffix) = if let Some(&last) = self.ast.imports().last() {
            (self.ast.span(last).end, self.eol.to_string(), String::new())
        } else if let Some(end) = self.package_line_end() {
            (end, self.eol.repeat(2), String::new())
        } else {
            (0, String::new(), self.eol.repeat(2))
        };
        self.splice(
            Span::new(position, position),
            &format!("{}{}{}", prefix, declaration, suffix),
        )?;
        let import = self.ast.lower(syntax, position + prefix.len());
        self.ast.push_import(import);
        debug!(import = qualified, "added import");
        Ok(import)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn editor(source: &str) -> SourceEditor {
        SourceEditor::parse(source).unwrap()
    }

    /// Check that the arena agrees with a fresh parse of the current text.
    fn assert_in_sync(editor: &SourceEditor) {
        fn compare(fresh: &Ast, f: NodeId, ast: &Ast, a: NodeId) {
            assert_eq!(fresh.kind(f).label(), ast.kind(a).label(), "kind of {}", a);
            assert_eq!(fresh.span(f), ast.span(a), "span of {} ({})", a, ast.kind(a).label());
            assert_eq!(fresh.identifier(f), ast.identifier(a));
            let (fc, ac) = (fresh.children(f), ast.children(a));
            assert_eq!(fc.len(), ac.len(), "children of {}", a);
            for (f, a) in fc.into_iter().zip(ac) {
                assert!(ast.parent(a).is_some());
                compare(fresh, f, ast, a);
            }
        }
        let fresh = Ast::from_syntax(parse_compilation_unit(editor.source()).unwrap());
        compare(&fresh, fresh.root(), editor.ast(), editor.ast().root());
    }

    fn statement(editor: &SourceEditor, text: &str) -> NodeId {
        let ast = editor.ast();
        ast.descendants(ast.root())
            .into_iter()
            .find(|&n| ast.kind(n).is_statement() && editor.node_source(n) == text)
            .unwrap()
    }

    fn body(editor: &SourceEditor, method: &str) -> NodeId {
        let ast = editor.ast();
        let ty = ast.types()[0];
        let method = ast
            .methods(ty)
            .into_iter()
            .find(|&m| ast.method_name(m) == Some(method))
            .unwrap();
        ast.method_body(method).unwrap()
    }

    mod statements {
        use super::*;

        const SOURCE: &str = "class Test {\n\tvoid a() {\n\t\tfoo();\n\t}\n\tvoid b() {\n\t}\n}\n";

        #[test]
        fn add_before_and_after() {
            let mut editor = editor(SOURCE);
            let foo = statement(&editor, "foo();");
            editor.add_statement("before();", &StatementTarget::Before(foo)).unwrap();
            editor.add_statement("after();", &StatementTarget::After(foo)).unwrap();
            assert_eq!(
                editor.source(),
                "class Test {\n\tvoid a() {\n\t\tbefore();\n\t\tfoo();\n\t\tafter();\n\t}\n\tvoid b() {\n\t}\n}\n"
            );
            assert_in_sync(&editor);
        }

        #[test]
        fn add_into_empty_block() {
            let mut editor = editor(SOURCE);
            let b = body(&editor, "b");
            let added = editor.add_statement("bar();", &StatementTarget::BlockEnd(b)).unwrap();
            assert_eq!(
                editor.source(),
                "class Test {\n\tvoid a() {\n\t\tfoo();\n\t}\n\tvoid b() {\n\t\tbar();\n\t}\n}\n"
            );
            assert_eq!(editor.ast().block_statements(b), &[added]);
            assert_in_sync(&editor);
        }

        #[test]
        fn add_into_collapsed_block() {
            let mut editor = editor("class Test {\n\tvoid a() {}\n}");
            let a = body(&editor, "a");
            editor.add_statement("bar();", &StatementTarget::BlockStart(a)).unwrap();
            assert_eq!(editor.source(), "class Test {\n\tvoid a() {\n\t\tbar();\n\t}\n}");
            assert_in_sync(&editor);
        }

        #[test]
        fn multi_line_statement_is_laid_out() {
            let mut editor = editor(SOURCE);
            let foo = statement(&editor, "foo();");
            editor
                .add_statement("if (x == null) {\n\tx = 1;\n}", &StatementTarget::After(foo))
                .unwrap();
            assert!(editor
                .source()
                .contains("\t\tfoo();\n\t\tif (x == null) {\n\t\t\tx = 1;\n\t\t}\n"));
            assert_in_sync(&editor);
        }

        #[test]
        fn remove_takes_whole_line() {
            let mut editor = editor(SOURCE);
            let foo = statement(&editor, "foo();");
            editor.remove_statement(foo).unwrap();
            assert_eq!(editor.source(), "class Test {\n\tvoid a() {\n\t}\n\tvoid b() {\n\t}\n}\n");
            assert!(!editor.ast().is_attached(foo));
            assert_in_sync(&editor);
        }

        #[test]
        fn parse_error_leaves_source_untouched() {
            let mut editor = editor(SOURCE);
            let foo = statement(&editor, "foo();");
            let err = editor.add_statement("foo(", &StatementTarget::After(foo)).unwrap_err();
            assert!(matches!(err, EditError::Parse(_)));
            assert_eq!(editor.source(), SOURCE);
        }
    }

    mod moves {
        use super::*;

        const SOURCE: &str =
            "class Test {\n\tvoid a() {\n\t\tone();\n\t\ttwo();\n\t\tthree();\n\t\t{\n\t\t\tinner();\n\t\t}\n\t}\n}";

        #[test]
        fn move_keeps_identity() {
            let mut editor = editor(SOURCE);
            let one = statement(&editor, "one();");
            let three = statement(&editor, "three();");
            editor.move_statement(three, &StatementTarget::Before(one)).unwrap();
            assert!(editor
                .source()
                .contains("\t\tthree();\n\t\tone();\n\t\ttwo();\n"));
            assert_eq!(editor.node_source(three), "three();");
            assert_eq!(editor.ast().index_in_parent(three), Some(0));
            assert_in_sync(&editor);
        }

        #[test]
        fn move_into_nested_block_reindents() {
            let mut editor = editor(SOURCE);
            let one = statement(&editor, "one();");
            let inner = statement(&editor, "inner();");
            editor.move_statement(one, &StatementTarget::After(inner)).unwrap();
            assert!(editor.source().contains("\t\t\tinner();\n\t\t\tone();\n\t\t}"));
            assert_in_sync(&editor);
        }

        #[test]
        fn move_after_itself_is_noop() {
            let mut editor = editor(SOURCE);
            let two = statement(&editor, "two();");
            editor.move_statement(two, &StatementTarget::After(two)).unwrap();
            assert_eq!(editor.source(), SOURCE);
        }

        #[test]
        fn move_into_itself_fails() {
            let mut editor = editor(SOURCE);
            let inner = statement(&editor, "inner();");
            let block = editor.ast().parent(inner).unwrap();
            let err = editor.move_statement(block, &StatementTarget::After(inner)).unwrap_err();
            assert!(matches!(err, EditError::Structure(_)));
        }
    }

    mod declarations {
        use super::*;

        const SOURCE: &str = "class Test {\n\tprivate JPanel panel;\n\tvoid a() {\n\t\tJButton b = new JButton();\n\t\tadd(new JLabel(\"x\"));\n\t}\n}";

        fn creation(editor: &SourceEditor, ty: &str) -> NodeId {
            let ast = editor.ast();
            ast.descendants(ast.root())
                .into_iter()
                .find(|&n| match ast.kind(n) {
                    NodeKind::New { ty: t, .. } => editor.node_source(*t) == ty,
                    _ => false,
                })
                .unwrap()
        }

        #[test]
        fn split_keeps_initializer() {
            let mut editor = editor(SOURCE);
            let new = creation(&editor, "JButton");
            let fragment = editor.ast().parent(new).unwrap();
            let assignment = editor.split_declaration(fragment).unwrap();
            assert!(editor
                .source()
                .contains("\t\tJButton b;\n\t\tb = new JButton();\n"));
            assert!(editor.ast().is_attached(new));
            assert!(editor.ast().contains(assignment, new));
            assert_in_sync(&editor);
        }

        #[test]
        fn declaration_to_assignment_and_back() {
            let mut editor = editor(SOURCE);
            let new = creation(&editor, "JButton");
            let fragment = editor.ast().parent(new).unwrap();
            let statement = editor.declaration_to_assignment(fragment, "this.").unwrap().unwrap();
            assert!(editor.source().contains("\t\tthis.b = new JButton();\n"));
            assert_in_sync(&editor);

            let name = editor.assignment_to_declaration(statement, "JButton").unwrap();
            assert_eq!(editor.ast().identifier(name), Some("b"));
            assert!(editor.source().contains("\t\tJButton b = new JButton();\n"));
            assert!(editor.ast().is_attached(new));
            assert_in_sync(&editor);
        }

        #[test]
        fn extract_nested_creation() {
            let mut editor = editor(SOURCE);
            let new = creation(&editor, "JLabel");
            let (name, use_name) = editor.extract_to_local(new, "JLabel", "label").unwrap();
            assert!(editor
                .source()
                .contains("\t\tJLabel label = new JLabel(\"x\");\n\t\tadd(label);\n"));
            assert_eq!(editor.ast().identifier(name), Some("label"));
            assert_eq!(editor.ast().identifier(use_name), Some("label"));
            assert!(editor.ast().is_attached(new));
            assert_in_sync(&editor);
        }

        #[test]
        fn expression_statement_becomes_declaration() {
            let mut editor = editor("class Test {\n\tvoid a() {\n\t\tnew JButton();\n\t}\n}");
            let new = creation(&editor, "JButton");
            let statement = editor.ast().parent(new).unwrap();
            editor
                .expression_statement_to_declaration(statement, "JButton", "button")
                .unwrap();
            assert!(editor.source().contains("\t\tJButton button = new JButton();\n"));
            assert!(editor.ast().is_attached(new));
            assert_in_sync(&editor);
        }

        #[test]
        fn remove_one_of_several_fragments() {
            let mut editor = editor("class Test {\n\tvoid a() {\n\t\tint x = 1, y = 2, z = 3;\n\t}\n}");
            let ast = editor.ast();
            let y = ast
                .descendants(ast.root())
                .into_iter()
                .find(|&n| ast.identifier(n) == Some("y"))
                .unwrap();
            let fragment = ast.parent(y).unwrap();
            editor.remove_variable_declaration(fragment).unwrap();
            assert!(editor.source().contains("int x = 1, z = 3;"));
            assert_in_sync(&editor);
        }

        #[test]
        fn add_field_and_method() {
            let mut editor = editor(SOURCE);
            let ty = editor.ast().types()[0];
            let panel = editor.ast().fields(ty)[0];
            editor
                .add_field_declaration("private JButton button;", &BodyDeclarationTarget::After(panel))
                .unwrap();
            editor
                .add_method_declaration(
                    "private JButton getButton()",
                    &["return button;".to_string()],
                    &BodyDeclarationTarget::TypeEnd(ty),
                )
                .unwrap();
            assert!(editor
                .source()
                .contains("\tprivate JPanel panel;\n\tprivate JButton button;\n"));
            assert!(editor
                .source()
                .ends_with("\t}\n\tprivate JButton getButton() {\n\t\treturn button;\n\t}\n}"));
            assert_in_sync(&editor);
        }
    }

    mod naming {
        use super::*;

        #[test]
        fn unique_names_avoid_visible_and_later_declarations() {
            let source = "class Test {\n\tJButton button;\n\tvoid a() {\n\t\tfoo();\n\t\tJButton button_1 = null;\n\t}\n}";
            let editor = editor(source);
            let foo = statement(&editor, "foo();");
            let position = editor.ast().span(foo).start;
            assert_eq!(editor.unique_variable_name(position, "button", None), "button_2");
            assert_eq!(editor.unique_variable_name(position, "label", None), "label");
            assert_eq!(editor.unique_variable_name(position, "class", None), "class_1");
        }

        #[test]
        fn type_source_adds_imports() {
            let source = "package demo;\n\nimport javax.swing.JButton;\nimport java.util.*;\n\nclass Test {\n}\n";
            let mut editor = editor(source);
            assert_eq!(editor.type_source("javax.swing.JButton").unwrap(), "JButton");
            assert_eq!(editor.type_source("java.lang.String").unwrap(), "String");
            assert_eq!(editor.type_source("java.util.List").unwrap(), "List");
            assert_eq!(editor.source(), source);
            assert_eq!(editor.type_source("java.awt.BorderLayout").unwrap(), "BorderLayout");
            assert!(editor
                .source()
                .contains("import java.util.*;\nimport java.awt.BorderLayout;\n"));
            assert_eq!(editor.type_source("com.other.JButton").unwrap(), "com.other.JButton");
            assert_in_sync(&editor);
        }

        #[test]
        fn import_without_existing_imports() {
            let mut editor = editor("package demo;\n\nclass Test {\n}\n");
            editor.type_source("javax.swing.JPanel").unwrap();
            assert_eq!(
                editor.source(),
                "package demo;\n\nimport javax.swing.JPanel;\n\nclass Test {\n}\n"
            );
            assert_in_sync(&editor);
        }

        #[test]
        fn rename_identifier() {
            let mut editor = editor("class Test {\n\tvoid a() {\n\t\tJButton b = null;\n\t\tadd(b);\n\t}\n}");
            let ast = editor.ast();
            let names: Vec<NodeId> = ast
                .descendants(ast.root())
                .into_iter()
                .filter(|&n| ast.identifier(n) == Some("b"))
                .collect();
            for name in names {
                editor.replace_identifier(name, "btn").unwrap();
            }
            assert!(editor.source().contains("JButton btn = null;\n\t\tadd(btn);"));
            assert_in_sync(&editor);
        }
    }
}
