//! Java source model for jvar.
//!
//! This crate provides the source-level collaborators of the variable core:
//! - A `peg` grammar for the Java subset used by GUI construction code
//! - An arena syntax tree whose nodes keep their identity across edits
//! - The `SourceEditor`, which owns the text and the tree and keeps them in sync
//! - Lexical name resolution, visibility queries and execution-flow ordering
//! - Java identifier validation and unique name generation

pub mod ast;
pub mod editor;
pub mod flow;
pub mod parser;
pub mod syntax;
pub mod target;
pub mod validation;

pub use ast::{Ast, Node, NodeId};
pub use editor::{EditError, EditResult, SourceEditor};
pub use flow::{Declaration, DeclarationKind, FlowDescription};
pub use parser::ParseError;
pub use syntax::{Modifiers, NodeKind, Syntax};
pub use target::{BodyDeclarationTarget, NodeTarget, StatementTarget};
pub use validation::{validate_java_identifier, UniqueNameGenerator, ValidationError};
