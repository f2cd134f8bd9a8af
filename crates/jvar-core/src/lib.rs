//! Core infrastructure for jvar.
//!
//! This crate provides language-agnostic infrastructure:
//! - Spans, applied text edits and content hashes
//! - Text position and line-layout utilities
//! - Unified diff generation
//! - Stable error codes

pub mod diff;
pub mod error;
pub mod patch;
pub mod text;

pub use error::ErrorCode;
pub use patch::{ContentHash, Span, SpanError, TextEdit};
