//! Text position and line-layout utilities.
//!
//! ## Coordinate Conventions
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Byte offsets are **0-indexed**
//!
//! Line scanning goes through `memchr`, the editor asks these helpers for indentation and
//! line boundaries around every insertion it performs.

use memchr::{memchr, memrchr};

use crate::patch::Span;

// ============================================================================
// Offset / position conversions
// ============================================================================

/// Convert a byte offset to 1-indexed line and column (Unicode-aware).
///
/// Columns count Unicode scalar values, not bytes. Offsets past the end clamp to the
/// end of content.
pub fn byte_offset_to_position(content: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 1u32;
    for (i, ch) in content.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Convert 1-indexed line and column to a byte offset (Unicode-aware).
///
/// A column beyond the end of its line clamps to the line end; a missing line returns the
/// content length.
pub fn position_to_byte_offset(content: &str, line: u32, col: u32) -> usize {
    let line = line.max(1);
    let col = col.max(1) as usize;

    let mut start = 0usize;
    for _ in 1..line {
        match memchr(b'\n', &content.as_bytes()[start..]) {
            Some(p) => start += p + 1,
            None => return content.len(),
        }
    }
    let end = line_end(content, start);
    content[start..end]
        .char_indices()
        .nth(col - 1)
        .map(|(i, _)| start + i)
        .unwrap_or(end)
}

// ============================================================================
// Line layout
// ============================================================================

/// Offset of the first byte of the line containing `offset`.
pub fn line_start(content: &str, offset: usize) -> usize {
    let offset = offset.min(content.len());
    memrchr(b'\n', &content.as_bytes()[..offset])
        .map(|p| p + 1)
        .unwrap_or(0)
}

/// Offset of the line terminator (`\n`, or `\r` of `\r\n`) of the line containing
/// `offset`, or the content length on the last line.
pub fn line_end(content: &str, offset: usize) -> usize {
    let offset = offset.min(content.len());
    let bytes = content.as_bytes();
    match memchr(b'\n', &bytes[offset..]) {
        Some(p) => {
            let nl = offset + p;
            if nl > offset && bytes[nl - 1] == b'\r' {
                nl - 1
            } else {
                nl
            }
        }
        None => content.len(),
    }
}

/// Offset just past the line terminator of the line containing `offset`.
pub fn next_line_start(content: &str, offset: usize) -> usize {
    let offset = offset.min(content.len());
    match memchr(b'\n', &content.as_bytes()[offset..]) {
        Some(p) => offset + p + 1,
        None => content.len(),
    }
}

/// Leading whitespace of the line containing `offset`.
pub fn line_indentation(content: &str, offset: usize) -> &str {
    let start = line_start(content, offset);
    let line = &content[start..line_end(content, start)];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

/// The whitespace between the start of the line and `offset`, or `""` when the line has
/// other characters before `offset`.
pub fn whitespace_to_left(content: &str, offset: usize) -> &str {
    let start = line_start(content, offset);
    let prefix = &content[start..offset.min(content.len())];
    if prefix.chars().all(|c| c == ' ' || c == '\t') {
        prefix
    } else {
        ""
    }
}

/// Check if only whitespace surrounds `span` on its first and last lines.
pub fn occupies_whole_lines(content: &str, span: Span) -> bool {
    let before = &content[line_start(content, span.start)..span.start];
    let after = &content[span.end..line_end(content, span.end)];
    before.trim().is_empty() && after.trim().is_empty()
}

/// The line terminator used by `content`: `"\r\n"` when present, else `"\n"`.
pub fn detect_line_ending(content: &str) -> &'static str {
    if content.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// The indentation unit of `content`.
///
/// A tab when any line is tab-indented, otherwise the narrowest non-zero run of leading
/// spaces. Defaults to a tab.
pub fn detect_indent_unit(content: &str) -> String {
    let mut narrowest: Option<usize> = None;
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with('\t') {
            return "\t".to_string();
        }
        let spaces = line.len() - line.trim_start_matches(' ').len();
        if spaces > 0 {
            narrowest = Some(narrowest.map_or(spaces, |n| n.min(spaces)));
        }
    }
    narrowest.map_or_else(|| "\t".to_string(), |n| " ".repeat(n))
}

/// Re-indent every line after the first: a leading `from` prefix becomes `to`.
pub fn reindent(text: &str, from: &str, to: &str) -> String {
    if from == to {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split_inclusive('\n').enumerate() {
        if i > 0 {
            if let Some(rest) = line.strip_prefix(from) {
                out.push_str(to);
                out.push_str(rest);
                continue;
            }
        }
        out.push_str(line);
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod conversions {
        use super::*;

        #[test]
        fn offset_to_position_counts_lines() {
            let content = "class A {\n  int x;\n}";
            assert_eq!(byte_offset_to_position(content, 0), (1, 1));
            assert_eq!(byte_offset_to_position(content, 12), (2, 3));
        }

        #[test]
        fn position_to_offset_round_trips() {
            let content = "class A {\n  int x;\n}";
            assert_eq!(position_to_byte_offset(content, 2, 3), 12);
            assert_eq!(position_to_byte_offset(content, 2, 99), 18);
            assert_eq!(position_to_byte_offset(content, 9, 1), content.len());
        }
    }

    mod layout {
        use super::*;

        #[test]
        fn line_boundaries() {
            let content = "a\r\n  bc\nd";
            assert_eq!(line_start(content, 5), 3);
            assert_eq!(line_end(content, 0), 1);
            assert_eq!(line_end(content, 4), 7);
            assert_eq!(next_line_start(content, 4), 8);
            assert_eq!(line_indentation(content, 6), "  ");
        }

        #[test]
        fn whitespace_to_left_requires_blank_prefix() {
            let content = "    foo();";
            assert_eq!(whitespace_to_left(content, 4), "    ");
            assert_eq!(whitespace_to_left(content, 7), "");
        }

        #[test]
        fn whole_line_detection() {
            let content = "  a();\n  b(); c();\n";
            assert!(occupies_whole_lines(content, Span::new(2, 6)));
            assert!(!occupies_whole_lines(content, Span::new(9, 13)));
        }

        #[test]
        fn indent_unit_detection() {
            assert_eq!(detect_indent_unit("class A {\n  int x;\n    int y;\n}"), "  ");
            assert_eq!(detect_indent_unit("class A {\n\tint x;\n}"), "\t");
            assert_eq!(detect_indent_unit("class A {}"), "\t");
            assert_eq!(detect_line_ending("a\r\nb"), "\r\n");
        }

        #[test]
        fn reindent_skips_first_line() {
            let text = "if (a) {\n    b();\n  }";
            assert_eq!(reindent(text, "  ", "    "), "if (a) {\n      b();\n    }");
        }
    }
}
