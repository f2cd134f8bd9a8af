//! Unified diff generation utilities.
//!
//! Produces a single-hunk unified diff between two versions of one file. Edits made by
//! one variable operation are local, so the changed region between the first and the
//! last differing line is reported as one hunk with surrounding context.

const CONTEXT: usize = 3;

/// Generate a unified diff of `before` → `after` for `file`.
///
/// Returns an empty string when the contents are identical.
pub fn generate_unified_diff(file: &str, before: &str, after: &str) -> String {
    if before == after {
        return String::new();
    }
    let old: Vec<&str> = before.lines().collect();
    let new: Vec<&str> = after.lines().collect();

    let prefix = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let start = prefix.saturating_sub(CONTEXT);
    let old_end = (old.len() - suffix + CONTEXT).min(old.len());
    let new_end = (new.len() - suffix + CONTEXT).min(new.len());

    let mut diff = String::new();
    diff.push_str(&format!("--- a/{}\n", file));
    diff.push_str(&format!("+++ b/{}\n", file));
    diff.push_str(&format!(
        "@@ -{},{} +{},{} @@\n",
        start + 1,
        old_end - start,
        start + 1,
        new_end - start
    ));
    for line in &old[start..prefix] {
        diff.push_str(&format!(" {}\n", line));
    }
    for line in &old[prefix..old.len() - suffix] {
        diff.push_str(&format!("-{}\n", line));
    }
    for line in &new[prefix..new.len() - suffix] {
        diff.push_str(&format!("+{}\n", line));
    }
    for line in &old[old.len() - suffix..old_end] {
        diff.push_str(&format!(" {}\n", line));
    }
    diff
}

// ============================================================================
// Tests
// ============================================================================
