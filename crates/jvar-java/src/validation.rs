//! Java identifier validation and unique-name generation.

use std::collections::HashSet;

use thiserror::Error;

/// Error for validation failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid Java identifier.
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Java keywords and reserved literals that cannot be used as identifiers.
pub const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "false", "final",
    "finally", "float", "for", "goto", "if", "implements", "import", "instanceof", "int",
    "interface", "long", "native", "new", "null", "package", "private", "protected", "public",
    "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this", "throw",
    "throws", "transient", "true", "try", "void", "volatile", "while",
];

/// Check if a name is a Java keyword or reserved literal.
pub fn is_java_keyword(name: &str) -> bool {
    JAVA_KEYWORDS.contains(&name)
}

/// Validate that a string is a valid Java identifier.
///
/// Checks:
/// - Non-empty
/// - Starts with a letter, underscore or dollar sign
/// - Contains only letters, digits, underscores and dollar signs
/// - Not a Java keyword
///
/// # Examples
///
/// ```
/// use jvar_java::validation::validate_java_identifier;
///
/// assert!(validate_java_identifier("button").is_ok());
/// assert!(validate_java_identifier("m_button").is_ok());
/// assert!(validate_java_identifier("1button").is_err());
/// assert!(validate_java_identifier("class").is_err());
/// ```
pub fn validate_java_identifier(name: &str) -> ValidationResult<()> {
    let invalid = |reason: String| ValidationError::InvalidName {
        name: name.to_string(),
        reason,
    };
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(invalid("name cannot be empty".to_string()));
    };
    if !first.is_alphabetic() && first != '_' && first != '$' {
        return Err(invalid(
            "must start with letter, underscore or dollar sign".to_string(),
        ));
    }
    if let Some(ch) = chars.find(|&ch| !ch.is_alphanumeric() && ch != '_' && ch != '$') {
        return Err(invalid(format!("invalid character in identifier: '{}'", ch)));
    }
    if is_java_keyword(name) {
        return Err(invalid(
            "cannot use Java keyword as identifier".to_string(),
        ));
    }
    Ok(())
}

// ============================================================================
// UniqueNameGenerator
// ============================================================================

/// Generates names that do not collide with a set of names in use.
///
/// Collisions are resolved with numeric suffixes: `button`, `button_1`, `button_2`.
/// Java keywords are always treated as used.
#[derive(Debug, Default, Clone)]
pub struct UniqueNameGenerator {
    used_names: HashSet<String>,
}

impl UniqueNameGenerator {
    /// Create a generator with explicit used names.
    pub fn with_used_names(used_names: impl IntoIterator<Item = String>) -> Self {
        let mut names: HashSet<String> = used_names.into_iter().collect();
        names.extend(JAVA_KEYWORDS.iter().map(|k| k.to_string()));
        Self { used_names: names }
    }

    /// `base` when unused, otherwise the first free `base_N`.
    pub fn generate(&self, base: &str) -> String {
        self.generate_with(base, |i| format!("{}_{}", base, i))
    }

    /// `base` when unused, otherwise the first free `candidate(N)` for `N = 1, 2, ...`.
    pub fn generate_with(&self, base: &str, candidate: impl Fn(usize) -> String) -> String {
        if !self.is_in_use(base) {
            return base.to_string();
        }
        let mut i = 1;
        loop {
            let name = candidate(i);
            if !self.is_in_use(&name) {
                return name;
            }
            i += 1;
        }
    }

    /// Check if a name is already in use.
    pub fn is_in_use(&self, name: &str) -> bool {
        self.used_names.contains(name)
    }

    /// Add a name to the set of used names.
    pub fn mark_used(&mut self, name: &str) {
        self.used_names.insert(name.to_string());
    }
}

// ============================================================================
// Tests
// ============================================================================
