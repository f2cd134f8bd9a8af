//! Variable names and acronyms for component classes.
//!
//! Names come from three sources, most specific first: a type-specific description in the
//! preferences, the toolkit's override for the class, and the rules applied to the simple
//! class name. Text-based names fill a user template:
//!
//! | Variable | Value for `javax.swing.JButton`, text `"New button"` |
//! |---|---|
//! | `${class_name}` | `Button` |
//! | `${class_acronym}` | `btn` |
//! | `${default_name}` | `button` |
//! | `${text}` | `NewButton` |

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::VariablePreferences;
use crate::toolkit::{simple_name, ToolkitDescription};

const TEMPLATE_VARIABLES: [&str; 4] = ["class_name", "text", "default_name", "class_acronym"];

static TEMPLATE_VARIABLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_]+)\}").unwrap());
static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Replace `${key}` with its value; unknown keys stay as written.
fn substitute(template: &str, values: &BTreeMap<&str, String>) -> String {
    TEMPLATE_VARIABLE
        .replace_all(template, |caps: &Captures| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

pub fn uncapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Drop leading uppercase characters, keeping the last `keep` of them.
fn strip_leading_uppercase(name: &str, keep: usize) -> &str {
    let leading = name.chars().take_while(|c| c.is_uppercase()).count();
    let drop = leading.saturating_sub(keep);
    let offset = name.char_indices().nth(drop).map_or(name.len(), |(i, _)| i);
    &name[offset..]
}

fn remove_duplicate_characters(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = None;
    for ch in text.chars() {
        if last != Some(ch) {
            out.push(ch);
        }
        last = Some(ch);
    }
    out
}

/// The default base name of a class.
///
/// ```
/// use jvar::names::default_name;
///
/// assert_eq!(default_name("javax.swing.JButton"), "button");
/// assert_eq!(default_name("java.awt.GridBagLayout"), "gridBagLayout");
/// assert_eq!(default_name("test.URL"), "url");
/// assert_eq!(default_name("test.lower"), "lower_");
/// ```
pub fn default_name(qualified: &str) -> String {
    let name = simple_name(qualified);
    if name.chars().all(|c| c.is_uppercase()) {
        return name.to_lowercase();
    }
    if name.chars().next().is_some_and(|c| c.is_lowercase()) {
        return format!("{}_", name);
    }
    let chars: Vec<char> = name.chars().collect();
    let mut index = 0;
    while index + 1 < chars.len() && chars[index + 1].is_uppercase() {
        index += 1;
    }
    uncapitalize(&chars[index..].iter().collect::<String>())
}

/// The default acronym of a class: `JButton` → `btn`, `StyledText` → `stldtxt`.
pub fn default_acronym(qualified: &str) -> String {
    let short = simple_name(qualified);
    let acronym: String = strip_leading_uppercase(short, 1)
        .to_lowercase()
        .chars()
        .filter(|c| !"aeiouy".contains(*c))
        .collect();
    let acronym = remove_duplicate_characters(&acronym);
    if acronym.is_empty() {
        short.to_string()
    } else {
        acronym
    }
}

/// Check a name template. Returns the evaluated template when it still holds a `$`
/// (an unsupported or misspelled variable).
pub fn validate_template(template: &str) -> Option<String> {
    let values = TEMPLATE_VARIABLES.iter().map(|&k| (k, String::new())).collect();
    let evaluated = substitute(template, &values);
    evaluated.contains('$').then_some(evaluated)
}

fn capitalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if at_word_start && !ch.is_whitespace() {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = ch.is_whitespace();
    }
    out
}

/// Naming policy for one toolkit and its preferences.
#[derive(Debug, Clone, Copy)]
pub struct NamesManager<'a> {
    toolkit: &'a ToolkitDescription,
    preferences: &'a VariablePreferences,
}

impl<'a> NamesManager<'a> {
    pub fn new(toolkit: &'a ToolkitDescription, preferences: &'a VariablePreferences) -> Self {
        NamesManager { toolkit, preferences }
    }

    /// The base variable name for a component class.
    pub fn name(&self, class_name: &str) -> String {
        if let Some(description) = self.preferences.name_description(class_name) {
            return description.name.clone();
        }
        self.toolkit
            .component(class_name)
            .and_then(|c| c.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| default_name(class_name))
    }

    pub fn acronym(&self, class_name: &str) -> String {
        if let Some(description) = self.preferences.name_description(class_name) {
            return description.acronym.clone();
        }
        self.toolkit
            .component(class_name)
            .and_then(|c| c.acronym.clone())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| default_acronym(class_name))
    }

    /// Whether new components of this class become fields instead of locals.
    pub fn should_use_field(&self, class_name: &str) -> bool {
        self.preferences
            .name_description(class_name)
            .is_some_and(|d| d.as_field)
    }

    /// Check if `name` is the class's default name, ignoring a `_N` suffix and case.
    pub fn is_default_name(&self, class_name: &str, name: &str) -> bool {
        let base = name.split('_').next().unwrap_or(name).to_lowercase();
        self.name(class_name).eq_ignore_ascii_case(&base)
    }

    /// The name for a component showing `text`, before decoration and uniqueness. `None`
    /// when the text leaves no usable characters.
    pub fn name_for_text(&self, class_name: &str, text: &str) -> Option<String> {
        let mut part = capitalize_words(&text.to_lowercase());
        part = HTML_TAG.replace_all(&part, "").into_owned();
        let limit = self.preferences.text_words_limit;
        if limit > 0 {
            let words: Vec<&str> = part.split_whitespace().collect();
            if words.len() > limit {
                part = words[..limit].concat();
            }
        }
        part.retain(|c| c.is_ascii_alphanumeric() || c == '_');
        if part.is_empty() {
            return None;
        }
        let values: BTreeMap<&str, String> = [
            ("class_name", strip_leading_uppercase(simple_name(class_name), 1).to_string()),
            ("text", part),
            ("default_name", self.name(class_name)),
            ("class_acronym", self.acronym(class_name)),
        ]
        .into_iter()
        .collect();
        Some(uncapitalize(&substitute(&self.preferences.text_template, &values)))
    }
}

/// Strip a numeric `_N` suffix: `button_2` → `button`.
pub fn strip_numeric_suffix(name: &str) -> &str {
    match name.rsplit_once('_') {
        Some((base, digits)) if !base.is_empty() && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            base
        }
        _ => name,
    }
}

/// Remove `prefix` and `suffix` from `name` when both are present and leave something.
pub fn strip_decoration<'n>(name: &'n str, prefix: &str, suffix: &str) -> &'n str {
    name.strip_prefix(prefix)
        .and_then(|rest| rest.strip_suffix(suffix))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(name)
}

/// `prefix + name + suffix`, capitalizing the name after a non-empty prefix that does not
/// end with `_`.
pub fn decorate(name: &str, prefix: &str, suffix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('_') {
        format!("{}{}{}", prefix, name, suffix)
    } else {
        format!("{}{}{}", prefix, capitalize(name), suffix)
    }
}

/// Convert a local name to a field name under the naming preferences.
pub fn local_to_field_name(preferences: &VariablePreferences, local: &str) -> String {
    let base = strip_numeric_suffix(local);
    let base = strip_decoration(base, &preferences.local_prefix, &preferences.local_suffix);
    let base = if preferences.local_prefix.is_empty() || preferences.local_prefix.ends_with('_') {
        base.to_string()
    } else {
        uncapitalize(base)
    };
    decorate(&base, &preferences.field_prefix, &preferences.field_suffix)
}

/// Convert a field name to a local name under the naming preferences.
pub fn field_to_local_name(preferences: &VariablePreferences, field: &str) -> String {
    let base = strip_decoration(field, &preferences.field_prefix, &preferences.field_suffix);
    let base = if preferences.field_prefix.is_empty() || preferences.field_prefix.ends_with('_') {
        base.to_string()
    } else {
        uncapitalize(base)
    };
    decorate(&base, &preferences.local_prefix, &preferences.local_suffix)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NameDescription;

    mod defaults {
        use super::*;

        #[test]
        fn default_names() {
            assert_eq!(default_name("javax.swing.JButton"), "button");
            assert_eq!(default_name("org.eclipse.swt.widgets.Button"), "button");
            assert_eq!(default_name("org.eclipse.swt.custom.StyledText"), "styledText");
            assert_eq!(default_name("test.JTextField"), "textField");
            assert_eq!(default_name("test.ABC"), "abc");
            assert_eq!(default_name("test.myWidget"), "myWidget_");
        }

        #[test]
        fn default_acronyms() {
            assert_eq!(default_acronym("javax.swing.JButton"), "btn");
            assert_eq!(default_acronym("org.eclipse.swt.widgets.Button"), "btn");
            assert_eq!(default_acronym("org.eclipse.swt.custom.StyledText"), "stldtxt");
            assert_eq!(default_acronym("test.Aye"), "Aye");
        }

        #[test]
        fn numeric_suffix() {
            assert_eq!(strip_numeric_suffix("button_2"), "button");
            assert_eq!(strip_numeric_suffix("button_x"), "button_x");
            assert_eq!(strip_numeric_suffix("_1"), "_1");
            assert_eq!(strip_numeric_suffix("button"), "button");
        }
    }

    // ========================================================================
    // NamesManager
    // ========================================================================

    mod manager {
        use super::*;

        fn prefs() -> VariablePreferences {
            VariablePreferences::default()
        }

        #[test]
        fn type_specific_description_wins() {
            let toolkit = ToolkitDescription::swing();
            let mut preferences = prefs();
            preferences.name_descriptions.push(NameDescription {
                class_name: "javax.swing.JButton".into(),
                name: "pushButton".into(),
                acronym: "pb".into(),
                as_field: true,
            });
            let names = NamesManager::new(&toolkit, &preferences);
            assert_eq!(names.name("javax.swing.JButton"), "pushButton");
            assert_eq!(names.acronym("javax.swing.JButton"), "pb");
            assert!(names.should_use_field("javax.swing.JButton"));
            assert_eq!(names.name("javax.swing.JLabel"), "label");
            assert!(!names.should_use_field("javax.swing.JLabel"));
        }

        #[test]
        fn text_names_follow_template() {
            let toolkit = ToolkitDescription::swing();
            let preferences = prefs();
            let names = NamesManager::new(&toolkit, &preferences);
            assert_eq!(
                names.name_for_text("javax.swing.JButton", "New button").as_deref(),
                Some("btnNewButton")
            );
            assert_eq!(
                names.name_for_text("javax.swing.JLabel", "<html><b>Name</b></html>").as_deref(),
                Some("lblname")
            );
            assert_eq!(names.name_for_text("javax.swing.JLabel", "  ").as_deref(), None);
            assert_eq!(names.name_for_text("javax.swing.JLabel", "!!!").as_deref(), None);
        }

        #[test]
        fn word_limit_concatenates_first_words() {
            let toolkit = ToolkitDescription::swing();
            let preferences = VariablePreferences {
                text_words_limit: 2,
                text_template: "${text}${class_name}".into(),
                ..prefs()
            };
            let names = NamesManager::new(&toolkit, &preferences);
            assert_eq!(
                names.name_for_text("javax.swing.JButton", "save all open files").as_deref(),
                Some("saveAllButton")
            );
        }

        #[test]
        fn default_name_detection_ignores_suffix() {
            let toolkit = ToolkitDescription::swing();
            let preferences = prefs();
            let names = NamesManager::new(&toolkit, &preferences);
            assert!(names.is_default_name("javax.swing.JButton", "button_3"));
            assert!(names.is_default_name("javax.swing.JButton", "Button"));
            assert!(!names.is_default_name("javax.swing.JButton", "btnOk"));
        }
    }

    mod templates {
        use super::*;

        #[test]
        fn valid_template() {
            assert_eq!(validate_template("${class_acronym}${text}"), None);
            assert_eq!(validate_template("m_${default_name}"), None);
        }

        #[test]
        fn invalid_template_reports_evaluation() {
            assert_eq!(validate_template("${Text}x").as_deref(), Some("${Text}x"));
            assert_eq!(validate_template("${class_name}$").as_deref(), Some("$"));
        }
    }

    mod decoration {
        use super::*;

        #[test]
        fn conversions_between_conventions() {
            let preferences = VariablePreferences {
                field_prefix: "m_".into(),
                ..VariablePreferences::default()
            };
            assert_eq!(local_to_field_name(&preferences, "button_1"), "m_button");
            assert_eq!(field_to_local_name(&preferences, "m_button"), "button");

            let preferences = VariablePreferences {
                field_prefix: "f".into(),
                ..VariablePreferences::default()
            };
            assert_eq!(local_to_field_name(&preferences, "button"), "fButton");
            assert_eq!(field_to_local_name(&preferences, "fButton"), "button");
        }
    }
}
