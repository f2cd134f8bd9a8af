//! Variable preferences and their per-toolkit store.
//!
//! Preferences are plain serde structs. Every field has a default, so a JSON file only
//! needs to name the keys it changes.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::VariableResult;

/// When a change of a component's text renames its variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextRenameMode {
    Never,
    /// Only while the variable still has the component's default name.
    #[default]
    Default,
    Always,
}

/// Type-specific naming for one component class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameDescription {
    pub class_name: String,
    pub name: String,
    pub acronym: String,
    /// Create components of this class as fields instead of locals.
    #[serde(default)]
    pub as_field: bool,
}

/// Preferences consulted by the variable layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariablePreferences {
    /// Modifier text (with trailing space) of fields created by conversions.
    pub field_modifier: String,
    /// Declare locals created by conversions as `final`.
    pub declare_final: bool,
    /// Qualify field reads with `this.` in instance contexts.
    pub prefix_this: bool,
    /// Modifier text (with trailing space) of lazy accessors.
    pub lazy_method_modifier: String,
    pub text_rename_mode: TextRenameMode,
    pub text_template: String,
    /// Words of the text used in names, `0` for no limit.
    pub text_words_limit: usize,
    pub field_prefix: String,
    pub field_suffix: String,
    pub local_prefix: String,
    pub local_suffix: String,
    pub name_descriptions: Vec<NameDescription>,
}

impl Default for VariablePreferences {
    fn default() -> Self {
        VariablePreferences {
            field_modifier: "private ".to_string(),
            declare_final: false,
            prefix_this: false,
            lazy_method_modifier: "private ".to_string(),
            text_rename_mode: TextRenameMode::Default,
            text_template: "${class_acronym}${text}".to_string(),
            text_words_limit: 3,
            field_prefix: String::new(),
            field_suffix: String::new(),
            local_prefix: String::new(),
            local_suffix: String::new(),
            name_descriptions: Vec::new(),
        }
    }
}

impl VariablePreferences {
    /// The type-specific naming for a qualified class name.
    pub fn name_description(&self, class_name: &str) -> Option<&NameDescription> {
        self.name_descriptions.iter().find(|d| d.class_name == class_name)
    }
}

/// Preferences per toolkit id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceStore {
    #[serde(flatten)]
    toolkits: BTreeMap<String, VariablePreferences>,
}

impl PreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a JSON object keyed by toolkit id.
    pub fn load(path: &Path) -> VariableResult<Self> {
        let text = fs::read_to_string(path)?;
        let store: PreferenceStore = serde_json::from_str(&text)?;
        debug!(path = %path.display(), toolkits = store.toolkits.len(), "loaded preferences");
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> VariableResult<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// The preferences of a toolkit, defaults when it has none.
    pub fn preferences(&self, toolkit: &str) -> VariablePreferences {
        self.toolkits.get(toolkit).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, toolkit: impl Into<String>, preferences: VariablePreferences) {
        self.toolkits.insert(toolkit.into(), preferences);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let prefs: VariablePreferences = serde_json::from_str(r#"{"prefix_this": true}"#).unwrap();
        assert!(prefs.prefix_this);
        assert_eq!(prefs.field_modifier, "private ");
        assert_eq!(prefs.text_template, "${class_acronym}${text}");
        assert_eq!(prefs.text_rename_mode, TextRenameMode::Default);
    }

    #[test]
    fn unknown_toolkit_gets_defaults() {
        let store = PreferenceStore::new();
        assert_eq!(store.preferences("swing"), VariablePreferences::default());
    }

    #[test]
    fn name_description_lookup() {
        let prefs = VariablePreferences {
            name_descriptions: vec![NameDescription {
                class_name: "javax.swing.JButton".into(),
                name: "button".into(),
                acronym: "b".into(),
                as_field: true,
            }],
            ..Default::default()
        };
        assert!(prefs.name_description("javax.swing.JButton").unwrap().as_field);
        assert!(prefs.name_description("javax.swing.JLabel").is_none());
    }
}
