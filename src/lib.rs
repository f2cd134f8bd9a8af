//! jvar: variable management for a Java GUI designer.
//!
//! A designer models the widgets created by a Java class as a tree of components. Each
//! component is referenced in source through a variable: a local, a field, a lazy
//! accessor, an unnamed creation expression, `this`, or something the parent exposes.
//! This crate decides how to reference a component at a given position and rewrites the
//! source when that needs a conversion (materializing an expression, moving statements,
//! turning a local into a field).
//!
//! ```no_run
//! use jvar::{Design, ToolkitDescription, VariablePreferences};
//!
//! let source = std::fs::read_to_string("Test.java").unwrap();
//! let mut design = Design::parse(source, ToolkitDescription::swing(), VariablePreferences::default()).unwrap();
//! let button = design.find("b").unwrap();
//! let (_, record) = design.edit(|design| design.set_name(button, "btn")).unwrap();
//! println!("{}", record.diff);
//! ```

// Ambient infrastructure
pub mod config;
pub mod error;
pub mod logging;
pub mod toolkit;

// Component model and variables
pub mod model;
pub mod names;
pub mod property;
pub mod variable;

#[cfg(test)]
mod test_helpers;

pub use config::{PreferenceStore, TextRenameMode, VariablePreferences};
pub use error::{VariableError, VariableResult};
pub use model::{
    AddAssociation, AddStrategy, Association, Component, ComponentId, Design, EditMode, EditRecord,
    VariableEvent,
};
pub use names::NamesManager;
pub use property::VariableProperty;
pub use toolkit::ToolkitDescription;
pub use variable::{LazyAccessor, LazyConversion, Variable};

pub use jvar_java::{NodeId, NodeTarget, StatementTarget};
