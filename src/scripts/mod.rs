//! Scripts module - discovery and description of runnable scripts
//!
//! # Module Structure
//!
//! - `types` - `ScriptKind` and `ScriptDescriptor`
//! - `loader` - `ScriptRegistry`, built once by scanning the scripts directory

mod loader;
mod types;

pub use loader::{classify, ScriptRegistry};
pub use types::{ScriptDescriptor, ScriptKind};

#[cfg(test)]
pub(crate) use loader::descriptor_for;

#[cfg(test)]
#[path = "../scripts_tests.rs"]
mod tests;
