//! Wire records shared by both processes

use serde::{Deserialize, Serialize};

/// Identifier of a menu item within one daemon run.
///
/// Equal to the script's position in the registry. Negative values never
/// match a script but are representable on the wire.
pub type ItemId = i64;

/// One user-visible entry of the context menu
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: ItemId,
    pub title: String,
}

impl MenuItem {
    pub fn new(id: ItemId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

/// A single click on a menu item, aimed at the folder the user right-clicked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub id: ItemId,
    /// Absolute path of the clicked folder
    pub target: String,
}

impl ClickEvent {
    pub fn new(id: ItemId, target: impl Into<String>) -> Self {
        Self {
            id,
            target: target.into(),
        }
    }
}
