//! Script descriptor types

use std::path::PathBuf;

use serde::Serialize;

use crate::protocol::{ItemId, MenuItem};

/// How a script file is launched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScriptKind {
    /// `scpt`, `scptd`, `applescript`: run through the AppleScript interpreter
    AppleScript,
    /// `sh`: run through the shell
    ShellScript,
    /// No extension: executed directly
    Executable,
}

impl ScriptKind {
    /// Classify a file extension (case-insensitive). `None` means unsupported.
    ///
    /// The empty extension classifies as `Executable`.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "scpt" | "scptd" | "applescript" => Some(ScriptKind::AppleScript),
            "sh" => Some(ScriptKind::ShellScript),
            "" => Some(ScriptKind::Executable),
            _ => None,
        }
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            ScriptKind::AppleScript => "applescript",
            ScriptKind::ShellScript => "shellscript",
            ScriptKind::Executable => "executable",
        }
    }
}

/// One runnable script discovered in the scripts directory
///
/// Immutable once created; `id` equals the descriptor's position in the
/// registry that created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptDescriptor {
    pub id: ItemId,
    /// File name without its extension
    pub title: String,
    pub path: PathBuf,
    pub kind: ScriptKind,
}

impl ScriptDescriptor {
    /// The provider-facing view of this script
    pub fn menu_item(&self) -> MenuItem {
        MenuItem::new(self.id, self.title.clone())
    }
}
