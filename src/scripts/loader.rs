//! Script discovery from the file system
//!
//! Scans a single directory (conventionally `~/.findermenu`) once and builds
//! an immutable, ordered registry. Entries are never re-scanned; scripts added
//! after the scan stay invisible until a new registry is built.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use super::types::{ScriptDescriptor, ScriptKind};
use crate::protocol::{ItemId, MenuItem};

/// Ordered, immutable collection of the scripts found at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptRegistry {
    scripts: Vec<ScriptDescriptor>,
}

impl ScriptRegistry {
    /// Scan `dir` and register every supported script in enumeration order.
    ///
    /// Never fails: a missing, unreadable or non-directory path yields an empty
    /// registry, and bad entries are skipped with a diagnostic.
    #[instrument(level = "debug", skip_all, fields(dir = %dir.display()))]
    pub fn scan(dir: &Path) -> Self {
        info!(dir = %dir.display(), "Scanning scripts directory");

        if !dir.is_dir() {
            warn!(dir = %dir.display(), "Scripts path is not a directory");
            return Self::default();
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, dir = %dir.display(), "Failed to read scripts directory");
                return Self::default();
            }
        };

        let mut scripts: Vec<ScriptDescriptor> = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Failed to read directory entry");
                    continue;
                }
            };

            let path = entry.path();
            if is_hidden(&entry.file_name()) {
                debug!(path = %path.display(), "Skipping hidden entry");
                continue;
            }

            // id is the next free position, so ids stay gap-free
            let id = scripts.len() as ItemId;
            if let Some(descriptor) = descriptor_for(&path, id) {
                debug!(
                    id = descriptor.id,
                    title = %descriptor.title,
                    kind = descriptor.kind.label(),
                    "Registered script"
                );
                scripts.push(descriptor);
            }
        }

        info!(count = scripts.len(), "Script registry built");
        Self { scripts }
    }

    /// Build a registry from already-made descriptors, renumbering ids by position
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ScriptDescriptor>) -> Self {
        let scripts = descriptors
            .into_iter()
            .enumerate()
            .map(|(position, mut descriptor)| {
                descriptor.id = position as ItemId;
                descriptor
            })
            .collect();
        Self { scripts }
    }

    /// Look up a script by id. Negative or out-of-range ids yield `None`.
    pub fn get(&self, id: ItemId) -> Option<&ScriptDescriptor> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.scripts.get(index))
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScriptDescriptor> {
        self.scripts.iter()
    }

    /// The snapshot published to the menu provider
    pub fn menu_items(&self) -> Vec<MenuItem> {
        self.scripts.iter().map(ScriptDescriptor::menu_item).collect()
    }
}

/// Classify a path by its extension. `None` means the file type is unsupported.
pub fn classify(path: &Path) -> Option<ScriptKind> {
    let extension = path.extension().map(OsStr::to_string_lossy);
    ScriptKind::from_extension(extension.as_deref().unwrap_or(""))
}

/// Build the descriptor for one directory entry, or `None` (with a log line)
/// if the entry cannot be offered as a menu item.
pub(crate) fn descriptor_for(path: &Path, id: ItemId) -> Option<ScriptDescriptor> {
    let Some(kind) = classify(path) else {
        debug!(path = %path.display(), "Unsupported script type");
        return None;
    };

    if !is_readable_script(path, kind) {
        warn!(path = %path.display(), "Script is not a file or not accessible");
        return None;
    }

    let title = match path.file_stem() {
        Some(stem) if !stem.is_empty() => stem.to_string_lossy().into_owned(),
        _ => {
            warn!(path = %path.display(), "File name is not available to use as a title");
            return None;
        }
    };

    if kind == ScriptKind::Executable && !has_execute_bit(path) {
        warn!(
            path = %path.display(),
            "Executable script has no execute permission; launching it will fail"
        );
    }

    Some(ScriptDescriptor {
        id,
        title,
        path: PathBuf::from(path),
        kind,
    })
}

fn is_hidden(file_name: &OsStr) -> bool {
    file_name.to_string_lossy().starts_with('.')
}

/// Regular readable file, or a listable `.scptd` bundle for AppleScript.
/// Symlinks are followed.
fn is_readable_script(path: &Path, kind: ScriptKind) -> bool {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            debug!(error = %e, path = %path.display(), "Failed to stat script");
            return false;
        }
    };

    if metadata.is_file() {
        return fs::File::open(path).is_ok();
    }

    let is_bundle = kind == ScriptKind::AppleScript
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("scptd"));
    metadata.is_dir() && is_bundle && fs::read_dir(path).is_ok()
}

#[cfg(unix)]
fn has_execute_bit(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|metadata| metadata.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn has_execute_bit(_path: &Path) -> bool {
    true
}
