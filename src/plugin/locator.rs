//! Plugin lookup on the search path.
//!
//! A plugin for command `foo` is an executable named `pipectl-foo` in one of
//! the search directories. The first directory holding an executable match
//! wins; later directories are never consulted for that lookup.

use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::plugin::error::DispatchError;
use crate::plugin::search_path::SearchPath;

/// File name prefix every plugin executable carries.
pub const PLUGIN_PREFIX: &str = "pipectl-";

/// A file that matched the naming convention for a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginCandidate {
    pub command_name: String,
    pub directory: PathBuf,
    pub absolute_path: PathBuf,
    pub is_executable: bool,
}

impl PluginCandidate {
    fn inspect(command_name: &str, directory: &Path) -> Option<Self> {
        let path = directory.join(plugin_file_name(command_name));
        let metadata = fs::metadata(&path).ok()?;
        if !metadata.is_file() {
            return None;
        }

        Some(Self {
            command_name: command_name.to_string(),
            directory: directory.to_path_buf(),
            absolute_path: std::path::absolute(&path).unwrap_or(path),
            is_executable: is_executable(&metadata),
        })
    }
}

/// Why a listed plugin would not run when its name is typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum Shadow {
    /// A built-in command has the same name.
    Builtin,
    /// An earlier search directory holds an executable with the same name.
    Plugin(PathBuf),
}

/// One `pipectl-*` file seen while listing the search path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginEntry {
    pub name: String,
    pub path: PathBuf,
    pub executable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadowed_by: Option<Shadow>,
}

impl PluginEntry {
    /// Whether typing `pipectl <name>` would run this file.
    pub fn is_active(&self) -> bool {
        self.executable && self.shadowed_by.is_none()
    }
}

pub fn plugin_file_name(command_name: &str) -> String {
    format!("{}{}", PLUGIN_PREFIX, command_name)
}

/// Names that could walk out of a search directory never match anything.
fn is_valid_command_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains(std::path::MAIN_SEPARATOR)
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    true
}

/// Find the plugin executable for `command_name`.
///
/// Files lacking execute permission are skipped. If nothing executable turns
/// up anywhere, the first non-executable match is reported as
/// [`DispatchError::NotExecutable`] so the operator sees a permission problem
/// rather than a plain unknown command.
pub fn find(command_name: &str, search_path: &SearchPath) -> Result<PluginCandidate, DispatchError> {
    let mut not_executable: Option<PluginCandidate> = None;

    if is_valid_command_name(command_name) {
        for dir in search_path.dirs() {
            let Some(candidate) = PluginCandidate::inspect(command_name, dir) else {
                continue;
            };

            if candidate.is_executable {
                tracing::debug!(
                    "Resolved plugin '{}' to {:?}",
                    command_name,
                    candidate.absolute_path
                );
                return Ok(candidate);
            }

            tracing::debug!(
                "Skipping non-executable plugin candidate {:?}",
                candidate.absolute_path
            );
            if not_executable.is_none() {
                not_executable = Some(candidate);
            }
        }
    }

    match not_executable {
        Some(candidate) => Err(DispatchError::NotExecutable {
            name: candidate.command_name,
            path: candidate.absolute_path,
        }),
        None => Err(DispatchError::UnknownCommand {
            name: command_name.to_string(),
            searched: search_path.dirs().to_vec(),
        }),
    }
}

/// Every plugin file on the search path, in precedence order.
///
/// Entries that `find` would never return are kept and annotated, so
/// collisions between directories and with built-ins are visible.
pub fn list(search_path: &SearchPath, builtins: &[String]) -> Vec<PluginEntry> {
    let mut entries = Vec::new();
    let mut winners: HashMap<String, PathBuf> = HashMap::new();

    for dir in search_path.dirs() {
        let read_dir = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                tracing::debug!("Skipping plugin directory {:?}: {}", dir, e);
                continue;
            }
        };

        let mut names: Vec<String> = read_dir
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter_map(|file_name| file_name.strip_prefix(PLUGIN_PREFIX).map(str::to_string))
            .filter(|name| is_valid_command_name(name))
            .collect();
        names.sort();

        for name in names {
            let Some(candidate) = PluginCandidate::inspect(&name, dir) else {
                continue;
            };

            let shadowed_by = if builtins.iter().any(|b| b == &name) {
                Some(Shadow::Builtin)
            } else {
                winners.get(&name).cloned().map(Shadow::Plugin)
            };

            if candidate.is_executable && !winners.contains_key(&name) {
                winners.insert(name.clone(), candidate.absolute_path.clone());
            }

            entries.push(PluginEntry {
                name,
                path: candidate.absolute_path,
                executable: candidate.is_executable,
                shadowed_by,
            });
        }
    }

    entries
}
