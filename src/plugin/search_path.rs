//! Ordered list of directories scanned for plugin executables.

use std::env;
use std::path::{Path, PathBuf};

use crate::config::DispatchEnv;
use crate::utils::paths::{plugins_dir_under, plugins_dir_under_home};

/// Directories consulted in precedence order. First match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        let mut unique: Vec<PathBuf> = Vec::with_capacity(dirs.len());
        for dir in dirs {
            if !unique.contains(&dir) {
                unique.push(dir);
            }
        }
        Self { dirs: unique }
    }

    /// Build the search path from the captured environment.
    ///
    /// A non-empty `PIPECTL_PLUGINS_DIR` is the only directory searched.
    /// Otherwise the user's plugin directory comes first, then `PATH`.
    /// Directories are not checked for existence here.
    pub fn resolve(env: &DispatchEnv) -> Self {
        if let Some(dir) = env.plugins_dir_override.as_ref().filter(|d| !d.is_empty()) {
            tracing::debug!("Plugin search path overridden: {:?}", dir);
            return Self::new(vec![PathBuf::from(dir)]);
        }

        let mut dirs = Vec::new();

        match env.xdg_config_home.as_ref().filter(|d| !d.is_empty()) {
            Some(config_home) => dirs.push(plugins_dir_under(Path::new(config_home))),
            None => {
                if let Some(home) = &env.home_dir {
                    dirs.push(plugins_dir_under_home(home));
                }
            }
        }

        if let Some(path) = &env.path {
            dirs.extend(env::split_paths(path).filter(|p| !p.as_os_str().is_empty()));
        }

        tracing::debug!("Plugin search path: {:?}", dirs);
        Self::new(dirs)
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}
