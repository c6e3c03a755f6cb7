//! Runs a located plugin and collects how it ended.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use crate::plugin::process::{ChildProcess, OsSpawner, Spawner, Termination};

/// Everything needed to start one plugin process.
///
/// The child always inherits the parent's environment and standard streams;
/// `extra_env` is layered on top of the inherited environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub executable_path: PathBuf,
    /// Passed as a vector, never through a shell.
    pub arguments: Vec<OsString>,
    pub extra_env: BTreeMap<OsString, OsString>,
}

impl InvocationRequest {
    pub fn new<I, A>(executable_path: impl Into<PathBuf>, arguments: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self {
            executable_path: executable_path.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
            extra_env: BTreeMap::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.extra_env.insert(key.into(), value.into());
        self
    }
}

/// Outcome of one invocation. Exactly one variant applies.
///
/// `SpawnFailed` and `Lost` both mean no plugin status is available; they are
/// kept apart so the operator is told whether the plugin ever ran.
#[derive(Debug)]
pub enum InvocationResult {
    Exited(i32),
    Signaled(i32),
    /// No process ran.
    SpawnFailed(io::Error),
    /// The process ran but waiting on it failed. It was killed and reaped.
    Lost(io::Error),
}

impl From<Termination> for InvocationResult {
    fn from(termination: Termination) -> Self {
        match termination {
            Termination::Exited(code) => InvocationResult::Exited(code),
            Termination::Signaled(signal) => InvocationResult::Signaled(signal),
        }
    }
}

#[derive(Debug, Default)]
pub struct PluginInvoker<S: Spawner = OsSpawner> {
    spawner: S,
}

impl PluginInvoker<OsSpawner> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: Spawner> PluginInvoker<S> {
    pub fn with_spawner(spawner: S) -> Self {
        Self { spawner }
    }

    /// Start the plugin and block until it terminates. No timeout.
    pub fn invoke(&self, request: &InvocationRequest) -> InvocationResult {
        let mut child = match self.spawner.spawn(request) {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!("Failed to spawn {:?}: {}", request.executable_path, e);
                return InvocationResult::SpawnFailed(e);
            }
        };

        match child.wait() {
            Ok(termination) => {
                tracing::debug!(
                    "Plugin {:?} (pid {}) finished: {:?}",
                    request.executable_path,
                    child.id(),
                    termination
                );
                InvocationResult::from(termination)
            }
            Err(e) => {
                tracing::warn!("Lost track of plugin pid {}: {}", child.id(), e);
                // Don't leave it running unsupervised, or unreaped.
                if let Err(kill_err) = child.forward_signal(SIGKILL) {
                    tracing::warn!("Could not stop plugin pid {}: {}", child.id(), kill_err);
                }
                match child.wait() {
                    Ok(termination) => {
                        tracing::debug!("Reaped plugin pid {}: {:?}", child.id(), termination)
                    }
                    Err(reap_err) => {
                        tracing::warn!("Could not reap plugin pid {}: {}", child.id(), reap_err)
                    }
                }
                InvocationResult::Lost(e)
            }
        }
    }
}

#[cfg(unix)]
const SIGKILL: i32 = nix::libc::SIGKILL;
#[cfg(not(unix))]
const SIGKILL: i32 = 9;
