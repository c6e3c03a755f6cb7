use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures where no plugin status can be reported.
///
/// Apart from `Lost`, these happen before a plugin process exists. A plugin
/// exiting non-zero is not one of these; its code is propagated as-is by the
/// exit status translation.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(
        "unknown command \"{name}\" for \"pipectl\": no built-in command or plugin named \"{name}\"\nRun 'pipectl plugin list' to see available plugins."
    )]
    UnknownCommand { name: String, searched: Vec<PathBuf> },

    #[error("plugin \"{name}\" found at {path:?} but it is not executable (try: chmod +x {path:?})")]
    NotExecutable { name: String, path: PathBuf },

    #[error("failed to run plugin {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The plugin started but its status could not be collected. By the time
    /// this is returned it has been killed and waited on again.
    #[error("lost track of plugin {path:?} while waiting for it: {source}")]
    Lost {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
