pub mod error;
pub mod exit_status;
pub mod invoker;
pub mod locator;
pub mod process;
pub mod router;
pub mod search_path;

pub use error::DispatchError;
pub use exit_status::{translate, DISPATCH_FAILURE_EXIT_CODE};
pub use invoker::{InvocationRequest, InvocationResult, PluginInvoker};
pub use locator::{PluginCandidate, PluginEntry, Shadow};
pub use process::{ChildProcess, OsSpawner, Spawner, Termination};
pub use router::{CommandRouter, PluginDispatcher, Route};
pub use search_path::SearchPath;
