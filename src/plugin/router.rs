//! Decides whether an argument vector is a built-in command or a plugin, and
//! runs the plugin when it is one.

use std::ffi::OsString;

use crate::config::PluginsConfig;
use crate::plugin::error::DispatchError;
use crate::plugin::invoker::{InvocationRequest, InvocationResult, PluginInvoker};
use crate::plugin::locator;
use crate::plugin::process::{OsSpawner, Spawner};
use crate::plugin::search_path::SearchPath;

/// Where an argument vector goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Hand the whole vector to the built-in command parser.
    Builtin,
    /// Look up a plugin named `name` and forward `args` to it.
    Plugin { name: String, args: Vec<OsString> },
}

#[derive(Debug, Clone)]
pub struct CommandRouter {
    builtins: Vec<String>,
}

impl CommandRouter {
    pub fn new<I, S>(builtins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            builtins: builtins.into_iter().map(Into::into).collect(),
        }
    }

    pub fn builtins(&self) -> &[String] {
        &self.builtins
    }

    /// Exact, case-sensitive membership test.
    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.iter().any(|b| b == name)
    }

    /// Route `args` (program name already stripped).
    ///
    /// Only the first token is ever considered as a plugin name, and only when
    /// it is not a flag and not a built-in. Built-ins therefore always win.
    pub fn route(&self, args: &[OsString]) -> Route {
        let Some((first, rest)) = args.split_first() else {
            return Route::Builtin;
        };
        let Some(token) = first.to_str() else {
            return Route::Builtin;
        };
        if token.starts_with('-') || self.is_builtin(token) {
            return Route::Builtin;
        }

        Route::Plugin {
            name: token.to_string(),
            args: rest.to_vec(),
        }
    }
}

/// Resolves a plugin name and runs it.
#[derive(Debug)]
pub struct PluginDispatcher<'a, S: Spawner = OsSpawner> {
    search_path: &'a SearchPath,
    plugins: &'a PluginsConfig,
    invoker: PluginInvoker<S>,
}

impl<'a> PluginDispatcher<'a, OsSpawner> {
    pub fn new(search_path: &'a SearchPath, plugins: &'a PluginsConfig) -> Self {
        Self::with_invoker(search_path, plugins, PluginInvoker::new())
    }
}

impl<'a, S: Spawner> PluginDispatcher<'a, S> {
    pub fn with_invoker(
        search_path: &'a SearchPath,
        plugins: &'a PluginsConfig,
        invoker: PluginInvoker<S>,
    ) -> Self {
        Self {
            search_path,
            plugins,
            invoker,
        }
    }

    /// Locate `name`, run it with `args`, and report how it ended.
    ///
    /// Errors mean no plugin status is available: either no process ran, or
    /// it was lost while waiting. A plugin that exits non-zero is
    /// `Ok(InvocationResult::Exited(code))`.
    pub fn dispatch(&self, name: &str, args: Vec<OsString>) -> Result<InvocationResult, DispatchError> {
        if !self.plugins.is_enabled(name) {
            tracing::debug!("Plugin '{}' is disabled in config", name);
            return Err(DispatchError::UnknownCommand {
                name: name.to_string(),
                searched: self.search_path.dirs().to_vec(),
            });
        }

        let candidate = locator::find(name, self.search_path)?;
        if !candidate.is_executable {
            return Err(DispatchError::NotExecutable {
                name: candidate.command_name,
                path: candidate.absolute_path,
            });
        }

        let request = InvocationRequest::new(candidate.absolute_path, args);
        match self.invoker.invoke(&request) {
            InvocationResult::SpawnFailed(source) => Err(DispatchError::Spawn {
                path: request.executable_path,
                source,
            }),
            InvocationResult::Lost(source) => Err(DispatchError::Lost {
                path: request.executable_path,
                source,
            }),
            result => Ok(result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::locator::tests::create_test_plugin;
    use crate::plugin::process::tests::{FakeOutcome, FakeSpawner};
    use pretty_assertions::assert_eq;
    use std::io;
    use tempfile::TempDir;

    fn router() -> CommandRouter {
        CommandRouter::new(["version", "plugin", "help"])
    }

    fn os_args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    fn dispatcher<'a>(
        search_path: &'a SearchPath,
        plugins: &'a PluginsConfig,
        spawner: &FakeSpawner,
    ) -> PluginDispatcher<'a, FakeSpawner> {
        PluginDispatcher::with_invoker(
            search_path,
            plugins,
            PluginInvoker::with_spawner(spawner.clone()),
        )
    }

    #[test]
    fn test_empty_args_route_to_builtin() {
        assert_eq!(router().route(&[]), Route::Builtin);
    }

    #[test]
    fn test_builtin_names_never_route_to_plugins() {
        for name in ["version", "plugin", "help"] {
            assert_eq!(router().route(&os_args(&[name, "extra"])), Route::Builtin);
        }
    }

    #[test]
    fn test_builtin_match_is_case_sensitive() {
        assert_eq!(
            router().route(&os_args(&["Version"])),
            Route::Plugin {
                name: "Version".to_string(),
                args: vec![],
            }
        );
    }

    #[test]
    fn test_leading_flag_routes_to_builtin() {
        assert_eq!(router().route(&os_args(&["--help"])), Route::Builtin);
        assert_eq!(router().route(&os_args(&["-V", "foo"])), Route::Builtin);
    }

    #[test]
    fn test_unknown_token_routes_to_plugin_with_rest() {
        assert_eq!(
            router().route(&os_args(&["failure", "with", "args", "two words"])),
            Route::Plugin {
                name: "failure".to_string(),
                args: os_args(&["with", "args", "two words"]),
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_token_routes_to_builtin() {
        use std::os::unix::ffi::OsStringExt;

        let args = vec![OsString::from_vec(vec![0xff, 0xfe])];
        assert_eq!(router().route(&args), Route::Builtin);
    }

    #[test]
    fn test_dispatch_runs_located_plugin() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_plugin(temp_dir.path(), "failure", true);
        let search_path = SearchPath::new(vec![temp_dir.path().to_path_buf()]);
        let plugins = PluginsConfig::default();
        let spawner = FakeSpawner::exiting(12);

        let result = dispatcher(&search_path, &plugins, &spawner)
            .dispatch("failure", os_args(&["with", "args"]))
            .unwrap();

        assert!(matches!(result, InvocationResult::Exited(12)));
        let requests = spawner.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].executable_path, path);
        assert_eq!(requests[0].arguments, os_args(&["with", "args"]));
    }

    #[test]
    fn test_unknown_plugin_spawns_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let search_path = SearchPath::new(vec![temp_dir.path().to_path_buf()]);
        let plugins = PluginsConfig::default();
        let spawner = FakeSpawner::exiting(0);

        let err = dispatcher(&search_path, &plugins, &spawner)
            .dispatch("missing", vec![])
            .unwrap_err();

        assert!(matches!(err, DispatchError::UnknownCommand { .. }));
        assert_eq!(spawner.spawn_count(), 0);
    }

    #[test]
    fn test_disabled_plugin_is_treated_as_absent() {
        let temp_dir = TempDir::new().unwrap();
        create_test_plugin(temp_dir.path(), "legacy", true);
        let search_path = SearchPath::new(vec![temp_dir.path().to_path_buf()]);
        let mut plugins = PluginsConfig::default();
        plugins.disable("legacy");
        let spawner = FakeSpawner::exiting(0);

        let err = dispatcher(&search_path, &plugins, &spawner)
            .dispatch("legacy", vec![])
            .unwrap_err();

        assert!(matches!(err, DispatchError::UnknownCommand { .. }));
        assert_eq!(spawner.spawn_count(), 0);
    }

    #[test]
    fn test_disabled_names_match_exactly() {
        let temp_dir = TempDir::new().unwrap();
        create_test_plugin(temp_dir.path(), "Tool", true);
        let search_path = SearchPath::new(vec![temp_dir.path().to_path_buf()]);
        let mut plugins = PluginsConfig::default();
        plugins.disable("tool");
        let spawner = FakeSpawner::exiting(0);

        let result = dispatcher(&search_path, &plugins, &spawner)
            .dispatch("Tool", vec![])
            .unwrap();

        assert!(matches!(result, InvocationResult::Exited(0)));
        assert_eq!(spawner.spawn_count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_not_executable_spawns_nothing() {
        let temp_dir = TempDir::new().unwrap();
        create_test_plugin(temp_dir.path(), "locked", false);
        let search_path = SearchPath::new(vec![temp_dir.path().to_path_buf()]);
        let plugins = PluginsConfig::default();
        let spawner = FakeSpawner::exiting(0);

        let err = dispatcher(&search_path, &plugins, &spawner)
            .dispatch("locked", vec![])
            .unwrap_err();

        assert!(matches!(err, DispatchError::NotExecutable { .. }));
        assert_eq!(spawner.spawn_count(), 0);
    }

    #[test]
    fn test_spawn_failure_becomes_dispatch_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_plugin(temp_dir.path(), "racy", true);
        let search_path = SearchPath::new(vec![temp_dir.path().to_path_buf()]);
        let plugins = PluginsConfig::default();
        let spawner =
            FakeSpawner::with_outcome(FakeOutcome::SpawnError(io::ErrorKind::PermissionDenied));

        let err = dispatcher(&search_path, &plugins, &spawner)
            .dispatch("racy", vec![])
            .unwrap_err();

        match err {
            DispatchError::Spawn { path: reported, source } => {
                assert_eq!(reported, path);
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected Spawn, got {:?}", other),
        }
    }

    #[test]
    fn test_lost_child_becomes_dispatch_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_plugin(temp_dir.path(), "flaky", true);
        let search_path = SearchPath::new(vec![temp_dir.path().to_path_buf()]);
        let plugins = PluginsConfig::default();
        let spawner = FakeSpawner::with_outcome(FakeOutcome::WaitError(io::ErrorKind::Other));

        let err = dispatcher(&search_path, &plugins, &spawner)
            .dispatch("flaky", vec![])
            .unwrap_err();

        match &err {
            DispatchError::Lost { path: reported, .. } => assert_eq!(reported, &path),
            other => panic!("expected Lost, got {:?}", other),
        }
        assert!(err.to_string().starts_with("lost track of plugin"));
        assert_eq!(spawner.wait_count(), 2);
    }
}
