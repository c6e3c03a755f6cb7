mod cli;

use pipectl::config::{Config, DispatchEnv, LogConfig};
use pipectl::plugin::{
    self, locator, CommandRouter, DispatchError, PluginDispatcher, PluginEntry, Route, SearchPath,
    Shadow,
};
use pipectl::utils::crash::install_crash_handler;
use pipectl::utils::paths::get_logs_dir;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands, OutputFormat, PluginCommand};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::process;

/// Initialize logging.
///
/// Plugins share the host's stderr, so the default filter (`warn`) keeps the
/// host quiet. RUST_LOG overrides the configured level. With `log.file = true`
/// logs go to ~/.local/share/pipectl/logs/pipectl.log instead.
fn init_logging(config: &LogConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level))
    };

    if config.file {
        match get_logs_dir().and_then(|dir| fs::create_dir_all(&dir).map(|_| dir).map_err(Into::into)) {
            Ok(logs_dir) => {
                let file_appender = tracing_appender::rolling::daily(&logs_dir, "pipectl.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter())
                    .with_writer(non_blocking)
                    .with_ansi(false) // No ANSI colors in log files
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .try_init();

                return Some(guard);
            }
            Err(e) => eprintln!("Warning: Could not create logs directory: {}", e),
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    None
}

fn main() {
    install_crash_handler();
    let code = run();
    process::exit(code);
}

/// Everything up to the exit code. Returning (rather than exiting) lets the
/// log guard flush first.
fn run() -> i32 {
    let args: Vec<OsString> = env::args_os().skip(1).collect();
    let dispatch_env = DispatchEnv::from_env();

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    let _log_guard = init_logging(&config.log);
    if let Some(e) = config_error {
        tracing::warn!("Ignoring config file: {:#}", e);
    }

    let router = CommandRouter::new(cli::builtin_names());
    match router.route(&args) {
        Route::Builtin => run_builtin(args, &router, &dispatch_env, &config),
        Route::Plugin { name, args } => run_plugin(&name, args, &dispatch_env, &config),
    }
}

fn run_plugin(name: &str, args: Vec<OsString>, dispatch_env: &DispatchEnv, config: &Config) -> i32 {
    let search_path = SearchPath::resolve(dispatch_env);
    let dispatcher = PluginDispatcher::new(&search_path, &config.plugins);

    match dispatcher.dispatch(name, args) {
        Ok(result) => plugin::translate(&result),
        Err(e) => {
            if let DispatchError::UnknownCommand { searched, .. } = &e {
                tracing::debug!("Searched for '{}' in {:?}", name, searched);
            }
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn run_builtin(
    args: Vec<OsString>,
    router: &CommandRouter,
    dispatch_env: &DispatchEnv,
    config: &Config,
) -> i32 {
    let argv = std::iter::once(OsString::from("pipectl")).chain(args);
    let cli = match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return e.exit_code();
        }
    };

    match handle_command(cli.command, router, dispatch_env, config) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn handle_command(
    command: Option<Commands>,
    router: &CommandRouter,
    dispatch_env: &DispatchEnv,
    config: &Config,
) -> Result<()> {
    match command {
        Some(Commands::Version) => {
            println!("pipectl version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Plugin { command }) => {
            handle_plugin_command(command, router, dispatch_env, config)
        }
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

fn handle_plugin_command(
    command: PluginCommand,
    router: &CommandRouter,
    dispatch_env: &DispatchEnv,
    config: &Config,
) -> Result<()> {
    let search_path = SearchPath::resolve(dispatch_env);

    match command {
        PluginCommand::List { output } => {
            let entries = locator::list(&search_path, router.builtins());

            if output == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }

            if entries.is_empty() {
                println!("No plugins found.");
                println!("\nPlugins are executables named pipectl-<command> in:");
                for dir in search_path.dirs() {
                    println!("  {}", dir.display());
                }
                return Ok(());
            }

            println!("{:<20} {:<12} PATH", "NAME", "STATUS");
            println!("{}", "-".repeat(60));

            for entry in &entries {
                println!(
                    "{:<20} {:<12} {}",
                    entry.name,
                    plugin_status(entry, config),
                    entry.path.display()
                );
                match &entry.shadowed_by {
                    Some(Shadow::Builtin) => {
                        println!("{:<33} (built-in command '{}' takes precedence)", "", entry.name)
                    }
                    Some(Shadow::Plugin(winner)) => {
                        println!("{:<33} (shadowed by {})", "", winner.display())
                    }
                    None => {}
                }
            }
            Ok(())
        }
        PluginCommand::Path => {
            for dir in search_path.dirs() {
                if dir.is_dir() {
                    println!("{}", dir.display());
                } else {
                    println!("{} (missing)", dir.display());
                }
            }
            Ok(())
        }
    }
}

fn plugin_status(entry: &PluginEntry, config: &Config) -> &'static str {
    if entry.is_active() {
        if config.plugins.is_enabled(&entry.name) {
            "active"
        } else {
            "disabled"
        }
    } else if !entry.executable {
        "not-exec"
    } else {
        "shadowed"
    }
}
