use clap::{CommandFactory, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "pipectl")]
#[command(version)]
#[command(
    about = "Pipeline command-line tool",
    long_about = "Pipeline command-line tool.\n\nAny other command `foo` runs the plugin executable `pipectl-foo` found in $PIPECTL_PLUGINS_DIR, or else in ~/.config/pipectl/plugins and on $PATH."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print version information
    Version,
    /// Inspect installed plugins
    Plugin {
        #[command(subcommand)]
        command: PluginCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum PluginCommand {
    /// List plugins found on the search path
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Print the directories searched for plugins, in precedence order
    Path,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Top-level command names (and aliases) that plugins can never shadow.
pub fn builtin_names() -> Vec<String> {
    let command = Cli::command();
    let mut names: Vec<String> = command
        .get_subcommands()
        .flat_map(|sub| {
            std::iter::once(sub.get_name().to_string())
                .chain(sub.get_all_aliases().map(str::to_string))
        })
        .collect();
    // clap only adds `help` when the command is built.
    names.push("help".to_string());
    names
}
