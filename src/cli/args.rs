//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// imod-recipe - build and activate IMOD
///
/// Downloads the pinned IMOD installer, runs it against an install prefix,
/// writes the Etomo queue configuration and prints the runtime environment.
#[derive(Parser, Debug)]
#[command(name = "imod-recipe")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "IMOD_RECIPE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the pinned version and declared dependencies
    Info,

    /// Download and verify the installer archive
    Fetch(FetchArgs),

    /// Build and install into a prefix
    Install(InstallArgs),

    /// Print the environment that activates an install
    Env(EnvArgs),

    /// Run a command with an install activated
    Exec(ExecArgs),

    /// Check declared dependencies and tools
    Status,

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Verify this local archive instead of downloading
    #[arg(long)]
    pub archive: Option<PathBuf>,
}

/// Arguments for the install command
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Install prefix
    #[arg(short, long)]
    pub prefix: PathBuf,

    /// Use a local archive instead of downloading (hash is still checked)
    #[arg(long)]
    pub archive: Option<PathBuf>,

    /// Keep the stage directory after a successful install
    #[arg(long)]
    pub keep_stage: bool,

    /// Do not probe python, java and mesa-glu before building
    #[arg(long)]
    pub skip_dependency_check: bool,

    /// Install into a non-empty prefix without asking
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the env command
#[derive(Parser, Debug)]
pub struct EnvArgs {
    /// Install prefix
    #[arg(short, long)]
    pub prefix: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "sh")]
    pub format: EnvFormat,
}

/// Arguments for the exec command
#[derive(Parser, Debug)]
pub struct ExecArgs {
    /// Install prefix
    #[arg(short, long)]
    pub prefix: PathBuf,

    /// Command and arguments to run
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

/// Output format for the env command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EnvFormat {
    /// POSIX shell, for `eval`
    Sh,
    /// JSON array of operations
    Json,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., tools.python)
        key: String,

        /// Value to set
        value: String,
    },
}
