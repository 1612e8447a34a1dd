//! imod-recipe - build and activate IMOD
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use imod_recipe::cli::{commands, Cli, Commands};
use imod_recipe::config::ConfigManager;
use imod_recipe::error::RecipeResult;
use imod_recipe::recipe::IMOD;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> RecipeResult<ExitCode> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // 0 = warn (spinners only), 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("imod_recipe=warn"),
        1 => EnvFilter::new("imod_recipe=info"),
        _ => EnvFilter::new("imod_recipe=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.without_time().init();
    }

    debug!("Loaded configuration from {}", config_manager.path().display());

    match cli.command {
        Commands::Info => commands::info(&IMOD).await?,
        Commands::Fetch(args) => commands::fetch(args, &IMOD, &config).await?,
        Commands::Install(args) => commands::install(args, &IMOD, &config).await?,
        Commands::Env(args) => commands::env(args, &config).await?,
        Commands::Exec(args) => return commands::exec(args, &config).await,
        Commands::Status => commands::status(&IMOD, &config).await?,
        Commands::Config(args) => commands::config(args, &config_manager, &config).await?,
    }

    Ok(ExitCode::SUCCESS)
}
