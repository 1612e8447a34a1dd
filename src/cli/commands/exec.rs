//! Exec command - run a command inside an activated install

use crate::build::absolute;
use crate::cli::args::ExecArgs;
use crate::config::Config;
use crate::environment::{current_env, setup_run_environment};
use crate::error::{RecipeError, RecipeResult};
use crate::install::InstalledPrefix;
use std::process::ExitCode;
use tokio::process::Command;
use tracing::debug;

/// Execute the exec command, returning the child's exit status
pub async fn execute(args: ExecArgs, config: &Config) -> RecipeResult<ExitCode> {
    let prefix = InstalledPrefix::new(absolute(&args.prefix)?);
    let env = setup_run_environment(&prefix, &config.tools).await?;

    let Some((program, rest)) = args.command.split_first() else {
        return Err(RecipeError::User("No command given".to_string()));
    };

    let vars = env.apply(&current_env());
    debug!("Running {} with {} variables", program, vars.len());

    let status = Command::new(program)
        .args(rest)
        .env_clear()
        .envs(&vars)
        .status()
        .await
        .map_err(|e| RecipeError::command_failed(program.clone(), e))?;

    // Signals have no code; report them as a generic failure
    let code = status.code().unwrap_or(1);
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}
