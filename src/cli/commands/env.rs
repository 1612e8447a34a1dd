//! Env command - print the environment that activates an install

use crate::build::absolute;
use crate::cli::args::{EnvArgs, EnvFormat};
use crate::config::Config;
use crate::environment::setup_run_environment;
use crate::error::RecipeResult;
use crate::install::InstalledPrefix;

/// Execute the env command
///
/// Output goes to stdout so it can be passed to `eval`.
pub async fn execute(args: EnvArgs, config: &Config) -> RecipeResult<()> {
    let prefix = InstalledPrefix::new(absolute(&args.prefix)?);
    let env = setup_run_environment(&prefix, &config.tools).await?;

    match args.format {
        EnvFormat::Sh => print!("{}", env.to_shell()),
        EnvFormat::Json => println!("{}", env.to_json()?),
    }

    Ok(())
}
