//! Install command - build the package into a prefix

use crate::audit::AuditLog;
use crate::build::{absolute, build, BuildOptions, BuildReport};
use crate::cli::args::InstallArgs;
use crate::cli::commands::fetch::download;
use crate::config::{Config, ConfigManager};
use crate::error::{RecipeError, RecipeResult};
use crate::install::{InstalledPrefix, CPU_ADOC_NAME};
use crate::recipe::{check_dependencies, Recipe};
use crate::stage::HttpDownloader;
use crate::ui::{self, InstallProgress, TaskSpinner, UiContext};
use std::path::Path;
use tracing::debug;

/// Execute the install command
pub async fn execute(args: InstallArgs, recipe: &Recipe, config: &Config) -> RecipeResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let prefix = absolute(&args.prefix)?;

    ui::intro(&ctx, &format!("Installing {}", recipe));

    if !prefix_is_empty(&prefix)? {
        let proceed = ui::confirm(
            &ctx,
            &format!("{} is not empty. Install into it anyway?", prefix.display()),
            false,
        )
        .await?;
        if !proceed {
            ui::outro_error(&ctx, "Install cancelled");
            return Err(RecipeError::User(format!(
                "install cancelled: {} is not empty (use -y to install anyway)",
                prefix.display()
            )));
        }
    }

    let audit = AuditLog::new(config);
    audit
        .log(
            "install.started",
            &serde_json::json!({
                "recipe": recipe.to_string(),
                "prefix": prefix.display().to_string(),
            }),
        )
        .await;

    match run_steps(&ctx, &args, recipe, config, &prefix).await {
        Ok(report) => {
            audit
                .log(
                    "install.complete",
                    &serde_json::json!({
                        "recipe": recipe.to_string(),
                        "prefix": report.prefix.display().to_string(),
                        "archive": report.archive.display().to_string(),
                        "env_vars": report.environment.len(),
                    }),
                )
                .await;

            let installed = InstalledPrefix::new(&report.prefix);
            ui::key_value(&ctx, "IMOD_DIR", &installed.imod_dir().display().to_string());
            ui::key_value(&ctx, "config", &report.config_file.display().to_string());
            ui::remark(
                &ctx,
                &format!(
                    "Activate with: eval \"$(imod-recipe env --prefix {})\"",
                    report.prefix.display()
                ),
            );
            ui::outro_success(&ctx, &format!("Installed {}", recipe));
            Ok(())
        }
        Err(e) => {
            audit
                .log(
                    "install.failed",
                    &serde_json::json!({
                        "recipe": recipe.to_string(),
                        "prefix": prefix.display().to_string(),
                        "kind": format!("{:?}", e.kind()),
                        "error": e.to_string(),
                    }),
                )
                .await;
            ui::outro_error(&ctx, "Install failed");
            Err(e)
        }
    }
}

async fn run_steps(
    ctx: &UiContext,
    args: &InstallArgs,
    recipe: &Recipe,
    config: &Config,
    prefix: &Path,
) -> RecipeResult<BuildReport> {
    if config.install.check_dependencies && !args.skip_dependency_check {
        let mut spinner = TaskSpinner::new(ctx);
        spinner.start("Checking dependencies...");
        if let Err(e) = check_dependencies(recipe.dependencies).await {
            spinner.stop_error("Missing dependency");
            return Err(e);
        }
        spinner.stop("Dependencies available");
    } else {
        debug!("Dependency check skipped");
    }

    let archive = match &args.archive {
        Some(path) => path.clone(),
        None => {
            let archive = download(ctx, recipe, config).await?;
            ui::step_ok(ctx, "Archive downloaded and verified");
            archive
        }
    };

    let opts = BuildOptions {
        prefix: prefix.to_path_buf(),
        stage_root: ConfigManager::stage_root(config),
        download_cache: ConfigManager::download_cache(config),
        archive: Some(archive),
        tools: config.tools.clone(),
        keep_stage: args.keep_stage || config.install.keep_stage,
        check_dependencies: false,
    };

    let progress = InstallProgress::new(ctx, "Running vendor installer");
    let on_output = |line: String| progress.on_line(line);
    // Archive is already local so the downloader is never reached
    let result = build(recipe, &opts, &HttpDownloader::new(), &on_output).await;
    progress.finish();

    let report = result?;
    ui::step_ok_detail(ctx, "Configuration written", CPU_ADOC_NAME);
    ui::step_ok_detail(
        ctx,
        "Environment computed",
        &format!("{} variables", report.environment.len()),
    );
    Ok(report)
}

/// A missing prefix counts as empty
fn prefix_is_empty(prefix: &Path) -> RecipeResult<bool> {
    if prefix.exists() && !prefix.is_dir() {
        return Err(RecipeError::PathInvalid {
            path: prefix.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    match std::fs::read_dir(prefix) {
        Ok(mut entries) => Ok(entries.next().is_none()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(RecipeError::io(format!("reading {}", prefix.display()), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_prefix_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(prefix_is_empty(&dir.path().join("nope")).unwrap());
    }

    #[test]
    fn populated_prefix_is_not_empty() {
        let dir = TempDir::new().unwrap();
        assert!(prefix_is_empty(dir.path()).unwrap());
        std::fs::create_dir(dir.path().join("IMOD")).unwrap();
        assert!(!prefix_is_empty(dir.path()).unwrap());
    }

    #[test]
    fn file_prefix_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(
            prefix_is_empty(&file),
            Err(RecipeError::PathInvalid { .. })
        ));
    }
}
