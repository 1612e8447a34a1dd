//! End-to-end build: fetch, extract, install, configure, export
//!
//! Each step runs to completion before the next starts and the first
//! failure is returned as is. Nothing is retried or rolled back; a
//! partially populated prefix is left for the caller to deal with.

use crate::config::schema::ToolsConfig;
use crate::environment::{setup_run_environment, EnvironmentModifications};
use crate::error::{RecipeError, RecipeResult};
use crate::install::{install, write_config};
use crate::process::OutputSink;
use crate::recipe::{check_dependencies, Recipe};
use crate::stage::{extract, fetch, verify_archive, Downloader, Stage};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Inputs for one build
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Install prefix
    pub prefix: PathBuf,
    /// Root for the stage directory
    pub stage_root: PathBuf,
    /// Download cache
    pub download_cache: PathBuf,
    /// Use this archive instead of downloading (still verified)
    pub archive: Option<PathBuf>,
    pub tools: ToolsConfig,
    /// Keep the stage after success
    pub keep_stage: bool,
    /// Probe declared dependencies first
    pub check_dependencies: bool,
}

/// What a successful build produced
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub prefix: PathBuf,
    pub archive: PathBuf,
    pub config_file: PathBuf,
    pub environment: EnvironmentModifications,
}

/// Make `path` absolute against the current directory.
/// The vendor installer runs from inside the stage, so relative paths break.
pub fn absolute(path: &Path) -> RecipeResult<PathBuf> {
    std::path::absolute(path)
        .map_err(|e| RecipeError::io(format!("resolving {}", path.display()), e))
}

/// Run the whole recipe against `opts.prefix`.
pub async fn build(
    recipe: &Recipe,
    opts: &BuildOptions,
    downloader: &dyn Downloader,
    on_output: OutputSink<'_>,
) -> RecipeResult<BuildReport> {
    info!("Building {} into {}", recipe, opts.prefix.display());

    if opts.check_dependencies {
        check_dependencies(recipe.dependencies).await?;
        debug!("All declared dependencies available");
    }

    let prefix = absolute(&opts.prefix)?;

    let archive = match &opts.archive {
        Some(path) => {
            let path = absolute(path)?;
            verify_archive(&recipe.descriptor, &path).await?;
            path
        }
        None => fetch(recipe, &absolute(&opts.download_cache)?, downloader).await?,
    };

    // Only the outer archive is checksummed; the installer it unpacks is trusted as is
    let stage = Stage::new(&absolute(&opts.stage_root)?, recipe);
    stage.create().await?;
    let staged = stage.add_archive(&archive).await?;

    let source = extract(&stage, &staged, &opts.tools.bash, on_output).await?;
    let installed = install(&source, &prefix, &opts.tools.python, on_output).await?;
    let config_file = write_config(&installed).await?;
    let environment = setup_run_environment(&installed, &opts.tools).await?;

    if opts.keep_stage {
        info!("Keeping stage {}", stage.path().display());
    } else {
        stage.destroy().await?;
    }

    info!("Installed {} into {}", recipe, prefix.display());
    Ok(BuildReport {
        prefix,
        archive,
        config_file,
        environment,
    })
}
