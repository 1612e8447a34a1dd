//! Fetch command - download and verify the installer archive

use crate::audit::AuditLog;
use crate::build::absolute;
use crate::cli::args::FetchArgs;
use crate::config::{Config, ConfigManager};
use crate::error::RecipeResult;
use crate::recipe::Recipe;
use crate::stage::{fetch, verify_archive, HttpDownloader};
use crate::ui::{self, DownloadProgress, TaskSpinner, UiContext};
use std::path::PathBuf;
use std::sync::Arc;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, recipe: &Recipe, config: &Config) -> RecipeResult<()> {
    let ctx = UiContext::detect();

    let archive = match args.archive {
        Some(path) => {
            let path = absolute(&path)?;
            let mut spinner = TaskSpinner::new(&ctx);
            spinner.start("Verifying archive...");
            if let Err(e) = verify_archive(&recipe.descriptor, &path).await {
                spinner.stop_error("Checksum verification failed");
                return Err(e);
            }
            spinner.stop("Checksum verified");
            path
        }
        None => {
            let path = download(&ctx, recipe, config).await?;
            ui::step_ok_detail(&ctx, "Archive ready", recipe.descriptor.sha256);
            path
        }
    };

    AuditLog::new(config)
        .log(
            "fetch.complete",
            &serde_json::json!({
                "recipe": recipe.to_string(),
                "archive": archive.display().to_string(),
                "sha256": recipe.descriptor.sha256,
            }),
        )
        .await;

    println!("{}", archive.display());
    Ok(())
}

/// Fetch into the download cache with a progress bar
pub(crate) async fn download(
    ctx: &UiContext,
    recipe: &Recipe,
    config: &Config,
) -> RecipeResult<PathBuf> {
    let progress = Arc::new(DownloadProgress::new(ctx, recipe.descriptor.archive_name()));
    let sink = Arc::clone(&progress);
    let downloader = HttpDownloader::with_progress(Arc::new(
        move |written: u64, total: Option<u64>| sink.update(written, total),
    ));
    let cache = absolute(&ConfigManager::download_cache(config))?;

    let result = fetch(recipe, &cache, &downloader).await;
    progress.finish();
    result
}
