//! Per-build working directory
//!
//! A stage lives at `<stage_root>/<name>-<version>` and holds a copy of the
//! verified archive under `src/`. Extracting the archive there yields the
//! vendor installer tree.

mod extract;
pub mod fetch;

pub use extract::{extract, ExtractedSource, INSTALLER_DIR, INSTALLER_SCRIPT};
pub use fetch::{fetch, hash_file, verify_archive, Downloader, HttpDownloader};

use crate::error::{RecipeError, RecipeResult};
use crate::recipe::Recipe;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Working directory for one build
#[derive(Debug, Clone)]
pub struct Stage {
    path: PathBuf,
}

impl Stage {
    /// Stage for `recipe` under `stage_root`. Nothing is created yet.
    pub fn new(stage_root: &Path, recipe: &Recipe) -> Self {
        Self {
            path: stage_root.join(recipe.stage_name()),
        }
    }

    /// Stage directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the archive is copied into and extracted in
    pub fn source_path(&self) -> PathBuf {
        self.path.join("src")
    }

    /// Create an empty stage, discarding anything left by an earlier build
    pub async fn create(&self) -> RecipeResult<()> {
        if self.path.exists() {
            debug!("Removing stale stage {}", self.path.display());
            self.remove_dir().await?;
        }

        let source = self.source_path();
        fs::create_dir_all(&source)
            .await
            .map_err(|e| RecipeError::io(format!("creating stage {}", source.display()), e))?;

        info!("Created stage {}", self.path.display());
        Ok(())
    }

    /// Copy the verified archive into the source directory
    pub async fn add_archive(&self, archive: &Path) -> RecipeResult<PathBuf> {
        let name = archive
            .file_name()
            .ok_or_else(|| RecipeError::PathInvalid {
                path: archive.to_path_buf(),
                reason: "archive path has no file name".to_string(),
            })?;
        let dest = self.source_path().join(name);

        fs::copy(archive, &dest).await.map_err(|e| {
            RecipeError::io(
                format!("copying {} into stage", archive.display()),
                e,
            )
        })?;

        Ok(dest)
    }

    /// Delete the stage directory
    pub async fn destroy(&self) -> RecipeResult<()> {
        if self.path.exists() {
            self.remove_dir().await?;
            debug!("Removed stage {}", self.path.display());
        }
        Ok(())
    }

    async fn remove_dir(&self) -> RecipeResult<()> {
        fs::remove_dir_all(&self.path)
            .await
            .map_err(|e| RecipeError::io(format!("removing stage {}", self.path.display()), e))
    }
}
