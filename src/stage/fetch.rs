//! Archive download with SHA256 verification
//!
//! Archives are kept in a download cache keyed by recipe name and version.
//! A cached file is reused only if its hash still matches the descriptor.

use crate::error::{RecipeError, RecipeResult};
use crate::recipe::{Descriptor, Recipe};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// Progress callback: bytes written so far, total if the server sent one
pub type ProgressFn = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Transport used to fetch an archive to a local path
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download `url` to `dest`, returning the number of bytes written
    async fn download(&self, url: &str, dest: &Path) -> RecipeResult<u64>;
}

/// HTTP(S) downloader backed by ureq
#[derive(Default)]
pub struct HttpDownloader {
    progress: Option<ProgressFn>,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report progress through `progress` while downloading
    pub fn with_progress(progress: ProgressFn) -> Self {
        Self {
            progress: Some(progress),
        }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> RecipeResult<u64> {
        let url = url.to_string();
        let dest = dest.to_path_buf();
        let progress = self.progress.clone();

        // ureq is blocking
        tokio::task::spawn_blocking(move || download_blocking(&url, &dest, progress))
            .await
            .map_err(|e| RecipeError::Internal(format!("download task failed: {}", e)))?
    }
}

fn download_blocking(url: &str, dest: &Path, progress: Option<ProgressFn>) -> RecipeResult<u64> {
    let fetch_err = |message: String| RecipeError::Fetch {
        url: url.to_string(),
        message,
    };

    let response = ureq::get(url).call().map_err(|e| fetch_err(e.to_string()))?;

    let total = response
        .headers()
        .get(ureq::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let mut reader = response.into_body().into_reader();
    let mut file = std::fs::File::create(dest)
        .map_err(|e| RecipeError::io(format!("creating {}", dest.display()), e))?;

    let mut buf = vec![0u8; 64 * 1024];
    let mut written = 0u64;
    loop {
        let n = reader.read(&mut buf).map_err(|e| fetch_err(e.to_string()))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])
            .map_err(|e| RecipeError::io(format!("writing {}", dest.display()), e))?;
        written += n as u64;
        if let Some(ref progress) = progress {
            progress(written, total);
        }
    }

    file.flush()
        .map_err(|e| RecipeError::io(format!("flushing {}", dest.display()), e))?;

    Ok(written)
}

/// SHA256 of a file as lowercase hex, read in chunks
pub async fn hash_file(path: &Path) -> RecipeResult<String> {
    let mut file = fs::File::open(path)
        .await
        .map_err(|e| RecipeError::io(format!("opening {}", path.display()), e))?;

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|e| RecipeError::io(format!("reading {}", path.display()), e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Check that `path` has the descriptor's content hash
pub async fn verify_archive(descriptor: &Descriptor, path: &Path) -> RecipeResult<()> {
    if !path.is_file() {
        return Err(RecipeError::MissingArtifact(path.to_path_buf()));
    }

    let actual = hash_file(path).await?;
    if actual != descriptor.sha256 {
        return Err(RecipeError::HashMismatch {
            url: descriptor.url.to_string(),
            expected: descriptor.sha256.to_string(),
            actual,
        });
    }

    debug!("Verified {} ({})", path.display(), actual);
    Ok(())
}

/// Path of the cached archive for a recipe
pub fn cached_archive_path(recipe: &Recipe, cache_dir: &Path) -> PathBuf {
    cache_dir.join(format!(
        "{}-{}",
        recipe.stage_name(),
        recipe.descriptor.archive_name()
    ))
}

/// Download the recipe's archive into `cache_dir` and verify it.
///
/// Returns the path of the verified archive. A file that fails
/// verification is removed before the error is returned.
pub async fn fetch(
    recipe: &Recipe,
    cache_dir: &Path,
    downloader: &dyn Downloader,
) -> RecipeResult<PathBuf> {
    let descriptor = &recipe.descriptor;

    fs::create_dir_all(cache_dir)
        .await
        .map_err(|e| RecipeError::io(format!("creating {}", cache_dir.display()), e))?;

    let dest = cached_archive_path(recipe, cache_dir);

    if dest.is_file() {
        debug!("Checking cached archive {}", dest.display());
        let actual = hash_file(&dest).await?;
        if actual == descriptor.sha256 {
            info!("Using cached archive {}", dest.display());
            return Ok(dest);
        }
        debug!(
            "Cached archive hash mismatch (expected {}, got {}), re-downloading",
            descriptor.sha256, actual
        );
        remove_quietly(&dest).await;
    }

    let partial = PathBuf::from(format!("{}.part", dest.display()));
    info!("Downloading {}", descriptor.url);

    let bytes = match downloader.download(descriptor.url, &partial).await {
        Ok(bytes) => bytes,
        Err(e) => {
            remove_quietly(&partial).await;
            return Err(e);
        }
    };

    if let Err(e) = verify_archive(descriptor, &partial).await {
        remove_quietly(&partial).await;
        return Err(e);
    }

    fs::rename(&partial, &dest)
        .await
        .map_err(|e| RecipeError::io(format!("moving archive to {}", dest.display()), e))?;

    info!("Downloaded {} ({} bytes)", dest.display(), bytes);
    Ok(dest)
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        debug!("Could not remove {}: {}", path.display(), e);
    }
}
