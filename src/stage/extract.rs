//! Pre-install hook: unpack the self-extracting archive

use super::Stage;
use crate::error::{RecipeError, RecipeResult};
use crate::process::{run_streaming, OutputSink};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::info;

/// Directory the archive unpacks the vendor installer into
pub const INSTALLER_DIR: &str = "IMODtempDir";

/// Vendor installer script inside [`INSTALLER_DIR`]
pub const INSTALLER_SCRIPT: &str = "installIMOD";

/// Source tree produced by a successful extraction
#[derive(Debug, Clone)]
pub struct ExtractedSource {
    root: PathBuf,
}

impl ExtractedSource {
    /// Wrap an existing tree, checking that the vendor installer is present
    pub fn open(root: impl Into<PathBuf>) -> RecipeResult<Self> {
        let source = Self { root: root.into() };
        let script = source.installer_script();
        if !script.is_file() {
            return Err(RecipeError::MissingArtifact(script));
        }
        Ok(source)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Working directory for the vendor installer
    pub fn installer_dir(&self) -> PathBuf {
        self.root.join(INSTALLER_DIR)
    }

    pub fn installer_script(&self) -> PathBuf {
        self.installer_dir().join(INSTALLER_SCRIPT)
    }
}

/// Run `<bash> <archive> -extract` inside the stage's source directory.
///
/// A non-zero exit aborts with [`RecipeError::ExtractFailed`]; nothing is
/// retried or cleaned up.
pub async fn extract(
    stage: &Stage,
    archive: &Path,
    bash: &str,
    on_output: OutputSink<'_>,
) -> RecipeResult<ExtractedSource> {
    let source_path = stage.source_path();
    info!("Extracting {}", archive.display());

    let mut cmd = Command::new(bash);
    cmd.arg(archive).arg("-extract").current_dir(&source_path);

    // Not being able to start the shell is still an extraction failure
    let captured = run_streaming(cmd, on_output).await.map_err(|e| match e {
        RecipeError::CommandFailed { command, source } => RecipeError::ExtractFailed {
            archive: archive.to_path_buf(),
            code: None,
            output: format!("could not run {}: {}", command, source),
        },
        other => other,
    })?;
    if !captured.status.success() {
        return Err(RecipeError::ExtractFailed {
            archive: archive.to_path_buf(),
            code: captured.status.code(),
            output: captured.tail(),
        });
    }

    ExtractedSource::open(source_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::IMOD;
    use tempfile::TempDir;

    const SELF_EXTRACTING: &str = r#"
if [ "$1" != "-extract" ]; then
  echo "usage: $0 -extract" >&2
  exit 2
fi
mkdir -p IMODtempDir
echo 'echo installing' > IMODtempDir/installIMOD
echo "extracted"
"#;

    async fn staged(root: &TempDir, script: &str) -> (Stage, PathBuf) {
        let archive = root.path().join("imod.sh");
        std::fs::write(&archive, script).unwrap();
        let stage = Stage::new(&root.path().join("stage"), &IMOD);
        stage.create().await.unwrap();
        let staged = stage.add_archive(&archive).await.unwrap();
        (stage, staged)
    }

    #[tokio::test]
    async fn extract_produces_installer_tree() {
        let root = TempDir::new().unwrap();
        let (stage, archive) = staged(&root, SELF_EXTRACTING).await;

        let source = extract(&stage, &archive, "sh", &|_: String| {})
            .await
            .unwrap();

        assert_eq!(source.root(), stage.source_path());
        assert!(source.installer_script().is_file());
        assert_eq!(
            source.installer_dir(),
            stage.source_path().join("IMODtempDir")
        );
    }

    #[tokio::test]
    async fn extract_failure_is_fatal() {
        let root = TempDir::new().unwrap();
        let (stage, archive) = staged(&root, "echo corrupt >&2; exit 7").await;

        let err = extract(&stage, &archive, "sh", &|_: String| {})
            .await
            .unwrap_err();

        match err {
            RecipeError::ExtractFailed { code, output, .. } => {
                assert_eq!(code, Some(7));
                assert!(output.contains("corrupt"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_shell_is_extraction_failure() {
        let root = TempDir::new().unwrap();
        let (stage, archive) = staged(&root, SELF_EXTRACTING).await;

        let err = extract(&stage, &archive, "imod-recipe-no-such-shell", &|_: String| {})
            .await
            .unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::Extraction);
        match err {
            RecipeError::ExtractFailed { code, output, .. } => {
                assert_eq!(code, None);
                assert!(output.contains("imod-recipe-no-such-shell"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn extract_without_installer_is_missing_artifact() {
        let root = TempDir::new().unwrap();
        let (stage, archive) = staged(&root, "exit 0").await;

        let err = extract(&stage, &archive, "sh", &|_: String| {})
            .await
            .unwrap_err();

        assert!(matches!(err, RecipeError::MissingArtifact(p) if p.ends_with("IMODtempDir/installIMOD")));
    }
}
