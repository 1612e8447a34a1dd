//! Install step: run the vendor installer, then write the calibration config
//!
//! The order is fixed. `ImodCalib/cpu.adoc` is only written once the vendor
//! installer has exited successfully, and [`write_config`] takes the
//! [`InstalledPrefix`] that only [`install`] hands out for a fresh build.

mod calib;

pub use calib::{CPU_ADOC, CPU_ADOC_NAME};

use crate::error::{RecipeError, RecipeResult};
use crate::process::{run_streaming, OutputSink};
use crate::stage::ExtractedSource;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

/// Subdirectory the vendor installer places IMOD in
pub const IMOD_SUBDIR: &str = "IMOD";

/// Subdirectory holding site calibration files
pub const CALIB_SUBDIR: &str = "ImodCalib";

/// Vendor shell script exporting the runtime environment
pub const ENV_SCRIPT: &str = "IMOD-linux.sh";

/// An install prefix the vendor installer has populated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPrefix {
    root: PathBuf,
}

impl InstalledPrefix {
    /// Refer to an existing install (e.g. to compute its environment)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<prefix>/IMOD`
    pub fn imod_dir(&self) -> PathBuf {
        self.root.join(IMOD_SUBDIR)
    }

    /// `<prefix>/ImodCalib`
    pub fn calib_dir(&self) -> PathBuf {
        self.root.join(CALIB_SUBDIR)
    }

    /// `<prefix>/IMOD/IMOD-linux.sh`
    pub fn env_script(&self) -> PathBuf {
        self.imod_dir().join(ENV_SCRIPT)
    }

    /// `<prefix>/ImodCalib/cpu.adoc`
    pub fn cpu_adoc(&self) -> PathBuf {
        self.calib_dir().join(CPU_ADOC_NAME)
    }
}

/// Run `<python> IMODtempDir/installIMOD -dir <prefix> -skip` from inside
/// `IMODtempDir`. `-skip` suppresses the installer's interactive prompts.
pub async fn install(
    source: &ExtractedSource,
    prefix: &Path,
    python: &str,
    on_output: OutputSink<'_>,
) -> RecipeResult<InstalledPrefix> {
    info!("Running vendor installer into {}", prefix.display());

    let mut cmd = Command::new(python);
    cmd.arg(source.installer_script())
        .arg("-dir")
        .arg(prefix)
        .arg("-skip")
        .current_dir(source.installer_dir());

    let captured = run_streaming(cmd, on_output).await.map_err(|e| match e {
        RecipeError::CommandFailed { command, source } => RecipeError::InstallerFailed {
            code: None,
            output: format!("could not run {}: {}", command, source),
        },
        other => other,
    })?;
    if !captured.status.success() {
        return Err(RecipeError::InstallerFailed {
            code: captured.status.code(),
            output: captured.tail(),
        });
    }

    debug!("Vendor installer finished");
    Ok(InstalledPrefix::new(prefix))
}

/// Create `<prefix>/ImodCalib` and write `cpu.adoc` into it
pub async fn write_config(prefix: &InstalledPrefix) -> RecipeResult<PathBuf> {
    let calib = prefix.calib_dir();
    fs::create_dir_all(&calib)
        .await
        .map_err(|e| RecipeError::io(format!("creating {}", calib.display()), e))?;

    let path = prefix.cpu_adoc();
    fs::write(&path, CPU_ADOC)
        .await
        .map_err(|e| RecipeError::io(format!("writing {}", path.display()), e))?;

    info!("Wrote {}", path.display());
    Ok(path)
}
