//! Error types for imod-recipe
//!
//! All modules use `RecipeResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for recipe operations
pub type RecipeResult<T> = Result<T, RecipeError>;

/// All errors that can occur while building or activating the package
#[derive(Error, Debug)]
pub enum RecipeError {
    // Fetch errors
    #[error("Download failed: {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Checksum mismatch for {url}: expected {expected}, got {actual}")]
    HashMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    // Build errors
    #[error("Archive extraction failed: {archive} (exit code: {code:?})\n{output}")]
    ExtractFailed {
        archive: PathBuf,
        code: Option<i32>,
        output: String,
    },

    #[error("Vendor installer failed (exit code: {code:?})\n{output}")]
    InstallerFailed { code: Option<i32>, output: String },

    #[error("Required file not found: {0}")]
    MissingArtifact(PathBuf),

    #[error("Failed to source {path}: {reason}")]
    SourceFailed { path: PathBuf, reason: String },

    #[error("Dependency not available: {name}. {hint}")]
    DependencyMissing { name: String, hint: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid path: {path}: {reason}")]
    PathInvalid { path: PathBuf, reason: String },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

/// Coarse failure category, reported to whoever drives the build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    Extraction,
    Installer,
    Filesystem,
    MissingArtifact,
    Configuration,
    Other,
}

impl RecipeError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a sourcing error
    pub fn source_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SourceFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch { .. } | Self::HashMismatch { .. } => ErrorKind::Fetch,
            Self::ExtractFailed { .. } => ErrorKind::Extraction,
            Self::InstallerFailed { .. } => ErrorKind::Installer,
            Self::Io { .. } | Self::ConfigDirCreate { .. } => ErrorKind::Filesystem,
            Self::MissingArtifact(_) | Self::SourceFailed { .. } => ErrorKind::MissingArtifact,
            Self::ConfigInvalid { .. } | Self::TomlParse(_) | Self::TomlSerialize(_) => {
                ErrorKind::Configuration
            }
            _ => ErrorKind::Other,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::HashMismatch { .. } => {
                Some("The upstream archive changed or the download was truncated. Delete it and retry")
            }
            Self::ExtractFailed { .. } => Some("Check that bash is installed and the archive is intact"),
            Self::InstallerFailed { .. } => {
                Some("Re-run with -vv to see the full installer output")
            }
            Self::SourceFailed { .. } | Self::MissingArtifact(_) => {
                Some("The install prefix looks incomplete. Run: imod-recipe install --prefix <dir>")
            }
            Self::DependencyMissing { .. } => Some("Run: imod-recipe status"),
            _ => None,
        }
    }
}
