//! Configuration schema for imod-recipe
//!
//! Configuration is stored at `~/.config/imod-recipe/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Working and cache directories
    pub paths: PathsConfig,

    /// External tools the build shells out to
    pub tools: ToolsConfig,

    /// Install behaviour
    pub install: InstallConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Enable audit logging
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            audit_log: true,
        }
    }
}

/// Directory settings. `None` means the platform default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root under which per-build stage directories are created
    pub stage_root: Option<PathBuf>,

    /// Where downloaded archives are kept between builds
    pub download_cache: Option<PathBuf>,
}

/// External tool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Shell used for archive extraction and for sourcing the vendor script
    pub bash: String,

    /// Interpreter that runs the vendor installer
    pub python: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            bash: "bash".to_string(),
            python: "python3".to_string(),
        }
    }
}

/// Install settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Keep the stage directory after a successful install
    pub keep_stage: bool,

    /// Probe declared dependencies before building
    pub check_dependencies: bool,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            keep_stage: false,
            check_dependencies: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[tools]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.tools.bash, "bash");
        assert_eq!(config.tools.python, "python3");
        assert!(config.install.check_dependencies);
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [tools]
            python = "/usr/bin/python3.11"

            [paths]
            stage_root = "/scratch/stage"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.tools.python, "/usr/bin/python3.11");
        assert_eq!(config.tools.bash, "bash"); // default preserved
        assert_eq!(
            config.paths.stage_root,
            Some(PathBuf::from("/scratch/stage"))
        );
        assert!(config.paths.download_cache.is_none());
    }
}
