//! Runtime environment for activating an installed prefix
//!
//! An [`EnvironmentModifications`] is an ordered list of operations. Applying
//! it to a base environment runs the operations in order, so later entries
//! win for the same variable.

mod source;

pub use source::{current_env, source_file};

use crate::config::schema::ToolsConfig;
use crate::error::RecipeResult;
use crate::install::InstalledPrefix;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tracing::{debug, info};

/// Name/value environment
pub type EnvMap = BTreeMap<String, String>;

/// One environment operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EnvModification {
    Set { name: String, value: String },
    Unset { name: String },
    PrependPath { name: String, path: String },
    AppendPath { name: String, path: String },
}

impl EnvModification {
    pub fn name(&self) -> &str {
        match self {
            Self::Set { name, .. }
            | Self::Unset { name }
            | Self::PrependPath { name, .. }
            | Self::AppendPath { name, .. } => name,
        }
    }

    fn apply(&self, env: &mut EnvMap) {
        match self {
            Self::Set { name, value } => {
                env.insert(name.clone(), value.clone());
            }
            Self::Unset { name } => {
                env.remove(name);
            }
            Self::PrependPath { name, path } => {
                let joined = match env.get(name) {
                    Some(old) if !old.is_empty() => format!("{}:{}", path, old),
                    _ => path.clone(),
                };
                env.insert(name.clone(), joined);
            }
            Self::AppendPath { name, path } => {
                let joined = match env.get(name) {
                    Some(old) if !old.is_empty() => format!("{}:{}", old, path),
                    _ => path.clone(),
                };
                env.insert(name.clone(), joined);
            }
        }
    }

    fn to_shell(&self) -> String {
        match self {
            Self::Set { name, value } => format!("export {}={}", name, shell_quote(value)),
            Self::Unset { name } => format!("unset {}", name),
            Self::PrependPath { name, path } => format!(
                "export {name}={}\"${{{name}:+:${name}}}\"",
                shell_quote(path)
            ),
            Self::AppendPath { name, path } => format!(
                "export {name}=\"${{{name}:+${name}:}}\"{}",
                shell_quote(path)
            ),
        }
    }
}

/// Ordered set of environment operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EnvironmentModifications {
    mods: Vec<EnvModification>,
}

impl EnvironmentModifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.mods.push(EnvModification::Set {
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn unset(&mut self, name: impl Into<String>) {
        self.mods.push(EnvModification::Unset { name: name.into() });
    }

    pub fn prepend_path(&mut self, name: impl Into<String>, path: impl Into<String>) {
        self.mods.push(EnvModification::PrependPath {
            name: name.into(),
            path: path.into(),
        });
    }

    pub fn append_path(&mut self, name: impl Into<String>, path: impl Into<String>) {
        self.mods.push(EnvModification::AppendPath {
            name: name.into(),
            path: path.into(),
        });
    }

    /// Append every operation of `other`, keeping its order
    pub fn extend(&mut self, other: EnvironmentModifications) {
        self.mods.extend(other.mods);
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnvModification> {
        self.mods.iter()
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    /// Apply the operations in order on top of `base`
    pub fn apply(&self, base: &EnvMap) -> EnvMap {
        let mut env = base.clone();
        for m in &self.mods {
            m.apply(&mut env);
        }
        env
    }

    /// Final values of the variables these operations touch, given `base`.
    /// Unset variables map to `None`.
    pub fn resolved(&self, base: &EnvMap) -> BTreeMap<String, Option<String>> {
        let env = self.apply(base);
        self.mods
            .iter()
            .map(|m| (m.name().to_string(), env.get(m.name()).cloned()))
            .collect()
    }

    /// Render as a POSIX shell snippet suitable for `eval`
    pub fn to_shell(&self) -> String {
        let mut out = String::new();
        for m in &self.mods {
            let _ = writeln!(out, "{};", m.to_shell());
        }
        out
    }

    /// Render as a JSON array of operations
    pub fn to_json(&self) -> RecipeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Single-quote `value` for a POSIX shell
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Environment a consumer needs to use the install at `prefix`.
///
/// `IMOD_DIR` comes first, then whatever sourcing `IMOD/IMOD-linux.sh`
/// changes, then `IMOD_CALIB_DIR`. The vendor script is sourced with
/// `IMOD_DIR` already exported so it resolves paths inside this prefix.
pub async fn setup_run_environment(
    prefix: &InstalledPrefix,
    tools: &ToolsConfig,
) -> RecipeResult<EnvironmentModifications> {
    let mut env = EnvironmentModifications::new();
    env.set("IMOD_DIR", prefix.imod_dir().to_string_lossy());

    let base = env.apply(&current_env());
    let sourced = source_file(&prefix.env_script(), &base, &tools.bash).await?;
    debug!(
        "{} modifications from {}",
        sourced.len(),
        prefix.env_script().display()
    );
    env.extend(sourced);

    env.set("IMOD_CALIB_DIR", prefix.calib_dir().to_string_lossy());

    info!("Computed run environment for {}", prefix.root().display());
    Ok(env)
}
