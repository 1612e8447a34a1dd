//! Declared upstream dependencies and host probes

use crate::error::{RecipeError, RecipeResult};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// A named upstream package, with no version constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub name: &'static str,
    /// Command that succeeds when the dependency is usable
    pub probe: &'static [&'static str],
    pub hint: &'static str,
}

/// Result of probing one dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyStatus {
    pub name: &'static str,
    pub available: bool,
}

impl Dependency {
    /// Run the probe command; any spawn failure or non-zero exit counts as missing
    pub async fn is_available(&self) -> bool {
        let Some((program, args)) = self.probe.split_first() else {
            return true;
        };

        debug!("Probing {}: {} {:?}", self.name, program, args);

        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn missing(&self) -> RecipeError {
        RecipeError::DependencyMissing {
            name: self.name.to_string(),
            hint: self.hint.to_string(),
        }
    }
}

/// Probe every dependency in declaration order
pub async fn probe_all(deps: &[Dependency]) -> Vec<DependencyStatus> {
    let mut statuses = Vec::with_capacity(deps.len());
    for dep in deps {
        statuses.push(DependencyStatus {
            name: dep.name,
            available: dep.is_available().await,
        });
    }
    statuses
}

/// Fail on the first dependency that is not available
pub async fn check_dependencies(deps: &[Dependency]) -> RecipeResult<()> {
    for dep in deps {
        if !dep.is_available().await {
            return Err(dep.missing());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRESENT: Dependency = Dependency {
        name: "shell",
        probe: &["sh", "-c", "exit 0"],
        hint: "",
    };

    const ABSENT: Dependency = Dependency {
        name: "nothing",
        probe: &["imod-recipe-definitely-not-a-binary"],
        hint: "install nothing",
    };

    #[tokio::test]
    async fn probe_success_and_failure() {
        assert!(PRESENT.is_available().await);
        assert!(!ABSENT.is_available().await);
    }

    #[tokio::test]
    async fn check_reports_first_missing() {
        let err = check_dependencies(&[PRESENT, ABSENT]).await.unwrap_err();
        match err {
            RecipeError::DependencyMissing { name, hint } => {
                assert_eq!(name, "nothing");
                assert_eq!(hint, "install nothing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn probe_all_keeps_order() {
        let statuses = probe_all(&[ABSENT, PRESENT]).await;
        assert_eq!(
            statuses,
            vec![
                DependencyStatus {
                    name: "nothing",
                    available: false
                },
                DependencyStatus {
                    name: "shell",
                    available: true
                },
            ]
        );
    }
}
