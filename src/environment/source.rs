//! Capture the environment changes made by sourcing a shell script
//!
//! The script is sourced in a child shell that dumps its environment with
//! `env -0` before and after. The difference becomes a list of
//! [`EnvModification`](super::EnvModification)s.

use super::{EnvMap, EnvironmentModifications};
use crate::error::{RecipeError, RecipeResult};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

const MARKER: &str = "__IMOD_RECIPE_ENV_MARKER__";

/// `$1` is the script. Its own output is discarded so it cannot corrupt the dump.
const SOURCE_SCRIPT: &str =
    r#"env -0 && printf '\0%s\0' __IMOD_RECIPE_ENV_MARKER__ && . "$1" >/dev/null && env -0"#;

/// Variables every shell sets for itself
const IGNORED: &[&str] = &[
    "_", "SHLVL", "PWD", "OLDPWD", "PS1", "PS2", "PS4", "ENV", "SHELLOPTS", "BASHOPTS",
];

const IGNORED_PREFIXES: &[&str] = &["BASH_FUNC_"];

/// The current process environment, skipping non UTF-8 entries
pub fn current_env() -> EnvMap {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

/// Source `path` with `shell` on top of `base` and return what changed.
pub async fn source_file(
    path: &Path,
    base: &EnvMap,
    shell: &str,
) -> RecipeResult<EnvironmentModifications> {
    if !path.is_file() {
        return Err(RecipeError::MissingArtifact(path.to_path_buf()));
    }

    let mut cmd = Command::new(shell);
    if is_bash(shell) {
        cmd.args(["--noprofile", "--norc"]);
    }
    cmd.arg("-c")
        .arg(SOURCE_SCRIPT)
        .arg("imod-recipe")
        .arg(path)
        .env_clear()
        .envs(base)
        .stdin(Stdio::null());

    debug!("Sourcing {} with {}", path.display(), shell);

    let output = cmd
        .output()
        .await
        .map_err(|e| RecipeError::command_failed(format!("{} -c <source {}>", shell, path.display()), e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RecipeError::source_failed(
            path,
            format!(
                "shell exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            ),
        ));
    }

    let (before, after) =
        parse_dump(&output.stdout).map_err(|reason| RecipeError::source_failed(path, reason))?;

    Ok(diff(&before, &after))
}

fn is_bash(shell: &str) -> bool {
    Path::new(shell)
        .file_name()
        .is_some_and(|name| name == "bash")
}

fn is_ignored(name: &str) -> bool {
    IGNORED.contains(&name) || IGNORED_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Split `env -0 <marker> env -0` output into the two environments.
///
/// Values the script exports must be valid UTF-8; the error names the
/// offending variable.
fn parse_dump(stdout: &[u8]) -> Result<(EnvMap, EnvMap), String> {
    let mut before = EnvMap::new();
    let mut after = EnvMap::new();
    let mut seen_marker = false;

    for raw in stdout.split(|b| *b == 0).filter(|e| !e.is_empty()) {
        if raw == MARKER.as_bytes() {
            seen_marker = true;
            continue;
        }
        let entry = match std::str::from_utf8(raw) {
            Ok(entry) => entry,
            Err(_) => {
                let lossy = String::from_utf8_lossy(raw);
                let name = lossy.split('=').next().unwrap_or_default();
                if seen_marker {
                    return Err(format!("{} is not valid UTF-8", name));
                }
                // The base environment is UTF-8 only, so this came from the shell itself
                debug!("Skipping non UTF-8 variable {} in base dump", name);
                continue;
            }
        };
        let Some((name, value)) = entry.split_once('=') else {
            continue;
        };
        let target = if seen_marker { &mut after } else { &mut before };
        target.insert(name.to_string(), value.to_string());
    }

    // An empty "after" means the second dump never ran
    if !seen_marker || after.is_empty() {
        return Err("environment dump was incomplete".to_string());
    }
    Ok((before, after))
}

/// How a colon-separated list changed
#[derive(Debug, PartialEq, Eq)]
enum PathChange<'a> {
    Prepend(Vec<&'a str>),
    Append(Vec<&'a str>),
}

fn path_change<'a>(old: &str, new: &'a str) -> Option<PathChange<'a>> {
    if old.is_empty() {
        return None;
    }
    let old: Vec<&str> = old.split(':').collect();
    let new: Vec<&'a str> = new.split(':').collect();
    if new.len() <= old.len() {
        return None;
    }

    let extra = new.len() - old.len();
    if new.ends_with(&old) {
        Some(PathChange::Prepend(new[..extra].to_vec()))
    } else if new.starts_with(&old) {
        Some(PathChange::Append(new[old.len()..].to_vec()))
    } else {
        None
    }
}

/// Operations turning `before` into `after`, ordered by variable name
fn diff(before: &EnvMap, after: &EnvMap) -> EnvironmentModifications {
    let mut mods = EnvironmentModifications::new();

    for (name, value) in after {
        if is_ignored(name) {
            continue;
        }
        match before.get(name) {
            Some(old) if old == value => {}
            Some(old) => match path_change(old, value) {
                Some(PathChange::Prepend(paths)) => {
                    // Prepending in reverse keeps the script's order
                    for p in paths.into_iter().rev() {
                        mods.prepend_path(name, p);
                    }
                }
                Some(PathChange::Append(paths)) => {
                    for p in paths {
                        mods.append_path(name, p);
                    }
                }
                None => mods.set(name, value),
            },
            None => mods.set(name, value),
        }
    }

    for name in before.keys() {
        if !after.contains_key(name) && !is_ignored(name) {
            mods.unset(name);
        }
    }

    mods
}
