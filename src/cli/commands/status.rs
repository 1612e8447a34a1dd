//! Status command - check declared dependencies and build tools

use crate::config::{Config, ConfigManager};
use crate::error::RecipeResult;
use crate::recipe::{probe_all, Recipe};
use console::{style, Emoji};
use std::process::Stdio;
use tokio::process::Command;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");

/// Execute the status command
pub async fn execute(recipe: &Recipe, config: &Config) -> RecipeResult<()> {
    println!("{}", style(format!("{} status", recipe)).bold().cyan());
    println!();

    let mut all_ok = true;

    println!("{}", style("Dependencies:").bold());
    for status in probe_all(recipe.dependencies).await {
        if status.available {
            println!("  {} {}", CHECK, status.name);
        } else {
            all_ok = false;
            let hint = recipe
                .dependencies
                .iter()
                .find(|d| d.name == status.name)
                .map(|d| d.hint)
                .unwrap_or_default();
            println!("  {} {} - {}", CROSS, style(status.name).red(), hint);
        }
    }

    println!();
    println!("{}", style("Tools:").bold());
    all_ok &= check_tool("bash", &config.tools.bash).await;
    all_ok &= check_tool("python", &config.tools.python).await;

    println!();
    println!("{}", style("Paths:").bold());
    println!(
        "  stage root      {}",
        ConfigManager::stage_root(config).display()
    );
    println!(
        "  download cache  {}",
        ConfigManager::download_cache(config).display()
    );
    println!(
        "  audit log       {}",
        ConfigManager::audit_log_path().display()
    );

    println!();
    if all_ok {
        println!("{}", style("All checks passed").green().bold());
    } else {
        println!(
            "{}",
            style("Some checks failed - see above for details").yellow().bold()
        );
    }

    Ok(())
}

async fn check_tool(label: &str, program: &str) -> bool {
    let ok = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false);

    if ok {
        println!("  {} {} ({})", CHECK, label, program);
    } else {
        println!("  {} {} ({}) not found", CROSS, style(label).red(), program);
    }
    ok
}
