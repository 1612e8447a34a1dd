//! Info command - show the pinned descriptor and dependencies

use crate::error::RecipeResult;
use crate::recipe::Recipe;
use console::style;

/// Execute the info command
pub async fn execute(recipe: &Recipe) -> RecipeResult<()> {
    let d = &recipe.descriptor;

    println!("{}", style(recipe).bold().cyan());
    println!("  {}", recipe.description);
    println!();
    println!("  {:<10} {}", style("homepage").dim(), recipe.homepage);
    println!("  {:<10} {}", style("version").dim(), d.version);
    println!("  {:<10} {}", style("url").dim(), d.url);
    println!("  {:<10} {}", style("sha256").dim(), d.sha256);
    println!("  {:<10} {}", style("expand").dim(), d.expand);
    println!();
    println!("{}", style("Dependencies:").bold());
    for dep in recipe.dependencies {
        println!("  {}", dep.name);
    }

    Ok(())
}
