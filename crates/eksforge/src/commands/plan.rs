use colored::Colorize;
use eksforge_cloud::StateManager;
use std::path::Path;

pub async fn handle(config_path: Option<&Path>, project_root: &Path, json: bool) -> anyhow::Result<()> {
    let (path, _, stack) = super::describe(config_path)?;

    let state = StateManager::new(project_root).load(stack.name()).await?;
    let plan = stack.plan(&state);

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!(
        "{} {} ({})",
        "Planning stack".blue(),
        stack.name().cyan(),
        path.display()
    );
    println!();
    super::print_plan(&plan);

    if !plan.has_changes {
        println!("{}", "✓ Infrastructure is up to date".green());
    }

    Ok(())
}
