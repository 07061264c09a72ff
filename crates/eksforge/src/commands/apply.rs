use colored::Colorize;
use eksforge_cloud::{Engine, StateManager};
use std::path::Path;

pub async fn handle(config_path: Option<&Path>, project_root: &Path, yes: bool) -> anyhow::Result<()> {
    let (path, config, stack) = super::describe(config_path)?;
    println!(
        "{} {} ({})",
        "Applying stack".blue().bold(),
        stack.name().cyan(),
        path.display()
    );

    let state_manager = StateManager::new(project_root);
    let mut state = state_manager.load(stack.name()).await?;
    let plan = stack.plan(&state);

    println!();
    super::print_plan(&plan);

    if !yes {
        println!();
        println!("Run with --yes to apply");
        return Ok(());
    }

    let engine = super::engine(&config);
    let auth = engine.check_auth().await?;
    if !auth.authenticated {
        anyhow::bail!(
            "{} engine is not authenticated: {}",
            engine.display_name(),
            auth.error.unwrap_or_default()
        );
    }
    if let Some(account) = &auth.account_info {
        println!();
        println!("Engine: {} ({})", engine.display_name(), account);
    }

    let lock = state_manager.acquire_lock().await?;

    println!();
    println!("{}", "Creating resources...".yellow());
    let applied = stack.apply(&engine).await?;

    state.record(&applied);
    state_manager.save(&state).await?;
    lock.release().await?;

    println!(
        "{}",
        format!(
            "✓ Applied {} resources in {}ms",
            applied.result.applied.len(),
            applied.result.duration_ms
        )
        .green()
        .bold()
    );
    println!(
        "State: {}",
        state_manager.state_path().display().to_string().cyan()
    );
    println!();
    super::print_outputs(applied.outputs());

    Ok(())
}
