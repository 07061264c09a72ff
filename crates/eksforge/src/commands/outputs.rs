use eksforge_cloud::StateManager;
use std::path::Path;

pub async fn handle(project_root: &Path, json: bool) -> anyhow::Result<()> {
    let state_manager = StateManager::new(project_root);
    let Some(state) = state_manager.load_existing().await? else {
        anyhow::bail!(
            "No state found at {}\nhint: run `eksforge apply --yes` first",
            state_manager.state_path().display()
        );
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&state.outputs)?);
    } else {
        super::print_outputs(&state.outputs);
    }

    Ok(())
}
