pub mod apply;
pub mod outputs;
pub mod plan;
pub mod validate;

use colored::Colorize;
use eksforge_cloud::{ActionType, Plan, Stack};
use eksforge_cloud_local::LocalEngine;
use eksforge_core::StackConfig;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Load the stack file given on the command line, or discover one
pub fn load_config(path: Option<&Path>) -> eksforge_core::Result<(PathBuf, StackConfig)> {
    let (path, config) = match path {
        Some(path) => (path.to_path_buf(), eksforge_core::load_stack_file(path)?),
        None => eksforge_core::load_stack()?,
    };
    tracing::debug!(path = %path.display(), stack = %config.stack_name(), "Loaded stack file");
    Ok((path, config))
}

/// Load the configuration and describe the stack on it
pub fn describe(path: Option<&Path>) -> anyhow::Result<(PathBuf, StackConfig, Stack)> {
    let (path, config) = load_config(path)?;
    let (stack, _) = eksforge_stack::describe(&config)?;
    Ok((path, config, stack))
}

/// Engine for a configuration
pub fn engine(config: &StackConfig) -> LocalEngine {
    let engine = LocalEngine::new(config.region.clone());
    match &config.account_id {
        Some(account_id) => engine.with_account_id(account_id.clone()),
        None => engine,
    }
}

pub fn print_plan(plan: &Plan) {
    for action in &plan.actions {
        let marker = match action.action_type {
            ActionType::Create => "+".green().bold(),
            ActionType::Update => "~".yellow().bold(),
            ActionType::Read => "<=".cyan().bold(),
            ActionType::NoOp => " ".normal(),
        };
        let line = format!(
            "{} {} ({})",
            marker,
            action.resource_id.bold(),
            action.resource_type.dimmed()
        );
        if action.action_type == ActionType::NoOp {
            println!("{}", line.dimmed());
            continue;
        }
        println!("{}", line);
        for (key, value) in &action.details {
            println!("      {} = {}", key, format_value(value));
        }
    }

    println!();
    println!("{} {}", "Plan:".bold(), plan.summary());
}

pub fn print_outputs(outputs: &BTreeMap<String, Value>) {
    if outputs.is_empty() {
        println!("{}", "No outputs".yellow());
        return;
    }
    println!("{}", "Outputs:".bold());
    for (name, value) in outputs {
        println!("  {} = {}", name.cyan(), format_value(value));
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
