//! Stack file discovery

use crate::error::{ConfigError, Result};
use std::path::PathBuf;
use tracing::debug;

/// Environment variable pointing directly at a stack file
pub const CONFIG_PATH_ENV: &str = "EKSFORGE_CONFIG_PATH";

/// File names searched in each directory, highest priority first
const CANDIDATES: &[&str] = &["stack.local.kdl", "stack.kdl", "stack.yaml", "stack.yml"];

/// Global config directory (`~/.config/eksforge`)
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("eksforge"))
}

/// Find the stack file
///
/// Search order:
/// 1. `EKSFORGE_CONFIG_PATH`
/// 2. current directory: stack.local.kdl, stack.kdl, stack.yaml, stack.yml
/// 3. `./.eksforge/`, same order
/// 4. `~/.config/eksforge/stack.kdl`
#[tracing::instrument]
pub fn find_stack_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            debug!(path = %path.display(), "Using stack file from environment");
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;

    for filename in CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let local_dir = current_dir.join(".eksforge");
    if local_dir.is_dir() {
        for filename in CANDIDATES {
            let path = local_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(global_dir) = config_dir() {
        let global_config = global_dir.join("stack.kdl");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::StackFileNotFound)
}
