//! Stack loader
//!
//! Combines discovery, template expansion, parsing and validation.

use crate::discovery::find_stack_file;
use crate::error::{ConfigError, Result};
use crate::model::StackConfig;
use crate::parser::parse_kdl_string;
use crate::stack_file::parse_yaml_string;
use crate::template::TemplateProcessor;
use crate::validate::validate;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Stack file format, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackFormat {
    Kdl,
    Yaml,
}

impl StackFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("kdl") => Ok(StackFormat::Kdl),
            Some("yaml") | Some("yml") => Ok(StackFormat::Yaml),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Find and load the stack file
#[instrument]
pub fn load_stack() -> Result<(PathBuf, StackConfig)> {
    let path = find_stack_file()?;
    let config = load_stack_file(&path)?;
    Ok((path, config))
}

/// Load, expand, parse and validate a stack file
#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_stack_file(path: &Path) -> Result<StackConfig> {
    let format = StackFormat::from_path(path)?;

    debug!("Expanding template");
    let mut processor = TemplateProcessor::new();
    processor.add_env_variables();
    let content = processor.render_file(path)?;

    debug!(?format, "Parsing stack file");
    let config = parse_stack_str(&content, format)?;

    validate(&config)?;
    info!(
        stack = %config.stack_name(),
        private_subnets = config.network.private_subnets.len(),
        public_subnets = config.network.public_subnets.len(),
        linux_node_groups = config.cluster.linux_node_groups.len(),
        windows_node_groups = config.cluster.windows_node_groups.len(),
        "Stack configuration loaded"
    );
    Ok(config)
}

/// Parse stack file content without expanding or validating it
pub fn parse_stack_str(content: &str, format: StackFormat) -> Result<StackConfig> {
    match format {
        StackFormat::Kdl => parse_kdl_string(content),
        StackFormat::Yaml => parse_yaml_string(content),
    }
}
