//! KDL parser
//!
//! Parses eksforge KDL stack files. Each top-level node type is handled in
//! its own module.

mod cluster;
mod network;

use cluster::parse_eks;
use network::parse_vpc;

use crate::error::{ConfigError, Result};
use crate::model::{StackConfig, Tags};
use kdl::{KdlDocument, KdlNode, KdlValue};
use std::fs;
use std::path::Path;

/// Parse a KDL stack file
pub fn parse_kdl_file<P: AsRef<Path>>(path: P) -> Result<StackConfig> {
    let content = fs::read_to_string(path.as_ref())?;
    parse_kdl_string(&content)
}

/// Parse a KDL stack document
pub fn parse_kdl_string(content: &str) -> Result<StackConfig> {
    let doc: KdlDocument = content.parse()?;

    let mut region = None;
    let mut account_id = None;
    let mut network = None;
    let mut cluster = None;

    for node in doc.nodes() {
        match node.name().value() {
            "region" => region = first_string(node),
            "account-id" | "account_id" => account_id = first_scalar(node),
            "vpc" => {
                if network.is_some() {
                    return Err(ConfigError::InvalidConfig(
                        "only one vpc node is allowed".to_string(),
                    ));
                }
                network = Some(parse_vpc(node)?);
            }
            "eks" => {
                if cluster.is_some() {
                    return Err(ConfigError::InvalidConfig(
                        "only one eks node is allowed".to_string(),
                    ));
                }
                cluster = Some(parse_eks(node)?);
            }
            other => {
                tracing::debug!(node = other, "Skipping unknown node");
            }
        }
    }

    Ok(StackConfig {
        region: region.ok_or_else(|| missing("stack", "region"))?,
        account_id,
        network: network.ok_or_else(|| missing("stack", "vpc"))?,
        cluster: cluster.ok_or_else(|| missing("stack", "eks"))?,
    })
}

fn missing(section: &str, field: &str) -> ConfigError {
    ConfigError::MissingField {
        section: section.to_string(),
        field: field.to_string(),
    }
}

/// First positional argument as a string
fn first_string(node: &KdlNode) -> Option<String> {
    arguments(node)
        .next()
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}

/// First positional argument as text, accepting strings and integers
fn first_scalar(node: &KdlNode) -> Option<String> {
    arguments(node).next().and_then(scalar_text)
}

fn first_bool(node: &KdlNode) -> Option<bool> {
    arguments(node).next().and_then(|v| v.as_bool())
}

fn scalar_text(value: &KdlValue) -> Option<String> {
    value
        .as_string()
        .map(|s| s.to_string())
        .or_else(|| value.as_integer().map(|i| i.to_string()))
}

/// Positional (unnamed) entries of a node
fn arguments(node: &KdlNode) -> impl Iterator<Item = &KdlValue> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .map(|e| e.value())
}

/// Value of a `key=value` property
fn property<'a>(node: &'a KdlNode, key: &str) -> Option<&'a KdlValue> {
    node.entries()
        .iter()
        .find(|e| e.name().map(|n| n.value()) == Some(key))
        .map(|e| e.value())
}

/// `tags { Key "value" }` block
fn parse_tags(node: &KdlNode) -> Tags {
    let mut tags = Tags::new();
    if let Some(children) = node.children() {
        for tag in children.nodes() {
            if let Some(value) = first_scalar(tag) {
                tags.insert(tag.name().value(), value);
            }
        }
    }
    tags
}

#[cfg(test)]
mod tests;
