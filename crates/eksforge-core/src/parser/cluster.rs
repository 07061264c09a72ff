//! eks node parsing

use super::{first_scalar, first_string, missing, parse_tags};
use crate::error::{ConfigError, Result};
use crate::model::{ClusterSpec, NodeGroupSpec, parse_capacity};
use kdl::KdlNode;

/// Parse an `eks "<name>" { ... }` node
pub fn parse_eks(node: &KdlNode) -> Result<ClusterSpec> {
    let name = first_string(node)
        .ok_or_else(|| ConfigError::InvalidConfig("eks requires a name".to_string()))?;

    let mut cluster = ClusterSpec {
        name: name.clone(),
        ..Default::default()
    };
    let mut version = None;

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "version" => version = first_scalar(child),
                "tags" => cluster.tags = parse_tags(child),
                "linux-nodegroup" | "linux_nodegroup" => {
                    let (key, group) = parse_node_group(child)?;
                    insert_group(&mut cluster.linux_node_groups, key, group)?;
                }
                "windows-nodegroup" | "windows_nodegroup" => {
                    let (key, group) = parse_node_group(child)?;
                    insert_group(&mut cluster.windows_node_groups, key, group)?;
                }
                other => {
                    tracing::debug!(eks = %name, node = other, "Skipping unknown eks setting");
                }
            }
        }
    }

    cluster.version = version.ok_or_else(|| missing(&format!("eks \"{name}\""), "version"))?;
    Ok(cluster)
}

fn insert_group(
    groups: &mut std::collections::BTreeMap<String, NodeGroupSpec>,
    key: String,
    group: NodeGroupSpec,
) -> Result<()> {
    if groups.contains_key(&key) {
        return Err(ConfigError::InvalidConfig(format!(
            "node group '{key}' is defined twice"
        )));
    }
    groups.insert(key, group);
    Ok(())
}

/// Parse a `linux-nodegroup "<key>" { ... }` or `windows-nodegroup` node
fn parse_node_group(node: &KdlNode) -> Result<(String, NodeGroupSpec)> {
    let kind = node.name().value();
    let key = first_string(node)
        .ok_or_else(|| ConfigError::InvalidConfig(format!("{kind} requires a name")))?;
    let section = format!("{kind} \"{key}\"");

    let mut name = None;
    let mut instance_type = None;
    let mut ami_type = None;
    let mut disk_size = None;
    let mut desired_size = None;
    let mut min_size = None;
    let mut max_size = None;
    let mut ssh_key = None;

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let value = first_scalar(child);
            match child.name().value() {
                "name" => name = value,
                "instance-type" | "instanceType" => instance_type = value,
                "ami-type" | "amiType" => ami_type = value,
                "disk-size" | "diskSize" => disk_size = value,
                "desired-size" | "desiredSize" => desired_size = value,
                "min-size" | "minSize" => min_size = value,
                "max-size" | "maxSize" => max_size = value,
                "ssh-key" | "sshKey" => ssh_key = value,
                other => {
                    tracing::debug!(group = %key, node = other, "Skipping unknown node group setting");
                }
            }
        }
    }

    let name = name.unwrap_or_else(|| key.clone());
    let size = |value: Option<String>, field: &'static str| -> Result<u32> {
        let value = value.ok_or_else(|| missing(&section, field))?;
        parse_capacity(&name, field, &value)
    };

    let group = NodeGroupSpec {
        instance_type: instance_type.ok_or_else(|| missing(&section, "instance-type"))?,
        ami_type,
        disk_size: size(disk_size, "disk-size")?,
        desired_size: size(desired_size, "desired-size")?,
        min_size: size(min_size, "min-size")?,
        max_size: size(max_size, "max-size")?,
        ssh_key: ssh_key.ok_or_else(|| missing(&section, "ssh-key"))?,
        name: name.clone(),
    };

    Ok((key, group))
}
