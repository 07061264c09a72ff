//! vpc node parsing

use super::{first_bool, first_string, missing, parse_tags, property};
use crate::error::{ConfigError, Result};
use crate::model::{NetworkTopology, SubnetSpec};
use kdl::KdlNode;

/// Parse a `vpc "<name>" { ... }` node
pub fn parse_vpc(node: &KdlNode) -> Result<NetworkTopology> {
    let name = first_string(node)
        .ok_or_else(|| ConfigError::InvalidConfig("vpc requires a name".to_string()))?;

    let mut network = NetworkTopology {
        name: name.clone(),
        ..Default::default()
    };
    let mut cidr_block = None;

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "cidr-block" | "cidr_block" => cidr_block = first_string(child),
                "private-subnet" | "private_subnet" => {
                    network.private_subnets.push(parse_subnet(&name, child)?);
                }
                "public-subnet" | "public_subnet" => {
                    network.public_subnets.push(parse_subnet(&name, child)?);
                }
                "nat-gateway-per-az" | "nat_gateway_per_az" => {
                    network.nat_gateway_per_az = first_bool(child).ok_or_else(|| {
                        ConfigError::InvalidConfig(format!(
                            "vpc \"{name}\": nat-gateway-per-az expects #true or #false"
                        ))
                    })?;
                }
                "tags" => network.tags = parse_tags(child),
                other => {
                    tracing::debug!(vpc = %name, node = other, "Skipping unknown vpc setting");
                }
            }
        }
    }

    network.cidr_block = cidr_block.ok_or_else(|| missing(&format!("vpc \"{name}\""), "cidr-block"))?;
    Ok(network)
}

/// `private-subnet "10.0.1.0/24" az="us-east-1a"`
fn parse_subnet(vpc: &str, node: &KdlNode) -> Result<SubnetSpec> {
    let kind = node.name().value();
    let cidr = first_string(node)
        .ok_or_else(|| missing(&format!("vpc \"{vpc}\" {kind}"), "cidr"))?;
    let az = property(node, "az")
        .and_then(|v| v.as_string())
        .ok_or_else(|| missing(&format!("vpc \"{vpc}\" {kind} {cidr}"), "az"))?;
    Ok(SubnetSpec::new(cidr, az))
}
