//! YAML stack files
//!
//! Reads the project-scoped stack configuration shape:
//!
//! ```yaml
//! config:
//!   aws:region: us-east-1
//!   demo:Vpc:
//!     Name: demo
//!     CidrBlock: 10.0.0.0/16
//!     PrivateSubnets: ["10.0.1.0/24"]
//!     PrivateSubnetsAZ: ["us-east-1a"]
//!     PublicSubnets: ["10.0.101.0/24"]
//!     PublicSubnetsAZ: ["us-east-1a"]
//!     NatGatewayPerAZ: false
//!   demo:Eks:
//!     Name: demo
//!     Version: "1.24"
//!     LinuxNodegroups:
//!       general:
//!         instanceType: t3.large
//!         desiredSize: "2"
//! ```
//!
//! Keys may carry a `<namespace>:` prefix, which is ignored.

use crate::error::{ConfigError, Result};
use crate::model::{
    ClusterSpec, NetworkTopology, NodeGroupSpec, StackConfig, SubnetSpec, Tags, parse_capacity,
};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct StackFile {
    #[serde(default)]
    config: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VpcSection {
    name: String,
    cidr_block: String,
    #[serde(default)]
    private_subnets: Vec<String>,
    #[serde(default, rename = "PrivateSubnetsAZ")]
    private_subnets_az: Vec<String>,
    #[serde(default)]
    public_subnets: Vec<String>,
    #[serde(default, rename = "PublicSubnetsAZ")]
    public_subnets_az: Vec<String>,
    #[serde(default, rename = "NatGatewayPerAZ")]
    nat_gateway_per_az: bool,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EksSection {
    name: String,
    version: Scalar,
    #[serde(default)]
    tags: BTreeMap<String, String>,
    #[serde(default)]
    linux_nodegroups: BTreeMap<String, GroupSection>,
    #[serde(default)]
    windows_nodegroups: BTreeMap<String, GroupSection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupSection {
    name: Option<String>,
    instance_type: Option<String>,
    ami_type: Option<String>,
    disk_size: Option<Scalar>,
    desired_size: Option<Scalar>,
    min_size: Option<Scalar>,
    max_size: Option<Scalar>,
    ssh_key: Option<String>,
}

/// A value written either quoted or bare (`"1.24"`, `1.24`, `"3"`, `3`)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl Scalar {
    /// Bare decimals are rejected: YAML reads `1.20` as `1.2`
    fn into_text(self, field: &str) -> Result<String> {
        match self {
            Scalar::Text(s) => Ok(s),
            Scalar::Integer(i) => Ok(i.to_string()),
            Scalar::Float(f) => Err(ConfigError::InvalidConfig(format!(
                "{field} is a bare decimal ({f})\nhint: quote it, e.g. {field}: \"{f}\""
            ))),
        }
    }
}

/// Parse a YAML stack document
pub fn parse_yaml_string(content: &str) -> Result<StackConfig> {
    let file: StackFile = serde_yaml::from_str(content)?;

    let mut region = None;
    let mut account_id = None;
    let mut vpc = None;
    let mut eks = None;

    for (key, value) in file.config {
        let short = key.rsplit(':').next().unwrap_or(key.as_str());
        match short {
            "region" => {
                // `aws:region` wins over a project-level `region`
                if region.is_none() || key.starts_with("aws:") {
                    region = Some(serde_yaml::from_value::<Scalar>(value)?.into_text(&key)?);
                }
            }
            "accountId" | "AccountId" => {
                account_id = Some(serde_yaml::from_value::<Scalar>(value)?.into_text(&key)?);
            }
            "Vpc" => vpc = Some(serde_yaml::from_value::<VpcSection>(value)?),
            "Eks" => eks = Some(serde_yaml::from_value::<EksSection>(value)?),
            _ => tracing::debug!(key = %key, "Skipping unknown config key"),
        }
    }

    let missing = |field: &str| ConfigError::MissingField {
        section: "config".to_string(),
        field: field.to_string(),
    };

    Ok(StackConfig {
        region: region.ok_or_else(|| missing("aws:region"))?,
        account_id,
        network: network_from(vpc.ok_or_else(|| missing("Vpc"))?)?,
        cluster: cluster_from(eks.ok_or_else(|| missing("Eks"))?)?,
    })
}

fn network_from(vpc: VpcSection) -> Result<NetworkTopology> {
    Ok(NetworkTopology {
        private_subnets: zip_subnets("private", vpc.private_subnets, vpc.private_subnets_az)?,
        public_subnets: zip_subnets("public", vpc.public_subnets, vpc.public_subnets_az)?,
        name: vpc.name,
        cidr_block: vpc.cidr_block,
        nat_gateway_per_az: vpc.nat_gateway_per_az,
        tags: Tags::from(vpc.tags),
    })
}

/// Pair parallel CIDR and availability-zone lists
fn zip_subnets(kind: &'static str, cidrs: Vec<String>, zones: Vec<String>) -> Result<Vec<SubnetSpec>> {
    if cidrs.len() != zones.len() {
        return Err(ConfigError::SubnetCountMismatch {
            kind,
            subnets: cidrs.len(),
            zones: zones.len(),
        });
    }
    Ok(cidrs
        .into_iter()
        .zip(zones)
        .map(|(cidr, az)| SubnetSpec::new(cidr, az))
        .collect())
}

fn cluster_from(eks: EksSection) -> Result<ClusterSpec> {
    Ok(ClusterSpec {
        name: eks.name,
        version: eks.version.into_text("Version")?,
        tags: Tags::from(eks.tags),
        linux_node_groups: groups_from("LinuxNodegroups", eks.linux_nodegroups)?,
        windows_node_groups: groups_from("WindowsNodegroups", eks.windows_nodegroups)?,
    })
}

fn groups_from(
    section: &str,
    groups: BTreeMap<String, GroupSection>,
) -> Result<BTreeMap<String, NodeGroupSpec>> {
    groups
        .into_iter()
        .map(|(key, group)| {
            let spec = group_from(&format!("{section}.{key}"), &key, group)?;
            Ok((key, spec))
        })
        .collect()
}

fn group_from(section: &str, key: &str, group: GroupSection) -> Result<NodeGroupSpec> {
    let missing = |field: &str| ConfigError::MissingField {
        section: section.to_string(),
        field: field.to_string(),
    };
    let name = group
        .name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| key.to_string());
    let size = |value: Option<Scalar>, field: &'static str| -> Result<u32> {
        let value = value.ok_or_else(|| missing(field))?;
        parse_capacity(&name, field, &value.into_text(field)?)
    };

    Ok(NodeGroupSpec {
        instance_type: group.instance_type.ok_or_else(|| missing("instanceType"))?,
        ami_type: group.ami_type.filter(|a| !a.is_empty()),
        disk_size: size(group.disk_size, "diskSize")?,
        desired_size: size(group.desired_size, "desiredSize")?,
        min_size: size(group.min_size, "minSize")?,
        max_size: size(group.max_size, "maxSize")?,
        ssh_key: group.ssh_key.ok_or_else(|| missing("sshKey"))?,
        name: name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const STACK: &str = r#"
config:
  aws:region: us-west-2
  infra:accountId: "123456789012"
  infra:Vpc:
    Name: demo
    CidrBlock: 10.0.0.0/16
    PrivateSubnets: ["10.0.1.0/24", "10.0.2.0/24"]
    PrivateSubnetsAZ: ["us-west-2a", "us-west-2b"]
    PublicSubnets: ["10.0.101.0/24"]
    PublicSubnetsAZ: ["us-west-2a"]
    NatGatewayPerAZ: true
    Tags:
      Environment: dev
  infra:Eks:
    Name: demo
    Version: "1.24"
    Tags:
      Environment: dev
    LinuxNodegroups:
      general:
        name: general
        instanceType: t3.large
        amiType: AL2_x86_64
        diskSize: "50"
        desiredSize: "2"
        minSize: "1"
        maxSize: "3"
        sshKey: ops
    WindowsNodegroups:
      win:
        instanceType: m5.large
        diskSize: 100
        desiredSize: 1
        minSize: 1
        maxSize: 2
        sshKey: ops
"#;

    #[test]
    fn test_parse_namespaced_stack() {
        let config = parse_yaml_string(STACK).unwrap();

        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.account_id.as_deref(), Some("123456789012"));
        assert_eq!(config.network.name, "demo");
        assert_eq!(config.network.private_subnets.len(), 2);
        assert_eq!(
            config.network.private_subnets[1],
            SubnetSpec::new("10.0.2.0/24", "us-west-2b")
        );
        assert!(config.network.nat_gateway_per_az);
        assert_eq!(config.network.tags.get("Environment"), Some("dev"));
        assert_eq!(config.cluster.version, "1.24");
    }

    #[test]
    fn test_group_sizes_accept_strings_and_integers() {
        let config = parse_yaml_string(STACK).unwrap();

        let general = &config.cluster.linux_node_groups["general"];
        assert_eq!(general.disk_size, 50);
        assert_eq!(general.desired_size, 2);
        assert_eq!(general.ami_type.as_deref(), Some("AL2_x86_64"));

        let win = &config.cluster.windows_node_groups["win"];
        assert_eq!(win.name, "win");
        assert_eq!(win.disk_size, 100);
    }

    #[test]
    fn test_mismatched_subnet_zones() {
        let yaml = STACK.replace(
            r#"PrivateSubnetsAZ: ["us-west-2a", "us-west-2b"]"#,
            r#"PrivateSubnetsAZ: ["us-west-2a"]"#,
        );
        let err = parse_yaml_string(&yaml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::SubnetCountMismatch {
                kind: "private",
                subnets: 2,
                zones: 1
            }
        ));
    }

    #[test]
    fn test_malformed_size() {
        let yaml = STACK.replace(r#"desiredSize: "2""#, r#"desiredSize: "two""#);
        let err = parse_yaml_string(&yaml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidCapacity {
                field: "desiredSize",
                ..
            }
        ));
    }

    #[test]
    fn test_bare_decimal_version_is_rejected() {
        let yaml = STACK.replace(r#"Version: "1.24""#, "Version: 1.20");
        let err = parse_yaml_string(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(ref msg) if msg.contains("Version")));
    }

    #[test]
    fn test_bare_integer_version_is_kept() {
        let yaml = STACK.replace(r#"Version: "1.24""#, "Version: 2");
        let config = parse_yaml_string(&yaml).unwrap();
        assert_eq!(config.cluster.version, "2");
    }

    #[test]
    fn test_missing_eks_section() {
        let yaml = "config:\n  aws:region: us-east-1\n  infra:Vpc:\n    Name: demo\n    CidrBlock: 10.0.0.0/16\n";
        let err = parse_yaml_string(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { ref field, .. } if field == "Eks"));
    }
}
