//! EKS cluster model

use super::Tags;
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// EKS control plane and its node groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    /// Cluster name
    pub name: String,

    /// Kubernetes version (e.g. "1.24")
    pub version: String,

    pub tags: Tags,

    /// Managed Linux node groups, keyed by config name
    pub linux_node_groups: BTreeMap<String, NodeGroupSpec>,

    /// Self-managed Windows node groups, keyed by config name
    pub windows_node_groups: BTreeMap<String, NodeGroupSpec>,
}

impl ClusterSpec {
    pub fn has_windows_node_groups(&self) -> bool {
        !self.windows_node_groups.is_empty()
    }
}

/// Node group settings shared by Linux and Windows groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeGroupSpec {
    /// Resource name; defaults to the config key
    pub name: String,

    /// EC2 instance type
    pub instance_type: String,

    /// AMI type of a managed node group (Linux only)
    pub ami_type: Option<String>,

    /// Root volume size (GiB)
    pub disk_size: u32,

    pub desired_size: u32,

    pub min_size: u32,

    pub max_size: u32,

    /// EC2 key pair for remote access
    pub ssh_key: String,
}

impl NodeGroupSpec {
    /// Check `min <= desired <= max`
    pub fn check_capacity(&self) -> Result<()> {
        if self.min_size <= self.desired_size && self.desired_size <= self.max_size {
            Ok(())
        } else {
            Err(ConfigError::CapacityOrder {
                group: self.name.clone(),
                min: self.min_size,
                desired: self.desired_size,
                max: self.max_size,
            })
        }
    }
}

/// Parse a size field given as text
pub fn parse_capacity(group: &str, field: &'static str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::InvalidCapacity {
            group: group.to_string(),
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_capacity() {
        assert_eq!(parse_capacity("general", "desiredSize", "3").unwrap(), 3);
        assert_eq!(parse_capacity("general", "desiredSize", " 2 ").unwrap(), 2);

        let err = parse_capacity("general", "maxSize", "three").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidCapacity { field: "maxSize", .. }
        ));
        assert!(parse_capacity("general", "minSize", "-1").is_err());
    }

    #[test]
    fn test_capacity_order() {
        let mut group = NodeGroupSpec {
            name: "general".to_string(),
            desired_size: 2,
            min_size: 1,
            max_size: 3,
            ..Default::default()
        };
        assert!(group.check_capacity().is_ok());

        group.desired_size = 5;
        assert!(matches!(
            group.check_capacity(),
            Err(ConfigError::CapacityOrder { desired: 5, .. })
        ));
    }
}
