//! Managed Linux node groups

use super::{NodeRole, build_node_role};
use crate::error::Result;
use crate::network::NetworkOutput;
use eksforge_cloud::{CloudError, Output, Resource, ResourceSpec, Stack, types};
use eksforge_core::{ClusterSpec, Tags};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Roles of every Linux group, keyed by config name
#[derive(Debug, Clone, Default)]
pub struct LinuxNodeRoles {
    pub roles: BTreeMap<String, NodeRole>,
}

impl LinuxNodeRoles {
    /// Role ARNs, for pre-authorizing the instances on the cluster
    pub fn arns(&self) -> Output<Value> {
        Output::all(self.roles.values().map(|r| r.role.attr("arn"))).into()
    }
}

/// Managed node groups and the tag set they were created with
#[derive(Debug, Clone)]
pub struct LinuxNodeGroups {
    pub groups: Vec<Resource>,

    /// Incoming tags plus the cluster-autoscaler discovery tags; everything
    /// described after the node groups carries these
    pub tags: Tags,
}

impl LinuxNodeGroups {
    pub fn first(&self) -> Option<&Resource> {
        self.groups.first()
    }
}

/// Describe a role per Linux group; runs before the control plane
#[instrument(skip_all, fields(cluster = %cluster.name))]
pub fn build_roles(cluster: &ClusterSpec, stack: &mut Stack) -> Result<LinuxNodeRoles> {
    let mut roles = BTreeMap::new();
    for (key, group) in &cluster.linux_node_groups {
        let role = build_node_role(stack, group, &cluster.name, &cluster.tags, false)?;
        roles.insert(key.clone(), role);
    }
    Ok(LinuxNodeRoles { roles })
}

/// Describe the managed node groups; runs after the control plane
#[instrument(skip_all, fields(cluster = %cluster.name))]
pub fn build_groups(
    cluster: &ClusterSpec,
    eks: &Resource,
    roles: &LinuxNodeRoles,
    network: &NetworkOutput,
    stack: &mut Stack,
) -> Result<LinuxNodeGroups> {
    let tags = cluster.tags.with_autoscaler_discovery(&cluster.name);

    let mut groups = Vec::with_capacity(cluster.linux_node_groups.len());
    for (key, group) in &cluster.linux_node_groups {
        let role = roles
            .roles
            .get(key)
            .ok_or_else(|| CloudError::ResourceNotFound(format!("{}-role", group.name)))?;
        let mut spec = ResourceSpec::new(types::EKS_NODE_GROUP, group.name.clone())
            .input("clusterName", eks.attr("name"))
            .input("nodeGroupName", group.name.as_str())
            .input("nodeRoleArn", role.role.attr("arn"))
            .input("subnetIds", network.private_subnet_ids())
            .input("instanceTypes", json!([group.instance_type]))
            .input("diskSize", json!(group.disk_size))
            .input(
                "scalingConfig",
                json!({
                    "desiredSize": group.desired_size,
                    "maxSize": group.max_size,
                    "minSize": group.min_size,
                }),
            )
            .input("remoteAccess", json!({ "ec2SshKey": group.ssh_key }))
            .input("tags", tags.to_value());
        if let Some(ami_type) = &group.ami_type {
            spec = spec.input("amiType", ami_type.as_str());
        }
        groups.push(stack.register(spec)?);
    }

    info!(groups = groups.len(), "Linux node groups described");
    Ok(LinuxNodeGroups { groups, tags })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network;
    use eksforge_core::{NetworkTopology, NodeGroupSpec, SubnetSpec};

    fn fixture() -> (ClusterSpec, NetworkTopology) {
        let group = NodeGroupSpec {
            name: "general".to_string(),
            instance_type: "t3.large".to_string(),
            ami_type: Some("AL2_x86_64".to_string()),
            disk_size: 50,
            desired_size: 2,
            min_size: 1,
            max_size: 3,
            ssh_key: "ops".to_string(),
        };
        let cluster = ClusterSpec {
            name: "demo".to_string(),
            version: "1.24".to_string(),
            tags: [("Team", "platform")].into_iter().collect(),
            linux_node_groups: BTreeMap::from([("general".to_string(), group)]),
            windows_node_groups: BTreeMap::new(),
        };
        let network = NetworkTopology {
            name: "demo".to_string(),
            cidr_block: "10.0.0.0/16".to_string(),
            private_subnets: vec![SubnetSpec::new("10.0.1.0/24", "us-east-1a")],
            public_subnets: vec![SubnetSpec::new("10.0.101.0/24", "us-east-1a")],
            ..Default::default()
        };
        (cluster, network)
    }

    #[test]
    fn test_roles_attach_worker_policies() {
        let (cluster, _) = fixture();
        let mut stack = Stack::new("demo");
        let roles = build_roles(&cluster, &mut stack).unwrap();

        let role = &roles.roles["general"];
        assert_eq!(role.role.logical_name(), "general-role");
        assert_eq!(role.attachments.len(), 4);
        assert!(stack.get("general-role-pa-3").is_some());
        assert!(stack.exports().any(|e| e == "general-role-arn"));
        assert!(stack.get("general-role").unwrap().inputs.get("managedPolicyArns").is_none());
    }

    #[test]
    fn test_groups_carry_discovery_tags() {
        let (cluster, topology) = fixture();
        let mut stack = Stack::new("demo");
        let network = network::build(&topology, "us-east-1", &mut stack).unwrap();
        let roles = build_roles(&cluster, &mut stack).unwrap();
        let eks = stack
            .register(ResourceSpec::new(types::EKS_CLUSTER, "eks-cluster").input("name", "demo"))
            .unwrap();

        let linux = build_groups(&cluster, &eks, &roles, &network, &mut stack).unwrap();

        assert_eq!(linux.tags.get("k8s.io/cluster-autoscaler/demo"), Some("owned"));
        assert_eq!(linux.tags.get("Team"), Some("platform"));
        assert!(!cluster.tags.contains_key("k8s.io/cluster-autoscaler/enabled"));

        let spec = stack.get("general").unwrap();
        let inputs = spec.known_inputs();
        assert_eq!(inputs["tags"]["k8s.io/cluster-autoscaler/enabled"], "true");
        assert_eq!(inputs["scalingConfig"]["maxSize"], 3);
        assert_eq!(inputs["amiType"], "AL2_x86_64");
        assert!(spec.inputs["clusterName"].deps().contains("eks-cluster"));
        assert!(spec.inputs["nodeRoleArn"].deps().contains("general-role"));
    }
}
