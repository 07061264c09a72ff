//! Node groups
//!
//! Linux groups are EKS managed node groups; Windows groups are self-managed
//! auto scaling groups joined to the cluster by a bootstrap script. Both
//! share the node role described here.

pub mod linux;
pub mod windows;

pub use linux::{LinuxNodeGroups, LinuxNodeRoles};
pub use windows::WindowsNodeGroup;

use crate::error::Result;
use crate::policy::{WORKER_POLICIES, managed_policy_arn, service_trust_policy};
use eksforge_cloud::{Resource, ResourceSpec, Stack, types};
use eksforge_core::{NodeGroupSpec, Tags};
use serde_json::json;

/// IAM role assumed by a group's instances
#[derive(Debug, Clone)]
pub struct NodeRole {
    pub role: Resource,
    pub attachments: Vec<Resource>,
}

/// Describe `<group>-role`, attach the worker policies and export its ARN
///
/// Windows roles also list the worker policies as managed policy ARNs.
pub(crate) fn build_node_role(
    stack: &mut Stack,
    group: &NodeGroupSpec,
    cluster_name: &str,
    tags: &Tags,
    list_managed_policies: bool,
) -> Result<NodeRole> {
    let role_name = format!("{}-role", group.name);
    let mut spec = ResourceSpec::new(types::IAM_ROLE, role_name.clone())
        .input("name", role_name.as_str())
        .input(
            "description",
            format!(
                "Role used by {} nodegroup of {} EKS cluster",
                group.name, cluster_name
            ),
        )
        .input(
            "assumeRolePolicy",
            service_trust_policy("2012-10-17", "ec2.amazonaws.com").to_json(),
        )
        .input("tags", tags.to_value());
    if list_managed_policies {
        let arns: Vec<String> = WORKER_POLICIES.iter().map(|p| managed_policy_arn(p)).collect();
        spec = spec.input("managedPolicyArns", json!(arns));
    }
    let role = stack.register(spec)?;

    stack.export(format!("{role_name}-arn"), role.attr("arn"))?;

    let mut attachments = Vec::with_capacity(WORKER_POLICIES.len());
    for (index, policy) in WORKER_POLICIES.iter().enumerate() {
        attachments.push(stack.register(
            ResourceSpec::new(
                types::IAM_ROLE_POLICY_ATTACHMENT,
                format!("{role_name}-pa-{index}"),
            )
            .input("role", role.attr("name"))
            .input("policyArn", managed_policy_arn(policy)),
        )?);
    }

    Ok(NodeRole { role, attachments })
}
