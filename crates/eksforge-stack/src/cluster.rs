//! EKS control plane builder

use crate::autoscaler::{self, AutoscalerOutput};
use crate::error::Result;
use crate::network::NetworkOutput;
use crate::nodegroup::{LinuxNodeGroups, LinuxNodeRoles, WindowsNodeGroup, linux, windows};
use crate::policy::{CLUSTER_POLICIES, managed_policy_arn, service_trust_policy};
use eksforge_cloud::{Resource, ResourceSpec, Stack, types};
use eksforge_core::{ClusterSpec, Tags};
use serde_json::json;
use tracing::{info, instrument};

/// Resources produced by [`build`]
#[derive(Debug, Clone)]
pub struct ClusterOutput {
    pub service_role: Resource,
    pub policy_attachments: Vec<Resource>,
    pub linux_roles: LinuxNodeRoles,
    pub cluster: Resource,
    pub linux: LinuxNodeGroups,
    pub windows: Vec<WindowsNodeGroup>,
    pub autoscaler: AutoscalerOutput,
}

impl ClusterOutput {
    /// Tag set after the node groups added the autoscaler discovery tags
    pub fn tags(&self) -> &Tags {
        &self.linux.tags
    }
}

/// Describe the control plane, its node groups and the autoscaler wiring
#[instrument(skip_all, fields(cluster = %spec.name))]
pub fn build(
    spec: &ClusterSpec,
    region: &str,
    network: &NetworkOutput,
    stack: &mut Stack,
) -> Result<ClusterOutput> {
    let service_role = stack.register(
        ResourceSpec::new(types::IAM_ROLE, "eks-iam-eksRole")
            .input("name", format!("{}-eks-role", spec.name))
            .input("description", format!("Role for {} EKS cluster", spec.name))
            .input(
                "assumeRolePolicy",
                service_trust_policy("2008-10-17", "eks.amazonaws.com").to_json(),
            )
            .input("tags", spec.tags.to_value()),
    )?;

    let mut policy_attachments = Vec::with_capacity(CLUSTER_POLICIES.len());
    for (index, policy) in CLUSTER_POLICIES.iter().enumerate() {
        policy_attachments.push(stack.register(
            ResourceSpec::new(types::IAM_ROLE_POLICY_ATTACHMENT, format!("rpa-{index}"))
                .input("policyArn", managed_policy_arn(policy))
                .input("role", service_role.attr("name")),
        )?);
    }

    // Node roles must exist before the cluster so they can be pre-authorized
    let linux_roles = linux::build_roles(spec, stack)?;

    let cluster = stack.register(
        ResourceSpec::new(types::EKS_CLUSTER, "eks-cluster")
            .input("name", spec.name.as_str())
            .input("version", spec.version.as_str())
            .input("createOidcProvider", json!(true))
            .input("publicAccessCidrs", json!(["0.0.0.0/0"]))
            .input("roleArn", service_role.attr("arn"))
            .input("skipDefaultNodeGroup", json!(true))
            .input("subnetIds", network.private_subnet_ids())
            .input("vpcId", network.vpc.attr("id"))
            .input("instanceRoles", linux_roles.arns())
            .input("tags", spec.tags.to_value()),
    )?;
    info!(version = %spec.version, "Control plane described");

    let linux = linux::build_groups(spec, &cluster, &linux_roles, network, stack)?;
    let windows = windows::build(spec, region, &cluster, network, &linux, stack)?;
    let autoscaler = autoscaler::build(&cluster, stack)?;

    Ok(ClusterOutput {
        service_role,
        policy_attachments,
        linux_roles,
        cluster,
        linux,
        windows,
        autoscaler,
    })
}
