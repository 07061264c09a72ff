//! Self-managed Windows node groups

use super::{LinuxNodeGroups, NodeRole, build_node_role};
use crate::bootstrap::BootstrapScript;
use crate::error::Result;
use crate::network::NetworkOutput;
use eksforge_cloud::{CloudError, Resource, ResourceSpec, Stack, types};
use eksforge_core::{
    AUTOSCALER_ENABLED_TAG, ClusterSpec, ConfigError, NAME_TAG, NodeGroupSpec, Tags,
    autoscaler_cluster_tag, kubernetes_cluster_tag,
};
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

/// Kubelet port the control plane reaches nodes on
const KUBELET_PORT: u16 = 10250;

/// `Name` tag propagated to Windows instances
const WINDOWS_INSTANCE_NAME: &str = "windows-autoscaling-nodegroup";

/// SSM parameter holding the EKS-optimized Windows AMI for a Kubernetes version
pub fn windows_ami_parameter(version: &str) -> String {
    format!(
        "/aws/service/ami-windows-latest/Windows_Server-2019-English-Core-EKS_Optimized-{version}/image_id"
    )
}

/// Resources describing one Windows group
#[derive(Debug, Clone)]
pub struct WindowsNodeGroup {
    pub security_group: Resource,
    pub cluster_ingress: Resource,
    pub role: NodeRole,
    pub instance_profile: Resource,
    pub launch_template: Resource,
    pub auto_scaling_group: Resource,
}

/// Inputs shared by every Windows group
struct Context<'a> {
    cluster: &'a ClusterSpec,
    eks: &'a Resource,
    network: &'a NetworkOutput,
    ami: &'a Resource,
    first_linux_group: &'a Resource,
    tags: &'a Tags,
    script: &'a BootstrapScript,
}

/// Describe every Windows group; nothing is described when none are configured
#[instrument(skip_all, fields(cluster = %cluster.name))]
pub fn build(
    cluster: &ClusterSpec,
    region: &str,
    eks: &Resource,
    network: &NetworkOutput,
    linux: &LinuxNodeGroups,
    stack: &mut Stack,
) -> Result<Vec<WindowsNodeGroup>> {
    if !cluster.has_windows_node_groups() {
        debug!("No Windows node groups configured");
        return Ok(Vec::new());
    }

    let first_linux_group = linux.first().ok_or(ConfigError::WindowsWithoutLinux)?;

    let ami = stack.register(
        ResourceSpec::data(types::SSM_PARAMETER, "windows-ami")
            .input("name", windows_ami_parameter(&cluster.version)),
    )?;

    let script = BootstrapScript::new(region);
    let context = Context {
        cluster,
        eks,
        network,
        ami: &ami,
        first_linux_group,
        tags: &linux.tags,
        script: &script,
    };

    let mut groups = Vec::with_capacity(cluster.windows_node_groups.len());
    for group in cluster.windows_node_groups.values() {
        groups.push(build_group(&context, group, stack)?);
    }

    info!(groups = groups.len(), "Windows node groups described");
    Ok(groups)
}

fn build_group(
    context: &Context<'_>,
    group: &NodeGroupSpec,
    stack: &mut Stack,
) -> Result<WindowsNodeGroup> {
    let name = &group.name;
    let cluster_sg = context.eks.attr("vpcConfig.clusterSecurityGroupId");

    let security_group = stack.register(
        ResourceSpec::new(types::SECURITY_GROUP, format!("{name}-sg"))
            .input("name", format!("{name}-sg"))
            .input(
                "description",
                "Windows nodegroup, Allow inbound from itself and eks cluster on port 10250",
            )
            .input("vpcId", context.network.vpc.attr("id"))
            .input(
                "egress",
                json!([{
                    "protocol": "-1",
                    "fromPort": 0,
                    "toPort": 0,
                    "cidrBlocks": ["0.0.0.0/0"],
                }]),
            )
            .input(
                "ingress",
                cluster_sg.clone().map(|sg| {
                    json!([
                        { "protocol": "-1", "fromPort": 0, "toPort": 0, "self": true },
                        {
                            "protocol": "tcp",
                            "fromPort": KUBELET_PORT,
                            "toPort": KUBELET_PORT,
                            "securityGroups": [sg],
                        },
                    ])
                }),
            )
            .input("tags", context.tags.to_value()),
    )?;

    let cluster_ingress = stack.register(
        ResourceSpec::new(
            types::SECURITY_GROUP_RULE,
            format!("{name}-sg-inbound-in-cluster-sg"),
        )
        .input("type", "ingress")
        .input("fromPort", json!(0))
        .input("toPort", json!(0))
        .input("protocol", "-1")
        .input("securityGroupId", cluster_sg)
        .input("sourceSecurityGroupId", security_group.attr("id"))
        .depends_on(context.eks),
    )?;

    let role = build_node_role(stack, group, &context.cluster.name, context.tags, true)?;

    let instance_profile = stack.register(
        ResourceSpec::new(types::IAM_INSTANCE_PROFILE, format!("{name}-instance-profile"))
            .input("name", format!("{name}-instance-profile"))
            .input("role", role.role.attr("name")),
    )?;

    let script = context.script.clone();
    let group_name = name.clone();
    let user_data = context.eks.attr_string("name").try_map(move |cluster_name| {
        script
            .user_data(&cluster_name)
            .map_err(|e| CloudError::UnresolvedValue(format!("user data of {group_name}: {e}")))
    });

    let launch_template = stack.register(
        ResourceSpec::new(types::LAUNCH_TEMPLATE, format!("{name}-launch-template"))
            .input("name", format!("{name}-launch-template"))
            .input(
                "blockDeviceMappings",
                json!([{
                    "deviceName": "/dev/sda1",
                    "ebs": {
                        "volumeSize": group.disk_size,
                        "volumeType": "gp2",
                        "deleteOnTermination": "true",
                    },
                }]),
            )
            .input(
                "iamInstanceProfile",
                instance_profile.attr("name").map(|name| json!({ "name": name })),
            )
            .input("imageId", context.ami.attr("value"))
            .input("instanceType", group.instance_type.as_str())
            .input("keyName", group.ssh_key.as_str())
            .input(
                "vpcSecurityGroupIds",
                security_group.attr("id").map(|id| json!([id])),
            )
            .input(
                "metadataOptions",
                json!({
                    "httpEndpoint": "enabled",
                    "httpTokens": "optional",
                    "httpPutResponseHopLimit": 2,
                    "instanceMetadataTags": "disabled",
                }),
            )
            .input(
                "tagSpecifications",
                json!([{ "resourceType": "instance", "tags": context.tags.to_value() }]),
            )
            .input("userData", user_data)
            .depends_on(context.first_linux_group),
    )?;

    let auto_scaling_group = stack.register(
        ResourceSpec::new(types::AUTOSCALING_GROUP, name.clone())
            .input("name", name.as_str())
            .input("desiredCapacity", json!(group.desired_size))
            .input("maxSize", json!(group.max_size))
            .input("minSize", json!(group.min_size))
            .input(
                "launchTemplate",
                launch_template
                    .attr("id")
                    .map(|id| json!({ "id": id, "version": "$Latest" })),
            )
            .input("vpcZoneIdentifiers", context.network.private_subnet_ids())
            .input("instanceRefresh", json!({ "strategy": "Rolling" }))
            .input(
                "tags",
                context
                    .eks
                    .attr_string("name")
                    .map(|cluster_name| auto_scaling_group_tags(&cluster_name)),
            ),
    )?;

    Ok(WindowsNodeGroup {
        security_group,
        cluster_ingress,
        role,
        instance_profile,
        launch_template,
        auto_scaling_group,
    })
}

/// Tags propagated to every Windows instance
fn auto_scaling_group_tags(cluster_name: &str) -> Value {
    let tags = [
        (NAME_TAG.to_string(), WINDOWS_INSTANCE_NAME),
        (kubernetes_cluster_tag(cluster_name), "owned"),
        (autoscaler_cluster_tag(cluster_name), "owned"),
        (AUTOSCALER_ENABLED_TAG.to_string(), "true"),
    ];
    Value::Array(
        tags.into_iter()
            .map(|(key, value)| json!({ "key": key, "value": value, "propagateAtLaunch": true }))
            .collect(),
    )
}
