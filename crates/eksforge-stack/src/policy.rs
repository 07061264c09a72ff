//! IAM policy documents

use serde::Serialize;
use serde_json::{Value, json};

/// Service account the cluster autoscaler runs as
pub const AUTOSCALER_SERVICE_ACCOUNT: &str = "system:serviceaccount:kube-system:cluster-autoscaler";

/// Policies attached to the control-plane role
pub const CLUSTER_POLICIES: [&str; 3] = [
    "AmazonEKSServicePolicy",
    "AmazonEKSClusterPolicy",
    "AmazonEKSVPCResourceController",
];

/// Policies attached to every node role
pub const WORKER_POLICIES: [&str; 4] = [
    "AmazonEKSWorkerNodePolicy",
    "AmazonEKS_CNI_Policy",
    "AmazonEC2ContainerRegistryReadOnly",
    "AmazonSSMManagedInstanceCore",
];

/// Actions the cluster autoscaler needs on auto scaling groups
pub const AUTOSCALER_ACTIONS: [&str; 8] = [
    "autoscaling:DescribeAutoScalingGroups",
    "autoscaling:DescribeAutoScalingInstances",
    "autoscaling:DescribeLaunchConfigurations",
    "autoscaling:DescribeTags",
    "autoscaling:SetDesiredCapacity",
    "autoscaling:TerminateInstanceInAutoScalingGroup",
    "ec2:DescribeLaunchTemplateVersions",
    "ec2:DescribeInstanceTypes",
];

/// ARN of an AWS managed policy
pub fn managed_policy_arn(name: &str) -> String {
    format!("arn:aws:iam::aws:policy/{name}")
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: &'static str,
    pub statement: Vec<Statement>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    pub effect: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Value>,
    pub action: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
}

impl PolicyDocument {
    /// Render as the JSON string IAM expects
    pub fn to_json(&self) -> String {
        // Only strings and JSON values, serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Trust policy letting an AWS service assume a role
pub fn service_trust_policy(version: &'static str, service: &str) -> PolicyDocument {
    PolicyDocument {
        version,
        statement: vec![Statement {
            sid: Some(String::new()),
            effect: "Allow",
            principal: Some(json!({ "Service": service })),
            action: json!("sts:AssumeRole"),
            resource: None,
            condition: None,
        }],
    }
}

/// Permissions of the cluster autoscaler
pub fn autoscaler_policy() -> PolicyDocument {
    PolicyDocument {
        version: "2012-10-17",
        statement: vec![Statement {
            sid: None,
            effect: "Allow",
            principal: None,
            action: json!(AUTOSCALER_ACTIONS),
            resource: Some(json!("*")),
            condition: None,
        }],
    }
}

/// Trust policy federating the autoscaler service account through the
/// cluster's OIDC provider
pub fn web_identity_trust_policy(provider_arn: &str, issuer_host: &str) -> PolicyDocument {
    PolicyDocument {
        version: "2012-10-17",
        statement: vec![Statement {
            sid: None,
            effect: "Allow",
            principal: Some(json!({ "Federated": provider_arn })),
            action: json!("sts:AssumeRoleWithWebIdentity"),
            resource: None,
            condition: Some(json!({
                "StringEquals": { format!("{issuer_host}:sub"): AUTOSCALER_SERVICE_ACCOUNT }
            })),
        }],
    }
}
