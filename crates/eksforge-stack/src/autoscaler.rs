//! Cluster autoscaler trust wiring
//!
//! The autoscaler's role is federated through the cluster's OIDC provider.
//! The issuer only exists once the control plane does, so every value below
//! is derived from the cluster's `identities` attribute and the provider
//! lookups that follow from it.

use crate::error::Result;
use crate::policy::{autoscaler_policy, web_identity_trust_policy};
use eksforge_cloud::{CloudError, Resource, ResourceSpec, Stack, lookup_path, types};
use serde_json::{Value, json};
use tracing::{info, instrument};

pub const AUTOSCALER_POLICY_NAME: &str = "AmazonEKSClusterAutoscalerPolicy";
pub const AUTOSCALER_ROLE_NAME: &str = "AmazonEKSClusterAutoscalerRole";
pub const IDENTITY_PROVIDER_CONFIG_NAME: &str = "oidcProviderConfig";

/// Resources produced by [`build`]
#[derive(Debug, Clone)]
pub struct AutoscalerOutput {
    pub policy: Resource,
    pub caller_identity: Resource,
    pub oidc_provider: Resource,
    pub identity_provider_config: Resource,
    pub role: Resource,
}

/// Issuer URL of the cluster's first OIDC identity
pub fn issuer_url(identities: Value) -> eksforge_cloud::Result<String> {
    lookup_path(&identities, "0.oidcs.0.issuer")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            CloudError::UnresolvedValue("eks-cluster.identities has no OIDC issuer".to_string())
        })
}

/// Issuer host, as used in provider ARNs and trust conditions
pub fn issuer_host(issuer: &str) -> String {
    issuer.replace("https://", "")
}

fn first_client_id(client_ids: Value) -> eksforge_cloud::Result<String> {
    client_ids
        .get(0)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            CloudError::UnresolvedValue("oidc-provider.clientIdLists is empty".to_string())
        })
}

/// Describe the autoscaler policy, identity provider config and role
#[instrument(skip_all, fields(cluster = %eks.logical_name()))]
pub fn build(eks: &Resource, stack: &mut Stack) -> Result<AutoscalerOutput> {
    let policy = stack.register(
        ResourceSpec::new(types::IAM_POLICY, AUTOSCALER_POLICY_NAME)
            .input("name", AUTOSCALER_POLICY_NAME)
            .input("description", "Policy for the Kubernetes AutoScaler")
            .input("path", "/")
            .input("policy", autoscaler_policy().to_json()),
    )?;

    let caller_identity =
        stack.register(ResourceSpec::data(types::CALLER_IDENTITY, "caller-identity"))?;

    let issuer = eks.attr("identities").try_map(issuer_url);
    let host = issuer.clone().map(|issuer| issuer_host(&issuer));
    let provider_arn = caller_identity
        .attr_string("accountId")
        .zip(host.clone())
        .map(|(account, host)| format!("arn:aws:iam::{account}:oidc-provider/{host}"));

    let oidc_provider = stack.register(
        ResourceSpec::data(types::OPENID_CONNECT_PROVIDER, "oidc-provider")
            .input("arn", provider_arn.clone()),
    )?;

    let client_id = oidc_provider.attr("clientIdLists").try_map(first_client_id);
    let identity_provider_config = stack.register(
        ResourceSpec::new(types::EKS_IDENTITY_PROVIDER_CONFIG, "oidc-provider-config")
            .input("clusterName", eks.attr("name"))
            .input(
                "oidc",
                client_id.zip(issuer).map(|(client_id, issuer)| {
                    json!({
                        "clientId": client_id,
                        "identityProviderConfigName": IDENTITY_PROVIDER_CONFIG_NAME,
                        "issuerUrl": issuer,
                    })
                }),
            ),
    )?;

    let trust_policy = provider_arn
        .zip(host)
        .map(|(arn, host)| web_identity_trust_policy(&arn, &host).to_json());
    let role = stack.register(
        ResourceSpec::new(types::IAM_ROLE, AUTOSCALER_ROLE_NAME)
            .input("name", AUTOSCALER_ROLE_NAME)
            .input("assumeRolePolicy", trust_policy)
            .input("managedPolicyArns", policy.attr("arn").map(|arn| json!([arn]))),
    )?;

    stack.export("autoScalerRoleArn", role.attr("arn"))?;
    info!("Autoscaler trust wiring described");

    Ok(AutoscalerOutput {
        policy,
        caller_identity,
        oidc_provider,
        identity_provider_config,
        role,
    })
}
