//! Local engine implementation

use crate::error::{LocalError, Result};
use async_trait::async_trait;
use eksforge_cloud::{
    Attributes, AuthStatus, CloudError, Engine, ResolvedResource, ResourceKind, types,
};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tokio::sync::Mutex;
use tracing::debug;

/// Account id used when none is configured
pub const DEFAULT_ACCOUNT_ID: &str = "123456789012";

/// Client id registered on simulated OIDC providers
pub const STS_CLIENT_ID: &str = "sts.amazonaws.com";

/// In-process engine that simulates AWS
///
/// Every resource gets a deterministic id derived from its type and logical
/// name, so repeated applies of the same stack produce the same attributes.
/// Created attributes echo the resolved inputs plus what AWS would report
/// (ids, ARNs, the cluster's OIDC issuer, ...).
pub struct LocalEngine {
    region: String,
    account_id: String,
    oidc: bool,
    fail_on: HashSet<String>,
    history: Mutex<Vec<ResolvedResource>>,
}

impl LocalEngine {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            account_id: DEFAULT_ACCOUNT_ID.to_string(),
            oidc: true,
            fail_on: HashSet::new(),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = account_id.into();
        self
    }

    /// Clusters come up without an OIDC identity
    pub fn without_oidc(mut self) -> Self {
        self.oidc = false;
        self
    }

    /// Fail when the named resource is created or read
    pub fn fail_on(mut self, logical_name: impl Into<String>) -> Self {
        self.fail_on.insert(logical_name.into());
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Managed resources created so far, in order
    pub async fn created(&self) -> Vec<ResolvedResource> {
        self.history
            .lock()
            .await
            .iter()
            .filter(|r| r.kind == ResourceKind::Managed)
            .cloned()
            .collect()
    }

    /// Lookups performed so far, in order
    pub async fn lookups(&self) -> Vec<ResolvedResource> {
        self.history
            .lock()
            .await
            .iter()
            .filter(|r| r.kind == ResourceKind::Data)
            .cloned()
            .collect()
    }

    fn check_injected(&self, resource: &ResolvedResource) -> Result<()> {
        if self.fail_on.contains(&resource.id) {
            return Err(LocalError::InjectedFailure(resource.id.clone()));
        }
        Ok(())
    }

    fn iam_arn(&self, kind: &str, name: &str) -> String {
        format!("arn:aws:iam::{}:{}/{}", self.account_id, kind, name)
    }

    fn simulate_create(&self, resource: &ResolvedResource) -> Result<Attributes> {
        self.check_injected(resource)?;

        let hash = short_hash(&resource.resource_type, &resource.id);
        let name = resource
            .input_str("name")
            .unwrap_or(resource.id.as_str())
            .to_string();
        let mut attributes = resource.inputs.clone();
        let mut set = |key: &str, value: Value| {
            attributes.insert(key.to_string(), value);
        };

        match resource.resource_type.as_str() {
            types::VPC => set("id", json!(format!("vpc-{hash}"))),
            types::INTERNET_GATEWAY => set("id", json!(format!("igw-{hash}"))),
            types::SUBNET => {
                set("id", json!(format!("subnet-{hash}")));
                set(
                    "arn",
                    json!(format!(
                        "arn:aws:ec2:{}:{}:subnet/subnet-{hash}",
                        self.region, self.account_id
                    )),
                );
            }
            types::EIP => {
                set("id", json!(format!("eipalloc-{hash}")));
                set("allocationId", json!(format!("eipalloc-{hash}")));
                set("publicIp", json!(format!("203.0.113.{}", octet(&hash))));
            }
            types::NAT_GATEWAY => set("id", json!(format!("nat-{hash}"))),
            types::ROUTE_TABLE => set("id", json!(format!("rtb-{hash}"))),
            types::ROUTE_TABLE_ASSOCIATION => set("id", json!(format!("rtbassoc-{hash}"))),
            types::VPC_ENDPOINT => set("id", json!(format!("vpce-{hash}"))),
            types::SECURITY_GROUP => {
                set("id", json!(format!("sg-{hash}")));
                set(
                    "arn",
                    json!(format!(
                        "arn:aws:ec2:{}:{}:security-group/sg-{hash}",
                        self.region, self.account_id
                    )),
                );
            }
            types::SECURITY_GROUP_RULE => set("id", json!(format!("sgrule-{hash}"))),
            types::LAUNCH_TEMPLATE => {
                set("id", json!(format!("lt-{hash}")));
                set("latestVersion", json!(1));
            }
            types::IAM_ROLE => {
                set("id", json!(name));
                set("name", json!(name));
                set("arn", json!(self.iam_arn("role", &name)));
                set("uniqueId", json!(format!("AROA{}", hash.to_uppercase())));
            }
            types::IAM_ROLE_POLICY_ATTACHMENT => {
                let role = resource.input_str("role").unwrap_or_default();
                set("id", json!(format!("{role}-{hash}")));
            }
            types::IAM_POLICY => {
                let path = resource.input_str("path").unwrap_or("/");
                let arn = format!("arn:aws:iam::{}:policy{}{}", self.account_id, path, name);
                set("id", json!(arn));
                set("arn", json!(arn));
                set("name", json!(name));
            }
            types::IAM_INSTANCE_PROFILE => {
                set("id", json!(name));
                set("name", json!(name));
                set("arn", json!(self.iam_arn("instance-profile", &name)));
            }
            types::EKS_CLUSTER => {
                let oidc_id = format!("{hash}{hash}").to_uppercase();
                set("id", json!(name));
                set("name", json!(name));
                set(
                    "arn",
                    json!(format!(
                        "arn:aws:eks:{}:{}:cluster/{}",
                        self.region, self.account_id, name
                    )),
                );
                set(
                    "endpoint",
                    json!(format!(
                        "https://{oidc_id}.gr7.{}.eks.amazonaws.com",
                        self.region
                    )),
                );
                let identities = if self.oidc {
                    json!([{
                        "oidcs": [{
                            "issuer": format!("https://oidc.eks.{}.amazonaws.com/id/{oidc_id}", self.region)
                        }]
                    }])
                } else {
                    json!([])
                };
                set("identities", identities);
                set(
                    "vpcConfig",
                    json!({
                        "clusterSecurityGroupId": format!("sg-{}", short_hash("cluster-sg", &name)),
                        "vpcId": resource.input("vpcId").cloned().unwrap_or(Value::Null),
                        "subnetIds": resource.input("subnetIds").cloned().unwrap_or(json!([])),
                    }),
                );
                set("status", json!("ACTIVE"));
            }
            types::EKS_NODE_GROUP => {
                let cluster = resource.input_str("clusterName").unwrap_or_default();
                let group = resource
                    .input_str("nodeGroupName")
                    .unwrap_or(resource.id.as_str());
                set("id", json!(format!("{cluster}:{group}")));
                set(
                    "arn",
                    json!(format!(
                        "arn:aws:eks:{}:{}:nodegroup/{cluster}/{group}/{hash}",
                        self.region, self.account_id
                    )),
                );
                set("status", json!("ACTIVE"));
            }
            types::EKS_IDENTITY_PROVIDER_CONFIG => {
                let cluster = resource.input_str("clusterName").unwrap_or_default();
                let config = resource
                    .input("oidc")
                    .and_then(|o| o.get("identityProviderConfigName"))
                    .and_then(Value::as_str)
                    .unwrap_or(resource.id.as_str())
                    .to_string();
                set("id", json!(format!("{cluster}:{config}")));
                set(
                    "arn",
                    json!(format!(
                        "arn:aws:eks:{}:{}:identityproviderconfig/{cluster}/oidc/{config}/{hash}",
                        self.region, self.account_id
                    )),
                );
                set("status", json!("ACTIVE"));
            }
            types::AUTOSCALING_GROUP => {
                set("id", json!(name));
                set(
                    "arn",
                    json!(format!(
                        "arn:aws:autoscaling:{}:{}:autoScalingGroup:{hash}:autoScalingGroupName/{}",
                        self.region, self.account_id, name
                    )),
                );
            }
            other => {
                debug!(resource_type = other, "No specific simulation, assigning generic id");
                set("id", json!(format!("res-{hash}")));
            }
        }

        Ok(attributes)
    }

    fn simulate_read(&self, resource: &ResolvedResource) -> Result<Attributes> {
        self.check_injected(resource)?;

        let hash = short_hash(&resource.resource_type, &resource.id);
        let mut attributes = resource.inputs.clone();

        match resource.resource_type.as_str() {
            types::SSM_PARAMETER => {
                let name = resource
                    .input_str("name")
                    .ok_or(LocalError::MissingInput { input: "name" })?;
                attributes.insert("id".to_string(), json!(name));
                attributes.insert("type".to_string(), json!("String"));
                attributes.insert(
                    "value".to_string(),
                    json!(format!("ami-{}", short_hash("ssm", name))),
                );
            }
            types::CALLER_IDENTITY => {
                attributes.insert("id".to_string(), json!(self.account_id));
                attributes.insert("accountId".to_string(), json!(self.account_id));
                attributes.insert("arn".to_string(), json!(self.iam_arn("user", "eksforge")));
                attributes.insert(
                    "userId".to_string(),
                    json!(format!("AIDA{}", hash.to_uppercase())),
                );
            }
            types::OPENID_CONNECT_PROVIDER => {
                let arn = resource
                    .input_str("arn")
                    .ok_or(LocalError::MissingInput { input: "arn" })?;
                let url = arn.split_once("oidc-provider/").map(|(_, url)| url).unwrap_or(arn);
                attributes.insert("id".to_string(), json!(arn));
                attributes.insert("url".to_string(), json!(url));
                attributes.insert("clientIdLists".to_string(), json!([STS_CLIENT_ID]));
                attributes.insert("thumbprintLists".to_string(), json!([hash]));
            }
            other => return Err(LocalError::UnsupportedLookup(other.to_string())),
        }

        Ok(attributes)
    }
}

#[async_trait]
impl Engine for LocalEngine {
    fn name(&self) -> &str {
        "local"
    }

    fn display_name(&self) -> &str {
        "Local simulation"
    }

    async fn check_auth(&self) -> eksforge_cloud::Result<AuthStatus> {
        if self.account_id.len() != 12 || !self.account_id.chars().all(|c| c.is_ascii_digit()) {
            return Ok(AuthStatus::failed(
                LocalError::InvalidAccountId(self.account_id.clone()).to_string(),
            ));
        }
        Ok(AuthStatus::ok(format!(
            "account {} in {}",
            self.account_id, self.region
        )))
    }

    async fn read(&self, resource: &ResolvedResource) -> eksforge_cloud::Result<Attributes> {
        let attributes = self
            .simulate_read(resource)
            .map_err(|e| CloudError::ReadFailed {
                resource: resource.id.clone(),
                message: e.to_string(),
            })?;
        debug!(resource = %resource.id, "lookup resolved");
        self.history.lock().await.push(resource.clone());
        Ok(attributes)
    }

    async fn create(&self, resource: &ResolvedResource) -> eksforge_cloud::Result<Attributes> {
        let attributes = self
            .simulate_create(resource)
            .map_err(|e| CloudError::CreationFailed {
                resource: resource.id.clone(),
                message: e.to_string(),
            })?;
        debug!(resource = %resource.id, id = ?attributes.get("id"), "resource simulated");
        self.history.lock().await.push(resource.clone());
        Ok(attributes)
    }
}

/// 16 hex digits derived from a resource's type and name
fn short_hash(resource_type: &str, name: &str) -> String {
    let mut hasher = DefaultHasher::new();
    resource_type.hash(&mut hasher);
    name.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn octet(hash: &str) -> u8 {
    u8::from_str_radix(&hash[..2], 16).unwrap_or(1).max(1)
}
