//! Resource type tokens
//!
//! Shared vocabulary between the builders that describe resources and the
//! engines that create them.

// EC2 / VPC
pub const VPC: &str = "aws:ec2/vpc:Vpc";
pub const INTERNET_GATEWAY: &str = "aws:ec2/internetGateway:InternetGateway";
pub const SUBNET: &str = "aws:ec2/subnet:Subnet";
pub const EIP: &str = "aws:ec2/eip:Eip";
pub const NAT_GATEWAY: &str = "aws:ec2/natGateway:NatGateway";
pub const ROUTE_TABLE: &str = "aws:ec2/routeTable:RouteTable";
pub const ROUTE_TABLE_ASSOCIATION: &str = "aws:ec2/routeTableAssociation:RouteTableAssociation";
pub const VPC_ENDPOINT: &str = "aws:ec2/vpcEndpoint:VpcEndpoint";
pub const SECURITY_GROUP: &str = "aws:ec2/securityGroup:SecurityGroup";
pub const SECURITY_GROUP_RULE: &str = "aws:ec2/securityGroupRule:SecurityGroupRule";
pub const LAUNCH_TEMPLATE: &str = "aws:ec2/launchTemplate:LaunchTemplate";

// IAM
pub const IAM_ROLE: &str = "aws:iam/role:Role";
pub const IAM_ROLE_POLICY_ATTACHMENT: &str = "aws:iam/rolePolicyAttachment:RolePolicyAttachment";
pub const IAM_POLICY: &str = "aws:iam/policy:Policy";
pub const IAM_INSTANCE_PROFILE: &str = "aws:iam/instanceProfile:InstanceProfile";

// EKS
pub const EKS_CLUSTER: &str = "eks:index:Cluster";
pub const EKS_NODE_GROUP: &str = "aws:eks/nodeGroup:NodeGroup";
pub const EKS_IDENTITY_PROVIDER_CONFIG: &str =
    "aws:eks/identityProviderConfig:IdentityProviderConfig";

pub const AUTOSCALING_GROUP: &str = "aws:autoscaling/group:Group";

// Lookups
pub const SSM_PARAMETER: &str = "aws:ssm/getParameter:getParameter";
pub const CALLER_IDENTITY: &str = "aws:index/getCallerIdentity:getCallerIdentity";
pub const OPENID_CONNECT_PROVIDER: &str =
    "aws:iam/getOpenIdConnectProvider:getOpenIdConnectProvider";
