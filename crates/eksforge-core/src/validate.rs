//! Configuration validation
//!
//! Runs after parsing and before any resource is described.

use crate::error::{ConfigError, Result};
use crate::model::{ClusterSpec, NetworkTopology, StackConfig, SubnetSpec};
use ipnet::Ipv4Net;

/// Logical names the network, cluster and autoscaler builders register
const RESERVED_NAMES: &[&str] = &[
    "VPC",
    "igw",
    "eip",
    "nat-gateway",
    "public-rt",
    "s3-vpc-gateway-endpoint",
    "eks-iam-eksRole",
    "eks-cluster",
    "windows-ami",
    "caller-identity",
    "oidc-provider",
    "oidc-provider-config",
    "AmazonEKSClusterAutoscalerPolicy",
    "AmazonEKSClusterAutoscalerRole",
];

/// Prefixes of numbered logical names (`eip-0`, `private-subnet-01`)
const RESERVED_PREFIXES: &[&str] = &[
    "private-subnet-rt-assoc-0",
    "public-subnet-rt-assoc-0",
    "private-subnet-0",
    "public-subnet-0",
    "private-rt-",
    "nat-gateway-",
    "eip-",
    "rpa-",
];

/// Suffixes of the logical names derived from a node group
const NODE_GROUP_SUFFIXES: &[&str] = &[
    "-role",
    "-sg",
    "-sg-inbound-in-cluster-sg",
    "-instance-profile",
    "-launch-template",
];

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Whether `name` is a logical name registered for the network or cluster itself
pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
        || RESERVED_PREFIXES
            .iter()
            .any(|prefix| name.strip_prefix(prefix).is_some_and(is_number))
}

/// Whether `name` is one of the logical names derived from node group `group`
fn is_derived_name(name: &str, group: &str) -> bool {
    let Some(rest) = name.strip_prefix(group) else {
        return false;
    };
    NODE_GROUP_SUFFIXES.contains(&rest) || rest.strip_prefix("-role-pa-").is_some_and(is_number)
}

/// Validate a whole stack configuration
pub fn validate(config: &StackConfig) -> Result<()> {
    if config.region.trim().is_empty() {
        return Err(ConfigError::InvalidConfig("region must not be empty".to_string()));
    }

    if let Some(account_id) = &config.account_id
        && (account_id.len() != 12 || !account_id.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(ConfigError::InvalidConfig(format!(
            "account id '{account_id}' must be 12 digits"
        )));
    }

    validate_network(&config.network)?;
    validate_cluster(&config.cluster)?;
    Ok(())
}

/// Validate the VPC layout
pub fn validate_network(network: &NetworkTopology) -> Result<()> {
    if network.name.trim().is_empty() {
        return Err(ConfigError::InvalidConfig("vpc name must not be empty".to_string()));
    }

    let vpc = parse_cidr(&network.cidr_block)?;

    if network.private_subnets.is_empty() {
        return Err(ConfigError::NoSubnets("private"));
    }
    if network.public_subnets.is_empty() {
        return Err(ConfigError::NoSubnets("public"));
    }

    let mut seen: Vec<(Ipv4Net, &str)> = Vec::new();
    for subnet in network.private_subnets.iter().chain(&network.public_subnets) {
        let net = check_subnet(&vpc, subnet)?;
        if let Some((_, other)) = seen
            .iter()
            .find(|(existing, _)| existing.contains(&net.network()) || net.contains(&existing.network()))
        {
            return Err(ConfigError::OverlappingSubnets {
                first: other.to_string(),
                second: subnet.cidr_block.clone(),
            });
        }
        seen.push((net, subnet.cidr_block.as_str()));
    }

    // Every NAT gateway needs a public subnet in its zone
    if network.nat_gateway_per_az
        && network.public_subnets.len() < network.public_availability_zones().len()
    {
        return Err(ConfigError::InvalidConfig(
            "per-AZ NAT gateways need a public subnet in every zone".to_string(),
        ));
    }

    Ok(())
}

fn check_subnet(vpc: &Ipv4Net, subnet: &SubnetSpec) -> Result<Ipv4Net> {
    if subnet.availability_zone.trim().is_empty() {
        return Err(ConfigError::InvalidConfig(format!(
            "subnet {} has an empty availability zone",
            subnet.cidr_block
        )));
    }

    let net = parse_cidr(&subnet.cidr_block)?;
    if !vpc.contains(&net) {
        return Err(ConfigError::SubnetOutsideVpc {
            subnet: subnet.cidr_block.clone(),
            vpc: vpc.to_string(),
        });
    }
    Ok(net)
}

fn parse_cidr(cidr: &str) -> Result<Ipv4Net> {
    let net: Ipv4Net = cidr.trim().parse().map_err(|e: ipnet::AddrParseError| {
        ConfigError::InvalidCidr {
            cidr: cidr.to_string(),
            message: e.to_string(),
        }
    })?;
    if net.network() != net.addr() {
        return Err(ConfigError::InvalidCidr {
            cidr: cidr.to_string(),
            message: format!("host bits are set (did you mean {}?)", net.trunc()),
        });
    }
    Ok(net)
}

/// Validate the cluster and its node groups
pub fn validate_cluster(cluster: &ClusterSpec) -> Result<()> {
    if cluster.name.trim().is_empty() {
        return Err(ConfigError::InvalidConfig("cluster name must not be empty".to_string()));
    }
    if cluster.version.trim().is_empty() {
        return Err(ConfigError::InvalidConfig(
            "cluster version must not be empty".to_string(),
        ));
    }

    let mut names = std::collections::BTreeSet::new();
    for group in cluster
        .linux_node_groups
        .values()
        .chain(cluster.windows_node_groups.values())
    {
        if !names.insert(group.name.as_str()) {
            return Err(ConfigError::InvalidConfig(format!(
                "node group name '{}' is used more than once",
                group.name
            )));
        }
        group.check_capacity()?;
    }

    for name in &names {
        if is_reserved_name(name) {
            return Err(ConfigError::ReservedName {
                name: name.to_string(),
                resource: name.to_string(),
            });
        }
        if let Some(group) = names.iter().find(|group| is_derived_name(name, group)) {
            return Err(ConfigError::ReservedName {
                name: name.to_string(),
                resource: format!("derived from node group '{group}'"),
            });
        }
    }

    if cluster.has_windows_node_groups() && cluster.linux_node_groups.is_empty() {
        return Err(ConfigError::WindowsWithoutLinux);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeGroupSpec;

    fn network() -> NetworkTopology {
        NetworkTopology {
            name: "demo".to_string(),
            cidr_block: "10.0.0.0/16".to_string(),
            private_subnets: vec![SubnetSpec::new("10.0.1.0/24", "us-east-1a")],
            public_subnets: vec![SubnetSpec::new("10.0.101.0/24", "us-east-1a")],
            ..Default::default()
        }
    }

    fn group(name: &str) -> NodeGroupSpec {
        NodeGroupSpec {
            name: name.to_string(),
            instance_type: "t3.large".to_string(),
            disk_size: 50,
            desired_size: 2,
            min_size: 1,
            max_size: 3,
            ssh_key: "ops".to_string(),
            ..Default::default()
        }
    }

    fn cluster() -> ClusterSpec {
        ClusterSpec {
            name: "demo".to_string(),
            version: "1.24".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_network() {
        assert!(validate_network(&network()).is_ok());
    }

    #[test]
    fn test_subnet_outside_vpc() {
        let mut network = network();
        network.private_subnets[0].cidr_block = "10.1.1.0/24".to_string();
        assert!(matches!(
            validate_network(&network),
            Err(ConfigError::SubnetOutsideVpc { .. })
        ));
    }

    #[test]
    fn test_overlapping_subnets() {
        let mut network = network();
        network
            .private_subnets
            .push(SubnetSpec::new("10.0.1.128/25", "us-east-1b"));
        assert!(matches!(
            validate_network(&network),
            Err(ConfigError::OverlappingSubnets { .. })
        ));
    }

    #[test]
    fn test_invalid_cidr() {
        let mut network = network();
        network.cidr_block = "10.0.0.0/33".to_string();
        assert!(matches!(
            validate_network(&network),
            Err(ConfigError::InvalidCidr { .. })
        ));

        network.cidr_block = "10.0.0.1/16".to_string();
        assert!(matches!(
            validate_network(&network),
            Err(ConfigError::InvalidCidr { .. })
        ));
    }

    #[test]
    fn test_missing_public_subnets() {
        let mut network = network();
        network.public_subnets.clear();
        assert!(matches!(
            validate_network(&network),
            Err(ConfigError::NoSubnets("public"))
        ));
    }

    #[test]
    fn test_windows_requires_linux() {
        let mut cluster = cluster();
        cluster
            .windows_node_groups
            .insert("win".to_string(), group("win"));
        assert!(matches!(
            validate_cluster(&cluster),
            Err(ConfigError::WindowsWithoutLinux)
        ));

        cluster
            .linux_node_groups
            .insert("general".to_string(), group("general"));
        assert!(validate_cluster(&cluster).is_ok());
    }

    #[test]
    fn test_capacity_order_is_checked() {
        let mut cluster = cluster();
        let mut general = group("general");
        general.min_size = 4;
        cluster.linux_node_groups.insert("general".to_string(), general);
        assert!(matches!(
            validate_cluster(&cluster),
            Err(ConfigError::CapacityOrder { .. })
        ));
    }

    #[test]
    fn test_duplicate_group_names() {
        let mut cluster = cluster();
        cluster
            .linux_node_groups
            .insert("a".to_string(), group("workers"));
        cluster
            .linux_node_groups
            .insert("b".to_string(), group("workers"));
        assert!(validate_cluster(&cluster).is_err());
    }

    #[test]
    fn test_group_named_like_fixed_resource() {
        for name in ["eks-cluster", "VPC", "eip-0", "private-subnet-01", "rpa-2"] {
            let mut cluster = cluster();
            cluster.linux_node_groups.insert("a".to_string(), group(name));
            assert!(
                matches!(validate_cluster(&cluster), Err(ConfigError::ReservedName { .. })),
                "{name} should be rejected"
            );
        }

        // Only the numbered forms are taken
        assert!(!is_reserved_name("eip-pool"));
        assert!(!is_reserved_name("private-subnet-workers"));
    }

    #[test]
    fn test_group_named_like_another_groups_role() {
        let mut cluster = cluster();
        cluster.linux_node_groups.insert("a".to_string(), group("workers"));
        cluster
            .linux_node_groups
            .insert("b".to_string(), group("workers-role"));
        let err = validate_cluster(&cluster).unwrap_err();
        assert!(
            matches!(err, ConfigError::ReservedName { ref name, .. } if name == "workers-role")
        );

        cluster
            .linux_node_groups
            .insert("b".to_string(), group("workers-roles"));
        assert!(validate_cluster(&cluster).is_ok());
    }

    #[test]
    fn test_account_id_format() {
        let mut config = StackConfig {
            region: "us-east-1".to_string(),
            account_id: Some("1234".to_string()),
            network: network(),
            cluster: cluster(),
        };
        assert!(validate(&config).is_err());

        config.account_id = Some("123456789012".to_string());
        assert!(validate(&config).is_ok());
    }
}
