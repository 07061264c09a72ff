use super::*;

const STACK: &str = r#"
region "us-east-1"
account-id "123456789012"

vpc "demo" {
    cidr-block "10.0.0.0/16"
    private-subnet "10.0.1.0/24" az="us-east-1a"
    private-subnet "10.0.2.0/24" az="us-east-1b"
    public-subnet "10.0.101.0/24" az="us-east-1a"
    public-subnet "10.0.102.0/24" az="us-east-1b"
    nat-gateway-per-az #true
    tags {
        Environment "dev"
        Team "platform"
    }
}

eks "demo-cluster" {
    version "1.24"
    tags {
        Environment "dev"
    }
    linux-nodegroup "general" {
        instance-type "t3.large"
        ami-type "AL2_x86_64"
        disk-size 50
        desired-size 2
        min-size 1
        max-size 3
        ssh-key "ops"
    }
    windows-nodegroup "win" {
        name "windows-workers"
        instance-type "m5.large"
        disk-size "100"
        desired-size 1
        min-size 1
        max-size 2
        ssh-key "ops"
    }
}
"#;

#[test]
fn test_parse_full_stack() {
    let config = parse_kdl_string(STACK).unwrap();

    assert_eq!(config.region, "us-east-1");
    assert_eq!(config.account_id.as_deref(), Some("123456789012"));

    let network = &config.network;
    assert_eq!(network.name, "demo");
    assert_eq!(network.cidr_block, "10.0.0.0/16");
    assert_eq!(network.private_subnets.len(), 2);
    assert_eq!(network.private_subnets[1].cidr_block, "10.0.2.0/24");
    assert_eq!(network.private_subnets[1].availability_zone, "us-east-1b");
    assert_eq!(network.public_subnets.len(), 2);
    assert!(network.nat_gateway_per_az);
    assert_eq!(network.tags.get("Team"), Some("platform"));

    let cluster = &config.cluster;
    assert_eq!(cluster.name, "demo-cluster");
    assert_eq!(cluster.version, "1.24");
    assert_eq!(cluster.tags.len(), 1);
}

#[test]
fn test_parse_node_groups() {
    let config = parse_kdl_string(STACK).unwrap();

    let general = &config.cluster.linux_node_groups["general"];
    assert_eq!(general.name, "general");
    assert_eq!(general.instance_type, "t3.large");
    assert_eq!(general.ami_type.as_deref(), Some("AL2_x86_64"));
    assert_eq!(general.disk_size, 50);
    assert_eq!(
        (general.min_size, general.desired_size, general.max_size),
        (1, 2, 3)
    );
    assert_eq!(general.ssh_key, "ops");

    // string sizes are accepted, and `name` overrides the key
    let win = &config.cluster.windows_node_groups["win"];
    assert_eq!(win.name, "windows-workers");
    assert_eq!(win.disk_size, 100);
    assert!(win.ami_type.is_none());
}

#[test]
fn test_nat_gateway_defaults_to_single() {
    let kdl = r#"
region "eu-west-1"
vpc "small" {
    cidr-block "10.1.0.0/16"
    private-subnet "10.1.1.0/24" az="eu-west-1a"
    public-subnet "10.1.101.0/24" az="eu-west-1a"
}
eks "small" {
    version "1.27"
}
"#;
    let config = parse_kdl_string(kdl).unwrap();
    assert!(!config.network.nat_gateway_per_az);
    assert!(config.network.tags.is_empty());
    assert!(config.cluster.linux_node_groups.is_empty());
    assert!(config.account_id.is_none());
}

#[test]
fn test_missing_region() {
    let kdl = r#"
vpc "demo" { cidr-block "10.0.0.0/16"; }
eks "demo" { version "1.24"; }
"#;
    let err = parse_kdl_string(kdl).unwrap_err();
    assert!(matches!(err, ConfigError::MissingField { ref field, .. } if field == "region"));
}

#[test]
fn test_subnet_without_az_is_rejected() {
    let kdl = r#"
region "us-east-1"
vpc "demo" {
    cidr-block "10.0.0.0/16"
    private-subnet "10.0.1.0/24"
}
eks "demo" { version "1.24"; }
"#;
    let err = parse_kdl_string(kdl).unwrap_err();
    assert!(matches!(err, ConfigError::MissingField { ref field, .. } if field == "az"));
}

#[test]
fn test_malformed_capacity_is_rejected() {
    let kdl = r#"
region "us-east-1"
vpc "demo" { cidr-block "10.0.0.0/16"; }
eks "demo" {
    version "1.24"
    linux-nodegroup "general" {
        instance-type "t3.large"
        disk-size "fifty"
        desired-size 2
        min-size 1
        max-size 3
        ssh-key "ops"
    }
}
"#;
    let err = parse_kdl_string(kdl).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidCapacity { field: "disk-size", .. }
    ));
}

#[test]
fn test_missing_node_group_field() {
    let kdl = r#"
region "us-east-1"
vpc "demo" { cidr-block "10.0.0.0/16"; }
eks "demo" {
    version "1.24"
    linux-nodegroup "general" {
        instance-type "t3.large"
        disk-size 50
        desired-size 2
        min-size 1
        max-size 3
    }
}
"#;
    let err = parse_kdl_string(kdl).unwrap_err();
    assert!(matches!(err, ConfigError::MissingField { ref field, .. } if field == "ssh-key"));
}

#[test]
fn test_invalid_kdl() {
    let result = parse_kdl_string("vpc \"demo\" {");
    assert!(matches!(result, Err(ConfigError::KdlParse(_))));
}
