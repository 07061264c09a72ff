//! Network topology builder
//!
//! Describes the VPC: subnets, NAT gateways with their elastic IPs, private
//! and public route tables, and the S3 gateway endpoint.

use crate::error::Result;
use eksforge_cloud::{Output, Resource, ResourceSpec, Stack, types};
use eksforge_core::{ConfigError, NetworkTopology, SubnetSpec, Tags};
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

/// Destination of every default route
const DEFAULT_ROUTE: &str = "0.0.0.0/0";

/// Resources produced by [`build`]
#[derive(Debug, Clone)]
pub struct NetworkOutput {
    pub vpc: Resource,
    pub internet_gateway: Resource,
    pub private_subnets: Vec<Resource>,
    pub public_subnets: Vec<Resource>,
    pub elastic_ips: Vec<Resource>,
    pub nat_gateways: Vec<Resource>,
    pub private_route_tables: Vec<Resource>,
    pub public_route_table: Resource,
    /// Private subnet associations first, then public ones
    pub associations: Vec<Resource>,
    pub s3_endpoint: Resource,
}

impl NetworkOutput {
    pub fn private_subnet_ids(&self) -> Output<Value> {
        resource_ids(&self.private_subnets)
    }
}

/// Ids of several resources as one deferred list
pub fn resource_ids(resources: &[Resource]) -> Output<Value> {
    Output::all(resources.iter().map(|r| r.attr("id"))).into()
}

/// Describe the VPC and everything routed through it
#[instrument(skip_all, fields(network = %network.name))]
pub fn build(network: &NetworkTopology, region: &str, stack: &mut Stack) -> Result<NetworkOutput> {
    let tags = &network.tags;
    let name = &network.name;

    let vpc = stack.register(
        ResourceSpec::new(types::VPC, "VPC")
            .input("cidrBlock", network.cidr_block.as_str())
            .input("tags", tags.with_name(format!("{name}-vpc")).to_value()),
    )?;

    let internet_gateway = stack.register(
        ResourceSpec::new(types::INTERNET_GATEWAY, "igw")
            .input("vpcId", vpc.attr("id"))
            .input("tags", tags.with_name(format!("{name}-igw")).to_value()),
    )?;

    let private_subnets = build_subnets(stack, &vpc, network, "private", &network.private_subnets)?;
    let public_subnets = build_subnets(stack, &vpc, network, "public", &network.public_subnets)?;

    let (elastic_ips, nat_gateways) = build_nat_gateways(stack, network, &public_subnets)?;

    let mut private_route_tables = Vec::with_capacity(nat_gateways.len());
    for (index, nat_gateway) in nat_gateways.iter().enumerate() {
        let route_table = stack.register(
            ResourceSpec::new(types::ROUTE_TABLE, format!("private-rt-{index}"))
                .input("vpcId", vpc.attr("id"))
                .input(
                    "routes",
                    nat_gateway
                        .attr("id")
                        .map(|id| json!([{ "cidrBlock": DEFAULT_ROUTE, "natGatewayId": id }])),
                )
                .input(
                    "tags",
                    tags.with_name(format!("{name}-private-rt-0{index}")).to_value(),
                ),
        )?;
        private_route_tables.push(route_table);
    }

    let mut associations = Vec::with_capacity(private_subnets.len() + public_subnets.len());
    for (index, subnet) in private_subnets.iter().enumerate() {
        let route_table = match private_route_tables.get(index) {
            Some(route_table) => route_table,
            None => {
                warn!(
                    subnet = %subnet.logical_name(),
                    route_tables = private_route_tables.len(),
                    "More private subnets than NAT route tables, binding to the first route table"
                );
                private_route_tables
                    .first()
                    .ok_or(ConfigError::NoSubnets("public"))?
            }
        };
        associations.push(stack.register(
            ResourceSpec::new(
                types::ROUTE_TABLE_ASSOCIATION,
                format!("private-subnet-rt-assoc-0{index}"),
            )
            .input("routeTableId", route_table.attr("id"))
            .input("subnetId", subnet.attr("id")),
        )?);
    }

    let public_route_table = stack.register(
        ResourceSpec::new(types::ROUTE_TABLE, "public-rt")
            .input("vpcId", vpc.attr("id"))
            .input(
                "routes",
                internet_gateway
                    .attr("id")
                    .map(|id| json!([{ "cidrBlock": DEFAULT_ROUTE, "gatewayId": id }])),
            )
            .input("tags", tags.with_name(format!("{name}-public-rt")).to_value()),
    )?;

    for (index, subnet) in public_subnets.iter().enumerate() {
        associations.push(stack.register(
            ResourceSpec::new(
                types::ROUTE_TABLE_ASSOCIATION,
                format!("public-subnet-rt-assoc-0{index}"),
            )
            .input("routeTableId", public_route_table.attr("id"))
            .input("subnetId", subnet.attr("id")),
        )?);
    }

    let route_tables: Vec<Resource> = private_route_tables
        .iter()
        .chain(std::iter::once(&public_route_table))
        .cloned()
        .collect();
    let s3_endpoint = stack.register(
        ResourceSpec::new(types::VPC_ENDPOINT, "s3-vpc-gateway-endpoint")
            .input("vpcId", vpc.attr("id"))
            .input("serviceName", format!("com.amazonaws.{region}.s3"))
            .input("routeTableIds", resource_ids(&route_tables))
            .input(
                "tags",
                tags.with_name(format!("{name}-vpc-s3-endpoint")).to_value(),
            ),
    )?;

    stack.export("vpc", vpc.attr("id"))?;
    stack.export("igw-id", internet_gateway.attr("id"))?;

    info!(
        private_subnets = private_subnets.len(),
        public_subnets = public_subnets.len(),
        nat_gateways = nat_gateways.len(),
        "Network described"
    );

    Ok(NetworkOutput {
        vpc,
        internet_gateway,
        private_subnets,
        public_subnets,
        elastic_ips,
        nat_gateways,
        private_route_tables,
        public_route_table,
        associations,
        s3_endpoint,
    })
}

fn build_subnets(
    stack: &mut Stack,
    vpc: &Resource,
    network: &NetworkTopology,
    kind: &str,
    subnets: &[SubnetSpec],
) -> Result<Vec<Resource>> {
    let mut created = Vec::with_capacity(subnets.len());
    for (index, subnet) in subnets.iter().enumerate() {
        let logical_name = format!("{kind}-subnet-0{index}");
        let resource = stack.register(
            ResourceSpec::new(types::SUBNET, logical_name.clone())
                .input("vpcId", vpc.attr("id"))
                .input("cidrBlock", subnet.cidr_block.as_str())
                .input("mapPublicIpOnLaunch", json!(false))
                .input("availabilityZone", subnet.availability_zone.as_str())
                .input(
                    "tags",
                    network
                        .tags
                        .with_name(format!("{}-{logical_name}", network.name))
                        .to_value(),
                ),
        )?;
        stack.export(logical_name, resource.attr("id"))?;
        created.push(resource);
    }
    Ok(created)
}

/// Elastic IPs and NAT gateways, one pair per public subnet or a single pair
fn build_nat_gateways(
    stack: &mut Stack,
    network: &NetworkTopology,
    public_subnets: &[Resource],
) -> Result<(Vec<Resource>, Vec<Resource>)> {
    let mut elastic_ips = Vec::new();
    let mut nat_gateways = Vec::new();

    if network.nat_gateway_per_az {
        for (index, subnet) in public_subnets.iter().enumerate() {
            let (eip, nat_gateway) = build_nat_gateway(
                stack,
                &network.tags,
                &network.name,
                &format!("-{index}"),
                subnet,
                false,
            )?;
            elastic_ips.push(eip);
            nat_gateways.push(nat_gateway);
        }
    } else if let Some(subnet) = public_subnets.first() {
        let (eip, nat_gateway) =
            build_nat_gateway(stack, &network.tags, &network.name, "", subnet, true)?;
        elastic_ips.push(eip);
        nat_gateways.push(nat_gateway);
    }

    Ok((elastic_ips, nat_gateways))
}

fn build_nat_gateway(
    stack: &mut Stack,
    tags: &Tags,
    name: &str,
    suffix: &str,
    subnet: &Resource,
    explicit_eip_edge: bool,
) -> Result<(Resource, Resource)> {
    let eip = stack.register(
        ResourceSpec::new(types::EIP, format!("eip{suffix}"))
            .input("vpc", json!(true))
            .input("tags", tags.with_name(format!("{name}-eip{suffix}")).to_value()),
    )?;

    let mut spec = ResourceSpec::new(types::NAT_GATEWAY, format!("nat-gateway{suffix}"))
        .input("allocationId", eip.attr("allocationId"))
        .input("subnetId", subnet.attr("id"))
        .input(
            "tags",
            tags.with_name(format!("{name}-nat-gateway{suffix}")).to_value(),
        );
    if explicit_eip_edge {
        spec = spec.depends_on(&eip);
    }
    let nat_gateway = stack.register(spec)?;

    Ok((eip, nat_gateway))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topology(private: &[(&str, &str)], public: &[(&str, &str)], per_az: bool) -> NetworkTopology {
        NetworkTopology {
            name: "demo".to_string(),
            cidr_block: "10.0.0.0/16".to_string(),
            private_subnets: private.iter().map(|(c, z)| SubnetSpec::new(*c, *z)).collect(),
            public_subnets: public.iter().map(|(c, z)| SubnetSpec::new(*c, *z)).collect(),
            nat_gateway_per_az: per_az,
            tags: [("Environment", "dev")].into_iter().collect(),
        }
    }

    fn route_table_of(stack: &Stack, association: &str) -> String {
        let spec = stack.get(association).unwrap();
        spec.inputs["routeTableId"].deps().iter().next().unwrap().clone()
    }

    #[test]
    fn test_single_nat_gateway() {
        let network = topology(
            &[("10.0.1.0/24", "us-east-1a")],
            &[("10.0.101.0/24", "us-east-1a")],
            false,
        );
        let mut stack = Stack::new("demo");
        let output = build(&network, "us-east-1", &mut stack).unwrap();

        assert_eq!(output.nat_gateways.len(), 1);
        assert_eq!(output.private_route_tables.len(), 1);
        assert_eq!(stack.by_type(types::ROUTE_TABLE).count(), 2);
        assert_eq!(route_table_of(&stack, "private-subnet-rt-assoc-00"), "private-rt-0");

        let nat = stack.get("nat-gateway").unwrap();
        assert!(nat.depends_on.contains("eip"));
    }

    #[test]
    fn test_nat_gateway_per_public_subnet() {
        let network = topology(
            &[
                ("10.0.1.0/24", "us-east-1a"),
                ("10.0.2.0/24", "us-east-1b"),
                ("10.0.3.0/24", "us-east-1c"),
                ("10.0.4.0/24", "us-east-1a"),
            ],
            &[
                ("10.0.101.0/24", "us-east-1a"),
                ("10.0.102.0/24", "us-east-1b"),
                ("10.0.103.0/24", "us-east-1a"),
            ],
            true,
        );
        let mut stack = Stack::new("demo");
        let output = build(&network, "us-east-1", &mut stack).unwrap();

        assert_eq!(output.nat_gateways.len(), 3);
        assert_eq!(output.elastic_ips.len(), 3);
        assert_eq!(output.private_route_tables.len(), 3);

        let third = stack.get("nat-gateway-2").unwrap();
        assert!(third.inputs["subnetId"].deps().contains("public-subnet-02"));
        assert!(third.inputs["allocationId"].deps().contains("eip-2"));
        assert!(third.depends_on.is_empty());

        // Fourth private subnet falls back to the first route table
        assert_eq!(route_table_of(&stack, "private-subnet-rt-assoc-02"), "private-rt-2");
        assert_eq!(route_table_of(&stack, "private-subnet-rt-assoc-03"), "private-rt-0");
    }

    #[test]
    fn test_public_subnets_in_one_zone_each_get_a_gateway() {
        let network = topology(
            &[("10.0.1.0/24", "us-east-1a"), ("10.0.2.0/24", "us-east-1a")],
            &[("10.0.101.0/24", "us-east-1a"), ("10.0.102.0/24", "us-east-1a")],
            true,
        );
        let mut stack = Stack::new("demo");
        let output = build(&network, "us-east-1", &mut stack).unwrap();

        assert_eq!(output.nat_gateways.len(), network.nat_gateway_count());
        assert_eq!(stack.by_type(types::NAT_GATEWAY).count(), 2);
        assert_eq!(route_table_of(&stack, "private-subnet-rt-assoc-01"), "private-rt-1");
    }

    #[test]
    fn test_public_subnets_share_route_table() {
        let network = topology(
            &[("10.0.1.0/24", "us-east-1a")],
            &[("10.0.101.0/24", "us-east-1a"), ("10.0.102.0/24", "us-east-1b")],
            false,
        );
        let mut stack = Stack::new("demo");
        let output = build(&network, "us-east-1", &mut stack).unwrap();

        assert_eq!(output.associations.len(), 3);
        assert_eq!(route_table_of(&stack, "public-subnet-rt-assoc-00"), "public-rt");
        assert_eq!(route_table_of(&stack, "public-subnet-rt-assoc-01"), "public-rt");
    }

    #[test]
    fn test_tags_and_exports() {
        let network = topology(
            &[("10.0.1.0/24", "us-east-1a")],
            &[("10.0.101.0/24", "us-east-1a")],
            false,
        );
        let mut stack = Stack::new("demo");
        build(&network, "eu-west-1", &mut stack).unwrap();

        let subnet = stack.get("private-subnet-00").unwrap().known_inputs();
        assert_eq!(subnet["tags"]["Name"], "demo-private-subnet-00");
        assert_eq!(subnet["tags"]["Environment"], "dev");
        // Only the name and the common tags, no role tags
        assert_eq!(subnet["tags"].as_object().unwrap().len(), 2);
        assert_eq!(subnet["mapPublicIpOnLaunch"], false);

        let endpoint = stack.get("s3-vpc-gateway-endpoint").unwrap();
        assert_eq!(
            endpoint.known_inputs()["serviceName"],
            "com.amazonaws.eu-west-1.s3"
        );
        let tables = endpoint.inputs["routeTableIds"].deps();
        assert!(tables.contains("private-rt-0") && tables.contains("public-rt"));

        let exports: Vec<&str> = stack.exports().collect();
        assert_eq!(
            exports,
            vec!["private-subnet-00", "public-subnet-00", "vpc", "igw-id"]
        );
    }
}
