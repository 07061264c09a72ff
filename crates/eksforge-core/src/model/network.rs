//! Network topology model

use super::Tags;
use serde::{Deserialize, Serialize};

/// A subnet CIDR block pinned to an availability zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetSpec {
    pub cidr_block: String,
    pub availability_zone: String,
}

impl SubnetSpec {
    pub fn new(cidr_block: impl Into<String>, availability_zone: impl Into<String>) -> Self {
        Self {
            cidr_block: cidr_block.into(),
            availability_zone: availability_zone.into(),
        }
    }
}

/// VPC layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkTopology {
    /// Prefix of every `Name` tag (`<name>-vpc`, `<name>-igw`, ...)
    pub name: String,

    /// VPC CIDR block
    pub cidr_block: String,

    pub private_subnets: Vec<SubnetSpec>,

    pub public_subnets: Vec<SubnetSpec>,

    /// One NAT gateway per public subnet instead of a single one
    pub nat_gateway_per_az: bool,

    /// Tags applied to every network resource
    pub tags: Tags,
}

impl NetworkTopology {
    /// Distinct availability zones of the public subnets, in first-appearance order
    pub fn public_availability_zones(&self) -> Vec<&str> {
        let mut zones: Vec<&str> = Vec::new();
        for subnet in &self.public_subnets {
            if !zones.contains(&subnet.availability_zone.as_str()) {
                zones.push(&subnet.availability_zone);
            }
        }
        zones
    }

    /// Number of NAT gateways the topology produces
    ///
    /// Per-AZ mode places one gateway in every public subnet, so two public
    /// subnets in the same zone still get a gateway each.
    pub fn nat_gateway_count(&self) -> usize {
        if self.nat_gateway_per_az {
            self.public_subnets.len()
        } else {
            1
        }
    }
}
