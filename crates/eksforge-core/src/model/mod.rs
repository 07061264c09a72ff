//! Configuration model
//!
//! What a stack file describes: the network, the cluster and its node groups.

mod cluster;
mod network;
mod tags;

// Re-exports
pub use cluster::*;
pub use network::*;
pub use tags::*;

use serde::{Deserialize, Serialize};

/// A complete stack configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackConfig {
    /// AWS region (e.g. "us-east-1")
    pub region: String,

    /// AWS account id; only consulted by the local engine
    pub account_id: Option<String>,

    pub network: NetworkTopology,

    pub cluster: ClusterSpec,
}

impl StackConfig {
    /// Stack name used for plans and state
    pub fn stack_name(&self) -> &str {
        &self.cluster.name
    }
}
