//! eksforge stack builders
//!
//! Maps a [`StackConfig`] onto a [`Stack`]: the VPC first, then the EKS
//! control plane with its Linux and Windows node groups and the cluster
//! autoscaler's IAM wiring. Builders only describe resources; creating them
//! is the engine's job (`Stack::apply`).
//!
//! # Example
//!
//! ```ignore
//! let config = eksforge_core::load_stack_file(Path::new("stack.kdl"))?;
//! let (stack, outputs) = eksforge_stack::describe(&config)?;
//! let applied = stack.apply(&engine).await?;
//! ```

pub mod autoscaler;
pub mod bootstrap;
pub mod cluster;
pub mod error;
pub mod network;
pub mod nodegroup;
pub mod policy;

pub use autoscaler::AutoscalerOutput;
pub use bootstrap::BootstrapScript;
pub use cluster::ClusterOutput;
pub use error::{Result, StackError};
pub use network::NetworkOutput;
pub use nodegroup::{LinuxNodeGroups, LinuxNodeRoles, NodeRole, WindowsNodeGroup};

use eksforge_cloud::Stack;
use eksforge_core::{StackConfig, Tags};
use tracing::{info, instrument};

/// Everything [`deploy`] described
#[derive(Debug, Clone)]
pub struct StackOutputs {
    pub network: NetworkOutput,
    pub cluster: ClusterOutput,
}

impl StackOutputs {
    /// Final tag set, including the autoscaler discovery tags
    pub fn tags(&self) -> &Tags {
        self.cluster.tags()
    }
}

/// Describe the network and then the cluster on `stack`
///
/// The configuration is validated first, so an invalid one fails before any
/// resource is registered.
#[instrument(skip_all, fields(stack = %stack.name()))]
pub fn deploy(config: &StackConfig, stack: &mut Stack) -> Result<StackOutputs> {
    eksforge_core::validate(config)?;

    let network = network::build(&config.network, &config.region, stack)?;
    let cluster = cluster::build(&config.cluster, &config.region, &network, stack)?;

    info!(
        resources = stack.resources().len(),
        exports = stack.exports().count(),
        "Stack described"
    );
    Ok(StackOutputs { network, cluster })
}

/// A new stack named after the cluster, with everything described on it
pub fn describe(config: &StackConfig) -> Result<(Stack, StackOutputs)> {
    let mut stack = Stack::new(config.stack_name());
    let outputs = deploy(config, &mut stack)?;
    Ok((stack, outputs))
}
