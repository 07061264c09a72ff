//! eksforge resource graph
//!
//! This crate describes infrastructure as a graph of resources whose inputs
//! may be deferred [`Output`] values, plans it against the recorded state, and
//! applies it through an [`Engine`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  eksforge CLI                    │
//! │            (plan / apply / outputs)              │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                eksforge-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   Stack { ResourceSpec, Output<T> }       │   │
//! │  │   trait Engine { read, create }           │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │     Plan     │  │  State Mgmt  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │ local engine  │
//! └───────────────┘
//! ```

pub mod action;
pub mod engine;
pub mod error;
pub mod graph;
pub mod output;
pub mod resource;
pub mod state;
pub mod types;

// Re-exports
pub use action::{Action, ActionResult, ActionType, ApplyResult, Plan, PlanSummary, UNKNOWN_VALUE};
pub use engine::{AuthStatus, Engine};
pub use error::{CloudError, Result};
pub use graph::{Applied, Stack};
pub use output::{Output, Resolver};
pub use resource::{
    lookup_attribute, lookup_path, Attributes, ResolvedResource, Resource, ResourceId,
    ResourceKind, ResourceSpec,
};
pub use state::{ResourceState, StackState, StateLock, StateManager};
