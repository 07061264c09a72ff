//! Local engine for eksforge
//!
//! This crate implements the [`Engine`](eksforge_cloud::Engine) trait without
//! talking to AWS: every resource and lookup is resolved in-process with
//! deterministic ids. It backs `eksforge plan`/`apply` previews and the
//! builder tests.
//!
//! # Example
//!
//! ```ignore
//! use eksforge_cloud_local::LocalEngine;
//!
//! let engine = LocalEngine::new("us-east-1").with_account_id("123456789012");
//! let applied = stack.apply(&engine).await?;
//! println!("{:?}", applied.output("vpc"));
//! ```

pub mod engine;
pub mod error;

pub use engine::{DEFAULT_ACCOUNT_ID, LocalEngine, STS_CLIENT_ID};
pub use error::{LocalError, Result};
