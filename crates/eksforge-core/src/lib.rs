//! eksforge core
//!
//! Stack configuration: the model, the KDL and YAML stack-file parsers,
//! discovery, template expansion and validation.

pub mod discovery;
pub mod error;
pub mod loader;
pub mod model;
pub mod parser;
pub mod stack_file;
pub mod template;
pub mod validate;

pub use discovery::{CONFIG_PATH_ENV, config_dir, find_stack_file};
pub use error::{ConfigError, Result};
pub use loader::{StackFormat, load_stack, load_stack_file, parse_stack_str};
pub use model::*;
pub use parser::{parse_kdl_file, parse_kdl_string};
pub use stack_file::parse_yaml_string;
pub use template::TemplateProcessor;
pub use validate::{is_reserved_name, validate, validate_cluster, validate_network};
