use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("KDL parse error: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("File read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error: {path}\nreason: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("'{section}' is missing required field '{field}'")]
    MissingField { section: String, field: String },

    #[error("Node group '{group}': {field} must be a non-negative integer, got '{value}'")]
    InvalidCapacity {
        group: String,
        field: &'static str,
        value: String,
    },

    #[error(
        "Node group '{group}': sizes must satisfy min <= desired <= max (min={min}, desired={desired}, max={max})"
    )]
    CapacityOrder {
        group: String,
        min: u32,
        desired: u32,
        max: u32,
    },

    #[error("{kind} subnets: {subnets} CIDR blocks but {zones} availability zones")]
    SubnetCountMismatch {
        kind: &'static str,
        subnets: usize,
        zones: usize,
    },

    #[error("At least one {0} subnet is required")]
    NoSubnets(&'static str),

    #[error("Invalid CIDR block '{cidr}': {message}")]
    InvalidCidr { cidr: String, message: String },

    #[error("Subnet {subnet} is not inside VPC {vpc}")]
    SubnetOutsideVpc { subnet: String, vpc: String },

    #[error("Subnets {first} and {second} overlap")]
    OverlappingSubnets { first: String, second: String },

    #[error(
        "Node group name '{name}' clashes with the resource '{resource}'\nhint: rename the node group"
    )]
    ReservedName { name: String, resource: String },

    #[error(
        "Windows node groups need at least one Linux node group\nhint: add a linux-nodegroup so the Windows launch templates can be ordered after it"
    )]
    WindowsWithoutLinux,

    #[error("Template error: {file}\nreason: {message}")]
    TemplateError { file: PathBuf, message: String },

    #[error("Template render error: {0}")]
    TemplateRenderError(String),

    #[error("Unsupported stack file format: {0}\nhint: use .kdl, .yaml or .yml")]
    UnsupportedFormat(PathBuf),

    #[error(
        "Stack file not found\nhint: create stack.kdl in the current directory or set EKSFORGE_CONFIG_PATH"
    )]
    StackFileNotFound,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
