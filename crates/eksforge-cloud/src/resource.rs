//! Resource descriptions

use crate::error::{CloudError, Result};
use crate::output::{Output, Resolver};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Logical name of a resource, unique within a stack
pub type ResourceId = String;

/// Attribute map of a created resource (or the resolved inputs of one)
pub type Attributes = serde_json::Map<String, Value>;

/// Whether the engine creates the resource or only reads it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Created and owned by the stack
    Managed,
    /// Looked up from the provider (parameters, caller identity, ...)
    Data,
}

/// Desired state of a single resource
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    /// Logical name (e.g. "private-subnet-00")
    pub id: ResourceId,

    /// Resource type token (e.g. "aws:ec2/subnet:Subnet")
    pub resource_type: String,

    pub kind: ResourceKind,

    /// Resource arguments, possibly deferred
    pub inputs: BTreeMap<String, Output<Value>>,

    /// Ordering edges that carry no data
    pub depends_on: BTreeSet<ResourceId>,
}

impl ResourceSpec {
    pub fn new(resource_type: impl Into<String>, id: impl Into<ResourceId>) -> Self {
        Self {
            id: id.into(),
            resource_type: resource_type.into(),
            kind: ResourceKind::Managed,
            inputs: BTreeMap::new(),
            depends_on: BTreeSet::new(),
        }
    }

    /// A provider lookup rather than a created resource
    pub fn data(resource_type: impl Into<String>, id: impl Into<ResourceId>) -> Self {
        Self {
            kind: ResourceKind::Data,
            ..Self::new(resource_type, id)
        }
    }

    pub fn input(mut self, key: impl Into<String>, value: impl Into<Output<Value>>) -> Self {
        self.inputs.insert(key.into(), value.into());
        self
    }

    pub fn depends_on(mut self, resource: &Resource) -> Self {
        self.depends_on.insert(resource.logical_name().to_string());
        self
    }

    /// Every resource this one waits for, through data or explicit edges
    pub fn dependencies(&self) -> BTreeSet<ResourceId> {
        let mut deps = self.depends_on.clone();
        for input in self.inputs.values() {
            deps.extend(input.deps().iter().cloned());
        }
        deps
    }

    /// Get the full resource key (type:id)
    pub fn key(&self) -> String {
        format!("{}:{}", self.resource_type, self.id)
    }

    /// Inputs whose values are already known
    pub fn known_inputs(&self) -> Attributes {
        self.inputs
            .iter()
            .filter_map(|(k, v)| v.preview().map(|v| (k.clone(), v)))
            .collect()
    }

    /// Resolve every input against created resources
    pub fn resolve(&self, resolver: &dyn Resolver) -> Result<ResolvedResource> {
        let mut inputs = Attributes::new();
        for (key, value) in &self.inputs {
            inputs.insert(key.clone(), value.resolve(resolver)?);
        }
        Ok(ResolvedResource {
            id: self.id.clone(),
            resource_type: self.resource_type.clone(),
            kind: self.kind,
            inputs,
        })
    }
}

/// Handle to a registered resource, used to reference its attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    logical_name: ResourceId,
    resource_type: String,
}

impl Resource {
    pub(crate) fn new(logical_name: impl Into<ResourceId>, resource_type: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into(),
            resource_type: resource_type.into(),
        }
    }

    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// A deferred attribute of this resource
    pub fn attr(&self, path: &str) -> Output<Value> {
        Output::attribute(self.logical_name.clone(), path)
    }

    pub fn attr_string(&self, path: &str) -> Output<String> {
        self.attr(path).as_string()
    }
}

/// A resource with every input resolved, as handed to an engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedResource {
    pub id: ResourceId,
    pub resource_type: String,
    pub kind: ResourceKind,
    pub inputs: Attributes,
}

impl ResolvedResource {
    pub fn input(&self, key: &str) -> Option<&Value> {
        self.inputs.get(key)
    }

    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.inputs.get(key).and_then(Value::as_str)
    }
}

/// Walk a dotted path through objects and arrays
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Look up an attribute path within an attribute map
pub fn lookup_attribute(resource: &str, attributes: &Attributes, path: &str) -> Result<Value> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let found = attributes.get(head).and_then(|value| match rest {
        Some(rest) => lookup_path(value, rest),
        None => Some(value),
    });
    found.cloned().ok_or_else(|| CloudError::AttributeNotFound {
        resource: resource.to_string(),
        path: path.to_string(),
    })
}
