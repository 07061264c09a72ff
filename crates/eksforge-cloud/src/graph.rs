//! The resource graph of a stack
//!
//! Resources are registered in dependency order: every resource a new one
//! refers to (through an [`Output`] input or an explicit `depends_on` edge)
//! must already be registered. Registration order is therefore a valid
//! topological order and is the order plans list and engines apply.

use crate::action::{Action, ActionType, ApplyResult, Plan, UNKNOWN_VALUE};
use crate::engine::Engine;
use crate::error::{CloudError, Result};
use crate::output::{Output, Resolver};
use crate::resource::{
    lookup_attribute, Attributes, ResolvedResource, Resource, ResourceId, ResourceKind,
    ResourceSpec,
};
use crate::state::StackState;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// A named set of resources and exported outputs
#[derive(Debug)]
pub struct Stack {
    name: String,
    resources: Vec<ResourceSpec>,
    index: HashMap<ResourceId, usize>,
    exports: Vec<(String, Output<Value>)>,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resources: Vec::new(),
            index: HashMap::new(),
            exports: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a resource and return a handle for referencing its attributes
    pub fn register(&mut self, spec: ResourceSpec) -> Result<Resource> {
        if self.index.contains_key(&spec.id) {
            return Err(CloudError::DuplicateResource(spec.id));
        }

        for dependency in spec.dependencies() {
            if !self.index.contains_key(&dependency) {
                return Err(CloudError::UnknownDependency {
                    resource: spec.id.clone(),
                    dependency,
                });
            }
        }

        debug!(resource = %spec.key(), "registered");
        let handle = Resource::new(spec.id.clone(), spec.resource_type.clone());
        self.index.insert(spec.id.clone(), self.resources.len());
        self.resources.push(spec);
        Ok(handle)
    }

    /// Publish a named stack output
    pub fn export(&mut self, name: impl Into<String>, value: impl Into<Output<Value>>) -> Result<()> {
        let name = name.into();
        let value = value.into();

        if self.exports.iter().any(|(existing, _)| *existing == name) {
            return Err(CloudError::DuplicateExport(name));
        }
        if let Some(dependency) = value.deps().iter().find(|d| !self.index.contains_key(*d)) {
            return Err(CloudError::UnknownDependency {
                resource: name,
                dependency: dependency.clone(),
            });
        }

        self.exports.push((name, value));
        Ok(())
    }

    /// Resources in registration order
    pub fn resources(&self) -> &[ResourceSpec] {
        &self.resources
    }

    pub fn get(&self, id: &str) -> Option<&ResourceSpec> {
        self.index.get(id).map(|&i| &self.resources[i])
    }

    /// Position of a resource in apply order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn by_type<'a>(&'a self, resource_type: &'a str) -> impl Iterator<Item = &'a ResourceSpec> {
        self.resources
            .iter()
            .filter(move |r| r.resource_type == resource_type)
    }

    /// Names of exported outputs, in export order
    pub fn exports(&self) -> impl Iterator<Item = &str> {
        self.exports.iter().map(|(name, _)| name.as_str())
    }

    /// Compare the stack against the recorded state
    pub fn plan(&self, state: &StackState) -> Plan {
        let mut actions = Vec::with_capacity(self.resources.len());

        for spec in &self.resources {
            let action_type = match spec.kind {
                ResourceKind::Data => ActionType::Read,
                ResourceKind::Managed => match state.get_resource(&spec.id) {
                    None => ActionType::Create,
                    Some(existing) => {
                        let changed = existing.resource_type != spec.resource_type
                            || spec
                                .known_inputs()
                                .iter()
                                .any(|(k, v)| existing.inputs.get(k) != Some(v));
                        if changed {
                            ActionType::Update
                        } else {
                            ActionType::NoOp
                        }
                    }
                },
            };

            let details = spec
                .inputs
                .iter()
                .map(|(k, v)| {
                    let shown = v
                        .preview()
                        .unwrap_or_else(|| Value::String(UNKNOWN_VALUE.to_string()));
                    (k.clone(), shown)
                })
                .collect::<BTreeMap<_, _>>();

            actions.push(Action {
                id: spec.key(),
                action_type,
                resource_type: spec.resource_type.clone(),
                resource_id: spec.id.clone(),
                description: describe(action_type, spec),
                depends_on: spec.dependencies().into_iter().collect(),
                details,
            });
        }

        for id in state.resources.keys() {
            if !self.index.contains_key(id) {
                debug!(resource = %id, "recorded resource is no longer part of the stack");
            }
        }

        Plan::new(self.name.clone(), actions)
    }

    /// Create every resource through the engine, in registration order
    ///
    /// The first failure aborts the apply; resources after it are not
    /// attempted.
    #[instrument(skip(self, engine), fields(stack = %self.name, engine = engine.name()))]
    pub async fn apply(&self, engine: &dyn Engine) -> Result<Applied> {
        let started = Instant::now();
        let mut applied = Applied::default();

        for spec in &self.resources {
            let resolved = spec.resolve(&applied)?;
            let attributes = match spec.kind {
                ResourceKind::Data => {
                    debug!(resource = %spec.key(), "reading");
                    engine.read(&resolved).await?
                }
                ResourceKind::Managed => {
                    info!(resource = %spec.key(), "creating");
                    engine.create(&resolved).await?
                }
            };

            let verb = match spec.kind {
                ResourceKind::Data => "read",
                ResourceKind::Managed => "created",
            };
            applied
                .result
                .add_success(spec.key(), format!("{} {}", spec.id, verb));
            applied.attributes.insert(spec.id.clone(), attributes);
            applied.resources.push(resolved);
        }

        for (name, value) in &self.exports {
            let resolved = value.resolve(&applied)?;
            applied.outputs.insert(name.clone(), resolved);
        }

        applied.result.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            resources = applied.resources.len(),
            outputs = applied.outputs.len(),
            "stack applied"
        );
        Ok(applied)
    }
}

fn describe(action_type: ActionType, spec: &ResourceSpec) -> String {
    match action_type {
        ActionType::Create => format!("Create {} '{}'", spec.resource_type, spec.id),
        ActionType::Update => format!("Update {} '{}'", spec.resource_type, spec.id),
        ActionType::Read => format!("Read {} '{}'", spec.resource_type, spec.id),
        ActionType::NoOp => format!("{} '{}' is up to date", spec.resource_type, spec.id),
    }
}

/// Outcome of a successful apply
#[derive(Debug, Default)]
pub struct Applied {
    pub result: ApplyResult,
    resources: Vec<ResolvedResource>,
    attributes: HashMap<ResourceId, Attributes>,
    outputs: BTreeMap<String, Value>,
}

impl Applied {
    /// Resources with their resolved inputs, in apply order
    pub fn resolved(&self) -> &[ResolvedResource] {
        &self.resources
    }

    pub fn resource(&self, id: &str) -> Option<&ResolvedResource> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// Attributes the engine reported for a resource
    pub fn attributes(&self, id: &str) -> Option<&Attributes> {
        self.attributes.get(id)
    }

    pub fn outputs(&self) -> &BTreeMap<String, Value> {
        &self.outputs
    }

    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs.get(name)
    }
}

impl Resolver for Applied {
    fn attribute(&self, resource: &ResourceId, path: &str) -> Result<Value> {
        let attributes = self
            .attributes
            .get(resource)
            .ok_or_else(|| CloudError::ResourceNotFound(resource.clone()))?;
        lookup_attribute(resource, attributes, path)
    }
}
