//! Deferred values
//!
//! An [`Output`] is a value that only becomes known once the engine has
//! created the resources it depends on. It carries the set of those resources
//! explicitly, so every data flow between resources is also a dependency edge
//! of the graph, and a pure transformation that the engine evaluates after the
//! upstream attributes have resolved.

use crate::error::{CloudError, Result};
use crate::resource::ResourceId;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Source of resolved resource attributes
pub trait Resolver {
    /// Look up an attribute by dotted path (`identities.0.oidcs.0.issuer`)
    fn attribute(&self, resource: &ResourceId, path: &str) -> Result<Value>;
}

/// Resolver used for previews: nothing has been created yet
struct Unresolved;

impl Resolver for Unresolved {
    fn attribute(&self, resource: &ResourceId, path: &str) -> Result<Value> {
        Err(CloudError::UnresolvedValue(format!("{resource}.{path}")))
    }
}

type Eval<T> = Arc<dyn Fn(&dyn Resolver) -> Result<T> + Send + Sync>;

/// A value that may depend on attributes of other resources
pub struct Output<T> {
    deps: BTreeSet<ResourceId>,
    eval: Eval<T>,
}

impl<T> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self {
            deps: self.deps.clone(),
            eval: Arc::clone(&self.eval),
        }
    }
}

impl<T> fmt::Debug for Output<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output").field("deps", &self.deps).finish()
    }
}

impl<T: Send + Sync + 'static> Output<T> {
    /// A value known at description time
    pub fn known(value: T) -> Self
    where
        T: Clone,
    {
        Self {
            deps: BTreeSet::new(),
            eval: Arc::new(move |_: &dyn Resolver| Ok(value.clone())),
        }
    }

    /// Resources this value waits for
    pub fn deps(&self) -> &BTreeSet<ResourceId> {
        &self.deps
    }

    /// Whether the value can be computed without any resource existing
    pub fn is_known(&self) -> bool {
        self.deps.is_empty()
    }

    /// Evaluate against resolved attributes
    pub fn resolve(&self, resolver: &dyn Resolver) -> Result<T> {
        (self.eval)(resolver)
    }

    /// The value if it is already known, for plan output
    pub fn preview(&self) -> Option<T> {
        if self.is_known() {
            self.resolve(&Unresolved).ok()
        } else {
            None
        }
    }

    pub fn map<U, F>(self, f: F) -> Output<U>
    where
        U: Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let eval = self.eval;
        Output {
            deps: self.deps,
            eval: Arc::new(move |r: &dyn Resolver| eval(r).map(&f)),
        }
    }

    /// Like [`Output::map`], for transformations that can fail once the
    /// upstream value is known (an empty list, a missing field)
    pub fn try_map<U, F>(self, f: F) -> Output<U>
    where
        U: Send + Sync + 'static,
        F: Fn(T) -> Result<U> + Send + Sync + 'static,
    {
        let eval = self.eval;
        Output {
            deps: self.deps,
            eval: Arc::new(move |r: &dyn Resolver| eval(r).and_then(&f)),
        }
    }

    /// Combine two deferred values; the result waits for both
    pub fn zip<U>(self, other: Output<U>) -> Output<(T, U)>
    where
        U: Send + Sync + 'static,
    {
        let mut deps = self.deps;
        deps.extend(other.deps);
        let left = self.eval;
        let right = other.eval;
        Output {
            deps,
            eval: Arc::new(move |r: &dyn Resolver| Ok((left(r)?, right(r)?))),
        }
    }

    /// Collect a list of deferred values, preserving order
    pub fn all(outputs: impl IntoIterator<Item = Output<T>>) -> Output<Vec<T>> {
        let outputs: Vec<Output<T>> = outputs.into_iter().collect();
        let deps = outputs.iter().flat_map(|o| o.deps.iter().cloned()).collect();
        Output {
            deps,
            eval: Arc::new(move |r: &dyn Resolver| outputs.iter().map(|o| o.resolve(r)).collect()),
        }
    }

    /// Convert to a JSON value for use as a resource input
    pub fn into_value(self) -> Output<Value>
    where
        T: Serialize,
    {
        self.try_map(|v| Ok(serde_json::to_value(v)?))
    }
}

impl Output<Value> {
    /// An attribute of a registered resource
    pub fn attribute(resource: impl Into<ResourceId>, path: impl Into<String>) -> Self {
        let resource = resource.into();
        let path = path.into();
        Self {
            deps: BTreeSet::from([resource.clone()]),
            eval: Arc::new(move |r: &dyn Resolver| r.attribute(&resource, &path)),
        }
    }

    pub fn as_string(self) -> Output<String> {
        self.try_map(|value| match value {
            Value::String(s) => Ok(s),
            other => Err(CloudError::TypeMismatch {
                value: other.to_string(),
                expected: "string",
            }),
        })
    }
}

impl From<Value> for Output<Value> {
    fn from(value: Value) -> Self {
        Output::known(value)
    }
}

impl From<&str> for Output<Value> {
    fn from(value: &str) -> Self {
        Output::known(Value::String(value.to_string()))
    }
}

impl From<String> for Output<Value> {
    fn from(value: String) -> Self {
        Output::known(Value::String(value))
    }
}

impl From<Output<String>> for Output<Value> {
    fn from(output: Output<String>) -> Self {
        output.map(Value::String)
    }
}

impl From<Output<Vec<Value>>> for Output<Value> {
    fn from(output: Output<Vec<Value>>) -> Self {
        output.map(Value::Array)
    }
}

impl From<&str> for Output<String> {
    fn from(value: &str) -> Self {
        Output::known(value.to_string())
    }
}

impl From<String> for Output<String> {
    fn from(value: String) -> Self {
        Output::known(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    struct MapResolver(HashMap<(String, String), Value>);

    impl Resolver for MapResolver {
        fn attribute(&self, resource: &ResourceId, path: &str) -> Result<Value> {
            self.0
                .get(&(resource.clone(), path.to_string()))
                .cloned()
                .ok_or_else(|| CloudError::AttributeNotFound {
                    resource: resource.clone(),
                    path: path.to_string(),
                })
        }
    }

    fn resolver(entries: &[(&str, &str, Value)]) -> MapResolver {
        MapResolver(
            entries
                .iter()
                .map(|(r, p, v)| ((r.to_string(), p.to_string()), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_known_value_previews() {
        let output = Output::known(json!("10.0.0.0/16"));
        assert!(output.is_known());
        assert_eq!(output.preview(), Some(json!("10.0.0.0/16")));
    }

    #[test]
    fn test_attribute_is_unknown_until_resolved() {
        let output = Output::attribute("VPC", "id");
        assert!(!output.is_known());
        assert!(output.preview().is_none());
        assert!(output.deps().contains("VPC"));

        let r = resolver(&[("VPC", "id", json!("vpc-123"))]);
        assert_eq!(output.resolve(&r).unwrap(), json!("vpc-123"));
    }

    #[test]
    fn test_map_keeps_dependencies() {
        let output = Output::attribute("eks-cluster", "name")
            .as_string()
            .map(|name| format!("kubernetes.io/cluster/{name}"));
        assert!(output.deps().contains("eks-cluster"));

        let r = resolver(&[("eks-cluster", "name", json!("demo"))]);
        assert_eq!(output.resolve(&r).unwrap(), "kubernetes.io/cluster/demo");
    }

    #[test]
    fn test_zip_and_all_merge_dependencies() {
        let a = Output::attribute("a", "id");
        let b = Output::attribute("b", "id");
        let zipped = a.clone().zip(b.clone());
        assert_eq!(zipped.deps().len(), 2);

        let all = Output::all(vec![a, b, Output::known(json!("c"))]);
        assert_eq!(all.deps().len(), 2);

        let r = resolver(&[("a", "id", json!("1")), ("b", "id", json!("2"))]);
        assert_eq!(
            all.resolve(&r).unwrap(),
            vec![json!("1"), json!("2"), json!("c")]
        );
    }

    #[test]
    fn test_as_string_rejects_non_strings() {
        let output = Output::known(json!(42)).as_string();
        let err = output.resolve(&resolver(&[])).unwrap_err();
        assert!(matches!(err, CloudError::TypeMismatch { .. }));
    }

    #[test]
    fn test_try_map_error_surfaces_on_resolve() {
        let output = Output::attribute("eks-cluster", "identities").try_map(|v| {
            v.as_array()
                .and_then(|a| a.first().cloned())
                .ok_or_else(|| CloudError::UnresolvedValue("no identities".into()))
        });
        let r = resolver(&[("eks-cluster", "identities", json!([]))]);
        assert!(matches!(
            output.resolve(&r),
            Err(CloudError::UnresolvedValue(_))
        ));
    }
}
