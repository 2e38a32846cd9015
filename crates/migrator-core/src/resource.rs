//! The dynamically-typed resource object shuttled between a cluster and an archive.
//!
//! The cluster exposes arbitrary kinds at runtime, so objects are modeled as a
//! free-form JSON tree with typed accessors rather than generated static types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// Fields stripped from every object before it is persisted to an archive.
pub const SANITIZED_METADATA_FIELDS: &[&str] = &[
    "generateName",
    "selfLink",
    "uid",
    "resourceVersion",
    "generation",
    "creationTimestamp",
    "ownerReferences",
    "managedFields",
];

/// An opaque, dynamically-typed cluster object: apiVersion, kind, metadata, spec, status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceObject(Value);

impl ResourceObject {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn api_version(&self) -> Option<&str> {
        self.0.get("apiVersion").and_then(Value::as_str)
    }

    pub fn kind(&self) -> Option<&str> {
        self.0.get("kind").and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        get_in(&self.0, &["metadata", "name"]).and_then(Value::as_str)
    }

    pub fn namespace(&self) -> Option<&str> {
        get_in(&self.0, &["metadata", "namespace"]).and_then(Value::as_str)
    }

    pub fn set_name(&mut self, name: &str) {
        self.set_nested_field(&["metadata", "name"], Value::String(name.to_string()));
    }

    pub fn set_namespace(&mut self, namespace: &str) {
        self.set_nested_field(
            &["metadata", "namespace"],
            Value::String(namespace.to_string()),
        );
    }

    /// Read a string at a dotted metadata path, e.g. `["metadata", "annotations", "foo"]`.
    pub fn get_nested_string(&self, path: &[&str]) -> Option<String> {
        get_in(&self.0, path)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Write a value at a nested path, creating intermediate objects as needed.
    pub fn set_nested_field(&mut self, path: &[&str], value: Value) {
        set_in(&mut self.0, path, value);
    }

    pub fn annotations(&self) -> BTreeMap<String, String> {
        string_map_at(&self.0, &["metadata", "annotations"])
    }

    pub fn labels(&self) -> BTreeMap<String, String> {
        string_map_at(&self.0, &["metadata", "labels"])
    }

    pub fn get_annotation(&self, key: &str) -> Option<String> {
        self.get_nested_string(&["metadata", "annotations", key])
    }

    pub fn set_annotation(&mut self, key: &str, value: &str) {
        self.set_nested_field(
            &["metadata", "annotations", key],
            Value::String(value.to_string()),
        );
    }

    pub fn remove_annotation(&mut self, key: &str) {
        remove_in(&mut self.0, &["metadata", "annotations", key]);
    }

    pub fn set_label(&mut self, key: &str, value: &str) {
        self.set_nested_field(
            &["metadata", "labels", key],
            Value::String(value.to_string()),
        );
    }

    /// Does this object carry an ownerReference whose apiVersion starts with `prefix`?
    pub fn has_owner_reference_with_prefix(&self, prefix: &str) -> bool {
        let Some(refs) = get_in(&self.0, &["metadata", "ownerReferences"]).and_then(Value::as_array)
        else {
            return false;
        };
        refs.iter().any(|r| {
            r.get("apiVersion")
                .and_then(Value::as_str)
                .is_some_and(|v| v.starts_with(prefix))
        })
    }

    /// Strip the cluster-specific metadata fields enumerated in `SANITIZED_METADATA_FIELDS`.
    ///
    /// Annotations and labels (including pause markers) are preserved.
    pub fn sanitize(&mut self) -> Result<()> {
        let kind = self.kind().unwrap_or("Unknown").to_string();
        let name = self.name().unwrap_or("unknown").to_string();
        let Some(metadata) = self.0.get_mut("metadata").and_then(Value::as_object_mut) else {
            return Ok(());
        };
        for field in SANITIZED_METADATA_FIELDS {
            if metadata.remove(*field).is_none() && metadata.contains_key(*field) {
                return Err(CoreError::SanitizeFailed {
                    field: (*field).to_string(),
                    kind,
                    name,
                });
            }
        }
        Ok(())
    }
}

fn get_in<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for segment in path {
        current = current.get(segment)?;
    }
    Some(current)
}

fn set_in(value: &mut Value, path: &[&str], new_value: Value) {
    let Some((last, prefix)) = path.split_last() else {
        *value = new_value;
        return;
    };
    let mut current = value;
    for segment in prefix {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let map = current.as_object_mut().expect("just ensured object");
        current = map.entry(*segment).or_insert_with(|| Value::Object(Map::new()));
    }
    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    current
        .as_object_mut()
        .expect("just ensured object")
        .insert((*last).to_string(), new_value);
}

fn remove_in(value: &mut Value, path: &[&str]) {
    let Some((last, prefix)) = path.split_last() else {
        return;
    };
    if let Some(parent) = get_in_mut(value, prefix) {
        if let Some(map) = parent.as_object_mut() {
            map.remove(*last);
        }
    }
}

fn get_in_mut<'a>(value: &'a mut Value, path: &[&str]) -> Option<&'a mut Value> {
    let mut current = value;
    for segment in path {
        current = current.get_mut(segment)?;
    }
    Some(current)
}

fn string_map_at(value: &Value, path: &[&str]) -> BTreeMap<String, String> {
    get_in(value, path)
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}
