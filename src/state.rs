//! Declared-state snapshot.
//!
//! The snapshot is the provider-side view of what the host believes exists:
//! resource addresses mapped to their type and tracked identity. It is the
//! input of existence and destroy checks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One tracked resource instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInstance {
    /// The resource type (e.g. `aws_appsync_datasource`).
    #[serde(rename = "type")]
    pub resource_type: String,
    /// The tracked identity. Empty if the resource was never created.
    #[serde(default)]
    pub id: String,
    /// The tracked attributes.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub attributes: serde_json::Value,
}

impl ResourceInstance {
    /// Create an instance with no attributes.
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            attributes: serde_json::Value::Null,
        }
    }

    /// Attach tracked attributes.
    pub fn with_attributes(mut self, attributes: serde_json::Value) -> Self {
        self.attributes = attributes;
        self
    }
}

/// The resources of a state snapshot, keyed by address
/// (e.g. `aws_appsync_datasource.test`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Tracked resources, ordered by address.
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceInstance>,
}

impl StateSnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Add a resource.
    pub fn with_resource(mut self, address: impl Into<String>, instance: ResourceInstance) -> Self {
        self.resources.insert(address.into(), instance);
        self
    }

    /// Get a resource by address.
    pub fn get(&self, address: &str) -> Option<&ResourceInstance> {
        self.resources.get(address)
    }

    /// Iterate over the resources of one type, in address order.
    pub fn of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a ResourceInstance)> + 'a {
        self.resources
            .iter()
            .filter(move |(_, instance)| instance.resource_type == resource_type)
            .map(|(address, instance)| (address.as_str(), instance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_from_json() {
        let snapshot = StateSnapshot::from_json(
            r#"{
                "resources": {
                    "aws_appsync_datasource.test": {
                        "type": "aws_appsync_datasource",
                        "id": "api123#mySource",
                        "attributes": {"name": "mySource", "type": "NONE"}
                    },
                    "aws_iam_role.test": {
                        "type": "aws_iam_role",
                        "id": "role-1"
                    }
                }
            }"#,
        )
        .unwrap();

        let ds = snapshot.get("aws_appsync_datasource.test").unwrap();
        assert_eq!(ds.id, "api123#mySource");
        assert_eq!(ds.attributes["type"], "NONE");
        assert_eq!(snapshot.get("aws_iam_role.test").unwrap().attributes, json!(null));
        assert!(snapshot.get("aws_appsync_datasource.other").is_none());
    }

    #[test]
    fn test_of_type_filters_and_orders() {
        let snapshot = StateSnapshot::new()
            .with_resource("aws_memorydb_user.b", ResourceInstance::new("aws_memorydb_user", "bob"))
            .with_resource("aws_memorydb_user.a", ResourceInstance::new("aws_memorydb_user", "alice"))
            .with_resource(
                "aws_memorydb_subnet_group.main",
                ResourceInstance::new("aws_memorydb_subnet_group", "main"),
            );

        let users: Vec<_> = snapshot
            .of_type("aws_memorydb_user")
            .map(|(address, instance)| (address, instance.id.as_str()))
            .collect();
        assert_eq!(
            users,
            vec![("aws_memorydb_user.a", "alice"), ("aws_memorydb_user.b", "bob")]
        );
    }

    #[test]
    fn test_instance_serialization_skips_null_attributes() {
        let instance = ResourceInstance::new("aws_memorydb_user", "alice");
        let value = serde_json::to_value(&instance).unwrap();
        assert_eq!(value, json!({"type": "aws_memorydb_user", "id": "alice"}));
    }
}
