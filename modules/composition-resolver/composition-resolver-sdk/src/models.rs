//! Stack graph models.
//!
//! This is the shape the external planner hands to the resolver. Nothing here
//! is derived; see [`crate::resolution`] for the output side.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One deployable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    /// Human-readable stack name.
    pub name: String,
    /// Opaque deployment identifier. Stable for the lifetime of a deployment,
    /// never reused across stacks.
    pub stack_id: String,
    /// Resource declarations, in declaration order.
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Stack {
    /// Look up a resource by logical name.
    #[must_use]
    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }
}

/// A resource declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Logical name, unique within the stack.
    pub name: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Exported capability keys with their provider handles
    /// (see [`crate::capability_keys`]).
    #[serde(default)]
    pub exports: BTreeMap<String, String>,
    /// Kind-specific declaration.
    #[serde(flatten)]
    pub spec: ResourceSpec,
}

/// Kind-specific part of a resource declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceSpec {
    /// A storage resource that consumers are granted access to.
    Storage {
        engine: StorageKind,
        #[serde(default)]
        consumers: Vec<Consumer>,
    },
    /// A compute service, optionally triggered on a schedule.
    Compute {
        #[serde(default)]
        schedules: Vec<ScheduleSpec>,
    },
    /// A public entry point routing paths to origins.
    Entrypoint {
        #[serde(default)]
        routes: Vec<RouteDecl>,
    },
}

impl ResourceSpec {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Storage { .. } => "storage",
            Self::Compute { .. } => "compute",
            Self::Entrypoint { .. } => "entrypoint",
        }
    }
}

/// Storage engines. Each engine owns its own action table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Object storage bucket.
    Bucket,
    /// Key/value table.
    KeyValue,
}

impl StorageKind {
    /// Suffix of the environment variable that carries the physical name
    /// (`FILES_BUCKET_NAME`, `ORDERS_KV_STORE_NAME`).
    #[must_use]
    pub fn env_suffix(self) -> &'static str {
        match self {
            Self::Bucket => "BUCKET_NAME",
            Self::KeyValue => "KV_STORE_NAME",
        }
    }
}

/// An identity requesting access to a storage resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumer {
    /// Consumer name, typically the logical name of a compute resource.
    pub name: String,
    /// Opaque role/credential handle.
    pub identity: String,
    /// Declared intents (`read`, `write`, `delete`).
    #[serde(default)]
    pub intents: Vec<String>,
}

/// Coarse-grained access request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Read,
    Write,
    Delete,
}

impl Intent {
    pub const ALL: [Self; 3] = [Self::Read, Self::Write, Self::Delete];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An intent outside `read`/`write`/`delete`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown intent '{0}'")]
pub struct ParseIntentError(pub String);

impl FromStr for Intent {
    type Err = ParseIntentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|intent| intent.as_str() == s)
            .ok_or_else(|| ParseIntentError(s.to_owned()))
    }
}

/// A periodic trigger of a compute resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSpec {
    /// Schedule name, unique within the stack.
    pub name: String,
    /// Portable 5-field cron expression.
    pub cron_expression: String,
    /// Path invoked on the compute resource.
    pub target_path: String,
}

/// A path route declared on an entrypoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDecl {
    /// Path prefix; `"/"` marks the default origin.
    pub path_prefix: String,
    /// Where matching requests go.
    pub target: RouteTarget,
}

/// Target of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTarget {
    /// A resource of this stack, discovered through its exports.
    Resource(String),
    /// A backend outside the stack.
    External { name: String, domain_name: String },
}

impl RouteTarget {
    /// Origin id this target produces.
    #[must_use]
    pub fn origin_id(&self) -> &str {
        match self {
            Self::Resource(name) | Self::External { name, .. } => name,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resource_kind_is_an_internal_tag() {
        let resource: Resource = serde_json::from_value(json!({
            "name": "files",
            "kind": "storage",
            "engine": "bucket",
            "exports": { "aws_s3_bucket": "arn:aws:s3:::s1-files" },
            "consumers": [
                { "name": "api", "identity": "arn:aws:iam::1:role/api", "intents": ["read"] }
            ]
        }))
        .unwrap();

        assert_eq!(resource.spec.kind(), "storage");
        match resource.spec {
            ResourceSpec::Storage { engine, consumers } => {
                assert_eq!(engine, StorageKind::Bucket);
                assert_eq!(consumers.len(), 1);
                assert_eq!(consumers[0].intents, vec!["read".to_owned()]);
            }
            other => panic!("Expected storage, got: {other:?}"),
        }
    }

    #[test]
    fn route_targets_deserialize_both_forms() {
        let routes: Vec<RouteDecl> = serde_json::from_value(json!([
            { "path_prefix": "/", "target": { "resource": "site" } },
            { "path_prefix": "/docs/", "target": { "external": { "name": "docs", "domain_name": "docs.example.com" } } }
        ]))
        .unwrap();

        assert_eq!(routes[0].target, RouteTarget::Resource("site".to_owned()));
        assert_eq!(routes[1].target.origin_id(), "docs");
    }

    #[test]
    fn intents_parse_exactly() {
        assert_eq!("read".parse::<Intent>().unwrap(), Intent::Read);
        assert_eq!("delete".parse::<Intent>().unwrap(), Intent::Delete);
        assert_eq!(
            "Read".parse::<Intent>().unwrap_err(),
            ParseIntentError("Read".to_owned())
        );
        assert!("admin".parse::<Intent>().is_err());
    }
}
