//! Capability-based discovery.
//!
//! Resources advertise what backs them by exporting well-known keys paired
//! with an opaque provider handle. Consumers of the stack (the origin router,
//! other resolvers) look for keys, never for resource names or kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known capability keys.
///
/// This vocabulary is shared by independently built resolvers; adding a key is
/// a contract change.
pub mod capability_keys {
    /// Backed by an object storage bucket. Handle: bucket ARN or name.
    pub const OBJECT_STORAGE: &str = "aws_s3_bucket";

    /// Backed by a serverless function. Handle: function ARN or name.
    pub const FUNCTION: &str = "aws_lambda_function";

    /// Reachable through a network load balancer. Handle: load balancer ARN.
    pub const LOAD_BALANCER: &str = "aws_lb";

    /// Origin-facing domain name. Not a classification key.
    pub const DOMAIN_NAME: &str = "domain_name";
}

/// Origin classes, derived from exported capability keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginClass {
    /// Fetched by the edge with a signed origin-access credential.
    ObjectStorage,
    /// Invoked by the edge with a signed origin-access credential.
    Function,
    /// Reached over the private network, never fetched from the public edge.
    LoadBalanced,
    /// Fetched directly by the edge.
    Other,
}

impl OriginClass {
    /// Classes that are selected by a capability key, with that key.
    pub const KEYED: [(Self, &'static str); 3] = [
        (Self::ObjectStorage, capability_keys::OBJECT_STORAGE),
        (Self::Function, capability_keys::FUNCTION),
        (Self::LoadBalanced, capability_keys::LOAD_BALANCER),
    ];

    /// The capability key selecting this class, if any.
    #[must_use]
    pub fn capability_key(self) -> Option<&'static str> {
        Self::KEYED
            .iter()
            .find(|(class, _)| *class == self)
            .map(|(_, key)| *key)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ObjectStorage => "object_storage",
            Self::Function => "function",
            Self::LoadBalanced => "load_balanced",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for OriginClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn keyed_classes_map_to_distinct_keys() {
        assert_eq!(
            OriginClass::ObjectStorage.capability_key(),
            Some(capability_keys::OBJECT_STORAGE)
        );
        assert_eq!(
            OriginClass::Function.capability_key(),
            Some(capability_keys::FUNCTION)
        );
        assert_eq!(
            OriginClass::LoadBalanced.capability_key(),
            Some(capability_keys::LOAD_BALANCER)
        );
        assert_eq!(OriginClass::Other.capability_key(), None);
    }

    #[test]
    fn class_serializes_snake_case() {
        let json = serde_json::to_string(&OriginClass::LoadBalanced).unwrap();
        assert_eq!(json, r#""load_balanced""#);
    }
}
