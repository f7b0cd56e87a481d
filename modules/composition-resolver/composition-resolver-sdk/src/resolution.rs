//! Resolution output.
//!
//! Everything here is derived from a [`crate::Stack`] on every pass and owned
//! by the [`ResolutionResult`]. Keyed collections are ordered so that two
//! passes over the same stack serialize byte-for-byte identically.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use stack_naming::PhysicalId;

use crate::capability::OriginClass;
use crate::models::StorageKind;

/// Output of one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub stack_name: String,
    pub stack_id: String,
    /// Injected context per resource, keyed by logical name.
    pub contexts: BTreeMap<String, Context>,
    /// Every grant of the stack, in resource declaration order.
    pub grants: Vec<AccessGrant>,
    /// Route table per entrypoint, keyed by logical name.
    pub route_tables: BTreeMap<String, RouteTable>,
    /// Provider expression per schedule, keyed by schedule name.
    pub schedules: BTreeMap<String, String>,
}

/// Minimal provider action set granted to one consumer on one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    /// Logical name of the storage resource.
    pub resource_ref: String,
    /// Physical id of the storage resource.
    pub resource_id: PhysicalId,
    /// Consumer name.
    pub consumer_ref: String,
    /// Opaque identity handle the grant attaches to.
    pub identity: String,
    /// Provider actions; never empty.
    pub actions: BTreeSet<String>,
}

/// A schedule translated for the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSchedule {
    pub name: String,
    pub schedule_id: PhysicalId,
    /// Provider expression, e.g. `cron(0 12 * * ? *)`.
    pub expression: String,
    pub target_path: String,
}

/// Context injected into one resource's provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub name: String,
    pub physical_id: PhysicalId,
    pub tags: BTreeMap<String, String>,
    pub exports: BTreeMap<String, String>,
    pub details: ContextDetails,
}

/// Kind-specific part of a [`Context`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContextDetails {
    Storage {
        engine: StorageKind,
        /// Grants where this resource is the `resource_ref`.
        grants: Vec<AccessGrant>,
    },
    Compute {
        schedules: Vec<ResolvedSchedule>,
        /// Variables injected into the running service.
        environment: BTreeMap<String, String>,
    },
    Entrypoint {
        route_table: RouteTable,
    },
}

/// A routable backend behind an entrypoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub id: String,
    pub path_prefix: String,
    pub domain_name: String,
    /// Prefix stripped from the forwarded path; empty for the default origin.
    pub base_path: String,
    pub capability_keys: BTreeMap<String, String>,
    pub class: OriginClass,
    pub access: AccessStrategy,
}

impl Origin {
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.path_prefix == "/"
    }
}

/// How the edge is allowed to reach an origin. Exactly one per origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum AccessStrategy {
    /// Signed requests with the class-wide credential.
    SignedOriginAccess { credential_id: String },
    /// Private network binding plus an inbound firewall rule.
    PrivateNetwork {
        binding: PrivateOriginBinding,
        firewall_rule: FirewallRule,
    },
    /// Fetched directly by the edge.
    Direct,
}

/// Signed origin-access credential shared by every origin of one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginAccessCredential {
    pub id: String,
    pub class: OriginClass,
}

/// Private-network attachment of a load-balanced origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateOriginBinding {
    pub id: String,
    /// Load balancer handle from the origin's exports.
    pub target: String,
    pub port: u16,
}

/// Inbound rule admitting the edge network to a load-balanced origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    pub protocol: String,
    pub port: u16,
    /// Published address range of the edge network.
    pub source_prefix_list: String,
}

/// Path rewrite applied before forwarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RewriteRule {
    StripPrefix { prefix: String },
}

impl RewriteRule {
    /// Rewrite `path`. The result always starts with `/`.
    #[must_use]
    pub fn apply(&self, path: &str) -> String {
        match self {
            Self::StripPrefix { prefix } => {
                let rest = path.strip_prefix(prefix.as_str()).unwrap_or(path);
                if rest.starts_with('/') {
                    rest.to_owned()
                } else {
                    format!("/{rest}")
                }
            }
        }
    }
}

/// One row of a route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTableEntry {
    /// `path_prefix + "*"`.
    pub path_pattern: String,
    pub target_origin_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<RewriteRule>,
}

impl RouteTableEntry {
    /// Whether `path` falls under this entry's pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let prefix = self
            .path_pattern
            .strip_suffix('*')
            .unwrap_or(&self.path_pattern);
        path.starts_with(prefix)
    }
}

/// Result of routing one request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub origin_id: &'a str,
    pub forwarded_path: String,
}

/// Resolved routing for one entrypoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteTable {
    pub entrypoint: String,
    pub default_origin: String,
    /// Origins in declaration order.
    pub origins: Vec<Origin>,
    /// At most one credential per signed class.
    pub credentials: Vec<OriginAccessCredential>,
    /// Non-default entries in declaration order, then the default entry.
    pub entries: Vec<RouteTableEntry>,
}

impl RouteTable {
    #[must_use]
    pub fn origin(&self, id: &str) -> Option<&Origin> {
        self.origins.iter().find(|o| o.id == id)
    }

    /// Route a request path: the first non-default entry whose prefix the
    /// path starts with wins, otherwise the default origin takes the path
    /// unchanged.
    #[must_use]
    pub fn route(&self, path: &str) -> RouteMatch<'_> {
        // The default entry is the only one without a rewrite.
        self.entries
            .iter()
            .filter_map(|entry| entry.rewrite.as_ref().map(|rule| (entry, rule)))
            .find(|(entry, _)| entry.matches(path))
            .map_or_else(
                || RouteMatch {
                    origin_id: &self.default_origin,
                    forwarded_path: path.to_owned(),
                },
                |(entry, rule)| RouteMatch {
                    origin_id: &entry.target_origin_id,
                    forwarded_path: rule.apply(path),
                },
            )
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn strip(prefix: &str) -> RewriteRule {
        RewriteRule::StripPrefix {
            prefix: prefix.to_owned(),
        }
    }

    #[test]
    fn strip_prefix_keeps_leading_slash() {
        assert_eq!(strip("/api").apply("/api/v1/users"), "/v1/users");
        assert_eq!(strip("/api").apply("/api/"), "/");
    }

    #[test]
    fn strip_prefix_maps_empty_result_to_root() {
        assert_eq!(strip("/api").apply("/api"), "/");
    }

    #[test]
    fn entry_pattern_matches_by_prefix() {
        let entry = RouteTableEntry {
            path_pattern: "/api/*".to_owned(),
            target_origin_id: "api".to_owned(),
            rewrite: Some(strip("/api")),
        };
        assert!(entry.matches("/api/v1"));
        assert!(!entry.matches("/apiary"));
        assert!(!entry.matches("/index.html"));
    }
}
