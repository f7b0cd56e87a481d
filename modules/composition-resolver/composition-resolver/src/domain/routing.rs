//! Route table construction for one entrypoint.

use std::collections::{BTreeMap, BTreeSet};

use composition_resolver_sdk::{
    CompositionResolverError, Origin, OriginClass, RewriteRule, RouteDecl, RouteTable,
    RouteTableEntry, RouteTarget, Stack,
};
use stack_naming::{NamingError, PhysicalId};
use thiserror::Error;
use tracing::debug;

use super::origins::{AccessPlanner, ClassifyError, classify, origin_domain};
use crate::config::EdgeNetworkConfig;

/// Path prefix of the default origin.
pub const DEFAULT_PREFIX: &str = "/";

/// Routing errors of one entrypoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("expected exactly one default origin, found {found}")]
    MissingDefault { found: usize },

    #[error("origin '{origin}' {source}")]
    Ambiguous {
        origin: String,
        source: ClassifyError,
    },

    #[error("path prefix '{path_prefix}' must start with '/'")]
    InvalidPathPrefix { path_prefix: String },

    #[error("origin '{origin}': {source}")]
    InvalidOriginName {
        origin: String,
        source: NamingError,
    },

    #[error("route target '{target}' is not a resource of this stack")]
    UnknownTarget { target: String },

    #[error("path prefix '{path_prefix}' is declared more than once")]
    DuplicatePathPrefix { path_prefix: String },

    #[error("origin '{origin}' is routed more than once")]
    DuplicateOrigin { origin: String },
}

impl RoutingError {
    /// Attach the entrypoint that failed.
    #[must_use]
    pub fn for_entrypoint(self, entrypoint: &str) -> CompositionResolverError {
        let entrypoint = entrypoint.to_owned();
        match self {
            Self::MissingDefault { found } => {
                CompositionResolverError::MissingDefaultOrigin { entrypoint, found }
            }
            Self::Ambiguous { origin, source } => CompositionResolverError::AmbiguousOrigin {
                entrypoint,
                origin,
                classes: source.class_list(),
            },
            Self::InvalidPathPrefix { path_prefix } => {
                CompositionResolverError::InvalidPathPrefix {
                    entrypoint,
                    path_prefix,
                }
            }
            Self::InvalidOriginName { origin, source } => CompositionResolverError::InvalidName {
                owner: entrypoint,
                name: origin,
                reason: source.to_string(),
            },
            Self::UnknownTarget { target } => {
                CompositionResolverError::UnknownRouteTarget { entrypoint, target }
            }
            Self::DuplicatePathPrefix { path_prefix } => {
                CompositionResolverError::DuplicatePathPrefix {
                    entrypoint,
                    path_prefix,
                }
            }
            Self::DuplicateOrigin { origin } => {
                CompositionResolverError::DuplicateOrigin { entrypoint, origin }
            }
        }
    }
}

/// What a route table is built against.
#[derive(Debug, Clone, Copy)]
pub struct RoutingScope<'a> {
    pub stack: &'a Stack,
    /// Physical id of every resource of the stack, by logical name.
    pub physical_ids: &'a BTreeMap<String, PhysicalId>,
    pub edge: &'a EdgeNetworkConfig,
}

/// Build the route table of entrypoint `entrypoint`.
///
/// Non-default entries keep declaration order and strip their prefix; the
/// default entry `/*` comes last and forwards paths unchanged.
///
/// # Errors
///
/// [`RoutingError`] for the first structural problem, checked in this order:
/// default count, malformed prefixes, duplicate prefixes and origins, unknown
/// targets, ambiguous classes.
#[tracing::instrument(skip_all, fields(entrypoint = %entrypoint))]
pub fn build_route_table(
    scope: RoutingScope<'_>,
    entrypoint: &str,
    entrypoint_id: &PhysicalId,
    routes: &[RouteDecl],
) -> Result<RouteTable, RoutingError> {
    let default_origin = select_default(routes)?;
    check_prefixes(routes)?;
    check_unique(routes)?;

    let mut planner = AccessPlanner::new(entrypoint_id, scope.edge);
    let mut origins = Vec::with_capacity(routes.len());
    for route in routes {
        origins.push(build_origin(scope, route, &mut planner)?);
    }

    let mut entries: Vec<RouteTableEntry> = origins
        .iter()
        .filter(|origin| !origin.is_default())
        .map(|origin| RouteTableEntry {
            path_pattern: format!("{}*", origin.path_prefix),
            target_origin_id: origin.id.clone(),
            rewrite: Some(RewriteRule::StripPrefix {
                prefix: origin.base_path.clone(),
            }),
        })
        .collect();
    entries.push(RouteTableEntry {
        path_pattern: format!("{DEFAULT_PREFIX}*"),
        target_origin_id: default_origin.clone(),
        rewrite: None,
    });

    let count = |class: OriginClass| origins.iter().filter(|o| o.class == class).count();
    debug!(
        default_origin = %default_origin,
        object_storage = count(OriginClass::ObjectStorage),
        function = count(OriginClass::Function),
        load_balanced = count(OriginClass::LoadBalanced),
        edge_fetched = count(OriginClass::Other),
        "Route table built"
    );

    Ok(RouteTable {
        entrypoint: entrypoint.to_owned(),
        default_origin,
        origins,
        credentials: planner.into_credentials(),
        entries,
    })
}

fn select_default(routes: &[RouteDecl]) -> Result<String, RoutingError> {
    let defaults: Vec<&RouteDecl> = routes
        .iter()
        .filter(|route| route.path_prefix == DEFAULT_PREFIX)
        .collect();
    match defaults.as_slice() {
        [default] => Ok(default.target.origin_id().to_owned()),
        other => Err(RoutingError::MissingDefault { found: other.len() }),
    }
}

fn check_prefixes(routes: &[RouteDecl]) -> Result<(), RoutingError> {
    match routes
        .iter()
        .find(|route| !route.path_prefix.starts_with(DEFAULT_PREFIX))
    {
        Some(route) => Err(RoutingError::InvalidPathPrefix {
            path_prefix: route.path_prefix.clone(),
        }),
        None => Ok(()),
    }
}

fn check_unique(routes: &[RouteDecl]) -> Result<(), RoutingError> {
    let mut prefixes = BTreeSet::new();
    let mut origins = BTreeSet::new();
    for route in routes {
        if !prefixes.insert(route.path_prefix.as_str()) {
            return Err(RoutingError::DuplicatePathPrefix {
                path_prefix: route.path_prefix.clone(),
            });
        }
        if !origins.insert(route.target.origin_id()) {
            return Err(RoutingError::DuplicateOrigin {
                origin: route.target.origin_id().to_owned(),
            });
        }
    }
    Ok(())
}

fn build_origin(
    scope: RoutingScope<'_>,
    route: &RouteDecl,
    planner: &mut AccessPlanner<'_>,
) -> Result<Origin, RoutingError> {
    let (capability_keys, fallback_domain) = match &route.target {
        RouteTarget::Resource(name) => {
            let resource = scope
                .stack
                .resource(name)
                .ok_or_else(|| RoutingError::UnknownTarget {
                    target: name.clone(),
                })?;
            let physical_id = scope
                .physical_ids
                .get(name)
                .map(|id| id.as_str().to_owned())
                .unwrap_or_default();
            (resource.exports.clone(), physical_id)
        }
        RouteTarget::External { domain_name, .. } => (BTreeMap::new(), domain_name.clone()),
    };

    let id = route.target.origin_id().to_owned();
    let class = classify(&capability_keys).map_err(|source| RoutingError::Ambiguous {
        origin: id.clone(),
        source,
    })?;
    let access = planner
        .strategy(&id, class, &capability_keys)
        .map_err(|source| RoutingError::InvalidOriginName {
            origin: id.clone(),
            source,
        })?;
    let base_path = if route.path_prefix == DEFAULT_PREFIX {
        String::new()
    } else {
        route
            .path_prefix
            .strip_suffix('/')
            .unwrap_or(&route.path_prefix)
            .to_owned()
    };

    Ok(Origin {
        domain_name: origin_domain(class, &capability_keys, &fallback_domain),
        id,
        path_prefix: route.path_prefix.clone(),
        base_path,
        capability_keys,
        class,
        access,
    })
}
