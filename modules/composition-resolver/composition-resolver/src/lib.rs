//! Composition Resolver Module
//!
//! Walks a stack graph once and derives everything the provisioning layer
//! needs: physical identifiers, least-privilege grants, per-entrypoint route
//! tables and provider schedules. The pass is pure and synchronous.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;

pub use config::{CompositionResolverConfig, ConfigError, EdgeNetworkConfig};
pub use domain::{CompositionResolverLocalClient, Service};
