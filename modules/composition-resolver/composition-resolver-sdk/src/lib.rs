#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Composition Resolver SDK
//!
//! This crate provides the public contract of the `composition_resolver` module:
//!
//! - [`CompositionResolverClient`] - Public API trait for consumers
//! - [`Stack`], [`Resource`], [`ResourceSpec`] - Stack graph handed over by the planner
//! - [`capability_keys`] - Cross-resolver discovery vocabulary
//! - [`ResolutionResult`], [`Context`], [`AccessGrant`], [`RouteTable`] - Resolution output
//! - [`CompositionResolverError`] - Structural error taxonomy
//!
//! ## Usage
//!
//! ```ignore
//! use composition_resolver_sdk::CompositionResolverClient;
//!
//! let result = resolver.resolve(&stack)?;
//! for (name, ctx) in &result.contexts {
//!     provisioner.apply(name, ctx)?;
//! }
//! ```

pub mod api;
pub mod capability;
pub mod error;
pub mod models;
pub mod resolution;

// Re-export main types at crate root
pub use api::CompositionResolverClient;
pub use capability::{OriginClass, capability_keys};
pub use error::CompositionResolverError;
pub use models::{
    Consumer, Intent, Resource, ResourceSpec, RouteDecl, RouteTarget, ScheduleSpec, Stack,
    StorageKind,
};
pub use resolution::{
    AccessGrant, AccessStrategy, Context, ContextDetails, FirewallRule, Origin,
    OriginAccessCredential, PrivateOriginBinding, ResolutionResult, ResolvedSchedule, RewriteRule,
    RouteMatch, RouteTable, RouteTableEntry,
};
