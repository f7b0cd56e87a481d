//! Domain layer for the composition resolver.

pub mod local_client;
pub mod origins;
pub mod permissions;
pub mod routing;
pub mod schedule;
pub mod service;

pub use local_client::CompositionResolverLocalClient;
pub use service::Service;
