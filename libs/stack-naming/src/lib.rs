#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Stack naming
//!
//! Physical identifiers for stack resources are derived, never stored. The
//! provisioning pass and the runtime access layer call the same pure function
//! with the same `(stack_id, logical_name)` pair and must land on the same
//! identifier:
//!
//! - [`normalize`] - `stack_id + "-" + kebab(logical_name)`
//! - [`normalize_name`] - the kebab-case half on its own
//! - [`runtime`] - environment lookup used by deployed services
//!
//! ## Usage
//!
//! ```
//! use stack_naming::normalize;
//!
//! let id = normalize("acme-dev-7f3", "User Uploads").unwrap();
//! assert_eq!(id.as_str(), "acme-dev-7f3-user-uploads");
//! ```

pub mod error;
pub mod normalize;
pub mod runtime;

pub use error::NamingError;
pub use normalize::{PhysicalId, normalize, normalize_name};
pub use runtime::{
    EnvSource, LOCAL_STACK_ID, ProcessEnv, STACK_ID_ENV, env_key, resolve_physical_name,
};
