//! Runtime access to provisioned resources.
//!
//! Deployed services do not receive the resolution result. They get the
//! injected environment when the provisioning layer set it, and otherwise
//! rebuild the physical identifier from the stack id with [`normalize`].
//! Both paths must agree with what the resolver produced.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use heck::ToShoutySnakeCase;

use crate::error::NamingError;
use crate::normalize::{PhysicalId, normalize, normalize_name};

/// Environment variable holding the stack id of the running deployment.
pub const STACK_ID_ENV: &str = "STACK_ID";

/// Stack id assumed when a service runs outside any deployment.
pub const LOCAL_STACK_ID: &str = "local-dev";

/// Read-only view over environment variables.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl<S: BuildHasher> EnvSource for HashMap<String, String, S> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Name of the variable that carries the physical id of `logical_name`.
///
/// `env_key("files", "BUCKET_NAME")` is `FILES_BUCKET_NAME`.
///
/// # Errors
///
/// Any error of [`normalize_name`].
pub fn env_key(logical_name: &str, suffix: &str) -> Result<String, NamingError> {
    let name = normalize_name(logical_name)?.to_shouty_snake_case();
    Ok(format!("{name}_{suffix}"))
}

/// Resolve the physical name of `logical_name` from the running environment.
///
/// Order:
/// 1. the injected `env_key(logical_name, suffix)` variable, if non-empty
/// 2. `normalize(STACK_ID, logical_name)`, if `STACK_ID` is non-empty
/// 3. `normalize(LOCAL_STACK_ID, logical_name)`
///
/// # Errors
///
/// Any error of [`normalize`].
pub fn resolve_physical_name<E: EnvSource + ?Sized>(
    env: &E,
    logical_name: &str,
    suffix: &str,
) -> Result<String, NamingError> {
    let key = env_key(logical_name, suffix)?;
    if let Some(injected) = non_empty(env.var(&key)) {
        return Ok(injected);
    }

    let stack_id =
        non_empty(env.var(STACK_ID_ENV)).unwrap_or_else(|| LOCAL_STACK_ID.to_owned());
    normalize(&stack_id, logical_name).map(PhysicalId::into_string)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
