//! Error types for the composition resolver.

use thiserror::Error;

/// Structural errors found while resolving a stack.
///
/// None of these are transient: the stack itself is wrong and resolving it
/// again yields the same error. Every variant names the resource, entrypoint
/// or schedule that triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionResolverError {
    /// A logical name (or the stack id) cannot be normalized.
    #[error("invalid name '{name}' on '{owner}': {reason}")]
    InvalidName {
        owner: String,
        name: String,
        reason: String,
    },

    /// Two distinct logical names normalize to the same physical id.
    #[error("'{first}' and '{second}' both normalize to '{physical_id}'")]
    NameCollision {
        first: String,
        second: String,
        physical_id: String,
    },

    /// A cron expression does not have exactly five fields.
    #[error("schedule '{schedule}': expected 5 cron fields, got {fields} in '{expression}'")]
    InvalidCronFormat {
        schedule: String,
        expression: String,
        fields: usize,
    },

    /// A consumer declared an intent outside `read`/`write`/`delete`.
    #[error("resource '{resource}': consumer '{consumer}' declares unknown intent '{intent}'")]
    UnknownIntent {
        resource: String,
        consumer: String,
        intent: String,
    },

    /// An entrypoint has no default origin, or more than one.
    #[error("entrypoint '{entrypoint}': expected exactly one default origin, found {found}")]
    MissingDefaultOrigin { entrypoint: String, found: usize },

    /// An origin exports keys of more than one capability class.
    #[error("entrypoint '{entrypoint}': origin '{origin}' matches several classes ({classes})")]
    AmbiguousOrigin {
        entrypoint: String,
        origin: String,
        classes: String,
    },

    /// A path prefix is empty or does not start with `/`.
    #[error("entrypoint '{entrypoint}': path prefix '{path_prefix}' must start with '/'")]
    InvalidPathPrefix {
        entrypoint: String,
        path_prefix: String,
    },

    /// A route names a resource that is not part of the stack.
    #[error("entrypoint '{entrypoint}': route target '{target}' is not a resource of this stack")]
    UnknownRouteTarget { entrypoint: String, target: String },

    /// Two routes of one entrypoint declare the same path prefix.
    #[error("entrypoint '{entrypoint}': path prefix '{path_prefix}' is declared more than once")]
    DuplicatePathPrefix {
        entrypoint: String,
        path_prefix: String,
    },

    /// Two routes of one entrypoint reach the same origin id.
    #[error("entrypoint '{entrypoint}': origin '{origin}' is routed more than once")]
    DuplicateOrigin { entrypoint: String, origin: String },
}

impl CompositionResolverError {
    /// Name of the resource, entrypoint or schedule that triggered the error.
    #[must_use]
    pub fn subject(&self) -> &str {
        match self {
            Self::InvalidName { owner, .. } => owner,
            Self::NameCollision { second, .. } => second,
            Self::InvalidCronFormat { schedule, .. } => schedule,
            Self::UnknownIntent { resource, .. } => resource,
            Self::MissingDefaultOrigin { entrypoint, .. }
            | Self::AmbiguousOrigin { entrypoint, .. }
            | Self::InvalidPathPrefix { entrypoint, .. }
            | Self::UnknownRouteTarget { entrypoint, .. }
            | Self::DuplicatePathPrefix { entrypoint, .. }
            | Self::DuplicateOrigin { entrypoint, .. } => entrypoint,
        }
    }
}
