//! Identifier normalization.
//!
//! The rule is a cross-process contract: changing it renames every deployed
//! resource. The golden vectors in `tests/fixtures/golden_vectors.json` pin it.

use std::fmt;

use heck::ToKebabCase;
use serde::{Deserialize, Serialize};

use crate::error::NamingError;

/// A provider-facing identifier: `stack_id + "-" + normalized logical name`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhysicalId(String);

impl PhysicalId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PhysicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PhysicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-')
}

/// Case-fold a logical name into its lowercase hyphen-separated form.
///
/// Spaces, underscores and camel-case boundaries become `-`; runs of
/// separators collapse and leading/trailing separators are dropped.
///
/// # Errors
///
/// - [`NamingError::DisallowedCharacter`] for anything outside `[A-Za-z0-9 _-]`
/// - [`NamingError::Empty`] if nothing is left after normalization
pub fn normalize_name(logical_name: &str) -> Result<String, NamingError> {
    if let Some(character) = logical_name.chars().find(|c| !is_allowed(*c)) {
        return Err(NamingError::DisallowedCharacter {
            name: logical_name.to_owned(),
            character,
        });
    }

    let normalized = logical_name.to_kebab_case();
    if normalized.is_empty() {
        return Err(NamingError::Empty {
            name: logical_name.to_owned(),
        });
    }

    Ok(normalized)
}

/// Derive the physical identifier of `logical_name` within `stack_id`.
///
/// `stack_id` is opaque and used verbatim.
///
/// # Errors
///
/// - [`NamingError::EmptyStackId`] if `stack_id` is empty
/// - any error of [`normalize_name`]
pub fn normalize(stack_id: &str, logical_name: &str) -> Result<PhysicalId, NamingError> {
    if stack_id.is_empty() {
        return Err(NamingError::EmptyStackId);
    }
    let name = normalize_name(logical_name)?;
    Ok(PhysicalId(format!("{stack_id}-{name}")))
}
