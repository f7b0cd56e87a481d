//! Error types for identifier derivation.

use thiserror::Error;

/// Errors raised while deriving a physical identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    /// The logical name contains a character outside `[A-Za-z0-9 _-]`.
    #[error("name '{name}' contains disallowed character {character:?}")]
    DisallowedCharacter { name: String, character: char },

    /// The logical name has no letters or digits left after normalization.
    #[error("name '{name}' is empty after normalization")]
    Empty { name: String },

    /// The stack id is empty.
    #[error("stack id must not be empty")]
    EmptyStackId,
}
