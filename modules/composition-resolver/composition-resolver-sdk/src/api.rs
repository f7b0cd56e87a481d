//! Public API trait for the composition resolver.

use crate::error::CompositionResolverError;
use crate::models::Stack;
use crate::resolution::ResolutionResult;

/// Public API trait for the composition resolver.
///
/// Resolution is a pure, synchronous pass over the stack: no I/O, no state
/// kept between calls. Implementations are shared across threads.
///
/// ```ignore
/// let result = resolver.resolve(&stack)?;
/// let site = &result.route_tables["site"];
/// ```
pub trait CompositionResolverClient: Send + Sync {
    /// Resolve a stack into per-resource contexts, grants, route tables and
    /// provider schedules.
    ///
    /// # Errors
    ///
    /// The first structural error found; no partial result is returned.
    fn resolve(&self, stack: &Stack) -> Result<ResolutionResult, CompositionResolverError>;
}
