//! Local (in-process) client for the composition resolver.

use std::sync::Arc;

use composition_resolver_sdk::{
    CompositionResolverClient, CompositionResolverError, ResolutionResult, Stack,
};

use super::Service;

/// Local client wrapping the service.
#[derive(Debug, Clone)]
pub struct CompositionResolverLocalClient {
    svc: Arc<Service>,
}

impl CompositionResolverLocalClient {
    #[must_use]
    pub fn new(svc: Arc<Service>) -> Self {
        Self { svc }
    }
}

fn log_failure(op: &str, e: CompositionResolverError) -> CompositionResolverError {
    tracing::error!(operation = op, subject = e.subject(), error = ?e, "composition_resolver call failed");
    e
}

impl CompositionResolverClient for CompositionResolverLocalClient {
    fn resolve(&self, stack: &Stack) -> Result<ResolutionResult, CompositionResolverError> {
        self.svc
            .resolve(stack)
            .map_err(|e| log_failure("resolve", e))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use composition_resolver_sdk::{Resource, ResourceSpec};
    use tracing_test::traced_test;

    fn stack_with(name: &str) -> Stack {
        Stack {
            name: "demo".to_owned(),
            stack_id: "s1".to_owned(),
            resources: vec![Resource {
                name: name.to_owned(),
                tags: BTreeMap::new(),
                exports: BTreeMap::new(),
                spec: ResourceSpec::Compute {
                    schedules: Vec::new(),
                },
            }],
        }
    }

    #[test]
    #[traced_test]
    fn failures_are_logged_and_returned() {
        let client = CompositionResolverLocalClient::new(Arc::new(Service::default()));
        let err = client.resolve(&stack_with("bad.name")).unwrap_err();

        assert!(matches!(err, CompositionResolverError::InvalidName { .. }));
        assert!(logs_contain("composition_resolver call failed"));
        assert!(logs_contain("operation=\"resolve\""));
    }

    #[test]
    #[traced_test]
    fn success_logs_a_summary() {
        let client = CompositionResolverLocalClient::new(Arc::new(Service::default()));
        let result = client.resolve(&stack_with("api")).unwrap();

        assert_eq!(result.contexts["api"].physical_id.as_str(), "s1-api");
        assert!(logs_contain("Stack resolved"));
        assert!(!logs_contain("call failed"));
    }

    #[test]
    fn client_is_usable_as_trait_object() {
        let client: Arc<dyn CompositionResolverClient> =
            Arc::new(CompositionResolverLocalClient::new(Arc::new(Service::default())));
        assert!(client.resolve(&stack_with("api")).is_ok());
    }
}
