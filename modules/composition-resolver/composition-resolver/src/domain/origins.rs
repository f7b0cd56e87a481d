//! Origin classification and access strategies.
//!
//! An origin's class comes only from the capability keys it exports. The
//! class decides how the edge is allowed to reach it: signed requests with a
//! credential shared by the whole class, or a private network binding with an
//! inbound firewall rule, or nothing at all.

use std::collections::BTreeMap;

use composition_resolver_sdk::{
    AccessStrategy, FirewallRule, OriginAccessCredential, OriginClass, PrivateOriginBinding,
    capability_keys,
};
use stack_naming::{NamingError, PhysicalId, normalize_name};
use thiserror::Error;

use crate::config::EdgeNetworkConfig;

/// The exported keys select more than one class.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("exports keys of several classes: {}", join_classes(.classes))]
pub struct ClassifyError {
    pub classes: Vec<OriginClass>,
}

impl ClassifyError {
    /// Matched classes as a comma-separated list.
    #[must_use]
    pub fn class_list(&self) -> String {
        join_classes(&self.classes)
    }
}

fn join_classes(classes: &[OriginClass]) -> String {
    classes
        .iter()
        .map(|class| class.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Classify an origin by its capability keys.
///
/// # Errors
///
/// [`ClassifyError`] if keys of several classes are present.
pub fn classify(keys: &BTreeMap<String, String>) -> Result<OriginClass, ClassifyError> {
    let matched: Vec<OriginClass> = OriginClass::KEYED
        .iter()
        .filter(|(_, key)| keys.contains_key(*key))
        .map(|(class, _)| *class)
        .collect();

    match matched.as_slice() {
        [] => Ok(OriginClass::Other),
        [class] => Ok(*class),
        _ => Err(ClassifyError { classes: matched }),
    }
}

/// Domain the edge connects to: the `domain_name` export, else the handle of
/// the classifying key, else `fallback`.
#[must_use]
pub fn origin_domain(class: OriginClass, keys: &BTreeMap<String, String>, fallback: &str) -> String {
    keys.get(capability_keys::DOMAIN_NAME)
        .or_else(|| class.capability_key().and_then(|key| keys.get(key)))
        .map_or_else(|| fallback.to_owned(), Clone::clone)
}

fn credential_suffix(class: OriginClass) -> Option<&'static str> {
    match class {
        OriginClass::ObjectStorage => Some("s3-oac"),
        OriginClass::Function => Some("lambda-oac"),
        OriginClass::LoadBalanced | OriginClass::Other => None,
    }
}

/// Picks one access strategy per origin of an entrypoint.
///
/// Signed credentials are created on first use and shared by every later
/// origin of the same class.
#[derive(Debug)]
pub struct AccessPlanner<'a> {
    entrypoint_id: &'a PhysicalId,
    edge: &'a EdgeNetworkConfig,
    credentials: BTreeMap<OriginClass, OriginAccessCredential>,
}

impl<'a> AccessPlanner<'a> {
    #[must_use]
    pub fn new(entrypoint_id: &'a PhysicalId, edge: &'a EdgeNetworkConfig) -> Self {
        Self {
            entrypoint_id,
            edge,
            credentials: BTreeMap::new(),
        }
    }

    /// Strategy for origin `origin_id` of class `class`.
    ///
    /// # Errors
    ///
    /// [`NamingError`] if a load-balanced origin id cannot be normalized into
    /// its binding id.
    pub fn strategy(
        &mut self,
        origin_id: &str,
        class: OriginClass,
        keys: &BTreeMap<String, String>,
    ) -> Result<AccessStrategy, NamingError> {
        if let Some(suffix) = credential_suffix(class) {
            let entrypoint_id = self.entrypoint_id;
            let credential = self
                .credentials
                .entry(class)
                .or_insert_with(|| OriginAccessCredential {
                    id: format!("{entrypoint_id}-{suffix}"),
                    class,
                });
            return Ok(AccessStrategy::SignedOriginAccess {
                credential_id: credential.id.clone(),
            });
        }

        if class == OriginClass::LoadBalanced {
            let origin = normalize_name(origin_id)?;
            return Ok(AccessStrategy::PrivateNetwork {
                binding: PrivateOriginBinding {
                    id: format!("{}-{origin}-vpc-origin", self.entrypoint_id),
                    target: keys
                        .get(capability_keys::LOAD_BALANCER)
                        .cloned()
                        .unwrap_or_default(),
                    port: self.edge.origin_port,
                },
                firewall_rule: FirewallRule {
                    protocol: self.edge.protocol.clone(),
                    port: self.edge.origin_port,
                    source_prefix_list: self.edge.origin_facing_prefix_list.clone(),
                },
            });
        }

        Ok(AccessStrategy::Direct)
    }

    /// Credentials created so far, one per signed class.
    #[must_use]
    pub fn into_credentials(self) -> Vec<OriginAccessCredential> {
        self.credentials.into_values().collect()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn keys(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn classification_is_by_key_presence() {
        assert_eq!(
            classify(&keys(&[(capability_keys::OBJECT_STORAGE, "arn:aws:s3:::b")])).unwrap(),
            OriginClass::ObjectStorage
        );
        assert_eq!(
            classify(&keys(&[(capability_keys::FUNCTION, "fn")])).unwrap(),
            OriginClass::Function
        );
        assert_eq!(
            classify(&keys(&[(capability_keys::LOAD_BALANCER, "lb")])).unwrap(),
            OriginClass::LoadBalanced
        );
        assert_eq!(
            classify(&keys(&[(capability_keys::DOMAIN_NAME, "x.example.com")])).unwrap(),
            OriginClass::Other
        );
        assert_eq!(classify(&keys(&[])).unwrap(), OriginClass::Other);
    }

    #[test]
    fn overlapping_classes_are_ambiguous() {
        let err = classify(&keys(&[
            (capability_keys::LOAD_BALANCER, "lb"),
            (capability_keys::OBJECT_STORAGE, "b"),
        ]))
        .unwrap_err();
        assert_eq!(
            err.classes,
            vec![OriginClass::ObjectStorage, OriginClass::LoadBalanced]
        );
        assert_eq!(err.class_list(), "object_storage, load_balanced");
    }

    #[test]
    fn domain_prefers_explicit_export() {
        let k = keys(&[
            (capability_keys::OBJECT_STORAGE, "arn:aws:s3:::b"),
            (capability_keys::DOMAIN_NAME, "b.s3.amazonaws.com"),
        ]);
        assert_eq!(
            origin_domain(OriginClass::ObjectStorage, &k, "fallback"),
            "b.s3.amazonaws.com"
        );

        let k = keys(&[(capability_keys::FUNCTION, "fn-handle")]);
        assert_eq!(origin_domain(OriginClass::Function, &k, "fallback"), "fn-handle");
        assert_eq!(origin_domain(OriginClass::Other, &keys(&[]), "fallback"), "fallback");
    }

    #[test]
    fn signed_credentials_are_shared_per_class() {
        let id = stack_naming::normalize("s1", "site").unwrap();
        let edge = EdgeNetworkConfig::default();
        let mut planner = AccessPlanner::new(&id, &edge);

        let a = planner.strategy("a", OriginClass::ObjectStorage, &keys(&[])).unwrap();
        let b = planner.strategy("b", OriginClass::ObjectStorage, &keys(&[])).unwrap();
        let f = planner.strategy("f", OriginClass::Function, &keys(&[])).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a,
            AccessStrategy::SignedOriginAccess {
                credential_id: "s1-site-s3-oac".to_owned()
            }
        );
        assert_eq!(
            f,
            AccessStrategy::SignedOriginAccess {
                credential_id: "s1-site-lambda-oac".to_owned()
            }
        );

        let credentials = planner.into_credentials();
        assert_eq!(credentials.len(), 2);
        assert_eq!(credentials[0].class, OriginClass::ObjectStorage);
        assert_eq!(credentials[1].class, OriginClass::Function);
    }

    #[test]
    fn load_balanced_origins_get_a_private_binding() {
        let id = stack_naming::normalize("s1", "site").unwrap();
        let edge = EdgeNetworkConfig::default();
        let mut planner = AccessPlanner::new(&id, &edge);

        let strategy = planner
            .strategy(
                "jobs",
                OriginClass::LoadBalanced,
                &keys(&[(capability_keys::LOAD_BALANCER, "arn:lb")]),
            )
            .unwrap();
        match strategy {
            AccessStrategy::PrivateNetwork {
                binding,
                firewall_rule,
            } => {
                assert_eq!(binding.id, "s1-site-jobs-vpc-origin");
                assert_eq!(binding.target, "arn:lb");
                assert_eq!(binding.port, 80);
                assert_eq!(firewall_rule.protocol, "tcp");
                assert_eq!(firewall_rule.source_prefix_list, edge.origin_facing_prefix_list);
            }
            other => panic!("Expected private network, got: {other:?}"),
        }
        assert!(planner.into_credentials().is_empty());
    }

    #[test]
    fn other_origins_are_fetched_directly() {
        let id = stack_naming::normalize("s1", "site").unwrap();
        let edge = EdgeNetworkConfig::default();
        let mut planner = AccessPlanner::new(&id, &edge);
        assert_eq!(
            planner.strategy("docs", OriginClass::Other, &keys(&[])).unwrap(),
            AccessStrategy::Direct
        );
    }

    #[test]
    fn binding_id_uses_the_normalized_origin_name() {
        let id = stack_naming::normalize("s1", "site").unwrap();
        let edge = EdgeNetworkConfig::default();
        let mut planner = AccessPlanner::new(&id, &edge);
        let lb = keys(&[(capability_keys::LOAD_BALANCER, "arn:lb")]);

        for (origin, expected) in [
            ("Job Runner", "s1-site-job-runner-vpc-origin"),
            ("jobRunner", "s1-site-job-runner-vpc-origin"),
        ] {
            match planner.strategy(origin, OriginClass::LoadBalanced, &lb).unwrap() {
                AccessStrategy::PrivateNetwork { binding, .. } => assert_eq!(binding.id, expected),
                other => panic!("Expected private network, got: {other:?}"),
            }
        }

        let err = planner
            .strategy("jobs.runner", OriginClass::LoadBalanced, &lb)
            .unwrap_err();
        assert!(matches!(err, NamingError::DisallowedCharacter { character: '.', .. }));
    }
}
