#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Naming contract between the provisioning pass and deployed services.
//!
//! The same table is asserted by the composition resolver's tests; a change
//! here that is not mirrored there renames live resources.

use std::collections::BTreeMap;

use serde::Deserialize;
use stack_naming::{ProcessEnv, STACK_ID_ENV, normalize, resolve_physical_name};

#[derive(Deserialize)]
struct GoldenVectors {
    valid: Vec<ValidVector>,
    invalid: Vec<InvalidVector>,
}

#[derive(Deserialize)]
struct ValidVector {
    stack_id: String,
    logical_name: String,
    physical_id: String,
}

#[derive(Deserialize)]
struct InvalidVector {
    stack_id: String,
    logical_name: String,
}

fn vectors() -> GoldenVectors {
    serde_json::from_str(include_str!("fixtures/golden_vectors.json"))
        .expect("golden vectors parse")
}

#[test]
fn normalize_matches_golden_vectors() {
    for v in vectors().valid {
        let id = normalize(&v.stack_id, &v.logical_name)
            .unwrap_or_else(|e| panic!("{:?} rejected: {e}", v.logical_name));
        assert_eq!(id.as_str(), v.physical_id, "vector {:?}", v.logical_name);
    }
}

#[test]
fn normalize_rejects_invalid_vectors() {
    for v in vectors().invalid {
        assert!(
            normalize(&v.stack_id, &v.logical_name).is_err(),
            "expected rejection of ({:?}, {:?})",
            v.stack_id,
            v.logical_name
        );
    }
}

#[test]
fn runtime_lookup_agrees_with_normalize() {
    for v in vectors().valid {
        let env = BTreeMap::from([(STACK_ID_ENV.to_owned(), v.stack_id.clone())]);
        let name = resolve_physical_name(&env, &v.logical_name, "BUCKET_NAME").unwrap();
        assert_eq!(name, v.physical_id, "vector {:?}", v.logical_name);
    }
}

#[test]
fn runtime_lookup_reads_process_environment() {
    temp_env::with_vars(
        [
            (STACK_ID_ENV, Some("acme-dev-7f3")),
            ("USER_UPLOADS_BUCKET_NAME", None),
        ],
        || {
            let name = resolve_physical_name(&ProcessEnv, "User Uploads", "BUCKET_NAME").unwrap();
            assert_eq!(name, "acme-dev-7f3-user-uploads");
        },
    );
}

#[test]
fn injected_process_variable_overrides_derivation() {
    temp_env::with_vars(
        [
            (STACK_ID_ENV, Some("acme-dev-7f3")),
            ("FILES_BUCKET_NAME", Some("imported-bucket")),
        ],
        || {
            let name = resolve_physical_name(&ProcessEnv, "files", "BUCKET_NAME").unwrap();
            assert_eq!(name, "imported-bucket");
        },
    );
}
