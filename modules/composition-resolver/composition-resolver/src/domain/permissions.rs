//! Intent to provider action mapping.

use std::collections::{BTreeMap, BTreeSet};

use composition_resolver_sdk::models::ParseIntentError;
use composition_resolver_sdk::{AccessGrant, Consumer, Intent, StorageKind};
use stack_naming::PhysicalId;
use thiserror::Error;

/// Provider actions granted for each intent on one kind of storage.
pub trait ActionTable: Send + Sync {
    /// Actions implied by `intent`. Never empty.
    fn actions(&self, intent: Intent) -> &'static [&'static str];
}

/// Object storage buckets.
#[derive(Debug, Clone, Copy, Default)]
pub struct BucketActions;

impl ActionTable for BucketActions {
    fn actions(&self, intent: Intent) -> &'static [&'static str] {
        match intent {
            Intent::Read => &["s3:GetObject", "s3:ListBucket"],
            Intent::Write => &["s3:PutObject"],
            Intent::Delete => &["s3:DeleteObject"],
        }
    }
}

/// Key/value tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyValueActions;

impl ActionTable for KeyValueActions {
    fn actions(&self, intent: Intent) -> &'static [&'static str] {
        match intent {
            Intent::Read => &["dynamodb:GetItem", "dynamodb:Query", "dynamodb:Scan"],
            Intent::Write => &["dynamodb:PutItem", "dynamodb:UpdateItem"],
            Intent::Delete => &["dynamodb:DeleteItem"],
        }
    }
}

/// The action table owned by `kind`.
#[must_use]
pub fn action_table(kind: StorageKind) -> &'static dyn ActionTable {
    match kind {
        StorageKind::Bucket => &BucketActions,
        StorageKind::KeyValue => &KeyValueActions,
    }
}

/// A consumer declared an intent the tables do not know.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("consumer '{consumer}': {source}")]
pub struct IntentError {
    pub consumer: String,
    pub source: ParseIntentError,
}

/// The storage resource grants are issued on.
#[derive(Debug, Clone, Copy)]
pub struct GrantTarget<'a> {
    pub name: &'a str,
    pub physical_id: &'a PhysicalId,
}

/// Emit one grant per consumer of `target`.
///
/// Consumers sharing a name are merged: their intents are unioned and the
/// first declared identity is kept. A consumer without intents gets no grant.
/// Grants come out in consumer-name order.
///
/// # Errors
///
/// [`IntentError`] for the first intent outside `read`/`write`/`delete`.
pub fn synthesize<T: ActionTable + ?Sized>(
    table: &T,
    target: GrantTarget<'_>,
    consumers: &[Consumer],
) -> Result<Vec<AccessGrant>, IntentError> {
    let mut merged: BTreeMap<&str, (&str, BTreeSet<Intent>)> = BTreeMap::new();

    for consumer in consumers {
        let (_, intents) = merged
            .entry(consumer.name.as_str())
            .or_insert_with(|| (consumer.identity.as_str(), BTreeSet::new()));
        for raw in &consumer.intents {
            let intent = raw.parse::<Intent>().map_err(|source| IntentError {
                consumer: consumer.name.clone(),
                source,
            })?;
            intents.insert(intent);
        }
    }

    Ok(merged
        .into_iter()
        .filter(|(_, (_, intents))| !intents.is_empty())
        .map(|(consumer, (identity, intents))| AccessGrant {
            resource_ref: target.name.to_owned(),
            resource_id: target.physical_id.clone(),
            consumer_ref: consumer.to_owned(),
            identity: identity.to_owned(),
            actions: intents
                .into_iter()
                .flat_map(|intent| table.actions(intent))
                .map(|action| (*action).to_owned())
                .collect(),
        })
        .collect())
}
