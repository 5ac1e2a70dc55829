//! Append-only mutation batch committed atomically through the mutate
//! endpoint.
//!
//! One [`Transaction`] is built per inbound request. [`Transaction::commit`]
//! consumes it, so a transaction cannot be reused after submission.

use serde::{Deserialize, Serialize};

use crate::client::SanityClient;
use crate::error::SanityError;

/// A single entry of the `mutations` array, in the store's wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Mutation {
    CreateIfNotExists(serde_json::Value),
    Patch(PatchMutation),
    Delete { id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchMutation {
    pub id: String,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub set: serde_json::Map<String, serde_json::Value>,
}

impl PatchMutation {
    /// Sets `path` (a top-level field or a dotted attribute path such as
    /// `store.isDeleted`) to `value`.
    pub fn set(&mut self, path: impl Into<String>, value: serde_json::Value) -> &mut Self {
        self.set.insert(path.into(), value);
        self
    }
}

/// Per-document outcome reported by the store after a commit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MutationResult {
    pub id: String,
    #[serde(default)]
    pub operation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitReceipt {
    pub transaction_id: String,
    #[serde(default)]
    pub results: Vec<MutationResult>,
}

#[derive(Debug, Default)]
pub struct Transaction {
    mutations: Vec<Mutation>,
}

impl Transaction {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `document` unless one with the same `_id` already exists.
    pub fn create_if_not_exists(&mut self, document: serde_json::Value) -> &mut Self {
        self.mutations.push(Mutation::CreateIfNotExists(document));
        self
    }

    /// Queues a patch on `id`, shaped by `mutator`. A patch whose mutator
    /// sets nothing is dropped.
    pub fn patch<F>(&mut self, id: impl Into<String>, mutator: F) -> &mut Self
    where
        F: FnOnce(&mut PatchMutation),
    {
        let mut patch = PatchMutation {
            id: id.into(),
            set: serde_json::Map::new(),
        };
        mutator(&mut patch);
        if !patch.set.is_empty() {
            self.mutations.push(Mutation::Patch(patch));
        }
        self
    }

    /// Physically removes `id`. Deleting an id that does not exist is
    /// accepted by the store.
    pub fn delete(&mut self, id: impl Into<String>) -> &mut Self {
        self.mutations.push(Mutation::Delete { id: id.into() });
        self
    }

    #[must_use]
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Submits every queued mutation in one request. Either all of them are
    /// applied or none are.
    ///
    /// Returns `Ok(None)` without contacting the store when nothing is queued.
    ///
    /// # Errors
    ///
    /// Returns the [`SanityError`] from the mutate call; the store has
    /// applied nothing in that case.
    pub async fn commit(self, client: &SanityClient) -> Result<Option<CommitReceipt>, SanityError> {
        if self.mutations.is_empty() {
            tracing::debug!("empty transaction, skipping commit");
            return Ok(None);
        }
        let count = self.mutations.len();
        let receipt = client.mutate(&self.mutations).await?;
        tracing::info!(
            transaction_id = %receipt.transaction_id,
            mutations = count,
            "transaction committed"
        );
        Ok(Some(receipt))
    }
}
