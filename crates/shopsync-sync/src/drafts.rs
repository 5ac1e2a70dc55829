//! Draft Lookup: one batched existence query for the `drafts.` counterparts
//! of every document touched by a request.

use std::collections::{BTreeSet, HashMap};

use shopsync_core::DocumentId;
use shopsync_sanity::SanityClient;

use crate::error::SyncError;

const DRAFT_EXISTENCE_QUERY: &str = "*[_id in $ids]._id";

/// Which documents currently have a live draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftIndex {
    drafts: HashMap<DocumentId, bool>,
}

impl DraftIndex {
    /// `true` when `drafts.<id>` exists. Ids that were not part of the
    /// lookup report `false`.
    #[must_use]
    pub fn has_draft(&self, id: &DocumentId) -> bool {
        self.drafts.get(id).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn draft_count(&self) -> usize {
        self.drafts.values().filter(|has| **has).count()
    }
}

/// Resolves, in a single query, which of `ids` have a draft counterpart.
///
/// An empty id set resolves to an empty index without contacting the store.
///
/// # Errors
///
/// Returns [`SyncError::StoreQueryFailure`] if the query fails.
pub async fn has_drafts<'a, I>(client: &SanityClient, ids: I) -> Result<DraftIndex, SyncError>
where
    I: IntoIterator<Item = &'a DocumentId>,
{
    let requested: BTreeSet<&DocumentId> = ids.into_iter().collect();
    if requested.is_empty() {
        return Ok(DraftIndex::default());
    }

    let draft_ids: Vec<String> = requested.iter().map(|id| id.draft()).collect();
    let found: Vec<String> = client
        .query(
            DRAFT_EXISTENCE_QUERY,
            serde_json::json!({ "ids": draft_ids }),
        )
        .await
        .map_err(SyncError::StoreQueryFailure)?;

    let present: BTreeSet<DocumentId> = found.iter().map(|raw| DocumentId::from_stored(raw)).collect();
    let drafts = requested
        .into_iter()
        .map(|id| (id.clone(), present.contains(id)))
        .collect();

    let index = DraftIndex { drafts };
    tracing::debug!(
        requested = index.drafts.len(),
        with_draft = index.draft_count(),
        "draft lookup resolved"
    );
    Ok(index)
}

#[cfg(test)]
impl DraftIndex {
    pub(crate) fn from_pairs<const N: usize>(pairs: [(DocumentId, bool); N]) -> Self {
        Self {
            drafts: pairs.into_iter().collect(),
        }
    }
}
