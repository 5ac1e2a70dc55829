//! Child-Record Reconciler: finds variants stored under a product that are
//! no longer present in its latest payload.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Deserialize;

use shopsync_core::DocumentId;
use shopsync_sanity::SanityClient;

use crate::error::SyncError;

const LIVE_CHILDREN_QUERY: &str = "*[_type == \"productVariant\" \
     && store.productId in $productIds \
     && !(_id in path(\"drafts.**\")) \
     && store.isDeleted != true]{_id, \"productId\": store.productId}";

#[derive(Debug, Deserialize)]
struct ChildRow {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "productId")]
    product_id: String,
}

/// Live (non-tombstoned) variant ids per product external id.
pub type ChildrenByParent = HashMap<String, Vec<DocumentId>>;

/// Fetches the live variants of every product in `product_ids` with one
/// query. Products with no stored variants are absent from the map.
///
/// # Errors
///
/// Returns [`SyncError::StoreQueryFailure`] if the query fails.
pub async fn live_children<'a, I>(
    client: &SanityClient,
    product_ids: I,
) -> Result<ChildrenByParent, SyncError>
where
    I: IntoIterator<Item = &'a str>,
{
    let requested: BTreeSet<&str> = product_ids.into_iter().collect();
    if requested.is_empty() {
        return Ok(ChildrenByParent::new());
    }

    let rows: Vec<ChildRow> = client
        .query(
            LIVE_CHILDREN_QUERY,
            serde_json::json!({ "productIds": requested }),
        )
        .await
        .map_err(SyncError::StoreQueryFailure)?;

    let mut children = ChildrenByParent::new();
    for row in rows {
        children
            .entry(row.product_id)
            .or_default()
            .push(DocumentId::from_stored(&row.id));
    }
    Ok(children)
}

/// Ids in `stored` that are missing from `current`, in stored order.
#[must_use]
pub fn stale_children(stored: &[DocumentId], current: &[&DocumentId]) -> Vec<DocumentId> {
    let current: HashSet<&DocumentId> = current.iter().copied().collect();
    stored
        .iter()
        .filter(|id| !current.contains(id))
        .cloned()
        .collect()
}
