use thiserror::Error;

use shopsync_core::IdError;
use shopsync_sanity::SanityError;
use shopsync_shopify::ShopifyError;

/// Why a sync request failed. A request either applies completely or
/// reports exactly one of these.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(#[from] IdError),

    #[error("invalid action \"{0}\": expected create, update, sync, or delete")]
    InvalidAction(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("upstream fetch failed: {0}")]
    UpstreamFetchFailure(#[from] ShopifyError),

    #[error("store lookup failed: {0}")]
    StoreQueryFailure(#[source] SanityError),

    #[error("transaction failed: {0}")]
    TransactionFailure(#[source] SanityError),

    #[error("failed to encode document {id}: {source}")]
    Encode {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl SyncError {
    /// `true` when the caller sent something unusable, as opposed to a
    /// failure while talking to either remote API.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidAction(_) | Self::InvalidRequest(_))
    }
}
