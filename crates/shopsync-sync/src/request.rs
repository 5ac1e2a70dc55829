use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use shopsync_shopify::{ShopifyCollection, ShopifyProduct};

use crate::error::SyncError;

/// Body of an inbound sync request.
///
/// `action` is kept as a raw string so an unknown value can be reported as
/// [`SyncError::InvalidAction`] rather than a generic parse failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub action: String,
    #[serde(default)]
    pub products: Option<Vec<ShopifyProduct>>,
    #[serde(default)]
    pub collections: Option<Vec<ShopifyCollection>>,
    #[serde(default)]
    pub product_ids: Option<Vec<String>>,
    #[serde(default)]
    pub collection_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Create,
    Update,
    Sync,
    Delete,
}

impl SyncAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Sync => "sync",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncAction {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "sync" => Ok(Self::Sync),
            "delete" => Ok(Self::Delete),
            other => Err(SyncError::InvalidAction(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_actions() {
        for (raw, expected) in [
            ("create", SyncAction::Create),
            ("update", SyncAction::Update),
            ("sync", SyncAction::Sync),
            ("delete", SyncAction::Delete),
        ] {
            assert_eq!(raw.parse::<SyncAction>().unwrap(), expected);
        }
    }

    #[test]
    fn rejects_unknown_action_case_sensitively() {
        assert!(matches!(
            "SYNC".parse::<SyncAction>(),
            Err(SyncError::InvalidAction(ref a)) if a == "SYNC"
        ));
        assert!("archive".parse::<SyncAction>().is_err());
    }

    #[test]
    fn request_accepts_null_lists() {
        let request: SyncRequest = serde_json::from_value(serde_json::json!({
            "action": "delete",
            "products": null,
            "productIds": ["gid://shopify/Product/1"]
        }))
        .expect("deserialize");
        assert!(request.products.is_none());
        assert_eq!(request.product_ids.map(|ids| ids.len()), Some(1));
    }
}
