//! Shapes written to the destination store.
//!
//! Every document is `{ _id, _type, store }`. The typed `*Store` structs
//! describe the `store` payload; [`TargetDocument`] holds it pre-serialised so
//! the write path can treat all kinds uniformly.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::ids::{build_document_id, DocumentId, DocumentKind};

/// A document ready to be written, keyed by its deterministic id.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetDocument {
    pub id: DocumentId,
    pub kind: DocumentKind,
    pub store: serde_json::Value,
}

impl TargetDocument {
    /// Serialises `store` and pairs it with the id derived from `external_id`.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if `store` fails to serialise.
    pub fn new<S: Serialize>(
        kind: DocumentKind,
        external_id: &str,
        store: &S,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: build_document_id(kind, external_id),
            kind,
            store: serde_json::to_value(store)?,
        })
    }

    /// The skeleton used for `createIfNotExists` under `id`.
    #[must_use]
    pub fn skeleton(&self, id: &str) -> serde_json::Value {
        serde_json::json!({
            "_id": id,
            "_type": self.kind.type_name(),
            "store": self.store,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlugField {
    #[serde(rename = "_type")]
    pub kind: &'static str,
    pub current: String,
}

impl SlugField {
    #[must_use]
    pub fn new(current: impl Into<String>) -> Self {
        Self {
            kind: "slug",
            current: current.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeStore {
    pub min_variant_price: f64,
    pub max_variant_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageItem {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type")]
    pub kind: &'static str,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionItem {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type")]
    pub kind: &'static str,
    pub name: String,
    pub values: Vec<String>,
}

/// Weak reference from a product to one of its variant documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantReference {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type")]
    pub kind: &'static str,
    #[serde(rename = "_ref")]
    pub reference: String,
    #[serde(rename = "_weak")]
    pub weak: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeoFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStore {
    pub gid: String,
    pub id: String,
    pub title: String,
    pub handle: String,
    pub slug: SlugField,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    /// Comma-and-space joined; absent when the source carried no tag list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    pub price_range: PriceRangeStore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_image_url: Option<String>,
    pub images: Vec<ImageItem>,
    pub options: Vec<OptionItem>,
    pub variants: Vec<VariantReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo: Option<SeoFields>,
    pub metafields: BTreeMap<String, String>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub management: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantStore {
    pub gid: String,
    pub id: String,
    /// External id of the owning product; the reconciler queries on it.
    pub product_id: String,
    pub product_gid: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub price: f64,
    pub compare_at_price: f64,
    pub in_stock: bool,
    pub inventory: InventoryState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionRuleItem {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type")]
    pub kind: &'static str,
    pub column: String,
    pub relation: String,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStore {
    pub gid: String,
    pub id: String,
    pub title: String,
    pub handle: String,
    pub slug: SlugField,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,
    pub disjunctive: bool,
    pub rules: Vec<CollectionRuleItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    pub is_deleted: bool,
}
