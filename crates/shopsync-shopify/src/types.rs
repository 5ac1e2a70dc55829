//! Shopify record shapes: the product and collection payloads carried by
//! inbound sync requests, plus the Storefront GraphQL responses used for
//! auxiliary lookups.
//!
//! ### Identifiers
//! Every record is keyed by a GID such as `gid://shopify/Product/123`. `id`
//! is modelled as `Option<String>` so a missing id reaches the document
//! builder and fails there instead of being defaulted.
//!
//! ### Amounts
//! Prices arrive as bare numbers, numeric strings (`"12.99"`), or Storefront
//! money objects (`{"amount": "12.99", "currencyCode": "USD"}`). They are
//! kept as raw JSON here and coerced by the document builder.
//!
//! ### Tags
//! `tags` is `Option<Vec<String>>`: an absent list and an empty list are
//! written differently downstream.

use serde::{Deserialize, Deserializer};

/// A product as delivered in a sync request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopifyProduct {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub handle: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub description_html: Option<String>,

    #[serde(default)]
    pub product_type: Option<String>,

    #[serde(default)]
    pub vendor: Option<String>,

    /// `ACTIVE`, `ARCHIVED`, or `DRAFT`; passed through unchanged.
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub tags: Option<Vec<String>>,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,

    #[serde(default)]
    pub price_range: Option<ShopifyPriceRange>,

    #[serde(default)]
    pub featured_image: Option<ShopifyImage>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<ShopifyImage>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<ShopifyOption>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub variants: Vec<ShopifyVariant>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopifyPriceRange {
    #[serde(default)]
    pub min_variant_price: Option<serde_json::Value>,
    #[serde(default)]
    pub max_variant_price: Option<serde_json::Value>,
}

/// A product or collection image. Accepts both Storefront (`url`, `altText`)
/// and Admin (`src`, `alt`) field names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopifyImage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(alias = "src")]
    pub url: String,
    #[serde(default, alias = "alt")]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopifyOption {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub values: Vec<String>,
}

/// A purchasable variant of a [`ShopifyProduct`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopifyVariant {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    /// Empty strings are treated as absent by the builder.
    #[serde(default)]
    pub sku: Option<String>,

    #[serde(default)]
    pub price: Option<serde_json::Value>,

    #[serde(default)]
    pub compare_at_price: Option<serde_json::Value>,

    /// Inventory tracker, e.g. `"shopify"`. `None` means untracked.
    #[serde(default)]
    pub inventory_management: Option<String>,

    /// `"continue"` allows overselling; `"deny"` does not.
    #[serde(default)]
    pub inventory_policy: Option<String>,

    #[serde(default)]
    pub inventory_quantity: Option<i64>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub selected_options: Vec<ShopifySelectedOption>,

    #[serde(default)]
    pub image: Option<ShopifyImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShopifySelectedOption {
    pub name: String,
    pub value: String,
}

/// A collection as delivered in a sync request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopifyCollection {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub handle: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub description_html: Option<String>,
    #[serde(default)]
    pub image: Option<ShopifyImage>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
    /// Present on automated collections only.
    #[serde(default)]
    pub rule_set: Option<ShopifyRuleSet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopifyRuleSet {
    #[serde(default, deserialize_with = "null_as_default")]
    pub applied_disjunctively: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rules: Vec<ShopifyCollectionRule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShopifyCollectionRule {
    pub column: String,
    pub relation: String,
    pub condition: String,
}

/// Webhook senders emit `null` for empty lists and blank fields; treat it
/// the same as an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A metafield value returned by the Storefront API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Metafield {
    pub value: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Product SEO overrides. Either field may be unset in the admin.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Seo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// GraphQL envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductMetafieldData {
    pub product: Option<ProductMetafieldNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductMetafieldNode {
    pub metafield: Option<Metafield>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductSeoData {
    pub product: Option<ProductSeoNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductSeoNode {
    pub seo: Option<Seo>,
}
