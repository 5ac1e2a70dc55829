//! Document Builder: maps one Shopify record (plus its SEO and metafield
//! lookups) onto the documents written to the content lake.

use std::collections::BTreeMap;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;

use shopsync_core::{
    extract_external_id, CollectionRuleItem, CollectionStore, DocumentKind, IdError, ImageItem,
    InventoryState, MetafieldKey, OptionItem, PriceRangeStore, ProductStore, SeoFields, SlugField,
    TargetDocument, VariantReference, VariantStore,
};
use shopsync_shopify::{
    ShopifyClient, ShopifyCollection, ShopifyError, ShopifyImage, ShopifyProduct, ShopifyVariant,
};

use crate::error::SyncError;

/// A product document together with the variant documents it references.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltProduct {
    /// External id of the product; variants carry it as `store.productId`.
    pub external_id: String,
    pub product: TargetDocument,
    pub variants: Vec<TargetDocument>,
}

/// Builds product documents, fetching auxiliary data from the Storefront API.
pub struct DocumentBuilder<'a> {
    shopify: &'a ShopifyClient,
    metafields: &'a [MetafieldKey],
    max_concurrent_metafield_queries: usize,
}

impl<'a> DocumentBuilder<'a> {
    #[must_use]
    pub fn new(
        shopify: &'a ShopifyClient,
        metafields: &'a [MetafieldKey],
        max_concurrent_metafield_queries: usize,
    ) -> Self {
        Self {
            shopify,
            metafields,
            max_concurrent_metafield_queries: max_concurrent_metafield_queries.max(1),
        }
    }

    /// Builds the product document and one document per variant.
    ///
    /// Identifiers are validated before any remote call. SEO and metafield
    /// lookups run concurrently; the document is assembled only once all of
    /// them have resolved.
    ///
    /// # Errors
    ///
    /// - [`SyncError::MalformedIdentifier`] if the product or a variant has a
    ///   missing or malformed GID.
    /// - [`SyncError::UpstreamFetchFailure`] if any single lookup fails; no
    ///   partial document is returned.
    pub async fn build_product(&self, product: &ShopifyProduct) -> Result<BuiltProduct, SyncError> {
        let gid = product.id.as_deref().ok_or(IdError::Missing("product"))?;
        let external_id = extract_external_id(gid)?;

        let variant_ids = product
            .variants
            .iter()
            .map(|v| {
                let variant_gid = v.id.as_deref().ok_or(IdError::Missing("product variant"))?;
                Ok((variant_gid, extract_external_id(variant_gid)?))
            })
            .collect::<Result<Vec<_>, IdError>>()?;

        let (seo, metafields) =
            futures::try_join!(self.fetch_seo(gid), self.fetch_metafields(gid))?;

        let preview_image_url = product
            .featured_image
            .as_ref()
            .or_else(|| product.images.first())
            .map(|image| image.url.clone());

        let mut variant_refs = Vec::with_capacity(product.variants.len());
        let mut variants = Vec::with_capacity(product.variants.len());
        for (idx, (variant, (variant_gid, variant_external_id))) in
            product.variants.iter().zip(variant_ids).enumerate()
        {
            let store = variant_store(
                variant,
                variant_gid,
                variant_external_id,
                product,
                gid,
                external_id,
                preview_image_url.as_deref(),
            );
            let doc = encode(DocumentKind::ProductVariant, variant_external_id, &store)?;
            variant_refs.push(VariantReference {
                key: idx.to_string(),
                kind: "reference",
                reference: doc.id.to_string(),
                weak: true,
            });
            variants.push(doc);
        }

        let store = ProductStore {
            gid: gid.to_owned(),
            id: external_id.to_owned(),
            title: product.title.clone(),
            handle: product.handle.clone(),
            slug: SlugField::new(product.handle.clone()),
            status: product.status.clone(),
            product_type: non_empty(product.product_type.as_deref()),
            vendor: non_empty(product.vendor.as_deref()),
            tags: join_tags(product.tags.as_deref()),
            description: product.description.clone(),
            description_html: product.description_html.clone(),
            created_at: product.created_at.clone(),
            updated_at: product.updated_at.clone(),
            price_range: PriceRangeStore {
                min_variant_price: coerce_amount(
                    product
                        .price_range
                        .as_ref()
                        .and_then(|r| r.min_variant_price.as_ref()),
                ),
                max_variant_price: coerce_amount(
                    product
                        .price_range
                        .as_ref()
                        .and_then(|r| r.max_variant_price.as_ref()),
                ),
            },
            preview_image_url,
            images: image_items(&product.images),
            options: product
                .options
                .iter()
                .enumerate()
                .map(|(idx, option)| OptionItem {
                    key: idx.to_string(),
                    kind: "option",
                    name: option.name.clone(),
                    values: option.values.clone(),
                })
                .collect(),
            variants: variant_refs,
            seo,
            metafields,
            is_deleted: false,
        };

        Ok(BuiltProduct {
            external_id: external_id.to_owned(),
            product: encode(DocumentKind::Product, external_id, &store)?,
            variants,
        })
    }

    async fn fetch_seo(&self, gid: &str) -> Result<Option<SeoFields>, ShopifyError> {
        let seo = self.shopify.product_seo(gid).await?;
        Ok(seo
            .filter(|s| s.title.is_some() || s.description.is_some())
            .map(|s| SeoFields {
                title: s.title,
                description: s.description,
            }))
    }

    /// One query per configured metafield, at most
    /// `max_concurrent_metafield_queries` in flight. Missing metafields are
    /// left out of the map.
    async fn fetch_metafields(&self, gid: &str) -> Result<BTreeMap<String, String>, ShopifyError> {
        let shopify = self.shopify;
        let lookups: Vec<(String, String)> = self
            .metafields
            .iter()
            .map(|field| (field.namespace.clone(), field.key.clone()))
            .collect();
        let values: Vec<Option<(String, String)>> = stream::iter(lookups)
            .map(|(namespace, key)| {
                let gid = gid.to_owned();
                async move {
                    let found = shopify.product_metafield(&gid, &namespace, &key).await?;
                    if found.is_none() {
                        tracing::debug!(
                            product = %gid,
                            namespace = %namespace,
                            key = %key,
                            "metafield not set"
                        );
                    }
                    Ok::<_, ShopifyError>(found.map(|m| (key, m.value)))
                }
            })
            .buffer_unordered(self.max_concurrent_metafield_queries)
            .try_collect()
            .await?;
        Ok(values.into_iter().flatten().collect())
    }
}

/// Builds the document for a collection. Collections need no remote lookups.
///
/// # Errors
///
/// Returns [`SyncError::MalformedIdentifier`] if the collection GID is
/// missing or malformed.
pub fn build_collection(collection: &ShopifyCollection) -> Result<TargetDocument, SyncError> {
    let gid = collection
        .id
        .as_deref()
        .ok_or(IdError::Missing("collection"))?;
    let external_id = extract_external_id(gid)?;

    let (disjunctive, rules) = collection.rule_set.as_ref().map_or_else(
        || (false, Vec::new()),
        |set| {
            let rules = set
                .rules
                .iter()
                .enumerate()
                .map(|(idx, rule)| CollectionRuleItem {
                    key: idx.to_string(),
                    kind: "collectionRule",
                    column: rule.column.clone(),
                    relation: rule.relation.clone(),
                    condition: rule.condition.clone(),
                })
                .collect();
            (set.applied_disjunctively, rules)
        },
    );

    let store = CollectionStore {
        gid: gid.to_owned(),
        id: external_id.to_owned(),
        title: collection.title.clone(),
        handle: collection.handle.clone(),
        slug: SlugField::new(collection.handle.clone()),
        description: collection.description.clone(),
        description_html: collection.description_html.clone(),
        image_url: collection.image.as_ref().map(|image| image.url.clone()),
        sort_order: collection.sort_order.clone(),
        disjunctive,
        rules,
        updated_at: collection.updated_at.clone(),
        is_deleted: false,
    };

    encode(DocumentKind::Collection, external_id, &store)
}

fn variant_store(
    variant: &ShopifyVariant,
    gid: &str,
    external_id: &str,
    product: &ShopifyProduct,
    product_gid: &str,
    product_external_id: &str,
    product_preview_url: Option<&str>,
) -> VariantStore {
    let option = |idx: usize| {
        variant
            .selected_options
            .get(idx)
            .map(|selected| selected.value.clone())
    };

    VariantStore {
        gid: gid.to_owned(),
        id: external_id.to_owned(),
        product_id: product_external_id.to_owned(),
        product_gid: product_gid.to_owned(),
        title: variant.title.clone(),
        sku: non_empty(variant.sku.as_deref()),
        price: coerce_amount(variant.price.as_ref()),
        compare_at_price: coerce_amount(variant.compare_at_price.as_ref()),
        in_stock: in_stock(variant),
        inventory: InventoryState {
            management: variant.inventory_management.clone(),
            policy: variant.inventory_policy.clone(),
            quantity: variant.inventory_quantity,
        },
        option1: option(0),
        option2: option(1),
        option3: option(2),
        preview_image_url: variant
            .image
            .as_ref()
            .map(|image| image.url.clone())
            .or_else(|| product_preview_url.map(str::to_owned)),
        status: product.status.clone(),
        is_deleted: false,
    }
}

fn encode<S: Serialize>(
    kind: DocumentKind,
    external_id: &str,
    store: &S,
) -> Result<TargetDocument, SyncError> {
    TargetDocument::new(kind, external_id, store).map_err(|source| SyncError::Encode {
        id: format!("{}-{external_id}", kind.id_prefix()),
        source,
    })
}

/// Images keyed by their position, which stays stable across re-syncs of
/// an unchanged gallery.
pub(crate) fn image_items(images: &[ShopifyImage]) -> Vec<ImageItem> {
    images
        .iter()
        .enumerate()
        .map(|(idx, image)| ImageItem {
            key: idx.to_string(),
            kind: "productImage",
            url: image.url.clone(),
            alt_text: image.alt_text.clone(),
            width: image.width,
            height: image.height,
        })
        .collect()
}

/// Coerces a Shopify amount to a number. Absent, null, empty, and
/// non-numeric values become `0.0`; money objects are unwrapped via `amount`.
pub(crate) fn coerce_amount(value: Option<&serde_json::Value>) -> f64 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
        Some(serde_json::Value::Object(money)) => coerce_amount(money.get("amount")),
        _ => 0.0,
    }
}

/// A tracked variant is in stock when it may oversell (`continue`) or has
/// positive quantity; an untracked variant is always in stock. The GraphQL
/// enum value `NOT_MANAGED` means untracked.
pub(crate) fn in_stock(variant: &ShopifyVariant) -> bool {
    let tracked = variant
        .inventory_management
        .as_deref()
        .map(str::trim)
        .is_some_and(|m| !m.is_empty() && !m.eq_ignore_ascii_case("not_managed"));
    if !tracked {
        return true;
    }
    let continues = variant
        .inventory_policy
        .as_deref()
        .is_some_and(|p| p.eq_ignore_ascii_case("continue"));
    continues || variant.inventory_quantity.unwrap_or(0) > 0
}

pub(crate) fn join_tags(tags: Option<&[String]>) -> Option<String> {
    tags.map(|t| t.join(", "))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_owned)
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod tests;
