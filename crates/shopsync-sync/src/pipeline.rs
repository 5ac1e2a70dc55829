//! Request pipeline: build → look up children and drafts → queue mutations
//! → commit once.

use futures::stream::{self, StreamExt, TryStreamExt};

use shopsync_core::{
    build_document_id, extract_external_id, AppConfig, DocumentId, DocumentKind, MetafieldKey,
    TargetDocument,
};
use shopsync_sanity::{SanityClient, Transaction};
use shopsync_shopify::{ShopifyClient, ShopifyCollection, ShopifyProduct};

use crate::builder::{build_collection, BuiltProduct, DocumentBuilder};
use crate::drafts::has_drafts;
use crate::error::SyncError;
use crate::reconcile::{live_children, stale_children};
use crate::request::{SyncAction, SyncRequest};
use crate::upsert::{enqueue_removal, enqueue_upsert};

/// Tunables for one [`Syncer`].
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub metafields: Vec<MetafieldKey>,
    pub max_concurrent_builds: usize,
    pub max_concurrent_metafield_queries: usize,
}

impl SyncOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            metafields: config.metafields.clone(),
            max_concurrent_builds: config.max_concurrent_builds,
            max_concurrent_metafield_queries: config.max_concurrent_metafield_queries,
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            metafields: Vec::new(),
            max_concurrent_builds: 8,
            max_concurrent_metafield_queries: 4,
        }
    }
}

/// What a successful request changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub products: usize,
    pub variants: usize,
    pub collections: usize,
    /// Variants tombstoned because they disappeared from their product or
    /// their product was deleted.
    pub tombstoned_variants: usize,
    pub mutations: usize,
    /// `None` when there was nothing to commit.
    pub transaction_id: Option<String>,
}

/// Runs sync requests against one source store and one dataset.
///
/// Holds no per-request state; every call to [`Syncer::run`] builds and
/// commits its own transaction.
pub struct Syncer {
    shopify: ShopifyClient,
    sanity: SanityClient,
    options: SyncOptions,
}

impl Syncer {
    #[must_use]
    pub fn new(shopify: ShopifyClient, sanity: SanityClient, options: SyncOptions) -> Self {
        Self {
            shopify,
            sanity,
            options,
        }
    }

    #[must_use]
    pub fn sanity(&self) -> &SanityClient {
        &self.sanity
    }

    /// Applies `request` in full or not at all.
    ///
    /// # Errors
    ///
    /// Returns the first [`SyncError`] encountered; when it occurs before the
    /// commit nothing has been written.
    pub async fn run(&self, request: SyncRequest) -> Result<SyncSummary, SyncError> {
        let action: SyncAction = request.action.parse()?;
        tracing::info!(
            action = %action,
            products = request.products.as_ref().map_or(0, Vec::len),
            collections = request.collections.as_ref().map_or(0, Vec::len),
            "sync request received"
        );

        let summary = match action {
            SyncAction::Create | SyncAction::Update | SyncAction::Sync => {
                self.upsert_batch(
                    request.products.unwrap_or_default(),
                    request.collections.unwrap_or_default(),
                )
                .await?
            }
            SyncAction::Delete => {
                self.delete_batch(request.product_ids, request.collection_ids)
                    .await?
            }
        };

        tracing::info!(
            action = %action,
            products = summary.products,
            variants = summary.variants,
            collections = summary.collections,
            tombstoned_variants = summary.tombstoned_variants,
            mutations = summary.mutations,
            "sync request applied"
        );
        Ok(summary)
    }

    async fn upsert_batch(
        &self,
        products: Vec<ShopifyProduct>,
        collections: Vec<ShopifyCollection>,
    ) -> Result<SyncSummary, SyncError> {
        let collections = collections
            .iter()
            .map(build_collection)
            .collect::<Result<Vec<TargetDocument>, _>>()?;

        let builder = DocumentBuilder::new(
            &self.shopify,
            &self.options.metafields,
            self.options.max_concurrent_metafield_queries,
        );
        let builder = &builder;
        let built: Vec<BuiltProduct> = stream::iter(products)
            .map(|product| async move { builder.build_product(&product).await })
            .buffered(self.options.max_concurrent_builds.max(1))
            .try_collect()
            .await?;

        let parents: Vec<&str> = built.iter().map(|p| p.external_id.as_str()).collect();
        let stored_children = live_children(&self.sanity, parents).await?;

        let mut stale: Vec<DocumentId> = Vec::new();
        for product in &built {
            let current: Vec<&DocumentId> = product.variants.iter().map(|v| &v.id).collect();
            if let Some(stored) = stored_children.get(&product.external_id) {
                stale.extend(stale_children(stored, &current));
            }
        }

        let touched: Vec<&DocumentId> = built
            .iter()
            .flat_map(|p| std::iter::once(&p.product.id).chain(p.variants.iter().map(|v| &v.id)))
            .chain(collections.iter().map(|c| &c.id))
            .chain(stale.iter())
            .collect();
        let drafts = has_drafts(&self.sanity, touched).await?;

        let mut tx = Transaction::new();
        let mut variant_count = 0;
        for product in &built {
            for variant in &product.variants {
                enqueue_upsert(&mut tx, variant, &drafts);
            }
            variant_count += product.variants.len();
            enqueue_upsert(&mut tx, &product.product, &drafts);
        }
        for id in &stale {
            tracing::info!(variant = %id, "tombstoning variant missing from payload");
            enqueue_removal(&mut tx, DocumentKind::ProductVariant, id, &drafts);
        }
        for collection in &collections {
            enqueue_upsert(&mut tx, collection, &drafts);
        }

        let mutations = tx.len();
        let receipt = tx
            .commit(&self.sanity)
            .await
            .map_err(SyncError::TransactionFailure)?;

        Ok(SyncSummary {
            products: built.len(),
            variants: variant_count,
            collections: collections.len(),
            tombstoned_variants: stale.len(),
            mutations,
            transaction_id: receipt.map(|r| r.transaction_id),
        })
    }

    async fn delete_batch(
        &self,
        product_ids: Option<Vec<String>>,
        collection_ids: Option<Vec<String>>,
    ) -> Result<SyncSummary, SyncError> {
        let product_ids = product_ids.unwrap_or_default();
        let collection_ids = collection_ids.unwrap_or_default();
        if product_ids.is_empty() && collection_ids.is_empty() {
            return Err(SyncError::InvalidRequest(
                "delete requires productIds or collectionIds".to_owned(),
            ));
        }

        let products = product_ids
            .iter()
            .map(|gid| extract_external_id(gid))
            .collect::<Result<Vec<&str>, _>>()?;
        let collections = collection_ids
            .iter()
            .map(|gid| {
                extract_external_id(gid).map(|id| build_document_id(DocumentKind::Collection, id))
            })
            .collect::<Result<Vec<DocumentId>, _>>()?;

        let stored_children = live_children(&self.sanity, products.clone()).await?;
        let children: Vec<&DocumentId> = products
            .iter()
            .filter_map(|id| stored_children.get(*id))
            .flatten()
            .collect();
        let drafts = has_drafts(&self.sanity, children.clone()).await?;

        let mut tx = Transaction::new();
        for external_id in &products {
            let id = build_document_id(DocumentKind::Product, external_id);
            enqueue_removal(&mut tx, DocumentKind::Product, &id, &drafts);
        }
        for child in &children {
            enqueue_removal(&mut tx, DocumentKind::ProductVariant, child, &drafts);
        }
        for id in &collections {
            enqueue_removal(&mut tx, DocumentKind::Collection, id, &drafts);
        }

        let mutations = tx.len();
        let receipt = tx
            .commit(&self.sanity)
            .await
            .map_err(SyncError::TransactionFailure)?;

        Ok(SyncSummary {
            products: products.len(),
            variants: 0,
            collections: collections.len(),
            tombstoned_variants: children.len(),
            mutations,
            transaction_id: receipt.map(|r| r.transaction_id),
        })
    }
}
