//! Catalog sync: turns a batch of Shopify records into document mutations
//! and commits them to the content lake in one transaction.

pub mod builder;
pub mod clients;
pub mod drafts;
pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod request;
pub mod upsert;

pub use builder::{BuiltProduct, DocumentBuilder};
pub use clients::{sanity_client_from_config, shopify_client_from_config};
pub use drafts::{has_drafts, DraftIndex};
pub use error::SyncError;
pub use pipeline::{SyncOptions, SyncSummary, Syncer};
pub use request::{SyncAction, SyncRequest};
