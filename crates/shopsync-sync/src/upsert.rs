//! Upsert Orchestrator: turns built documents into mutations on the
//! published and draft copies of each document.
//!
//! | Copy      | On create/update/sync                          | On removal                  |
//! |-----------|------------------------------------------------|-----------------------------|
//! | published | `createIfNotExists` then patch `store`         | tombstone or delete by kind |
//! | draft     | patch `store` only if the draft already exists | same, only if it exists*    |
//!
//! *Top-level deletes always remove both ids.

use shopsync_core::{DocumentId, DocumentKind, TargetDocument};
use shopsync_sanity::Transaction;

use crate::drafts::DraftIndex;

/// The physical ids behind one logical document that currently exist, or
/// may be created: always the published id, plus the draft id when a draft
/// is live. Drafts are never introduced here.
fn live_copies(id: &DocumentId, drafts: &DraftIndex) -> Vec<String> {
    let mut copies = vec![id.as_str().to_owned()];
    if drafts.has_draft(id) {
        copies.push(id.draft());
    }
    copies
}

/// Queues the write of `doc`: the published copy is created if absent and
/// then patched with the full `store` payload; an existing draft receives the
/// same payload under its own id.
pub fn enqueue_upsert(tx: &mut Transaction, doc: &TargetDocument, drafts: &DraftIndex) {
    tx.create_if_not_exists(doc.skeleton(doc.id.as_str()));
    for target in live_copies(&doc.id, drafts) {
        tx.patch(target, |patch| {
            patch.set("store", doc.store.clone());
        });
    }
}

/// Queues removal of a document, dispatching on its kind.
///
/// Variants are tombstoned so references to them stay resolvable; products
/// and collections are physically deleted.
pub fn enqueue_removal(
    tx: &mut Transaction,
    kind: DocumentKind,
    id: &DocumentId,
    drafts: &DraftIndex,
) {
    match kind {
        DocumentKind::ProductVariant => enqueue_tombstone(tx, id, drafts),
        DocumentKind::Product | DocumentKind::Collection => enqueue_delete(tx, id),
    }
}

/// Marks a child record deleted on every live copy.
fn enqueue_tombstone(tx: &mut Transaction, id: &DocumentId, drafts: &DraftIndex) {
    for target in live_copies(id, drafts) {
        tx.patch(target, |patch| {
            patch.set("store.isDeleted", serde_json::Value::Bool(true));
        });
    }
}

/// Deletes both the published and draft ids of a top-level document,
/// whether or not either currently exists.
fn enqueue_delete(tx: &mut Transaction, id: &DocumentId) {
    tx.delete(id.as_str()).delete(id.draft());
}
