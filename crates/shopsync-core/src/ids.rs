//! Mapping from upstream GIDs (`gid://shopify/Product/123`) to the
//! deterministic document ids used in the destination store.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::IdError;

const DRAFTS_PREFIX: &str = "drafts.";

/// The kinds of document this service writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentKind {
    Product,
    ProductVariant,
    Collection,
}

impl DocumentKind {
    /// Prefix placed before the external id in the document id.
    #[must_use]
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Product => "shopifyProduct",
            Self::ProductVariant => "shopifyProductVariant",
            Self::Collection => "shopifyCollection",
        }
    }

    /// Value of the document's `_type` field.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::ProductVariant => "productVariant",
            Self::Collection => "collection",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Id of a published document, e.g. `shopifyProduct-123`.
///
/// The draft counterpart is derived with [`DocumentId::draft`]; a
/// `DocumentId` itself never carries the `drafts.` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Wraps an id read back from the store. Strips a `drafts.` prefix so
    /// both variants of a document resolve to the same logical id.
    #[must_use]
    pub fn from_stored(raw: &str) -> Self {
        Self(raw.strip_prefix(DRAFTS_PREFIX).unwrap_or(raw).to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Id of the unpublished draft shadowing this document.
    #[must_use]
    pub fn draft(&self) -> String {
        format!("{DRAFTS_PREFIX}{}", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns the trailing segment of a GID.
///
/// # Errors
///
/// Returns [`IdError::Malformed`] when `gid` contains no `/` or ends in one.
pub fn extract_external_id(gid: &str) -> Result<&str, IdError> {
    match gid.rsplit_once('/') {
        Some((_, tail)) if !tail.trim().is_empty() => Ok(tail),
        _ => Err(IdError::Malformed(gid.to_owned())),
    }
}

/// Builds the document id for `kind` from an already-extracted external id.
#[must_use]
pub fn build_document_id(kind: DocumentKind, external_id: &str) -> DocumentId {
    DocumentId(format!("{}-{external_id}", kind.id_prefix()))
}
