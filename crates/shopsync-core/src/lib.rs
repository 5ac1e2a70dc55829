pub mod app_config;
pub mod config;
pub mod documents;
pub mod error;
pub mod ids;

pub use app_config::{AppConfig, Environment, MetafieldKey};
pub use config::{load_app_config, load_app_config_from_env};
pub use documents::{
    CollectionRuleItem, CollectionStore, ImageItem, InventoryState, OptionItem, PriceRangeStore,
    ProductStore, SeoFields, SlugField, TargetDocument, VariantReference, VariantStore,
};
pub use error::{ConfigError, IdError};
pub use ids::{build_document_id, extract_external_id, DocumentId, DocumentKind};
