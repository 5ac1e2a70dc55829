pub mod client;
pub mod error;
mod rate_limit;
pub mod types;

pub use client::{ClientOptions, ShopifyClient};
pub use error::ShopifyError;
pub use types::{
    Metafield, Seo, ShopifyCollection, ShopifyCollectionRule, ShopifyImage, ShopifyOption,
    ShopifyPriceRange, ShopifyProduct, ShopifyRuleSet, ShopifySelectedOption, ShopifyVariant,
};
