//! Construction of both remote clients from the process-wide config.

use shopsync_core::AppConfig;
use shopsync_sanity::{SanityClient, SanityError, StoreOptions};
use shopsync_shopify::{ClientOptions, ShopifyClient, ShopifyError};

/// Builds the Storefront client described by `config`.
///
/// # Errors
///
/// Returns [`ShopifyError`] if the HTTP client cannot be built or the store
/// domain is not a valid host.
pub fn shopify_client_from_config(config: &AppConfig) -> Result<ShopifyClient, ShopifyError> {
    ShopifyClient::new(
        &config.shopify_store_domain,
        &config.shopify_storefront_token,
        &config.shopify_api_version,
        &ClientOptions {
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            max_retries: config.shopify_max_retries,
            backoff_base_ms: config.shopify_retry_backoff_base_ms,
        },
    )
}

/// Builds the content lake client described by `config`.
///
/// # Errors
///
/// Returns [`SanityError`] if the HTTP client cannot be built or the project
/// id is not a valid host.
pub fn sanity_client_from_config(config: &AppConfig) -> Result<SanityClient, SanityError> {
    SanityClient::new(
        &config.sanity_project_id,
        &config.sanity_dataset,
        &config.sanity_token,
        &config.sanity_api_version,
        &StoreOptions {
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
        },
    )
}
