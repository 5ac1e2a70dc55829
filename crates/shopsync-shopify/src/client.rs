//! HTTP client for the Shopify Storefront GraphQL API.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::ShopifyError;
use crate::rate_limit::retry_with_backoff;
use crate::types::{GraphQlResponse, Metafield, ProductMetafieldData, ProductSeoData, Seo};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

const PRODUCT_METAFIELD_QUERY: &str = "query ProductMetafield($id: ID!, $namespace: String!, $key: String!) { \
     product(id: $id) { metafield(namespace: $namespace, key: $key) { value type } } }";

const PRODUCT_SEO_QUERY: &str =
    "query ProductSeo($id: ID!) { product(id: $id) { seo { title description } } }";

/// Transport settings shared by every request the client makes.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Additional attempts after the first failure on transient errors.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

/// Client for a single store's Storefront API.
///
/// Use [`ShopifyClient::new`] for a real shop domain or
/// [`ShopifyClient::with_base_url`] to point at a mock server in tests.
pub struct ShopifyClient {
    client: Client,
    endpoint: Url,
    access_token: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl ShopifyClient {
    /// Creates a client for `https://<store_domain>`.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be built, or [`ShopifyError::InvalidBaseUrl`] if the domain
    /// does not form a valid URL.
    pub fn new(
        store_domain: &str,
        access_token: &str,
        api_version: &str,
        options: &ClientOptions,
    ) -> Result<Self, ShopifyError> {
        let domain = store_domain
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        Self::with_base_url(
            &format!("https://{domain}"),
            access_token,
            api_version,
            options,
        )
    }

    /// Creates a client rooted at an arbitrary base URL.
    ///
    /// # Errors
    ///
    /// Same as [`ShopifyClient::new`].
    pub fn with_base_url(
        base_url: &str,
        access_token: &str,
        api_version: &str,
        options: &ClientOptions,
    ) -> Result<Self, ShopifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&options.user_agent)
            .build()?;

        let raw = format!(
            "{}/api/{api_version}/graphql.json",
            base_url.trim_end_matches('/')
        );
        let endpoint = Url::parse(&raw).map_err(|e| ShopifyError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            endpoint,
            access_token: access_token.to_owned(),
            max_retries: options.max_retries,
            backoff_base_ms: options.backoff_base_ms,
        })
    }

    /// Runs a GraphQL query and deserialises its `data` member into `T`.
    ///
    /// `context` names the operation in error messages and logs.
    ///
    /// # Errors
    ///
    /// - [`ShopifyError::RateLimited`]: HTTP 429 after all retries.
    /// - [`ShopifyError::UnexpectedStatus`]: any other non-2xx status.
    /// - [`ShopifyError::Http`]: network or TLS failure after all retries.
    /// - [`ShopifyError::Deserialize`]: body does not match `T`.
    /// - [`ShopifyError::GraphQl`]: the response carried `errors` or no `data`.
    pub async fn query<T: DeserializeOwned>(
        &self,
        context: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ShopifyError> {
        let body = serde_json::json!({ "query": query, "variables": variables });

        let envelope: GraphQlResponse<T> =
            retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
                let body = &body;
                async move {
                    let response = self
                        .client
                        .post(self.endpoint.clone())
                        .header(ACCESS_TOKEN_HEADER, &self.access_token)
                        .json(body)
                        .send()
                        .await?;
                    let status = response.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after_secs = response
                            .headers()
                            .get(reqwest::header::RETRY_AFTER)
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(0);
                        return Err(ShopifyError::RateLimited { retry_after_secs });
                    }

                    if !status.is_success() {
                        return Err(ShopifyError::UnexpectedStatus {
                            status: status.as_u16(),
                            url: self.endpoint.to_string(),
                        });
                    }

                    let text = response.text().await?;
                    serde_json::from_str::<GraphQlResponse<T>>(&text).map_err(|e| {
                        ShopifyError::Deserialize {
                            context: context.to_owned(),
                            source: e,
                        }
                    })
                }
            })
            .await?;

        if !envelope.errors.is_empty() {
            let messages = envelope
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ShopifyError::GraphQl {
                context: context.to_owned(),
                messages,
            });
        }

        envelope.data.ok_or_else(|| ShopifyError::GraphQl {
            context: context.to_owned(),
            messages: "response carried no data".to_owned(),
        })
    }

    /// Fetches one metafield of a product.
    ///
    /// Returns `Ok(None)` when the product is not visible to the Storefront
    /// API or has no metafield under `namespace`/`key`.
    ///
    /// # Errors
    ///
    /// Propagates any transport or GraphQL error from [`Self::query`].
    pub async fn product_metafield(
        &self,
        product_gid: &str,
        namespace: &str,
        key: &str,
    ) -> Result<Option<Metafield>, ShopifyError> {
        let data: ProductMetafieldData = self
            .query(
                &format!("metafield {namespace}.{key} of {product_gid}"),
                PRODUCT_METAFIELD_QUERY,
                serde_json::json!({ "id": product_gid, "namespace": namespace, "key": key }),
            )
            .await?;
        Ok(data.product.and_then(|p| p.metafield))
    }

    /// Fetches the SEO title and description of a product.
    ///
    /// Returns `Ok(None)` when the product is not visible to the Storefront API.
    ///
    /// # Errors
    ///
    /// Propagates any transport or GraphQL error from [`Self::query`].
    pub async fn product_seo(&self, product_gid: &str) -> Result<Option<Seo>, ShopifyError> {
        let data: ProductSeoData = self
            .query(
                &format!("seo of {product_gid}"),
                PRODUCT_SEO_QUERY,
                serde_json::json!({ "id": product_gid }),
            )
            .await?;
        Ok(data.product.and_then(|p| p.seo))
    }
}
