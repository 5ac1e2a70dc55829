use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// One metafield copied onto product documents, configured as `namespace.key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetafieldKey {
    pub namespace: String,
    pub key: String,
}

impl std::fmt::Display for MetafieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.namespace, self.key)
    }
}

/// Process-wide settings, loaded once at startup and shared read-only.
#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub shopify_store_domain: String,
    pub shopify_storefront_token: String,
    pub shopify_api_version: String,
    pub sanity_project_id: String,
    pub sanity_dataset: String,
    pub sanity_token: String,
    pub sanity_api_version: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub metafields: Vec<MetafieldKey>,
    pub max_concurrent_builds: usize,
    pub max_concurrent_metafield_queries: usize,
    pub shopify_max_retries: u32,
    pub shopify_retry_backoff_base_ms: u64,
    pub max_body_bytes: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("shopify_store_domain", &self.shopify_store_domain)
            .field("shopify_storefront_token", &"[redacted]")
            .field("shopify_api_version", &self.shopify_api_version)
            .field("sanity_project_id", &self.sanity_project_id)
            .field("sanity_dataset", &self.sanity_dataset)
            .field("sanity_token", &"[redacted]")
            .field("sanity_api_version", &self.sanity_api_version)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("metafields", &self.metafields)
            .field("max_concurrent_builds", &self.max_concurrent_builds)
            .field(
                "max_concurrent_metafield_queries",
                &self.max_concurrent_metafield_queries,
            )
            .field("shopify_max_retries", &self.shopify_max_retries)
            .field(
                "shopify_retry_backoff_base_ms",
                &self.shopify_retry_backoff_base_ms,
            )
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}
