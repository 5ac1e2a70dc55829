use crate::app_config::{AppConfig, Environment, MetafieldKey};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function,
/// so parsing can be tested against a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 {
            return Err(invalid(var, "must be at least 1".to_string()));
        }
        Ok(value)
    };

    let shopify_store_domain = require("SHOPIFY_STORE_DOMAIN")?;
    let shopify_storefront_token = require("SHOPIFY_STOREFRONT_ACCESS_TOKEN")?;
    let sanity_project_id = require("SANITY_PROJECT_ID")?;
    let sanity_dataset = require("SANITY_DATASET")?;
    let sanity_token = require("SANITY_API_TOKEN")?;

    let env = parse_environment(&or_default("SHOPSYNC_ENV", "development"))?;

    let bind_addr = or_default("SHOPSYNC_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("SHOPSYNC_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("SHOPSYNC_LOG_LEVEL", "info");

    let shopify_api_version = or_default("SHOPIFY_API_VERSION", "2024-01");
    let sanity_api_version = or_default("SANITY_API_VERSION", "2024-01-01");

    let request_timeout_secs = parse_u64("SHOPSYNC_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("SHOPSYNC_USER_AGENT", "shopsync/0.1 (catalog-sync)");
    let metafields = parse_metafields(&or_default("SHOPSYNC_METAFIELDS", ""))?;
    let max_concurrent_builds = parse_positive_usize("SHOPSYNC_MAX_CONCURRENT_BUILDS", "8")?;
    let max_concurrent_metafield_queries =
        parse_positive_usize("SHOPSYNC_MAX_CONCURRENT_METAFIELD_QUERIES", "4")?;
    let shopify_max_retries = parse_u32("SHOPSYNC_SHOPIFY_MAX_RETRIES", "2")?;
    let shopify_retry_backoff_base_ms = parse_u64("SHOPSYNC_SHOPIFY_RETRY_BACKOFF_BASE_MS", "500")?;
    let max_body_bytes = parse_positive_usize("SHOPSYNC_MAX_BODY_BYTES", "8388608")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        shopify_store_domain,
        shopify_storefront_token,
        shopify_api_version,
        sanity_project_id,
        sanity_dataset,
        sanity_token,
        sanity_api_version,
        request_timeout_secs,
        user_agent,
        metafields,
        max_concurrent_builds,
        max_concurrent_metafield_queries,
        shopify_max_retries,
        shopify_retry_backoff_base_ms,
        max_body_bytes,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SHOPSYNC_ENV".to_string(),
            reason: format!("expected development, test, or production, got '{other}'"),
        }),
    }
}

/// Parse `SHOPSYNC_METAFIELDS`: comma-separated `namespace.key` pairs.
///
/// Metafield values are stored on the document keyed by `key`, so the same
/// key may not appear under two namespaces.
fn parse_metafields(raw: &str) -> Result<Vec<MetafieldKey>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: "SHOPSYNC_METAFIELDS".to_string(),
        reason,
    };

    let mut parsed: Vec<MetafieldKey> = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((namespace, key)) = entry.split_once('.') else {
            return Err(invalid(format!(
                "entry '{entry}' must be written as namespace.key"
            )));
        };
        if namespace.is_empty() || key.is_empty() {
            return Err(invalid(format!(
                "entry '{entry}' has an empty namespace or key"
            )));
        }
        if parsed.iter().any(|m| m.key == key) {
            return Err(invalid(format!("metafield key '{key}' is listed twice")));
        }
        parsed.push(MetafieldKey {
            namespace: namespace.to_string(),
            key: key.to_string(),
        });
    }
    Ok(parsed)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
