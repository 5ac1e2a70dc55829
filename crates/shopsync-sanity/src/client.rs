//! HTTP client for the Sanity content lake: point lookups, GROQ queries, and
//! the mutate endpoint that [`crate::Transaction`] commits through.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::SanityError;
use crate::transaction::{CommitReceipt, Mutation};

/// Transport settings for [`SanityClient`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct DocResponse {
    #[serde(default)]
    documents: Vec<serde_json::Value>,
}

/// Client for one project and dataset.
pub struct SanityClient {
    client: Client,
    /// `https://<project>.api.sanity.io/v<version>/`
    base_url: Url,
    dataset: String,
    token: String,
}

impl SanityClient {
    /// Creates a client for the live API of `project_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SanityError::Http`] if the `reqwest::Client` cannot be built
    /// or [`SanityError::InvalidBaseUrl`] if the project id does not form a
    /// valid host.
    pub fn new(
        project_id: &str,
        dataset: &str,
        token: &str,
        api_version: &str,
        options: &StoreOptions,
    ) -> Result<Self, SanityError> {
        Self::with_base_url(
            &format!("https://{project_id}.api.sanity.io"),
            dataset,
            token,
            api_version,
            options,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Same as [`SanityClient::new`].
    pub fn with_base_url(
        base_url: &str,
        dataset: &str,
        token: &str,
        api_version: &str,
        options: &StoreOptions,
    ) -> Result<Self, SanityError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&options.user_agent)
            .build()?;

        let version = api_version.trim_start_matches('v');
        let normalised = format!("{}/v{version}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| SanityError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            dataset: dataset.to_owned(),
            token: token.to_owned(),
        })
    }

    #[must_use]
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Fetches a single document by id, bypassing the query engine.
    ///
    /// Returns `Ok(None)` when no document with that id exists.
    ///
    /// # Errors
    ///
    /// - [`SanityError::Http`] on network failure.
    /// - [`SanityError::UnexpectedStatus`] on a non-2xx response.
    /// - [`SanityError::Deserialize`] if the body is not the expected shape.
    pub async fn get_document(&self, id: &str) -> Result<Option<serde_json::Value>, SanityError> {
        let url = self.endpoint(&["data", "doc", &self.dataset, id])?;
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.token)
            .send()
            .await?;
        let body = Self::read_success(response, &url).await?;
        let parsed: DocResponse =
            serde_json::from_str(&body).map_err(|e| SanityError::Deserialize {
                context: format!("document {id}"),
                source: e,
            })?;
        Ok(parsed.documents.into_iter().next())
    }

    /// Runs a GROQ query with `params` (bound as `$name` in the query) and
    /// deserialises the `result` member into `T`.
    ///
    /// # Errors
    ///
    /// - [`SanityError::Http`] on network failure.
    /// - [`SanityError::UnexpectedStatus`] on a non-2xx response.
    /// - [`SanityError::Deserialize`] if `result` does not match `T`.
    pub async fn query<T: DeserializeOwned>(
        &self,
        groq: &str,
        params: serde_json::Value,
    ) -> Result<T, SanityError> {
        let url = self.endpoint(&["data", "query", &self.dataset])?;
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "query": groq, "params": params }))
            .send()
            .await?;
        let body = Self::read_success(response, &url).await?;
        let parsed: QueryResponse<T> =
            serde_json::from_str(&body).map_err(|e| SanityError::Deserialize {
                context: format!("query `{groq}`"),
                source: e,
            })?;
        Ok(parsed.result)
    }

    /// Submits `mutations` as one atomic transaction.
    ///
    /// Callers go through [`crate::Transaction::commit`]; this is the raw
    /// endpoint call.
    ///
    /// # Errors
    ///
    /// - [`SanityError::UnexpectedStatus`] when the store rejects the
    ///   transaction; nothing from it is applied.
    /// - [`SanityError::Http`] on network failure.
    /// - [`SanityError::Deserialize`] if the receipt cannot be parsed.
    pub(crate) async fn mutate(&self, mutations: &[Mutation]) -> Result<CommitReceipt, SanityError> {
        let mut url = self.endpoint(&["data", "mutate", &self.dataset])?;
        url.query_pairs_mut()
            .append_pair("returnIds", "true")
            .append_pair("visibility", "sync");

        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "mutations": mutations }))
            .send()
            .await?;
        let body = Self::read_success(response, &url).await?;
        serde_json::from_str(&body).map_err(|e| SanityError::Deserialize {
            context: "mutation receipt".to_owned(),
            source: e,
        })
    }

    /// Appends path segments (percent-encoded) to the versioned base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SanityError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| SanityError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: "URL cannot be a base".to_owned(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_success(response: reqwest::Response, url: &Url) -> Result<String, SanityError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SanityError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SanityClient {
        let options = StoreOptions {
            timeout_secs: 5,
            user_agent: "shopsync-test/0.1".to_owned(),
        };
        SanityClient::new("abc123", "production", "token", "2024-01-01", &options)
            .expect("client")
    }

    #[test]
    fn endpoint_joins_version_and_segments() {
        let url = client()
            .endpoint(&["data", "query", "production"])
            .expect("endpoint");
        assert_eq!(
            url.as_str(),
            "https://abc123.api.sanity.io/v2024-01-01/data/query/production"
        );
    }

    #[test]
    fn endpoint_accepts_version_with_leading_v() {
        let options = StoreOptions {
            timeout_secs: 5,
            user_agent: "t".to_owned(),
        };
        let client = SanityClient::new("p", "d", "t", "v2021-10-21", &options).expect("client");
        let url = client.endpoint(&["data", "doc", "d", "x"]).expect("endpoint");
        assert_eq!(url.as_str(), "https://p.api.sanity.io/v2021-10-21/data/doc/d/x");
    }
}
