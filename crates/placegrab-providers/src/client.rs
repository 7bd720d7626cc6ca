//! The shared request engine behind all three provider adapters.
//!
//! One GET at a time, a fixed courtesy delay before *every* attempt, and a
//! fixed retry count with no backoff growth or jitter. Any failure to
//! produce parsed JSON (network error, timeout, non-JSON body) counts as
//! transient and is retried with the identical request; exhausting the
//! attempt budget surfaces as [`ProviderError::RetriesExhausted`] carrying
//! the last failure.
//!
//! Non-2xx statuses are *not* failures here: provider APIs return JSON
//! error envelopes, and the runner wants the last non-success body and the
//! rate-limit response headers for its end-of-run report. The parsed body
//! travels back regardless of status.

use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;

use placegrab_core::AppConfig;

use crate::error::ProviderError;

/// Status, selected headers, and parsed JSON body of the last HTTP response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    headers: Vec<(String, String)>,
    pub body: String,
    pub json: serde_json::Value,
}

impl ApiResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Extracts the named response headers, preserving `names` order.
    /// Matching is case-insensitive; absent headers are skipped.
    #[must_use]
    pub fn stats(&self, names: &[&str]) -> Vec<(String, String)> {
        names
            .iter()
            .filter_map(|name| {
                self.headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| ((*name).to_owned(), v.clone()))
            })
            .collect()
    }

    /// Deserializes the JSON body into the provider's typed response model.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Deserialize`] when the body does not match
    /// the expected shape. Shape mismatches are not retried — the request
    /// already succeeded at the HTTP level.
    pub fn parse<T: DeserializeOwned>(&self, context: &str) -> Result<T, ProviderError> {
        serde_json::from_value(self.json.clone()).map_err(|source| ProviderError::Deserialize {
            context: context.to_owned(),
            source,
        })
    }
}

/// Blocking-in-spirit GET client with fixed-delay, fixed-count retries.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    request_delay: Duration,
    max_attempts: u32,
}

impl ApiClient {
    /// Builds the client from the run configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: &AppConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self {
            client,
            request_delay: Duration::from_millis(config.request_delay_ms),
            max_attempts: config.max_attempts.max(1),
        })
    }

    /// Issues a GET and returns the parsed JSON response.
    ///
    /// Sleeps the configured delay before each attempt, success or not.
    /// Transient failures are logged and retried with the same URL and
    /// headers until the attempt budget runs out.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::InvalidUrl`] if `url` plus `params` do not form
    ///   a valid URL (not retried).
    /// - [`ProviderError::RetriesExhausted`] after the final failed attempt.
    pub async fn get_json(
        &self,
        url: &str,
        params: &[(String, String)],
        headers: &[(&str, &str)],
    ) -> Result<ApiResponse, ProviderError> {
        let url = build_url(url, params)?;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            tokio::time::sleep(self.request_delay).await;
            match self.try_get(&url, headers).await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    if attempt >= self.max_attempts {
                        return Err(ProviderError::RetriesExhausted {
                            attempts: attempt,
                            last_error: err.to_string(),
                        });
                    }
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        url = %url,
                        error = %err,
                        "transient request error — retrying"
                    );
                }
            }
        }
    }

    async fn try_get(
        &self,
        url: &Url,
        headers: &[(&str, &str)],
    ) -> Result<ApiResponse, ProviderError> {
        let mut request = self.client.get(url.clone());
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_owned(), v.to_owned()))
            })
            .collect();
        let body = response.text().await?;
        let json = serde_json::from_str(&body).map_err(|source| ProviderError::Deserialize {
            context: url.to_string(),
            source,
        })?;
        Ok(ApiResponse {
            status,
            headers,
            body,
            json,
        })
    }
}

/// Appends `params` to `base` with proper percent-encoding.
fn build_url(base: &str, params: &[(String, String)]) -> Result<Url, ProviderError> {
    let mut url = Url::parse(base).map_err(|e| ProviderError::InvalidUrl {
        url: base.to_owned(),
        reason: e.to_string(),
    })?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in params {
            pairs.append_pair(name, value);
        }
    }
    Ok(url)
}
