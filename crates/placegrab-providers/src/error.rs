use thiserror::Error;

/// Errors raised by the request engine and the provider adapters.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Every attempt of one request failed; carries the last failure.
    /// This aborts the current provider's run but never the batch.
    #[error("request failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// The credential file yielded nothing for this provider. Callers skip
    /// the provider and continue the batch.
    #[error("no {provider} credentials configured")]
    MissingCredentials { provider: &'static str },

    /// An endpoint URL failed to parse. Configuration-level mistake, not a
    /// transient condition.
    #[error("invalid endpoint URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}
