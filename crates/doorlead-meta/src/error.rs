use thiserror::Error;

/// Errors internal to the Conversions API client.
///
/// These never escape [`crate::MetaClient::send`]; they exist so the retry
/// loop can distinguish transient delivery failures from payload problems.
#[derive(Debug, Error)]
pub enum MetaError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("Conversions API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be parsed as JSON.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL does not produce a valid events endpoint.
    #[error("invalid events URL {0}")]
    BaseUrl(String),
}
