use thiserror::Error;

/// Errors from the image upload service.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The batch failed a pre-upload constraint; nothing was uploaded.
    /// The message is shown to the visitor as-is.
    #[error("{0}")]
    Validation(String),

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The storage API answered with a non-2xx status.
    #[error("blob storage error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The storage API's response did not contain the stored URL.
    #[error("malformed blob storage response for {context}: {reason}")]
    MalformedResponse { context: String, reason: String },

    /// The configured base URL is not a valid URL.
    #[error("invalid base URL {0}")]
    BaseUrl(String),
}
