//! HTTP client for the Vercel Blob REST API.

use std::time::Duration;

use rand::{distr::Alphanumeric, Rng};
use reqwest::{Client, Url};

use crate::validate::{validate_batch, UploadFile};
use crate::UploadError;

const DEFAULT_BASE_URL: &str = "https://blob.vercel-storage.com";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const API_VERSION: &str = "7";
const KEY_TOKEN_LEN: usize = 21;

/// Client for blob storage puts.
pub struct BlobClient {
    client: Client,
    token: String,
    base_url: Url,
}

impl BlobClient {
    /// Creates a client pointed at the production blob store.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(token: &str) -> Result<Self, UploadError> {
        Self::with_base_url(token, DEFAULT_TIMEOUT_SECS, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for wiremock tests).
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`UploadError::BaseUrl`] if `base_url` is
    /// not a valid URL.
    pub fn with_base_url(
        token: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, UploadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("doorlead/0.1 (image-upload)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| UploadError::BaseUrl(format!("'{normalised}': {e}")))?;

        Ok(Self {
            client,
            token: token.to_owned(),
            base_url,
        })
    }

    /// Uploads a validated batch and returns the stored URLs in input order.
    ///
    /// Per-file transfers run concurrently; the result order matches the
    /// input order regardless of completion order. Already-stored files are
    /// not rolled back when a later transfer fails.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Validation`] (before any upload) if the batch
    /// violates a constraint, or the first transfer error otherwise.
    pub async fn upload_batch(&self, files: &[UploadFile]) -> Result<Vec<String>, UploadError> {
        validate_batch(files)?;

        let puts = files.iter().map(|file| self.put_file(file));
        futures::future::try_join_all(puts).await
    }

    /// Stores one file under a collision-resistant key and returns its URL.
    async fn put_file(&self, file: &UploadFile) -> Result<String, UploadError> {
        let key = format!("{}-{}", random_token(), file.filename);
        let url = self
            .base_url
            .join(&key)
            .map_err(|e| UploadError::BaseUrl(format!("'{key}': {e}")))?;

        tracing::debug!(key = %key, bytes = file.bytes.len(), "uploading image");

        let response = self
            .client
            .put(url.clone())
            .bearer_auth(&self.token)
            .header("x-api-version", API_VERSION)
            .header("x-content-type", &file.content_type)
            .body(file.bytes.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UploadError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: serde_json::Value = response.json().await?;
        body.get("url")
            .and_then(serde_json::Value::as_str)
            .map(ToOwned::to_owned)
            .ok_or_else(|| UploadError::MalformedResponse {
                context: url.to_string(),
                reason: "response missing 'url'".to_string(),
            })
    }
}

/// 21-character alphanumeric token prefixed to storage keys so concurrent
/// callers uploading identically named files never collide.
fn random_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_token_has_expected_shape() {
        let token = random_token();
        assert_eq!(token.len(), KEY_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn random_tokens_differ() {
        assert_ne!(random_token(), random_token());
    }

    #[test]
    fn with_base_url_normalises_trailing_slash() {
        let client = BlobClient::with_base_url("tok", 10, "https://blob.example.com")
            .expect("client construction should not fail");
        assert_eq!(client.base_url.as_str(), "https://blob.example.com/");
    }
}
