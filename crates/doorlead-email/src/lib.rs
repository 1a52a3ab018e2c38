//! Minimal client for the Resend transactional-email REST API.
//!
//! One call, one message. Callers that must never fail on a notification
//! (the lead endpoints) wrap this client and swallow [`EmailError`]s; the
//! client itself reports failures honestly.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Serialize;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://api.resend.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum EmailError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("Resend API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The configured base URL is not a valid URL.
    #[error("invalid base URL {0}")]
    BaseUrl(String),
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a [&'a str],
    subject: &'a str,
    text: &'a str,
}

/// Client for the Resend `POST /emails` endpoint.
pub struct ResendClient {
    client: Client,
    api_key: String,
    send_url: Url,
}

impl ResendClient {
    /// Creates a client pointed at the production Resend API.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str) -> Result<Self, EmailError> {
        Self::with_base_url(api_key, DEFAULT_TIMEOUT_SECS, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for wiremock tests).
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`EmailError::BaseUrl`] if `base_url` is
    /// not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, EmailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("doorlead/0.1 (lead-notifications)")
            .build()?;

        let raw = format!("{}/emails", base_url.trim_end_matches('/'));
        let send_url = Url::parse(&raw).map_err(|e| EmailError::BaseUrl(format!("'{raw}': {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            send_url,
        })
    }

    /// Sends one plain-text message.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError::Http`] on network failure or
    /// [`EmailError::Api`] when the API rejects the message.
    pub async fn send(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        text: &str,
    ) -> Result<(), EmailError> {
        let request = SendRequest {
            from,
            to: &[to],
            subject,
            text,
        };
        tracing::debug!(to, subject, "sending notification email");

        let response = self
            .client
            .post(self.send_url.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("message")
                        .and_then(serde_json::Value::as_str)
                        .map(ToOwned::to_owned)
                })
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(EmailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
