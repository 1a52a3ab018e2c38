//! HTTP client for the Meta Conversions API.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::MetaError;
use crate::hash::{deterministic_event_id, hash_identifier};
use crate::retry::retry_with_backoff;
use crate::types::{
    ConversionEvent, EventsPayload, UserData, WireEvent, DATA_PROCESSING_COUNTRY,
    DATA_PROCESSING_OPTIONS, DATA_PROCESSING_STATE,
};

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v18.0";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Client for the Meta Conversions API.
///
/// Constructed disabled when pixel id or access token are absent; a disabled
/// client logs and returns `None` from [`MetaClient::send`] instead of
/// failing its caller.
pub struct MetaClient {
    inner: Option<Enabled>,
}

struct Enabled {
    client: Client,
    events_url: Url,
    access_token: String,
    test_event_code: Option<String>,
    max_retries: u32,
    retry_base_ms: u64,
}

impl MetaClient {
    /// A permanently disabled client: every [`MetaClient::send`] is a no-op.
    #[must_use]
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Builds a client from application config.
    ///
    /// Missing credentials degrade to a disabled client rather than an error.
    /// The test-event code is only attached outside production.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn from_config(config: &doorlead_core::AppConfig) -> Result<Self, MetaError> {
        let (Some(pixel_id), Some(access_token)) =
            (config.meta_pixel_id.as_ref(), config.meta_access_token.as_ref())
        else {
            tracing::warn!(
                "META_PIXEL_ID / META_ACCESS_TOKEN not set; conversion events disabled"
            );
            return Ok(Self::disabled());
        };

        let test_event_code = if config.env == doorlead_core::Environment::Production {
            None
        } else {
            config.meta_test_event_code.clone()
        };

        let mut client = Self::with_base_url(
            pixel_id,
            access_token,
            config.meta_timeout_secs,
            DEFAULT_BASE_URL,
        )?;
        if let Some(enabled) = client.inner.as_mut() {
            enabled.test_event_code = test_event_code;
            enabled.max_retries = config.meta_max_retries;
            enabled.retry_base_ms = config.meta_retry_base_ms;
        }
        Ok(client)
    }

    /// Creates an enabled client pointed at the production Graph API.
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(pixel_id: &str, access_token: &str) -> Result<Self, MetaError> {
        Self::with_base_url(pixel_id, access_token, DEFAULT_TIMEOUT_SECS, DEFAULT_BASE_URL)
    }

    /// Creates an enabled client with a custom base URL (for wiremock tests).
    ///
    /// # Errors
    ///
    /// Returns [`MetaError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`MetaError::BaseUrl`] if the resulting events URL
    /// is invalid.
    pub fn with_base_url(
        pixel_id: &str,
        access_token: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, MetaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("doorlead/0.1 (conversion-events)")
            .build()?;

        let raw = format!("{}/{pixel_id}/events", base_url.trim_end_matches('/'));
        let events_url =
            Url::parse(&raw).map_err(|e| MetaError::BaseUrl(format!("'{raw}': {e}")))?;

        Ok(Self {
            inner: Some(Enabled {
                client,
                events_url,
                access_token: access_token.to_owned(),
                test_event_code: None,
                max_retries: 3,
                retry_base_ms: 1_000,
            }),
        })
    }

    /// Overrides the retry schedule (attempts beyond the first, base delay).
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, retry_base_ms: u64) -> Self {
        if let Some(enabled) = self.inner.as_mut() {
            enabled.max_retries = max_retries;
            enabled.retry_base_ms = retry_base_ms;
        }
        self
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Delivers one event, best-effort.
    ///
    /// Resolves the event id (deriving a deterministic one when the caller
    /// did not supply it), hashes `em`/`ph`, and POSTs with retry. Returns
    /// the parsed API response, or `None` on any failure or when the client
    /// is disabled. Never returns an error: callers must not branch business
    /// logic on delivery success.
    pub async fn send(&self, event: ConversionEvent) -> Option<serde_json::Value> {
        let Some(enabled) = self.inner.as_ref() else {
            tracing::debug!(
                event_name = %event.event_name,
                "conversion client disabled; dropping event"
            );
            return None;
        };

        let event_id = event.event_id.clone().unwrap_or_else(|| {
            deterministic_event_id(&event.event_name, event.event_time, event.custom_data.as_ref())
        });
        let user_data = hash_user_data(&event.user_data);

        let wire = WireEvent {
            event_name: &event.event_name,
            event_time: event.event_time,
            event_source_url: event.event_source_url.as_deref(),
            action_source: "website",
            event_id: &event_id,
            user_data: &user_data,
            custom_data: event.custom_data.as_ref(),
            data_processing_options: DATA_PROCESSING_OPTIONS,
            data_processing_options_country: DATA_PROCESSING_COUNTRY,
            data_processing_options_state: DATA_PROCESSING_STATE,
        };
        let payload = EventsPayload {
            data: vec![wire],
            access_token: &enabled.access_token,
            test_event_code: enabled.test_event_code.as_deref(),
        };

        let result = retry_with_backoff(enabled.max_retries, enabled.retry_base_ms, || {
            enabled.post_events(&payload)
        })
        .await;

        match result {
            Ok(response) => Some(response),
            Err(err) => {
                tracing::error!(
                    event_name = %event.event_name,
                    event_id = %event_id,
                    error = %err,
                    "conversion event delivery abandoned"
                );
                None
            }
        }
    }
}

impl Enabled {
    /// One POST of the events envelope; non-2xx surfaces the API's own error
    /// message when the body carries one.
    async fn post_events(&self, payload: &EventsPayload<'_>) -> Result<serde_json::Value, MetaError> {
        let response = self
            .client
            .post(self.events_url.clone())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: serde_json::Value = match serde_json::from_str(&body) {
            Ok(value) => value,
            // A failure body that isn't JSON still maps to the status error.
            Err(e) if status.is_success() => {
                return Err(MetaError::Deserialize {
                    context: self.events_url.to_string(),
                    source: e,
                });
            }
            Err(_) => serde_json::Value::Null,
        };

        if !status.is_success() {
            let message = parsed
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(MetaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(parsed)
    }
}

/// Hashes `em`/`ph` in place-copy; correlation tokens pass through untouched.
fn hash_user_data(user_data: &UserData) -> UserData {
    let mut hashed = user_data.clone();
    hashed.em = user_data
        .em
        .as_ref()
        .map(|values| values.iter().map(|v| hash_identifier(v)).collect());
    hashed.ph = user_data
        .ph
        .as_ref()
        .map(|values| values.iter().map(|v| hash_identifier(v)).collect());
    hashed
}
