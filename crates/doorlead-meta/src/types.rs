//! Typed payloads for the Conversions API.

use serde::Serialize;

/// User identifiers attached to an event.
///
/// `em`/`ph` carry raw values on input; the client hashes them before
/// anything leaves the process. `fbp`/`fbc` are opaque browser/click
/// correlation tokens and pass through unhashed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub em: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ph: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbc: Option<String>,
}

/// Custom attributes carried on an event; also the input to deterministic
/// event-id derivation, so field order here is part of the dedup contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub door_issue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_source: Option<String>,
    /// Channel-specific extras (e.g. fields forwarded from track-event).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One standardized marketing event, before hashing/enrichment.
#[derive(Debug, Clone)]
pub struct ConversionEvent {
    pub event_name: String,
    /// Unix seconds.
    pub event_time: i64,
    pub event_source_url: Option<String>,
    /// Caller-supplied dedup id; derived deterministically when `None`.
    pub event_id: Option<String>,
    pub user_data: UserData,
    pub custom_data: Option<CustomData>,
}

impl ConversionEvent {
    /// A website-sourced event with the given name and unix-seconds timestamp.
    #[must_use]
    pub fn new(event_name: impl Into<String>, event_time: i64) -> Self {
        Self {
            event_name: event_name.into(),
            event_time,
            event_source_url: None,
            event_id: None,
            user_data: UserData::default(),
            custom_data: None,
        }
    }
}

/// Limited Data Use flags, sent exactly as the browser pixel sends them.
pub(crate) const DATA_PROCESSING_OPTIONS: &[&str] = &["LDU"];
pub(crate) const DATA_PROCESSING_COUNTRY: u8 = 1;
pub(crate) const DATA_PROCESSING_STATE: u16 = 1000;

/// Wire form of a single event after hashing and id assignment.
#[derive(Debug, Serialize)]
pub(crate) struct WireEvent<'a> {
    pub event_name: &'a str,
    pub event_time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_source_url: Option<&'a str>,
    pub action_source: &'static str,
    pub event_id: &'a str,
    pub user_data: &'a UserData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<&'a CustomData>,
    pub data_processing_options: &'static [&'static str],
    pub data_processing_options_country: u8,
    pub data_processing_options_state: u16,
}

/// Top-level request envelope: one or many events plus credentials.
#[derive(Debug, Serialize)]
pub(crate) struct EventsPayload<'a> {
    pub data: Vec<WireEvent<'a>>,
    pub access_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_event_code: Option<&'a str>,
}
