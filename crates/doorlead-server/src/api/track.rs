//! Page-view and interaction conversion-event endpoints.
//!
//! Both endpoints answer `{"success": true}` unconditionally: event delivery
//! is best-effort and the page must never see an attribution failure.

use axum::{extract::State, http::HeaderMap, Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use doorlead_meta::{ConversionEvent, CustomData, UserData};

use super::AppState;
use crate::middleware::ClientIp;

#[derive(Debug, Serialize)]
pub(in crate::api) struct TrackResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct TrackViewRequest {
    pub location: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct TrackEventRequest {
    pub event_name: String,
    pub location: Option<String>,
    pub url: Option<String>,
    /// Anything else the page attaches rides along into `custom_data`.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Interaction names the page may report, mapped to the standard event the
/// attribution platform optimizes on. Only "Lead"-mapped interactions are
/// forwarded; the rest are logged and dropped.
fn map_event_name(event_name: &str) -> Option<&'static str> {
    match event_name {
        "FormSubmit" | "CallButtonClick" => Some("Lead"),
        _ => None,
    }
}

fn request_user_data(ip: String, headers: &HeaderMap) -> UserData {
    UserData {
        client_ip_address: Some(ip),
        client_user_agent: headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned),
        ..UserData::default()
    }
}

/// POST /api/track-view — fire a "ViewContent" event for a page view.
pub(in crate::api) async fn track_view(
    State(state): State<AppState>,
    Extension(ClientIp(ip)): Extension<ClientIp>,
    headers: HeaderMap,
    Json(body): Json<TrackViewRequest>,
) -> Json<TrackResponse> {
    let mut event = ConversionEvent::new("ViewContent", Utc::now().timestamp());
    event.event_source_url = body.url;
    event.user_data = request_user_data(ip, &headers);
    event.custom_data = Some(CustomData {
        location: body.location,
        ..CustomData::default()
    });

    state.meta.send(event).await;

    Json(TrackResponse { success: true })
}

/// POST /api/track-event — fire a conversion event for a page interaction.
pub(in crate::api) async fn track_event(
    State(state): State<AppState>,
    Extension(ClientIp(ip)): Extension<ClientIp>,
    headers: HeaderMap,
    Json(body): Json<TrackEventRequest>,
) -> Json<TrackResponse> {
    let Some(mapped) = map_event_name(&body.event_name) else {
        tracing::debug!(
            event_name = %body.event_name,
            location = body.location.as_deref(),
            "non-lead interaction; not forwarded"
        );
        return Json(TrackResponse { success: true });
    };

    let lead_source = if body.event_name == "CallButtonClick" {
        "phone"
    } else {
        "form"
    };

    let mut event = ConversionEvent::new(mapped, Utc::now().timestamp());
    event.event_source_url = body.url;
    event.user_data = request_user_data(ip, &headers);
    event.custom_data = Some(CustomData {
        location: body.location,
        lead_source: Some(lead_source.to_string()),
        extra: body.extra,
        ..CustomData::default()
    });

    state.meta.send(event).await;

    Json(TrackResponse { success: true })
}
