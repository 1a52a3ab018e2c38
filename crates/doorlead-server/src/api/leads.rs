//! Step-one lead intake and step-two enrichment handlers.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use doorlead_db::{NewLead, SecondStep};
use doorlead_meta::{lead_event_id, ConversionEvent, CustomData, UserData};

use super::{map_db_error, ApiError, AppState};
use crate::middleware::ClientIp;

// ---------------------------------------------------------------------------
// Request/response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct SubmitLeadRequest {
    pub first_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub door_issue: Option<String>,
    pub location: Option<String>,
    /// Browser/click correlation tokens captured by the page, forwarded
    /// opaquely for pixel deduplication.
    pub fbp: Option<String>,
    pub fbc: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct UtmQuery {
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct SubmitLeadResponse {
    pub success: bool,
    pub lead_id: Uuid,
    /// Dedup id of the server-side "Lead" event; the page reuses it for the
    /// pixel's client-side firing of the same logical event.
    pub event_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct UpdateLeadRequest {
    pub lead_id: Option<Uuid>,
    pub email: Option<String>,
    pub image_urls: Option<Vec<String>>,
    pub comments: Option<String>,
    pub door_issue: Option<String>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct UpdateLeadResponse {
    pub success: bool,
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Required-field check producing the specific message the form displays.
fn require<'a>(field: &str, value: Option<&'a String>) -> Result<&'a str, ApiError> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation(format!("Missing required field: {field}")))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/submit-lead — create a lead from the step-one form.
///
/// Order matters: rate limit and validation reject before any persistence;
/// the conversion event and the notification emails run after the row is
/// committed and cannot fail the request.
pub(in crate::api) async fn submit_lead(
    State(state): State<AppState>,
    Extension(ClientIp(ip)): Extension<ClientIp>,
    Query(utm): Query<UtmQuery>,
    headers: HeaderMap,
    Json(body): Json<SubmitLeadRequest>,
) -> Result<Json<SubmitLeadResponse>, ApiError> {
    if !state.limiter.check(&ip) {
        return Err(ApiError::rate_limited());
    }

    let first_name = require("firstName", body.first_name.as_ref())?;
    let phone = require("phone", body.phone.as_ref())?;
    let email = require("email", body.email.as_ref())?;
    let door_issue = require("doorIssue", body.door_issue.as_ref())?;

    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);

    let new = NewLead {
        first_name: first_name.to_owned(),
        phone: phone.to_owned(),
        email: Some(email.to_owned()),
        door_issue: Some(door_issue.to_owned()),
        location: body.location.clone(),
        source: "direct".to_string(),
        utm_source: utm.utm_source,
        utm_medium: utm.utm_medium,
        utm_campaign: utm.utm_campaign,
        user_agent: user_agent.clone(),
        ip_address: Some(ip.clone()),
        ..NewLead::default()
    };
    let lead = doorlead_db::create_lead(&state.pool, &new)
        .await
        .map_err(|e| map_db_error(&e))?;

    let event_time = Utc::now().timestamp();
    let event_id = lead_event_id(email, phone, event_time);

    let mut event = ConversionEvent::new("Lead", event_time);
    event.event_id = Some(event_id.clone());
    event.event_source_url = body.url.clone();
    event.user_data = UserData {
        client_ip_address: Some(ip),
        client_user_agent: user_agent,
        em: Some(vec![email.to_owned()]),
        ph: Some(vec![phone.to_owned()]),
        fbp: body.fbp.clone(),
        fbc: body.fbc.clone(),
    };
    event.custom_data = Some(CustomData {
        location: lead.location.clone(),
        door_issue: lead.door_issue.clone(),
        ..CustomData::default()
    });
    state.meta.send(event).await;

    state.notifier.lead_created(&lead).await;

    Ok(Json(SubmitLeadResponse {
        success: true,
        lead_id: lead.id,
        event_id,
    }))
}

/// POST /api/update-lead — attach second-step information to an existing lead.
///
/// Matches by `leadId` when supplied; otherwise falls back to the most
/// recently created lead with the given email (the legacy heuristic for
/// callers that lost the id).
pub(in crate::api) async fn update_lead(
    State(state): State<AppState>,
    Json(body): Json<UpdateLeadRequest>,
) -> Result<Json<UpdateLeadResponse>, ApiError> {
    let existing = match (body.lead_id, body.email.as_deref()) {
        (Some(id), _) => doorlead_db::find_lead_by_id(&state.pool, id)
            .await
            .map_err(|e| map_db_error(&e))?,
        (None, Some(email)) => doorlead_db::find_latest_lead_by_email(&state.pool, email)
            .await
            .map_err(|e| map_db_error(&e))?,
        (None, None) => {
            return Err(ApiError::validation(
                "Either leadId or email is required to match the lead",
            ));
        }
    };
    let Some(existing) = existing else {
        return Err(ApiError::not_found("Lead not found"));
    };

    let step = SecondStep {
        image_urls: body.image_urls.unwrap_or_default(),
        comments: body.comments,
        door_issue: body.door_issue,
        email: body.email,
    };
    let updated = doorlead_db::apply_second_step(&state.pool, existing.id, &step)
        .await
        .map_err(|e| match e {
            doorlead_db::DbError::NotFound => ApiError::not_found("Lead not found"),
            other => map_db_error(&other),
        })?;

    state.notifier.lead_updated(&updated).await;

    Ok(Json(UpdateLeadResponse {
        success: true,
        message: "Lead updated successfully and notifications sent",
    }))
}
