//! Third-party lead intake: LeadBridge and Zapier push endpoints.
//!
//! Both providers deliver Facebook lead-form submissions, differing in
//! payload shape and authentication header. Payloads are normalized through
//! alias lists, the form id resolves to `{location, lead_type}` via the
//! market directory, and delivery is at-least-once — repeated deliveries
//! create duplicate rows by accepted design.

use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;
use serde_json::Value;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use doorlead_db::NewLead;

use super::{map_db_error, ApiError, AppState};

const LEADBRIDGE_TOKEN_HEADER: &str = "x-leadbridge-token";
const ZAPIER_SECRET_HEADER: &str = "x-zapier-secret";

// ---------------------------------------------------------------------------
// Payload shapes
// ---------------------------------------------------------------------------

fn nested_body(raw: &Value) -> Option<&Value> {
    raw.get("body").filter(|v| v.is_object())
}

fn nested_data(raw: &Value) -> Option<&Value> {
    raw.get("DATA").filter(|v| v.is_object())
}

fn first_array_element(raw: &Value) -> Option<&Value> {
    raw.as_array().and_then(|a| a.first()).filter(|v| v.is_object())
}

/// Wrapper shapes providers have been observed to deliver, tried in order;
/// a raw body matching none of them is used as the payload itself.
const PAYLOAD_SHAPES: &[for<'a> fn(&'a Value) -> Option<&'a Value>] =
    &[nested_body, nested_data, first_array_element];

fn extract_payload(raw: &Value) -> &Value {
    PAYLOAD_SHAPES
        .iter()
        .find_map(|shape| shape(raw))
        .unwrap_or(raw)
}

// ---------------------------------------------------------------------------
// Field normalization
// ---------------------------------------------------------------------------

/// First non-empty value among the aliases for a logical field. Numeric
/// values (form ids sometimes arrive as JSON numbers) are stringified.
fn field(payload: &Value, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|key| match payload.get(key) {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn normalize_phone(raw: &str) -> String {
    raw.strip_prefix('+').unwrap_or(raw).to_owned()
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

fn token_matches(expected: &str, candidate: &str) -> bool {
    candidate.len() == expected.len()
        && bool::from(candidate.as_bytes().ct_eq(expected.as_bytes()))
}

/// With no configured secret the endpoint accepts unauthenticated
/// deliveries; otherwise either the header or the in-body token must match.
fn authorize(configured: Option<&str>, header: Option<&str>, body: Option<&str>) -> bool {
    let Some(expected) = configured else {
        return true;
    };
    [header, body]
        .into_iter()
        .flatten()
        .any(|candidate| token_matches(expected, candidate))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(in crate::api) struct ProbeResponse {
    pub status: &'static str,
}

/// GET /api/leadbridge-webhook — provider-side connectivity probe.
pub(in crate::api) async fn webhook_probe() -> Json<ProbeResponse> {
    Json(ProbeResponse {
        status: "webhook endpoint active",
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct LeadBridgeResponse {
    pub success: bool,
    pub lead_id: Uuid,
    pub location: Option<String>,
}

/// POST /api/leadbridge-webhook — lead pushed by LeadBridge.
pub(in crate::api) async fn leadbridge_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(raw): Json<Value>,
) -> Result<Json<LeadBridgeResponse>, ApiError> {
    let payload = extract_payload(&raw);

    let header_token = headers
        .get(LEADBRIDGE_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());
    let body_token = field(payload, &["secret"]);
    if !authorize(
        state.secrets.leadbridge.as_deref(),
        header_token,
        body_token.as_deref(),
    ) {
        return Err(ApiError::forbidden("Invalid token"));
    }

    let form_id = field(payload, &["form_id"]);
    let form = form_id
        .as_deref()
        .and_then(|id| state.markets.form(id))
        .cloned();

    let new = NewLead {
        first_name: field(payload, &["full_name", "name"]).unwrap_or_default(),
        phone: field(payload, &["phone_number", "phone"])
            .map(|p| normalize_phone(&p))
            .unwrap_or_default(),
        email: field(payload, &["email"]),
        location: form.as_ref().map(|f| f.location.clone()),
        lead_type: form.as_ref().map(|f| f.lead_type.to_string()),
        source: "facebook_leadbridge".to_string(),
        campaign_name: field(payload, &["campaign_name"]),
        form_id,
        form_name: field(payload, &["form_name"]),
        ..NewLead::default()
    };
    let lead = doorlead_db::create_lead(&state.pool, &new)
        .await
        .map_err(|e| map_db_error(&e))?;

    state
        .notifier
        .webhook_lead("LeadBridge", &lead, form.is_some(), payload)
        .await;

    Ok(Json(LeadBridgeResponse {
        success: true,
        lead_id: lead.id,
        location: lead.location,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct ZapierResponse {
    pub success: bool,
    pub lead_id: Uuid,
    pub location: Option<String>,
    pub lead_type: Option<String>,
    pub form_id: Option<String>,
}

/// POST /api/zapier-webhook — lead pushed by Zapier.
pub(in crate::api) async fn zapier_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(raw): Json<Value>,
) -> Result<Json<ZapierResponse>, ApiError> {
    let payload = extract_payload(&raw);

    let header_token = headers
        .get(ZAPIER_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    let body_token = field(payload, &["zapier_secret"]);
    if !authorize(
        state.secrets.zapier.as_deref(),
        header_token,
        body_token.as_deref(),
    ) {
        return Err(ApiError::forbidden("Invalid authentication token"));
    }

    // Zapier forwards the Facebook form id under the bare `id` key.
    let form_id = field(payload, &["id", "form_id"]);
    let form = form_id
        .as_deref()
        .and_then(|id| state.markets.form(id))
        .cloned();

    let new = NewLead {
        first_name: field(payload, &["full_name", "name"]).unwrap_or_default(),
        phone: field(payload, &["phone_number", "phone"])
            .map(|p| normalize_phone(&p))
            .unwrap_or_default(),
        email: field(payload, &["email"]),
        location: form.as_ref().map(|f| f.location.clone()),
        lead_type: form.as_ref().map(|f| f.lead_type.to_string()),
        source: "facebook_zapier".to_string(),
        utm_source: field(payload, &["utm_source"]),
        utm_medium: field(payload, &["utm_medium"]),
        utm_campaign: field(payload, &["utm_campaign"]),
        campaign_name: field(payload, &["campaign_name"]),
        ad_name: field(payload, &["ad_name"]),
        form_id,
        form_name: field(payload, &["form_name"]),
        ..NewLead::default()
    };
    let lead = doorlead_db::create_lead(&state.pool, &new)
        .await
        .map_err(|e| map_db_error(&e))?;

    state
        .notifier
        .webhook_lead("Zapier", &lead, form.is_some(), payload)
        .await;

    Ok(Json(ZapierResponse {
        success: true,
        lead_id: lead.id,
        location: lead.location,
        lead_type: lead.lead_type,
        form_id: lead.form_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::test_state;
    use super::super::build_app;
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    // -----------------------------------------------------------------------
    // Unit tests — payload shapes, aliases, auth
    // -----------------------------------------------------------------------

    #[test]
    fn extract_prefers_nested_body() {
        let raw = serde_json::json!({"body": {"full_name": "Sam"}, "noise": 1});
        assert_eq!(extract_payload(&raw)["full_name"], "Sam");
    }

    #[test]
    fn extract_falls_back_to_data_wrapper() {
        let raw = serde_json::json!({"DATA": {"full_name": "Sam"}});
        assert_eq!(extract_payload(&raw)["full_name"], "Sam");
    }

    #[test]
    fn extract_takes_first_array_element() {
        let raw = serde_json::json!([{"full_name": "Sam"}, {"full_name": "Alex"}]);
        assert_eq!(extract_payload(&raw)["full_name"], "Sam");
    }

    #[test]
    fn extract_uses_flat_payload_as_is() {
        let raw = serde_json::json!({"full_name": "Sam"});
        assert_eq!(extract_payload(&raw)["full_name"], "Sam");
    }

    #[test]
    fn field_walks_aliases_in_order() {
        let payload = serde_json::json!({"phone": "111", "phone_number": "222"});
        assert_eq!(
            field(&payload, &["phone_number", "phone"]).as_deref(),
            Some("222")
        );
        assert_eq!(field(&payload, &["missing"]), None);
    }

    #[test]
    fn field_stringifies_numeric_form_ids() {
        let payload = serde_json::json!({"form_id": 1248830573015854_i64});
        assert_eq!(
            field(&payload, &["form_id"]).as_deref(),
            Some("1248830573015854")
        );
    }

    #[test]
    fn normalize_phone_strips_leading_plus_only() {
        assert_eq!(normalize_phone("+15551234567"), "15551234567");
        assert_eq!(normalize_phone("5551234567"), "5551234567");
    }

    #[test]
    fn authorize_accepts_anything_when_unconfigured() {
        assert!(authorize(None, None, None));
        assert!(authorize(None, Some("whatever"), None));
    }

    #[test]
    fn authorize_matches_header_or_body() {
        assert!(authorize(Some("s3cret"), Some("s3cret"), None));
        assert!(authorize(Some("s3cret"), None, Some("s3cret")));
        assert!(!authorize(Some("s3cret"), Some("wrong"), Some("also-wrong")));
        assert!(!authorize(Some("s3cret"), None, None));
    }

    // -----------------------------------------------------------------------
    // Route integration tests
    // -----------------------------------------------------------------------

    fn webhook_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn zapier_maps_known_form_to_location_and_type(pool: sqlx::PgPool) {
        let app = build_app(test_state(pool.clone()));
        let response = app
            .oneshot(webhook_request(
                "/api/zapier-webhook",
                serde_json::json!({
                    "id": "1248830573015854",
                    "full_name": "Jordan Fields",
                    "phone_number": "+14075551000",
                    "email": "jordan@example.com",
                    "campaign_name": "Spring Doors",
                    "ad_name": "Before/After",
                    "utm_source": "facebook",
                }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        assert_eq!(json["success"], true);
        assert_eq!(json["location"], "orlando");
        assert_eq!(json["leadType"], "door");

        let lead_id: uuid::Uuid = json["leadId"].as_str().unwrap().parse().unwrap();
        let lead = doorlead_db::find_lead_by_id(&pool, lead_id)
            .await
            .expect("query")
            .expect("row exists");
        assert_eq!(lead.source, "facebook_zapier");
        assert_eq!(lead.phone, "14075551000", "leading + stripped");
        assert_eq!(lead.location.as_deref(), Some("orlando"));
        assert_eq!(lead.lead_type.as_deref(), Some("door"));
        assert_eq!(lead.utm_source.as_deref(), Some("facebook"));
        assert_eq!(lead.ad_name.as_deref(), Some("Before/After"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn zapier_unknown_form_persists_without_location(pool: sqlx::PgPool) {
        let app = build_app(test_state(pool.clone()));
        let response = app
            .oneshot(webhook_request(
                "/api/zapier-webhook",
                serde_json::json!({
                    "id": "999999999",
                    "full_name": "Jordan Fields",
                    "phone_number": "4075551000",
                }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        let lead_id: uuid::Uuid = json["leadId"].as_str().unwrap().parse().unwrap();

        let lead = doorlead_db::find_lead_by_id(&pool, lead_id)
            .await
            .expect("query")
            .expect("row exists");
        assert!(lead.location.is_none());
        assert!(lead.lead_type.is_none());
        assert_eq!(lead.form_id.as_deref(), Some("999999999"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn zapier_rejects_mismatched_secret(pool: sqlx::PgPool) {
        let mut state = test_state(pool.clone());
        state.secrets.zapier = Some("top-secret".to_string());
        let app = build_app(state);

        let response = app
            .oneshot(webhook_request(
                "/api/zapier-webhook",
                serde_json::json!({
                    "id": "1248830573015854",
                    "full_name": "Jordan Fields",
                    "zapier_secret": "wrong",
                }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(count, 0, "rejected delivery is not persisted");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn zapier_accepts_secret_from_header(pool: sqlx::PgPool) {
        let mut state = test_state(pool);
        state.secrets.zapier = Some("top-secret".to_string());
        let app = build_app(state);

        let request = Request::builder()
            .method("POST")
            .uri("/api/zapier-webhook")
            .header("content-type", "application/json")
            .header("x-zapier-secret", "top-secret")
            .body(Body::from(
                serde_json::json!({
                    "id": "1248830573015854",
                    "full_name": "Jordan Fields",
                    "phone_number": "4075551000",
                })
                .to_string(),
            ))
            .expect("request");
        let response = app.oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn leadbridge_parses_payload_nested_under_body(pool: sqlx::PgPool) {
        let app = build_app(test_state(pool.clone()));
        let response = app
            .oneshot(webhook_request(
                "/api/leadbridge-webhook",
                serde_json::json!({
                    "body": {
                        "form_id": "3844541842467999",
                        "name": "Riley Poole",
                        "phone": "+14075552000",
                        "campaign_name": "Cabinets Q3",
                    }
                }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        assert_eq!(json["location"], "orlando");

        let lead_id: uuid::Uuid = json["leadId"].as_str().unwrap().parse().unwrap();
        let lead = doorlead_db::find_lead_by_id(&pool, lead_id)
            .await
            .expect("query")
            .expect("row exists");
        assert_eq!(lead.first_name, "Riley Poole", "name alias normalized");
        assert_eq!(lead.phone, "14075552000");
        assert_eq!(lead.lead_type.as_deref(), Some("cabinet"));
        assert_eq!(lead.source, "facebook_leadbridge");
        assert_eq!(lead.campaign_name.as_deref(), Some("Cabinets Q3"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn leadbridge_probe_answers_on_get(pool: sqlx::PgPool) {
        let app = build_app(test_state(pool));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/leadbridge-webhook")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
        assert_eq!(json["status"], "webhook endpoint active");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn duplicate_deliveries_create_duplicate_rows(pool: sqlx::PgPool) {
        let app = build_app(test_state(pool.clone()));
        let payload = serde_json::json!({
            "id": "1248830573015854",
            "full_name": "Jordan Fields",
            "phone_number": "4075551000",
        });

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(webhook_request("/api/zapier-webhook", payload.clone()))
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::OK);
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads")
            .fetch_one(&pool)
            .await
            .expect("count");
        assert_eq!(count, 2, "at-least-once delivery is not deduplicated");
    }
}
