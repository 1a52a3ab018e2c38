//! Integration tests for `ResendClient` using wiremock HTTP mocks.

use doorlead_email::{EmailError, ResendClient};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> ResendClient {
    ResendClient::with_base_url("re_test_key", 30, base_url)
        .expect("client construction should not fail")
}

#[tokio::test]
async fn send_posts_message_with_bearer_auth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("authorization", "Bearer re_test_key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "msg_123"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    client
        .send(
            "Door Renew Leads <notifications@doorrenew.example>",
            "owner@doorrenew.example",
            "New Door Renew Lead",
            "Name: Sam",
        )
        .await
        .expect("send should succeed");

    let requests = server.received_requests().await.expect("recording enabled");
    let body: serde_json::Value =
        serde_json::from_slice(&requests[0].body).expect("request body is JSON");
    assert_eq!(
        body["from"],
        "Door Renew Leads <notifications@doorrenew.example>"
    );
    assert_eq!(body["to"], serde_json::json!(["owner@doorrenew.example"]));
    assert_eq!(body["subject"], "New Door Renew Lead");
    assert_eq!(body["text"], "Name: Sam");
}

#[tokio::test]
async fn send_surfaces_api_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(403).set_body_json(
            serde_json::json!({"statusCode": 403, "message": "API key is invalid", "name": "validation_error"}),
        ))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client
        .send("a@example.com", "b@example.com", "subject", "text")
        .await;

    match result {
        Err(EmailError::Api { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "API key is invalid");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}
