//! Integration tests for the reqwest transport

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use classdesk_application::ports::{HttpTransport, OutgoingRequest, TransportError};
use classdesk_domain::ClientSettings;
use classdesk_domain::request::{Headers, HttpMethod};
use classdesk_infrastructure::ReqwestTransport;
use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(timeout_ms: u64) -> ClientSettings {
    ClientSettings {
        timeout_ms,
        ..ClientSettings::default()
    }
}

fn outgoing(method: HttpMethod, url: &str) -> OutgoingRequest {
    OutgoingRequest {
        method,
        url: Url::parse(url).unwrap(),
        headers: Headers::new(),
        body: None,
    }
}

#[tokio::test]
async fn test_sends_headers_and_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/classes"))
        .and(header("authorization", "Bearer T1"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"name": "P6 A"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "c1"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new(&settings(5_000)).unwrap();
    let mut request = outgoing(
        HttpMethod::Post,
        &format!("{}/api/v1/classes", mock_server.uri()),
    );
    request.headers.set("Authorization", "Bearer T1");
    request.headers.set("Content-Type", "application/json");
    request.body = Some(json!({"name": "P6 A"}));

    let response = transport.execute(request).await.unwrap();

    assert_eq!(response.status.as_u16(), 201);
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["id"], "c1");
}

#[tokio::test]
async fn test_error_statuses_are_responses() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Could not validate credentials"})),
        )
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new(&settings(5_000)).unwrap();
    let response = transport
        .execute(outgoing(
            HttpMethod::Get,
            &format!("{}/api/v1/auth/me", mock_server.uri()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status.as_u16(), 401);
    assert!(response.text().contains("Could not validate credentials"));
    assert!(response.headers.contains("content-type"));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new(&settings(50)).unwrap();
    let error = transport
        .execute(outgoing(HttpMethod::Get, &mock_server.uri()))
        .await
        .unwrap_err();

    assert_eq!(error, TransportError::Timeout { timeout_ms: 50 });
}

#[tokio::test]
async fn test_unreachable_host_is_connection_failure() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let transport = ReqwestTransport::new(&settings(2_000)).unwrap();
    let error = transport
        .execute(outgoing(
            HttpMethod::Get,
            &format!("http://127.0.0.1:{port}/api/v1/schools"),
        ))
        .await
        .unwrap_err();

    assert!(
        matches!(error, TransportError::ConnectionFailed(_)),
        "{error:?}"
    );
}
