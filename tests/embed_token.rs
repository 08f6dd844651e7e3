use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use embed_broker::config::{EmbedConfig, EmbedType, DEFAULT_CONTENT_BASE};
use embed_broker::embed_token::EmbedTokenClient;
use embed_broker::error::EmbedError;

fn test_config(api_base: &str, embed_type: EmbedType) -> EmbedConfig {
    EmbedConfig {
        client_id: "client-id".into(),
        client_secret: "client-secret".into(),
        embed_id: "abc123".into(),
        embed_type,
        session_length_minutes: 60,
        permissions: vec!["READ".into(), "FILTER".into()],
        filter_column: "customer_id".into(),
        filter_operator: "EQUALS".into(),
        customer_id_field: "custentity_customer_id".into(),
        output_field: "custpage_embed_html".into(),
        record_kind: "customer".into(),
        api_base: api_base.trim_end_matches('/').into(),
        content_base: DEFAULT_CONTENT_BASE.into(),
        http_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn scoped_request_carries_the_customer_filter() {
    let server = MockServer::start_async().await;

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/stories/embed/auth")
            .header("authorization", "bearer SVC1")
            .json_body(json!({
                "sessionLength": 60,
                "authorizations": [{
                    "token": "abc123",
                    "permissions": ["READ", "FILTER"],
                    "filters": [{
                        "column": "customer_id",
                        "operator": "EQUALS",
                        "values": ["CUST-42"],
                    }],
                }],
            }));
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"authentication":"EMB1"}"#);
    });

    let client =
        EmbedTokenClient::new(&test_config(&server.base_url(), EmbedType::Dashboard)).unwrap();
    let token = client.fetch("SVC1", Some("CUST-42")).await.unwrap();

    assert_eq!(token, "EMB1");
    mock.assert();
}

#[tokio::test]
async fn absent_customer_id_sends_empty_filters() {
    let server = MockServer::start_async().await;

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/stories/embed/auth")
            .json_body(json!({
                "sessionLength": 60,
                "authorizations": [{
                    "token": "abc123",
                    "permissions": ["READ", "FILTER"],
                    "filters": [],
                }],
            }));
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"authentication":"EMB-OPEN"}"#);
    });

    let client =
        EmbedTokenClient::new(&test_config(&server.base_url(), EmbedType::Dashboard)).unwrap();
    let token = client.fetch("SVC1", None).await.unwrap();

    assert_eq!(token, "EMB-OPEN");
    mock.assert();
}

#[tokio::test]
async fn card_type_uses_the_cards_endpoint() {
    let server = MockServer::start_async().await;

    let mock = server.mock(|when, then| {
        when.method(POST).path("/v1/cards/embed/auth");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"authentication":"EMB-CARD"}"#);
    });

    let client = EmbedTokenClient::new(&test_config(&server.base_url(), EmbedType::Card)).unwrap();
    let token = client.fetch("SVC1", Some("CUST-42")).await.unwrap();

    assert_eq!(token, "EMB-CARD");
    mock.assert();
}

#[tokio::test]
async fn rejected_status_is_an_auth_error() {
    let server = MockServer::start_async().await;

    let mock = server.mock(|when, then| {
        when.method(POST).path("/v1/stories/embed/auth");
        then.status(403)
            .header("content-type", "application/json")
            .body(r#"{"error":"forbidden"}"#);
    });

    let client =
        EmbedTokenClient::new(&test_config(&server.base_url(), EmbedType::Dashboard)).unwrap();
    let err = client
        .fetch("SVC1", Some("CUST-42"))
        .await
        .expect_err("403 must fail");

    assert!(
        matches!(err, EmbedError::Auth { status: 403, .. }),
        "expected Auth with status 403, got: {err}"
    );
    mock.assert();
}

#[tokio::test]
async fn null_authentication_is_a_protocol_error() {
    let server = MockServer::start_async().await;

    let mock = server.mock(|when, then| {
        when.method(POST).path("/v1/stories/embed/auth");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"authentication":null}"#);
    });

    let client =
        EmbedTokenClient::new(&test_config(&server.base_url(), EmbedType::Dashboard)).unwrap();
    let err = client
        .fetch("SVC1", Some("CUST-42"))
        .await
        .expect_err("null authentication must fail");

    assert!(
        matches!(err, EmbedError::Protocol(_)),
        "expected Protocol, got: {err}"
    );
    mock.assert();
}

#[tokio::test]
async fn missing_authentication_is_a_protocol_error() {
    let server = MockServer::start_async().await;

    let mock = server.mock(|when, then| {
        when.method(POST).path("/v1/stories/embed/auth");
        then.status(200)
            .header("content-type", "application/json")
            .body("{}");
    });

    let client =
        EmbedTokenClient::new(&test_config(&server.base_url(), EmbedType::Dashboard)).unwrap();
    let err = client
        .fetch("SVC1", Some("CUST-42"))
        .await
        .expect_err("missing authentication must fail");

    assert!(matches!(err, EmbedError::Protocol(_)));
    mock.assert();
}
