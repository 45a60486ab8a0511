mod auth_support;

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yandex_auth::auth::{
    CancelReason, ClassifiedError, ConfirmationCodes, DeviceFlow, HttpTransport, PollOutcome,
};
use yandex_auth::error::AuthError;

use auth_support::{
    codes_body, config, error_body, fixed_now, flow, flow_with_config, token_body, FixedClock,
};

fn codes(interval_secs: u64) -> ConfirmationCodes {
    ConfirmationCodes {
        device_code: "device-123".to_string(),
        user_code: "ABCD1234".to_string(),
        verification_url: "https://ya.ru/device".to_string(),
        interval_secs,
        lifetime_secs: 600,
        issued_at: fixed_now(),
    }
}

#[tokio::test]
async fn request_codes_posts_client_and_device_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/device/code"))
        .and(body_string("client_id=client&device_id=abcdefg&device_name=tv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(codes_body(5, 300)))
        .expect(1)
        .mount(&server)
        .await;

    let flow = flow_with_config(&server, config().with_device("abcdefg", "tv"));
    let codes = flow.request_codes().await.expect("codes");

    assert_eq!(codes.device_code, "device-123");
    assert_eq!(codes.user_code, "ABCD1234");
    assert_eq!(codes.verification_url, "https://ya.ru/device");
    assert_eq!(codes.interval_secs, 5);
    assert_eq!(codes.lifetime_secs, 300);
    assert_eq!(codes.issued_at, fixed_now());
}

#[tokio::test]
async fn request_codes_invalid_client_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/device/code"))
        .respond_with(ResponseTemplate::new(400).set_body_json(error_body("invalid_client")))
        .expect(1)
        .mount(&server)
        .await;

    let result = flow(&server).request_codes().await;
    assert!(matches!(result, Err(AuthError::InvalidClient)));
}

#[tokio::test]
async fn request_codes_rejects_invalid_device_id_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/device/code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(codes_body(5, 300)))
        .expect(0)
        .mount(&server)
        .await;

    let flow = flow_with_config(&server, config().with_device("abc", "tv"));
    let result = flow.request_codes().await;
    assert!(matches!(result, Err(AuthError::Configuration(message)) if message.contains("device_id")));
}

#[tokio::test]
async fn refresh_success_stamps_expiry_from_clock() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string(
            "grant_type=refresh_token&refresh_token=R0&client_id=client&client_secret=secret",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(1)
        .mount(&server)
        .await;

    let token = flow(&server).refresh("R0").await.expect("refreshed");

    assert_eq!(token.access_token, "A");
    assert_eq!(token.refresh_token, "R");
    assert_eq!(token.token_type, "bearer");
    assert_eq!(token.expires_at, fixed_now() + ChronoDuration::seconds(3600));
}

#[tokio::test]
async fn refresh_invalid_grant_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(error_body("invalid_grant")))
        .expect(1)
        .mount(&server)
        .await;

    let result = flow(&server).refresh("R0").await;
    assert!(matches!(result, Err(AuthError::InvalidGrant)));
}

#[tokio::test]
async fn refresh_unknown_error_keeps_code_and_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(error_body("unsupported_grant_type")))
        .expect(1)
        .mount(&server)
        .await;

    let err = flow(&server).refresh("R0").await.unwrap_err();
    assert_eq!(err.provider_code(), Some("unsupported_grant_type"));
    assert_eq!(
        err.to_string(),
        "Provider error unsupported_grant_type: unsupported_grant_type description"
    );
}

#[tokio::test]
async fn refresh_status_without_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let result = flow(&server).refresh("R0").await;
    assert!(matches!(result, Err(AuthError::MalformedResponse)));
}

#[tokio::test]
async fn refresh_success_with_unparseable_body_is_serialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let result = flow(&server).refresh("R0").await;
    assert!(matches!(result, Err(AuthError::Serialization(_))));
}

#[tokio::test]
async fn refresh_rejects_empty_token_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(0)
        .mount(&server)
        .await;

    let result = flow(&server).refresh("  ").await;
    assert!(matches!(result, Err(AuthError::Configuration(_))));
}

#[tokio::test]
async fn poll_pending_then_granted_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string(
            "grant_type=device_code&code=device-123&client_id=client&client_secret=secret",
        ))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(error_body("authorization_pending")),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = flow(&server)
        .poll(codes(1), &CancellationToken::new())
        .await
        .expect("poll");

    let token = match outcome {
        PollOutcome::Token(token) => token,
        other => panic!("expected token, got {other:?}"),
    };
    assert_eq!(token.access_token, "A");
    assert_eq!(token.expires_at, fixed_now() + ChronoDuration::seconds(3600));
    server.verify().await;
}

#[tokio::test]
async fn poll_invalid_grant_stops_after_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(error_body("invalid_grant")))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = flow(&server)
        .poll(codes(1), &CancellationToken::new())
        .await
        .expect("poll");

    assert_eq!(
        outcome,
        PollOutcome::Failed {
            error: ClassifiedError::InvalidGrant,
            description: Some("invalid_grant description".to_string()),
        }
    );
}

#[tokio::test]
async fn poll_blank_error_field_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=device_code"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({"error": ""})))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = flow(&server)
        .poll(codes(1), &CancellationToken::new())
        .await
        .expect("poll");

    assert!(matches!(
        outcome,
        PollOutcome::Failed {
            error: ClassifiedError::MalformedResponse,
            ..
        }
    ));
}

#[tokio::test]
async fn poll_transport_failure_ends_session() {
    let transport = HttpTransport::new().with_base_url("http://127.0.0.1:1");
    let flow = DeviceFlow::with_transport(config(), Arc::new(transport))
        .with_clock(Arc::new(FixedClock(fixed_now())));

    let result = flow.poll(codes(1), &CancellationToken::new()).await;

    let err = result.unwrap_err();
    assert!(matches!(err, AuthError::Network(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn authorize_notifies_callback_without_waiting_for_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/device/code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(codes_body(1, 600)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(1)
        .mount(&server)
        .await;

    let (seen_tx, seen_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let token = flow(&server)
        .authorize(&CancellationToken::new(), move |url, code| {
            seen_tx.send((url, code)).unwrap();
            // Hold the callback open until the flow has finished.
            let _ = release_rx.recv();
        })
        .await
        .expect("authorized");

    assert_eq!(token.access_token, "A");
    assert_eq!(
        seen_rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        ("https://ya.ru/device".to_string(), "ABCD1234".to_string())
    );
    release_tx.send(()).unwrap();
}

#[tokio::test]
async fn authorize_surfaces_invalid_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/device/code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(codes_body(1, 600)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(error_body("invalid_client")))
        .expect(1)
        .mount(&server)
        .await;

    let result = flow(&server).authorize(&CancellationToken::new(), |_, _| {}).await;
    assert!(matches!(result, Err(AuthError::InvalidClient)));
}

#[tokio::test]
async fn authorize_keeps_provider_description() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/device/code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(codes_body(1, 600)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(error_body("access_denied")))
        .expect(1)
        .mount(&server)
        .await;

    let err = flow(&server)
        .authorize(&CancellationToken::new(), |_, _| {})
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AuthError::Unrecognized { ref code, ref description }
            if code == "access_denied" && description.as_deref() == Some("access_denied description")
    ));
}

#[test]
fn authorize_callback_does_not_hold_runtime_shutdown() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let token = runtime.block_on(async move {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/device/code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(codes_body(1, 600)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
            .mount(&server)
            .await;

        flow(&server)
            .authorize(&CancellationToken::new(), move |_, _| {
                // Blocks until the test ends.
                let _ = release_rx.recv();
            })
            .await
    });
    assert_eq!(token.expect("authorized").access_token, "A");

    let (dropped_tx, dropped_rx) = mpsc::channel();
    std::thread::spawn(move || {
        drop(runtime);
        let _ = dropped_tx.send(());
    });
    assert!(dropped_rx.recv_timeout(Duration::from_secs(5)).is_ok());

    release_tx.send(()).unwrap();
}

#[tokio::test]
async fn authorize_cancelled_by_caller_skips_token_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/device/code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(codes_body(1, 600)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = flow(&server).authorize(&cancel, |_, _| {}).await;

    assert!(matches!(result, Err(AuthError::Cancelled(CancelReason::Caller))));
}
