#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use wiremock::MockServer;
use yandex_auth::auth::{Clock, DeviceFlow, HttpTransport};
use yandex_auth::config::{AuthConfig, PollTiming};

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 15, 8, 0, 0).unwrap()
}

pub fn config() -> AuthConfig {
    AuthConfig::new("client", "secret").with_timing(PollTiming {
        interval_margin: Duration::ZERO,
        deadline_margin: Duration::ZERO,
        timeout: Some(Duration::from_secs(30)),
    })
}

pub fn flow(server: &MockServer) -> DeviceFlow {
    flow_with_config(server, config())
}

pub fn flow_with_config(server: &MockServer, config: AuthConfig) -> DeviceFlow {
    let transport = HttpTransport::new().with_base_url(server.uri());
    DeviceFlow::with_transport(config, Arc::new(transport))
        .with_clock(Arc::new(FixedClock(fixed_now())))
}

pub fn codes_body(interval: u64, expires_in: u64) -> serde_json::Value {
    json!({
        "device_code": "device-123",
        "user_code": "ABCD1234",
        "verification_url": "https://ya.ru/device",
        "interval": interval,
        "expires_in": expires_in
    })
}

pub fn token_body() -> serde_json::Value {
    json!({
        "token_type": "bearer",
        "access_token": "A",
        "expires_in": 3600,
        "refresh_token": "R"
    })
}

pub fn error_body(code: &str) -> serde_json::Value {
    json!({
        "error": code,
        "error_description": format!("{code} description")
    })
}
