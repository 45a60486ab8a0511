//! Wire exchanges with the Yandex OAuth endpoints.

use async_trait::async_trait;
use reqwest::Response;
use serde::de::DeserializeOwned;

use super::device_code::{CodeRequest, CodesResponse};
use super::token::{TokenErrorResponse, TokenResponse};
use crate::error::Result;

pub const DEFAULT_BASE_URL: &str = "https://oauth.yandex.ru";
const CODE_PATH: &str = "/device/code";
const TOKEN_PATH: &str = "/token";

/// Answer to a single request: either the success body or the rejection.
#[derive(Debug, Clone)]
pub enum TokenReply<T> {
    Granted(T),
    /// Non-success status. `body` is `None` when the provider sent no
    /// parseable error body or an empty `error` field.
    Rejected {
        status: u16,
        body: Option<TokenErrorResponse>,
    },
}

/// Single-shot exchanges the device flow is built from.
///
/// `Err` is reserved for transport failures; provider rejections come back
/// as [`TokenReply::Rejected`].
#[async_trait]
pub trait DeviceAuthTransport: Send + Sync {
    async fn request_codes(&self, request: &CodeRequest) -> Result<TokenReply<CodesResponse>>;

    async fn exchange_device_code(
        &self,
        device_code: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenReply<TokenResponse>>;

    async fn refresh_token(
        &self,
        refresh_token: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenReply<TokenResponse>>;
}

/// [`DeviceAuthTransport`] over form-encoded HTTPS POSTs.
///
/// # Example
/// ```no_run
/// use yandex_auth::auth::transport::HttpTransport;
///
/// let transport = HttpTransport::new().with_base_url("http://127.0.0.1:8080");
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    code_url: String,
    token_url: String,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            code_url: format!("{DEFAULT_BASE_URL}{CODE_PATH}"),
            token_url: format!("{DEFAULT_BASE_URL}{TOKEN_PATH}"),
        }
    }

    /// Point both endpoints at another host, keeping the provider's paths.
    pub fn with_base_url(self, base_url: impl AsRef<str>) -> Self {
        let base = base_url.as_ref().trim_end_matches('/');
        self.with_code_url(format!("{base}{CODE_PATH}"))
            .with_token_url(format!("{base}{TOKEN_PATH}"))
    }

    pub fn with_code_url(mut self, url: impl Into<String>) -> Self {
        self.code_url = url.into();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn code_url(&self) -> &str {
        &self.code_url
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<TokenReply<T>> {
        let resp = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .form(form)
            .send()
            .await?;
        read_reply(resp).await
    }
}

async fn read_reply<T: DeserializeOwned>(resp: Response) -> Result<TokenReply<T>> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    if status.is_success() {
        return Ok(TokenReply::Granted(serde_json::from_slice(&bytes)?));
    }
    let body = serde_json::from_slice::<TokenErrorResponse>(&bytes)
        .ok()
        .filter(|body| !body.error.is_empty());
    if body.is_none() {
        tracing::debug!(status = status.as_u16(), "token endpoint rejected request without error body");
    }
    Ok(TokenReply::Rejected {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl DeviceAuthTransport for HttpTransport {
    async fn request_codes(&self, request: &CodeRequest) -> Result<TokenReply<CodesResponse>> {
        self.post_form(&self.code_url, &request.form()).await
    }

    async fn exchange_device_code(
        &self,
        device_code: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenReply<TokenResponse>> {
        self.post_form(
            &self.token_url,
            &[
                ("grant_type", "device_code"),
                ("code", device_code),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ],
        )
        .await
    }

    async fn refresh_token(
        &self,
        refresh_token: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenReply<TokenResponse>> {
        self.post_form(
            &self.token_url,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ],
        )
        .await
    }
}
