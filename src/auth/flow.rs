use std::sync::Arc;
use std::thread;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::classify::classify;
use super::device_code::ConfirmationCodes;
use super::expiry::{Clock, SystemClock};
use super::poller::{PollOutcome, TokenPoller};
use super::token::{Token, TokenErrorResponse};
use super::transport::{DeviceAuthTransport, HttpTransport, TokenReply};
use crate::config::AuthConfig;
use crate::error::{AuthError, Result};

/// Device-code login and token refresh against Yandex OAuth.
///
/// All I/O decisions (printing, prompting, storing tokens) belong to the
/// caller. `DeviceFlow` only returns typed results and errors.
///
/// # Example
/// ```no_run
/// use tokio_util::sync::CancellationToken;
/// use yandex_auth::auth::DeviceFlow;
/// use yandex_auth::config::AuthConfig;
///
/// # async fn example() -> yandex_auth::error::Result<()> {
/// let flow = DeviceFlow::new(AuthConfig::from_env()?);
/// let token = flow
///     .authorize(&CancellationToken::new(), |url, code| {
///         println!("Open {url} and enter {code}");
///     })
///     .await?;
/// println!("expires at {}", token.expires_at);
/// # Ok(())
/// # }
/// ```
pub struct DeviceFlow {
    config: AuthConfig,
    transport: Arc<dyn DeviceAuthTransport>,
    clock: Arc<dyn Clock>,
}

impl DeviceFlow {
    /// Flow over HTTPS against `config.base_url`.
    pub fn new(config: AuthConfig) -> Self {
        let transport = HttpTransport::new().with_base_url(&config.base_url);
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: AuthConfig, transport: Arc<dyn DeviceAuthTransport>) -> Self {
        Self {
            config,
            transport,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Request a fresh device/user code pair.
    ///
    /// The issuance instant is read before the request goes out, so the
    /// lifetime window never starts later than the provider's own.
    pub async fn request_codes(&self) -> Result<ConfirmationCodes> {
        self.config.validate()?;
        let issued_at = self.clock.now();
        match self
            .transport
            .request_codes(&self.config.code_request())
            .await?
        {
            TokenReply::Granted(response) => {
                debug!(
                    interval = response.interval,
                    expires_in = response.expires_in,
                    "confirmation codes issued"
                );
                Ok(ConfirmationCodes::from_response(response, issued_at))
            }
            TokenReply::Rejected { status, body } => Err(rejection("code request", status, body)),
        }
    }

    /// Poll the token endpoint for `codes`, consuming them.
    pub async fn poll(
        &self,
        codes: ConfirmationCodes,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome> {
        TokenPoller::new(self.transport.clone())
            .with_clock(self.clock.clone())
            .with_timing(self.config.timing.clone())
            .poll(
                codes,
                &self.config.client_id,
                &self.config.client_secret,
                cancel,
            )
            .await
    }

    /// Run the whole device flow: request codes, notify the user, poll.
    ///
    /// `on_url_code` receives the verification URL and the user code. It runs
    /// on its own detached thread and is never joined. A callback that blocks
    /// or panics does not delay polling or the runtime's shutdown.
    pub async fn authorize<F>(&self, cancel: &CancellationToken, on_url_code: F) -> Result<Token>
    where
        F: FnOnce(String, String) + Send + 'static,
    {
        let codes = self.request_codes().await?;

        let url = codes.verification_url.clone();
        let code = codes.user_code.clone();
        let notify = thread::Builder::new()
            .name("yandex-auth-notify".to_string())
            .spawn(move || on_url_code(url, code));
        if let Err(err) = notify {
            warn!(error = %err, "failed to start user notification thread");
        }

        match self.poll(codes, cancel).await? {
            PollOutcome::Token(token) => Ok(token),
            PollOutcome::Failed { error, description } => {
                Err(AuthError::from_classified(error, description))
            }
            PollOutcome::Cancelled(reason) => Err(AuthError::Cancelled(reason)),
        }
    }

    /// Exchange a refresh token for a new token pair. Single request.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Token> {
        self.config.validate()?;
        if refresh_token.trim().is_empty() {
            return Err(AuthError::Configuration("refresh token is empty".to_string()));
        }
        match self
            .transport
            .refresh_token(
                refresh_token,
                &self.config.client_id,
                &self.config.client_secret,
            )
            .await?
        {
            TokenReply::Granted(response) => {
                let now = self.clock.now();
                Ok(Token::from_response(response, now))
            }
            TokenReply::Rejected { status, body } => Err(rejection("refresh", status, body)),
        }
    }
}

fn rejection(operation: &str, status: u16, body: Option<TokenErrorResponse>) -> AuthError {
    let Some(body) = body.filter(|body| !body.error.trim().is_empty()) else {
        warn!(operation, status, "request rejected without error body");
        return AuthError::MalformedResponse;
    };
    warn!(
        operation,
        status,
        error = %body.error,
        description = body.error_description.as_deref(),
        "request rejected"
    );
    AuthError::from_classified(classify(&body.error), body.error_description)
}

/// Run the device flow with `config` over HTTPS.
pub async fn authorize<F>(config: AuthConfig, cancel: &CancellationToken, on_url_code: F) -> Result<Token>
where
    F: FnOnce(String, String) + Send + 'static,
{
    DeviceFlow::new(config).authorize(cancel, on_url_code).await
}

/// Refresh `refresh_token` with `config` over HTTPS.
pub async fn refresh(config: AuthConfig, refresh_token: &str) -> Result<Token> {
    DeviceFlow::new(config).refresh(refresh_token).await
}
