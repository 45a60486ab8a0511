//! Device-code polling loop.
//!
//! One session owns one [`ConfirmationCodes`] value and walks
//! `Waiting -> Requesting -> {Waiting | Token | Failed | Cancelled}` until it
//! reaches one of the terminal states. Requests are strictly sequential and
//! both the wait and the in-flight request race the caller's cancellation
//! token and the code's deadline.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::classify::{classify, ClassifiedError};
use super::device_code::ConfirmationCodes;
use super::expiry::{compute_expiry, Clock, SystemClock};
use super::token::Token;
use super::transport::{DeviceAuthTransport, TokenReply};
use crate::config::PollTiming;
use crate::error::Result;

/// Why a poll session ended without a token or a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller's cancellation token fired or its timeout elapsed.
    Caller,
    /// The confirmation codes ran out of lifetime.
    Expired,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Caller => f.write_str("cancelled by caller"),
            Self::Expired => f.write_str("confirmation code expired"),
        }
    }
}

/// Terminal result of a poll session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Token(Token),
    /// The provider rejected the device code. `error` is never
    /// [`ClassifiedError::Pending`].
    Failed {
        error: ClassifiedError,
        description: Option<String>,
    },
    Cancelled(CancelReason),
}

/// Exchanges a device code for a token once the user approves it.
pub struct TokenPoller {
    transport: Arc<dyn DeviceAuthTransport>,
    clock: Arc<dyn Clock>,
    timing: PollTiming,
}

impl TokenPoller {
    pub fn new(transport: Arc<dyn DeviceAuthTransport>) -> Self {
        Self {
            transport,
            clock: Arc::new(SystemClock),
            timing: PollTiming::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_timing(mut self, timing: PollTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn timing(&self) -> &PollTiming {
        &self.timing
    }

    /// Poll until a token, a terminal provider error, cancellation or expiry.
    ///
    /// Each attempt waits `interval_secs` plus the configured interval margin
    /// first. The session deadline is the codes' issuance plus lifetime minus
    /// the deadline margin, or the caller timeout if that comes sooner.
    ///
    /// A transport failure ends the session with `Err`; the poller never
    /// retries it, so a caller that wants resilience must start over with
    /// fresh codes. Invalid codes (zero interval or lifetime) fail with
    /// [`AuthError::Configuration`](crate::error::AuthError::Configuration)
    /// before any request is made.
    pub async fn poll(
        &self,
        codes: ConfirmationCodes,
        client_id: &str,
        client_secret: &str,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome> {
        codes.validate()?;

        let (deadline, deadline_reason) = self.deadline(&codes);
        let wait = Duration::from_secs(codes.interval_secs)
            .saturating_add(self.timing.interval_margin);
        let mut attempt: u32 = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(cancelled(CancelReason::Caller, attempt)),
                _ = time::sleep_until(deadline) => return Ok(cancelled(deadline_reason, attempt)),
                _ = time::sleep(wait) => {}
            }

            attempt += 1;
            debug!(attempt, "requesting device token");
            let reply = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(cancelled(CancelReason::Caller, attempt)),
                _ = time::sleep_until(deadline) => return Ok(cancelled(deadline_reason, attempt)),
                reply = self.transport.exchange_device_code(
                    &codes.device_code,
                    client_id,
                    client_secret,
                ) => reply?,
            };

            match reply {
                TokenReply::Granted(response) => {
                    debug!(attempt, "device token granted");
                    let now = self.clock.now();
                    return Ok(PollOutcome::Token(Token::from_response(response, now)));
                }
                TokenReply::Rejected { status, body } => {
                    let (error, description) = match body {
                        Some(body) if !body.error.trim().is_empty() => {
                            (classify(&body.error), body.error_description)
                        }
                        Some(body) => (ClassifiedError::MalformedResponse, body.error_description),
                        None => (ClassifiedError::MalformedResponse, None),
                    };
                    if !error.is_terminal() {
                        continue;
                    }
                    warn!(
                        attempt,
                        status,
                        error = %error,
                        description = description.as_deref(),
                        "device token request failed"
                    );
                    return Ok(PollOutcome::Failed { error, description });
                }
            }
        }
    }

    fn deadline(&self, codes: &ConfirmationCodes) -> (Instant, CancelReason) {
        let start = Instant::now();
        let expires_at = compute_expiry(codes.issued_at, codes.lifetime_secs);
        let remaining = (expires_at - self.clock.now())
            .to_std()
            .unwrap_or(Duration::ZERO)
            .saturating_sub(self.timing.deadline_margin);

        match self.timing.timeout {
            Some(timeout) if timeout < remaining => (at(start, timeout), CancelReason::Caller),
            _ => (at(start, remaining), CancelReason::Expired),
        }
    }
}

fn at(start: Instant, after: Duration) -> Instant {
    start
        .checked_add(after)
        .unwrap_or_else(|| start + Duration::from_secs(u64::from(u32::MAX)))
}

fn cancelled(reason: CancelReason, attempts: u32) -> PollOutcome {
    debug!(attempts, %reason, "device token polling stopped");
    PollOutcome::Cancelled(reason)
}
