//! yandex-auth: Yandex OAuth device-code authorization.
//!
//! Requests a device/user code pair, hands the verification URL and user
//! code to a callback, then polls the token endpoint until the user approves,
//! the code expires or the caller cancels. Tokens can be refreshed with the
//! refresh token issued alongside them.
//!
//! # Quick Start
//!
//! ```no_run
//! use tokio_util::sync::CancellationToken;
//! use yandex_auth::config::AuthConfig;
//!
//! # async fn example() -> yandex_auth::error::Result<()> {
//! let config = AuthConfig::from_env()?;
//! let token = yandex_auth::auth::authorize(config, &CancellationToken::new(), |url, code| {
//!     println!("Visit {url} and enter {code}");
//! })
//! .await?;
//! println!("{}", token.access_token);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;

#[cfg(feature = "cli")]
pub mod cli;
