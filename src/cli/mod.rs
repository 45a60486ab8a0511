//! CLI entry point for yandex-auth.

pub mod auth;

use clap::{Parser, Subcommand};

/// Yandex OAuth device-code CLI
#[derive(Parser, Debug)]
#[command(name = "yandex-auth", version, about = "Obtain and refresh Yandex OAuth tokens")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authorize this device and print the token as JSON
    Login(LoginArgs),
    /// Exchange a refresh token for a new token pair
    Refresh(RefreshArgs),
}

/// Arguments for `yandex-auth login`.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Device identifier (6-50 printable ASCII characters)
    #[arg(long, env = "YANDEX_DEVICE_ID")]
    pub device_id: Option<String>,

    /// Device name shown to the user in their Yandex account
    #[arg(long, env = "YANDEX_DEVICE_NAME")]
    pub device_name: Option<String>,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Arguments for `yandex-auth refresh`.
#[derive(Parser, Debug)]
pub struct RefreshArgs {
    /// Refresh token issued with the current access token
    #[arg(long, env = "YANDEX_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: String,
}
