//! CLI handlers for login and refresh.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{LoginArgs, RefreshArgs};
use crate::auth::{DeviceFlow, Token};
use crate::config::AuthConfig;

/// Handle `yandex-auth login`.
pub async fn handle_login(args: LoginArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AuthConfig::from_env()?;
    if args.device_id.is_some() {
        config.device_id = args.device_id;
    }
    if args.device_name.is_some() {
        config.device_name = args.device_name;
    }
    if let Some(secs) = args.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let token = DeviceFlow::new(config)
        .authorize(&cancel, |url, code| {
            eprintln!("🔗 Visit: {url}");
            eprintln!("📋 Enter code: {code}");
            eprintln!("⏳ Waiting for authorization...");
        })
        .await?;

    print_token(&token)
}

/// Handle `yandex-auth refresh --refresh-token <token>`.
pub async fn handle_refresh(args: RefreshArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = AuthConfig::from_env()?;
    let token = DeviceFlow::new(config).refresh(&args.refresh_token).await?;
    print_token(&token)
}

fn print_token(token: &Token) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(token)?);
    Ok(())
}
