//! yandex-auth CLI binary entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;
use yandex_auth::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Login(args) => yandex_auth::cli::auth::handle_login(args).await,
        Commands::Refresh(args) => yandex_auth::cli::auth::handle_refresh(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
