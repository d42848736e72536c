#![deny(unsafe_code)]

use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use burrow_core::auth::IdentityVerifier;
use burrow_core::Settings;
use burrow_server::{ApiServer, AppState, ServerConfig};

/// Web file browser confined to a single directory tree
#[derive(Parser)]
#[command(name = "burrow")]
#[command(author, version)]
#[command(after_help = "EXAMPLES:
    # Serve your home directory on the default port
    BURROW_SECRET_KEY=$(openssl rand -hex 32) burrow

    # Serve a specific directory on a public interface
    burrow --root /srv/shared --bind 0.0.0.0 --port 8080
")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory to serve (defaults to your home directory)
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Port to listen on
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Session lifetime in seconds
    #[arg(long, value_name = "SECS")]
    session_max_age: Option<u64>,

    /// Upload size cap in bytes
    #[arg(long, value_name = "BYTES")]
    upload_limit: Option<u64>,

    /// Mark the session cookie Secure (requires TLS in front)
    #[arg(long)]
    secure_cookies: bool,

    /// Token signing secret (insecure on the command line, prefer BURROW_SECRET_KEY)
    #[arg(long, env = "BURROW_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// PAM service to authenticate against
    #[cfg(feature = "pam")]
    #[arg(long, default_value = "login")]
    pam_service: String,

    /// Accepted username (paired with BURROW_PASSWORD)
    #[cfg(not(feature = "pam"))]
    #[arg(long, env = "BURROW_USER")]
    user: Option<String>,

    /// Accepted password for --user
    #[cfg(not(feature = "pam"))]
    #[arg(long, env = "BURROW_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let mut settings = Settings::from_env();
    if let Some(root) = cli.root.clone() {
        settings.root_dir = root;
    }
    if let Some(secs) = cli.session_max_age {
        settings.session_max_age = Duration::from_secs(secs);
    }
    if let Some(limit) = cli.upload_limit {
        settings.upload_limit = limit;
    }
    if cli.secure_cookies {
        settings.secure_cookies = true;
    }
    match cli.secret_key.clone() {
        Some(secret) if !secret.is_empty() => settings.secret_key = SecretString::from(secret),
        _ => {
            tracing::warn!(
                "no signing secret configured; sessions will not survive a restart \
                 (set BURROW_SECRET_KEY)"
            );
        }
    }

    let verifier = build_verifier(&cli)?;
    let state = AppState::new(&settings, verifier).with_context(|| {
        format!(
            "cannot serve {}: directory must exist",
            settings.root_dir.display()
        )
    })?;

    let server = ApiServer::start(
        state,
        ServerConfig {
            port: cli.port,
            bind_address: cli.bind,
        },
    )
    .await
    .context("failed to bind server")?;

    eprintln!("burrow listening on {}", server.url());
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    server.stop().await;
    Ok(())
}

#[cfg(feature = "pam")]
fn build_verifier(cli: &Cli) -> Result<Arc<dyn IdentityVerifier>> {
    Ok(Arc::new(burrow_core::auth::PamVerifier::new(
        cli.pam_service.clone(),
    )))
}

#[cfg(not(feature = "pam"))]
fn build_verifier(cli: &Cli) -> Result<Arc<dyn IdentityVerifier>> {
    let (Some(user), Some(password)) = (cli.user.clone(), cli.password.clone()) else {
        anyhow::bail!(
            "built without PAM support: supply --user and BURROW_PASSWORD, \
             or rebuild with --features pam"
        );
    };
    Ok(Arc::new(burrow_core::auth::FixedVerifier::new(
        user, password,
    )))
}


/// Set up tracing/logging based on verbosity level
fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();
}
