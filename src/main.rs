// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Parish Intake Service
//!
//! Receives the contact, Mass booking and parish registration forms from
//! the parish website, and serves the announcement feed.
//!
//! ## Usage
//!
//! - `parish-intake` starts the HTTP service.
//! - `parish-intake hash-password` reads a password from stdin and prints
//!   the Argon2 hash to put in `INTAKE__ADMIN__PASSWORD_HASH`. In a `.env`
//!   file the hash must be single-quoted
//!   (`INTAKE__ADMIN__PASSWORD_HASH='$argon2id$v=19$...'`); unquoted and
//!   double-quoted values have their `$` sequences expanded.
//!
//! ## Configuration
//!
//! Configuration is loaded from an optional file named by `INTAKE_CONFIG`
//! and from `INTAKE__*` environment variables (a `.env` file is honoured):
//!
//! - `INTAKE__BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `INTAKE__DATA_DIR`: Record file directory (default: ./data)
//! - `INTAKE__RATE_LIMIT__WINDOW_SECS`: Per-origin submission window (default: 300)
//! - `INTAKE__NOTIFY__TRANSPORT`: `log` or `relay` (default: log)

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use parish_intake::{
    admin::{hash_password, AdminAuth},
    config::Config,
    handlers::{router, AppState},
    metrics::Metrics,
    notify::NotificationDispatcher,
    pipeline::IntakePipeline,
    store::AnnouncementStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    if std::env::args().nth(1).as_deref() == Some("hash-password") {
        return print_password_hash();
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let config = Config::load().context("loading configuration")?;
    info!(
        bind_addr = %config.bind_addr,
        data_dir = %config.data_dir.display(),
        window_secs = config.rate_limit.window_secs,
        max_records = config.store.max_records,
        "Starting parish intake service"
    );

    tokio::fs::create_dir_all(&config.data_dir)
        .await
        .with_context(|| format!("creating data directory {}", config.data_dir.display()))?;

    let metrics = Metrics::new().context("registering metrics")?;
    let dispatcher =
        NotificationDispatcher::from_config(&config.notify).context("configuring notifications")?;
    let admin = AdminAuth::new(&config.admin);
    if !admin.is_enabled() {
        info!("No admin password hash configured; announcement management is disabled");
    }

    let state = Arc::new(AppState {
        pipeline: IntakePipeline::new(&config, dispatcher, metrics),
        announcements: AnnouncementStore::new(&config.data_dir),
        admin,
        config: config.clone(),
    });
    info!(
        transport = state.pipeline.dispatcher().transport(),
        operator = %state.pipeline.dispatcher().operator(),
        "Notification transport ready"
    );

    // Spawn cleanup task
    let cleanup_state = state.clone();
    let cleanup_every = config.rate_limit.cleanup_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_every);
        loop {
            interval.tick().await;
            cleanup_state.pipeline.limiter().cleanup().await;
            cleanup_state.admin.cleanup().await;
        }
    });

    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn print_password_hash() -> anyhow::Result<()> {
    let mut password = String::new();
    std::io::stdin()
        .read_line(&mut password)
        .context("reading password from stdin")?;
    let password = password.trim_end_matches(['\r', '\n']);
    anyhow::ensure!(!password.is_empty(), "password must not be empty");

    let hash = hash_password(password).map_err(|e| anyhow::anyhow!("hashing password: {e}"))?;
    println!("{hash}");
    Ok(())
}
