//! News intelligence service: binary entrypoint.
//! Loads configuration, wires the pipeline, starts the live monitor and serves the HTTP API.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_intel::config::AppConfig;
use news_intel::metrics::Metrics;

/// Compact logs by default; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("news_intel=info,warn"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if let Err(e) = res {
        eprintln!("tracing already initialised: {e}");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(target: "startup", error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!(target: "startup", "shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // no-op when there is no .env
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load().context("loading configuration")?;
    info!(
        target: "startup",
        bind = %cfg.bind_addr,
        live_monitor = cfg.live_monitor,
        interval_minutes = cfg.live_interval_minutes,
        "configuration loaded"
    );

    let state = news_intel::build_state(&cfg)?;
    let monitor = Arc::clone(&state.monitor);
    if cfg.live_monitor {
        monitor.start();
    }

    let mut app = news_intel::router(state);
    match Metrics::init() {
        Ok(m) => app = app.merge(m.router()),
        Err(e) => warn!(target: "startup", error = %e, "metrics disabled"),
    }

    let listener = TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    info!(target: "startup", addr = %cfg.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;

    monitor.stop();
    info!(target: "startup", "bye");
    Ok(())
}
