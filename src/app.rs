/*
 * Responsibility
 * - Config読み込み → 依存生成 (validator / route scopes / audit sink) → Router 組み立て
 * - Middleware の適用 (guards per route, HTTP layers globally)
 * - axum::serve() で起動 (connect-info for caller IPs, graceful shutdown)
 */
use std::net::SocketAddr;
use std::{panic, process};

use anyhow::Result;
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::{Config, ConfigError, LogFormat};
use crate::middleware;
use crate::services::auth::{build_audit_sink, build_token_validator};
use crate::state::AppState;

fn init_tracing(format: LogFormat) {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,audit=info,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: crash the whole process so we notice immediately
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting gateway in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = build_router(state, &config)?;

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

pub fn build_state(config: &Config) -> Result<AppState, ConfigError> {
    let route_scopes = api::route_scopes()?;
    if route_scopes.is_empty() {
        tracing::warn!("no protected routes declared");
    } else {
        tracing::info!(count = route_scopes.len(), "route scope map loaded");
    }
    for entry in route_scopes.entries() {
        tracing::info!(
            method = %entry.method,
            path = %entry.path,
            required_scope = %entry.required_scope,
            "protected route"
        );
    }

    Ok(AppState::new(
        build_token_validator(config),
        route_scopes,
        build_audit_sink(),
    ))
}

pub fn build_router(state: AppState, config: &Config) -> Result<Router, ConfigError> {
    let router = api::routes(&state)?.with_state(state);
    Ok(middleware::http::apply(router, config))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
