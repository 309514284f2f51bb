/*
 * Responsibility
 * - Read Config -> build dependencies (pool, migrations, cache, token service)
 * - Assemble the Router and apply router-wide layers (http, CORS)
 * - Start axum::serve()
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, http::Uri, response::IntoResponse};
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::error::AppError;
use crate::middleware::{self, http::HttpLimits};
use crate::repos::account::{AccountStore, CachedAccountStore, PgAccountStore};
use crate::services::auth::build_token_service;
use crate::services::cache::ValkeyClient;
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set, e.g.
    // RUST_LOG=info,inventory_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr may be hidden depending on how the process is launched
        tracing::error!(?info, "panic");

        // Development fails fast; production keeps serving
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env().context("failed to load configuration")?;

    let abort_on_panic = !config.app_env.is_production();
    init_panic_hook(abort_on_panic);

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let pool = PgPool::connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run database migrations")?;

    let store: Arc<dyn AccountStore> = Arc::new(PgAccountStore::new(pool));

    // The cache is optional: without REDIS_URL (or if Valkey is down at boot) every
    // gate lookup goes to Postgres.
    let accounts: Arc<dyn AccountStore> = match config.redis_url.as_deref() {
        Some(url) => match ValkeyClient::new(url).await {
            Ok(cache) => {
                tracing::info!(
                    ttl_seconds = config.account_cache_ttl_seconds,
                    "account cache enabled"
                );
                Arc::new(CachedAccountStore::new(
                    store,
                    cache,
                    config.account_cache_ttl_seconds,
                ))
            }
            Err(e) => {
                tracing::warn!(error = %e, "account cache unavailable, using Postgres only");
                store
            }
        },
        None => store,
    };

    let tokens = build_token_service(config);

    Ok(AppState::new(accounts, tokens))
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    AppError::NotFoundRoute(uri.path().to_string())
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes(state.clone()))
        .fallback(not_found)
        .with_state(state);

    let router = middleware::http::apply(
        router,
        HttpLimits {
            timeout: std::time::Duration::from_secs(config.request_timeout_seconds),
            body_limit_bytes: config.request_body_limit_bytes,
        },
    );
    middleware::cors::apply(router, config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
