/*
 * Responsibility
 * - Load Config → build dependencies → assemble the Router
 * - Apply middleware (HTTP layers, bearer auth on protected routes)
 * - Start axum::serve()
 */
use std::{panic, process, time::Duration};

use anyhow::{Context, Result};
use axum::Router;
use sqlx::{PgPool, migrate::Migrator, postgres::PgPoolOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{api, config::Config, middleware, services::auth::build_token_verifier, state::AppState};

/// `migrations/`, embedded at build time.
static MIGRATOR: Migrator = sqlx::migrate!();

fn init_tracing() {
    // RUST_LOG wins when set, e.g.
    // RUST_LOG=info,dominia=debug,tower_http=debug cargo run
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
        tracing::error!(?info, "panic");

        // Development: crash the whole process so it gets noticed.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting dominia in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let db = connect_db(config).await?;

    if config.run_migrations {
        MIGRATOR.run(&db).await.context("failed to apply migrations")?;
        tracing::info!("migrations applied");
    }

    let auth = build_token_verifier(config).context("failed to build JWKS client")?;

    Ok(AppState::new(db, auth, config.fullname.as_str()))
}

async fn connect_db(config: &Config) -> Result<PgPool> {
    // Lazy: the greeting page stays up even when the database is not.
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(&config.database_url)
        .context("invalid DATABASE_URL")?;

    Ok(pool)
}

pub(crate) fn build_router(state: AppState) -> Router {
    let router = api::routes(state.clone()).with_state(state);
    middleware::http::apply(router)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
