mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use nutrimeal_api::auth::hash_password;
use nutrimeal_api::generate::RecipeGenerator;
use nutrimeal_api::{AppState, AppStateInner, router};
use nutrimeal_db::{Database, StoreError};
use nutrimeal_types::models::Role;

use crate::config::{AdminSeed, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nutrimeal=debug,nutrimeal_api=debug,nutrimeal_db=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Database::open(&config.db_path, config.store_timeout)?;

    if let Some(seed) = &config.admin {
        bootstrap_admin(&db, seed).await?;
    }

    let generator = RecipeGenerator::new(config.generator.clone(), config.generator_timeout)
        .context("building AI generator client")?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        token_ttl: config.token_ttl,
        store_timeout: config.store_timeout,
        generator,
        pdf_font_dir: config.pdf_font_dir.clone(),
    });

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Nutrimeal server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Creates the configured admin account unless the username already exists.
async fn bootstrap_admin(db: &Database, seed: &AdminSeed) -> anyhow::Result<()> {
    if db.get_user_by_username(&seed.username)?.is_some() {
        info!("Admin '{}' already present", seed.username);
        return Ok(());
    }

    let hash = hash_password(seed.password.clone())
        .await
        .map_err(|e| anyhow::anyhow!("hashing admin password: {e}"))?;

    match db.create_user(&seed.username, &seed.email, &hash, Role::Admin) {
        Ok(id) => info!("Admin '{}' created ({})", seed.username, id),
        Err(StoreError::Conflict(msg)) => warn!("Admin bootstrap skipped: {}", msg),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("SIGTERM handler unavailable: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
