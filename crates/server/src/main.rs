//! followers-rs server entry point.
//!
//! `followers` runs the HTTP server. `followers create-user <username> [name]`
//! provisions a user and prints its bearer token.

use std::sync::Arc;

use anyhow::Context;
use followers_api::{AppState, app};
use followers_common::Config;
use followers_core::{CreateUserInput, FollowEdgeService, ProfileService, UserService};
use followers_db::repositories::{FollowEdgeRepository, ProfileRepository, UserRepository};
use sea_orm::DatabaseConnection;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn build_state(db: &Arc<DatabaseConnection>) -> AppState {
    let user_repo = UserRepository::new(Arc::clone(db));
    let profile_repo = ProfileRepository::new(Arc::clone(db));
    let follow_edge_repo = FollowEdgeRepository::new(Arc::clone(db));

    AppState {
        user_service: UserService::new(user_repo.clone()),
        follow_edge_service: FollowEdgeService::new(follow_edge_repo.clone(), user_repo.clone()),
        profile_service: ProfileService::new(profile_repo, user_repo, follow_edge_repo),
    }
}

async fn create_user(state: &AppState, mut args: impl Iterator<Item = String>) -> anyhow::Result<()> {
    let username = args
        .next()
        .context("usage: followers create-user <username> [name]")?;
    let name = args.next();

    let user = state
        .user_service
        .create(CreateUserInput { username, name })
        .await?;

    println!("{}", user.token.unwrap_or_default());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "followers=debug,tower_http=debug".into()),
        )
        .init();

    // Load configuration
    let config = Config::load()?;

    let db = followers_db::connect(&config.database).await?;
    followers_db::migrate(&db).await?;

    let state = build_state(&Arc::new(db));

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None | Some("serve") => {}
        Some("create-user") => return create_user(&state, args).await,
        Some(other) => anyhow::bail!("unknown command: {other}"),
    }

    info!("Starting followers-rs server...");

    let app = app(state);

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
