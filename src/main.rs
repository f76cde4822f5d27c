// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use relational_social_server::{
    api::router,
    auth::RefreshTokenSweeper,
    config::{AppConfig, LogFormat, DEFAULT_LOG_FILTER},
    state::AppState,
    storage::{SocialDatabase, StorageError, UserStore},
};

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let _ = match format {
        LogFormat::Json => builder.json().with_target(false).try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
}

/// Create the configured seed users that do not exist yet.
fn seed_users(state: &AppState, usernames: &[String]) {
    for username in usernames {
        let user = match state.db.find_user_by_username(username) {
            Ok(Some(existing)) => existing,
            Ok(None) => match state.db.create_user(username) {
                Ok(created) => {
                    info!(user_id = %created.id, username = %created.username, "Seeded user");
                    created
                }
                Err(StorageError::AlreadyExists(_)) => continue,
                Err(e) => {
                    warn!(username = %username, error = %e, "Failed to seed user");
                    continue;
                }
            },
            Err(e) => {
                warn!(username = %username, error = %e, "Failed to look up seed user");
                continue;
            }
        };

        #[cfg(feature = "dev")]
        match state.refresh.issue_pair(&user) {
            Ok(pair) => info!(
                username = %pair.username,
                token = %pair.token,
                refresh_token = %pair.refresh_token,
                "Dev credentials"
            ),
            Err(e) => warn!(username = %user.username, error = %e, "Failed to issue dev credentials"),
        }
        #[cfg(not(feature = "dev"))]
        let _ = user;
    }
}

/// Cancel `shutdown` on ctrl-c or SIGTERM.
async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl-c, shutting down gracefully..."),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully..."),
        _ = shutdown.cancelled() => return,
    }
    shutdown.cancel();
}

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env().expect("Failed to load configuration");
    init_tracing(config.log_format);

    let db = SocialDatabase::open_in(&config.data_dir).expect("Failed to open social database");
    info!(data_dir = %config.data_dir.display(), "Social database opened");

    let state = AppState::new(db, &config);
    seed_users(&state, &config.seed_users);

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));
    let sweeper = tokio::spawn(RefreshTokenSweeper::new(state.db.clone()).run(shutdown.clone()));

    let app = router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");

    info!(%addr, "Relational Social server listening (docs at /docs)");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .await;

    // Stop the background work even if the server failed
    shutdown.cancel();
    if let Err(e) = sweeper.await {
        warn!(error = %e, "Refresh token sweeper task failed");
    }
    served.expect("HTTP server failed");

    info!("Server stopped");
}
