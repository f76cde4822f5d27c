// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Refresh Token Sweeper
//!
//! Expired refresh tokens are only removed when someone tries to redeem
//! them. The sweeper deletes the rest periodically so abandoned sessions do
//! not pile up in the `refresh_tokens` table.
//!
//! ## Shutdown
//!
//! Runs until the shared `CancellationToken` is cancelled, the same token the
//! HTTP server waits on.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::storage::{RefreshTokenStore, SocialDatabase, StorageResult};

/// Default interval between sweeps.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

pub struct RefreshTokenSweeper {
    db: Arc<SocialDatabase>,
    interval: Duration,
}

impl RefreshTokenSweeper {
    pub fn new(db: Arc<SocialDatabase>) -> Self {
        Self {
            db,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Refresh token sweeper starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Refresh token sweeper shutting down");
                return;
            }

            if let Err(e) = self.sweep() {
                warn!(error = %e, "Refresh token sweep failed");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Refresh token sweeper shutting down");
                    return;
                }
            }
        }
    }

    /// Delete every refresh token that has expired by now.
    pub fn sweep(&self) -> StorageResult<usize> {
        let purged = self
            .db
            .write(|txn| txn.purge_expired_refresh_tokens(Utc::now()))?;
        if purged > 0 {
            debug!(purged, "Purged expired refresh tokens");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;
    use crate::storage::StoredRefreshToken;
    use chrono::TimeDelta;
    use tempfile::TempDir;

    fn setup() -> (Arc<SocialDatabase>, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db = Arc::new(SocialDatabase::open_in(temp_dir.path()).expect("Failed to open database"));
        let now = Utc::now();
        let record = |expires_at| StoredRefreshToken {
            user_id: UserId::from("alice"),
            issued_at: now - TimeDelta::hours(2),
            expires_at,
        };
        db.write(|txn| {
            txn.insert_refresh_token("stale", &record(now - TimeDelta::hours(1)))?;
            txn.insert_refresh_token("live", &record(now + TimeDelta::hours(1)))
        })
        .unwrap();
        (db, temp_dir)
    }

    #[test]
    fn sweep_removes_expired_tokens() {
        let (db, _dir) = setup();
        let sweeper = RefreshTokenSweeper::new(db.clone());

        assert_eq!(sweeper.sweep().unwrap(), 1);
        assert_eq!(sweeper.sweep().unwrap(), 0);
        assert!(db.write(|txn| txn.take_refresh_token("live")).unwrap().is_some());
    }

    #[tokio::test]
    async fn run_sweeps_and_stops_on_cancel() {
        let (db, _dir) = setup();
        let shutdown = CancellationToken::new();
        let sweeper = RefreshTokenSweeper::new(db.clone()).with_interval(Duration::from_secs(3600));

        let handle = tokio::spawn(sweeper.run(shutdown.clone()));
        // The first sweep runs before the loop waits
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.cancel();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
        assert!(db.write(|txn| txn.take_refresh_token("stale")).unwrap().is_none());
    }

    #[tokio::test]
    async fn cancelled_before_start_does_nothing() {
        let (db, _dir) = setup();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        RefreshTokenSweeper::new(db.clone()).run(shutdown).await;
        assert!(db.write(|txn| txn.take_refresh_token("stale")).unwrap().is_some());
    }
}
