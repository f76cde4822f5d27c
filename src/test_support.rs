// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for handler and router tests.

use tempfile::TempDir;

use crate::auth::Principal;
use crate::config::AppConfig;
use crate::state::AppState;
use crate::storage::SocialDatabase;

pub const TEST_SECRET: &str = "handler-test-secret";

/// App state over a fresh database in a temp dir.
///
/// Keep the returned `TempDir` alive for the duration of the test.
pub fn test_state() -> (AppState, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = AppConfig::with_secret(TEST_SECRET, dir.path());
    let db = SocialDatabase::open_in(&config.data_dir).expect("Failed to open database");
    (AppState::new(db, &config), dir)
}

/// Create a user and return its principal.
pub fn create_principal(state: &AppState, username: &str) -> Principal {
    let user = state.db.create_user(username).expect("Failed to create user");
    Principal::from(&user)
}

/// `Bearer <token>` header value for a principal.
pub fn bearer_for(state: &AppState, principal: &Principal) -> String {
    use crate::storage::UserStore;

    let user = state
        .db
        .find_user_by_id(&principal.user_id)
        .expect("Failed to read user")
        .expect("User exists");
    format!("Bearer {}", state.tokens.issue(&user).expect("Failed to issue token"))
}
