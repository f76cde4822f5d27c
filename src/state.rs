// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{JwtCodec, RefreshTokenService, TokenGate};
use crate::config::AppConfig;
use crate::friends::FriendshipEngine;
use crate::storage::SocialDatabase;

/// Shared handles for request handlers.
///
/// Holds no mutable state of its own; every change goes through the database.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SocialDatabase>,
    pub gate: Arc<TokenGate>,
    pub tokens: Arc<JwtCodec>,
    pub refresh: Arc<RefreshTokenService>,
}

impl AppState {
    pub fn new(db: SocialDatabase, config: &AppConfig) -> Self {
        let db = Arc::new(db);
        let tokens = Arc::new(JwtCodec::new(
            config.jwt_secret.as_bytes(),
            config.access_token_ttl_secs,
        ));
        let gate = Arc::new(TokenGate::new(tokens.clone()));
        let refresh = Arc::new(RefreshTokenService::new(
            db.clone(),
            tokens.clone(),
            config.refresh_token_ttl_secs,
        ));

        Self {
            db,
            gate,
            tokens,
            refresh,
        }
    }

    pub fn friends(&self) -> FriendshipEngine<'_> {
        FriendshipEngine::new(&self.db)
    }
}
