// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Refresh token rotation.
//!
//! ## Contract
//!
//! - Refresh tokens are single use: redeeming one deletes it in the same
//!   transaction that stores its replacement
//! - The exchange returns a new bearer token bound to the same user
//! - Only a SHA-256 digest of each refresh token is stored

use std::sync::Arc;

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{TimeDelta, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};

use super::error::AuthError;
use super::token::JwtCodec;
use crate::models::{StoredUser, TokenResponse, UserId};
use crate::storage::{RefreshTokenStore, SocialDatabase, SocialTxn, StoredRefreshToken, UserStore};

/// Refresh token length in bytes (before encoding).
const REFRESH_TOKEN_BYTES: usize = 32;

/// Exchanges a refresh token for a fresh credential pair.
pub trait CredentialRotator: Send + Sync {
    fn exchange(&self, refresh_token: &str) -> Result<TokenResponse, AuthError>;
}

/// Digest under which a refresh token is stored.
pub fn refresh_token_digest(token: &str) -> String {
    Base64UrlUnpadded::encode_string(&Sha256::digest(token.as_bytes()))
}

/// Issues and rotates refresh tokens against the social database.
pub struct RefreshTokenService {
    db: Arc<SocialDatabase>,
    codec: Arc<JwtCodec>,
    ttl_secs: i64,
    rng: SystemRandom,
}

impl RefreshTokenService {
    pub fn new(db: Arc<SocialDatabase>, codec: Arc<JwtCodec>, ttl_secs: i64) -> Self {
        Self {
            db,
            codec,
            ttl_secs,
            rng: SystemRandom::new(),
        }
    }

    /// Issue a bearer token and a stored refresh token for a user.
    pub fn issue_pair(&self, user: &StoredUser) -> Result<TokenResponse, AuthError> {
        self.db.write(|txn| self.issue_in(txn, user))
    }

    /// Log a user out everywhere.
    ///
    /// Bumps the token version so outstanding bearer tokens fail the gate, and
    /// drops every refresh token of the user.
    pub fn revoke_sessions(&self, user_id: &UserId) -> Result<usize, AuthError> {
        self.db.write(|txn| {
            txn.bump_token_version(user_id)?;
            let revoked = txn.revoke_refresh_tokens(user_id)?;
            Ok(revoked)
        })
    }

    fn issue_in(&self, txn: &SocialTxn<'_>, user: &StoredUser) -> Result<TokenResponse, AuthError> {
        let refresh_token = self.mint()?;
        let now = Utc::now();
        let expires_at = TimeDelta::try_seconds(self.ttl_secs)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| AuthError::InternalError("Refresh token expiry out of range".to_string()))?;
        txn.insert_refresh_token(
            &refresh_token_digest(&refresh_token),
            &StoredRefreshToken {
                user_id: user.id.clone(),
                issued_at: now,
                expires_at,
            },
        )?;

        Ok(TokenResponse {
            user_id: user.id.clone(),
            username: user.username.clone(),
            token: self.codec.issue(user)?,
            refresh_token,
        })
    }

    fn mint(&self) -> Result<String, AuthError> {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AuthError::InternalError("Random source unavailable".to_string()))?;
        Ok(Base64UrlUnpadded::encode_string(&bytes))
    }
}

impl CredentialRotator for RefreshTokenService {
    fn exchange(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        let digest = refresh_token_digest(refresh_token.trim());

        let rotated = self.db.write(|txn| -> Result<Result<TokenResponse, AuthError>, AuthError> {
            let stored = txn
                .take_refresh_token(&digest)?
                .ok_or(AuthError::InvalidRefreshToken)?;

            if stored.is_expired() {
                // Expired tokens are dropped as well, so commit the removal
                return Ok(Err(AuthError::InvalidRefreshToken));
            }

            let user = txn
                .find_user_by_id(&stored.user_id)?
                .ok_or(AuthError::UnknownSubject)?;

            self.issue_in(txn, &user).map(Ok)
        })?;

        if let Ok(pair) = &rotated {
            tracing::info!(user_id = %pair.user_id, "Refresh token rotated");
        }
        rotated
    }
}
