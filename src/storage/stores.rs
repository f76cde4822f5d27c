// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Store capabilities consumed by the gate and the friendship engine.
//!
//! Engine mutations are written against these traits and receive an
//! implementation scoped to one write transaction
//! (see [`super::SocialDatabase::write`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{FriendRequest, Friendship, PairKey, StoredUser, UserId};

use super::StorageResult;

/// User lookup.
pub trait UserStore {
    fn find_user_by_id(&self, user_id: &UserId) -> StorageResult<Option<StoredUser>>;

    /// Lookup is insensitive to case and Unicode compatibility forms.
    fn find_user_by_username(&self, username: &str) -> StorageResult<Option<StoredUser>>;
}

/// Friend request records.
pub trait FriendRequestStore {
    /// Insert a pending request.
    ///
    /// # Errors
    /// `StorageError::AlreadyExists` if the unordered pair already has a
    /// pending request.
    fn insert_request(&self, request: &FriendRequest) -> StorageResult<()>;

    fn find_request(&self, request_id: &str) -> StorageResult<Option<FriendRequest>>;

    /// The pending request between the pair, in either direction.
    fn find_pending(&self, pair: &PairKey) -> StorageResult<Option<FriendRequest>>;

    /// Remove a request and release its pair guard.
    fn delete_request(&self, request_id: &str) -> StorageResult<()>;

    /// Move a pending request to `ACCEPTED` and release its pair guard.
    fn mark_accepted(&self, request_id: &str) -> StorageResult<FriendRequest>;
}

/// Established friendships.
pub trait FriendshipStore {
    /// # Errors
    /// `StorageError::AlreadyExists` if the pair are already friends.
    fn insert_friendship(&self, friendship: &Friendship) -> StorageResult<()>;

    /// Remove the edge from both sides.
    ///
    /// # Errors
    /// `StorageError::NotFound` if the pair are not friends.
    fn remove_friendship(&self, a: &UserId, b: &UserId) -> StorageResult<()>;

    fn friendship_exists(&self, a: &UserId, b: &UserId) -> StorageResult<bool>;
}

/// A refresh token at rest. Only the SHA-256 digest of the token is kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredRefreshToken {
    pub user_id: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl StoredRefreshToken {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// Single-use refresh token records keyed by digest.
pub trait RefreshTokenStore {
    fn insert_refresh_token(&self, digest: &str, token: &StoredRefreshToken) -> StorageResult<()>;

    /// Remove and return the record, so a token can be redeemed at most once.
    fn take_refresh_token(&self, digest: &str) -> StorageResult<Option<StoredRefreshToken>>;

    /// Drop every refresh token of a user. Returns how many were removed.
    fn revoke_refresh_tokens(&self, user_id: &UserId) -> StorageResult<usize>;

    /// Drop every token that expired at or before `now`. Returns how many were removed.
    fn purge_expired_refresh_tokens(&self, now: DateTime<Utc>) -> StorageResult<usize>;
}
