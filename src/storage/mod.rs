// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Social Graph Storage
//!
//! Persistent storage for users, friend requests, friendships and refresh
//! tokens, backed by an embedded **redb** database (pure Rust, ACID).
//!
//! ## Transactions
//!
//! redb admits one write transaction at a time. Every compound mutation
//! (accept = mark accepted + create friendship, unfriend, request insert with
//! its uniqueness check) runs inside a single [`SocialDatabase::write`] call,
//! so concurrent readers never see half of it and check-then-insert races
//! are serialised.
//!
//! ## Table Layout
//!
//! ```text
//! users            user_id        → StoredUser (JSON)
//! usernames        canonical name → user_id
//! friend_requests  request_id     → FriendRequest (JSON)
//! pending_pairs    pair key       → request_id    (one pending per pair)
//! pending_index    user|request   → created (unix millis)
//! friendships      pair key       → Friendship (JSON)
//! friend_index     user|friend    → since (unix millis)
//! refresh_tokens   sha256 digest  → StoredRefreshToken (JSON)
//! ```

pub mod database;
pub mod stores;

pub use database::{canonical_username, SocialDatabase, SocialTxn, StorageError, StorageResult};
pub use stores::{
    FriendRequestStore, FriendshipStore, RefreshTokenStore, StoredRefreshToken, UserStore,
};
