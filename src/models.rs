// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Social Data Models
//!
//! Records persisted by the storage layer and the request/response bodies of
//! the REST API. Wire types derive `Serialize`, `Deserialize`, and `ToSchema`
//! for JSON handling and OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **Users**: the identities credentials resolve to
//! - **Friend requests**: directed, time-ordered proposals between two users
//! - **Friendships**: undirected edges created when a request is accepted
//! - **Tokens**: bearer/refresh pairs handed out by the rotation endpoint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Identifiers
// =============================================================================

/// Stable user identifier shared by the gate and the friendship engine.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new() -> Self {
        UserId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        UserId(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        UserId(value.to_string())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

/// Key shared by both orderings of a user pair.
///
/// `{A, B}` and `{B, A}` map to the same key, which is what lets the storage
/// layer enforce "one pending request per unordered pair".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey(String);

impl PairKey {
    pub fn new(a: &UserId, b: &UserId) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        PairKey(format!("{}|{}", low.0, high.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Users
// =============================================================================

/// A user as seen by the authentication and relationship core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredUser {
    pub id: UserId,
    pub username: String,
    /// Bumped on logout or password change; tokens carrying an older
    /// version are rejected.
    pub token_version: u32,
    pub created_at: DateTime<Utc>,
}

impl StoredUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            token_version: 0,
            created_at: Utc::now(),
        }
    }
}

/// Response for GET /api/users/me
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserMeResponse {
    pub user_id: UserId,
    pub username: String,
}

// =============================================================================
// Friend Requests
// =============================================================================

/// Lifecycle state of a friend request.
///
/// `Rejected` is part of the wire vocabulary but rejection currently removes
/// the record so the pair can try again later.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A directed friendship proposal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct FriendRequest {
    /// Unique request identifier (UUID)
    pub id: String,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
}

impl FriendRequest {
    pub fn pending(sender_id: UserId, receiver_id: UserId) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender_id,
            receiver_id,
            status: FriendRequestStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == FriendRequestStatus::Pending
    }

    pub fn pair(&self) -> PairKey {
        PairKey::new(&self.sender_id, &self.receiver_id)
    }
}

/// Request body for POST /api/friends
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SendFriendRequest {
    /// The user the request is addressed to.
    pub receiver_id: UserId,
}

/// Request body for PUT /api/friends
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UnfriendRequest {
    /// The friend to remove.
    pub user_id: UserId,
}

/// Pending requests involving the caller, split by direction.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, Default)]
pub struct PendingRequests {
    pub incoming: Vec<FriendRequest>,
    pub outgoing: Vec<FriendRequest>,
}

// =============================================================================
// Friendships
// =============================================================================

/// An established, undirected relationship.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Friendship {
    pub user_a: UserId,
    pub user_b: UserId,
    /// The request whose acceptance created this edge.
    pub request_id: String,
    pub since: DateTime<Utc>,
}

impl Friendship {
    pub fn between(user_a: UserId, user_b: UserId, request_id: impl Into<String>) -> Self {
        Self {
            user_a,
            user_b,
            request_id: request_id.into(),
            since: Utc::now(),
        }
    }

    pub fn pair(&self) -> PairKey {
        PairKey::new(&self.user_a, &self.user_b)
    }
}

/// One entry of GET /api/friends
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct FriendSummary {
    pub user_id: UserId,
    pub since: DateTime<Utc>,
}

// =============================================================================
// Tokens
// =============================================================================

/// Response for POST /api/auth/refresh
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub user_id: UserId,
    pub username: String,
    /// Bearer token for the `Authorization` header.
    pub token: String,
    /// Single-use token for the `refresh-token` header.
    pub refresh_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_from_and_into_string() {
        let from_str: UserId = "abc".into();
        assert_eq!(from_str.0, "abc");

        let to_string: String = UserId("ghi".into()).into();
        assert_eq!(to_string, "ghi");
    }

    #[test]
    fn pair_key_ignores_direction() {
        let a = UserId::from("alice");
        let b = UserId::from("bob");
        assert_eq!(PairKey::new(&a, &b), PairKey::new(&b, &a));
        assert_eq!(PairKey::new(&a, &b).as_str(), "alice|bob");
    }

    #[test]
    fn status_serializes_uppercase() {
        let json = serde_json::to_string(&FriendRequestStatus::Pending).unwrap();
        assert_eq!(json, r#""PENDING""#);
    }

    #[test]
    fn new_request_is_pending() {
        let request = FriendRequest::pending("a".into(), "b".into());
        assert!(request.is_pending());
        assert!(!request.id.is_empty());
        assert_eq!(request.pair(), PairKey::new(&"b".into(), &"a".into()));
    }
}
