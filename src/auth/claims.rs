// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the authenticated principal.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{StoredUser, UserId, UserMeResponse};

/// Claims carried by a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// User ID the token was issued to
    pub uid: UserId,

    /// Token version of the user at issue time
    #[serde(default)]
    pub ver: u32,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,
}

impl Claims {
    /// Claims for the user's current state, or `None` if the expiry overflows.
    pub fn for_user(user: &StoredUser, issued_at: i64, ttl_secs: i64) -> Option<Self> {
        Some(Self {
            sub: user.username.clone(),
            uid: user.id.clone(),
            ver: user.token_version,
            iat: issued_at,
            exp: issued_at.checked_add(ttl_secs)?,
        })
    }
}

/// The identity resolved for the current call.
///
/// Created per request by the token gate and passed explicitly to every
/// friendship operation. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
}

impl From<&StoredUser> for Principal {
    fn from(user: &StoredUser) -> Self {
        Self {
            user_id: user.id.clone(),
            username: user.username.clone(),
        }
    }
}

impl From<Principal> for UserMeResponse {
    fn from(principal: Principal) -> Self {
        Self {
            user_id: principal.user_id,
            username: principal.username,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_follow_user_state() {
        let mut user = StoredUser::new("alice");
        user.token_version = 3;

        let claims = Claims::for_user(&user, 1_700_000_000, 900).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.uid, user.id);
        assert_eq!(claims.ver, 3);
        assert_eq!(claims.exp, 1_700_000_900);
    }

    #[test]
    fn overflowing_expiry_is_none() {
        let user = StoredUser::new("alice");
        assert!(Claims::for_user(&user, 1_700_000_000, i64::MAX).is_none());
    }

    #[test]
    fn missing_version_defaults_to_zero() {
        let claims: Claims =
            serde_json::from_str(r#"{"sub":"bob","uid":"u-1","iat":1,"exp":2}"#).unwrap();
        assert_eq!(claims.ver, 0);
    }
}
