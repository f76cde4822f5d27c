// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors over the identity bound by the token gate.
//!
//! ```rust,ignore
//! async fn my_handler(Auth(principal): Auth) -> impl IntoResponse {
//!     // principal is the authenticated caller
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, Principal};

/// Optional caller identity.
///
/// Rejects only when no credential was presented at all (400). A credential
/// that was present but refused yields `Caller(None)` so that the operation
/// itself can answer `Unauthorized`.
pub struct Caller(pub Option<Principal>);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>().cloned() {
            return Ok(Caller(Some(principal)));
        }

        match parts.extensions.get::<AuthError>() {
            Some(AuthError::MissingCredential) => Err(AuthError::MissingCredential),
            _ => Ok(Caller(None)),
        }
    }
}

/// Required caller identity.
///
/// Rejects with the gate's recorded reason, or `MissingCredential` when the
/// gate did not run for this request.
pub struct Auth(pub Principal);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>().cloned() {
            return Ok(Auth(principal));
        }

        Err(parts
            .extensions
            .get::<AuthError>()
            .cloned()
            .unwrap_or(AuthError::MissingCredential))
    }
}
