// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token gate: resolves the caller's identity before any handler runs.
//!
//! The gate never rejects a request. It binds either a [`Principal`] or the
//! [`AuthError`] explaining why none was established into the request
//! extensions, and lets the extractors in `extractor.rs` decide whether a
//! missing identity is fatal for the route.
//!
//! ## Flow
//!
//! 1. Allow-listed path prefixes skip the gate entirely
//! 2. Read the bearer value from `Authorization`
//! 3. Verify signature and expiry
//! 4. Resolve the subject to a stored user
//! 5. Check the token against the user's current token version

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use super::claims::Principal;
use super::error::{AuthError, CredentialFault};
use super::token::CredentialVerifier;
use crate::config::ALLOW_LISTED_PREFIXES;
use crate::state::AppState;
use crate::storage::UserStore;

/// Authenticates bearer credentials.
pub struct TokenGate {
    verifier: Arc<dyn CredentialVerifier>,
    allow_list: Vec<String>,
}

impl TokenGate {
    /// Create a gate with the default allow-list.
    pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            verifier,
            allow_list: ALLOW_LISTED_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Replace the allow-listed path prefixes.
    pub fn with_allow_list<I, P>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.allow_list = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the path is exempt from authentication.
    pub fn is_exempt(&self, path: &str) -> bool {
        self.allow_list
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Resolve the caller from request headers.
    pub fn authenticate<U>(&self, headers: &HeaderMap, users: &U) -> Result<Principal, AuthError>
    where
        U: UserStore + ?Sized,
    {
        let token = extract_bearer(headers)?;
        let claims = self.verifier.verify(token)?;

        let user = users
            .find_user_by_username(&claims.sub)?
            .ok_or(AuthError::UnknownSubject)?;

        if user.id != claims.uid {
            return Err(AuthError::UnknownSubject);
        }

        if user.token_version != claims.ver {
            return Err(AuthError::InvalidCredential(CredentialFault::Revoked));
        }

        Ok(Principal::from(&user))
    }
}

/// Extract the bearer value from the `Authorization` header.
///
/// Accepts `Bearer <token>` or a bare token. A blank header counts as absent.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::InvalidCredential(CredentialFault::BadHeader))?;

    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}

/// Authentication middleware function.
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/api/friends", post(send_friend_request))
///     .layer(axum::middleware::from_fn_with_state(state.clone(), token_gate));
/// ```
pub async fn token_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if state.gate.is_exempt(path) {
        return next.run(request).await;
    }

    if request.extensions().get::<Principal>().is_none() {
        match state.gate.authenticate(request.headers(), state.db.as_ref()) {
            Ok(principal) => {
                tracing::debug!(user_id = %principal.user_id, "Caller authenticated");
                request.extensions_mut().insert(principal);
            }
            Err(e) => {
                match &e {
                    AuthError::MissingCredential => {
                        tracing::debug!("No credential presented");
                    }
                    AuthError::InternalError(msg) => {
                        tracing::warn!(error = %msg, "Credential check failed");
                    }
                    other => {
                        tracing::info!(error_code = other.error_code(), "Credential rejected");
                    }
                }
                request.extensions_mut().insert(e);
            }
        }
    }

    next.run(request).await
}
