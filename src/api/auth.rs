// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential bootstrap endpoints.
//!
//! These live under the allow-listed `/api/auth/` prefix, so the token gate
//! never inspects them.

use axum::{extract::State, http::HeaderMap, Json};

use crate::{
    auth::{AuthError, CredentialRotator},
    config::REFRESH_TOKEN_HEADER,
    models::TokenResponse,
    state::AppState,
};

/// Exchange a refresh token for a new credential pair.
///
/// The presented refresh token is consumed; the response carries its
/// replacement.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Auth",
    params(
        ("refresh-token" = String, Header, description = "Single-use refresh token")
    ),
    responses(
        (status = 200, description = "New credential pair", body = TokenResponse),
        (status = 400, description = "Missing refresh-token header"),
        (status = 401, description = "Unknown, expired or already used refresh token")
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AuthError> {
    let presented = headers
        .get(REFRESH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingCredential)?;

    let pair = state.refresh.exchange(presented)?;
    Ok(Json(pair))
}
