// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    auth::{Auth, AuthError},
    models::UserMeResponse,
    state::AppState,
};

/// Get the current authenticated user's information.
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserMeResponse),
        (status = 400, description = "Missing credential"),
        (status = 401, description = "Unauthorized - invalid token"),
    )
)]
pub async fn get_current_user(Auth(principal): Auth) -> Json<UserMeResponse> {
    Json(principal.into())
}

/// Log out everywhere.
///
/// Outstanding bearer tokens stop passing the token gate and every refresh
/// token of the caller is dropped.
#[utoipa::path(
    post,
    path = "/api/users/logout",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Sessions revoked"),
        (status = 400, description = "Missing credential"),
        (status = 401, description = "Unauthorized - invalid token"),
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Auth(principal): Auth,
) -> Result<StatusCode, AuthError> {
    let revoked = state.refresh.revoke_sessions(&principal.user_id)?;
    tracing::info!(user_id = %principal.user_id, revoked, "User logged out");
    Ok(StatusCode::OK)
}
