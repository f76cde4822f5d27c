// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Friend request and friendship endpoints.
//!
//! Every endpoint answers 400 when no `Authorization` header was sent and
//! 401 when the presented credential did not resolve to a user.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::Caller,
    error::ApiError,
    models::{FriendSummary, PendingRequests, SendFriendRequest, UnfriendRequest},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/friends",
    request_body = SendFriendRequest,
    tag = "Friends",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Friend request sent"),
        (status = 400, description = "Missing credential or request to self"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Receiver not found"),
        (status = 409, description = "Already friends or a request is pending")
    )
)]
pub async fn send_friend_request(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Json(request): Json<SendFriendRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .friends()
        .send_request(principal.as_ref(), &request.receiver_id)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    put,
    path = "/api/friends/requests/{request_id}/accept",
    params(
        ("request_id" = String, Path, description = "Identifier of the pending request")
    ),
    tag = "Friends",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Friend request accepted"),
        (status = 400, description = "Missing credential"),
        (status = 401, description = "Caller is not the receiver"),
        (status = 404, description = "No such pending request")
    )
)]
pub async fn accept_friend_request(
    Path(request_id): Path<String>,
    State(state): State<AppState>,
    Caller(principal): Caller,
) -> Result<StatusCode, ApiError> {
    state
        .friends()
        .accept_request(principal.as_ref(), &request_id)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    delete,
    path = "/api/friends/requests/{request_id}/reject",
    params(
        ("request_id" = String, Path, description = "Identifier of the pending request")
    ),
    tag = "Friends",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Friend request rejected"),
        (status = 400, description = "Missing credential"),
        (status = 401, description = "Caller is not the receiver"),
        (status = 404, description = "No such pending request")
    )
)]
pub async fn reject_friend_request(
    Path(request_id): Path<String>,
    State(state): State<AppState>,
    Caller(principal): Caller,
) -> Result<StatusCode, ApiError> {
    state
        .friends()
        .reject_request(principal.as_ref(), &request_id)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    delete,
    path = "/api/friends/requests/{request_id}",
    params(
        ("request_id" = String, Path, description = "Identifier of the caller's outgoing request")
    ),
    tag = "Friends",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Friend request withdrawn"),
        (status = 400, description = "Missing credential"),
        (status = 401, description = "Caller is not the sender"),
        (status = 404, description = "No such pending request")
    )
)]
pub async fn delete_friend_request(
    Path(request_id): Path<String>,
    State(state): State<AppState>,
    Caller(principal): Caller,
) -> Result<StatusCode, ApiError> {
    state
        .friends()
        .delete_request(principal.as_ref(), &request_id)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    put,
    path = "/api/friends",
    request_body = UnfriendRequest,
    tag = "Friends",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Friendship removed"),
        (status = 400, description = "Missing credential"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not friends")
    )
)]
pub async fn unfriend(
    State(state): State<AppState>,
    Caller(principal): Caller,
    Json(request): Json<UnfriendRequest>,
) -> Result<StatusCode, ApiError> {
    state.friends().unfriend(principal.as_ref(), &request.user_id)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/api/friends",
    tag = "Friends",
    security(("bearer" = [])),
    responses(
        (status = 200, body = [FriendSummary]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_friends(
    State(state): State<AppState>,
    Caller(principal): Caller,
) -> Result<Json<Vec<FriendSummary>>, ApiError> {
    let friends = state.friends().friends(principal.as_ref())?;
    Ok(Json(friends))
}

#[utoipa::path(
    get,
    path = "/api/friends/requests",
    tag = "Friends",
    security(("bearer" = [])),
    responses(
        (status = 200, body = PendingRequests),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_friend_requests(
    State(state): State<AppState>,
    Caller(principal): Caller,
) -> Result<Json<PendingRequests>, ApiError> {
    let pending = state.friends().pending(principal.as_ref())?;
    Ok(Json(pending))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserId;
    use crate::test_support::{create_principal, test_state};

    #[tokio::test]
    async fn send_and_accept_via_handlers() {
        let (state, _dir) = test_state();
        let alice = create_principal(&state, "alice");
        let bob = create_principal(&state, "bob");

        let status = send_friend_request(
            State(state.clone()),
            Caller(Some(alice.clone())),
            Json(SendFriendRequest {
                receiver_id: bob.user_id.clone(),
            }),
        )
        .await
        .expect("request sent");
        assert_eq!(status, StatusCode::OK);

        let Json(pending) = list_friend_requests(State(state.clone()), Caller(Some(bob.clone())))
            .await
            .unwrap();
        assert_eq!(pending.incoming.len(), 1);
        let request_id = pending.incoming[0].id.clone();

        let status = accept_friend_request(Path(request_id), State(state.clone()), Caller(Some(bob.clone())))
            .await
            .expect("request accepted");
        assert_eq!(status, StatusCode::OK);

        let Json(friends) = list_friends(State(state.clone()), Caller(Some(alice.clone())))
            .await
            .unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].user_id, bob.user_id);
    }

    #[tokio::test]
    async fn errors_map_to_status_codes() {
        let (state, _dir) = test_state();
        let alice = create_principal(&state, "alice");
        let bob = create_principal(&state, "bob");

        let missing_user = send_friend_request(
            State(state.clone()),
            Caller(Some(alice.clone())),
            Json(SendFriendRequest {
                receiver_id: UserId::new(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(missing_user.status, StatusCode::NOT_FOUND);

        let anonymous = send_friend_request(
            State(state.clone()),
            Caller(None),
            Json(SendFriendRequest {
                receiver_id: bob.user_id.clone(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

        let not_friends = unfriend(
            State(state.clone()),
            Caller(Some(alice.clone())),
            Json(UnfriendRequest {
                user_id: bob.user_id.clone(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(not_friends.status, StatusCode::NOT_FOUND);

        let unknown_request = reject_friend_request(
            Path("no-such-request".to_string()),
            State(state.clone()),
            Caller(Some(bob.clone())),
        )
        .await
        .unwrap_err();
        assert_eq!(unknown_request.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_request_conflicts() {
        let (state, _dir) = test_state();
        let alice = create_principal(&state, "alice");
        let bob = create_principal(&state, "bob");

        let send = |from: &crate::auth::Principal, to: &crate::auth::Principal| {
            send_friend_request(
                State(state.clone()),
                Caller(Some(from.clone())),
                Json(SendFriendRequest {
                    receiver_id: to.user_id.clone(),
                }),
            )
        };

        send(&alice, &bob).await.unwrap();
        let conflict = send(&bob, &alice).await.unwrap_err();
        assert_eq!(conflict.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn sender_withdraws_request() {
        let (state, _dir) = test_state();
        let alice = create_principal(&state, "alice");
        let bob = create_principal(&state, "bob");

        let request = state
            .friends()
            .send_request(Some(&alice), &bob.user_id)
            .unwrap();

        let by_receiver = delete_friend_request(
            Path(request.id.clone()),
            State(state.clone()),
            Caller(Some(bob.clone())),
        )
        .await
        .unwrap_err();
        assert_eq!(by_receiver.status, StatusCode::UNAUTHORIZED);

        let status = delete_friend_request(Path(request.id), State(state.clone()), Caller(Some(alice.clone())))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
    }
}
