// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{token_gate, Principal},
    models::{
        FriendRequest, FriendRequestStatus, FriendSummary, PendingRequests, SendFriendRequest,
        TokenResponse, UnfriendRequest, UserId, UserMeResponse,
    },
    state::AppState,
};

pub mod auth;
pub mod friends;
pub mod health;
pub mod users;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route(
            "/api/friends",
            get(friends::list_friends)
                .post(friends::send_friend_request)
                .put(friends::unfriend),
        )
        .route("/api/friends/requests", get(friends::list_friend_requests))
        .route(
            "/api/friends/requests/{request_id}",
            delete(friends::delete_friend_request),
        )
        .route(
            "/api/friends/requests/{request_id}/accept",
            put(friends::accept_friend_request),
        )
        .route(
            "/api/friends/requests/{request_id}/reject",
            delete(friends::reject_friend_request),
        )
        .route("/api/auth/refresh", post(auth::refresh_token))
        .route("/api/users/me", get(users::get_current_user))
        .route("/api/users/logout", post(users::logout))
        .route("/health", get(health::health))
        .layer(middleware::from_fn_with_state(state.clone(), token_gate))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        friends::send_friend_request,
        friends::accept_friend_request,
        friends::reject_friend_request,
        friends::delete_friend_request,
        friends::unfriend,
        friends::list_friends,
        friends::list_friend_requests,
        auth::refresh_token,
        users::get_current_user,
        users::logout,
        health::health
    ),
    components(
        schemas(
            UserId,
            Principal,
            FriendRequest,
            FriendRequestStatus,
            FriendSummary,
            PendingRequests,
            SendFriendRequest,
            UnfriendRequest,
            TokenResponse,
            UserMeResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Friends", description = "Friend requests and friendships"),
        (name = "Auth", description = "Credential rotation"),
        (name = "Users", description = "Caller identity and sessions"),
        (name = "Health", description = "Service health")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::REFRESH_TOKEN_HEADER;
    use crate::storage::UserStore;
    use crate::test_support::{bearer_for, create_principal, test_state};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(app: &Router, method: &str, uri: &str, auth: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.expect("response")
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn send_body(to: &Principal) -> Value {
        json!({ "receiver_id": to.user_id })
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _dir) = test_state();
        let app = router(state);
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn friendship_lifecycle_over_http() {
        let (state, _dir) = test_state();
        let u1 = create_principal(&state, "u1");
        let u2 = create_principal(&state, "u2");
        let t1 = bearer_for(&state, &u1);
        let t2 = bearer_for(&state, &u2);
        let app = router(state);

        let sent = call(&app, "POST", "/api/friends", Some(t1.as_str()), Some(send_body(&u2))).await;
        assert_eq!(sent.status(), StatusCode::OK);

        let reverse = call(&app, "POST", "/api/friends", Some(t2.as_str()), Some(send_body(&u1))).await;
        assert_eq!(reverse.status(), StatusCode::CONFLICT);

        let pending = json_body(call(&app, "GET", "/api/friends/requests", Some(t2.as_str()), None).await).await;
        let request_id = pending["incoming"][0]["id"].as_str().unwrap().to_string();
        assert_eq!(pending["incoming"][0]["status"], "PENDING");

        let by_sender = call(
            &app,
            "PUT",
            &format!("/api/friends/requests/{request_id}/accept"),
            Some(t1.as_str()),
            None,
        )
        .await;
        assert_eq!(by_sender.status(), StatusCode::UNAUTHORIZED);

        let accepted = call(
            &app,
            "PUT",
            &format!("/api/friends/requests/{request_id}/accept"),
            Some(t2.as_str()),
            None,
        )
        .await;
        assert_eq!(accepted.status(), StatusCode::OK);

        let friends = json_body(call(&app, "GET", "/api/friends", Some(t1.as_str()), None).await).await;
        assert_eq!(friends[0]["user_id"], json!(u2.user_id));

        let unfriend_body = |p: &Principal| json!({ "user_id": p.user_id });
        let removed = call(&app, "PUT", "/api/friends", Some(t1.as_str()), Some(unfriend_body(&u2))).await;
        assert_eq!(removed.status(), StatusCode::OK);

        let again = call(&app, "PUT", "/api/friends", Some(t2.as_str()), Some(unfriend_body(&u1))).await;
        assert_eq!(again.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reject_twice_is_not_found() {
        let (state, _dir) = test_state();
        let u1 = create_principal(&state, "u1");
        let u2 = create_principal(&state, "u2");
        let request = state.friends().send_request(Some(&u1), &u2.user_id).unwrap();
        let t2 = bearer_for(&state, &u2);
        let app = router(state);

        let uri = format!("/api/friends/requests/{}/reject", request.id);
        let first = call(&app, "DELETE", &uri, Some(t2.as_str()), None).await;
        assert_eq!(first.status(), StatusCode::OK);

        let second = call(&app, "DELETE", &uri, Some(t2.as_str()), None).await;
        assert_eq!(second.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_header_is_bad_request() {
        let (state, _dir) = test_state();
        let u2 = create_principal(&state, "u2");
        let app = router(state);

        let response = call(&app, "POST", "/api/friends", None, Some(send_body(&u2))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error_code"], "missing_credential");
    }

    #[tokio::test]
    async fn invalid_token_is_unauthorized() {
        let (state, _dir) = test_state();
        let u1 = create_principal(&state, "u1");
        let u2 = create_principal(&state, "u2");
        let mut tampered = bearer_for(&state, &u1);
        tampered.push('x');
        let app = router(state);

        let response = call(&app, "POST", "/api/friends", Some(tampered.as_str()), Some(send_body(&u2))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let me = call(&app, "GET", "/api/users/me", Some("Bearer not-a-jwt"), None).await;
        assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_revokes_bearer_token() {
        let (state, _dir) = test_state();
        let u1 = create_principal(&state, "u1");
        let t1 = bearer_for(&state, &u1);
        let app = router(state);

        let me = json_body(call(&app, "GET", "/api/users/me", Some(t1.as_str()), None).await).await;
        assert_eq!(me["username"], "u1");

        let logout = call(&app, "POST", "/api/users/logout", Some(t1.as_str()), None).await;
        assert_eq!(logout.status(), StatusCode::OK);

        let after = call(&app, "GET", "/api/users/me", Some(t1.as_str()), None).await;
        assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(after).await["error_code"], "token_revoked");
    }

    #[tokio::test]
    async fn refresh_is_allow_listed() {
        let (state, _dir) = test_state();
        let u1 = create_principal(&state, "u1");
        let user = state.db.find_user_by_id(&u1.user_id).unwrap().unwrap();
        let pair = state.refresh.issue_pair(&user).unwrap();
        let app = router(state);

        // No Authorization header, yet the gate does not interfere
        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/refresh")
            .header(REFRESH_TOKEN_HEADER, pair.refresh_token.as_str())
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let rotated = json_body(response).await;
        let token = rotated["token"].as_str().unwrap();
        let me = call(&app, "GET", "/api/users/me", Some(format!("Bearer {token}").as_str()), None).await;
        assert_eq!(me.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_needs_no_credential() {
        let (state, _dir) = test_state();
        let app = router(state);

        let response = call(&app, "GET", "/health", None, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }
}
