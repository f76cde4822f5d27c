// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::storage::StorageError;

/// Why a presented credential was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFault {
    /// Header value is not valid text
    BadHeader,
    /// Token cannot be decoded
    Malformed,
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired
    Expired,
    /// Token predates the user's last logout or password change
    Revoked,
}

/// Authentication error type.
///
/// Inside the token gate these are logged and swallowed; they only reach the
/// client through the extractors and the refresh endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer value present
    MissingCredential,
    /// Signature, structure, expiry or revocation check failed
    InvalidCredential(CredentialFault),
    /// Token subject does not resolve to a known user
    UnknownSubject,
    /// Refresh token unknown, already used, or expired
    InvalidRefreshToken,
    /// Internal error
    InternalError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::InvalidCredential(fault) => match fault {
                CredentialFault::BadHeader => "invalid_auth_header",
                CredentialFault::Malformed => "malformed_token",
                CredentialFault::InvalidSignature => "invalid_signature",
                CredentialFault::Expired => "token_expired",
                CredentialFault::Revoked => "token_revoked",
            },
            AuthError::UnknownSubject => "unknown_subject",
            AuthError::InvalidRefreshToken => "invalid_refresh_token",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredential(_)
            | AuthError::UnknownSubject
            | AuthError::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            AuthError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredential => write!(f, "Required credential header not found"),
            AuthError::InvalidCredential(fault) => match fault {
                CredentialFault::BadHeader => write!(f, "Authorization header is not valid text"),
                CredentialFault::Malformed => write!(f, "Token is malformed"),
                CredentialFault::InvalidSignature => write!(f, "Token signature is invalid"),
                CredentialFault::Expired => write!(f, "Token has expired"),
                CredentialFault::Revoked => write!(f, "Token has been revoked"),
            },
            AuthError::UnknownSubject => write!(f, "Token subject is not a known user"),
            AuthError::InvalidRefreshToken => {
                write!(f, "Refresh token is invalid, expired or already used")
            }
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<StorageError> for AuthError {
    fn from(e: StorageError) -> Self {
        AuthError::InternalError(e.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
