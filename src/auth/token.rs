// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token signing and verification (HS256).

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::Claims;
use super::error::{AuthError, CredentialFault};
use crate::models::StoredUser;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Verifies a bearer token and returns its claims.
///
/// Implementations check signature, structure and expiry only. Resolving the
/// subject against the user store is the gate's job.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Claims, AuthError>;
}

/// HMAC-SHA256 JWT codec with a shared secret.
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl JwtCodec {
    /// Create a codec.
    ///
    /// # Arguments
    /// - `secret`: HS256 signing secret
    /// - `ttl_secs`: lifetime of issued tokens
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_aud = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_secs,
        }
    }

    /// Sign a bearer token for the user's current token version.
    pub fn issue(&self, user: &StoredUser) -> Result<String, AuthError> {
        self.issue_at(user, Utc::now().timestamp())
    }

    /// Sign a token as if it had been issued at `issued_at` (unix seconds).
    pub fn issue_at(&self, user: &StoredUser, issued_at: i64) -> Result<String, AuthError> {
        let claims = Claims::for_user(user, issued_at, self.ttl_secs)
            .ok_or_else(|| AuthError::InternalError("Token expiry out of range".to_string()))?;
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InternalError(format!("Failed to sign token: {e}")))
    }
}

impl CredentialVerifier for JwtCodec {
    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AuthError::InvalidCredential(CredentialFault::Expired)
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AuthError::InvalidCredential(CredentialFault::InvalidSignature)
                }
                _ => AuthError::InvalidCredential(CredentialFault::Malformed),
            })?;

        Ok(token_data.claims)
    }
}
