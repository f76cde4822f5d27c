// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication for the social API.
//!
//! ## Auth Flow
//!
//! 1. A client obtains a bearer token and a refresh token
//! 2. Every call sends `Authorization: Bearer <token>`
//! 3. The token gate (middleware):
//!    - Skips allow-listed prefixes (`/ws`, `/api/auth/`, health, docs)
//!    - Verifies the HS256 signature and expiry
//!    - Resolves `sub` to a stored user and checks the token version
//!    - Binds a `Principal` (or the failure reason) to the request
//! 4. Handlers pick the identity up with the `Caller` / `Auth` extractors
//! 5. Expired bearer tokens are replaced through `POST /api/auth/refresh`
//!    with the single-use `refresh-token` header
//! 6. A background sweeper deletes refresh tokens that expired unredeemed
//!
//! ## Failure Policy
//!
//! The gate fails open to "no identity": credential problems are logged and
//! recorded, never turned into a response by the gate itself.

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod refresh;
pub mod sweeper;
pub mod token;

pub use claims::{Claims, Principal};
pub use error::{AuthError, CredentialFault};
pub use extractor::{Auth, Caller};
pub use middleware::{extract_bearer, token_gate, TokenGate};
pub use refresh::{CredentialRotator, RefreshTokenService};
pub use sweeper::RefreshTokenSweeper;
pub use token::{CredentialVerifier, JwtCodec};
