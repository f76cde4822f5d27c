// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Social - Identity Gate & Friendship Service
//!
//! Authenticates every call from a bearer token and runs the friend request
//! state machine on behalf of the resolved caller.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token gate, bearer tokens and refresh token rotation
//! - `friends` - Friend request lifecycle and friendships
//! - `storage` - Embedded redb database

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod friends;
pub mod models;
pub mod state;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_support;
