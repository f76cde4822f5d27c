// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Friendship Module
//!
//! Friend request lifecycle and the undirected friendship graph.
//!
//! | Operation | Acting party | Effect |
//! |-----------|--------------|--------|
//! | send | any caller | new `PENDING` request |
//! | accept | receiver | request `ACCEPTED`, friendship created |
//! | reject | receiver | request removed |
//! | delete | sender | request removed |
//! | unfriend | either friend | friendship removed |
//!
//! At most one pending request exists per unordered pair of users.

pub mod engine;
pub mod error;

pub use engine::FriendshipEngine;
pub use error::{FriendshipError, FriendshipResult};
