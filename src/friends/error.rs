// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use crate::storage::StorageError;

/// Failures of friendship operations.
///
/// These are caller-input errors and are never retried.
#[derive(Debug, thiserror::Error)]
pub enum FriendshipError {
    /// No caller identity, or the caller is not the party allowed to act.
    #[error("Not authorized to perform this action")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    /// Sender and receiver are the same user.
    #[error("Cannot send a friend request to yourself")]
    InvalidTarget,

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for FriendshipError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(what) => FriendshipError::NotFound(what),
            StorageError::AlreadyExists(what) => FriendshipError::AlreadyExists(what),
            other => FriendshipError::Storage(other),
        }
    }
}

pub type FriendshipResult<T> = Result<T, FriendshipError>;
