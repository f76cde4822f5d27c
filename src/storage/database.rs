// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded social graph database backed by redb.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde::de::DeserializeOwned;
use unicode_normalization::UnicodeNormalization;

use crate::models::{
    FriendRequest, FriendRequestStatus, FriendSummary, Friendship, PairKey, PendingRequests,
    StoredUser, UserId,
};

use super::stores::{
    FriendRequestStore, FriendshipStore, RefreshTokenStore, StoredRefreshToken, UserStore,
};

// =============================================================================
// Table Definitions
// =============================================================================

/// user_id → serialized StoredUser (JSON bytes).
const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Canonical username → user_id.
const USERNAMES: TableDefinition<&str, &str> = TableDefinition::new("usernames");

/// request_id → serialized FriendRequest (JSON bytes).
const FRIEND_REQUESTS: TableDefinition<&str, &[u8]> = TableDefinition::new("friend_requests");

/// Pair key → id of the pending request between the pair.
const PENDING_PAIRS: TableDefinition<&str, &str> = TableDefinition::new("pending_pairs");

/// Pair key → serialized Friendship (JSON bytes).
const FRIENDSHIPS: TableDefinition<&str, &[u8]> = TableDefinition::new("friendships");

/// `user_id|friend_id` → friendship start (unix millis), one row per direction.
const FRIEND_INDEX: TableDefinition<&str, i64> = TableDefinition::new("friend_index");

/// `user_id|request_id` → request creation (unix millis), one row per party
/// of every pending request.
const PENDING_INDEX: TableDefinition<&str, i64> = TableDefinition::new("pending_index");

/// SHA-256 digest → serialized StoredRefreshToken (JSON bytes).
const REFRESH_TOKENS: TableDefinition<&str, &[u8]> = TableDefinition::new("refresh_tokens");

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "social.redb";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Key Helpers
// =============================================================================

/// Normalize a username for lookup (NFKC, trimmed, lowercase).
pub fn canonical_username(username: &str) -> String {
    username.trim().nfkc().collect::<String>().to_lowercase()
}

fn index_key(user_id: &UserId, friend_id: &UserId) -> String {
    format!("{}|{}", user_id, friend_id)
}

fn pending_key(user_id: &UserId, request_id: &str) -> String {
    format!("{}|{}", user_id, request_id)
}

/// Half-open key range covering every `user_id|*` index row.
///
/// `}` is the byte right after `|`, so it bounds the prefix.
fn index_range(user_id: &UserId) -> (String, String) {
    (format!("{}|", user_id), format!("{}}}", user_id))
}

fn load_json<T, R>(table: &R, key: &str) -> StorageResult<Option<T>>
where
    T: DeserializeOwned,
    R: ReadableTable<&'static str, &'static [u8]>,
{
    match table.get(key)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

fn lookup_username<N, U>(names: &N, users: &U, username: &str) -> StorageResult<Option<StoredUser>>
where
    N: ReadableTable<&'static str, &'static str>,
    U: ReadableTable<&'static str, &'static [u8]>,
{
    let canonical = canonical_username(username);
    let user_id = match names.get(canonical.as_str())? {
        Some(id) => id.value().to_string(),
        None => return Ok(None),
    };
    load_json(users, &user_id)
}

// =============================================================================
// SocialDatabase
// =============================================================================

/// Embedded ACID social graph database.
pub struct SocialDatabase {
    db: Database,
}

impl SocialDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERNAMES)?;
            let _ = write_txn.open_table(FRIEND_REQUESTS)?;
            let _ = write_txn.open_table(PENDING_PAIRS)?;
            let _ = write_txn.open_table(PENDING_INDEX)?;
            let _ = write_txn.open_table(FRIENDSHIPS)?;
            let _ = write_txn.open_table(FRIEND_INDEX)?;
            let _ = write_txn.open_table(REFRESH_TOKENS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Open the database file inside a data directory.
    pub fn open_in(data_dir: &Path) -> StorageResult<Self> {
        Self::open(&data_dir.join(DATABASE_FILE))
    }

    /// Run `f` inside one write transaction.
    ///
    /// Effects commit together when `f` returns `Ok` and are discarded when it
    /// returns `Err`. Concurrent callers queue on redb's single writer.
    pub fn write<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&SocialTxn<'_>) -> Result<T, E>,
        E: From<StorageError>,
    {
        let txn = self.db.begin_write().map_err(StorageError::from)?;
        let result = f(&SocialTxn { txn: &txn });

        match result {
            Ok(value) => {
                txn.commit().map_err(StorageError::from)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort) = txn.abort() {
                    tracing::warn!(error = %abort, "Failed to abort write transaction");
                }
                Err(e)
            }
        }
    }

    /// Create a user with a fresh id.
    pub fn create_user(&self, username: &str) -> StorageResult<StoredUser> {
        let user = StoredUser::new(username.trim());
        self.write(|txn| txn.insert_user(&user))?;
        Ok(user)
    }

    /// Cheap round-trip used by the health check.
    pub fn check(&self) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(USERS)?;
        Ok(())
    }

    pub fn get_request(&self, request_id: &str) -> StorageResult<Option<FriendRequest>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(FRIEND_REQUESTS)?;
        load_json(&table, request_id)
    }

    pub fn are_friends(&self, a: &UserId, b: &UserId) -> StorageResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(FRIENDSHIPS)?;
        let exists = table.get(PairKey::new(a, b).as_str())?.is_some();
        Ok(exists)
    }

    /// Friends of a user, ordered by friend id.
    pub fn list_friends(&self, user_id: &UserId) -> StorageResult<Vec<FriendSummary>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(FRIEND_INDEX)?;
        let (start, end) = index_range(user_id);

        let mut friends = Vec::new();
        for entry in index.range(start.as_str()..end.as_str())? {
            let (key, since) = entry?;
            let Some(friend_id) = key.value().strip_prefix(start.as_str()) else {
                continue;
            };
            friends.push(FriendSummary {
                user_id: UserId::from(friend_id),
                since: DateTime::<Utc>::from_timestamp_millis(since.value()).unwrap_or_default(),
            });
        }

        Ok(friends)
    }

    /// Pending requests addressed to or sent by a user, oldest first.
    pub fn list_pending(&self, user_id: &UserId) -> StorageResult<PendingRequests> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(PENDING_INDEX)?;
        let requests = read_txn.open_table(FRIEND_REQUESTS)?;
        let (start, end) = index_range(user_id);

        let mut pending = PendingRequests::default();
        for entry in index.range(start.as_str()..end.as_str())? {
            let (key, _) = entry?;
            let Some(request_id) = key.value().strip_prefix(start.as_str()) else {
                continue;
            };
            let Some(request) = load_json::<FriendRequest, _>(&requests, request_id)? else {
                continue;
            };
            if !request.is_pending() {
                continue;
            }
            if &request.receiver_id == user_id {
                pending.incoming.push(request);
            } else {
                pending.outgoing.push(request);
            }
        }

        pending.incoming.sort_by_key(|r| r.created_at);
        pending.outgoing.sort_by_key(|r| r.created_at);
        Ok(pending)
    }
}

impl UserStore for SocialDatabase {
    fn find_user_by_id(&self, user_id: &UserId) -> StorageResult<Option<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        load_json(&users, user_id.as_str())
    }

    fn find_user_by_username(&self, username: &str) -> StorageResult<Option<StoredUser>> {
        let read_txn = self.db.begin_read()?;
        let names = read_txn.open_table(USERNAMES)?;
        let users = read_txn.open_table(USERS)?;
        lookup_username(&names, &users, username)
    }
}

// =============================================================================
// SocialTxn
// =============================================================================

/// Store view bound to one open write transaction.
pub struct SocialTxn<'a> {
    txn: &'a WriteTransaction,
}

impl SocialTxn<'_> {
    /// Insert a new user.
    ///
    /// # Errors
    /// `StorageError::AlreadyExists` if the id or the canonical username is taken.
    pub fn insert_user(&self, user: &StoredUser) -> StorageResult<()> {
        let canonical = canonical_username(&user.username);
        if canonical.is_empty() {
            return Err(StorageError::InvalidKey("username is empty".to_string()));
        }

        let mut names = self.txn.open_table(USERNAMES)?;
        if names.get(canonical.as_str())?.is_some() {
            return Err(StorageError::AlreadyExists(format!("Username {}", user.username)));
        }

        let mut users = self.txn.open_table(USERS)?;
        if users.get(user.id.as_str())?.is_some() {
            return Err(StorageError::AlreadyExists(format!("User {}", user.id)));
        }

        let json = serde_json::to_vec(user)?;
        users.insert(user.id.as_str(), json.as_slice())?;
        names.insert(canonical.as_str(), user.id.as_str())?;
        Ok(())
    }

    /// Invalidate every bearer token issued to the user so far.
    pub fn bump_token_version(&self, user_id: &UserId) -> StorageResult<StoredUser> {
        let mut users = self.txn.open_table(USERS)?;
        let mut user: StoredUser = load_json(&users, user_id.as_str())?
            .ok_or_else(|| StorageError::NotFound(format!("User {user_id}")))?;

        user.token_version = user.token_version.wrapping_add(1);
        let json = serde_json::to_vec(&user)?;
        users.insert(user_id.as_str(), json.as_slice())?;
        Ok(user)
    }

    fn put_request(&self, request: &FriendRequest) -> StorageResult<()> {
        let mut requests = self.txn.open_table(FRIEND_REQUESTS)?;
        let json = serde_json::to_vec(request)?;
        requests.insert(request.id.as_str(), json.as_slice())?;
        Ok(())
    }

    /// Drop the request's pending index rows and release the pair guard if
    /// it still points at this request.
    fn release_pending(&self, request: &FriendRequest) -> StorageResult<()> {
        {
            let mut index = self.txn.open_table(PENDING_INDEX)?;
            index.remove(pending_key(&request.sender_id, &request.id).as_str())?;
            index.remove(pending_key(&request.receiver_id, &request.id).as_str())?;
        }

        let pair = request.pair();
        let mut guards = self.txn.open_table(PENDING_PAIRS)?;
        let holder = guards.get(pair.as_str())?.map(|id| id.value().to_string());
        if holder.as_deref() == Some(request.id.as_str()) {
            guards.remove(pair.as_str())?;
        }
        Ok(())
    }

    fn remove_refresh_tokens_where<P>(&self, matches: P) -> StorageResult<usize>
    where
        P: Fn(&StoredRefreshToken) -> bool,
    {
        let mut tokens = self.txn.open_table(REFRESH_TOKENS)?;

        let mut doomed = Vec::new();
        for entry in tokens.iter()? {
            let (digest, value) = entry?;
            let token: StoredRefreshToken = serde_json::from_slice(value.value())?;
            if matches(&token) {
                doomed.push(digest.value().to_string());
            }
        }

        for digest in &doomed {
            tokens.remove(digest.as_str())?;
        }
        Ok(doomed.len())
    }
}

impl UserStore for SocialTxn<'_> {
    fn find_user_by_id(&self, user_id: &UserId) -> StorageResult<Option<StoredUser>> {
        let users = self.txn.open_table(USERS)?;
        load_json(&users, user_id.as_str())
    }

    fn find_user_by_username(&self, username: &str) -> StorageResult<Option<StoredUser>> {
        let names = self.txn.open_table(USERNAMES)?;
        let users = self.txn.open_table(USERS)?;
        lookup_username(&names, &users, username)
    }
}

impl FriendRequestStore for SocialTxn<'_> {
    fn insert_request(&self, request: &FriendRequest) -> StorageResult<()> {
        let pair = request.pair();
        {
            let mut guards = self.txn.open_table(PENDING_PAIRS)?;
            if guards.get(pair.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!(
                    "Pending friend request between {} and {}",
                    request.sender_id, request.receiver_id
                )));
            }
            guards.insert(pair.as_str(), request.id.as_str())?;
        }
        {
            let created = request.created_at.timestamp_millis();
            let mut index = self.txn.open_table(PENDING_INDEX)?;
            index.insert(pending_key(&request.sender_id, &request.id).as_str(), created)?;
            index.insert(pending_key(&request.receiver_id, &request.id).as_str(), created)?;
        }
        self.put_request(request)
    }

    fn find_request(&self, request_id: &str) -> StorageResult<Option<FriendRequest>> {
        let requests = self.txn.open_table(FRIEND_REQUESTS)?;
        load_json(&requests, request_id)
    }

    fn find_pending(&self, pair: &PairKey) -> StorageResult<Option<FriendRequest>> {
        let request_id = {
            let guards = self.txn.open_table(PENDING_PAIRS)?;
            let holder = guards.get(pair.as_str())?.map(|id| id.value().to_string());
            match holder {
                Some(id) => id,
                None => return Ok(None),
            }
        };
        Ok(self
            .find_request(&request_id)?
            .filter(FriendRequest::is_pending))
    }

    fn delete_request(&self, request_id: &str) -> StorageResult<()> {
        let request = self
            .find_request(request_id)?
            .ok_or_else(|| StorageError::NotFound(format!("Friend request {request_id}")))?;

        {
            let mut requests = self.txn.open_table(FRIEND_REQUESTS)?;
            requests.remove(request_id)?;
        }
        self.release_pending(&request)
    }

    fn mark_accepted(&self, request_id: &str) -> StorageResult<FriendRequest> {
        let mut request = self
            .find_request(request_id)?
            .filter(FriendRequest::is_pending)
            .ok_or_else(|| {
                StorageError::NotFound(format!("Pending friend request {request_id}"))
            })?;

        request.status = FriendRequestStatus::Accepted;
        self.put_request(&request)?;
        self.release_pending(&request)?;
        Ok(request)
    }
}

impl FriendshipStore for SocialTxn<'_> {
    fn insert_friendship(&self, friendship: &Friendship) -> StorageResult<()> {
        let pair = friendship.pair();
        {
            let mut edges = self.txn.open_table(FRIENDSHIPS)?;
            if edges.get(pair.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(format!(
                    "Friendship between {} and {}",
                    friendship.user_a, friendship.user_b
                )));
            }
            let json = serde_json::to_vec(friendship)?;
            edges.insert(pair.as_str(), json.as_slice())?;
        }

        let since = friendship.since.timestamp_millis();
        let mut index = self.txn.open_table(FRIEND_INDEX)?;
        index.insert(index_key(&friendship.user_a, &friendship.user_b).as_str(), since)?;
        index.insert(index_key(&friendship.user_b, &friendship.user_a).as_str(), since)?;
        Ok(())
    }

    fn remove_friendship(&self, a: &UserId, b: &UserId) -> StorageResult<()> {
        {
            let mut edges = self.txn.open_table(FRIENDSHIPS)?;
            if edges.remove(PairKey::new(a, b).as_str())?.is_none() {
                return Err(StorageError::NotFound(format!("Friendship between {a} and {b}")));
            }
        }

        let mut index = self.txn.open_table(FRIEND_INDEX)?;
        index.remove(index_key(a, b).as_str())?;
        index.remove(index_key(b, a).as_str())?;
        Ok(())
    }

    fn friendship_exists(&self, a: &UserId, b: &UserId) -> StorageResult<bool> {
        let edges = self.txn.open_table(FRIENDSHIPS)?;
        let exists = edges.get(PairKey::new(a, b).as_str())?.is_some();
        Ok(exists)
    }
}

impl RefreshTokenStore for SocialTxn<'_> {
    fn insert_refresh_token(&self, digest: &str, token: &StoredRefreshToken) -> StorageResult<()> {
        let mut tokens = self.txn.open_table(REFRESH_TOKENS)?;
        let json = serde_json::to_vec(token)?;
        tokens.insert(digest, json.as_slice())?;
        Ok(())
    }

    fn take_refresh_token(&self, digest: &str) -> StorageResult<Option<StoredRefreshToken>> {
        let mut tokens = self.txn.open_table(REFRESH_TOKENS)?;
        let removed = match tokens.remove(digest)? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(removed)
    }

    fn revoke_refresh_tokens(&self, user_id: &UserId) -> StorageResult<usize> {
        self.remove_refresh_tokens_where(|token| &token.user_id == user_id)
    }

    fn purge_expired_refresh_tokens(&self, now: DateTime<Utc>) -> StorageResult<usize> {
        self.remove_refresh_tokens_where(|token| token.expires_at <= now)
    }
}
