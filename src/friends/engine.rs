// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Friend request state machine.
//!
//! ```text
//!            send                accept (receiver)
//!   (none) -------> PENDING ---------------------> ACCEPTED + Friendship
//!                     |  \
//!     reject          |   \  delete (sender)
//!   (receiver)        v    v
//!                   (removed)
//! ```
//!
//! Every compound change runs inside one database write transaction, so an
//! accepted request is never visible without its friendship and an unfriend
//! never leaves half an edge behind.

use super::error::{FriendshipError, FriendshipResult};
use crate::auth::Principal;
use crate::models::{FriendRequest, FriendSummary, Friendship, PairKey, PendingRequests, UserId};
use crate::storage::{FriendRequestStore, FriendshipStore, SocialDatabase, UserStore};

/// Which side of a request may act on it.
#[derive(Debug, Clone, Copy)]
enum Party {
    Sender,
    Receiver,
}

fn acting_user(principal: Option<&Principal>) -> FriendshipResult<&UserId> {
    principal
        .map(|p| &p.user_id)
        .ok_or(FriendshipError::Unauthorized)
}

/// Load a pending request and check the caller is the allowed party.
fn authorized_pending<S>(
    store: &S,
    request_id: &str,
    caller: &UserId,
    party: Party,
) -> FriendshipResult<FriendRequest>
where
    S: FriendRequestStore + ?Sized,
{
    let request = store
        .find_request(request_id)?
        .filter(FriendRequest::is_pending)
        .ok_or_else(|| FriendshipError::NotFound(format!("Friend request {request_id}")))?;

    let allowed = match party {
        Party::Sender => &request.sender_id,
        Party::Receiver => &request.receiver_id,
    };
    if allowed != caller {
        return Err(FriendshipError::Unauthorized);
    }
    Ok(request)
}

fn send_in<S>(store: &S, sender: &UserId, receiver: &UserId) -> FriendshipResult<FriendRequest>
where
    S: UserStore + FriendRequestStore + FriendshipStore + ?Sized,
{
    if store.find_user_by_id(receiver)?.is_none() {
        return Err(FriendshipError::NotFound(format!("User {receiver}")));
    }
    if sender == receiver {
        return Err(FriendshipError::InvalidTarget);
    }
    if store.friendship_exists(sender, receiver)? {
        return Err(FriendshipError::AlreadyExists(format!(
            "Friendship between {sender} and {receiver}"
        )));
    }
    if let Some(existing) = store.find_pending(&PairKey::new(sender, receiver))? {
        return Err(FriendshipError::AlreadyExists(format!(
            "Pending friend request {}",
            existing.id
        )));
    }

    // The pair guard inside insert_request still rejects a racing duplicate
    let request = FriendRequest::pending(sender.clone(), receiver.clone());
    store.insert_request(&request)?;
    Ok(request)
}

fn accept_in<S>(store: &S, caller: &UserId, request_id: &str) -> FriendshipResult<Friendship>
where
    S: FriendRequestStore + FriendshipStore + ?Sized,
{
    authorized_pending(store, request_id, caller, Party::Receiver)?;
    let accepted = store.mark_accepted(request_id)?;
    let friendship = Friendship::between(accepted.sender_id, accepted.receiver_id, accepted.id);
    store.insert_friendship(&friendship)?;
    Ok(friendship)
}

fn remove_in<S>(store: &S, caller: &UserId, request_id: &str, party: Party) -> FriendshipResult<FriendRequest>
where
    S: FriendRequestStore + ?Sized,
{
    let request = authorized_pending(store, request_id, caller, party)?;
    store.delete_request(request_id)?;
    Ok(request)
}

/// Friend-relationship operations on behalf of a resolved caller.
///
/// The caller identity is passed explicitly; `None` means the token gate
/// established no identity and every operation answers `Unauthorized`.
pub struct FriendshipEngine<'a> {
    db: &'a SocialDatabase,
}

impl<'a> FriendshipEngine<'a> {
    pub fn new(db: &'a SocialDatabase) -> Self {
        Self { db }
    }

    /// Send a friend request to `receiver_id`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the receiver does not exist
    /// - `InvalidTarget` if the caller addresses themself
    /// - `AlreadyExists` if the pair are friends or a request is pending in
    ///   either direction
    pub fn send_request(
        &self,
        principal: Option<&Principal>,
        receiver_id: &UserId,
    ) -> FriendshipResult<FriendRequest> {
        let sender = acting_user(principal)?;
        let request = self.db.write(|txn| send_in(txn, sender, receiver_id))?;

        tracing::info!(
            request_id = %request.id,
            sender_id = %request.sender_id,
            receiver_id = %request.receiver_id,
            "Friend request sent"
        );
        Ok(request)
    }

    /// Accept a pending request addressed to the caller.
    ///
    /// Marks the request accepted and creates the friendship in one
    /// transaction.
    pub fn accept_request(
        &self,
        principal: Option<&Principal>,
        request_id: &str,
    ) -> FriendshipResult<Friendship> {
        let caller = acting_user(principal)?;
        let friendship = self.db.write(|txn| accept_in(txn, caller, request_id))?;

        tracing::info!(
            request_id = %request_id,
            user_a = %friendship.user_a,
            user_b = %friendship.user_b,
            "Friend request accepted"
        );
        Ok(friendship)
    }

    /// Reject a pending request addressed to the caller.
    ///
    /// The request is removed, so the sender may ask again later.
    pub fn reject_request(&self, principal: Option<&Principal>, request_id: &str) -> FriendshipResult<()> {
        let caller = acting_user(principal)?;
        let request = self
            .db
            .write(|txn| remove_in(txn, caller, request_id, Party::Receiver))?;

        tracing::info!(request_id = %request.id, receiver_id = %caller, "Friend request rejected");
        Ok(())
    }

    /// Retract a pending request the caller sent.
    pub fn delete_request(&self, principal: Option<&Principal>, request_id: &str) -> FriendshipResult<()> {
        let caller = acting_user(principal)?;
        let request = self
            .db
            .write(|txn| remove_in(txn, caller, request_id, Party::Sender))?;

        tracing::info!(request_id = %request.id, sender_id = %caller, "Friend request withdrawn");
        Ok(())
    }

    /// Remove the friendship between the caller and `target_id`.
    pub fn unfriend(&self, principal: Option<&Principal>, target_id: &UserId) -> FriendshipResult<()> {
        let caller = acting_user(principal)?;
        self.db
            .write(|txn| txn.remove_friendship(caller, target_id).map_err(FriendshipError::from))?;

        tracing::info!(user_id = %caller, friend_id = %target_id, "Friendship removed");
        Ok(())
    }

    /// The caller's friends.
    pub fn friends(&self, principal: Option<&Principal>) -> FriendshipResult<Vec<FriendSummary>> {
        let caller = acting_user(principal)?;
        Ok(self.db.list_friends(caller)?)
    }

    /// Pending requests the caller sent or received.
    pub fn pending(&self, principal: Option<&Principal>) -> FriendshipResult<PendingRequests> {
        let caller = acting_user(principal)?;
        Ok(self.db.list_pending(caller)?)
    }
}
