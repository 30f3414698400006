//! In-memory session storage.
//!
//! The store is a pure data structure; serialization of read-modify-write
//! cycles for a single owner is the manager's job, not the store's.

use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;

use crate::provider::{MailAccount, MessageSummary};

/// Opaque identity of a requester (the chat id of the user). The store
/// and manager never interpret it.
pub type OwnerId = i64;

/// The local record binding an owner to an active mailbox and the batch
/// of messages observed at the last inbox refresh.
#[derive(Debug, Clone)]
pub struct MailSession {
    pub owner: OwnerId,
    pub account: MailAccount,
    pub messages: Vec<MessageSummary>,
}

impl MailSession {
    pub fn new(owner: OwnerId, account: MailAccount) -> Self {
        Self {
            owner,
            account,
            messages: Vec::new(),
        }
    }

    pub fn address(&self) -> &str {
        &self.account.address
    }

    /// Look up a message from the last observed batch by its reference.
    pub fn message(&self, id: &str) -> Option<&MessageSummary> {
        self.messages.iter().find(|m| m.id == id)
    }
}

/// Keyed session storage. Kept behind a trait so a persistent backing
/// store can replace the in-process map without touching the manager.
pub trait SessionStore: Send + Sync {
    fn get(&self, owner: OwnerId) -> Option<MailSession>;
    /// Insert or overwrite the session for `session.owner`.
    fn put(&self, session: MailSession);
    fn remove(&self, owner: OwnerId) -> Option<MailSession>;
    /// Snapshot of all sessions, oldest first.
    fn list_all(&self) -> Vec<MailSession>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sharded in-process store: a `DashMap` for the records plus a small
/// insertion-order index so `list_all` stays deterministic.
#[derive(Default)]
pub struct MemoryStore {
    sessions: DashMap<OwnerId, MailSession>,
    order: Mutex<Vec<OwnerId>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn order(&self) -> std::sync::MutexGuard<'_, Vec<OwnerId>> {
        self.order.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, owner: OwnerId) -> Option<MailSession> {
        self.sessions.get(&owner).map(|entry| entry.value().clone())
    }

    fn put(&self, session: MailSession) {
        let owner = session.owner;
        if self.sessions.insert(owner, session).is_none() {
            self.order().push(owner);
        }
    }

    fn remove(&self, owner: OwnerId) -> Option<MailSession> {
        let removed = self.sessions.remove(&owner).map(|(_, session)| session);
        if removed.is_some() {
            self.order().retain(|o| *o != owner);
        }
        removed
    }

    fn list_all(&self) -> Vec<MailSession> {
        self.order()
            .iter()
            .filter_map(|owner| self.get(*owner))
            .collect()
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(owner: OwnerId) -> MailSession {
        MailSession::new(
            owner,
            MailAccount {
                address: format!("owner{}@mock.mail", owner),
                handle: format!("handle-{}", owner),
            },
        )
    }

    #[test]
    fn put_get_remove_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get(1).is_none());

        store.put(session(1));
        assert_eq!(store.get(1).unwrap().address(), "owner1@mock.mail");
        assert_eq!(store.len(), 1);

        assert!(store.remove(1).is_some());
        assert!(store.get(1).is_none());
        assert!(store.remove(1).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn list_all_preserves_insertion_order() {
        let store = MemoryStore::new();
        for owner in [3, 1, 2] {
            store.put(session(owner));
        }

        let owners: Vec<OwnerId> = store.list_all().iter().map(|s| s.owner).collect();
        assert_eq!(owners, vec![3, 1, 2]);

        store.remove(1);
        let owners: Vec<OwnerId> = store.list_all().iter().map(|s| s.owner).collect();
        assert_eq!(owners, vec![3, 2]);
    }

    #[test]
    fn overwrite_keeps_position_and_count() {
        let store = MemoryStore::new();
        store.put(session(1));
        store.put(session(2));

        let mut updated = session(1);
        updated.messages.push(MessageSummary {
            id: "m1".to_string(),
            from: "x@y".to_string(),
            subject: "hi".to_string(),
        });
        store.put(updated);

        assert_eq!(store.len(), 2);
        let all = store.list_all();
        assert_eq!(all[0].owner, 1);
        assert_eq!(all[0].messages.len(), 1);
    }
}
