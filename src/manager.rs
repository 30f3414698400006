//! Orchestrates provider calls against stored sessions.
//!
//! Per session the lifecycle is: `allocate` creates it, refresh/read keep
//! it active, a provider 404 during refresh/read evicts it, `release`
//! removes it regardless of the provider outcome. A removed session only
//! comes back through a fresh `allocate`.

use std::sync::Arc;

use dashmap::DashMap;
use log::{info, warn};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::provider::{MailProvider, MessageContent, MessageSummary, ProviderError};
use crate::store::{MailSession, OwnerId, SessionStore};

/// Result type for mailbox operations
pub type MailboxResult<T> = Result<T, MailboxError>;

/// Typed outcomes of mailbox operations; nothing here is fatal to the
/// process and raw provider payloads never reach this level.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MailboxError {
    #[error("An active mailbox already exists: {0}")]
    AlreadyExists(String),

    #[error("No active mailbox for this user")]
    NoSession,

    #[error("The mailbox no longer exists upstream")]
    Expired,

    #[error("Unknown or stale message reference: {0}")]
    UnknownMessage(String),

    #[error("Mail provider unavailable: {0}")]
    Provider(String),
}

impl From<ProviderError> for MailboxError {
    fn from(err: ProviderError) -> Self {
        match err {
            // Callers that care about upstream absence handle NotFound
            // before converting; anything reaching here is an outage.
            ProviderError::NotFound => MailboxError::Provider("not found upstream".to_string()),
            ProviderError::Unavailable(msg) => MailboxError::Provider(msg),
        }
    }
}

/// One mailbox session per owner, reconciled against the provider.
pub struct MailboxManager<P> {
    provider: Arc<P>,
    store: Arc<dyn SessionStore>,
    // Per-owner mutation locks. Entries are never removed: they are tiny,
    // and removal would race a waiter that has already cloned the Arc.
    locks: DashMap<OwnerId, Arc<Mutex<()>>>,
}

impl<P: MailProvider> MailboxManager<P> {
    pub fn new(provider: Arc<P>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            provider,
            store,
            locks: DashMap::new(),
        }
    }

    fn owner_lock(&self, owner: OwnerId) -> Arc<Mutex<()>> {
        self.locks.entry(owner).or_default().clone()
    }

    /// Allocate a fresh address for `owner`. Fails with `AlreadyExists`
    /// if a session is present; never overwrites.
    pub async fn allocate(&self, owner: OwnerId) -> MailboxResult<String> {
        let lock = self.owner_lock(owner);
        let _guard = lock.lock().await;

        if let Some(existing) = self.store.get(owner) {
            return Err(MailboxError::AlreadyExists(existing.address().to_string()));
        }

        let account = self.provider.create_account().await?;
        info!("Allocated mailbox {} for owner {}", account.address, owner);

        let session = MailSession::new(owner, account);
        let address = session.address().to_string();
        self.store.put(session);
        Ok(address)
    }

    /// The owner's current address, if any.
    pub fn current_address(&self, owner: OwnerId) -> MailboxResult<String> {
        self.store
            .get(owner)
            .map(|s| s.address().to_string())
            .ok_or(MailboxError::NoSession)
    }

    /// Fetch the complete current inbox and replace the session's known
    /// messages with it. References from earlier refreshes become invalid.
    pub async fn refresh_inbox(&self, owner: OwnerId) -> MailboxResult<Vec<MessageSummary>> {
        let lock = self.owner_lock(owner);
        let _guard = lock.lock().await;

        let mut session = self.store.get(owner).ok_or(MailboxError::NoSession)?;

        match self.provider.list_inbox(&session.account.handle).await {
            Ok(summaries) => {
                session.messages = summaries.clone();
                self.store.put(session);
                Ok(summaries)
            }
            Err(ProviderError::NotFound) => {
                self.evict(owner);
                Err(MailboxError::Expired)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Read one message by a reference returned from the last refresh.
    /// Stale or unknown references fail without touching session state.
    pub async fn read_message(
        &self,
        owner: OwnerId,
        message_id: &str,
    ) -> MailboxResult<MessageContent> {
        let lock = self.owner_lock(owner);
        let _guard = lock.lock().await;

        let session = self.store.get(owner).ok_or(MailboxError::NoSession)?;
        if session.message(message_id).is_none() {
            return Err(MailboxError::UnknownMessage(message_id.to_string()));
        }

        match self
            .provider
            .read_message(&session.account.handle, message_id)
            .await
        {
            Ok(content) => Ok(content),
            Err(ProviderError::NotFound) => {
                self.evict(owner);
                Err(MailboxError::Expired)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Delete the owner's mailbox. The local session is removed even when
    /// the provider call fails, so an already-expired upstream account
    /// cannot leave an orphaned local record.
    pub async fn release(&self, owner: OwnerId) -> MailboxResult<String> {
        let lock = self.owner_lock(owner);
        let _guard = lock.lock().await;

        let session = self.store.get(owner).ok_or(MailboxError::NoSession)?;

        if let Err(err) = self.provider.delete_account(&session.account.handle).await {
            warn!(
                "Provider deletion failed for owner {} ({}), removing local session anyway",
                owner, err
            );
        }

        self.store.remove(owner);
        info!("Released mailbox {} for owner {}", session.address(), owner);
        Ok(session.address().to_string())
    }

    /// Snapshot of all sessions for administrative inspection.
    pub fn list_sessions(&self) -> Vec<(OwnerId, String)> {
        self.store
            .list_all()
            .into_iter()
            .map(|s| (s.owner, s.address().to_string()))
            .collect()
    }

    pub fn session_count(&self) -> usize {
        self.store.len()
    }

    fn evict(&self, owner: OwnerId) {
        if let Some(session) = self.store.remove(owner) {
            info!(
                "Evicted expired mailbox {} for owner {}",
                session.address(),
                owner
            );
        }
    }
}
