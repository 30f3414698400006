//! Client for the upstream disposable-mail service.
//!
//! Everything provider-specific (endpoint shapes, error-shaped success
//! payloads, derived lookup keys) stays behind the [`MailProvider`] trait;
//! the rest of the crate only sees the four normalized operations.

pub mod error;
pub mod http;
pub mod types;

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;

pub use error::{ProviderError, ProviderResult};
pub use http::HttpMailProvider;
pub use types::{MailAccount, MessageContent, MessageSummary};

/// The four operations the core needs from any disposable-mail upstream.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Request a fresh address. The returned handle is whatever the
    /// provider needs to address the mailbox afterwards.
    async fn create_account(&self) -> ProviderResult<MailAccount>;

    /// Fetch the complete current inbox, in provider order. An empty
    /// vector is success; callers replace prior state with the result.
    async fn list_inbox(&self, handle: &str) -> ProviderResult<Vec<MessageSummary>>;

    /// Fetch the full content of one message.
    async fn read_message(&self, handle: &str, message_id: &str)
        -> ProviderResult<MessageContent>;

    /// Delete the upstream account.
    async fn delete_account(&self, handle: &str) -> ProviderResult<()>;
}
