//! Library core for tempmail: disposable email sessions behind a chat bot.

pub mod broadcast;
pub mod commands;
pub mod config;
pub mod manager;
pub mod provider;
pub mod store;
pub mod telegram;

// Re-export key types for convenience
pub mod prelude {
    // Config
    pub use crate::config::Settings;

    // Core
    pub use crate::broadcast::{BroadcastReport, Broadcaster, ChatSender};
    pub use crate::commands::{Command, CommandHandler};
    pub use crate::manager::{MailboxError, MailboxManager, MailboxResult};
    pub use crate::provider::{
        HttpMailProvider, MailAccount, MailProvider, MessageContent, MessageSummary,
        ProviderError, ProviderResult,
    };
    pub use crate::store::{MailSession, MemoryStore, OwnerId, SessionStore};

    // Common Libs
    pub use log::{debug, error, info, trace, warn};
    pub use std::sync::Arc;
    pub use thiserror::Error;
}
