use chrono::{DateTime, Utc};
use serde::Serialize;

/// A freshly allocated mailbox. `handle` is the opaque reference the
/// provider expects for inbox and deletion calls (for the HTTP provider
/// this is a digest derived from the address, not a credential).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAccount {
    pub address: String,
    pub handle: String,
}

/// One inbox entry: sender, subject and the reference used to fetch the
/// full content. Only valid until the next inbox refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageSummary {
    pub id: String,
    pub from: String,
    pub subject: String,
}

/// Full content of a single message, fetched on demand and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageContent {
    pub from: String,
    pub subject: String,
    pub received_at: Option<DateTime<Utc>>,
    pub body: String,
}
