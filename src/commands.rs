//! Chat command parsing and dispatch.
//!
//! Thin layer between the transport and the mailbox manager: it parses
//! slash commands, applies the admin allow-list once for every privileged
//! command, and renders typed outcomes as reply text. No state lives here.

use std::sync::Arc;

use log::debug;

use crate::broadcast::Broadcaster;
use crate::config::Settings;
use crate::manager::{MailboxError, MailboxManager};
use crate::provider::{MailProvider, MessageContent, MessageSummary};
use crate::store::OwnerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    New,
    Check,
    Read { id: Option<String> },
    MyEmail,
    Delete,
    Admin,
    Broadcast { text: Option<String> },
    ListUsers,
    Stats,
    DeleteAccount { owner: Option<String> },
}

impl Command {
    /// Parse a chat message into a command. Non-commands and unknown
    /// commands yield `None` and are ignored by the bot.
    pub fn parse(text: &str) -> Option<Command> {
        let text = text.trim();
        if !text.starts_with('/') {
            return None;
        }

        let mut parts = text.splitn(2, char::is_whitespace);
        let mut name = parts.next().unwrap_or_default();
        // Group chats address commands as /cmd@botname.
        if let Some(at) = name.find('@') {
            name = &name[..at];
        }
        let rest = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        match name {
            "/start" => Some(Command::Start),
            "/help" => Some(Command::Help),
            "/new" | "/new_email" => Some(Command::New),
            "/check" | "/check_inbox" => Some(Command::Check),
            "/read" => Some(Command::Read { id: rest }),
            "/my_email" => Some(Command::MyEmail),
            "/delete" => Some(Command::Delete),
            "/admin" => Some(Command::Admin),
            "/broadcast" => Some(Command::Broadcast { text: rest }),
            "/get_all_users" => Some(Command::ListUsers),
            "/stats" => Some(Command::Stats),
            "/delete_account" => Some(Command::DeleteAccount { owner: rest }),
            _ => None,
        }
    }

    /// Commands gated by the admin allow-list.
    pub fn is_privileged(&self) -> bool {
        matches!(
            self,
            Command::Admin
                | Command::Broadcast { .. }
                | Command::ListUsers
                | Command::Stats
                | Command::DeleteAccount { .. }
        )
    }
}

pub struct CommandHandler<P> {
    manager: Arc<MailboxManager<P>>,
    broadcaster: Arc<Broadcaster>,
    settings: Arc<Settings>,
}

impl<P: MailProvider> CommandHandler<P> {
    pub fn new(
        manager: Arc<MailboxManager<P>>,
        broadcaster: Arc<Broadcaster>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            manager,
            broadcaster,
            settings,
        }
    }

    /// Handle one inbound message and produce the reply text, if any.
    pub async fn handle(&self, owner: OwnerId, text: &str) -> Option<String> {
        let command = Command::parse(text)?;
        debug!("Owner {} issued {:?}", owner, command);

        // Single authorization gate for every privileged command.
        if command.is_privileged() && !self.settings.is_admin(owner) {
            return Some("You are not authorized to use this command.".to_string());
        }

        let reply = match command {
            Command::Start | Command::Help => help_text(),
            Command::New => self.new_address(owner).await,
            Command::Check => self.check_inbox(owner).await,
            Command::Read { id } => match id {
                Some(id) => self.read_message(owner, &id).await,
                None => "Please provide a message ID, e.g. /read m123".to_string(),
            },
            Command::MyEmail => self.my_email(owner),
            Command::Delete => self.delete_mailbox(owner).await,
            Command::Admin => admin_text(),
            Command::Broadcast { text } => match text {
                Some(text) => self.broadcast(&text).await,
                None => "Usage: /broadcast <message>".to_string(),
            },
            Command::ListUsers => self.list_users(),
            Command::Stats => format!("Active mailboxes: {}", self.manager.session_count()),
            Command::DeleteAccount { owner: target } => match target.and_then(|t| t.parse().ok())
            {
                Some(target) => self.delete_account(target).await,
                None => "Usage: /delete_account <user_id>".to_string(),
            },
        };

        Some(reply)
    }

    async fn new_address(&self, owner: OwnerId) -> String {
        match self.manager.allocate(owner).await {
            Ok(address) => format!(
                "Your new temporary email address is:\n{}\n\nUse /check to see incoming messages.",
                address
            ),
            Err(MailboxError::AlreadyExists(address)) => format!(
                "You already have an address: {}\nDelete it with /delete before requesting a new one.",
                address
            ),
            Err(_) => "Failed to create a new email address. Please try again later.".to_string(),
        }
    }

    async fn check_inbox(&self, owner: OwnerId) -> String {
        match self.manager.refresh_inbox(owner).await {
            Ok(summaries) if summaries.is_empty() => "Your inbox is empty.".to_string(),
            Ok(summaries) => render_inbox(&summaries),
            Err(err) => describe_error(&err),
        }
    }

    async fn read_message(&self, owner: OwnerId, id: &str) -> String {
        match self.manager.read_message(owner, id).await {
            Ok(content) => render_message(&content),
            Err(MailboxError::UnknownMessage(_)) => {
                "That message ID is not valid or has expired. Use /check to get a fresh list."
                    .to_string()
            }
            Err(err) => describe_error(&err),
        }
    }

    fn my_email(&self, owner: OwnerId) -> String {
        match self.manager.current_address(owner) {
            Ok(address) => format!("Your current temporary email address is:\n{}", address),
            Err(err) => describe_error(&err),
        }
    }

    async fn delete_mailbox(&self, owner: OwnerId) -> String {
        match self.manager.release(owner).await {
            Ok(address) => format!("The temporary address {} has been deleted.", address),
            Err(MailboxError::NoSession) => "You don't have an active email to delete.".to_string(),
            Err(err) => describe_error(&err),
        }
    }

    async fn broadcast(&self, text: &str) -> String {
        let report = self
            .broadcaster
            .broadcast(&format!("📢 Broadcast:\n{}", text))
            .await;
        if report.attempted == 0 {
            "No users to broadcast to.".to_string()
        } else {
            format!(
                "Broadcast sent to {} users ({} failures).",
                report.attempted,
                report.failed.len()
            )
        }
    }

    fn list_users(&self) -> String {
        let sessions = self.manager.list_sessions();
        if sessions.is_empty() {
            return "No users have active mailboxes.".to_string();
        }
        let mut out = String::from("Active users:\n");
        for (owner, address) in sessions {
            out.push_str(&format!("{} — {}\n", owner, address));
        }
        out
    }

    async fn delete_account(&self, target: OwnerId) -> String {
        match self.manager.release(target).await {
            Ok(address) => format!("Mailbox {} of user {} deleted.", address, target),
            Err(MailboxError::NoSession) => {
                format!("User {} has no active mailbox.", target)
            }
            Err(err) => describe_error(&err),
        }
    }
}

fn describe_error(err: &MailboxError) -> String {
    match err {
        MailboxError::NoSession => {
            "You don't have an email address yet. Use /new to get one.".to_string()
        }
        MailboxError::Expired => {
            "Your mailbox has expired upstream and was cleaned up. Use /new for a fresh address."
                .to_string()
        }
        MailboxError::Provider(_) => {
            "The mail service is unavailable right now. Please try again later.".to_string()
        }
        other => other.to_string(),
    }
}

fn render_inbox(summaries: &[MessageSummary]) -> String {
    let mut out = String::from("Your inbox:\n\n");
    for summary in summaries {
        out.push_str(&format!(
            "ID: {}\nFrom: {}\nSubject: {}\n--------------------\n",
            summary.id, summary.from, summary.subject
        ));
    }
    out.push_str("Use /read <id> to view the full content of a message.");
    out
}

fn render_message(content: &MessageContent) -> String {
    let date = content
        .received_at
        .map(|t| t.to_rfc2822())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "From: {}\nSubject: {}\nDate: {}\n\n{}",
        content.from, content.subject, date, content.body
    )
}

fn help_text() -> String {
    "I can give you a disposable email address.\n\n\
     /new - Get a new temporary email address\n\
     /check - Check your inbox for messages\n\
     /read <id> - Read a specific message\n\
     /my_email - Show your current address\n\
     /delete - Delete your current address\n\
     /help - Show this message\n\n\
     Warning: this service is for temporary use only. Do not use it for sensitive data."
        .to_string()
}

fn admin_text() -> String {
    "Admin panel:\n\n\
     /broadcast <message> - Send a message to all active users\n\
     /get_all_users - List active users and their addresses\n\
     /stats - Usage statistics\n\
     /delete_account <user_id> - Delete a user's mailbox"
        .to_string()
}
