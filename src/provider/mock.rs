//! Scripted in-memory provider for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::provider::error::{ProviderError, ProviderResult};
use crate::provider::types::{MailAccount, MessageContent, MessageSummary};
use crate::provider::MailProvider;

/// Mock provider whose responses are queued up front by the test.
///
/// `create_account` hands out sequential addresses; `list_inbox` and
/// `read_message` pop scripted results (defaulting to an empty inbox /
/// `NotFound`); `delete_account` returns a configurable outcome.
#[derive(Default)]
pub struct MockProvider {
    created: AtomicUsize,
    deleted: AtomicUsize,
    inbox_script: Mutex<VecDeque<ProviderResult<Vec<MessageSummary>>>>,
    read_script: Mutex<VecDeque<ProviderResult<MessageContent>>>,
    delete_result: Mutex<Option<ProviderResult<()>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted.load(Ordering::SeqCst)
    }

    pub fn push_inbox(&self, result: ProviderResult<Vec<MessageSummary>>) {
        self.inbox_script.lock().unwrap().push_back(result);
    }

    pub fn push_read(&self, result: ProviderResult<MessageContent>) {
        self.read_script.lock().unwrap().push_back(result);
    }

    pub fn set_delete_result(&self, result: ProviderResult<()>) {
        *self.delete_result.lock().unwrap() = Some(result);
    }

    pub fn summary(id: &str, from: &str, subject: &str) -> MessageSummary {
        MessageSummary {
            id: id.to_string(),
            from: from.to_string(),
            subject: subject.to_string(),
        }
    }

    pub fn content(from: &str, subject: &str, body: &str) -> MessageContent {
        MessageContent {
            from: from.to_string(),
            subject: subject.to_string(),
            received_at: None,
            body: body.to_string(),
        }
    }
}

#[async_trait]
impl MailProvider for MockProvider {
    async fn create_account(&self) -> ProviderResult<MailAccount> {
        let n = self.created.fetch_add(1, Ordering::SeqCst);
        let address = format!("user{}@mock.mail", n);
        Ok(MailAccount {
            handle: format!("handle-{}", n),
            address,
        })
    }

    async fn list_inbox(&self, _handle: &str) -> ProviderResult<Vec<MessageSummary>> {
        self.inbox_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn read_message(&self, _handle: &str, _message_id: &str)
        -> ProviderResult<MessageContent>
    {
        self.read_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ProviderError::NotFound))
    }

    async fn delete_account(&self, _handle: &str) -> ProviderResult<()> {
        self.deleted.fetch_add(1, Ordering::SeqCst);
        self.delete_result.lock().unwrap().clone().unwrap_or(Ok(()))
    }
}
