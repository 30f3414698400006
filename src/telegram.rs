// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Minimal Telegram Bot API transport: long-poll `getUpdates` in,
//! `sendMessage` out. Everything the core needs from the chat surface.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::broadcast::{ChatSender, SendError};
use crate::store::OwnerId;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: &str, poll_timeout_secs: u64) -> Result<Self, TelegramError> {
        // The request timeout must outlive the long-poll window.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs + 10))
            .build()?;
        Ok(Self {
            http,
            base_url: format!("https://api.telegram.org/bot{}", token),
        })
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, TelegramError> {
        debug!("Telegram request: {}", method);
        let resp: ApiResponse<T> = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if !resp.ok {
            return Err(TelegramError::Api(
                resp.description
                    .unwrap_or_else(|| "no description".to_string()),
            ));
        }
        resp.result
            .ok_or_else(|| TelegramError::Api("missing result".to_string()))
    }

    /// Long-poll for updates past `offset`.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let _: serde_json::Value = self
            .call("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ChatSender for TelegramClient {
    async fn send_text(&self, owner: OwnerId, text: &str) -> Result<(), SendError> {
        self.send_message(owner, text)
            .await
            .map_err(|e| SendError::Delivery(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_carry_the_description() {
        let payload = r#"{"ok": false, "description": "Unauthorized"}"#;
        let resp: ApiResponse<Vec<Update>> = serde_json::from_str(payload).unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.description.as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn updates_deserialize_from_captured_payload() {
        let payload = r#"{
            "ok": true,
            "result": [{
                "update_id": 7,
                "message": {"message_id": 1, "chat": {"id": 42, "type": "private"}, "text": "/new"}
            }]
        }"#;

        let resp: ApiResponse<Vec<Update>> = serde_json::from_str(payload).unwrap();
        let updates = resp.result.unwrap();
        assert_eq!(updates[0].update_id, 7);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.text.as_deref(), Some("/new"));
    }
}
