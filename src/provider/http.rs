// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use log::{debug, warn};
use md5::{Digest, Md5};
use rand::seq::SliceRandom;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::config::ProviderConfig;
use crate::provider::error::{ProviderError, ProviderResult};
use crate::provider::types::{MailAccount, MessageContent, MessageSummary};
use crate::provider::MailProvider;

const API_KEY_HEADER: &str = "x-rapidapi-key";
const API_HOST_HEADER: &str = "x-rapidapi-host";

/// Length of the generated local part of a fresh address.
const LOCAL_PART_LEN: usize = 10;

/// HTTP client for the upstream temp-mail REST API.
///
/// Mailboxes are addressed by a derived lookup key (lowercase MD5 hex of
/// the full address) rather than a provider-issued credential, so account
/// creation is local-part generation against the provider's domain list.
pub struct HttpMailProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    api_host: String,
}

impl HttpMailProvider {
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_host: config.api_host.clone(),
        })
    }

    /// GET a provider endpoint and return the raw body, normalizing
    /// transport and status failures.
    async fn get_body(&self, path: &str) -> ProviderResult<String> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Provider request: GET {}", path);

        let resp = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(API_HOST_HEADER, &self.api_host)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound);
        }
        if !status.is_success() {
            return Err(ProviderError::Unavailable(format!(
                "unexpected status {}",
                status
            )));
        }

        Ok(resp.text().await?)
    }
}

#[async_trait]
impl MailProvider for HttpMailProvider {
    async fn create_account(&self) -> ProviderResult<MailAccount> {
        let body = self.get_body("/request/domains/").await?;
        let domains: Vec<String> = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Unavailable(format!("bad domain list: {}", e)))?;

        let domain = domains
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| ProviderError::Unavailable("no domains available".to_string()))?;

        // Random hex local part; a v4 UUID per call makes reuse within a
        // process lifetime practically impossible.
        let local = Uuid::new_v4().simple().to_string();
        let address = format!("{}{}", &local[..LOCAL_PART_LEN], domain);

        Ok(MailAccount {
            handle: lookup_key(&address),
            address,
        })
    }

    async fn list_inbox(&self, handle: &str) -> ProviderResult<Vec<MessageSummary>> {
        let body = self
            .get_body(&format!("/request/mail/id/{}/", handle))
            .await?;
        classify_inbox(&body)
    }

    async fn read_message(&self, _handle: &str, message_id: &str)
        -> ProviderResult<MessageContent>
    {
        let body = self
            .get_body(&format!("/request/id/{}/", message_id))
            .await?;

        let wire: WireMessage = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Unavailable(format!("bad message payload: {}", e)))?;
        Ok(wire.into())
    }

    async fn delete_account(&self, handle: &str) -> ProviderResult<()> {
        self.get_body(&format!("/request/delete/id/{}/", handle))
            .await?;
        Ok(())
    }
}

/// Derived lookup key for a mailbox: lowercase MD5 hex of the address.
pub fn lookup_key(address: &str) -> String {
    hex::encode(Md5::digest(address.as_bytes()))
}

/// Classify an inbox payload before building the typed result.
///
/// The upstream reports an inbox that has never received mail as an
/// error-shaped object (`{"error": "There are no emails yet"}`); that is
/// an empty success, not a failure. Entries without a usable message id
/// are skipped one by one instead of failing the whole listing.
fn classify_inbox(payload: &str) -> ProviderResult<Vec<MessageSummary>> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| ProviderError::Unavailable(format!("bad inbox payload: {}", e)))?;

    match value {
        Value::Array(entries) => Ok(entries.iter().filter_map(summary_from_entry).collect()),
        Value::Object(ref map) if map.contains_key("error") => {
            debug!("Provider reported an empty inbox via error payload");
            Ok(Vec::new())
        }
        other => Err(ProviderError::Unavailable(format!(
            "unexpected inbox payload shape: {}",
            other
        ))),
    }
}

fn summary_from_entry(entry: &Value) -> Option<MessageSummary> {
    let id = match entry.get("mail_id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            warn!("Inbox entry without a usable mail_id, skipping: {}", entry);
            return None;
        }
    };

    Some(MessageSummary {
        id,
        from: string_or(entry.get("mail_from"), "Unknown Sender"),
        subject: string_or(entry.get("mail_subject"), "No Subject"),
    })
}

fn string_or(value: Option<&Value>, fallback: &str) -> String {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    mail_from: Option<String>,
    mail_subject: Option<String>,
    mail_text_only: Option<String>,
    #[serde(rename = "createdAt")]
    created_at: Option<WireTimestamp>,
}

#[derive(Debug, Deserialize)]
struct WireTimestamp {
    milliseconds: Option<i64>,
}

impl From<WireMessage> for MessageContent {
    fn from(wire: WireMessage) -> Self {
        let received_at: Option<DateTime<Utc>> = wire
            .created_at
            .and_then(|t| t.milliseconds)
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());

        MessageContent {
            from: wire.mail_from.unwrap_or_else(|| "Unknown Sender".to_string()),
            subject: wire.mail_subject.unwrap_or_else(|| "No Subject".to_string()),
            received_at,
            body: wire.mail_text_only.unwrap_or_else(|| "No content.".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbox_array_is_classified_in_order() {
        let payload = r#"[
            {"mail_id": "m1", "mail_from": "alice@example.com", "mail_subject": "hi"},
            {"mail_id": "m2", "mail_from": "bob@example.com", "mail_subject": "re: hi"}
        ]"#;

        let summaries = classify_inbox(payload).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, "m1");
        assert_eq!(summaries[0].from, "alice@example.com");
        assert_eq!(summaries[1].id, "m2");
        assert_eq!(summaries[1].subject, "re: hi");
    }

    #[test]
    fn error_shaped_payload_is_an_empty_inbox() {
        // Captured shape: the upstream answers this for a mailbox that has
        // never received mail.
        let payload = r#"{"error":"There are no emails yet"}"#;
        assert_eq!(classify_inbox(payload).unwrap(), Vec::new());
    }

    #[test]
    fn entries_without_mail_id_are_skipped() {
        let payload = r#"[
            {"mail_from": "ghost@example.com", "mail_subject": "no id"},
            {"mail_id": "", "mail_subject": "empty id"},
            {"mail_id": "m7", "mail_from": "real@example.com", "mail_subject": "kept"}
        ]"#;

        let summaries = classify_inbox(payload).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, "m7");
    }

    #[test]
    fn numeric_mail_ids_are_accepted() {
        let payload = r#"[{"mail_id": 12345, "mail_subject": "numeric"}]"#;
        let summaries = classify_inbox(payload).unwrap();
        assert_eq!(summaries[0].id, "12345");
        assert_eq!(summaries[0].from, "Unknown Sender");
    }

    #[test]
    fn unexpected_shapes_are_unavailable() {
        assert!(matches!(
            classify_inbox("\"just a string\""),
            Err(ProviderError::Unavailable(_))
        ));
        assert!(matches!(
            classify_inbox("not json at all"),
            Err(ProviderError::Unavailable(_))
        ));
        // An object without an error key is not a known success shape.
        assert!(matches!(
            classify_inbox(r#"{"mail_id": "m1"}"#),
            Err(ProviderError::Unavailable(_))
        ));
    }

    #[test]
    fn lookup_key_is_md5_hex_of_address() {
        assert_eq!(
            lookup_key("test@example.com"),
            "55502f40dc8b7c769880b10874abc9d0"
        );
        assert_eq!(
            lookup_key("sq9bupheq1@mail.com"),
            "fda60aeac2386d2c1764e01ebaca8c4d"
        );
    }

    #[test]
    fn message_payload_maps_to_content() {
        let payload = r#"{
            "mail_from": "alice@example.com",
            "mail_subject": "hello",
            "mail_text_only": "body text",
            "createdAt": {"milliseconds": 1700000000000}
        }"#;

        let wire: WireMessage = serde_json::from_str(payload).unwrap();
        let content = MessageContent::from(wire);
        assert_eq!(content.from, "alice@example.com");
        assert_eq!(content.subject, "hello");
        assert_eq!(content.body, "body text");
        assert_eq!(content.received_at.unwrap().timestamp_millis(), 1700000000000);
    }

    #[test]
    fn message_payload_missing_fields_gets_fallbacks() {
        let wire: WireMessage = serde_json::from_str("{}").unwrap();
        let content = MessageContent::from(wire);
        assert_eq!(content.from, "Unknown Sender");
        assert_eq!(content.subject, "No Subject");
        assert_eq!(content.body, "No content.");
        assert!(content.received_at.is_none());
    }
}
