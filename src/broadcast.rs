//! Operator broadcast fan-out over the known sessions.

use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};
use thiserror::Error;

use crate::store::{OwnerId, SessionStore};

#[derive(Debug, Error)]
pub enum SendError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Transport seam for outbound chat messages.
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send_text(&self, owner: OwnerId, text: &str) -> Result<(), SendError>;
}

/// Outcome of one broadcast batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub attempted: usize,
    pub failed: Vec<OwnerId>,
}

/// Sends an operator-authored message to every known session. Each
/// delivery is an independent attempt; one failure never aborts the
/// batch, and there is no retry.
pub struct Broadcaster {
    store: Arc<dyn SessionStore>,
    sender: Arc<dyn ChatSender>,
}

impl Broadcaster {
    pub fn new(store: Arc<dyn SessionStore>, sender: Arc<dyn ChatSender>) -> Self {
        Self { store, sender }
    }

    pub async fn broadcast(&self, text: &str) -> BroadcastReport {
        // Snapshot at call time; sessions that come or go mid-batch are
        // not chased.
        let recipients = self.store.list_all();
        let mut report = BroadcastReport::default();

        for session in recipients {
            report.attempted += 1;
            if let Err(err) = self.sender.send_text(session.owner, text).await {
                warn!("Broadcast delivery to owner {} failed: {}", session.owner, err);
                report.failed.push(session.owner);
            }
        }

        info!(
            "Broadcast complete: {} attempted, {} failed",
            report.attempted,
            report.failed.len()
        );
        report
    }
}
