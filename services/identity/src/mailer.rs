//! Outbound mail seam
//!
//! Session and password flows hand finished messages to a [`Mailer`];
//! delivery itself lives outside this crate. A recording implementation
//! ships for tests and local runs.

use std::sync::Arc;
use tokio::sync::Mutex;

use common::PlatformResult;

/// A rendered message on its way out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivery seam for verification and reset mail.
pub trait Mailer: Send + Sync {
    fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> impl Future<Output = PlatformResult<()>> + Send;
}

/// Mailer that keeps every message in memory instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    outbox: Arc<Mutex<Vec<OutboundMail>>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, oldest first.
    pub async fn sent(&self) -> Vec<OutboundMail> {
        self.outbox.lock().await.clone()
    }
}

impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> PlatformResult<()> {
        self.outbox.lock().await.push(OutboundMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
