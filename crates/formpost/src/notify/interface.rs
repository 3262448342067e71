use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::NotifyError;

/// A chat webhook that accepts JSON payloads.
///
/// Dispatch is a single attempt. Implementations must not retry.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Posts `payload` and returns the response status.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Disabled`] when no channel is configured, or
    /// another [`NotifyError`] when the post fails or is rejected.
    async fn post(&self, payload: &Value) -> Result<u16, NotifyError>;
}

/// A notifier for deployments without a webhook.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn post(&self, _payload: &Value) -> Result<u16, NotifyError> {
        Err(NotifyError::Disabled)
    }
}

/// Outcome of one best-effort notification.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchStatus {
    #[default]
    NotAttempted,
    Disabled,
    Sent { code: u16 },
    Failed { reason: String },
}

impl DispatchStatus {
    pub const fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// Posts `payload` once. Failures are logged and returned as a status, never
/// as an error.
pub async fn dispatch<N: Notifier + ?Sized>(notifier: &N, payload: &Value) -> DispatchStatus {
    match notifier.post(payload).await {
        Ok(code) => {
            debug!(code, "notification sent");
            DispatchStatus::Sent { code }
        }
        Err(NotifyError::Disabled) => {
            debug!("notifications disabled, skipping");
            DispatchStatus::Disabled
        }
        Err(e) => {
            warn!(error = %e, "notification failed");
            DispatchStatus::Failed {
                reason: e.to_string(),
            }
        }
    }
}
