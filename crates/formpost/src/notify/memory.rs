use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::{error::NotifyError, notify::Notifier};

/// A notifier that keeps every payload it is given.
///
/// Payloads are recorded even when the notifier is set to fail, the same way
/// a webhook sees a request it then rejects.
#[derive(Clone, Debug, Default)]
pub struct MemoryNotifier {
    sent: Arc<Mutex<Vec<Value>>>,
    failure: Option<NotifyError>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every post fails with `error`.
    pub fn failing(error: NotifyError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn post(&self, payload: &Value) -> Result<u16, NotifyError> {
        self.sent.lock().push(payload.clone());
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(200),
        }
    }
}
