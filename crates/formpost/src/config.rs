use core::{fmt, str::FromStr};

use crate::{layout::FormLayout, target::TargetTable};

/// Default time the scheduled job takes to pick up media that needs
/// transcoding.
pub const DEFAULT_TRANSCODING_WINDOW_MINUTES: u32 = 30;

/// What to notify when a batch fails after some of its posts were written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PartialBatchPolicy {
    /// Send the summary for the posts written before the failure, then the
    /// error notification.
    #[default]
    NotifyPartial,
    /// Send only the error notification.
    ErrorOnly,
}

impl FromStr for PartialBatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "notify-partial" | "notify_partial" => Ok(Self::NotifyPartial),
            "error-only" | "error_only" => Ok(Self::ErrorOnly),
            other => Err(format!(
                "unknown partial batch policy {other:?}, expected notify-partial or error-only"
            )),
        }
    }
}

impl fmt::Display for PartialBatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotifyPartial => "notify-partial",
            Self::ErrorOnly => "error-only",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationOptions {
    /// Upper bound quoted in the transcoding note.
    pub transcoding_window_minutes: u32,
}

impl Default for NotificationOptions {
    fn default() -> Self {
        Self {
            transcoding_window_minutes: DEFAULT_TRANSCODING_WINDOW_MINUTES,
        }
    }
}

/// Everything a [`SubmissionHandler`](crate::SubmissionHandler) needs to know
/// about one deployment. Built once and never mutated.
#[derive(Clone, Debug)]
pub struct IntakeConfig {
    pub spreadsheet_id: String,
    pub targets: TargetTable,
    pub layout: FormLayout,
    pub notification: NotificationOptions,
    pub partial_policy: PartialBatchPolicy,
}

impl IntakeConfig {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        targets: TargetTable,
        layout: FormLayout,
    ) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            targets,
            layout,
            notification: NotificationOptions::default(),
            partial_policy: PartialBatchPolicy::default(),
        }
    }

    pub fn with_notification(mut self, notification: NotificationOptions) -> Self {
        self.notification = notification;
        self
    }

    pub fn with_partial_policy(mut self, partial_policy: PartialBatchPolicy) -> Self {
        self.partial_policy = partial_policy;
        self
    }
}
