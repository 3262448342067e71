use serde::Serialize;

use crate::{error::Stage, notify::DispatchStatus, post::AssignedPost, target::TargetSelection};

/// Posts written by a successful submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Submission {
    /// `None` only if the submission never got past validation.
    pub target: Option<TargetSelection>,
    pub posts: Vec<AssignedPost>,
}

impl Submission {
    /// A submission without posts touched neither the store nor the webhook.
    pub fn is_noop(&self) -> bool {
        self.posts.is_empty()
    }
}

/// The outcome of [`SubmissionHandler::submit`](crate::SubmissionHandler::submit).
///
/// Rows listed in `posts` are committed even when `error` is set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubmissionReport {
    /// Either [`Stage::Done`] or [`Stage::Error`].
    pub final_stage: Stage,
    /// The stage the error arose in, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
    #[serde(flatten)]
    pub submission: Submission,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub summary_notification: DispatchStatus,
    pub error_notification: DispatchStatus,
}

impl SubmissionReport {
    pub fn is_success(&self) -> bool {
        self.final_stage == Stage::Done
    }

    pub fn posts(&self) -> &[AssignedPost] {
        &self.submission.posts
    }

    pub fn ids(&self) -> Vec<u64> {
        self.submission.posts.iter().map(|p| p.id).collect()
    }
}
