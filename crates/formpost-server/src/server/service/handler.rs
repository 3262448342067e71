use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use formpost::{
    AllocationStrategy, Clock, DispatchStatus, IdAllocator, Notifier, SpreadsheetProvider,
    SubmissionHandler, SubmissionReport, SystemClock,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::server::{
    notify::ServerNotifier,
    store::GoogleSheets,
    telemetry::{
        increment_notification_failures, increment_posts_appended, increment_submission_failures,
        increment_submissions,
    },
};

/// The handler wired up from [`ServerConfig`](crate::server::config::ServerConfig).
pub type IntakeHandler =
    SubmissionHandler<GoogleSheets, ServerNotifier, AllocationStrategy, SystemClock>;

/// Body of `POST /submissions`, as sent by the form trigger.
#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    pub values: Vec<Value>,
}

impl SubmissionRequest {
    /// Answers as text. Strings are taken verbatim, `null` becomes an empty
    /// answer, and anything else is rendered as JSON.
    pub fn answers(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|value| match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect()
    }
}

pub fn router<P, N, A, C>(handler: Arc<SubmissionHandler<P, N, A, C>>) -> Router
where
    P: SpreadsheetProvider + 'static,
    N: Notifier + 'static,
    A: IdAllocator + 'static,
    C: Clock + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/submissions", post(submit::<P, N, A, C>))
        .with_state(handler)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Always answers `200 OK`; the report says whether the submission failed.
async fn submit<P, N, A, C>(
    State(handler): State<Arc<SubmissionHandler<P, N, A, C>>>,
    Json(request): Json<SubmissionRequest>,
) -> Json<SubmissionReport>
where
    P: SpreadsheetProvider + 'static,
    N: Notifier + 'static,
    A: IdAllocator + 'static,
    C: Clock + Send + Sync + 'static,
{
    increment_submissions();
    let report = handler.submit(&request.answers()).await;
    record_metrics(&report);
    Json(report)
}

fn record_metrics(report: &SubmissionReport) {
    increment_posts_appended(report.posts().len() as u64);
    if let Some(stage) = report.failed_stage {
        increment_submission_failures(stage.as_str());
    }
    for status in [&report.summary_notification, &report.error_notification] {
        if matches!(status, DispatchStatus::Failed { .. }) {
            increment_notification_failures();
        }
    }
}
