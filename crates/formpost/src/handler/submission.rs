use tracing::{debug, error, info, instrument, trace, warn};

use crate::{
    allocator::{IdAllocator, ReadMaxAllocator},
    config::{IntakeConfig, PartialBatchPolicy},
    error::{Result, Stage, StoreError, SubmissionError},
    extract::{answer_groups, extract_posts},
    handler::{Submission, SubmissionReport},
    layout::SlotRole,
    media::{needs_transcoding, normalize_media_url},
    notify::{DispatchStatus, Notifier, dispatch, format_error, format_summary},
    post::{AssignedPost, PostRecord, Row},
    store::{Spreadsheet, SpreadsheetProvider, Worksheet},
    time::{Clock, SystemClock},
};

/// Answer position holding the target label.
pub const LABEL_POSITION: usize = 1;

/// Answer position holding the post type, when the form asks for one.
pub const POST_TYPE_POSITION: usize = 2;

/// Runs one form submission through validation, extraction, persistence and
/// notification.
///
/// The handler holds no per-submission state. A single handler can serve any
/// number of submissions, including overlapping ones, though overlapping
/// submissions to the same worksheet may race on ids unless the allocator
/// prevents it (see [`CounterAllocator`](crate::CounterAllocator)).
///
/// # Example
///
/// ```
/// use formpost::{
///     FormLayout, IntakeConfig, MemoryNotifier, MemorySpreadsheets, Stage, SubmissionHandler,
///     TargetSelection, TargetTable,
/// };
///
/// # tokio_test::block_on(async {
/// let sheets = MemorySpreadsheets::new();
/// sheets.add_worksheet("book", "Tokyo", &["ID"]);
/// let targets = TargetTable::new([("LabelX", TargetSelection::new("acct", "Tokyo"))]).unwrap();
/// let layout = FormLayout::simple().with_stop_sentinels(["STOP"]);
/// let handler = SubmissionHandler::new(
///     IntakeConfig::new("book", targets, layout),
///     sheets.clone(),
///     MemoryNotifier::new(),
/// );
///
/// let answers: Vec<String> = ["t", "LabelX", "Hello world", "", "STOP"]
///     .into_iter()
///     .map(String::from)
///     .collect();
/// let report = handler.submit(&answers).await;
///
/// assert_eq!(report.final_stage, Stage::Done);
/// assert_eq!(report.ids(), [1]);
/// # });
/// ```
#[derive(Debug)]
pub struct SubmissionHandler<P, N, A = ReadMaxAllocator, C = SystemClock>
where
    P: SpreadsheetProvider,
    N: Notifier,
    A: IdAllocator,
    C: Clock + Send + Sync,
{
    config: IntakeConfig,
    provider: P,
    notifier: N,
    allocator: A,
    clock: C,
}

/// What a submission got done before it finished or failed.
#[derive(Default)]
struct Progress {
    stage: Stage,
    submission: Submission,
}

impl Progress {
    fn enter(&mut self, stage: Stage) {
        trace!(from = %self.stage, to = %stage, "stage transition");
        self.stage = stage;
    }
}

impl<P, N> SubmissionHandler<P, N, ReadMaxAllocator, SystemClock>
where
    P: SpreadsheetProvider,
    N: Notifier,
{
    /// Creates a handler that re-reads the id column for every post and uses
    /// the system clock.
    pub fn new(config: IntakeConfig, provider: P, notifier: N) -> Self {
        Self::with_parts(config, provider, notifier, ReadMaxAllocator, SystemClock)
    }
}

impl<P, N, A, C> SubmissionHandler<P, N, A, C>
where
    P: SpreadsheetProvider,
    N: Notifier,
    A: IdAllocator,
    C: Clock + Send + Sync,
{
    pub fn with_parts(
        config: IntakeConfig,
        provider: P,
        notifier: N,
        allocator: A,
        clock: C,
    ) -> Self {
        Self {
            config,
            provider,
            notifier,
            allocator,
            clock,
        }
    }

    /// Validates, extracts and persists one submission without notifying.
    ///
    /// # Errors
    ///
    /// Returns the fatal error that stopped the submission. Rows appended
    /// before a [`SubmissionError::Persistence`] stay committed.
    pub async fn try_submit(&self, answers: &[String]) -> Result<Submission> {
        let mut progress = Progress::default();
        self.process(answers, &mut progress).await?;
        Ok(progress.submission)
    }

    /// Runs one submission to completion and reports what happened.
    ///
    /// Never fails: fatal errors are logged, sent as an error notification
    /// and returned in the report. Notification failures only show up in the
    /// report's dispatch statuses.
    #[instrument(level = "info", skip_all, fields(answers = answers.len()))]
    pub async fn submit(&self, answers: &[String]) -> SubmissionReport {
        let mut progress = Progress::default();
        let outcome = self.process(answers, &mut progress).await;

        let mut report = SubmissionReport {
            final_stage: Stage::Done,
            failed_stage: None,
            submission: Submission::default(),
            error: None,
            summary_notification: DispatchStatus::NotAttempted,
            error_notification: DispatchStatus::NotAttempted,
        };

        match outcome {
            Ok(()) => {
                if !progress.submission.is_noop() {
                    progress.enter(Stage::Notifying);
                    report.summary_notification = self.notify_summary(&progress.submission).await;
                }
                progress.enter(Stage::Done);
            }
            Err(e) => {
                error!(
                    error = %e,
                    stage = %e.stage(),
                    persisted = progress.submission.posts.len(),
                    "submission failed"
                );
                progress.enter(Stage::Error);
                if self.config.partial_policy == PartialBatchPolicy::NotifyPartial
                    && !progress.submission.is_noop()
                {
                    report.summary_notification = self.notify_summary(&progress.submission).await;
                }
                let payload = format_error(&e.to_string(), self.clock.now());
                report.error_notification = dispatch(&self.notifier, &payload).await;
                report.final_stage = Stage::Error;
                report.failed_stage = Some(e.stage());
                report.error = Some(e.to_string());
            }
        }

        report.submission = progress.submission;
        report
    }

    async fn notify_summary(&self, submission: &Submission) -> DispatchStatus {
        let Some(target) = &submission.target else {
            return DispatchStatus::NotAttempted;
        };
        let payload = format_summary(target, &submission.posts, &self.config.notification);
        dispatch(&self.notifier, &payload).await
    }

    async fn process(&self, answers: &[String], progress: &mut Progress) -> Result<()> {
        let layout = &self.config.layout;

        progress.enter(Stage::Validating);
        let label = answers
            .get(LABEL_POSITION)
            .ok_or(SubmissionError::MissingHeader {
                expected: LABEL_POSITION + 1,
                actual: answers.len(),
            })?
            .as_str();
        let target = self
            .config
            .targets
            .resolve(label)
            .cloned()
            .ok_or_else(|| SubmissionError::Validation {
                label: label.to_string(),
            })?;
        progress.submission.target = Some(target.clone());

        progress.enter(Stage::Extracting);
        let records = extract_posts(answer_groups(answers, layout), layout);
        if records.is_empty() {
            info!(label, "submission has no posts, nothing to do");
            return Ok(());
        }
        info!(
            label,
            worksheet = %target.worksheet,
            posts = records.len(),
            "accepted submission"
        );

        progress.enter(Stage::Persisting);
        let spreadsheet_id = &self.config.spreadsheet_id;
        let spreadsheet = self
            .provider
            .open(spreadsheet_id)
            .await
            .map_err(|source| match source {
                StoreError::SpreadsheetNotFound { .. } => SubmissionError::NotFound {
                    what: format!("spreadsheet {spreadsheet_id:?}"),
                },
                source => SubmissionError::Persistence {
                    persisted: 0,
                    source,
                },
            })?;
        let worksheet = spreadsheet
            .worksheet(&target.worksheet)
            .await
            .map_err(|source| SubmissionError::Persistence {
                persisted: 0,
                source,
            })?
            .ok_or_else(|| SubmissionError::NotFound {
                what: format!("worksheet {:?}", target.worksheet),
            })?;

        let post_type = self.post_type(answers);
        for record in records {
            let persisted = progress.submission.posts.len();
            let post = self
                .append(&worksheet, post_type, record)
                .await
                .map_err(|source| SubmissionError::Persistence { persisted, source })?;
            progress.submission.posts.push(post);
        }

        let transcoding = progress
            .submission
            .posts
            .iter()
            .filter(|p| p.needs_transcoding)
            .count();
        if transcoding > 0 {
            info!(
                transcoding,
                worksheet = %target.worksheet,
                "posts left for the scheduled video conversion job"
            );
        }
        Ok(())
    }

    fn post_type<'a>(&'a self, answers: &'a [String]) -> &'a str {
        let defaults = &self.config.layout.defaults;
        if !self.config.layout.post_type_slot {
            return &defaults.post_type;
        }
        match answers.get(POST_TYPE_POSITION).map(|s| s.trim()) {
            Some(answer) if !answer.is_empty() => answer,
            _ => {
                warn!("post type answer missing, using default");
                &defaults.post_type
            }
        }
    }

    async fn append<W: Worksheet>(
        &self,
        worksheet: &W,
        post_type: &str,
        record: PostRecord,
    ) -> Result<AssignedPost, StoreError> {
        let layout = &self.config.layout;
        let id = self.allocator.next_id(worksheet).await?;
        let resolved_media_url = normalize_media_url(&record.media_reference);
        let last_post_timestamp = if layout.has(SlotRole::Priority) {
            record.priority.last_post_timestamp(self.clock.now())
        } else {
            layout.defaults.held_timestamp.clone()
        };

        let row = Row {
            id,
            post_type: post_type.to_string(),
            last_post_timestamp,
            char_count: record.char_count,
            content: record.content.clone(),
            media_url: resolved_media_url.clone(),
            enabled: record.enabled,
            posted_count: 0,
        };
        worksheet.append_row(&row).await?;
        info!(
            id,
            worksheet = worksheet.name(),
            chars = record.char_count,
            "appended post"
        );
        debug!(?row, "row written");

        Ok(AssignedPost {
            id,
            needs_transcoding: needs_transcoding(&resolved_media_url),
            resolved_media_url,
            record,
        })
    }
}
