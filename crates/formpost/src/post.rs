use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

use crate::time::{HIGH_PRIORITY_TIMESTAMP, ROW_TIMESTAMP_FORMAT};

/// How soon a post should be picked up by the posting scheduler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    High,
    #[default]
    Normal,
    Low,
}

impl PriorityTier {
    /// Computes the last-post timestamp written to the row.
    ///
    /// The scheduler posts the row whose last-post time is oldest first, so a
    /// high priority post pretends it was last posted long ago, a normal one a
    /// day ago and a low one twelve hours ago.
    pub fn last_post_timestamp(self, now: NaiveDateTime) -> String {
        match self {
            Self::High => HIGH_PRIORITY_TIMESTAMP.to_string(),
            Self::Normal => (now - Duration::hours(24))
                .format(ROW_TIMESTAMP_FORMAT)
                .to_string(),
            Self::Low => (now - Duration::hours(12))
                .format(ROW_TIMESTAMP_FORMAT)
                .to_string(),
        }
    }
}

/// One post extracted from a submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    /// Trimmed, never empty.
    pub content: String,
    /// Trimmed raw media link, empty when absent.
    pub media_reference: String,
    /// Length of `content` in characters.
    pub char_count: usize,
    pub enabled: bool,
    pub priority: PriorityTier,
}

impl PostRecord {
    /// Builds a record from raw slot values. Returns `None` when `content` is
    /// absent or whitespace only.
    pub fn new(
        content: &str,
        media_reference: Option<&str>,
        enabled: bool,
        priority: PriorityTier,
    ) -> Option<Self> {
        let content = content.trim();
        if content.is_empty() {
            return None;
        }
        Some(Self {
            content: content.to_string(),
            media_reference: media_reference
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            char_count: content.chars().count(),
            enabled,
            priority,
        })
    }

    pub fn has_media(&self) -> bool {
        !self.media_reference.is_empty()
    }
}

/// A [`PostRecord`] that was given an id and written to a worksheet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AssignedPost {
    pub id: u64,
    #[serde(flatten)]
    pub record: PostRecord,
    pub resolved_media_url: String,
    /// The media is a still image that the scheduled job converts to video.
    pub needs_transcoding: bool,
}

impl AssignedPost {
    pub fn has_media(&self) -> bool {
        !self.resolved_media_url.is_empty()
    }
}

/// A worksheet row in the fixed eight column layout:
///
/// | A  | B         | C              | D          | E       | F         | G       | H            |
/// |----|-----------|----------------|------------|---------|-----------|---------|--------------|
/// | id | post type | last posted at | char count | content | media url | enabled | posted count |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    pub id: u64,
    pub post_type: String,
    pub last_post_timestamp: String,
    pub char_count: usize,
    pub content: String,
    pub media_url: String,
    pub enabled: bool,
    pub posted_count: u64,
}

impl Row {
    pub const WIDTH: usize = 8;

    /// Cell values in column order. Numbers stay numbers so spreadsheet
    /// backends can keep them numeric; the enabled flag is the literal string
    /// `TRUE` or `FALSE`.
    pub fn cells(&self) -> [Value; Self::WIDTH] {
        [
            Value::from(self.id),
            Value::from(self.post_type.as_str()),
            Value::from(self.last_post_timestamp.as_str()),
            Value::from(self.char_count),
            Value::from(self.content.as_str()),
            Value::from(self.media_url.as_str()),
            Value::from(if self.enabled { "TRUE" } else { "FALSE" }),
            Value::from(self.posted_count),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Clock;
    use crate::FixedClock;

    #[test]
    fn whitespace_content_is_not_a_record() {
        assert!(PostRecord::new("   \t\n", Some("x"), true, PriorityTier::High).is_none());
        assert!(PostRecord::new("", None, true, PriorityTier::High).is_none());
    }

    #[test]
    fn record_trims_and_counts_characters() {
        let post = PostRecord::new("  こんにちは  ", None, false, PriorityTier::Normal).unwrap();
        assert_eq!(post.content, "こんにちは");
        assert_eq!(post.char_count, 5);
        assert_eq!(post.media_reference, "");
        assert!(!post.has_media());

        let post = PostRecord::new("a", Some("  https://x/y "), false, PriorityTier::Low).unwrap();
        assert_eq!(post.media_reference, "https://x/y");
    }

    #[test]
    fn priority_timestamps() {
        let now = FixedClock::at_midnight(2024, 3, 10).now();
        assert_eq!(
            PriorityTier::High.last_post_timestamp(now),
            "2020-01-01 00:00:00"
        );
        assert_eq!(
            PriorityTier::Normal.last_post_timestamp(now),
            "2024-03-09 00:00:00"
        );
        assert_eq!(
            PriorityTier::Low.last_post_timestamp(now),
            "2024-03-09 12:00:00"
        );
    }

    #[test]
    fn row_cells_follow_column_layout() {
        let row = Row {
            id: 8,
            post_type: "フォーム投稿".into(),
            last_post_timestamp: "2030-01-01 00:00:00".into(),
            char_count: 5,
            content: "hello".into(),
            media_url: String::new(),
            enabled: false,
            posted_count: 0,
        };
        let cells = row.cells();
        assert_eq!(cells[0], Value::from(8u64));
        assert_eq!(cells[1], Value::from("フォーム投稿"));
        assert_eq!(cells[3], Value::from(5usize));
        assert_eq!(cells[6], Value::from("FALSE"));
        assert_eq!(cells[7], Value::from(0u64));
    }
}
