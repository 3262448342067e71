//! Slack incoming-webhook payloads.
//!
//! Both payloads are plain [`serde_json::Value`]s built with `json!`, so
//! rendering cannot fail.

use chrono::NaiveDateTime;
use serde_json::{Value, json};

use crate::{
    config::NotificationOptions, post::AssignedPost, target::TargetSelection,
    time::ROW_TIMESTAMP_FORMAT,
};

/// Characters of content shown per post before truncating.
pub const PREVIEW_CHARS: usize = 50;

const ELLIPSIS: &str = "...";

/// Marker shown in front of each post line.
pub fn media_icon(post: &AssignedPost) -> &'static str {
    if post.needs_transcoding {
        "📸→🎥"
    } else if post.has_media() {
        "🎬"
    } else {
        "📝"
    }
}

/// Content as shown in a notification: unchanged up to [`PREVIEW_CHARS`]
/// characters, otherwise cut so that the preview including `...` is exactly
/// that long.
pub fn preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_CHARS {
        return content.to_string();
    }
    let keep = PREVIEW_CHARS - ELLIPSIS.len();
    let mut out: String = content.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

fn post_line(ordinal: usize, post: &AssignedPost) -> String {
    format!(
        "{ordinal}. {icon} #{id} ({chars} chars)\n{preview}",
        icon = media_icon(post),
        id = post.id,
        chars = post.record.char_count,
        preview = preview(&post.record.content),
    )
}

fn field(title: &str, value: impl Into<Value>, short: bool) -> Value {
    json!({ "title": title, "value": value.into(), "short": short })
}

/// Renders the summary of one batch of appended posts.
///
/// # Example
///
/// ```
/// use formpost::{
///     AssignedPost, NotificationOptions, PostRecord, PriorityTier, TargetSelection,
///     format_summary,
/// };
///
/// let record = PostRecord::new("Hello world", None, false, PriorityTier::Normal).unwrap();
/// let post = AssignedPost {
///     id: 8,
///     record,
///     resolved_media_url: String::new(),
///     needs_transcoding: false,
/// };
/// let target = TargetSelection::new("acct-1", "Tokyo");
///
/// let payload = format_summary(&target, &[post], &NotificationOptions::default());
/// let fields = &payload["attachments"][0]["fields"];
/// assert_eq!(fields[0]["value"], "📊 Tokyo (acct-1)");
/// assert_eq!(fields[4]["value"], "1. 📝 #8 (11 chars)\nHello world");
/// ```
pub fn format_summary(
    target: &TargetSelection,
    posts: &[AssignedPost],
    options: &NotificationOptions,
) -> Value {
    let total = posts.len();
    let enabled = posts.iter().filter(|p| p.record.enabled).count();
    let chars: usize = posts.iter().map(|p| p.record.char_count).sum();
    let average = (chars + total / 2).checked_div(total).unwrap_or(0);
    let list = posts
        .iter()
        .enumerate()
        .map(|(i, post)| post_line(i + 1, post))
        .collect::<Vec<_>>()
        .join("\n");

    let mut fields = vec![
        field(
            "Worksheet",
            format!("📊 {} ({})", target.worksheet, target.account_id),
            true,
        ),
        field("Posts added", total.to_string(), true),
        field(
            "Enabled / disabled",
            format!("✅{enabled} ❌{}", total - enabled),
            true,
        ),
        field("Average length", format!("{average} chars"), true),
        field("Posts", list, false),
    ];

    let transcoding = posts.iter().filter(|p| p.needs_transcoding).count();
    if transcoding > 0 {
        fields.push(field(
            "Media conversion",
            format!(
                "📸→🎥 {transcoding} image post(s) will be converted to video by the scheduled job within {} minutes.",
                options.transcoding_window_minutes
            ),
            false,
        ));
    }
    fields.push(field(
        "Next action",
        format!(
            "Review the new rows in {} and set enabled to TRUE for the posts that should go out.",
            target.worksheet
        ),
        false,
    ));

    json!({
        "text": format!("📝 {total} post(s) added from the form"),
        "attachments": [{ "color": "good", "fields": fields }],
    })
}

/// Renders the notification sent when a submission fails.
pub fn format_error(message: &str, at: NaiveDateTime) -> Value {
    json!({
        "text": "❌ Form submission failed",
        "attachments": [{
            "color": "danger",
            "fields": [
                field("Error", message, false),
                field("Occurred at", at.format(ROW_TIMESTAMP_FORMAT).to_string(), true),
                field("Next action", "Check the intake service log for details.", false),
            ],
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Clock, FixedClock, PostRecord, PriorityTier};

    fn post(id: u64, content: &str, media: &str, needs_transcoding: bool) -> AssignedPost {
        AssignedPost {
            id,
            record: PostRecord::new(content, Some(media), id % 2 == 0, PriorityTier::Normal)
                .unwrap(),
            resolved_media_url: media.to_string(),
            needs_transcoding,
        }
    }

    fn fields(payload: &Value) -> &Vec<Value> {
        payload["attachments"][0]["fields"].as_array().unwrap()
    }

    fn field_value<'a>(payload: &'a Value, title: &str) -> Option<&'a Value> {
        fields(payload)
            .iter()
            .find(|f| f["title"] == title)
            .map(|f| &f["value"])
    }

    #[test]
    fn preview_truncates_long_content() {
        let short = "a".repeat(PREVIEW_CHARS);
        assert_eq!(preview(&short), short);

        let long = "b".repeat(PREVIEW_CHARS + 1);
        let cut = preview(&long);
        assert_eq!(cut.chars().count(), PREVIEW_CHARS);
        assert!(cut.ends_with("..."));
        assert_eq!(&cut[..47], &long[..47]);
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        let long = "あ".repeat(60);
        let cut = preview(&long);
        assert_eq!(cut, format!("{}...", "あ".repeat(47)));
    }

    #[test]
    fn icons_reflect_media() {
        assert_eq!(media_icon(&post(1, "a", "", false)), "📝");
        assert_eq!(media_icon(&post(2, "a", "https://v/x.mp4", false)), "🎬");
        assert_eq!(media_icon(&post(3, "a", "https://v/x.png", true)), "📸→🎥");
    }

    #[test]
    fn summary_lists_every_post() {
        let target = TargetSelection::new("acct", "Osaka");
        let posts = [
            post(8, "first", "", false),
            post(9, "second post", "https://m/v", false),
        ];
        let payload = format_summary(&target, &posts, &NotificationOptions::default());

        assert_eq!(payload["attachments"][0]["color"], "good");
        assert_eq!(payload["text"], "📝 2 post(s) added from the form");
        assert_eq!(field_value(&payload, "Posts added").unwrap(), "2");
        assert_eq!(field_value(&payload, "Enabled / disabled").unwrap(), "✅1 ❌1");
        assert_eq!(field_value(&payload, "Average length").unwrap(), "8 chars");
        assert_eq!(
            field_value(&payload, "Posts").unwrap(),
            "1. 📝 #8 (5 chars)\nfirst\n2. 🎬 #9 (11 chars)\nsecond post"
        );
        assert!(field_value(&payload, "Media conversion").is_none());
        assert!(
            field_value(&payload, "Next action")
                .unwrap()
                .as_str()
                .unwrap()
                .contains("Osaka")
        );
    }

    #[test]
    fn summary_notes_transcoding() {
        let target = TargetSelection::new("acct", "Osaka");
        let posts = [
            post(1, "a", "https://d/file/d/X/view", true),
            post(2, "b", "", false),
            post(3, "c", "https://d/p.jpg", true),
        ];
        let options = NotificationOptions {
            transcoding_window_minutes: 45,
        };
        let payload = format_summary(&target, &posts, &options);
        let note = field_value(&payload, "Media conversion")
            .unwrap()
            .as_str()
            .unwrap();

        assert!(note.contains(" 2 image post(s)"));
        assert!(note.contains("within 45 minutes"));
        assert_eq!(fields(&payload).last().unwrap()["title"], "Next action");
    }

    #[test]
    fn empty_batch_averages_to_zero() {
        let target = TargetSelection::new("acct", "Osaka");
        let payload = format_summary(&target, &[], &NotificationOptions::default());

        assert_eq!(field_value(&payload, "Posts added").unwrap(), "0");
        assert_eq!(field_value(&payload, "Average length").unwrap(), "0 chars");
        assert_eq!(field_value(&payload, "Posts").unwrap(), "");
    }

    #[test]
    fn error_payload() {
        let at = FixedClock::at_midnight(2024, 5, 1).now();
        let payload = format_error("Validation error: unknown target selection \"Z\"", at);

        assert_eq!(payload["attachments"][0]["color"], "danger");
        assert_eq!(
            field_value(&payload, "Error").unwrap(),
            "Validation error: unknown target selection \"Z\""
        );
        assert_eq!(
            field_value(&payload, "Occurred at").unwrap(),
            "2024-05-01 00:00:00"
        );
    }
}
