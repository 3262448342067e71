use tracing::debug;

use crate::layout::{FormLayout, SlotRole};
use crate::post::PostRecord;

/// Returns the answers that make up post groups, skipping the header slots.
pub fn answer_groups<'a>(answers: &'a [String], layout: &FormLayout) -> &'a [String] {
    answers.get(layout.header_len()..).unwrap_or_default()
}

/// Extracts post records from the group section of an answer sequence.
///
/// The answers are scanned in non-overlapping windows of
/// [`FormLayout::width`]. A window yields a record iff its content slot is
/// non-empty after trimming. Scanning stops after the first window whose
/// continuation slot equals a stop sentinel; that window's own content is
/// still emitted. A trailing partial window is read the same way, with its
/// missing slots treated as absent.
///
/// # Example
///
/// ```
/// use formpost::{FormLayout, extract_posts};
///
/// let layout = FormLayout::simple().with_stop_sentinels(["STOP"]);
/// let answers: Vec<String> = ["Hello world", "", "STOP", "ignored", "", ""]
///     .into_iter()
///     .map(String::from)
///     .collect();
///
/// let posts = extract_posts(&answers, &layout);
/// assert_eq!(posts.len(), 1);
/// assert_eq!(posts[0].content, "Hello world");
/// ```
pub fn extract_posts(groups: &[String], layout: &FormLayout) -> Vec<PostRecord> {
    let mut posts = Vec::new();
    for (index, window) in groups.chunks(layout.width()).enumerate() {
        let content = slot(layout, window, SlotRole::Content).unwrap_or_default();
        let enabled = layout
            .vocabulary
            .enabled(slot(layout, window, SlotRole::Enabled), layout.defaults.enabled);
        let priority = layout
            .vocabulary
            .priority(slot(layout, window, SlotRole::Priority));
        let media = slot(layout, window, SlotRole::Media);

        if let Some(post) = PostRecord::new(content, media, enabled, priority) {
            debug!(group = index, chars = post.char_count, "extracted post");
            posts.push(post);
        }

        let continuation = slot(layout, window, SlotRole::Continuation);
        if continuation.is_some_and(|a| layout.vocabulary.is_stop(a)) {
            debug!(group = index, "stop sentinel reached");
            break;
        }
    }
    posts
}

fn slot<'w>(layout: &FormLayout, window: &'w [String], role: SlotRole) -> Option<&'w str> {
    layout
        .position(role)
        .and_then(|i| window.get(i))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PriorityTier;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    fn stop_layout() -> FormLayout {
        FormLayout::simple().with_stop_sentinels(["STOP"])
    }

    #[test]
    fn single_post_with_stop() {
        let answers = strings(&["t", "LabelX", "Hello world", "", "STOP"]);
        let layout = stop_layout();
        let posts = extract_posts(answer_groups(&answers, &layout), &layout);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].content, "Hello world");
        assert_eq!(posts[0].media_reference, "");
        assert_eq!(posts[0].char_count, 11);
    }

    #[test]
    fn stop_window_content_is_emitted_then_scanning_stops() {
        let groups = strings(&["one", "", "more", "two", "", "STOP", "three", "", "STOP"]);
        let posts = extract_posts(&groups, &stop_layout());
        let contents: Vec<_> = posts.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, ["one", "two"]);
    }

    #[test]
    fn empty_windows_are_skipped_but_scanning_continues() {
        let groups = strings(&["  ", "m", "more", "", "", "more", "kept", "", "STOP"]);
        let posts = extract_posts(&groups, &stop_layout());
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].content, "kept");
    }

    #[test]
    fn stop_on_empty_window_yields_nothing_after_it() {
        let groups = strings(&["", "", "STOP", "late", "", ""]);
        assert!(extract_posts(&groups, &stop_layout()).is_empty());
    }

    #[test]
    fn trailing_partial_window() {
        // Content present, continuation slot missing.
        let groups = strings(&["first", "", "more", "tail"]);
        let posts = extract_posts(&groups, &stop_layout());
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[1].content, "tail");
        assert_eq!(posts[1].media_reference, "");

        // Content slot itself missing.
        let groups = strings(&["first", "", "more"]);
        assert_eq!(extract_posts(&groups, &stop_layout()).len(), 1);
    }

    #[test]
    fn no_stop_reads_to_the_end() {
        let groups = strings(&["a", "", "more", "b", "", "more", "c", "", "more"]);
        assert_eq!(extract_posts(&groups, &stop_layout()).len(), 3);
    }

    #[test]
    fn detailed_layout_reads_enabled_and_priority() {
        let answers = strings(&[
            "2024/01/01 12:00:00",
            "target",
            "Promotion",
            "first post",
            "https://drive.google.com/file/d/1234567890/view",
            "はい（投稿対象に含める）",
            "高（すぐに投稿）",
            "はい、もう1つ投稿を追加する",
            "second post",
            "",
            "いいえ（投稿対象に含めない）",
            "低（後回し）",
            "いいえ、送信する",
            "never read",
            "",
            "",
            "",
            "",
        ]);
        let layout = FormLayout::detailed();
        let posts = extract_posts(answer_groups(&answers, &layout), &layout);
        assert_eq!(posts.len(), 2);
        assert!(posts[0].enabled);
        assert_eq!(posts[0].priority, PriorityTier::High);
        assert!(posts[0].has_media());
        assert!(!posts[1].enabled);
        assert_eq!(posts[1].priority, PriorityTier::Low);
    }

    #[test]
    fn seven_slot_layout() {
        let layout: FormLayout = "content,media,enabled,priority,ignore,ignore,continue"
            .parse::<FormLayout>()
            .unwrap()
            .with_stop_sentinels(["done"]);
        let groups = [
            strings(&["p1", "", "", "", "x", "y", "next"]),
            strings(&["p2", "m", "", "", "x", "y", "done"]),
            strings(&["p3", "", "", "", "", "", ""]),
        ]
        .concat();
        let posts = extract_posts(&groups, &layout);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[1].media_reference, "m");
        assert_eq!(posts[1].priority, PriorityTier::Normal);
        assert!(!posts[1].enabled);
    }

    #[test]
    fn count_matches_non_empty_content_up_to_first_stop() {
        let cases: &[&[&str]] = &[
            &[],
            &["", "", ""],
            &[" ", "", "STOP", "x", "", "STOP"],
            &["a", "", "", "b", "", "", "c", "", "STOP", "d", "", ""],
            &["a", "", "STOP"],
            &["a", "", "", " ", "", "", "b"],
        ];
        let layout = stop_layout();
        for case in cases {
            let groups = strings(case);
            let mut expected = 0;
            for w in groups.chunks(3) {
                if w.first().is_some_and(|c| !c.trim().is_empty()) {
                    expected += 1;
                }
                if w.get(2).is_some_and(|f| f == "STOP") {
                    break;
                }
            }
            assert_eq!(extract_posts(&groups, &layout).len(), expected, "{case:?}");
        }
    }

    #[test]
    fn header_shorter_than_layout_yields_no_groups() {
        let answers = strings(&["t"]);
        assert!(answer_groups(&answers, &FormLayout::simple()).is_empty());
    }
}
