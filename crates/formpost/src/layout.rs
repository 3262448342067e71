//! Form layouts.
//!
//! A form repeats the same group of questions once per post. A [`FormLayout`]
//! names the role of every slot in that group, which fixes the group width,
//! together with the answer texts the form uses for its choice questions.

use core::{fmt, str::FromStr};

use crate::post::PriorityTier;
use crate::time::HELD_TIMESTAMP;

/// The meaning of one answer slot within a post group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotRole {
    /// Post body. Gates whether the group yields a record.
    Content,
    /// Raw link to hosted media.
    Media,
    /// Tri-state "may this be posted" answer.
    Enabled,
    /// Priority choice.
    Priority,
    /// "Add another post?" answer, compared against the stop sentinels.
    Continuation,
    /// A slot the intake does not use.
    Ignored,
}

impl SlotRole {
    const fn name(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Media => "media",
            Self::Enabled => "enabled",
            Self::Priority => "priority",
            Self::Continuation => "continue",
            Self::Ignored => "ignore",
        }
    }
}

impl fmt::Display for SlotRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SlotRole {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "content" => Ok(Self::Content),
            "media" => Ok(Self::Media),
            "enabled" => Ok(Self::Enabled),
            "priority" => Ok(Self::Priority),
            "continue" | "continuation" => Ok(Self::Continuation),
            "ignore" | "ignored" | "_" => Ok(Self::Ignored),
            other => Err(LayoutError::UnknownRole(other.to_string())),
        }
    }
}

/// Errors raised while building a [`FormLayout`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("unknown slot role {0:?}")]
    UnknownRole(String),
    #[error("a post group needs exactly one content slot, found {0}")]
    ContentSlots(usize),
    #[error("slot role {0} appears more than once")]
    DuplicateRole(SlotRole),
}

/// The answer texts a form uses for its choice questions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerVocabulary {
    /// Continuation answers that end the submission.
    pub stop_sentinels: Vec<String>,
    pub enabled_yes: String,
    pub enabled_no: String,
    pub priority_high: String,
    pub priority_normal: String,
    pub priority_low: String,
}

impl AnswerVocabulary {
    pub fn is_stop(&self, answer: &str) -> bool {
        self.stop_sentinels.iter().any(|s| s == answer)
    }

    /// Resolves the tri-state enabled answer. Anything other than the two
    /// known answers falls back to `default`.
    pub fn enabled(&self, answer: Option<&str>, default: bool) -> bool {
        match answer {
            Some(a) if a == self.enabled_yes => true,
            Some(a) if a == self.enabled_no => false,
            _ => default,
        }
    }

    /// Resolves the priority answer, defaulting to [`PriorityTier::Normal`].
    pub fn priority(&self, answer: Option<&str>) -> PriorityTier {
        match answer {
            Some(a) if a == self.priority_high => PriorityTier::High,
            Some(a) if a == self.priority_low => PriorityTier::Low,
            _ => PriorityTier::Normal,
        }
    }
}

impl Default for AnswerVocabulary {
    fn default() -> Self {
        Self {
            stop_sentinels: vec![
                "✅ いいえ、送信する".to_string(),
                "✅ はい、送信する".to_string(),
                "いいえ、送信する".to_string(),
            ],
            enabled_yes: "はい（投稿対象に含める）".to_string(),
            enabled_no: "いいえ（投稿対象に含めない）".to_string(),
            priority_high: "高（すぐに投稿）".to_string(),
            priority_normal: "中（通常）".to_string(),
            priority_low: "低（後回し）".to_string(),
        }
    }
}

/// Values written to a row when the form does not ask for them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowDefaults {
    /// Post type used when the form has no post-type question.
    pub post_type: String,
    /// Enabled flag used when the form has no enabled question or the answer
    /// is neither yes nor no.
    pub enabled: bool,
    /// Last-post timestamp used when the form has no priority question.
    pub held_timestamp: String,
}

impl Default for RowDefaults {
    fn default() -> Self {
        Self {
            post_type: "フォーム投稿".to_string(),
            enabled: false,
            held_timestamp: HELD_TIMESTAMP.to_string(),
        }
    }
}

/// The shape of a submitted answer sequence.
///
/// Position 0 is always the submission timestamp and position 1 the target
/// selection. When [`FormLayout::post_type_slot`] is set, position 2 carries
/// the post type. All following positions repeat the post group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormLayout {
    slots: Vec<SlotRole>,
    pub post_type_slot: bool,
    pub vocabulary: AnswerVocabulary,
    pub defaults: RowDefaults,
}

impl FormLayout {
    /// Builds a layout from its group slots.
    ///
    /// # Errors
    ///
    /// Returns an error unless the group has exactly one content slot and no
    /// role other than [`SlotRole::Ignored`] appears twice.
    pub fn new(slots: Vec<SlotRole>) -> Result<Self, LayoutError> {
        let content = slots.iter().filter(|r| **r == SlotRole::Content).count();
        if content != 1 {
            return Err(LayoutError::ContentSlots(content));
        }
        for (i, role) in slots.iter().enumerate() {
            if *role != SlotRole::Ignored && slots[..i].contains(role) {
                return Err(LayoutError::DuplicateRole(*role));
            }
        }
        Ok(Self {
            slots,
            post_type_slot: false,
            vocabulary: AnswerVocabulary::default(),
            defaults: RowDefaults::default(),
        })
    }

    /// Three slots per post: content, media, continuation.
    pub fn simple() -> Self {
        Self {
            slots: vec![SlotRole::Content, SlotRole::Media, SlotRole::Continuation],
            post_type_slot: false,
            vocabulary: AnswerVocabulary::default(),
            defaults: RowDefaults::default(),
        }
    }

    /// Five slots per post: content, media, enabled, priority, continuation,
    /// preceded by a post-type answer.
    pub fn detailed() -> Self {
        Self {
            slots: vec![
                SlotRole::Content,
                SlotRole::Media,
                SlotRole::Enabled,
                SlotRole::Priority,
                SlotRole::Continuation,
            ],
            post_type_slot: true,
            vocabulary: AnswerVocabulary::default(),
            defaults: RowDefaults::default(),
        }
    }

    #[must_use]
    pub fn with_post_type_slot(mut self, post_type_slot: bool) -> Self {
        self.post_type_slot = post_type_slot;
        self
    }

    #[must_use]
    pub fn with_stop_sentinels<I, S>(mut self, sentinels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vocabulary.stop_sentinels = sentinels.into_iter().map(Into::into).collect();
        self
    }

    /// Number of answer slots per post group.
    pub fn width(&self) -> usize {
        self.slots.len()
    }

    /// Number of answer positions before the first post group.
    pub const fn header_len(&self) -> usize {
        if self.post_type_slot { 3 } else { 2 }
    }

    /// Index of `role` within a group.
    pub fn position(&self, role: SlotRole) -> Option<usize> {
        self.slots.iter().position(|r| *r == role)
    }

    pub fn has(&self, role: SlotRole) -> bool {
        self.position(role).is_some()
    }
}

/// Parses `simple`, `detailed`, or a comma separated role list such as
/// `content,media,enabled,priority,ignore,ignore,continue`.
impl FromStr for FormLayout {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "simple" => Ok(Self::simple()),
            "detailed" => Ok(Self::detailed()),
            list => {
                let slots = list
                    .split(',')
                    .map(SlotRole::from_str)
                    .collect::<Result<Vec<_>, _>>()?;
                Self::new(slots)
            }
        }
    }
}

impl fmt::Display for FormLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, role) in self.slots.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{role}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_have_expected_widths() {
        assert_eq!(FormLayout::simple().width(), 3);
        assert_eq!(FormLayout::simple().header_len(), 2);
        assert_eq!(FormLayout::detailed().width(), 5);
        assert_eq!(FormLayout::detailed().header_len(), 3);
    }

    #[test]
    fn row_defaults_hold_posts_back() {
        let defaults = RowDefaults::default();
        assert_eq!(defaults.post_type, "フォーム投稿");
        assert!(!defaults.enabled);
        assert_eq!(defaults.held_timestamp, "2030-01-01 00:00:00");
    }

    #[test]
    fn parses_custom_role_list() {
        let layout: FormLayout = "content,media,enabled,priority,ignore,ignore,continue"
            .parse()
            .unwrap();
        assert_eq!(layout.width(), 7);
        assert_eq!(layout.position(SlotRole::Continuation), Some(6));
        assert!(!layout.post_type_slot);
        assert_eq!(
            layout.to_string(),
            "content,media,enabled,priority,ignore,ignore,continue"
        );
    }

    #[test]
    fn rejects_bad_role_lists() {
        assert_eq!(
            "media,continue".parse::<FormLayout>(),
            Err(LayoutError::ContentSlots(0))
        );
        assert_eq!(
            "content,media,media".parse::<FormLayout>(),
            Err(LayoutError::DuplicateRole(SlotRole::Media))
        );
        assert_eq!(
            "content,video".parse::<FormLayout>(),
            Err(LayoutError::UnknownRole("video".into()))
        );
        assert!("content,ignore,ignore".parse::<FormLayout>().is_ok());
    }

    #[test]
    fn vocabulary_resolves_choices() {
        let v = AnswerVocabulary::default();
        assert!(v.enabled(Some("はい（投稿対象に含める）"), false));
        assert!(!v.enabled(Some("いいえ（投稿対象に含めない）"), true));
        assert!(v.enabled(None, true));
        assert!(!v.enabled(Some("maybe"), false));
        assert_eq!(v.priority(Some("高（すぐに投稿）")), PriorityTier::High);
        assert_eq!(v.priority(Some("低（後回し）")), PriorityTier::Low);
        assert_eq!(v.priority(None), PriorityTier::Normal);
        assert!(v.is_stop("✅ はい、送信する"));
        assert!(!v.is_stop("はい、もう1つ投稿を追加する"));
    }
}
