// Consent gating for actionable suggestions

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::split::split_sentences;

/// Appended to the intro when an exercise is held back
pub const CONSENT_QUESTION: &str =
    "Bạn có muốn tôi chia sẻ một số bài tập/hướng dẫn có thể giúp ích không?";

/// Phrases marking a reply as an exercise or technique suggestion
pub const EXERCISE_KEYWORDS: &[&str] = &[
    "bài tập",
    "hướng dẫn",
    "các bước",
    "phương pháp",
    "thực hành",
    "kỹ thuật thở",
    "kỹ thuật",
    "tập luyện",
    "gợi ý",
    "5-4-3-2-1",
    "thiền",
    "thư giãn",
    "nghỉ ngơi",
];

/// One case-insensitive pattern per keyword, in [`EXERCISE_KEYWORDS`] order
static KEYWORD_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    EXERCISE_KEYWORDS
        .iter()
        .map(|keyword| {
            Regex::new(&format!("(?i){}", regex::escape(keyword)))
                .expect("Failed to compile exercise keyword regex")
        })
        .collect()
});

/// A reply split into the part shown now and the part held for consent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExerciseSplit {
    pub requires_permission: bool,
    /// Intro text plus [`CONSENT_QUESTION`]; empty when nothing is held back
    pub initial_message: String,
    /// The withheld exercise text, or the whole reply when nothing is held back
    pub full_content: String,
}

impl ExerciseSplit {
    fn passthrough(reply: &str) -> Self {
        Self {
            requires_permission: false,
            initial_message: String::new(),
            full_content: reply.to_string(),
        }
    }
}

/// Find the first sentence suggesting an exercise and split the reply there.
///
/// Within that sentence the split falls on the first keyword of
/// [`EXERCISE_KEYWORDS`] it contains, not the leftmost hit. Everything before
/// it becomes the intro; the keyword and everything after it, formatting
/// intact, becomes the withheld content.
pub fn detect_exercise_suggestion(reply: &str) -> ExerciseSplit {
    let split_at = split_sentences(reply).into_iter().find_map(|sentence| {
        KEYWORD_PATTERNS
            .iter()
            .find_map(|pattern| pattern.find(sentence.text))
            .map(|hit| sentence.start + hit.start())
    });

    let Some(split_at) = split_at else {
        return ExerciseSplit::passthrough(reply);
    };

    let intro = reply[..split_at].trim();
    let content = reply[split_at..].trim();
    let initial_message = if intro.is_empty() {
        CONSENT_QUESTION.to_string()
    } else {
        format!("{} {}", intro, CONSENT_QUESTION)
    };

    ExerciseSplit {
        requires_permission: true,
        initial_message,
        full_content: content.to_string(),
    }
}
