// Crisis keyword detector

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::dialogue::Session;

/// Fixed emergency-resources message. Shown verbatim, never generated.
pub const CRISIS_BANNER: &str = "**KHẨN CẤP! Nếu bạn đang có ý định tự gây hại cho bản thân, \
vui lòng gọi ngay đến một trong các số điện thoại sau:**\n\
* **Tổng đài tư vấn tâm lý miễn phí: 1800-8440**\n\
* **Hotline Tư vấn và can thiệp cho người có ý định tự tử: 1800-8440**\n\
* **Trung tâm Sức khỏe Tâm thần Bạch Mai: (024) 3825.3028**\n\
* **Cứu thương: 115**";

/// History turns inspected for an explicit denial of self-harm intent
pub const DENIAL_WINDOW_TURNS: usize = 3;

/// Completed turns that must pass before the banner is shown again
pub const WARNING_COOLDOWN_TURNS: u64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrisisKeywords {
    /// Phrases that trigger the crisis banner
    pub self_harm: Vec<String>,
    /// Wider distress signals that switch the prompt into crisis mode
    #[serde(default)]
    pub distress: Vec<String>,
    /// Phrases in which the user explicitly denies self-harm intent
    #[serde(default)]
    pub denials: Vec<String>,
}

impl Default for CrisisKeywords {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            self_harm: owned(&[
                "tự tử",
                "kết thúc cuộc sống",
                "kết thúc cuộc đời",
                "chết",
                "không muốn sống",
                "không còn muốn sống",
                "tự hại",
                "tự làm đau",
                "cắt tay",
                "uống thuốc",
                "nhảy lầu",
                "treo cổ",
                "kết liễu",
                "tự giết",
                "suicide",
                "end my life",
                "kill myself",
                "cut myself",
            ]),
            distress: owned(&[
                "muốn chết",
                "kết thúc tất cả",
                "không còn ý nghĩa",
                "đau khổ quá mức",
                "không chịu nổi",
                "cứu tôi",
                "giết",
                "tôi sẽ biến mất",
                "tôi muốn biến mất",
                "quá đau đớn",
                "không thể tiếp tục",
                "tạm biệt",
                "lần cuối",
            ]),
            denials: owned(&[
                "không có ý định tự hại",
                "không tự hại",
                "i don't intend to self-harm",
                "i do not intend to self-harm",
            ]),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CrisisDetector {
    keywords: CrisisKeywords,
}

impl CrisisDetector {
    pub fn new(keywords: CrisisKeywords) -> Self {
        Self { keywords }
    }

    /// Load crisis keywords from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read crisis keywords file: {}", path.display()))?;

        let keywords: CrisisKeywords =
            serde_json::from_str(&contents).context("Failed to parse crisis keywords JSON")?;

        Ok(Self { keywords })
    }

    /// Detect self-harm content in a message
    pub fn detect(&self, message: &str) -> bool {
        match find_keyword(&self.keywords.self_harm, message) {
            Some(keyword) => {
                tracing::warn!(keyword = %keyword, "Crisis detected: self-harm keyword");
                true
            }
            None => false,
        }
    }

    /// Self-harm content or any wider distress signal.
    /// Used to decide whether the prompt carries crisis-handling instructions.
    pub fn has_crisis_indicators(&self, message: &str) -> bool {
        find_keyword(&self.keywords.self_harm, message).is_some()
            || find_keyword(&self.keywords.distress, message).is_some()
    }

    /// Decide whether the crisis banner should be shown for this message.
    ///
    /// Records the warning on the session when it returns true.
    pub fn should_warn(&self, message: &str, session: &mut Session) -> bool {
        if !self.detect(message) {
            return false;
        }

        let denied = session
            .recent(DENIAL_WINDOW_TURNS)
            .iter()
            .any(|turn| find_keyword(&self.keywords.denials, &turn.user).is_some());
        if denied {
            tracing::info!("Crisis banner skipped: user recently denied self-harm intent");
            return false;
        }

        if let Some(last) = session.last_warning_turn() {
            let elapsed = session.turns_completed().saturating_sub(last);
            if elapsed < WARNING_COOLDOWN_TURNS {
                tracing::debug!(elapsed, "Crisis banner suppressed: shown recently");
                return false;
            }
        }

        session.record_warning();
        true
    }

    /// Get all trigger keywords (for display purposes)
    pub fn all_keywords(&self) -> Vec<String> {
        let mut all = Vec::new();
        all.extend(self.keywords.self_harm.clone());
        all.extend(self.keywords.distress.clone());
        all
    }
}

fn find_keyword<'a>(keywords: &'a [String], text: &str) -> Option<&'a str> {
    let text_lower = text.to_lowercase();
    keywords
        .iter()
        .find(|keyword| text_lower.contains(&keyword.to_lowercase()))
        .map(String::as_str)
}
