// Prompt composition
//
// Builds the single instruction string sent to the generation provider.
// Section order is fixed; the model relies on it and tests pin it.

use super::templates::*;
use crate::crisis::CrisisDetector;
use crate::dialogue::Turn;
use crate::emotion::{BiometricSnapshot, EmotionalLevel};
use crate::retrieval::RetrievedDocument;

/// History turns included in the prompt
pub const PROMPT_HISTORY_TURNS: usize = 3;
/// Max characters of a past assistant reply in the prompt
pub const HISTORY_REPLY_CHARS: usize = 150;
/// Max characters of a retrieved document in the prompt
pub const DOCUMENT_CHARS: usize = 300;

const UNCATEGORIZED: &str = "không phân loại";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Role,
    Tone,
    Biometrics,
    History,
    Documents,
    Formatting,
    ExtraGuidelines,
    CrisisNotice,
    UserMessage,
}

#[derive(Debug, Clone)]
pub struct PromptSection {
    pub kind: SectionKind,
    pub text: String,
}

/// Everything a prompt is composed from
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub message: &'a str,
    pub level: EmotionalLevel,
    pub biometrics: &'a BiometricSnapshot,
    pub documents: &'a [RetrievedDocument],
    /// Oldest first; only the last few are used
    pub history: &'a [&'a Turn],
    pub extra_guidelines: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct PromptComposer {
    detector: CrisisDetector,
}

impl PromptComposer {
    pub fn new(detector: CrisisDetector) -> Self {
        Self { detector }
    }

    /// Crisis mode: lexical distress signal in the message, or a severe level
    pub fn crisis_mode(&self, message: &str, level: EmotionalLevel) -> bool {
        self.detector.has_crisis_indicators(message) || level.is_severe()
    }

    pub fn compose(&self, input: &PromptInput<'_>) -> String {
        self.sections(input)
            .into_iter()
            .map(|section| section.text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// The prompt as ordered sections; empty optional sections are omitted
    pub fn sections(&self, input: &PromptInput<'_>) -> Vec<PromptSection> {
        let crisis = self.crisis_mode(input.message, input.level);
        let mut sections = Vec::with_capacity(9);
        let mut push = |kind, text: String| sections.push(PromptSection { kind, text });

        let mut role = ROLE.to_string();
        if crisis {
            role.push_str("\n\n");
            role.push_str(CRISIS_GUIDANCE);
        }
        push(SectionKind::Role, role);

        push(SectionKind::Tone, tone_guidance(input.level).to_string());
        push(SectionKind::Biometrics, biometric_block(input.level, input.biometrics));

        if let Some(history) = history_block(input.history) {
            push(SectionKind::History, history);
        }
        if let Some(documents) = documents_block(input.documents) {
            push(SectionKind::Documents, documents);
        }

        push(SectionKind::Formatting, FORMATTING.to_string());

        if !input.extra_guidelines.trim().is_empty() {
            push(
                SectionKind::ExtraGuidelines,
                format!("{}\n{}", EXTRA_GUIDELINES_HEADER, input.extra_guidelines.trim()),
            );
        }
        if crisis {
            push(SectionKind::CrisisNotice, CRISIS_NOTICE.to_string());
        }

        push(
            SectionKind::UserMessage,
            format!("{} {}", USER_MESSAGE_HEADER, input.message),
        );

        sections
    }
}

/// Level-specific response rules passed as extra guidelines
pub fn emotion_guidelines(level: EmotionalLevel, banner_shown: bool) -> String {
    let tier = match level.get() {
        4..=5 => GUIDELINE_SEVERE,
        3 => GUIDELINE_MODERATE,
        _ => GUIDELINE_MILD,
    };
    let mut guidelines = format!("{}\n{}", GUIDELINES_BASE, tier);
    if banner_shown {
        guidelines.push('\n');
        guidelines.push_str(GUIDELINES_BANNER_SHOWN);
    }
    guidelines
}

fn tone_guidance(level: EmotionalLevel) -> &'static str {
    TONE_TIERS
        .get(usize::from(level.get()).saturating_sub(1))
        .copied()
        .unwrap_or(TONE_TIERS[0])
}

fn biometric_block(level: EmotionalLevel, bio: &BiometricSnapshot) -> String {
    format!(
        "{header}\n\
        - Trạng thái cảm xúc: {label} (Mức {level}/5)\n\
        - Nhịp tim: {hr} BPM (Bình thường: 60-100 BPM)\n\
        - Biến thiên nhịp tim (HRV): {hrv} ms (HRV thấp có thể chỉ báo căng thẳng cao)\n\
        - Chất lượng giấc ngủ: {sleep}/100 (>70 là tốt, <50 là kém)\n\
        {footer}",
        header = BIOMETRIC_HEADER,
        label = level.label(),
        level = level,
        hr = bio.heart_rate,
        hrv = bio.hrv,
        sleep = bio.sleep_quality,
        footer = BIOMETRIC_FOOTER,
    )
}

fn history_block(history: &[&Turn]) -> Option<String> {
    if history.is_empty() {
        return None;
    }
    let start = history.len().saturating_sub(PROMPT_HISTORY_TURNS);
    let mut block = HISTORY_HEADER.to_string();
    for turn in &history[start..] {
        block.push_str(&format!(
            "\nNgười dùng: {}\nMISOUL: {}\n",
            turn.user,
            truncate_chars(&turn.assistant, HISTORY_REPLY_CHARS)
        ));
    }
    Some(block.trim_end().to_string())
}

fn documents_block(documents: &[RetrievedDocument]) -> Option<String> {
    if documents.is_empty() {
        return None;
    }
    let mut block = DOCUMENTS_HEADER.to_string();
    for (i, doc) in documents.iter().enumerate() {
        block.push_str(&format!(
            "\nTài liệu {} (Danh mục: {}):\n{}\n",
            i + 1,
            doc.category.as_deref().unwrap_or(UNCATEGORIZED),
            truncate_chars(&doc.text, DOCUMENT_CHARS)
        ));
    }
    Some(block.trim_end().to_string())
}

/// Cut to at most `max` characters, marking the cut with "..."
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
