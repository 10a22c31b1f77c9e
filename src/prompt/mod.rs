// Prompt construction for the generation provider

mod composer;
pub mod templates;

pub use composer::{
    emotion_guidelines, truncate_chars, PromptComposer, PromptInput, PromptSection, SectionKind,
    DOCUMENT_CHARS, HISTORY_REPLY_CHARS, PROMPT_HISTORY_TURNS,
};
