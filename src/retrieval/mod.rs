// Document retrieval for prompt grounding
//
// The dialogue core only needs ranked snippets with a category label.
// Retrieval is best-effort: an unavailable index degrades to no documents.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod knowledge;

pub use knowledge::{KnowledgeBase, KnowledgeEntry, CATEGORY_BOOST};

use crate::emotion::EmotionalLevel;

/// A snippet returned by a retriever
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub text: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub score: f32,
}

/// Source of reference snippets for a query
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `top_k` documents, best first. `categories` are soft hints.
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        categories: &[&str],
    ) -> Result<Vec<RetrievedDocument>>;

    fn name(&self) -> &str;
}

const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "anxiety",
        &["lo âu", "căng thẳng", "lo lắng", "sợ hãi", "panic", "hồi hộp", "khó thở"],
    ),
    (
        "depression",
        &["buồn", "trầm cảm", "tuyệt vọng", "mệt mỏi", "chán nản", "cô đơn", "không vui", "không muốn"],
    ),
    (
        "cbt_techniques",
        &["suy nghĩ", "nhận thức", "hành vi", "kỹ thuật", "cbt", "liệu pháp", "thay đổi"],
    ),
    (
        "mindfulness",
        &["chánh niệm", "thiền", "thư giãn", "hít thở", "tập trung", "ý thức", "bình tĩnh"],
    ),
];

/// Categories suggested by the query's wording, or by the level when nothing matches
pub fn infer_categories(query: &str, level: EmotionalLevel) -> Vec<&'static str> {
    let query = query.to_lowercase();
    let matched: Vec<&'static str> = CATEGORY_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| query.contains(k)))
        .map(|(category, _)| *category)
        .collect();

    if !matched.is_empty() {
        return matched;
    }
    match level.get() {
        4..=5 => vec!["depression", "anxiety"],
        3 => vec!["anxiety", "cbt_techniques"],
        _ => vec!["mindfulness", "cbt_techniques"],
    }
}

/// Search, degrading any retriever failure to an empty document set
pub async fn retrieve_or_empty(
    retriever: &dyn Retriever,
    query: &str,
    level: EmotionalLevel,
    top_k: usize,
) -> Vec<RetrievedDocument> {
    let categories = infer_categories(query, level);
    match retriever.search(query, top_k, &categories).await {
        Ok(mut documents) => {
            documents.truncate(top_k);
            tracing::debug!(
                retriever = retriever.name(),
                count = documents.len(),
                ?categories,
                "Retrieved documents"
            );
            documents
        }
        Err(e) => {
            tracing::warn!(retriever = retriever.name(), "Retrieval unavailable: {:#}", e);
            Vec::new()
        }
    }
}
