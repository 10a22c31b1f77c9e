// In-memory knowledge base with term-overlap ranking

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::{RetrievedDocument, Retriever};

/// Score added to documents in a hinted category
pub const CATEGORY_BOOST: f32 = 0.5;

const SEED_CORPUS: &[(&str, &str)] = &[
    ("anxiety", "Lo âu là phản ứng tự nhiên của cơ thể đối với stress. Đó là cảm giác sợ hãi hoặc lo lắng về những gì sắp xảy ra."),
    ("anxiety", "Các triệu chứng lo âu bao gồm: tim đập nhanh, khó thở, lo lắng quá mức, khó tập trung, mất ngủ và căng thẳng."),
    ("anxiety", "Kỹ thuật thở sâu có thể giúp giảm lo âu: hít vào trong 4 giây, giữ trong 7 giây, và thở ra trong 8 giây."),
    ("anxiety", "Tập thể dục đều đặn giúp giảm lo âu bằng cách giải phóng endorphin và cải thiện tâm trạng."),
    ("anxiety", "Thiền và mindfulness là các kỹ thuật hiệu quả để kiểm soát lo âu dài hạn."),
    ("depression", "Trầm cảm là rối loạn tâm trạng gây ra cảm giác buồn bã và mất hứng thú kéo dài, ảnh hưởng đến khả năng hoạt động hàng ngày."),
    ("depression", "Các triệu chứng trầm cảm bao gồm: buồn bã kéo dài, mất hứng thú, mệt mỏi, khó tập trung, thay đổi cảm giác đói và giấc ngủ."),
    ("depression", "Liệu pháp nhận thức hành vi (CBT) giúp nhận diện và thay đổi các mẫu suy nghĩ tiêu cực liên quan đến trầm cảm."),
    ("depression", "Kết nối xã hội và chia sẻ cảm xúc với người khác có thể giúp giảm cảm giác cô đơn và cải thiện tâm trạng."),
    ("depression", "Thiết lập mục tiêu nhỏ và đạt được chúng là cách hiệu quả để xây dựng lại cảm giác thành công và giá trị bản thân."),
    ("cbt_techniques", "Liệu pháp Nhận thức Hành vi (CBT) tập trung vào nhận diện và thay đổi các mẫu suy nghĩ và hành vi tiêu cực."),
    ("cbt_techniques", "Kỹ thuật ABC trong CBT: A (Sự kiện kích hoạt), B (Niềm tin/suy nghĩ), C (Hậu quả cảm xúc) giúp hiểu mối liên hệ giữa suy nghĩ và cảm xúc."),
    ("cbt_techniques", "Nhật ký suy nghĩ là công cụ CBT giúp ghi lại và thách thức các suy nghĩ tiêu cực tự động."),
    ("cbt_techniques", "Kỹ thuật khởi tạo hành vi là phương pháp CBT giúp tăng cường các hoạt động tích cực để cải thiện tâm trạng."),
    ("cbt_techniques", "Kỹ thuật giải quyết vấn đề trong CBT gồm: xác định vấn đề, liệt kê giải pháp, đánh giá và chọn giải pháp tốt nhất, thực hiện, đánh giá kết quả."),
    ("mindfulness", "Mindfulness là việc chú ý có ý thức vào thời điểm hiện tại, không phán xét các suy nghĩ và cảm xúc đang diễn ra."),
    ("mindfulness", "Meditation hơi thở cơ bản: tập trung vào hơi thở, khi tâm trí lang thang, nhẹ nhàng đưa sự chú ý trở lại hơi thở."),
    ("mindfulness", "Body scan là kỹ thuật mindfulness giúp nâng cao nhận thức về cơ thể bằng cách di chuyển sự chú ý từng phần của cơ thể."),
    ("mindfulness", "Eating meditation là thực hành mindfulness khi ăn, chú ý đến mùi vị, kết cấu và cảm giác khi ăn thức ăn."),
    ("mindfulness", "Walking meditation là thực hành chú ý đến từng bước chân, cảm giác của chân tiếp xúc với mặt đất khi đi bộ."),
    ("crisis", "Trong trường hợp khủng hoảng tâm lý nghiêm trọng, điều quan trọng là tìm kiếm sự giúp đỡ chuyên nghiệp ngay lập tức."),
    ("crisis", "Tổng đài tư vấn tâm lý miễn phí 1800-8440 hoạt động 24/7 để hỗ trợ trong trường hợp khủng hoảng."),
    ("crisis", "Khi có ý nghĩ tự hại, hãy ở bên cạnh người thân hoặc bạn bè, không nên ở một mình."),
    ("crisis", "Kỹ thuật grounding 5-4-3-2-1: xác định 5 thứ bạn thấy, 4 thứ bạn chạm, 3 thứ bạn nghe, 2 thứ bạn ngửi, 1 thứ bạn nếm."),
    ("crisis", "Trong trường hợp khẩn cấp, hãy gọi cứu thương (115) hoặc đến phòng cấp cứu gần nhất."),
];

/// One stored snippet, as read from a knowledge file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub text: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone)]
struct IndexedEntry {
    entry: KnowledgeEntry,
    terms: HashSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: Vec<IndexedEntry>,
}

impl KnowledgeBase {
    pub fn new(entries: Vec<KnowledgeEntry>) -> Self {
        let entries = entries
            .into_iter()
            .filter(|entry| !entry.text.trim().is_empty())
            .map(|entry| IndexedEntry {
                terms: terms(&entry.text),
                entry,
            })
            .collect();
        Self { entries }
    }

    /// Built-in psycho-education snippets in five categories
    pub fn seeded() -> Self {
        Self::new(
            SEED_CORPUS
                .iter()
                .map(|(category, text)| KnowledgeEntry {
                    text: text.to_string(),
                    category: Some(category.to_string()),
                })
                .collect(),
        )
    }

    /// Load entries from a JSON array of `{"text", "category"}` objects
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read knowledge file: {}", path.display()))?;

        let entries: Vec<KnowledgeEntry> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse knowledge file: {}", path.display()))?;

        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rank by the share of query terms found in each entry, boosting hinted categories.
    /// Entries with neither overlap nor a category hint are never returned.
    pub fn rank(&self, query: &str, top_k: usize, categories: &[&str]) -> Vec<RetrievedDocument> {
        let query_terms = terms(query);
        if query_terms.is_empty() && categories.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(f32, &KnowledgeEntry)> = self
            .entries
            .iter()
            .filter_map(|indexed| {
                let overlap = query_terms.intersection(&indexed.terms).count();
                let mut score = if query_terms.is_empty() {
                    0.0
                } else {
                    overlap as f32 / query_terms.len() as f32
                };
                let hinted = indexed
                    .entry
                    .category
                    .as_deref()
                    .is_some_and(|c| categories.contains(&c));
                if hinted {
                    score += CATEGORY_BOOST;
                }
                (score > 0.0).then_some((score, &indexed.entry))
            })
            .collect();

        // Stable sort keeps corpus order among ties
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored
            .into_iter()
            .take(top_k)
            .map(|(score, entry)| RetrievedDocument {
                text: entry.text.clone(),
                category: entry.category.clone(),
                score,
            })
            .collect()
    }
}

#[async_trait]
impl Retriever for KnowledgeBase {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        categories: &[&str],
    ) -> Result<Vec<RetrievedDocument>> {
        Ok(self.rank(query, top_k, categories))
    }

    fn name(&self) -> &str {
        "knowledge-base"
    }
}

/// Lowercased word set; single characters carry no signal
fn terms(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() > 1)
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_seed_corpus_covers_five_categories() {
        let kb = KnowledgeBase::seeded();
        assert_eq!(kb.len(), 25);

        let categories: HashSet<_> = kb
            .entries
            .iter()
            .filter_map(|e| e.entry.category.clone())
            .collect();
        assert_eq!(categories.len(), 5);
    }

    #[test]
    fn test_overlap_ranks_relevant_entry_first() {
        let kb = KnowledgeBase::seeded();
        let docs = kb.rank("nhật ký suy nghĩ tiêu cực", 3, &[]);

        assert!(!docs.is_empty());
        assert!(docs[0].text.starts_with("Nhật ký suy nghĩ"));
        assert!(docs.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_category_hint_boosts_matching_entries() {
        let kb = KnowledgeBase::new(vec![
            KnowledgeEntry {
                text: "hít thở chậm".to_string(),
                category: Some("anxiety".to_string()),
            },
            KnowledgeEntry {
                text: "hít thở đều".to_string(),
                category: Some("mindfulness".to_string()),
            },
        ]);

        let docs = kb.rank("hít thở", 2, &["mindfulness"]);
        assert_eq!(docs[0].category.as_deref(), Some("mindfulness"));
        assert_eq!(docs[0].score, 1.0 + CATEGORY_BOOST);
        assert_eq!(docs[1].score, 1.0);
    }

    #[test]
    fn test_unrelated_query_without_hints_returns_nothing() {
        let kb = KnowledgeBase::seeded();
        assert!(kb.rank("xyz qwerty", 3, &[]).is_empty());
        assert!(KnowledgeBase::default().rank("lo âu", 3, &["anxiety"]).is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"text": "Ngủ đủ giấc rất quan trọng", "category": "sleep"}}, {{"text": "  "}}]"#
        )
        .unwrap();

        let kb = KnowledgeBase::load_from_file(file.path()).unwrap();
        assert_eq!(kb.len(), 1);
        let docs = kb.rank("giấc ngủ", 1, &[]);
        assert_eq!(docs[0].category.as_deref(), Some("sleep"));
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        assert!(KnowledgeBase::load_from_file(Path::new("/nonexistent/kb.json")).is_err());
    }
}
