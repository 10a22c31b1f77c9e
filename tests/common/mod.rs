// Shared fakes for integration tests

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use misoul::crisis::CrisisDetector;
use misoul::dialogue::{ChatService, ServiceSettings};
use misoul::metrics::ChatMetrics;
use misoul::providers::Generator;
use misoul::retrieval::{RetrievedDocument, Retriever};

pub const PLAIN_REPLY: &str = "Mình luôn ở đây lắng nghe bạn. Bạn có muốn kể thêm về ngày hôm nay không?";

pub const EXERCISE_REPLY: &str = "Mình hiểu bạn đang căng thẳng.\n\nBạn có thể thử bài tập thở hộp:\n- Hít vào bốn nhịp\n- Giữ bốn nhịp\n- Thở ra bốn nhịp";

pub const EXERCISE_BODY: &str = "bài tập thở hộp:\n- Hít vào bốn nhịp\n- Giữ bốn nhịp\n- Thở ra bốn nhịp";

/// Replies from a queue; fails once the queue is empty
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<(String, f32)>>,
}

impl ScriptedGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_reply(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    pub fn push_failure(&self, error: &str) {
        self.replies.lock().unwrap().push_back(Err(error.to_string()));
    }

    pub fn calls(&self) -> Vec<(String, f32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), temperature));
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(error)) => Err(anyhow::anyhow!(error)),
            None => Err(anyhow::anyhow!("no scripted reply left")),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Never answers within any reasonable deadline
pub struct StalledGenerator;

#[async_trait]
impl Generator for StalledGenerator {
    async fn generate(&self, _prompt: &str, _temperature: f32) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(PLAIN_REPLY.to_string())
    }

    fn name(&self) -> &str {
        "stalled"
    }
}

/// Returns the same documents for every query
pub struct FixedRetriever(pub Vec<RetrievedDocument>);

#[async_trait]
impl Retriever for FixedRetriever {
    async fn search(
        &self,
        _query: &str,
        top_k: usize,
        _categories: &[&str],
    ) -> Result<Vec<RetrievedDocument>> {
        Ok(self.0.iter().take(top_k).cloned().collect())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

pub struct OfflineRetriever;

#[async_trait]
impl Retriever for OfflineRetriever {
    async fn search(&self, _: &str, _: usize, _: &[&str]) -> Result<Vec<RetrievedDocument>> {
        anyhow::bail!("vector store unreachable")
    }

    fn name(&self) -> &str {
        "offline"
    }
}

pub fn document(text: &str, category: &str) -> RetrievedDocument {
    RetrievedDocument {
        text: text.to_string(),
        category: Some(category.to_string()),
        score: 1.0,
    }
}

pub fn service_with(
    generator: Arc<dyn Generator>,
    retriever: Arc<dyn Retriever>,
    timeout: Duration,
) -> ChatService {
    ChatService::new(
        generator,
        retriever,
        CrisisDetector::default(),
        ChatMetrics::new().unwrap(),
        ServiceSettings {
            top_k: 3,
            generation_timeout: timeout,
        },
    )
}

pub fn service(generator: Arc<ScriptedGenerator>) -> ChatService {
    service_with(
        generator,
        Arc::new(FixedRetriever(Vec::new())),
        Duration::from_secs(5),
    )
}
