// Dialogue turn orchestration
//
// One turn: consent resolution or fresh query → crisis check → retrieval →
// prompt → generation (bounded by a timeout) → consent gating/segmentation →
// history update. The session lock is held for the whole turn and the
// session is only written back once the turn has succeeded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;

use super::session::{DialogueState, Session, Turn};
use super::store::SessionStore;
use crate::crisis::{CrisisDetector, CRISIS_BANNER};
use crate::emotion::{BiometricSnapshot, EmotionalLevel};
use crate::errors::{ChatError, GenerationError, ValidationError};
use crate::metrics::{hash_user_id, ChatMetrics, TurnKind};
use crate::prompt::{emotion_guidelines, PromptComposer, PromptInput, PROMPT_HISTORY_TURNS};
use crate::providers::Generator;
use crate::retrieval::{retrieve_or_empty, Retriever};
use crate::segmenter::{detect_exercise_suggestion, segment};

pub const WELCOME_MESSAGE: &str =
    "Xin chào! Tôi là MISOUL, người bạn đồng hành hỗ trợ sức khỏe tâm lý. Tôi có thể giúp gì cho bạn hôm nay?";

pub const DECLINE_MESSAGE: &str =
    "Không vấn đề. Nếu bạn cần bất kỳ hỗ trợ nào khác, hãy cho tôi biết nhé.";

/// Replies accepted as consent, matched as case-insensitive substrings
pub const AFFIRMATIVE_REPLIES: &[&str] = &[
    "có", "ừ", "đồng ý", "ok", "okk", "được", "vâng", "yes", "sure", "👍",
];

/// Tunables for the chat service
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Documents retrieved per fresh query
    pub top_k: usize,
    /// Upper bound on one generation call
    pub generation_timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            generation_timeout: Duration::from_secs(30),
        }
    }
}

/// One inbound message
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub user_id: String,
    pub message: String,
    pub level: EmotionalLevel,
    /// Falls back to [`BiometricSnapshot::for_level`] when absent
    pub biometrics: Option<BiometricSnapshot>,
}

impl TurnRequest {
    pub fn new(user_id: impl Into<String>, message: impl Into<String>, level: EmotionalLevel) -> Self {
        Self {
            user_id: user_id.into(),
            message: message.into(),
            level,
            biometrics: None,
        }
    }

    pub fn with_biometrics(mut self, biometrics: BiometricSnapshot) -> Self {
        self.biometrics = Some(biometrics);
        self
    }
}

/// What the caller shows for a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnOutcome {
    /// Display messages, in order. A crisis banner, when shown, comes first.
    pub messages: Vec<String>,
    pub awaiting_confirmation: bool,
}

/// Serializable snapshot of a user's conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryExport {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub turns: Vec<Turn>,
}

pub struct ChatService {
    generator: Arc<dyn Generator>,
    retriever: Arc<dyn Retriever>,
    detector: CrisisDetector,
    composer: PromptComposer,
    sessions: SessionStore,
    metrics: ChatMetrics,
    settings: ServiceSettings,
}

impl ChatService {
    pub fn new(
        generator: Arc<dyn Generator>,
        retriever: Arc<dyn Retriever>,
        detector: CrisisDetector,
        metrics: ChatMetrics,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            generator,
            retriever,
            composer: PromptComposer::new(detector.clone()),
            detector,
            sessions: SessionStore::new(),
            metrics,
            settings,
        }
    }

    pub fn metrics(&self) -> &ChatMetrics {
        &self.metrics
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Process one user message
    pub async fn handle_turn(&self, request: TurnRequest) -> Result<TurnOutcome, ChatError> {
        if request.user_id.trim().is_empty() {
            return Err(ValidationError::EmptyUserId.into());
        }
        let user = hash_user_id(&request.user_id);

        if request.message.trim().is_empty() {
            let awaiting = match self.sessions.get(&request.user_id) {
                Some(handle) => handle.lock().await.is_awaiting_confirmation(),
                None => false,
            };
            self.metrics.record_turn(TurnKind::Welcome);
            tracing::debug!(user = %user, "Empty message, sending welcome");
            return Ok(TurnOutcome {
                messages: vec![WELCOME_MESSAGE.to_string()],
                awaiting_confirmation: awaiting,
            });
        }

        let handle = self.sessions.get_or_create(&request.user_id);
        let mut stored = handle.lock().await;
        let mut working = stored.clone();

        let (kind, messages) = match self.resolve_pending(&request.message, &mut working) {
            Some(resolved) => resolved,
            None => self.fresh_query(&request, &mut working, &user).await?,
        };

        working.touch();
        *stored = working;
        self.metrics.record_turn(kind);
        tracing::info!(
            user = %user,
            emotional_level = %request.level,
            outcome = kind.as_str(),
            messages = messages.len(),
            history = stored.history().len(),
            "Turn completed"
        );

        Ok(TurnOutcome {
            messages,
            awaiting_confirmation: stored.is_awaiting_confirmation(),
        })
    }

    /// Settle a pending suggestion with the user's reply.
    ///
    /// Returns `None` when the message must be handled as a fresh query: no
    /// suggestion is pending, or the message carries self-harm content, in
    /// which case the suggestion is dropped.
    fn resolve_pending(
        &self,
        message: &str,
        session: &mut Session,
    ) -> Option<(TurnKind, Vec<String>)> {
        if !session.is_awaiting_confirmation() {
            return None;
        }
        if self.detector.detect(message) {
            session.take_pending();
            tracing::info!("Pending suggestion dropped: crisis content while awaiting consent");
            return None;
        }

        let pending = session.take_pending()?;
        if is_affirmative(message) {
            let messages = segment(&pending);
            session.push_turn(message.to_string(), pending);
            Some((TurnKind::ConsentAccepted, messages))
        } else {
            session.push_turn(message.to_string(), DECLINE_MESSAGE.to_string());
            Some((TurnKind::ConsentDeclined, vec![DECLINE_MESSAGE.to_string()]))
        }
    }

    async fn fresh_query(
        &self,
        request: &TurnRequest,
        session: &mut Session,
        user: &str,
    ) -> Result<(TurnKind, Vec<String>), ChatError> {
        let message = request.message.as_str();
        let level = request.level;

        let banner = self.detector.should_warn(message, session);
        let documents = retrieve_or_empty(
            self.retriever.as_ref(),
            message,
            level,
            self.settings.top_k,
        )
        .await;

        let biometrics = request
            .biometrics
            .unwrap_or_else(|| BiometricSnapshot::for_level(level));
        let guidelines = emotion_guidelines(level, banner);
        let prompt = {
            let history = session.recent(PROMPT_HISTORY_TURNS);
            self.composer.compose(&PromptInput {
                message,
                level,
                biometrics: &biometrics,
                documents: &documents,
                history: &history,
                extra_guidelines: &guidelines,
            })
        };

        let mut messages = Vec::new();
        if banner {
            messages.push(CRISIS_BANNER.to_string());
        }

        let temperature = level.temperature();
        let reply = match self.generate(&prompt, temperature, user).await {
            Ok(reply) => reply,
            Err(source) => return Err(ChatError::Generation { source, messages }),
        };

        if banner {
            self.metrics.record_banner();
        }

        let split = detect_exercise_suggestion(&reply);
        if split.requires_permission {
            messages.push(split.initial_message.clone());
            session.push_turn(message.to_string(), split.initial_message);
            session.set_pending(split.full_content);
            Ok((TurnKind::ConsentRequested, messages))
        } else {
            messages.extend(segment(&reply));
            session.push_turn(message.to_string(), reply);
            Ok((TurnKind::Reply, messages))
        }
    }

    /// Call the generator under the configured deadline
    async fn generate(
        &self,
        prompt: &str,
        temperature: f32,
        user: &str,
    ) -> Result<String, GenerationError> {
        let after = self.settings.generation_timeout;
        let start = Instant::now();

        let result = tokio::time::timeout(after, self.generator.generate(prompt, temperature)).await;
        let elapsed = start.elapsed();

        let outcome = match result {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => Err(GenerationError::Provider(e)),
            Err(_) => Err(GenerationError::Timeout { after }),
        };

        match &outcome {
            Ok(_) => {
                self.metrics.observe_generation(elapsed.as_secs_f64());
                tracing::debug!(
                    user = %user,
                    provider = self.generator.name(),
                    temperature,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Generation succeeded"
                );
            }
            Err(e) => {
                self.metrics.record_generation_failure(e.reason());
                tracing::error!(
                    user = %user,
                    provider = self.generator.name(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Generation failed: {:#}",
                    e
                );
            }
        }

        outcome
    }

    /// Drop a user's history and pending suggestion.
    /// Returns false if there was nothing to clear.
    pub async fn clear_history(&self, user_id: &str) -> bool {
        let Some(handle) = self.sessions.get(user_id) else {
            return false;
        };
        let mut session = handle.lock().await;
        if !session.has_history() {
            return false;
        }
        session.clear();
        tracing::info!(user = %hash_user_id(user_id), "History cleared");
        true
    }

    /// The last `max_items` turns, oldest first
    pub async fn history(&self, user_id: &str, max_items: usize) -> Vec<Turn> {
        match self.sessions.get(user_id) {
            Some(handle) => handle
                .lock()
                .await
                .recent(max_items)
                .into_iter()
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }

    pub async fn dialogue_state(&self, user_id: &str) -> Option<DialogueState> {
        let handle = self.sessions.get(user_id)?;
        let state = handle.lock().await.state().clone();
        Some(state)
    }

    pub async fn export_history(&self, user_id: &str) -> Result<HistoryExport, ChatError> {
        let turns = self.history(user_id, usize::MAX).await;
        if turns.is_empty() {
            return Err(ChatError::HistoryNotFound(user_id.to_string()));
        }
        Ok(HistoryExport {
            user_id: user_id.to_string(),
            timestamp: Utc::now(),
            turns,
        })
    }

    /// Write the user's history as pretty JSON into `dir`, returning the file path
    pub async fn save_history(&self, user_id: &str, dir: &Path) -> Result<PathBuf, ChatError> {
        let export = self.export_history(user_id).await?;
        let file_name = format!(
            "{}_{}.json",
            file_safe(user_id),
            export.timestamp.format("%Y%m%d_%H%M%S")
        );
        let path = dir.join(file_name);

        write_export(&export, dir, &path).map_err(ChatError::Storage)?;
        tracing::info!(user = %hash_user_id(user_id), dir = %dir.display(), "History saved");
        Ok(path)
    }
}

fn write_export(export: &HistoryExport, dir: &Path, path: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create history directory: {}", dir.display()))?;
    let json = serde_json::to_string_pretty(export).context("Failed to serialize history")?;
    // The file name is derived from the user id; keep it out of error text
    fs::write(path, json)
        .with_context(|| format!("Failed to write history file in {}", dir.display()))?;
    Ok(())
}

pub fn is_affirmative(message: &str) -> bool {
    let message = message.to_lowercase();
    AFFIRMATIVE_REPLIES.iter().any(|reply| message.contains(reply))
}

/// User ids end up in file names; keep them to a portable character set
fn file_safe(user_id: &str) -> String {
    user_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
