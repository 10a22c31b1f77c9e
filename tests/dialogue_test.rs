// Integration tests for the dialogue state machine

mod common;

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

use common::{
    document, service, service_with, FixedRetriever, OfflineRetriever, ScriptedGenerator,
    StalledGenerator, EXERCISE_BODY, EXERCISE_REPLY, PLAIN_REPLY,
};
use misoul::crisis::CRISIS_BANNER;
use misoul::dialogue::{
    DialogueState, TurnRequest, DECLINE_MESSAGE, MAX_HISTORY_TURNS, WELCOME_MESSAGE,
};
use misoul::emotion::EmotionalLevel;
use misoul::errors::{ChatError, GenerationError, ValidationError};
use misoul::metrics::hash_user_id;
use misoul::segmenter::CONSENT_QUESTION;

fn level(n: i64) -> EmotionalLevel {
    EmotionalLevel::new(n).unwrap()
}

fn turn(user: &str, message: &str) -> TurnRequest {
    TurnRequest::new(user, message, level(2))
}

#[tokio::test]
async fn test_empty_message_returns_welcome() {
    let generator = ScriptedGenerator::new();
    let service = service(generator.clone());

    let outcome = service.handle_turn(turn("alice", "")).await.unwrap();

    assert_eq!(outcome.messages, vec![WELCOME_MESSAGE.to_string()]);
    assert!(!outcome.awaiting_confirmation);
    assert!(service.history("alice", 100).await.is_empty());
    assert!(generator.calls().is_empty());
}

#[tokio::test]
async fn test_whitespace_message_keeps_pending_suggestion() {
    let generator = ScriptedGenerator::new();
    generator.push_reply(EXERCISE_REPLY);
    let service = service(generator.clone());

    service
        .handle_turn(turn("alice", "Tôi thấy căng thẳng quá"))
        .await
        .unwrap();
    let outcome = service.handle_turn(turn("alice", "   ")).await.unwrap();

    assert_eq!(outcome.messages, vec![WELCOME_MESSAGE.to_string()]);
    assert!(outcome.awaiting_confirmation);
    assert_eq!(service.history("alice", 100).await.len(), 1);
}

#[tokio::test]
async fn test_empty_user_id_is_rejected() {
    let service = service(ScriptedGenerator::new());

    let err = service.handle_turn(turn("  ", "xin chào")).await.unwrap_err();
    assert!(matches!(
        err,
        ChatError::Validation(ValidationError::EmptyUserId)
    ));
}

#[tokio::test]
async fn test_crisis_message_leads_with_banner() {
    let generator = ScriptedGenerator::new();
    generator.push_reply(PLAIN_REPLY);
    let service = service(generator.clone());

    let outcome = service
        .handle_turn(TurnRequest::new("bob", "tôi muốn tự tử", level(5)))
        .await
        .unwrap();

    assert_eq!(outcome.messages[0], CRISIS_BANNER);
    assert_eq!(outcome.messages[1..], [PLAIN_REPLY.to_string()]);
    assert_eq!(service.metrics().banner_count(), 1);

    // The banner is a display message only; history stores the model reply
    let history = service.history("bob", 100).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].assistant, PLAIN_REPLY);
}

#[tokio::test]
async fn test_banner_leads_consent_gated_reply() {
    let generator = ScriptedGenerator::new();
    generator.push_reply(EXERCISE_REPLY);
    let service = service(generator.clone());

    let outcome = service
        .handle_turn(TurnRequest::new("bao", "tôi muốn tự tử", level(5)))
        .await
        .unwrap();

    assert_eq!(
        outcome.messages,
        vec![
            CRISIS_BANNER.to_string(),
            format!("Mình hiểu bạn đang căng thẳng.\n\nBạn có thể thử {}", CONSENT_QUESTION),
        ]
    );
    assert!(outcome.awaiting_confirmation);
    assert!(outcome.messages.iter().all(|m| !m.contains("Hít vào")));
    assert_eq!(service.metrics().banner_count(), 1);
}

#[tokio::test]
async fn test_banner_cooldown() {
    let generator = ScriptedGenerator::new();
    for _ in 0..6 {
        generator.push_reply(PLAIN_REPLY);
    }
    let service = service(generator.clone());

    let mut banners = Vec::new();
    for _ in 0..6 {
        let outcome = service
            .handle_turn(turn("carol", "tôi muốn tự tử"))
            .await
            .unwrap();
        banners.push(outcome.messages[0] == CRISIS_BANNER);
    }

    assert_eq!(banners, vec![true, false, false, false, false, true]);
    assert_eq!(service.metrics().banner_count(), 2);
}

#[tokio::test]
async fn test_recent_denial_suppresses_banner() {
    let generator = ScriptedGenerator::new();
    generator.push_reply(PLAIN_REPLY);
    generator.push_reply(PLAIN_REPLY);
    let service = service(generator.clone());

    service
        .handle_turn(turn("dan", "I do not intend to self-harm, just tired"))
        .await
        .unwrap();
    assert_eq!(service.metrics().banner_count(), 0);
    let outcome = service
        .handle_turn(turn("dan", "đôi khi nghĩ tới tự tử"))
        .await
        .unwrap();

    assert_ne!(outcome.messages[0], CRISIS_BANNER);
}

#[tokio::test]
async fn test_exercise_reply_is_held_for_consent() {
    let generator = ScriptedGenerator::new();
    generator.push_reply(EXERCISE_REPLY);
    let service = service(generator.clone());

    let outcome = service
        .handle_turn(turn("erin", "Tôi thấy căng thẳng quá"))
        .await
        .unwrap();

    assert!(outcome.awaiting_confirmation);
    assert_eq!(outcome.messages.len(), 1);
    assert!(outcome.messages[0].ends_with(CONSENT_QUESTION));
    assert!(!outcome.messages[0].contains("Hít vào"));
    assert_eq!(
        service.dialogue_state("erin").await,
        Some(DialogueState::AwaitingConfirmation {
            pending: EXERCISE_BODY.to_string()
        })
    );
}

#[tokio::test]
async fn test_consent_accepted_releases_exercise() {
    let generator = ScriptedGenerator::new();
    generator.push_reply(EXERCISE_REPLY);
    let service = service(generator.clone());

    let first = service
        .handle_turn(turn("erin", "Tôi thấy căng thẳng quá"))
        .await
        .unwrap();
    let outcome = service.handle_turn(turn("erin", "có")).await.unwrap();

    assert!(!outcome.awaiting_confirmation);
    assert_eq!(
        outcome.messages,
        vec![
            "bài tập thở hộp:",
            "- Hít vào bốn nhịp",
            "- Giữ bốn nhịp",
            "- Thở ra bốn nhịp",
        ]
    );
    assert_eq!(service.dialogue_state("erin").await, Some(DialogueState::Idle));

    let history = service.history("erin", 100).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].assistant, first.messages[0]);
    assert_eq!(history[1].user, "có");
    assert_eq!(history[1].assistant, EXERCISE_BODY);

    // Consent resolution never calls the model
    assert_eq!(generator.calls().len(), 1);
}

#[tokio::test]
async fn test_consent_declined() {
    let generator = ScriptedGenerator::new();
    generator.push_reply(EXERCISE_REPLY);
    let service = service(generator.clone());

    service
        .handle_turn(turn("erin", "Tôi thấy căng thẳng quá"))
        .await
        .unwrap();
    let outcome = service.handle_turn(turn("erin", "không")).await.unwrap();

    assert_eq!(outcome.messages, vec![DECLINE_MESSAGE.to_string()]);
    assert!(!outcome.awaiting_confirmation);
    assert_eq!(service.dialogue_state("erin").await, Some(DialogueState::Idle));
    assert_eq!(
        service.history("erin", 1).await[0].assistant,
        DECLINE_MESSAGE
    );
}

#[tokio::test]
async fn test_crisis_while_awaiting_consent_becomes_fresh_query() {
    let generator = ScriptedGenerator::new();
    generator.push_reply(EXERCISE_REPLY);
    generator.push_reply(PLAIN_REPLY);
    let service = service(generator.clone());

    service
        .handle_turn(turn("finn", "Tôi thấy căng thẳng quá"))
        .await
        .unwrap();
    let outcome = service
        .handle_turn(turn("finn", "có, nhưng tôi muốn tự tử"))
        .await
        .unwrap();

    assert_eq!(outcome.messages[0], CRISIS_BANNER);
    assert!(!outcome.awaiting_confirmation);
    assert_eq!(generator.calls().len(), 2);
}

#[tokio::test]
async fn test_history_stays_bounded() {
    let generator = ScriptedGenerator::new();
    for _ in 0..(MAX_HISTORY_TURNS + 4) {
        generator.push_reply(PLAIN_REPLY);
    }
    let service = service(generator.clone());

    for i in 0..(MAX_HISTORY_TURNS + 4) {
        service
            .handle_turn(turn("gia", &format!("tin nhắn số {}", i)))
            .await
            .unwrap();
        assert!(service.history("gia", usize::MAX).await.len() <= MAX_HISTORY_TURNS);
    }

    let history = service.history("gia", usize::MAX).await;
    assert_eq!(history.len(), MAX_HISTORY_TURNS);
    assert_eq!(history[0].user, "tin nhắn số 4");
}

#[tokio::test]
async fn test_generation_failure_leaves_session_untouched() {
    let generator = ScriptedGenerator::new();
    generator.push_reply(EXERCISE_REPLY);
    generator.push_failure("upstream 503");
    let service = service(generator.clone());

    service
        .handle_turn(turn("hana", "Tôi thấy căng thẳng quá"))
        .await
        .unwrap();
    let before = service.history("hana", usize::MAX).await;

    // Crisis content abandons consent and triggers a fresh generation, which fails
    let err = service
        .handle_turn(turn("hana", "tôi muốn tự tử"))
        .await
        .unwrap_err();

    match err {
        ChatError::Generation { source, messages } => {
            assert!(matches!(source, GenerationError::Provider(_)));
            assert_eq!(messages, vec![CRISIS_BANNER.to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(service.history("hana", usize::MAX).await, before);
    assert!(matches!(
        service.dialogue_state("hana").await,
        Some(DialogueState::AwaitingConfirmation { .. })
    ));
    assert_eq!(service.metrics().banner_count(), 0);
}

#[tokio::test]
async fn test_failed_turn_does_not_start_banner_cooldown() {
    let generator = ScriptedGenerator::new();
    generator.push_failure("boom");
    generator.push_reply(PLAIN_REPLY);
    let service = service(generator.clone());

    assert!(service
        .handle_turn(turn("ivy", "tôi muốn tự tử"))
        .await
        .is_err());
    let outcome = service
        .handle_turn(turn("ivy", "tôi muốn tự tử"))
        .await
        .unwrap();

    assert_eq!(outcome.messages[0], CRISIS_BANNER);
}

#[tokio::test]
async fn test_generation_timeout() {
    let service = service_with(
        Arc::new(StalledGenerator),
        Arc::new(FixedRetriever(Vec::new())),
        Duration::from_millis(50),
    );

    let err = service
        .handle_turn(turn("jay", "Hôm nay tôi mệt"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ChatError::Generation {
            source: GenerationError::Timeout { .. },
            ..
        }
    ));
    assert!(service.history("jay", usize::MAX).await.is_empty());
}

#[tokio::test]
async fn test_temperature_follows_emotional_level() {
    let generator = ScriptedGenerator::new();
    for _ in 0..3 {
        generator.push_reply(PLAIN_REPLY);
    }
    let service = service(generator.clone());

    for n in [1, 3, 5] {
        service
            .handle_turn(TurnRequest::new("kai", "Hôm nay tôi mệt", level(n)))
            .await
            .unwrap();
    }

    let temperatures: Vec<f32> = generator.calls().into_iter().map(|(_, t)| t).collect();
    assert_eq!(temperatures, vec![0.7, 0.5, 0.3]);
}

#[tokio::test]
async fn test_prompt_carries_documents_and_history() {
    let generator = ScriptedGenerator::new();
    generator.push_reply(PLAIN_REPLY);
    generator.push_reply(PLAIN_REPLY);
    let retriever = FixedRetriever(vec![document(
        "Lo âu là phản ứng tự nhiên của cơ thể trước căng thẳng.",
        "anxiety",
    )]);
    let service = service_with(
        generator.clone(),
        Arc::new(retriever),
        Duration::from_secs(5),
    );

    service
        .handle_turn(turn("lan", "Tôi hay lo lắng"))
        .await
        .unwrap();
    service
        .handle_turn(turn("lan", "Làm sao để bớt lo?"))
        .await
        .unwrap();

    let calls = generator.calls();
    let (prompt, _) = &calls[1];
    assert!(prompt.contains("Lo âu là phản ứng tự nhiên"));
    assert!(prompt.contains("Tôi hay lo lắng"));
    assert!(prompt.contains("Làm sao để bớt lo?"));
}

#[tokio::test]
async fn test_retrieval_failure_does_not_fail_turn() {
    let generator = ScriptedGenerator::new();
    generator.push_reply(PLAIN_REPLY);
    let service = service_with(
        generator.clone(),
        Arc::new(OfflineRetriever),
        Duration::from_secs(5),
    );

    let outcome = service
        .handle_turn(turn("mai", "Tôi hay lo lắng"))
        .await
        .unwrap();
    assert_eq!(outcome.messages, vec![PLAIN_REPLY.to_string()]);
}

#[tokio::test]
async fn test_clear_history() {
    let generator = ScriptedGenerator::new();
    generator.push_reply(EXERCISE_REPLY);
    let service = service(generator.clone());

    assert!(!service.clear_history("nam").await);

    service
        .handle_turn(turn("nam", "Tôi thấy căng thẳng quá"))
        .await
        .unwrap();
    assert!(service.clear_history("nam").await);

    assert!(service.history("nam", usize::MAX).await.is_empty());
    assert_eq!(service.dialogue_state("nam").await, Some(DialogueState::Idle));
    assert!(!service.clear_history("nam").await);
}

#[tokio::test]
async fn test_export_and_save_history() {
    let generator = ScriptedGenerator::new();
    generator.push_reply(PLAIN_REPLY);
    let service = service(generator.clone());
    let dir = tempfile::tempdir().unwrap();

    assert!(matches!(
        service.export_history("oanh").await,
        Err(ChatError::HistoryNotFound(_))
    ));
    assert!(matches!(
        service.save_history("oanh", dir.path()).await,
        Err(ChatError::HistoryNotFound(_))
    ));

    service
        .handle_turn(turn("oanh", "Hôm nay tôi mệt"))
        .await
        .unwrap();

    let export = service.export_history("oanh").await.unwrap();
    assert_eq!(export.user_id, "oanh");
    assert_eq!(export.turns.len(), 1);

    let path = service.save_history("oanh", &dir.path().join("saved")).await.unwrap();
    assert!(path.starts_with(dir.path().join("saved")));
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("oanh_") && name.ends_with(".json"));

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["user_id"], "oanh");
    assert_eq!(saved["turns"][0]["user"], "Hôm nay tôi mệt");
    assert_eq!(saved["turns"][0]["assistant"], PLAIN_REPLY);
}

#[tokio::test]
async fn test_sessions_are_isolated_and_serialized() {
    let generator = ScriptedGenerator::new();
    for _ in 0..8 {
        generator.push_reply(PLAIN_REPLY);
    }
    let service = Arc::new(service(generator.clone()));

    let mut tasks = Vec::new();
    for i in 0..8 {
        let service = Arc::clone(&service);
        let user = if i % 2 == 0 { "quan" } else { "rin" };
        tasks.push(tokio::spawn(async move {
            service
                .handle_turn(turn(user, &format!("tin nhắn {}", i)))
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(service.history("quan", usize::MAX).await.len(), 4);
    assert_eq!(service.history("rin", usize::MAX).await.len(), 4);
    assert_eq!(service.active_sessions(), 2);
}

/// Collects formatted log output in memory
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn test_saving_history_never_logs_user_id() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let generator = ScriptedGenerator::new();
    generator.push_reply(PLAIN_REPLY);
    let service = service(generator.clone());
    let dir = tempfile::tempdir().unwrap();
    let user_id = "thu.nguyen@example.com";

    service
        .handle_turn(turn(user_id, "Hôm nay tôi mệt"))
        .await
        .unwrap();
    let path = service.save_history(user_id, dir.path()).await.unwrap();

    let output = logs.text();
    assert!(output.contains("History saved"));
    assert!(output.contains(&hash_user_id(user_id)));
    assert!(!output.contains(user_id));
    assert!(!output.contains("thu_nguyen_example_com"));
    assert!(path.exists());
}
