// Metrics module
// Prometheus counters for dialogue turns, plus log-safe user identifiers

use anyhow::{Context, Result};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use sha2::{Digest, Sha256};

/// What a turn resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    Welcome,
    Reply,
    ConsentRequested,
    ConsentAccepted,
    ConsentDeclined,
}

impl TurnKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnKind::Welcome => "welcome",
            TurnKind::Reply => "reply",
            TurnKind::ConsentRequested => "consent_requested",
            TurnKind::ConsentAccepted => "consent_accepted",
            TurnKind::ConsentDeclined => "consent_declined",
        }
    }
}

/// Per-service metric set, registered on its own registry
#[derive(Clone)]
pub struct ChatMetrics {
    registry: Registry,
    turns: IntCounterVec,
    crisis_banners: IntCounter,
    generation_failures: IntCounterVec,
    generation_seconds: Histogram,
}

impl ChatMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let turns = IntCounterVec::new(
            Opts::new("misoul_turns_total", "Completed dialogue turns by outcome"),
            &["kind"],
        )?;
        let crisis_banners = IntCounter::new(
            "misoul_crisis_banners_total",
            "Crisis resource banners shown",
        )?;
        let generation_failures = IntCounterVec::new(
            Opts::new(
                "misoul_generation_failures_total",
                "Failed generation calls by reason",
            ),
            &["reason"],
        )?;
        let generation_seconds = Histogram::with_opts(
            HistogramOpts::new("misoul_generation_seconds", "Generation call latency")
                .buckets(vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        )?;

        registry.register(Box::new(turns.clone()))?;
        registry.register(Box::new(crisis_banners.clone()))?;
        registry.register(Box::new(generation_failures.clone()))?;
        registry.register(Box::new(generation_seconds.clone()))?;

        Ok(Self {
            registry,
            turns,
            crisis_banners,
            generation_failures,
            generation_seconds,
        })
    }

    pub fn record_turn(&self, kind: TurnKind) {
        self.turns.with_label_values(&[kind.as_str()]).inc();
    }

    pub fn record_banner(&self) {
        self.crisis_banners.inc();
    }

    pub fn record_generation_failure(&self, reason: &str) {
        self.generation_failures.with_label_values(&[reason]).inc();
    }

    pub fn observe_generation(&self, seconds: f64) {
        self.generation_seconds.observe(seconds);
    }

    pub fn turn_count(&self, kind: TurnKind) -> u64 {
        self.turns.with_label_values(&[kind.as_str()]).get()
    }

    pub fn banner_count(&self) -> u64 {
        self.crisis_banners.get()
    }

    /// Prometheus text exposition of every metric in this set
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .context("Failed to encode metrics")?;
        String::from_utf8(buffer).context("Metrics output was not UTF-8")
    }
}

/// Short stable digest of a user id, for logs
pub fn hash_user_id(user_id: &str) -> String {
    let digest = Sha256::digest(user_id.as_bytes());
    let hex = format!("{:x}", digest);
    hex[..12].to_string()
}
