// Configuration structs

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Placeholder service key shipped in sample `.env` files; treated as "auth off".
pub const PLACEHOLDER_SERVICE_KEY: &str = "misoul_test_key";

pub const DEFAULT_MODEL: &str = "models/gemini-1.5-flash";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct Config {
    /// Google Generative Language API key
    pub google_api_key: String,

    /// Gemini model name, with or without the `models/` prefix
    pub model: String,

    /// Decoding and transport settings for the generation call
    pub generation: GenerationConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// Optional JSON file with `{text, category}` knowledge snippets
    pub knowledge_path: Option<PathBuf>,

    /// Documents retrieved per turn
    pub top_k: usize,

    /// Optional JSON override for the crisis keyword lists
    pub crisis_keywords_path: Option<PathBuf>,

    /// Append logs to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn new(google_api_key: String) -> Self {
        Self {
            google_api_key,
            model: DEFAULT_MODEL.to_string(),
            generation: GenerationConfig::default(),
            server: ServerConfig::default(),
            knowledge_path: None,
            top_k: 3,
            crisis_keywords_path: None,
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Upper bound for one generation call, in seconds
    pub timeout_secs: u64,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
    /// API root, overridable for proxies and tests
    pub base_url: String,
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_output_tokens: 1024,
            top_p: 0.95,
            top_k: 64,
            base_url: DEFAULT_GEMINI_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:5000")
    pub bind_address: String,
    /// Bearer token clients must present; `None` disables the check
    pub api_key: Option<String>,
    /// Where `/api/save_history` writes conversation exports
    pub history_dir: PathBuf,
}

impl ServerConfig {
    /// Effective bearer token, ignoring the placeholder key
    pub fn required_token(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty() && *key != PLACEHOLDER_SERVICE_KEY)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            api_key: None,
            history_dir: PathBuf::from("data/conversation_history"),
        }
    }
}
