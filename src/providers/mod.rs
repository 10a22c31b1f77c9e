// Text generation providers
//
// The dialogue core sees one narrow interface: a prompt and a sampling
// temperature in, generated text or an error out.

use anyhow::Result;
use async_trait::async_trait;

mod gemini;

pub use gemini::{GeminiProvider, SYSTEM_INSTRUCTION};

/// Trait for text generation backends
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a complete reply for `prompt`
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String>;

    /// Provider name for logs and metrics (e.g., "gemini")
    fn name(&self) -> &str;
}
