// Google Gemini generateContent provider

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Generator;
use crate::config::GenerationConfig;

/// Fixed persona instruction sent with every request
pub const SYSTEM_INSTRUCTION: &str = "Bạn là MISOUL, một người bạn tâm giao với chuyên môn tâm lý sâu sắc, \
luôn trả lời bằng tiếng Việt và không lưu trữ dữ liệu người dùng.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: Content<'a>,
    generation_config: RequestGenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestGenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Gemini API provider
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    settings: GenerationConfig,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: &str, settings: GenerationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            model: model_name(model),
            settings,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn build_request<'a>(&self, prompt: &'a str, temperature: f32) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![RequestPart { text: prompt }],
            }],
            system_instruction: Content {
                role: None,
                parts: vec![RequestPart {
                    text: SYSTEM_INSTRUCTION,
                }],
            },
            generation_config: RequestGenerationConfig {
                temperature,
                top_p: self.settings.top_p,
                top_k: self.settings.top_k,
                max_output_tokens: self.settings.max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl Generator for GeminiProvider {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        let request = self.build_request(prompt, temperature);

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({}): {}", status, error_text.trim());
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse Gemini API response")?;

        extract_text(&body)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

fn model_name(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

fn extract_text(body: &GenerateContentResponse) -> Result<String> {
    let text = body
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        anyhow::bail!("No response text from Gemini");
    }

    Ok(text)
}
