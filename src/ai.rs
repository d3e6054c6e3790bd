use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::AiConfig;

/// Client for the AI provider. Every capability is one POST to a
/// task-specific path with a JSON body and one extracted response field.
pub struct AiClient {
    client: reqwest::Client,
    config: AiConfig,
}

impl AiClient {
    pub fn new(client: reqwest::Client, config: AiConfig) -> Self {
        Self { client, config }
    }

    pub async fn generate_image(&self, prompt: &str) -> Result<String> {
        self.post_task("image/generate", json!({ "prompt": prompt }), "url")
            .await
    }

    pub async fn chat(&self, prompt: &str) -> Result<String> {
        self.post_task("chat", json!({ "prompt": prompt }), "response")
            .await
    }

    pub async fn text_to_speech(&self, text: &str) -> Result<String> {
        self.post_task("text-to-speech", json!({ "text": text }), "url")
            .await
    }

    pub async fn summarize(&self, text: &str) -> Result<String> {
        self.post_task(
            "summarize",
            json!({ "text": text, "model": self.config.summarize_model }),
            "summary",
        )
        .await
    }

    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        self.post_task("generate-text", json!({ "prompt": prompt }), "text")
            .await
    }

    pub async fn image_to_text(&self, image_file_id: &str) -> Result<String> {
        self.post_task("image-to-text", json!({ "image": image_file_id }), "text")
            .await
    }

    pub async fn transcribe(&self, voice_file_id: &str) -> Result<String> {
        self.post_task(
            "automatic-speech-recognition",
            json!({ "voice": voice_file_id }),
            "text",
        )
        .await
    }

    pub async fn detect_objects(&self, image_file_id: &str) -> Result<String> {
        self.post_task(
            "object-detection",
            json!({ "image": image_file_id }),
            "objects",
        )
        .await
    }

    async fn post_task(&self, task: &str, body: Value, field: &str) -> Result<String> {
        let url = format!("{}/{}", self.config.base_url, task);

        debug!("Sending {} request to AI provider", task);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to AI provider", task))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("AI provider error on {} ({}): {}", task, status, error_body);
        }

        let decoded: Value = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", task))?;

        match decoded.get(field) {
            Some(Value::String(s)) => Ok(s.clone()),
            // Non-string fields (e.g. the object-detection list) are
            // rendered back to JSON for display.
            Some(other) => Ok(other.to_string()),
            None => anyhow::bail!("AI provider {} response missing '{}' field", task, field),
        }
    }
}
