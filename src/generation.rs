//! Query + context → answer text.
//!
//! [`ChatCompletionsGenerator`] talks to any OpenAI-compatible
//! `/chat/completions` endpoint; the default configuration points at Groq.
//! Requests are not retried.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::LlmConfig;

/// Produces a natural-language answer from a question and context passages.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, query: &str, context: &[String]) -> Result<String>;
}

/// Builds the single-turn "stuff" prompt: every context passage inlined
/// ahead of the question.
pub fn build_prompt(query: &str, context: &[String]) -> String {
    format!(
        "Use the following pieces of context to answer the question at the end. \
         If you don't know the answer, just say that you don't know, \
         don't try to make up an answer.\n\n{}\n\nQuestion: {}\nHelpful Answer:",
        context.join("\n\n"),
        query
    )
}

pub struct ChatCompletionsGenerator {
    endpoint: String,
    model: String,
    temperature: f32,
    api_key: String,
    client: reqwest::Client,
}

impl ChatCompletionsGenerator {
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key: api_key.into(),
            client,
        })
    }
}

#[async_trait]
impl Generator for ChatCompletionsGenerator {
    async fn generate(&self, query: &str, context: &[String]) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "user", "content": build_prompt(query, context) }
            ],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("LLM API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_completion(&json)
    }
}

fn parse_completion(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.pointer("/message/content"))
        .and_then(|content| content.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid LLM response: missing choices[0].message.content"))
}
