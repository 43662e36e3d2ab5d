//! Local models served by Ollama's `/api/chat`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::provider::{ensure_ok, LlmError, LlmProvider, Message};

pub struct OllamaProvider {
    client: reqwest::Client,
    url: String,
    model: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl OllamaProvider {
    pub fn new(url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_string(),
            model,
        }
    }

    /// Ollama takes sampling settings under `options`; `num_predict` caps output.
    fn build_request_body(
        model: &str,
        messages: &[Message],
        temperature: f32,
        max_tokens: u32,
    ) -> serde_json::Value {
        json!({
            "model": model,
            "messages": messages,
            "stream": false,
            "options": {
                "temperature": temperature,
                "num_predict": max_tokens,
            },
        })
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.url);
        let body = Self::build_request_body(&self.model, &messages, temperature, max_tokens);

        debug!(model = %self.model, "Ollama request to {}", url);

        let response = self.client.post(&url).json(&body).send().await?;
        let response = ensure_ok(response).await?;

        let chat: ChatResponse = response.json().await?;
        chat.message
            .map(|m| m.content)
            .ok_or_else(|| LlmError::ParseError("missing message.content".into()))
    }
}
