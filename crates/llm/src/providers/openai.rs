//! OpenAI-compatible chat completions. Also serves Together AI, which
//! exposes the same `/v1/chat/completions` contract under its own base URL.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::provider::{ensure_ok, LlmError, LlmProvider, Message};

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_request_body(
        model: &str,
        messages: &[Message],
        temperature: f32,
        max_tokens: u32,
    ) -> serde_json::Value {
        json!({
            "model": model,
            "messages": messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = Self::build_request_body(&self.model, &messages, temperature, max_tokens);

        debug!(model = %self.model, "chat completion request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;
        let response = ensure_ok(response).await?;

        let resp: serde_json::Value = response.json().await?;
        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::ParseError("missing choices[0].message.content".into()))?
            .to_string();

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_carries_sampling_settings() {
        let messages = vec![Message::user("make cards")];
        let body = OpenAiProvider::build_request_body("m-1", &messages, 0.7, 1024);

        assert_eq!(body["model"], "m-1");
        assert_eq!(body["max_tokens"], 1024);
        let temp = body["temperature"].as_f64().unwrap();
        assert!((temp - 0.7).abs() < 1e-6);

        let msgs = body["messages"].as_array().unwrap();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0]["role"], "user");
        assert_eq!(msgs[0]["content"], "make cards");
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let provider = OpenAiProvider::new("k".into(), "m".into(), "https://api.together.xyz/".into());
        assert_eq!(provider.base_url, "https://api.together.xyz");
    }
}
