pub mod claude;
pub mod gemini;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use cardsmith_core::config::{LlmConfig, OllamaConfig};

use crate::provider::{LlmError, LlmProvider};

/// Create the appropriate LLM provider based on config.
pub fn create_provider(
    llm_config: &LlmConfig,
    ollama_config: &OllamaConfig,
) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match llm_config.provider.as_str() {
        "together" => {
            let api_key = llm_config
                .together_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("TOGETHER_API_KEY not set".into()))?;
            Ok(Arc::new(openai::OpenAiProvider::new(
                api_key.clone(),
                llm_config.together_model.clone(),
                llm_config.together_base_url.clone(),
            )))
        }
        "openai" => {
            let api_key = llm_config
                .openai_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY not set".into()))?;
            let base_url = llm_config
                .openai_base_url
                .as_deref()
                .unwrap_or("https://api.openai.com");
            Ok(Arc::new(openai::OpenAiProvider::new(
                api_key.clone(),
                llm_config.openai_model.clone(),
                base_url.to_string(),
            )))
        }
        "anthropic" | "claude" => {
            let api_key = llm_config
                .anthropic_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("ANTHROPIC_API_KEY not set".into()))?;
            Ok(Arc::new(claude::ClaudeProvider::new(
                api_key.clone(),
                llm_config.anthropic_model.clone(),
            )))
        }
        "gemini" => {
            let api_key = llm_config
                .gemini_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("GEMINI_API_KEY not set".into()))?;
            Ok(Arc::new(gemini::GeminiProvider::new(
                api_key.clone(),
                llm_config.gemini_model.clone(),
            )))
        }
        "ollama" => Ok(Arc::new(ollama::OllamaProvider::new(
            ollama_config.url.clone(),
            ollama_config.model.clone(),
        ))),
        other => Err(LlmError::NotConfigured(format!(
            "unknown LLM provider: '{}'",
            other
        ))),
    }
}
