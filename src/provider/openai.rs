use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{join_context, Mode, Provider};
use crate::config::Config;
use crate::errors::EngineError;

pub struct OpenAi {
    api_key: Option<String>,
    model: String,
    client: Client,
    timeout: Duration,
}

impl OpenAi {
    pub fn new(cfg: &Config) -> Self {
        Self {
            api_key: cfg.openai_api_key.clone(),
            model: cfg.openai_model.clone(),
            client: Client::new(),
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }
}

fn system_for(mode: Mode) -> &'static str {
    match mode {
        Mode::Project => {
            r#"Return only valid JSON: {"files": {"path": "content"}} for a complete component-based project. No prose."#
        }
        Mode::Chat => {
            "You are a helpful assistant. Respond concisely in plain text. Only include code blocks if explicitly asked to provide code."
        }
        Mode::Code => {
            "Return only complete, runnable React/Tailwind code for a modern component or page. No prose."
        }
    }
}

#[async_trait]
impl Provider for OpenAi {
    async fn complete(
        &self,
        prompt: &str,
        mode: Mode,
        context: &str,
    ) -> Result<String, EngineError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            EngineError::ProviderUnavailable("OpenAI API key not configured".into())
        })?;

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_for(mode) },
                { "role": "user", "content": join_context(prompt, context) }
            ],
            "temperature": 0.2
        });

        let resp = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::ProviderRequestFailed(format!("openai request failed: {e}")))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            EngineError::ProviderRequestFailed(format!("openai read body failed: {e}"))
        })?;
        if !status.is_success() {
            return Err(EngineError::ProviderRequestFailed(format!(
                "openai API error ({status}): {text}"
            )));
        }

        #[derive(Deserialize)]
        struct ChatMessage {
            content: String,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChatMessage,
        }
        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            EngineError::ProviderRequestFailed(format!("openai response parse error: {e}"))
        })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default())
    }
}
