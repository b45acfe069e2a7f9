use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{join_context, Mode, Provider};
use crate::config::Config;
use crate::errors::EngineError;

const API_VERSION: &str = "2023-06-01";

pub struct Anthropic {
    api_key: Option<String>,
    model: String,
    client: Client,
    timeout: Duration,
}

impl Anthropic {
    pub fn new(cfg: &Config) -> Self {
        Self {
            api_key: cfg.anthropic_api_key.clone(),
            model: cfg.anthropic_model.clone(),
            client: Client::new(),
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }
}

#[derive(Serialize)]
struct MsgRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Msg<'a>>,
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MsgResponse {
    #[serde(default)]
    content: Vec<Block>,
}

#[derive(Deserialize)]
struct Block {
    #[serde(default)]
    text: String,
}

fn system_for(mode: Mode) -> &'static str {
    match mode {
        Mode::Project => {
            r#"Return only JSON: {"files": {"path": "content"}} representing a complete React/Tailwind project. No prose."#
        }
        Mode::Chat => {
            "You are a helpful assistant. Respond concisely in plain text. Only include code if explicitly asked."
        }
        Mode::Code => {
            "Return only complete, runnable React/Tailwind code for a modern component or page. No prose."
        }
    }
}

#[async_trait]
impl Provider for Anthropic {
    async fn complete(
        &self,
        prompt: &str,
        mode: Mode,
        context: &str,
    ) -> Result<String, EngineError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            EngineError::ProviderUnavailable("Anthropic API key not configured".into())
        })?;

        let user = join_context(prompt, context);
        let body = MsgRequest {
            model: &self.model,
            max_tokens: 4096,
            system: system_for(mode),
            messages: vec![Msg { role: "user", content: &user }],
        };

        let resp = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                EngineError::ProviderRequestFailed(format!("anthropic request failed: {e}"))
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            EngineError::ProviderRequestFailed(format!("anthropic read body failed: {e}"))
        })?;
        if !status.is_success() {
            return Err(EngineError::ProviderRequestFailed(format!(
                "anthropic API error ({status}): {text}"
            )));
        }

        let parsed: MsgResponse = serde_json::from_str(&text).map_err(|e| {
            EngineError::ProviderRequestFailed(format!("anthropic response parse error: {e}"))
        })?;

        Ok(parsed
            .content
            .into_iter()
            .next()
            .map(|b| b.text)
            .unwrap_or_default())
    }
}
