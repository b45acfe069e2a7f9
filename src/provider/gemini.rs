use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{Mode, Provider};
use crate::config::Config;
use crate::errors::EngineError;

pub struct Gemini {
    api_key: Option<String>,
    model: String,
    client: Client,
    timeout: Duration,
}

impl Gemini {
    pub fn new(cfg: &Config) -> Self {
        Self {
            api_key: cfg.gemini_api_key.clone(),
            model: cfg.gemini_model.clone(),
            client: Client::new(),
            timeout: Duration::from_secs(cfg.timeout_secs),
        }
    }
}

fn system_for(mode: Mode) -> &'static str {
    match mode {
        Mode::Project => r#"Return only JSON: {"files": {"path": "content"}}. No extra text."#,
        Mode::Chat => {
            "You are a helpful assistant. Respond concisely in plain text. Only include code blocks if explicitly asked."
        }
        Mode::Code => "Return only complete runnable React/Tailwind code. No extra text.",
    }
}

/// Gemini takes one flattened text part; system instruction first, then the
/// prior context, then the task.
fn flatten(mode: Mode, prompt: &str, context: &str) -> String {
    let mut body = String::from(system_for(mode));
    body.push_str("\n\n");
    if !context.is_empty() {
        body.push_str("Context:\n");
        body.push_str(context);
        body.push_str("\n\n");
    }
    body.push_str(prompt);
    body
}

#[async_trait]
impl Provider for Gemini {
    async fn complete(
        &self,
        prompt: &str,
        mode: Mode,
        context: &str,
    ) -> Result<String, EngineError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            EngineError::ProviderUnavailable("Gemini API key not configured".into())
        })?;

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, api_key
        );
        let body = json!({
            "contents": [
                { "role": "user", "parts": [ { "text": flatten(mode, prompt, context) } ] }
            ]
        });

        let resp = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::ProviderRequestFailed(format!("gemini request failed: {e}")))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            EngineError::ProviderRequestFailed(format!("gemini read body failed: {e}"))
        })?;
        if !status.is_success() {
            return Err(EngineError::ProviderRequestFailed(format!(
                "gemini API error ({status}): {text}"
            )));
        }

        #[derive(Deserialize)]
        struct GenerateResponse {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }
        #[derive(Deserialize)]
        struct Candidate {
            content: Content,
        }
        #[derive(Deserialize)]
        struct Content {
            #[serde(default)]
            parts: Vec<Part>,
        }
        #[derive(Deserialize)]
        struct Part {
            #[serde(default)]
            text: String,
        }

        let parsed: GenerateResponse = serde_json::from_str(&text).map_err(|e| {
            EngineError::ProviderRequestFailed(format!("gemini response parse error: {e}"))
        })?;

        Ok(parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default())
    }
}
