use serde::{Deserialize, Serialize};
use std::env;

use crate::provider::ProviderKind;

/// Runtime configuration, built once at startup and passed by reference into
/// the selector and adapters. Credentials never live in module-scoped state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub projects_root: String,
    /// SQLite database path; `None` runs the engine without persistence.
    pub db_path: Option<String>,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_model: String,
    pub gemini_model: String,
    pub anthropic_model: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            projects_root: "projects".into(),
            db_path: None,
            openai_api_key: None,
            gemini_api_key: None,
            anthropic_api_key: None,
            openai_model: "gpt-4o-mini".into(),
            gemini_model: "gemini-1.5-flash-latest".into(),
            anthropic_model: "claude-3-haiku-20240307".into(),
            timeout_secs: 120,
        }
    }
}

impl Config {
    /// Read the three credential slots and optional model overrides from the
    /// environment: `OPENAI_API_KEY`, `GEMINI_API_KEY`, `ANTHROPIC_API_KEY`,
    /// `OPENAI_MODEL`, `GEMINI_MODEL`, `ANTHROPIC_MODEL`, `CODELOOM_DB`.
    /// A missing credential silently disables that provider.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.openai_api_key = non_empty(env::var("OPENAI_API_KEY").ok());
        cfg.gemini_api_key = non_empty(env::var("GEMINI_API_KEY").ok());
        cfg.anthropic_api_key = non_empty(env::var("ANTHROPIC_API_KEY").ok());
        if let Some(m) = non_empty(env::var("OPENAI_MODEL").ok()) {
            cfg.openai_model = m;
        }
        if let Some(m) = non_empty(env::var("GEMINI_MODEL").ok()) {
            cfg.gemini_model = m;
        }
        if let Some(m) = non_empty(env::var("ANTHROPIC_MODEL").ok()) {
            cfg.anthropic_model = m;
        }
        cfg.db_path = non_empty(env::var("CODELOOM_DB").ok());
        cfg
    }

    pub fn has_key(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::OpenAi => self.openai_api_key.is_some(),
            ProviderKind::Gemini => self.gemini_api_key.is_some(),
            ProviderKind::Claude => self.anthropic_api_key.is_some(),
            ProviderKind::Mock => false,
        }
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}
