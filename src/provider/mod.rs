use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::Config;
use crate::errors::EngineError;

pub mod anthropic;
pub mod gemini;
pub mod mock;
pub mod openai;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Mock,
    OpenAi,
    Gemini,
    Claude,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Mock => "mock",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Claude => "claude",
        }
    }

    /// Human-facing name used in explanations.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::Mock => "Mock",
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Gemini => "Gemini",
            ProviderKind::Claude => "Claude",
        }
    }

    fn from_request(s: &str) -> Option<Self> {
        match s {
            "openai" => Some(ProviderKind::OpenAi),
            "gemini" => Some(ProviderKind::Gemini),
            "claude" => Some(ProviderKind::Claude),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProviderChoice {
    pub kind: ProviderKind,
    pub fallback: bool,
}

/// Pick a provider for a request. Pure over the configured credentials;
/// always returns a usable choice, never a provider whose key is missing.
///
/// Auto priority is fixed: claude, then openai, then gemini.
pub fn select(requested: Option<&str>, cfg: &Config) -> ProviderChoice {
    let req = requested.unwrap_or("").trim().to_lowercase();
    let req = if req.is_empty() { "auto" } else { req.as_str() };

    if req != "auto" {
        if let Some(kind) = ProviderKind::from_request(req) {
            if cfg.has_key(kind) {
                return ProviderChoice { kind, fallback: false };
            }
        }
        return ProviderChoice { kind: ProviderKind::Mock, fallback: true };
    }

    for kind in [ProviderKind::Claude, ProviderKind::OpenAi, ProviderKind::Gemini] {
        if cfg.has_key(kind) {
            return ProviderChoice { kind, fallback: false };
        }
    }
    ProviderChoice { kind: ProviderKind::Mock, fallback: true }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Code,
    Project,
    Chat,
}

/// One text completion per call; a single attempt, no retries.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(&self, prompt: &str, mode: Mode, context: &str)
        -> Result<String, EngineError>;
}

pub type DynProvider = Box<dyn Provider + Send + Sync>;

pub fn make_provider(kind: ProviderKind, cfg: &Config) -> DynProvider {
    match kind {
        ProviderKind::OpenAi => Box::new(openai::OpenAi::new(cfg)),
        ProviderKind::Gemini => Box::new(gemini::Gemini::new(cfg)),
        ProviderKind::Claude => Box::new(anthropic::Anthropic::new(cfg)),
        ProviderKind::Mock => Box::new(mock::Mock),
    }
}

/// Prior conversation context always precedes the task text.
pub(crate) fn join_context(prompt: &str, context: &str) -> String {
    if context.is_empty() {
        prompt.to_string()
    } else {
        format!("Context:\n{context}\n\nTask:\n{prompt}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg_with(openai: bool, gemini: bool, claude: bool) -> Config {
        let mut cfg = Config::default();
        if openai {
            cfg.openai_api_key = Some("sk-test".into());
        }
        if gemini {
            cfg.gemini_api_key = Some("g-test".into());
        }
        if claude {
            cfg.anthropic_api_key = Some("a-test".into());
        }
        cfg
    }

    #[test]
    fn no_credentials_always_falls_back_to_mock() {
        let cfg = cfg_with(false, false, false);
        for requested in [None, Some("auto"), Some("openai"), Some("claude"), Some("nonsense"), Some("")] {
            let choice = select(requested, &cfg);
            assert_eq!(choice.kind, ProviderKind::Mock);
            assert!(choice.fallback);
        }
    }

    #[test]
    fn requested_provider_used_when_configured() {
        let cfg = cfg_with(true, false, false);
        let choice = select(Some("openai"), &cfg);
        assert_eq!(choice.kind, ProviderKind::OpenAi);
        assert!(!choice.fallback);
    }

    #[test]
    fn requested_provider_without_key_falls_back() {
        let cfg = cfg_with(true, false, false);
        let choice = select(Some("gemini"), &cfg);
        assert_eq!(choice.kind, ProviderKind::Mock);
        assert!(choice.fallback);
    }

    #[test]
    fn auto_prefers_claude_then_openai_then_gemini() {
        let all = cfg_with(true, true, true);
        assert_eq!(select(Some("auto"), &all).kind, ProviderKind::Claude);

        let no_claude = cfg_with(true, true, false);
        assert_eq!(select(Some("auto"), &no_claude).kind, ProviderKind::OpenAi);

        let only_gemini = cfg_with(false, true, false);
        let choice = select(Some("auto"), &only_gemini);
        assert_eq!(choice.kind, ProviderKind::Gemini);
        assert!(!choice.fallback);
    }

    #[test]
    fn requested_name_is_case_insensitive() {
        let cfg = cfg_with(false, false, true);
        assert_eq!(select(Some("Claude"), &cfg).kind, ProviderKind::Claude);
    }

    #[test]
    fn context_precedes_task() {
        assert_eq!(join_context("do it", ""), "do it");
        assert_eq!(
            join_context("do it", "User: hi"),
            "Context:\nUser: hi\n\nTask:\ndo it"
        );
    }
}
