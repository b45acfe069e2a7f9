use anyhow::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::context;
use crate::errors::EngineError;
use crate::intent::{self, Intent};
use crate::log;
use crate::parse;
use crate::project;
use crate::provider::{self, Mode, ProviderKind};
use crate::store::{Chat, ChatSummary, GenerationRecord, Store, TurnResult};
use crate::wire::{CodeResult, ProjectResult, SendResult};

const MOCK_EXPLANATION: &str =
    "This is a mock response. Connect an API key to get real results.";

pub struct UploadedFile {
    pub name: String,
    pub content: Vec<u8>,
}

pub struct SendRequest {
    pub prompt: Option<String>,
    pub provider: Option<String>,
    pub chat_id: Option<String>,
    pub project_folder: Option<PathBuf>,
    pub uploads: Vec<UploadedFile>,
}

/// Provider orchestration and project materialization. One engine per
/// process; each request runs as its own task with sequential awaits.
pub struct Engine {
    cfg: Config,
    store: Option<Store>,
}

impl Engine {
    /// Opens the store when a database path is configured. An open failure
    /// logs and degrades to running without persistence.
    pub fn new(cfg: Config) -> Self {
        let store = match &cfg.db_path {
            Some(p) => match Store::open(Path::new(p)) {
                Ok(s) => Some(s),
                Err(e) => {
                    log::degrade("store", &format!("open failed, running without persistence: {e:#}"));
                    None
                }
            },
            None => None,
        };
        Self { cfg, store }
    }

    /// Generate a single component/page. Provider failures substitute a
    /// labeled fallback payload; the request still succeeds.
    pub async fn generate_code(
        &self,
        owner: &str,
        prompt: &str,
        requested: Option<&str>,
    ) -> Result<CodeResult> {
        if prompt.trim().is_empty() {
            return Err(EngineError::Validation("prompt is required".into()).into());
        }
        let chosen = provider::select(requested, &self.cfg);
        log::decision(chosen, Intent::Code);

        let adapter = provider::make_provider(chosen.kind, &self.cfg);
        let result = match adapter.complete(prompt, Mode::Code, "").await {
            Ok(code) if chosen.kind == ProviderKind::Mock => CodeResult {
                code,
                explanation: MOCK_EXPLANATION.to_string(),
            },
            Ok(code) => CodeResult {
                code,
                explanation: format!("{} generated code", chosen.kind.label()),
            },
            Err(e) => CodeResult {
                code: format!(
                    "// Fallback to mock due to {} error: {e}\nexport default function Generated() {{ return null; }}\n",
                    chosen.kind.label()
                ),
                explanation: format!("Fallback mock after {} error: {e}", chosen.kind.label()),
            },
        };

        self.record_generation(
            owner,
            prompt,
            requested.unwrap_or("auto"),
            &result.code,
            &result.explanation,
            None,
            None,
        );
        Ok(result)
    }

    /// Generate a whole project: context → provider → parse → materialize.
    /// Adapter or parse failures fall back to the deterministic scaffold.
    pub async fn generate_project(
        &self,
        owner: &str,
        prompt: &str,
        requested: Option<&str>,
        chat_id: Option<&str>,
    ) -> Result<ProjectResult> {
        if prompt.trim().is_empty() {
            return Err(EngineError::Validation("prompt is required".into()).into());
        }
        let chosen = provider::select(requested, &self.cfg);
        log::decision(chosen, Intent::GenerateProject);

        let mut generated = None;
        if chosen.kind != ProviderKind::Mock {
            let ctx = self.build_context(chat_id, owner);
            let adapter = provider::make_provider(chosen.kind, &self.cfg);
            match adapter.complete(prompt, Mode::Project, &ctx).await {
                Ok(raw) => generated = parse::extract_file_map(&raw),
                Err(e) => log::degrade(
                    "provider",
                    &format!("{} project call failed, using scaffold: {e}", chosen.kind.label()),
                ),
            }
        }

        let out = project::materialize(
            Path::new(&self.cfg.projects_root),
            owner,
            prompt,
            generated.as_ref(),
        )?;
        let folder = out.folder.display().to_string();

        self.record_generation(
            owner,
            prompt,
            requested.unwrap_or("auto"),
            "files",
            "project",
            Some(&folder),
            Some(&out.files),
        );
        Ok(ProjectResult { folder, files: out.files, file_map: out.file_map })
    }

    /// Conversational entrypoint: classify, route, record the turn.
    pub async fn send(&self, owner: &str, req: SendRequest) -> Result<SendResult> {
        let prompt = req.prompt.clone().unwrap_or_default();
        if prompt.is_empty() && req.uploads.is_empty() {
            return Err(EngineError::Validation("prompt or files required".into()).into());
        }
        let intent = intent::classify(req.prompt.as_deref(), !req.uploads.is_empty());

        match intent {
            Intent::ModifyFiles => self.handle_uploads(owner, &req, &prompt),
            Intent::GenerateProject => {
                let result = self
                    .generate_project(owner, &prompt, req.provider.as_deref(), req.chat_id.as_deref())
                    .await?;
                Ok(SendResult::GenerateProject {
                    folder: result.folder,
                    files: result.files,
                    file_map: result.file_map,
                })
            }
            Intent::Code | Intent::Chat => {
                self.handle_completion(owner, &req, &prompt, intent).await
            }
        }
    }

    /// Everything the store knows about one conversation, owner-scoped.
    pub fn get_chat(&self, id: &str, owner: &str) -> Result<Option<Chat>> {
        let store = self.require_store()?;
        store.get_chat(id, owner)
    }

    /// Conversation headers for an owner, most recently updated first.
    pub fn list_chats(&self, owner: &str) -> Result<Vec<ChatSummary>> {
        let store = self.require_store()?;
        store.list_chats(owner)
    }

    async fn handle_completion(
        &self,
        owner: &str,
        req: &SendRequest,
        prompt: &str,
        intent: Intent,
    ) -> Result<SendResult> {
        let context = self.build_context(req.chat_id.as_deref(), owner);
        let chosen = provider::select(req.provider.as_deref(), &self.cfg);
        log::decision(chosen, intent);

        let adapter = provider::make_provider(chosen.kind, &self.cfg);
        let mode = if intent == Intent::Chat { Mode::Chat } else { Mode::Code };
        let turn = match adapter.complete(prompt, mode, &context).await {
            Ok(content) if intent == Intent::Chat => TurnResult {
                text: Some(content),
                explanation: Some(format!("Chat response from {}", chosen.kind)),
                ..Default::default()
            },
            Ok(content) => TurnResult {
                code: Some(content),
                explanation: Some(format!("Code generated by {}", chosen.kind)),
                ..Default::default()
            },
            // Failed provider calls degrade to a plain-text apology carrying
            // the upstream message; the turn is still recorded under the
            // classified intent.
            Err(e) => TurnResult {
                text: Some(format!("Sorry, the provider failed: {e}")),
                ..Default::default()
            },
        };

        let chat_id =
            self.append_turn(req.chat_id.as_deref(), owner, prompt, intent, chosen.kind.as_str(), &turn);
        let explanation = turn
            .explanation
            .clone()
            .unwrap_or_else(|| format!("Intent={intent}, provider={}", chosen.kind));

        Ok(match turn.code {
            Some(code) => SendResult::Code { code, explanation, chat_id },
            None => SendResult::Chat {
                text: turn.text.unwrap_or_default(),
                explanation,
                chat_id,
            },
        })
    }

    /// Uploaded files land in the explicit folder, else the owner's latest
    /// project, else a freshly allocated one.
    fn handle_uploads(&self, owner: &str, req: &SendRequest, prompt: &str) -> Result<SendResult> {
        let projects_root = Path::new(&self.cfg.projects_root);
        let root = match &req.project_folder {
            Some(f) => f.clone(),
            None => match project::latest_project_folder(projects_root, owner) {
                Some(f) => f,
                None => project::allocate_folder(projects_root, owner)?,
            },
        };

        let mut written = Vec::new();
        for f in &req.uploads {
            let name = if f.name.is_empty() {
                format!("file-{}", Utc::now().timestamp_millis())
            } else {
                f.name.clone()
            };
            project::write_file(&root, &name, &f.content)?;
            written.push(name);
        }

        let folder = root.display().to_string();
        let turn = TurnResult {
            folder: Some(folder.clone()),
            files: Some(written.clone()),
            text: Some(format!("Uploaded {} files", written.len())),
            ..Default::default()
        };
        let chat_id =
            self.append_turn(req.chat_id.as_deref(), owner, prompt, Intent::ModifyFiles, "upload", &turn);

        Ok(SendResult::ModifyFiles { folder, files: written, chat_id })
    }

    /// Context degrades to empty on any miss or failure, never erroring.
    fn build_context(&self, chat_id: Option<&str>, owner: &str) -> String {
        let (Some(id), Some(store)) = (chat_id, &self.store) else {
            return String::new();
        };
        match store.chat_messages(id, owner) {
            Ok(Some(messages)) => context::render(&messages),
            Ok(None) => String::new(),
            Err(e) => {
                log::degrade("context", &format!("{e:#}"));
                String::new()
            }
        }
    }

    fn append_turn(
        &self,
        chat_id: Option<&str>,
        owner: &str,
        prompt: &str,
        intent: Intent,
        provider: &str,
        result: &TurnResult,
    ) -> Option<String> {
        let store = self.store.as_ref()?;
        match store.append_turn(chat_id, owner, prompt, intent, provider, result) {
            Ok(id) => Some(id),
            Err(e) => {
                log::degrade("chat append", &format!("{e:#}"));
                None
            }
        }
    }

    /// Best-effort generation log, gated on persistence availability and an
    /// identified owner.
    fn record_generation(
        &self,
        owner: &str,
        prompt: &str,
        provider: &str,
        code: &str,
        explanation: &str,
        folder: Option<&str>,
        files: Option<&[String]>,
    ) {
        if owner.is_empty() {
            return;
        }
        let Some(store) = &self.store else { return };
        if let Err(e) = store.record_generation(&GenerationRecord {
            owner,
            prompt,
            provider,
            code,
            explanation,
            folder,
            files,
        }) {
            log::degrade("generation log", &format!("{e:#}"));
        }
    }

    fn require_store(&self) -> Result<&Store> {
        self.store.as_ref().ok_or_else(|| {
            EngineError::PersistenceUnavailable("no database configured".into()).into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn engine_in(dir: &TempDir, with_db: bool) -> Engine {
        let mut cfg = Config::default();
        cfg.projects_root = dir.path().join("projects").display().to_string();
        if with_db {
            cfg.db_path = Some(dir.path().join("test.sqlite").display().to_string());
        }
        Engine::new(cfg)
    }

    fn send_req(prompt: &str) -> SendRequest {
        SendRequest {
            prompt: Some(prompt.to_string()),
            provider: Some("auto".to_string()),
            chat_id: None,
            project_folder: None,
            uploads: Vec::new(),
        }
    }

    #[tokio::test]
    async fn empty_request_is_a_validation_error() {
        let dir = TempDir::new().unwrap();
        let eng = engine_in(&dir, false);
        let err = eng.send("u1", send_req("")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn project_request_without_credentials_materializes_scaffold() {
        let dir = TempDir::new().unwrap();
        let eng = engine_in(&dir, false);

        let result = eng
            .send("u1", send_req("build project with multiple files for a landing page"))
            .await
            .unwrap();
        let SendResult::GenerateProject { folder, files, file_map } = result else {
            panic!("expected project result");
        };
        for rel in project::SCAFFOLD_PATHS {
            assert!(files.contains(&rel.to_string()), "missing {rel}");
            assert!(Path::new(&folder).join(rel).is_file());
        }
        let pkg = file_map.get("package.json").unwrap().as_str().unwrap();
        assert!(pkg.contains("\"react\""));
        assert!(pkg.contains("\"react-dom\""));
    }

    #[tokio::test]
    async fn chat_request_uses_mock_and_records_the_turn() {
        let dir = TempDir::new().unwrap();
        let eng = engine_in(&dir, true);

        let result = eng.send("u1", send_req("how are you")).await.unwrap();
        let SendResult::Chat { text, explanation, chat_id } = result else {
            panic!("expected chat result");
        };
        assert_eq!(text, "You asked: how are you");
        assert_eq!(explanation, "Chat response from mock");

        let chat = eng.get_chat(&chat_id.unwrap(), "u1").unwrap().unwrap();
        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.messages[0].prompt.as_deref(), Some("how are you"));
    }

    #[tokio::test]
    async fn code_request_yields_code_variant() {
        let dir = TempDir::new().unwrap();
        let eng = engine_in(&dir, false);

        let result = eng.send("u1", send_req("write a react component")).await.unwrap();
        let SendResult::Code { code, explanation, chat_id } = result else {
            panic!("expected code result");
        };
        assert!(code.contains("write a react component"));
        assert_eq!(explanation, "Code generated by mock");
        // No store configured, so the turn could not be recorded.
        assert!(chat_id.is_none());
    }

    #[tokio::test]
    async fn chat_turns_feed_the_next_request_context() {
        let dir = TempDir::new().unwrap();
        let eng = engine_in(&dir, true);

        let first = eng.send("u1", send_req("how are you")).await.unwrap();
        let SendResult::Chat { chat_id: Some(id), .. } = first else {
            panic!("expected recorded chat");
        };
        let mut req = send_req("and you");
        req.chat_id = Some(id.clone());
        eng.send("u1", req).await.unwrap();

        let chat = eng.get_chat(&id, "u1").unwrap().unwrap();
        assert_eq!(chat.messages.len(), 4);
    }

    #[tokio::test]
    async fn uploads_land_in_a_project_folder_and_are_recorded() {
        let dir = TempDir::new().unwrap();
        let eng = engine_in(&dir, true);

        let mut req = send_req("tweak these");
        req.uploads.push(UploadedFile {
            name: "notes/readme.md".into(),
            content: b"hello".to_vec(),
        });
        let result = eng.send("u1", req).await.unwrap();
        let SendResult::ModifyFiles { folder, files, chat_id } = result else {
            panic!("expected upload result");
        };
        assert_eq!(files, vec!["notes/readme.md".to_string()]);
        let written = fs_err::read_to_string(Path::new(&folder).join("notes/readme.md")).unwrap();
        assert_eq!(written, "hello");
        assert!(chat_id.is_some());

        // The freshly created folder is now the owner's latest project.
        let latest = project::latest_project_folder(
            Path::new(&eng.cfg.projects_root),
            "u1",
        )
        .unwrap();
        assert_eq!(latest.display().to_string(), folder);
    }

    #[tokio::test]
    async fn generate_code_records_a_generation_row() {
        let dir = TempDir::new().unwrap();
        let eng = engine_in(&dir, true);

        let result = eng.generate_code("u1", "a pricing page", None).await.unwrap();
        assert!(result.code.contains("a pricing page"));
        assert_eq!(
            result.explanation,
            "This is a mock response. Connect an API key to get real results."
        );
    }

    #[tokio::test]
    async fn read_operations_require_persistence() {
        let dir = TempDir::new().unwrap();
        let eng = engine_in(&dir, false);
        let err = eng.list_chats("u1").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::PersistenceUnavailable(_))
        ));
    }
}
