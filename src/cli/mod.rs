use clap::{Parser, ValueEnum};

/// Which of the three request entrypoints to exercise.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// Classify the prompt and route it (chat, code, project, or uploads).
    Send,
    /// Force single-component code generation.
    Code,
    /// Force whole-project generation.
    Project,
}

#[derive(Parser, Debug)]
#[command(name = "codeloom", version, about = "LLM code/project generator with provider fallback")]
pub struct Args {
    /// Free-text request; intent is classified from it under `send`.
    #[arg(long)]
    pub prompt: Option<String>,

    /// auto, openai, gemini or claude; unconfigured providers fall back to mock.
    #[arg(long, default_value = "auto")]
    pub provider: String,

    /// Identity that projects and chats are keyed by.
    #[arg(long, default_value = "local")]
    pub owner: String,

    /// Existing conversation to continue.
    #[arg(long)]
    pub chat_id: Option<String>,

    /// Explicit project directory for uploads; defaults to the latest project.
    #[arg(long)]
    pub project_folder: Option<String>,

    /// Files to upload into the active project (repeatable).
    #[arg(long)]
    pub upload: Vec<String>,

    #[arg(long, value_enum, default_value_t = Endpoint::Send)]
    pub endpoint: Endpoint,

    #[arg(long, default_value = "projects")]
    pub projects_root: String,

    /// SQLite database path; overrides CODELOOM_DB. Omit both to run without
    /// persistence.
    #[arg(long)]
    pub db: Option<String>,

    /// List this owner's conversations and exit.
    #[arg(long, default_value_t = false)]
    pub list_chats: bool,

    /// Print one conversation's full history and exit.
    #[arg(long)]
    pub show_chat: Option<String>,

    /// Emit the raw JSON result instead of the dashboard.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
