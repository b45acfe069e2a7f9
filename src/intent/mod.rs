use serde::{Deserialize, Serialize};
use std::fmt;

/// Handling path for an incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ModifyFiles,
    GenerateProject,
    Code,
    Chat,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::ModifyFiles => "modify_files",
            Intent::GenerateProject => "generate_project",
            Intent::Code => "code",
            Intent::Chat => "chat",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const PROJECT_WORDS: &[&str] = &[
    "create project",
    "generate project",
    "build project",
    "complete website",
    "complete app",
    "multiple files",
    "file map",
    "component-based",
    "pages",
];

const CODE_WORDS: &[&str] = &[
    "code", "component", "function", "react", "tailwind", "js", "jsx", "html", "css",
];

/// Classify a free-text request. Attachments always dominate; after that a
/// fixed keyword list decides project vs code, and anything else is chat.
pub fn classify(text: Option<&str>, has_attachments: bool) -> Intent {
    if has_attachments {
        return Intent::ModifyFiles;
    }
    let t = text.unwrap_or("").to_lowercase();
    if PROJECT_WORDS.iter().any(|w| t.contains(w)) {
        return Intent::GenerateProject;
    }
    if CODE_WORDS.iter().any(|w| t.contains(w)) {
        return Intent::Code;
    }
    Intent::Chat
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachments_dominate_regardless_of_text() {
        assert_eq!(classify(Some("build project please"), true), Intent::ModifyFiles);
        assert_eq!(classify(Some(""), true), Intent::ModifyFiles);
        assert_eq!(classify(None, true), Intent::ModifyFiles);
    }

    #[test]
    fn project_keywords_win_over_code_keywords() {
        assert_eq!(
            classify(Some("please build project with multiple files"), false),
            Intent::GenerateProject
        );
        assert_eq!(
            classify(Some("a complete website with react pages"), false),
            Intent::GenerateProject
        );
    }

    #[test]
    fn code_keywords_yield_code() {
        assert_eq!(classify(Some("write a react component"), false), Intent::Code);
        assert_eq!(classify(Some("some HTML for a navbar"), false), Intent::Code);
    }

    #[test]
    fn plain_text_is_chat() {
        assert_eq!(classify(Some("how are you"), false), Intent::Chat);
        assert_eq!(classify(None, false), Intent::Chat);
    }
}
