use serde::Serialize;

use crate::parse::FileMap;

/// Result of a standalone code-generation request.
#[derive(Debug, Clone, Serialize)]
pub struct CodeResult {
    pub code: String,
    pub explanation: String,
}

/// Result of a project-generation request.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectResult {
    pub folder: String,
    pub files: Vec<String>,
    #[serde(rename = "fileMap")]
    pub file_map: FileMap,
}

/// Result of a conversational `send`, tagged by the classified intent. Each
/// variant carries a fixed field set instead of one loose bag of optionals.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum SendResult {
    ModifyFiles {
        folder: String,
        files: Vec<String>,
        #[serde(rename = "chatId", skip_serializing_if = "Option::is_none")]
        chat_id: Option<String>,
    },
    GenerateProject {
        folder: String,
        files: Vec<String>,
        #[serde(rename = "fileMap")]
        file_map: FileMap,
    },
    Code {
        code: String,
        explanation: String,
        #[serde(rename = "chatId", skip_serializing_if = "Option::is_none")]
        chat_id: Option<String>,
    },
    Chat {
        text: String,
        explanation: String,
        #[serde(rename = "chatId", skip_serializing_if = "Option::is_none")]
        chat_id: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_result_serializes_with_intent_tag() {
        let v = serde_json::to_value(SendResult::Chat {
            text: "hi".into(),
            explanation: "Chat response from mock".into(),
            chat_id: None,
        })
        .unwrap();
        assert_eq!(v["intent"], "chat");
        assert_eq!(v["text"], "hi");
        assert!(v.get("chatId").is_none());
        assert!(v.get("code").is_none());
    }
}
