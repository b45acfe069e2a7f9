use anyhow::{Context as _, Result};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::intent::Intent;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Assistant,
}

/// One conversation turn entry, persisted as a JSON document per row so the
/// shape matches what external storage collaborators consume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Chat {
    pub id: String,
    pub owner: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatSummary {
    pub id: String,
    pub title: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Assistant-side payload of a turn. Unset explanation/summary are defaulted
/// from the intent and provider at append time.
#[derive(Debug, Clone, Default)]
pub struct TurnResult {
    pub text: Option<String>,
    pub code: Option<String>,
    pub folder: Option<String>,
    pub files: Option<Vec<String>>,
    pub explanation: Option<String>,
    pub summary: Option<String>,
}

pub struct GenerationRecord<'a> {
    pub owner: &'a str,
    pub prompt: &'a str,
    pub provider: &'a str,
    pub code: &'a str,
    pub explanation: &'a str,
    pub folder: Option<&'a str>,
    pub files: Option<&'a [String]>,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS chats (
    id         TEXT PRIMARY KEY,
    owner      TEXT NOT NULL,
    title      TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS messages (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id    TEXT NOT NULL REFERENCES chats(id),
    payload    TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS generations (
    id         TEXT PRIMARY KEY,
    owner      TEXT NOT NULL,
    prompt     TEXT NOT NULL,
    provider   TEXT NOT NULL,
    code       TEXT NOT NULL,
    explanation TEXT,
    folder     TEXT,
    files      TEXT,
    created_at TEXT NOT NULL
);
";

/// SQLite-backed conversation and generation log. The connection is guarded
/// by a mutex, so both rows of a turn land inside one transaction; ordering
/// between two concurrent appends to the same chat is arrival-order.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("opening {}", path.display()))?;
        conn.execute_batch(SCHEMA).context("applying schema")?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Resolve the conversation (create it when absent or not owned) and
    /// append exactly one user message followed by one assistant message.
    /// Returns the conversation id.
    pub fn append_turn(
        &self,
        chat_id: Option<&str>,
        owner: &str,
        prompt: &str,
        intent: Intent,
        provider: &str,
        result: &TurnResult,
    ) -> Result<String> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();

        let existing: Option<String> = match chat_id {
            Some(cid) => tx
                .query_row(
                    "SELECT id FROM chats WHERE id = ?1 AND owner = ?2",
                    params![cid, owner],
                    |r| r.get(0),
                )
                .optional()?,
            None => None,
        };
        let id = match existing {
            Some(cid) => cid,
            None => {
                let cid = Uuid::new_v4().to_string();
                tx.execute(
                    "INSERT INTO chats (id, owner, title, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![cid, owner, default_title(prompt), now, now],
                )?;
                cid
            }
        };

        let user = Message {
            role: Role::User,
            prompt: Some(prompt.to_string()),
            intent: Some(intent.as_str().to_string()),
            provider: Some(provider.to_string()),
            ..Default::default()
        };
        let assistant = Message {
            role: Role::Assistant,
            intent: Some(intent.as_str().to_string()),
            provider: Some(provider.to_string()),
            text: result.text.clone(),
            code: result.code.clone(),
            folder: result.folder.clone(),
            files: result.files.clone(),
            explanation: Some(result.explanation.clone().unwrap_or_else(|| {
                format!("Intent={intent}, provider={provider}")
            })),
            summary: Some(
                result
                    .summary
                    .clone()
                    .unwrap_or_else(|| format!("Processed {intent}")),
            ),
            ..Default::default()
        };
        for msg in [&user, &assistant] {
            tx.execute(
                "INSERT INTO messages (chat_id, payload, created_at) VALUES (?1, ?2, ?3)",
                params![id, serde_json::to_string(msg)?, now],
            )?;
        }
        tx.execute(
            "UPDATE chats SET updated_at = ?1 WHERE id = ?2",
            params![now, id],
        )?;
        tx.commit()?;
        Ok(id)
    }

    /// Full message history in insertion order, owner-scoped. `None` when the
    /// conversation does not exist or belongs to someone else. Malformed rows
    /// are skipped rather than failing the lookup.
    pub fn chat_messages(&self, id: &str, owner: &str) -> Result<Option<Vec<Message>>> {
        let conn = self.conn.lock();
        let owned: Option<String> = conn
            .query_row(
                "SELECT id FROM chats WHERE id = ?1 AND owner = ?2",
                params![id, owner],
                |r| r.get(0),
            )
            .optional()?;
        if owned.is_none() {
            return Ok(None);
        }
        let mut stmt =
            conn.prepare("SELECT payload FROM messages WHERE chat_id = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![id], |r| r.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            if let Ok(m) = serde_json::from_str::<Message>(&row?) {
                out.push(m);
            }
        }
        Ok(Some(out))
    }

    pub fn get_chat(&self, id: &str, owner: &str) -> Result<Option<Chat>> {
        let header = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT id, owner, title, created_at, updated_at
                 FROM chats WHERE id = ?1 AND owner = ?2",
                params![id, owner],
                |r| {
                    Ok((
                        r.get::<_, String>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, String>(3)?,
                        r.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?
        };
        let Some((id, owner, title, created_at, updated_at)) = header else {
            return Ok(None);
        };
        let messages = self.chat_messages(&id, &owner)?.unwrap_or_default();
        Ok(Some(Chat { id, owner, title, messages, created_at, updated_at }))
    }

    /// Conversation headers for one owner, most recently updated first.
    pub fn list_chats(&self, owner: &str) -> Result<Vec<ChatSummary>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, title, created_at, updated_at FROM chats
             WHERE owner = ?1 ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map(params![owner], |r| {
            Ok(ChatSummary {
                id: r.get(0)?,
                title: r.get(1)?,
                created_at: r.get(2)?,
                updated_at: r.get(3)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Append-only generation log; rows are never mutated or deleted here.
    pub fn record_generation(&self, rec: &GenerationRecord<'_>) -> Result<()> {
        let files_json = match rec.files {
            Some(files) => Some(serde_json::to_string(files)?),
            None => None,
        };
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO generations (id, owner, prompt, provider, code, explanation, folder, files, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                Uuid::new_v4().to_string(),
                rec.owner,
                rec.prompt,
                rec.provider,
                rec.code,
                rec.explanation,
                rec.folder,
                files_json,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

fn default_title(prompt: &str) -> String {
    let title: String = prompt.chars().take(48).collect();
    if title.trim().is_empty() {
        "New Chat".to_string()
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> Store {
        Store::open(&dir.path().join("test.sqlite")).unwrap()
    }

    #[test]
    fn append_creates_chat_and_orders_messages() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let result = TurnResult { text: Some("hello there".into()), ..Default::default() };
        let id = store
            .append_turn(None, "u1", "how are you", Intent::Chat, "mock", &result)
            .unwrap();

        let messages = store.chat_messages(&id, "u1").unwrap().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].prompt.as_deref(), Some("how are you"));
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].text.as_deref(), Some("hello there"));
    }

    #[test]
    fn explanation_and_summary_default_from_intent_and_provider() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let id = store
            .append_turn(None, "u1", "hi", Intent::Chat, "mock", &TurnResult::default())
            .unwrap();
        let messages = store.chat_messages(&id, "u1").unwrap().unwrap();
        assert_eq!(
            messages[1].explanation.as_deref(),
            Some("Intent=chat, provider=mock")
        );
        assert_eq!(messages[1].summary.as_deref(), Some("Processed chat"));
    }

    #[test]
    fn appending_with_existing_id_extends_the_chat() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let id = store
            .append_turn(None, "u1", "first", Intent::Chat, "mock", &TurnResult::default())
            .unwrap();
        let same = store
            .append_turn(Some(&id), "u1", "second", Intent::Chat, "mock", &TurnResult::default())
            .unwrap();
        assert_eq!(id, same);
        assert_eq!(store.chat_messages(&id, "u1").unwrap().unwrap().len(), 4);
    }

    #[test]
    fn foreign_chat_id_starts_a_fresh_conversation() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let theirs = store
            .append_turn(None, "owner-a", "hi", Intent::Chat, "mock", &TurnResult::default())
            .unwrap();
        let mine = store
            .append_turn(Some(&theirs), "owner-b", "hi", Intent::Chat, "mock", &TurnResult::default())
            .unwrap();
        assert_ne!(theirs, mine);
        assert!(store.chat_messages(&theirs, "owner-b").unwrap().is_none());
    }

    #[test]
    fn title_is_first_48_chars_or_default() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let long = "x".repeat(80);
        let id = store
            .append_turn(None, "u1", &long, Intent::Chat, "mock", &TurnResult::default())
            .unwrap();
        let chat = store.get_chat(&id, "u1").unwrap().unwrap();
        assert_eq!(chat.title.len(), 48);

        assert_eq!(default_title("  "), "New Chat");
    }

    #[test]
    fn list_chats_is_owner_scoped_and_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        store
            .append_turn(None, "u1", "one", Intent::Chat, "mock", &TurnResult::default())
            .unwrap();
        store
            .append_turn(None, "u2", "theirs", Intent::Chat, "mock", &TurnResult::default())
            .unwrap();
        let chats = store.list_chats("u1").unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].title, "one");
    }

    #[test]
    fn generation_record_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let files = vec!["index.html".to_string()];
        store
            .record_generation(&GenerationRecord {
                owner: "u1",
                prompt: "a landing page",
                provider: "auto",
                code: "files",
                explanation: "project",
                folder: Some("/tmp/p"),
                files: Some(&files),
            })
            .unwrap();

        let conn = store.conn.lock();
        let (owner, code, files_json): (String, String, String) = conn
            .query_row(
                "SELECT owner, code, files FROM generations",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(owner, "u1");
        assert_eq!(code, "files");
        assert_eq!(files_json, "[\"index.html\"]");
    }
}
