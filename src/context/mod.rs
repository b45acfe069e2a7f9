use crate::store::{Message, Role};

/// Number of trailing turns included in the provider context window.
pub const CONTEXT_WINDOW: usize = 20;

/// Render the tail of a conversation into one text block the adapters can put
/// ahead of the task. User turns become `User: <prompt>`, assistant turns
/// `Assistant: <text>` (or a `[code]` block when only code was produced).
pub fn render(messages: &[Message]) -> String {
    let skip = messages.len().saturating_sub(CONTEXT_WINDOW);
    let mut parts = Vec::with_capacity(messages.len() - skip);
    for m in &messages[skip..] {
        let line = match m.role {
            Role::User => format!("User: {}", m.prompt.as_deref().unwrap_or("")),
            Role::Assistant => {
                let content = match (&m.text, &m.code) {
                    (Some(t), _) if !t.is_empty() => t.clone(),
                    (_, Some(c)) => format!("[code]\n{c}\n[/code]"),
                    _ => String::new(),
                };
                format!("Assistant: {content}")
            }
        };
        parts.push(line.trim().to_string());
    }
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(prompt: &str) -> Message {
        Message {
            role: Role::User,
            prompt: Some(prompt.to_string()),
            ..Default::default()
        }
    }

    fn assistant(text: Option<&str>, code: Option<&str>) -> Message {
        Message {
            role: Role::Assistant,
            text: text.map(|s| s.to_string()),
            code: code.map(|s| s.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn renders_only_the_last_twenty_messages() {
        let messages: Vec<Message> = (0..25).map(|i| user(&format!("m{i}"))).collect();
        let ctx = render(&messages);
        assert!(!ctx.contains("User: m4"));
        assert!(ctx.starts_with("User: m5"));
        assert!(ctx.ends_with("User: m24"));
        assert_eq!(ctx.split("\n\n").count(), 20);
    }

    #[test]
    fn assistant_code_renders_in_code_markers() {
        let messages = vec![user("make it"), assistant(None, Some("let x = 1;"))];
        let ctx = render(&messages);
        assert!(ctx.contains("Assistant: [code]\nlet x = 1;\n[/code]"));
    }

    #[test]
    fn assistant_text_wins_over_code() {
        let messages = vec![assistant(Some("done"), Some("let x = 1;"))];
        assert_eq!(render(&messages), "Assistant: done");
    }

    #[test]
    fn empty_history_renders_empty() {
        assert_eq!(render(&[]), "");
    }
}
