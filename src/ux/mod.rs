use colored::Colorize;

use crate::store::{Chat, ChatSummary, Role};
use crate::wire::{CodeResult, ProjectResult, SendResult};

pub fn print_send_result(result: &SendResult) {
    match result {
        SendResult::ModifyFiles { folder, files, chat_id } => {
            println!("{} {}", "[UPLOAD]".cyan().bold(), folder);
            for f in files {
                println!("  - {f}");
            }
            print_chat_id(chat_id);
        }
        SendResult::GenerateProject { folder, files, .. } => {
            println!("{} {}", "[PROJECT]".green().bold(), folder);
            for f in files {
                println!("  - {f}");
            }
        }
        SendResult::Code { code, explanation, chat_id } => {
            println!("{}", "[CODE]".yellow().bold());
            println!("{code}");
            println!("{}", explanation.dimmed());
            print_chat_id(chat_id);
        }
        SendResult::Chat { text, explanation, chat_id } => {
            println!("{}", "[CHAT]".magenta().bold());
            println!("{text}");
            println!("{}", explanation.dimmed());
            print_chat_id(chat_id);
        }
    }
}

pub fn print_code_result(result: &CodeResult) {
    println!("{}", "[CODE]".yellow().bold());
    println!("{}", result.code);
    println!("{}", result.explanation.dimmed());
}

pub fn print_project_result(result: &ProjectResult) {
    println!("{} {}", "[PROJECT]".green().bold(), result.folder);
    for f in &result.files {
        println!("  - {f}");
    }
}

pub fn print_chat_list(chats: &[ChatSummary]) {
    if chats.is_empty() {
        println!("(no conversations)");
        return;
    }
    for c in chats {
        println!("{}  {}  {}", c.id.dimmed(), c.updated_at, c.title.bold());
    }
}

pub fn print_chat(chat: &Chat) {
    println!("{} {}", "[CHAT]".magenta().bold(), chat.title.bold());
    for m in &chat.messages {
        match m.role {
            Role::User => {
                println!("{} {}", "user:".blue().bold(), m.prompt.as_deref().unwrap_or(""));
            }
            Role::Assistant => {
                let content = m
                    .text
                    .as_deref()
                    .or(m.code.as_deref())
                    .or(m.summary.as_deref())
                    .unwrap_or("");
                println!("{} {}", "assistant:".green().bold(), content);
            }
        }
    }
}

fn print_chat_id(chat_id: &Option<String>) {
    if let Some(id) = chat_id {
        println!("{}", format!("chat: {id}").dimmed());
    }
}
