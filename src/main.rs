use anyhow::{bail, Result};
use clap::Parser;
use fs_err as fs;
use std::path::PathBuf;

mod cli;
mod config;
mod context;
mod engine;
mod errors;
mod intent;
mod log;
mod parse;
mod project;
mod provider;
mod store;
mod ux;
mod wire;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();

    let mut cfg = config::Config::from_env();
    cfg.projects_root = args.projects_root.clone();
    if let Some(db) = &args.db {
        cfg.db_path = Some(db.clone());
    }
    let eng = engine::Engine::new(cfg);

    if args.list_chats {
        let chats = eng.list_chats(&args.owner)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&chats)?);
        } else {
            ux::print_chat_list(&chats);
        }
        return Ok(());
    }
    if let Some(id) = &args.show_chat {
        match eng.get_chat(id, &args.owner)? {
            Some(chat) if args.json => println!("{}", serde_json::to_string_pretty(&chat)?),
            Some(chat) => ux::print_chat(&chat),
            None => bail!("chat {id} not found"),
        }
        return Ok(());
    }

    match args.endpoint {
        cli::Endpoint::Code => {
            let prompt = args.prompt.clone().unwrap_or_default();
            let result = eng
                .generate_code(&args.owner, &prompt, Some(&args.provider))
                .await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                ux::print_code_result(&result);
            }
        }
        cli::Endpoint::Project => {
            let prompt = args.prompt.clone().unwrap_or_default();
            let result = eng
                .generate_project(&args.owner, &prompt, Some(&args.provider), args.chat_id.as_deref())
                .await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                ux::print_project_result(&result);
            }
        }
        cli::Endpoint::Send => {
            let mut uploads = Vec::new();
            for path in &args.upload {
                let content = fs::read(path)?;
                let name = PathBuf::from(path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                uploads.push(engine::UploadedFile { name, content });
            }
            let result = eng
                .send(
                    &args.owner,
                    engine::SendRequest {
                        prompt: args.prompt.clone(),
                        provider: Some(args.provider.clone()),
                        chat_id: args.chat_id.clone(),
                        project_folder: args.project_folder.clone().map(PathBuf::from),
                        uploads,
                    },
                )
                .await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                ux::print_send_result(&result);
            }
        }
    }
    Ok(())
}
