use crate::cli::SessionCommand;
use crate::config::Config;
use crate::error::Result;
use crate::models::{ChatSession, Message, Role};
use colored::Colorize;
use prettytable::{format, Table};

use super::AppContext;

/// Handle session commands
pub async fn handle_sessions(config: Config, command: SessionCommand) -> Result<()> {
    let mut ctx = AppContext::open(config).await?;
    ctx.load_sessions().await?;

    match command {
        SessionCommand::List { limit } => {
            let sessions = ctx.store.sessions();
            if sessions.is_empty() {
                println!("{}", "No chat sessions found.".yellow());
                return Ok(());
            }

            let table = session_table(sessions.iter().take(limit));
            println!("\nChat Sessions:");
            table.printstd();
            if sessions.len() > limit {
                println!("({} more not shown)", sessions.len() - limit);
            }
            println!();
            println!(
                "Use {} to resume a session.",
                "chatmate chat --resume <ID>".cyan()
            );
            println!();
        }
        SessionCommand::Show { id } => {
            let session_id = ctx.store.resolve_session_id(&id)?;
            let Some(session) = ctx.store.sessions().iter().find(|s| s.id == session_id) else {
                return Ok(());
            };
            println!(
                "\n{} {}",
                session.title().bold(),
                format!("({})", session.short_id()).dimmed()
            );
            println!(
                "Agent: {}  Created: {}",
                session.agent_name,
                session.created_at.format("%Y-%m-%d %H:%M")
            );
            println!();
            for message in &session.messages {
                println!("{}", format_message(message, &session.agent_name));
            }
            println!();
        }
        SessionCommand::Delete { id } => {
            let session_id = ctx.store.resolve_session_id(&id)?;
            ctx.store.delete_session(&session_id, &ctx.user_id).await?;
            ctx.persist_snapshot()?;
            println!("{}", format!("Deleted session {}", &session_id[..8.min(session_id.len())]).green());
        }
    }

    Ok(())
}

fn session_table<'a>(sessions: impl Iterator<Item = &'a ChatSession>) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Title".bold(),
        "Agent".bold(),
        "Messages".bold(),
        "Last Updated".bold()
    ]);

    for session in sessions {
        let updated = session.updated_at.format("%Y-%m-%d %H:%M").to_string();
        table.add_row(prettytable::row![
            session.short_id().cyan(),
            session.title(),
            session.agent_name,
            session.messages.len(),
            updated
        ]);
    }

    table
}

/// One transcript line: speaker, time and text
pub fn format_message(message: &Message, agent_name: &str) -> String {
    let time = message.timestamp.format("%H:%M");
    let speaker = match message.role {
        Role::User => "you".green().bold(),
        Role::Assistant => agent_name.to_lowercase().blue().bold(),
    };
    let mut line = format!("[{}] {}> {}", time, speaker, message.content);
    if let Some(image) = &message.image {
        let label = image.path.as_deref().unwrap_or("inline image");
        line.push_str(&format!(" {}", format!("[{}: {}]", image.mime_type, label).dimmed()));
    }
    line
}
