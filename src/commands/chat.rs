//! Interactive chat handler
//!
//! Opens (or resumes) a session with an agent and runs a readline loop.
//! Each prompt is appended to the session, sent with the prior turns as
//! history and the agent's system prompt as instruction, and the streamed
//! reply is printed as it arrives.

use super::special_commands::{self, parse_special_command, SpecialCommand};
use super::{report_error, AppContext};
use crate::config::Config;
use crate::error::{ChatmateError, Result};
use crate::models::{Agent, Message};
use crate::providers::{create_client, GenerationRequest, GenerativeClient, InlineImage};
use crate::store::ChatStore;

use colored::Colorize;
use futures::StreamExt;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Send `prompt` to the active session's agent and record both turns
///
/// The user message is appended before the call and stays in the session if
/// the call fails. With `stream`, chunks are written to `out` as they arrive;
/// otherwise the full reply is written once.
///
/// # Errors
///
/// Returns `SessionNotFound` with no active session, and the provider error
/// (already mapped to `EmptyResponse`, `SafetyBlocked`, `RateLimited` where
/// applicable) if generation fails
pub async fn send_message(
    store: &mut ChatStore,
    client: &dyn GenerativeClient,
    prompt: &str,
    image: Option<(InlineImage, PathBuf)>,
    stream: bool,
    out: &mut impl Write,
) -> Result<String> {
    let (history, system_prompt) = {
        let session = store
            .active_session()
            .ok_or_else(|| ChatmateError::SessionNotFound("no active session".to_string()))?;
        let agent = store.find_agent(&session.agent_id)?;
        (session.messages.clone(), agent.system_prompt.clone())
    };

    let mut request = GenerationRequest::new(prompt)
        .with_system_instruction(system_prompt)
        .with_history(history);

    let mut user_message = Message::user(prompt);
    if let Some((image, path)) = image {
        user_message = user_message.with_image(image.to_image_ref(Some(&path)));
        request = request.with_image(image);
    }
    store.add_message(user_message);

    tracing::debug!(
        "Sending prompt with {} history messages to {}",
        request.history.len(),
        client.model()
    );

    let reply = if stream {
        let mut chunks = client.generate_stream(&request).await?;
        let mut reply = String::new();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            write!(out, "{}", chunk)?;
            out.flush()?;
            reply.push_str(&chunk);
        }
        writeln!(out)?;
        reply
    } else {
        let reply = client.generate(&request).await?;
        writeln!(out, "{}", reply)?;
        reply
    };

    if reply.trim().is_empty() {
        return Err(ChatmateError::EmptyResponse.into());
    }

    store.add_message(Message::assistant(reply.clone()));
    Ok(reply)
}

/// Start interactive chat mode
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `agent_id` - Agent for a new session
/// * `resume` - Session id or prefix to continue instead
pub async fn run_chat(config: Config, agent_id: String, resume: Option<String>) -> Result<()> {
    let mut ctx = AppContext::open(config).await?;
    ctx.load_sessions().await?;
    let client = create_client(&ctx.config.provider)?;

    let mut agent = match &resume {
        Some(prefix) => {
            let session_id = ctx.store.resolve_session_id(prefix)?;
            ctx.store.set_active_session(&session_id)?;
            let agent_id = ctx
                .store
                .active_session()
                .map(|s| s.agent_id.clone())
                .unwrap_or_default();
            ctx.store.find_agent(&agent_id)?.clone()
        }
        None => {
            // A session restored from the cache is not resumed implicitly.
            ctx.store.clear_active_session();
            ctx.store.find_agent(&agent_id)?.clone()
        }
    };

    let mut rl = DefaultEditor::new()?;
    print_welcome_banner(&agent, client.model().as_str());
    if resume.is_some() {
        print_transcript(&ctx.store);
    }

    let mut pending_image: Option<(InlineImage, PathBuf)> = None;

    loop {
        let prompt = format!("{} ", "you>".green().bold());
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                match parse_special_command(trimmed) {
                    Ok(SpecialCommand::Exit) => break,
                    Ok(SpecialCommand::Help) => {
                        special_commands::print_help();
                        continue;
                    }
                    Ok(SpecialCommand::ShowStatus) => {
                        print_status(&ctx, &agent, pending_image.as_ref().map(|(_, p)| p.as_path()));
                        continue;
                    }
                    Ok(SpecialCommand::NewSession) => {
                        agent = ctx.store.find_agent(&agent.id)?.clone();
                        ctx.store.clear_active_session();
                        println!("{}\n", format!("Started a new chat with {}", agent.name).cyan());
                        continue;
                    }
                    Ok(SpecialCommand::DetachImage) => {
                        pending_image = None;
                        println!("{}", "Image removed.".cyan());
                        continue;
                    }
                    Ok(SpecialCommand::AttachImage(path)) => {
                        match InlineImage::from_path(&path) {
                            Ok(image) => {
                                println!(
                                    "{}",
                                    format!("Attached {} ({})", path.display(), image.mime_type)
                                        .cyan()
                                );
                                pending_image = Some((image, path));
                            }
                            Err(e) => report_error(&e),
                        }
                        continue;
                    }
                    Ok(SpecialCommand::None) => {}
                    Err(e) => {
                        eprintln!("{}", e.to_string().yellow());
                        continue;
                    }
                }

                ensure_session(&mut ctx.store, &agent);
                print!("{} ", format!("{}>", agent.name.to_lowercase()).blue().bold());
                let mut stdout = std::io::stdout();
                let result = send_message(
                    &mut ctx.store,
                    client.as_ref(),
                    trimmed,
                    pending_image.take(),
                    true,
                    &mut stdout,
                )
                .await;
                if let Err(e) = result {
                    println!();
                    report_error(&e);
                }

                if let Err(e) = ctx.store.save_active_session(&ctx.user_id).await {
                    tracing::warn!("Failed to save session: {:#}", e);
                }
                if let Err(e) = ctx.persist_snapshot() {
                    tracing::warn!("Failed to cache chat state: {:#}", e);
                }
                println!();
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    ctx.persist_snapshot()?;
    if let Some(session) = ctx.store.active_session() {
        if !session.messages.is_empty() {
            println!(
                "Use {} to continue this chat.",
                format!("chatmate chat --resume {}", session.short_id()).cyan()
            );
        }
    }
    Ok(())
}

/// Make sure there is an active session, starting one with `agent` if not
///
/// Sessions are opened on the first prompt so that a chat left without
/// typing anything leaves nothing behind.
fn ensure_session(store: &mut ChatStore, agent: &Agent) {
    if store.active_session().is_none() {
        store.create_session(agent);
    }
}

fn print_welcome_banner(agent: &Agent, model: &str) {
    println!();
    println!("{}", format!("Chatting with {}", agent.name).bold());
    println!("{}", agent.description.dimmed());
    println!("Model: {}", model.cyan());
    println!("Type '/help' for available commands, 'exit' to quit\n");
}

fn print_status(ctx: &AppContext, agent: &Agent, pending_image: Option<&Path>) {
    println!("\nAgent:   {} ({})", agent.name.bold(), agent.id);
    if let Some(session) = ctx.store.active_session() {
        println!("Session: {} ({} messages)", session.short_id().cyan(), session.messages.len());
    }
    match pending_image {
        Some(path) => println!("Image:   {}", path.display()),
        None => println!("Image:   none"),
    }
    println!();
}

fn print_transcript(store: &ChatStore) {
    let Some(session) = store.active_session() else {
        return;
    };
    for message in &session.messages {
        println!("{}", super::sessions::format_message(message, &session.agent_name));
    }
    println!();
}
