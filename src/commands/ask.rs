//! One-shot prompt handler
//!
//! Creates a session with the chosen agent, sends a single prompt (optionally
//! with an image) and prints the reply. The session is saved like any other.

use super::chat::send_message;
use super::AppContext;
use crate::config::Config;
use crate::error::Result;
use crate::providers::{create_client, InlineImage};
use std::path::PathBuf;

/// Run the `ask` command
pub async fn run_ask(
    config: Config,
    agent_id: String,
    prompt: String,
    image: Option<PathBuf>,
    stream: bool,
) -> Result<()> {
    let mut ctx = AppContext::open(config).await?;
    ctx.load_sessions().await?;
    let agent = ctx.store.find_agent(&agent_id)?.clone();
    let image = match image {
        Some(path) => Some((InlineImage::from_path(&path)?, path)),
        None => None,
    };
    let client = create_client(&ctx.config.provider)?;

    ctx.store.create_session(&agent);
    let mut stdout = std::io::stdout();
    let result = send_message(
        &mut ctx.store,
        client.as_ref(),
        &prompt,
        image,
        stream,
        &mut stdout,
    )
    .await;

    if let Err(e) = ctx.store.save_active_session(&ctx.user_id).await {
        tracing::warn!("Failed to save session: {:#}", e);
    }
    ctx.persist_snapshot()?;
    result.map(|_| ())
}
