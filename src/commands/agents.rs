use crate::agents::AgentDraft;
use crate::cli::AgentCommand;
use crate::config::Config;
use crate::error::{ChatmateError, FieldError, Result};
use crate::models::{Agent, AgentCategory};
use colored::Colorize;
use prettytable::{format, Table};

use super::AppContext;

/// Handle agent commands
pub async fn handle_agents(config: Config, command: AgentCommand) -> Result<()> {
    let mut ctx = AppContext::open(config).await?;

    match command {
        AgentCommand::List { custom } => {
            let agents: Vec<&Agent> = ctx
                .store
                .agents()
                .iter()
                .filter(|a| !custom || a.is_custom)
                .collect();
            if agents.is_empty() {
                println!("{}", "No custom agents yet.".yellow());
                println!(
                    "Create one with {}",
                    "chatmate agents create --name <NAME> ...".cyan()
                );
                return Ok(());
            }
            println!("\nAgents:");
            agent_table(&agents).printstd();
            println!();
        }
        AgentCommand::Show { id } => {
            let agent = ctx.store.find_agent(&id)?;
            println!("\n{} {}", agent.name.bold(), format!("({})", agent.id).dimmed());
            println!("{}", agent.description);
            println!(
                "Category: {}  Icon: {}{}",
                agent.category,
                agent.icon,
                if agent.is_custom { "  [custom]" } else { "" }
            );
            println!("\n{}", "System prompt:".bold());
            println!("{}\n", agent.system_prompt);
        }
        AgentCommand::Create {
            name,
            description,
            category,
            icon,
            prompt,
            prompt_file,
        } => {
            let system_prompt = match (prompt, prompt_file) {
                (Some(p), _) => p,
                (None, Some(path)) => std::fs::read_to_string(&path)?,
                (None, None) => String::new(),
            };
            let draft = AgentDraft {
                name,
                description,
                category: parse_category(&category)?,
                icon,
                system_prompt,
            };
            let agent = draft.into_agent()?;
            let id = agent.id.clone();
            ctx.store.save_custom_agent(&ctx.user_id, agent).await?;
            ctx.persist_snapshot()?;
            println!("{}", format!("Created agent {}", id).green());
            println!("Chat with it: {}", format!("chatmate chat --agent {}", id).cyan());
        }
        AgentCommand::Delete { id } => {
            ctx.store.delete_custom_agent(&ctx.user_id, &id).await?;
            ctx.persist_snapshot()?;
            println!("{}", format!("Deleted agent {}", id).green());
        }
    }

    Ok(())
}

fn parse_category(value: &str) -> Result<AgentCategory> {
    value
        .parse::<AgentCategory>()
        .map_err(|e| ChatmateError::Validation(vec![FieldError::new("category", e)]).into())
}

fn agent_table(agents: &[&Agent]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Name".bold(),
        "Category".bold(),
        "Description".bold()
    ]);

    for agent in agents {
        let id = if agent.is_custom {
            agent.id.yellow()
        } else {
            agent.id.cyan()
        };
        let description = if agent.description.chars().count() > 60 {
            let short: String = agent.description.chars().take(57).collect();
            format!("{}...", short)
        } else {
            agent.description.clone()
        };
        table.add_row(prettytable::row![id, agent.name, agent.category, description]);
    }

    table
}
