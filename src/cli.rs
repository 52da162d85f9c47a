//! Command-line interface definition for Chatmate
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for chatting, history, agents, sign-in and theming.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chatmate - chat with AI assistants from the terminal
///
/// Pick a built-in or custom agent, chat with it and browse your history.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatmate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to the local session database (sqlite backend)
    #[arg(long, env = "CHATMATE_DB")]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Chatmate
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat with an agent
    Chat {
        /// Agent id to chat with
        #[arg(short, long, default_value = "assistant")]
        agent: String,

        /// Resume a previous session by id (or unique id prefix)
        #[arg(short, long)]
        resume: Option<String>,
    },

    /// Send a single prompt and print the reply
    Ask {
        /// Agent id to ask
        #[arg(short, long, default_value = "assistant")]
        agent: String,

        /// Image to send with the prompt
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Print the reply only once it is complete
        #[arg(long)]
        no_stream: bool,

        /// The prompt
        #[arg(required = true)]
        prompt: Vec<String>,
    },

    /// Browse and delete chat sessions
    Sessions {
        /// Session subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Browse and manage agents
    Agents {
        /// Agent subcommand
        #[command(subcommand)]
        command: AgentCommand,
    },

    /// Sign in, sign out and manage credentials
    Auth {
        /// Auth subcommand
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Show or change appearance settings
    Theme {
        /// Theme subcommand
        #[command(subcommand)]
        command: ThemeCommand,
    },
}

/// Session subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List sessions, newest first
    List {
        /// Maximum number of sessions to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Show the messages of a session
    Show {
        /// Session id or unique id prefix
        id: String,
    },

    /// Delete a session
    Delete {
        /// Session id or unique id prefix
        id: String,
    },
}

/// Agent subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AgentCommand {
    /// List built-in and custom agents
    List {
        /// Only show custom agents
        #[arg(long)]
        custom: bool,
    },

    /// Show an agent's details and system prompt
    Show {
        /// Agent id
        id: String,
    },

    /// Create a custom agent
    Create {
        /// Display name
        #[arg(long)]
        name: String,

        /// Short description
        #[arg(long)]
        description: String,

        /// Category (general, productivity, creative, education, health, technology, custom)
        #[arg(long, default_value = "custom")]
        category: String,

        /// Icon name
        #[arg(long, default_value = "sparkles")]
        icon: String,

        /// System prompt text
        #[arg(long, conflicts_with = "prompt_file")]
        prompt: Option<String>,

        /// Read the system prompt from a file
        #[arg(long)]
        prompt_file: Option<PathBuf>,
    },

    /// Delete a custom agent
    Delete {
        /// Agent id
        id: String,
    },
}

/// Auth subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommand {
    /// Sign in with email and password
    Login {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password (prompted for when omitted)
        #[arg(long, env = "CHATMATE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account
    Signup {
        /// Account email
        #[arg(long)]
        email: String,

        /// Name shown in the app
        #[arg(long)]
        name: String,

        /// Account password (prompted for when omitted)
        #[arg(long, env = "CHATMATE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out and forget the cached account
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Store the generative API key in the system keyring
    SetApiKey {
        /// API key (prompted for when omitted)
        key: Option<String>,

        /// Remove the stored key instead
        #[arg(long, conflicts_with = "key")]
        clear: bool,
    },
}

/// Theme subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ThemeCommand {
    /// Show the current settings, palette and type scale
    Show {
        /// Resolve `system` mode as dark
        #[arg(long)]
        system_dark: bool,
    },

    /// Change settings
    Set {
        /// light, dark or system
        #[arg(long)]
        mode: Option<String>,

        /// Font scale multiplier
        #[arg(long)]
        font_scale: Option<f32>,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_chat_defaults() {
        let cli = Cli::try_parse_from(["chatmate", "chat"]).unwrap();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        if let Commands::Chat { agent, resume } = cli.command {
            assert_eq!(agent, "assistant");
            assert_eq!(resume, None);
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_cli_parse_chat_resume() {
        let cli =
            Cli::try_parse_from(["chatmate", "chat", "--agent", "coder", "--resume", "abc"]).unwrap();
        if let Commands::Chat { agent, resume } = cli.command {
            assert_eq!(agent, "coder");
            assert_eq!(resume, Some("abc".to_string()));
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_cli_parse_ask_joins_prompt_words() {
        let cli = Cli::try_parse_from([
            "chatmate", "ask", "--image", "cat.png", "what", "is", "this",
        ])
        .unwrap();
        if let Commands::Ask {
            agent,
            image,
            no_stream,
            prompt,
        } = cli.command
        {
            assert_eq!(agent, "assistant");
            assert_eq!(image, Some(PathBuf::from("cat.png")));
            assert!(!no_stream);
            assert_eq!(prompt.join(" "), "what is this");
        } else {
            panic!("Expected Ask command");
        }
    }

    #[test]
    fn test_cli_ask_requires_prompt() {
        assert!(Cli::try_parse_from(["chatmate", "ask"]).is_err());
    }

    #[test]
    fn test_cli_parse_sessions_list_limit() {
        let cli = Cli::try_parse_from(["chatmate", "sessions", "list", "-n", "5"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Sessions {
                command: SessionCommand::List { limit: 5 }
            }
        ));
    }

    #[test]
    fn test_cli_agent_create_prompt_conflicts_with_file() {
        let result = Cli::try_parse_from([
            "chatmate",
            "agents",
            "create",
            "--name",
            "Chef",
            "--description",
            "Cooks things",
            "--prompt",
            "x",
            "--prompt-file",
            "p.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_theme_set() {
        let cli = Cli::try_parse_from([
            "chatmate",
            "theme",
            "set",
            "--mode",
            "dark",
            "--font-scale",
            "1.2",
        ])
        .unwrap();
        if let Commands::Theme {
            command: ThemeCommand::Set { mode, font_scale },
        } = cli.command
        {
            assert_eq!(mode.as_deref(), Some("dark"));
            assert_eq!(font_scale, Some(1.2));
        } else {
            panic!("Expected Theme Set command");
        }
    }

    #[test]
    fn test_cli_parse_auth_logout() {
        let cli = Cli::try_parse_from(["chatmate", "auth", "logout"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Auth {
                command: AuthCommand::Logout
            }
        ));
    }

    #[test]
    fn test_cli_parse_set_api_key_clear() {
        let cli = Cli::try_parse_from(["chatmate", "auth", "set-api-key", "--clear"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Auth {
                command: AuthCommand::SetApiKey {
                    key: None,
                    clear: true
                }
            }
        ));

        assert!(Cli::try_parse_from(["chatmate", "auth", "set-api-key", "k", "--clear"]).is_err());
    }
}
