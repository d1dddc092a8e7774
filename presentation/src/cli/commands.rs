//! CLI command definitions

use clap::{Parser, Subcommand};
use colloquy_domain::AgentProfile;
use std::path::PathBuf;

/// CLI arguments for colloquy
#[derive(Parser, Debug)]
#[command(name = "colloquy")]
#[command(author, version, about = "Watch LLM agents debate, cut in, and call a judge")]
#[command(long_about = r#"
Colloquy seats two or more LLM agents in a room and lets them take turns
on a topic, streaming every reply as it is generated.

While they talk you can type into the terminal:
  <text>      Cut in; the current speaker stops and everyone hears you
  /judge      Ask an impartial judge for a verdict and end the debate
  /quit       Leave; the conversation is saved and can be resumed
  /help       Show these commands

Configuration files are loaded from (in priority order):
1. COLLOQUY_* environment variables (e.g. COLLOQUY_PROVIDER__MODEL)
2. --config <path>     Explicit config file
3. ./colloquy.toml     Project-level config
4. ~/.config/colloquy/config.toml   Global config

Example:
  colloquy new --topic "Is free will an illusion?"
  colloquy new --topic "Tabs or spaces" --agent "Kernighan=You are terse." --agent "Knuth=You are meticulous."
  colloquy resume 5f0c...
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a new conversation
    New {
        /// Topic the moderator opens with
        #[arg(short, long)]
        topic: String,

        /// Agent as NAME=PROMPT (repeatable; overrides the configured roster)
        #[arg(short, long = "agent", value_name = "NAME=PROMPT")]
        agents: Vec<AgentProfile>,
    },

    /// Continue a stored conversation where it left off
    Resume {
        /// Conversation id
        id: String,
    },

    /// List stored conversations, newest first
    List,

    /// Print a stored conversation's transcript
    Show {
        /// Conversation id
        id: String,
    },

    /// Delete a stored conversation
    Delete {
        /// Conversation id
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_new_with_agents() {
        let cli = Cli::try_parse_from([
            "colloquy",
            "new",
            "--topic",
            "free will",
            "--agent",
            "Hume=You are Hume.",
            "-a",
            "Kant=You are Kant.",
        ])
        .unwrap();

        match cli.command {
            Some(Command::New { topic, agents }) => {
                assert_eq!(topic, "free will");
                assert_eq!(agents.len(), 2);
                assert_eq!(agents[1], AgentProfile::new("Kant", "You are Kant."));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_malformed_agent() {
        assert!(Cli::try_parse_from(["colloquy", "new", "-t", "x", "-a", "NoPrompt"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["colloquy", "list", "-vv", "--no-color"]).unwrap();
        assert_eq!(cli.command, Some(Command::List));
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_color);
    }

    #[test]
    fn test_show_config_without_command() {
        let cli = Cli::try_parse_from(["colloquy", "--show-config"]).unwrap();
        assert!(cli.show_config);
        assert!(cli.command.is_none());
    }
}
