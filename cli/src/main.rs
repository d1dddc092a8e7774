//! CLI entrypoint for colloquy
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use colloquy_application::{ConversationLogger, ConversationRepository};
use colloquy_domain::{AgentProfile, Conversation};
use colloquy_infrastructure::config::validate_agents;
use colloquy_infrastructure::{
    ConfigLoader, FileConfig, JsonFileConversationStore, JsonlConversationLogger,
    OpenAiCompatibleGateway,
};
use colloquy_presentation::{
    Cli, Command, ConsoleRenderer, DebateSession, OutputConfig, SessionEnd, spawn_stdin_lines,
};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?
    };
    for warning in config.validate()? {
        warn!("Config: {}", warning);
    }

    if cli.no_color || !config.output.color {
        colored::control::set_override(false);
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    info!("Starting colloquy");

    // === Dependency Injection ===
    let data_dir = config.storage.resolved_data_dir();
    let repository: Arc<dyn ConversationRepository> =
        Arc::new(JsonFileConversationStore::new(&data_dir));

    match command {
        Command::New { topic, agents } => {
            let agents = if agents.is_empty() {
                config.agents.clone()
            } else {
                agents
            };
            start_session(&config, repository, new_conversation(topic, agents)?).await
        }
        Command::Resume { id } => {
            let conversation = repository
                .get(&id)
                .await
                .with_context(|| format!("Cannot resume {}", id))?;
            if conversation.is_concluded() {
                println!(
                    "{}",
                    "This debate already has a verdict; continuing anyway.".yellow()
                );
            }
            start_session(&config, repository, conversation).await
        }
        Command::List => {
            let conversations = repository.list().await?;
            print!("{}", ConsoleRenderer::format_conversation_list(&conversations));
            Ok(())
        }
        Command::Show { id } => {
            let conversation = repository.get(&id).await?;
            print!("{}", ConsoleRenderer::format_transcript(&conversation));
            Ok(())
        }
        Command::Delete { id } => {
            repository.delete(&id).await?;
            println!("Deleted {}", id);
            Ok(())
        }
    }
}

fn new_conversation(topic: String, agents: Vec<AgentProfile>) -> Result<Conversation> {
    if topic.trim().is_empty() {
        bail!("Topic cannot be empty.");
    }
    validate_agents(&agents)?;
    Ok(Conversation::new(topic, agents))
}

async fn start_session(
    config: &FileConfig,
    repository: Arc<dyn ConversationRepository>,
    conversation: Conversation,
) -> Result<()> {
    let gateway = Arc::new(OpenAiCompatibleGateway::from_config(&config.provider)?);

    let mut session = DebateSession::new(gateway, repository)
        .with_room_config(config.room.to_room_config())
        .with_output_config(OutputConfig {
            color: config.output.color,
            show_progress: true,
        });

    if config.storage.transcripts
        && let Some(logger) = JsonlConversationLogger::for_conversation(
            config.storage.transcript_dir(),
            &conversation.id,
        )
    {
        info!("Transcript: {}", logger.path().display());
        let logger: Arc<dyn ConversationLogger> = Arc::new(logger);
        session = session.with_logger(logger);
    }

    print_banner(&conversation);

    let outcome = session.run(conversation, spawn_stdin_lines()).await?;

    println!();
    match outcome.ending {
        SessionEnd::Judged => println!("{}", "The debate is concluded.".green().bold()),
        _ => println!(
            "Saved. Continue with: {}",
            format!("colloquy resume {}", outcome.conversation.id).cyan()
        ),
    }
    Ok(())
}

fn print_banner(conversation: &Conversation) {
    let agents: Vec<&str> = conversation
        .agents
        .iter()
        .map(|a| a.name.as_str())
        .collect();

    println!();
    println!("{} {}", "Topic:".cyan().bold(), conversation.topic);
    println!("{} {}", "Agents:".cyan().bold(), agents.join(", "));
    println!("{} {}", "Id:".cyan().bold(), conversation.id);
    println!(
        "{}",
        "Type to cut in, /judge for a verdict, /quit to leave, /help for more.".dimmed()
    );
}

/// Initialize logging based on verbosity level, optionally teeing to a file.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Cannot open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
