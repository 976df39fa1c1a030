//! CLI entry point for crm-chat

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{Confirm, Input};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crm_chat_client::HttpAgentClient;
use crm_chat_core::config::{Config, ConfigLoader, EnvironmentConfig};
use crm_chat_core::logging::init_logging;
use crm_chat_core::session::{ChatTurn, TurnRole};
use crm_chat_engine::{ChatEngine, Notice, RenderModel, UserAction};

mod clipboard;
use clipboard::Clipboard;

#[derive(Parser)]
#[command(name = "crm-chat")]
#[command(about = "Terminal front-end for the Customer Relation Manager agent")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,

    /// Deployment environment to talk to
    #[arg(short, long, global = true)]
    environment: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize crm-chat configuration
    Onboard,
    /// Start an interactive chat with the agent
    Chat,
    /// Send a single message and print the reply
    Ask {
        /// Message to send
        #[arg(short, long)]
        message: String,
    },
    /// Show configuration information
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_loader = if let Some(dir) = cli.config_dir {
        ConfigLoader::with_dir(dir)
    } else {
        ConfigLoader::new()
    };

    match cli.command {
        Commands::Onboard => {
            tracing_subscriber::fmt::init();
            run_onboard(&config_loader)?;
        }
        Commands::Chat => {
            let config = config_loader.load()?;
            let _guard = init_logging(&config.logging);
            run_chat(&config, cli.environment.as_deref()).await?;
        }
        Commands::Ask { message } => {
            let config = config_loader.load()?;
            let _guard = init_logging(&config.logging);
            run_ask(&config, cli.environment.as_deref(), &message).await?;
        }
        Commands::Status => {
            let config = config_loader.load()?;
            run_status(&config_loader, &config, cli.environment.as_deref());
        }
    }

    Ok(())
}

fn build_engine(config: &Config, environment: Option<&str>) -> Result<(String, ChatEngine)> {
    let (name, env) = config.resolve_environment(environment)?;
    info!("Using environment {} ({})", name, env.endpoint);

    let client = Arc::new(HttpAgentClient::from_environment(env));
    Ok((name.to_string(), ChatEngine::new(client)))
}

/// Run the interactive chat loop
async fn run_chat(config: &Config, environment: Option<&str>) -> Result<()> {
    let (env_name, mut engine) = build_engine(config, environment)?;
    let mut clipboard = Clipboard::new();

    println!(
        "{}",
        style("Customer Relation Manager (CRM)").bold().cyan()
    );
    println!("Environment: {}", env_name);
    println!(
        "{}",
        style("Ask the bot about customer... (/new /copy /trace /quit)").dim()
    );
    println!();
    render_transcript(engine.state().transcript());

    loop {
        let line: String = match Input::new()
            .with_prompt("you")
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            // e.g. end of input: leave the chat
            Err(_) => break,
        };

        let action = match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/new" => UserAction::ClearSession,
            "/copy" => UserAction::CopyLastReply,
            "/trace" => UserAction::ShowLastTrace,
            text => UserAction::Submit(text.to_string()),
        };

        if matches!(action, UserAction::Submit(_)) {
            println!("{}", style("Processing...").cyan());
        }

        let model = engine.apply(action).await;
        render(&model, &mut clipboard);
    }

    Ok(())
}

/// Send a single message and print the reply
async fn run_ask(config: &Config, environment: Option<&str>, message: &str) -> Result<()> {
    let (_env_name, mut engine) = build_engine(config, environment)?;

    println!("{}", style("Processing...").cyan());
    let model = engine.apply(UserAction::Submit(message.to_string())).await;

    if model.notice == Some(Notice::EmptyInput) {
        println!("Message must not be empty.");
        println!("Example: crm-chat ask --message 'What is the balance of customer X?'");
        return Ok(());
    }

    for turn in &model.appended {
        if turn.role == TurnRole::Assistant {
            println!("\n{}", style("Response:").bold());
            println!("{}", turn.text);
        }
    }

    Ok(())
}

/// Show configuration information
fn run_status(loader: &ConfigLoader, config: &Config, environment: Option<&str>) {
    println!("{}", style("CRM Chat Status").bold().cyan());
    println!();

    println!("{}", style("Configuration:").bold());
    println!("  Config directory: {}", loader.config_dir().display());
    println!(
        "  Selected environment: {}",
        environment.unwrap_or(&config.environment)
    );
    println!();

    println!("{}", style("Environments:").bold());
    if config.environments.is_empty() {
        println!("  none configured (run 'crm-chat onboard')");
        return;
    }

    let mut names: Vec<_> = config.environments.keys().collect();
    names.sort();
    for name in names {
        let env = &config.environments[name];
        let credentials = if env.api_key.is_empty() {
            style("no credentials").yellow()
        } else {
            style("credentials configured").green()
        };
        println!(
            "  {}: {} (agent: {}, {})",
            name, env.endpoint, env.agent_id, credentials
        );
    }
}

/// Run the onboard wizard
fn run_onboard(loader: &ConfigLoader) -> Result<()> {
    println!("{}", style("Welcome to CRM Chat!").bold().cyan());
    println!("Let's set up your configuration.\n");

    let config_path = loader.config_dir().join("config.json");
    if config_path.exists() {
        let overwrite = Confirm::new()
            .with_prompt("Configuration already exists. Overwrite?")
            .default(false)
            .interact()?;
        if !overwrite {
            println!("Onboard cancelled.");
            return Ok(());
        }
    }

    let environment: String = Input::new()
        .with_prompt("Environment name")
        .default("default".to_string())
        .interact_text()?;

    let endpoint: String = Input::new()
        .with_prompt("Agent runtime endpoint")
        .interact_text()?;

    let agent_id: String = Input::new()
        .with_prompt("Agent id")
        .interact_text()?;

    let api_key: String = Input::new()
        .with_prompt("API key (empty for unauthenticated endpoints)")
        .allow_empty(true)
        .interact_text()?;

    let mut config = Config::default();
    config.environment = environment.clone();
    config.environments.insert(
        environment,
        EnvironmentConfig {
            endpoint,
            agent_id,
            api_key,
            ..EnvironmentConfig::default()
        },
    );

    loader.save(&config)?;

    println!(
        "\n{}",
        style("Configuration saved successfully!").green().bold()
    );
    println!("Config location: {}", config_path.display());
    println!("\nYou can now run:");
    println!("  {} - Start chatting", style("crm-chat chat").cyan());
    println!(
        "  {} - Ask a single question",
        style("crm-chat ask --message 'What is the balance of customer X?'").cyan()
    );

    Ok(())
}

fn render_transcript(transcript: &[ChatTurn]) {
    for turn in transcript {
        render_turn(turn);
    }
}

fn render_turn(turn: &ChatTurn) {
    // Human turns are already on screen as the input line
    if turn.role == TurnRole::Assistant {
        println!("{} {}", style("agent>").green().bold(), turn.text);
    }
}

fn render(model: &RenderModel, clipboard: &mut Clipboard) {
    for turn in &model.appended {
        render_turn(turn);
    }

    match &model.notice {
        Some(Notice::SessionCleared) => {
            println!("{}", style("Started a new conversation.").yellow());
        }
        Some(Notice::CopyPayload(payload)) => match clipboard.set_text(payload) {
            Ok(()) => {
                println!(
                    "{}",
                    style(format!("Copied to clipboard: {}", payload)).green()
                );
            }
            Err(err) => {
                warn!("Clipboard unavailable: {}", err);
                println!(
                    "{}",
                    style(format!("Clipboard unavailable, copy manually: {}", payload)).yellow()
                );
            }
        },
        Some(Notice::NothingToCopy) => {
            println!("{}", style("Nothing to copy yet.").dim());
        }
        Some(Notice::Trace(trace)) => {
            println!("{}", style(trace).dim());
        }
        Some(Notice::NoTrace) => {
            println!("{}", style("No trace recorded for the last reply.").dim());
        }
        Some(Notice::EmptyInput) | None => {}
    }
}
