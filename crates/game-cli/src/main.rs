use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use game_core::{config::redact, create_agent, ConfigLoader, GameClient, GameConfig};
use log::LevelFilter;
use std::path::Path;

#[derive(Parser, Debug)]
#[clap(name = "game", author, version, about = "Command-line client for the GAME agent API")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(
        long,
        short,
        default_value = "game.yaml",
        help = "YAML configuration file; GAME_* environment variables are used when it is missing"
    )]
    config: String,

    #[clap(long, short, help = "Log level (defaults to logging.level from the config)")]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Exchange the API key for an access token
    Token,
    /// Register an agent and print its id
    CreateAgent {
        #[clap(long)]
        name: Option<String>,

        #[clap(long)]
        description: Option<String>,

        #[clap(long)]
        goal: Option<String>,
    },
    /// Print the resolved configuration with the API key redacted
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load(&cli.config).await?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    env_logger::Builder::new()
        .filter_level(level.parse().unwrap_or(LevelFilter::Info))
        .init();

    match cli.command {
        Commands::Token => request_token(config).await,
        Commands::CreateAgent {
            name,
            description,
            goal,
        } => register_agent(config, name, description, goal).await,
        Commands::Config => {
            print_config(&config);
            Ok(())
        }
    }
}

async fn load(path: &str) -> Result<GameConfig> {
    let config = if Path::new(path).exists() {
        ConfigLoader::from_file(path).await
    } else {
        ConfigLoader::from_env()
    };
    config.with_context(|| format!("Failed to load configuration from {}", path))
}

async fn request_token(config: GameConfig) -> Result<()> {
    let client = GameClient::new(config.client)?;
    log::info!("Requesting access token from {}", client.base_url());
    client.access_token().await?;
    println!("Access token obtained from {}", client.base_url());
    Ok(())
}

async fn register_agent(
    config: GameConfig,
    name: Option<String>,
    description: Option<String>,
    goal: Option<String>,
) -> Result<()> {
    let defaults = config.agent.clone().unwrap_or_default();
    let name = name.unwrap_or(defaults.name);
    let description = description.unwrap_or(defaults.description);
    let goal = goal.unwrap_or(defaults.goal);

    let client = GameClient::new(config.client)?;
    let agent_id = create_agent(&client, &name, &description, &goal)
        .await
        .with_context(|| format!("Failed to register agent '{}'", name))?;
    println!("{}", agent_id);
    Ok(())
}

fn print_config(config: &GameConfig) {
    println!("api_base_url: {}", config.client.api_base_url);
    println!("api_key: {}", redact(&config.client.api_key));
    println!("request_timeout: {}s", config.client.request_timeout);
    println!("logging.level: {}", config.logging.level);
    match &config.agent {
        Some(agent) => {
            println!("agent.name: {}", agent.name);
            println!("agent.description: {}", agent.description);
            println!("agent.goal: {}", agent.goal);
        }
        None => println!("agent: <not configured>"),
    }
}
