mod config;
mod console;
mod error;
mod prompt;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use runtime::{
    McpBackend, Provider, ProviderClient, Registry, ServerConfig, ToolBackend, TurnController,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{Config, Overrides};
use console::Console;
use error::{Error, Result};

const CONFIG_FILE: &str = "switchboard.toml";

#[derive(Parser)]
#[command(name = "switchboard")]
#[command(about = "Chat with a language model that can call MCP server tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file [default: switchboard.toml]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Server to connect, by name from the config. Repeatable
    #[arg(short, long = "server", global = true)]
    servers: Vec<String>,

    /// Connect every configured server (the default when no --server is given)
    #[arg(long, global = true, conflicts_with = "servers")]
    all: bool,

    /// Model provider: openai, ollama or anthropic
    #[arg(long, global = true)]
    provider: Option<Provider>,

    /// Model name
    #[arg(long, global = true)]
    model: Option<String>,

    /// Log at debug level to stderr
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat,
    /// Connect, list every tool with the server that provides it, and exit
    Tools,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "warn,runtime=debug,switchboard=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&config_path)?,
    };

    let names = if cli.all { Vec::new() } else { cli.servers.clone() };
    let servers = config.select_servers(&names)?;
    if servers.is_empty() {
        return Err(Error::NoServers {
            config: config_path.display().to_string(),
        });
    }

    match cli.command {
        Some(Commands::Tools) => cmd_tools(&config, servers).await,
        Some(Commands::Chat) | None => {
            let overrides = Overrides {
                provider: cli.provider,
                model: cli.model,
            };
            cmd_chat(&config, &overrides, servers).await
        }
    }
}

/// Start every server; the ones that fail are skipped.
async fn connect(servers: Vec<ServerConfig>) -> Result<Vec<McpBackend>> {
    let mut backends = Vec::with_capacity(servers.len());
    for server in servers {
        let name = server.name.clone();
        match McpBackend::spawn(server).await {
            Ok(backend) => backends.push(backend),
            Err(e) => warn!(server = %name, error = %e, "failed to start MCP server"),
        }
    }

    if backends.is_empty() {
        return Err(Error::NoConnections);
    }
    Ok(backends)
}

async fn discover(config: &Config, servers: Vec<ServerConfig>) -> Result<Registry<McpBackend>> {
    let backends = connect(servers).await?;
    Ok(Registry::discover(backends, config.session.duplicate_tools).await?)
}

async fn cmd_tools(config: &Config, servers: Vec<ServerConfig>) -> Result<()> {
    let registry = discover(config, servers).await?;

    let width = registry
        .schema()
        .iter()
        .map(|tool| tool.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!("{:<width$}  SERVER", "TOOL");
    println!("{}", "-".repeat(width + 20));
    for (tool, server) in registry.entries() {
        println!("{:<width$}  {}", tool.name, server.name());
        if !tool.description.is_empty() {
            println!("{:<width$}  {}", "", tool.description.lines().next().unwrap_or_default());
        }
    }

    Ok(())
}

async fn cmd_chat(config: &Config, overrides: &Overrides, servers: Vec<ServerConfig>) -> Result<()> {
    let provider = config.resolve_provider(overrides, |key| std::env::var(key).ok())?;
    let registry = discover(config, servers).await?;
    let system_prompt = prompt::system_prompt(registry.schema());
    let model = ProviderClient::new(&provider);

    println!("switchboard v{}", env!("CARGO_PKG_VERSION"));
    println!("Model: {model}");
    println!(
        "Tools: {} from {} server(s)",
        registry.len(),
        registry.backends().len()
    );
    println!("Type 'quit' or Ctrl+D to exit.\n");
    info!(provider = %provider.provider, model = %provider.model, "starting chat");

    let mut controller = TurnController::new(
        model,
        registry,
        Console::new(),
        system_prompt,
        config.session_config(),
    );
    controller.run().await?;
    Ok(())
}
