use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twin_cli::panel::PanelController;
use twin_cli::storage::{HistoryStore, JsonFileHistory};
use twin_cli::tools::WorkspaceRoot;
use twin_cli::{llm, lsp, transport, ChatAgent, Config};

#[derive(Parser)]
#[command(name = "twin")]
#[command(
    author,
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TWIN_GIT_HASH"), ")"),
    about = "Twin - editor assistant with workspace tools",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding chat history (default: per-user data directory)
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start LSP server (stdio - for editor integration)
    Lsp,

    /// Start the chat panel HTTP server
    Serve {
        /// Port to listen on (default from config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (default from config)
        #[arg(long)]
        host: Option<String>,

        /// Workspace root for file tools (default: current directory)
        #[arg(long)]
        cwd: Option<PathBuf>,
    },

    /// Start both LSP and panel servers, sharing one conversation
    Start {
        /// Port for the panel server
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a single question and print the answer
    Ask {
        prompt: String,

        /// Workspace root for file tools (default: current directory)
        #[arg(long)]
        cwd: Option<PathBuf>,
    },

    /// Print the stored chat history
    History {
        /// Print the raw JSON array
        #[arg(long)]
        json: bool,
    },
}

fn load_config(storage_dir: Option<PathBuf>) -> Config {
    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Using default config: {:#}", e);
        Config::default()
    });
    if storage_dir.is_some() {
        config.storage.dir = storage_dir;
    }
    config
}

fn history_store(config: &Config) -> Arc<JsonFileHistory> {
    let store = JsonFileHistory::new(config.history_path()).with_backup(config.history_backup_path());
    tracing::debug!("Chat history at {}", store.path().display());
    Arc::new(store)
}

fn build_agent(config: &Config, root: WorkspaceRoot) -> Arc<ChatAgent> {
    Arc::new(ChatAgent::from_config(
        config,
        llm::create_provider(config),
        root,
        history_store(config),
    ))
}

fn workspace_from(cwd: Option<PathBuf>) -> Result<WorkspaceRoot> {
    let dir = match cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let dir = dir.canonicalize().unwrap_or(dir);
    Ok(WorkspaceRoot::with_path(dir))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout belongs to the LSP channel
    let filter = if cli.verbose {
        "twin_cli=debug,twin=debug,tower_lsp=debug"
    } else {
        "twin_cli=info,twin=info,tower_lsp=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(cli.storage_dir);

    match cli.command {
        Commands::Lsp => {
            tracing::info!("Starting LSP server on stdio");
            let agent = build_agent(&config, WorkspaceRoot::new());
            lsp::run_lsp_server(agent).await?;
        }
        Commands::Serve { port, host, cwd } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let agent = build_agent(&config, workspace_from(cwd)?);
            transport::run_http_server(&host, port, PanelController::new(agent)).await?;
        }
        Commands::Start { port } => {
            tracing::info!("Starting LSP + panel servers");
            let port = port.unwrap_or(config.server.port);
            let host = config.server.host.clone();
            let agent = build_agent(&config, WorkspaceRoot::new());

            let controller = PanelController::new(agent.clone());
            let http_handle = tokio::spawn(async move {
                if let Err(e) = transport::run_http_server(&host, port, controller).await {
                    tracing::error!("Panel server error: {}", e);
                }
            });

            lsp::run_lsp_server(agent).await?;
            http_handle.abort();
        }
        Commands::Ask { prompt, cwd } => {
            let agent = build_agent(&config, workspace_from(cwd)?);
            let reply = agent.respond(&prompt).await;
            println!("{}", reply);
        }
        Commands::History { json } => {
            let entries = history_store(&config).load().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No chat history yet.");
            } else {
                for entry in entries {
                    println!("{}: {}\n", entry.role.as_str(), entry.text);
                }
            }
        }
    }

    Ok(())
}
