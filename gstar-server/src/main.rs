use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gstar_core::config::{AppConfig, DatabaseSettings};
use gstar_infrastructure::{ConfigService, SqliteCharacterRepository};
use gstar_server::app::{open_store, seed_characters};

#[derive(Parser)]
#[command(name = "gstar")]
#[command(about = "GSTAR - LLM-driven visual novel game backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve(ServeArgs),
    /// Insert the default character roster
    SeedCharacters {
        #[command(flatten)]
        config: ConfigArgs,
        /// Replace an existing roster
        #[arg(long)]
        reset: bool,
    },
    /// Create the database schema and exit
    InitDb {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Args, Default)]
struct ConfigArgs {
    /// Path to config.toml
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(&self) -> Result<AppConfig> {
        ConfigService::load(self.config.as_deref()).context("Failed to load configuration")
    }
}

#[derive(Args, Default)]
struct ServeArgs {
    #[command(flatten)]
    config: ConfigArgs,
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
    /// Keep all data in memory
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => serve(args).await,
        Commands::SeedCharacters { config, reset } => {
            let config = config.load()?;
            let store = open_store(&config.database)?;
            let seeded = seed_characters(&SqliteCharacterRepository::new(store), reset).await?;
            println!("Seeded {seeded} characters into '{}'", config.database.path);
            Ok(())
        }
        Commands::InitDb { config } => {
            let config = config.load()?;
            open_store(&config.database)?;
            println!("Initialized database '{}'", config.database.path);
            Ok(())
        }
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let mut config = args.config.load()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.in_memory {
        config.database.path = DatabaseSettings::IN_MEMORY.to_string();
    }

    let _guard = gstar_server::logging::init(&config.logging)?;
    ensure_images_dir(Path::new(&config.images.dir))?;

    let address = format!("{}:{}", config.server.host, config.server.port);
    let app = gstar_server::bootstrap(config).await?;
    let router = gstar_server::router(app.app_state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    tracing::info!("GSTAR API listening on http://{address}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

fn ensure_images_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create image directory {}", dir.display()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
    }
}
