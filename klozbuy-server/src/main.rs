use clap::{Parser, Subcommand};
use klozbuy_server::config::{Config, StorageBackend};
use klozbuy_server::{logging, metrics, server, state};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "klozbuy")]
#[command(about = "REST API server for the Klozbuy neighborhood network")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults to ./klozbuy.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to run the server on
        #[arg(short, long)]
        port: Option<u16>,

        /// Storage backend
        #[arg(short, long, value_enum)]
        storage: Option<StorageBackend>,
    },
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    dotenv::dotenv().ok();

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok())?;

    let command = cli.command.unwrap_or(Commands::Serve {
        port: None,
        storage: None,
    });
    if let Commands::Serve { port, storage } = &command {
        if let Some(port) = port {
            config.server.port = *port;
        }
        if let Some(storage) = storage {
            config.storage.backend = *storage;
        }
    }
    config.validate()?;

    let _guard = logging::init_logging(&config.logging)?;

    match command {
        Commands::Serve { .. } => {
            metrics::init_metrics();
            let storage = state::open_storage(&config.storage).await?;
            let app = server::create_server(storage, &config.server.cors_origins);
            server::start_server(app, &config.server.host, config.server.port).await?;
        }
        Commands::Migrate => migrate(&config).await?,
    }

    Ok(())
}

#[cfg(feature = "db")]
async fn migrate(config: &Config) -> anyhow::Result<()> {
    use klozbuy_core::DatabaseManager;

    let url = config
        .storage
        .url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("set storage.url or LIBSQL_URL to migrate"))?;
    info!("Running migrations against {}", url);
    let db = DatabaseManager::new(url, config.storage.auth_token.as_deref()).await?;
    db.run_migrations().await?;
    info!("Migrations complete");
    Ok(())
}

#[cfg(not(feature = "db"))]
async fn migrate(_config: &Config) -> anyhow::Result<()> {
    info!("No database to migrate");
    anyhow::bail!("migrations need a build with the `db` feature")
}
