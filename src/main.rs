use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use tracing::info;
use vibematch::config::AppConfig;
use vibematch::database::Database;
use vibematch::embeddings::backfill_embeddings;
use vibematch::embeddings::EmbeddingService;
use vibematch::Result;

#[derive(Parser)]
#[command(name = "vibematch")]
#[command(about = "Vibematch backend: profile embeddings, similarity matching, and plan generation")]
#[command(version)]
struct Cli {
    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to (overrides config)
        #[arg(long)]
        port: Option<u16>,
        /// Disable CORS even when the config enables it
        #[arg(long)]
        no_cors: bool,
    },
    /// Re-embed profiles that have no stored embedding
    Backfill,
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?;
    vibematch::logging::init_logging(Some(&config))?;

    if cli.verbose {
        info!("Verbose logging enabled");
    }

    match cli.command {
        Commands::Serve {
            host,
            port,
            no_cors,
        } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let enable_cors = config.server.enable_cors && !no_cors;
            vibematch::api::serve_api(&config, host, port, enable_cors).await?;
        }
        Commands::Backfill => {
            let database = Arc::new(Database::from_config(&config).await?);
            let embedding_service = Arc::new(EmbeddingService::new(&config)?);
            let stats = backfill_embeddings(database, embedding_service).await?;
            info!(
                "Backfill finished: {}/{} updated, {} skipped, {} failed",
                stats.updated, stats.total_profiles, stats.skipped, stats.failed
            );
        }
        Commands::Config => {
            println!("Database URL: {}", config.database_url());
            println!("Embedding model: {}", config.embedding_model());
            println!("Embedding dimension: {}", config.embedding_dimension());
            println!("LLM model: {}", config.llm_model());
            println!("Oversample factor: {}", config.oversample_factor());
            println!("Default match limit: {}", config.default_match_limit());
            println!("Default city: {}", config.default_city());
            println!(
                "Server: {}:{} (cors: {})",
                config.server.host, config.server.port, config.server.enable_cors
            );
        }
    }

    Ok(())
}
