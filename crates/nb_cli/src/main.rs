use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use nb_core::config::{AppConfig, DEFAULT_DELETE_COUNT};
use nb_core::{classifier_input, Error, Result};
use nb_scrapers::logging::init_logging;
use nb_scrapers::{IngestOutcome, IngestRequest, IngestionManager, JunkFilter, WebsiteScraper};
use nb_web::AppState;
use serde::Serialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Scrape news sites, store articles and classify their bias", long_about = None)]
pub struct Cli {
    /// JSON configuration file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    /// Storage backend: memory or sqlite
    #[arg(long)]
    storage: Option<String>,
    /// Path of the SQLite database file
    #[arg(long)]
    database: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        addr: Option<String>,
    },
    /// Scrape websites into the store
    Scrape {
        #[arg(required = true)]
        websites: Vec<String>,
        /// Articles to collect per website
        #[arg(long)]
        count: Option<usize>,
    },
    /// Full-text search over stored articles
    Search { keyword: String },
    /// Delete the oldest articles
    Delete {
        #[arg(long, default_value_t = DEFAULT_DELETE_COUNT)]
        count: usize,
    },
    /// Classify the political bias of a text
    Predict {
        text: String,
        #[arg(long)]
        title: Option<String>,
    },
    /// Print every stored article, newest first
    List,
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(storage) = &cli.storage {
        config.storage.backend = storage.clone();
    }
    if let Some(database) = &cli.database {
        config.storage.path = database.to_string_lossy().into_owned();
    }
    if let Commands::Serve { addr: Some(addr) } = &cli.command {
        config.server.addr = addr.clone();
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log = init_logging("info");
    let config = load_config(&cli)?;

    let store = nb_storage::create_storage(&config.storage).await?;
    info!("💾 Storage initialized (using {})", config.storage.backend);

    let scraper = Arc::new(WebsiteScraper::new(config.ingest.request_timeout())?);
    let junk = JunkFilter::new(&config.junk)?;
    let manager = Arc::new(IngestionManager::new(store, scraper, junk, config.ingest.clone()));

    match cli.command {
        Commands::Serve { .. } => {
            let addr: SocketAddr = config
                .server
                .addr
                .parse()
                .map_err(|e| Error::Config(format!("Invalid server address {}: {}", config.server.addr, e)))?;
            let classifier = nb_inference::create_model(&config.classifier).await?;
            nb_web::serve(addr, AppState { manager, classifier }).await?;
        }
        Commands::Scrape { websites, count } => {
            log.info(&format!("Scraping {}", websites.join(", ")));
            match manager.ingest(IngestRequest { websites, count }).await? {
                IngestOutcome::Completed(report) => print_json(&report)?,
                IngestOutcome::NoValidResults => log.warn("No valid results"),
            }
        }
        Commands::Search { keyword } => {
            let articles = manager.store().search(&keyword).await?;
            if articles.is_empty() {
                return Err(Error::NotFound("No articles found".to_string()));
            }
            print_json(&articles)?;
        }
        Commands::Delete { count } => {
            let deleted = manager.delete_oldest(count).await?;
            println!("Deleted {} documents", deleted);
        }
        Commands::Predict { text, title } => {
            let classifier = nb_inference::create_model(&config.classifier).await?;
            let input = classifier_input(title.as_deref(), &text)
                .ok_or_else(|| Error::InvalidRequest("No text provided".to_string()))?;
            let bias = classifier.predict(&input).await?;
            println!("{} ({})", bias.label(), bias.as_index());
        }
        Commands::List => {
            let articles = manager.store().list_all().await?;
            print_json(&articles)?;
        }
    }

    Ok(())
}
