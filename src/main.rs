use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use modvoyage::apis::{CurseForgeSource, ModrinthSource};
use modvoyage::app::ports::HttpClientPort;
use modvoyage::config::Config;
use modvoyage::infra::ReqwestHttp;
use modvoyage::pipeline::{aggregate, auto_ingest, IngestionWriter};
use modvoyage::server::{self, AppState};
use modvoyage::storage::{seed, DatabaseStorage, InMemoryStorage, Storage};
use modvoyage::{logging, metrics};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "modvoyage")]
#[command(about = "Minecraft mod catalog aggregating CurseForge and Modrinth")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Use the SQLite store instead of in-memory
        #[arg(long)]
        use_database: bool,

        /// Do not refresh the catalog from the sources at startup
        #[arg(long)]
        skip_auto_ingest: bool,

        /// Expose Prometheus metrics on this address, e.g. 127.0.0.1:9898
        #[arg(long)]
        metrics_addr: Option<SocketAddr>,
    },
    /// Fetch from every source once and store the result
    Ingest {
        /// Mods to request per source
        #[arg(long)]
        limit: Option<usize>,

        /// Use the SQLite store instead of in-memory
        #[arg(long)]
        use_database: bool,
    },
}

fn create_storage(use_database: bool, config: &Config) -> Result<Arc<dyn Storage>> {
    if use_database {
        info!("Opening database storage at {}", config.storage.database_path);
        let storage = DatabaseStorage::open(&config.storage.database_path)
            .with_context(|| format!("opening {}", config.storage.database_path))?;
        Ok(Arc::new(storage))
    } else {
        info!("Using in-memory storage (data will not persist)");
        Ok(Arc::new(InMemoryStorage::new()))
    }
}

fn create_state(store: Arc<dyn Storage>, config: &Config) -> AppState {
    let http: Arc<dyn HttpClientPort> =
        Arc::new(ReqwestHttp::new(config.sources.request_timeout()));

    if config.sources.curseforge_api_key.is_none() {
        warn!("CURSEFORGE_API_KEY not set; CurseForge will serve fallback data");
    }
    if config.sources.modrinth_api_key.is_none() {
        warn!("MODRINTH_API_KEY not set; Modrinth requests are anonymous");
    }

    let curseforge = CurseForgeSource::new(http.clone(), config.sources.curseforge_api_key.clone());
    let modrinth = ModrinthSource::new(http, config.sources.modrinth_api_key.clone())
        .with_page_delay(config.sources.modrinth_page_delay());
    AppState::new(store, curseforge, modrinth)
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load().context("loading configuration")?;

    match cli.command {
        Commands::Serve {
            port,
            use_database,
            skip_auto_ingest,
            metrics_addr,
        } => {
            if let Some(addr) = metrics_addr {
                metrics::init_metrics(addr);
            }

            let store = create_storage(use_database, &config)?;
            if seed::seed_if_empty(store.as_ref()).await? {
                info!("Seeded empty catalog with sample data");
            }

            let state = create_state(store.clone(), &config);
            if skip_auto_ingest {
                info!("Skipping automatic ingestion");
            } else {
                match auto_ingest(store, &state.sources(), config.ingest.auto_ingest_limit).await {
                    Ok(report) => info!(
                        "Catalog refreshed: {} mods, {} categories",
                        report.saved_mods(),
                        report.saved_categories()
                    ),
                    Err(e) => error!("Automatic ingestion failed: {}", e),
                }
            }

            let port = port.unwrap_or(config.server.port);
            server::start_server(state, port).await
        }
        Commands::Ingest {
            limit,
            use_database,
        } => {
            let store = create_storage(use_database, &config)?;
            let state = create_state(store.clone(), &config);
            let limit = limit.unwrap_or(config.ingest.auto_ingest_limit);

            let batch = aggregate(&state.sources(), limit).await;
            let report = IngestionWriter::new(store).ingest(&batch).await;
            println!("Parsed {} mods, saved {}", report.mods.parsed, report.mods.saved);
            println!(
                "Parsed {} categories, saved {}",
                report.categories.parsed, report.categories.saved
            );
            Ok(())
        }
    }
}
