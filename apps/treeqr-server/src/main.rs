//! TreeQR Server
//!
//! Serves the page behind each tree's QR code. Provides endpoints for:
//!
//! - `GET /:id` - HTML page for a tree record
//! - `GET /generate-description/:id` - first-person story narrated by the tree
//! - `GET /speak?text=...` - speech audio streamed from the local TTS service
//! - `GET /health` - health check
//! - `/static/*` - stylesheet, images and other static assets
//!
//! Records come from the Firebase Realtime Database, or from a JSON export when
//! `--fixtures` is given.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use clap::Parser;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;
use treeqr_core::{GenerationConfig, MemoryStore, SpeechConfig, StoreConfig};

mod error;
mod handlers;
mod page;
mod state;
#[cfg(test)]
mod tests;

use state::{AppState, StoreSource};

/// Command-line arguments for the TreeQR server.
///
/// Unset options fall back to environment variables, then to built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "treeqr-server")]
#[command(about = "Tree pages, AI descriptions and speech for QR-tagged trees")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Firebase Realtime Database URL [env: FIREBASE_DATABASE_URL]
    #[arg(long)]
    database_url: Option<String>,

    /// File holding the database auth token [env: FIREBASE_CREDENTIALS]
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// Database path holding the tree records [env: FIREBASE_COLLECTION]
    #[arg(long)]
    collection: Option<String>,

    /// Serve records from a JSON database export instead of Firebase [env: TREEQR_FIXTURES]
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// Chat-completion endpoint [env: GENERATION_URL]
    #[arg(long)]
    generation_url: Option<String>,

    /// Model used for descriptions [env: GENERATION_MODEL]
    #[arg(long)]
    generation_model: Option<String>,

    /// Bearer token for the chat-completion endpoint [env: OPENROUTER_API_KEY]
    #[arg(long)]
    generation_api_key: Option<String>,

    /// Local TTS endpoint [env: TTS_URL]
    #[arg(long)]
    speech_url: Option<String>,

    /// Record store timeout in milliseconds [env: STORE_TIMEOUT_MS]
    #[arg(long)]
    store_timeout_ms: Option<u64>,

    /// Description generation timeout in milliseconds [env: GENERATION_TIMEOUT_MS]
    #[arg(long)]
    generation_timeout_ms: Option<u64>,

    /// Time to wait for the TTS response headers in milliseconds [env: TTS_TIMEOUT_MS]
    #[arg(long)]
    speech_timeout_ms: Option<u64>,

    /// Directory served under /static
    #[arg(long, default_value = "static")]
    static_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn store_source(&self) -> Result<StoreSource> {
        let mut config = StoreConfig::from_env();
        if let Some(collection) = &self.collection {
            config.collection = collection.clone();
        }

        let fixtures = self
            .fixtures
            .clone()
            .or_else(|| std::env::var_os("TREEQR_FIXTURES").map(PathBuf::from));
        if let Some(path) = fixtures {
            let store = MemoryStore::from_json_file(&path, &config.collection)
                .with_context(|| format!("loading fixtures from {}", path.display()))?;
            return Ok(StoreSource::Fixtures(store));
        }

        if let Some(url) = &self.database_url {
            config.database_url = url.clone();
        }
        if let Some(ms) = self.store_timeout_ms {
            config.timeout_ms = ms;
        }
        let credentials = self
            .credentials
            .clone()
            .or_else(|| std::env::var_os("FIREBASE_CREDENTIALS").map(PathBuf::from));
        if let Some(path) = credentials {
            config = config.with_credentials_file(&path)?;
        }
        Ok(StoreSource::Firebase(config))
    }

    fn generation_config(&self) -> GenerationConfig {
        let mut config = GenerationConfig::from_env();
        if let Some(url) = &self.generation_url {
            config.endpoint = url.clone();
        }
        if let Some(model) = &self.generation_model {
            config.model = model.clone();
        }
        if let Some(key) = &self.generation_api_key {
            config.api_key = Some(key.clone());
        }
        if let Some(ms) = self.generation_timeout_ms {
            config.timeout_ms = ms;
        }
        config
    }

    fn speech_config(&self) -> SpeechConfig {
        let mut config = SpeechConfig::from_env();
        if let Some(url) = &self.speech_url {
            config.endpoint = url.clone();
        }
        if let Some(ms) = self.speech_timeout_ms {
            config.timeout_ms = ms;
        }
        config
    }
}

/// Routes without middleware; shared with the endpoint tests
pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/speak", get(handlers::speak))
        .route(
            "/generate-description/:id",
            get(handlers::generate_description),
        )
        .route("/:id", get(handlers::tree_page))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("treeqr_server={}", log_level).parse()?)
        .add_directive(format!("treeqr_core={}", log_level).parse()?)
        .add_directive("tower_http=debug".parse()?);

    if args.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Initializing TreeQR server v{}", treeqr_core::VERSION);

    // Configuration and credential problems stop us here, before serving
    let generation = args.generation_config();
    if generation.api_key.is_none() {
        warn!("OPENROUTER_API_KEY is not set; description requests will likely fail");
    }
    let state = AppState::new(args.store_source()?, generation, args.speech_config())?;

    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = build_router(state, &args.static_dir).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server started at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
