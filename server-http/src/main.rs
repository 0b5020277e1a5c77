use server_http::{AppState, build_router};
use shared::config::Config;
use std::sync::Arc;
use storage_engine::{StoreConfig, TieredResultStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vision::adapters::{GeminiRecognizer, PlaceholderLocalRecognizer};
use vision::ports::RemoteRecognizer;
use vision::{RecognitionService, RecognitionSettings};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Vehicle Vision HTTP Server...");

    // Load environment variables from .env file (if exists)
    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    let config = Config::from_env();

    let store = Arc::new(TieredResultStore::open(StoreConfig::from(&config)).await);
    // Warm the memory tier without holding up the listener
    let _loader = store.spawn_load_all();

    let mut settings = RecognitionSettings::default();
    if let Some(remote) = &config.remote {
        settings.remote_timeout = remote.timeout;
    }

    let service = RecognitionService::new(
        store.clone(),
        build_remote(&config),
        Arc::new(PlaceholderLocalRecognizer),
        settings,
    );

    let state = AppState::new(service);
    let router = build_router(state, &config);

    let addr = format!("{}:{}", config.host, config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind HTTP listener");

    info!("HTTP Server listening on http://{}", addr);
    info!("Try: curl --data-binary @car.jpg http://localhost:{}/recognize", config.http_port);

    // Graceful shutdown handler
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");

    info!("Flushing pending cache writes...");
    store.flush().await;
    info!("Server shutdown complete");
}

fn build_remote(config: &Config) -> Option<Arc<dyn RemoteRecognizer>> {
    let remote = config.remote.clone()?;
    match GeminiRecognizer::new(remote) {
        Ok(recognizer) => Some(Arc::new(recognizer) as Arc<dyn RemoteRecognizer>),
        Err(e) => {
            warn!("Remote recognizer disabled: {}", e);
            None
        }
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
}
