use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use bookd::engine::Allocator;
use bookd::http::{self, AppState};
use bookd::memory::{DirectorySeed, MemoryStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("BOOKD_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    bookd::observability::init(metrics_port);

    let port = std::env::var("BOOKD_PORT").unwrap_or_else(|_| "8080".into());
    let bind = std::env::var("BOOKD_BIND").unwrap_or_else(|_| "0.0.0.0".into());

    let store = Arc::new(MemoryStore::new());
    if let Ok(path) = std::env::var("BOOKD_DIRECTORY") {
        let raw = std::fs::read_to_string(&path)?;
        let seed: DirectorySeed = serde_json::from_str(&raw)?;
        store.load_seed(seed);
        info!(
            "directory seeded from {path}: {} rooms, {} spaces",
            store.room_count(),
            store.space_count()
        );
    }

    let state = AppState {
        allocator: Arc::new(Allocator::new(store)),
    };

    let addr = format!("{bind}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("bookd listening on {addr}");
    info!(
        "  metrics: {}",
        metrics_port.map_or("disabled".to_string(), |p| format!(
            "http://0.0.0.0:{p}/metrics"
        ))
    );

    axum::serve(listener, http::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("bookd stopped");
    Ok(())
}

/// Stop accepting on SIGTERM/ctrl-c; axum drains in-flight requests.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to register SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
}
