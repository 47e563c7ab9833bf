//! # kkojil Binary
//!
//! The entry point that assembles the application from configuration and
//! compile-time features.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use kj_api::AppState;
use kj_config::{AppConfig, LogConfig, LogFormat, StorageBackend, StorageConfig};
use kj_core::traits::{KeyValueStore, QuestionGenerator};
use kj_core::ContentStore;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "store-local")]
use kj_store_local::{LocalFileStore, MemoryStore};

#[cfg(feature = "generator-template")]
use kj_generator_template::TemplateGenerator;

#[cfg(not(feature = "store-local"))]
compile_error!("kkojil needs a storage backend; enable the `store-local` feature");

#[cfg(not(feature = "generator-template"))]
compile_error!("kkojil needs a question generator; enable the `generator-template` feature");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config.log);

    let kv = open_store(&config.storage).await?;
    let store = Arc::new(ContentStore::new(kv));
    if config.seed_defaults {
        store.seed_defaults().await;
    }

    let generator: Arc<dyn QuestionGenerator> = Arc::new(TemplateGenerator::new(
        config.generator.min_delay(),
        config.generator.max_delay(),
    ));

    let app = kj_api::router(
        AppState { store, generator },
        Duration::from_secs(config.server.cors_max_age_secs),
    );

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!("kkojil listening on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("kkojil stopped");
    Ok(())
}

fn init_tracing(log: &LogConfig) {
    // RUST_LOG wins over the configured directives
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn open_store(storage: &StorageConfig) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    let kv: Arc<dyn KeyValueStore> = match storage.backend {
        StorageBackend::Memory => {
            warn!("using the in-memory store; nothing survives a restart");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::File => Arc::new(
            LocalFileStore::open(storage.path.clone())
                .await
                .with_context(|| format!("opening store at {}", storage.path.display()))?,
        ),
    };
    Ok(kv)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("received SIGTERM, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
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
}
