//! Sectioning Server: online enrollment engine
//!
//! Main entry point that loads the catalog and student fixtures, wires the
//! engine together, and runs the background recheck worker until shutdown.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use sectioning_core::config::AppConfig;
use sectioning_core::error::AppError;
use sectioning_engine::{Engine, EngineContext, MemoryEnrollmentStore};
use sectioning_entity::catalog::{CatalogData, CatalogSnapshot};
use sectioning_entity::student::Student;
use sectioning_worker::{RecheckQueue, RecheckRunner, SweepScheduler};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and the environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("SECTIONING_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting sectioning server v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Catalog snapshot ─────────────────────────────────
    tracing::info!("Loading catalog from '{}'...", config.catalog.snapshot_path);
    let data: CatalogData = read_json(&config.catalog.snapshot_path).await?;
    let snapshot = CatalogSnapshot::build(data)?;
    tracing::info!(
        "Catalog loaded: {} offerings, {} sections",
        snapshot.offerings().len(),
        snapshot.section_count()
    );

    // ── Step 2: Student records ──────────────────────────────────
    tracing::info!("Loading students from '{}'...", config.catalog.students_path);
    let students: Vec<Student> = read_json(&config.catalog.students_path).await?;
    let store = Arc::new(MemoryEnrollmentStore::with_students(students));
    tracing::info!("{} students loaded", store.student_count().await);

    // ── Step 3: Engine ───────────────────────────────────────────
    let engine = Engine::new(EngineContext::new(config.clone(), snapshot, store));

    // ── Step 4: Recheck queue, seeded with every wait-listed offering ──
    let queue = Arc::new(RecheckQueue::new());
    queue.enqueue_all(engine.wait_listed_offerings().await).await;

    // ── Step 5: Background worker ────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker_handle = if config.worker.enabled {
        tracing::info!("Starting recheck worker...");
        let runner = RecheckRunner::new(engine.clone(), Arc::clone(&queue), config.worker.clone());
        Some(tokio::spawn(async move {
            runner.run(shutdown_rx).await;
        }))
    } else {
        tracing::info!("Recheck worker disabled");
        None
    };

    // ── Step 6: Cron sweep ───────────────────────────────────────
    let mut scheduler = SweepScheduler::new(engine.clone(), Arc::clone(&queue)).await?;
    scheduler.register_sweep(&config.worker.sweep_schedule).await?;
    scheduler.start().await?;

    tracing::info!("Sectioning server running");

    // ── Step 7: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
    let _ = shutdown_tx.send(true);
    engine.shutdown();

    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!("Scheduler shutdown failed: {}", e);
    }
    if let Some(handle) = worker_handle {
        let _ = tokio::time::timeout(Duration::from_secs(30), handle).await;
    }

    tracing::info!("Sectioning server shut down gracefully");
    Ok(())
}

/// Read and parse a JSON fixture
async fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, AppError> {
    if !Path::new(path).exists() {
        return Err(AppError::configuration(format!("Fixture '{}' not found", path)));
    }
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
