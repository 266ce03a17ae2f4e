use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use student_summary::config::{Cli, Config};
use student_summary::server::student_api::{build_router, AppState};
use student_summary::store::registry::new_shared_store;
use student_summary::summary::client::SummaryGenerator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "student_summary=debug,tower_http=debug"
    } else {
        "student_summary=info,tower_http=info"
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter.into());

    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }

    info!("student-summary v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let config = Config::load(&cli.config)?.with_cli(&cli);
    let config = Arc::new(config);

    info!(
        listen = config.server.listen,
        endpoint = config.inference.endpoint,
        model = config.inference.model,
        timeout_secs = config.inference.timeout_secs,
        "Configuration loaded"
    );

    let generator = SummaryGenerator::new(config.inference.clone())?;

    // Build application state.
    let state = Arc::new(AppState {
        store: new_shared_store(),
        generator,
        config: config.clone(),
    });

    // Build the HTTP router.
    let app = build_router(state);

    // Start the server.
    let listener = TcpListener::bind(&config.server.listen).await?;
    info!("Listening on {}", config.server.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
}
