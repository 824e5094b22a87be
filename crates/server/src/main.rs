use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use dropgate_gateway::{GatewayBuilder, SweepProcessorBuilder};
use dropgate_server::api::AppState;
use dropgate_server::config::DropgateConfig;
use dropgate_server::delivery::NotFoundPage;

/// Dropgate one-time download server.
#[derive(Parser, Debug)]
#[command(name = "dropgate-server", about = "Standalone HTTP server for Dropgate")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "dropgate.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let (config, found) = DropgateConfig::load(Path::new(&cli.config))?;
    if !found {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    let store = dropgate_server::state_factory::create_state(&config.state)?;
    info!(backend = %config.state.backend, "state store initialized");

    let library = config.media.library();
    if !library.root().is_dir() {
        warn!(path = %library.root().display(), "media root does not exist");
    }

    let gateway = Arc::new(
        GatewayBuilder::new()
            .state(store)
            .resolver(Arc::new(library))
            .defaults(config.submission.defaults())
            .field_names(config.submission.fields.clone())
            .build()?,
    );

    // Spawn the sweep processor if enabled.
    let sweeper = if config.sweep.enabled {
        let (mut processor, shutdown_tx) = SweepProcessorBuilder::new()
            .gateway(Arc::clone(&gateway))
            .config(config.sweep.processor_config())
            .build()?;
        let handle = tokio::spawn(async move { processor.run().await });
        Some((handle, shutdown_tx))
    } else {
        info!("sweep processor disabled");
        None
    };

    let state = AppState {
        gateway: Arc::clone(&gateway),
        not_found: NotFoundPage::load(config.site.not_found_page.as_deref()),
        site_root: config.site.root.clone(),
    };
    let app = dropgate_server::api::router(state);

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "dropgate-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the sweep processor (with configurable timeout).
    if let Some((handle, shutdown_tx)) = sweeper {
        let _ = shutdown_tx.send(()).await;
        let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
        if tokio::time::timeout(shutdown_timeout, handle).await.is_err() {
            warn!(
                timeout_secs = config.server.shutdown_timeout_seconds,
                "shutdown timeout exceeded, sweep processor abandoned"
            );
        }
    }

    info!("dropgate-server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
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
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
