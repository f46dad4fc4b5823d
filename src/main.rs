use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::Result;
use log::{LevelFilter, info, warn};

use shortsmith::config::{self, Config};
use shortsmith::server::{self, AppState};

mod cli;

use cli::Cli;

fn setup_logging(verbose: bool) -> Result<PathBuf> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("shortsmith.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    let mut builder = env_logger::Builder::new();
    builder.filter_level(if verbose { LevelFilter::Debug } else { LevelFilter::Info });
    builder.parse_default_env();
    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized: {}", log_file.display());
    Ok(log_file)
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shortsmith")
        .join("logs")
}

/// Load the config file and apply CLI overrides
fn resolve_config(cli: &Cli) -> Config {
    let path = cli.config.clone().unwrap_or_else(config::config_path);
    let mut config = match Config::load(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring invalid config {}: {e}", path.display());
            eprintln!("warning: ignoring invalid config {}: {e}", path.display());
            Config::default()
        }
    };

    if let Some(ref bind) = cli.bind {
        config.bind = bind.clone();
    }
    if let Some(ref lang) = cli.lang {
        config.preferred_lang = lang.clone();
    }
    if let Some(ref model) = cli.model {
        config.model = model.clone();
    }
    config
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl-C handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!("Failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_file = setup_logging(cli.verbose)?;

    let config = resolve_config(&cli);
    info!(
        "Config: bind={} lang={}/{} model={} temperature={} repair_attempts={}",
        config.bind,
        config.preferred_lang,
        config.fallback_lang,
        config.model,
        config.temperature,
        config.repair_attempts
    );

    let client = reqwest::Client::new();
    let state = Arc::new(AppState::from_config(&config, client));
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    let addr = listener.local_addr()?;
    info!("Listening on {addr}");
    eprintln!("shortsmith listening on http://{addr} (logs: {})", log_file.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
