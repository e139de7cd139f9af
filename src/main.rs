use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use finsight::config::{Cli, Config, default_config_path};
use finsight::db::{Database, Schema};
use finsight::handler::AppState;
use tokio::signal;
use tracing_subscriber::EnvFilter;

fn load_config(args: &Cli) -> anyhow::Result<Config> {
    // --config wins, then the per-user config file, then the environment
    let mut cfg = match &args.config_path {
        Some(path) => Config::new(path)?,
        None => {
            let default_path = default_config_path();
            if Path::new(&default_path).exists() {
                Config::new(&default_path.to_string_lossy())?
            } else {
                Config::from_env()?
            }
        }
    };

    if let Some(port) = args.port {
        cfg.app.set_port(port);
    }

    Ok(cfg)
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("finsight.svc starting");

    let cfg = load_config(&args).unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?args.config_path, "failed to load config");
        std::process::exit(1);
    });

    let schema = Schema::finsight();
    let db = Arc::new(Database::new(&cfg, &schema).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup database");
        std::process::exit(1);
    }));

    let app = finsight::app(AppState { db }, &cfg.app.allowed_origins).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to assemble routes");
        std::process::exit(1);
    });

    let address = format!("0.0.0.0:{}", cfg.app.get_port());
    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    tracing::info!(origins = ?cfg.app.allowed_origins, "finsight.svc running on {}", &address);
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl+c");
        }
        tracing::info!("ctrl+c signal received, preparing to shutdown");
    };

    if let Err(err) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
        tracing::error!(error = %err, "server error");
        std::process::exit(1);
    }

    tracing::info!("finsight.svc going off, graceful shutdown complete");
}
