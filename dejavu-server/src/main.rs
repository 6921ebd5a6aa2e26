use std::sync::Arc;

use clap::Parser;
use dejavu_core::DejavuConfig;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use dejavu_server::{server, state::AppState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "dejavu.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Init logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    // Load config
    let config = match DejavuConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Connect to DB
    let pool = match dejavu_core::db::create_pool(&config.database).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if args.health {
        match dejavu_core::db::health_check(&pool).await {
            Ok(v) => println!("PostgreSQL connected: {}", v),
            Err(e) => {
                println!("PostgreSQL connection failed: {}", e);
                std::process::exit(1);
            }
        }

        println!("Dejavu DB health check passed");
        return Ok(());
    }

    // Classifier load failure (missing artifact, schema skew) is fatal:
    // serving requests with a mismatched feature schema is never acceptable.
    let state = match AppState::new(pool, config) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("Failed to initialize server state: {}", e);
            std::process::exit(1);
        }
    };

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    // Spawn HTTP REST API server if enabled
    if state.config.http.enabled {
        let http_state = Arc::clone(&state);
        let http_shutdown = tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = dejavu_server::http::start_http_server(http_state, http_shutdown).await
            {
                tracing::error!("HTTP server error: {}", e);
            }
        });
    }

    let socket_path = state.config.service.socket_path.clone();
    server::run_unix_server(&socket_path, state, tx.subscribe()).await?;

    Ok(())
}
