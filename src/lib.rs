pub mod api;
pub mod config;
pub mod db;
pub mod entities;
pub mod parser;
pub mod scheduler;
pub mod services;
pub mod state;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
pub use config::Config;
use db::{OperatorRole, Store};
use scheduler::Scheduler;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "serve" | "daemon" | "-d" | "--daemon" => run_daemon(config, prometheus_handle).await,

        "operator" => {
            if args.len() < 3 {
                println!("Usage: keydeck operator <create|reset-password> ...");
                return Ok(());
            }
            match args[2].as_str() {
                "create" => {
                    if args.len() < 5 {
                        println!("Usage: keydeck operator create <username> <password> [--root]");
                        return Ok(());
                    }
                    let as_root = args.get(5).map(String::as_str) == Some("--root");
                    cmd_create_operator(&config, &args[3], &args[4], as_root).await
                }
                "reset-password" => {
                    if args.len() < 5 {
                        println!("Usage: keydeck operator reset-password <username> <password>");
                        return Ok(());
                    }
                    cmd_reset_password(&config, &args[3], &args[4]).await
                }
                other => {
                    println!("Unknown operator subcommand: {other}");
                    Ok(())
                }
            }
        }

        "sweep-sessions" => cmd_sweep_sessions(&config).await,

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        other => {
            println!("Unknown command: {other}");
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("keydeck v{} - key distribution control panel", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: keydeck <command>");
    println!();
    println!("Commands:");
    println!("  serve                                        Run the API server");
    println!("  operator create <username> <password> [--root]");
    println!("                                               Create a panel operator");
    println!("  operator reset-password <username> <password>");
    println!("                                               Reset an operator password");
    println!("  sweep-sessions                               Purge expired sessions once");
    println!("  help                                         Show this help");
}

async fn run_daemon(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!(
        "keydeck v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let shared = Arc::new(SharedState::new(config.clone()).await?);
    let api_state = api::create_app_state(shared.clone(), prometheus_handle).await?;

    let scheduler = Scheduler::new(shared.store.clone(), config.scheduler.clone());
    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.start().await {
            error!("Scheduler error: {}", e);
        }
    });

    let server_handle: Option<tokio::task::JoinHandle<()>> = if config.server.enabled {
        let port = config.server.port;
        info!("Starting Web API on port {}", port);

        let app = api::router(api_state).await;
        let addr = format!("0.0.0.0:{}", port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        Some(tokio::spawn(async move {
            info!("Web server running at http://0.0.0.0:{}", port);
            if let Err(e) = axum::serve(listener, app).await {
                error!("Web server error: {}", e);
            }
        }))
    } else {
        None
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    scheduler_handle.abort();
    if let Some(handle) = server_handle {
        handle.abort();
    }
    info!("Daemon stopped");

    Ok(())
}

async fn cmd_create_operator(
    config: &Config,
    username: &str,
    password: &str,
    as_root: bool,
) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let role = if as_root {
        OperatorRole::Root
    } else {
        OperatorRole::Admin
    };

    let operator = store
        .create_operator(username, password, role, &config.security)
        .await?;

    println!("Created operator '{}' with role {}", operator.username, operator.role);
    Ok(())
}

async fn cmd_reset_password(
    config: &Config,
    username: &str,
    password: &str,
) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    store
        .get_operator_by_username(username)
        .await?
        .with_context(|| format!("Operator '{username}' not found"))?;

    store
        .update_operator_password(username, password, &config.security)
        .await?;

    println!("Password updated for '{username}'");
    Ok(())
}

async fn cmd_sweep_sessions(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let purged = store.purge_expired_sessions().await?;
    println!("Purged {purged} expired sessions");
    Ok(())
}
