//! anonpair-gateway: WebSocket front end for anonymous one-to-one pairing.
//!
//! Each socket identifies one participant with a `hello` frame. Commands,
//! chat text and button callbacks go to the pairing router; everything the
//! engine sends comes back down the participant's socket.

mod connection;
mod protocol;
mod session;

use std::path::PathBuf;
use std::sync::Arc;

use anonpair_common::AnonpairError;
use anonpair_config::AnonpairConfig;
use anonpair_core::persistence::{self, Checkpointer};
use anonpair_core::{
    EngineOptions, MemoryDirectory, PairingEngine, Router, SessionStore, StaticInvite,
    SystemTimeSource, TimeoutSweeper,
};
use clap::Parser;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_util::sync::CancellationToken;

use crate::connection::{handle_connection, Gateway};
use crate::session::{ConnectionRegistry, WsSink};

#[derive(Parser)]
#[command(name = "anonpair-gateway", about = "WebSocket gateway for anonymous chat pairing")]
struct Args {
    /// Config file (defaults to the platform config dir).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the config.
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level, overriding the config. RUST_LOG wins over both.
    #[arg(long, value_parser = ["trace", "debug", "info", "warn", "error"])]
    log_level: Option<String>,

    /// State file, overriding the config.
    #[arg(long)]
    state: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), AnonpairError> {
    let args = Args::parse();

    let loaded = anonpair_config::load_config(args.config.as_deref());
    let level = args.log_level.clone().unwrap_or_else(|| match &loaded {
        Ok(config) => config.logging.level.as_str().to_string(),
        Err(_) => "info".to_string(),
    });
    init_logging(&level);

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load config, using defaults");
            AnonpairConfig::default()
        }
    };
    if let Some(port) = args.port {
        config.gateway.port = u32::from(port);
    }

    // State.
    let state_path = args.state.clone().or_else(|| config.persistence.state_path());
    let store = match (&state_path, config.persistence.enabled) {
        (Some(path), true) => SessionStore::restore(persistence::load_or_quarantine(path))?,
        _ => SessionStore::new(),
    };

    // Engine and router.
    let registry = ConnectionRegistry::new();
    let directory = Arc::new(MemoryDirectory::new());
    let engine = Arc::new(PairingEngine::new(
        store.clone(),
        Arc::new(WsSink::new(registry.clone())),
        directory.clone(),
        Arc::new(SystemTimeSource),
        EngineOptions {
            wait_timeout: config.pairing.wait_timeout(),
            retry_critical_sends: config.pairing.retry_critical_sends,
        },
    ));
    let router = Router::new(engine.clone(), Arc::new(StaticInvite::new(&config.invite.link)))
        .with_sweep_on_event(config.pairing.sweep_on_event);

    let gateway = Arc::new(Gateway {
        router,
        registry,
        directory,
        hello_timeout: config.gateway.hello_timeout(),
        leave_on_close: config.gateway.leave_on_close,
    });

    // Background tasks.
    let cancel = CancellationToken::new();
    let mut tasks = vec![TimeoutSweeper::new(engine, config.pairing.sweep_interval())
        .spawn(cancel.clone())];
    match (&state_path, config.persistence.enabled) {
        (Some(path), true) => {
            tasks.push(
                Checkpointer::new(store, path, config.persistence.checkpoint_interval())
                    .spawn(cancel.clone()),
            );
        }
        (None, true) => tracing::warn!("No data directory, state will not be saved"),
        _ => tracing::info!("Persistence disabled"),
    }

    let addr = config.gateway.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("anonpair-gateway listening on {}", addr);

    // Accept loop.
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let gateway = gateway.clone();
                    tokio::spawn(async move {
                        match accept_async(stream).await {
                            Ok(ws) => handle_connection(ws, peer, gateway).await,
                            Err(e) => {
                                tracing::warn!(peer = %peer, error = %e, "WS handshake failed");
                            }
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "TCP accept error");
                }
            }
        }
    }

    cancel.cancel();
    for task in tasks {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Background task panicked");
        }
    }
    Ok(())
}

fn init_logging(level: &str) {
    let default = format!(
        "anonpair_gateway={level},anonpair_core={level},anonpair_config={level}"
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .init();
}
