//! Chip ledger server: rooms, seats, betting turns and settlement over a
//! single WebSocket endpoint.

pub mod binding;
pub mod broadcast;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod lobby;
pub mod logging;
pub mod registry;
pub mod room;
pub mod ws;


pub use config::{RulesConfig, ServerConfig};
pub use error::{LedgerError, Rejection};
pub use lobby::Lobby;
pub use ws::{router, AppState};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

/// Bind the listener and serve until the process is stopped.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let addr = config.addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    serve_on(listener, config.rules()).await
}

/// Serve on an already bound listener.
pub async fn serve_on(listener: TcpListener, rules: RulesConfig) -> anyhow::Result<()> {
    let local = listener.local_addr()?;
    info!(%local, all_in_min_stack = rules.all_in_min_stack, "server listening on ws://{local}/ws");
    axum::serve(listener, router(AppState::new(rules))).await?;
    Ok(())
}
