//! Quote HTTP server.
//!
//! Serves `GET /cotacao?moedaOrigem=<CODE>&moedaDestino=<CODE>`. For each request
//! it wires together three building blocks:
//!
//! - `HttpQuoteFetcher` — asks the exchange-rate API for the pair under the fetch
//!   budget and classifies the outcome (deadline, transport, status, decode).
//! - `handler` — validates the query, bounds the fetch by the inbound budget,
//!   answers `200 application/json` or `400 text/plain`, then hands the quote to
//!   the store.
//! - `SqliteQuoteStore` — appends one row per quote entry to the `exchanges`
//!   table under the persist budget, with a connection opened per call.
//!
//! Budgets are independent: the persist budget starts when persistence starts
//! and is never a remainder of the inbound or fetch budgets.
//!
//! Configuration: flags for addresses and paths (see `args`), `QUOTE_*_TIMEOUT_MS`
//! environment variables (or a `.env` file) for budgets, `RUST_LOG` for logging.
#![warn(missing_docs)]
use std::sync::Arc;

use clap::Parser;
use log::{error, info};
use quote_common::net::{DEFAULT_PORT, QUOTE_PATH, addr};
use quote_common::{Budgets, Result};

use crate::args::Args;
use crate::fetcher::HttpQuoteFetcher;
use crate::handler::AppState;
use crate::store::SqliteQuoteStore;

mod args;
mod fetcher;
mod handler;
mod store;

#[cfg(test)]
mod tests_support;

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            error!("Could not load .env: {}", e);
        }
    }
    let args = Args::parse();

    let budgets = Budgets::from_env().inspect_err(|e| error!("{}", e))?;
    info!(
        "Budgets: inbound={:?} fetch={:?} persist={:?}",
        budgets.inbound, budgets.fetch, budgets.persist
    );

    let client = reqwest::Client::builder()
        .user_agent(concat!("quote_server/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| quote_common::QuoteError::Config(e.to_string()))?;
    let source = HttpQuoteFetcher::new(client, &args.upstream_url, budgets.fetch)?;
    let store = SqliteQuoteStore::new(&args.database, budgets.persist);
    info!("Persisting quotes to {}", store.path().display());

    let state = Arc::new(AppState {
        source: Arc::new(source),
        store: Arc::new(store),
        inbound_budget: budgets.inbound,
    });

    let bind = args.bind.unwrap_or_else(|| addr("0.0.0.0", DEFAULT_PORT));
    let listener = tokio::net::TcpListener::bind(bind.as_str()).await?;
    info!("Quote server listening on http://{}{}", listener.local_addr()?, QUOTE_PATH);

    axum::serve(listener, handler::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Quote server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Ok(()) = tokio::signal::ctrl_c().await {
        info!("Ctrl+C received. Shutting down server...");
    }
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
