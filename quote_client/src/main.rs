//! Quote Client — asks the local quote server for a currency quote and writes
//! the bid of the returned pair to a text file.
//!
//! Usage example (CLI):
//! ```bash
//! QUOTE_CLIENT_TIMEOUT_MS=300 quote_client --server-url http://localhost:8080 --output cotacao.txt
//! ```
//!
//! The output file holds a single line such as `Cotação USD-BRL: 5.43` and is
//! overwritten on every successful run. On any failure (deadline, transport,
//! non-200 status, malformed body, unexpected entry count) the error is logged,
//! the process exits with a non-zero status and the file is left as it was.
#![warn(missing_docs)]
mod args;
mod orchestrator;

use std::path::PathBuf;

use clap::Parser;
use log::{error, info, warn};
use quote_common::{Budgets, CurrencyPair, QuoteError, Result};

use crate::args::Args;
use crate::orchestrator::QuoteRequester;

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            error!("Could not load .env: {}", e);
        }
    }
    let args = Args::parse();

    let outcome = run(args).await;
    match &outcome {
        Ok(line) => info!("Quote saved: {}", line),
        Err(e) if e.is_deadline_exceeded() => warn!("Quote request timed out: {}", e),
        Err(e) => error!("Could not obtain quote: {}", e),
    }
    outcome.map(|_| ())
}

async fn run(args: Args) -> Result<String> {
    let budget = Budgets::client_call_from_env()?;
    let pair = CurrencyPair::new(&args.source, &args.target)?;
    let client = reqwest::Client::builder()
        .user_agent(concat!("quote_client/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| QuoteError::Config(e.to_string()))?;
    let requester = QuoteRequester::new(client, &args.server_url, budget)?;

    let output = PathBuf::from(args.output.trim());
    orchestrator::run(&requester, &pair, &output).await
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
