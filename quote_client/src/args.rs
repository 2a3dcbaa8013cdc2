//! Command-line arguments for the Quote Client.
//!
//! This module defines the CLI interface using `clap`. Defaults reproduce the
//! fixed request (BRL -> USD against a local server, written to `cotacao.txt`);
//! the call budget is read from `QUOTE_CLIENT_TIMEOUT_MS`.
use clap::Parser;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Base URL of the quote server.
    #[clap(long, default_value = "http://localhost:8080")]
    pub server_url: String,

    /// Source currency code (`moedaOrigem`).
    #[clap(long, default_value = "BRL")]
    pub source: String,

    /// Target currency code (`moedaDestino`).
    #[clap(long, default_value = "USD")]
    pub target: String,

    /// File receiving the quote line; overwritten on every run.
    #[clap(long, default_value = "cotacao.txt")]
    pub output: String,
}
