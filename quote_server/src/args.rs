//! Command-line arguments for the Quote Server.
//!
//! Only addresses and paths are flags; time budgets come from the environment
//! (see `quote_common::config`).
use clap::Parser;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Address to listen on. Defaults to `0.0.0.0:8080`.
    #[clap(long)]
    pub bind: Option<String>,

    /// Base URL of the exchange-rate API.
    #[clap(long, default_value = "https://economia.awesomeapi.com.br")]
    pub upstream_url: String,

    /// Path of the SQLite database receiving every served quote.
    #[clap(long, default_value = "exchanges.db")]
    pub database: String,
}
