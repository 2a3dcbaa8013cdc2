//!
//! Common types and utilities shared by the quote server and client.
//!
//! This crate aggregates:
//! - `error` — unified error type `QuoteError` and the budget `Stage` tag.
//! - `result` — handy `Result<T, QuoteError>` alias.
//! - `model` — `Quote` / `CurrencyQuote` wire types.
//! - `pair` — validated currency pair and pair-code formatting.
//! - `config` — time budgets loaded from the environment.
//! - `net` — endpoint constants and small helpers.
#![warn(missing_docs)]
pub mod config;
pub mod error;
pub mod model;
pub mod net;
pub mod pair;
pub mod result;

pub use config::Budgets;
pub use error::{QuoteError, Stage};
pub use model::{CurrencyQuote, Quote};
pub use pair::CurrencyPair;
pub use result::Result;
