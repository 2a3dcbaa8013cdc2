//! Time budgets for the request chain.
//!
//! Each budget is independent: none is derived from the time left in another.
//! Values come from the environment (milliseconds) and fall back to defaults.
use std::env;
use std::time::Duration;

use crate::error::QuoteError;
use crate::result::Result;

/// Env var for the client -> server budget.
pub const CLIENT_TIMEOUT_VAR: &str = "QUOTE_CLIENT_TIMEOUT_MS";
/// Env var for the server-side inbound request budget.
pub const INBOUND_TIMEOUT_VAR: &str = "QUOTE_INBOUND_TIMEOUT_MS";
/// Env var for the server -> exchange-rate API budget.
pub const FETCH_TIMEOUT_VAR: &str = "QUOTE_FETCH_TIMEOUT_MS";
/// Env var for the server -> storage budget.
pub const PERSIST_TIMEOUT_VAR: &str = "QUOTE_PERSIST_TIMEOUT_MS";

/// The four time budgets of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budgets {
    /// Client -> server round trip.
    pub client_call: Duration,
    /// Server-side handling of one inbound request, up to the response.
    pub inbound: Duration,
    /// Server -> exchange-rate API round trip.
    pub fetch: Duration,
    /// Server -> storage write.
    pub persist: Duration,
}

impl Default for Budgets {
    fn default() -> Self {
        Self {
            client_call: Duration::from_millis(300),
            inbound: Duration::from_millis(2000),
            fetch: Duration::from_millis(200),
            persist: Duration::from_millis(10),
        }
    }
}

impl Budgets {
    /// Load budgets from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load budgets through `lookup`; unset variables keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            client_call: millis_or(&lookup, CLIENT_TIMEOUT_VAR, defaults.client_call)?,
            inbound: millis_or(&lookup, INBOUND_TIMEOUT_VAR, defaults.inbound)?,
            fetch: millis_or(&lookup, FETCH_TIMEOUT_VAR, defaults.fetch)?,
            persist: millis_or(&lookup, PERSIST_TIMEOUT_VAR, defaults.persist)?,
        })
    }

    /// Client-call budget from the process environment. Server-side
    /// variables are not read.
    pub fn client_call_from_env() -> Result<Duration> {
        Self::client_call_from_lookup(|name| env::var(name).ok())
    }

    /// Client-call budget through `lookup`; unset keeps the default.
    pub fn client_call_from_lookup<F>(lookup: F) -> Result<Duration>
    where
        F: Fn(&str) -> Option<String>,
    {
        millis_or(&lookup, CLIENT_TIMEOUT_VAR, Self::default().client_call)
    }
}

fn millis_or<F>(lookup: &F, name: &str, default: Duration) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(QuoteError::Config(format!("{} must be greater than zero", name))),
        Ok(ms) => Ok(Duration::from_millis(ms)),
        Err(e) => Err(QuoteError::Config(format!("{}='{}': {}", name, raw, e))),
    }
}
