//! Quote data model shared by server and client.
//!
//! A `Quote` maps a currency-pair code (e.g. `USDBRL`) to a `CurrencyQuote`.
//! Every field of `CurrencyQuote` is kept exactly as the exchange-rate API sent
//! it: the API encodes numbers as strings and consumers expect the same
//! representation back, so nothing is parsed into numeric types.
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::QuoteError;
use crate::result::Result;

/// Quote detail for a single currency pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyQuote {
    /// Base currency code (e.g. `USD`).
    pub code: String,
    /// Counter currency code (e.g. `BRL`).
    pub codein: String,
    /// Human readable pair name.
    pub name: String,
    /// Highest value in the period.
    pub high: String,
    /// Lowest value in the period.
    pub low: String,
    /// Bid variation.
    #[serde(rename = "varBid")]
    pub var_bid: String,
    /// Percent change.
    #[serde(rename = "pctChange")]
    pub pct_change: String,
    /// Buy price.
    pub bid: String,
    /// Sell price.
    pub ask: String,
    /// Unix timestamp in seconds, as sent by the API.
    pub timestamp: String,
    /// Creation date, as sent by the API.
    pub create_date: String,
}

impl CurrencyQuote {
    /// Interpret `timestamp` as unix seconds. Returns `None` when it is not a
    /// valid number; the stored string is never touched.
    pub fn quoted_at(&self) -> Option<DateTime<Utc>> {
        let secs: i64 = self.timestamp.trim().parse().ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}

/// Mapping from pair code to its quote detail.
///
/// Backed by an ordered map, so iteration (and therefore the order rows are
/// persisted in) is sorted by pair code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quote(BTreeMap<String, CurrencyQuote>);

impl Quote {
    /// Number of pairs in the mapping.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when the mapping holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a pair by its code.
    pub fn get(&self, code: &str) -> Option<&CurrencyQuote> {
        self.0.get(code)
    }

    /// Iterate over `(pair code, quote)` entries in pair-code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CurrencyQuote)> {
        self.0.iter().map(|(code, quote)| (code.as_str(), quote))
    }

    /// Return the only entry of the mapping.
    ///
    /// The exchange-rate API answers a single-pair request with a single-key
    /// object. Anything else is rejected instead of picking an arbitrary key.
    pub fn single_entry(&self) -> Result<(&str, &CurrencyQuote)> {
        let mut entries = self.iter();
        match (entries.next(), entries.next()) {
            (Some(entry), None) => Ok(entry),
            (None, _) => Err(QuoteError::Format("quote has no entries".to_string())),
            (Some(_), Some(_)) => Err(QuoteError::Format(format!(
                "expected a single quote entry, got {}",
                self.len()
            ))),
        }
    }
}

impl FromIterator<(String, CurrencyQuote)> for Quote {
    fn from_iter<I: IntoIterator<Item = (String, CurrencyQuote)>>(iter: I) -> Self {
        Quote(iter.into_iter().collect())
    }
}
