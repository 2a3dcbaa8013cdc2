//! Currency pair requested from the exchange-rate API.
use std::collections::HashMap;
use std::fmt;

use crate::error::QuoteError;
use crate::net::{SOURCE_PARAM, TARGET_PARAM};
use crate::result::Result;

/// Validated source/target currency codes.
///
/// Codes are trimmed and upper-cased, which is the form the API uses for the
/// keys of its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyPair {
    source: String,
    target: String,
}

impl CurrencyPair {
    /// Build a pair, failing with `MissingParameter` when a code is empty.
    pub fn new(source: &str, target: &str) -> Result<Self> {
        let source = normalize(source).ok_or(QuoteError::MissingParameter(SOURCE_PARAM))?;
        let target = normalize(target).ok_or(QuoteError::MissingParameter(TARGET_PARAM))?;
        Ok(Self { source, target })
    }

    /// Build a pair from inbound query parameters. The source parameter is
    /// checked first.
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self> {
        let source = params.get(SOURCE_PARAM).map(String::as_str).unwrap_or_default();
        let target = params.get(TARGET_PARAM).map(String::as_str).unwrap_or_default();
        Self::new(source, target)
    }

    /// Source currency code.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Target currency code.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Key the API uses for this pair in its response, e.g. `USDBRL`.
    pub fn code(&self) -> String {
        format!("{}{}", self.source, self.target)
    }

    /// URL path segment for this pair, e.g. `USD-BRL`.
    pub fn path_segment(&self) -> String {
        format!("{}-{}", self.source, self.target)
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.target)
    }
}

fn normalize(code: &str) -> Option<String> {
    let code = code.trim();
    if code.is_empty() {
        None
    } else {
        Some(code.to_ascii_uppercase())
    }
}

/// Insert a `-` after the three-letter base code: `USDBRL` -> `USD-BRL`.
pub fn format_pair_code(code: &str) -> Result<String> {
    match (code.get(..3), code.get(3..)) {
        (Some(base), Some(rest)) if !rest.is_empty() => Ok(format!("{}-{}", base, rest)),
        _ => Err(QuoteError::Format(format!("pair code '{}' is not <base><counter>", code))),
    }
}
