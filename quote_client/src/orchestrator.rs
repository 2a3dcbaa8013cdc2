//! Client side of the request chain.
//!
//! `QuoteRequester` calls the quote server under the client-call budget and
//! classifies the outcome; `run` picks the single returned entry, renders the
//! `Cotação XXX-YYY: <bid>` line and overwrites the output file with it. Any
//! failure before the write leaves the output file untouched.
use std::path::Path;
use std::time::Duration;

use log::{debug, error, info, warn};
use quote_common::net::{QUOTE_PATH, SOURCE_PARAM, TARGET_PARAM};
use quote_common::pair::format_pair_code;
use quote_common::{CurrencyPair, CurrencyQuote, Quote, QuoteError, Result, Stage};
use reqwest::{Client, StatusCode, Url};

/// HTTP caller for the quote server's `/cotacao` endpoint.
pub struct QuoteRequester {
    client: Client,
    endpoint: Url,
    budget: Duration,
}

impl QuoteRequester {
    /// Build a requester for the server at `server_url`.
    pub fn new(client: Client, server_url: &str, budget: Duration) -> Result<Self> {
        let mut endpoint = Url::parse(server_url)
            .map_err(|e| QuoteError::Config(format!("server url '{}': {}", server_url, e)))?;
        // Keep any path prefix of the server URL.
        endpoint
            .path_segments_mut()
            .map_err(|_| QuoteError::Config(format!("server url '{}' cannot be a base", server_url)))?
            .pop_if_empty()
            .push(QUOTE_PATH.trim_start_matches('/'));
        Ok(Self { client, endpoint, budget })
    }

    /// Endpoint URL carrying `pair` as query parameters.
    pub fn request_url(&self, pair: &CurrencyPair) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair(SOURCE_PARAM, pair.source())
            .append_pair(TARGET_PARAM, pair.target());
        url
    }

    /// Ask the server for `pair`, bounded by the client-call budget.
    pub async fn request(&self, pair: &CurrencyPair) -> Result<Quote> {
        let url = self.request_url(pair);
        info!("Requesting {}", url);
        match tokio::time::timeout(self.budget, self.exchange(url)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(QuoteError::deadline(Stage::ClientCall, self.budget)),
        }
    }

    async fn exchange(&self, url: Url) -> Result<Quote> {
        let response = self.client.get(url).send().await.map_err(|e| self.classify(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = response.text().await.unwrap_or_default();
            warn!("Server answered {}: {}", status, message.trim());
            return Err(QuoteError::UpstreamStatus { status: status.as_u16() });
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        debug!("Received {} bytes", body.len());
        serde_json::from_slice(&body).map_err(|e| QuoteError::Decode(e.to_string()))
    }

    fn classify(&self, err: reqwest::Error) -> QuoteError {
        if err.is_timeout() {
            QuoteError::deadline(Stage::ClientCall, self.budget)
        } else {
            QuoteError::Transport(err.without_url().to_string())
        }
    }
}

/// The only entry of `quote`; see `Quote::single_entry`.
pub fn select_entry(quote: &Quote) -> Result<(&str, &CurrencyQuote)> {
    quote.single_entry()
}

/// `Cotação USD-BRL: 5.43`
pub fn render_line(code: &str, bid: &str) -> Result<String> {
    Ok(format!("Cotação {}: {}", format_pair_code(code)?, bid))
}

/// Overwrite `path` with `line`.
pub async fn write_output(path: &Path, line: &str) -> Result<()> {
    tokio::fs::write(path, line).await?;
    Ok(())
}

/// Full client flow: request, select, render, write. Returns the written line.
pub async fn run(requester: &QuoteRequester, pair: &CurrencyPair, output: &Path) -> Result<String> {
    let quote = requester.request(pair).await?;
    let (code, entry) = select_entry(&quote)?;
    match entry.quoted_at() {
        Some(at) => info!("{} bid {} quoted at {}", code, entry.bid, at.to_rfc3339()),
        None => info!("{} bid {}", code, entry.bid),
    }

    let line = render_line(code, &entry.bid)?;
    write_output(output, &line).await.inspect_err(|e| {
        error!("Could not write {}: {}", output.display(), e);
    })?;
    Ok(line)
}
