//! Outbound client for the exchange-rate API.
//!
//! `HttpQuoteFetcher` asks `<base>/json/last/<SRC>-<DST>` for the latest quote
//! of a pair. The whole exchange (connect, status, body) is bounded by the fetch
//! budget; when it elapses the in-flight future is dropped, which aborts the
//! connection, and the caller gets `DeadlineExceeded` instead of a transport
//! fault.
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use quote_common::{CurrencyPair, Quote, QuoteError, Result, Stage};
use reqwest::{Client, Url};

/// Source of quotes for the request handler.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetch the latest quote for `pair`.
    async fn fetch(&self, pair: &CurrencyPair) -> Result<Quote>;
}

/// `QuoteSource` backed by the exchange-rate HTTP API.
pub struct HttpQuoteFetcher {
    client: Client,
    base_url: Url,
    budget: Duration,
}

impl HttpQuoteFetcher {
    /// Build a fetcher over an existing `client`. Fails with `Config` when
    /// `base_url` is not an absolute http(s) URL.
    pub fn new(client: Client, base_url: &str, budget: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| QuoteError::Config(format!("upstream url '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(QuoteError::Config(format!("upstream url '{}' cannot be a base", base_url)));
        }
        Ok(Self { client, base_url, budget })
    }

    /// URL of the latest quote for `pair`.
    pub fn quote_url(&self, pair: &CurrencyPair) -> Result<Url> {
        let segment = pair.path_segment();
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| QuoteError::Config(format!("upstream url '{}' cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(["json", "last", segment.as_str()]);
        Ok(url)
    }

    async fn exchange(&self, url: Url) -> Result<Quote> {
        let response = self.client.get(url).send().await.map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Exchange-rate API returned status {}", status);
            return Err(QuoteError::UpstreamStatus { status: status.as_u16() });
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        match serde_json::from_slice::<Quote>(&body) {
            Ok(quote) => {
                debug!("Decoded {} quote entries from {} bytes", quote.len(), body.len());
                Ok(quote)
            }
            Err(e) => {
                error!("Could not decode exchange-rate body ({} bytes, status {}): {}", body.len(), status, e);
                Err(QuoteError::Decode(e.to_string()))
            }
        }
    }

    fn classify(&self, err: reqwest::Error) -> QuoteError {
        if err.is_timeout() {
            QuoteError::deadline(Stage::Fetch, self.budget)
        } else {
            QuoteError::Transport(err.without_url().to_string())
        }
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteFetcher {
    async fn fetch(&self, pair: &CurrencyPair) -> Result<Quote> {
        let url = self.quote_url(pair)?;
        info!("Fetching {} from {}", pair, url);

        let outcome = match tokio::time::timeout(self.budget, self.exchange(url)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(QuoteError::deadline(Stage::Fetch, self.budget)),
        };

        if let Err(e) = &outcome {
            if e.is_deadline_exceeded() {
                warn!("Fetching {} timed out: {}", pair, e);
            } else {
                error!("Fetching {} failed: {}", pair, e);
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::{USDBRL_BODY, spawn_stub};
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use std::time::Instant;

    fn fetcher(base: &str, budget_ms: u64) -> HttpQuoteFetcher {
        HttpQuoteFetcher::new(Client::new(), base, Duration::from_millis(budget_ms)).unwrap()
    }

    #[test]
    fn builds_quote_url_from_pair() {
        let pair = CurrencyPair::new("usd", "brl").unwrap();
        let url = fetcher("https://economia.awesomeapi.com.br/", 200).quote_url(&pair).unwrap();
        assert_eq!(url.as_str(), "https://economia.awesomeapi.com.br/json/last/USD-BRL");

        let url = fetcher("http://127.0.0.1:9/api", 200).quote_url(&pair).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9/api/json/last/USD-BRL");
    }

    #[test]
    fn rejects_invalid_base_url() {
        let err = HttpQuoteFetcher::new(Client::new(), "not a url", Duration::from_millis(1));
        assert!(matches!(err, Err(QuoteError::Config(_))));
    }

    #[tokio::test]
    async fn fetch_returns_quote_keyed_by_pair_code() {
        let app = Router::new().route("/json/last/USD-BRL", get(|| async { USDBRL_BODY }));
        let base = spawn_stub(app).await;

        let pair = CurrencyPair::new("USD", "BRL").unwrap();
        let quote = fetcher(&base, 2_000).fetch(&pair).await.unwrap();

        let (code, usd) = quote.single_entry().unwrap();
        assert_eq!(code, pair.code());
        assert_eq!(usd.code, "USD");
        assert_eq!(usd.codein, "BRL");
        assert_eq!(usd.name, "Dólar Americano/Real Brasileiro");
        assert_eq!(usd.high, "5.4639");
        assert_eq!(usd.low, "5.4207");
        assert_eq!(usd.var_bid, "-0.0047");
        assert_eq!(usd.pct_change, "-0.09");
        assert_eq!(usd.bid, "5.43");
        assert_eq!(usd.ask, "5.4312");
        assert_eq!(usd.timestamp, "1718830795");
        assert_eq!(usd.create_date, "2024-06-19 17:59:55");
    }

    #[tokio::test]
    async fn slow_upstream_exceeds_fetch_budget() {
        let app = Router::new().route(
            "/json/last/USD-BRL",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                USDBRL_BODY
            }),
        );
        let base = spawn_stub(app).await;
        let pair = CurrencyPair::new("USD", "BRL").unwrap();

        let started = Instant::now();
        let err = fetcher(&base, 50).fetch(&pair).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, QuoteError::DeadlineExceeded { stage: Stage::Fetch, .. }), "{:?}", err);
        assert!(elapsed < Duration::from_millis(50 + 250), "took {:?}", elapsed);
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let pair = CurrencyPair::new("USD", "BRL").unwrap();
        let err = fetcher(&format!("http://{}", addr), 2_000).fetch(&pair).await.unwrap_err();
        assert!(matches!(err, QuoteError::Transport(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn non_success_status_is_reported_before_decoding() {
        let app = Router::new().route(
            "/json/last/USD-BRL",
            get(|| async { (StatusCode::NOT_FOUND, "not json at all") }),
        );
        let base = spawn_stub(app).await;
        let pair = CurrencyPair::new("USD", "BRL").unwrap();

        let err = fetcher(&base, 2_000).fetch(&pair).await.unwrap_err();
        assert!(matches!(err, QuoteError::UpstreamStatus { status: 404 }), "{:?}", err);
    }

    #[tokio::test]
    async fn partial_payload_is_rejected_as_a_whole() {
        let app = Router::new().route(
            "/json/last/USD-BRL",
            get(|| async { r#"{"USDBRL":{"code":"USD","bid":"5.43"}}"# }),
        );
        let base = spawn_stub(app).await;
        let pair = CurrencyPair::new("USD", "BRL").unwrap();

        let err = fetcher(&base, 2_000).fetch(&pair).await.unwrap_err();
        assert!(matches!(err, QuoteError::Decode(_)), "{:?}", err);
    }
}
