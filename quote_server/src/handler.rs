//! HTTP handler for `GET /cotacao`.
//!
//! Per request: `Received -> Fetching -> FetchFailed (400)` or
//! `Fetched -> Responding -> Responded -> Persisting -> Persisted | PersistFailed`.
//!
//! The quote is fetched under the inbound budget. On success the JSON body is
//! handed to the transport first; persistence only starts once the body stream
//! has been drained (or dropped), runs on its own task under its own budget, and
//! its outcome is only logged.
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use quote_common::net::QUOTE_PATH;
use quote_common::{CurrencyPair, Quote, QuoteError, Result, Stage};
use tokio::sync::oneshot;

use crate::fetcher::QuoteSource;
use crate::store::QuoteStore;

/// Collaborators shared by all requests. Holds no mutable state.
pub struct AppState {
    /// Where quotes come from.
    pub source: Arc<dyn QuoteSource>,
    /// Where quotes go after the response.
    pub store: Arc<dyn QuoteStore>,
    /// Budget for fetching a quote on behalf of one inbound request.
    pub inbound_budget: Duration,
}

/// Router exposing the quote endpoint.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new().route(QUOTE_PATH, get(get_quote)).with_state(state)
}

async fn get_quote(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    debug!("Received quote request {:?}", params);
    let quote = match fetch_quote(&state, &params).await {
        Ok(quote) => quote,
        Err(e) => {
            if e.is_deadline_exceeded() {
                warn!("Quote request failed: {}", e);
            } else {
                info!("Quote request failed: {}", e);
            }
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let payload = match serde_json::to_vec(&quote) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Could not encode quote: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "could not encode quote").into_response();
        }
    };

    let (committed_tx, committed_rx) = oneshot::channel();
    let store = Arc::clone(&state.store);
    tokio::spawn(async move {
        // Err means the connection went away mid-body; the quote is still stored.
        if committed_rx.await.is_err() {
            debug!("Response body dropped before completion");
        }
        persist(store.as_ref(), &quote).await;
    });

    (
        [(header::CONTENT_TYPE, "application/json")],
        committed_body(payload, committed_tx),
    )
        .into_response()
}

async fn fetch_quote(state: &AppState, params: &HashMap<String, String>) -> Result<Quote> {
    let pair = CurrencyPair::from_query(params)?;
    match tokio::time::timeout(state.inbound_budget, state.source.fetch(&pair)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(QuoteError::deadline(Stage::Inbound, state.inbound_budget)),
    }
}

/// Body yielding `payload`, then firing `committed` when polled past its end.
fn committed_body(payload: Vec<u8>, committed: oneshot::Sender<()>) -> Body {
    let head = stream::once(async move { Ok::<_, Infallible>(Bytes::from(payload)) });
    let tail = stream::once(async move {
        let _ = committed.send(());
    })
    .filter_map(|()| async { None::<std::result::Result<Bytes, Infallible>> });
    Body::from_stream(head.chain(tail))
}

async fn persist(store: &dyn QuoteStore, quote: &Quote) {
    match store.save(quote).await {
        Ok(()) => info!("Persisted quote with {} entries", quote.len()),
        Err(e) if e.is_deadline_exceeded() => warn!("Persisting quote timed out: {}", e),
        Err(e) => error!("Persisting quote failed: {}", e),
    }
}
