//! Fixtures shared by the server's unit tests.
use axum::Router;
use quote_common::{CurrencyQuote, Quote};

pub const USDBRL_BODY: &str = r#"{"USDBRL":{"code":"USD","codein":"BRL","name":"Dólar Americano/Real Brasileiro","high":"5.4639","low":"5.4207","varBid":"-0.0047","pctChange":"-0.09","bid":"5.43","ask":"5.4312","timestamp":"1718830795","create_date":"2024-06-19 17:59:55"}}"#;

/// Quote with one entry per pair code; `USDBRL` carries bid `5.43`.
pub fn sample_quote(codes: &[&str]) -> Quote {
    codes
        .iter()
        .map(|code| {
            let (base, counter) = code.split_at(3);
            let quote = CurrencyQuote {
                code: base.to_string(),
                codein: counter.to_string(),
                name: format!("{}/{}", base, counter),
                high: "5.4639".to_string(),
                low: "5.4207".to_string(),
                var_bid: "-0.0047".to_string(),
                pct_change: "-0.09".to_string(),
                bid: if *code == "USDBRL" { "5.43" } else { "1.00" }.to_string(),
                ask: "5.4312".to_string(),
                timestamp: "1718830795".to_string(),
                create_date: "2024-06-19 17:59:55".to_string(),
            };
            (code.to_string(), quote)
        })
        .collect()
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
