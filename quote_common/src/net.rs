//! Shared HTTP constants and helpers used by client and server.

/// TCP port the quote server listens on by default.
pub const DEFAULT_PORT: u16 = 8080;
/// Path of the "get quote" endpoint.
pub const QUOTE_PATH: &str = "/cotacao";
/// Query parameter carrying the source currency code.
pub const SOURCE_PARAM: &str = "moedaOrigem";
/// Query parameter carrying the target currency code.
pub const TARGET_PARAM: &str = "moedaDestino";

/// Helper to format an address with a port like "ip:port".
pub fn addr(ip: &str, port: u16) -> String {
    format!("{}:{}", ip, port)
}
