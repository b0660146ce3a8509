use reqwest::Client;
use std::time::Duration;
use tracing::warn;

const TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("curio/", env!("CARGO_PKG_VERSION"));

/// The HTTP client remote fetchers share their settings through.
pub(crate) fn client() -> Client {
    Client::builder()
        .timeout(TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "falling back to a default HTTP client");
            Client::new()
        })
}
