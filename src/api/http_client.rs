use reqwest::{Client, ClientBuilder};
use std::time::Duration;

use crate::error::Result;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Build the HTTP client shared by every upstream API client.
///
/// The client is built once at the application root and cloned into each
/// API client; clones share the same connection pool.
pub fn build_client(timeout_secs: u64, user_agent: &str) -> Result<Client> {
    let client = ClientBuilder::new()
        // Connection pool settings
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .user_agent(user_agent)
        .use_rustls_tls()
        .build()?;

    Ok(client)
}

/// Default user agent string
pub fn default_user_agent() -> String {
    format!("tourlens/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client() {
        let client = build_client(10, "test-agent/1.0");
        assert!(client.is_ok());
    }

    #[test]
    fn test_default_user_agent_has_version() {
        assert!(default_user_agent().starts_with("tourlens/"));
    }
}
