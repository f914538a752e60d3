//! HTTP client initialization.

use std::time::Duration;

use reqwest::ClientBuilder;

use crate::error_handling::InitializationError;

/// User-Agent sent by the default client.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Builds the `reqwest::Client` behind [`crate::transport::ReqwestExchange`].
///
/// Redirects are disabled: the fetch engine follows them itself so that every
/// hop goes through the redirect algorithm. `timeout` bounds connection setup
/// only; per-exchange deadlines are enforced by the engine and the DoH client.
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if the client cannot be built.
pub fn init_client(connect_timeout: Duration) -> Result<reqwest::Client, InitializationError> {
    let client = ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(connect_timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}
