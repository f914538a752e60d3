//! Single-exchange HTTP transport.
//!
//! The fetch engine and the DoH client never talk to the network directly;
//! they hand one request at a time to an [`HttpExchange`] and get one
//! response back. The transport never follows redirects itself.

mod reqwest_exchange;

use async_trait::async_trait;

use crate::error_handling::FetchError;
use crate::http::{FetchRequest, FetchResponse};

pub use reqwest_exchange::ReqwestExchange;

/// How the transport treats a redirect response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    /// Return the redirect response to the caller.
    Manual,
    /// Fail with a network error on any redirect response.
    Error,
}

/// Performs exactly one HTTP exchange.
#[async_trait]
pub trait HttpExchange: Send + Sync {
    /// Sends `request` and returns the response without following redirects.
    async fn exchange(
        &self,
        request: FetchRequest,
        redirect: RedirectMode,
    ) -> Result<FetchResponse, FetchError>;
}

/// Applies `mode` to a response: in `Error` mode a redirect status becomes a
/// network error.
pub fn enforce_redirect_mode(
    response: FetchResponse,
    mode: RedirectMode,
    hops: usize,
) -> Result<FetchResponse, FetchError> {
    if mode == RedirectMode::Error && response.is_redirect() {
        return Err(FetchError::network(
            response.url.as_str(),
            hops,
            format!(
                "redirect ({}) received after the redirect limit was reached",
                response.status.as_u16()
            ),
        ));
    }
    Ok(response)
}
