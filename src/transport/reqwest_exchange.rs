//! `reqwest`-backed transport.

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::header::REFERER;

use super::{enforce_redirect_mode, HttpExchange, RedirectMode};
use crate::config::DEFAULT_TIMEOUT;
use crate::error_handling::{FetchError, InitializationError};
use crate::http::{Body, FetchRequest, FetchResponse};
use crate::initialization::init_client;

/// Sends requests with a `reqwest::Client` whose redirect policy is `none`.
#[derive(Debug, Clone)]
pub struct ReqwestExchange {
    client: reqwest::Client,
}

impl ReqwestExchange {
    /// Wraps an existing client. The client must not follow redirects.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Builds a client with [`init_client`] and default settings.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::HttpClientError` if the client cannot be built.
    pub fn with_defaults() -> Result<Self, InitializationError> {
        Ok(Self::new(init_client(DEFAULT_TIMEOUT)?))
    }
}

#[async_trait]
impl HttpExchange for ReqwestExchange {
    async fn exchange(
        &self,
        request: FetchRequest,
        redirect: RedirectMode,
    ) -> Result<FetchResponse, FetchError> {
        let url = request.url.clone();
        let referer = request.referer();

        let mut builder = self
            .client
            .request(request.method.clone(), url.clone())
            .headers(request.headers);
        if let Some(referer) = referer {
            builder = builder.header(REFERER, referer);
        }
        builder = match request.body {
            Some(Body::Full(bytes)) => builder.body(bytes),
            Some(Body::Stream(stream)) => builder.body(reqwest::Body::wrap_stream(stream)),
            None => builder,
        };

        log::debug!("{} {}", request.method, url);
        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::transport(url.as_str(), e))?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let stream_url = final_url.to_string();
        let body = Body::from_stream(
            response
                .bytes_stream()
                .map_err(move |e| FetchError::transport(stream_url.as_str(), e)),
        );

        let response = FetchResponse::new(status, final_url, headers, body);
        enforce_redirect_mode(response, redirect, request.url_list.len().saturating_sub(1))
    }
}
