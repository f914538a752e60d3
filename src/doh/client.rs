//! DoH client over the single-exchange transport.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use url::Url;

use super::types::{DohContentType, DohErrorBody, DohRequest, DohResponse};
use crate::config::{DOH_TIMEOUT, HTTP_STATUS_NOT_MODIFIED};
use crate::dns::{decode_message, encode_query, reverse_name, DnsQuery, RecordType};
use crate::error_handling::{FetchError, InitializationError};
use crate::http::FetchRequest;
use crate::transport::{HttpExchange, RedirectMode, ReqwestExchange};

/// Sends DNS questions to one DoH provider.
pub struct DohClient {
    exchange: Arc<dyn HttpExchange>,
    provider: Url,
    timeout: Duration,
    tolerated: Vec<u16>,
}

impl DohClient {
    /// Creates a client for `provider` with the default DoH timeout.
    pub fn new(exchange: Arc<dyn HttpExchange>, provider: Url) -> Self {
        Self {
            exchange,
            provider,
            timeout: DOH_TIMEOUT,
            tolerated: Vec::new(),
        }
    }

    /// Creates a client over a default [`ReqwestExchange`].
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::HttpClientError` if the client cannot be built.
    pub fn with_reqwest(provider: Url) -> Result<Self, InitializationError> {
        Ok(Self::new(Arc::new(ReqwestExchange::with_defaults()?), provider))
    }

    /// Replaces the query deadline (`DOH_TIMEOUT` by default).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Accepts `status` as a successful answer; its body is decoded as usual.
    pub fn with_tolerated_status(mut self, status: u16) -> Self {
        self.tolerated.push(status);
        self
    }

    /// Provider endpoint.
    pub fn provider(&self) -> &Url {
        &self.provider
    }

    /// Sends one question.
    ///
    /// The whole exchange, including reading the body, is bounded by the
    /// client timeout; on expiry the in-flight exchange is dropped.
    ///
    /// # Errors
    ///
    /// - `FetchError::Dns` if the name cannot be encoded or the answer is malformed
    /// - `FetchError::Timeout` if the provider does not answer in time
    /// - `FetchError::Upstream` for an untolerated non-2xx/304 status, or a
    ///   provider `{"error": ...}` body
    /// - `FetchError::Decode` if a JSON answer does not match the schema
    /// - `FetchError::Transport` if the exchange fails
    pub async fn query(&self, request: &DohRequest) -> Result<DohResponse, FetchError> {
        let content_type = request
            .content_type
            .unwrap_or_else(|| DohContentType::infer(&self.provider));
        let http_request = match content_type {
            DohContentType::DnsMessage => self.binary_request(request)?,
            DohContentType::DnsJson => self.json_request(request),
        };
        let url = http_request.url.to_string();
        log::debug!(
            "DoH {} query for {} via {} ({})",
            request.record_type,
            request.name,
            url,
            content_type.as_str()
        );

        tokio::time::timeout(self.timeout, self.send(http_request, content_type))
            .await
            .map_err(|_| FetchError::Timeout {
                url,
                after: self.timeout,
            })?
    }

    /// Looks up the PTR name for `ip`, without the trailing dot.
    ///
    /// # Errors
    ///
    /// Same as [`DohClient::query`].
    pub async fn reverse_lookup(&self, ip: IpAddr) -> Result<Option<String>, FetchError> {
        let request = DohRequest::new(reverse_name(ip)).with_type(RecordType::PTR);
        let response = self.query(&request).await?;
        Ok(response
            .answers()
            .iter()
            .find(|record| record.record_type == RecordType::PTR.number())
            .map(|record| record.data.trim_end_matches('.').to_string()))
    }

    fn binary_request(&self, request: &DohRequest) -> Result<FetchRequest, FetchError> {
        // Id 0 keeps identical questions byte-identical (and HTTP-cacheable).
        let id = if request.random_padding.is_some() {
            rand::random::<u16>()
        } else {
            0
        };
        let query = DnsQuery::new(request.name.as_str(), request.record_type)
            .with_id(id)
            .with_checking_disabled(request.checking_disabled);
        let packet = encode_query(&query)?;
        let media_type = HeaderValue::from_static(DohContentType::DnsMessage.as_str());

        Ok(FetchRequest::new(Method::POST, self.provider.clone())
            .with_header(CONTENT_TYPE, media_type.clone())
            .with_header(ACCEPT, media_type)
            .with_body(packet))
    }

    fn json_request(&self, request: &DohRequest) -> FetchRequest {
        let mut url = self.provider.clone();
        url.query_pairs_mut().extend_pairs(request.query_pairs());
        FetchRequest::new(Method::GET, url).with_header(
            ACCEPT,
            HeaderValue::from_static(DohContentType::DnsJson.as_str()),
        )
    }

    async fn send(
        &self,
        request: FetchRequest,
        content_type: DohContentType,
    ) -> Result<DohResponse, FetchError> {
        let url = request.url.to_string();
        let response = self.exchange.exchange(request, RedirectMode::Manual).await?;

        let status = response.status.as_u16();
        let accepted = response.ok()
            || status == HTTP_STATUS_NOT_MODIFIED
            || self.tolerated.contains(&status);
        if !accepted {
            return Err(FetchError::Upstream {
                url,
                status,
                hops: 0,
                reason: response.status_text.clone(),
            });
        }

        let body = response.bytes().await?;
        match content_type {
            DohContentType::DnsMessage => {
                let message = decode_message(&body)?;
                Ok(DohResponse::from(&message))
            }
            DohContentType::DnsJson => {
                if let Ok(DohErrorBody { error }) = serde_json::from_slice(&body) {
                    return Err(FetchError::Upstream {
                        url,
                        status,
                        hops: 0,
                        reason: error,
                    });
                }
                serde_json::from_slice(&body).map_err(|source| FetchError::Decode { url, source })
            }
        }
    }
}
