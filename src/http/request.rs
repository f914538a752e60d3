//! Request descriptor.

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use reqwest::Method;
use tokio_util::sync::CancellationToken;
use url::{Origin, Url};

use super::body::Body;
use super::origin::ReferrerPolicy;

/// Request mode, as in the fetch standard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestMode {
    /// Cross-origin requests are checked against CORS headers.
    #[default]
    Cors,
    /// Cross-origin requests are sent without CORS checks.
    NoCors,
    /// Cross-origin requests fail.
    SameOrigin,
    /// Top-level navigation.
    Navigate,
}

/// Credentials mode, as in the fetch standard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CredentialsMode {
    /// Never send credentials.
    Omit,
    /// Send credentials to the same origin only.
    #[default]
    SameOrigin,
    /// Always send credentials.
    Include,
}

/// A request travelling through the pipeline.
///
/// Besides method, URL, headers and body it carries the request state the
/// redirect algorithm reads and rewrites between hops.
#[derive(Debug)]
pub struct FetchRequest {
    /// HTTP method; rewritten to GET by some redirects.
    pub method: Method,
    /// Current URL; the last entry of `url_list`.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body, if any.
    pub body: Option<Body>,
    /// CORS mode.
    pub mode: RequestMode,
    /// Credentials mode.
    pub credentials: CredentialsMode,
    /// Origin the request was made on behalf of.
    pub origin: Origin,
    /// URL sent (subject to `referrer_policy`) as `Referer`.
    pub referrer: Option<Url>,
    /// Policy applied to `referrer`; updated by `Referrer-Policy` response headers.
    pub referrer_policy: ReferrerPolicy,
    /// Every URL this request has been sent to, oldest first.
    pub url_list: Vec<Url>,
    /// Cancelling the token aborts the in-flight exchange and any
    /// event-stream consumption.
    pub abort: Option<CancellationToken>,
}

impl FetchRequest {
    /// Creates a request whose origin is the URL's own origin.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            origin: url.origin(),
            url_list: vec![url.clone()],
            url,
            headers: HeaderMap::new(),
            body: None,
            mode: RequestMode::default(),
            credentials: CredentialsMode::default(),
            referrer: None,
            referrer_policy: ReferrerPolicy::default(),
            abort: None,
        }
    }

    /// Parses `url` and creates a GET request.
    pub fn get(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Method::GET, Url::parse(url)?))
    }

    /// Parses `url` and creates a POST request.
    pub fn post(url: &str, body: impl Into<Body>) -> Result<Self, url::ParseError> {
        Ok(Self::new(Method::POST, Url::parse(url)?).with_body(body))
    }

    /// Appends a header value.
    pub fn with_header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the body.
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the request mode.
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the credentials mode.
    pub fn with_credentials(mut self, credentials: CredentialsMode) -> Self {
        self.credentials = credentials;
        self
    }

    /// Sets the origin the request is made on behalf of.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Sets the referrer.
    pub fn with_referrer(mut self, referrer: Url) -> Self {
        self.referrer = Some(referrer);
        self
    }

    /// Sets the referrer policy.
    pub fn with_referrer_policy(mut self, policy: ReferrerPolicy) -> Self {
        self.referrer_policy = policy;
        self
    }

    /// Attaches an abort token.
    pub fn with_abort(mut self, token: CancellationToken) -> Self {
        self.abort = Some(token);
        self
    }

    /// `Referer` value for the current URL under the request's policy.
    pub fn referer(&self) -> Option<String> {
        self.referrer
            .as_ref()
            .and_then(|referrer| self.referrer_policy.referer_for(referrer, &self.url))
    }

    /// True if the body is present and can only be read once.
    pub fn has_unreplayable_body(&self) -> bool {
        self.body.as_ref().is_some_and(|body| !body.is_reusable())
    }

    /// Copy of the request to hand to the transport. A buffered body is
    /// cloned; a stream body is moved out and `None` is left behind.
    pub(crate) fn take_for_send(&mut self) -> FetchRequest {
        let body = match self.body.take() {
            Some(Body::Full(bytes)) => {
                self.body = Some(Body::Full(bytes.clone()));
                Some(Body::Full(bytes))
            }
            other => other,
        };
        FetchRequest {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body,
            mode: self.mode,
            credentials: self.credentials,
            origin: self.origin.clone(),
            referrer: self.referrer.clone(),
            referrer_policy: self.referrer_policy,
            url_list: self.url_list.clone(),
            abort: self.abort.clone(),
        }
    }

    /// Clones the request, failing only when its body is a stream.
    pub fn try_clone(&self) -> Option<FetchRequest> {
        let body = match &self.body {
            Some(body) => Some(body.try_clone()?),
            None => None,
        };
        Some(FetchRequest {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body,
            mode: self.mode,
            credentials: self.credentials,
            origin: self.origin.clone(),
            referrer: self.referrer.clone(),
            referrer_policy: self.referrer_policy,
            url_list: self.url_list.clone(),
            abort: self.abort.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn test_new_request_defaults() {
        let req = FetchRequest::get("http://a.example/x").unwrap();
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.url_list, vec![req.url.clone()]);
        assert_eq!(req.origin, req.url.origin());
        assert_eq!(req.mode, RequestMode::Cors);
        assert!(req.body.is_none());
    }

    #[test]
    fn test_try_clone_refuses_stream_body() {
        let req = FetchRequest::get("http://a.example/")
            .unwrap()
            .with_body(Body::from_stream(stream::empty()));
        assert!(req.has_unreplayable_body());
        assert!(req.try_clone().is_none());

        let req = FetchRequest::post("http://a.example/", "data")
            .unwrap()
            .with_header("authorization", HeaderValue::from_static("secret"));
        let copy = req.try_clone().unwrap();
        assert_eq!(copy.headers["authorization"], "secret");
        assert!(!copy.has_unreplayable_body());
    }

    #[test]
    fn test_referer_applies_policy() {
        let req = FetchRequest::get("http://b.example/")
            .unwrap()
            .with_referrer(Url::parse("https://a.example/page").unwrap());
        assert_eq!(req.referer(), None);

        let req = req.with_referrer_policy(ReferrerPolicy::UnsafeUrl);
        assert_eq!(req.referer().as_deref(), Some("https://a.example/page"));
    }
}
