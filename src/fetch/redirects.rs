//! HTTP-redirect fetch.
//!
//! One step of the WHATWG redirect algorithm: given the request that was
//! sent and the redirect response it produced, either rewrite the request
//! for the next hop or fail with a network error.

use reqwest::header::{ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use url::Url;

use crate::config::REQUEST_BODY_HEADERS;
use crate::error_handling::{FetchError, FetchStats, InfoType};
use crate::http::{
    includes_credentials, is_http_scheme, same_origin, strip_for_referrer, CredentialsMode,
    FetchRequest, FetchResponse, ReferrerPolicy, RequestMode,
};

const REFERRER_POLICY_HEADER: &str = "referrer-policy";

/// Request state carried across the hops of one fetch call.
#[derive(Debug)]
pub struct RedirectState {
    /// Request for the next exchange, rewritten after every redirect.
    pub current: FetchRequest,
    /// Redirects followed so far.
    pub hops: usize,
    /// The request body was a stream and has already been sent.
    pub body_consumed: bool,
}

impl RedirectState {
    /// State before the first exchange.
    pub fn new(request: FetchRequest) -> Self {
        Self {
            current: request,
            hops: 0,
            body_consumed: false,
        }
    }
}

/// True if `response` is cross-origin for a CORS request and its
/// `Access-Control-Allow-Origin` does not admit the request's origin.
pub fn is_tainted(request: &FetchRequest, response: &FetchResponse) -> bool {
    if request.mode != RequestMode::Cors || request.origin == response.url.origin() {
        return false;
    }
    let allowed = response
        .headers
        .get(ACCESS_CONTROL_ALLOW_ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);
    match allowed {
        Some("*") => request.credentials == CredentialsMode::Include,
        Some(origin) => origin != request.origin.ascii_serialization(),
        None => true,
    }
}

/// Resolves `Location` against the request URL, inheriting the request's
/// fragment when the location has none.
fn location_url(request: &FetchRequest, response: &FetchResponse) -> Result<Url, String> {
    let location = response
        .location()
        .ok_or_else(|| "redirect response has no Location header".to_string())?;
    let mut target = request
        .url
        .join(location)
        .map_err(|e| format!("invalid Location '{}': {}", location, e))?;
    if target.fragment().is_none() {
        target.set_fragment(request.url.fragment());
    }
    Ok(target)
}

fn rewrites_to_get(status: StatusCode, method: &Method) -> bool {
    match status.as_u16() {
        301 | 302 => *method == Method::POST,
        303 => *method != Method::GET && *method != Method::HEAD,
        _ => false,
    }
}

/// Applies one redirect to `state`.
///
/// # Errors
///
/// Returns `FetchError::Network` for a missing or unparsable `Location`, a
/// non-HTTP(S) target, an exhausted redirect limit, credentials in the
/// target of a cross-origin or tainted CORS request, and a non-303 redirect
/// of a request whose body cannot be sent again.
pub fn follow_redirect(
    mut state: RedirectState,
    response: &FetchResponse,
    max_redirects: usize,
    stats: &FetchStats,
) -> Result<RedirectState, FetchError> {
    let hops = state.hops;
    let fail = |reason: String| FetchError::network(response.url.as_str(), hops, reason);
    let request = &state.current;

    let target = location_url(request, response).map_err(fail)?;

    if !is_http_scheme(&target) {
        return Err(fail(format!("redirect to disallowed scheme '{}'", target.scheme())));
    }
    if hops + 1 > max_redirects {
        return Err(fail(format!("redirect count exceeded ({})", max_redirects)));
    }
    if request.mode == RequestMode::Cors
        && includes_credentials(&target)
        && request.origin != target.origin()
    {
        return Err(fail("cross-origin CORS redirect to a URL with credentials".into()));
    }
    if is_tainted(request, response) && includes_credentials(&target) {
        return Err(fail("tainted CORS redirect to a URL with credentials".into()));
    }
    let status = response.status;
    if status != StatusCode::SEE_OTHER && state.body_consumed {
        return Err(fail("cannot replay a streamed request body".into()));
    }

    // A consumed stream body is gone; the next hop is sent without one.
    state.body_consumed = false;
    let request = &mut state.current;

    if rewrites_to_get(status, &request.method) {
        log::debug!(
            "{} {} redirect rewrites {} to GET",
            status.as_u16(),
            response.url,
            request.method
        );
        request.method = Method::GET;
        request.body = None;
        for name in REQUEST_BODY_HEADERS {
            request.headers.remove(*name);
        }
        stats.increment_info(InfoType::MethodRewrite);
    }

    if !same_origin(&request.url, &target) {
        request.headers.remove(AUTHORIZATION);
        stats.increment_info(InfoType::CrossOriginRedirect);
    }

    if let Some(policy) = response
        .headers
        .get(REFERRER_POLICY_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit(',').find_map(|p| p.parse::<ReferrerPolicy>().ok()))
    {
        request.referrer_policy = policy;
    }
    request.referrer = match request.referrer_policy {
        ReferrerPolicy::NoReferrer => None,
        ReferrerPolicy::SameOrigin => {
            if same_origin(&response.url, &target) {
                request.referrer.take()
            } else {
                None
            }
        }
        _ => Some(strip_for_referrer(&response.url)),
    };

    log::debug!("Redirect {} -> {} ({})", response.url, target, status.as_u16());
    request.url_list.push(target.clone());
    request.url = target;
    state.hops += 1;
    stats.increment_info(InfoType::Redirect);

    Ok(state)
}
