//! Origin comparison and referrer handling.

use std::fmt;
use std::str::FromStr;

use url::Url;

/// True if both URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// True if the URL embeds a username or password.
pub fn includes_credentials(url: &Url) -> bool {
    !url.username().is_empty() || url.password().is_some()
}

/// True if the scheme is one the engine may fetch.
pub fn is_http_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Strips userinfo and fragment so a URL can be sent as a referrer.
pub fn strip_for_referrer(url: &Url) -> Url {
    let mut stripped = url.clone();
    let _ = stripped.set_username("");
    let _ = stripped.set_password(None);
    stripped.set_fragment(None);
    stripped
}

/// Referrer policy of a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReferrerPolicy {
    /// Never send a referrer.
    NoReferrer,
    /// Full URL, except on an HTTPS to HTTP downgrade.
    NoReferrerWhenDowngrade,
    /// Origin only.
    Origin,
    /// Full URL same-origin, origin only across origins.
    OriginWhenCrossOrigin,
    /// Full URL same-origin, nothing across origins.
    SameOrigin,
    /// Origin only, and nothing on a downgrade.
    StrictOrigin,
    /// Full URL same-origin, origin only across origins, nothing on a downgrade.
    #[default]
    StrictOriginWhenCrossOrigin,
    /// Always the full URL.
    UnsafeUrl,
}

impl ReferrerPolicy {
    /// Token as it appears in a `Referrer-Policy` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferrerPolicy::NoReferrer => "no-referrer",
            ReferrerPolicy::NoReferrerWhenDowngrade => "no-referrer-when-downgrade",
            ReferrerPolicy::Origin => "origin",
            ReferrerPolicy::OriginWhenCrossOrigin => "origin-when-cross-origin",
            ReferrerPolicy::SameOrigin => "same-origin",
            ReferrerPolicy::StrictOrigin => "strict-origin",
            ReferrerPolicy::StrictOriginWhenCrossOrigin => "strict-origin-when-cross-origin",
            ReferrerPolicy::UnsafeUrl => "unsafe-url",
        }
    }

    /// The `Referer` header value to send from `referrer` to `target`, if any.
    pub fn referer_for(&self, referrer: &Url, target: &Url) -> Option<String> {
        let full = strip_for_referrer(referrer);
        let origin_only = || referrer.origin().ascii_serialization() + "/";
        let downgrade = referrer.scheme() == "https" && target.scheme() != "https";
        let same = same_origin(referrer, target);

        match self {
            ReferrerPolicy::NoReferrer => None,
            ReferrerPolicy::UnsafeUrl => Some(full.to_string()),
            ReferrerPolicy::Origin => Some(origin_only()),
            ReferrerPolicy::SameOrigin => same.then(|| full.to_string()),
            ReferrerPolicy::NoReferrerWhenDowngrade => (!downgrade).then(|| full.to_string()),
            ReferrerPolicy::StrictOrigin => (!downgrade).then(origin_only),
            ReferrerPolicy::OriginWhenCrossOrigin => {
                Some(if same { full.to_string() } else { origin_only() })
            }
            ReferrerPolicy::StrictOriginWhenCrossOrigin => {
                if same {
                    Some(full.to_string())
                } else if downgrade {
                    None
                } else {
                    Some(origin_only())
                }
            }
        }
    }
}

impl fmt::Display for ReferrerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferrerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let policy = match s.trim().to_ascii_lowercase().as_str() {
            "no-referrer" => ReferrerPolicy::NoReferrer,
            "no-referrer-when-downgrade" => ReferrerPolicy::NoReferrerWhenDowngrade,
            "origin" => ReferrerPolicy::Origin,
            "origin-when-cross-origin" => ReferrerPolicy::OriginWhenCrossOrigin,
            "same-origin" => ReferrerPolicy::SameOrigin,
            "strict-origin" => ReferrerPolicy::StrictOrigin,
            "strict-origin-when-cross-origin" => ReferrerPolicy::StrictOriginWhenCrossOrigin,
            "unsafe-url" => ReferrerPolicy::UnsafeUrl,
            other => return Err(format!("Unknown referrer policy: {}", other)),
        };
        Ok(policy)
    }
}
