//! DoH request model and the provider JSON schema.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{DNS_JSON_CONTENT_TYPE, DNS_MESSAGE_CONTENT_TYPE, DOH_CANONICAL_PATH};
use crate::dns::{DnsMessage, RecordType, ResourceRecord};

/// Wire format of a DoH exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DohContentType {
    /// RFC 8484 binary messages, POSTed.
    DnsMessage,
    /// Provider JSON, fetched with GET and query parameters.
    DnsJson,
}

impl DohContentType {
    /// Binary when the provider URL's path is the canonical DoH path,
    /// JSON otherwise.
    pub fn infer(provider: &Url) -> Self {
        if provider.path() == DOH_CANONICAL_PATH {
            DohContentType::DnsMessage
        } else {
            DohContentType::DnsJson
        }
    }

    /// Value for the `Content-Type` and `Accept` headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            DohContentType::DnsMessage => DNS_MESSAGE_CONTENT_TYPE,
            DohContentType::DnsJson => DNS_JSON_CONTENT_TYPE,
        }
    }
}

/// One DoH question.
///
/// Optional string fields are passed through verbatim as query parameters
/// on the JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DohRequest {
    /// Name to resolve.
    pub name: String,
    /// Record type; `A` by default.
    pub record_type: RecordType,
    /// DO bit: the client wants DNSSEC records.
    pub dnssec_ok: bool,
    /// CD bit: disable DNSSEC validation upstream.
    pub checking_disabled: bool,
    /// Content type parameter, passed through on the JSON path.
    pub ct: Option<String>,
    /// EDNS client subnet, passed through on the JSON path.
    pub edns_client_subnet: Option<String>,
    /// On the binary path, any value also randomizes the message id.
    pub random_padding: Option<String>,
    /// Forces a wire format instead of inferring it from the provider URL.
    pub content_type: Option<DohContentType>,
}

impl DohRequest {
    /// An `A` query for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: RecordType::A,
            dnssec_ok: false,
            checking_disabled: false,
            ct: None,
            edns_client_subnet: None,
            random_padding: None,
            content_type: None,
        }
    }

    /// Sets the record type.
    pub fn with_type(mut self, record_type: RecordType) -> Self {
        self.record_type = record_type;
        self
    }

    /// Sets the DO bit.
    pub fn with_dnssec_ok(mut self, dnssec_ok: bool) -> Self {
        self.dnssec_ok = dnssec_ok;
        self
    }

    /// Sets the CD bit.
    pub fn with_checking_disabled(mut self, cd: bool) -> Self {
        self.checking_disabled = cd;
        self
    }

    /// Sets `edns_client_subnet`.
    pub fn with_edns_client_subnet(mut self, subnet: impl Into<String>) -> Self {
        self.edns_client_subnet = Some(subnet.into());
        self
    }

    /// Sets `random_padding`.
    pub fn with_random_padding(mut self, padding: impl Into<String>) -> Self {
        self.random_padding = Some(padding.into());
        self
    }

    /// Forces the wire format.
    pub fn with_content_type(mut self, content_type: DohContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Query parameters for the JSON path. Flags are only sent when set.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let record_type = match self.record_type.name() {
            Some(name) => name.to_string(),
            None => self.record_type.number().to_string(),
        };
        let mut pairs = vec![("name", self.name.clone()), ("type", record_type)];
        if self.dnssec_ok {
            pairs.push(("do", "true".to_string()));
        }
        if self.checking_disabled {
            pairs.push(("cd", "true".to_string()));
        }
        let optional = [
            ("ct", &self.ct),
            ("edns_client_subnet", &self.edns_client_subnet),
            ("random_padding", &self.random_padding),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                pairs.push((key, value.clone()));
            }
        }
        pairs
    }
}

/// A record in the uniform `{name, type, TTL, data}` shape.
///
/// `data` is text for decoded types and lower-case hex otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DohRecord {
    /// Owner name.
    pub name: String,
    /// Numeric record type.
    #[serde(rename = "type")]
    pub record_type: u16,
    /// Absent on question records.
    #[serde(rename = "TTL", default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    /// Record data.
    #[serde(default)]
    pub data: String,
}

impl From<&ResourceRecord> for DohRecord {
    fn from(record: &ResourceRecord) -> Self {
        Self {
            name: record.name.clone(),
            record_type: record.record_type.number(),
            ttl: record.ttl,
            data: record.data.to_string(),
        }
    }
}

/// A DoH answer in the provider JSON schema; binary answers are mapped
/// onto the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DohResponse {
    /// DNS response code.
    #[serde(rename = "Status")]
    pub status: u16,
    /// Truncated.
    #[serde(rename = "TC", default)]
    pub truncated: bool,
    /// Recursion desired.
    #[serde(rename = "RD", default)]
    pub recursion_desired: bool,
    /// Recursion available.
    #[serde(rename = "RA", default)]
    pub recursion_available: bool,
    /// Authenticated data (DNSSEC validated).
    #[serde(rename = "AD", default)]
    pub authenticated_data: bool,
    /// Checking disabled.
    #[serde(rename = "CD", default)]
    pub checking_disabled: bool,
    /// Question section.
    #[serde(rename = "Question", default)]
    pub question: Vec<DohRecord>,
    /// Omitted by providers when there is no answer.
    #[serde(rename = "Answer", default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<Vec<DohRecord>>,
    /// Authority section.
    #[serde(rename = "Authority", default)]
    pub authority: Vec<DohRecord>,
    /// Additional section.
    #[serde(rename = "Additional", default)]
    pub additional: Vec<DohRecord>,
    /// Extended DNS error messages.
    #[serde(rename = "Comment", default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<Vec<String>>,
}

impl DohResponse {
    /// Answer records, empty when the provider sent none.
    pub fn answers(&self) -> &[DohRecord] {
        self.answer.as_deref().unwrap_or_default()
    }
}

impl From<&DnsMessage> for DohResponse {
    fn from(message: &DnsMessage) -> Self {
        let records = |section: &[ResourceRecord]| -> Vec<DohRecord> {
            section.iter().map(DohRecord::from).collect()
        };
        let flags = &message.flags;
        Self {
            status: u16::from(flags.response_code.0),
            truncated: flags.truncated,
            recursion_desired: flags.recursion_desired,
            recursion_available: flags.recursion_available,
            authenticated_data: flags.authenticated_data,
            checking_disabled: flags.checking_disabled,
            question: records(&message.questions),
            answer: (!message.answers.is_empty()).then(|| records(&message.answers)),
            authority: records(&message.authorities),
            additional: records(&message.additionals),
            comment: None,
        }
    }
}

/// Provider error body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DohErrorBody {
    pub error: String,
}
