//! Errors arising from the ACME request core.

use serde::Deserialize;
use thiserror::Error;

/// ACME error URN for a rejected anti-replay nonce, the one problem
/// class the engine recovers from on its own.
const BAD_NONCE: &str = "urn:ietf:params:acme:error:badNonce";

/// Unified error type for the request core.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The account key PEM could not be parsed.
    #[error("unable to parse account key: {0}")]
    KeyLoad(String),

    /// The account key is neither RSA nor a supported EC curve.
    #[error("unsupported account key algorithm: {0}")]
    UnsupportedKey(String),

    /// The signing primitive failed.
    #[error("signing failed: {0}")]
    Sign(#[source] signature::Error),

    /// The ECDSA signer produced DER this crate could not transcode.
    #[error("malformed DER signature from the ECDSA signer")]
    MalformedSignature,

    /// The directory response was unusable or a resource name has no
    /// mapped URL.
    #[error("directory error: {0}")]
    Directory(String),

    /// Connection or local I/O failure in the HTTP transport.
    #[error("network request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A non-2xx status without an accompanying problem document.
    #[error("unexpected HTTP status {code} from {url}")]
    HttpStatus {
        /// Three-digit status code as text.
        code: String,
        /// The URL that produced the status.
        url: String,
    },

    /// The server returned an RFC 7807 problem document.
    #[error("ACME problem: {0}")]
    Protocol(#[source] Problem),

    /// The server sent malformed JSON.
    #[error("malformed JSON from server: {0}")]
    JsonParse(#[source] serde_json::Error),

    /// A request body failed to serialize.
    #[error("JSON serialization failed: {0}")]
    JsonSerialize(#[source] serde_json::Error),

    /// A signed request was attempted before `load_account_key`.
    #[error("no account key loaded")]
    NoKey,

    /// A `newNonce` reply carried no `Replay-Nonce` header.
    #[error("no Replay-Nonce header was returned")]
    MissingNonce,

    /// A response was missing data the protocol requires.
    #[error("required response data is missing: {0}")]
    MissingData(&'static str),
}

impl Error {
    /// Constructor for a deserialization error.
    pub(crate) fn de(error: serde_json::Error) -> Self {
        Error::JsonParse(error)
    }

    /// Constructor for a serialization error.
    pub(crate) fn ser(error: serde_json::Error) -> Self {
        Error::JsonSerialize(error)
    }
}

/// RFC 7807 problem document returned by ACME servers.
///
/// Subproblems keep the server's order; each subproblem's detail is
/// prefixed with the quoted identifier value it concerns, e.g.
/// `"example.com": no valid authorization`.
#[derive(Debug, Clone, Error, Deserialize)]
#[serde(from = "RawProblem")]
#[error("{kind}: {detail}")]
pub struct Problem {
    /// The `type` URN, e.g. `urn:ietf:params:acme:error:unauthorized`.
    pub kind: String,
    /// Human-readable detail.
    pub detail: String,
    /// Per-identifier subproblems, in server order.
    pub subproblems: Vec<Problem>,
}

impl Problem {
    /// Whether this is the retriable `badNonce` rejection.
    pub fn is_bad_nonce(&self) -> bool {
        self.kind == BAD_NONCE
    }
}

/// Wire format of a problem document, before detail formatting.
#[derive(Debug, Clone, Deserialize)]
struct RawProblem {
    #[serde(rename = "type")]
    kind: Option<String>,
    detail: Option<String>,
    #[serde(default)]
    subproblems: Vec<RawSubproblem>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawSubproblem {
    #[serde(rename = "type")]
    kind: Option<String>,
    detail: Option<String>,
    identifier: Option<Identifier>,
}

#[derive(Debug, Clone, Deserialize)]
struct Identifier {
    #[serde(default)]
    value: String,
}

impl From<RawProblem> for Problem {
    fn from(raw: RawProblem) -> Self {
        Problem {
            kind: raw.kind.unwrap_or_else(|| "about:blank".to_owned()),
            detail: raw.detail.unwrap_or_default(),
            subproblems: raw
                .subproblems
                .into_iter()
                .map(|sub| {
                    let detail = sub.detail.unwrap_or_default();
                    let detail = match sub.identifier {
                        Some(identifier) => format!("\"{}\": {detail}", identifier.value),
                        None => detail,
                    };
                    Problem {
                        kind: sub.kind.unwrap_or_else(|| "about:blank".to_owned()),
                        detail,
                        subproblems: Vec::new(),
                    }
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_nonce_is_recognized() {
        let problem: Problem = serde_json::from_str(
            r#"{"type":"urn:ietf:params:acme:error:badNonce","detail":"stale"}"#,
        )
        .unwrap();
        assert!(problem.is_bad_nonce());
        assert_eq!(problem.to_string(), "urn:ietf:params:acme:error:badNonce: stale");
    }

    #[test]
    fn subproblem_detail_carries_quoted_identifier() {
        let problem: Problem = serde_json::from_str(
            r#"{
                "type": "urn:ietf:params:acme:error:unauthorized",
                "detail": "some identifiers failed",
                "subproblems": [
                    {
                        "type": "urn:ietf:params:acme:error:unauthorized",
                        "detail": "no authz",
                        "identifier": { "type": "dns", "value": "example.com" }
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(problem.subproblems.len(), 1);
        assert_eq!(problem.subproblems[0].detail, "\"example.com\": no authz");
    }

    #[test]
    fn missing_fields_fall_back() {
        let problem: Problem = serde_json::from_str("{}").unwrap();
        assert_eq!(problem.kind, "about:blank");
        assert_eq!(problem.detail, "");
        assert!(problem.subproblems.is_empty());
    }
}
