//! Translation of raw HTTP exchanges into decoded ACME responses.

use std::collections::HashMap;

use serde_json::Value;

use super::errors::{Error, Problem};
use super::transport::RawResponse;

/// Response body after content-type dispatch.
#[derive(Debug, Clone)]
pub enum Body {
    /// Opaque bytes, e.g. a downloaded certificate chain.
    Bytes(Vec<u8>),
    /// Parsed `application/json` payload.
    Json(Value),
}

/// A fully decoded response from the ACME server.
#[derive(Debug, Clone)]
pub struct DecodedResponse {
    /// Three-digit status code as text, e.g. `"201"`.
    pub code: String,
    /// Response headers with names case-folded to lower-case.
    pub headers: HashMap<String, String>,
    /// The body, parsed when the server declared it JSON.
    pub body: Body,
}

impl DecodedResponse {
    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The `Location` header, which carries account and order URLs.
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// The parsed payload, when the body was `application/json`.
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(value) => Some(value),
            Body::Bytes(_) => None,
        }
    }

    /// The raw payload, when the body was opaque bytes.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.body {
            Body::Bytes(bytes) => Some(bytes),
            Body::Json(_) => None,
        }
    }
}

/// Decode one exchange: problem documents become [`Error::Protocol`],
/// other non-2xx statuses become [`Error::HttpStatus`], JSON bodies
/// are parsed, anything else passes through as bytes.
pub(crate) fn decode(raw: RawResponse, url: &str) -> Result<DecodedResponse, Error> {
    let content_type = raw.header("content-type").unwrap_or("").to_owned();

    if content_type.starts_with("application/problem+json") {
        let problem: Problem = serde_json::from_slice(&raw.body).map_err(Error::de)?;
        return Err(Error::Protocol(problem));
    }

    if !raw.code.starts_with('2') {
        return Err(Error::HttpStatus {
            code: raw.code,
            url: url.to_owned(),
        });
    }

    let body = if content_type.starts_with("application/json") {
        Body::Json(serde_json::from_slice(&raw.body).map_err(Error::de)?)
    } else {
        Body::Bytes(raw.body)
    };

    Ok(DecodedResponse {
        code: raw.code,
        headers: raw.headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(code: &str, content_type: &str, body: &str) -> RawResponse {
        RawResponse::new(
            code,
            vec![("Content-Type".to_owned(), content_type.to_owned())],
            body.as_bytes().to_vec(),
        )
    }

    #[test]
    fn json_body_is_parsed() {
        let decoded = decode(raw("200", "application/json", r#"{"status":"valid"}"#), "u").unwrap();
        assert_eq!(decoded.json().unwrap()["status"], "valid");
    }

    #[test]
    fn json_with_charset_parameter_is_parsed() {
        let decoded = decode(
            raw("200", "application/json; charset=utf-8", "{}"),
            "u",
        )
        .unwrap();
        assert!(decoded.json().is_some());
    }

    #[test]
    fn opaque_body_passes_through() {
        let decoded = decode(raw("200", "application/pem-certificate-chain", "CERT"), "u").unwrap();
        assert_eq!(decoded.bytes(), Some(&b"CERT"[..]));
        assert!(decoded.json().is_none());
    }

    #[test]
    fn problem_document_raises_protocol_error() {
        let result = decode(
            raw(
                "403",
                "application/problem+json",
                r#"{"type":"urn:ietf:params:acme:error:unauthorized","detail":"nope"}"#,
            ),
            "u",
        );
        match result {
            Err(Error::Protocol(problem)) => {
                assert_eq!(problem.kind, "urn:ietf:params:acme:error:unauthorized");
                assert_eq!(problem.detail, "nope");
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let result = decode(raw("200", "application/json", "{nope"), "u");
        assert!(matches!(result, Err(Error::JsonParse(_))));
    }

    #[test]
    fn non_2xx_without_problem_is_a_status_error() {
        let result = decode(raw("503", "text/plain", "downtime"), "https://acme/x");
        match result {
            Err(Error::HttpStatus { code, url }) => {
                assert_eq!(code, "503");
                assert_eq!(url, "https://acme/x");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }
}
