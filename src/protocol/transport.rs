//! The HTTP capability the request engine drives.
//!
//! The engine only ever needs three exchanges: a plain `GET` (the
//! directory and certificate downloads), a `HEAD` (`newNonce`), and a
//! `POST` with an `application/jose+json` body (everything signed).
//! Those three are a trait so tests can inject a scripted stub and
//! exercise the whole engine without a network.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use super::errors::Error;

const CONTENT_JOSE: &str = "application/jose+json";

/// One HTTP exchange, before any protocol-level interpretation.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Three-digit status code as text, e.g. `"201"`.
    pub code: String,
    /// Response headers with names case-folded to lower-case.
    pub headers: HashMap<String, String>,
    /// Unparsed response body.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Build a response, case-folding the header names.
    pub fn new<I>(code: impl Into<String>, headers: I, body: Vec<u8>) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        RawResponse {
            code: code.into(),
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value))
                .collect(),
            body,
        }
    }

    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// HTTP backend used by [`AcmeClient`](super::client::AcmeClient).
///
/// Implementations must follow redirects and return the complete
/// response body regardless of status; translating statuses and
/// problem documents into errors is the engine's job.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Plain `GET` without a body.
    async fn get(&self, url: &str) -> Result<RawResponse, Error>;

    /// `HEAD` without a body, used against `newNonce`.
    async fn head(&self, url: &str) -> Result<RawResponse, Error>;

    /// `POST` with a flattened-JWS body and
    /// `Content-Type: application/jose+json`.
    async fn post_jose(&self, url: &str, body: Vec<u8>) -> Result<RawResponse, Error>;
}

/// Production [`Transport`] over [`reqwest`].
///
/// Follows redirects (reqwest's default policy), applies 30-second
/// connect/request timeouts and identifies the crate in the
/// User-Agent.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    inner: reqwest::Client,
}

impl HttpTransport {
    /// Build the reqwest-backed transport.
    pub fn new() -> Result<Self, Error> {
        let inner = reqwest::Client::builder()
            .user_agent(concat!("acme-wire / ", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(HttpTransport { inner })
    }

    async fn run(&self, request: reqwest::RequestBuilder) -> Result<RawResponse, Error> {
        let response = request.send().await?;

        let code = response.status().as_str().to_owned();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_owned(), value.to_owned()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse::new(code, headers, body))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, Error> {
        tracing::trace!(%url, "GET");
        self.run(self.inner.get(url)).await
    }

    async fn head(&self, url: &str) -> Result<RawResponse, Error> {
        tracing::trace!(%url, "HEAD");
        self.run(self.inner.head(url)).await
    }

    async fn post_jose(&self, url: &str, body: Vec<u8>) -> Result<RawResponse, Error> {
        tracing::trace!(%url, body = body.len(), "POST");
        self.run(
            self.inner
                .post(url)
                .header(reqwest::header::CONTENT_TYPE, CONTENT_JOSE)
                .body(body),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_names_are_case_folded() {
        let raw = RawResponse::new(
            "200",
            vec![
                ("Replay-Nonce".to_owned(), "abc".to_owned()),
                ("Content-Type".to_owned(), "application/json".to_owned()),
            ],
            Vec::new(),
        );
        assert_eq!(raw.header("replay-nonce"), Some("abc"));
        assert_eq!(raw.header("REPLAY-NONCE"), Some("abc"));
        assert_eq!(raw.headers.get("Replay-Nonce"), None);
    }

    static_assertions::assert_impl_all!(HttpTransport: Send, Sync);
}
