//! The request engine: name-addressed, JWS-signed ACME calls.

use std::fmt;

use serde_json::Value;

use super::directory::{Directory, DirectoryUrl, TMP_RESOURCE};
use super::errors::Error;
use super::jose::{FlattenedJws, KeyBinding, Payload, ProtectedHeader, UnsignedToken};
use super::response::{self, Body, DecodedResponse};
use super::transport::{HttpTransport, RawResponse, Transport};
use crate::key::AccountKey;

const NEW_NONCE: &str = "newNonce";
const NEW_ACCOUNT: &str = "newAccount";
const NONCE_HEADER: &str = "replay-nonce";

/// An authenticated ACME session against one directory with one
/// account key.
///
/// The client owns all per-session protocol state: the memoized
/// directory, the single-slot anti-replay nonce, the account key and
/// the server-assigned account URL (`kid`). Requests are addressed by
/// directory resource name (`"newOrder"`) or by absolute URL; either
/// way the payload is wrapped in a flattened JWS, POSTed, and the
/// decoded response returned.
///
/// A request rejected with `badNonce` is retried exactly once, using
/// the replacement nonce the server attached to the rejection. Every
/// other problem propagates to the caller.
pub struct AcmeClient {
    transport: Box<dyn Transport>,
    directory_url: String,
    directory: Option<Directory>,
    nonce: Option<String>,
    key: Option<AccountKey>,
    kid: Option<String>,
}

impl AcmeClient {
    /// Create a client for the given directory, using the production
    /// [`HttpTransport`].
    pub fn new(url: DirectoryUrl<'_>) -> Result<Self, Error> {
        Ok(Self::with_transport(url, Box::new(HttpTransport::new()?)))
    }

    /// Create a client over an injected [`Transport`], e.g. a test
    /// stub.
    pub fn with_transport(url: DirectoryUrl<'_>, transport: Box<dyn Transport>) -> Self {
        AcmeClient {
            transport,
            directory_url: url.to_url().to_owned(),
            directory: None,
            nonce: None,
            key: None,
            kid: None,
        }
    }

    /// Load (or replace) the account private key from PEM.
    ///
    /// Replacing the key severs the account binding; the next request
    /// re-discovers the account URL for the new key.
    pub fn load_account_key(&mut self, pem: &str) -> Result<(), Error> {
        let key = AccountKey::from_pem(pem)?;
        self.kid = None;
        self.key = Some(key);
        Ok(())
    }

    /// The loaded account key, if any.
    pub fn account_key(&self) -> Option<&AccountKey> {
        self.key.as_ref()
    }

    /// The account URL (`kid`), discovering it through a `newAccount`
    /// request with `onlyReturnExisting` when not yet known.
    pub async fn account_id(&mut self) -> Result<String, Error> {
        if self.kid.is_none() {
            if self.key.is_none() {
                return Err(Error::NoKey);
            }
            self.ensure_directory().await?;
            self.discover_account().await?;
        }
        self.kid
            .clone()
            .ok_or(Error::MissingData("Location header on newAccount response"))
    }

    /// The key authorization for a challenge token:
    /// `token.thumbprint` (RFC 8555 §8.1).
    pub fn key_authorization(&self, token: &str) -> Result<String, Error> {
        let key = self.key.as_ref().ok_or(Error::NoKey)?;
        Ok(format!("{token}.{}", key.thumbprint()))
    }

    /// Issue a signed request.
    ///
    /// `resource` is a directory resource name such as `"newOrder"`,
    /// or an absolute URL (anything starting with `http`, matched
    /// case-insensitively) for name-less resources like order or
    /// certificate URLs. Use [`Payload::Empty`] for POST-as-GET.
    pub async fn request(
        &mut self,
        resource: &str,
        payload: impl Into<Payload>,
    ) -> Result<DecodedResponse, Error> {
        if self.key.is_none() {
            return Err(Error::NoKey);
        }
        self.ensure_directory().await?;

        // Absolute URLs ride the reserved `_tmp` slot for one call.
        let resource = if resource
            .get(..4)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("http"))
        {
            self.directory
                .as_mut()
                .expect("directory just loaded")
                .stash_url(resource);
            TMP_RESOURCE
        } else {
            resource
        };

        // Everything except first contact is signed with the account
        // URL, which may need discovering first.
        if resource != NEW_ACCOUNT && self.kid.is_none() {
            self.discover_account().await?;
        }

        self.signed_request(resource, &payload.into()).await
    }

    /// Build a nonce-less, `jwk`-bound inner JWS over `payload` for
    /// `url`, as required inside key-rollover and external-account-
    /// binding payloads (RFC 8555 §7.3.4 and §7.3.5).
    pub fn inner_jws(&self, url: &str, payload: impl Into<Payload>) -> Result<Value, Error> {
        let jws = self.encapsulate(true, &payload.into(), url, None)?;
        serde_json::to_value(&jws).map_err(Error::ser)
    }
}

impl AcmeClient {
    async fn ensure_directory(&mut self) -> Result<(), Error> {
        if self.directory.is_some() {
            return Ok(());
        }

        tracing::debug!(url = %self.directory_url, "fetching resource directory");
        let raw = self.transport.get(&self.directory_url).await?;
        self.capture_nonce(&raw);

        let decoded = response::decode(raw, &self.directory_url)?;
        let value = match decoded.body {
            Body::Json(value) => value,
            Body::Bytes(bytes) => serde_json::from_slice(&bytes).map_err(Error::de)?,
        };

        self.directory = Some(Directory::from_value(value)?);
        Ok(())
    }

    fn directory(&self) -> Result<&Directory, Error> {
        self.directory
            .as_ref()
            .ok_or_else(|| Error::Directory("directory not loaded".to_owned()))
    }

    /// Record the `Replay-Nonce` of any response, success or failure.
    /// The slot always holds the most recent nonce the server issued.
    fn capture_nonce(&mut self, raw: &RawResponse) {
        if let Some(nonce) = raw.header(NONCE_HEADER) {
            tracing::trace!("captured replay nonce");
            self.nonce = Some(nonce.to_owned());
        }
    }

    /// The nonce to sign with, fetching one from `newNonce` when the
    /// slot is empty. The slot is not cleared on use; it is replaced
    /// by the next response.
    async fn nonce(&mut self) -> Result<String, Error> {
        if let Some(nonce) = &self.nonce {
            return Ok(nonce.clone());
        }

        let url = self.directory()?.resolve(NEW_NONCE)?.to_owned();
        tracing::debug!(%url, "requesting fresh nonce");
        let raw = self.transport.head(&url).await?;
        self.capture_nonce(&raw);
        response::decode(raw, &url)?;

        self.nonce.clone().ok_or(Error::MissingNonce)
    }

    async fn discover_account(&mut self) -> Result<(), Error> {
        tracing::debug!("discovering account URL via newAccount");
        let payload = Payload::Json(serde_json::json!({ "onlyReturnExisting": true }));
        self.signed_request(NEW_ACCOUNT, &payload).await?;

        if self.kid.is_none() {
            return Err(Error::MissingData("Location header on newAccount response"));
        }
        Ok(())
    }

    async fn signed_request(
        &mut self,
        resource: &str,
        payload: &Payload,
    ) -> Result<DecodedResponse, Error> {
        let mut retried = false;
        loop {
            let url = self.directory()?.resolve(resource)?.to_owned();
            let nonce = self.nonce().await?;
            let body = self
                .encapsulate(resource == NEW_ACCOUNT, payload, &url, Some(&nonce))?
                .to_bytes()?;

            tracing::debug!(%url, "POST signed request");
            let raw = self.transport.post_jose(&url, body).await?;
            self.capture_nonce(&raw);

            match response::decode(raw, &url) {
                Err(Error::Protocol(problem)) if problem.is_bad_nonce() && !retried => {
                    // The failing response delivered the replacement
                    // nonce; one more attempt with the same payload.
                    tracing::debug!("server rejected nonce, retrying once");
                    retried = true;
                }
                Err(err) => return Err(err),
                Ok(decoded) => {
                    if resource == NEW_ACCOUNT && self.kid.is_none() {
                        if let Some(location) = decoded.location() {
                            tracing::debug!(account = %location, "bound account URL");
                            self.kid = Some(location.to_owned());
                        }
                    }
                    return Ok(decoded);
                }
            }
        }
    }

    /// Assemble and sign the flattened JWS for one request.
    ///
    /// `first_contact` selects the `jwk` header form; a `None` nonce
    /// marks an inner JWS (which also embeds `jwk`). All other
    /// requests are `kid`-bound.
    fn encapsulate(
        &self,
        first_contact: bool,
        payload: &Payload,
        url: &str,
        nonce: Option<&str>,
    ) -> Result<FlattenedJws, Error> {
        let key = self.key.as_ref().ok_or(Error::NoKey)?;

        let binding = if first_contact || nonce.is_none() {
            KeyBinding::Jwk {
                jwk: key.public_jwk(),
            }
        } else {
            KeyBinding::KeyId {
                kid: self
                    .kid
                    .as_deref()
                    .ok_or(Error::MissingData("account URL for kid-bound request"))?,
            }
        };

        let protected = ProtectedHeader::new(key.alg(), binding, url, nonce);
        UnsignedToken::new(protected, payload).sign(key)
    }
}

impl fmt::Debug for AcmeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcmeClient")
            .field("directory_url", &self.directory_url)
            .field("directory_loaded", &self.directory.is_some())
            .field("kid", &self.kid)
            .finish_non_exhaustive()
    }
}
