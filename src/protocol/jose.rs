//! Flattened JWS assembly for ACME requests (RFC 7515 §7.2.2,
//! RFC 8555 §6.2).

use serde::Serialize;
use serde_json::Value;

use super::base64::{base64url, base64url_json};
use super::errors::Error;
use crate::key::{AccountKey, Jwk};

/// How the protected header identifies the signing key.
///
/// RFC 8555 makes the two forms mutually exclusive: `jwk` for
/// first-contact requests (`newAccount`, and inner JWS for key
/// rollover or external account binding), `kid` once the server has
/// assigned an account URL.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub(crate) enum KeyBinding<'a> {
    /// Embed the public key itself.
    Jwk {
        /// Public JWK of the signing key.
        jwk: &'a Jwk,
    },
    /// Reference the server-assigned account URL.
    KeyId {
        /// The account URL.
        kid: &'a str,
    },
}

/// The signed header values common to every ACME request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ProtectedHeader<'a> {
    alg: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    nonce: Option<&'a str>,
    url: &'a str,
    #[serde(flatten)]
    key: KeyBinding<'a>,
}

impl<'a> ProtectedHeader<'a> {
    /// Assemble a protected header. `nonce` is `None` only for inner
    /// JWS objects, which RFC 8555 §7.3.5 forbids from carrying one.
    pub(crate) fn new(
        alg: &'a str,
        key: KeyBinding<'a>,
        url: &'a str,
        nonce: Option<&'a str>,
    ) -> Self {
        ProtectedHeader {
            alg,
            nonce,
            url,
            key,
        }
    }
}

/// An ACME request payload.
///
/// `Empty` encodes as the empty string, the POST-as-GET form RFC 8555
/// §6.3 uses for authenticated reads.
#[derive(Debug, Clone)]
pub enum Payload {
    /// A JSON payload, serialized compactly then base64url encoded.
    Json(Value),
    /// The empty-string payload of a POST-as-GET request.
    Empty,
}

impl Payload {
    pub(crate) fn encoded(&self) -> Result<String, Error> {
        match self {
            Payload::Json(value) => base64url_json(value),
            Payload::Empty => Ok(String::new()),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

/// Protected header and payload awaiting a signature.
pub(crate) struct UnsignedToken<'a> {
    protected: ProtectedHeader<'a>,
    payload: &'a Payload,
}

impl<'a> UnsignedToken<'a> {
    pub(crate) fn new(protected: ProtectedHeader<'a>, payload: &'a Payload) -> Self {
        UnsignedToken { protected, payload }
    }

    /// Sign `protected64.payload64` with the account key and emit the
    /// flattened JWS.
    pub(crate) fn sign(self, key: &AccountKey) -> Result<FlattenedJws, Error> {
        let protected = base64url_json(&self.protected)?;
        let payload = self.payload.encoded()?;
        let message = format!("{protected}.{payload}");
        let signature = base64url(&key.sign(message.as_bytes())?);

        Ok(FlattenedJws {
            protected,
            payload,
            signature,
        })
    }
}

/// Flattened JWS JSON object: `{protected, payload, signature}`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct FlattenedJws {
    protected: String,
    payload: String,
    signature: String,
}

impl FlattenedJws {
    /// Serialize to the bytes POSTed as `application/jose+json`.
    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(self).map_err(Error::ser)
    }
}
