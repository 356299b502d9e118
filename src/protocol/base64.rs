//! Unpadded base64url, the only byte encoding JWS uses.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::Serialize;

use super::errors::Error;

/// Encode bytes as unpadded base64url (RFC 4648 §5, no `=`).
pub(crate) fn base64url(data: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(data)
}

/// Serialize `value` as compact JSON, then base64url the bytes.
pub(crate) fn base64url_json<T>(value: &T) -> Result<String, Error>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_vec(value).map_err(Error::ser)?;
    Ok(base64url(&json))
}
