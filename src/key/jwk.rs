//! JSON Web Keys and RFC 7638 thumbprints for account keys.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Public half of an account key as a JSON Web Key (RFC 7517).
///
/// Only the required members of each key type are carried, and the
/// fields are declared in the lexicographic order RFC 7638 prescribes
/// for thumbprint computation. Serializing a [`Jwk`] with `serde_json`
/// therefore yields the canonical form directly; the same value is
/// embedded verbatim in protected headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Jwk {
    /// An elliptic curve public key: `{crv, kty, x, y}`.
    Ec(EcJwk),
    /// An RSA public key: `{e, kty, n}`.
    Rsa(RsaJwk),
}

/// EC JWK members. Field order carries the canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EcJwk {
    /// Curve name, `P-256` / `P-384` / `P-521`.
    pub crv: String,
    /// Always `EC`.
    pub kty: String,
    /// base64url x coordinate, left-padded to the field width.
    pub x: String,
    /// base64url y coordinate, left-padded to the field width.
    pub y: String,
}

/// RSA JWK members. Field order carries the canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RsaJwk {
    /// base64url public exponent.
    pub e: String,
    /// Always `RSA`.
    pub kty: String,
    /// base64url modulus.
    pub n: String,
}

impl Jwk {
    pub(crate) fn ec(crv: &str, x: &[u8], y: &[u8]) -> Self {
        Jwk::Ec(EcJwk {
            crv: crv.to_owned(),
            kty: "EC".to_owned(),
            x: Base64UrlUnpadded::encode_string(x),
            y: Base64UrlUnpadded::encode_string(y),
        })
    }

    pub(crate) fn rsa(e: &[u8], n: &[u8]) -> Self {
        Jwk::Rsa(RsaJwk {
            e: Base64UrlUnpadded::encode_string(e),
            kty: "RSA".to_owned(),
            n: Base64UrlUnpadded::encode_string(n),
        })
    }

    /// The RFC 7638 thumbprint which uniquely identifies this key:
    /// base64url(SHA-256(canonical JSON)).
    ///
    /// Used for challenge key authorizations.
    pub fn thumbprint(&self) -> String {
        let canonical = serde_json::to_vec(self).expect("JWK serializes to JSON");
        let digest = Sha256::digest(&canonical);
        Base64UrlUnpadded::encode_string(&digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ec_canonical_member_order() {
        let jwk = Jwk::ec("P-256", &[1u8; 32], &[2u8; 32]);
        let json = serde_json::to_string(&jwk).unwrap();
        let crv = json.find("\"crv\"").unwrap();
        let kty = json.find("\"kty\"").unwrap();
        let x = json.find("\"x\"").unwrap();
        let y = json.find("\"y\"").unwrap();
        assert!(crv < kty && kty < x && x < y, "members out of order: {json}");
    }

    #[test]
    fn rsa_canonical_member_order() {
        let jwk = Jwk::rsa(&[1, 0, 1], &[0xAB; 256]);
        let json = serde_json::to_string(&jwk).unwrap();
        let e = json.find("\"e\"").unwrap();
        let kty = json.find("\"kty\"").unwrap();
        let n = json.find("\"n\"").unwrap();
        assert!(e < kty && kty < n, "members out of order: {json}");
        assert!(json.contains("\"e\":\"AQAB\""));
    }

    #[test]
    fn thumbprint_is_base64url() {
        let jwk = Jwk::ec("P-256", &[3u8; 32], &[4u8; 32]);
        let thumb = jwk.thumbprint();
        // SHA-256 is 32 bytes, which encodes to 43 unpadded characters.
        assert_eq!(thumb.len(), 43);
        assert!(thumb
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
