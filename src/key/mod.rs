//! Account keys for the ACME request core.
//!
//! Every ACME request is authenticated by a JWS signed with the
//! account's private key. This module loads that key from PEM,
//! derives the public facets the protocol needs (JWK, algorithm
//! name, RFC 7638 thumbprint) and produces raw JWS signatures. The
//! RustCrypto primitives stay behind [`AccountKey`] so the protocol
//! layer never deals in curve widths or DER.

#![deny(unsafe_code)]
#![deny(missing_docs)]

use std::fmt;

mod ecdsa;
pub mod jwk;
mod rsa;
mod transcode;

use const_oid::db::rfc5912;

use self::ecdsa::EcAccountKey;
use self::rsa::RsaAccountKey;
use crate::protocol::errors::Error;

pub use self::jwk::Jwk;

/// Algorithm family of a loaded account key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// RSA with PKCS#1 v1.5 / SHA-256 signatures.
    Rsa,
    /// ECDSA over one of the NIST curves P-256 / P-384 / P-521.
    Ec,
}

/// An account private key and its frozen public facets.
///
/// The JWK, algorithm name and thumbprint are derived once at load
/// time and stay immutable until a different key replaces the whole
/// value.
pub struct AccountKey {
    inner: InnerKey,
    jwk: Jwk,
    alg: &'static str,
    thumbprint: String,
}

enum InnerKey {
    Rsa(RsaAccountKey),
    Ec(EcAccountKey),
}

impl InnerKey {
    fn jwk(&self) -> Jwk {
        match self {
            InnerKey::Rsa(key) => key.jwk(),
            InnerKey::Ec(key) => key.jwk(),
        }
    }

    fn alg(&self) -> &'static str {
        match self {
            InnerKey::Rsa(_) => "RS256",
            InnerKey::Ec(key) => key.alg(),
        }
    }
}

impl AccountKey {
    /// Load a private key from PEM.
    ///
    /// PKCS#8 (`PRIVATE KEY`), SEC1 (`EC PRIVATE KEY`) and PKCS#1
    /// (`RSA PRIVATE KEY`) bodies are accepted; the key kind and
    /// curve are detected from the encoded algorithm identifier.
    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        let (label, der) = pem_rfc7468::decode_vec(pem.as_bytes())
            .map_err(|err| Error::KeyLoad(err.to_string()))?;

        let inner = match label {
            "PRIVATE KEY" => Self::from_pkcs8_der(&der)?,
            "EC PRIVATE KEY" => InnerKey::Ec(EcAccountKey::from_sec1_der(&der)?),
            "RSA PRIVATE KEY" => InnerKey::Rsa(RsaAccountKey::from_pkcs1_der(&der)?),
            other => {
                return Err(Error::KeyLoad(format!("unexpected PEM label: {other}")));
            }
        };

        let jwk = inner.jwk();
        let alg = inner.alg();
        let thumbprint = jwk.thumbprint();

        Ok(AccountKey {
            inner,
            jwk,
            alg,
            thumbprint,
        })
    }

    fn from_pkcs8_der(der: &[u8]) -> Result<InnerKey, Error> {
        let pki = pkcs8::PrivateKeyInfo::try_from(der)
            .map_err(|err| Error::KeyLoad(err.to_string()))?;

        if pki.algorithm.oid == rfc5912::RSA_ENCRYPTION {
            Ok(InnerKey::Rsa(RsaAccountKey::from_pkcs8(pki)?))
        } else if pki.algorithm.oid == rfc5912::ID_EC_PUBLIC_KEY {
            Ok(InnerKey::Ec(EcAccountKey::from_pkcs8(pki)?))
        } else {
            Err(Error::UnsupportedKey(pki.algorithm.oid.to_string()))
        }
    }

    /// Algorithm family of this key.
    pub fn kind(&self) -> KeyKind {
        match &self.inner {
            InnerKey::Rsa(_) => KeyKind::Rsa,
            InnerKey::Ec(_) => KeyKind::Ec,
        }
    }

    /// Modulus bits for RSA; curve order bits for EC (256/384/521).
    pub fn bits(&self) -> usize {
        match &self.inner {
            InnerKey::Rsa(key) => key.bits(),
            InnerKey::Ec(key) => key.bits(),
        }
    }

    /// Hash width in bits used when signing (P-521 maps to 512).
    pub fn sha_bits(&self) -> usize {
        match &self.inner {
            InnerKey::Rsa(_) => 256,
            InnerKey::Ec(key) => key.sha_bits(),
        }
    }

    /// JWS algorithm name: `RS256`, `ES256`, `ES384` or `ES512`.
    pub fn alg(&self) -> &'static str {
        self.alg
    }

    /// Public key as a JWK with canonically ordered members.
    pub fn public_jwk(&self) -> &Jwk {
        &self.jwk
    }

    /// RFC 7638 thumbprint of the public JWK.
    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }

    /// Produce the raw JWS signature over `message`.
    ///
    /// RSA keys return the PKCS#1 v1.5 signature bytes as-is; EC keys
    /// return `r || s` with each half padded to the curve's field
    /// width.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, Error> {
        match &self.inner {
            InnerKey::Rsa(key) => key.sign(message),
            InnerKey::Ec(key) => key.sign(message),
        }
    }
}

impl fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material stays out of logs.
        f.debug_struct("AccountKey")
            .field("alg", &self.alg)
            .field("thumbprint", &self.thumbprint)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use elliptic_curve::pkcs8::DecodePrivateKey as _;
    use signature::Verifier as _;

    use super::*;

    const RSA_2048: &str = include_str!("../../reference-keys/rsa-2048.pem");
    const RSA_2048_PKCS1: &str = include_str!("../../reference-keys/rsa-2048-pkcs1.pem");
    const EC_P256: &str = include_str!("../../reference-keys/ec-p256.pem");
    const EC_P256_SEC1: &str = include_str!("../../reference-keys/ec-p256-sec1.pem");
    const EC_P384: &str = include_str!("../../reference-keys/ec-p384.pem");
    const EC_P521: &str = include_str!("../../reference-keys/ec-p521.pem");

    #[test]
    fn rsa_facets() {
        let key = AccountKey::from_pem(RSA_2048).unwrap();
        assert_eq!(key.kind(), KeyKind::Rsa);
        assert_eq!(key.bits(), 2048);
        assert_eq!(key.sha_bits(), 256);
        assert_eq!(key.alg(), "RS256");
        assert_eq!(
            key.thumbprint(),
            "L4P9rqGS2uwE2kDO6bcsSoKzF8ExuRtHI0tXMtnGD5w"
        );
    }

    #[test]
    fn ec_facets() {
        for (pem, bits, sha, alg, thumb) in [
            (
                EC_P256,
                256,
                256,
                "ES256",
                "eq4dgbEdA1rjkcn2UGZcYhuqCUxQbOwypnRe8R6qeh4",
            ),
            (
                EC_P384,
                384,
                384,
                "ES384",
                "xr3FuH53QOHfDdtQtz-fuH2pXLOZfaeLd7GI9KmSA8o",
            ),
            (
                EC_P521,
                521,
                512,
                "ES512",
                "dGpQ2XFv9iGs1ibsW4SvRNQoSHjDZMJJg1g9l2ZqjWE",
            ),
        ] {
            let key = AccountKey::from_pem(pem).unwrap();
            assert_eq!(key.kind(), KeyKind::Ec);
            assert_eq!(key.bits(), bits);
            assert_eq!(key.sha_bits(), sha);
            assert_eq!(key.alg(), alg);
            assert_eq!(key.thumbprint(), thumb);
        }
    }

    #[test]
    fn canonical_jwk_for_p256() {
        let key = AccountKey::from_pem(EC_P256).unwrap();
        let json = serde_json::to_string(key.public_jwk()).unwrap();
        assert_eq!(
            json,
            "{\"crv\":\"P-256\",\"kty\":\"EC\",\
             \"x\":\"W0TlH3Xa76aRcKJD8Go4Z3JDfbVff4zitJ8vzOLE3YM\",\
             \"y\":\"zaDRdHVGrWG7mjPhe2ZrLcsXgephaxKDeyCZ1whqCH0\"}"
        );
    }

    #[test]
    fn thumbprint_is_stable_across_loads() {
        let first = AccountKey::from_pem(RSA_2048).unwrap();
        let second = AccountKey::from_pem(RSA_2048).unwrap();
        assert_eq!(first.thumbprint(), second.thumbprint());
    }

    #[test]
    fn pem_encodings_agree() {
        let pkcs8 = AccountKey::from_pem(EC_P256).unwrap();
        let sec1 = AccountKey::from_pem(EC_P256_SEC1).unwrap();
        assert_eq!(pkcs8.thumbprint(), sec1.thumbprint());

        let pkcs8 = AccountKey::from_pem(RSA_2048).unwrap();
        let pkcs1 = AccountKey::from_pem(RSA_2048_PKCS1).unwrap();
        assert_eq!(pkcs8.thumbprint(), pkcs1.thumbprint());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            AccountKey::from_pem("not a key"),
            Err(Error::KeyLoad(_))
        ));
    }

    #[test]
    fn rejects_unexpected_pem_label() {
        let pem = "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n";
        assert!(matches!(
            AccountKey::from_pem(pem),
            Err(Error::KeyLoad(_))
        ));
    }

    #[test]
    fn rsa_signature_verifies() {
        let key = AccountKey::from_pem(RSA_2048).unwrap();
        let message = b"protected.payload";
        let raw = key.sign(message).unwrap();
        assert_eq!(raw.len(), 256);

        let keypair = ::rsa::RsaPrivateKey::from_pkcs8_pem(RSA_2048).unwrap();
        let verifying =
            ::rsa::pkcs1v15::VerifyingKey::<sha2::Sha256>::new(keypair.to_public_key());
        let signature = ::rsa::pkcs1v15::Signature::try_from(raw.as_slice()).unwrap();
        verifying.verify(message, &signature).unwrap();
    }

    #[test]
    fn p256_signature_verifies() {
        let key = AccountKey::from_pem(EC_P256).unwrap();
        let message = b"protected.payload";
        let raw = key.sign(message).unwrap();
        assert_eq!(raw.len(), 64);

        let secret = elliptic_curve::SecretKey::<p256::NistP256>::from_pkcs8_pem(EC_P256).unwrap();
        let signer = ::ecdsa::SigningKey::from(&secret);
        let signature = ::ecdsa::Signature::<p256::NistP256>::from_slice(&raw).unwrap();
        signer.verifying_key().verify(message, &signature).unwrap();
    }

    #[test]
    fn p384_signature_verifies() {
        let key = AccountKey::from_pem(EC_P384).unwrap();
        let message = b"protected.payload";
        let raw = key.sign(message).unwrap();
        assert_eq!(raw.len(), 96);

        let secret = elliptic_curve::SecretKey::<p384::NistP384>::from_pkcs8_pem(EC_P384).unwrap();
        let signer = ::ecdsa::SigningKey::from(&secret);
        let signature = ::ecdsa::Signature::<p384::NistP384>::from_slice(&raw).unwrap();
        signer.verifying_key().verify(message, &signature).unwrap();
    }

    #[test]
    fn p521_signature_is_always_132_bytes() {
        let key = AccountKey::from_pem(EC_P521).unwrap();
        // Even a one-byte message gets the full 66 + 66 byte encoding,
        // and repeated signatures never change width.
        for message in [&b"a"[..], b"protected.payload", b""] {
            let raw = key.sign(message).unwrap();
            assert_eq!(raw.len(), 132);

            let secret =
                elliptic_curve::SecretKey::<p521::NistP521>::from_pkcs8_pem(EC_P521).unwrap();
            let signer = ::ecdsa::SigningKey::from(&secret);
            let signature = ::ecdsa::Signature::<p521::NistP521>::from_slice(&raw).unwrap();
            signer.verifying_key().verify(message, &signature).unwrap();
        }
    }

    static_assertions::assert_impl_all!(AccountKey: Send, Sync);
}
