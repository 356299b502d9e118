//! ECDSA account keys over the NIST curves (ES256 / ES384 / ES512).

use const_oid::AssociatedOid;
use ecdsa::signature::Signer;
use elliptic_curve::sec1::ToEncodedPoint;
use elliptic_curve::SecretKey;

use super::jwk::Jwk;
use super::transcode;
use crate::protocol::errors::Error;

/// EC half of an account key, one arm per supported curve.
///
/// The hash width is bound to the curve: SHA-256 for P-256, SHA-384
/// for P-384 and SHA-512 for P-521, which is also what the RustCrypto
/// signers use as their curve digest.
pub(super) enum EcAccountKey {
    P256(SecretKey<p256::NistP256>),
    P384(SecretKey<p384::NistP384>),
    P521(SecretKey<p521::NistP521>),
}

impl EcAccountKey {
    pub(super) fn from_pkcs8(pki: pkcs8::PrivateKeyInfo<'_>) -> Result<Self, Error> {
        let curve = pki
            .algorithm
            .parameters_oid()
            .map_err(|err| Error::KeyLoad(err.to_string()))?;

        let key = if curve == p256::NistP256::OID {
            SecretKey::try_from(pki).map(EcAccountKey::P256)
        } else if curve == p384::NistP384::OID {
            SecretKey::try_from(pki).map(EcAccountKey::P384)
        } else if curve == p521::NistP521::OID {
            SecretKey::try_from(pki).map(EcAccountKey::P521)
        } else {
            return Err(Error::UnsupportedKey(format!("EC curve {curve}")));
        };
        key.map_err(|err| Error::KeyLoad(err.to_string()))
    }

    /// SEC1 `EC PRIVATE KEY` bodies carry the curve as an optional
    /// parameter; trying each supported curve lets the scalar length
    /// check disambiguate when the parameter is absent.
    pub(super) fn from_sec1_der(der: &[u8]) -> Result<Self, Error> {
        if let Ok(key) = SecretKey::<p256::NistP256>::from_sec1_der(der) {
            return Ok(EcAccountKey::P256(key));
        }
        if let Ok(key) = SecretKey::<p384::NistP384>::from_sec1_der(der) {
            return Ok(EcAccountKey::P384(key));
        }
        if let Ok(key) = SecretKey::<p521::NistP521>::from_sec1_der(der) {
            return Ok(EcAccountKey::P521(key));
        }
        Err(Error::UnsupportedKey(
            "EC private key matches no supported curve".to_owned(),
        ))
    }

    /// Curve order width in bits.
    pub(super) fn bits(&self) -> usize {
        match self {
            EcAccountKey::P256(_) => 256,
            EcAccountKey::P384(_) => 384,
            EcAccountKey::P521(_) => 521,
        }
    }

    /// Byte width of one signature half: `ceil(bits / 8)`.
    pub(super) fn field_len(&self) -> usize {
        (self.bits() + 7) / 8
    }

    pub(super) fn sha_bits(&self) -> usize {
        match self {
            EcAccountKey::P256(_) => 256,
            EcAccountKey::P384(_) => 384,
            EcAccountKey::P521(_) => 512,
        }
    }

    pub(super) fn alg(&self) -> &'static str {
        match self {
            EcAccountKey::P256(_) => "ES256",
            EcAccountKey::P384(_) => "ES384",
            EcAccountKey::P521(_) => "ES512",
        }
    }

    pub(super) fn jwk(&self) -> Jwk {
        match self {
            EcAccountKey::P256(key) => {
                let point = key.public_key().to_encoded_point(false);
                Jwk::ec(
                    "P-256",
                    point.x().expect("uncompressed point"),
                    point.y().expect("uncompressed point"),
                )
            }
            EcAccountKey::P384(key) => {
                let point = key.public_key().to_encoded_point(false);
                Jwk::ec(
                    "P-384",
                    point.x().expect("uncompressed point"),
                    point.y().expect("uncompressed point"),
                )
            }
            EcAccountKey::P521(key) => {
                let point = key.public_key().to_encoded_point(false);
                Jwk::ec(
                    "P-521",
                    point.x().expect("uncompressed point"),
                    point.y().expect("uncompressed point"),
                )
            }
        }
    }

    /// ECDSA signature in the fixed-width `r || s` form: the signer
    /// yields DER, which is transcoded and padded to twice the field
    /// width.
    pub(super) fn sign(&self, message: &[u8]) -> Result<Vec<u8>, Error> {
        let der = match self {
            EcAccountKey::P256(key) => {
                let signer = ::ecdsa::SigningKey::from(key);
                let signature: ::ecdsa::Signature<p256::NistP256> =
                    signer.try_sign(message).map_err(Error::Sign)?;
                signature.to_der().as_bytes().to_vec()
            }
            EcAccountKey::P384(key) => {
                let signer = ::ecdsa::SigningKey::from(key);
                let signature: ::ecdsa::Signature<p384::NistP384> =
                    signer.try_sign(message).map_err(Error::Sign)?;
                signature.to_der().as_bytes().to_vec()
            }
            EcAccountKey::P521(key) => {
                let signer = ::ecdsa::SigningKey::from(key);
                let signature: ::ecdsa::Signature<p521::NistP521> =
                    signer.try_sign(message).map_err(Error::Sign)?;
                signature.to_der().as_bytes().to_vec()
            }
        };
        transcode::der_to_fixed(&der, self.field_len())
    }
}
