//! RSA account keys (RS256).

use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use signature::{SignatureEncoding, Signer};

use super::jwk::Jwk;
use crate::protocol::errors::Error;

/// RSA half of an account key. ACME servers accept RSA account keys
/// with PKCS#1 v1.5 signatures over SHA-256 only, so the JWS
/// algorithm is always `RS256` regardless of the modulus size.
pub(super) struct RsaAccountKey {
    keypair: ::rsa::RsaPrivateKey,
}

impl RsaAccountKey {
    pub(super) fn new(keypair: ::rsa::RsaPrivateKey) -> Self {
        Self { keypair }
    }

    pub(super) fn from_pkcs8(pki: pkcs8::PrivateKeyInfo<'_>) -> Result<Self, Error> {
        let keypair = ::rsa::RsaPrivateKey::try_from(pki)
            .map_err(|err| Error::KeyLoad(err.to_string()))?;
        Ok(Self::new(keypair))
    }

    pub(super) fn from_pkcs1_der(der: &[u8]) -> Result<Self, Error> {
        let keypair = ::rsa::RsaPrivateKey::from_pkcs1_der(der)
            .map_err(|err| Error::KeyLoad(err.to_string()))?;
        Ok(Self::new(keypair))
    }

    /// Modulus width in bits.
    pub(super) fn bits(&self) -> usize {
        self.keypair.size() * 8
    }

    pub(super) fn jwk(&self) -> Jwk {
        let public = self.keypair.to_public_key();
        Jwk::rsa(&public.e().to_bytes_be(), &public.n().to_bytes_be())
    }

    /// PKCS#1 v1.5 signature over SHA-256. The encoded signature is
    /// already the raw form JWS wants.
    pub(super) fn sign(&self, message: &[u8]) -> Result<Vec<u8>, Error> {
        let signer = ::rsa::pkcs1v15::SigningKey::<sha2::Sha256>::from(self.keypair.clone());
        let signature = signer.try_sign(message).map_err(Error::Sign)?;
        Ok(signature.to_vec())
    }
}
