//! Conversion of DER ECDSA signatures into the fixed-width form JWS
//! requires.
//!
//! An ECDSA signer emits `SEQUENCE { INTEGER r, INTEGER s }`. JWS
//! (RFC 7518 §3.4) instead wants `r || s` with each integer
//! left-padded to the byte width of the curve order, so a P-521
//! signature is always exactly 132 bytes no matter how small `r` or
//! `s` happen to be.

use crate::protocol::errors::Error;

/// Convert a DER `SEQUENCE` of two `INTEGER`s into `r || s`, each
/// half left-padded with zeros to `pad_len` bytes.
///
/// DER sign-padding (a leading `0x00` protecting the high bit) is
/// stripped before padding; DER's minimal-length rule guarantees at
/// most one such byte. Any structural mismatch is reported as
/// [`Error::MalformedSignature`].
pub(crate) fn der_to_fixed(der: &[u8], pad_len: usize) -> Result<Vec<u8>, Error> {
    if der.first() != Some(&0x30) {
        return Err(Error::MalformedSignature);
    }

    // Sequence length: single-byte form, or long form with one length
    // octet (0x81) for signatures past 127 bytes (P-521).
    let mut offset = match der.get(1) {
        Some(&0x81) => 3,
        Some(&len) if len < 0x80 => 2,
        _ => return Err(Error::MalformedSignature),
    };

    let mut out = Vec::with_capacity(pad_len * 2);
    for _ in 0..2 {
        if der.get(offset) != Some(&0x02) {
            return Err(Error::MalformedSignature);
        }
        let len = *der.get(offset + 1).ok_or(Error::MalformedSignature)? as usize;
        let integer = der
            .get(offset + 2..offset + 2 + len)
            .ok_or(Error::MalformedSignature)?;

        let unpadded = strip_leading_zeros(integer);
        if unpadded.len() > pad_len {
            return Err(Error::MalformedSignature);
        }
        out.resize(out.len() + pad_len - unpadded.len(), 0x00);
        out.extend_from_slice(unpadded);

        offset += 2 + len;
    }

    Ok(out)
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0x00).unwrap_or(bytes.len());
    &bytes[start..]
}
