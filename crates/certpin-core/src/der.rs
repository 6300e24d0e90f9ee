/// Minimal DER walker for X.509 certificates.
///
/// Only two things are understood here:
///   - the certificate envelope (outer `Certificate` SEQUENCE spanning the
///     whole blob, with a nested `tbsCertificate` SEQUENCE), used to reject
///     blobs that cannot be a certificate at load time;
///   - the position of `subjectPublicKeyInfo`, used by public-key pinning.
///
/// ```text
/// Certificate ::= SEQUENCE {
///     tbsCertificate  SEQUENCE {
///         version         [0] EXPLICIT INTEGER DEFAULT v1,
///         serialNumber    INTEGER,
///         signature       AlgorithmIdentifier,
///         issuer          Name,
///         validity        SEQUENCE,
///         subject         Name,
///         subjectPublicKeyInfo  SEQUENCE,
///         ...
///     },
///     signatureAlgorithm  AlgorithmIdentifier,
///     signatureValue      BIT STRING,
/// }
/// ```
///
/// Everything else stays opaque bytes.

pub(crate) const TAG_SEQUENCE: u8 = 0x30;
pub(crate) const TAG_INTEGER: u8 = 0x02;
pub(crate) const TAG_CONTEXT_0: u8 = 0xA0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DerError {
    #[error("truncated DER input")]
    Truncated,

    #[error("unexpected DER tag {0:#04x}")]
    UnexpectedTag(u8),

    #[error("malformed DER length")]
    BadLength,

    #[error("{0} trailing bytes after the certificate")]
    TrailingBytes(usize),
}

struct Tlv<'a> {
    // Value bytes only, without tag and length header.
    value: &'a [u8],
    // Tag + length header + value.
    total_len: usize,
}

fn parse_tlv(data: &[u8]) -> Result<Tlv<'_>, DerError> {
    let (_tag, rest) = data.split_first().ok_or(DerError::Truncated)?;
    let (value_len, header_len) = parse_length(rest)?;

    let total = 1usize
        .checked_add(header_len)
        .and_then(|n| n.checked_add(value_len))
        .ok_or(DerError::BadLength)?;
    if total > data.len() {
        return Err(DerError::Truncated);
    }

    Ok(Tlv {
        value: &data[1 + header_len..total],
        total_len: total,
    })
}

// Returns (value_length, length_header_bytes).
fn parse_length(data: &[u8]) -> Result<(usize, usize), DerError> {
    let first = *data.first().ok_or(DerError::Truncated)?;

    if first < 0x80 {
        return Ok((first as usize, 1));
    }
    // 0x80 is the BER indefinite form, never valid in DER.
    if first == 0x80 {
        return Err(DerError::BadLength);
    }

    let num_bytes = (first & 0x7F) as usize;
    if num_bytes > 4 {
        return Err(DerError::BadLength);
    }
    if data.len() < 1 + num_bytes {
        return Err(DerError::Truncated);
    }

    let len = data[1..=num_bytes]
        .iter()
        .fold(0usize, |acc, b| (acc << 8) | *b as usize);

    Ok((len, 1 + num_bytes))
}

fn expect_tag(data: &[u8], tag: u8) -> Result<(), DerError> {
    match data.first() {
        Some(&t) if t == tag => Ok(()),
        Some(&t) => Err(DerError::UnexpectedTag(t)),
        None => Err(DerError::Truncated),
    }
}

fn skip_tlv(data: &[u8]) -> Result<&[u8], DerError> {
    let tlv = parse_tlv(data)?;
    Ok(&data[tlv.total_len..])
}

// Outer Certificate SEQUENCE -> contents of tbsCertificate.
fn tbs_certificate(cert_der: &[u8]) -> Result<&[u8], DerError> {
    expect_tag(cert_der, TAG_SEQUENCE)?;
    let outer = parse_tlv(cert_der)?;
    if outer.total_len != cert_der.len() {
        return Err(DerError::TrailingBytes(cert_der.len() - outer.total_len));
    }

    expect_tag(outer.value, TAG_SEQUENCE)?;
    let tbs = parse_tlv(outer.value)?;
    Ok(tbs.value)
}

/// Check that `cert_der` has the shape of a single DER-encoded certificate.
pub fn check_certificate_envelope(cert_der: &[u8]) -> Result<(), DerError> {
    tbs_certificate(cert_der).map(|_| ())
}

/// Extract the complete `subjectPublicKeyInfo` TLV (tag + length + value)
/// from a DER certificate.
pub fn extract_spki(cert_der: &[u8]) -> Result<&[u8], DerError> {
    let mut pos = tbs_certificate(cert_der)?;

    // version is optional (absent for v1 certificates)
    if pos.first() == Some(&TAG_CONTEXT_0) {
        pos = skip_tlv(pos)?;
    }

    expect_tag(pos, TAG_INTEGER)?; // serialNumber
    pos = skip_tlv(pos)?;

    // signature, issuer, validity, subject
    for _ in 0..4 {
        expect_tag(pos, TAG_SEQUENCE)?;
        pos = skip_tlv(pos)?;
    }

    expect_tag(pos, TAG_SEQUENCE)?;
    let spki = parse_tlv(pos)?;
    Ok(&pos[..spki.total_len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{synthetic_certificate, synthetic_spki};

    #[test]
    fn extracts_spki_from_synthetic_certificate() {
        let cert = synthetic_certificate("example.com", &[0xAA, 0xBB, 0xCC]);
        let spki = extract_spki(&cert).unwrap();
        assert_eq!(spki, synthetic_spki(&[0xAA, 0xBB, 0xCC]).as_slice());
    }

    #[test]
    fn envelope_accepts_certificate_and_rejects_garbage() {
        let cert = synthetic_certificate("example.com", &[1, 2, 3]);
        assert!(check_certificate_envelope(&cert).is_ok());

        assert_eq!(check_certificate_envelope(&[]), Err(DerError::Truncated));
        assert_eq!(
            check_certificate_envelope(b"-----BEGIN CERTIFICATE-----"),
            Err(DerError::UnexpectedTag(b'-'))
        );
        assert_eq!(
            check_certificate_envelope(&[0x30, 0x03, 0x30, 0x01]),
            Err(DerError::Truncated)
        );
    }

    #[test]
    fn envelope_rejects_trailing_bytes() {
        let mut cert = synthetic_certificate("example.com", &[1, 2, 3]);
        cert.extend_from_slice(&[0, 0]);
        assert_eq!(check_certificate_envelope(&cert), Err(DerError::TrailingBytes(2)));
    }

    #[test]
    fn parse_length_forms() {
        assert_eq!(parse_length(&[0x05]).unwrap(), (5, 1));
        assert_eq!(parse_length(&[0x7F]).unwrap(), (127, 1));
        assert_eq!(parse_length(&[0x81, 0x80]).unwrap(), (128, 2));
        assert_eq!(parse_length(&[0x82, 0x01, 0x00]).unwrap(), (256, 3));
        assert_eq!(parse_length(&[0x80]), Err(DerError::BadLength));
        assert_eq!(parse_length(&[0x85, 1, 1, 1, 1, 1]), Err(DerError::BadLength));
        assert_eq!(parse_length(&[0x82, 0x01]), Err(DerError::Truncated));
    }
}
