//! Synthetic DER certificates for tests.
//!
//! The output has the exact X.509 envelope (tbsCertificate fields in order,
//! signature algorithm, signature) but carries no real key or signature, so
//! it is only good for byte comparisons and structural checks.

fn encode_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
    } else if len < 0x100 {
        out.push(0x81);
        out.push(len as u8);
    } else {
        out.push(0x82);
        out.push((len >> 8) as u8);
        out.push(len as u8);
    }
}

fn tagged(tag: u8, contents: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    encode_length(&mut out, contents.len());
    out.extend_from_slice(contents);
    out
}

fn seq(contents: &[u8]) -> Vec<u8> {
    tagged(0x30, contents)
}

fn name(common_name: &str) -> Vec<u8> {
    let attr = [
        tagged(0x06, &[0x55, 0x04, 0x03]),
        tagged(0x0C, common_name.as_bytes()),
    ]
    .concat();
    seq(&tagged(0x31, &seq(&attr)))
}

fn ecdsa_with_sha256() -> Vec<u8> {
    seq(&tagged(0x06, &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x02]))
}

/// The `subjectPublicKeyInfo` TLV that [`synthetic_certificate`] embeds for `key`.
pub fn synthetic_spki(key: &[u8]) -> Vec<u8> {
    let mut bits = vec![0x00];
    bits.extend_from_slice(key);
    seq(&[
        seq(&tagged(0x06, &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01])),
        tagged(0x03, &bits),
    ]
    .concat())
}

/// Self-issued certificate for `subject` carrying `key`, serial number 1.
pub fn synthetic_certificate(subject: &str, key: &[u8]) -> Vec<u8> {
    synthetic_certificate_with_serial(subject, key, 1)
}

/// Same as [`synthetic_certificate`] with an explicit serial number, e.g. to
/// model a certificate reissued for the same key.
pub fn synthetic_certificate_with_serial(subject: &str, key: &[u8], serial: u8) -> Vec<u8> {
    let validity = seq(&[
        tagged(0x17, b"250101000000Z"),
        tagged(0x17, b"350101000000Z"),
    ]
    .concat());

    let tbs = seq(&[
        tagged(0xA0, &tagged(0x02, &[0x02])),
        tagged(0x02, &[serial]),
        ecdsa_with_sha256(),
        name(subject),
        validity,
        name(subject),
        synthetic_spki(key),
    ]
    .concat());

    seq(&[tbs, ecdsa_with_sha256(), tagged(0x03, &[0x00, 0xDE, 0xAD, serial])].concat())
}
