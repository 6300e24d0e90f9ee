use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use rcgen::{
    BasicConstraints, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa, KeyPair, KeyUsagePurpose,
};
use rustls::{pki_types::CertificateDer, CertificateError, RootCertStore};

use certpin_core::{
    testing::synthetic_certificate, ChainError, ChainValidator, Fingerprint, Hostname, PresentedChain, TrustLevel,
};

use crate::{map_error, unix_time, ValidatorError, WebPkiValidator};

fn host(name: &str) -> Hostname {
    Hostname::parse(name).unwrap()
}

// A private CA and one server leaf it signed, as DER.
struct TestPki {
    ca: Vec<u8>,
    leaf: Vec<u8>,
}

impl TestPki {
    fn issue(host: &str) -> Self {
        Self::issue_under("certpin test CA", host)
    }

    fn issue_under(ca_name: &str, host: &str) -> Self {
        let ca_key = KeyPair::generate().unwrap();
        let mut ca_params = CertificateParams::new(Vec::<String>::new()).unwrap();
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params.distinguished_name.push(DnType::CommonName, ca_name);
        ca_params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
        let ca = ca_params.self_signed(&ca_key).unwrap();

        let leaf_key = KeyPair::generate().unwrap();
        let mut leaf_params = CertificateParams::new(vec![host.to_string()]).unwrap();
        leaf_params.distinguished_name.push(DnType::CommonName, host);
        leaf_params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
        let leaf = leaf_params.signed_by(&leaf_key, &ca, &ca_key).unwrap();

        Self {
            ca: ca.der().to_vec(),
            leaf: leaf.der().to_vec(),
        }
    }

    fn validator(&self) -> WebPkiValidator {
        let mut roots = RootCertStore::empty();
        roots.add(CertificateDer::from(self.ca.clone())).unwrap();
        WebPkiValidator::with_roots(Arc::new(roots), TrustLevel::Proceed).unwrap()
    }
}

#[test]
fn chain_to_configured_anchor_is_trusted() {
    let pki = TestPki::issue("localhost");
    let certs = [pki.leaf.clone()];
    let chain = PresentedChain::from_ders(&certs).unwrap();

    let trust = pki
        .validator()
        .validate(&host("localhost"), &chain, SystemTime::now())
        .unwrap();
    assert_eq!(trust.level(), TrustLevel::Proceed);
    assert_eq!(trust.hostname(), &host("localhost"));
    assert_eq!(trust.leaf_fingerprint(), Fingerprint::of(&pki.leaf));
}

#[test]
fn valid_chain_for_another_host_is_not_valid_for_host() {
    let pki = TestPki::issue("localhost");
    let certs = [pki.leaf.clone()];
    let chain = PresentedChain::from_ders(&certs).unwrap();

    let err = pki
        .validator()
        .validate(&host("github.com"), &chain, SystemTime::now())
        .unwrap_err();
    assert_eq!(err, ChainError::NotValidForHost);
}

#[test]
fn leaf_from_another_ca_is_unknown_issuer() {
    let trusted = TestPki::issue("localhost");
    let stranger = TestPki::issue_under("some other CA", "localhost");
    let certs = [stranger.leaf.clone()];
    let chain = PresentedChain::from_ders(&certs).unwrap();

    let err = trusted
        .validator()
        .validate(&host("localhost"), &chain, SystemTime::now())
        .unwrap_err();
    assert_eq!(err, ChainError::UnknownIssuer);
}

#[test]
fn validation_uses_the_supplied_clock() {
    let pki = TestPki::issue("localhost");
    let certs = [pki.leaf.clone()];
    let chain = PresentedChain::from_ders(&certs).unwrap();

    // before the generated validity period starts
    let err = pki
        .validator()
        .validate(&host("localhost"), &chain, UNIX_EPOCH + Duration::from_secs(1))
        .unwrap_err();
    assert_eq!(err, ChainError::NotValidYet);
}

#[test]
fn bundled_roots_build_a_validator() {
    let validator = WebPkiValidator::with_webpki_roots().unwrap();
    assert_eq!(validator.level, TrustLevel::Unspecified);
}

#[test]
fn empty_root_store_is_refused() {
    let err = WebPkiValidator::with_roots(Arc::new(RootCertStore::empty()), TrustLevel::Proceed).unwrap_err();
    assert!(matches!(err, ValidatorError::NoRoots));
}

#[test]
fn garbage_leaf_is_bad_encoding() {
    let validator = WebPkiValidator::with_webpki_roots().unwrap();
    let certs = [b"definitely not a certificate".to_vec()];
    let chain = PresentedChain::from_ders(&certs).unwrap();

    let err = validator.validate(&host("example.com"), &chain, SystemTime::now()).unwrap_err();
    assert_eq!(err, ChainError::BadEncoding);
}

#[test]
fn self_issued_synthetic_certificate_is_not_trusted() {
    let validator = WebPkiValidator::with_webpki_roots().unwrap();
    let certs = [synthetic_certificate("example.com", &[0x42; 65])];
    let chain = PresentedChain::from_ders(&certs).unwrap();

    assert!(validator.validate(&host("example.com"), &chain, SystemTime::now()).is_err());
}

#[test]
fn rustls_errors_map_to_chain_errors() {
    let cases = [
        (CertificateError::UnknownIssuer, ChainError::UnknownIssuer),
        (CertificateError::Expired, ChainError::Expired),
        (CertificateError::NotValidYet, ChainError::NotValidYet),
        (CertificateError::NotValidForName, ChainError::NotValidForHost),
        (CertificateError::BadSignature, ChainError::BadSignature),
        (CertificateError::BadEncoding, ChainError::BadEncoding),
        (CertificateError::InvalidPurpose, ChainError::InvalidUsage),
    ];
    for (rustls_err, expected) in cases {
        assert_eq!(map_error(rustls::Error::InvalidCertificate(rustls_err)), expected);
    }

    assert!(matches!(
        map_error(rustls::Error::InvalidCertificate(CertificateError::Revoked)),
        ChainError::Other(_)
    ));
    assert!(matches!(map_error(rustls::Error::DecryptError), ChainError::Other(_)));
}

#[test]
fn clock_before_epoch_is_an_error() {
    let before = UNIX_EPOCH - Duration::from_secs(1);
    assert!(unix_time(before).is_err());
    assert_eq!(
        unix_time(UNIX_EPOCH + Duration::from_secs(5)).unwrap().as_secs(),
        5
    );
}
