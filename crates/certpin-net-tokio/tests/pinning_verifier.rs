use std::{sync::Arc, time::SystemTime};

use rustls::{
    client::danger::ServerCertVerifier,
    pki_types::{CertificateDer, ServerName, UnixTime},
    CertificateError,
};

use certpin_core::{
    testing::synthetic_certificate, ChainError, ChainValidator, Hostname, PinSet, PinStore, PinningPolicy,
    PresentedChain, SystemTrust, TrustEvaluator, TrustLevel,
};
use certpin_net_tokio::{evaluate_blocking, PinningVerifier};

// Stage one always passes, so these tests exercise pin comparison only.
#[derive(Debug)]
struct AlwaysTrusted;

impl ChainValidator for AlwaysTrusted {
    fn validate(
        &self,
        hostname: &Hostname,
        chain: &PresentedChain<'_>,
        _now: SystemTime,
    ) -> Result<SystemTrust, ChainError> {
        Ok(SystemTrust::new(TrustLevel::Unspecified, hostname.clone(), chain.leaf()))
    }
}

#[derive(Debug)]
struct NeverTrusted;

impl ChainValidator for NeverTrusted {
    fn validate(&self, _: &Hostname, _: &PresentedChain<'_>, _: SystemTime) -> Result<SystemTrust, ChainError> {
        Err(ChainError::UnknownIssuer)
    }
}

fn evaluator_with(validator: Arc<dyn ChainValidator>, pinned: &[u8]) -> Arc<TrustEvaluator> {
    let pins = PinSet::load("github.com", pinned.to_vec()).unwrap();
    Arc::new(TrustEvaluator::new(
        validator,
        Arc::new(PinStore::new(pins)),
        PinningPolicy::default(),
    ))
}

fn verifier(validator: Arc<dyn ChainValidator>, pinned: &[u8]) -> PinningVerifier {
    PinningVerifier::new(evaluator_with(validator, pinned), certpin_webpki::crypto_provider())
}

fn verify(v: &PinningVerifier, host: &str, leaf: &[u8]) -> Result<(), rustls::Error> {
    let server_name = ServerName::try_from(host.to_owned()).unwrap();
    v.verify_server_cert(&CertificateDer::from(leaf.to_vec()), &[], &server_name, &[], UnixTime::now())
        .map(|_| ())
}

fn application_failure() -> rustls::Error {
    rustls::Error::InvalidCertificate(CertificateError::ApplicationVerificationFailure)
}

#[test]
fn pinned_leaf_passes_rustls_verification() {
    let pinned = synthetic_certificate("github.com", &[1u8; 32]);
    let v = verifier(Arc::new(AlwaysTrusted), &pinned);

    assert!(verify(&v, "github.com", &pinned).is_ok());
    assert!(verify(&v, "GITHUB.COM", &pinned).is_ok());
}

#[test]
fn every_rejection_looks_the_same_to_rustls() {
    let pinned = synthetic_certificate("github.com", &[1u8; 32]);
    let other = synthetic_certificate("github.com", &[2u8; 32]);

    // pin mismatch
    let v = verifier(Arc::new(AlwaysTrusted), &pinned);
    assert_eq!(verify(&v, "github.com", &other).unwrap_err(), application_failure());

    // host not pinned
    assert_eq!(verify(&v, "example.com", &pinned).unwrap_err(), application_failure());

    // system validation failed
    let v = verifier(Arc::new(NeverTrusted), &pinned);
    assert_eq!(verify(&v, "github.com", &pinned).unwrap_err(), application_failure());
}

#[test]
fn ip_address_server_names_are_looked_up_verbatim() {
    let pinned = synthetic_certificate("127.0.0.1", &[3u8; 32]);
    let pins = PinSet::load("127.0.0.1", pinned.clone()).unwrap();
    let evaluator = Arc::new(TrustEvaluator::new(
        Arc::new(AlwaysTrusted),
        Arc::new(PinStore::new(pins)),
        PinningPolicy::default(),
    ));
    let v = PinningVerifier::new(evaluator, certpin_webpki::crypto_provider());

    assert!(verify(&v, "127.0.0.1", &pinned).is_ok());
}

#[test]
fn verifier_advertises_provider_schemes() {
    let pinned = synthetic_certificate("github.com", &[1u8; 32]);
    let v = verifier(Arc::new(AlwaysTrusted), &pinned);
    assert!(!v.supported_verify_schemes().is_empty());
}

#[tokio::test]
async fn blocking_evaluation_from_async_context() {
    let pinned = synthetic_certificate("github.com", &[1u8; 32]);
    let other = synthetic_certificate("github.com", &[2u8; 32]);
    let evaluator = evaluator_with(Arc::new(AlwaysTrusted), &pinned);
    let host = Hostname::parse("github.com").unwrap();

    let accepted = evaluate_blocking(evaluator.clone(), host.clone(), vec![pinned]).await.unwrap();
    assert!(accepted.is_accept());

    let rejected = evaluate_blocking(evaluator.clone(), host.clone(), vec![other]).await.unwrap();
    assert!(rejected.is_reject());

    assert!(evaluate_blocking(evaluator, host, Vec::new()).await.is_err());
}

#[tokio::test]
async fn repin_is_seen_by_the_next_handshake() {
    let old = synthetic_certificate("github.com", &[1u8; 32]);
    let new = synthetic_certificate("github.com", &[9u8; 32]);
    let evaluator = evaluator_with(Arc::new(AlwaysTrusted), &old);
    let v = PinningVerifier::new(evaluator.clone(), certpin_webpki::crypto_provider());

    assert!(verify(&v, "github.com", &new).is_err());
    evaluator.pins().repin("github.com", new.clone()).unwrap();
    assert!(verify(&v, "github.com", &new).is_ok());
    assert!(verify(&v, "github.com", &old).is_err());
}
