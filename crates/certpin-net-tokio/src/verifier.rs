use std::{
    sync::Arc,
    time::{Duration, UNIX_EPOCH},
};

use rustls::{
    client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
    crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider},
    pki_types::{CertificateDer, ServerName, UnixTime},
    CertificateError, DigitallySignedStruct, SignatureScheme,
};

use certpin_core::{Hostname, PresentedChain, TrustDecision, TrustEvaluator};

/// rustls certificate verifier that hands every server certificate to a
/// [`TrustEvaluator`], exactly once per handshake.
///
/// All rejections surface as the same rustls error
/// (`ApplicationVerificationFailure`); the evaluator logs the actual reason.
/// Handshake signatures are still checked with the provider's algorithms.
#[derive(Debug)]
pub struct PinningVerifier {
    evaluator: Arc<TrustEvaluator>,
    provider: Arc<CryptoProvider>,
}

impl PinningVerifier {
    pub fn new(evaluator: Arc<TrustEvaluator>, provider: Arc<CryptoProvider>) -> Self {
        Self { evaluator, provider }
    }

    pub fn evaluator(&self) -> &Arc<TrustEvaluator> {
        &self.evaluator
    }
}

fn rejected() -> rustls::Error {
    rustls::Error::InvalidCertificate(CertificateError::ApplicationVerificationFailure)
}

impl ServerCertVerifier for PinningVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let hostname = Hostname::parse(&server_name.to_str()).map_err(|_| rejected())?;

        let mut certs: Vec<&[u8]> = Vec::with_capacity(1 + intermediates.len());
        certs.push(end_entity.as_ref());
        certs.extend(intermediates.iter().map(|c| c.as_ref()));
        let chain = PresentedChain::new(certs)
            .map_err(|_| rustls::Error::InvalidCertificate(CertificateError::BadEncoding))?;

        let now = UNIX_EPOCH + Duration::from_secs(now.as_secs());
        match self.evaluator.evaluate_at(&hostname, &chain, now) {
            TrustDecision::Accept(_) => Ok(ServerCertVerified::assertion()),
            TrustDecision::Reject => Err(rejected()),
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}
