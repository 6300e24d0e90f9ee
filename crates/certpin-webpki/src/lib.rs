/*
    certpin-webpki
      - rustls/webpki implementation of certpin-core's ChainValidator.
      - Trust anchors come from the bundled Mozilla set (webpki-roots),
        the operating system store (rustls-native-certs), or the caller.
*/

use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use once_cell::sync::Lazy;
use rustls::{
    client::{danger::ServerCertVerifier, VerifierBuilderError, WebPkiServerVerifier},
    crypto::CryptoProvider,
    pki_types::{CertificateDer, ServerName, UnixTime},
    CertificateError, RootCertStore,
};

use certpin_core::{ChainError, ChainValidator, Hostname, PresentedChain, SystemTrust, TrustLevel};

static PROVIDER: Lazy<Arc<CryptoProvider>> = Lazy::new(|| Arc::new(rustls::crypto::ring::default_provider()));

static WEBPKI_ROOTS: Lazy<Arc<RootCertStore>> = Lazy::new(|| {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    Arc::new(roots)
});

/// The rustls crypto provider every certpin component uses (ring).
pub fn crypto_provider() -> Arc<CryptoProvider> {
    PROVIDER.clone()
}

#[derive(Debug, thiserror::Error)]
pub enum ValidatorError {
    #[error("no trust anchors available")]
    NoRoots,

    #[error("failed to build chain verifier: {0}")]
    Build(#[from] VerifierBuilderError),

    #[error("failed to load native certificates: {0}")]
    Native(String),
}

/// Where trust anchors come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RootSource {
    /// Mozilla's root program, compiled in.
    #[default]
    WebPki,
    /// The operating system trust store.
    Native,
}

/// System chain validation backed by webpki: path building to a trusted
/// root, validity period, server-auth usage and hostname match.
#[derive(Debug, Clone)]
pub struct WebPkiValidator {
    verifier: Arc<WebPkiServerVerifier>,
    level: TrustLevel,
}

impl WebPkiValidator {
    pub fn new(source: RootSource) -> Result<Self, ValidatorError> {
        match source {
            RootSource::WebPki => Self::with_webpki_roots(),
            RootSource::Native => Self::with_native_roots(),
        }
    }

    pub fn with_webpki_roots() -> Result<Self, ValidatorError> {
        Self::with_roots(WEBPKI_ROOTS.clone(), TrustLevel::Unspecified)
    }

    pub fn with_native_roots() -> Result<Self, ValidatorError> {
        let loaded = rustls_native_certs::load_native_certs();
        if loaded.certs.is_empty() && !loaded.errors.is_empty() {
            let msg = loaded
                .errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ValidatorError::Native(msg));
        }
        for err in &loaded.errors {
            tracing::warn!(error = %err, "skipping unreadable native root");
        }

        let mut roots = RootCertStore::empty();
        let (added, ignored) = roots.add_parsable_certificates(loaded.certs);
        tracing::debug!(added, ignored, "loaded native trust anchors");

        Self::with_roots(Arc::new(roots), TrustLevel::Unspecified)
    }

    /// Validate against caller-supplied anchors, e.g. a private CA. `level`
    /// is reported in the resulting [`SystemTrust`].
    pub fn with_roots(roots: Arc<RootCertStore>, level: TrustLevel) -> Result<Self, ValidatorError> {
        if roots.is_empty() {
            return Err(ValidatorError::NoRoots);
        }
        let verifier = WebPkiServerVerifier::builder_with_provider(roots, crypto_provider()).build()?;
        Ok(Self { verifier, level })
    }
}

impl ChainValidator for WebPkiValidator {
    fn validate(
        &self,
        hostname: &Hostname,
        chain: &PresentedChain<'_>,
        now: SystemTime,
    ) -> Result<SystemTrust, ChainError> {
        let server_name = ServerName::try_from(hostname.as_str()).map_err(|_| ChainError::NotValidForHost)?;

        let end_entity = CertificateDer::from(chain.leaf());
        let intermediates: Vec<CertificateDer<'_>> = chain
            .intermediates()
            .iter()
            .map(|c| CertificateDer::from(*c))
            .collect();

        self.verifier
            .verify_server_cert(&end_entity, &intermediates, &server_name, &[], unix_time(now)?)
            .map_err(map_error)?;

        Ok(SystemTrust::new(self.level, hostname.clone(), chain.leaf()))
    }
}

fn unix_time(now: SystemTime) -> Result<UnixTime, ChainError> {
    now.duration_since(UNIX_EPOCH)
        .map(UnixTime::since_unix_epoch)
        .map_err(|_| ChainError::Other("clock is before the unix epoch".into()))
}

pub(crate) fn map_error(err: rustls::Error) -> ChainError {
    match err {
        rustls::Error::InvalidCertificate(e) => match e {
            CertificateError::UnknownIssuer => ChainError::UnknownIssuer,
            CertificateError::Expired | CertificateError::ExpiredContext { .. } => ChainError::Expired,
            CertificateError::NotValidYet | CertificateError::NotValidYetContext { .. } => ChainError::NotValidYet,
            CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. } => {
                ChainError::NotValidForHost
            }
            CertificateError::BadSignature => ChainError::BadSignature,
            CertificateError::BadEncoding => ChainError::BadEncoding,
            CertificateError::InvalidPurpose => ChainError::InvalidUsage,
            other => ChainError::Other(format!("{other:?}")),
        },
        other => ChainError::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests;
