use std::{sync::Arc, time::Duration};

use rustls::{client::Resumption, pki_types::ServerName, ClientConfig};
use tokio::net::TcpStream;
use tokio_rustls::{client::TlsStream, TlsConnector};

use certpin_core::{Hostname, TrustDecision, TrustEvaluator};

use crate::{error::NetError, verifier::PinningVerifier};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

// A TLS connection whose server certificate passed the evaluator.
pub type PinnedStream = TlsStream<TcpStream>;

// rustls client config whose only certificate verifier is the evaluator.
//
// Session resumption is off: a resumed handshake skips certificate
// verification, which would let a session opened under old pins outlive a
// repin. Every connection does a full handshake and one evaluation.
pub fn client_config(evaluator: Arc<TrustEvaluator>) -> Result<Arc<ClientConfig>, NetError> {
    let provider = certpin_webpki::crypto_provider();
    let verifier = Arc::new(PinningVerifier::new(evaluator, provider.clone()));

    let mut config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();
    config.resumption = Resumption::disabled();

    Ok(Arc::new(config))
}

// TCP connect + TLS handshake, bounded by `timeout`. A rejected server
// certificate comes back as `NetError::Untrusted` whatever the reason.
//
// The evaluator runs inside rustls' verifier callback on the task polling
// the handshake. That work is CPU-only (path building and signature checks
// over the presented chain, no revocation fetches), the same cost any rustls
// client pays per handshake. Validators that do I/O belong behind
// `evaluate_blocking` instead.
pub async fn connect_tls(
    config: Arc<ClientConfig>,
    host: &Hostname,
    port: u16,
    timeout: Duration,
) -> Result<PinnedStream, NetError> {
    let server_name = ServerName::try_from(host.as_str().to_owned())
        .map_err(|_| NetError::InvalidServerName(host.to_string()))?;
    let connector = TlsConnector::from(config);

    let handshake = async {
        let tcp = TcpStream::connect((host.as_str(), port)).await?;
        connector.connect(server_name, tcp).await
    };

    match tokio::time::timeout(timeout, handshake).await {
        Err(_) => Err(NetError::Timeout(timeout)),
        Ok(Ok(stream)) => {
            tracing::debug!(host = %host, port, "pinned TLS connection established");
            Ok(stream)
        }
        Ok(Err(e)) => Err(classify_io(e)),
    }
}

// tokio-rustls reports TLS failures as io::Error wrapping rustls::Error.
fn classify_io(err: std::io::Error) -> NetError {
    let tls = err.get_ref().and_then(|inner| inner.downcast_ref::<rustls::Error>());
    match tls {
        Some(rustls::Error::InvalidCertificate(_)) => NetError::Untrusted,
        Some(other) => NetError::Tls(other.clone()),
        None => NetError::Io(err),
    }
}

// Run an evaluation on tokio's blocking pool, for callers on async tasks
// that must not stall while system chain validation runs.
pub async fn evaluate_blocking(
    evaluator: Arc<TrustEvaluator>,
    hostname: Hostname,
    certs: Vec<Vec<u8>>,
) -> Result<TrustDecision, NetError> {
    let decision = tokio::task::spawn_blocking(move || evaluator.evaluate_chain(&hostname, &certs)).await??;
    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certificate_errors_classify_as_untrusted() {
        let io = std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            rustls::Error::InvalidCertificate(rustls::CertificateError::ApplicationVerificationFailure),
        );
        assert!(matches!(classify_io(io), NetError::Untrusted));
    }

    #[test]
    fn other_tls_errors_keep_their_detail() {
        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, rustls::Error::DecryptError);
        assert!(matches!(classify_io(io), NetError::Tls(rustls::Error::DecryptError)));
    }

    #[test]
    fn plain_io_errors_pass_through() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(classify_io(io), NetError::Io(_)));
    }
}
