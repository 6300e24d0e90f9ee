use std::{io, sync::Arc, time::Duration};

use rustls::ClientConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use certpin_core::{ChainValidator, Fingerprint, Hostname, PinSet, PinStore, PinningPolicy, TrustEvaluator};
use certpin_net_tokio::{client_config, connect_tls, NetError, PinnedStream, DEFAULT_CONNECT_TIMEOUT};
use certpin_webpki::{RootSource, WebPkiValidator};

use crate::{
    http::{self, Response},
    CertificateBundle, ClientError, PinManifest,
};

pub const HTTPS_PORT: u16 = 443;

/// An HTTPS client that only talks to servers whose leaf certificate is
/// pinned. Pins can be swapped while connections are in flight; each
/// handshake sees one consistent pin set.
#[derive(Debug, Clone)]
pub struct PinnedClient {
    evaluator: Arc<TrustEvaluator>,
    config: Arc<ClientConfig>,
    bundle: Option<CertificateBundle>,
    timeout: Duration,
}

#[derive(Debug)]
pub struct PinnedClientBuilder {
    pins: PinSet,
    policy: PinningPolicy,
    roots: RootSource,
    validator: Option<Arc<dyn ChainValidator>>,
    bundle: Option<CertificateBundle>,
    timeout: Duration,
}

impl Default for PinnedClientBuilder {
    fn default() -> Self {
        Self {
            pins: PinSet::new(),
            policy: PinningPolicy::fail_closed(),
            roots: RootSource::default(),
            validator: None,
            bundle: None,
            timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl PinnedClientBuilder {
    pub fn pins(mut self, pins: PinSet) -> Self {
        self.pins = pins;
        self
    }

    pub fn policy(mut self, policy: PinningPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn roots(mut self, roots: RootSource) -> Self {
        self.roots = roots;
        self
    }

    // Replaces webpki chain validation entirely; `roots` is then ignored.
    pub fn validator(mut self, validator: Arc<dyn ChainValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn bundle(mut self, bundle: CertificateBundle) -> Self {
        self.bundle = Some(bundle);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<PinnedClient, ClientError> {
        let validator: Arc<dyn ChainValidator> = match self.validator {
            Some(v) => v,
            None => Arc::new(WebPkiValidator::new(self.roots)?),
        };

        tracing::debug!(hosts = self.pins.len(), policy = ?self.policy, "building pinned client");

        let evaluator = Arc::new(TrustEvaluator::new(validator, Arc::new(PinStore::new(self.pins)), self.policy));
        let config = client_config(evaluator.clone())?;

        Ok(PinnedClient {
            evaluator,
            config,
            bundle: self.bundle,
            timeout: self.timeout,
        })
    }
}

impl PinnedClient {
    pub fn builder() -> PinnedClientBuilder {
        PinnedClientBuilder::default()
    }

    /// Load every pin the manifest names and build a client with its policy.
    pub fn from_manifest(manifest: &PinManifest, roots: RootSource) -> Result<Self, ClientError> {
        Self::builder()
            .pins(manifest.pin_set()?)
            .policy(manifest.policy)
            .bundle(manifest.bundle.clone())
            .roots(roots)
            .build()
    }

    pub fn pins(&self) -> &Arc<PinStore> {
        self.evaluator.pins()
    }

    pub fn evaluator(&self) -> &Arc<TrustEvaluator> {
        &self.evaluator
    }

    pub fn bundle(&self) -> Option<&CertificateBundle> {
        self.bundle.as_ref()
    }

    /// Pin `host` to the bundle certificate `name`, replacing its current
    /// pins. Connections already past their handshake are unaffected.
    pub fn repin(&self, host: &str, name: &str) -> Result<Fingerprint, ClientError> {
        let bundle = self.bundle.as_ref().ok_or(ClientError::NoBundle)?;
        let host = Hostname::parse(host)?;
        let cert = bundle.load(name)?;
        let fingerprint = cert.fingerprint();

        self.pins().repin_certificate(host, cert);
        Ok(fingerprint)
    }

    pub async fn connect(&self, host: &str, port: u16) -> Result<PinnedStream, ClientError> {
        let host = Hostname::parse(host)?;
        Ok(connect_tls(self.config.clone(), &host, port, self.timeout).await?)
    }

    /// Handshake only. `Ok(false)` means the server's certificate was refused.
    pub async fn probe(&self, host: &str, port: u16) -> Result<bool, ClientError> {
        match self.connect(host, port).await {
            Ok(mut stream) => {
                // best effort close_notify
                let _ = stream.shutdown().await;
                Ok(true)
            }
            Err(e) if e.is_untrusted() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn get(&self, host: &str, port: u16, path: &str) -> Result<Response, ClientError> {
        let mut stream = self.connect(host, port).await?;

        let exchange = async {
            stream.write_all(&http::request(host, path)).await?;
            stream.flush().await?;

            let mut raw = Vec::new();
            match stream.read_to_end(&mut raw).await {
                Ok(_) => {}
                // servers that close without close_notify
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && !raw.is_empty() => {}
                Err(e) => return Err(e),
            }
            Ok::<_, io::Error>(raw)
        };

        let raw = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| NetError::Timeout(self.timeout))??;

        let response = Response::parse(&raw)?;
        tracing::debug!(host, path, status = response.status, bytes = response.body.len(), "pinned GET");
        Ok(response)
    }
}
