// certpin: pinned HTTPS client.
//     Embedding surface over certpin-core, certpin-webpki and certpin-net-tokio:
//     load pins from a certificate bundle or manifest, then connect or GET
//     with every handshake checked against them.

mod bundle;
mod client;
mod error;
mod http;
mod manifest;

pub use bundle::{CertificateBundle, CERTIFICATE_EXTENSION};
pub use client::{PinnedClient, PinnedClientBuilder, HTTPS_PORT};
pub use error::ClientError;
pub use http::Response;
pub use manifest::{PinEntry, PinManifest};

pub use certpin_core::{
    Fingerprint, Hostname, LoadError, PinMatch, PinSet, PinStore, PinnedCertificate, PinningPolicy, TrustDecision,
    UnpinnedHostPolicy,
};
pub use certpin_net_tokio::NetError;
pub use certpin_webpki::RootSource;
