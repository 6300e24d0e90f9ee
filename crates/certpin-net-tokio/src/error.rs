use std::time::Duration;

use thiserror::Error;

use certpin_core::MalformedChainError;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    // Deliberately says nothing about which check failed.
    #[error("secure connection failed: server certificate not trusted")]
    Untrusted,

    #[error("malformed chain: {0}")]
    MalformedChain(#[from] MalformedChainError),

    #[error("invalid server name {0:?}")]
    InvalidServerName(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("evaluation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
