use thiserror::Error;

use certpin_core::LoadError;
use certpin_net_tokio::NetError;
use certpin_webpki::ValidatorError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("pin load error: {0}")]
    Load(#[from] LoadError),

    #[error(transparent)]
    Net(#[from] NetError),

    #[error("trust anchors: {0}")]
    Validator(#[from] ValidatorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no certificate bundle configured")]
    NoBundle,

    #[error("bad HTTP response: {0}")]
    Http(String),
}

impl ClientError {
    /// The server's certificate was rejected by the evaluator.
    pub fn is_untrusted(&self) -> bool {
        matches!(self, ClientError::Net(NetError::Untrusted))
    }
}
