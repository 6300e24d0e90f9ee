pub mod evaluator;
pub mod policy;
pub mod traits;
pub mod types;

pub use evaluator::*;
pub use policy::*;
pub use traits::*;
pub use types::*;

use crate::der::DerError;

// Failure reported by system chain validation (stage 1).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("certificate chain does not lead to a trusted root")]
    UnknownIssuer,

    #[error("certificate is expired")]
    Expired,

    #[error("certificate is not valid yet")]
    NotValidYet,

    #[error("certificate is not valid for the requested host")]
    NotValidForHost,

    #[error("certificate signature is invalid")]
    BadSignature,

    #[error("certificate could not be decoded")]
    BadEncoding,

    #[error("certificate is not allowed for server authentication")]
    InvalidUsage,

    #[error("chain validation failed: {0}")]
    Other(String),
}

// Why a handshake was rejected. Diagnostic logging only: callers get a bare
// `TrustDecision::Reject` whatever the reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum RejectReason {
    #[error("system chain validation failed: {0}")]
    ChainUntrusted(ChainError),

    #[error("no pins configured for host")]
    HostNotPinned,

    #[error("leaf certificate matches no pin")]
    PinMismatch,

    #[error("leaf public key could not be located: {0}")]
    LeafUndecodable(DerError),
}

#[cfg(test)]
pub(crate) mod test_validator;
