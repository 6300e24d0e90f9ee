/*
    certpin-core
        certificate pinning for TLS clients: pin storage and the
        handshake-time trust evaluator.
 */

pub mod error;

pub mod der;
pub mod pin;
pub mod chain;
pub mod trust;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use error::CertpinError;
pub use chain::{MalformedChainError, PresentedChain};
pub use pin::{Fingerprint, Hostname, LoadError, PinSet, PinStore, PinnedCertificate};
pub use trust::{
    ChainError, ChainValidator, Credential, PinMatch, PinningPolicy, SystemTrust, TrustDecision, TrustEvaluator,
    TrustLevel, UnpinnedHostPolicy,
};
