/*
    certpin-net-tokio
      - plugs the trust evaluator into rustls as a server certificate
        verifier, and opens pinned TLS connections with tokio-rustls.
*/

mod conn;
mod error;
mod verifier;

pub use conn::{client_config, connect_tls, evaluate_blocking, PinnedStream, DEFAULT_CONNECT_TIMEOUT};
pub use error::NetError;
pub use verifier::PinningVerifier;
