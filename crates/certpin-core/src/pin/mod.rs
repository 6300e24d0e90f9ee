pub mod store;
pub mod types;

pub use store::*;
pub use types::*;

use std::path::PathBuf;

use crate::der::DerError;

// Pinned-certificate input could not be turned into a pin. Never retried:
// the same resource will fail the same way.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("pinned certificate {origin} is empty")]
    Empty { origin: String },

    #[error("pinned certificate {origin} is not a DER certificate: {reason}")]
    Undecodable { origin: String, reason: DerError },

    #[error("failed to read pinned certificate {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid hostname {0:?}")]
    InvalidHostname(String),

    #[error("invalid pin manifest {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },
}
