use thiserror::Error;

use crate::{
    chain::MalformedChainError,
    der::DerError,
    pin::LoadError,
    trust::ChainError,
};

#[derive(Debug, Error)]
pub enum CertpinError {
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("malformed chain: {0}")]
    MalformedChain(#[from] MalformedChainError),

    #[error("chain validation error: {0}")]
    Chain(#[from] ChainError),

    #[error("DER error: {0}")]
    Der(#[from] DerError),
}
