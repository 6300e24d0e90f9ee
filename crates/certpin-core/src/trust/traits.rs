use std::{fmt::Debug, time::SystemTime};

use crate::{
    chain::PresentedChain,
    pin::Hostname,
    trust::{ChainError, SystemTrust},
};

// Trait boundary for system chain validation (root of trust, hostname,
// validity period, basic constraints). The evaluator depends on this trait
// only; concrete validators live in backend crates.
// Implementations may block and must be callable from many threads at once.
pub trait ChainValidator: Debug + Send + Sync + 'static {
    fn validate(
        &self,
        hostname: &Hostname,
        chain: &PresentedChain<'_>,
        now: SystemTime,
    ) -> Result<SystemTrust, ChainError>;
}
