use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::SystemTime,
};

use crate::{
    chain::PresentedChain,
    pin::Hostname,
    trust::{ChainError, ChainValidator, SystemTrust, TrustLevel},
};

// Stage-one stand-in: either trusts every chain or fails every chain with a
// fixed error. Counts calls so tests can check it ran exactly once.
#[derive(Debug)]
pub(crate) struct MockValidator {
    verdict: Result<TrustLevel, ChainError>,
    calls: AtomicUsize,
}

impl MockValidator {
    pub(crate) fn trusting() -> Self {
        Self {
            verdict: Ok(TrustLevel::Unspecified),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing(err: ChainError) -> Self {
        Self {
            verdict: Err(err),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChainValidator for MockValidator {
    fn validate(
        &self,
        hostname: &Hostname,
        chain: &PresentedChain<'_>,
        _now: SystemTime,
    ) -> Result<SystemTrust, ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.verdict {
            Ok(level) => Ok(SystemTrust::new(*level, hostname.clone(), chain.leaf())),
            Err(e) => Err(e.clone()),
        }
    }
}
