use std::{sync::Arc, time::SystemTime};

use crate::{
    chain::{MalformedChainError, PresentedChain},
    der,
    pin::{Fingerprint, Hostname, PinSet, PinStore, PinnedCertificate},
    trust::{ChainValidator, Credential, PinMatch, PinningPolicy, RejectReason, TrustDecision, UnpinnedHostPolicy},
};

/// Decide one handshake.
///
/// Pure function of its inputs: stage one asks `validator` for system trust,
/// stage two compares the leaf against the pins for `hostname` in `pins`.
/// Both stages must pass; the returned credential is derived from the trust
/// stage one produced.
pub fn evaluate(
    validator: &dyn ChainValidator,
    pins: &PinSet,
    policy: &PinningPolicy,
    hostname: &Hostname,
    chain: &PresentedChain<'_>,
    now: SystemTime,
) -> TrustDecision {
    match decide(validator, pins, policy, hostname, chain, now) {
        Ok(credential) => {
            tracing::debug!(host = %hostname, leaf = %credential.trust().leaf_fingerprint(), "server certificate accepted");
            TrustDecision::Accept(credential)
        }
        Err(reason) => {
            tracing::warn!(host = %hostname, leaf = %Fingerprint::of(chain.leaf()), %reason, "server certificate rejected");
            TrustDecision::Reject
        }
    }
}

pub(crate) fn decide(
    validator: &dyn ChainValidator,
    pins: &PinSet,
    policy: &PinningPolicy,
    hostname: &Hostname,
    chain: &PresentedChain<'_>,
    now: SystemTime,
) -> Result<Credential, RejectReason> {
    let trust = validator
        .validate(hostname, chain, now)
        .map_err(RejectReason::ChainUntrusted)?;

    let Some(pinned) = pins.lookup(hostname) else {
        return match policy.unpinned_hosts {
            UnpinnedHostPolicy::Reject => Err(RejectReason::HostNotPinned),
            UnpinnedHostPolicy::SystemTrustOnly => {
                tracing::debug!(host = %hostname, "host has no pins; accepting on system trust");
                Ok(Credential::for_trust(trust))
            }
        };
    };

    if leaf_matches(policy.matching, chain.leaf(), pinned)? {
        Ok(Credential::for_trust(trust))
    } else {
        Err(RejectReason::PinMismatch)
    }
}

fn leaf_matches(mode: PinMatch, leaf: &[u8], pinned: &[PinnedCertificate]) -> Result<bool, RejectReason> {
    match mode {
        PinMatch::Certificate => Ok(pinned.iter().any(|pin| pin.matches(leaf))),
        PinMatch::PublicKey => {
            let leaf_spki = der::extract_spki(leaf).map_err(RejectReason::LeafUndecodable)?;
            // A pin whose key cannot be located simply never matches.
            Ok(pinned
                .iter()
                .filter_map(|pin| pin.spki().ok())
                .any(|spki| spki == leaf_spki))
        }
    }
}

/// Handshake-time trust evaluator.
///
/// Holds no per-handshake state: each call takes a fresh snapshot of the
/// pin store and runs [`evaluate`] against it, so one `Arc<TrustEvaluator>`
/// can serve any number of concurrent handshakes. Calls may block inside the
/// chain validator.
#[derive(Debug, Clone)]
pub struct TrustEvaluator {
    validator: Arc<dyn ChainValidator>,
    pins: Arc<PinStore>,
    policy: PinningPolicy,
}

impl TrustEvaluator {
    pub fn new(validator: Arc<dyn ChainValidator>, pins: Arc<PinStore>, policy: PinningPolicy) -> Self {
        Self {
            validator,
            pins,
            policy,
        }
    }

    pub fn pins(&self) -> &Arc<PinStore> {
        &self.pins
    }

    pub fn policy(&self) -> &PinningPolicy {
        &self.policy
    }

    pub fn evaluate(&self, hostname: &Hostname, chain: &PresentedChain<'_>) -> TrustDecision {
        self.evaluate_at(hostname, chain, SystemTime::now())
    }

    pub fn evaluate_at(&self, hostname: &Hostname, chain: &PresentedChain<'_>, now: SystemTime) -> TrustDecision {
        let pins = self.pins.snapshot();
        evaluate(self.validator.as_ref(), &pins, &self.policy, hostname, chain, now)
    }

    /// Handshake challenge entry point: raw certificates, leaf first.
    pub fn evaluate_chain<T: AsRef<[u8]>>(
        &self,
        hostname: &Hostname,
        certs: &[T],
    ) -> Result<TrustDecision, MalformedChainError> {
        let chain = PresentedChain::from_ders(certs)?;
        Ok(self.evaluate(hostname, &chain))
    }
}
