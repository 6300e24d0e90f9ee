use crate::pin::{Fingerprint, Hostname};

/// How the system validator reached its positive verdict. Both count as
/// trusted; any other outcome is a `ChainError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustLevel {
    /// Anchored in a trust store the operator supplied for this client
    /// (a private CA, for instance).
    Proceed,
    /// Anchored in the platform's default trust (bundled or OS roots).
    Unspecified,
}

/// Result of a successful system chain validation.
///
/// Opaque to the evaluator: it is carried through to the [`Credential`]
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemTrust {
    level: TrustLevel,
    hostname: Hostname,
    leaf: Fingerprint,
}

impl SystemTrust {
    pub fn new(level: TrustLevel, hostname: Hostname, leaf_der: &[u8]) -> Self {
        Self {
            level,
            hostname,
            leaf: Fingerprint::of(leaf_der),
        }
    }

    pub fn level(&self) -> TrustLevel {
        self.level
    }

    pub fn hostname(&self) -> &Hostname {
        &self.hostname
    }

    pub fn leaf_fingerprint(&self) -> Fingerprint {
        self.leaf
    }
}

/// Permission to continue a handshake, derived from the system trust that
/// stage one already established. Only the evaluator creates these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    trust: SystemTrust,
}

impl Credential {
    pub(crate) fn for_trust(trust: SystemTrust) -> Self {
        Self { trust }
    }

    pub fn trust(&self) -> &SystemTrust {
        &self.trust
    }

    pub fn hostname(&self) -> &Hostname {
        self.trust.hostname()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustDecision {
    Accept(Credential),
    Reject,
}

impl TrustDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, TrustDecision::Accept(_))
    }

    pub fn is_reject(&self) -> bool {
        matches!(self, TrustDecision::Reject)
    }

    pub fn credential(&self) -> Option<&Credential> {
        match self {
            TrustDecision::Accept(c) => Some(c),
            TrustDecision::Reject => None,
        }
    }
}
