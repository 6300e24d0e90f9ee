/// What to do with a host that has no pins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnpinnedHostPolicy {
    /// Fail closed: a host without pins is rejected even if its chain is valid.
    #[default]
    Reject,
    /// Accept unpinned hosts on system trust alone.
    ///
    /// This is a deliberate deviation from fail-closed pinning. It matches
    /// clients that only pin a few hosts and talk to others normally, and must
    /// be opted into explicitly.
    SystemTrustOnly,
}

/// What a pin is compared against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PinMatch {
    /// Exact bytes of the full DER certificate.
    #[default]
    Certificate,
    /// Exact bytes of the DER SubjectPublicKeyInfo only.
    ///
    /// Policy substitution: survives certificate renewal with the same key,
    /// but no longer notices a certificate reissued for that key (by a
    /// compromised or mis-issuing CA, for instance).
    PublicKey,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PinningPolicy {
    pub unpinned_hosts: UnpinnedHostPolicy,
    pub matching: PinMatch,
}

impl PinningPolicy {
    pub fn fail_closed() -> Self {
        Self::default()
    }

    pub fn with_unpinned_hosts(mut self, unpinned_hosts: UnpinnedHostPolicy) -> Self {
        self.unpinned_hosts = unpinned_hosts;
        self
    }

    pub fn with_matching(mut self, matching: PinMatch) -> Self {
        self.matching = matching;
        self
    }
}
