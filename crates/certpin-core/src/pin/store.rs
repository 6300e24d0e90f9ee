use std::sync::{Arc, PoisonError, RwLock};

use crate::pin::{Hostname, LoadError, PinSet, PinnedCertificate};

/// The active pin configuration.
///
/// Readers take a snapshot (`Arc<PinSet>`) under a short read lock and work
/// on it without holding the lock, so a handshake sees one consistent PinSet
/// from start to finish. Writers build a whole new PinSet and swap the `Arc`
/// under the write lock; there is no in-place mutation of a published set.
#[derive(Debug, Default)]
pub struct PinStore {
    active: RwLock<Arc<PinSet>>,
}

impl PinStore {
    pub fn new(pins: PinSet) -> Self {
        Self {
            active: RwLock::new(Arc::new(pins)),
        }
    }

    pub fn snapshot(&self) -> Arc<PinSet> {
        // The guarded value is a single Arc, so a panicking writer cannot
        // leave it half-written; a poisoned lock is still usable.
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Pins for `host` in the current snapshot, or `None` if the host has none.
    pub fn lookup(&self, host: &Hostname) -> Option<Vec<PinnedCertificate>> {
        self.snapshot().lookup(host).map(<[PinnedCertificate]>::to_vec)
    }

    /// Swap in a new PinSet wholesale. Returns the one it replaced.
    pub fn replace(&self, pins: PinSet) -> Arc<PinSet> {
        let next = Arc::new(pins);
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *active, next);

        tracing::info!(hosts = active.len(), "pin set replaced");
        previous
    }

    /// Re-pin one host to exactly `bytes`, dropping its previous pins.
    ///
    /// The certificate is decoded before the store is touched, so a bad
    /// certificate leaves the active configuration unchanged.
    pub fn repin(&self, hostname: &str, bytes: impl Into<Vec<u8>>) -> Result<(), LoadError> {
        let host = Hostname::parse(hostname)?;
        let cert = PinnedCertificate::decode(host.as_str(), bytes.into())?;
        self.repin_certificate(host, cert);
        Ok(())
    }

    pub fn repin_certificate(&self, host: Hostname, cert: PinnedCertificate) {
        let fingerprint = cert.fingerprint();

        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = PinSet::clone(&active);
        next.set(host.clone(), vec![cert]);
        *active = Arc::new(next);

        tracing::info!(host = %host, sha256 = %fingerprint, "host re-pinned");
    }
}

impl From<PinSet> for PinStore {
    fn from(pins: PinSet) -> Self {
        Self::new(pins)
    }
}
