use std::{collections::HashMap, fmt, fs, net::Ipv6Addr, path::Path, str::FromStr, sync::Arc};

use sha2::{Digest, Sha256};

use crate::der::{self, DerError};
use crate::pin::LoadError;

const MAX_HOSTNAME_LEN: usize = 253;

/// Hostname used as a pin lookup key.
///
/// Stored ASCII-lowercased with a single trailing root dot removed, so
/// `GitHub.com.` and `github.com` are the same key. Labels are matched
/// exactly: no wildcard expansion happens here, and `*` is refused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hostname(String);

impl Hostname {
    pub fn parse(raw: &str) -> Result<Self, LoadError> {
        let invalid = || LoadError::InvalidHostname(raw.to_string());

        let name = raw.strip_suffix('.').unwrap_or(raw);
        if name.is_empty() || name.len() > MAX_HOSTNAME_LEN {
            return Err(invalid());
        }

        // IPv6 literals skip label rules; anything else with a colon is refused.
        if let Ok(ip6) = name.parse::<Ipv6Addr>() {
            return Ok(Self(ip6.to_string()));
        }
        for label in name.split('.') {
            if label.is_empty() {
                return Err(invalid());
            }
            let ok = label
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_'));
            if !ok {
                return Err(invalid());
            }
        }

        Ok(Self(name.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Hostname {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// SHA-256 over the full DER encoding. Diagnostics only; pins compare bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    pub fn of(der: &[u8]) -> Self {
        let digest = Sha256::digest(der);
        let mut out = [0u8; 32];
        out.copy_from_slice(digest.as_slice());
        Self(out)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

/// One pinned certificate: the exact DER bytes shipped with the application.
///
/// Immutable once built. Clones share the same buffer, so a snapshot of a
/// [`PinSet`] never copies certificate bytes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PinnedCertificate {
    der: Arc<[u8]>,
}

impl PinnedCertificate {
    /// Build a pin from in-memory DER bytes.
    pub fn from_der(bytes: impl Into<Vec<u8>>) -> Result<Self, LoadError> {
        Self::decode("<in-memory>", bytes.into())
    }

    /// Read a pin from a DER file (`.cer`/`.der`).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::decode(&path.display().to_string(), bytes)
    }

    // `origin` only feeds error messages.
    pub(crate) fn decode(origin: &str, bytes: Vec<u8>) -> Result<Self, LoadError> {
        if bytes.is_empty() {
            return Err(LoadError::Empty {
                origin: origin.to_string(),
            });
        }
        der::check_certificate_envelope(&bytes).map_err(|reason| LoadError::Undecodable {
            origin: origin.to_string(),
            reason,
        })?;

        Ok(Self { der: bytes.into() })
    }

    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    pub fn len(&self) -> usize {
        self.der.len()
    }

    pub fn is_empty(&self) -> bool {
        self.der.is_empty()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.der)
    }

    /// Full-certificate comparison: every byte of `presented` must match.
    pub fn matches(&self, presented: &[u8]) -> bool {
        *self.der == *presented
    }

    pub fn spki(&self) -> Result<&[u8], DerError> {
        der::extract_spki(&self.der)
    }
}

impl fmt::Debug for PinnedCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinnedCertificate")
            .field("len", &self.der.len())
            .field("sha256", &self.fingerprint())
            .finish()
    }
}

/// Hostname -> pinned certificates.
///
/// Entries are never empty, and a certificate appears at most once per host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinSet {
    pins: HashMap<Hostname, Vec<PinnedCertificate>>,
}

impl PinSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A PinSet holding exactly one pin: `hostname` -> `bytes`.
    pub fn load(hostname: &str, bytes: impl Into<Vec<u8>>) -> Result<Self, LoadError> {
        let host = Hostname::parse(hostname)?;
        let cert = PinnedCertificate::decode(host.as_str(), bytes.into())?;

        let mut set = Self::new();
        set.insert(host, cert);
        Ok(set)
    }

    /// Add a pin for `host`, keeping any already present.
    pub fn insert(&mut self, host: Hostname, cert: PinnedCertificate) {
        let entry = self.pins.entry(host).or_default();
        if !entry.contains(&cert) {
            entry.push(cert);
        }
    }

    pub fn with_pin(mut self, host: Hostname, cert: PinnedCertificate) -> Self {
        self.insert(host, cert);
        self
    }

    /// Replace every pin for `host`. An empty `certs` removes the host.
    pub fn set(&mut self, host: Hostname, certs: Vec<PinnedCertificate>) {
        let mut unique: Vec<PinnedCertificate> = Vec::with_capacity(certs.len());
        for cert in certs {
            if !unique.contains(&cert) {
                unique.push(cert);
            }
        }

        if unique.is_empty() {
            self.pins.remove(&host);
        } else {
            self.pins.insert(host, unique);
        }
    }

    pub fn remove(&mut self, host: &Hostname) -> Option<Vec<PinnedCertificate>> {
        self.pins.remove(host)
    }

    pub fn lookup(&self, host: &Hostname) -> Option<&[PinnedCertificate]> {
        self.pins.get(host).map(Vec::as_slice)
    }

    pub fn hosts(&self) -> impl Iterator<Item = &Hostname> {
        self.pins.keys()
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}
