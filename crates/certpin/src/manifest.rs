use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use certpin_core::{Hostname, LoadError, PinMatch, PinSet, PinningPolicy, UnpinnedHostPolicy};

use crate::bundle::CertificateBundle;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    bundle: Option<PathBuf>,
    #[serde(default)]
    unpinned_hosts: RawUnpinned,
    #[serde(default, rename = "match")]
    matching: RawMatch,
    #[serde(default, rename = "pin")]
    pins: Vec<PinEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum RawUnpinned {
    #[default]
    Reject,
    SystemTrustOnly,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum RawMatch {
    #[default]
    Certificate,
    PublicKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PinEntry {
    pub host: String,
    pub certificates: Vec<String>,
}

/// A TOML pin manifest: which bundle certificates pin which hosts, and the
/// pinning policy.
///
/// ```toml
/// bundle = "certs"
/// unpinned_hosts = "reject"
/// match = "certificate"
///
/// [[pin]]
/// host = "github.com"
/// certificates = ["github.com"]
/// ```
#[derive(Debug, Clone)]
pub struct PinManifest {
    pub bundle: CertificateBundle,
    pub policy: PinningPolicy,
    pub pins: Vec<PinEntry>,
}

impl PinManifest {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&text, base, path)
    }

    // Relative bundle paths resolve against `base`; `path` only labels errors.
    pub fn parse(text: &str, base: &Path, path: &Path) -> Result<Self, LoadError> {
        let invalid = |reason: String| LoadError::Manifest {
            path: path.to_path_buf(),
            reason,
        };

        let raw: RawManifest = toml::from_str(text).map_err(|e| invalid(e.to_string().trim_end().to_string()))?;

        for entry in &raw.pins {
            if entry.certificates.is_empty() {
                return Err(invalid(format!("pin for {:?} lists no certificates", entry.host)));
            }
        }

        let bundle_root = match raw.bundle {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => base.join(dir),
            None => base.to_path_buf(),
        };

        let policy = PinningPolicy::fail_closed()
            .with_unpinned_hosts(match raw.unpinned_hosts {
                RawUnpinned::Reject => UnpinnedHostPolicy::Reject,
                RawUnpinned::SystemTrustOnly => UnpinnedHostPolicy::SystemTrustOnly,
            })
            .with_matching(match raw.matching {
                RawMatch::Certificate => PinMatch::Certificate,
                RawMatch::PublicKey => PinMatch::PublicKey,
            });

        Ok(Self {
            bundle: CertificateBundle::new(bundle_root),
            policy,
            pins: raw.pins,
        })
    }

    /// Load every referenced certificate. The first failure aborts the load.
    pub fn pin_set(&self) -> Result<PinSet, LoadError> {
        let mut set = PinSet::new();
        for entry in &self.pins {
            let host = Hostname::parse(&entry.host)?;
            for cert in self.bundle.load_all(&entry.certificates)? {
                set.insert(host.clone(), cert);
            }
        }
        Ok(set)
    }
}
