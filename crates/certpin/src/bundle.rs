use std::path::{Path, PathBuf};

use certpin_core::{LoadError, PinnedCertificate};

pub const CERTIFICATE_EXTENSION: &str = "cer";

/// A directory of DER certificates addressed by logical name:
/// `github.com` resolves to `<root>/github.com.cer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateBundle {
    root: PathBuf,
}

impl CertificateBundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{CERTIFICATE_EXTENSION}"))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }

    pub fn load(&self, name: &str) -> Result<PinnedCertificate, LoadError> {
        // names are single path components
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
            return Err(LoadError::Io {
                path: self.root.join(name),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a bundle resource name"),
            });
        }
        PinnedCertificate::from_file(self.path_of(name))
    }

    pub fn load_all<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<PinnedCertificate>, LoadError> {
        names.iter().map(|n| self.load(n.as_ref())).collect()
    }
}
