// Certificate chain presented by the peer during a handshake.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedChainError {
    #[error("peer presented an empty certificate chain")]
    Empty,

    #[error("certificate {index} of the presented chain is empty")]
    EmptyCertificate { index: usize },
}

/// Peer certificates in handshake order, leaf first. Borrowed from the TLS
/// layer; never empty and never holds an empty certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedChain<'a> {
    certs: Vec<&'a [u8]>,
}

impl<'a> PresentedChain<'a> {
    pub fn new(certs: Vec<&'a [u8]>) -> Result<Self, MalformedChainError> {
        if certs.is_empty() {
            return Err(MalformedChainError::Empty);
        }
        if let Some(index) = certs.iter().position(|c| c.is_empty()) {
            return Err(MalformedChainError::EmptyCertificate { index });
        }
        Ok(Self { certs })
    }

    pub fn from_ders<T: AsRef<[u8]>>(certs: &'a [T]) -> Result<Self, MalformedChainError> {
        Self::new(certs.iter().map(AsRef::as_ref).collect())
    }

    pub fn leaf(&self) -> &'a [u8] {
        self.certs[0]
    }

    pub fn intermediates(&self) -> &[&'a [u8]] {
        &self.certs[1..]
    }

    pub fn certificates(&self) -> &[&'a [u8]] {
        &self.certs
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_chain_is_malformed() {
        let none: Vec<Vec<u8>> = Vec::new();
        assert_eq!(PresentedChain::from_ders(&none), Err(MalformedChainError::Empty));
    }

    #[test]
    fn empty_certificate_is_malformed() {
        let certs = vec![vec![0x30, 0x00], vec![]];
        assert_eq!(
            PresentedChain::from_ders(&certs),
            Err(MalformedChainError::EmptyCertificate { index: 1 })
        );
    }

    #[test]
    fn leaf_is_first() {
        let certs = vec![b"leaf".to_vec(), b"intermediate".to_vec(), b"root".to_vec()];
        let chain = PresentedChain::from_ders(&certs).unwrap();

        assert_eq!(chain.leaf(), b"leaf");
        assert_eq!(chain.intermediates(), &[&b"intermediate"[..], &b"root"[..]]);
        assert_eq!(chain.len(), 3);
    }
}
