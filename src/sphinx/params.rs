//! Fixed parameters of a Sphinx deployment and the header geometry derived
//! from them.
//!
//! Grounded on the teacher's `SPHINX_PACKET_SIZE`/`MAX_HOPS` constants in
//! `sphinx/packet.rs`, generalized into a runtime value per
//! `original_source/sphinxmixcrypto/node.py`'s `SphinxParams.get_dimensions`.

use super::error::LionessError;
use super::lioness::{lioness_decrypt, lioness_encrypt};

/// Symmetric block size in bytes (MAC/key length).
pub const K: usize = 16;

/// Curve25519 group element size in bytes.
pub const ALPHA_LEN: usize = 32;

/// Canonical network parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SphinxParams {
    /// Maximum route length.
    pub r: usize,
    /// Payload size in bytes.
    pub m: usize,
}

impl SphinxParams {
    pub fn new(r: usize, m: usize) -> Self {
        Self { r, m }
    }

    /// `(2r+1)*k`: the routing-header length.
    pub fn beta_len(&self) -> usize {
        (2 * self.r + 1) * K
    }

    /// Length of the MAC over beta; always `k`.
    pub fn gamma_len(&self) -> usize {
        K
    }

    /// Length of the payload.
    pub fn delta_len(&self) -> usize {
        self.m
    }

    /// Length of the header PRG keystream: `|beta| + 2k = (2r+3)*k`.
    pub fn header_keystream_len(&self) -> usize {
        self.beta_len() + 2 * K
    }

    /// Total wire size of a packet under these parameters.
    pub fn packet_len(&self) -> usize {
        ALPHA_LEN + self.beta_len() + self.gamma_len() + self.delta_len()
    }

    /// Encrypts a payload-sized block with the Lioness PRP, checking key and
    /// block length against this deployment's parameters first.
    pub fn pi(&self, key: &[u8], block: &[u8]) -> Result<Vec<u8>, LionessError> {
        let key = self.check_lioness_args(key, block)?;
        Ok(lioness_encrypt(key, block))
    }

    /// Decrypts a payload-sized block with the Lioness PRP; the inverse of
    /// [`SphinxParams::pi`].
    pub fn pii(&self, key: &[u8], block: &[u8]) -> Result<Vec<u8>, LionessError> {
        let key = self.check_lioness_args(key, block)?;
        Ok(lioness_decrypt(key, block))
    }

    fn check_lioness_args<'a>(&self, key: &'a [u8], block: &[u8]) -> Result<&'a [u8; K], LionessError> {
        if key.len() != K {
            return Err(LionessError::KeyMismatch { expected: K, got: key.len() });
        }
        if block.len() != self.m {
            return Err(LionessError::BlockSizeMismatch { expected: self.m, got: block.len() });
        }
        Ok(key.try_into().expect("length checked above"))
    }
}

impl Default for SphinxParams {
    /// The canonical parameters from the spec: r=5, k=16, m=1024 (1248-byte
    /// packets).
    fn default() -> Self {
        Self { r: 5, m: 1024 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_dimensions() {
        let p = SphinxParams::default();
        assert_eq!(p.beta_len(), 176);
        assert_eq!(p.gamma_len(), 16);
        assert_eq!(p.delta_len(), 1024);
        assert_eq!(p.packet_len(), 32 + 176 + 16 + 1024);
        assert_eq!(p.packet_len(), 1248);
        assert_eq!(p.header_keystream_len(), 176 + 32);
    }

    #[test]
    fn pi_round_trips_and_validates_lengths() {
        let p = SphinxParams::default();
        let key = [3u8; K];
        let block = vec![9u8; p.delta_len()];
        let ct = p.pi(&key, &block).unwrap();
        let pt = p.pii(&key, &ct).unwrap();
        assert_eq!(pt, block);

        let err = p.pi(&[0u8; 8], &block).unwrap_err();
        assert_eq!(err, LionessError::KeyMismatch { expected: K, got: 8 });

        let err = p.pi(&key, &[0u8; 5]).unwrap_err();
        assert_eq!(err, LionessError::BlockSizeMismatch { expected: p.delta_len(), got: 5 });
    }
}
