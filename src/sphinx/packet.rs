//! The wire-level Sphinx packet: four byte strings of fixed length for a
//! given [`SphinxParams`](super::params::SphinxParams).
//!
//! Grounded on the teacher's `SphinxPacket`/`SphinxHeader` byte-layout struct
//! in `sphinx/packet.rs` (`from_bytes`/`to_bytes`/`validate`), re-keyed to
//! this spec's four-field layout.

use thiserror::Error;

use super::params::{SphinxParams, ALPHA_LEN};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketFormatError {
    #[error("packet length {got} does not match expected {expected} for these params")]
    WrongLength { got: usize, expected: usize },
}

/// `(alpha, beta, gamma, delta)`: a Sphinx packet's four wire fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SphinxPacket {
    pub alpha: Vec<u8>,
    pub beta: Vec<u8>,
    pub gamma: Vec<u8>,
    pub delta: Vec<u8>,
}

impl SphinxPacket {
    pub fn new(alpha: Vec<u8>, beta: Vec<u8>, gamma: Vec<u8>, delta: Vec<u8>) -> Self {
        Self { alpha, beta, gamma, delta }
    }

    /// Concatenates the four fields into the wire layout
    /// `[alpha][beta][gamma][delta]`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            self.alpha.len() + self.beta.len() + self.gamma.len() + self.delta.len(),
        );
        out.extend_from_slice(&self.alpha);
        out.extend_from_slice(&self.beta);
        out.extend_from_slice(&self.gamma);
        out.extend_from_slice(&self.delta);
        out
    }

    /// Splits a wire-format buffer into the four fields according to
    /// `params`' geometry.
    pub fn from_bytes(data: &[u8], params: &SphinxParams) -> Result<Self, PacketFormatError> {
        let expected = params.packet_len();
        if data.len() != expected {
            return Err(PacketFormatError::WrongLength { got: data.len(), expected });
        }
        let (alpha, rest) = data.split_at(ALPHA_LEN);
        let (beta, rest) = rest.split_at(params.beta_len());
        let (gamma, delta) = rest.split_at(params.gamma_len());
        Ok(Self {
            alpha: alpha.to_vec(),
            beta: beta.to_vec(),
            gamma: gamma.to_vec(),
            delta: delta.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_bytes() {
        let params = SphinxParams::default();
        let packet = SphinxPacket::new(
            vec![1u8; ALPHA_LEN],
            vec![2u8; params.beta_len()],
            vec![3u8; params.gamma_len()],
            vec![4u8; params.delta_len()],
        );
        let bytes = packet.to_bytes();
        assert_eq!(bytes.len(), params.packet_len());
        let decoded = SphinxPacket::from_bytes(&bytes, &params).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn rejects_wrong_length() {
        let params = SphinxParams::default();
        let err = SphinxPacket::from_bytes(&[0u8; 10], &params).unwrap_err();
        assert_eq!(err, PacketFormatError::WrongLength { got: 10, expected: params.packet_len() });
    }
}
