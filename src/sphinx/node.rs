//! The per-hop unwrap state machine: this crate's centrepiece.
//!
//! Grounded on `original_source/sphinxmixcrypto/node.py`'s
//! `sphinx_packet_unwrap` for the exact step order and byte slicing, with the
//! node holding its own key material the way the teacher's
//! `SphinxMixer::process_packet` does in `sphinx/packet.rs`.

use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use super::codec::{decode_command, destination_decode, remove_padding, RoutingCommand};
use super::error::UnwrapError;
use super::group::{self, Scalar, GROUP_ELEMENT_SIZE};
use super::params::{SphinxParams, K};
use super::primitives::{h_blind, h_mu, h_rho, h_tau, mac_eq, mu, xor};
use super::replay::SharedReplayCache;

/// The outcome of unwrapping one layer of a packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnwrapOutcome {
    /// Forward the transformed packet to another mix.
    ForwardToMix {
        next_id: [u8; K],
        alpha: Vec<u8>,
        beta: Vec<u8>,
        gamma: Vec<u8>,
        delta: Vec<u8>,
    },
    /// Hand the recovered message off to a local delivery sink.
    DeliverToDestination { dest_id: Vec<u8>, body: Vec<u8> },
    /// Hand the packet off to a named client's reply sink; the client
    /// applies its own SURB-chain keys on top.
    DeliverToClient {
        client_id: Vec<u8>,
        message_id: [u8; K],
        delta: Vec<u8>,
    },
}

/// A mix node's long-lived key material, zeroized on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct NodeKeys {
    pub id: [u8; K],
    private_key: Scalar,
    #[zeroize(skip)]
    public_key: [u8; GROUP_ELEMENT_SIZE],
}

impl NodeKeys {
    /// Generates a fresh identity: a random 16-byte id with its own first
    /// byte forced to `0xFF` per the mix-id wire convention, and a clamped
    /// Curve25519 keypair.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut id = [0u8; K];
        rng.fill_bytes(&mut id);
        id[0] = 0xFF;
        let private_key = group::generate_secret(rng);
        let public_key = group::public_key_from_private(&private_key);
        Self { id, private_key, public_key }
    }

    pub fn from_private_key(id: [u8; K], private_key: [u8; GROUP_ELEMENT_SIZE]) -> Self {
        let private_key = Scalar(private_key);
        let public_key = group::public_key_from_private(&private_key);
        Self { id, private_key, public_key }
    }

    pub fn public_key(&self) -> &[u8; GROUP_ELEMENT_SIZE] {
        &self.public_key
    }

    pub fn private_key_bytes(&self) -> &[u8; GROUP_ELEMENT_SIZE] {
        self.private_key.as_bytes()
    }
}

/// A mix node: its key material plus the replay cache guarding its packets.
pub struct Node {
    pub keys: NodeKeys,
    pub params: SphinxParams,
    pub replay_cache: SharedReplayCache,
}

impl Node {
    pub fn new(keys: NodeKeys, params: SphinxParams, replay_cache: SharedReplayCache) -> Self {
        Self { keys, params, replay_cache }
    }

    /// Unwraps one layer of a Sphinx packet under this node's private key.
    ///
    /// Implements SPEC_FULL.md 4.3 exactly: size and group checks, shared
    /// secret, replay check, MAC check, replay commit, unconditional payload
    /// decrypt, then header expansion and command dispatch.
    pub fn unwrap(&self, alpha: &[u8], beta: &[u8], gamma: &[u8], delta: &[u8]) -> Result<UnwrapOutcome, UnwrapError> {
        if delta.len() != self.params.m {
            return Err(UnwrapError::BodySizeMismatch);
        }
        if !group::in_group(alpha) {
            return Err(UnwrapError::HeaderAlphaGroupMismatch);
        }
        let alpha_arr: [u8; GROUP_ELEMENT_SIZE] =
            alpha.try_into().expect("in_group already checked the length");

        let s = group::scalar_mult(&alpha_arr, &self.keys.private_key);

        let tau = h_tau(&s);
        if self.replay_cache.has_seen(&tau) {
            return Err(UnwrapError::Replay);
        }

        let expected_mac = mu(&h_mu(&s), beta);
        let mut gamma_fixed = [0u8; K];
        if gamma.len() != K {
            return Err(UnwrapError::IncorrectMAC);
        }
        gamma_fixed.copy_from_slice(gamma);
        if !mac_eq(&expected_mac, &gamma_fixed) {
            return Err(UnwrapError::IncorrectMAC);
        }

        // Checks 4-6 form a critical section per tag: the MAC is verified
        // above before any cache mutation (a forged packet never marks the
        // tag), and `check_and_mark` performs the has_seen/mark_seen pair as
        // one atomic operation so two concurrent unwraps of the identical
        // packet cannot both observe "unseen" and both be accepted.
        if self.replay_cache.check_and_mark(&tau) {
            return Err(UnwrapError::Replay);
        }

        let delta_prime = self.params.pii(&h_pi_key(&s), delta)?;

        let keystream = super::primitives::generate_keystream(&h_rho(&s), self.params.header_keystream_len());
        let mut padded_beta = beta.to_vec();
        padded_beta.resize(self.params.header_keystream_len(), 0u8);
        let expanded = xor(&padded_beta, &keystream);

        let (command, rest) = decode_command(&expanded).map_err(|_| UnwrapError::InvalidMessageType)?;
        match command {
            RoutingCommand::Mix { node_id } => {
                if rest.len() != K + self.params.beta_len() {
                    return Err(UnwrapError::InvalidMessageType);
                }
                let gamma_prime = rest[0..K].to_vec();
                let beta_prime = rest[K..].to_vec();
                let b = h_blind(alpha, &s);
                let alpha_prime = group::scalar_mult(&alpha_arr, &b);
                Ok(UnwrapOutcome::ForwardToMix {
                    next_id: node_id,
                    alpha: alpha_prime.to_vec(),
                    beta: beta_prime,
                    gamma: gamma_prime,
                    delta: delta_prime,
                })
            }
            RoutingCommand::Process => {
                if delta_prime.len() < K || delta_prime[0..K] != [0u8; K] {
                    return Err(UnwrapError::InvalidProcessDestination);
                }
                let (dest_id, after_dest) = destination_decode(&delta_prime[K..])
                    .map_err(|_| UnwrapError::InvalidProcessDestination)?;
                let body = remove_padding(after_dest).map_err(|_| UnwrapError::InvalidProcessDestination)?;
                Ok(UnwrapOutcome::DeliverToDestination { dest_id, body })
            }
            RoutingCommand::Client { client_id } => {
                if rest.len() < K {
                    return Err(UnwrapError::InvalidMessageType);
                }
                let mut message_id = [0u8; K];
                message_id.copy_from_slice(&rest[..K]);
                Ok(UnwrapOutcome::DeliverToClient { client_id, message_id, delta: delta_prime })
            }
        }
    }
}

fn h_pi_key(s: &[u8]) -> [u8; K] {
    super::primitives::h_pi(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphinx::builder::create_forward_message;
    use crate::sphinx::replay::InMemoryReplayCache;
    use rand::rngs::OsRng;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn make_node(rng: &mut OsRng) -> Node {
        let keys = NodeKeys::generate(rng);
        let cache: SharedReplayCache = Arc::new(InMemoryReplayCache::new());
        Node::new(keys, SphinxParams::default(), cache)
    }

    #[test]
    fn single_hop_forward_delivers_message() {
        let mut rng = OsRng;
        let node = make_node(&mut rng);
        let mut consensus = HashMap::new();
        consensus.insert(node.keys.id, *node.keys.public_key());

        let params = SphinxParams::default();
        let built = create_forward_message(&params, &mut rng, &[node.keys.id], &consensus, b"dest", b"this is a test").unwrap();

        let outcome = node.unwrap(&built.packet.alpha, &built.packet.beta, &built.packet.gamma, &built.packet.delta).unwrap();
        match outcome {
            UnwrapOutcome::DeliverToDestination { dest_id, body } => {
                assert_eq!(dest_id, b"dest");
                assert_eq!(body, b"this is a test");
            }
            other => panic!("expected DeliverToDestination, got {other:?}"),
        }
    }

    #[test]
    fn replayed_packet_is_rejected() {
        let mut rng = OsRng;
        let node = make_node(&mut rng);
        let mut consensus = HashMap::new();
        consensus.insert(node.keys.id, *node.keys.public_key());

        let params = SphinxParams::default();
        let built = create_forward_message(&params, &mut rng, &[node.keys.id], &consensus, b"dest", b"hi").unwrap();

        node.unwrap(&built.packet.alpha, &built.packet.beta, &built.packet.gamma, &built.packet.delta).unwrap();
        let err = node
            .unwrap(&built.packet.alpha, &built.packet.beta, &built.packet.gamma, &built.packet.delta)
            .unwrap_err();
        assert!(matches!(err, UnwrapError::Replay));
    }

    #[test]
    fn payload_size_mismatch_is_rejected() {
        let mut rng = OsRng;
        let node = make_node(&mut rng);
        let err = node.unwrap(&[0u8; 32], &[0u8; 176], &[0u8; 16], &[0u8; 27]).unwrap_err();
        assert!(matches!(err, UnwrapError::BodySizeMismatch));
    }

    #[test]
    fn invalid_alpha_length_is_rejected() {
        let mut rng = OsRng;
        let node = make_node(&mut rng);
        let err = node.unwrap(&[0u8; 31], &[0u8; 176], &[0u8; 16], &[0u8; 1024]).unwrap_err();
        assert!(matches!(err, UnwrapError::HeaderAlphaGroupMismatch));
    }

    #[test]
    fn concurrent_replay_of_the_identical_packet_is_accepted_at_most_once() {
        let mut rng = OsRng;
        let node = Arc::new(make_node(&mut rng));
        let mut consensus = HashMap::new();
        consensus.insert(node.keys.id, *node.keys.public_key());

        let params = SphinxParams::default();
        let built = create_forward_message(&params, &mut rng, &[node.keys.id], &consensus, b"dest", b"race me").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let node = Arc::clone(&node);
                let alpha = built.packet.alpha.clone();
                let beta = built.packet.beta.clone();
                let gamma = built.packet.gamma.clone();
                let delta = built.packet.delta.clone();
                std::thread::spawn(move || node.unwrap(&alpha, &beta, &gamma, &delta).is_ok())
            })
            .collect();

        let accepted_count = handles.into_iter().map(|h| h.join().unwrap()).filter(|&ok| ok).count();
        assert_eq!(accepted_count, 1, "exactly one concurrent unwrap of the same packet may succeed");
    }

    #[test]
    fn tampered_mac_is_rejected() {
        let mut rng = OsRng;
        let node = make_node(&mut rng);
        let mut consensus = HashMap::new();
        consensus.insert(node.keys.id, *node.keys.public_key());

        let params = SphinxParams::default();
        let mut built = create_forward_message(&params, &mut rng, &[node.keys.id], &consensus, b"dest", b"hi").unwrap();
        built.packet.gamma[0] ^= 0x01;

        let err = node
            .unwrap(&built.packet.alpha, &built.packet.beta, &built.packet.gamma, &built.packet.delta)
            .unwrap_err();
        assert!(matches!(err, UnwrapError::IncorrectMAC));
    }
}
