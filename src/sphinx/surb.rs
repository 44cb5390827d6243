//! Single-use reply blocks: the header half of [`super::builder`] with the
//! SURB creator playing the role of final hop, plus the reply-side encrypt
//! and creator-side decrypt.
//!
//! Grounded on `original_source/tests/test_mix.py`'s `test_client_surb` for
//! the SURB's shape (nym id, header, payload key round trip) and `node.py`'s
//! payload Lioness key derivation; the reply encrypt/decrypt reversal is
//! derived from SPEC_FULL.md 4.4's SURB-reply paragraph.

use std::collections::HashMap;

use rand_core::{CryptoRng, RngCore};

use super::builder::{build_header, derive_hop_materials};
use super::codec::{add_padding, encode_command, remove_padding, RoutingCommand};
use super::error::BuilderError;
use super::group::GROUP_ELEMENT_SIZE;
use super::packet::SphinxPacket;
use super::params::{SphinxParams, K};
use super::primitives::h_pi;

/// The fully-formed routing header a SURB carries, targeting its creator.
#[derive(Clone)]
pub struct SurbHeader {
    pub alpha: Vec<u8>,
    pub beta: Vec<u8>,
    pub gamma: Vec<u8>,
}

/// A single-use reply block: a header plus everything needed to both send a
/// reply through it and, later, recover that reply's plaintext.
pub struct Surb {
    pub first_hop: [u8; K],
    pub header: SurbHeader,
    pub payload_key: [u8; K],
    pub message_id: [u8; K],
    pi_chain: Vec<[u8; K]>,
}

impl Surb {
    /// Builds a SURB whose final hop delivers to `client_id` via the
    /// `Client` routing command, retaining the per-hop Lioness key chain
    /// needed to strip the mixes' transit layers from an eventual reply.
    pub fn create<R: RngCore + CryptoRng>(
        params: &SphinxParams,
        rng: &mut R,
        route: &[[u8; K]],
        consensus: &HashMap<[u8; K], [u8; GROUP_ELEMENT_SIZE]>,
        client_id: &[u8],
    ) -> Result<Self, BuilderError> {
        let materials = derive_hop_materials(rng, route, consensus, params)?;

        let mut message_id = [0u8; K];
        rng.fill_bytes(&mut message_id);

        let mut final_prefix = encode_command(&RoutingCommand::Client { client_id: client_id.to_vec() });
        final_prefix.extend_from_slice(&message_id);

        let (alpha, beta, gamma) = build_header(params, &materials, &final_prefix);
        let payload_key = h_pi(&materials.last().expect("route is non-empty").s);
        let pi_chain = materials.iter().map(|m| h_pi(&m.s)).collect();

        Ok(Self {
            first_hop: materials[0].node_id,
            header: SurbHeader { alpha, beta, gamma },
            payload_key,
            message_id,
            pi_chain,
        })
    }

    /// Encrypts `message` for this SURB: a single forward Lioness layer
    /// under the payload key, as SPEC_FULL.md 4.4's SURB-reply paragraph
    /// describes. The header is carried verbatim.
    pub fn encrypt_reply(&self, params: &SphinxParams, message: &[u8]) -> Result<SphinxPacket, BuilderError> {
        let body = add_padding(message, params.m);
        let delta = params.pi(&self.payload_key, &body)?;
        Ok(SphinxPacket::new(
            self.header.alpha.clone(),
            self.header.beta.clone(),
            self.header.gamma.clone(),
            delta,
        ))
    }

    /// Recovers a reply's plaintext from the delta that arrived at the
    /// client sink. Each transited mix applied its own unconditional
    /// Lioness decrypt on the way, so this first replays those layers
    /// forward (in reverse hop order, the last hop's key first) before
    /// undoing the sender's own encryption with the payload key.
    pub fn decrypt_reply(&self, params: &SphinxParams, delta: &[u8]) -> Result<Vec<u8>, BuilderError> {
        let mut d = delta.to_vec();
        for key in self.pi_chain.iter().rev() {
            d = params.pi(key, &d)?;
        }
        d = params.pii(&self.payload_key, &d)?;
        Ok(remove_padding(&d)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphinx::group;
    use crate::sphinx::node::{Node, NodeKeys, UnwrapOutcome};
    use crate::sphinx::replay::InMemoryReplayCache;
    use rand::rngs::OsRng;
    use std::sync::Arc;

    #[test]
    fn surb_reply_round_trips_through_a_single_hop() {
        let mut rng = OsRng;
        let params = SphinxParams::default();
        let keys = NodeKeys::generate(&mut rng);
        let mut consensus = HashMap::new();
        consensus.insert(keys.id, *keys.public_key());
        let node_id = keys.id;
        let cache = Arc::new(InMemoryReplayCache::new());
        let node = Node::new(keys, params, cache);

        let surb = Surb::create(&params, &mut rng, &[node_id], &consensus, b"nym-1").unwrap();
        let reply = surb.encrypt_reply(&params, b"hello from the other side").unwrap();

        let outcome = node.unwrap(&reply.alpha, &reply.beta, &reply.gamma, &reply.delta).unwrap();
        let delivered_delta = match outcome {
            UnwrapOutcome::DeliverToClient { client_id, delta, .. } => {
                assert_eq!(client_id, b"nym-1");
                delta
            }
            other => panic!("expected DeliverToClient, got {other:?}"),
        };

        let plaintext = surb.decrypt_reply(&params, &delivered_delta).unwrap();
        assert_eq!(plaintext, b"hello from the other side");
    }

    #[test]
    fn reused_surb_first_hop_packet_replays_as_expected() {
        // Two independently-encrypted replies through the same SURB header
        // are distinct packets (fresh Lioness layering) even though they
        // share alpha/beta/gamma - replay protection lives at the node, not
        // the SURB, and is exercised in `node::tests`.
        let mut rng = OsRng;
        let params = SphinxParams::default();
        let id = {
            let mut id = [7u8; K];
            id[0] = 0xFF;
            id
        };
        let mut consensus = HashMap::new();
        let private = group::generate_secret(&mut rng);
        consensus.insert(id, group::public_key_from_private(&private));

        let surb = Surb::create(&params, &mut rng, &[id], &consensus, b"nym-2").unwrap();
        let reply_a = surb.encrypt_reply(&params, b"first").unwrap();
        let reply_b = surb.encrypt_reply(&params, b"second").unwrap();
        assert_eq!(reply_a.alpha, reply_b.alpha);
        assert_eq!(reply_a.beta, reply_b.beta);
        assert_ne!(reply_a.delta, reply_b.delta);
    }
}
