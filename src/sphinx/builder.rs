//! Forward-message and SURB-header construction: the algorithmic inverse of
//! [`crate::sphinx::node`]'s unwrap, built layer by layer from the innermost
//! hop outward.
//!
//! Grounded on `original_source/sphinxmixcrypto/node.py`'s unwrap arithmetic
//! (this module reproduces it in reverse) plus the filler construction
//! described in SPEC_FULL.md 4.4; no original_source builder file was present
//! in the retrieved pack, so the filler loop is derived from node.py's
//! header-expansion slice widths by symmetry.

use std::collections::HashMap;

use rand_core::{CryptoRng, RngCore};

use super::codec::{add_padding, destination_encode, encode_command, RoutingCommand};
use super::error::BuilderError;
use super::group::{self, GROUP_ELEMENT_SIZE};
use super::packet::SphinxPacket;
use super::params::{SphinxParams, K};
use super::primitives::{generate_keystream, h_blind, h_mu, h_pi, h_rho, mu, xor};

/// Per-hop key material computed while walking a route: the alpha sent to
/// reach this hop and the shared secret that hop will itself derive.
#[derive(Clone)]
pub struct HopMaterial {
    pub node_id: [u8; K],
    pub alpha: [u8; GROUP_ELEMENT_SIZE],
    pub s: [u8; GROUP_ELEMENT_SIZE],
}

/// A fully-built forward message, ready for dispatch to `first_hop`.
pub struct BuiltMessage {
    pub first_hop: [u8; K],
    pub packet: SphinxPacket,
}

/// Walks `route`, deriving each hop's shared secret by successive blinding
/// (SPEC_FULL.md 4.4 step 1-2).
pub fn derive_hop_materials<R: RngCore + CryptoRng>(
    rng: &mut R,
    route: &[[u8; K]],
    consensus: &HashMap<[u8; K], [u8; GROUP_ELEMENT_SIZE]>,
    params: &SphinxParams,
) -> Result<Vec<HopMaterial>, BuilderError> {
    if route.is_empty() || route.len() > params.r {
        return Err(BuilderError::RouteTooLong { max: params.r, got: route.len() });
    }

    let x0 = group::generate_secret(rng);
    let mut alpha_cur = group::public_key_from_private(&x0);
    let mut blinds = vec![x0];
    let mut materials = Vec::with_capacity(route.len());

    for &node_id in route {
        let hop_public = *consensus
            .get(&node_id)
            .ok_or_else(|| BuilderError::UnknownNode(node_id.to_vec()))?;
        let s = group::multi_scalar_mult(&hop_public, &blinds);
        let b = h_blind(&alpha_cur, &s);
        materials.push(HopMaterial { node_id, alpha: alpha_cur, s });
        alpha_cur = group::scalar_mult(&alpha_cur, &b);
        blinds.push(b);
    }
    Ok(materials)
}

/// Builds the nested routing header `(alpha_0, beta_0, gamma_0)` for a chain
/// of hop materials, with `final_plaintext_prefix` as the final hop's
/// routing-command bytes (`[0x00]` for an ordinary forward message's
/// Process command, or a `Client{..}` encoding plus message id for a SURB).
///
/// Implements SPEC_FULL.md 4.4 steps 3-5: the filler loop followed by the
/// innermost-to-outermost beta/gamma construction.
pub fn build_header(
    params: &SphinxParams,
    materials: &[HopMaterial],
    final_plaintext_prefix: &[u8],
) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let l = materials.len();
    let beta_len = params.beta_len();

    let mut filler: Vec<u8> = Vec::new();
    for material in &materials[..l.saturating_sub(1)] {
        filler.extend(std::iter::repeat(0u8).take(2 * K));
        let tail = generate_keystream(&h_rho(&material.s), filler.len());
        filler = xor(&filler, &tail[tail.len() - filler.len()..]);
    }
    let filler_len = filler.len();

    let mut next_beta: Option<Vec<u8>> = None;
    let mut next_gamma: Option<Vec<u8>> = None;
    let mut beta0 = Vec::new();
    let mut gamma0 = Vec::new();

    for i in (0..l).rev() {
        let s = &materials[i].s;
        let plain = if i == l - 1 {
            let content_len = beta_len - filler_len;
            let mut prefix = final_plaintext_prefix.to_vec();
            prefix.resize(content_len, 0u8);
            let mask = generate_keystream(&h_rho(s), content_len);
            let mut masked = xor(&prefix, &mask);
            masked.extend_from_slice(&filler);
            masked
        } else {
            let next_id = materials[i + 1].node_id;
            let mut prefix = Vec::with_capacity(beta_len);
            prefix.extend_from_slice(&next_id);
            prefix.extend_from_slice(next_gamma.as_ref().expect("gamma computed for inner hop"));
            prefix.extend_from_slice(&next_beta.as_ref().expect("beta computed for inner hop")[0..beta_len - 2 * K]);
            let mask = generate_keystream(&h_rho(s), beta_len);
            xor(&prefix, &mask)
        };
        let gamma = mu(&h_mu(s), &plain);
        if i == 0 {
            beta0 = plain.clone();
            gamma0 = gamma.clone();
        }
        next_beta = Some(plain);
        next_gamma = Some(gamma);
    }

    (materials[0].alpha.to_vec(), beta0, gamma0)
}

/// Wraps `block` (already exactly `m` bytes) in a Lioness layer per hop, from
/// the last hop inward to the first, per SPEC_FULL.md 4.4 step 6.
pub fn layer_payload(params: &SphinxParams, materials: &[HopMaterial], block: Vec<u8>) -> Result<Vec<u8>, BuilderError> {
    let mut delta = block;
    for material in materials.iter().rev() {
        delta = params.pi(&h_pi(&material.s), &delta)?;
    }
    Ok(delta)
}

/// Builds a complete forward message: header plus a payload wrapping
/// `message` addressed to `dest` via the final hop's Process command.
pub fn create_forward_message<R: RngCore + CryptoRng>(
    params: &SphinxParams,
    rng: &mut R,
    route: &[[u8; K]],
    consensus: &HashMap<[u8; K], [u8; GROUP_ELEMENT_SIZE]>,
    dest: &[u8],
    message: &[u8],
) -> Result<BuiltMessage, BuilderError> {
    let materials = derive_hop_materials(rng, route, consensus, params)?;

    let dest_enc = destination_encode(dest)?;
    let body_len = params.m.saturating_sub(K + dest_enc.len());
    if message.len() + 1 > body_len {
        return Err(BuilderError::MessageTooLong { got: message.len(), max: body_len.saturating_sub(1) });
    }
    let body_padded = add_padding(message, body_len);

    let mut block = Vec::with_capacity(params.m);
    block.extend(std::iter::repeat(0u8).take(K));
    block.extend_from_slice(&dest_enc);
    block.extend_from_slice(&body_padded);

    let delta = layer_payload(params, &materials, block)?;
    let process_tag = encode_command(&RoutingCommand::Process);
    let (alpha0, beta0, gamma0) = build_header(params, &materials, &process_tag);

    Ok(BuiltMessage {
        first_hop: materials[0].node_id,
        packet: SphinxPacket::new(alpha0, beta0, gamma0, delta),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    fn node_id(tag: u8) -> [u8; K] {
        let mut id = [tag; K];
        id[0] = 0xFF;
        id
    }

    #[test]
    fn rejects_routes_longer_than_r() {
        let params = SphinxParams::new(2, 1024);
        let mut rng = OsRng;
        let route = vec![node_id(1), node_id(2), node_id(3)];
        let consensus = HashMap::new();
        let err = derive_hop_materials(&mut rng, &route, &consensus, &params).unwrap_err();
        assert!(matches!(err, BuilderError::RouteTooLong { max: 2, got: 3 }));
    }

    #[test]
    fn rejects_unknown_node() {
        let params = SphinxParams::default();
        let mut rng = OsRng;
        let route = vec![node_id(9)];
        let consensus = HashMap::new();
        let err = derive_hop_materials(&mut rng, &route, &consensus, &params).unwrap_err();
        assert!(matches!(err, BuilderError::UnknownNode(_)));
    }

    #[test]
    fn rejects_message_too_long() {
        let params = SphinxParams::default();
        let mut rng = OsRng;
        let id = node_id(1);
        let mut consensus = HashMap::new();
        let private = group::generate_secret(&mut rng);
        consensus.insert(id, group::public_key_from_private(&private));
        let huge = vec![0u8; 2000];
        let err = create_forward_message(&params, &mut rng, &[id], &consensus, b"d", &huge).unwrap_err();
        assert!(matches!(err, BuilderError::MessageTooLong { .. }));
    }

    #[test]
    fn header_length_is_route_length_invariant() {
        let params = SphinxParams::default();
        let mut rng = OsRng;
        let mut consensus = HashMap::new();
        let route: Vec<[u8; K]> = (1u8..=5).map(node_id).collect();
        for &id in &route {
            let private = group::generate_secret(&mut rng);
            consensus.insert(id, group::public_key_from_private(&private));
        }
        for l in 1..=5 {
            let built = create_forward_message(&params, &mut rng, &route[..l], &consensus, b"dest", b"hi").unwrap();
            assert_eq!(built.packet.beta.len(), params.beta_len());
            assert_eq!(built.packet.to_bytes().len(), params.packet_len());
        }
    }
}
