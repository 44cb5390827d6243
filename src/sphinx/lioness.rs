//! Lioness: the four-round unbalanced Feistel wide-block PRP used as the
//! payload cipher pi/pi^-1.
//!
//! Not grounded on the teacher (which uses an AEAD, not a wide-block PRP);
//! built from `original_source/sphinxmixcrypto/params.py`'s `Chacha_Lioness`
//! key-expansion step and the standard four-round (hash, stream, hash,
//! stream) Lioness construction. See DESIGN.md.

use blake2::digest::consts::U32;
use blake2::Blake2bMac;
use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;

use super::primitives::generate_keystream;

type Blake2bMac256 = Blake2bMac<U32>;

/// Length of the Feistel "left" half; chosen to match a ChaCha20 key size so
/// the left half can double as a stream-cipher key in the S rounds.
pub const LEFT_LEN: usize = 32;

const ROUND_KEY_LEN: usize = 52;
const KEY_MATERIAL_LEN: usize = 4 * ROUND_KEY_LEN;

struct RoundKeys {
    k1: [u8; ROUND_KEY_LEN],
    k2: [u8; ROUND_KEY_LEN],
    k3: [u8; ROUND_KEY_LEN],
    k4: [u8; ROUND_KEY_LEN],
}

/// Expands the 16-byte Lioness key `h_pi(s)` into four 52-byte round keys by
/// encrypting a 208-byte zero block under it through the stream cipher, per
/// SPEC_FULL.md 4.2.
fn expand_round_keys(key: &[u8; 16]) -> RoundKeys {
    let material = generate_keystream(key, KEY_MATERIAL_LEN);
    let mut k1 = [0u8; ROUND_KEY_LEN];
    let mut k2 = [0u8; ROUND_KEY_LEN];
    let mut k3 = [0u8; ROUND_KEY_LEN];
    let mut k4 = [0u8; ROUND_KEY_LEN];
    k1.copy_from_slice(&material[0..ROUND_KEY_LEN]);
    k2.copy_from_slice(&material[ROUND_KEY_LEN..2 * ROUND_KEY_LEN]);
    k3.copy_from_slice(&material[2 * ROUND_KEY_LEN..3 * ROUND_KEY_LEN]);
    k4.copy_from_slice(&material[3 * ROUND_KEY_LEN..4 * ROUND_KEY_LEN]);
    RoundKeys { k1, k2, k3, k4 }
}

/// The "H" round function: a keyed Blake2b hash of `other` under `round_key`,
/// truncated to `LEFT_LEN` bytes.
fn h_round(round_key: &[u8; ROUND_KEY_LEN], other: &[u8]) -> [u8; LEFT_LEN] {
    use blake2::digest::Mac;
    let mut mac = Blake2bMac256::new_from_slice(round_key).expect("round key length is valid");
    mac.update(other);
    let digest = mac.finalize().into_bytes();
    let mut out = [0u8; LEFT_LEN];
    out.copy_from_slice(&digest);
    out
}

/// The "S" round function: a ChaCha20 keystream over the right half, keyed by
/// `round_key[..32] XOR left` with the nonce taken from the remaining bytes
/// of `round_key`.
fn s_round(round_key: &[u8; ROUND_KEY_LEN], left: &[u8; LEFT_LEN], right_len: usize) -> Vec<u8> {
    let mut key = [0u8; 32];
    for i in 0..32 {
        key[i] = round_key[i] ^ left[i];
    }
    let mut nonce = [0u8; 12];
    nonce.copy_from_slice(&round_key[32..44]);
    let mut cipher = ChaCha20::new(&key.into(), &nonce.into());
    let mut buf = vec![0u8; right_len];
    cipher.apply_keystream(&mut buf);
    buf
}

fn xor_in_place(a: &mut [u8], b: &[u8]) {
    for (x, y) in a.iter_mut().zip(b.iter()) {
        *x ^= y;
    }
}

/// Encrypts an `m`-byte block under the 16-byte Lioness key `h_pi(s)`.
pub fn lioness_encrypt(key: &[u8; 16], block: &[u8]) -> Vec<u8> {
    let rk = expand_round_keys(key);
    let (left_src, right_src) = block.split_at(LEFT_LEN);
    let mut left = [0u8; LEFT_LEN];
    left.copy_from_slice(left_src);
    let mut right = right_src.to_vec();

    xor_in_place(&mut left, &h_round(&rk.k1, &right));
    xor_in_place(&mut right, &s_round(&rk.k2, &left, right.len()));
    xor_in_place(&mut left, &h_round(&rk.k3, &right));
    xor_in_place(&mut right, &s_round(&rk.k4, &left, right.len()));

    let mut out = Vec::with_capacity(block.len());
    out.extend_from_slice(&left);
    out.extend_from_slice(&right);
    out
}

/// Decrypts an `m`-byte block under the 16-byte Lioness key `h_pi(s)`; the
/// exact inverse of [`lioness_encrypt`].
pub fn lioness_decrypt(key: &[u8; 16], block: &[u8]) -> Vec<u8> {
    let rk = expand_round_keys(key);
    let (left_src, right_src) = block.split_at(LEFT_LEN);
    let mut left = [0u8; LEFT_LEN];
    left.copy_from_slice(left_src);
    let mut right = right_src.to_vec();

    xor_in_place(&mut right, &s_round(&rk.k4, &left, right.len()));
    xor_in_place(&mut left, &h_round(&rk.k3, &right));
    xor_in_place(&mut right, &s_round(&rk.k2, &left, right.len()));
    xor_in_place(&mut left, &h_round(&rk.k1, &right));

    let mut out = Vec::with_capacity(block.len());
    out.extend_from_slice(&left);
    out.extend_from_slice(&right);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let key = [42u8; 16];
        let block = vec![7u8; 1024];
        let ct = lioness_encrypt(&key, &block);
        assert_eq!(ct.len(), block.len());
        assert_ne!(ct, block);
        let pt = lioness_decrypt(&key, &ct);
        assert_eq!(pt, block);
    }

    #[test]
    fn different_keys_give_different_ciphertexts() {
        let block = vec![1u8; 1024];
        let ct1 = lioness_encrypt(&[1u8; 16], &block);
        let ct2 = lioness_encrypt(&[2u8; 16], &block);
        assert_ne!(ct1, ct2);
    }

    #[test]
    fn single_bit_flip_changes_whole_block() {
        let key = [9u8; 16];
        let mut block = vec![0u8; 1024];
        let ct1 = lioness_encrypt(&key, &block);
        block[500] ^= 0x01;
        let ct2 = lioness_encrypt(&key, &block);
        let differing = ct1.iter().zip(ct2.iter()).filter(|(a, b)| a != b).count();
        assert!(differing > 900, "expected wide-block diffusion, got {differing} differing bytes");
    }
}
