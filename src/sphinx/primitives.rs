//! Domain-separated key derivation and the symmetric primitives (PRG, MAC)
//! built on top of Blake2b and ChaCha20.

use blake2::digest::consts::U16;
use blake2::{Blake2b512, Blake2bMac, Digest};
use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20Legacy;
use subtle::ConstantTimeEq;

use super::group::Scalar;

type Blake2bMac128 = Blake2bMac<U16>;

const BLINDING_PREFIX: u8 = 0x11;
const RHO_PREFIX: u8 = 0x22;
const MU_PREFIX: u8 = 0x33;
const PI_PREFIX: u8 = 0x44;
const TAU_PREFIX: u8 = 0x55;

/// Blake2b-512 truncated to 32 bytes, matching the reference `Blake2_hash`.
pub fn blake2_hash32(data: &[u8]) -> [u8; 32] {
    let digest = Blake2b512::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..32]);
    out
}

fn prefixed_hash(prefix: u8, parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b512::new();
    hasher.update([prefix]);
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..32]);
    out
}

/// `h_b(alpha, s)`: blinding factor, a clamped scalar derived from alpha and the
/// shared secret.
pub fn h_blind(alpha: &[u8], s: &[u8]) -> Scalar {
    let hash = prefixed_hash(BLINDING_PREFIX, &[alpha, s]);
    Scalar::from_clamped_bytes(hash)
}

/// `h_rho(s)`: 16-byte key for the header PRG.
pub fn h_rho(s: &[u8]) -> [u8; 16] {
    let hash = prefixed_hash(RHO_PREFIX, &[s]);
    let mut out = [0u8; 16];
    out.copy_from_slice(&hash[..16]);
    out
}

/// `h_mu(s)`: 16-byte key for the header MAC.
pub fn h_mu(s: &[u8]) -> [u8; 16] {
    let hash = prefixed_hash(MU_PREFIX, &[s]);
    let mut out = [0u8; 16];
    out.copy_from_slice(&hash[..16]);
    out
}

/// `h_pi(s)`: 16-byte key for the Lioness payload PRP.
pub fn h_pi(s: &[u8]) -> [u8; 16] {
    let hash = prefixed_hash(PI_PREFIX, &[s]);
    let mut out = [0u8; 16];
    out.copy_from_slice(&hash[..16]);
    out
}

/// `h_tau(s)`: 32-byte replay tag, not truncated further than the base hash.
pub fn h_tau(s: &[u8]) -> [u8; 32] {
    prefixed_hash(TAU_PREFIX, &[s])
}

/// `mu(key, data)`: keyed Blake2b MAC, truncated to 16 bytes natively (not an
/// HMAC construction).
pub fn mu(key: &[u8; 16], data: &[u8]) -> [u8; 16] {
    use blake2::digest::Mac;
    let mut mac = Blake2bMac128::new_from_slice(key).expect("16-byte key is valid");
    mac.update(data);
    let result = mac.finalize().into_bytes();
    let mut out = [0u8; 16];
    out.copy_from_slice(&result);
    out
}

/// Constant-time comparison of two MACs.
pub fn mac_eq(a: &[u8; 16], b: &[u8; 16]) -> bool {
    a.ct_eq(b).into()
}

/// Rekeys a 16-byte domain key into a 32-byte ChaCha20 key and 8-byte nonce
/// via a Blake2b-512 hash, then returns a `ChaCha20Legacy` instance ready to
/// encrypt or decrypt a keystream.
///
/// The nonce occupies the first 8 bytes of the digest and the key the next
/// 32, matching the reference's `Chacha20_stream_cipher` byte order.
fn rekeyed_cipher(key: &[u8; 16]) -> ChaCha20Legacy {
    let digest = Blake2b512::digest(key);
    let mut nonce = [0u8; 8];
    let mut cipher_key = [0u8; 32];
    nonce.copy_from_slice(&digest[0..8]);
    cipher_key.copy_from_slice(&digest[8..40]);
    ChaCha20Legacy::new(&cipher_key.into(), &nonce.into())
}

/// Generates `len` bytes of keystream under `key`, used both as the header
/// PRG rho and for Lioness key expansion.
pub fn generate_keystream(key: &[u8; 16], len: usize) -> Vec<u8> {
    let mut cipher = rekeyed_cipher(key);
    let mut buf = vec![0u8; len];
    cipher.apply_keystream(&mut buf);
    buf
}

/// XORs two equal-length byte strings, returning a new buffer.
pub fn xor(a: &[u8], b: &[u8]) -> Vec<u8> {
    assert_eq!(a.len(), b.len(), "xor operands must have equal length");
    a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect()
}
