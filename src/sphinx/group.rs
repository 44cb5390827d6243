//! Curve25519 group operations: secret generation, clamping and scalar
//! multiplication, shared by the node unwrap state machine and the packet
//! builder.

use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

/// Size in bytes of both group elements and scalars in this group.
pub const GROUP_ELEMENT_SIZE: usize = 32;

/// A clamped Curve25519 scalar, zeroized on drop.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Scalar(pub [u8; GROUP_ELEMENT_SIZE]);

impl Scalar {
    pub fn from_clamped_bytes(mut bytes: [u8; GROUP_ELEMENT_SIZE]) -> Self {
        clamp(&mut bytes);
        Scalar(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; GROUP_ELEMENT_SIZE] {
        &self.0
    }
}

/// Applies the X25519 scalar-clamping bit manipulations in place.
fn clamp(bytes: &mut [u8; GROUP_ELEMENT_SIZE]) {
    bytes[0] &= 0xF8;
    bytes[31] &= 0x7F;
    bytes[31] |= 0x40;
}

/// Samples a fresh clamped secret scalar from a CSPRNG.
pub fn generate_secret<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    let mut bytes = [0u8; GROUP_ELEMENT_SIZE];
    rng.fill_bytes(&mut bytes);
    Scalar::from_clamped_bytes(bytes)
}

/// Standard X25519 scalar multiplication: `base_point * scalar`.
pub fn scalar_mult(base_point: &[u8; GROUP_ELEMENT_SIZE], scalar: &Scalar) -> [u8; GROUP_ELEMENT_SIZE] {
    x25519_dalek::x25519(scalar.0, *base_point)
}

/// Computes the public key corresponding to a secret scalar, i.e.
/// `scalar_mult(basepoint, scalar)`.
pub fn public_key_from_private(scalar: &Scalar) -> [u8; GROUP_ELEMENT_SIZE] {
    x25519_dalek::x25519(scalar.0, x25519_dalek::X25519_BASEPOINT_BYTES)
}

/// Folds `base * s_1 * s_2 * ... * s_n` by repeated left-multiplication.
pub fn multi_scalar_mult(base: &[u8; GROUP_ELEMENT_SIZE], scalars: &[Scalar]) -> [u8; GROUP_ELEMENT_SIZE] {
    scalars
        .iter()
        .fold(*base, |acc, s| x25519_dalek::x25519(s.0, acc))
}

/// All 32-byte strings are valid Curve25519 elements per the X25519 contract;
/// this only checks length, matching the reference `GroupECC.in_group`.
pub fn in_group(x: &[u8]) -> bool {
    x.len() == GROUP_ELEMENT_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn clamping_sets_expected_bits() {
        let s = Scalar::from_clamped_bytes([0xFFu8; 32]);
        assert_eq!(s.0[0] & 0x07, 0);
        assert_eq!(s.0[31] & 0x80, 0);
        assert_eq!(s.0[31] & 0x40, 0x40);
    }

    #[test]
    fn diffie_hellman_agrees() {
        let mut rng = OsRng;
        let a = generate_secret(&mut rng);
        let b = generate_secret(&mut rng);
        let pa = public_key_from_private(&a);
        let pb = public_key_from_private(&b);
        let shared_ab = scalar_mult(&pb, &a);
        let shared_ba = scalar_mult(&pa, &b);
        assert_eq!(shared_ab, shared_ba);
    }

    #[test]
    fn multi_scalar_mult_matches_sequential_fold() {
        let mut rng = OsRng;
        let base = public_key_from_private(&generate_secret(&mut rng));
        let s1 = generate_secret(&mut rng);
        let s2 = generate_secret(&mut rng);
        let expected = scalar_mult(&scalar_mult(&base, &s1), &s2);
        let got = multi_scalar_mult(&base, &[s1, s2]);
        assert_eq!(expected, got);
    }

    #[test]
    fn in_group_checks_length_only() {
        assert!(in_group(&[0u8; 32]));
        assert!(!in_group(&[0u8; 31]));
        assert!(!in_group(&[0u8; 33]));
    }
}
