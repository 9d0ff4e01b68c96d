//
// Copyright (c) 2026 u2f-core contributors
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//

//! Crypto Facade: a narrow interface over SHA-256,
//! HMAC-SHA-256, P-256 ECDSA, P-256 public key derivation, and a
//! CSPRNG. Callers outside this module never touch a RustCrypto type
//! directly — they go through [`MasterKeyHmac`], [`sign_prehashed`],
//! [`derive_p256_keypair_from_seed`], and [`fill_random`].

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use p256::ecdsa::signature::hazmat::PrehashSigner;
use p256::ecdsa::{Signature, SigningKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::SecretKey;
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// SHA-256 of a single buffer (one-shot form of the facade).
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Streaming SHA-256, for callers that assemble a hash from several
/// non-contiguous fields (the attestation and assertion hashes, §4.4/§4.5).
#[derive(Default)]
pub struct Sha256Stream(Sha256);

impl Sha256Stream {
    pub fn new() -> Self {
        Self(Sha256::new())
    }

    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.0.update(data);
        self
    }

    pub fn finalize(self) -> [u8; 32] {
        self.0.finalize().into()
    }
}

type HmacSha256 = Hmac<Sha256>;

/// Streaming HMAC-SHA-256 keyed by the device master key, mirroring
/// `hmac_sha256_init(key_id)/update/final`. The master key bytes are
/// supplied once, by the `Device` implementation that owns them, and
/// never travel further than this struct.
pub struct MasterKeyHmac(HmacSha256);

impl MasterKeyHmac {
    pub fn new(master_key: &[u8; 32]) -> Self {
        // HMAC accepts any key length; 32 bytes always succeeds.
        Self(HmacSha256::new_from_slice(master_key).expect("32-byte HMAC key is always valid"))
    }

    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        Mac::update(&mut self.0, data);
        self
    }

    pub fn finalize(self) -> [u8; 32] {
        self.0.finalize().into_bytes().into()
    }
}

/// Sign a 32-byte pre-hashed digest with the given P-256 signing key,
/// returning the raw `(r, s)` scalars (big-endian, 32 bytes each).
///
/// This signs the digest directly rather than re-hashing the message —
/// the spec's hash (§4.4 step 3 / §4.5 step 4) is computed up front by
/// the caller over the exact byte sequence the protocol specifies.
pub fn sign_prehashed(signing_key: &SigningKey, digest: &[u8; 32]) -> Result<([u8; 32], [u8; 32]), CryptoError> {
    let signature: Signature = signing_key
        .sign_prehash(digest)
        .map_err(|_| CryptoError::SigningFailed)?;
    // `to_bytes()` is the fixed-width r || s concatenation (32 + 32 bytes).
    let raw = signature.to_bytes();
    let mut r_bytes = [0u8; 32];
    let mut s_bytes = [0u8; 32];
    r_bytes.copy_from_slice(&raw[..32]);
    s_bytes.copy_from_slice(&raw[32..]);
    Ok((r_bytes, s_bytes))
}

/// Maximum rejection-sampling attempts before giving up on seed
/// expansion. A 256-bit HKDF output lands outside the P-256 scalar
/// range with negligible probability, so this bound is never hit in
/// practice — it exists so the function totals instead of looping.
const MAX_SCALAR_ATTEMPTS: u32 = 32;

/// Derive a P-256 signing key and its uncompressed public point `X ‖ Y`
/// from arbitrary seed material (the ECDSA engine consumes the full
/// `KH_SIZE`-byte key handle as private-key seed material).
///
/// The seed is expanded through HKDF-SHA256 with a counter folded into
/// the `info` parameter, rejection-sampling until the output decodes
/// as a valid nonzero P-256 scalar less than the curve order.
pub fn derive_p256_keypair_from_seed(seed: &[u8]) -> Result<(SigningKey, [u8; 64]), CryptoError> {
    let hk = Hkdf::<Sha256>::new(None, seed);
    for attempt in 0..MAX_SCALAR_ATTEMPTS {
        let mut okm = [0u8; 32];
        let mut info = [0u8; 22 + 4];
        info[..22].copy_from_slice(b"u2f-core/p256-seed/v1/");
        info[22..].copy_from_slice(&attempt.to_be_bytes());
        hk.expand(&info, &mut okm)
            .expect("32-byte output is within HKDF-SHA256's expand limit");

        if let Ok(secret) = SecretKey::from_slice(&okm) {
            let public_point = secret.public_key().to_encoded_point(false);
            let encoded = public_point.as_bytes();
            debug_assert_eq!(encoded.len(), 65, "uncompressed P-256 point is 65 bytes");
            let mut xy = [0u8; 64];
            xy.copy_from_slice(&encoded[1..]);
            okm.zeroize();
            return Ok((SigningKey::from(secret), xy));
        }
        okm.zeroize();
    }
    Err(CryptoError::ScalarDerivationFailed(MAX_SCALAR_ATTEMPTS))
}

/// Fill `out` with CSPRNG bytes.
pub fn fill_random(out: &mut [u8]) {
    OsRng.fill_bytes(out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_matches_known_vector() {
        // SHA-256("abc")
        let digest = sha256(b"abc");
        assert_eq!(
            hex_encode(&digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn streaming_matches_one_shot() {
        let one_shot = sha256(b"hello world");
        let streaming = Sha256Stream::new().update(b"hello ").update(b"world").finalize();
        assert_eq!(one_shot, streaming);
    }

    #[test]
    fn hmac_is_deterministic_for_same_key_and_input() {
        let key = [7u8; 32];
        let a = MasterKeyHmac::new(&key).update(b"x").update(b"y").finalize();
        let b = MasterKeyHmac::new(&key).update(b"x").update(b"y").finalize();
        assert_eq!(a, b);
    }

    #[test]
    fn hmac_changes_with_key() {
        let a = MasterKeyHmac::new(&[1u8; 32]).update(b"same").finalize();
        let b = MasterKeyHmac::new(&[2u8; 32]).update(b"same").finalize();
        assert_ne!(a, b);
    }

    #[test]
    fn seed_derivation_is_deterministic() {
        let seed = [42u8; 64];
        let (_, pub1) = derive_p256_keypair_from_seed(&seed).unwrap();
        let (_, pub2) = derive_p256_keypair_from_seed(&seed).unwrap();
        assert_eq!(pub1, pub2);
    }

    #[test]
    fn seed_derivation_differs_per_seed() {
        let (_, pub1) = derive_p256_keypair_from_seed(&[1u8; 64]).unwrap();
        let (_, pub2) = derive_p256_keypair_from_seed(&[2u8; 64]).unwrap();
        assert_ne!(pub1, pub2);
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let seed = [9u8; 64];
        let (signing_key, pub_xy) = derive_p256_keypair_from_seed(&seed).unwrap();
        let digest = sha256(b"message to sign");
        let (r, s) = sign_prehashed(&signing_key, &digest).unwrap();

        use p256::ecdsa::signature::hazmat::PrehashVerifier;
        use p256::ecdsa::VerifyingKey;
        use p256::EncodedPoint;

        let mut uncompressed = [0u8; 65];
        uncompressed[0] = 0x04;
        uncompressed[1..].copy_from_slice(&pub_xy);
        let point = EncodedPoint::from_bytes(uncompressed).unwrap();
        let verifying_key = VerifyingKey::from_encoded_point(&point).unwrap();

        let mut raw = [0u8; 64];
        raw[..32].copy_from_slice(&r);
        raw[32..].copy_from_slice(&s);
        let signature = Signature::try_from(raw.as_slice()).unwrap();
        assert!(verifying_key.verify_prehash(&digest, &signature).is_ok());
    }

    fn hex_encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}
