//
// Copyright (c) 2026 u2f-core contributors
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//

//! External collaborator seam: the narrow interfaces the
//! core consumes but does not implement — master-key-keyed tagging,
//! per-handle ECDSA, attestation signing, the CSPRNG, the
//! user-presence indicator, and the durable counter.
//!
//! [`Device`] is the trait a real firmware build implements against
//! hardware; [`SoftwareDevice`] is an in-process reference
//! implementation used by tests, the benches, and the bundled demo —
//! the U2F-core analogue of the teacher's software HSM backend.

use p256::ecdsa::SigningKey;

use crate::crypto::{self, MasterKeyHmac};
use crate::error::DeviceError;
use crate::key_handle::KeyHandle;
use crate::KH_TAG_SIZE;

/// Everything the dispatcher and command handlers need from the
/// platform: crypto primitives keyed by device-held secrets, the RNG,
/// the physical presence signal, and the durable counter.
///
/// Implementations must never let key material cross this boundary in
/// the other direction — callers hand in a [`KeyHandle`] or an
/// `app_id`, never a raw scalar.
pub trait Device {
    /// `HMAC(master_key, key ‖ app_id)`, truncated to `KH_TAG_SIZE`
    /// bytes.
    fn compute_handle_tag(&self, key: &[u8], app_id: &[u8; 32]) -> [u8; KH_TAG_SIZE];

    /// Derive the P-256 public key (`X ‖ Y`) that `handle`'s private
    /// material corresponds to, without retaining the private scalar.
    fn derive_public_key(&self, handle: &KeyHandle) -> Result<[u8; 64], DeviceError>;

    /// Inform the ECDSA engine that the next sign operation uses
    /// `handle`'s material as the private key (`load_private`):
    /// validates that the handle's seed expands to usable key material
    /// without yet producing a signature. This is one of the
    /// Authenticate-Sign ordered predicates and must be attempted
    /// before the presence test, not folded into
    /// [`Device::sign_with_handle`].
    fn load_private(&self, handle: &KeyHandle) -> Result<(), DeviceError>;

    /// Sign `digest` (already hashed by the caller) with the P-256
    /// private key derived from `handle`. Callers must have already
    /// called [`Device::load_private`] successfully.
    fn sign_with_handle(&self, handle: &KeyHandle, digest: &[u8; 32]) -> Result<([u8; 32], [u8; 32]), DeviceError>;

    /// Sign `digest` with the device's fixed attestation private key.
    fn sign_with_attestation_key(&self, digest: &[u8; 32]) -> Result<([u8; 32], [u8; 32]), DeviceError>;

    /// The opaque, build-time-fixed attestation certificate bytes.
    fn attestation_certificate(&self) -> &[u8];

    /// Fill `out` with CSPRNG bytes.
    fn fill_random(&self, out: &mut [u8]);

    /// Local, physical confirmation gating signing operations (spec
    /// §6 `user_presence_test`). May block internally; only the
    /// boolean result is visible to the core.
    fn test_user_presence(&self) -> bool;

    /// Atomically advance and return the persistent signature counter.
    /// Must not be called except immediately before emitting a
    /// successful Authenticate-Sign response.
    fn increment_and_read_counter(&self) -> Result<u32, DeviceError>;
}

/// In-process reference [`Device`]: holds its master key and
/// attestation key/certificate directly rather than behind hardware,
/// matching the teacher's `SoftwareHsmBackend` — a constructor-supplied
/// stand-in used for tests, benches, and the bundled demo, not a
/// production key store.
pub struct SoftwareDevice {
    master_key: [u8; 32],
    attestation_key: SigningKey,
    attestation_cert: Vec<u8>,
    presence: core::sync::atomic::AtomicBool,
    counter: core::sync::atomic::AtomicU32,
}

impl SoftwareDevice {
    /// Build a device from caller-supplied key material. Configuration
    /// is constructor parameters, not a file or environment read — the
    /// spec places provisioning outside the core (§1 Out of scope).
    pub fn new(master_key: [u8; 32], attestation_key: SigningKey, attestation_cert: Vec<u8>) -> Self {
        Self {
            master_key,
            attestation_key,
            attestation_cert,
            presence: core::sync::atomic::AtomicBool::new(true),
            counter: core::sync::atomic::AtomicU32::new(0),
        }
    }

    /// A device with freshly generated attestation key material and an
    /// empty certificate, for use in tests and benchmarks where the
    /// certificate's contents are immaterial.
    pub fn for_testing() -> Self {
        let mut master_key = [0u8; 32];
        crypto::fill_random(&mut master_key);
        let (attestation_key, _pub) = crypto::derive_p256_keypair_from_seed(b"u2f-core test attestation seed")
            .expect("fixed test seed always derives a valid scalar");
        Self::new(master_key, attestation_key, Vec::new())
    }

    /// Flip whether [`Device::test_user_presence`] reports success.
    /// Used by tests exercising the "no presence" scenarios (S4, S8).
    pub fn set_presence(&self, present: bool) {
        self.presence.store(present, core::sync::atomic::Ordering::SeqCst);
    }
}

impl Device for SoftwareDevice {
    fn compute_handle_tag(&self, key: &[u8], app_id: &[u8; 32]) -> [u8; KH_TAG_SIZE] {
        let full = MasterKeyHmac::new(&self.master_key).update(key).update(app_id).finalize();
        let mut tag = [0u8; KH_TAG_SIZE];
        tag.copy_from_slice(&full[..KH_TAG_SIZE]);
        tag
    }

    fn derive_public_key(&self, handle: &KeyHandle) -> Result<[u8; 64], DeviceError> {
        let seed = handle.to_bytes();
        let (_signing_key, public_key) = crypto::derive_p256_keypair_from_seed(&seed)?;
        Ok(public_key)
    }

    fn load_private(&self, handle: &KeyHandle) -> Result<(), DeviceError> {
        crypto::derive_p256_keypair_from_seed(&handle.to_bytes())?;
        Ok(())
    }

    fn sign_with_handle(&self, handle: &KeyHandle, digest: &[u8; 32]) -> Result<([u8; 32], [u8; 32]), DeviceError> {
        let seed = handle.to_bytes();
        let (signing_key, _public_key) = crypto::derive_p256_keypair_from_seed(&seed)?;
        Ok(crypto::sign_prehashed(&signing_key, digest)?)
    }

    fn sign_with_attestation_key(&self, digest: &[u8; 32]) -> Result<([u8; 32], [u8; 32]), DeviceError> {
        Ok(crypto::sign_prehashed(&self.attestation_key, digest)?)
    }

    fn attestation_certificate(&self) -> &[u8] {
        &self.attestation_cert
    }

    fn fill_random(&self, out: &mut [u8]) {
        crypto::fill_random(out)
    }

    fn test_user_presence(&self) -> bool {
        self.presence.load(core::sync::atomic::Ordering::SeqCst)
    }

    fn increment_and_read_counter(&self) -> Result<u32, DeviceError> {
        use core::sync::atomic::Ordering;
        loop {
            let current = self.counter.load(Ordering::SeqCst);
            let next = current.checked_add(1).ok_or(DeviceError::CounterExhausted)?;
            if self
                .counter
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return Ok(next);
            }
        }
    }
}
