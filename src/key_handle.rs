//
// Copyright (c) 2026 u2f-core contributors
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//

//! Key-Handle Codec: on-wire layout of a key handle and
//! the HMAC tag binding it to an application identifier, plus
//! `mint`/`verify`/`load_private`.
//!
//! Grounded on `original_source/fido2/u2f.c`'s `u2f_new_keypair` /
//! `u2f_make_auth_tag` / `u2f_appid_eq`.

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::device::Device;
use crate::{KH_KEY_SIZE, KH_SIZE, KH_TAG_SIZE};

/// A credential identifier: random seed material plus an HMAC tag
/// binding it to the application identifier it was minted for.
///
/// Invariants: `tag` is a pure function of
/// `(master_key, key, app_id)`; a handle verifies for an `app_id` iff
/// its tag recomputes equal; the device holds no other per-credential
/// state.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct KeyHandle {
    pub key: [u8; KH_KEY_SIZE],
    pub tag: [u8; KH_TAG_SIZE],
}

impl KeyHandle {
    /// Serialize as `key ‖ tag`, the on-wire layout.
    pub fn to_bytes(&self) -> [u8; KH_SIZE] {
        let mut out = [0u8; KH_SIZE];
        out[..KH_KEY_SIZE].copy_from_slice(&self.key);
        out[KH_KEY_SIZE..].copy_from_slice(&self.tag);
        out
    }

    /// Parse a handle from exactly `KH_SIZE` bytes. Returns `None` for
    /// any other length — callers (the Authenticate handler) map that
    /// to the spec's ordered `khl == KH_SIZE` check.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != KH_SIZE {
            return None;
        }
        let mut key = [0u8; KH_KEY_SIZE];
        let mut tag = [0u8; KH_TAG_SIZE];
        key.copy_from_slice(&bytes[..KH_KEY_SIZE]);
        tag.copy_from_slice(&bytes[KH_KEY_SIZE..]);
        Some(Self { key, tag })
    }
}

/// Mint a fresh key handle for `app_id`: random `key`, a tag binding it
/// to `app_id` under the device's master key, and the derived P-256
/// public key (`X ‖ Y`, 64 bytes).
pub fn mint(device: &impl Device, app_id: &[u8; 32]) -> Result<(KeyHandle, [u8; 64]), crate::error::DeviceError> {
    let mut key = [0u8; KH_KEY_SIZE];
    device.fill_random(&mut key);
    let tag = device.compute_handle_tag(&key, app_id);
    let handle = KeyHandle { key, tag };
    let public_key = device.derive_public_key(&handle)?;
    Ok((handle, public_key))
}

/// Check whether `handle` is authentic for `app_id`, in constant time
/// with respect to where in the tag a mismatch occurs (spec.md
/// Testable Properties #10).
pub fn verify(device: &impl Device, handle: &KeyHandle, app_id: &[u8; 32]) -> bool {
    let expected = device.compute_handle_tag(&handle.key, app_id);
    expected.ct_eq(&handle.tag).into()
}

/// Inform the ECDSA engine that the next sign operation uses `handle`'s
/// material as the private key. One of the Authenticate-Sign
/// ordered predicates: must run before the presence test.
pub fn load_private(device: &impl Device, handle: &KeyHandle) -> Result<(), crate::error::DeviceError> {
    device.load_private(handle)
}
