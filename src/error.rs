//
// Copyright (c) 2026 u2f-core contributors
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//

//! Error hierarchy for the u2f-core workspace.
//!
//! Protocol-level failures (wrong length, unknown instruction, tag
//! mismatch, ...) are never represented here — they are [`crate::StatusWord`]
//! values returned by value from the dispatcher, per spec. These types
//! only cover the two remaining fallible seams: cryptographic
//! operations that can reject their input, and the device/storage
//! collaborator.

use thiserror::Error;

/// Errors from the crypto facade (`crate::crypto`, `crate::der`).
#[derive(Error, Debug, Clone)]
pub enum CryptoError {
    #[error("seed material did not expand to a valid P-256 scalar after {0} attempts")]
    ScalarDerivationFailed(u32),

    #[error("invalid P-256 private key material: {0}")]
    InvalidPrivateKey(String),

    #[error("ECDSA signing operation failed")]
    SigningFailed,
}

/// Errors from the `Device` collaborator (§6 external interfaces).
#[derive(Error, Debug, Clone)]
pub enum DeviceError {
    /// The monotonic signature counter has reached `u32::MAX` and
    /// cannot be advanced without wrapping. Per /§9 this must
    /// never silently wrap; the dispatcher maps this to a status word
    /// rather than letting the caller observe a reused counter value.
    #[error("signature counter exhausted")]
    CounterExhausted,

    /// The durable counter store could not confirm the increment was
    /// persisted before the signature would be emitted.
    #[error("counter store did not durably commit the increment: {0}")]
    CounterStorageFault(String),

    #[error("cryptographic operation failed")]
    Crypto(#[from] CryptoError),
}
