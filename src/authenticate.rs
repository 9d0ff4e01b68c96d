//
// Copyright (c) 2026 u2f-core contributors
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//

//! Authenticate Handler: realizes `U2F_AUTHENTICATE` in
//! its check-only and sign control modes.
//!
//! Grounded on `original_source/fido2/u2f.c::u2f_authenticate`. The
//! ordered, short-circuiting predicate chain in [`sign`] is load-bearing:
//! a relying party infers the cause of a rejected authentication from
//! which status class it receives, so the check order must not be
//! reshuffled.

use crate::crypto::Sha256Stream;
use crate::der;
use crate::device::Device;
use crate::dispatcher::StatusWord;
use crate::key_handle::{self, KeyHandle};
use crate::response::ResponseWriter;
use crate::KH_SIZE;

/// Authenticate control byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Check,
    Sign,
    DontEnforce,
    Other(u8),
}

impl From<u8> for Control {
    fn from(byte: u8) -> Self {
        match byte {
            0x07 => Control::Check,
            0x03 => Control::Sign,
            0x08 => Control::DontEnforce,
            other => Control::Other(other),
        }
    }
}

/// `challenge[32] ‖ app_id[32] ‖ khl: u8 ‖ key_handle[khl]`.
pub struct AuthenticateRequest<'a> {
    pub challenge: [u8; 32],
    pub app_id: [u8; 32],
    pub khl: usize,
    pub key_handle: &'a [u8],
}

impl<'a> AuthenticateRequest<'a> {
    /// Parse the fixed `challenge ‖ app_id ‖ khl ‖ key_handle` prefix.
    /// Does not validate `khl == KH_SIZE`; that check is part of the
    /// ordered predicate chain in [`sign`], since its failure mode
    /// (`WRONG_PAYLOAD`) differs by control byte from a plain parse error.
    pub fn parse(payload: &'a [u8]) -> Option<Self> {
        if payload.len() < 65 {
            return None;
        }
        let mut challenge = [0u8; 32];
        let mut app_id = [0u8; 32];
        challenge.copy_from_slice(&payload[..32]);
        app_id.copy_from_slice(&payload[32..64]);
        let khl = payload[64] as usize;
        let key_handle = payload.get(65..65 + khl)?;
        Some(Self {
            challenge,
            app_id,
            khl,
            key_handle,
        })
    }
}

/// Dispatch on `control` to check-only or sign.
pub fn authenticate(
    device: &impl Device,
    request: &AuthenticateRequest<'_>,
    control: Control,
    writer: &mut ResponseWriter<'_>,
) -> StatusWord {
    match control {
        Control::Check => check_only(device, request),
        _ => sign(device, request, control, writer),
    }
}

/// Check-only mode: never emits data, never consumes the counter, never
/// tests presence.
fn check_only(device: &impl Device, request: &AuthenticateRequest<'_>) -> StatusWord {
    let Some(handle) = KeyHandle::from_bytes(request.key_handle) else {
        return StatusWord::WrongData;
    };
    if key_handle::verify(device, &handle, &request.app_id) {
        tracing::debug!(status = "CONDITIONS_NOT_SATISFIED", "authenticate-check: handle owned");
        StatusWord::ConditionsNotSatisfied
    } else {
        StatusWord::WrongData
    }
}

/// Sign mode: the ordered predicate chain, then the assertion.
fn sign(
    device: &impl Device,
    request: &AuthenticateRequest<'_>,
    control: Control,
    writer: &mut ResponseWriter<'_>,
) -> StatusWord {
    if control != Control::Sign {
        // Includes DONT_ENFORCE (rejected outright) and any unrecognized byte.
        return StatusWord::WrongPayload;
    }
    if request.khl != KH_SIZE {
        return StatusWord::WrongPayload;
    }
    let Some(handle) = KeyHandle::from_bytes(request.key_handle) else {
        return StatusWord::WrongPayload;
    };
    if !key_handle::verify(device, &handle, &request.app_id) {
        return StatusWord::WrongPayload;
    }
    if key_handle::load_private(device, &handle).is_err() {
        return StatusWord::WrongPayload;
    }

    if !device.test_user_presence() {
        tracing::warn!(status = "CONDITIONS_NOT_SATISFIED", "authenticate-sign: presence denied");
        return StatusWord::ConditionsNotSatisfied;
    }

    let count = match device.increment_and_read_counter() {
        Ok(count) => count,
        Err(err) => {
            tracing::warn!(status = "INSUFFICIENT_MEMORY", error = %err, "authenticate-sign: counter exhausted");
            return StatusWord::InsufficientMemory;
        }
    };
    let count_be = count.to_be_bytes();
    let user_presence_byte = 0x01u8;

    // Assertion hash: app_id ‖ presence ‖ count_be ‖ challenge.
    let assertion_hash = Sha256Stream::new()
        .update(&request.app_id)
        .update(&[user_presence_byte])
        .update(&count_be)
        .update(&request.challenge)
        .finalize();

    let (r, s) = match device.sign_with_handle(&handle, &assertion_hash) {
        Ok(sig) => sig,
        Err(err) => {
            tracing::error!(error = %err, "authenticate-sign: signing failed after presence and counter committed");
            panic!("handle signing is expected to always succeed for a verified handle");
        }
    };
    let der_signature = der::encode(&r, &s);

    writer.append(&[user_presence_byte]);
    writer.append(&count_be);
    writer.append(der_signature.as_bytes());

    StatusWord::NoError
}
