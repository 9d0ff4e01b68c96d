//
// Copyright (c) 2026 u2f-core contributors
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//

//! Register Handler: realizes `U2F_REGISTER`.
//!
//! Grounded on `original_source/fido2/u2f.c::u2f_register`: presence
//! check, key-handle mint, attestation hash over the exact reserved-byte
//! / app_id / challenge / handle / point-format / public-key sequence,
//! attestation signature, then the `05 04 X Y len(handle) handle cert sig`
//! response layout.

use crate::crypto::Sha256Stream;
use crate::der;
use crate::device::Device;
use crate::dispatcher::StatusWord;
use crate::key_handle;
use crate::response::ResponseWriter;
use crate::KH_SIZE;

/// `challenge[32] ‖ app_id[32]`, the Register request payload.
pub struct RegisterRequest {
    pub challenge: [u8; 32],
    pub app_id: [u8; 32],
}

impl RegisterRequest {
    /// Parse a 64-byte Register payload. Callers (the dispatcher) are
    /// responsible for the `lc == 64` length check before calling this.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        if payload.len() != 64 {
            return None;
        }
        let mut challenge = [0u8; 32];
        let mut app_id = [0u8; 32];
        challenge.copy_from_slice(&payload[..32]);
        app_id.copy_from_slice(&payload[32..64]);
        Some(Self { challenge, app_id })
    }
}

/// Execute Register, writing its response through `writer` and
/// returning the terminal status word.
pub fn register(device: &impl Device, request: &RegisterRequest, writer: &mut ResponseWriter<'_>) -> StatusWord {
    if !device.test_user_presence() {
        tracing::warn!(status = "CONDITIONS_NOT_SATISFIED", "register: user presence denied");
        return StatusWord::ConditionsNotSatisfied;
    }

    let (handle, public_key) = match key_handle::mint(device, &request.app_id) {
        Ok(pair) => pair,
        Err(err) => {
            tracing::warn!(status = "INSUFFICIENT_MEMORY", error = %err, "register: mint failed");
            return StatusWord::InsufficientMemory;
        }
    };

    // Attestation hash: 0x00 ‖ app_id ‖ challenge ‖ handle ‖ 0x04 ‖ X ‖ Y.
    let attestation_hash = Sha256Stream::new()
        .update(&[0x00])
        .update(&request.app_id)
        .update(&request.challenge)
        .update(&handle.to_bytes())
        .update(&[0x04])
        .update(&public_key)
        .finalize();

    let (r, s) = match device.sign_with_attestation_key(&attestation_hash) {
        Ok(sig) => sig,
        Err(err) => {
            tracing::error!(error = %err, "register: attestation signing failed");
            panic!("attestation signing is expected to always succeed for well-formed input");
        }
    };
    let der_signature = der::encode(&r, &s);

    writer.append(&[0x05, 0x04]);
    writer.append(&public_key);
    writer.append(&[KH_SIZE as u8]);
    writer.append(&handle.to_bytes());
    writer.append(device.attestation_certificate());
    writer.append(der_signature.as_bytes());

    StatusWord::NoError
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::SoftwareDevice;
    use crate::key_handle::KeyHandle;

    fn fixed_request() -> RegisterRequest {
        RegisterRequest {
            challenge: [0xAA; 32],
            app_id: crate::crypto::sha256(b"example.com"),
        }
    }

    #[test]
    fn happy_path_emits_no_error_and_verifying_handle() {
        let device = SoftwareDevice::for_testing();
        let request = fixed_request();
        let mut buf = [0u8; crate::RESPONSE_CAPACITY];
        let mut writer = ResponseWriter::bind(&mut buf);

        let status = register(&device, &request, &mut writer);
        assert_eq!(status, StatusWord::NoError);
        assert!(!writer.is_empty());

        let written = writer.written();
        assert_eq!(written[0], 0x05);
        assert_eq!(written[1], 0x04);
        let khl = written[2 + 64] as usize;
        assert_eq!(khl, KH_SIZE);
        let handle_bytes = &written[2 + 64 + 1..2 + 64 + 1 + KH_SIZE];
        let handle = KeyHandle::from_bytes(handle_bytes).unwrap();
        assert!(key_handle::verify(&device, &handle, &request.app_id));
    }

    #[test]
    fn denied_presence_yields_conditions_not_satisfied_and_no_data() {
        let device = SoftwareDevice::for_testing();
        device.set_presence(false);
        let request = fixed_request();
        let mut buf = [0u8; crate::RESPONSE_CAPACITY];
        let mut writer = ResponseWriter::bind(&mut buf);

        let status = register(&device, &request, &mut writer);
        assert_eq!(status, StatusWord::ConditionsNotSatisfied);
        assert!(writer.is_empty());
    }

    #[test]
    fn two_registrations_mint_distinct_handles() {
        let device = SoftwareDevice::for_testing();
        let request = fixed_request();

        let mut buf1 = [0u8; crate::RESPONSE_CAPACITY];
        let mut w1 = ResponseWriter::bind(&mut buf1);
        register(&device, &request, &mut w1);
        let h1 = w1.written()[2 + 64 + 1..2 + 64 + 1 + KH_SIZE].to_vec();

        let mut buf2 = [0u8; crate::RESPONSE_CAPACITY];
        let mut w2 = ResponseWriter::bind(&mut buf2);
        register(&device, &request, &mut w2);
        let h2 = w2.written()[2 + 64 + 1..2 + 64 + 1 + KH_SIZE].to_vec();

        assert_ne!(h1, h2);
    }
}
