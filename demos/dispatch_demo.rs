//
// Copyright (c) 2026 u2f-core contributors
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//

//! Standalone demonstration of the dispatcher driving a
//! [`SoftwareDevice`] through Register, Authenticate-Check, and
//! Authenticate-Sign, printing the status word from each step.
//!
//! Lives under `demos/` rather than `examples/` — this workspace's
//! `examples/` path is reserved for the read-only retrieval pack this
//! crate was built from.

use tracing_subscriber::EnvFilter;
use u2f_core::dispatcher::{INS_AUTHENTICATE, INS_REGISTER};
use u2f_core::{Apdu, Dispatcher, SoftwareDevice};

fn apdu_bytes(ins: u8, p1: u8, payload: &[u8]) -> Vec<u8> {
    let lc = payload.len() as u32;
    let lc_bytes = lc.to_be_bytes();
    let mut out = vec![0x00, ins, p1, 0x00, lc_bytes[1], lc_bytes[2], lc_bytes[3]];
    out.extend_from_slice(payload);
    out
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let dispatcher = Dispatcher::new(SoftwareDevice::for_testing());
    let challenge = [0xAA; 32];
    let app_id = u2f_core::crypto::sha256(b"example.com");

    let mut register_payload = Vec::new();
    register_payload.extend_from_slice(&challenge);
    register_payload.extend_from_slice(&app_id);
    let req = apdu_bytes(INS_REGISTER, 0x00, &register_payload);
    let apdu = Apdu::parse(&req).expect("well-formed demo APDU");
    let mut reg_buf = [0u8; u2f_core::RESPONSE_CAPACITY];
    let status = dispatcher.dispatch(&apdu, &mut reg_buf);
    println!("register: status=0x{:04x}", status.code());

    let khl = reg_buf[2 + 64] as usize;
    let handle = reg_buf[2 + 64 + 1..2 + 64 + 1 + khl].to_vec();
    println!("register: key_handle={}", hex_encode(&handle));

    let mut auth_payload = Vec::new();
    auth_payload.extend_from_slice(&challenge);
    auth_payload.extend_from_slice(&app_id);
    auth_payload.push(handle.len() as u8);
    auth_payload.extend_from_slice(&handle);

    let check_req = apdu_bytes(INS_AUTHENTICATE, 0x07, &auth_payload);
    let check_apdu = Apdu::parse(&check_req).expect("well-formed demo APDU");
    let mut check_buf = [0u8; 16];
    let status = dispatcher.dispatch(&check_apdu, &mut check_buf);
    println!("authenticate-check: status=0x{:04x}", status.code());

    let sign_req = apdu_bytes(INS_AUTHENTICATE, 0x03, &auth_payload);
    let sign_apdu = Apdu::parse(&sign_req).expect("well-formed demo APDU");
    let mut sign_buf = [0u8; 128];
    let status = dispatcher.dispatch(&sign_apdu, &mut sign_buf);
    println!("authenticate-sign: status=0x{:04x}", status.code());
    let count = u32::from_be_bytes(sign_buf[1..5].try_into().unwrap());
    println!("authenticate-sign: counter={count}");
}
