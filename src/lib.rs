//
// Copyright (c) 2026 u2f-core contributors
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//

//! Core of a FIDO U2F (Universal 2nd Factor) authenticator: a request
//! dispatcher plus the Register and Authenticate command handlers that
//! turn APDU-framed requests into signed attestations and assertions.
//!
//! This crate owns none of its own transport, persistent storage, or
//! user-presence hardware — those live behind the [`device::Device`]
//! trait, a narrow seam an embedder implements against real hardware.
//! [`device::SoftwareDevice`] is an in-process reference implementation
//! used by this crate's own tests, benches, and demo.
//!
//! Data flow: transport → [`dispatcher::Dispatcher`] →
//! (Register | Authenticate | Version) → [`response::ResponseWriter`] →
//! transport.

pub mod authenticate;
pub mod crypto;
pub mod der;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod key_handle;
pub mod register;
pub mod response;

pub use authenticate::{AuthenticateRequest, Control};
pub use device::{Device, SoftwareDevice};
pub use dispatcher::{Apdu, Dispatcher, StatusWord};
pub use key_handle::KeyHandle;
pub use register::RegisterRequest;
pub use response::ResponseWriter;

/// Random seed-material bytes in a key handle.
pub const KH_KEY_SIZE: usize = 32;
/// HMAC tag bytes in a key handle.
pub const KH_TAG_SIZE: usize = 32;
/// Total on-wire key-handle size: fixed by the §8 worked example
/// (S3's `0x40` key-handle-length byte = 64 decimal).
pub const KH_SIZE: usize = KH_KEY_SIZE + KH_TAG_SIZE;

/// A response buffer capacity comfortably above any single response
/// this core emits (Register's being the largest: `2 + 64 + 1 + KH_SIZE
/// + attestation_cert.len() + 72`). Embedders with very large
/// attestation certificates should size their own buffer explicitly
/// rather than rely on this constant.
pub const RESPONSE_CAPACITY: usize = 512;
