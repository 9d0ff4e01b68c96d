//
// Copyright (c) 2026 u2f-core contributors
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//

//! Dispatcher: APDU header validation, instruction
//! demultiplex, status-word finalization.
//!
//! Grounded on `original_source/fido2/u2f.c::u2f_request`: class check
//! first, an optional vendor hook next, then the instruction demux,
//! response-data reset on any error status, and the two-byte status
//! word appended last.

use crate::authenticate::{self, AuthenticateRequest, Control};
use crate::device::Device;
use crate::register::{self, RegisterRequest};
use crate::response::ResponseWriter;

/// One byte, `ins`.
pub const INS_REGISTER: u8 = 0x01;
pub const INS_AUTHENTICATE: u8 = 0x02;
pub const INS_VERSION: u8 = 0x03;
const INS_VENDOR_FIRST: u8 = 0x40;
const INS_VENDOR_LAST: u8 = 0xBF;

const VERSION_STRING: &[u8; 6] = b"U2F_V2";

/// Big-endian `u16` status words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusWord {
    NoError,
    ConditionsNotSatisfied,
    WrongData,
    WrongLength,
    WrongPayload,
    ClassNotSupported,
    InsNotSupported,
    InsufficientMemory,
}

impl StatusWord {
    pub fn code(self) -> u16 {
        match self {
            StatusWord::NoError => 0x9000,
            StatusWord::ConditionsNotSatisfied => 0x6985,
            StatusWord::WrongData => 0x6A80,
            StatusWord::WrongLength => 0x6700,
            StatusWord::WrongPayload => 0x6A80, // same class as WrongData in U2F
            StatusWord::ClassNotSupported => 0x6E00,
            StatusWord::InsNotSupported => 0x6D00,
            StatusWord::InsufficientMemory => 0x6A84,
        }
    }

    fn is_error(self) -> bool {
        !matches!(self, StatusWord::NoError)
    }
}

/// A fully-assembled request APDU. Framing/transport is out
/// of scope (§1); this is the boundary the transport hands buffers
/// across.
pub struct Apdu<'a> {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub payload: &'a [u8],
}

impl<'a> Apdu<'a> {
    /// Parse `cla ‖ ins ‖ p1 ‖ p2 ‖ lc(3, big-endian) ‖ payload` — the
    /// fixed-header framing. Returns `None` if the buffer is shorter
    /// than the header or `lc` overruns it; the dispatcher has no
    /// status word for a malformed frame because framing is the
    /// transport's contract to uphold, not the core's.
    pub fn parse(buf: &'a [u8]) -> Option<Self> {
        if buf.len() < 7 {
            return None;
        }
        let cla = buf[0];
        let ins = buf[1];
        let p1 = buf[2];
        let p2 = buf[3];
        let lc = u32::from_be_bytes([0, buf[4], buf[5], buf[6]]) as usize;
        let payload = buf.get(7..7 + lc)?;
        Some(Self { cla, ins, p1, p2, payload })
    }
}

/// Signature of an optional vendor-extension hook ("optional
/// vendor extensions... treated as opaque side-channels"; SPEC_FULL.md
/// Supplemental Features, grounded on `extend_u2f` /
/// `ENABLE_U2F_EXTENSIONS` in the original firmware). Returning `None`
/// means "not a vendor command, continue dispatching normally"; a
/// `Some` carrying a non-`NO_ERROR` status short-circuits with that
/// status, per spec §4.1 step 3. A `Some(StatusWord::NoError)` is not
/// treated as handled and falls through to the ordinary instruction
/// demux.
pub type VendorHook<'a> = dyn Fn(&Apdu<'_>) -> Option<StatusWord> + 'a;

/// Binds a [`Device`] and an optional vendor hook, and dispatches APDUs
/// against them.
pub struct Dispatcher<'a, D: Device> {
    device: D,
    vendor_hook: Option<Box<VendorHook<'a>>>,
}

impl<'a, D: Device> Dispatcher<'a, D> {
    pub fn new(device: D) -> Self {
        Self { device, vendor_hook: None }
    }

    pub fn with_vendor_hook(device: D, hook: Box<VendorHook<'a>>) -> Self {
        Self {
            device,
            vendor_hook: Some(hook),
        }
    }

    /// Execute the dispatch algorithm end to end: populate
    /// `response_buffer` with response data (possibly empty) followed
    /// by the two-byte big-endian status word.
    pub fn dispatch(&self, apdu: &Apdu<'_>, response_buffer: &mut [u8]) -> StatusWord {
        let span = tracing::debug_span!("u2f_dispatch", ins = apdu.ins, p1 = apdu.p1);
        let _guard = span.enter();

        let mut writer = ResponseWriter::bind(response_buffer);

        let status = self.route(apdu, &mut writer);

        if status.is_error() {
            tracing::warn!(status = status.code(), "request ended in protocol error");
            writer.reset();
        }
        writer.append(&status.code().to_be_bytes());
        status
    }

    fn route(&self, apdu: &Apdu<'_>, writer: &mut ResponseWriter<'_>) -> StatusWord {
        if apdu.cla != 0 {
            return StatusWord::ClassNotSupported;
        }

        if let Some(hook) = &self.vendor_hook {
            // Per spec §4.1 step 3, only a non-NO_ERROR result counts as
            // "handled"; a hook returning `Some(NoError)` falls through
            // to the ordinary instruction demux below.
            if let Some(status) = hook(apdu) {
                if status.is_error() {
                    return status;
                }
            }
        }

        match apdu.ins {
            INS_REGISTER => {
                if apdu.payload.len() != 64 {
                    return StatusWord::WrongLength;
                }
                let Some(request) = RegisterRequest::parse(apdu.payload) else {
                    return StatusWord::WrongLength;
                };
                register::register(&self.device, &request, writer)
            }
            INS_AUTHENTICATE => {
                let Some(request) = AuthenticateRequest::parse(apdu.payload) else {
                    return StatusWord::WrongPayload;
                };
                let control = Control::from(apdu.p1);
                authenticate::authenticate(&self.device, &request, control, writer)
            }
            INS_VERSION => {
                if !apdu.payload.is_empty() {
                    return StatusWord::WrongLength;
                }
                writer.append(VERSION_STRING);
                StatusWord::NoError
            }
            ins if (INS_VENDOR_FIRST..=INS_VENDOR_LAST).contains(&ins) => StatusWord::NoError,
            _ => StatusWord::InsNotSupported,
        }
    }
}
