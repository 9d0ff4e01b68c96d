//
// Copyright (c) 2026 u2f-core contributors
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//

//! DER encoding of a raw ECDSA `(r, s)` pair.
//!
//! The spec pins down the exact encoding rules (leading-zero stripping,
//! sign-bit padding), so this is hand-coded against the spec rather
//! than delegated to a general-purpose ASN.1 crate — the algorithm
//! itself is the deliverable here, not an implementation detail.

/// Largest possible DER encoding of a P-256 `(r, s)` pair: two 33-byte
/// `INTEGER`s (sign-padded) plus their tag/length bytes, plus the outer
/// `SEQUENCE` tag/length.
pub const MAX_DER_SIGNATURE_SIZE: usize = 72;

/// A DER-encoded signature in a fixed, stack-allocated buffer.
pub struct DerSignature {
    buf: [u8; MAX_DER_SIGNATURE_SIZE],
    len: usize,
}

impl DerSignature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// Encode raw `(r, s)` (each 32 bytes, big-endian) as
/// `SEQUENCE { INTEGER r, INTEGER s }`.
pub fn encode(r: &[u8; 32], s: &[u8; 32]) -> DerSignature {
    let mut buf = [0u8; MAX_DER_SIGNATURE_SIZE];
    let mut len = 0usize;

    let r_int = encode_integer(r);
    let s_int = encode_integer(s);
    let body_len = r_int.len() + s_int.len();

    buf[len] = 0x30; // SEQUENCE
    len += 1;
    buf[len] = body_len as u8;
    len += 1;
    buf[len..len + r_int.len()].copy_from_slice(r_int.as_slice());
    len += r_int.len();
    buf[len..len + s_int.len()].copy_from_slice(s_int.as_slice());
    len += s_int.len();

    debug_assert!(len <= MAX_DER_SIGNATURE_SIZE);
    DerSignature { buf, len }
}

/// A single `INTEGER` TLV: tag, length, and up to 33 content bytes
/// (32 magnitude bytes plus at most one sign-padding byte).
struct IntegerTlv {
    bytes: [u8; 35],
    len: usize,
}

impl IntegerTlv {
    fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    fn len(&self) -> usize {
        self.len
    }
}

fn encode_integer(value: &[u8; 32]) -> IntegerTlv {
    // Strip leading 0x00 bytes, but keep at least one byte (value zero
    // encodes as a single 0x00).
    let mut start = 0;
    while start < value.len() - 1 && value[start] == 0 {
        start += 1;
    }
    let trimmed = &value[start..];

    let needs_pad = trimmed[0] & 0x80 != 0;
    let content_len = trimmed.len() + usize::from(needs_pad);

    let mut bytes = [0u8; 35];
    bytes[0] = 0x02; // INTEGER
    bytes[1] = content_len as u8;
    let mut pos = 2;
    if needs_pad {
        bytes[pos] = 0x00;
        pos += 1;
    }
    bytes[pos..pos + trimmed.len()].copy_from_slice(trimmed);
    pos += trimmed.len();

    IntegerTlv { bytes, len: pos }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_strip_leading_zeros() {
        let mut r = [0u8; 32];
        r[31] = 0x01;
        let mut s = [0u8; 32];
        s[31] = 0x02;

        let der = encode(&r, &s);
        // SEQUENCE, len=6, INTEGER len=1 val=01, INTEGER len=1 val=02
        assert_eq!(der.as_bytes(), &[0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02]);
    }

    #[test]
    fn high_bit_values_get_sign_padding() {
        let r = [0xffu8; 32];
        let s = [0x80u8; 32];

        let der = encode(&r, &s);
        assert_eq!(der.as_bytes()[0], 0x30);
        // Each integer needed a leading 0x00 pad, so content is 33 bytes
        // each: 0x02, 33, 0x00, <32 bytes>.
        let r_tlv = &der.as_bytes()[2..2 + 35];
        assert_eq!(r_tlv[0], 0x02);
        assert_eq!(r_tlv[1], 33);
        assert_eq!(r_tlv[2], 0x00);
    }

    #[test]
    fn zero_value_encodes_as_single_zero_byte() {
        let zero = [0u8; 32];
        let der = encode(&zero, &zero);
        assert_eq!(der.as_bytes(), &[0x30, 0x06, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00]);
    }

    #[test]
    fn never_exceeds_max_size() {
        let r = [0xffu8; 32];
        let s = [0xffu8; 32];
        let der = encode(&r, &s);
        assert!(der.as_bytes().len() <= MAX_DER_SIGNATURE_SIZE);
    }
}
