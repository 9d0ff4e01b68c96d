//
// Copyright (c) 2026 u2f-core contributors
// This source code is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at https://mozilla.org/MPL/2.0/.
//

//! Response Writer.
//!
//! The original firmware binds a process-wide pointer to the current
//! response buffer. Here the binding is an explicit value with a
//! lifetime tied to one request, passed through the dispatcher and
//! handlers by `&mut` reference — no global, no aliasing.

/// An append-only cursor over a caller-owned buffer.
///
/// `append` is fail-stop on overflow: callers size the buffer to be
/// statically sufficient for every valid response, so an overflow can
/// only mean a firmware bug, not a malformed request — it is never
/// surfaced as a `StatusWord`.
pub struct ResponseWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> ResponseWriter<'a> {
    /// Bind to `buf`, resetting the write cursor to the start.
    pub fn bind(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    /// Append `bytes` to the response. Aborts if doing so would exceed
    /// the bound buffer's capacity.
    pub fn append(&mut self, bytes: &[u8]) {
        let end = self.len + bytes.len();
        assert!(
            end <= self.buf.len(),
            "response writer overflow: {} bytes requested, {} remaining",
            bytes.len(),
            self.buf.len() - self.len
        );
        self.buf[self.len..end].copy_from_slice(bytes);
        self.len = end;
    }

    /// Discard everything written so far without rebinding: the
    /// dispatcher clears partial data before appending an error status
    /// word.
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// The bytes written since the last `bind`/`reset`.
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes remaining before the next `append` would abort.
    pub fn remaining_capacity(&self) -> usize {
        self.buf.len() - self.len
    }
}
