//-
// Copyright (c) 2026, the enriched2html authors
//
// This file is part of enriched2html.
//
// Enriched2html is free software: you can redistribute it and/or modify it
// under the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Enriched2html is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License
// for more details.
//
// You should have received a copy of the GNU General Public License along
// with enriched2html. If not, see <http://www.gnu.org/licenses/>.

//! Owned, growable output buffer with explicit free-capacity accounting.
//!
//! The transcoder wants tighter control over allocation than a bare `Vec`
//! gives it: writes must be all-or-nothing against the capacity present at
//! the start of a scan, so that an atomic emission (one entity, one tag
//! replacement, one collapsed space run) is never half-written when the
//! buffer fills up. Capacity only changes at the points where the filter's
//! backtrack policy says it may.

/// A byte buffer whose visible payload is preceded by an optional reserved
/// "prespace" region.
///
/// The prespace allows a downstream consumer to prepend a small header (for
/// example a part banner emitted by a mail renderer) in front of already
/// produced output without copying the payload.
#[derive(Debug)]
pub struct OutputBuffer {
    data: Vec<u8>,
    /// Bytes reserved at the front of `data` ahead of the payload.
    prespace: usize,
    /// How much of the prespace reservation is currently claimed.
    prepended: usize,
}

impl OutputBuffer {
    /// Create an empty buffer with no prespace reservation.
    pub fn new() -> Self {
        OutputBuffer::with_prespace(0)
    }

    /// Create an empty buffer reserving `prespace` bytes ahead of the
    /// payload.
    pub fn with_prespace(prespace: usize) -> Self {
        OutputBuffer {
            data: vec![0; prespace],
            prespace,
            prepended: 0,
        }
    }

    /// Returns the number of bytes that can be written without growing.
    pub fn available(&self) -> usize {
        self.data.capacity() - self.data.len()
    }

    /// Returns the length of the visible payload.
    pub fn len(&self) -> usize {
        self.data.len() - (self.prespace - self.prepended)
    }

    pub fn is_empty(&self) -> bool {
        0 == self.len()
    }

    /// Ensure at least `n` bytes can be written without growing.
    pub fn ensure_available(&mut self, n: usize) {
        self.data.reserve(n);
    }

    /// Grow the buffer so that at least `extra` bytes more than the current
    /// free capacity can be written.
    ///
    /// Unlike `ensure_available`, this always makes progress when called
    /// repeatedly with the same argument.
    pub fn grow(&mut self, extra: usize) {
        let target = self.available() + extra;
        self.data.reserve(target);
    }

    /// Append `bytes` if they fit in the current free capacity.
    ///
    /// Returns whether the write happened; nothing is written on `false`.
    pub fn write(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() <= self.available() {
            self.data.extend_from_slice(bytes);
            true
        } else {
            false
        }
    }

    /// Claim the tail of the prespace reservation for `bytes`, placing them
    /// immediately ahead of the current payload.
    ///
    /// Returns `false` (writing nothing) if the unclaimed reservation is too
    /// small.
    pub fn prepend(&mut self, bytes: &[u8]) -> bool {
        let free = self.prespace - self.prepended;
        if bytes.len() > free {
            return false;
        }

        let start = free - bytes.len();
        self.data[start..free].copy_from_slice(bytes);
        self.prepended += bytes.len();
        true
    }

    /// The visible payload: anything prepended, then everything written.
    pub fn payload(&self) -> &[u8] {
        &self.data[self.prespace - self.prepended..]
    }

    /// Discard the payload and any prepended bytes, retaining capacity.
    pub fn clear(&mut self) {
        self.data.truncate(self.prespace);
        self.prepended = 0;
    }
}
