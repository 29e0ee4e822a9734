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

//! The incremental scanning engine and its public driver.
//!
//! One call processes `backlog ++ chunk` in a single forward pass. The scan
//! advances one *atomic unit* at a time: a literal byte, one entity, one tag
//! replacement, or one collapsed run of spaces or newlines. A unit either
//! completes or doesn't happen at all; when it cannot complete, the scan
//! rewinds to the start of the unit and the backtrack policy decides what
//! happens next. Mid-stream, the unresolved tail becomes the backlog for the
//! next call. At the final call the output buffer is grown instead, so that
//! processing always runs to completion; only an unterminated `<command`
//! with no closing `>` is abandoned at that point.

use std::borrow::Cow;
use std::mem;

use bitflags::bitflags;
use log::trace;
use memchr::memchr;

use super::tags;
use crate::support::buffer::OutputBuffer;

bitflags! {
    /// Flags selecting the conversion dialect.
    pub struct EnrichedFlags: u32 {
        /// The input is `text/richtext` rather than `text/enriched`.
        ///
        /// Richtext predates the doubled-`<` escape; it spells a literal
        /// `<` as `<lt>` and a hard break as `<nl>`, and its newlines are
        /// always soft.
        const IS_RICHTEXT = 1 << 0;
    }
}

const BR: &[u8] = b"<br>";
const NBSP: &[u8] = b"&nbsp;";
const PARAM_OPEN: &[u8] = b"<param>";
const PARAM_CLOSE: &[u8] = b"</param>";

/// Result of attempting one atomic unit of the scan.
enum ScanOutcome {
    /// The unit was emitted and the scan position advanced past it.
    Continue,
    /// The unit cannot be resolved without seeing more input. The scan
    /// position was not advanced.
    NeedMoreInput,
    /// The unit's emission does not fit in the free output capacity. The
    /// scan position was not advanced.
    NeedMoreOutputSpace,
}

/// Streaming `text/enriched` / `text/richtext` to HTML converter.
///
/// One instance converts one logical message part: zero or more
/// [`push`](Self::push) calls followed by exactly one
/// [`finish`](Self::finish). After `finish` the instance may be
/// [`reset`](Self::reset) and reused for another part. Instances are not
/// meant to be shared between streams; give each its own.
///
/// ```
/// use enriched2html::{EnrichedFlags, EnrichedToHtml};
///
/// let mut filter = EnrichedToHtml::new(EnrichedFlags::empty());
/// let mut html = filter.push(b"Hello<bold").to_vec();
/// html.extend_from_slice(filter.finish(b"> World</bold>"));
/// assert_eq!(b"Hello<b> World</b>", &html[..]);
/// ```
pub struct EnrichedToHtml {
    flags: EnrichedFlags,
    /// Nesting depth of `<nofill>` directives. While positive, newlines are
    /// individually significant.
    nofill_depth: u32,
    output: OutputBuffer,
    /// Unconsumed tail of the previous call, logically prepended to the
    /// next chunk.
    backlog: Vec<u8>,
    dropped: u64,
}

impl EnrichedToHtml {
    pub fn new(flags: EnrichedFlags) -> Self {
        EnrichedToHtml {
            flags,
            nofill_depth: 0,
            output: OutputBuffer::new(),
            backlog: Vec::new(),
            dropped: 0,
        }
    }

    /// Feed a non-final chunk.
    ///
    /// Returns the output produced by this call, valid until the next call
    /// on this instance. Input that cannot be resolved yet is retained and
    /// will be consumed by a later `push` or by `finish`.
    pub fn push(&mut self, chunk: &[u8]) -> &[u8] {
        self.transform(chunk, false);
        self.output.payload()
    }

    /// Feed the final chunk (which may be empty) and flush.
    ///
    /// All retained input is resolved; the output buffer is grown as needed
    /// rather than carrying anything over. A command still unterminated at
    /// the end of the stream is dropped.
    pub fn finish(&mut self, chunk: &[u8]) -> &[u8] {
        self.transform(chunk, true);
        self.output.payload()
    }

    /// Prepare the instance for converting another part.
    ///
    /// Clears the nofill depth, the backlog, and the diagnostic counter.
    /// Output buffer capacity is retained.
    pub fn reset(&mut self) {
        self.nofill_depth = 0;
        self.backlog.clear();
        self.output.clear();
        self.dropped = 0;
    }

    /// Number of input constructs silently dropped so far: unknown
    /// commands, parameterised commands with a missing or malformed
    /// `<param>` wrapper, and a command left unterminated at `finish`.
    pub fn dropped_tokens(&self) -> u64 {
        self.dropped
    }

    fn is_richtext(&self) -> bool {
        self.flags.contains(EnrichedFlags::IS_RICHTEXT)
    }

    fn transform(&mut self, chunk: &[u8], is_final: bool) {
        let input: Cow<[u8]> = if self.backlog.is_empty() {
            Cow::Borrowed(chunk)
        } else {
            let mut combined = mem::replace(&mut self.backlog, Vec::new());
            combined.extend_from_slice(chunk);
            Cow::Owned(combined)
        };

        self.output.clear();
        self.output.ensure_available(2 * input.len() + 6);

        let mut pos = 0;
        while pos < input.len() {
            let unit_start = pos;
            match self.scan_unit(&input, &mut pos, is_final) {
                ScanOutcome::Continue => (),

                ScanOutcome::NeedMoreInput => {
                    if is_final {
                        // Unterminated command at the end of the stream;
                        // nothing useful can be made of the tail.
                        self.dropped += 1;
                        trace!(
                            "dropping unterminated {}-byte tail at flush",
                            input.len() - unit_start
                        );
                        return;
                    }

                    self.backlog = input[unit_start..].to_vec();
                    trace!("retaining {}-byte backlog", self.backlog.len());
                    return;
                },

                ScanOutcome::NeedMoreOutputSpace => {
                    pos = unit_start;
                    if is_final {
                        let extra = 2 * (input.len() - pos) + 20;
                        trace!("growing output buffer by {}", extra);
                        self.output.grow(extra);
                    } else {
                        self.backlog = input[unit_start..].to_vec();
                        trace!(
                            "output full, retaining {}-byte backlog",
                            self.backlog.len()
                        );
                        return;
                    }
                },
            }
        }
    }

    fn scan_unit(
        &mut self,
        input: &[u8],
        pos: &mut usize,
        is_final: bool,
    ) -> ScanOutcome {
        match input[*pos] {
            b' ' => self.scan_spaces(input, pos, is_final),
            b'\n' => self.scan_newlines(input, pos, is_final),
            b'>' => self.emit(pos, 1, b"&gt;"),
            b'&' => self.emit(pos, 1, b"&amp;"),
            b'<' => self.scan_command(input, pos, is_final),
            _ => self.scan_literals(input, pos),
        }
    }

    /// Emit `bytes` for a unit spanning `consumed` input bytes, if they fit.
    fn emit(
        &mut self,
        pos: &mut usize,
        consumed: usize,
        bytes: &[u8],
    ) -> ScanOutcome {
        if self.output.write(bytes) {
            *pos += consumed;
            ScanOutcome::Continue
        } else {
            ScanOutcome::NeedMoreOutputSpace
        }
    }

    /// Copy as much of the current run of ordinary bytes as fits. Each
    /// literal byte is its own atomic unit, so a partial copy is fine; the
    /// next iteration picks up where this one stopped.
    fn scan_literals(&mut self, input: &[u8], pos: &mut usize) -> ScanOutcome {
        let rest = &input[*pos..];
        let run = rest
            .iter()
            .position(|&b| {
                b' ' == b || b'\n' == b || b'<' == b || b'>' == b || b'&' == b
            })
            .unwrap_or(rest.len());

        let take = run.min(self.output.available());
        if 0 == take {
            return ScanOutcome::NeedMoreOutputSpace;
        }

        self.output.write(&rest[..take]);
        *pos += take;
        ScanOutcome::Continue
    }

    /// A run of n >= 2 spaces collapses to n-1 non-breaking spaces plus one
    /// ordinary space, as a single atomic unit.
    fn scan_spaces(
        &mut self,
        input: &[u8],
        pos: &mut usize,
        is_final: bool,
    ) -> ScanOutcome {
        let rest = &input[*pos..];
        let run = rest
            .iter()
            .position(|&b| b' ' != b)
            .unwrap_or(rest.len());

        // A run touching the end of a non-final chunk may yet grow, which
        // would change the collapse.
        if run == rest.len() && !is_final {
            return ScanOutcome::NeedMoreInput;
        }

        if 1 == run {
            return self.emit(pos, 1, b" ");
        }

        if self.output.available() < NBSP.len() * (run - 1) + 1 {
            return ScanOutcome::NeedMoreOutputSpace;
        }
        for _ in 1..run {
            self.output.write(NBSP);
        }
        self.output.write(b" ");
        *pos += run;
        ScanOutcome::Continue
    }

    fn scan_newlines(
        &mut self,
        input: &[u8],
        pos: &mut usize,
        is_final: bool,
    ) -> ScanOutcome {
        // Richtext newlines are always soft.
        if self.is_richtext() {
            return self.emit(pos, 1, b" ");
        }

        // Inside <nofill>, every newline is a hard break on its own; no
        // lookahead is involved.
        if self.nofill_depth > 0 {
            return self.emit(pos, 1, BR);
        }

        let rest = &input[*pos..];
        let run = rest
            .iter()
            .position(|&b| b'\n' != b)
            .unwrap_or(rest.len());

        if run == rest.len() && !is_final {
            return ScanOutcome::NeedMoreInput;
        }

        // A lone newline is a soft wrap; a run of n >= 2 becomes n hard
        // breaks, as a single atomic unit.
        if 1 == run {
            return self.emit(pos, 1, b" ");
        }

        if self.output.available() < BR.len() * run {
            return ScanOutcome::NeedMoreOutputSpace;
        }
        for _ in 0..run {
            self.output.write(BR);
        }
        *pos += run;
        ScanOutcome::Continue
    }

    /// Handle a `<`: the escapes, the state-only `nofill` directives, and
    /// table-driven command replacement.
    fn scan_command(
        &mut self,
        input: &[u8],
        pos: &mut usize,
        is_final: bool,
    ) -> ScanOutcome {
        let rest = &input[*pos..];

        if self.is_richtext() {
            // Richtext spells a literal '<' as the exact sequence <lt> and
            // a hard break as <nl>.
            if rest.len() >= 4 {
                if b"lt>" == &rest[1..4] {
                    return self.emit(pos, 4, b"&lt;");
                }
                if b"nl>" == &rest[1..4] {
                    return self.emit(pos, 4, BR);
                }
            }
        } else if rest.len() >= 2 && b'<' == rest[1] {
            // Enriched escapes a literal '<' by doubling it.
            return self.emit(pos, 2, b"&lt;");
        }

        let close = match memchr(b'>', &rest[1..]) {
            Some(ix) => 1 + ix,
            // No closing '>' yet. Mid-stream this becomes backlog; at the
            // final flush the caller drops the tail.
            None => return ScanOutcome::NeedMoreInput,
        };
        let token = &rest[1..close];
        let after_tag = *pos + close + 1;

        if token.eq_ignore_ascii_case(b"nofill") {
            self.nofill_depth += 1;
            *pos = after_tag;
            return ScanOutcome::Continue;
        }
        if token.eq_ignore_ascii_case(b"/nofill") {
            // An unmatched /nofill clamps at zero instead of driving the
            // depth negative.
            self.nofill_depth = self.nofill_depth.saturating_sub(1);
            *pos = after_tag;
            return ScanOutcome::Continue;
        }

        let entry = match tags::lookup(token) {
            Some(entry) => entry,
            None => {
                self.dropped += 1;
                *pos = after_tag;
                return ScanOutcome::Continue;
            },
        };

        if !entry.needs_param() {
            return self.emit(pos, close + 1, entry.replacement.as_bytes());
        }

        self.scan_param(input, pos, is_final, after_tag, entry)
    }

    /// A parameterised command expects `<param>...</param>` immediately
    /// after its closing `>`. If there is not yet enough input to decide
    /// whether the wrapper is there and complete, the whole unit (from the
    /// command's own `<`) is deferred. Once decidable, a missing or
    /// malformed wrapper means the command is ignored: only the command
    /// itself is consumed and the scan continues at `after_tag`.
    fn scan_param(
        &mut self,
        input: &[u8],
        pos: &mut usize,
        is_final: bool,
        after_tag: usize,
        entry: &tags::TagEntry,
    ) -> ScanOutcome {
        let after = &input[after_tag..];

        if after.len() < PARAM_OPEN.len() {
            if !is_final {
                return ScanOutcome::NeedMoreInput;
            }
            // The stream ends before a wrapper could fit.
            return self.ignore_command(pos, after_tag);
        }
        if !after[..PARAM_OPEN.len()].eq_ignore_ascii_case(PARAM_OPEN) {
            return self.ignore_command(pos, after_tag);
        }

        let inner_start = PARAM_OPEN.len();
        let inner_end = match memchr(b'<', &after[inner_start..]) {
            Some(ix) => inner_start + ix,
            None => {
                if !is_final {
                    return ScanOutcome::NeedMoreInput;
                }
                return self.ignore_command(pos, after_tag);
            },
        };

        if after.len() - inner_end < PARAM_CLOSE.len() {
            if !is_final {
                return ScanOutcome::NeedMoreInput;
            }
            return self.ignore_command(pos, after_tag);
        }
        if !after[inner_end..inner_end + PARAM_CLOSE.len()]
            .eq_ignore_ascii_case(PARAM_CLOSE)
        {
            return self.ignore_command(pos, after_tag);
        }

        let param = entry
            .validator
            .map(|v| v.validate(&after[inner_start..inner_end]))
            .unwrap_or_default();

        let template = entry.replacement.as_bytes();
        let slot = entry
            .replacement
            .find("%s")
            .expect("needs_param() entry without a %s slot");
        let mut emitted =
            Vec::with_capacity(template.len() - 2 + param.len());
        emitted.extend_from_slice(&template[..slot]);
        emitted.extend_from_slice(&param);
        emitted.extend_from_slice(&template[slot + 2..]);

        let consumed =
            after_tag - *pos + inner_end + PARAM_CLOSE.len();
        self.emit(pos, consumed, &emitted)
    }

    fn ignore_command(
        &mut self,
        pos: &mut usize,
        after_tag: usize,
    ) -> ScanOutcome {
        self.dropped += 1;
        *pos = after_tag;
        ScanOutcome::Continue
    }
}

/// One-shot conversion of a complete body.
///
/// Equivalent to `new` followed by a single `finish`.
pub fn enriched_to_html(text: &str, flags: EnrichedFlags) -> String {
    let mut filter = EnrichedToHtml::new(flags);
    let html = filter.finish(text.as_bytes()).to_vec();
    // Only ASCII markup is inserted, dropped spans are delimited by ASCII,
    // and everything else passes through intact, so valid UTF-8 in means
    // valid UTF-8 out.
    String::from_utf8(html).expect("transcoder emitted invalid UTF-8")
}
