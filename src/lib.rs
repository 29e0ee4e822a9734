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

//! Streaming conversion of legacy `text/enriched` and `text/richtext` mail
//! bodies (RFC 1896 and its predecessor) into HTML markup.
//!
//! The converter is an incremental filter: raw message bytes go in one chunk
//! at a time, HTML bytes come out, and any input that cannot be resolved yet
//! (an unterminated `<command>`, a space run that might continue in the next
//! chunk) is retained internally and logically prepended to the next call.
//! Feeding a message through any sequence of [`EnrichedToHtml::push`] calls
//! followed by [`EnrichedToHtml::finish`] produces output byte-identical to
//! a single `finish` over the whole body.
//!
//! This crate performs no sanitisation of the produced markup and has no
//! rendering or I/O surface of its own; it is meant to sit inside a mail
//! rendering pipeline which supplies the part's bytes and consumes HTML.

pub mod mime;
pub mod support;

pub use crate::mime::enriched::{
    enriched_to_html, EnrichedFlags, EnrichedToHtml,
};
