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

//! The fixed command-to-HTML replacement table and the parameter validators.
//!
//! `text/enriched` commands are matched case-insensitively. A replacement
//! template may contain a single `%s` slot, in which case the command takes
//! a `<param>...</param>` argument whose content is normalised by the
//! entry's validator before substitution. Validators are total; whatever the
//! parameter looks like, they produce something usable.

use std::collections::HashMap;
use std::str;

use lazy_static::lazy_static;

/// How the parameter of a parameterised command is normalised before being
/// substituted into the replacement template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamValidator {
    /// A colour name or `HHHH,HHHH,HHHH` triplet.
    Color,
    /// A font family name, copied up to the first delimiter.
    FontFamily,
    /// An RFC 1766 language tag, copied up to the first delimiter.
    Language,
}

/// One row of the replacement table.
#[derive(Clone, Copy, Debug)]
pub struct TagEntry {
    /// HTML to emit, possibly containing one `%s` substitution slot.
    pub replacement: &'static str,
    pub validator: Option<ParamValidator>,
}

impl TagEntry {
    /// Whether the command requires a `<param>` argument.
    pub fn needs_param(&self) -> bool {
        self.replacement.contains("%s")
    }
}

static TABLE: &[(&str, &str, Option<ParamValidator>)] = &[
    ("bold", "<b>", None),
    ("/bold", "</b>", None),
    ("italic", "<i>", None),
    ("/italic", "</i>", None),
    ("fixed", "<tt>", None),
    ("/fixed", "</tt>", None),
    ("smaller", "<font size=-1>", None),
    ("/smaller", "</font>", None),
    ("bigger", "<font size=+1>", None),
    ("/bigger", "</font>", None),
    ("underline", "<u>", None),
    ("/underline", "</u>", None),
    ("center", "<p align=center>", None),
    ("/center", "</p>", None),
    ("flushleft", "<p align=left>", None),
    ("/flushleft", "</p>", None),
    ("flushright", "<p align=right>", None),
    ("/flushright", "</p>", None),
    ("excerpt", "<blockquote>", None),
    ("/excerpt", "</blockquote>", None),
    ("paragraph", "<p>", None),
    ("signature", "<address>", None),
    ("/signature", "</address>", None),
    ("comment", "<!-- ", None),
    ("/comment", " -->", None),
    ("np", "<hr>", None),
    ("fontfamily", "<font face=\"%s\">", Some(ParamValidator::FontFamily)),
    ("/fontfamily", "</font>", None),
    ("color", "<font color=\"%s\">", Some(ParamValidator::Color)),
    ("/color", "</font>", None),
    ("lang", "<span lang=\"%s\">", Some(ParamValidator::Language)),
    ("/lang", "</span>", None),
    // paraindent takes a parameter in RFC 1896, but there is no HTML
    // equivalent for its value, so it degrades to a comment.
    ("paraindent", "<!-- ", None),
    ("/paraindent", " -->", None),
    // Stray <param> wrappers not claimed by a parameterised command also
    // degrade to comments.
    ("param", "<!-- ", None),
    ("/param", " -->", None),
];

lazy_static! {
    static ref TAGS: HashMap<&'static str, TagEntry> = TABLE
        .iter()
        .map(|&(token, replacement, validator)| {
            (
                token,
                TagEntry {
                    replacement,
                    validator,
                },
            )
        })
        .collect();
}

/// Look up `token` in the replacement table, case-insensitively.
///
/// `nofill` and `/nofill` are deliberately absent; they change filter state
/// instead of producing markup.
pub fn lookup(token: &[u8]) -> Option<&'static TagEntry> {
    let token = str::from_utf8(token).ok()?;
    TAGS.get(token.to_ascii_lowercase().as_str())
}

static COLOR_NAMES: &[&str] = &[
    "red", "green", "blue", "yellow", "cyan", "magenta", "black", "white",
];

impl ParamValidator {
    /// Normalise a raw parameter. Total; malformed input degrades to a
    /// best-effort or default value rather than an error.
    pub fn validate(self, raw: &[u8]) -> Vec<u8> {
        match self {
            ParamValidator::Color => validate_color(raw),
            ParamValidator::FontFamily | ParamValidator::Language => {
                copy_to_delimiter(raw)
            },
        }
    }
}

fn validate_color(raw: &[u8]) -> Vec<u8> {
    for name in COLOR_NAMES {
        if raw.eq_ignore_ascii_case(name.as_bytes()) {
            return name.as_bytes().to_vec();
        }
    }

    if let Some(rgb) = parse_color_triplet(raw) {
        return rgb;
    }

    // Not a known name or triplet; take a leading run of letters as a
    // best-effort colour name.
    let letters = raw
        .iter()
        .copied()
        .take_while(u8::is_ascii_alphabetic)
        .collect::<Vec<u8>>();
    if letters.is_empty() {
        b"black".to_vec()
    } else {
        letters
    }
}

/// Parse the RFC 1896 `HHHH,HHHH,HHHH` form: three comma-separated 16-bit
/// hex groups. Only the high byte of each group is significant; the result
/// is rendered as `#RRGGBB`.
fn parse_color_triplet(raw: &[u8]) -> Option<Vec<u8>> {
    if 14 != raw.len() || b',' != raw[4] || b',' != raw[9] {
        return None;
    }

    let mut out = Vec::with_capacity(7);
    out.push(b'#');
    for &start in &[0usize, 5, 10] {
        let group = str::from_utf8(&raw[start..start + 4]).ok()?;
        let value = u16::from_str_radix(group, 16).ok()?;
        out.extend_from_slice(format!("{:02X}", value >> 8).as_bytes());
    }

    Some(out)
}

fn copy_to_delimiter(raw: &[u8]) -> Vec<u8> {
    let end = raw
        .iter()
        .position(|&b| b'"' == b || b'<' == b || b'>' == b)
        .unwrap_or(raw.len());
    raw[..end].to_vec()
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!("<b>", lookup(b"bold").unwrap().replacement);
        assert_eq!("<b>", lookup(b"BOLD").unwrap().replacement);
        assert_eq!("</b>", lookup(b"/Bold").unwrap().replacement);
        assert!(lookup(b"frobnicate").is_none());
        assert!(lookup(b"nofill").is_none());
        assert!(lookup(b"/nofill").is_none());
        assert!(lookup(b"").is_none());
        assert!(lookup(b"\xFFbold").is_none());
    }

    #[test]
    fn needs_param_iff_slot_present() {
        assert!(lookup(b"color").unwrap().needs_param());
        assert!(lookup(b"fontfamily").unwrap().needs_param());
        assert!(lookup(b"lang").unwrap().needs_param());
        assert!(!lookup(b"/color").unwrap().needs_param());
        assert!(!lookup(b"paraindent").unwrap().needs_param());
        assert!(!lookup(b"param").unwrap().needs_param());
    }

    #[test]
    fn color_names() {
        assert_eq!(b"red".to_vec(), ParamValidator::Color.validate(b"Red"));
        assert_eq!(b"white".to_vec(), ParamValidator::Color.validate(b"WHITE"));
        assert_eq!(
            b"magenta".to_vec(),
            ParamValidator::Color.validate(b"magenta")
        );
    }

    #[test]
    fn color_triplets() {
        assert_eq!(
            b"#FF0080".to_vec(),
            ParamValidator::Color.validate(b"FF00,0000,8000")
        );
        assert_eq!(
            b"#000000".to_vec(),
            ParamValidator::Color.validate(b"0000,0000,0000")
        );
        assert_eq!(
            b"#ABCDEF".to_vec(),
            ParamValidator::Color.validate(b"abff,cdff,efff")
        );
    }

    #[test]
    fn color_fallbacks() {
        // A leading letter run is taken as a best-effort name.
        assert_eq!(
            b"orange".to_vec(),
            ParamValidator::Color.validate(b"orange!important")
        );
        // Malformed triplets fall through to the letter scan.
        assert_eq!(
            b"FF".to_vec(),
            ParamValidator::Color.validate(b"FF0,0000,8000")
        );
        // Nothing alphabetic at all defaults to black.
        assert_eq!(
            b"black".to_vec(),
            ParamValidator::Color.validate(b"!!-not-a-color")
        );
        assert_eq!(b"black".to_vec(), ParamValidator::Color.validate(b""));
    }

    #[test]
    fn font_and_lang_copy_to_delimiter() {
        assert_eq!(
            b"Times New Roman".to_vec(),
            ParamValidator::FontFamily.validate(b"Times New Roman")
        );
        assert_eq!(
            b"Arial".to_vec(),
            ParamValidator::FontFamily.validate(b"Arial\" onload=x")
        );
        assert_eq!(
            b"en-GB".to_vec(),
            ParamValidator::Language.validate(b"en-GB<script>")
        );
        assert_eq!(
            b"".to_vec(),
            ParamValidator::Language.validate(b">en-GB")
        );
    }

    proptest! {
        #[test]
        fn validators_are_total(
            raw in prop::collection::vec(prop::num::u8::ANY, 0..32)
        ) {
            ParamValidator::Color.validate(&raw);
            ParamValidator::FontFamily.validate(&raw);
            ParamValidator::Language.validate(&raw);
        }

        #[test]
        fn color_output_never_contains_delimiters(
            raw in prop::collection::vec(prop::num::u8::ANY, 0..32)
        ) {
            let out = ParamValidator::Color.validate(&raw);
            prop_assert!(!out.iter().any(|&b| b == b'"' || b == b'<'));
        }
    }
}
