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

mod filter;
mod tags;

pub use filter::{enriched_to_html, EnrichedFlags, EnrichedToHtml};
pub use tags::{ParamValidator, TagEntry};
