// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Reply renderer: a fixed, ordered set of Markdown rules turned into HTML.
//!
//! This is not a Markdown implementation.  It understands exactly:
//!
//! - `#`, `##`, `###` headings
//! - `**bold**` and `*italic*` (single line, no nesting rules)
//! - `` `inline code` ``
//! - `- item` / `* item` bullet lists
//! - hard line breaks
//!
//! Everything else is passed through as escaped text.  The output is safe to
//! inject verbatim into an HTML document: every `&`, `<` and `>` of the input
//! is escaped before the first tag is produced.

mod pipeline;

pub use pipeline::{render, RULE_NAMES};

/// Escape the three HTML-sensitive characters.
///
/// Used for text that must be shown literally (user messages), and as the
/// escaping stage of [`render`].
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}
