// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use chatweb_config::Theme;
use chatweb_core::{Message, Sender};
use crossterm::style::{Color, Stylize};

pub const USER_LABEL: &str = "você ›";
pub const BOT_LABEL: &str = "bot  ›";
pub const TYPING_TEXT: &str = "...";

/// Smallest width handed to the HTML-to-text converter.
const MIN_WRAP_WIDTH: usize = 20;

/// Terminal colours for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub user: Color,
    pub bot: Color,
    pub dim: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                user: Color::DarkBlue,
                bot: Color::DarkGreen,
                dim: Color::DarkGrey,
            },
            Theme::Dark => Self {
                user: Color::Cyan,
                bot: Color::Green,
                dim: Color::Grey,
            },
        }
    }
}

fn paint(text: &str, color: Option<Color>, bold: bool) -> String {
    match color {
        None => text.to_string(),
        Some(c) if bold => text.with(c).bold().to_string(),
        Some(c) => text.with(c).to_string(),
    }
}

/// Bot text as the terminal shows it: Markdown → HTML → wrapped plain text.
pub(crate) fn bot_text(raw: &str, wrap_width: usize) -> String {
    let html = chatweb_markdown::render(raw);
    let text = html2text::from_read(html.as_bytes(), wrap_width.max(MIN_WRAP_WIDTH));
    text.trim_end().to_string()
}

pub(crate) fn format_message(message: &Message, palette: Option<&Palette>, wrap_width: usize) -> String {
    let (label, body, color) = match message.sender() {
        Sender::User => (USER_LABEL, message.text().to_string(), palette.map(|p| p.user)),
        Sender::Bot => (
            BOT_LABEL,
            bot_text(message.text(), wrap_width),
            palette.map(|p| p.bot),
        ),
    };

    let indent = " ".repeat(label.chars().count() + 1);
    let mut lines = body.lines();
    let first = lines.next().unwrap_or_default();
    let mut block = format!("{} {}", paint(label, color, true), first);
    for line in lines {
        block.push('\n');
        if !line.is_empty() {
            block.push_str(&indent);
            block.push_str(line);
        }
    }
    block
}

pub(crate) fn format_typing(palette: Option<&Palette>) -> String {
    let color = palette.map(|p| p.dim);
    format!("{} {}", paint(BOT_LABEL, color, true), paint(TYPING_TEXT, color, false))
}

pub(crate) fn format_notice(text: &str, palette: Option<&Palette>) -> String {
    paint(&format!("-- {text}"), palette.map(|p| p.dim), false)
}
