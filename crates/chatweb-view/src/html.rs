// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use chatweb_config::Theme;
use chatweb_core::{ConversationState, Sender};
use chatweb_markdown::{escape_html, render};

const TYPING_HTML: &str =
    "<div class=\"message bot typing\"><p><span>.</span><span>.</span><span>.</span></p></div>\n";

/// Scroll target placed after the last message.
const END_ANCHOR: &str =
    "<div id=\"messages-end\" data-scroll=\"end\" tabindex=\"-1\" autofocus></div>\n";

const STYLE: &str = r#"body { font-family: sans-serif; margin: 0; background: #f5f5f5; color: #222; }
body.dark { background: #1e1e1e; color: #e0e0e0; }
.chat-container { max-width: 720px; margin: 0 auto; padding: 1rem; }
.chat-window { display: flex; flex-direction: column; gap: .5rem; }
.message { padding: .5rem .75rem; border-radius: 8px; max-width: 80%; }
.message.user { align-self: flex-end; background: #d1e7ff; }
.message.bot { align-self: flex-start; background: #fff; }
body.dark .message.user { background: #2b4a6f; }
body.dark .message.bot { background: #2d2d2d; }
.typing span { animation: blink 1.4s infinite both; }
@keyframes blink { 0%, 80%, 100% { opacity: 0; } 40% { opacity: 1; } }
"#;

/// The message list.  Bot text goes through the Markdown renderer, user text
/// is escaped and never interpreted.
pub fn render_html_messages(state: &ConversationState) -> String {
    let mut html = String::from("<div class=\"chat-window\">\n");
    for message in state.messages() {
        match message.sender() {
            Sender::Bot => {
                html.push_str("<div class=\"message bot\"><div class=\"markdown-content\">");
                html.push_str(&render(message.text()));
                html.push_str("</div></div>\n");
            }
            Sender::User => {
                html.push_str("<div class=\"message user\"><p>");
                html.push_str(&escape_html(message.text()));
                html.push_str("</p></div>\n");
            }
        }
    }
    if state.is_typing() {
        html.push_str(TYPING_HTML);
    }
    html.push_str(END_ANCHOR);
    html.push_str("</div>\n");
    html
}

/// Standalone document for `state`.  The dark theme is a class on `<body>`.
pub fn render_html_page(state: &ConversationState, theme: Theme) -> String {
    let body_open = match theme {
        Theme::Dark => "<body class=\"dark\">",
        Theme::Light => "<body>",
    };
    format!(
        "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Chat de Teste</title>\n<style>\n{STYLE}</style>\n</head>\n{body_open}\n\
         <div class=\"chat-container\">\n<div class=\"chat-header\"><h3>Chat de Teste</h3></div>\n\
         {messages}</div>\n</body>\n</html>\n",
        messages = render_html_messages(state),
    )
}
