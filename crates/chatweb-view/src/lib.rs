// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Presentation of a conversation.
//!
//! [`View`] owns the theme and the terminal cursor (how many messages have
//! already been printed).  The HTML side is stateless apart from the theme and
//! is what `/export` writes to disk.

mod html;
mod terminal;

use std::io::{self, Write};

use chatweb_config::{Settings, Theme};
use chatweb_core::ConversationState;
use tracing::{debug, error};

pub use html::{render_html_messages, render_html_page};
pub use terminal::{Palette, BOT_LABEL, TYPING_TEXT, USER_LABEL};

/// Called with the new settings every time they change.
pub type SaveSettings = Box<dyn FnMut(&Settings) -> anyhow::Result<()> + Send>;

pub struct View {
    settings: Settings,
    save: SaveSettings,
    ascii: bool,
    wrap_width: usize,
    printed: usize,
    typing_shown: bool,
}

impl View {
    pub fn new(settings: Settings, save: SaveSettings) -> Self {
        Self {
            settings,
            save,
            ascii: false,
            wrap_width: 100,
            printed: 0,
            typing_shown: false,
        }
    }

    /// Disable colours.
    pub fn with_ascii(mut self, ascii: bool) -> Self {
        self.ascii = ascii;
        self
    }

    pub fn with_wrap_width(mut self, width: usize) -> Self {
        self.wrap_width = width;
        self
    }

    pub fn theme(&self) -> Theme {
        self.settings.theme
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Flip the theme and persist it.  The new theme is kept even when
    /// saving fails.
    pub fn toggle_theme(&mut self) -> Theme {
        self.settings.theme = self.settings.theme.toggled();
        debug!(theme = %self.settings.theme, "theme toggled");
        if let Err(e) = (self.save)(&self.settings) {
            error!("failed to save settings: {e:#}");
        }
        self.settings.theme
    }

    fn palette(&self) -> Option<Palette> {
        (!self.ascii).then(|| Palette::for_theme(self.settings.theme))
    }

    /// Print every message appended since the previous call, then the typing
    /// indicator if typing has just started.
    pub fn render_updates(
        &mut self,
        state: &ConversationState,
        out: &mut impl Write,
    ) -> io::Result<()> {
        let palette = self.palette();
        let fresh = state.messages().get(self.printed..).unwrap_or_default();
        for message in fresh {
            let block = terminal::format_message(message, palette.as_ref(), self.wrap_width);
            writeln!(out, "{block}")?;
        }
        self.printed = state.len();

        if state.is_typing() && !self.typing_shown {
            writeln!(out, "{}", terminal::format_typing(palette.as_ref()))?;
        }
        self.typing_shown = state.is_typing();
        out.flush()
    }

    /// Print a one-line status notice that is not part of the conversation.
    pub fn notice(&self, out: &mut impl Write, text: &str) -> io::Result<()> {
        writeln!(out, "{}", terminal::format_notice(text, self.palette().as_ref()))?;
        out.flush()
    }

    /// Full HTML document for the conversation in the current theme.
    pub fn html_page(&self, state: &ConversationState) -> String {
        render_html_page(state, self.settings.theme)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chatweb_client::{Scripted, ScriptedBackend};
    use chatweb_config::{MemorySettingsStore, SettingsStore};
    use chatweb_core::ChatSession;

    use super::*;

    fn plain_view() -> View {
        View::new(Settings::default(), Box::new(|_: &Settings| Ok(()))).with_ascii(true)
    }

    fn render(view: &mut View, state: &ConversationState) -> String {
        let mut out = Vec::new();
        view.render_updates(state, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn toggle_invokes_save_with_new_theme() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut view = View::new(
            Settings::default(),
            Box::new(move |s: &Settings| {
                sink.lock().unwrap().push(s.theme);
                Ok(())
            }),
        );
        assert_eq!(view.toggle_theme(), Theme::Dark);
        assert_eq!(view.toggle_theme(), Theme::Light);
        assert_eq!(*seen.lock().unwrap(), vec![Theme::Dark, Theme::Light]);
    }

    #[test]
    fn toggle_survives_save_failure() {
        let mut view = View::new(
            Settings::default(),
            Box::new(|_: &Settings| anyhow::bail!("read-only")),
        );
        assert_eq!(view.toggle_theme(), Theme::Dark);
        assert_eq!(view.theme(), Theme::Dark);
    }

    #[test]
    fn toggle_persists_through_store() {
        let store = MemorySettingsStore::default();
        let writer = store.clone();
        let mut view =
            View::new(store.load().unwrap(), Box::new(move |s: &Settings| writer.save(s)));
        view.toggle_theme();
        assert_eq!(store.load().unwrap().theme, Theme::Dark);
    }

    #[tokio::test]
    async fn prints_only_new_messages() {
        let backend = ScriptedBackend::new([Scripted::Reply("resposta".into())]);
        let mut session = ChatSession::new("");
        let mut view = plain_view();

        let request = session.begin_text("pergunta").unwrap().unwrap();
        let first = render(&mut view, session.state());
        assert!(first.contains(&format!("{USER_LABEL} pergunta")));
        assert!(first.contains(TYPING_TEXT));

        let completion = ChatSession::dispatch(&backend, request).await;
        session.finish(completion);
        let second = render(&mut view, session.state());
        assert!(!second.contains("pergunta"));
        assert!(second.contains("resposta"));
        assert!(!second.contains(TYPING_TEXT));

        assert_eq!(render(&mut view, session.state()), "");
    }

    #[test]
    fn typing_indicator_is_printed_once() {
        let mut session = ChatSession::new("");
        let mut view = plain_view();
        session.begin_text("a").unwrap();
        assert!(render(&mut view, session.state()).contains(TYPING_TEXT));
        assert!(!render(&mut view, session.state()).contains(TYPING_TEXT));
    }

    #[test]
    fn bot_markdown_is_rendered_to_text() {
        let state = ChatSession::from_config(&chatweb_config::SessionConfig {
            id: String::new(),
            greeting: "linha um\\nlinha `dois`".into(),
        });
        let out = render(&mut plain_view(), state.state());
        assert!(out.contains("linha um"));
        assert!(out.contains("dois"));
        assert!(!out.contains("<br/>"));
        assert!(!out.contains("\\n"));
    }

    #[test]
    fn ascii_output_has_no_escape_codes() {
        let mut session = ChatSession::new("");
        session.begin_text("oi").unwrap();
        let out = render(&mut plain_view(), session.state());
        assert!(!out.contains('\u{1b}'));
    }

    #[test]
    fn page_follows_theme() {
        let state = ConversationState::new();
        let mut view = View::new(Settings::default(), Box::new(|_: &Settings| Ok(())));
        assert!(!view.html_page(&state).contains("<body class=\"dark\">"));
        view.toggle_theme();
        assert!(view.html_page(&state).contains("<body class=\"dark\">"));
    }
}
