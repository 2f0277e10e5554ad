// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! In-memory conversation: an append-only message list plus the two UI flags.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

/// A single chat message.  Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    from: Sender,
    text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self { from: Sender::User, text: text.into() }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self { from: Sender::Bot, text: text.into() }
    }

    pub fn sender(&self) -> Sender {
        self.from
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_bot(&self) -> bool {
        self.from == Sender::Bot
    }
}

/// Insertion order is display order.  Messages can only be appended; the
/// flags are driven by [`crate::ChatSession`].
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    messages: Vec<Message>,
    is_typing: bool,
    is_recording: bool,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A conversation opened by a bot greeting.  An empty greeting opens an
    /// empty conversation.
    pub fn with_greeting(greeting: &str) -> Self {
        let mut state = Self::new();
        if !greeting.trim().is_empty() {
            state.push(Message::bot(greeting));
        }
        state
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub(crate) fn push(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub(crate) fn set_typing(&mut self, typing: bool) {
        self.is_typing = typing;
    }

    pub(crate) fn set_recording(&mut self, recording: bool) {
        self.is_recording = recording;
    }
}
