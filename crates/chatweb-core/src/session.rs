// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Chat session controller.
//!
//! A send is split in three steps so an event loop can keep running while the
//! request is in flight:
//!
//! 1. [`ChatSession::begin_text`] / [`ChatSession::begin_audio`] update the
//!    conversation and return the request to issue,
//! 2. [`ChatSession::dispatch`] performs it without borrowing the session,
//! 3. [`ChatSession::finish`] appends the single resulting bot message.
//!
//! Only one request may be in flight.  A second `begin_*` while the first is
//! pending is rejected with [`SessionError::Busy`] and changes nothing.

use chatweb_audio::AudioBlob;
use chatweb_client::{Backend, BotReply, ClientError, ReplyKind};
use chatweb_config::SessionConfig;
use thiserror::Error;
use tracing::{debug, error};

use crate::{ConversationState, Message};

/// Bot message shown when a text exchange fails for any reason.
pub const TEXT_FAILURE_TEXT: &str = "Erro de conexão com backend.";
/// Bot message shown when an audio exchange fails for any reason.
pub const AUDIO_FAILURE_TEXT: &str = "Erro ao processar áudio.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a request is already in flight")]
    Busy,
}

/// A request ready to be dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingRequest {
    Text { message: String, session_id: String },
    Audio(AudioBlob),
}

impl OutgoingRequest {
    pub fn kind(&self) -> ReplyKind {
        match self {
            OutgoingRequest::Text { .. } => ReplyKind::Text,
            OutgoingRequest::Audio(_) => ReplyKind::Audio,
        }
    }
}

/// Outcome of one dispatched request.
#[derive(Debug)]
pub struct Completion {
    kind: ReplyKind,
    result: Result<BotReply, ClientError>,
}

impl Completion {
    pub fn new(kind: ReplyKind, result: Result<BotReply, ClientError>) -> Self {
        Self { kind, result }
    }

    pub fn kind(&self) -> ReplyKind {
        self.kind
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct ChatSession {
    state: ConversationState,
    session_id: String,
}

impl ChatSession {
    /// Empty conversation for `session_id`.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            state: ConversationState::new(),
            session_id: session_id.into(),
        }
    }

    /// Conversation opened with the configured greeting.
    pub fn from_config(cfg: &SessionConfig) -> Self {
        Self {
            state: ConversationState::with_greeting(&cfg.greeting),
            session_id: cfg.id.clone(),
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Takes effect for the next text request.
    pub fn set_session_id(&mut self, id: impl Into<String>) {
        self.session_id = id.into();
        debug!(session = %self.session_id, "session id changed");
    }

    /// Mirror the recorder state into the conversation flags.
    pub fn set_recording(&mut self, recording: bool) {
        self.state.set_recording(recording);
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_typing()
    }

    /// Start a text exchange.  Blank input is ignored (`Ok(None)`); otherwise
    /// the trimmed text is appended as a user message and typing starts.
    pub fn begin_text(&mut self, input: &str) -> Result<Option<OutgoingRequest>, SessionError> {
        let text = input.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        self.state.push(Message::user(text));
        self.state.set_typing(true);
        Ok(Some(OutgoingRequest::Text {
            message: text.to_string(),
            session_id: self.session_id.clone(),
        }))
    }

    /// Start an audio exchange.  No user message is shown for a recording.
    pub fn begin_audio(&mut self, blob: AudioBlob) -> Result<OutgoingRequest, SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        self.state.set_typing(true);
        Ok(OutgoingRequest::Audio(blob))
    }

    /// Issue `request` against `backend`.
    pub async fn dispatch(backend: &dyn Backend, request: OutgoingRequest) -> Completion {
        let kind = request.kind();
        let result = match &request {
            OutgoingRequest::Text { message, session_id } => {
                backend.send_text(message, session_id).await
            }
            OutgoingRequest::Audio(blob) => backend.send_audio(blob).await,
        };
        Completion::new(kind, result)
    }

    /// Append the bot message for `completion` and stop typing.  Failures are
    /// logged and shown as a fixed generic message.
    pub fn finish(&mut self, completion: Completion) -> &Message {
        let text = match completion.result {
            Ok(reply) => reply.text,
            Err(e) => match completion.kind {
                ReplyKind::Text => {
                    error!("error sending message: {e}");
                    TEXT_FAILURE_TEXT.to_string()
                }
                ReplyKind::Audio => {
                    error!("error sending audio: {e}");
                    AUDIO_FAILURE_TEXT.to_string()
                }
            },
        };
        self.state.set_typing(false);
        self.state.push(Message::bot(text))
    }

    /// Begin, dispatch and finish a text exchange.  Returns the bot message,
    /// or `None` for blank input.
    pub async fn send_text(
        &mut self,
        backend: &dyn Backend,
        input: &str,
    ) -> Result<Option<&Message>, SessionError> {
        let Some(request) = self.begin_text(input)? else {
            return Ok(None);
        };
        let completion = Self::dispatch(backend, request).await;
        Ok(Some(self.finish(completion)))
    }

    /// Begin, dispatch and finish an audio exchange.
    pub async fn send_audio(
        &mut self,
        backend: &dyn Backend,
        blob: AudioBlob,
    ) -> Result<&Message, SessionError> {
        let request = self.begin_audio(blob)?;
        let completion = Self::dispatch(backend, request).await;
        Ok(self.finish(completion))
    }
}
