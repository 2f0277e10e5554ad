// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chatweb_audio::AudioBlob;

use crate::{Backend, BotReply, ClientError, ReplyKind};

/// One pre-scripted backend outcome.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// 2xx with this reply text.
    Reply(String),
    /// 2xx without any reply field.
    Empty,
    /// Non-2xx status with a raw body.
    Remote { status: u16, body: String },
    /// 2xx with an undecodable body.
    Malformed,
}

/// A call as seen by [`ScriptedBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Text { message: String, session_id: String },
    Audio { bytes: Vec<u8>, mime: String, file_name: String },
}

/// Deterministic backend for tests.  Each call pops the next script from the
/// front of the queue; once the queue is empty text calls echo the message
/// back as `ECHO: <message>` and audio calls answer with the placeholder.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    scripts: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<Mutex<Vec<BackendCall>>>,
    delay: Option<Duration>,
}

impl ScriptedBackend {
    pub fn new(scripts: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts.into_iter().collect())),
            ..Self::default()
        }
    }

    /// Hold every reply for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: BackendCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn next_script(&self) -> Option<Scripted> {
        self.scripts.lock().ok().and_then(|mut s| s.pop_front())
    }

    async fn answer(&self, kind: ReplyKind, fallback: String) -> Result<BotReply, ClientError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.next_script() {
            None => Ok(BotReply::new(fallback)),
            Some(Scripted::Reply(text)) => Ok(BotReply { text, field: Some("mensagem") }),
            Some(Scripted::Empty) => Ok(BotReply::new(kind.placeholder())),
            Some(Scripted::Remote { status, body }) => Err(ClientError::Remote { status, body }),
            Some(Scripted::Malformed) => {
                Err(ClientError::Decode("expected value at line 1 column 1".into()))
            }
        }
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn send_text(&self, message: &str, session_id: &str) -> Result<BotReply, ClientError> {
        self.record(BackendCall::Text {
            message: message.to_string(),
            session_id: session_id.to_string(),
        });
        self.answer(ReplyKind::Text, format!("ECHO: {message}")).await
    }

    async fn send_audio(&self, blob: &AudioBlob) -> Result<BotReply, ClientError> {
        self.record(BackendCall::Audio {
            bytes: blob.bytes.clone(),
            mime: blob.mime.clone(),
            file_name: blob.file_name.clone(),
        });
        self.answer(ReplyKind::Audio, ReplyKind::Audio.placeholder().to_string()).await
    }
}
