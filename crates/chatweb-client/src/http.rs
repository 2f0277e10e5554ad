// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! reqwest implementation of [`Backend`].
//!
//! No retries and no timeout: a request runs until the server answers or the
//! transport fails.

use async_trait::async_trait;
use chatweb_audio::AudioBlob;
use chatweb_config::BackendConfig;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::{extract_reply, Backend, BotReply, ClientError, ReplyKind};

pub const CHAT_PATH: &str = "/chat";
pub const AUDIO_PATH: &str = "/webchat/audio";

/// Multipart field carrying the recording.
const AUDIO_FIELD: &str = "audio";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    texto: &'a str,
    sessao_id: &'a str,
}

pub struct HttpBackend {
    /// Full text endpoint, e.g. `http://localhost:8000/chat`.
    chat_url: String,
    /// Full audio endpoint, e.g. `http://localhost:8000/webchat/audio`.
    audio_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(cfg: &BackendConfig) -> Self {
        Self {
            chat_url: cfg.endpoint(CHAT_PATH),
            audio_url: cfg.endpoint(AUDIO_PATH),
            client: reqwest::Client::new(),
        }
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    pub fn audio_url(&self) -> &str {
        &self.audio_url
    }

    /// Shared response policy: non-2xx → `Remote` with the raw body,
    /// otherwise decode JSON and extract the reply.
    async fn read_reply(
        resp: reqwest::Response,
        kind: ReplyKind,
    ) -> Result<BotReply, ClientError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await?;
            return Err(ClientError::Remote { status: status.as_u16(), body });
        }
        let bytes = resp.bytes().await?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        let reply = extract_reply(&value, kind);
        debug!(status = status.as_u16(), field = ?reply.field, "backend reply");
        Ok(reply)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn send_text(&self, message: &str, session_id: &str) -> Result<BotReply, ClientError> {
        debug!(url = %self.chat_url, session = %session_id, len = message.len(), "sending text");
        let resp = self
            .client
            .post(&self.chat_url)
            .json(&ChatRequest { texto: message, sessao_id: session_id })
            .send()
            .await?;
        Self::read_reply(resp, ReplyKind::Text).await
    }

    async fn send_audio(&self, blob: &AudioBlob) -> Result<BotReply, ClientError> {
        debug!(url = %self.audio_url, bytes = blob.bytes.len(), "uploading audio");
        let part = Part::bytes(blob.bytes.clone())
            .file_name(blob.file_name.clone())
            .mime_str(&blob.mime)?;
        let form = Form::new().part(AUDIO_FIELD, part);
        let resp = self.client.post(&self.audio_url).multipart(form).send().await?;
        Self::read_reply(resp, ReplyKind::Audio).await
    }
}
