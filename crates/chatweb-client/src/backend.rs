// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use chatweb_audio::AudioBlob;

use crate::{BotReply, ClientError};

#[async_trait]
pub trait Backend: Send + Sync {
    /// Send one user text message within `session_id`.
    async fn send_text(&self, message: &str, session_id: &str) -> Result<BotReply, ClientError>;

    /// Upload one finished recording.
    async fn send_audio(&self, blob: &AudioBlob) -> Result<BotReply, ClientError>;
}
