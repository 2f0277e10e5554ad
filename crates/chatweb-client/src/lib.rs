// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Client side of the chat backend protocol.
//!
//! Two exchanges exist:
//!
//! - `POST {base}/chat` with `{"texto": …, "sessao_id": …}`
//! - `POST {base}/webchat/audio` with a multipart `audio` part
//!
//! Both answer with a JSON object whose human-readable reply lives in one of
//! several fields; [`extract_reply`] normalises that.

mod backend;
mod error;
mod http;
mod mock;
mod reply;

pub use backend::Backend;
pub use error::ClientError;
pub use http::{HttpBackend, AUDIO_PATH, CHAT_PATH};
pub use mock::{BackendCall, Scripted, ScriptedBackend};
pub use reply::{extract_reply, BotReply, ReplyKind, REPLY_FIELDS};
