// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod conversation;
mod session;

pub use conversation::{ConversationState, Message, Sender};
pub use session::{
    ChatSession, Completion, OutgoingRequest, SessionError, AUDIO_FAILURE_TEXT,
    TEXT_FAILURE_TEXT,
};
