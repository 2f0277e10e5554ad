// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// No way to record on this system.
    #[error("audio recording is not supported: {0}")]
    Capability(String),

    /// A microphone exists but access was refused.
    #[error("microphone access denied: {0}")]
    Permission(String),

    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("recorder I/O error: {0}")]
    Io(#[from] std::io::Error),
}
