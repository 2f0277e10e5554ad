// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend answered with a non-2xx status.  `body` is the raw
    /// response text.
    #[error("backend returned HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A 2xx response whose body is not JSON.
    #[error("could not decode backend response: {0}")]
    Decode(String),
}

impl ClientError {
    /// HTTP status for [`ClientError::Remote`].
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}
