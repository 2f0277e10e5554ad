// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Greeting shown as the first bot message of every conversation.
pub const DEFAULT_GREETING: &str = "Olá! Sou seu assistente de testes. Digite sua mensagem.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the chat backend, e.g. `http://localhost:8000`.
    ///
    /// Empty means "relative": paths are resolved against [`Self::origin`].
    /// Overridden by the `CHATWEB_API_URL` environment variable and by
    /// `--api-url`.
    pub base_url: String,
    /// Origin used when `base_url` is empty.  Plays the part of the page
    /// origin a browser would use for relative requests, typically a
    /// development proxy in front of the backend.
    pub origin: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            origin: "http://localhost:3000".into(),
        }
    }
}

impl BackendConfig {
    /// The effective base every endpoint is appended to, without a trailing
    /// slash.
    pub fn effective_base(&self) -> String {
        let base = self.base_url.trim();
        let base = if base.is_empty() { self.origin.trim() } else { base };
        base.trim_end_matches('/').to_string()
    }

    /// Full URL for an absolute endpoint path such as `/chat`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.effective_base(), path.trim_start_matches('/'))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session id attached to every text request.  Opaque to the client.
    pub id: String,
    /// First bot message of a new conversation.  Empty disables it.
    pub greeting: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            greeting: DEFAULT_GREETING.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Recorder program.  Must write the encoded recording to stdout and
    /// finalise it on SIGINT.
    pub program: String,
    /// Arguments passed to `program`.
    pub args: Vec<String>,
    /// A recorder that exits with failure within this window is treated as
    /// a denied microphone.
    pub startup_grace_ms: u64,
    /// Read size for recorder output chunks.
    pub chunk_size: usize,
    /// Content type of the uploaded recording.
    pub mime: String,
    /// File name of the uploaded recording.
    pub file_name: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".into(),
            args: [
                "-hide_banner", "-loglevel", "error",
                "-f", "pulse", "-i", "default",
                "-c:a", "libopus", "-f", "webm", "pipe:1",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            startup_grace_ms: 300,
            chunk_size: 4096,
            mime: "audio/webm".into(),
            file_name: "audio.webm".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Settings file override.  `~` is expanded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings_file: Option<String>,
    /// Plain output: no colours in the terminal view.
    pub ascii: bool,
    /// Column width used when turning rendered replies into terminal text.
    pub wrap_width: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            settings_file: None,
            ascii: false,
            wrap_width: 100,
        }
    }
}

impl UiConfig {
    /// Settings file to use: the configured override or the per-user default.
    pub fn settings_path(&self) -> PathBuf {
        match &self.settings_file {
            Some(p) => PathBuf::from(shellexpand::tilde(p).into_owned()),
            None => crate::default_settings_path(),
        }
    }
}
