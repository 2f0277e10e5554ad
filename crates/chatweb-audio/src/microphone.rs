// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::CaptureError;

/// Platform access to a microphone.
#[async_trait]
pub trait Microphone: Send + Sync {
    /// Request access and start buffering audio.
    async fn open(&self) -> Result<Box<dyn Capture>, CaptureError>;
}

/// One running capture.
#[async_trait]
pub trait Capture: Send {
    /// Resolves when the source stops producing audio by itself.  Pending for
    /// as long as the capture runs normally.
    async fn ended(&mut self);

    /// Stop capturing and hand back every buffered chunk, in order.
    async fn finish(self: Box<Self>) -> Result<Vec<Vec<u8>>, CaptureError>;
}

/// A system without any recording support.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableMicrophone;

#[async_trait]
impl Microphone for UnavailableMicrophone {
    async fn open(&self) -> Result<Box<dyn Capture>, CaptureError> {
        Err(CaptureError::Capability("no microphone backend configured".into()))
    }
}

/// Outcome of one `open()` on a [`ScriptedMicrophone`].
#[derive(Debug, Clone)]
pub enum MicScript {
    /// Capture runs until stopped and yields these chunks.
    Chunks(Vec<Vec<u8>>),
    /// Capture ends on its own right away and yields these chunks.
    EndsBySelf(Vec<Vec<u8>>),
    Capability,
    Permission(String),
}

/// Deterministic microphone for tests.  Each `open()` pops the next script;
/// with no script left it reports the capability error.
#[derive(Debug, Clone, Default)]
pub struct ScriptedMicrophone {
    scripts: Arc<Mutex<VecDeque<MicScript>>>,
    opened: Arc<AtomicUsize>,
}

impl ScriptedMicrophone {
    pub fn new(scripts: impl IntoIterator<Item = MicScript>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts.into_iter().collect())),
            opened: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `open()` calls so far, successful or not.
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

struct ScriptedCapture {
    chunks: Vec<Vec<u8>>,
    ends_by_self: bool,
}

#[async_trait]
impl Capture for ScriptedCapture {
    async fn ended(&mut self) {
        if !self.ends_by_self {
            std::future::pending::<()>().await;
        }
    }

    async fn finish(self: Box<Self>) -> Result<Vec<Vec<u8>>, CaptureError> {
        Ok(self.chunks)
    }
}

#[async_trait]
impl Microphone for ScriptedMicrophone {
    async fn open(&self) -> Result<Box<dyn Capture>, CaptureError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.lock().ok().and_then(|mut s| s.pop_front());
        match script {
            Some(MicScript::Chunks(chunks)) => {
                Ok(Box::new(ScriptedCapture { chunks, ends_by_self: false }))
            }
            Some(MicScript::EndsBySelf(chunks)) => {
                Ok(Box::new(ScriptedCapture { chunks, ends_by_self: true }))
            }
            Some(MicScript::Permission(msg)) => Err(CaptureError::Permission(msg)),
            Some(MicScript::Capability) | None => {
                Err(CaptureError::Capability("scripted microphone unavailable".into()))
            }
        }
    }
}
