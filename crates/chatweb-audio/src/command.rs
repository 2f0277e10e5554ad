// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Microphone backed by an external recorder process.
//!
//! The recorder must write the encoded recording to stdout and finalise its
//! container when it receives SIGINT (ffmpeg, arecord and sox all do).
//! Stdout is drained on a background task into a chunk buffer so the pipe
//! never fills up.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chatweb_config::AudioConfig;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{Capture, CaptureError, Microphone};

/// How long a stopped recorder gets to flush and exit before it is killed.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct CommandMicrophone {
    program: String,
    args: Vec<String>,
    startup_grace: Duration,
    chunk_size: usize,
}

impl CommandMicrophone {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        let defaults = AudioConfig::default();
        Self {
            program: program.into(),
            args,
            startup_grace: Duration::from_millis(defaults.startup_grace_ms),
            chunk_size: defaults.chunk_size,
        }
    }

    pub fn from_config(cfg: &AudioConfig) -> Self {
        Self {
            program: cfg.program.clone(),
            args: cfg.args.clone(),
            startup_grace: Duration::from_millis(cfg.startup_grace_ms),
            chunk_size: cfg.chunk_size.max(1),
        }
    }

    pub fn with_startup_grace(mut self, grace: Duration) -> Self {
        self.startup_grace = grace;
        self
    }
}

/// Resolve `program` the way the shell would: as a path if it contains a
/// separator, otherwise through `$PATH`.
fn locate(program: &str) -> Option<PathBuf> {
    let as_path = Path::new(program);
    if as_path.components().count() > 1 {
        return as_path.is_file().then(|| as_path.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> String {
    let mut buf = String::new();
    let _ = reader.read_to_string(&mut buf).await;
    buf
}

#[async_trait]
impl Microphone for CommandMicrophone {
    async fn open(&self) -> Result<Box<dyn Capture>, CaptureError> {
        if locate(&self.program).is_none() {
            return Err(CaptureError::Capability(format!(
                "recorder program '{}' not found",
                self.program
            )));
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                CaptureError::Capability(format!("recorder program '{}' not found", self.program))
            }
            std::io::ErrorKind::PermissionDenied => {
                CaptureError::Permission(format!("cannot execute '{}': {e}", self.program))
            }
            _ => CaptureError::Io(e),
        })?;
        debug!(program = %self.program, pid = ?child.id(), "recorder started");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CaptureError::Io(std::io::Error::other("recorder stdout not captured")))?;
        let (ended_tx, ended_rx) = watch::channel(false);
        let chunk_size = self.chunk_size;
        let reader = tokio::spawn(async move {
            let mut stdout = stdout;
            let mut chunks = Vec::new();
            loop {
                let mut buf = vec![0u8; chunk_size];
                match stdout.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        buf.truncate(n);
                        chunks.push(buf);
                    }
                    Err(e) => {
                        warn!("recorder output read failed: {e}");
                        break;
                    }
                }
            }
            let _ = ended_tx.send(true);
            chunks
        });

        // A recorder that fails right away could not get at the device.  A
        // clean exit is a short recording; its output is still buffered.
        match tokio::time::timeout(self.startup_grace, child.wait()).await {
            Err(_) => {}
            Ok(Ok(status)) if status.success() => {
                debug!(%status, "recorder finished inside the startup window");
            }
            Ok(Ok(status)) => {
                reader.abort();
                let stderr = match child.stderr.take() {
                    Some(s) => read_all(s).await,
                    None => String::new(),
                };
                let detail = stderr.trim();
                let detail = if detail.is_empty() {
                    format!("'{}' exited with {status}", self.program)
                } else {
                    detail.to_string()
                };
                return Err(CaptureError::Permission(detail));
            }
            Ok(Err(e)) => {
                reader.abort();
                return Err(CaptureError::Io(e));
            }
        }

        if let Some(stderr) = child.stderr.take() {
            let program = self.program.clone();
            tokio::spawn(async move {
                let text = read_all(stderr).await;
                for line in text.lines().filter(|l| !l.trim().is_empty()) {
                    debug!(program = %program, "{line}");
                }
            });
        }

        Ok(Box::new(CommandCapture { child, reader, ended: ended_rx }))
    }
}

struct CommandCapture {
    child: Child,
    reader: JoinHandle<Vec<Vec<u8>>>,
    ended: watch::Receiver<bool>,
}

impl CommandCapture {
    /// Ask the recorder to finish its output.
    fn interrupt(&mut self) {
        #[cfg(unix)]
        {
            if let Ok(None) = self.child.try_wait() {
                if let Some(pid) = self.child.id() {
                    unsafe {
                        libc::kill(pid as i32, libc::SIGINT);
                    }
                    return;
                }
            }
        }
        let _ = self.child.start_kill();
    }
}

#[async_trait]
impl Capture for CommandCapture {
    async fn ended(&mut self) {
        while !*self.ended.borrow() {
            if self.ended.changed().await.is_err() {
                break;
            }
        }
    }

    async fn finish(mut self: Box<Self>) -> Result<Vec<Vec<u8>>, CaptureError> {
        self.interrupt();
        match tokio::time::timeout(STOP_TIMEOUT, self.child.wait()).await {
            Ok(Ok(status)) => debug!(%status, "recorder exited"),
            Ok(Err(e)) => return Err(CaptureError::Io(e)),
            Err(_) => {
                warn!("recorder ignored SIGINT; killing it");
                let _ = self.child.start_kill();
                let _ = self.child.wait().await;
            }
        }
        let chunks = (&mut self.reader)
            .await
            .map_err(|e| CaptureError::Io(std::io::Error::other(e)))?;
        debug!(chunks = chunks.len(), "recorder output collected");
        Ok(chunks)
    }
}
