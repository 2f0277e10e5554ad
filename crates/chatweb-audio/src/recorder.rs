// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::Arc;

use chatweb_config::AudioConfig;
use tracing::{debug, warn};

use crate::blob::{WEBM_FILE_NAME, WEBM_MIME};
use crate::{AudioBlob, Capture, CaptureError, CommandMicrophone, Microphone};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
}

/// Result of [`AudioRecorder::toggle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Started,
    Finished(AudioBlob),
}

/// Two-state recorder.  `toggle` is the single user entry point; a failed
/// start always leaves it idle.
pub struct AudioRecorder {
    microphone: Arc<dyn Microphone>,
    mime: String,
    file_name: String,
    active: Option<Box<dyn Capture>>,
}

impl AudioRecorder {
    pub fn new(microphone: Arc<dyn Microphone>) -> Self {
        Self {
            microphone,
            mime: WEBM_MIME.into(),
            file_name: WEBM_FILE_NAME.into(),
            active: None,
        }
    }

    /// Recorder driving the configured external program.
    pub fn from_config(cfg: &AudioConfig) -> Self {
        Self::new(Arc::new(CommandMicrophone::from_config(cfg)))
            .with_format(cfg.mime.clone(), cfg.file_name.clone())
    }

    /// Content type and upload name of produced blobs.
    pub fn with_format(mut self, mime: impl Into<String>, file_name: impl Into<String>) -> Self {
        self.mime = mime.into();
        self.file_name = file_name.into();
        self
    }

    pub fn state(&self) -> RecorderState {
        if self.active.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.state() == RecorderState::Recording
    }

    /// Idle → Recording.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        if self.active.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }
        let capture = self.microphone.open().await?;
        self.active = Some(capture);
        debug!("recording started");
        Ok(())
    }

    /// Recording → Idle.  Returns the finished recording, or `None` when
    /// nothing was being recorded.
    pub async fn stop(&mut self) -> Result<Option<AudioBlob>, CaptureError> {
        let Some(capture) = self.active.take() else {
            return Ok(None);
        };
        let chunks = capture.finish().await?;
        let blob = AudioBlob::from_chunks(chunks, self.mime.clone(), self.file_name.clone());
        if blob.is_empty() {
            warn!("recording finished without any audio data");
        }
        debug!(bytes = blob.len(), "recording finished");
        Ok(Some(blob))
    }

    pub async fn toggle(&mut self) -> Result<ToggleOutcome, CaptureError> {
        if self.active.is_some() {
            match self.stop().await? {
                Some(blob) => Ok(ToggleOutcome::Finished(blob)),
                None => Ok(ToggleOutcome::Started),
            }
        } else {
            self.start().await?;
            Ok(ToggleOutcome::Started)
        }
    }

    /// Resolves when the running capture ends without being stopped.  Never
    /// resolves while idle.
    pub async fn ended(&mut self) {
        match self.active.as_mut() {
            Some(capture) => capture.ended().await,
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{MicScript, ScriptedMicrophone, UnavailableMicrophone};

    fn recorder(scripts: Vec<MicScript>) -> (AudioRecorder, ScriptedMicrophone) {
        let mic = ScriptedMicrophone::new(scripts);
        (AudioRecorder::new(Arc::new(mic.clone())), mic)
    }

    #[tokio::test]
    async fn toggle_starts_then_finishes_with_joined_chunks() {
        let (mut rec, _) = recorder(vec![MicScript::Chunks(vec![b"ab".to_vec(), b"cd".to_vec()])]);
        assert_eq!(rec.toggle().await.unwrap(), ToggleOutcome::Started);
        assert_eq!(rec.state(), RecorderState::Recording);

        match rec.toggle().await.unwrap() {
            ToggleOutcome::Finished(blob) => {
                assert_eq!(blob.bytes, b"abcd");
                assert_eq!(blob.mime, "audio/webm");
                assert_eq!(blob.file_name, "audio.webm");
            }
            other => panic!("expected Finished, got {other:?}"),
        }
        assert_eq!(rec.state(), RecorderState::Idle);
    }

    #[tokio::test]
    async fn capability_error_stays_idle() {
        let mut rec = AudioRecorder::new(Arc::new(UnavailableMicrophone));
        let err = rec.toggle().await.unwrap_err();
        assert!(matches!(err, CaptureError::Capability(_)));
        assert_eq!(rec.state(), RecorderState::Idle);
    }

    #[tokio::test]
    async fn permission_error_stays_idle() {
        let (mut rec, _) = recorder(vec![MicScript::Permission("denied".into())]);
        let err = rec.start().await.unwrap_err();
        assert!(matches!(err, CaptureError::Permission(ref m) if m == "denied"));
        assert!(!rec.is_recording());
    }

    #[tokio::test]
    async fn second_start_is_rejected_without_reopening() {
        let (mut rec, mic) = recorder(vec![MicScript::Chunks(vec![])]);
        rec.start().await.unwrap();
        let err = rec.start().await.unwrap_err();
        assert!(matches!(err, CaptureError::AlreadyRecording));
        assert_eq!(mic.open_count(), 1);
        assert!(rec.is_recording());
    }

    #[tokio::test]
    async fn stop_while_idle_is_a_no_op() {
        let (mut rec, _) = recorder(vec![]);
        assert_eq!(rec.stop().await.unwrap(), None);
    }

    #[tokio::test]
    async fn ended_resolves_for_self_terminating_capture() {
        let (mut rec, _) = recorder(vec![MicScript::EndsBySelf(vec![b"x".to_vec()])]);
        rec.start().await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), rec.ended()).await.unwrap();
        let blob = rec.stop().await.unwrap().unwrap();
        assert_eq!(blob.bytes, b"x");
    }

    #[tokio::test]
    async fn ended_stays_pending_while_idle() {
        let (mut rec, _) = recorder(vec![]);
        let waited = tokio::time::timeout(Duration::from_millis(50), rec.ended()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn retry_after_failure_can_succeed() {
        let (mut rec, _) = recorder(vec![
            MicScript::Permission("denied".into()),
            MicScript::Chunks(vec![b"ok".to_vec()]),
        ]);
        assert!(rec.toggle().await.is_err());
        assert_eq!(rec.toggle().await.unwrap(), ToggleOutcome::Started);
        assert_eq!(
            rec.toggle().await.unwrap(),
            ToggleOutcome::Finished(AudioBlob::webm(b"ok".to_vec()))
        );
    }
}
