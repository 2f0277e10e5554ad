// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Microphone capture for voice messages.
//!
//! [`AudioRecorder`] is a two-state machine (idle / recording) on top of a
//! [`Microphone`] backend.  One recording session produces exactly one
//! [`AudioBlob`].

mod blob;
mod command;
mod error;
mod microphone;
mod recorder;

pub use blob::AudioBlob;
pub use command::CommandMicrophone;
pub use error::CaptureError;
pub use microphone::{Capture, MicScript, Microphone, ScriptedMicrophone, UnavailableMicrophone};
pub use recorder::{AudioRecorder, RecorderState, ToggleOutcome};
