// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Interactive loop.
//!
//! One task multiplexes stdin, the in-flight backend request and the
//! recorder.  A pending request never blocks input; a second send while it is
//! pending is refused, and a recording finished meanwhile waits in a single
//! slot until the request completes.  A newer recording replaces an unsent
//! one.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures::future::{FutureExt, LocalBoxFuture};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, error, warn};

use chatweb_audio::{AudioBlob, AudioRecorder, CaptureError, ToggleOutcome};
use chatweb_client::{Backend, HttpBackend};
use chatweb_config::{Config, Theme};
use chatweb_core::{ChatSession, Completion, OutgoingRequest, SessionError};
use chatweb_view::View;

const DEFAULT_EXPORT: &str = "chat.html";

const HELP: &str = "comandos: /theme  /record  /session <id>  /export [arquivo]  /help  /quit";

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Text(&'a str),
    Theme,
    Record,
    Session(&'a str),
    Export(&'a str),
    Help,
    Quit,
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Command::Text(line);
        };
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name {
            "theme" | "tema" => Command::Theme,
            "record" | "gravar" => Command::Record,
            "session" | "sessao" => Command::Session(arg),
            "export" => Command::Export(if arg.is_empty() { DEFAULT_EXPORT } else { arg }),
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => Command::Unknown(trimmed),
        }
    }
}

/// How long end of input waits for outstanding replies before exiting.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

struct Repl<W: Write> {
    backend: Arc<dyn Backend>,
    session: ChatSession,
    recorder: AudioRecorder,
    view: View,
    out: W,
    pending: Option<LocalBoxFuture<'static, Completion>>,
    queued_audio: Option<AudioBlob>,
}

pub async fn run(config: &Config, view: View) -> anyhow::Result<()> {
    let mut repl = Repl::new(
        Arc::new(HttpBackend::new(&config.backend)),
        ChatSession::from_config(&config.session),
        AudioRecorder::from_config(&config.audio),
        view,
        io::stdout(),
    );
    repl.note(HELP)?;
    repl.redraw()?;
    repl.run(BufReader::new(tokio::io::stdin())).await
}

impl<W: Write> Repl<W> {
    fn new(
        backend: Arc<dyn Backend>,
        session: ChatSession,
        recorder: AudioRecorder,
        view: View,
        out: W,
    ) -> Self {
        Self {
            backend,
            session,
            recorder,
            view,
            out,
            pending: None,
            queued_audio: None,
        }
    }

    /// Process `input` line by line.  `/quit` abandons an in-flight request;
    /// end of input lets outstanding replies land first, within
    /// [`DRAIN_TIMEOUT`].
    async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> anyhow::Result<()> {
        let mut lines = input.lines();
        let mut quit = false;

        loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if !self.handle_line(&line).await? {
                            quit = true;
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("input closed");
                        break;
                    }
                    Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                        warn!("skipping unreadable input line: {e}");
                    }
                    Err(e) => return Err(e).context("reading input"),
                },
                completion = poll_pending(&mut self.pending), if self.pending.is_some() => {
                    self.pending = None;
                    self.complete(completion)?;
                }
                () = self.recorder.ended(), if self.recorder.is_recording() => {
                    warn!("recorder ended on its own");
                    self.stop_recording().await?;
                }
            }
            self.redraw()?;
        }

        if quit {
            if self.pending.take().is_some() {
                debug!("abandoning in-flight request on quit");
            }
            self.queued_audio = None;
        } else if tokio::time::timeout(DRAIN_TIMEOUT, self.drain()).await.is_err() {
            warn!("gave up waiting for the backend after {DRAIN_TIMEOUT:?}");
        }
        self.shutdown().await
    }

    /// Returns `false` when the loop should end.
    async fn handle_line(&mut self, line: &str) -> anyhow::Result<bool> {
        match Command::parse(line) {
            Command::Quit => return Ok(false),
            Command::Help => self.note(HELP)?,
            Command::Theme => {
                let label = match self.view.toggle_theme() {
                    Theme::Light => "claro",
                    Theme::Dark => "escuro",
                };
                self.note(&format!("tema {label}"))?;
            }
            Command::Record => self.toggle_recording().await?,
            Command::Session(id) => {
                self.session.set_session_id(id);
                self.note(&format!("sessão: {id:?}"))?;
            }
            Command::Export(path) => self.export(PathBuf::from(path))?,
            Command::Unknown(cmd) => self.note(&format!("comando desconhecido: {cmd}"))?,
            Command::Text(text) => match self.session.begin_text(text) {
                Ok(Some(request)) => self.dispatch(request),
                Ok(None) => {}
                Err(SessionError::Busy) => self.note("aguarde a resposta anterior")?,
            },
        }
        Ok(true)
    }

    fn dispatch(&mut self, request: OutgoingRequest) {
        let backend = self.backend.clone();
        self.pending = Some(
            async move { ChatSession::dispatch(backend.as_ref(), request).await }.boxed_local(),
        );
    }

    /// Apply a reply, then send the recording that was waiting for it.
    fn complete(&mut self, completion: Completion) -> anyhow::Result<()> {
        self.session.finish(completion);
        if let Some(blob) = self.queued_audio.take() {
            debug!(bytes = blob.len(), "sending queued recording");
            self.submit_audio(blob)?;
        }
        Ok(())
    }

    /// Await outstanding requests, including a queued recording.
    async fn drain(&mut self) -> anyhow::Result<()> {
        while let Some(pending) = self.pending.take() {
            let completion = pending.await;
            self.complete(completion)?;
            self.redraw()?;
        }
        Ok(())
    }

    fn submit_audio(&mut self, blob: AudioBlob) -> anyhow::Result<()> {
        let request = self.session.begin_audio(blob)?;
        self.dispatch(request);
        Ok(())
    }

    async fn toggle_recording(&mut self) -> anyhow::Result<()> {
        match self.recorder.toggle().await {
            Ok(ToggleOutcome::Started) => {
                self.session.set_recording(true);
                self.note("gravando... /record para parar")?;
            }
            Ok(ToggleOutcome::Finished(blob)) => {
                self.session.set_recording(false);
                self.enqueue_audio(blob)?;
            }
            Err(e) => self.capture_failed(e)?,
        }
        Ok(())
    }

    async fn stop_recording(&mut self) -> anyhow::Result<()> {
        let stopped = self.recorder.stop().await;
        self.session.set_recording(false);
        match stopped {
            Ok(Some(blob)) => self.enqueue_audio(blob)?,
            Ok(None) => {}
            Err(e) => self.capture_failed(e)?,
        }
        Ok(())
    }

    /// Send now, or hold the recording until the pending request finishes.
    fn enqueue_audio(&mut self, blob: AudioBlob) -> anyhow::Result<()> {
        if !self.session.is_busy() {
            return self.submit_audio(blob);
        }
        if self.queued_audio.replace(blob).is_some() {
            warn!("replacing a queued recording that was never sent");
        }
        self.note("áudio na fila, aguardando a resposta anterior")
    }

    fn capture_failed(&mut self, e: CaptureError) -> anyhow::Result<()> {
        match &e {
            CaptureError::Capability(_) => warn!("cannot record: {e}"),
            _ => error!("error accessing microphone: {e}"),
        }
        self.session.set_recording(self.recorder.is_recording());
        self.note(&format!("gravação indisponível: {e}"))
    }

    fn export(&mut self, path: PathBuf) -> anyhow::Result<()> {
        let page = self.view.html_page(self.session.state());
        match std::fs::write(&path, page) {
            Ok(()) => self.note(&format!("conversa exportada para {}", path.display())),
            Err(e) => {
                error!("failed to export to {}: {e}", path.display());
                self.note(&format!("falha ao exportar: {e}"))
            }
        }
    }

    /// Drop an unfinished recording.
    async fn shutdown(&mut self) -> anyhow::Result<()> {
        if self.recorder.is_recording() {
            if let Err(e) = self.recorder.stop().await {
                warn!("error stopping recorder on exit: {e}");
            }
            self.session.set_recording(false);
        }
        self.redraw()
    }

    fn redraw(&mut self) -> anyhow::Result<()> {
        self.view.render_updates(self.session.state(), &mut self.out)?;
        Ok(())
    }

    fn note(&mut self, text: &str) -> anyhow::Result<()> {
        self.view.notice(&mut self.out, text)?;
        Ok(())
    }
}

async fn poll_pending(pending: &mut Option<LocalBoxFuture<'static, Completion>>) -> Completion {
    match pending.as_mut() {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use chatweb_audio::{MicScript, ScriptedMicrophone};
    use chatweb_client::{BackendCall, Scripted, ScriptedBackend};
    use chatweb_config::Settings;
    use chatweb_core::Sender;

    use super::*;

    fn repl(backend: &ScriptedBackend, mic: ScriptedMicrophone) -> Repl<Vec<u8>> {
        let view = View::new(Settings::default(), Box::new(|_: &Settings| Ok(()))).with_ascii(true);
        Repl::new(
            Arc::new(backend.clone()),
            ChatSession::new("s"),
            AudioRecorder::new(Arc::new(mic)),
            view,
            Vec::new(),
        )
    }

    fn transcript(repl: &Repl<Vec<u8>>) -> Vec<(Sender, String)> {
        repl.session
            .state()
            .messages()
            .iter()
            .map(|m| (m.sender(), m.text().to_string()))
            .collect()
    }

    fn audio_call(bytes: &[u8]) -> BackendCall {
        BackendCall::Audio {
            bytes: bytes.to_vec(),
            mime: "audio/webm".into(),
            file_name: "audio.webm".into(),
        }
    }

    fn text_call(message: &str) -> BackendCall {
        BackendCall::Text { message: message.into(), session_id: "s".into() }
    }

    fn output(repl: &Repl<Vec<u8>>) -> String {
        String::from_utf8_lossy(&repl.out).into_owned()
    }

    #[tokio::test]
    async fn recording_finished_while_busy_is_sent_after_the_reply() {
        let backend = ScriptedBackend::new([
            Scripted::Reply("texto ok".into()),
            Scripted::Reply("audio ok".into()),
        ])
        .with_delay(Duration::from_millis(50));
        let mic = ScriptedMicrophone::new([MicScript::Chunks(vec![b"rec1".to_vec()])]);
        let mut repl = repl(&backend, mic);

        repl.run(&b"oi\n/record\n/record\n"[..]).await.unwrap();

        assert_eq!(
            transcript(&repl),
            vec![
                (Sender::User, "oi".to_string()),
                (Sender::Bot, "texto ok".to_string()),
                (Sender::Bot, "audio ok".to_string()),
            ]
        );
        assert_eq!(backend.calls(), vec![text_call("oi"), audio_call(b"rec1")]);
        assert!(output(&repl).contains("áudio na fila"));
    }

    #[tokio::test]
    async fn newer_queued_recording_replaces_older() {
        let backend = ScriptedBackend::new([Scripted::Reply("texto ok".into())])
            .with_delay(Duration::from_millis(50));
        let mic = ScriptedMicrophone::new([
            MicScript::Chunks(vec![b"rec1".to_vec()]),
            MicScript::Chunks(vec![b"rec2".to_vec()]),
        ]);
        let mut repl = repl(&backend, mic);

        repl.run(&b"oi\n/record\n/record\n/record\n/record\n"[..]).await.unwrap();

        assert_eq!(backend.calls(), vec![text_call("oi"), audio_call(b"rec2")]);
        assert_eq!(transcript(&repl).len(), 3);
    }

    #[tokio::test]
    async fn text_while_busy_is_refused() {
        let backend = ScriptedBackend::new([Scripted::Reply("r1".into())])
            .with_delay(Duration::from_millis(50));
        let mut repl = repl(&backend, ScriptedMicrophone::default());

        repl.run(&b"um\ndois\n"[..]).await.unwrap();

        assert_eq!(
            transcript(&repl),
            vec![(Sender::User, "um".to_string()), (Sender::Bot, "r1".to_string())]
        );
        assert_eq!(backend.calls(), vec![text_call("um")]);
        assert!(output(&repl).contains("aguarde a resposta anterior"));
    }

    #[tokio::test]
    async fn unreadable_line_is_skipped() {
        let backend = ScriptedBackend::default();
        let mut repl = repl(&backend, ScriptedMicrophone::default());

        repl.run(&b"\xff\xfe\noi\n"[..]).await.unwrap();

        assert_eq!(backend.calls(), vec![text_call("oi")]);
        assert_eq!(transcript(&repl)[1], (Sender::Bot, "ECHO: oi".to_string()));
    }

    #[tokio::test]
    async fn quit_does_not_wait_for_pending_reply() {
        let backend = ScriptedBackend::default().with_delay(Duration::from_secs(60));
        let mut repl = repl(&backend, ScriptedMicrophone::default());

        tokio::time::timeout(Duration::from_secs(2), repl.run(&b"oi\n/quit\n"[..]))
            .await
            .expect("quit waited for the backend")
            .unwrap();

        assert_eq!(transcript(&repl), vec![(Sender::User, "oi".to_string())]);
        assert!(repl.pending.is_none());
    }

    #[tokio::test]
    async fn unfinished_recording_is_dropped_on_exit() {
        let backend = ScriptedBackend::default();
        let mic = ScriptedMicrophone::new([MicScript::Chunks(vec![b"rec".to_vec()])]);
        let mut repl = repl(&backend, mic);

        repl.run(&b"/record\n"[..]).await.unwrap();

        assert!(!repl.recorder.is_recording());
        assert!(!repl.session.state().is_recording());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn plain_lines_are_text() {
        assert_eq!(Command::parse("olá /theme"), Command::Text("olá /theme"));
        assert_eq!(Command::parse("  "), Command::Text("  "));
    }

    #[test]
    fn slash_commands() {
        assert_eq!(Command::parse("/theme"), Command::Theme);
        assert_eq!(Command::parse(" /record "), Command::Record);
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/help"), Command::Help);
    }

    #[test]
    fn session_takes_argument() {
        assert_eq!(Command::parse("/session  loja-42 "), Command::Session("loja-42"));
        assert_eq!(Command::parse("/session"), Command::Session(""));
    }

    #[test]
    fn export_defaults_path() {
        assert_eq!(Command::parse("/export"), Command::Export(DEFAULT_EXPORT));
        assert_eq!(Command::parse("/export out.html"), Command::Export("out.html"));
    }

    #[test]
    fn unknown_command_is_reported() {
        assert_eq!(Command::parse("/nope x"), Command::Unknown("/nope x"));
    }
}
