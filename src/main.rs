// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod cli;
mod repl;

use std::io;
use std::path::Path;

use anyhow::Context;
use tracing::warn;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use chatweb_audio::AudioBlob;
use chatweb_client::HttpBackend;
use chatweb_config::{Config, FileSettingsStore, Settings, SettingsStore};
use chatweb_core::{ChatSession, Completion};
use chatweb_view::View;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Some(Commands::Completions { shell }) = &cli.command {
        cli::print_completions(*shell);
        return Ok(());
    }

    let mut config = chatweb_config::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    match &cli.command {
        Some(Commands::ShowConfig) => {
            print!("{}", toml::to_string(&config).context("serializing configuration")?);
            Ok(())
        }
        Some(Commands::Send { text }) => send_once(&config, text).await,
        Some(Commands::SendAudio { file }) => send_audio_once(&config, file).await,
        Some(Commands::Completions { .. }) | None => repl::run(&config, make_view(&config)).await,
    }
}

/// View wired to the settings file.  An unreadable file starts with defaults.
fn make_view(config: &Config) -> View {
    let store = FileSettingsStore::new(config.ui.settings_path());
    let settings = store.load().unwrap_or_else(|e| {
        warn!("failed to load settings from {}: {e:#}", store.path().display());
        Default::default()
    });
    View::new(settings, Box::new(move |s: &Settings| store.save(s)))
        .with_ascii(config.ui.ascii)
        .with_wrap_width(config.ui.wrap_width)
}

async fn send_once(config: &Config, text: &str) -> anyhow::Result<()> {
    let mut session = ChatSession::new(config.session.id.clone());
    let Some(request) = session.begin_text(text)? else {
        anyhow::bail!("message is empty");
    };
    let backend = HttpBackend::new(&config.backend);
    let completion = ChatSession::dispatch(&backend, request).await;
    finish_once(config, session, completion)
}

async fn send_audio_once(config: &Config, file: &Path) -> anyhow::Result<()> {
    let blob = AudioBlob::read_file(file, config.audio.mime.clone(), config.audio.file_name.clone())
        .with_context(|| format!("reading {}", file.display()))?;
    let mut session = ChatSession::new(config.session.id.clone());
    let request = session.begin_audio(blob)?;
    let backend = HttpBackend::new(&config.backend);
    let completion = ChatSession::dispatch(&backend, request).await;
    finish_once(config, session, completion)
}

/// Print the outcome of a one-shot exchange; a failed exchange is an error
/// exit after the generic message has been shown.
fn finish_once(config: &Config, mut session: ChatSession, completion: Completion) -> anyhow::Result<()> {
    let ok = completion.is_ok();
    session.finish(completion);
    let mut view = make_view(config);
    view.render_updates(session.state(), &mut io::stdout())?;
    if !ok {
        anyhow::bail!("backend request failed");
    }
    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
