// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;

use chatweb_config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "chatweb",
    about = "Terminal chat client for a conversational HTTP backend",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config file (overrides auto-discovery)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Backend base URL, e.g. "http://localhost:8000".
    /// Empty means relative to backend.origin.
    #[arg(long, env = "CHATWEB_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Session id sent with every text message
    #[arg(long, short = 's', value_name = "ID")]
    pub session: Option<String>,

    /// Plain terminal output without colours
    #[arg(long)]
    pub ascii: bool,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one text message, print the reply and exit
    Send {
        #[arg(value_name = "TEXT")]
        text: String,
    },
    /// Upload an existing WebM recording, print the reply and exit
    SendAudio {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the effective configuration and exit
    ShowConfig,
    /// Generate shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Command-line values take priority over every config layer.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = self.api_url.as_deref().filter(|u| !u.trim().is_empty()) {
            config.backend.base_url = url.to_string();
        }
        if let Some(id) = &self.session {
            config.session.id = id.clone();
        }
        if self.ascii {
            config.ui.ascii = true;
        }
    }
}

pub fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "chatweb", &mut std::io::stdout());
}
