// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod schema;
mod loader;
mod settings;

pub use schema::*;
pub use loader::{load, API_URL_ENV};
pub use settings::{
    default_settings_path, FileSettingsStore, MemorySettingsStore, Settings, SettingsStore,
    Theme, THEME_KEY,
};
