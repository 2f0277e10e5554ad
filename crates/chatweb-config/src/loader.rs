// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::Config;

/// Environment variable overriding `backend.base_url`.
pub const API_URL_ENV: &str = "CHATWEB_API_URL";

/// Ordered list of config file locations searched from lowest to highest priority.
/// Later files override earlier ones.
fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // 1. System-wide default
    paths.push(PathBuf::from("/etc/chatweb/config.toml"));

    // 2. XDG / home
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config/chatweb/config.toml"));
    }
    if let Some(cfg) = dirs::config_dir() {
        paths.push(cfg.join("chatweb/config.toml"));
    }

    // 3. Working-directory local
    paths.push(PathBuf::from(".chatweb/config.toml"));
    paths.push(PathBuf::from("chatweb.toml"));

    paths
}

/// Load configuration by merging all discovered TOML files, then applying the
/// `CHATWEB_API_URL` override.
/// The `extra` argument may provide an explicit path (e.g. `--config` CLI flag).
pub fn load(extra: Option<&Path>) -> anyhow::Result<Config> {
    let mut merged = toml::Value::Table(toml::map::Map::new());

    for path in config_search_paths() {
        if path.is_file() {
            debug!(path = %path.display(), "loading config layer");
            merge_toml(&mut merged, read_layer(&path)?);
        }
    }

    if let Some(p) = extra {
        debug!(path = %p.display(), "loading explicit config");
        merge_toml(&mut merged, read_layer(p)?);
    }

    let config: Config = merged.try_into().context("invalid configuration")?;
    Ok(apply_env(config, std::env::var(API_URL_ENV).ok()))
}

fn read_layer(path: &Path) -> anyhow::Result<toml::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// A non-empty API URL from the environment replaces the configured base.
fn apply_env(mut config: Config, api_url: Option<String>) -> Config {
    if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
        debug!(url = %url, "backend base url from {API_URL_ENV}");
        config.backend.base_url = url;
    }
    config
}

/// Deep-merge `src` into `dst`; src wins on scalar conflicts.
fn merge_toml(dst: &mut toml::Value, src: toml::Value) {
    match (dst, src) {
        (toml::Value::Table(d), toml::Value::Table(s)) => {
            for (k, v) in s {
                let entry = d.entry(k).or_insert(toml::Value::Table(toml::map::Map::new()));
                merge_toml(entry, v);
            }
        }
        (dst, src) => *dst = src,
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn val(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn merge_scalar_src_wins() {
        let mut dst = val(r#"x = 1"#);
        let src = val(r#"x = 2"#);
        merge_toml(&mut dst, src);
        assert_eq!(dst["x"].as_integer(), Some(2));
    }

    #[test]
    fn merge_nested_tables() {
        let mut dst = val(r#"[backend]
base_url = "http://a"
origin = "http://o""#);
        let src = val(r#"[backend]
base_url = "http://b""#);
        merge_toml(&mut dst, src);
        assert_eq!(dst["backend"]["origin"].as_str(), Some("http://o"));
        assert_eq!(dst["backend"]["base_url"].as_str(), Some("http://b"));
    }

    #[test]
    fn merge_replaces_arrays_wholesale() {
        let mut dst = val(r#"[audio]
args = ["a", "b"]"#);
        let src = val(r#"[audio]
args = ["c"]"#);
        merge_toml(&mut dst, src);
        assert_eq!(dst["audio"]["args"].as_array().map(|a| a.len()), Some(1));
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let result = load(Some(Path::new("/tmp/chatweb_nonexistent_config_xyz.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn explicit_file_overrides_defaults() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, r#"[session]
id = "loja-42"

[ui]
ascii = true"#).unwrap();
        let cfg = load(Some(f.path())).unwrap();
        assert_eq!(cfg.session.id, "loja-42");
        assert!(cfg.ui.ascii);
    }

    #[test]
    fn invalid_types_are_reported() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[ui]\nwrap_width = \"wide\"").unwrap();
        assert!(load(Some(f.path())).is_err());
    }

    #[test]
    fn env_url_overrides_base() {
        let cfg = apply_env(Config::default(), Some("http://env:8000/".into()));
        assert_eq!(cfg.backend.base_url, "http://env:8000/");
        assert_eq!(cfg.backend.endpoint("/chat"), "http://env:8000/chat");
    }

    #[test]
    fn empty_env_url_is_ignored() {
        let mut base = Config::default();
        base.backend.base_url = "http://file".into();
        let cfg = apply_env(base, Some(String::new()));
        assert_eq!(cfg.backend.base_url, "http://file");
    }
}
