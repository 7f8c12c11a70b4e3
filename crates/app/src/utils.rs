//! Utility functions for the chat app
//!
//! Paths, settings persistence and logging setup.

use shared::settings::AppSettings;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com.local", "AIChat", "AIChat")
}

/// Get the config file path
pub fn config_path() -> Option<PathBuf> {
    project_dirs().map(|proj| proj.config_dir().join("settings.json"))
}

/// Directory for the cache database, logs and exports
pub fn data_dir() -> PathBuf {
    project_dirs()
        .map(|proj| proj.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".aichat"))
}

/// Export directory from settings, or `<data dir>/exports`
pub fn exports_dir(settings: &AppSettings, data_dir: &Path) -> PathBuf {
    match settings.exports_dir.as_deref().map(str::trim) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => data_dir.join("exports"),
    }
}

/// Load settings from disk or return defaults.
///
/// The flag is true when the settings came from an existing file.
pub fn load_settings_or_default() -> (AppSettings, bool) {
    if let Some(path) = config_path() {
        if let Ok(contents) = std::fs::read_to_string(&path) {
            match serde_json::from_str::<AppSettings>(&contents) {
                Ok(settings) => return (settings, true),
                Err(e) => {
                    // Logging isn't up yet
                    eprintln!("Ignoring unreadable settings at {}: {}", path.display(), e);
                }
            }
        }
    }
    (AppSettings::default(), false)
}

/// Save settings to disk
pub fn save_settings(settings: &AppSettings) {
    if let Some(path) = config_path() {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(json) = serde_json::to_string_pretty(settings) {
            if let Err(e) = std::fs::write(&path, json) {
                tracing::warn!(path = %path.display(), error = %e, "Failed to save settings");
            }
        }
    }
}

/// Log to stderr and to `<data dir>/logs/app.log`.
///
/// `RUST_LOG` overrides the default `info` filter. If the log file can't be
/// opened only stderr is used.
pub fn init_tracing(data_dir: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = data_dir.join("logs");
    let file = std::fs::create_dir_all(&log_dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join("app.log"))
    });

    let file_layer = match file {
        Ok(f) => Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(f)),
        ),
        Err(e) => {
            eprintln!("File logging disabled: {}", e);
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
}
