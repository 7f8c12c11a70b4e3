//! Chat history export to JSON files.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::ChatRecord;

/// Exported record shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportEntry {
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub user_message: String,
    pub ai_response: String,
    pub tokens_used: u64,
}

impl From<&ChatRecord> for ExportEntry {
    fn from(record: &ChatRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            model: record.model.clone(),
            user_message: record.user_message.clone(),
            ai_response: record.ai_response.clone(),
            tokens_used: record.tokens_used,
        }
    }
}

pub fn export_file_name(now: DateTime<Local>) -> String {
    format!("chat_history_{}.json", now.format("%Y%m%d_%H%M%S"))
}

/// Write `records` as a pretty JSON array into `dir`. Returns the file path.
pub fn export_history(records: &[ChatRecord], dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating export directory {}", dir.display()))?;

    let entries: Vec<ExportEntry> = records.iter().map(ExportEntry::from).collect();
    let json = serde_json::to_string_pretty(&entries)?;

    let path = dir.join(export_file_name(Local::now()));
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;

    tracing::info!(path = %path.display(), records = entries.len(), "Exported chat history");
    Ok(path)
}
