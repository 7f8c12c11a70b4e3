//! Local chat history cache.
//!
//! Every completed exchange is appended to a SQLite table. Reads return
//! records in insertion order.

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One stored exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: i64,
    pub model: String,
    pub user_message: String,
    pub ai_response: String,
    pub timestamp: DateTime<Utc>,
    pub tokens_used: u64,
}

pub struct ChatCache {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl ChatCache {
    /// Open (or create) the cache database inside `data_dir`
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join("chat_cache.db");
        let conn = Connection::open(&db_path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        })
    }

    /// Throwaway cache, mostly for tests
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                model TEXT NOT NULL,
                user_message TEXT NOT NULL,
                ai_response TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                tokens_used INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;
        Ok(())
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Append one exchange. Returns the new row id.
    pub fn save_message(
        &self,
        model: &str,
        user_message: &str,
        ai_response: &str,
        tokens_used: u64,
    ) -> Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO messages (model, user_message, ai_response, timestamp, tokens_used)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                model,
                user_message,
                ai_response,
                Utc::now().timestamp(),
                tokens_used as i64
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// All records, oldest first
    pub fn get_chat_history(&self) -> Result<Vec<ChatRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, model, user_message, ai_response, timestamp, tokens_used
             FROM messages ORDER BY id ASC",
        )?;
        let records = stmt
            .query_map([], |row| {
                let ts: i64 = row.get(4)?;
                let tokens: i64 = row.get(5)?;
                Ok(ChatRecord {
                    id: row.get(0)?,
                    model: row.get(1)?,
                    user_message: row.get(2)?,
                    ai_response: row.get(3)?,
                    timestamp: Utc.timestamp_opt(ts, 0).single().unwrap_or_default(),
                    tokens_used: tokens.max(0) as u64,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    pub fn clear_history(&self) -> Result<()> {
        self.conn.lock().execute("DELETE FROM messages", [])?;
        Ok(())
    }

    pub fn message_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_cache() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ChatCache::open(temp_dir.path()).unwrap();
        assert_eq!(cache.message_count().unwrap(), 0);
        assert!(cache.db_path().unwrap().ends_with("chat_cache.db"));
    }

    #[test]
    fn test_history_in_insertion_order() {
        let cache = ChatCache::in_memory().unwrap();
        cache.save_message("openai/gpt-4o-mini", "first", "one", 10).unwrap();
        cache.save_message("openai/gpt-4o-mini", "second", "two", 20).unwrap();
        cache.save_message("anthropic/claude-3.5-sonnet", "third", "three", 0).unwrap();

        let history = cache.get_chat_history().unwrap();
        let users: Vec<&str> = history.iter().map(|r| r.user_message.as_str()).collect();
        assert_eq!(users, vec!["first", "second", "third"]);
        assert_eq!(history[1].tokens_used, 20);
        assert_eq!(history[2].model, "anthropic/claude-3.5-sonnet");
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let cache = ChatCache::open(temp_dir.path()).unwrap();
            cache.save_message("m", "Привет", "Здравствуйте", 5).unwrap();
        }
        let cache = ChatCache::open(temp_dir.path()).unwrap();
        let history = cache.get_chat_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].ai_response, "Здравствуйте");
    }

    #[test]
    fn test_clear_history() {
        let cache = ChatCache::in_memory().unwrap();
        cache.save_message("m", "q", "a", 1).unwrap();
        cache.clear_history().unwrap();
        assert!(cache.get_chat_history().unwrap().is_empty());
    }
}
