//! Type definitions for the chat app
//!
//! `ChatView` is the transcript-side state the request bridge writes to.

use chat_host::{ChatSurface, InputState};
use services::cache::ChatRecord;
use std::time::{Duration, Instant};

/// How long an error banner stays up
pub const BANNER_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
}

/// Transient error message shown above the input
#[derive(Debug, Clone)]
pub struct Banner {
    pub message: String,
    pub shown_at: Instant,
}

impl Banner {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) >= BANNER_TTL
    }
}

pub struct ChatView {
    pub transcript: Vec<TranscriptEntry>,
    pub loading: bool,
    pub input_state: InputState,
    pub banner: Option<Banner>,
}

impl ChatView {
    pub fn new() -> Self {
        Self {
            transcript: Vec::new(),
            loading: false,
            input_state: InputState::Idle,
            banner: None,
        }
    }

    /// Rebuild the transcript from cached exchanges, oldest first
    pub fn load_history(&mut self, records: &[ChatRecord]) {
        for record in records {
            self.append_user(&record.user_message);
            self.append_assistant(&record.ai_response);
        }
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
        self.input_state = InputState::Idle;
    }

    /// Drop the banner once it has been up for [`BANNER_TTL`]
    pub fn expire_banner(&mut self, now: Instant) {
        if self.banner.as_ref().is_some_and(|b| b.is_expired(now)) {
            self.banner = None;
        }
    }
}

impl Default for ChatView {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSurface for ChatView {
    fn append_user(&mut self, text: &str) {
        self.transcript.push(TranscriptEntry {
            role: Role::User,
            text: text.to_string(),
        });
    }

    fn append_assistant(&mut self, text: &str) {
        self.transcript.push(TranscriptEntry {
            role: Role::Assistant,
            text: text.to_string(),
        });
    }

    fn show_loading(&mut self) {
        self.loading = true;
    }

    fn hide_loading(&mut self) {
        self.loading = false;
    }

    fn set_input_state(&mut self, state: InputState) {
        self.input_state = state;
    }

    fn show_banner(&mut self, message: &str) {
        self.banner = Some(Banner {
            message: message.to_string(),
            shown_at: Instant::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_load_history_order() {
        let records = vec![
            ChatRecord {
                id: 1,
                model: "m".into(),
                user_message: "q1".into(),
                ai_response: "a1".into(),
                timestamp: Utc::now(),
                tokens_used: 3,
            },
            ChatRecord {
                id: 2,
                model: "m".into(),
                user_message: "q2".into(),
                ai_response: "a2".into(),
                timestamp: Utc::now(),
                tokens_used: 4,
            },
        ];
        let mut view = ChatView::new();
        view.load_history(&records);

        let texts: Vec<_> = view.transcript.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["q1", "a1", "q2", "a2"]);
        assert_eq!(view.transcript[1].role, Role::Assistant);
    }

    #[test]
    fn test_banner_expires() {
        let mut view = ChatView::new();
        view.show_banner("boom");
        let shown_at = view.banner.as_ref().map(|b| b.shown_at).unwrap();

        view.expire_banner(shown_at + Duration::from_secs(4));
        assert!(view.banner.is_some());

        view.expire_banner(shown_at + BANNER_TTL);
        assert!(view.banner.is_none());
    }

    #[test]
    fn test_clear_resets_failed_input() {
        let mut view = ChatView::new();
        view.append_user("hi");
        view.set_input_state(InputState::Failed);
        view.clear();
        assert!(view.transcript.is_empty());
        assert_eq!(view.input_state, InputState::Idle);
    }
}
