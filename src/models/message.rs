// Chat models: sessions and their messages
// Paths: users/{uid}/chat_sessions/{session_id}
//        users/{uid}/chat_sessions/{session_id}/messages/{message_id}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest preview stored on the session document
pub const PREVIEW_LEN: usize = 100;
/// Longest auto-generated title
pub const TITLE_LEN: usize = 40;

/// A chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: String,
    pub text: String,
    /// true for messages typed by the user, false for assistant replies
    pub is_user: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new user message
    pub fn human(text: String) -> Self {
        Self::new(text, true)
    }

    /// Create a new assistant message
    pub fn ai(text: String) -> Self {
        Self::new(text, false)
    }

    fn new(text: String, is_user: bool) -> Self {
        // ULIDs sort lexically in creation order
        Self {
            id: ulid::Ulid::new().to_string(),
            text,
            is_user,
            created_at: Utc::now(),
        }
    }
}

/// A chat session with denormalized preview fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub message_count: i64,
    /// Title still the placeholder, so the first user message may replace it
    #[serde(default)]
    pub default_title: bool,
}

impl ChatSession {
    /// Create a new chat session
    pub fn new(title: Option<String>, default_title: &str) -> Self {
        let now = Utc::now();
        let (title, is_default) = match title.map(|t| t.trim().to_string()) {
            Some(t) if !t.is_empty() => (t, false),
            _ => (default_title.to_string(), true),
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            created_at: now,
            updated_at: now,
            last_message: None,
            message_count: 0,
            default_title: is_default,
        }
    }
}

/// Shorten `text` to at most `max` characters, adding an ellipsis when cut
pub fn truncate_chars(text: &str, max: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

/// Request to create a session
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// Request to rename a session
#[derive(Debug, Clone, Deserialize)]
pub struct RenameSessionRequest {
    pub title: String,
}

/// Request to send a message
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

/// Response for send message: the stored user message and the reply
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageResponse {
    pub user_message: Message,
    pub reply: Message,
    /// true when the reply came from the offline responder
    pub fallback: bool,
}

/// Query parameters for getting messages
#[derive(Debug, Clone, Deserialize)]
pub struct GetMessagesQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_ids_sort_in_creation_order() {
        let first = Message::human("one".to_string());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = Message::ai("two".to_string());
        assert!(first.id < second.id);
        assert!(first.is_user);
        assert!(!second.is_user);
    }

    #[test]
    fn test_session_uses_default_title_when_blank() {
        let s = ChatSession::new(Some("   ".to_string()), "New chat");
        assert_eq!(s.title, "New chat");
        assert!(s.default_title);

        let s = ChatSession::new(Some("Sleep".to_string()), "New chat");
        assert_eq!(s.title, "Sleep");
        assert!(!s.default_title);
        assert_eq!(s.message_count, 0);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("  short  ", 10), "short");
        assert_eq!(truncate_chars("abcdefghij", 5), "abcd…");
        // Counts characters, not bytes
        assert_eq!(truncate_chars("ñandú ñandú", 6), "ñandú…");
    }
}
