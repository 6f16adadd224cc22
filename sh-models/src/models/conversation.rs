//! Conversation (`conversations`) and chat message (`messages`) rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::serde_ext;

/// A one-to-one thread between a client and a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(deserialize_with = "serde_ext::id")]
    pub id: String,
    #[serde(deserialize_with = "serde_ext::id")]
    pub client_id: String,
    #[serde(deserialize_with = "serde_ext::id")]
    pub provider_id: String,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Whether `user_id` is one of the two participants.
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.client_id == user_id || self.provider_id == user_id
    }

    /// The participant that is not `user_id`.
    pub fn other_participant(&self, user_id: &str) -> Option<&str> {
        if self.client_id == user_id {
            Some(&self.provider_id)
        } else if self.provider_id == user_id {
            Some(&self.client_id)
        } else {
            None
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(deserialize_with = "serde_ext::id")]
    pub id: String,
    #[serde(deserialize_with = "serde_ext::id")]
    pub conversation_id: String,
    #[serde(deserialize_with = "serde_ext::id")]
    pub sender_id: String,
    pub content: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation() -> Conversation {
        serde_json::from_value(serde_json::json!({
            "id": "c-1",
            "client_id": "client",
            "provider_id": "provider",
            "last_message_at": "2024-06-01T08:30:00+00:00"
        }))
        .unwrap()
    }

    #[test]
    fn test_other_participant() {
        let conv = conversation();
        assert_eq!(conv.other_participant("client"), Some("provider"));
        assert_eq!(conv.other_participant("provider"), Some("client"));
        assert_eq!(conv.other_participant("stranger"), None);
        assert!(!conv.has_participant("stranger"));
        assert!(conv.last_message_at.is_some());
    }
}
