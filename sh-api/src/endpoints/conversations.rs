//! Conversation and message endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sh_core::constants::tables;
use sh_core::error::{ShError, ShResult};
use sh_models::{Conversation, Message};

use crate::client::ApiClient;
use crate::query::{Order, Query};

/// Row inserted to open a conversation.
#[derive(Debug, Clone, Serialize)]
pub struct NewConversation {
    pub client_id: String,
    pub provider_id: String,
}

/// Row inserted to send a message.
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub conversation_id: String,
    pub sender_id: String,
    pub content: String,
}

#[derive(Serialize)]
struct LastMessage<'a> {
    last_message: &'a str,
    last_message_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ReadFlag {
    is_read: bool,
}

impl ApiClient {
    /// The conversation between a client and a provider, if one exists.
    pub async fn find_conversation(
        &self,
        client_id: &str,
        provider_id: &str,
    ) -> ShResult<Option<Conversation>> {
        let query = Query::new()
            .eq("client_id", client_id)
            .eq("provider_id", provider_id);
        self.select_one(tables::CONVERSATIONS, &query).await
    }

    pub async fn create_conversation(&self, row: &NewConversation) -> ShResult<Conversation> {
        self.insert_one(tables::CONVERSATIONS, row).await
    }

    pub async fn get_conversation(&self, id: &str) -> ShResult<Conversation> {
        self.select_one(tables::CONVERSATIONS, &Query::new().eq("id", id))
            .await?
            .ok_or_else(|| ShError::not_found(tables::CONVERSATIONS, id))
    }

    /// Conversations a user takes part in, most recently active first.
    pub async fn conversations_for_user(&self, user_id: &str) -> ShResult<Vec<Conversation>> {
        let query = Query::new()
            .any_eq(&["client_id", "provider_id"], user_id)
            .order("last_message_at", Order::Desc);
        self.select(tables::CONVERSATIONS, &query).await
    }

    /// Update the conversation preview after a message was sent.
    pub async fn set_last_message(
        &self,
        conversation_id: &str,
        content: &str,
        at: DateTime<Utc>,
    ) -> ShResult<()> {
        let _: Vec<Conversation> = self
            .update(
                tables::CONVERSATIONS,
                &Query::new().eq("id", conversation_id),
                &LastMessage {
                    last_message: content,
                    last_message_at: at,
                },
            )
            .await?;
        Ok(())
    }

    /// Messages of a conversation, oldest first.
    pub async fn list_messages(
        &self,
        conversation_id: &str,
        limit: Option<u64>,
    ) -> ShResult<Vec<Message>> {
        let mut query = Query::new()
            .eq("conversation_id", conversation_id)
            .order("created_at", Order::Asc);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        self.select(tables::MESSAGES, &query).await
    }

    pub async fn insert_message(&self, row: &NewMessage) -> ShResult<Message> {
        self.insert_one(tables::MESSAGES, row).await
    }

    /// Mark every unread message not sent by `reader_id` as read.
    /// Returns how many messages changed.
    pub async fn mark_messages_read(
        &self,
        conversation_id: &str,
        reader_id: &str,
    ) -> ShResult<usize> {
        let query = Query::new()
            .eq("conversation_id", conversation_id)
            .neq("sender_id", reader_id)
            .eq("is_read", false)
            .select("id");
        let changed: Vec<serde_json::Value> = self
            .update(tables::MESSAGES, &query, &ReadFlag { is_read: true })
            .await?;
        Ok(changed.len())
    }
}
