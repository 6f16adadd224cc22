//! Client/provider messaging.

use chrono::Utc;
use tracing::{debug, info};

use sh_api::endpoints::conversations::{NewConversation, NewMessage};
use sh_api::Backend;
use sh_core::error::{ShError, ShResult};
use sh_models::{Conversation, Message};

use crate::event_bus::{AppEvent, EventBus};
use crate::service::{impl_service, ServiceState};

/// Longest message accepted, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;

pub struct MessagingService {
    state: ServiceState,
    backend: Backend,
    event_bus: EventBus,
}

impl MessagingService {
    pub fn new(backend: Backend, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            backend,
            event_bus,
        }
    }

    /// The conversation between a client and a provider, created on first use.
    pub async fn get_or_create_conversation(
        &self,
        client_id: &str,
        provider_id: &str,
    ) -> ShResult<Conversation> {
        if client_id == provider_id {
            return Err(ShError::InvalidInput(
                "a conversation needs two different participants".into(),
            ));
        }
        let api = self.backend.client()?;
        if let Some(existing) = api.find_conversation(client_id, provider_id).await? {
            return Ok(existing);
        }
        let created = api
            .create_conversation(&NewConversation {
                client_id: client_id.to_string(),
                provider_id: provider_id.to_string(),
            })
            .await?;
        info!("conversation {} opened", created.id);
        Ok(created)
    }

    pub async fn conversations(&self, user_id: &str) -> ShResult<Vec<Conversation>> {
        self.backend.client()?.conversations_for_user(user_id).await
    }

    /// Send a message. Content is trimmed; empty content is rejected.
    pub async fn send(
        &self,
        conversation_id: &str,
        sender_id: &str,
        content: &str,
    ) -> ShResult<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ShError::InvalidInput("message is empty".into()));
        }
        if content.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ShError::InvalidInput(format!(
                "message is longer than {MAX_MESSAGE_CHARS} characters"
            )));
        }

        let api = self.backend.client()?;
        let conversation = api.get_conversation(conversation_id).await?;
        if !conversation.has_participant(sender_id) {
            return Err(ShError::InvalidInput(format!(
                "{sender_id} is not part of conversation {conversation_id}"
            )));
        }

        let message = api
            .insert_message(&NewMessage {
                conversation_id: conversation_id.to_string(),
                sender_id: sender_id.to_string(),
                content: content.to_string(),
            })
            .await?;

        let sent_at = message.created_at.unwrap_or_else(Utc::now);
        api.set_last_message(conversation_id, content, sent_at).await?;

        debug!("message {} sent in {conversation_id}", message.id);
        self.event_bus.emit(AppEvent::MessageSent {
            conversation_id: conversation_id.to_string(),
            message_id: message.id.clone(),
        });
        Ok(message)
    }

    /// Messages oldest first.
    pub async fn messages(&self, conversation_id: &str, limit: Option<u64>) -> ShResult<Vec<Message>> {
        self.backend
            .client()?
            .list_messages(conversation_id, limit)
            .await
    }

    /// Mark the other participant's messages read. Returns how many changed.
    pub async fn mark_read(&self, conversation_id: &str, reader_id: &str) -> ShResult<usize> {
        let count = self
            .backend
            .client()?
            .mark_messages_read(conversation_id, reader_id)
            .await?;
        if count > 0 {
            self.event_bus.emit(AppEvent::MessagesRead {
                conversation_id: conversation_id.to_string(),
                count,
            });
        }
        Ok(count)
    }
}

impl_service!(MessagingService, "messaging");
