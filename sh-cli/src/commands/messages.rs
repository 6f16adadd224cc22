//! Conversation and message commands. All act as the session user.

use clap::Subcommand;
use console::style;

use sh_core::config::ConfigHandle;
use sh_core::error::{ShError, ShResult};
use sh_services::SessionContext;

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum MessagesAction {
    /// List the user's conversations, most recent first.
    Conversations,
    /// Show the messages of a conversation.
    List {
        /// Conversation id.
        conversation: String,
        /// Only the last N messages.
        #[arg(short = 'n', long)]
        limit: Option<u64>,
    },
    /// Send a message.
    Send {
        /// Conversation id.
        #[arg(long, conflicts_with = "with")]
        conversation: Option<String>,
        /// Provider to write to. Opens the conversation if needed.
        #[arg(long)]
        with: Option<String>,
        /// Message text.
        text: String,
    },
    /// Mark the other participant's messages as read.
    Read {
        /// Conversation id.
        conversation: String,
    },
}

pub async fn run(
    config: ConfigHandle,
    session: SessionContext,
    action: MessagesAction,
    format: OutputFormat,
) -> ShResult<()> {
    let registry = super::init_registry(&config, session).await;
    let messaging = registry.messaging();
    let user = registry.session.resolve_user(None).await?;

    match action {
        MessagesAction::Conversations => {
            let conversations = messaging.conversations(&user).await?;
            match format {
                OutputFormat::Json => super::print_json(&conversations),
                OutputFormat::Text => {
                    if conversations.is_empty() {
                        println!("No conversations.");
                    } else {
                        let mut table = super::new_table(vec!["Id", "With", "Last message", "At"]);
                        for c in &conversations {
                            let other = if c.client_id == user { &c.provider_id } else { &c.client_id };
                            table.add_row(vec![
                                c.id.clone(),
                                super::truncate(other, 12),
                                super::truncate(c.last_message.as_deref().unwrap_or(""), 40),
                                super::format_datetime(c.last_message_at.as_ref()),
                            ]);
                        }
                        println!("{table}");
                    }
                }
            }
        }
        MessagesAction::List { conversation, limit } => {
            let messages = messaging.messages(&conversation, limit).await?;
            match format {
                OutputFormat::Json => super::print_json(&messages),
                OutputFormat::Text => {
                    if messages.is_empty() {
                        println!("No messages.");
                    }
                    for m in &messages {
                        let who = if m.sender_id == user {
                            style("you".to_string()).cyan().bold()
                        } else {
                            style(super::truncate(&m.sender_id, 12)).bold()
                        };
                        let unread = if !m.is_read && m.sender_id != user { " *" } else { "" };
                        println!(
                            "  {} {}{unread}: {}",
                            style(super::format_datetime(m.created_at.as_ref())).dim(),
                            who,
                            m.content
                        );
                    }
                }
            }
        }
        MessagesAction::Send { conversation, with, text } => {
            let conversation_id = match (conversation, with) {
                (Some(id), _) => id,
                (None, Some(provider)) => {
                    messaging.get_or_create_conversation(&user, &provider).await?.id
                }
                (None, None) => {
                    return Err(ShError::InvalidInput(
                        "pass --conversation or --with".into(),
                    ))
                }
            };
            let message = messaging.send(&conversation_id, &user, &text).await?;
            match format {
                OutputFormat::Json => super::print_json(&message),
                OutputFormat::Text => {
                    println!(
                        "  {} Sent to conversation {}",
                        style("OK").green().bold(),
                        message.conversation_id
                    );
                }
            }
        }
        MessagesAction::Read { conversation } => {
            let count = messaging.mark_read(&conversation, &user).await?;
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({ "marked_read": count })),
                OutputFormat::Text => println!("  Marked {count} message(s) read."),
            }
        }
    }

    super::print_toasts(&registry.notifications, format);
    Ok(())
}
