//! Messaging service for complaint threads.
//!
//! A thread has exactly two participants: the complaint owner and the admin
//! assigned to it. Until an admin is assigned there is nobody to talk to.

use crate::services::complaint::visible_complaint;
use crate::services::event_publisher::{ChangeEvent, EventPublisherService};
use crate::viewer::Viewer;
use chrono::Utc;
use connect_common::{AppError, AppResult, IdGenerator};
use connect_db::{
    entities::{complaint, message},
    repositories::{ComplaintRepository, MessageRepository, ProfileRepository},
};
use sea_orm::Set;
use std::collections::HashMap;
use tracing::{info, warn};

/// Longest message body accepted.
pub const MAX_MESSAGE_CHARS: usize = 5000;

/// Input for sending a message.
#[derive(Debug, Clone)]
pub struct SendMessageInput {
    pub text: String,
    pub attachment_url: Option<String>,
}

/// A message with its sender resolved for display.
#[derive(Debug, Clone)]
pub struct MessageItem {
    pub message: message::Model,
    pub sender_name: Option<String>,
    /// The sender is the anonymous owner, hidden from this viewer.
    pub sender_hidden: bool,
    /// The receiver is the anonymous owner, hidden from this viewer.
    pub receiver_hidden: bool,
}

/// Work out who receives a message `sender` posts on `complaint`.
pub fn resolve_receiver(complaint: &complaint::Model, sender: &Viewer) -> AppResult<String> {
    let assigned = complaint.assigned_admin_id.as_deref();

    if sender.is_admin() {
        match assigned {
            Some(admin_id) if admin_id == sender.id => Ok(complaint.user_id.clone()),
            Some(_) => Err(AppError::Forbidden(
                "only the assigned admin can message on this complaint".to_string(),
            )),
            None => Err(AppError::NoRecipient(format!("complaint {}", complaint.id))),
        }
    } else {
        assigned
            .map(ToString::to_string)
            .ok_or_else(|| AppError::NoRecipient(format!("complaint {}", complaint.id)))
    }
}

/// Messaging service.
#[derive(Clone)]
pub struct MessagingService {
    message_repo: MessageRepository,
    complaint_repo: ComplaintRepository,
    profile_repo: ProfileRepository,
    event_publisher: Option<EventPublisherService>,
    id_gen: IdGenerator,
}

impl MessagingService {
    /// Create a new messaging service.
    #[must_use]
    pub const fn new(
        message_repo: MessageRepository,
        complaint_repo: ComplaintRepository,
        profile_repo: ProfileRepository,
    ) -> Self {
        Self {
            message_repo,
            complaint_repo,
            profile_repo,
            event_publisher: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher.
    pub fn set_event_publisher(&mut self, event_publisher: EventPublisherService) {
        self.event_publisher = Some(event_publisher);
    }

    /// Post a message on a complaint thread.
    pub async fn send_message(
        &self,
        viewer: &Viewer,
        complaint_id: &str,
        input: SendMessageInput,
    ) -> AppResult<MessageItem> {
        let text = input.text.trim();
        let length = text.chars().count();
        if length == 0 || length > MAX_MESSAGE_CHARS {
            return Err(AppError::Validation(format!(
                "message must be 1 to {MAX_MESSAGE_CHARS} characters"
            )));
        }

        let complaint = visible_complaint(&self.complaint_repo, viewer, complaint_id).await?;
        let receiver_id = resolve_receiver(&complaint, viewer)?;
        let sender_name = self
            .profile_repo
            .find_by_id(&viewer.id)
            .await?
            .map(|p| p.full_name);

        let model = message::ActiveModel {
            id: Set(self.id_gen.generate()),
            complaint_id: Set(complaint.id.clone()),
            sender_id: Set(viewer.id.clone()),
            receiver_id: Set(receiver_id),
            message_text: Set(text.to_string()),
            attachment_url: Set(input.attachment_url),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
        };

        let message = self.message_repo.create(model).await?;
        info!(complaint_id = %complaint.id, message_id = %message.id, sender = %viewer.id, "Message sent");

        if let Some(ref event_publisher) = self.event_publisher {
            if let Err(e) = event_publisher.publish_message_created(&message).await {
                warn!(error = %e, "Failed to publish message event");
            }
        }

        Ok(MessageItem {
            message,
            sender_name,
            sender_hidden: false,
            receiver_hidden: viewer.is_admin() && complaint.is_anonymous,
        })
    }

    /// Messages of a thread, oldest first.
    pub async fn list_messages(
        &self,
        viewer: &Viewer,
        complaint_id: &str,
    ) -> AppResult<Vec<MessageItem>> {
        let complaint = visible_complaint(&self.complaint_repo, viewer, complaint_id).await?;
        let messages = self.message_repo.find_by_complaint(complaint_id).await?;

        let mut sender_ids: Vec<String> = messages.iter().map(|m| m.sender_id.clone()).collect();
        sender_ids.sort();
        sender_ids.dedup();

        let names: HashMap<String, String> = self
            .profile_repo
            .find_by_ids(&sender_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p.full_name))
            .collect();

        let hide_owner = viewer.is_admin() && complaint.is_anonymous;

        Ok(messages
            .into_iter()
            .map(|message| {
                let sender_hidden = hide_owner && message.sender_id == complaint.user_id;
                let receiver_hidden = hide_owner && message.receiver_id == complaint.user_id;
                let sender_name = if sender_hidden {
                    Some("Anonymous".to_string())
                } else {
                    names.get(&message.sender_id).cloned()
                };
                MessageItem {
                    message,
                    sender_name,
                    sender_hidden,
                    receiver_hidden,
                }
            })
            .collect())
    }

    /// Mark the viewer's unread messages in a thread as read.
    pub async fn mark_read(&self, viewer: &Viewer, complaint_id: &str) -> AppResult<u64> {
        let complaint = visible_complaint(&self.complaint_repo, viewer, complaint_id).await?;
        let flipped = self.message_repo.mark_read(&complaint.id, &viewer.id).await?;

        if flipped > 0
            && let Some(ref event_publisher) = self.event_publisher
            && let Err(e) = event_publisher
                .publish(ChangeEvent::thread_read(&complaint.id, &viewer.id))
                .await
        {
            warn!(error = %e, "Failed to publish read event");
        }

        Ok(flipped)
    }

    /// Unread counts per complaint for the viewer.
    pub async fn unread_by_complaint(&self, viewer: &Viewer) -> AppResult<HashMap<String, i64>> {
        Ok(self
            .message_repo
            .count_unread_by_complaint(&viewer.id)
            .await?
            .into_iter()
            .collect())
    }
}
