use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    #[default]
    Offline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub status: PresenceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
}

impl User {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            avatar: None,
            status: PresenceStatus::Offline,
            last_seen: None,
            about: None,
        }
    }

    pub fn with_status(mut self, status: PresenceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_last_seen(mut self, last_seen: &str) -> Self {
        self.last_seen = Some(last_seen.to_string());
        self
    }

    pub fn with_about(mut self, about: &str) -> Self {
        self.about = Some(about.to_string());
        self
    }
}

/// Delivery progression of a message. Variants are declared in transition
/// order so `Ord` matches the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Delivered,
    Read,
}

impl DeliveryStatus {
    /// Moves to `next` only if it lies ahead of the current status.
    /// Returns whether the status changed.
    pub fn advance_to(&mut self, next: DeliveryStatus) -> bool {
        if next > *self {
            *self = next;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
    Image,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub content: String,
    pub sender_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub status: DeliveryStatus,
    #[serde(default, rename = "type")]
    pub content_type: ContentType,
}

impl Message {
    /// A freshly composed text message from `sender`, not yet delivered.
    pub fn outgoing(sender: &User, content: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            sender_id: sender.id.clone(),
            sender_name: Some(sender.name.clone()),
            timestamp: Utc::now(),
            status: DeliveryStatus::Sent,
            content_type: ContentType::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub description: String,
    pub members: Vec<User>,
    #[serde(default)]
    pub admins: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl GroupInfo {
    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admins.contains(user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    /// The other party. Group conversations carry a placeholder user named
    /// after the group, the real roster lives in `group`.
    pub participant: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupInfo>,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<Message>,
    pub unread_count: u32,
    pub pinned: bool,
    pub muted: bool,
}

impl Conversation {
    pub fn direct(id: &str, participant: User) -> Self {
        Self {
            id: id.to_string(),
            participant,
            group: None,
            messages: Vec::new(),
            last_message: None,
            unread_count: 0,
            pinned: false,
            muted: false,
        }
    }

    pub fn group(id: &str, info: GroupInfo) -> Self {
        let mut placeholder = User::new(id, &info.name);
        placeholder.avatar = info.avatar.clone();
        placeholder.about = Some(info.description.clone());

        Self {
            group: Some(info),
            ..Self::direct(id, placeholder)
        }
    }

    pub fn is_group(&self) -> bool {
        self.group.is_some()
    }

    pub fn display_name(&self) -> &str {
        match &self.group {
            Some(info) => &info.name,
            None => &self.participant.name,
        }
    }

    /// Appends to the log and refreshes the cached `last_message`.
    pub fn push_message(&mut self, message: Message) {
        self.last_message = Some(message.clone());
        self.messages.push(message);
    }

    pub fn message_mut(&mut self, message_id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == message_id)
    }

    /// Re-derives `last_message` after an in-place edit of the log.
    pub(crate) fn sync_last_message(&mut self) {
        self.last_message = self.messages.last().cloned();
    }
}
