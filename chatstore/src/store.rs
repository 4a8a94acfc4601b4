use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

use crate::error::ChatError;
use crate::models::{Conversation, DeliveryStatus, Message, User};

pub const DEFAULT_DELIVERY_DELAY: Duration = Duration::from_millis(1000);

/// Plain conversation state. Every mutation keeps `last_message` equal to the
/// tail of the message log.
#[derive(Debug, Clone)]
pub struct ChatState {
    pub local_user: User,
    pub conversations: Vec<Conversation>,
    pub active_id: Option<String>,
}

impl ChatState {
    pub fn new(local_user: User, conversations: Vec<Conversation>) -> Self {
        Self {
            local_user,
            conversations,
            active_id: None,
        }
    }

    pub fn find(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    pub fn select(&mut self, id: &str) {
        self.active_id = Some(id.to_string());
        match self.find_mut(id) {
            Some(conversation) => conversation.unread_count = 0,
            None => debug!("selected unknown conversation {id}"),
        }
    }

    pub fn append_outgoing(&mut self, conversation_id: &str, text: &str) -> Result<Message, ChatError> {
        let message = Message::outgoing(&self.local_user, text);
        let conversation = self
            .find_mut(conversation_id)
            .ok_or_else(|| ChatError::ConversationNotFound(conversation_id.to_string()))?;
        conversation.push_message(message.clone());
        Ok(message)
    }

    pub fn append_incoming(&mut self, conversation_id: &str, message: Message) -> Result<(), ChatError> {
        let is_active = self.active_id.as_deref() == Some(conversation_id);
        let conversation = self
            .find_mut(conversation_id)
            .ok_or_else(|| ChatError::ConversationNotFound(conversation_id.to_string()))?;
        conversation.push_message(message);
        if !is_active {
            conversation.unread_count += 1;
        }
        Ok(())
    }

    /// Returns the id of the direct conversation with `user`, creating it at
    /// the head of the list when there is none yet. The result is selected.
    pub fn start(&mut self, user: User) -> String {
        let existing = self
            .conversations
            .iter()
            .find(|c| !c.is_group() && c.participant.id == user.id)
            .map(|c| c.id.clone());

        let id = match existing {
            Some(id) => id,
            None => {
                let id = format!("conv-{}", Uuid::new_v4());
                info!("starting conversation {id} with {}", user.name);
                self.conversations.insert(0, Conversation::direct(&id, user));
                id
            }
        };

        self.select(&id);
        id
    }

    pub fn go_back(&mut self) {
        self.active_id = None;
    }

    /// Advances one message's status. Missing conversations or messages are
    /// skipped; returns whether anything changed.
    pub fn advance_status(&mut self, conversation_id: &str, message_id: &str, status: DeliveryStatus) -> bool {
        let Some(conversation) = self.find_mut(conversation_id) else {
            return false;
        };
        let changed = match conversation.message_mut(message_id) {
            Some(message) => message.status.advance_to(status),
            None => false,
        };
        if changed {
            conversation.sync_last_message();
        }
        changed
    }

    pub fn total_unread(&self) -> u32 {
        self.conversations.iter().map(|c| c.unread_count).sum()
    }
}

/// Shared handle over [`ChatState`]. Clones point at the same state.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    state: Arc<Mutex<ChatState>>,
    delivery_delay: Duration,
}

impl ConversationStore {
    pub fn new(local_user: User, conversations: Vec<Conversation>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChatState::new(local_user, conversations))),
            delivery_delay: DEFAULT_DELIVERY_DELAY,
        }
    }

    pub fn with_delivery_delay(mut self, delay: Duration) -> Self {
        self.delivery_delay = delay;
        self
    }

    fn state(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn select_conversation(&self, id: &str) {
        self.state().select(id);
    }

    /// Appends an outgoing message and schedules its `sent -> delivered`
    /// transition. The timer runs on the current tokio runtime and cannot be
    /// cancelled.
    pub fn send_message(&self, conversation_id: &str, text: &str) -> Result<Message, ChatError> {
        let message = self.state().append_outgoing(conversation_id, text).inspect_err(|e| {
            warn!("dropping message: {e}");
        })?;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = self.clone();
                let conversation_id = conversation_id.to_string();
                let message_id = message.id.clone();
                let delay = self.delivery_delay;
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    store.mark_delivered(&conversation_id, &message_id);
                });
            }
            Err(_) => warn!("no async runtime, message {} stays sent", message.id),
        }

        Ok(message)
    }

    pub fn mark_delivered(&self, conversation_id: &str, message_id: &str) -> bool {
        let changed = self
            .state()
            .advance_status(conversation_id, message_id, DeliveryStatus::Delivered);
        if changed {
            debug!("message {message_id} in {conversation_id} delivered");
        }
        changed
    }

    pub fn receive_message(&self, conversation_id: &str, message: Message) -> Result<(), ChatError> {
        self.state().append_incoming(conversation_id, message)
    }

    pub fn start_conversation(&self, user: User) -> String {
        self.state().start(user)
    }

    pub fn go_back(&self) {
        self.state().go_back();
    }

    pub fn toggle_pin(&self, id: &str) -> Result<bool, ChatError> {
        let mut state = self.state();
        let conversation = state
            .find_mut(id)
            .ok_or_else(|| ChatError::ConversationNotFound(id.to_string()))?;
        conversation.pinned = !conversation.pinned;
        Ok(conversation.pinned)
    }

    pub fn toggle_mute(&self, id: &str) -> Result<bool, ChatError> {
        let mut state = self.state();
        let conversation = state
            .find_mut(id)
            .ok_or_else(|| ChatError::ConversationNotFound(id.to_string()))?;
        conversation.muted = !conversation.muted;
        Ok(conversation.muted)
    }

    pub fn local_user(&self) -> User {
        self.state().local_user.clone()
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.state().conversations.clone()
    }

    pub fn conversation(&self, id: &str) -> Option<Conversation> {
        self.state().find(id).cloned()
    }

    pub fn active_id(&self) -> Option<String> {
        self.state().active_id.clone()
    }

    pub fn active_conversation(&self) -> Option<Conversation> {
        let state = self.state();
        state.active_id.as_deref().and_then(|id| state.find(id)).cloned()
    }

    pub fn total_unread(&self) -> u32 {
        self.state().total_unread()
    }

    /// Case-insensitive match on conversation name or any message content.
    pub fn search(&self, query: &str) -> Vec<Conversation> {
        let query = query.trim().to_lowercase();
        let state = self.state();
        if query.is_empty() {
            return state.conversations.clone();
        }

        state
            .conversations
            .iter()
            .filter(|c| {
                c.display_name().to_lowercase().contains(&query)
                    || c.messages
                        .iter()
                        .any(|m| m.content.to_lowercase().contains(&query))
            })
            .cloned()
            .collect()
    }
}
