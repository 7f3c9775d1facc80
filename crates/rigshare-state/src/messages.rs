//! # Message Store
//!
//! Flat list of direct messages. Conversations are derived on demand by
//! `rigshare_core::conversation` and never stored.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use rigshare_core::conversation::{conversation_id, derive_conversations, thread, unread_count};
use rigshare_core::validation::validate_message_content;
use rigshare_core::{generate_id, Conversation, CoreError, Message, MessageReference, ValidationError};

use crate::backend::{load_collection, save_collection, StateBackend, MESSAGES_KEY};
use crate::error::StateResult;
use crate::events::{EventBus, StoreEvent};

pub struct MessageStore {
    backend: Arc<dyn StateBackend>,
    events: EventBus,
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn open(backend: Arc<dyn StateBackend>, events: EventBus) -> StateResult<Self> {
        let messages: Vec<Message> = load_collection(backend.as_ref(), MESSAGES_KEY)?;
        debug!(count = messages.len(), "Messages loaded");
        Ok(MessageStore {
            backend,
            events,
            messages,
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn list_all(&self) -> &[Message] {
        &self.messages
    }

    /// `user_id`'s conversations, newest first.
    pub fn conversations_for(&self, user_id: &str) -> Vec<Conversation> {
        derive_conversations(&self.messages, user_id)
    }

    /// The conversation between `a` and `b` as seen by `a`.
    pub fn conversation(&self, a: &str, b: &str) -> Option<Conversation> {
        let id = conversation_id(a, b);
        self.conversations_for(a).into_iter().find(|c| c.id == id)
    }

    /// Messages between `a` and `b`, oldest first.
    pub fn thread(&self, a: &str, b: &str) -> Vec<&Message> {
        thread(&self.messages, a, b)
    }

    pub fn unread_count(&self, user_id: &str) -> usize {
        unread_count(&self.messages, user_id)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub fn send(
        &mut self,
        sender_id: &str,
        sender_name: &str,
        receiver_id: &str,
        receiver_name: &str,
        content: &str,
    ) -> StateResult<Message> {
        self.push(sender_id, sender_name, receiver_id, receiver_name, content, None)
    }

    /// Sends a message carrying a structured link to another entity.
    pub fn send_with_reference(
        &mut self,
        sender_id: &str,
        sender_name: &str,
        receiver_id: &str,
        receiver_name: &str,
        content: &str,
        reference: MessageReference,
    ) -> StateResult<Message> {
        self.push(
            sender_id,
            sender_name,
            receiver_id,
            receiver_name,
            content,
            Some(reference),
        )
    }

    /// Marks one message read. Marking a read message again is a no-op.
    pub fn mark_read(&mut self, id: &str) -> StateResult<()> {
        let index = self
            .messages
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| CoreError::not_found("Message", id))?;
        if self.messages[index].read {
            return Ok(());
        }

        let mut next = self.messages.clone();
        next[index].read = true;
        self.commit(next)?;

        debug!(id, "Message marked read");
        self.events.publish(StoreEvent::MessagesRead { count: 1 });
        Ok(())
    }

    /// Marks everything `other` sent to `viewer` as read. Returns how many
    /// messages changed.
    pub fn mark_conversation_read(&mut self, viewer: &str, other: &str) -> StateResult<usize> {
        let mut next = self.messages.clone();
        let mut count = 0;
        for message in next
            .iter_mut()
            .filter(|m| m.sender_id == other && m.receiver_id == viewer && !m.read)
        {
            message.read = true;
            count += 1;
        }
        if count == 0 {
            return Ok(0);
        }
        self.commit(next)?;

        debug!(viewer, other, count, "Conversation marked read");
        self.events.publish(StoreEvent::MessagesRead { count });
        Ok(count)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn push(
        &mut self,
        sender_id: &str,
        sender_name: &str,
        receiver_id: &str,
        receiver_name: &str,
        content: &str,
        reference: Option<MessageReference>,
    ) -> StateResult<Message> {
        if sender_id.trim().is_empty() {
            return Err(CoreError::Unauthenticated.into());
        }
        if receiver_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "receiverId".to_string(),
            }
            .into());
        }
        validate_message_content(content)?;

        let message = Message {
            id: generate_id(),
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            receiver_id: receiver_id.to_string(),
            receiver_name: receiver_name.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
            read: false,
            reference,
        };

        let mut next = self.messages.clone();
        next.push(message.clone());
        self.commit(next)?;

        debug!(id = %message.id, sender_id, receiver_id, "Message sent");
        self.events.publish(StoreEvent::MessageSent {
            id: message.id.clone(),
        });
        Ok(message)
    }

    fn commit(&mut self, next: Vec<Message>) -> StateResult<()> {
        save_collection(self.backend.as_ref(), MESSAGES_KEY, &next)?;
        self.messages = next;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::error::StateError;
    use crate::testing::FailingBackend;

    fn store() -> MessageStore {
        MessageStore::open(Arc::new(MemoryBackend::new()), EventBus::default()).unwrap()
    }

    #[test]
    fn test_send_is_unread() {
        let mut store = store();
        let message = store.send("a", "Alice", "b", "Bob", "Hi").unwrap();
        assert!(!message.read);
        assert_eq!(message.reference, None);
        assert_eq!(store.unread_count("b"), 1);
        assert_eq!(store.unread_count("a"), 0);
    }

    #[test]
    fn test_empty_content_rejected() {
        let mut store = store();
        let err = store.send("a", "Alice", "b", "Bob", "  ").unwrap_err();
        assert!(matches!(err, StateError::Core(CoreError::Validation(_))));
        assert!(store.list_all().is_empty());
    }

    #[test]
    fn test_reply_joins_conversation() {
        let mut store = store();
        store.send("a", "Alice", "b", "Bob", "Is the camera free?").unwrap();
        let reply = store.send("b", "Bob", "a", "Alice", "Yes").unwrap();

        let convos = store.conversations_for("a");
        assert_eq!(convos.len(), 1);
        assert_eq!(convos[0].participants, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(convos[0].last_message.id, reply.id);
        assert_eq!(store.conversation("b", "a").unwrap().id, "a-b");
    }

    #[test]
    fn test_mark_read_idempotent() {
        let mut store = store();
        let message = store.send("a", "Alice", "b", "Bob", "Hi").unwrap();
        store.mark_read(&message.id).unwrap();
        store.mark_read(&message.id).unwrap();
        assert!(store.get(&message.id).unwrap().read);

        let err = store.mark_read("missing").unwrap_err();
        assert!(matches!(err, StateError::Core(CoreError::NotFound { .. })));
    }

    #[test]
    fn test_mark_conversation_read() {
        let mut store = store();
        store.send("a", "Alice", "b", "Bob", "one").unwrap();
        store.send("a", "Alice", "b", "Bob", "two").unwrap();
        store.send("b", "Bob", "a", "Alice", "reply").unwrap();
        store.send("c", "Carol", "b", "Bob", "other").unwrap();

        assert_eq!(store.mark_conversation_read("b", "a").unwrap(), 2);
        assert_eq!(store.unread_count("b"), 1);
        assert_eq!(store.unread_count("a"), 1);
        assert_eq!(store.mark_conversation_read("b", "a").unwrap(), 0);
    }

    #[test]
    fn test_reference_survives_reload() {
        let backend = Arc::new(MemoryBackend::new());
        let mut store = MessageStore::open(backend.clone(), EventBus::default()).unwrap();
        let reference = MessageReference::RentalRequest { id: "r-1".into() };
        let sent = store
            .send_with_reference("a", "Alice", "b", "Bob", "Request ID: r-1", reference.clone())
            .unwrap();

        let reopened = MessageStore::open(backend, EventBus::default()).unwrap();
        assert_eq!(reopened.get(&sent.id).unwrap().reference, Some(reference));
    }

    #[test]
    fn test_thread_order() {
        let mut store = store();
        let first = store.send("a", "Alice", "b", "Bob", "one").unwrap();
        let second = store.send("b", "Bob", "a", "Alice", "two").unwrap();
        let ids: Vec<&str> = store.thread("b", "a").iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec![first.id.as_str(), second.id.as_str()]);
    }

    #[test]
    fn test_failed_send_not_visible() {
        let backend = Arc::new(FailingBackend::default());
        backend.fail_writes(true);
        let mut store = MessageStore::open(backend, EventBus::default()).unwrap();
        assert!(store.send("a", "Alice", "b", "Bob", "Hi").is_err());
        assert!(store.list_all().is_empty());
    }
}
