//! # Conversations
//!
//! Conversations are never stored. They are derived from the flat message
//! list every time a view asks for them.
//!
//! ```text
//!   messages ──► group by sorted (a, b) ──► last message + unread count
//!                                              │
//!                                              ▼
//!                                  newest conversation first
//! ```

use std::collections::HashMap;

use crate::types::{Conversation, Message};

/// Conversation identity: the two ids sorted and joined with `-`.
///
/// Symmetric: `conversation_id(a, b) == conversation_id(b, a)`.
///
/// ## Example
/// ```rust
/// use rigshare_core::conversation::conversation_id;
///
/// assert_eq!(conversation_id("2", "1"), "1-2");
/// assert_eq!(conversation_id("1", "2"), "1-2");
/// ```
pub fn conversation_id(a: &str, b: &str) -> String {
    let (low, high) = sorted_pair(a, b);
    format!("{low}-{high}")
}

fn sorted_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Messages exchanged between `a` and `b`, oldest first.
///
/// Ties on `created_at` keep insertion order.
pub fn thread<'m>(messages: &'m [Message], a: &str, b: &str) -> Vec<&'m Message> {
    let mut out: Vec<&Message> = messages.iter().filter(|m| m.is_between(a, b)).collect();
    out.sort_by_key(|m| m.created_at);
    out
}

/// Unread messages addressed to `user_id`.
pub fn unread_count(messages: &[Message], user_id: &str) -> usize {
    messages
        .iter()
        .filter(|m| m.receiver_id == user_id && !m.read)
        .count()
}

/// Groups `viewer`'s messages into conversations, newest first.
///
/// ## Rules
/// - Last message is the one with the greatest `created_at`; on a tie the
///   later insertion wins
/// - Unread count only counts messages addressed to `viewer`
pub fn derive_conversations(messages: &[Message], viewer: &str) -> Vec<Conversation> {
    // Index into `order` keeps first-seen order stable for equal timestamps.
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<Conversation> = Vec::new();

    for message in messages.iter().filter(|m| m.involves(viewer)) {
        let id = conversation_id(&message.sender_id, &message.receiver_id);
        let unread = usize::from(message.receiver_id == viewer && !message.read);

        match index.get(&id) {
            Some(&slot) => {
                let convo = &mut order[slot];
                if message.created_at >= convo.last_message.created_at {
                    convo.last_message = message.clone();
                }
                convo.unread_count += unread;
            }
            None => {
                let (low, high) = sorted_pair(&message.sender_id, &message.receiver_id);
                index.insert(id.clone(), order.len());
                order.push(Conversation {
                    id,
                    participants: vec![low.to_string(), high.to_string()],
                    last_message: message.clone(),
                    unread_count: unread,
                });
            }
        }
    }

    order.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));
    order
}

// =============================================================================
// Unit Tests
// =============================================================================
