//! Conversation tree aggregate.
//!
//! The tree is an explicitly owned, single-writer state object: the client
//! event loop owns it and serializes every mutation, so the reducer and the
//! navigation helpers below take `&mut self` and run synchronously to
//! completion.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::draft::StreamingDraft;
use crate::protocol::Message;

/// The permanent top-level conversation id.
pub const ROOT_CONVERSATION_ID: &str = "root";

/// The full state of a chat session: every conversation, the parent/child
/// links between them, and the read/write pointers.
///
/// Invariants:
/// - `"root"` is always a key in `conversations`.
/// - Every value in `sub_conversations` and every key in `parents` is a key
///   in `conversations`, and the child links form a forest.
/// - `active_conversation_id` is always a key in `conversations`.
/// - `last_message_id` is `None` or the id of a message present in some
///   conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTree {
    /// Conversation id → ordered, append-only message log.
    pub conversations: HashMap<String, Vec<Message>>,
    /// Anchor message id → the child conversation it spawned.
    pub sub_conversations: HashMap<String, String>,
    /// Child conversation id → parent conversation id.
    pub parents: HashMap<String, String>,
    /// The conversation currently receiving new messages (write pointer).
    pub active_conversation_id: String,
    /// The conversation currently shown to the user (read pointer).
    pub displayed_conversation_id: String,
    /// Id of the most recently appended message anywhere in the tree.
    pub last_message_id: Option<String>,
    /// In-progress streamed messages, keyed by conversation id.
    #[serde(default)]
    pub drafts: HashMap<String, StreamingDraft>,
}

impl ConversationTree {
    /// Creates the initial tree: a single empty `"root"` conversation with
    /// both pointers on it and no messages yet.
    pub fn new() -> Self {
        Self {
            conversations: HashMap::from([(ROOT_CONVERSATION_ID.to_string(), Vec::new())]),
            sub_conversations: HashMap::new(),
            parents: HashMap::new(),
            active_conversation_id: ROOT_CONVERSATION_ID.to_string(),
            displayed_conversation_id: ROOT_CONVERSATION_ID.to_string(),
            last_message_id: None,
            drafts: HashMap::new(),
        }
    }

    /// Returns the message log of the displayed conversation.
    pub fn displayed_messages(&self) -> &[Message] {
        self.conversations
            .get(&self.displayed_conversation_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the child conversation spawned by `message_id`, if any.
    pub fn sub_conversation_of(&self, message_id: &str) -> Option<&str> {
        self.sub_conversations.get(message_id).map(String::as_str)
    }

    /// Moves the read pointer to the sub-conversation anchored at
    /// `message_id`.
    ///
    /// Returns `true` when the pointer moved. A message with no linked
    /// sub-conversation leaves the state untouched. The write pointer is
    /// never affected.
    pub fn open_sub_conversation(&mut self, message_id: &str) -> bool {
        match self.sub_conversations.get(message_id) {
            Some(child) => {
                self.displayed_conversation_id = child.clone();
                true
            }
            None => false,
        }
    }

    /// Moves the read pointer back to the root conversation.
    pub fn display_root(&mut self) {
        self.displayed_conversation_id = ROOT_CONVERSATION_ID.to_string();
    }
}

impl Default for ConversationTree {
    fn default() -> Self {
        Self::new()
    }
}
