//! State transitions for inbound protocol events.

use tracing::{debug, warn};

use super::draft::StreamingDraft;
use super::model::ConversationTree;
use crate::protocol::{Message, ProtocolEvent};

impl ConversationTree {
    /// Applies one inbound event, deterministically deriving the next state.
    ///
    /// Total over all events: no event is rejected, and malformed or dangling
    /// ones degrade to logged no-ops. Runs synchronously to completion and
    /// never suspends; callers serialize invocations in arrival order.
    pub fn apply(&mut self, event: ProtocolEvent) {
        match event {
            ProtocolEvent::StartSub { conversation_id } => self.start_sub(conversation_id),
            ProtocolEvent::StartStream { id, role, content } => {
                self.start_stream(id, role, content)
            }
            ProtocolEvent::EndSub { conversation_id } => self.end_sub(&conversation_id),
            ProtocolEvent::EndStream => self.end_stream(),
            ProtocolEvent::MessageArrived(message) => self.message_arrived(message),
            ProtocolEvent::Unrecognized(value) => {
                warn!(payload = %value, "dropping unrecognized event");
            }
        }
    }

    /// A nested conversation begins: create it, link it, and move the write
    /// pointer into it. The read pointer stays where the user left it.
    fn start_sub(&mut self, conversation_id: String) {
        debug!(conversation = %conversation_id, "starting sub-conversation");

        // The child starts from a copy of the parent's log: the nested view
        // keeps the context that led into it.
        let seed = self
            .conversations
            .get(&self.active_conversation_id)
            .cloned()
            .unwrap_or_default();
        self.conversations.insert(conversation_id.clone(), seed);

        match self.last_message_id.clone() {
            Some(anchor) => {
                self.sub_conversations
                    .insert(anchor, conversation_id.clone());
            }
            None => warn!(
                conversation = %conversation_id,
                "sub-conversation started before any message; no anchor recorded"
            ),
        }

        self.parents
            .insert(conversation_id.clone(), self.active_conversation_id.clone());
        self.active_conversation_id = conversation_id;
    }

    /// A streamed message begins: open a draft slot on the active
    /// conversation, seeded from whatever fields the event carried.
    fn start_stream(&mut self, id: Option<String>, role: Option<String>, content: Option<String>) {
        let conversation = self.active_conversation_id.clone();
        if self.drafts.contains_key(&conversation) {
            warn!(%conversation, "replacing an unfinished draft");
        }
        debug!(%conversation, "starting streamed message");
        self.drafts
            .insert(conversation, StreamingDraft::new(id, role, content));
    }

    /// A nested conversation ended: the write pointer returns to the parent
    /// recorded when the child was spawned. An end for a conversation nobody
    /// spawned is a no-op.
    fn end_sub(&mut self, conversation_id: &str) {
        match self.parents.get(conversation_id) {
            Some(parent) => {
                debug!(conversation = %conversation_id, %parent, "sub-conversation ended");
                self.active_conversation_id = parent.clone();
            }
            None => warn!(
                conversation = %conversation_id,
                "end event for a conversation nobody spawned; ignoring"
            ),
        }
    }

    /// A streamed message ended: finalize the active conversation's draft
    /// into a regular appended message. Without an open draft this is a
    /// no-op.
    fn end_stream(&mut self) {
        let conversation = self.active_conversation_id.clone();
        match self.drafts.remove(&conversation) {
            Some(draft) => {
                let message = draft.into_message();
                debug!(%conversation, message = %message.id, "finalizing streamed message");
                self.last_message_id = Some(message.id.clone());
                self.conversations
                    .entry(conversation)
                    .or_default()
                    .push(message);
            }
            None => debug!(%conversation, "stream end without an open draft; ignoring"),
        }
    }

    /// A complete message arrived: append it to the active conversation and
    /// advance the reply anchor.
    fn message_arrived(&mut self, message: Message) {
        let conversation = self.active_conversation_id.clone();

        // A snapshot of the open draft replaces its content instead of
        // appending; the draft only lands in the log when the stream ends.
        if let Some(draft) = self.drafts.get_mut(&conversation) {
            if draft.matches(&message.id) {
                draft.content = message.content;
                if !message.role.is_empty() {
                    draft.role = Some(message.role);
                }
                return;
            }
        }

        debug!(%conversation, message = %message.id, "appending message");
        self.last_message_id = Some(message.id.clone());
        self.conversations
            .entry(conversation)
            .or_default()
            .push(message);
    }
}
