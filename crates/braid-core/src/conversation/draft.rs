//! Streamed-message accumulation.

use serde::{Deserialize, Serialize};
use serde_json::Map;
use uuid::Uuid;

use crate::protocol::Message;

/// A message being assembled incrementally.
///
/// Opened by a `start` event without a conversation id, updated by snapshot
/// messages carrying the same id, and finalized into a regular [`Message`]
/// by the matching `end` event. A draft is not part of any conversation log
/// until finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingDraft {
    /// Upstream message id, when the stream carried one.
    pub id: Option<String>,
    /// Author role, when the stream carried one.
    pub role: Option<String>,
    /// Content accumulated so far.
    pub content: String,
}

impl StreamingDraft {
    /// Seeds a draft from the fields present on the `start` event.
    pub fn new(id: Option<String>, role: Option<String>, content: Option<String>) -> Self {
        Self {
            id,
            role,
            content: content.unwrap_or_default(),
        }
    }

    /// Whether a snapshot message with `id` belongs to this draft.
    pub fn matches(&self, id: &str) -> bool {
        self.id.as_deref() == Some(id)
    }

    /// Finalizes the draft into a regular message.
    ///
    /// Streams that never carried an id get a locally-generated one so the
    /// finalized message still has an identity to anchor replies to.
    pub fn into_message(self) -> Message {
        Message {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            role: self.role.unwrap_or_else(|| "assistant".to_string()),
            content: self.content,
            name: None,
            arguments: None,
            generated_files: None,
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_keeps_upstream_identity() {
        let draft = StreamingDraft::new(
            Some("m7".to_string()),
            Some("assistant".to_string()),
            Some("partial".to_string()),
        );
        let message = draft.into_message();
        assert_eq!(message.id, "m7");
        assert_eq!(message.role, "assistant");
        assert_eq!(message.content, "partial");
    }

    #[test]
    fn test_finalize_generates_fallback_identity() {
        let message = StreamingDraft::new(None, None, None).into_message();
        assert!(!message.id.is_empty());
        assert_eq!(message.role, "assistant");
        assert_eq!(message.content, "");
    }
}
