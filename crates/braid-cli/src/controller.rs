//! User-action wiring between the REPL, the tree, and the transport.

use std::sync::Arc;

use tokio::sync::Mutex;

use braid_core::BraidError;
use braid_core::conversation::ConversationTree;
use braid_core::error::Result;
use braid_core::protocol::OutboundQuery;
use braid_transport::MessageSink;

/// Routes user actions to the conversation tree and the outbound sink.
///
/// Navigation is a pure pointer change on the tree; sends are guarded so a
/// disconnected transport rejects the query without consuming the caller's
/// input.
pub struct InteractionController<S> {
    tree: Arc<Mutex<ConversationTree>>,
    sink: Arc<S>,
}

impl<S: MessageSink> InteractionController<S> {
    pub fn new(tree: Arc<Mutex<ConversationTree>>, sink: Arc<S>) -> Self {
        Self { tree, sink }
    }

    /// Sends a user query, threaded onto the most recent message.
    ///
    /// # Errors
    ///
    /// Returns [`BraidError::NotConnected`] when the transport is not open;
    /// the text is untouched and the caller may retry.
    pub async fn send(&self, text: &str) -> Result<()> {
        if !self.sink.status().is_connected() {
            return Err(BraidError::NotConnected);
        }
        let response_to = self.tree.lock().await.last_message_id.clone();
        self.sink
            .send(OutboundQuery {
                query: text.to_string(),
                response_to,
            })
            .await
    }

    /// Shows the sub-conversation anchored at `message_id`.
    ///
    /// Returns `false` (and changes nothing) when the message has no linked
    /// sub-conversation. The write pointer is never affected.
    pub async fn open_sub_conversation(&self, message_id: &str) -> bool {
        self.tree.lock().await.open_sub_conversation(message_id)
    }

    /// Shows the root conversation again.
    pub async fn display_root(&self) {
        self.tree.lock().await.display_root();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    use braid_core::conversation::ROOT_CONVERSATION_ID;
    use braid_core::protocol::ProtocolEvent;
    use braid_transport::ConnectionStatus;
    use serde_json::json;

    // Mock sink recording sent payloads behind a configurable status.
    struct MockSink {
        status: StdMutex<ConnectionStatus>,
        sent: StdMutex<Vec<OutboundQuery>>,
    }

    impl MockSink {
        fn connected() -> Self {
            Self {
                status: StdMutex::new(ConnectionStatus::Connected),
                sent: StdMutex::new(Vec::new()),
            }
        }

        fn set_status(&self, status: ConnectionStatus) {
            *self.status.lock().unwrap() = status;
        }
    }

    #[async_trait]
    impl MessageSink for MockSink {
        async fn send(&self, payload: OutboundQuery) -> Result<()> {
            self.sent.lock().unwrap().push(payload);
            Ok(())
        }

        fn status(&self) -> ConnectionStatus {
            *self.status.lock().unwrap()
        }
    }

    fn controller() -> (InteractionController<MockSink>, Arc<MockSink>, Arc<Mutex<ConversationTree>>) {
        let tree = Arc::new(Mutex::new(ConversationTree::new()));
        let sink = Arc::new(MockSink::connected());
        (
            InteractionController::new(tree.clone(), sink.clone()),
            sink,
            tree,
        )
    }

    #[tokio::test]
    async fn test_send_threads_reply_onto_latest_message() {
        let (controller, sink, tree) = controller();
        tree.lock()
            .await
            .apply(ProtocolEvent::decode(json!({"id": "m1", "role": "user", "content": "hi"})));

        controller.send("follow-up").await.unwrap();

        let sent = sink.sent.lock().unwrap();
        assert_eq!(
            *sent,
            vec![OutboundQuery {
                query: "follow-up".to_string(),
                response_to: Some("m1".to_string()),
            }]
        );
    }

    #[tokio::test]
    async fn test_first_send_has_no_anchor() {
        let (controller, sink, _tree) = controller();

        controller.send("hello").await.unwrap();

        assert_eq!(sink.sent.lock().unwrap()[0].response_to, None);
    }

    #[tokio::test]
    async fn test_send_while_disconnected_is_rejected() {
        let (controller, sink, _tree) = controller();
        sink.set_status(ConnectionStatus::Closed);

        let err = controller.send("lost?").await.unwrap_err();

        assert!(err.is_not_connected());
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_navigation_moves_only_the_read_pointer() {
        let (controller, _sink, tree) = controller();
        {
            let mut tree = tree.lock().await;
            tree.apply(ProtocolEvent::decode(json!({"id": "m1", "role": "user", "content": "hi"})));
            tree.apply(ProtocolEvent::decode(json!({"type": "start", "conversation_id": "s1"})));
        }

        assert!(controller.open_sub_conversation("m1").await);
        {
            let tree = tree.lock().await;
            assert_eq!(tree.displayed_conversation_id, "s1");
            assert_eq!(tree.active_conversation_id, "s1");
        }

        controller.display_root().await;
        assert_eq!(
            tree.lock().await.displayed_conversation_id,
            ROOT_CONVERSATION_ID
        );
    }

    #[tokio::test]
    async fn test_click_without_sub_conversation_changes_nothing() {
        let (controller, _sink, tree) = controller();
        tree.lock()
            .await
            .apply(ProtocolEvent::decode(json!({"id": "m1", "role": "user", "content": "hi"})));

        assert!(!controller.open_sub_conversation("m1").await);
        assert_eq!(
            tree.lock().await.displayed_conversation_id,
            ROOT_CONVERSATION_ID
        );
    }
}
