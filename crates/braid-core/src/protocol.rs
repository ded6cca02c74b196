//! Wire protocol types for the chat gateway.
//!
//! Inbound events are JSON objects discriminated by an *optional* `type`
//! field, so they are decoded into a closed set of variants at the boundary
//! rather than matched on ad-hoc field lookups further in. Decoding is total:
//! a payload that fits no variant becomes [`ProtocolEvent::Unrecognized`],
//! never an error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A complete chat message as delivered by the gateway.
///
/// Identity is `id`, assigned upstream; a message belongs to exactly one
/// conversation at creation time and is never moved. Fields the client does
/// not model explicitly are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Upstream-assigned message identifier.
    pub id: String,
    /// Message author role (`user`, `assistant`, `function`, ...).
    #[serde(default)]
    pub role: String,
    /// Message body text.
    #[serde(default)]
    pub content: String,
    /// Function/tool name, when this message is a tool call or result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tool call arguments; usually a JSON-encoded string, sometimes an
    /// object, depending on the upstream tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
    /// Paths of files the upstream run produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_files: Option<Vec<String>>,
    /// Any other fields the protocol attached.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Inbound protocol events, decoded from raw gateway JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolEvent {
    /// A nested conversation begins.
    StartSub { conversation_id: String },
    /// A streamed message begins; the event may carry seed fields.
    StartStream {
        id: Option<String>,
        role: Option<String>,
        content: Option<String>,
    },
    /// A nested conversation terminates; control returns to its parent.
    EndSub { conversation_id: String },
    /// A streamed message is complete.
    EndStream,
    /// A complete message to append to the active conversation.
    MessageArrived(Message),
    /// Anything else; dropped by the reducer with a diagnostic.
    Unrecognized(Value),
}

impl ProtocolEvent {
    /// Decodes a raw gateway payload into an event.
    ///
    /// Total over all JSON values: missing or oddly-typed fields demote the
    /// payload to the next matching variant instead of failing. A payload
    /// with no recognized `type` is a plain message when it carries an `id`,
    /// and `Unrecognized` otherwise.
    pub fn decode(value: Value) -> Self {
        match value.get("type").and_then(Value::as_str) {
            Some("start") => match str_field(&value, "conversation_id") {
                Some(conversation_id) => Self::StartSub { conversation_id },
                None => Self::StartStream {
                    id: str_field(&value, "id"),
                    role: str_field(&value, "role"),
                    content: str_field(&value, "content"),
                },
            },
            Some("end") => match str_field(&value, "conversation_id") {
                Some(conversation_id) => Self::EndSub { conversation_id },
                None => Self::EndStream,
            },
            _ => match serde_json::from_value::<Message>(value.clone()) {
                Ok(message) => Self::MessageArrived(message),
                Err(_) => Self::Unrecognized(value),
            },
        }
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Outbound user query payload.
///
/// `response_to` carries the id of the most recently appended message so the
/// gateway can thread the reply; it is serialized as `null` before the first
/// message arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundQuery {
    pub query: String,
    pub response_to: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_start_sub() {
        let event = ProtocolEvent::decode(json!({"type": "start", "conversation_id": "c1"}));
        assert_eq!(
            event,
            ProtocolEvent::StartSub {
                conversation_id: "c1".to_string()
            }
        );
    }

    #[test]
    fn test_decode_start_stream_with_seed() {
        let event = ProtocolEvent::decode(json!({"type": "start", "id": "m9", "role": "assistant"}));
        assert_eq!(
            event,
            ProtocolEvent::StartStream {
                id: Some("m9".to_string()),
                role: Some("assistant".to_string()),
                content: None,
            }
        );
    }

    #[test]
    fn test_decode_end_variants() {
        assert_eq!(
            ProtocolEvent::decode(json!({"type": "end", "conversation_id": "c1"})),
            ProtocolEvent::EndSub {
                conversation_id: "c1".to_string()
            }
        );
        assert_eq!(
            ProtocolEvent::decode(json!({"type": "end"})),
            ProtocolEvent::EndStream
        );
    }

    #[test]
    fn test_decode_plain_message() {
        let event =
            ProtocolEvent::decode(json!({"id": "m1", "role": "user", "content": "hi", "tag": 3}));
        match event {
            ProtocolEvent::MessageArrived(message) => {
                assert_eq!(message.id, "m1");
                assert_eq!(message.role, "user");
                assert_eq!(message.content, "hi");
                assert_eq!(message.extra.get("tag"), Some(&json!(3)));
            }
            other => panic!("expected MessageArrived, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_unknown_type_with_id_is_a_message() {
        // An unrecognized discriminator still appends when an id is present.
        let event = ProtocolEvent::decode(json!({"type": "telemetry", "id": "m2"}));
        match event {
            ProtocolEvent::MessageArrived(message) => {
                assert_eq!(message.id, "m2");
                assert_eq!(message.role, "");
                assert_eq!(message.extra.get("type"), Some(&json!("telemetry")));
            }
            other => panic!("expected MessageArrived, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_missing_id_is_unrecognized() {
        let payload = json!({"role": "user", "content": "orphan"});
        assert_eq!(
            ProtocolEvent::decode(payload.clone()),
            ProtocolEvent::Unrecognized(payload)
        );
    }

    #[test]
    fn test_decode_tolerates_non_string_discriminator() {
        // A numeric `type` does not match start/end and falls through to the
        // message branch, matching the reference switch behavior.
        let event = ProtocolEvent::decode(json!({"type": 5, "id": "m3"}));
        assert!(matches!(event, ProtocolEvent::MessageArrived(_)));
    }

    #[test]
    fn test_decode_non_object_is_unrecognized() {
        assert_eq!(
            ProtocolEvent::decode(json!("ping")),
            ProtocolEvent::Unrecognized(json!("ping"))
        );
    }

    #[test]
    fn test_outbound_query_serializes_null_anchor() {
        let payload = OutboundQuery {
            query: "hello".to_string(),
            response_to: None,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"query": "hello", "response_to": null})
        );
    }
}
