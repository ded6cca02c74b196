//! Conversation-tree domain module.
//!
//! This module contains the conversation tree aggregate, the streaming draft
//! slot, and the reducer that applies inbound protocol events.
//!
//! # Module Structure
//!
//! - `model`: the tree aggregate and navigation helpers (`ConversationTree`)
//! - `draft`: streamed-message accumulation (`StreamingDraft`)
//! - `reducer`: the `apply` state transitions

mod draft;
mod model;
mod reducer;

// Re-export public API
pub use draft::StreamingDraft;
pub use model::{ConversationTree, ROOT_CONVERSATION_ID};
