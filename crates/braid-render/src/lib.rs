//! Pure view rendering for chat messages.
//!
//! Everything here is a pure function from message payloads to a
//! [`ViewNode`] tree; no I/O, no display backend. Fold/unfold state lives in
//! a side [`FoldState`] keyed by structural path, never in the data itself.

mod media;
mod text;
mod view;

pub use media::{MediaKind, MediaSource, resolve};
pub use text::{TextSegment, split_fenced, strip_line_numbers};
pub use view::{FoldState, Renderer, ViewNode};
