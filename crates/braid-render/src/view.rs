//! Recursive JSON-to-view rendering.

use std::collections::HashSet;

use serde_json::Value;

use braid_core::protocol::Message;

use crate::media::{self, MediaSource};
use crate::text::{TextSegment, split_fenced, strip_line_numbers};

/// A displayable view tree. Backends (the REPL, a GUI) walk this; the
/// renderer itself never touches a display.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewNode {
    /// Nothing to show.
    Empty,
    Text(String),
    Code {
        language: Option<String>,
        code: String,
    },
    Media(MediaSource),
    /// A collapsed subtree; `path` is the fold key to toggle it open.
    Folded { path: String, summary: String },
    /// Sequential children: text segments or array elements.
    Items(Vec<ViewNode>),
    /// Object entries, in insertion order.
    Entries(Vec<(String, ViewNode)>),
    Labelled {
        label: String,
        child: Box<ViewNode>,
    },
}

/// Fold/unfold state, keyed by structural path (e.g. `args.steps[2]`).
///
/// Kept outside the rendered data so re-rendering a conversation never
/// disturbs what the user collapsed.
#[derive(Debug, Clone, Default)]
pub struct FoldState {
    folded: HashSet<String>,
}

impl FoldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the fold at `path`.
    pub fn toggle(&mut self, path: &str) {
        if !self.folded.remove(path) {
            self.folded.insert(path.to_string());
        }
    }

    pub fn is_folded(&self, path: &str) -> bool {
        self.folded.contains(path)
    }
}

/// Renders message payloads against a static-file base and a fold state.
pub struct Renderer<'a> {
    static_base: &'a str,
    folds: &'a FoldState,
}

impl<'a> Renderer<'a> {
    pub fn new(static_base: &'a str, folds: &'a FoldState) -> Self {
        Self { static_base, folds }
    }

    /// Renders one message, applying the tool-call special cases before
    /// falling back to generic JSON rendering of the body.
    pub fn render_message(&self, message: &Message) -> ViewNode {
        let arguments = parse_arguments(message);

        match message.name.as_deref() {
            Some("python") => {
                // Code may arrive wrapped in {"code": ...} or as the raw
                // arguments string.
                let code = arguments
                    .as_ref()
                    .and_then(|value| value.get("code"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| raw_arguments_text(message))
                    .unwrap_or_default();
                return ViewNode::Code {
                    language: Some("python".to_string()),
                    code,
                };
            }
            Some("return") => {
                // The returned content is echoed as a regular message; the
                // call itself has nothing to show.
                if arguments
                    .as_ref()
                    .and_then(|value| value.get("content"))
                    .is_some()
                {
                    return ViewNode::Empty;
                }
            }
            Some("upload_file_to_chat") => {
                if let Some(path) = arguments
                    .as_ref()
                    .and_then(|value| value.get("file"))
                    .and_then(Value::as_str)
                {
                    return ViewNode::Media(media::resolve(path, self.static_base));
                }
            }
            _ => {}
        }

        if let Some(files) = &message.generated_files {
            let items = files
                .iter()
                .map(|file| ViewNode::Labelled {
                    label: file.clone(),
                    child: Box::new(ViewNode::Media(media::resolve(file, self.static_base))),
                })
                .collect();
            return ViewNode::Items(items);
        }

        let body = self.render_text(&message.content);
        match arguments {
            Some(value) => ViewNode::Items(vec![
                body,
                ViewNode::Labelled {
                    label: "arguments".to_string(),
                    child: Box::new(self.render_value(&value, "arguments")),
                },
            ]),
            None => body,
        }
    }

    /// Renders an arbitrary JSON value at a structural path.
    pub fn render_value(&self, value: &Value, path: &str) -> ViewNode {
        if self.folds.is_folded(path) {
            return ViewNode::Folded {
                path: path.to_string(),
                summary: summarize(value),
            };
        }

        match value {
            Value::Null => ViewNode::Empty,
            Value::Bool(b) => ViewNode::Text(b.to_string()),
            Value::Number(n) => ViewNode::Text(n.to_string()),
            Value::String(s) => self.render_string(s, path),
            Value::Array(elements) => {
                let items = elements
                    .iter()
                    .enumerate()
                    .map(|(index, element)| {
                        self.render_value(element, &format!("{path}[{index}]"))
                    })
                    .collect();
                ViewNode::Items(items)
            }
            Value::Object(entries) => {
                let entries = entries
                    .iter()
                    .map(|(key, child)| {
                        let child_path = format!("{path}.{key}");
                        let node = match (key.as_str(), child) {
                            // Code values are shown as blocks, with any
                            // upstream line numbering stripped.
                            ("code", Value::String(code)) => ViewNode::Code {
                                language: None,
                                code: strip_line_numbers(code),
                            },
                            _ => self.render_value(child, &child_path),
                        };
                        (key.clone(), node)
                    })
                    .collect();
                ViewNode::Entries(entries)
            }
        }
    }

    fn render_string(&self, s: &str, path: &str) -> ViewNode {
        // Links are treated as media embeds.
        if s.starts_with("http") {
            return ViewNode::Media(media::resolve(s, self.static_base));
        }
        // Strings holding serialized JSON are unwrapped and recursed into.
        if let Ok(parsed) = serde_json::from_str::<Value>(s) {
            if parsed.is_object() || parsed.is_array() {
                return self.render_value(&parsed, path);
            }
        }
        self.render_text(s)
    }

    fn render_text(&self, text: &str) -> ViewNode {
        let mut segments: Vec<ViewNode> = split_fenced(text)
            .into_iter()
            .map(|segment| match segment {
                TextSegment::Plain(plain) => ViewNode::Text(plain),
                TextSegment::Code { language, code } => ViewNode::Code { language, code },
            })
            .collect();
        match segments.len() {
            0 => ViewNode::Empty,
            1 => segments.remove(0),
            _ => ViewNode::Items(segments),
        }
    }
}

/// The tool arguments as a JSON value: objects pass through, strings holding
/// serialized JSON are parsed.
fn parse_arguments(message: &Message) -> Option<Value> {
    match &message.arguments {
        Some(Value::String(raw)) => serde_json::from_str(raw).ok(),
        Some(other) => Some(other.clone()),
        None => None,
    }
}

fn raw_arguments_text(message: &Message) -> Option<String> {
    match &message.arguments {
        Some(Value::String(raw)) => Some(raw.clone()),
        Some(other) => Some(other.to_string()),
        None => None,
    }
}

fn summarize(value: &Value) -> String {
    match value {
        Value::Array(elements) => format!("{} elements", elements.len()),
        Value::Object(entries) => format!("{} fields", entries.len()),
        _ => "...".to_string(),
    }
}
