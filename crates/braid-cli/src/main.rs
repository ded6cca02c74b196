//! Braid REPL: a terminal client for the chat gateway.

mod config;
mod controller;

use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::Editor;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use tokio::sync::Mutex;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use braid_core::conversation::ConversationTree;
use braid_core::protocol::Message;
use braid_render::{FoldState, Renderer, ViewNode};
use braid_transport::{ConnectionStatus, InboundEvent, MessageSink, connect};

use crate::config::ClientConfig;
use crate::controller::InteractionController;

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: vec![
                "/open".to_string(),
                "/root".to_string(),
                "/status".to_string(),
            ],
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ClientConfig::load_default()?;

    println!("{}", "=== Braid ===".bright_magenta().bold());
    println!(
        "{}",
        format!("Connecting to {} ...", config.endpoint).bright_black()
    );

    // ===== Transport Setup =====
    let (transport, events) = match connect(&config.endpoint).await {
        Ok(pair) => pair,
        Err(e) => {
            // The status line is all the UI there is while not connected.
            print_status(ConnectionStatus::Disconnected);
            return Err(e.into());
        }
    };
    let transport = Arc::new(transport);
    println!(
        "{}",
        format!("Connection status: {}", transport.status()).green()
    );

    let tree = Arc::new(Mutex::new(ConversationTree::new()));
    let controller = InteractionController::new(tree.clone(), transport.clone());

    // ===== Inbound Event Loop =====
    // Single owner of the tree mutations: events apply in arrival order.
    let loop_tree = tree.clone();
    let static_base = config.static_base.clone();
    let mut status_rx = transport.subscribe_status();
    let event_loop = tokio::spawn(async move {
        let mut events = events;
        loop {
            tokio::select! {
                inbound = events.recv() => {
                    let Some(InboundEvent { event, received_at }) = inbound else {
                        break;
                    };
                    debug!(%received_at, "applying inbound event");
                    let mut tree = loop_tree.lock().await;
                    let shown_before = tree.displayed_messages().len();
                    tree.apply(event);
                    // Print whatever just landed in the displayed conversation.
                    let messages = tree.displayed_messages();
                    for message in &messages[shown_before.min(messages.len())..] {
                        print_message(message, &tree, &static_base);
                    }
                }
                changed = status_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let status = *status_rx.borrow();
                    if status != ConnectionStatus::Connected {
                        print_status(status);
                    }
                }
            }
        }
    });

    // ===== REPL Setup =====
    let helper = CliHelper::new();
    let mut rl = Editor::new()?;
    rl.set_helper(Some(helper));

    println!(
        "{}",
        "Type a message to send it. '/open <message-id>' views a sub-conversation, \
         '/root' returns to the main conversation, '/status' shows the connection, \
         'quit' exits."
            .bright_black()
    );
    println!();

    // ===== Main REPL Loop =====
    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }

                if trimmed.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(&line);

                if let Some(rest) = trimmed.strip_prefix("/open") {
                    let message_id = rest.trim();
                    if controller.open_sub_conversation(message_id).await {
                        render_displayed(&tree, &config.static_base).await;
                    } else {
                        println!(
                            "{}",
                            format!("No sub-conversation under message '{message_id}'").yellow()
                        );
                    }
                    continue;
                }

                if trimmed == "/root" {
                    controller.display_root().await;
                    render_displayed(&tree, &config.static_base).await;
                    continue;
                }

                if trimmed == "/status" {
                    print_status(transport.status());
                    continue;
                }

                match controller.send(trimmed).await {
                    Ok(()) => println!("{}", format!("> {}", trimmed).green()),
                    // The line stays in history; nothing is lost on a
                    // rejected send.
                    Err(e) => println!("{}", format!("Send failed: {e}").red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    // Teardown stops event delivery before the loop task is joined.
    transport.close();
    let _ = event_loop.await;

    Ok(())
}

fn print_status(status: ConnectionStatus) {
    let line = format!("Connection status: {}", status);
    if status == ConnectionStatus::Connected {
        println!("{}", line.green());
    } else {
        println!("{}", line.red());
    }
}

/// Re-prints the whole displayed conversation.
async fn render_displayed(tree: &Arc<Mutex<ConversationTree>>, static_base: &str) {
    let tree = tree.lock().await;
    println!(
        "{}",
        format!("--- {} ---", tree.displayed_conversation_id).bright_magenta()
    );
    for message in tree.displayed_messages() {
        print_message(message, &tree, static_base);
    }
}

/// Prints one message: colored role, rendered body, sub-conversation hint.
fn print_message(message: &Message, tree: &ConversationTree, static_base: &str) {
    let role = message.role.as_str();
    let colored_role = match role {
        "user" => role.green(),
        "assistant" => role.bright_blue(),
        _ => role.bright_magenta(),
    };
    println!(
        "{} {}",
        colored_role.bold(),
        format!("({})", message.id).bright_black()
    );

    let folds = FoldState::new();
    let renderer = Renderer::new(static_base, &folds);
    print_view(&renderer.render_message(message), 1);

    if let Some(child) = tree.sub_conversation_of(&message.id) {
        println!(
            "  {}",
            format!("['/open {}' shows sub-conversation {}]", message.id, child).bright_black()
        );
    }
}

/// Walks a view tree onto the terminal.
fn print_view(node: &ViewNode, indent: usize) {
    let pad = "  ".repeat(indent);
    match node {
        ViewNode::Empty => {}
        ViewNode::Text(text) => {
            for line in text.lines() {
                println!("{pad}{line}");
            }
        }
        ViewNode::Code { language, code } => {
            let tag = language.as_deref().unwrap_or("");
            println!("{pad}{}", format!("```{tag}").bright_black());
            for line in code.lines() {
                println!("{pad}{}", line.cyan());
            }
            println!("{pad}{}", "```".bright_black());
        }
        ViewNode::Media(media) => {
            println!(
                "{pad}{}",
                format!("[{}] {}", media.kind, media.url).bright_cyan()
            );
        }
        ViewNode::Folded { path, summary } => {
            println!("{pad}{}", format!("[folded {path}: {summary}]").bright_black());
        }
        ViewNode::Items(items) => {
            for item in items {
                print_view(item, indent);
            }
        }
        ViewNode::Entries(entries) => {
            for (key, child) in entries {
                println!("{pad}{}", format!("{key}:").bold());
                print_view(child, indent + 1);
            }
        }
        ViewNode::Labelled { label, child } => {
            println!("{pad}{}", label.bold());
            print_view(child, indent + 1);
        }
    }
}
