//! Terminal front-ends: an interactive chat against a running server and
//! the landing demo, both drawing into the in-memory viewer.

use std::io::Write;
use std::sync::Arc;

use pharmadock_client::conversation::{Bubble, BubbleId, ChatMessage, ConversationView};
use pharmadock_client::download::trigger_download;
use pharmadock_client::headless::{ContainerState, HeadlessContainer, HeadlessDocument};
use pharmadock_client::landing::{LandingInitializer, LandingMessages, LandingOutcome, TypingSurface};
use pharmadock_client::markdown::MarkdownRenderer;
use pharmadock_client::transport::{HttpClient, StaticAssets};
use pharmadock_client::{ChatController, ClientError, LoadOutcome, TurnOutcome, ViewerLoader};
use pharmadock_config::Config;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

const VIEWER_CONTAINER: &str = "viewer-container";

/// Markdown is left as typed; terminals read it fine.
struct PlainText;

impl MarkdownRenderer for PlainText {
    fn to_html(&self, markdown: &str) -> Result<String, ClientError> {
        Ok(markdown.to_string())
    }
}

#[derive(Default)]
struct TerminalView {
    next: u64,
}

impl ConversationView for TerminalView {
    fn append(&mut self, bubble: Bubble) -> BubbleId {
        self.next += 1;
        let id = match &bubble {
            Bubble::Placeholder { id } => {
                eprintln!("  ...");
                return BubbleId(id.clone());
            }
            _ => BubbleId(format!("bubble-{}", self.next)),
        };
        match bubble {
            Bubble::User(_) | Bubble::Placeholder { .. } => {}
            Bubble::Assistant { html: text, download } | Bubble::Raw { text, download } => {
                println!("\n{}\n", text);
                if let Some(d) = download {
                    println!("  [docking log: {}, /download to save it]", d.filename);
                }
            }
            Bubble::Error(text) => println!("\n! {}\n", text),
            Bubble::NetworkError(text) => println!("\n! network error: {}\n", text),
        }
        id
    }

    fn remove(&mut self, _id: &BubbleId) {}

    fn clear_input(&mut self) {}

    fn scroll_to_latest(&mut self) {
        print!("> ");
        let _ = std::io::stdout().flush();
    }
}

struct TerminalSurface;

impl TypingSurface for TerminalSurface {
    fn show(&mut self, text: &str) {
        print!("\r\x1b[2K{}", text);
        let _ = std::io::stdout().flush();
    }
}

fn print_scene(state: &ContainerState) {
    let Some(scene) = &state.scene else {
        println!("  (viewer empty)");
        return;
    };
    for (i, model) in scene.models.iter().enumerate() {
        println!(
            "  model {}: {} atoms, {} frame(s), {} style layer(s)",
            i,
            model.structure.atom_count(),
            model.structure.frame_count(),
            model.styles.len()
        );
    }
}

/// One line typed at the chat prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Download,
    Message(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "/quit" => Input::Quit,
        "/download" => Input::Download,
        _ => Input::Message(line),
    }
}

/// Path of the docking log attached to the most recent docking reply.
fn latest_log(entries: &[ChatMessage]) -> Option<String> {
    entries
        .iter()
        .rev()
        .find_map(|m| m.attachments.as_ref()?.log.as_ref())
        .map(|log| log.as_str().to_string())
}

fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}

fn viewer(doc: &HeadlessDocument) -> HeadlessContainer {
    doc.add_container(VIEWER_CONTAINER, (0, 0))
}

pub async fn run_chat(config: &Config, server_url: &str) -> anyhow::Result<()> {
    let client = Arc::new(HttpClient::new(server_url)?.with_download_dir(&config.client.download_dir));
    client.open_session().await?;
    println!(
        "Connected to {}. Ask for a gene and a drug to dock; /download saves the last docking log, /quit leaves.",
        client.base_url()
    );

    let doc = HeadlessDocument::new();
    let container = viewer(&doc);
    let loader = Arc::new(ViewerLoader::new(Arc::new(doc.factory()), client.clone()));
    let mut controller = ChatController::new(
        TerminalView::default(),
        client.clone(),
        Arc::new(PlainText),
        loader,
        Arc::new(container.clone()),
        client.base_url(),
    );

    prompt()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = match parse_input(&line) {
            Input::Quit => break,
            Input::Download => {
                match latest_log(controller.log().entries()) {
                    Some(log) => {
                        trigger_download(client.as_ref(), client.base_url(), &log).await;
                        println!("  downloading into {}", config.client.download_dir.display());
                    }
                    None => println!("  no docking log yet"),
                }
                prompt()?;
                continue;
            }
            Input::Message(text) => text,
        };
        let TurnOutcome::Replied { viewer } = controller.send(text).await else {
            continue;
        };

        if let Some(load) = viewer {
            match load.await {
                Ok(LoadOutcome::Loaded(_)) => print_scene(&container.snapshot()),
                Ok(LoadOutcome::Failed(reason)) => println!("  viewer: {}", reason),
                Ok(other) => println!("  viewer: {:?}", other),
                Err(e) => warn!("viewer task failed: {}", e),
            }
            prompt()?;
        }
    }

    if let Err(e) = client.end_conversation().await {
        warn!("Could not end the conversation: {}", e);
    }
    Ok(())
}

pub async fn run_demo(config: &Config) -> anyhow::Result<()> {
    let doc = HeadlessDocument::new();
    let container = viewer(&doc);
    let assets = Arc::new(StaticAssets::new(&config.server.static_dir));
    let loader = Arc::new(ViewerLoader::new(Arc::new(doc.factory()), assets));
    let messages = config.landing.messages.clone().and_then(LandingMessages::new);

    let landing = LandingInitializer::new(messages, loader, Arc::new(container.clone()));
    let outcome = landing.run(&mut TerminalSurface).await;
    println!();
    if let LandingOutcome::Finished(Some(_)) = outcome {
        print_scene(&container.snapshot());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmadock_client::conversation::{DockingAttachments, Role};
    use pharmadock_common::FileReference;
    use pretty_assertions::assert_eq;

    fn message(role: Role, log: Option<&str>) -> ChatMessage {
        ChatMessage {
            role,
            text: String::new(),
            attachments: log.map(|l| DockingAttachments { log: Some(FileReference::new(l)), files: None }),
            is_error: false,
        }
    }

    #[test]
    fn test_commands_are_recognised() {
        assert_eq!(parse_input(" /quit "), Input::Quit);
        assert_eq!(parse_input("/download"), Input::Download);
        assert_eq!(parse_input("dock aspirin"), Input::Message("dock aspirin"));
    }

    #[test]
    fn test_latest_log_skips_plain_replies() {
        let entries = vec![
            message(Role::User, None),
            message(Role::Assistant, Some("out/a_vina.log")),
            message(Role::User, None),
            message(Role::Assistant, None),
        ];
        assert_eq!(latest_log(&entries).as_deref(), Some("out/a_vina.log"));
        assert_eq!(latest_log(&entries[..1]), None);
    }
}
