//! Markdown to HTML for assistant bubbles.
//!
//! CommonMark plus tables, task lists and strikethrough, with `:shortcode:`
//! emoji and bare `http(s)://` URLs turned into links. Neither rewrite
//! touches code spans, code blocks or existing links.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::LazyLock;

use pulldown_cmark::{html, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd};
use regex::{Captures, Regex};

use crate::error::{ClientError, Result};

pub trait MarkdownRenderer: Send + Sync {
    fn to_html(&self, markdown: &str) -> Result<String>;
}

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"']*[^\s<>"'.,;:!?)\]]"#).expect("static regex")
});

static SHORTCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([a-z0-9_+\-]+):").expect("static regex"));

const EMOJI: &[(&str, &str)] = &[
    ("+1", "👍"),
    ("-1", "👎"),
    ("bulb", "💡"),
    ("check", "✔️"),
    ("dna", "🧬"),
    ("heart", "❤️"),
    ("hourglass", "⌛"),
    ("microscope", "🔬"),
    ("pill", "💊"),
    ("point_right", "👉"),
    ("rocket", "🚀"),
    ("smile", "😄"),
    ("star", "⭐"),
    ("tada", "🎉"),
    ("test_tube", "🧪"),
    ("thumbsup", "👍"),
    ("warning", "⚠️"),
    ("wave", "👋"),
    ("white_check_mark", "✅"),
    ("x", "❌"),
];

fn emoji(code: &str) -> Option<&'static str> {
    EMOJI.iter().find(|(name, _)| *name == code).map(|(_, e)| *e)
}

fn replace_shortcodes(text: &str) -> String {
    SHORTCODE_RE
        .replace_all(text, |caps: &Captures<'_>| match emoji(&caps[1]) {
            Some(e) => e.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Split plain text into text and autolink events.
fn linkify(text: &str, out: &mut Vec<Event<'static>>) {
    let mut last = 0;
    for m in URL_RE.find_iter(text) {
        if m.start() > last {
            out.push(Event::Text(CowStr::from(text[last..m.start()].to_string())));
        }
        out.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(m.as_str().to_string()),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        out.push(Event::Text(CowStr::from(m.as_str().to_string())));
        out.push(Event::End(TagEnd::Link));
        last = m.end();
    }
    if last < text.len() {
        out.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
}

fn render(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut events: Vec<Event<'static>> = Vec::new();
    let mut pending = String::new();
    let mut in_link = 0usize;
    let mut in_code = false;

    // Adjacent text events are joined first so a URL split by the parser
    // still links as a whole.
    for event in Parser::new_ext(markdown, options) {
        if let Event::Text(text) = &event {
            if in_link == 0 && !in_code {
                pending.push_str(text);
                continue;
            }
        }
        if !pending.is_empty() {
            linkify(&replace_shortcodes(&pending), &mut events);
            pending.clear();
        }
        match &event {
            Event::Start(Tag::Link { .. }) => in_link += 1,
            Event::End(TagEnd::Link) => in_link = in_link.saturating_sub(1),
            Event::Start(Tag::CodeBlock(_)) => in_code = true,
            Event::End(TagEnd::CodeBlock) => in_code = false,
            _ => {}
        }
        events.push(event.into_static());
    }
    if !pending.is_empty() {
        linkify(&replace_shortcodes(&pending), &mut events);
    }

    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// The default renderer, built on pulldown-cmark.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMark;

impl MarkdownRenderer for CommonMark {
    fn to_html(&self, markdown: &str) -> Result<String> {
        catch_unwind(AssertUnwindSafe(|| render(markdown)))
            .map_err(|_| ClientError::Markdown("renderer panicked".to_string()))
    }
}
