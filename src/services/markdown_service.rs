use std::collections::HashMap;

use pulldown_cmark::{html, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Converts raw markdown bytes into HTML bytes.
///
/// Implementations must be pure: the same input always gives the same output.
pub trait MarkdownRenderer: Send + Sync {
    fn convert(&self, source: &[u8]) -> Vec<u8>;
}

/// Markdown rendering backed by pulldown-cmark
#[derive(Debug, Clone)]
pub struct MarkdownService {
    options: Options,
}

impl MarkdownService {
    /// Create a new markdown service
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        Self { options }
    }

    /// Render markdown text to an HTML string, giving each heading an anchor id
    pub fn render(&self, content: &str) -> String {
        let events: Vec<Event> = Parser::new_ext(content, self.options).collect();
        let mut ids = heading_ids(&events).into_iter();

        let events = events.into_iter().map(|ev| match ev {
            Event::Start(Tag::Heading { level, id, classes, attrs }) => {
                let slug = ids.next().map(CowStr::from);
                Event::Start(Tag::Heading { level, id: id.or(slug), classes, attrs })
            }
            other => other,
        });

        let mut out = String::with_capacity(content.len() * 3 / 2);
        html::push_html(&mut out, events);
        out
    }
}

impl Default for MarkdownService {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer for MarkdownService {
    fn convert(&self, source: &[u8]) -> Vec<u8> {
        self.render(&String::from_utf8_lossy(source)).into_bytes()
    }
}

/// One unique slug per heading, in document order
fn heading_ids(events: &[Event]) -> Vec<String> {
    let mut ids = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut current: Option<HeadingLevel> = None;
    let mut buf = String::new();

    for ev in events {
        match ev {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some(*level);
                buf.clear();
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(level) = current.take() {
                    let mut id = slugify(&buf);
                    if id.is_empty() {
                        id = format!("h{}", heading_level_to_u32(level));
                    }
                    let count = counts.entry(id.clone()).or_insert(0);
                    if *count > 0 {
                        id = format!("{}-{}", id, *count);
                    }
                    *count += 1;
                    ids.push(id);
                }
            }
            Event::Text(t) | Event::Code(t) if current.is_some() => buf.push_str(t),
            Event::SoftBreak | Event::HardBreak if current.is_some() => buf.push(' '),
            _ => {}
        }
    }
    ids
}

/// Convert heading level to u32
fn heading_level_to_u32(level: HeadingLevel) -> u32 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Create URL-friendly slug from text
fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_dash = false;
    for ch in text.chars() {
        let c = ch.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_dash = false;
        } else if (c.is_ascii_whitespace() || c == '-' || c == '_') && !last_dash && !out.is_empty() {
            out.push('-');
            last_dash = true;
        }
    }
    if out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(src: &str) -> String {
        String::from_utf8(MarkdownService::new().convert(src.as_bytes())).unwrap()
    }

    #[test]
    fn renders_paragraphs_and_emphasis() {
        assert_eq!(convert("Hello *world*"), "<p>Hello <em>world</em></p>\n");
    }

    #[test]
    fn headings_get_unique_ids() {
        let out = convert("# Getting Started\n\n## Setup\n\n## Setup\n");
        assert!(out.contains("<h1 id=\"getting-started\">Getting Started</h1>"));
        assert!(out.contains("<h2 id=\"setup\">Setup</h2>"));
        assert!(out.contains("<h2 id=\"setup-1\">Setup</h2>"));
    }

    #[test]
    fn symbol_only_heading_falls_back_to_level() {
        assert!(convert("### ???\n").contains("<h3 id=\"h3\">"));
    }

    #[test]
    fn tables_are_enabled() {
        let out = convert("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(out.contains("<table>"));
        assert!(out.contains("<th>a</th>"));
        assert!(out.contains("<td>2</td>"));
    }

    #[test]
    fn conversion_is_deterministic() {
        let svc = MarkdownService::new();
        let src = b"# Title\n\n- one\n- ~~two~~\n";
        assert_eq!(svc.convert(src), svc.convert(src));
    }

    #[test]
    fn invalid_utf8_is_tolerated() {
        let out = MarkdownService::new().convert(b"caf\xe9");
        assert!(String::from_utf8(out).unwrap().starts_with("<p>caf"));
    }
}
