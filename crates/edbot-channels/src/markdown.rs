use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, html};

const UNSAFE_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

fn options() -> Options {
    Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES
}

fn is_unsafe_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    UNSAFE_SCHEMES.iter().any(|s| lower.starts_with(s))
}

/// Render model markdown to HTML for the web chat.
///
/// Raw HTML in the input is escaped rather than passed through, and links with
/// script-capable schemes are neutralized.
#[must_use]
pub fn markdown_to_html(input: &str) -> String {
    let parser = Parser::new_ext(input, options()).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) if is_unsafe_url(&dest_url) => Event::Start(Tag::Link {
            link_type,
            dest_url: CowStr::Borrowed("#"),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::with_capacity(input.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Render model markdown as plain terminal text.
///
/// Emphasis markers are dropped, list items get bullets or numbers, and links
/// show their target after the link text: `Agile (https://...)`.
#[must_use]
pub fn markdown_to_terminal(input: &str) -> String {
    let parser = Parser::new_ext(input, options());
    let mut renderer = TerminalRenderer::new(input.len());
    for event in parser {
        renderer.push_event(event);
    }
    renderer.finish()
}

struct TerminalRenderer {
    output: String,
    lists: Vec<Option<u64>>,
    link: Option<(String, usize)>,
}

impl TerminalRenderer {
    fn new(capacity: usize) -> Self {
        Self {
            output: String::with_capacity(capacity),
            lists: Vec::new(),
            link: None,
        }
    }

    fn push_event(&mut self, event: Event<'_>) {
        match event {
            Event::Text(text) | Event::Code(text) | Event::Html(text) | Event::InlineHtml(text) => {
                self.output.push_str(&text);
            }
            Event::SoftBreak | Event::HardBreak => self.output.push('\n'),
            Event::Rule => {
                self.ensure_newline();
                self.output.push_str("────────\n\n");
            }
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::CodeBlock) => {
                self.ensure_newline();
                if self.lists.is_empty() {
                    self.output.push('\n');
                }
            }
            Event::Start(Tag::List(start)) => {
                self.ensure_newline();
                self.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.output.push('\n');
                }
            }
            Event::Start(Tag::Item) => {
                self.ensure_newline();
                let depth = self.lists.len().saturating_sub(1);
                self.output.push_str(&"  ".repeat(depth));
                match self.lists.last_mut() {
                    Some(Some(n)) => {
                        self.output.push_str(&format!("{n}. "));
                        *n += 1;
                    }
                    _ => self.output.push_str("• "),
                }
            }
            Event::End(TagEnd::Item) => self.ensure_newline(),
            Event::Start(Tag::Link { dest_url, .. }) => {
                self.link = Some((dest_url.to_string(), self.output.len()));
            }
            Event::End(TagEnd::Link) => {
                if let Some((url, start)) = self.link.take()
                    && self.output[start..] != url
                {
                    self.output.push_str(" (");
                    self.output.push_str(&url);
                    self.output.push(')');
                }
            }
            Event::End(TagEnd::TableRow | TagEnd::TableHead) => self.output.push('\n'),
            Event::End(TagEnd::TableCell) => self.output.push_str(" | "),
            _ => {}
        }
    }

    fn ensure_newline(&mut self) {
        if !self.output.is_empty() && !self.output.ends_with('\n') {
            self.output.push('\n');
        }
    }

    fn finish(self) -> String {
        self.output.trim_end().to_owned()
    }
}
