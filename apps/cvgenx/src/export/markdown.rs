//! Markdown front end shared by the PDF and DOCX writers.
//!
//! The PDF writer consumes a flat block model; the DOCX writer consumes HTML.
//! Both treat a single newline inside a paragraph as a hard line break, which
//! is how generated resumes lay out their contact lines.

use pulldown_cmark::{html, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text { text: String, style: SpanStyle },
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMarker {
    Bullet,
    Number(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, inlines: Vec<Inline> },
    Paragraph(Vec<Inline>),
    /// `depth` is 0 for a top-level list.
    ListItem { marker: ListMarker, depth: usize, inlines: Vec<Inline> },
    Rule,
    Code(String),
    TableRow { header: bool, cells: Vec<Vec<Inline>> },
}

const DOCUMENT_CSS: &str = r#"
body {
  font-family: Helvetica, Arial, sans-serif;
  font-size: 11pt;
  line-height: 1.5;
  color: #24292f;
  background-color: #ffffff;
  margin: 0;
}
h1, h2, h3, h4, h5, h6 {
  margin-top: 18pt;
  margin-bottom: 8pt;
  font-weight: 600;
  line-height: 1.25;
}
h1 { font-size: 20pt; border-bottom: 1px solid #eaecef; padding-bottom: .3em; }
h2 { font-size: 16pt; border-bottom: 1px solid #eaecef; padding-bottom: .3em; }
h3 { font-size: 13pt; }
p { margin-top: 0; margin-bottom: 10pt; }
a { color: #0969da; text-decoration: none; }
ul, ol { padding-left: 2em; margin-top: 0; margin-bottom: 10pt; }
li { margin-top: 0.25em; }
table { border-collapse: collapse; margin-bottom: 10pt; }
th, td { border: 1px solid #d0d7de; padding: 4pt 8pt; }
th { font-weight: 600; background-color: #f6f8fa; }
code {
  padding: .2em .4em;
  font-size: 85%;
  background-color: #f6f8fa;
  font-family: Consolas, "Courier New", monospace;
}
pre { background-color: #f6f8fa; padding: 8pt; }
"#;

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Renders markdown to a complete, styled HTML document.
pub fn to_html_document(markdown: &str) -> String {
    let events = Parser::new_ext(markdown, options()).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut body = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut body, events);

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<style>{DOCUMENT_CSS}</style>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}

/// What the text currently being collected belongs to.
enum Open {
    Heading(u8),
    Paragraph,
    Item { marker: ListMarker, depth: usize },
    Cell,
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    open: Option<Open>,
    inlines: Vec<Inline>,
    /// Next number per open list; `None` for bullet lists.
    lists: Vec<Option<u64>>,
    in_item: bool,
    bold: usize,
    italic: usize,
    link: Option<String>,
    code_block: Option<String>,
    row: Option<(bool, Vec<Vec<Inline>>)>,
}

impl BlockBuilder {
    fn style(&self, code: bool) -> SpanStyle {
        SpanStyle {
            bold: self.bold > 0,
            italic: self.italic > 0,
            code,
            link: self.link.clone(),
        }
    }

    fn push_text(&mut self, text: &str, code: bool) {
        if let Some(buffer) = self.code_block.as_mut() {
            buffer.push_str(text);
            return;
        }
        if text.is_empty() {
            return;
        }
        if self.open.is_none() {
            self.open = Some(Open::Paragraph);
        }
        let style = self.style(code);
        // Merge with the previous run when nothing about the style changed.
        if let Some(Inline::Text { text: prev, style: prev_style }) = self.inlines.last_mut() {
            if *prev_style == style {
                prev.push_str(text);
                return;
            }
        }
        self.inlines.push(Inline::Text {
            text: text.to_string(),
            style,
        });
    }

    fn push_break(&mut self) {
        if self.open.is_some() && !self.inlines.is_empty() {
            self.inlines.push(Inline::Break);
        }
    }

    /// Emits the open block, if it collected anything.
    fn flush(&mut self) {
        let Some(open) = self.open.take() else {
            return;
        };
        let mut inlines = std::mem::take(&mut self.inlines);
        while matches!(inlines.last(), Some(Inline::Break)) {
            inlines.pop();
        }

        match open {
            Open::Cell => {
                if let Some((_, cells)) = self.row.as_mut() {
                    cells.push(inlines);
                }
            }
            _ if inlines.is_empty() => {}
            Open::Heading(level) => self.blocks.push(Block::Heading { level, inlines }),
            Open::Paragraph => self.blocks.push(Block::Paragraph(inlines)),
            Open::Item { marker, depth } => self.blocks.push(Block::ListItem {
                marker,
                depth,
                inlines,
            }),
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                self.open = Some(Open::Heading(heading_level(level)));
            }
            Tag::Paragraph => {
                if matches!(self.open, Some(Open::Item { .. })) {
                    // Loose list: paragraphs inside one item stay in that item.
                    self.push_break();
                } else {
                    self.flush();
                    self.open = Some(Open::Paragraph);
                }
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(next)) => {
                        let n = *next;
                        *next += 1;
                        ListMarker::Number(n)
                    }
                    _ => ListMarker::Bullet,
                };
                self.in_item = true;
                self.open = Some(Open::Item { marker, depth });
            }
            Tag::CodeBlock(_) => {
                self.flush();
                self.code_block = Some(String::new());
            }
            Tag::TableHead => self.row = Some((true, Vec::new())),
            Tag::TableRow => self.row = Some((false, Vec::new())),
            Tag::TableCell => {
                self.open = Some(Open::Cell);
                self.inlines.clear();
            }
            Tag::Strong => self.bold += 1,
            Tag::Emphasis => self.italic += 1,
            Tag::Link { dest_url, .. } => self.link = Some(dest_url.to_string()),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => self.flush(),
            TagEnd::Paragraph => {
                if !self.in_item {
                    self.flush();
                }
            }
            TagEnd::Item => {
                self.flush();
                self.in_item = false;
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                self.in_item = !self.lists.is_empty();
            }
            TagEnd::CodeBlock => {
                if let Some(code) = self.code_block.take() {
                    let code = code.trim_end_matches('\n');
                    if !code.is_empty() {
                        self.blocks.push(Block::Code(code.to_string()));
                    }
                }
            }
            TagEnd::TableCell => self.flush(),
            TagEnd::TableHead | TagEnd::TableRow => {
                if let Some((header, cells)) = self.row.take() {
                    if cells.iter().any(|cell| !cell.is_empty()) {
                        self.blocks.push(Block::TableRow { header, cells });
                    }
                }
            }
            TagEnd::Strong => self.bold = self.bold.saturating_sub(1),
            TagEnd::Emphasis => self.italic = self.italic.saturating_sub(1),
            TagEnd::Link => self.link = None,
            TagEnd::BlockQuote => self.flush(),
            _ => {}
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.push_text(&text, false),
            Event::Code(code) => self.push_text(&code, true),
            Event::SoftBreak | Event::HardBreak => self.push_break(),
            Event::Rule => {
                self.flush();
                self.blocks.push(Block::Rule);
            }
            Event::TaskListMarker(done) => self.push_text(if done { "[x] " } else { "[ ] " }, false),
            Event::FootnoteReference(label) => self.push_text(&format!("[{label}]"), false),
            _ => {}
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Parses markdown into the flat block model used for PDF layout.
pub fn parse_blocks(markdown: &str) -> Vec<Block> {
    let mut builder = BlockBuilder::default();
    for event in Parser::new_ext(markdown, options()) {
        builder.event(event);
    }
    builder.flush();
    builder.blocks
}
