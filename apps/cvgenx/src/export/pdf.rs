//! PDF writer: lays the block model out on US Letter pages using the standard
//! Type1 fonts, so nothing has to be embedded.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};

use super::font_metrics::{encode_win_ansi, Font};
use super::markdown::{Block, Inline, ListMarker, SpanStyle};
use super::ExportError;

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 50.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const BODY_SIZE: f32 = 11.0;
const CODE_SIZE: f32 = 10.0;
const LEADING: f32 = 1.25;

const LIST_INDENT: f32 = 20.0;
const MARKER_WIDTH: f32 = 16.0;

const TEXT_COLOR: [f32; 3] = [0.0, 0.0, 0.0];
const LINK_COLOR: [f32; 3] = [0.035, 0.412, 0.855]; // #0969da
const RULE_GREY: f32 = 0.8; // #cccccc

fn heading_size(level: u8) -> f32 {
    match level {
        1 => 20.0,
        2 => 18.0,
        3 => 16.0,
        4 => 14.0,
        5 => 12.0,
        _ => 11.0,
    }
}

/// A run of text in a single font, already WinAnsi-encoded.
#[derive(Debug, Clone)]
struct Piece {
    font: Font,
    size: f32,
    text: Vec<u8>,
    link: Option<String>,
}

impl Piece {
    fn width(&self) -> f32 {
        self.font.metrics().measure(&self.text, self.size)
    }
}

#[derive(Debug)]
enum Token {
    /// Unbreakable run of pieces. `space_before` is false when it is glued to
    /// the previous word (e.g. `**bold**,`).
    Word { pieces: Vec<Piece>, space_before: bool },
    Break,
}

#[derive(Default)]
struct Tokenizer {
    tokens: Vec<Token>,
    pieces: Vec<Piece>,
    word_space: bool,
    pending_space: bool,
}

impl Tokenizer {
    fn finish_word(&mut self) {
        if !self.pieces.is_empty() {
            self.tokens.push(Token::Word {
                pieces: std::mem::take(&mut self.pieces),
                space_before: self.word_space,
            });
        }
    }

    fn push_char(&mut self, ch: char, font: Font, size: f32, link: &Option<String>) {
        if ch.is_whitespace() {
            self.finish_word();
            self.pending_space = true;
            return;
        }
        if self.pieces.is_empty() {
            self.word_space = self.pending_space;
            self.pending_space = false;
        }

        let mut buf = [0u8; 4];
        let encoded = encode_win_ansi(ch.encode_utf8(&mut buf));
        match self.pieces.last_mut() {
            Some(last) if last.font == font && last.size == size && last.link == *link => {
                last.text.extend_from_slice(&encoded);
            }
            _ => self.pieces.push(Piece {
                font,
                size,
                text: encoded,
                link: link.clone(),
            }),
        }
    }

    fn push_break(&mut self) {
        self.finish_word();
        self.pending_space = false;
        self.tokens.push(Token::Break);
    }
}

fn tokenize(inlines: &[Inline], size: f32, force_bold: bool) -> Vec<Token> {
    let mut tokenizer = Tokenizer::default();
    for inline in inlines {
        match inline {
            Inline::Break => tokenizer.push_break(),
            Inline::Text { text, style } => {
                let font = Font::for_style(style.bold || force_bold, style.italic, style.code);
                let piece_size = if style.code {
                    (size - 1.0).max(9.0)
                } else {
                    size
                };
                for ch in text.chars() {
                    tokenizer.push_char(ch, font, piece_size, &style.link);
                }
            }
        }
    }
    tokenizer.finish_word();
    tokenizer.tokens
}

#[derive(Debug)]
struct Placed {
    piece: Piece,
    x: f32,
    width: f32,
}

#[derive(Debug)]
struct Line {
    items: Vec<Placed>,
    width: f32,
    /// Largest font size on the line; drives the line height.
    size: f32,
}

impl Line {
    fn new(size: f32) -> Self {
        Self {
            items: Vec::new(),
            width: 0.0,
            size,
        }
    }
}

/// Greedy word wrap. A word wider than the line is placed alone and allowed
/// to overflow.
fn wrap(tokens: Vec<Token>, max_width: f32, base_size: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut line = Line::new(base_size);

    for token in tokens {
        match token {
            Token::Break => lines.push(std::mem::replace(&mut line, Line::new(base_size))),
            Token::Word {
                pieces,
                space_before,
            } => {
                let word_width: f32 = pieces.iter().map(Piece::width).sum();
                let mut space = match pieces.first() {
                    Some(first) if space_before && !line.items.is_empty() => {
                        first.font.metrics().measure(b" ", first.size)
                    }
                    _ => 0.0,
                };

                if space > 0.0 && line.width + space + word_width > max_width {
                    lines.push(std::mem::replace(&mut line, Line::new(base_size)));
                    space = 0.0;
                }

                let mut x = line.width + space;
                for piece in pieces {
                    let width = piece.width();
                    line.size = line.size.max(piece.size);
                    line.items.push(Placed { piece, x, width });
                    x += width;
                }
                line.width = x;
            }
        }
    }

    if !line.items.is_empty() {
        lines.push(line);
    }
    lines
}

#[derive(Debug, Default)]
struct PageContent {
    ops: Vec<Operation>,
    annots: Vec<Object>,
}

struct PageWriter {
    pages: Vec<PageContent>,
    current: PageContent,
    y: f32,
}

fn real(value: f32) -> Object {
    Object::Real(value)
}

fn color(rgb: [f32; 3]) -> Vec<Object> {
    rgb.iter().map(|c| real(*c)).collect()
}

impl PageWriter {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: PageContent::default(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn at_top(&self) -> bool {
        self.y >= PAGE_HEIGHT - MARGIN
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn ensure(&mut self, height: f32) {
        if self.y - height < MARGIN && !self.at_top() {
            self.new_page();
        }
    }

    /// Vertical space between blocks; swallowed at the top of a page.
    fn gap(&mut self, amount: f32) {
        if !self.at_top() {
            self.y -= amount;
        }
    }

    fn text(&mut self, piece: &Piece, x: f32, baseline: f32) {
        let rgb = if piece.link.is_some() {
            LINK_COLOR
        } else {
            TEXT_COLOR
        };
        let ops = &mut self.current.ops;
        ops.push(Operation::new("rg", color(rgb)));
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![
                Object::Name(piece.font.resource_name().as_bytes().to_vec()),
                real(piece.size),
            ],
        ));
        ops.push(Operation::new("Td", vec![real(x), real(baseline)]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(piece.text.clone(), StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    fn stroke(&mut self, rgb: [f32; 3], width: f32, from: (f32, f32), to: (f32, f32)) {
        let ops = &mut self.current.ops;
        ops.push(Operation::new("RG", color(rgb)));
        ops.push(Operation::new("w", vec![real(width)]));
        ops.push(Operation::new("m", vec![real(from.0), real(from.1)]));
        ops.push(Operation::new("l", vec![real(to.0), real(to.1)]));
        ops.push(Operation::new("S", vec![]));
    }

    fn link_annotation(&mut self, url: &str, rect: [f32; 4]) {
        self.current.annots.push(Object::Dictionary(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => rect.iter().map(|v| real(*v)).collect::<Vec<_>>(),
            "Border" => vec![0.into(), 0.into(), 0.into()],
            "A" => dictionary! {
                "S" => "URI",
                "URI" => Object::String(url.as_bytes().to_vec(), StringFormat::Literal),
            },
        }));
    }

    /// Draws one wrapped line at `x0`, breaking the page first if needed.
    /// Returns the baseline used.
    fn line(&mut self, line: &Line, x0: f32) -> f32 {
        let height = line.size * LEADING;
        self.ensure(height);
        let baseline = self.y - line.size;

        let mut link_run: Option<(&str, f32, f32, f32)> = None;
        for item in &line.items {
            let x = x0 + item.x;
            self.text(&item.piece, x, baseline);

            if let Some(url) = item.piece.link.as_deref() {
                let underline_y = baseline - 1.5;
                self.stroke(LINK_COLOR, 0.5, (x, underline_y), (x + item.width, underline_y));
                link_run = match link_run {
                    Some((run_url, start, _, size)) if run_url == url => {
                        Some((run_url, start, x + item.width, size.max(item.piece.size)))
                    }
                    previous => {
                        if let Some((prev_url, start, end, size)) = previous {
                            self.link_annotation(prev_url, [start, baseline - 3.0, end, baseline + size]);
                        }
                        Some((url, x, x + item.width, item.piece.size))
                    }
                };
            }
        }
        if let Some((url, start, end, size)) = link_run {
            self.link_annotation(url, [start, baseline - 3.0, end, baseline + size]);
        }

        self.y -= height;
        baseline
    }

    fn rule(&mut self) {
        self.gap(BODY_SIZE * 0.5);
        self.ensure(BODY_SIZE);
        let y = self.y;
        self.stroke(
            [RULE_GREY; 3],
            1.0,
            (MARGIN, y),
            (PAGE_WIDTH - MARGIN, y),
        );
        self.y -= BODY_SIZE * 0.5;
    }

    fn finish(mut self) -> Vec<PageContent> {
        if !self.current.ops.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

fn plain(text: &str) -> Inline {
    Inline::Text {
        text: text.to_string(),
        style: SpanStyle::default(),
    }
}

fn list_marker(marker: ListMarker) -> String {
    match marker {
        ListMarker::Bullet => "\u{2022}".to_string(),
        ListMarker::Number(n) => format!("{n}."),
    }
}

/// Splits code into lines that fit the content width. Courier is
/// monospaced, so the split is by character count.
fn code_lines(code: &str) -> Vec<String> {
    let per_line = (CONTENT_WIDTH / (0.6 * CODE_SIZE)).floor().max(1.0) as usize;
    let mut lines = Vec::new();
    for raw in code.lines() {
        let chars: Vec<char> = raw.chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
            continue;
        }
        for chunk in chars.chunks(per_line) {
            lines.push(chunk.iter().collect());
        }
    }
    lines
}

fn layout(blocks: &[Block]) -> Vec<PageContent> {
    let mut writer = PageWriter::new();
    let mut in_list = false;

    for block in blocks {
        let is_item = matches!(block, Block::ListItem { .. });
        if in_list && !is_item {
            writer.gap(BODY_SIZE * 0.3);
        }
        if !in_list && is_item {
            writer.gap(BODY_SIZE * 0.2);
        }
        in_list = is_item;

        match block {
            Block::Heading { level, inlines } => {
                let size = heading_size(*level);
                writer.gap(size * 0.5);
                for line in wrap(tokenize(inlines, size, true), CONTENT_WIDTH, size) {
                    writer.line(&line, MARGIN);
                }
                writer.gap(size * 0.3);
            }
            Block::Paragraph(inlines) => {
                for line in wrap(tokenize(inlines, BODY_SIZE, false), CONTENT_WIDTH, BODY_SIZE) {
                    writer.line(&line, MARGIN);
                }
                writer.gap(BODY_SIZE * 0.5);
            }
            Block::ListItem {
                marker,
                depth,
                inlines,
            } => {
                let marker_x = MARGIN + LIST_INDENT * (*depth as f32) + 6.0;
                let text_x = marker_x + MARKER_WIDTH;
                let lines = wrap(
                    tokenize(inlines, BODY_SIZE, false),
                    PAGE_WIDTH - MARGIN - text_x,
                    BODY_SIZE,
                );
                let marker_piece = Piece {
                    font: Font::Regular,
                    size: BODY_SIZE,
                    text: encode_win_ansi(&list_marker(*marker)),
                    link: None,
                };
                for (i, line) in lines.iter().enumerate() {
                    let baseline = writer.line(line, text_x);
                    if i == 0 {
                        writer.text(&marker_piece, marker_x, baseline);
                    }
                }
                writer.gap(BODY_SIZE * 0.2);
            }
            Block::Rule => writer.rule(),
            Block::Code(code) => {
                for text in code_lines(code) {
                    let piece = Piece {
                        font: Font::Mono,
                        size: CODE_SIZE,
                        text: encode_win_ansi(&text),
                        link: None,
                    };
                    let width = piece.width();
                    let line = Line {
                        items: vec![Placed {
                            piece,
                            x: 0.0,
                            width,
                        }],
                        width,
                        size: CODE_SIZE,
                    };
                    writer.line(&line, MARGIN);
                }
                writer.gap(BODY_SIZE * 0.5);
            }
            Block::TableRow { header, cells } => {
                let mut inlines = Vec::new();
                for (i, cell) in cells.iter().enumerate() {
                    if i > 0 {
                        inlines.push(plain(" | "));
                    }
                    inlines.extend(cell.iter().cloned());
                }
                for line in wrap(tokenize(&inlines, BODY_SIZE, *header), CONTENT_WIDTH, BODY_SIZE) {
                    writer.line(&line, MARGIN);
                }
                writer.gap(BODY_SIZE * 0.2);
            }
        }
    }

    writer.finish()
}

/// Renders the block model into a complete PDF file.
pub fn render(blocks: &[Block]) -> Result<Vec<u8>, ExportError> {
    let pages = layout(blocks);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for font in Font::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content {
            operations: page.ops,
        };
        let encoded = content
            .encode()
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if !page.annots.is_empty() {
            page_dict.set("Annots", page.annots);
        }
        kids.push(doc.add_object(page_dict).into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    Ok(out)
}
