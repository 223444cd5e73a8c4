//! Lay flattened lines out on fixed-size pages and write the PDF.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, StringFormat, Stream, dictionary};

use super::PageSetup;
use super::markup::{Block, Style};
use crate::core::CollaboratorError;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";
const RULE_GAP: i64 = 4;

struct Metrics {
    font: &'static str,
    size: i64,
    leading: i64,
}

fn metrics(style: Style) -> Metrics {
    match style {
        Style::Title => Metrics {
            font: BOLD,
            size: 16,
            leading: 24,
        },
        Style::Heading => Metrics {
            font: BOLD,
            size: 12,
            leading: 18,
        },
        Style::Bold => Metrics {
            font: BOLD,
            size: 9,
            leading: 13,
        },
        Style::Body => Metrics {
            font: REGULAR,
            size: 9,
            leading: 13,
        },
    }
}

/// Characters per line, assuming an average Helvetica glyph of half an em.
fn line_capacity(width: i64, size: i64) -> usize {
    usize::try_from(width * 2 / size.max(1)).unwrap_or(1).max(1)
}

/// Greedy word wrap; words longer than a line are split.
fn wrap(text: &str, capacity: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split(' ') {
        let chars: Vec<char> = word.chars().collect();
        for chunk in chars.chunks(capacity) {
            let chunk_len = chunk.len();
            if current_len > 0 && current_len + 1 + chunk_len > capacity {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(chunk);
            current_len += chunk_len;
        }
    }
    lines.push(current);
    lines
}

/// Encode text for the WinAnsi-encoded standard fonts. Characters outside
/// the encoding become `?`.
fn encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{20b9}' => out.extend_from_slice(b"Rs."),
            '\u{20ac}' => out.push(0x80),
            '\u{2018}' => out.push(0x91),
            '\u{2019}' => out.push(0x92),
            '\u{201c}' => out.push(0x93),
            '\u{201d}' => out.push(0x94),
            '\u{2022}' => out.push(0x95),
            '\u{2013}' => out.push(0x96),
            '\u{2014}' => out.push(0x97),
            '\u{2122}' => out.push(0x99),
            c if c.is_control() => {}
            // Latin-1 matches WinAnsi outside 0x80..=0x9F.
            c if (c as u32) < 0x80 || (0xa0..=0xff).contains(&(c as u32)) => out.push(c as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

struct PageWriter<'a> {
    setup: &'a PageSetup,
    pages: Vec<Vec<Operation>>,
    y: i64,
}

impl<'a> PageWriter<'a> {
    fn new(setup: &'a PageSetup) -> Self {
        Self {
            setup,
            pages: vec![Vec::new()],
            y: setup.height - setup.margin,
        }
    }

    /// Move down by `height`, starting a new page if it does not fit.
    fn advance(&mut self, height: i64) {
        if self.y - height < self.setup.margin && self.has_content() {
            self.pages.push(Vec::new());
            self.y = self.setup.height - self.setup.margin;
        }
        self.y -= height;
    }

    fn has_content(&self) -> bool {
        self.pages.last().is_some_and(|ops| !ops.is_empty())
    }

    fn push(&mut self, op: Operation) {
        if let Some(ops) = self.pages.last_mut() {
            ops.push(op);
        }
    }

    fn text(&mut self, text: &str, style: Style) {
        let m = metrics(style);
        let usable = self.setup.width - 2 * self.setup.margin;
        for line in wrap(text, line_capacity(usable, m.size)) {
            self.advance(m.leading);
            if line.is_empty() {
                continue;
            }
            let (x, y) = (self.setup.margin, self.y);
            self.push(Operation::new("BT", vec![]));
            self.push(Operation::new(
                "Tf",
                vec![Object::Name(m.font.as_bytes().to_vec()), Object::Integer(m.size)],
            ));
            self.push(Operation::new(
                "Td",
                vec![Object::Integer(x), Object::Integer(y)],
            ));
            self.push(Operation::new(
                "Tj",
                vec![Object::String(encode(&line), StringFormat::Literal)],
            ));
            self.push(Operation::new("ET", vec![]));
        }
    }

    fn rule(&mut self) {
        self.advance(RULE_GAP * 2);
        let y = self.y + RULE_GAP;
        let (left, right) = (self.setup.margin, self.setup.width - self.setup.margin);
        self.push(Operation::new("w", vec![Object::Integer(1)]));
        self.push(Operation::new(
            "m",
            vec![Object::Integer(left), Object::Integer(y)],
        ));
        self.push(Operation::new(
            "l",
            vec![Object::Integer(right), Object::Integer(y)],
        ));
        self.push(Operation::new("S", vec![]));
    }
}

fn pdf_error(what: &str, e: impl std::fmt::Display) -> CollaboratorError {
    CollaboratorError::Conversion(format!("failed to {what}: {e}"))
}

/// Write `blocks` as an uncompressed PDF 1.5 document with at least one page.
pub(crate) fn render(blocks: &[Block], setup: &PageSetup) -> Result<Vec<u8>, CollaboratorError> {
    let mut writer = PageWriter::new(setup);
    for block in blocks {
        match block {
            Block::Line { text, style } => writer.text(text, *style),
            Block::Rule => writer.rule(),
        }
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR => Object::Reference(regular_id),
            BOLD => Object::Reference(bold_id),
        },
    });

    let media_box = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(setup.width),
        Object::Integer(setup.height),
    ];

    let mut kids = Vec::with_capacity(writer.pages.len());
    for operations in writer.pages {
        let content = Content { operations }
            .encode()
            .map_err(|e| pdf_error("encode page content", e))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => media_box.clone(),
            "Contents" => Object::Reference(content_id),
            "Resources" => Object::Reference(resources_id),
        });
        kids.push(Object::Reference(page_id));
    }

    let count = i64::try_from(kids.len()).map_err(|e| pdf_error("count pages", e))?;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal("gstbill"),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.trailer.set("Info", Object::Reference(info_id));

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| pdf_error("save PDF", e))?;
    Ok(output)
}
