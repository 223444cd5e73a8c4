//! Flatten HTML markup into styled text lines.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, BytesText, Event};

use crate::core::CollaboratorError;

/// Column gap between table cells on one line.
const CELL_GAP: &str = "   ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Style {
    /// `<h1>`
    Title,
    /// `<h2>` to `<h6>`
    Heading,
    /// Line containing `<b>`, `<strong>` or `<th>` text.
    Bold,
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Block {
    Line { text: String, style: Style },
    /// `<hr>`
    Rule,
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "li"
            | "ul"
            | "ol"
            | "table"
            | "thead"
            | "tbody"
            | "tfoot"
            | "section"
            | "header"
            | "footer"
            | "address"
            | "blockquote"
            | "pre"
            | "body"
    )
}

fn is_void(name: &str) -> bool {
    matches!(
        name,
        "br" | "hr" | "img" | "meta" | "link" | "input" | "col" | "area" | "base" | "wbr"
    )
}

fn is_hidden(name: &str) -> bool {
    matches!(name, "head" | "style" | "script" | "title")
}

fn is_bold(name: &str) -> bool {
    matches!(name, "b" | "strong" | "th")
}

fn html_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "bull" => "\u{2022}",
        "middot" => "\u{b7}",
        "times" => "\u{d7}",
        _ => return None,
    })
}

#[derive(Default)]
struct Flattener {
    blocks: Vec<Block>,
    current: String,
    current_bold: bool,
    /// Cells of the table row being read, if any.
    row: Option<Vec<String>>,
    row_bold: bool,
    heading: Option<u8>,
    bold_depth: usize,
    /// Hidden element being skipped and its nesting depth.
    hidden: Option<(String, usize)>,
}

impl Flattener {
    fn text(&mut self, text: &str) {
        if self.hidden.is_some() || text.is_empty() {
            return;
        }
        // ASCII only, so &nbsp; survives as a hard space.
        let leading = text.starts_with(|c: char| c.is_ascii_whitespace());
        let trailing = text.ends_with(|c: char| c.is_ascii_whitespace());
        let words: Vec<&str> = text.split_ascii_whitespace().collect();

        if leading && !self.current.is_empty() && !self.current.ends_with(' ') {
            self.current.push(' ');
        }
        self.current.push_str(&words.join(" "));
        if trailing && !words.is_empty() {
            self.current.push(' ');
        }
        if !words.is_empty() && self.bold_depth > 0 {
            self.current_bold = true;
        }
    }

    fn space(&mut self) {
        if !self.current.is_empty() && !self.current.ends_with(' ') {
            self.current.push(' ');
        }
    }

    fn style(&self) -> Style {
        match self.heading {
            Some(1) => Style::Title,
            Some(_) => Style::Heading,
            None if self.current_bold => Style::Bold,
            None => Style::Body,
        }
    }

    /// Close the current line; `keep_empty` emits a blank line for `<br>`.
    fn flush(&mut self, keep_empty: bool) {
        let text = self.current.trim().to_string();
        if !text.is_empty() || keep_empty {
            let style = self.style();
            self.blocks.push(Block::Line { text, style });
        }
        self.current.clear();
        self.current_bold = false;
    }

    fn end_cell(&mut self) {
        let cell = self.current.trim().to_string();
        self.row_bold |= self.current_bold;
        self.current.clear();
        self.current_bold = false;
        if let Some(cells) = &mut self.row {
            cells.push(cell);
        }
    }

    fn end_row(&mut self) {
        if !self.current.trim().is_empty() {
            self.end_cell();
        }
        let Some(cells) = self.row.take() else { return };
        let cells: Vec<String> = cells.into_iter().filter(|c| !c.is_empty()).collect();
        if cells.is_empty() {
            return;
        }
        let style = if self.row_bold { Style::Bold } else { Style::Body };
        self.row_bold = false;
        self.blocks.push(Block::Line {
            text: cells.join(CELL_GAP),
            style,
        });
    }

    fn start(&mut self, name: &str, empty: bool) {
        if let Some((hidden, depth)) = &mut self.hidden {
            if hidden.as_str() == name && !empty {
                *depth += 1;
            }
            return;
        }
        if is_hidden(name) {
            if !empty {
                self.hidden = Some((name.to_string(), 1));
            }
            return;
        }

        match name {
            "br" => {
                if self.row.is_some() {
                    self.space();
                } else {
                    self.flush(true);
                }
            }
            "hr" => {
                if self.row.is_none() {
                    self.flush(false);
                    self.blocks.push(Block::Rule);
                }
            }
            "tr" => {
                self.flush(false);
                self.row = Some(Vec::new());
                self.row_bold = false;
            }
            "td" | "th" => {
                if self.row.is_none() {
                    self.flush(false);
                    self.row = Some(Vec::new());
                } else if !self.current.trim().is_empty() {
                    self.end_cell();
                }
                if name == "th" && !empty {
                    self.bold_depth += 1;
                }
            }
            _ if self.row.is_some() => {
                if is_block(name) {
                    self.space();
                }
                if is_bold(name) && !empty && !is_void(name) {
                    self.bold_depth += 1;
                }
            }
            _ => {
                if is_block(name) {
                    self.flush(false);
                }
                if let Some(level) = heading_level(name) {
                    self.heading = Some(level);
                }
                if is_bold(name) && !empty && !is_void(name) {
                    self.bold_depth += 1;
                }
            }
        }
    }

    fn end(&mut self, name: &str) {
        if let Some((hidden, depth)) = &mut self.hidden {
            if hidden.as_str() == name {
                *depth -= 1;
                if *depth == 0 {
                    self.hidden = None;
                }
            }
            return;
        }
        if is_void(name) {
            return;
        }

        if is_bold(name) {
            self.bold_depth = self.bold_depth.saturating_sub(1);
        }
        match name {
            "td" | "th" => {
                if self.row.is_some() {
                    self.end_cell();
                }
            }
            "tr" | "table" => self.end_row(),
            _ if self.row.is_some() => {
                if is_block(name) {
                    self.space();
                }
            }
            _ => {
                if is_block(name) {
                    self.flush(false);
                }
                if heading_level(name).is_some() {
                    self.heading = None;
                }
            }
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.end_row();
        self.flush(false);
        self.blocks
    }
}

fn heading_level(name: &str) -> Option<u8> {
    match name.as_bytes() {
        [b'h', level @ b'1'..=b'6'] => Some(level - b'0'),
        _ => None,
    }
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase()
}

fn text_content(e: &BytesText<'_>) -> String {
    e.unescape_with(html_entity)
        .map(|text| text.into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(e).into_owned())
}

/// Read markup and flatten it into lines in document order.
///
/// The reader is lenient: end tags need not match, void elements need not be
/// closed and unknown elements are treated as inline.
pub(crate) fn flatten(markup: &str) -> Result<Vec<Block>, CollaboratorError> {
    let mut reader = Reader::from_str(markup);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut flattener = Flattener::default();
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = tag_name(e);
                let void = is_void(&name);
                flattener.start(&name, void);
            }
            Ok(Event::Empty(ref e)) => flattener.start(&tag_name(e), true),
            Ok(Event::End(ref e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase();
                flattener.end(&name);
            }
            Ok(Event::Text(ref e)) => flattener.text(&text_content(e)),
            Ok(Event::CData(ref e)) => flattener.text(&String::from_utf8_lossy(e)),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(CollaboratorError::Conversion(format!(
                    "malformed markup at byte {}: {e}",
                    reader.buffer_position()
                )));
            }
        }
    }
    Ok(flattener.finish())
}
