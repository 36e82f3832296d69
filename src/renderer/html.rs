//! Fault-tolerant HTML parser with warning recovery
//!
//! Tokenize-then-tree-build over an explicit open-element stack. The parser
//! is deterministic: any byte sequence yields the same DOM and the same
//! ordered warning list on every run. Well-formed input yields zero
//! warnings; every recovery action emits one.

use super::dom::{Document, ElementData, Node, NodeType};
use crate::utils::Result;

/// Elements that never take content
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// A recoverable parse problem and what the parser did about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub message: String,
    pub recovery_action: String,
}

/// Parsed document plus the ordered warning stream
#[derive(Debug)]
pub struct ParseResult {
    pub document: Document,
    pub warnings: Vec<ParseWarning>,
}

/// Tolerant HTML parser
pub struct HtmlParser {}

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self {}
    }

    /// Parse HTML content into a DOM document, discarding warnings
    pub fn parse(&self, content: &str) -> Result<Document> {
        Ok(self.parse_with_diagnostics(content).document)
    }

    /// Parse HTML content, keeping the ordered recovery warnings
    pub fn parse_with_diagnostics(&self, content: &str) -> ParseResult {
        let mut parser = Parser::new(content);
        parser.run();
        parser.finish()
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn is_name_char(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'-' || ch == b'_' || ch == b':' || ch == b'.'
}

struct Parser<'a> {
    input: &'a [u8],
    position: usize,
    /// Open elements; index 0 is the document node
    stack: Vec<Node>,
    warnings: Vec<ParseWarning>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            position: 0,
            stack: vec![Node::new(NodeType::Document)],
            warnings: Vec::new(),
        }
    }

    fn run(&mut self) {
        while self.position < self.input.len() {
            if self.input[self.position] != b'<' {
                self.parse_text();
                continue;
            }

            if self.starts_with(b"<!--") {
                self.parse_comment();
                continue;
            }

            if self.starts_with(b"</") {
                self.parse_end_tag();
                continue;
            }

            if self.starts_with(b"<!") {
                self.parse_declaration();
                continue;
            }

            if self.try_parse_start_tag() {
                continue;
            }

            self.warn(
                "Bare '<' treated as text",
                "Inserted literal '<' into text content",
            );
            self.append_text("<".to_string());
            self.position += 1;
        }

        // Auto-close whatever is still open at end of input.
        while self.stack.len() > 1 {
            let node = self.stack.pop().expect("stack underflow");
            self.warn(
                &format!("Unclosed tag <{}> implicitly closed", node.tag_name()),
                "Implicitly closed at end of document",
            );
            self.append_child(node);
        }
    }

    fn finish(mut self) -> ParseResult {
        let root = self.stack.pop().expect("document node missing");
        ParseResult {
            document: Document { root },
            warnings: self.warnings,
        }
    }

    fn warn(&mut self, message: &str, recovery_action: &str) {
        self.warnings.push(ParseWarning {
            message: message.to_string(),
            recovery_action: recovery_action.to_string(),
        });
    }

    fn starts_with(&self, token: &[u8]) -> bool {
        self.input[self.position..].starts_with(token)
    }

    fn remaining_str(&self, from: usize, to: usize) -> &'a str {
        // The input came in as &str; byte ranges at token boundaries stay
        // valid UTF-8 because tokens are delimited by ASCII.
        std::str::from_utf8(&self.input[from..to]).unwrap_or("")
    }

    fn append_child(&mut self, node: Node) {
        self.stack
            .last_mut()
            .expect("stack underflow")
            .add_child(node);
    }

    fn append_text(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        let parent = self.stack.last_mut().expect("stack underflow");
        if let Some(Node {
            node_type: NodeType::Text(existing),
            ..
        }) = parent.children.last_mut()
        {
            existing.push_str(&text);
            return;
        }
        parent.add_child(Node::text(text));
    }

    fn parse_text(&mut self) {
        let start = self.position;
        while self.position < self.input.len() && self.input[self.position] != b'<' {
            self.position += 1;
        }
        let raw = self.remaining_str(start, self.position).to_string();
        self.append_text(decode_html_entities(&raw));
    }

    fn parse_comment(&mut self) {
        let content_start = self.position + 4;
        match find_subslice(self.input, b"-->", content_start) {
            Some(end) => {
                let text = self.remaining_str(content_start, end).to_string();
                self.append_child(Node::comment(text));
                self.position = end + 3;
            }
            None => {
                self.warn("Unclosed HTML comment", "Consumed remaining input as comment");
                let text = self.remaining_str(content_start, self.input.len()).to_string();
                self.append_child(Node::comment(text));
                self.position = self.input.len();
            }
        }
    }

    fn parse_declaration(&mut self) {
        let body_start = self.position + 2;
        let end = match memchr(self.input, b'>', body_start) {
            Some(end) => end,
            None => {
                self.warn(
                    "Unclosed declaration",
                    "Consumed remaining input as declaration",
                );
                self.position = self.input.len();
                return;
            }
        };

        let body = self.remaining_str(body_start, end);
        if body.len() >= 7 && body[..7].eq_ignore_ascii_case("doctype") {
            self.append_child(Node::new(NodeType::Doctype));
        }
        self.position = end + 1;
    }

    fn parse_end_tag(&mut self) {
        let mut pos = self.position + 2;
        self.skip_spaces(&mut pos);
        let tag = self.parse_name(&mut pos).to_ascii_lowercase();

        self.position = match memchr(self.input, b'>', pos) {
            Some(end) => end + 1,
            None => self.input.len(),
        };

        if tag.is_empty() {
            return;
        }

        // Find the nearest matching open element, if any.
        let match_index = self
            .stack
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .find(|(_, node)| node.tag_name() == tag)
            .map(|(i, _)| i);

        let match_index = match match_index {
            Some(index) => index,
            None => {
                self.warn(
                    &format!("Orphan end tag </{}>", tag),
                    "Ignored orphan end tag",
                );
                return;
            }
        };

        // Close intervening elements, then the matching one.
        while self.stack.len() - 1 > match_index {
            let node = self.stack.pop().expect("stack underflow");
            self.warn(
                &format!("<{}> implicitly closed by </{}>", node.tag_name(), tag),
                "Implicitly closed intervening element",
            );
            self.append_child(node);
        }
        let node = self.stack.pop().expect("stack underflow");
        self.append_child(node);
    }

    fn try_parse_start_tag(&mut self) -> bool {
        let mut pos = self.position + 1;

        // A tag name must start with an ASCII letter; anything else after
        // `<` is literal text.
        if pos >= self.input.len() || !self.input[pos].is_ascii_alphabetic() {
            return false;
        }

        let tag = self.parse_name(&mut pos);
        if tag.is_empty() {
            return false;
        }
        let tag = tag.to_ascii_lowercase();

        let mut element = ElementData::new(tag.clone());
        let mut self_closing = false;

        while pos < self.input.len() {
            self.skip_spaces(&mut pos);
            if pos >= self.input.len() {
                break;
            }
            if self.input[pos] == b'>' {
                pos += 1;
                break;
            }
            if self.input[pos] == b'/' && pos + 1 < self.input.len() && self.input[pos + 1] == b'>'
            {
                self_closing = true;
                pos += 2;
                break;
            }

            let attr_name = self.parse_attr_name(&mut pos);
            if attr_name.is_empty() {
                pos += 1;
                continue;
            }
            let attr_name = attr_name.to_ascii_lowercase();

            self.skip_spaces(&mut pos);
            let mut attr_value = String::new();

            if pos < self.input.len() && self.input[pos] == b'=' {
                pos += 1;
                self.skip_spaces(&mut pos);

                if pos < self.input.len()
                    && (self.input[pos] == b'"' || self.input[pos] == b'\'')
                {
                    let quote = self.input[pos];
                    pos += 1;
                    let value_start = pos;
                    while pos < self.input.len() && self.input[pos] != quote {
                        pos += 1;
                    }
                    attr_value = self.remaining_str(value_start, pos).to_string();
                    if pos < self.input.len() {
                        pos += 1;
                    }
                } else {
                    let value_start = pos;
                    while pos < self.input.len()
                        && !self.input[pos].is_ascii_whitespace()
                        && self.input[pos] != b'>'
                    {
                        if self.input[pos] == b'/'
                            && pos + 1 < self.input.len()
                            && self.input[pos + 1] == b'>'
                        {
                            break;
                        }
                        pos += 1;
                    }
                    attr_value = self.remaining_str(value_start, pos).to_string();
                }
            }

            element.push_parsed_attribute(attr_name, decode_html_entities(&attr_value));
        }

        if is_void_element(&tag) {
            self_closing = true;
        }

        let node = Node::new(NodeType::Element(element));
        if self_closing {
            self.append_child(node);
        } else {
            self.stack.push(node);
        }

        self.position = pos;
        true
    }

    fn skip_spaces(&self, pos: &mut usize) {
        while *pos < self.input.len() && self.input[*pos].is_ascii_whitespace() {
            *pos += 1;
        }
    }

    fn parse_name(&self, pos: &mut usize) -> &'a str {
        let start = *pos;
        while *pos < self.input.len() && is_name_char(self.input[*pos]) {
            *pos += 1;
        }
        self.remaining_str(start, *pos)
    }

    fn parse_attr_name(&self, pos: &mut usize) -> &'a str {
        let start = *pos;
        while *pos < self.input.len() {
            let ch = self.input[*pos];
            if ch.is_ascii_whitespace() || ch == b'=' || ch == b'>' || ch == b'/' {
                break;
            }
            *pos += 1;
        }
        self.remaining_str(start, *pos)
    }
}

fn memchr(haystack: &[u8], needle: u8, from: usize) -> Option<usize> {
    haystack[from..]
        .iter()
        .position(|&b| b == needle)
        .map(|i| from + i)
}

fn find_subslice(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| from + i)
}

/// Decode the supported subset of HTML entities. Unknown entities pass
/// through literally.
pub fn decode_html_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut decoded = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'&' {
            let ch_len = utf8_len(bytes[pos]);
            decoded.push_str(&text[pos..pos + ch_len]);
            pos += ch_len;
            continue;
        }

        let semicolon = match memchr(bytes, b';', pos + 1) {
            Some(idx) => idx,
            None => {
                decoded.push('&');
                pos += 1;
                continue;
            }
        };

        let entity = &text[pos..=semicolon];
        if let Some(replacement) = named_entity(entity) {
            decoded.push_str(replacement);
        } else if let Some(ch) = decode_numeric_entity(entity) {
            decoded.push(ch);
        } else {
            decoded.push_str(entity);
        }
        pos = semicolon + 1;
    }

    decoded
}

fn utf8_len(first_byte: u8) -> usize {
    match first_byte {
        b if b & 0x80 == 0 => 1,
        b if b & 0xE0 == 0xC0 => 2,
        b if b & 0xF0 == 0xE0 => 3,
        _ => 4,
    }
}

fn named_entity(entity: &str) -> Option<&'static str> {
    match entity {
        "&amp;" => Some("&"),
        "&lt;" => Some("<"),
        "&gt;" => Some(">"),
        "&quot;" => Some("\""),
        "&apos;" => Some("'"),
        "&nbsp;" => Some("\u{a0}"),
        "&copy;" => Some("\u{a9}"),
        "&reg;" => Some("\u{ae}"),
        "&deg;" => Some("\u{b0}"),
        "&sect;" => Some("\u{a7}"),
        "&cent;" => Some("\u{a2}"),
        "&pound;" => Some("\u{a3}"),
        "&yen;" => Some("\u{a5}"),
        "&euro;" => Some("\u{20ac}"),
        "&trade;" => Some("\u{2122}"),
        "&ndash;" => Some("\u{2013}"),
        "&mdash;" => Some("\u{2014}"),
        _ => None,
    }
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    let body = entity.strip_prefix("&#")?.strip_suffix(';')?;
    let code_point = if let Some(hex) = body.strip_prefix('x').or_else(|| body.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        body.parse::<u32>().ok()?
    };
    if code_point == 0 {
        return None;
    }
    char::from_u32(code_point)
}
