//! CSS parser and stylesheet representation using cssparser
//!
//! Accepts the engine's CSS subset: `*`, type, `#id`, `.class` selectors
//! and conjunctions of those, comma-separated selector lists, `property:
//! value;` declarations with `/* */` comments. Unknown at-rules are
//! skipped; `@import` URLs are surfaced to the linked-CSS resolver.

use crate::renderer::dom::{Node, NodeType};
use crate::utils::Result;
use cssparser::{BasicParseErrorKind, ParseError, Parser as CssTokenParser, ParserInput, Token};

/// CSS value types
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Keyword (e.g., "auto", "none")
    Keyword(String),
    /// Length with unit (e.g., 10px)
    Length(f32, Unit),
    /// Color value
    Color(Color),
    /// Percentage
    Percentage(f32),
    /// Number without unit
    Number(f32),
    /// Space-separated component values (shorthands like `margin: 1px 2px`)
    List(Vec<Value>),
}

impl Value {
    /// Pixel magnitude of this value, if it has one. Bare numbers count as
    /// pixels; only the `px` unit is a length in this engine.
    pub fn to_px(&self) -> Option<i32> {
        match self {
            Value::Length(v, Unit::Px) => Some(v.round() as i32),
            Value::Number(v) => Some(v.round() as i32),
            _ => None,
        }
    }

    /// Keyword text, if this is a keyword
    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Value::Keyword(k) => Some(k),
            _ => None,
        }
    }

    /// First color in this value, searching lists left to right
    pub fn to_color(&self) -> Option<Color> {
        match self {
            Value::Color(c) => Some(*c),
            Value::Keyword(k) => Color::from_name(k).or_else(|| Color::from_hex(k)),
            Value::List(items) => items.iter().find_map(|v| v.to_color()),
            _ => None,
        }
    }

    /// Serialize back to CSS text
    pub fn to_css_string(&self) -> String {
        match self {
            Value::Keyword(k) => k.clone(),
            Value::Length(v, unit) => format!("{}{}", v, unit.as_str()),
            Value::Color(c) => c.to_css_string(),
            Value::Percentage(p) => format!("{}%", p),
            Value::Number(n) => format!("{}", n),
            Value::List(items) => items
                .iter()
                .map(|v| v.to_css_string())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// CSS length units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Px,
    Em,
    Rem,
    Percent,
    Vh,
    Vw,
    Pt,
}

impl Unit {
    fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "px" => Some(Unit::Px),
            "em" => Some(Unit::Em),
            "rem" => Some(Unit::Rem),
            "%" => Some(Unit::Percent),
            "vh" => Some(Unit::Vh),
            "vw" => Some(Unit::Vw),
            "pt" => Some(Unit::Pt),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Unit::Px => "px",
            Unit::Em => "em",
            Unit::Rem => "rem",
            Unit::Percent => "%",
            Unit::Vh => "vh",
            Unit::Vw => "vw",
            Unit::Pt => "pt",
        }
    }
}

/// CSS color, RGBA
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string (`#rgb`, `#rrggbb`, `#rrggbbaa`)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
                Some(Color::rgb(r, g, b))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Color::rgb(r, g, b))
            }
            8 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
                Some(Color::rgba(r, g, b, a))
            }
            _ => None,
        }
    }

    /// Parse named colors
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "black" => Some(Color::rgb(0, 0, 0)),
            "white" => Some(Color::rgb(255, 255, 255)),
            "red" => Some(Color::rgb(255, 0, 0)),
            "green" => Some(Color::rgb(0, 128, 0)),
            "blue" => Some(Color::rgb(0, 0, 255)),
            "yellow" => Some(Color::rgb(255, 255, 0)),
            "cyan" => Some(Color::rgb(0, 255, 255)),
            "magenta" => Some(Color::rgb(255, 0, 255)),
            "gray" | "grey" => Some(Color::rgb(128, 128, 128)),
            "silver" => Some(Color::rgb(192, 192, 192)),
            "orange" => Some(Color::rgb(255, 165, 0)),
            "purple" => Some(Color::rgb(128, 0, 128)),
            "pink" => Some(Color::rgb(255, 192, 203)),
            "navy" => Some(Color::rgb(0, 0, 128)),
            "teal" => Some(Color::rgb(0, 128, 128)),
            "transparent" => Some(Color::rgba(0, 0, 0, 0)),
            _ => None,
        }
    }

    fn to_css_string(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Simple selector: a conjunction of universal/type/id/class parts
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selector {
    pub universal: bool,
    pub tag_name: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
}

impl Selector {
    /// Calculate specificity (id, class, type)
    pub fn specificity(&self) -> (u32, u32, u32) {
        let a = if self.id.is_some() { 1 } else { 0 };
        let b = self.classes.len() as u32;
        let c = if self.tag_name.is_some() { 1 } else { 0 };
        (a, b, c)
    }
}

/// CSS declaration (property: value)
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: Value,
}

/// CSS rule (selector list + declarations)
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
}

/// CSS stylesheet: an ordered list of rules
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    /// Append another sheet's rules after this one's
    pub fn extend(&mut self, other: Stylesheet) {
        self.rules.extend(other.rules);
    }
}

/// Outcome of a full parse: the sheet plus any `@import` URLs seen
#[derive(Debug, Default)]
pub struct ParsedCss {
    pub stylesheet: Stylesheet,
    pub import_urls: Vec<String>,
}

/// CSS parser built on the cssparser tokenizer
pub struct CssParser {}

impl CssParser {
    pub fn new() -> Self {
        Self {}
    }

    /// Parse CSS content into a stylesheet
    pub fn parse(&self, content: &str) -> Result<Stylesheet> {
        Ok(self.parse_with_imports(content).stylesheet)
    }

    /// Parse CSS content, also collecting `@import` URLs
    pub fn parse_with_imports(&self, content: &str) -> ParsedCss {
        let mut input = ParserInput::new(content);
        let mut parser = CssTokenParser::new(&mut input);
        let mut result = ParsedCss::default();

        loop {
            if parser.is_exhausted() {
                break;
            }
            if self.parse_block(&mut parser, &mut result).is_err() {
                break;
            }
        }

        result
    }

    /// Parse a `style` attribute body into declarations
    pub fn parse_inline_style(&self, content: &str) -> Vec<Declaration> {
        let mut input = ParserInput::new(content);
        let mut parser = CssTokenParser::new(&mut input);
        self.parse_declaration_list(&mut parser)
    }

    /// Consume one top-level construct: a qualified rule or an at-rule
    fn parse_block<'i>(
        &self,
        parser: &mut CssTokenParser<'i, '_>,
        result: &mut ParsedCss,
    ) -> std::result::Result<(), ParseError<'i, ()>> {
        let mut selector_text = String::new();

        loop {
            let state = parser.state();
            let token = match parser.next_including_whitespace() {
                Ok(token) => token.clone(),
                Err(_) => {
                    parser.reset(&state);
                    return Err(parser.new_error(BasicParseErrorKind::EndOfInput));
                }
            };

            match token {
                Token::CurlyBracketBlock => {
                    let declarations =
                        parser.parse_nested_block(|p| Ok(self.parse_declaration_list(p)))?;
                    let selectors = parse_selector_list(&selector_text);
                    if !selectors.is_empty() {
                        result.stylesheet.rules.push(Rule {
                            selectors,
                            declarations,
                        });
                    }
                    return Ok(());
                }
                Token::AtKeyword(name) => {
                    self.consume_at_rule(parser, &name, result);
                    return Ok(());
                }
                other => {
                    selector_text.push_str(&token_to_selector_text(&other));
                }
            }
        }
    }

    /// Skip an at-rule, recording `@import` URLs on the way past
    fn consume_at_rule(
        &self,
        parser: &mut CssTokenParser<'_, '_>,
        name: &str,
        result: &mut ParsedCss,
    ) {
        let is_import = name.eq_ignore_ascii_case("import");

        loop {
            let token = match parser.next() {
                Ok(token) => token.clone(),
                Err(_) => return,
            };
            match token {
                Token::Semicolon => return,
                Token::CurlyBracketBlock => {
                    let _ = parser.parse_nested_block(|p| {
                        while p.next().is_ok() {}
                        Ok::<(), ParseError<()>>(())
                    });
                    return;
                }
                Token::QuotedString(url) | Token::UnquotedUrl(url) if is_import => {
                    result.import_urls.push(url.to_string());
                }
                Token::Function(func) if is_import && func.eq_ignore_ascii_case("url") => {
                    let url = parser.parse_nested_block(|p| {
                        let mut found = None;
                        while let Ok(inner) = p.next() {
                            if let Token::QuotedString(s) | Token::UnquotedUrl(s) = inner {
                                found = Some(s.to_string());
                            }
                        }
                        Ok::<Option<String>, ParseError<()>>(found)
                    });
                    if let Ok(Some(url)) = url {
                        result.import_urls.push(url);
                    }
                }
                _ => {}
            }
        }
    }

    /// Parse declarations inside a rule block
    fn parse_declaration_list(&self, parser: &mut CssTokenParser<'_, '_>) -> Vec<Declaration> {
        let mut declarations = Vec::new();

        loop {
            parser.skip_whitespace();
            if parser.is_exhausted() {
                break;
            }

            let parsed = parser.try_parse(|p| -> std::result::Result<Declaration, ParseError<()>> {
                let property = p.expect_ident()?.to_string().to_ascii_lowercase();
                p.expect_colon()?;
                let value = self.parse_value(p)?;
                Ok(Declaration { property, value })
            });

            match parsed {
                Ok(declaration) => declarations.push(declaration),
                Err(_) => {
                    // Skip the malformed declaration through its semicolon.
                    loop {
                        match parser.next() {
                            Ok(&Token::Semicolon) | Err(_) => break,
                            Ok(_) => {}
                        }
                    }
                }
            }
        }

        declarations
    }

    /// Parse one declaration value: component values up to the semicolon
    fn parse_value<'i>(
        &self,
        parser: &mut CssTokenParser<'i, '_>,
    ) -> std::result::Result<Value, ParseError<'i, ()>> {
        let mut components = Vec::new();

        loop {
            let state = parser.state();
            let token = match parser.next() {
                Ok(token) => token.clone(),
                Err(_) => break,
            };

            match token {
                Token::Semicolon => break,
                Token::Number { value, .. } => components.push(Value::Number(value)),
                Token::Percentage { unit_value, .. } => {
                    components.push(Value::Percentage(unit_value * 100.0))
                }
                Token::Dimension { value, unit, .. } => {
                    if let Some(u) = Unit::from_str(&unit) {
                        components.push(Value::Length(value, u));
                    } else {
                        components.push(Value::Keyword(format!("{}{}", value, unit)));
                    }
                }
                Token::Ident(name) => {
                    let name = name.to_string();
                    if let Some(color) = Color::from_name(&name) {
                        components.push(Value::Color(color));
                    } else {
                        components.push(Value::Keyword(name));
                    }
                }
                Token::QuotedString(text) => components.push(Value::Keyword(text.to_string())),
                Token::IDHash(hash) | Token::Hash(hash) => {
                    if let Some(color) = Color::from_hex(&hash) {
                        components.push(Value::Color(color));
                    } else {
                        components.push(Value::Keyword(format!("#{}", hash)));
                    }
                }
                Token::Comma => {}
                Token::Function(name) => {
                    let name = name.to_string();
                    let lowered = name.to_ascii_lowercase();
                    if lowered == "rgb" || lowered == "rgba" {
                        let color = parser
                            .parse_nested_block(|p| self.parse_rgb_function(p, lowered == "rgba"));
                        match color {
                            Ok(value) => components.push(value),
                            Err(_) => components.push(Value::Keyword(name)),
                        }
                    } else {
                        let _ = parser.parse_nested_block(|p| {
                            while p.next().is_ok() {}
                            Ok::<(), ParseError<()>>(())
                        });
                        components.push(Value::Keyword(name));
                    }
                }
                Token::CurlyBracketBlock => {
                    parser.reset(&state);
                    break;
                }
                _ => {}
            }
        }

        match components.len() {
            0 => Err(parser.new_error(BasicParseErrorKind::EndOfInput)),
            1 => Ok(components.into_iter().next().expect("len checked")),
            _ => Ok(Value::List(components)),
        }
    }

    /// Parse rgb() or rgba() function arguments
    fn parse_rgb_function<'i>(
        &self,
        parser: &mut CssTokenParser<'i, '_>,
        has_alpha: bool,
    ) -> std::result::Result<Value, ParseError<'i, ()>> {
        let r = self.parse_color_component(parser)?;
        let g = self.parse_color_component(parser)?;
        let b = self.parse_color_component(parser)?;

        let a = if has_alpha {
            self.parse_alpha_component(parser)?
        } else {
            255
        };

        Ok(Value::Color(Color::rgba(r, g, b, a)))
    }

    /// Parse a color component (0-255 or percentage), tolerating commas
    fn parse_color_component<'i>(
        &self,
        parser: &mut CssTokenParser<'i, '_>,
    ) -> std::result::Result<u8, ParseError<'i, ()>> {
        loop {
            let token = parser.next()?.clone();
            match token {
                Token::Comma => continue,
                Token::Number { value, .. } => return Ok(value.clamp(0.0, 255.0) as u8),
                Token::Percentage { unit_value, .. } => {
                    return Ok((unit_value * 255.0).clamp(0.0, 255.0) as u8)
                }
                other => {
                    return Err(parser.new_error(BasicParseErrorKind::UnexpectedToken(other)))
                }
            }
        }
    }

    /// Parse an alpha component (0-1 or percentage)
    fn parse_alpha_component<'i>(
        &self,
        parser: &mut CssTokenParser<'i, '_>,
    ) -> std::result::Result<u8, ParseError<'i, ()>> {
        loop {
            let token = parser.next()?.clone();
            match token {
                Token::Comma => continue,
                Token::Number { value, .. } => return Ok((value.clamp(0.0, 1.0) * 255.0) as u8),
                Token::Percentage { unit_value, .. } => {
                    return Ok((unit_value * 255.0).clamp(0.0, 255.0) as u8)
                }
                other => {
                    return Err(parser.new_error(BasicParseErrorKind::UnexpectedToken(other)))
                }
            }
        }
    }
}

impl Default for CssParser {
    fn default() -> Self {
        Self::new()
    }
}

fn token_to_selector_text(token: &Token) -> String {
    match token {
        Token::Ident(s) => s.to_string(),
        Token::IDHash(s) | Token::Hash(s) => format!("#{}", s),
        Token::Delim(c) => c.to_string(),
        Token::Comma => ",".to_string(),
        Token::WhiteSpace(_) => " ".to_string(),
        Token::Colon => ":".to_string(),
        _ => String::new(),
    }
}

/// Split a selector list on commas and parse each selector; selectors the
/// engine does not support are dropped.
pub fn parse_selector_list(selector_text: &str) -> Vec<Selector> {
    selector_text
        .split(',')
        .filter_map(|s| parse_selector(s.trim()))
        .collect()
}

/// Parse one compound selector (`*`, `tag`, `#id`, `.class`, conjunctions).
/// Returns `None` for empty input or unsupported syntax (combinators,
/// pseudo-classes, attribute selectors).
pub fn parse_selector(text: &str) -> Option<Selector> {
    if text.is_empty() {
        return None;
    }
    // Combinators and pseudo-classes are outside the supported subset.
    if text.contains(char::is_whitespace)
        || text.contains(':')
        || text.contains('[')
        || text.contains('>')
        || text.contains('+')
        || text.contains('~')
    {
        return None;
    }

    let mut selector = Selector::default();
    let mut current = String::new();
    let mut mode = SelectorPart::Tag;

    for ch in text.chars() {
        match ch {
            '*' if current.is_empty() && mode == SelectorPart::Tag => {
                selector.universal = true;
            }
            '#' => {
                if !flush_selector_part(&mut selector, &mut current, mode) {
                    return None;
                }
                mode = SelectorPart::Id;
            }
            '.' => {
                if !flush_selector_part(&mut selector, &mut current, mode) {
                    return None;
                }
                mode = SelectorPart::Class;
            }
            _ => current.push(ch),
        }
    }
    if !flush_selector_part(&mut selector, &mut current, mode) {
        return None;
    }

    if !selector.universal
        && selector.tag_name.is_none()
        && selector.id.is_none()
        && selector.classes.is_empty()
    {
        return None;
    }
    Some(selector)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectorPart {
    Tag,
    Id,
    Class,
}

fn flush_selector_part(selector: &mut Selector, current: &mut String, mode: SelectorPart) -> bool {
    if current.is_empty() {
        // `#` or `.` with no following name is malformed, but an empty tag
        // part before `#id`/`.class` is fine.
        return mode == SelectorPart::Tag;
    }
    match mode {
        SelectorPart::Tag => selector.tag_name = Some(current.to_ascii_lowercase()),
        SelectorPart::Id => selector.id = Some(std::mem::take(current)),
        SelectorPart::Class => selector.classes.push(std::mem::take(current)),
    }
    current.clear();
    true
}

/// A stylesheet reference discovered in the document
#[derive(Debug, Clone, PartialEq)]
pub enum LinkedCssRef {
    /// Inline `<style>` block content
    Style { text: String },
    /// `<link rel="stylesheet" href="…">`
    Link { href: String },
}

/// Result of merging all stylesheet sources for a document
#[derive(Debug, Default)]
pub struct LinkedCssLoadResult {
    pub merged: Stylesheet,
    pub warnings: Vec<String>,
    pub loaded_urls: Vec<String>,
    pub failed_urls: Vec<String>,
}

/// Scan the document for `<style>` blocks and stylesheet `<link>`s, in
/// document order. Other `rel` values are ignored.
pub fn extract_linked_css(root: &Node) -> Vec<LinkedCssRef> {
    let mut refs = Vec::new();
    collect_linked_css(root, &mut refs);
    refs
}

fn collect_linked_css(node: &Node, refs: &mut Vec<LinkedCssRef>) {
    if let Some(data) = node.as_element() {
        if data.tag_name == "style" {
            let mut text = String::new();
            for child in &node.children {
                if let NodeType::Text(t) = &child.node_type {
                    text.push_str(t);
                }
            }
            if !text.is_empty() {
                refs.push(LinkedCssRef::Style { text });
            }
        } else if data.tag_name == "link" {
            let rel = data.get_attribute("rel").unwrap_or("");
            if rel.eq_ignore_ascii_case("stylesheet") {
                if let Some(href) = data.get_attribute("href") {
                    refs.push(LinkedCssRef::Link {
                        href: href.to_string(),
                    });
                }
            }
        }
    }

    for child in &node.children {
        collect_linked_css(child, refs);
    }
}

/// Merge every stylesheet source for a document into one sheet. Rule order
/// is: the caller's inline CSS, then `<style>` blocks in document order,
/// then successfully fetched `<link>`s in document order. Each link the
/// fetch hook cannot resolve becomes a warning plus a `failed_urls` entry;
/// the merged sheet still carries everything else.
pub fn load_linked_css(
    root: &Node,
    inline_css: &str,
    mut fetch: Option<&mut dyn FnMut(&str) -> Option<String>>,
) -> LinkedCssLoadResult {
    let parser = CssParser::new();
    let mut result = LinkedCssLoadResult::default();
    let mut import_urls = Vec::new();

    if !inline_css.is_empty() {
        let parsed = parser.parse_with_imports(inline_css);
        result.merged.extend(parsed.stylesheet);
        import_urls.extend(parsed.import_urls);
    }

    let refs = extract_linked_css(root);

    for css_ref in &refs {
        if let LinkedCssRef::Style { text } = css_ref {
            let parsed = parser.parse_with_imports(text);
            result.merged.extend(parsed.stylesheet);
            import_urls.extend(parsed.import_urls);
            result.loaded_urls.push("<style>".to_string());
        }
    }

    for css_ref in &refs {
        if let LinkedCssRef::Link { href } = css_ref {
            let fetched = fetch.as_mut().and_then(|f| f(href));
            match fetched {
                Some(text) => {
                    let parsed = parser.parse_with_imports(&text);
                    result.merged.extend(parsed.stylesheet);
                    import_urls.extend(parsed.import_urls);
                    result.loaded_urls.push(href.clone());
                }
                None => {
                    result
                        .warnings
                        .push(format!("Linked CSS not loaded: {}", href));
                    result.failed_urls.push(href.clone());
                }
            }
        }
    }

    for url in import_urls {
        result
            .warnings
            .push(format!("CSS @import not resolved: {}", url));
        result.failed_urls.push(url);
    }

    result
}
