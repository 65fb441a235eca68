//! Parser for line-oriented, indentation-based template markup
//!
//! Scope follows one rule: a line is a child of the entry above it only when
//! its indentation is strictly greater than that entry's. A collection's
//! indentation is fixed by its first entry, and any line indented less
//! closes it. Deeper lines that no entry owns are skipped.

use crate::parser::grammar::parse_flow;
use crate::parser::lexer::unescape_double;
use crate::parser::value::{is_null, Mapping, Value};

/// A significant line: indentation plus content with comments stripped
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    indent: usize,
    text: &'a str,
}

struct MarkupParser<'a> {
    raw: Vec<&'a str>,
    pos: usize,
    /// Content that follows a `- ` marker, re-read as a line of its own
    pending: Option<Line<'a>>,
    finished: bool,
}

/// Parse markup text into a value tree. Never fails; unrecognised lines are
/// dropped and the rest of the document is kept.
pub fn parse_markup(input: &str) -> Value {
    let mut parser = MarkupParser {
        raw: input.lines().collect(),
        pos: 0,
        pending: None,
        finished: false,
    };
    parser.parse_child(None).unwrap_or_else(|| Value::Mapping(Mapping::new()))
}

impl<'a> MarkupParser<'a> {
    fn peek(&mut self) -> Option<Line<'a>> {
        if let Some(line) = self.pending {
            return Some(line);
        }
        while !self.finished && self.pos < self.raw.len() {
            let raw = self.raw[self.pos];
            let indent = indentation(raw);
            let text = strip_comment(&raw[indent..]).trim_end();
            if indent == 0 && (text == "..." || text.starts_with("... ")) {
                self.finished = true;
                break;
            }
            let skip = text.is_empty()
                || (indent == 0 && (text.starts_with('%') || text == "---" || text.starts_with("--- ")));
            if !skip {
                return Some(Line { indent, text });
            }
            self.pos += 1;
        }
        None
    }

    fn advance(&mut self) {
        if self.pending.take().is_none() {
            self.pos += 1;
        }
    }

    /// Parse the collection starting at the next line, if it is indented
    /// strictly deeper than `parent`.
    fn parse_child(&mut self, parent: Option<usize>) -> Option<Value> {
        let line = self.peek()?;
        if parent.is_some_and(|p| line.indent <= p) {
            return None;
        }
        Some(self.parse_collection(line.indent))
    }

    fn parse_collection(&mut self, indent: usize) -> Value {
        match self.peek() {
            Some(line) if is_sequence_item(line.text) => self.parse_sequence(indent),
            _ => self.parse_mapping(indent),
        }
    }

    fn parse_mapping(&mut self, indent: usize) -> Value {
        let mut mapping = Mapping::new();
        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            self.advance();
            // Deeper lines no key owns, and stray `- item` lines, are dropped
            if line.indent > indent || is_sequence_item(line.text) {
                continue;
            }
            let Some((key, rest)) = split_key_value(line.text) else {
                continue;
            };
            let value = if rest.is_empty() {
                match self.peek() {
                    Some(next) if next.indent == indent && is_sequence_item(next.text) => {
                        self.parse_sequence(indent)
                    }
                    _ => self.parse_child(Some(indent)).unwrap_or_else(Value::empty),
                }
            } else {
                self.parse_inline(rest, indent)
            };
            mapping.insert(key, value);
        }
        Value::Mapping(mapping)
    }

    fn parse_sequence(&mut self, indent: usize) -> Value {
        let mut items = Vec::new();
        while let Some(line) = self.peek() {
            if line.indent < indent || (line.indent == indent && !is_sequence_item(line.text)) {
                break;
            }
            self.advance();
            if line.indent > indent {
                continue;
            }
            let after_dash = &line.text[1..];
            let rest = after_dash.trim_start();
            if rest.is_empty() {
                items.push(self.parse_child(Some(indent)).unwrap_or_else(Value::empty));
                continue;
            }
            let column = indent + 1 + (after_dash.len() - rest.len());
            if is_sequence_item(rest) || split_key_value(rest).is_some() {
                // Compact form: `- Key: value` or `- - item` opens a
                // collection at the column of its first character.
                self.pending = Some(Line {
                    indent: column,
                    text: rest,
                });
                items.push(self.parse_collection(column));
            } else {
                items.push(self.parse_inline(rest, indent));
            }
        }
        Value::Sequence(items)
    }

    /// Parse a value written on the same line as its key or dash.
    /// `owner` is the indentation of that key or dash.
    fn parse_inline(&mut self, rest: &str, owner: usize) -> Value {
        let (tag, body) = split_tag(rest);
        if let Some(style) = BlockStyle::from_indicator(body) {
            let block = self.read_block(owner, style);
            return match tag {
                Some(tag) => Value::Scalar(format!("{} {}", tag, block)),
                None => Value::Scalar(block),
            };
        }
        if rest.starts_with('[') || rest.starts_with('{') {
            let text = self.read_flow(rest, owner);
            return parse_flow(&text).unwrap_or(Value::Scalar(text));
        }
        if is_null(rest) {
            return Value::empty();
        }
        Value::Scalar(unquote(rest))
    }

    /// Accumulate a literal or folded block: every following raw line that
    /// is blank or indented deeper than `owner`.
    fn read_block(&mut self, owner: usize, style: BlockStyle) -> String {
        let mut lines: Vec<&str> = Vec::new();
        while self.pos < self.raw.len() {
            let raw = self.raw[self.pos];
            if !raw.trim().is_empty() && indentation(raw) <= owner {
                break;
            }
            lines.push(raw);
            self.pos += 1;
        }

        let content_indent = lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .map(|l| indentation(l))
            .min()
            .unwrap_or(0);
        let mut body: Vec<&str> = lines
            .iter()
            .map(|l| l.get(content_indent..).unwrap_or("").trim_end_matches('\r'))
            .collect();

        let mut trailing = 0;
        while body.last().is_some_and(|l| l.trim().is_empty()) {
            body.pop();
            trailing += 1;
        }

        let mut text = match style.folding {
            Folding::Literal => body.join("\n"),
            Folding::Folded => fold(&body),
        };
        if body.is_empty() {
            return text;
        }
        match style.chomping {
            Chomping::Strip => {}
            Chomping::Clip => text.push('\n'),
            Chomping::Keep => {
                for _ in 0..=trailing {
                    text.push('\n');
                }
            }
        }
        text
    }

    /// Collect a flow collection that may continue over several lines.
    ///
    /// Continuation lines must be indented deeper than `owner`, except for
    /// a line that starts by closing a bracket. An unclosed collection stops
    /// at the first line outside its owner's scope.
    fn read_flow(&mut self, first: &str, owner: usize) -> String {
        let mut text = first.to_string();
        let mut depth = bracket_depth(first);
        while depth > 0 && self.pos < self.raw.len() {
            let raw = self.raw[self.pos];
            let line = strip_comment(raw.trim());
            let closes = line.starts_with(']') || line.starts_with('}');
            if !line.is_empty() && indentation(raw) <= owner && !closes {
                break;
            }
            self.pos += 1;
            depth += bracket_depth(line);
            text.push(' ');
            text.push_str(line);
        }
        text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Folding {
    Literal,
    Folded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chomping {
    Clip,
    Strip,
    Keep,
}

#[derive(Debug, Clone, Copy)]
struct BlockStyle {
    folding: Folding,
    chomping: Chomping,
}

impl BlockStyle {
    /// Recognise `|`, `>`, `|-`, `>+`, `|2-` and friends
    fn from_indicator(text: &str) -> Option<Self> {
        let mut chars = text.chars();
        let folding = match chars.next()? {
            '|' => Folding::Literal,
            '>' => Folding::Folded,
            _ => return None,
        };
        let mut chomping = Chomping::Clip;
        for c in chars {
            match c {
                '-' => chomping = Chomping::Strip,
                '+' => chomping = Chomping::Keep,
                '1'..='9' => {}
                _ => return None,
            }
        }
        Some(Self { folding, chomping })
    }
}

fn fold(lines: &[&str]) -> String {
    let mut out = String::new();
    let mut previous_blank = true;
    for line in lines {
        if line.trim().is_empty() {
            out.push('\n');
            previous_blank = true;
            continue;
        }
        if !previous_blank {
            out.push(' ');
        }
        out.push_str(line);
        previous_blank = false;
    }
    out
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

fn is_sequence_item(text: &str) -> bool {
    text == "-" || text.starts_with("- ") || text.starts_with("-\t")
}

/// Scan `text`, tracking quotes that open at the start of a token.
/// Calls `stop` with each unquoted byte position and its character.
fn scan_unquoted(text: &str, mut stop: impl FnMut(usize, char) -> bool) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut previous: Option<char> = None;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match quote {
            Some('"') if c == '\\' => {
                chars.next();
            }
            Some(q) if c == q => {
                if q == '\'' && chars.peek().map(|&(_, n)| n) == Some('\'') {
                    chars.next();
                } else {
                    quote = None;
                }
            }
            Some(_) => {}
            None => {
                let token_start = previous.map_or(true, |p| p.is_whitespace() || "[{,:".contains(p));
                if (c == '"' || c == '\'') && token_start {
                    quote = Some(c);
                } else if stop(i, c) {
                    return Some(i);
                }
            }
        }
        previous = Some(c);
    }
    None
}

fn strip_comment(text: &str) -> &str {
    let bytes = text.as_bytes();
    let cut = scan_unquoted(text, |i, c| c == '#' && (i == 0 || bytes[i - 1].is_ascii_whitespace()));
    match cut {
        Some(i) => &text[..i],
        None => text,
    }
}

/// Split `key: value` at the first unquoted colon followed by whitespace or
/// end of line. Flow collections are values, not keys.
fn split_key_value(text: &str) -> Option<(String, &str)> {
    if text.starts_with('[') || text.starts_with('{') {
        return None;
    }
    let bytes = text.as_bytes();
    let colon = scan_unquoted(text, |i, c| {
        c == ':' && bytes.get(i + 1).map_or(true, |b| b.is_ascii_whitespace())
    })?;
    let key = unquote(text[..colon].trim());
    if key.is_empty() {
        return None;
    }
    Some((key, text[colon + 1..].trim()))
}

/// Separate a leading `!Tag` from the rest of an inline value
fn split_tag(text: &str) -> (Option<&str>, &str) {
    if !text.starts_with('!') {
        return (None, text);
    }
    match text.split_once(char::is_whitespace) {
        Some((tag, rest)) => (Some(tag), rest.trim_start()),
        None => (Some(text), ""),
    }
}

fn unquote(text: &str) -> String {
    let len = text.len();
    if len >= 2 && text.starts_with('"') && text.ends_with('"') {
        unescape_double(&text[1..len - 1])
    } else if len >= 2 && text.starts_with('\'') && text.ends_with('\'') {
        text[1..len - 1].replace("''", "'")
    } else {
        text.to_string()
    }
}

/// Net bracket nesting of a line, ignoring quoted text
fn bracket_depth(text: &str) -> i32 {
    let mut depth = 0;
    scan_unquoted(text, |_, c| {
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => depth -= 1,
            _ => {}
        }
        false
    });
    depth
}
