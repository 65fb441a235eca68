//! Parsers for template text
//!
//! Two encodings are understood: line-oriented markup (indentation scoped)
//! and bracketed documents (JSON or flow collections). Both produce the same
//! [`Value`] tree.

mod grammar;
pub mod lexer;
mod markup;
pub mod value;

pub use grammar::parse_flow;
pub use markup::parse_markup;
pub use value::*;

use crate::ParseError;

/// Parse template text in whichever encoding it is written.
///
/// Bracketed documents are the only ones that can fail; the caller decides
/// whether a syntax error is fatal.
pub fn parse_document(input: &str) -> Result<Value, Vec<ParseError>> {
    if is_bracketed(input) {
        parse_flow(input)
    } else {
        Ok(parse_markup(input))
    }
}

/// A document is bracketed when its first significant character opens a mapping
pub fn is_bracketed(input: &str) -> bool {
    input
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .is_some_and(|l| l.starts_with('{'))
}
