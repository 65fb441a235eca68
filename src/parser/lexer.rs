//! Lexer for bracketed (JSON / flow-style) template text using logos

use logos::Logos;

use crate::ParseError;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // Delimiters
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape_double(&s[1..s.len()-1])
    })]
    DoubleQuoted(String),

    #[regex(r"'([^']|'')*'", |lex| {
        let s = lex.slice();
        s[1..s.len()-1].replace("''", "'")
    })]
    SingleQuoted(String),

    // `#` can only open a token after whitespace or a delimiter
    #[regex(r"#[^\n]*", logos::skip)]
    Comment,

    // Plain word. A colon only belongs to the word when something other
    // than whitespace or a delimiter follows it (`arn:aws:s3`), so that
    // `Ref: X` still lexes as key, colon, value.
    #[regex(r#"[^\s,\[\]\{\}:"'#]([^\s,\[\]\{\}:]|:[^\s,\[\]\{\}])*"#, |lex| lex.slice().to_string())]
    Plain(String),
}

/// Lex input string into tokens with spans.
///
/// Input that no token accepts (a stray quote, say) is reported rather than
/// skipped, so the grammar never sees a silently altered token stream.
pub fn lex(input: &str) -> Result<Vec<(Token, Span)>, Vec<ParseError>> {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    for (tok, span) in Token::lexer(input).spanned() {
        match tok {
            Ok(tok) => tokens.push((tok, span)),
            Err(_) => errors.push(ParseError::Syntax {
                message: format!("Unrecognised input {:?}", &input[span.clone()]),
                span,
                expected: Vec::new(),
            }),
        }
    }
    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

/// Resolve backslash escapes of a double-quoted string body
pub fn unescape_double(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            // `\"`, `\\`, `\/` and anything unknown map to the character itself
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        lex(input)
            .expect("Should lex")
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(
            tokens("{ } [ ] , :"),
            vec![
                Token::BraceOpen,
                Token::BraceClose,
                Token::BracketOpen,
                Token::BracketClose,
                Token::Comma,
                Token::Colon
            ]
        );
    }

    #[test]
    fn test_json_object() {
        assert_eq!(
            tokens(r#"{"Type":"AWS::SQS::Queue","Count":2}"#),
            vec![
                Token::BraceOpen,
                Token::DoubleQuoted("Type".to_string()),
                Token::Colon,
                Token::DoubleQuoted("AWS::SQS::Queue".to_string()),
                Token::Comma,
                Token::DoubleQuoted("Count".to_string()),
                Token::Colon,
                Token::Plain("2".to_string()),
                Token::BraceClose,
            ]
        );
    }

    #[test]
    fn test_plain_word_keeps_inner_colons() {
        assert_eq!(
            tokens("arn:aws:s3:::bucket"),
            vec![Token::Plain("arn:aws:s3:::bucket".to_string())]
        );
    }

    #[test]
    fn test_plain_key_before_colon_space() {
        assert_eq!(
            tokens("{Ref: Subnet}"),
            vec![
                Token::BraceOpen,
                Token::Plain("Ref".to_string()),
                Token::Colon,
                Token::Plain("Subnet".to_string()),
                Token::BraceClose,
            ]
        );
    }

    #[test]
    fn test_tags_and_words() {
        assert_eq!(
            tokens("[!Ref SubnetA, subnet-1]"),
            vec![
                Token::BracketOpen,
                Token::Plain("!Ref".to_string()),
                Token::Plain("SubnetA".to_string()),
                Token::Comma,
                Token::Plain("subnet-1".to_string()),
                Token::BracketClose,
            ]
        );
    }

    #[test]
    fn test_single_quoted_escape() {
        assert_eq!(
            tokens("'it''s'"),
            vec![Token::SingleQuoted("it's".to_string())]
        );
    }

    #[test]
    fn test_double_quoted_escapes() {
        assert_eq!(
            tokens(r#""a\"b\\cé\n""#),
            vec![Token::DoubleQuoted("a\"b\\c\u{e9}\n".to_string())]
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            tokens("# stack header\n{a#b: 1} # trailing"),
            vec![
                Token::BraceOpen,
                Token::Plain("a#b".to_string()),
                Token::Colon,
                Token::Plain("1".to_string()),
                Token::BraceClose,
            ]
        );
    }

    #[test]
    fn test_unterminated_quote_is_reported() {
        let errors = lex(r#"{"a": "open}"#).unwrap_err();
        assert_eq!(errors[0].span().start, 6);
    }
}
