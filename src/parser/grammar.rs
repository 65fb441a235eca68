//! Parser for bracketed documents (JSON and flow collections) using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::lexer::Token;
use crate::parser::value::{is_null, Mapping, Value};

/// Parse a bracketed document or flow collection into a value tree
pub fn parse_flow(input: &str) -> Result<Value, Vec<crate::ParseError>> {
    let len = input.len();

    let tokens = crate::parser::lexer::lex(input)?;
    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));

    let token_stream = Stream::from_iter(token_iter)
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    value_parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

fn value_parser<'a, I>() -> impl Parser<'a, I, Value, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    recursive(|value| {
        let quoted = select! {
            Token::DoubleQuoted(s) => s,
            Token::SingleQuoted(s) => s,
        };

        // Adjacent plain words form one scalar: `!Ref Subnet`
        let plain = select! {
            Token::Plain(s) => s,
        }
        .repeated()
        .at_least(1)
        .collect::<Vec<_>>()
        .map(|words| words.join(" "));

        // In value position an unquoted null spelling is the empty scalar
        let scalar_value = quoted.clone().map(Value::Scalar).or(plain.clone().map(|s| {
            if is_null(&s) {
                Value::empty()
            } else {
                Value::Scalar(s)
            }
        }));

        let scalar = quoted.or(plain);

        let sequence = value
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
            .map(Value::Sequence);

        let entry = scalar
            .clone()
            .then_ignore(just(Token::Colon))
            .then(value.clone().or_not())
            .map(|(key, value): (String, Option<Value>)| (key, value.unwrap_or_else(Value::empty)));

        let mapping = entry
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::BraceOpen), just(Token::BraceClose))
            .map(|entries| Value::Mapping(entries.into_iter().collect::<Mapping>()));

        // `!GetAtt [Function, Arn]` has no structure worth keeping; render it back to text
        let tagged = select! {
            Token::Plain(s) if s.starts_with('!') => s,
        }
        .then(choice((sequence.clone(), mapping.clone())))
        .map(|(tag, inner)| Value::Scalar(format!("{} {}", tag, inner)));

        choice((tagged, mapping, sequence, scalar_value)).boxed()
    })
}
