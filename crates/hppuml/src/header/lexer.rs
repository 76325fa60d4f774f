//! Header tokenizer using chumsky
//!
//! Splits C++ source text into identifiers, numbers, literals and
//! punctuation. Comments and preprocessor lines never reach the parser.

use chumsky::prelude::*;
use chumsky::text::ident;

use crate::core::chumsky_utils::{trivia, LexExtra};
use crate::core::{DiagramError, Result};

/// A lexical token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Ident(String),
    Number(String),
    /// String or character literal, quotes included
    Literal(String),
    /// Punctuation: `::`, `->`, `...` and `&&` are single tokens, every
    /// other symbol is one character
    Punct(String),
}

impl Token {
    pub fn text(&self) -> &str {
        match self {
            Token::Ident(s) | Token::Number(s) | Token::Literal(s) | Token::Punct(s) => s,
        }
    }

    pub fn is_punct(&self, p: &str) -> bool {
        matches!(self, Token::Punct(s) if s == p)
    }

    pub fn is_ident(&self, word: &str) -> bool {
        matches!(self, Token::Ident(s) if s == word)
    }

    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Token::Ident(s) => Some(s),
            _ => None,
        }
    }
}

/// A token with its byte range in the source
pub type Spanned<T> = (T, SimpleSpan);

fn lexer<'src>() -> impl Parser<'src, &'src str, Vec<Spanned<Token>>, LexExtra<'src>> {
    let identifier = ident().map(|s: &str| Token::Ident(s.to_string()));

    let number = any()
        .filter(|c: &char| c.is_ascii_digit())
        .then(
            any()
                .filter(|c: &char| c.is_ascii_alphanumeric() || *c == '.' || *c == '_')
                .repeated(),
        )
        .to_slice()
        .map(|s: &str| Token::Number(s.to_string()));

    let escape = just('\\').then(any()).ignored();

    let string = just('"')
        .then(escape.clone().or(none_of("\\\"\n").ignored()).repeated())
        .then(just('"'))
        .to_slice()
        .map(|s: &str| Token::Literal(s.to_string()));

    let character = just('\'')
        .then(escape.or(none_of("\\'\n").ignored()).repeated())
        .then(just('\''))
        .to_slice()
        .map(|s: &str| Token::Literal(s.to_string()));

    let compound = choice((just("::"), just("->"), just("..."), just("&&")))
        .map(|s: &str| Token::Punct(s.to_string()));

    let single = any()
        .filter(|c: &char| !c.is_whitespace())
        .map(|c: char| Token::Punct(c.to_string()));

    let token = choice((identifier, number, string, character, compound, single))
        .map_with(|tok, e| (tok, e.span()));

    trivia()
        .ignore_then(token.then_ignore(trivia()).repeated().collect::<Vec<_>>())
        .then_ignore(end())
}

/// Tokenize header source text
pub fn tokenize(source: &str) -> Result<Vec<Spanned<Token>>> {
    lexer().parse(source).into_result().map_err(|errors| {
        match errors.into_iter().next() {
            Some(err) => DiagramError::parse_error_at(err.to_string(), source, err.span().start),
            None => DiagramError::parse_error_at("unrecognized input", source, 0),
        }
    })
}
