//! Shared chumsky parser utilities for C/C++ source text
//!
//! Everything here recognizes text the header lexer throws away:
//! whitespace, comments and preprocessor directives.

use chumsky::prelude::*;

/// Parser extra used by the header lexer: rich errors carrying spans
pub type LexExtra<'src> = extra::Err<Rich<'src, char>>;

/// Parse a single whitespace character, including form feeds.
pub fn whitespace_char<'src>() -> impl Parser<'src, &'src str, (), LexExtra<'src>> + Clone {
    one_of(" \t\n\r\x0c\x0b").ignored()
}

/// Parse a `//` comment up to (not including) the end of line.
pub fn line_comment<'src>() -> impl Parser<'src, &'src str, (), LexExtra<'src>> + Clone {
    just("//").then(none_of('\n').repeated()).ignored()
}

/// Parse a `/* ... */` comment.
pub fn block_comment<'src>() -> impl Parser<'src, &'src str, (), LexExtra<'src>> + Clone {
    just("/*")
        .then(any().and_is(just("*/").not()).repeated())
        .then(just("*/"))
        .ignored()
}

/// Parse a preprocessor directive, following `\` line continuations.
pub fn preprocessor_line<'src>() -> impl Parser<'src, &'src str, (), LexExtra<'src>> + Clone {
    let continuation = just('\\')
        .then(just('\r').or_not())
        .then(just('\n'))
        .ignored();

    just('#')
        .then(continuation.or(none_of('\n').ignored()).repeated())
        .ignored()
}

/// Parse any amount of whitespace, comments and preprocessor lines.
pub fn trivia<'src>() -> impl Parser<'src, &'src str, (), LexExtra<'src>> + Clone {
    choice((
        whitespace_char(),
        line_comment(),
        block_comment(),
        preprocessor_line(),
    ))
    .repeated()
    .ignored()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_comment() {
        let parser = line_comment().then_ignore(end());
        assert!(parser.parse("// a comment").into_result().is_ok());
        assert!(parser.parse("//").into_result().is_ok());
        assert!(parser.parse("/ not a comment").into_result().is_err());
    }

    #[test]
    fn test_block_comment() {
        let parser = block_comment().then_ignore(end());
        assert!(parser.parse("/* one */").into_result().is_ok());
        assert!(parser.parse("/* multi\n * line\n */").into_result().is_ok());
        assert!(parser.parse("/* unterminated").into_result().is_err());
    }

    #[test]
    fn test_preprocessor_line() {
        let parser = preprocessor_line().then_ignore(end());
        assert!(parser.parse("#include <vector>").into_result().is_ok());
        assert!(parser
            .parse("#define MAX(a, b) \\\n  ((a) > (b) ? (a) : (b))")
            .into_result()
            .is_ok());
    }

    #[test]
    fn test_trivia_stops_at_code() {
        let parser = trivia().then(just("class")).then_ignore(end());
        assert!(parser
            .parse("  // header\n#pragma once\n/* doc */\nclass")
            .into_result()
            .is_ok());
        assert!(parser.parse("class").into_result().is_ok());
    }
}
