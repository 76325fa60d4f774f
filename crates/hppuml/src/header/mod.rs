//! C++ header front end
//!
//! The lexer strips comments and preprocessor lines; the parser turns the
//! remaining tokens into a [`ParsedHeader`] declaration tree.

mod ast;
mod lexer;
mod parser;

pub use ast::*;
pub use lexer::{tokenize, Spanned, Token};
pub use parser::{HeaderParser, SourceKind};
