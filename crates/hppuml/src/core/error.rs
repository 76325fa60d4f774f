//! Core error types for header-to-diagram processing
//!
//! Every fallible operation in the crate reports one of these variants.
//! Unresolved relationship endpoints are not errors: they are skipped.

use thiserror::Error;

/// Core error types for diagram processing
#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("Parse error: {message} at line {line}, column {column}")]
    ParseError {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Template not found: {name}")]
    TemplateNotFound { name: String },

    #[error("Template error: {message}")]
    TemplateError { message: String },

    #[error("Invalid file pattern '{pattern}': {message}")]
    PatternError { pattern: String, message: String },

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl DiagramError {
    /// Create a new parse error
    pub fn parse_error(message: String, line: usize, column: usize) -> Self {
        Self::ParseError {
            message,
            line,
            column,
        }
    }

    /// Create a parse error located at a byte offset of `source`
    ///
    /// Line and column are 1-based; the column counts characters, not bytes.
    pub fn parse_error_at(message: impl Into<String>, source: &str, offset: usize) -> Self {
        let (line, column) = line_column(source, offset);
        Self::parse_error(message.into(), line, column)
    }

    /// Create a new template lookup error
    pub fn template_not_found(name: impl Into<String>) -> Self {
        Self::TemplateNotFound { name: name.into() }
    }

    /// Create a new template evaluation error
    pub fn template_error(message: String) -> Self {
        Self::TemplateError { message }
    }

    /// Create a new glob pattern error
    pub fn pattern_error(pattern: impl Into<String>, message: String) -> Self {
        Self::PatternError {
            pattern: pattern.into(),
            message,
        }
    }
}

impl From<minijinja::Error> for DiagramError {
    fn from(err: minijinja::Error) -> Self {
        match err.kind() {
            minijinja::ErrorKind::TemplateNotFound => Self::TemplateNotFound {
                name: err.detail().unwrap_or_default().to_string(),
            },
            _ => Self::TemplateError {
                message: err.to_string(),
            },
        }
    }
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, DiagramError>;

fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let mut line = 1;
    let mut column = 1;
    for (idx, ch) in source.char_indices() {
        if idx >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}
