use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostic::{Category, Diagnostic, Severity};
use crate::parser::{MAX_NESTING, NESTING_MESSAGE};
use crate::span::Span;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read source: {0}")]
    SourceIo(#[from] std::io::Error),
    #[error("unsupported target platform: {0}")]
    UnsupportedPlatform(String),
    #[error("source directory was not found at {0}")]
    MissingSourceRoot(PathBuf),
    #[error("lex error at line {line}, column {column}: {message}")]
    LexError {
        line: u32,
        column: u32,
        message: String,
    },
    #[error("parse error at line {line}, column {column}: {message}")]
    ParseError {
        line: u32,
        column: u32,
        message: String,
    },
}

impl CoreError {
    pub fn lex(span: Span, message: impl Into<String>) -> Self {
        CoreError::LexError {
            line: span.line,
            column: span.column,
            message: message.into(),
        }
    }

    pub fn parse(span: Span, message: impl Into<String>) -> Self {
        CoreError::ParseError {
            line: span.line,
            column: span.column,
            message: message.into(),
        }
    }

    /// Fold a fatal error into the diagnostics stream.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            CoreError::LexError {
                line,
                column,
                message,
            } => {
                let diag = Diagnostic::new(Severity::Fatal, Category::Lexical, message.clone())
                    .with_location(Span::new(*line, *column));
                if message.contains("indent") {
                    diag.with_code("E0003").with_suggestion(
                        "blocks are defined by indentation; dedent back to the level of an enclosing line",
                    )
                } else if message.contains("unterminated") {
                    diag.with_code("E0002")
                        .with_suggestion("close the string with the quote character that opened it")
                } else {
                    diag.with_code("E0001")
                        .with_suggestion("check your syntax and make sure all tokens are valid")
                }
            }
            CoreError::ParseError {
                line,
                column,
                message,
            } => {
                let diag = Diagnostic::new(Severity::Fatal, Category::Syntax, message.clone())
                    .with_location(Span::new(*line, *column));
                if message == NESTING_MESSAGE {
                    diag.with_code("E0101").with_suggestion(format!(
                        "split the expression or block into smaller parts; at most {MAX_NESTING} levels are allowed"
                    ))
                } else {
                    diag.with_code("E0100")
                        .with_suggestion("review the statement and make sure it is properly formed")
                }
            }
            other => Diagnostic::new(Severity::Fatal, Category::Compilation, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_errors_become_fatal_lexical_diagnostics() {
        let err = CoreError::lex(Span::new(4, 1), "unindent does not match any outer indentation level");
        let diag = err.to_diagnostic();
        assert_eq!(diag.severity, Severity::Fatal);
        assert_eq!(diag.category, Category::Lexical);
        assert_eq!(diag.code, Some("E0003"));
        assert_eq!(diag.location.map(|s| s.line), Some(4));
    }

    #[test]
    fn nesting_limit_has_its_own_code() {
        let diag = CoreError::parse(Span::new(1, 200), NESTING_MESSAGE).to_diagnostic();
        assert_eq!(diag.category, Category::Syntax);
        assert_eq!(diag.code, Some("E0101"));
        assert_eq!(
            CoreError::parse(Span::new(1, 1), "expected expression").to_diagnostic().code,
            Some("E0100")
        );
    }
}
