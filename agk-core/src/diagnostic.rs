//! Diagnostics shared by every stage of the pipeline.
//!
//! The lexer and parser stop at their first problem and surface it as a
//! [`CoreError`](crate::error::CoreError); the semantic analyzer keeps going
//! and pushes records into a bounded [`Diagnostics`] collector instead.

use core::fmt;

use crate::span::Span;

/// Default cap on stored errors per compilation.
pub const DEFAULT_MAX_ERRORS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Lexical,
    Syntax,
    Semantic,
    Type,
    Import,
    Compilation,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Lexical => "Lexical Error",
            Category::Syntax => "Syntax Error",
            Category::Semantic => "Semantic Error",
            Category::Type => "Type Error",
            Category::Import => "Import Error",
            Category::Compilation => "Compilation Error",
        }
    }
}

/// A single error, warning or note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    pub location: Option<Span>,
    pub suggestion: Option<String>,
    pub code: Option<&'static str>,
}

impl Diagnostic {
    pub fn new(severity: Severity, category: Category, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            category,
            message: message.into(),
            location: None,
            suggestion: None,
            code: None,
        }
    }

    pub fn error(category: Category, message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Error, category, message)
    }

    pub fn warning(category: Category, message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Warning, category, message)
    }

    pub fn with_location(mut self, span: Span) -> Self {
        self.location = Some(span);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error | Severity::Fatal)
    }

    /// Render as `[SEVERITY] CATEGORY at file:line:column: message`, followed
    /// by a `Suggestion:` line when one is attached.
    pub fn render(&self, file: &str) -> String {
        let mut out = format!("[{}] {}", self.severity.label(), self.category.label());
        if let Some(span) = self.location {
            out.push_str(&format!(" at {}", span.in_file(file)));
        }
        out.push_str(": ");
        out.push_str(&self.message);
        if let Some(suggestion) = &self.suggestion {
            out.push_str("\nSuggestion: ");
            out.push_str(suggestion);
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render("<input>"))
    }
}

/// Ordered error and warning lists with an upper bound on stored errors.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
    max_errors: usize,
    suppressed: usize,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics::with_limit(DEFAULT_MAX_ERRORS)
    }
}

impl Diagnostics {
    pub fn with_limit(max_errors: usize) -> Self {
        Diagnostics {
            errors: Vec::new(),
            warnings: Vec::new(),
            max_errors,
            suppressed: 0,
        }
    }

    /// Route a record to the error or warning list by its severity.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            if self.errors.len() >= self.max_errors {
                self.suppressed += 1;
                return;
            }
            self.errors.push(diagnostic);
        } else {
            self.warnings.push(diagnostic);
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.suppressed > 0
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Errors dropped after the limit was reached.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    pub fn into_parts(self) -> (Vec<Diagnostic>, Vec<Diagnostic>, usize) {
        (self.errors, self.warnings, self.suppressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_location_and_suggestion() {
        let diag = Diagnostic::error(Category::Semantic, "variable 'x' is not declared")
            .with_location(Span::new(3, 7))
            .with_suggestion("declare 'x' first");
        assert_eq!(
            diag.render("main.agk"),
            "[ERROR] Semantic Error at main.agk:3:7: variable 'x' is not declared\nSuggestion: declare 'x' first"
        );
    }

    #[test]
    fn renders_without_location() {
        let diag = Diagnostic::warning(Category::Type, "odd");
        assert_eq!(diag.render("a.agk"), "[WARNING] Type Error: odd");
    }

    #[test]
    fn caps_stored_errors_and_counts_the_rest() {
        let mut diags = Diagnostics::with_limit(2);
        for i in 0..5 {
            diags.push(Diagnostic::error(Category::Semantic, format!("e{i}")));
        }
        diags.push(Diagnostic::warning(Category::Semantic, "w"));
        assert_eq!(diags.errors().len(), 2);
        assert_eq!(diags.suppressed(), 3);
        assert_eq!(diags.warnings().len(), 1);
        assert!(diags.has_errors());
    }
}
