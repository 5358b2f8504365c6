//! Source locations.

use core::fmt;

/// A 1-based line/column position in the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub const fn new(line: u32, column: u32) -> Self {
        Span { line, column }
    }

    /// Same position, rendered against a file name (`file:line:column`).
    pub fn in_file<'a>(&self, file: &'a str) -> Located<'a> {
        Located { file, span: *self }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Display helper produced by [`Span::in_file`].
pub struct Located<'a> {
    file: &'a str,
    span: Span,
}

impl fmt::Display for Located<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.span.line, self.span.column)
    }
}

/// `Debug` text of `node` with every [`Span`] cut out, so trees parsed from
/// differently laid out source can be compared by shape.
#[cfg(test)]
pub(crate) fn without_spans(node: &impl fmt::Debug) -> String {
    let text = format!("{node:?}");
    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_str();
    while let Some(start) = rest.find("Span {") {
        out.push_str(&rest[..start]);
        rest = match rest[start..].find('}') {
            Some(end) => &rest[start + end + 1..],
            None => "",
        };
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_part_of_equality() {
        assert_eq!(Span::new(2, 5), Span::new(2, 5));
        assert_ne!(Span::new(2, 5), Span::new(2, 6));
    }

    #[test]
    fn shape_ignores_positions_only() {
        let near = (Span::new(1, 1), "x");
        let far = (Span::new(40, 12), "x");
        assert_eq!(without_spans(&near), without_spans(&far));
        assert_ne!(without_spans(&near), without_spans(&(Span::new(1, 1), "y")));
    }
}
