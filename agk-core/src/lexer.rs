//! Lexer for AGK source text.
//!
//! Produces a flat token stream terminated by `Eof`. Block structure is
//! encoded with synthetic `Indent`/`Dedent` tokens derived from leading
//! whitespace, the way an off-side rule language is usually tokenized.

use crate::error::CoreError;
use crate::span::Span;

/// Width one tab contributes to an indentation level.
const TAB_WIDTH: usize = 4;

/// Kind of a token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Layout
    Newline,
    Indent,
    Dedent,
    Eof,

    // Identifiers and literals
    Identifier,
    Number,
    Text,
    True,
    False,

    // Structural keywords
    Define,
    Function,
    External,
    Class,
    Interface,
    Abstract,
    Implements,
    Extends,
    Constructor,
    Method,
    Variable,
    Constant,
    Return,
    If,
    Else,
    Elif,
    For,
    While,
    Break,
    Continue,
    Try,
    Catch,
    Finally,
    Throw,
    Import,
    From,
    As,
    Public,
    Private,
    Protected,
    Static,
    Final,
    New,

    // Connective words
    That,
    Takes,
    Returns,
    Create,
    Set,
    To,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    And,
    Or,
    Not,
    Is,
    Are,
    Equals,
    Greater,
    Less,
    Than,
    Each,
    In,
    With,
    Using,
    Call,
    The,
    This,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    EqualEqual,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterEqual,
    LessEqual,
    AndAnd,
    OrOr,
    Bang,
    Question,

    // Delimiters
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Colon,
    Semicolon,
}

impl TokenKind {
    /// Words from the natural-language table. Outside of the position where
    /// they carry meaning, most of them are still usable as ordinary names.
    pub fn is_connective(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            That | Takes
                | Returns
                | Create
                | Set
                | To
                | Add
                | Subtract
                | Multiply
                | Divide
                | Modulo
                | And
                | Or
                | Not
                | Is
                | Are
                | Equals
                | Greater
                | Less
                | Than
                | Each
                | In
                | With
                | Using
                | Call
                | The
                | This
        )
    }

    pub fn is_layout(self) -> bool {
        matches!(
            self,
            TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent
        )
    }

    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            TokenKind::Public
                | TokenKind::Private
                | TokenKind::Protected
                | TokenKind::Static
                | TokenKind::Final
                | TokenKind::Abstract
        )
    }
}

/// A single token. `lexeme` is the source text, except for string literals
/// where it holds the contents without the surrounding quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    pub fn line(&self) -> u32 {
        self.span.line
    }

    pub fn column(&self) -> u32 {
        self.span.column
    }
}

/// Tokenize a whole source string.
///
/// Fails on the first unexpected character, unterminated string literal or
/// dedent to a width that no enclosing line used.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CoreError> {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        index: 0,
        line: 1,
        column: 1,
        indents: IndentStack::new(),
        bracket_depth: 0,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

/// Stack of open indentation widths, bottom is always 0.
#[derive(Debug)]
struct IndentStack {
    levels: Vec<usize>,
}

enum IndentChange {
    None,
    Indent,
    Dedent(usize),
}

impl IndentStack {
    fn new() -> Self {
        IndentStack { levels: vec![0] }
    }

    fn top(&self) -> usize {
        self.levels.last().copied().unwrap_or(0)
    }

    /// Apply the width of a new logical line. `None` means the width lands
    /// between two open levels.
    fn apply(&mut self, width: usize) -> Option<IndentChange> {
        let current = self.top();
        if width > current {
            self.levels.push(width);
            return Some(IndentChange::Indent);
        }
        if width == current {
            return Some(IndentChange::None);
        }
        let mut popped = 0;
        while self.levels.len() > 1 && self.top() > width {
            self.levels.pop();
            popped += 1;
        }
        if self.top() != width {
            return None;
        }
        Some(IndentChange::Dedent(popped))
    }

    /// Close every open level, returning how many were open.
    fn close_all(&mut self) -> usize {
        let open = self.levels.len() - 1;
        self.levels.truncate(1);
        open
    }
}

struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: u32,
    column: u32,
    indents: IndentStack,
    bracket_depth: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    fn run(&mut self) -> Result<(), CoreError> {
        self.measure_indentation()?;

        while let Some(ch) = self.peek_char() {
            let start = self.here();
            match ch {
                '\n' => {
                    self.consume_char();
                    if self.bracket_depth == 0 {
                        self.push(TokenKind::Newline, "\n", start);
                        self.measure_indentation()?;
                    }
                }
                ' ' | '\t' | '\r' => self.consume_char(),
                '#' => {
                    while !matches!(self.peek_char(), None | Some('\n')) {
                        self.consume_char();
                    }
                }
                '"' | '\'' => self.lex_string(ch, start)?,
                '0'..='9' => self.lex_number(start),
                c if c.is_alphabetic() || c == '_' => self.lex_word(start),
                _ => self.lex_symbol(ch, start)?,
            }
        }

        let end = self.here();
        for _ in 0..self.indents.close_all() {
            self.push(TokenKind::Dedent, "", end);
        }
        self.push(TokenKind::Eof, "", end);
        Ok(())
    }

    /// Read leading whitespace of the line that starts at the cursor and
    /// emit the matching layout tokens. Blank and comment-only lines leave
    /// the stack untouched.
    fn measure_indentation(&mut self) -> Result<(), CoreError> {
        let mut width = 0;
        while let Some(ch) = self.peek_char() {
            match ch {
                ' ' => width += 1,
                '\t' => width += TAB_WIDTH,
                _ => break,
            }
            self.consume_char();
        }

        if matches!(self.peek_char(), None | Some('\n') | Some('\r') | Some('#')) {
            return Ok(());
        }

        let at = self.here();
        match self.indents.apply(width) {
            Some(IndentChange::None) => {}
            Some(IndentChange::Indent) => self.push(TokenKind::Indent, "", at),
            Some(IndentChange::Dedent(count)) => {
                for _ in 0..count {
                    self.push(TokenKind::Dedent, "", at);
                }
            }
            None => {
                return Err(CoreError::lex(
                    at,
                    "unindent does not match any outer indentation level",
                ));
            }
        }
        Ok(())
    }

    fn lex_symbol(&mut self, ch: char, start: Span) -> Result<(), CoreError> {
        self.consume_char();
        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '?' => TokenKind::Question,
            '=' => self.pair('=', TokenKind::EqualEqual, TokenKind::Assign),
            '!' => self.pair('=', TokenKind::NotEqual, TokenKind::Bang),
            '>' => self.pair('=', TokenKind::GreaterEqual, TokenKind::GreaterThan),
            '<' => self.pair('=', TokenKind::LessEqual, TokenKind::LessThan),
            '&' if self.peek_char() == Some('&') => {
                self.consume_char();
                TokenKind::AndAnd
            }
            '|' if self.peek_char() == Some('|') => {
                self.consume_char();
                TokenKind::OrOr
            }
            '(' => self.open(TokenKind::LParen),
            '[' => self.open(TokenKind::LBracket),
            '{' => self.open(TokenKind::LBrace),
            ')' => self.close(TokenKind::RParen),
            ']' => self.close(TokenKind::RBracket),
            '}' => self.close(TokenKind::RBrace),
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            other => {
                return Err(CoreError::lex(
                    start,
                    format!("unexpected character '{other}'"),
                ));
            }
        };
        let text: String = self.chars[self.offset_of(start)..self.index].iter().collect();
        self.push(kind, text, start);
        Ok(())
    }

    fn pair(&mut self, next: char, double: TokenKind, single: TokenKind) -> TokenKind {
        if self.peek_char() == Some(next) {
            self.consume_char();
            double
        } else {
            single
        }
    }

    fn open(&mut self, kind: TokenKind) -> TokenKind {
        self.bracket_depth += 1;
        kind
    }

    fn close(&mut self, kind: TokenKind) -> TokenKind {
        self.bracket_depth = self.bracket_depth.saturating_sub(1);
        kind
    }

    fn lex_string(&mut self, quote: char, start: Span) -> Result<(), CoreError> {
        self.consume_char();
        let mut contents = String::new();
        loop {
            match self.peek_char() {
                None => {
                    return Err(CoreError::lex(start, "unterminated string literal"));
                }
                Some(ch) if ch == quote => {
                    self.consume_char();
                    break;
                }
                Some(ch) => {
                    contents.push(ch);
                    self.consume_char();
                }
            }
        }
        self.push(TokenKind::Text, contents, start);
        Ok(())
    }

    fn lex_number(&mut self, start: Span) {
        let begin = self.index;
        self.consume_digits();
        // one decimal point, only when a digit follows it
        if self.peek_char() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.consume_char();
            self.consume_digits();
        }
        let text: String = self.chars[begin..self.index].iter().collect();
        self.push(TokenKind::Number, text, start);
    }

    fn consume_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.consume_char();
        }
    }

    fn lex_word(&mut self, start: Span) {
        let begin = self.index;
        while self
            .peek_char()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.consume_char();
        }
        let text: String = self.chars[begin..self.index].iter().collect();
        let lowered = text.to_lowercase();
        let kind = structural_keyword(&lowered)
            .or_else(|| connective_word(&lowered))
            .unwrap_or(TokenKind::Identifier);
        self.push(kind, text, start);
    }

    fn push(&mut self, kind: TokenKind, lexeme: impl Into<String>, span: Span) {
        self.tokens.push(Token::new(kind, lexeme, span));
    }

    fn here(&self) -> Span {
        Span::new(self.line, self.column)
    }

    /// Index of the character a same-line span started at.
    fn offset_of(&self, start: Span) -> usize {
        self.index - (self.column - start.column) as usize
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.index + 1).copied()
    }

    fn consume_char(&mut self) {
        if let Some(ch) = self.peek_char() {
            self.index += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }
}

fn structural_keyword(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "define" => TokenKind::Define,
        "function" => TokenKind::Function,
        "external" => TokenKind::External,
        "class" => TokenKind::Class,
        "interface" => TokenKind::Interface,
        "abstract" => TokenKind::Abstract,
        "implements" => TokenKind::Implements,
        "extends" => TokenKind::Extends,
        "constructor" => TokenKind::Constructor,
        "method" => TokenKind::Method,
        "variable" => TokenKind::Variable,
        "constant" => TokenKind::Constant,
        "return" => TokenKind::Return,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "elif" => TokenKind::Elif,
        "for" => TokenKind::For,
        "while" => TokenKind::While,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "try" => TokenKind::Try,
        "catch" => TokenKind::Catch,
        "finally" => TokenKind::Finally,
        "throw" => TokenKind::Throw,
        "import" => TokenKind::Import,
        "from" => TokenKind::From,
        "as" => TokenKind::As,
        "public" => TokenKind::Public,
        "private" => TokenKind::Private,
        "protected" => TokenKind::Protected,
        "static" => TokenKind::Static,
        "final" => TokenKind::Final,
        "new" => TokenKind::New,
        _ => return None,
    };
    Some(kind)
}

fn connective_word(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "that" => TokenKind::That,
        "takes" => TokenKind::Takes,
        "returns" => TokenKind::Returns,
        "create" => TokenKind::Create,
        "set" => TokenKind::Set,
        "to" => TokenKind::To,
        "add" => TokenKind::Add,
        "subtract" => TokenKind::Subtract,
        "multiply" => TokenKind::Multiply,
        "divide" => TokenKind::Divide,
        "modulo" => TokenKind::Modulo,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "is" => TokenKind::Is,
        "are" => TokenKind::Are,
        "equals" => TokenKind::Equals,
        "greater" => TokenKind::Greater,
        "less" => TokenKind::Less,
        "than" => TokenKind::Than,
        "each" => TokenKind::Each,
        "in" => TokenKind::In,
        "with" => TokenKind::With,
        "using" => TokenKind::Using,
        "call" => TokenKind::Call,
        "the" => TokenKind::The,
        "this" => TokenKind::This,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src)
            .expect("lexing succeeds")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_keywords_in_table_order() {
        use TokenKind::*;
        assert_eq!(
            kinds("define function add that takes a"),
            vec![Define, Function, Add, That, Takes, Identifier, Eof]
        );
    }

    #[test]
    fn keywords_are_case_insensitive_but_keep_their_text() {
        let tokens = tokenize("Define Integer").expect("lexing succeeds");
        assert_eq!(tokens[0].kind, TokenKind::Define);
        assert_eq!(tokens[0].lexeme, "Define");
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn two_character_operators_win_over_single() {
        use TokenKind::*;
        assert_eq!(
            kinds("a == b != c <= d >= e && f || !g < h > i = j"),
            vec![
                Identifier, EqualEqual, Identifier, NotEqual, Identifier, LessEqual, Identifier,
                GreaterEqual, Identifier, AndAnd, Identifier, OrOr, Bang, Identifier, LessThan,
                Identifier, GreaterThan, Identifier, Assign, Identifier, Eof
            ]
        );
    }

    #[test]
    fn numbers_take_one_decimal_point() {
        let tokens = tokenize("3.14 7 1.2.3").expect("lexing succeeds");
        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["3.14", "7", "1.2", ".", "3", ""]);
    }

    #[test]
    fn strings_accept_either_quote_and_span_lines() {
        let tokens = tokenize("'it' \"a\nb\" x").expect("lexing succeeds");
        assert_eq!(tokens[0].kind, TokenKind::Text);
        assert_eq!(tokens[0].lexeme, "it");
        assert_eq!(tokens[1].lexeme, "a\nb");
        assert_eq!(tokens[2].lexeme, "x");
        assert_eq!(tokens[2].line(), 2);
        assert_eq!(tokens[2].column(), 4);
    }

    #[test]
    fn comments_are_dropped() {
        use TokenKind::*;
        assert_eq!(kinds("x # trailing words\ny"), vec![Identifier, Newline, Identifier, Eof]);
    }

    #[test]
    fn indentation_produces_block_markers() {
        use TokenKind::*;
        let src = "if a:\n    b\n    if c:\n        d\ne\n";
        assert_eq!(
            kinds(src),
            vec![
                If, Identifier, Colon, Newline, Indent, Identifier, Newline, If, Identifier,
                Colon, Newline, Indent, Identifier, Newline, Dedent, Dedent, Identifier, Newline,
                Eof
            ]
        );
    }

    #[test]
    fn blank_and_comment_lines_do_not_affect_layout() {
        use TokenKind::*;
        let src = "a:\n    b\n\n  # note\n    c\n";
        assert_eq!(
            kinds(src),
            vec![
                Identifier, Colon, Newline, Indent, Identifier, Newline, Newline, Newline,
                Identifier, Newline, Dedent, Eof
            ]
        );
    }

    #[test]
    fn indent_and_dedent_counts_balance() {
        let sources = [
            "a\n",
            "a:\n  b\n",
            "a:\n  b:\n    c:\n      d\n",
            "a:\n    b:\n        c\n    d\ne:\n\tf\n",
            "x:\n  y:\n    z\n  w:\n    v:\n      u\nt\n",
        ];
        for src in sources {
            let mut depth: i64 = 0;
            for kind in kinds(src) {
                match kind {
                    TokenKind::Indent => depth += 1,
                    TokenKind::Dedent => depth -= 1,
                    _ => {}
                }
                assert!(depth >= 0, "dedent below the base level in {src:?}");
            }
            assert_eq!(depth, 0, "unbalanced block markers in {src:?}");
        }
    }

    #[test]
    fn newlines_inside_brackets_are_not_layout() {
        use TokenKind::*;
        assert_eq!(
            kinds("f(1,\n      2)\n"),
            vec![Identifier, LParen, Number, Comma, Number, RParen, Newline, Eof]
        );
    }

    #[test]
    fn inconsistent_dedent_reports_the_line() {
        let src = "define function f:\n    if x:\n        return 1\n  return 2\n";
        let err = tokenize(src).expect_err("dedent should fail");
        assert!(matches!(err, CoreError::LexError { line: 4, .. }));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = tokenize("create s = \"oops").expect_err("string should fail");
        match err {
            CoreError::LexError { line, column, message } => {
                assert_eq!((line, column), (1, 12));
                assert!(message.contains("unterminated"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unexpected_character_is_an_error() {
        let err = tokenize("a @ b").expect_err("@ is not a token");
        assert!(matches!(err, CoreError::LexError { column: 3, .. }));
        assert!(tokenize("a & b").is_err());
    }
}
