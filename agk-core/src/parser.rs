//! Recursive-descent parser for AGK.
//!
//! Statements are dispatched on their leading keyword; expressions use
//! precedence climbing, lowest to highest:
//!
//!   or -> and -> equality -> comparison -> additive -> multiplicative
//!      -> unary -> postfix -> primary
//!
//! Assignment (`set x to e`, `x = e`, `x += e`, `add e to x`) is a statement
//! form, not an expression. Bodies after `:` are either the rest of the
//! line or an indented block delimited by `Indent`/`Dedent`.

use crate::ast::*;
use crate::error::CoreError;
use crate::lexer::{Token, TokenKind, tokenize};
use crate::span::Span;

type PResult<T> = Result<T, CoreError>;

/// Deepest nesting of blocks, parenthesized or prefixed expressions and
/// operator chains the parser accepts. Later stages recurse over the tree,
/// so this also bounds their stack use.
pub const MAX_NESTING: usize = 64;

/// Message of the syntax error raised past [`MAX_NESTING`].
pub const NESTING_MESSAGE: &str = "expression nested too deeply";

/// Parse a token stream produced by [`tokenize`].
pub fn parse(tokens: Vec<Token>) -> Result<Program, CoreError> {
    Parser::new(tokens).parse_program()
}

/// Tokenize and parse in one step.
pub fn parse_source(source: &str) -> Result<Program, CoreError> {
    parse(tokenize(source)?)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let span = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, "", span));
        }
        Parser {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn parse_program(&mut self) -> PResult<Program> {
        let mut program = Program::default();
        loop {
            while self.peek_kind().is_layout() || self.check(TokenKind::Semicolon) {
                self.advance();
            }
            match self.peek_kind() {
                TokenKind::Eof => break,
                TokenKind::Import | TokenKind::From => program.imports.push(self.parse_import()?),
                _ => program.statements.push(self.parse_statement()?),
            }
        }
        Ok(program)
    }

    // -----------------------------------------------------------------
    // Declarations
    // -----------------------------------------------------------------

    fn parse_import(&mut self) -> PResult<Import> {
        let span = self.span();
        if self.matches(TokenKind::From) {
            let module = self.parse_module_path()?;
            self.expect(TokenKind::Import, "expected 'import' after module name")?;
            let mut names = vec![self.expect_name("expected a name to import")?];
            while self.matches(TokenKind::Comma) {
                names.push(self.expect_name("expected a name after ','")?);
            }
            let alias = self.parse_alias()?;
            return Ok(Import {
                module,
                alias,
                names,
                span,
            });
        }
        self.expect(TokenKind::Import, "expected 'import'")?;
        let module = self.parse_module_path()?;
        let alias = self.parse_alias()?;
        Ok(Import {
            module,
            alias,
            names: Vec::new(),
            span,
        })
    }

    fn parse_module_path(&mut self) -> PResult<String> {
        let mut path = self.expect_name("expected module name")?;
        while self.matches(TokenKind::Dot) {
            path.push('.');
            path.push_str(&self.expect_name("expected module name after '.'")?);
        }
        Ok(path)
    }

    fn parse_alias(&mut self) -> PResult<Option<String>> {
        if self.matches(TokenKind::As) {
            Ok(Some(self.expect_name("expected alias after 'as'")?))
        } else {
            Ok(None)
        }
    }

    fn parse_modifiers(&mut self, modifiers: &mut Modifiers) {
        loop {
            match self.peek_kind() {
                TokenKind::Public => modifiers.visibility = Some(Visibility::Public),
                TokenKind::Private => modifiers.visibility = Some(Visibility::Private),
                TokenKind::Protected => modifiers.visibility = Some(Visibility::Protected),
                TokenKind::Static => modifiers.is_static = true,
                TokenKind::Final => modifiers.is_final = true,
                TokenKind::Abstract => modifiers.is_abstract = true,
                _ => return,
            }
            self.advance();
        }
    }

    /// Everything after an optional leading modifier list, at statement
    /// level.
    fn parse_declaration(&mut self, mut modifiers: Modifiers) -> PResult<Stmt> {
        match self.peek_kind() {
            TokenKind::Define => {
                self.advance();
                self.parse_modifiers(&mut modifiers);
                match self.peek_kind() {
                    TokenKind::Function => Ok(Stmt::Function(self.parse_function(modifiers, true)?)),
                    TokenKind::Class => Ok(Stmt::Class(self.parse_class(modifiers)?)),
                    TokenKind::Interface => Ok(Stmt::Interface(self.parse_interface(modifiers)?)),
                    TokenKind::Constructor => {
                        Err(self.error("constructors can only be defined inside a class"))
                    }
                    _ => Err(self.error("expected 'function', 'class' or 'interface' after 'define'")),
                }
            }
            TokenKind::External => Ok(Stmt::External(self.parse_external(modifiers)?)),
            TokenKind::Variable => Ok(Stmt::Variable(self.parse_variable(DeclKind::Variable, modifiers)?)),
            TokenKind::Constant => Ok(Stmt::Variable(self.parse_variable(DeclKind::Constant, modifiers)?)),
            _ => Err(self.error("expected a definition after modifiers")),
        }
    }

    fn parse_function(&mut self, modifiers: Modifiers, body_required: bool) -> PResult<FunctionDef> {
        let span = self.span();
        // `method` is accepted as a spelling of `function`
        if !self.matches(TokenKind::Function) && !self.matches(TokenKind::Method) {
            return Err(self.error("expected 'function'"));
        }
        let name = self.expect_name("expected function name")?;
        let (params, return_type) = self.parse_signature()?;
        let body = if body_required || self.check(TokenKind::Colon) {
            self.expect(TokenKind::Colon, "expected ':' after function signature")?;
            self.parse_body()?
        } else {
            Vec::new()
        };
        Ok(FunctionDef {
            name,
            params,
            return_type,
            body,
            modifiers,
            span,
        })
    }

    /// `[that takes PARAMS] [and returns TYPE]`, or a parenthesized
    /// parameter list.
    fn parse_signature(&mut self) -> PResult<(Vec<Parameter>, Option<TypeNode>)> {
        let mut params = Vec::new();
        if self.matches(TokenKind::LParen) {
            params = self.parse_parameter_list(TokenKind::RParen)?;
            self.expect(TokenKind::RParen, "expected ')' after parameters")?;
        } else if self.matches(TokenKind::That) {
            if self.matches(TokenKind::Takes) {
                params = self.parse_parameter_list(TokenKind::Colon)?;
            } else if !self.check(TokenKind::Returns) {
                return Err(self.error("expected 'takes' or 'returns' after 'that'"));
            }
        } else if self.matches(TokenKind::Takes) {
            params = self.parse_parameter_list(TokenKind::Colon)?;
        }

        let return_type = if self.check(TokenKind::And) && self.peek_kind_at(1) == TokenKind::Returns {
            self.advance();
            self.advance();
            Some(self.parse_type()?)
        } else if self.matches(TokenKind::Returns) {
            Some(self.parse_type()?)
        } else {
            None
        };
        Ok((params, return_type))
    }

    fn parse_parameter_list(&mut self, close: TokenKind) -> PResult<Vec<Parameter>> {
        let mut params = Vec::new();
        if self.check(close) || self.at_returns_clause() {
            return Ok(params);
        }
        loop {
            let span = self.span();
            let name = self.expect_name("expected parameter name")?;
            let type_annotation = if self.matches(TokenKind::As) {
                Some(self.parse_type()?)
            } else {
                None
            };
            params.push(Parameter {
                name,
                type_annotation,
                span,
            });
            if self.matches(TokenKind::Comma) {
                continue;
            }
            // `a as Integer and b as Integer`, unless `and returns` follows
            if self.check(TokenKind::And) && !self.at_returns_clause() {
                self.advance();
                continue;
            }
            break;
        }
        Ok(params)
    }

    fn at_returns_clause(&self) -> bool {
        self.check(TokenKind::Returns)
            || (self.check(TokenKind::And) && self.peek_kind_at(1) == TokenKind::Returns)
    }

    fn parse_type(&mut self) -> PResult<TypeNode> {
        let name = self.expect_name("expected type name")?;
        let mut ty = TypeNode::named(name);
        if self.matches(TokenKind::LessThan) {
            loop {
                ty.generic_args.push(self.parse_type()?);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::GreaterThan, "expected '>' after generic arguments")?;
        }
        if self.check(TokenKind::LBracket) && self.peek_kind_at(1) == TokenKind::RBracket {
            self.advance();
            self.advance();
            ty.is_array = true;
        }
        if self.matches(TokenKind::Question) {
            ty.is_nullable = true;
        }
        Ok(ty)
    }

    fn parse_external(&mut self, modifiers: Modifiers) -> PResult<ExternalFunctionDef> {
        let span = self.span();
        self.expect(TokenKind::External, "expected 'external'")?;
        self.expect(TokenKind::Function, "expected 'function' after 'external'")?;
        let name = self.expect_name("expected function name")?;
        let params = if self.matches(TokenKind::LParen) {
            let params = self.parse_parameter_list(TokenKind::RParen)?;
            self.expect(TokenKind::RParen, "expected ')' after parameters")?;
            params
        } else if self.matches(TokenKind::That) {
            self.expect(TokenKind::Takes, "expected 'takes' after 'that'")?;
            self.parse_parameter_list(TokenKind::From)?
        } else {
            Vec::new()
        };
        self.expect(TokenKind::From, "expected 'from' after function parameters")?;
        let library = self.expect(TokenKind::Text, "expected library path after 'from'")?.lexeme;
        self.expect(TokenKind::As, "expected 'as' before return type")?;
        let return_type = self.parse_type()?;
        Ok(ExternalFunctionDef {
            name,
            params,
            return_type,
            library,
            visibility: modifiers.visibility,
            span,
        })
    }

    fn parse_class(&mut self, modifiers: Modifiers) -> PResult<ClassDef> {
        let span = self.span();
        self.expect(TokenKind::Class, "expected 'class'")?;
        let name = self.expect_name("expected class name")?;
        let mut superclasses = Vec::new();
        let mut interfaces = Vec::new();
        if self.matches(TokenKind::Extends) {
            superclasses = self.parse_name_list("expected superclass name")?;
        }
        if self.matches(TokenKind::Implements) {
            interfaces = self.parse_name_list("expected interface name")?;
        }
        self.expect(TokenKind::Colon, "expected ':' after class signature")?;

        let mut class = ClassDef {
            name,
            superclasses,
            interfaces,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            modifiers,
            span,
        };
        for member in self.parse_suite(Self::parse_class_member)? {
            match member {
                Member::Field(f) => class.fields.push(f),
                Member::Method(m) => class.methods.push(m),
                Member::Constructor(c) => class.constructors.push(c),
            }
        }
        Ok(class)
    }

    fn parse_name_list(&mut self, message: &str) -> PResult<Vec<String>> {
        let mut names = vec![self.expect_name(message)?];
        while self.matches(TokenKind::Comma) {
            names.push(self.expect_name(message)?);
        }
        Ok(names)
    }

    fn parse_class_member(&mut self) -> PResult<Member> {
        let mut modifiers = Modifiers::default();
        self.parse_modifiers(&mut modifiers);
        if self.matches(TokenKind::Define) {
            self.parse_modifiers(&mut modifiers);
        }
        match self.peek_kind() {
            TokenKind::Function | TokenKind::Method => {
                Ok(Member::Method(self.parse_function(modifiers, true)?))
            }
            TokenKind::Constructor => Ok(Member::Constructor(self.parse_constructor(modifiers)?)),
            TokenKind::Variable => Ok(Member::Field(self.parse_variable(DeclKind::Variable, modifiers)?)),
            TokenKind::Constant => Ok(Member::Field(self.parse_variable(DeclKind::Constant, modifiers)?)),
            _ if self.at_name() && self.peek_kind_at(1) == TokenKind::As => {
                Ok(Member::Field(self.parse_variable(DeclKind::Field, modifiers)?))
            }
            _ => Err(self.error("expected a field, method or constructor in class body")),
        }
    }

    fn parse_constructor(&mut self, modifiers: Modifiers) -> PResult<ConstructorDef> {
        let span = self.span();
        self.expect(TokenKind::Constructor, "expected 'constructor'")?;
        let (params, _) = self.parse_signature()?;
        self.expect(TokenKind::Colon, "expected ':' after constructor signature")?;
        let body = self.parse_body()?;
        Ok(ConstructorDef {
            params,
            body,
            visibility: modifiers.visibility,
            span,
        })
    }

    fn parse_interface(&mut self, modifiers: Modifiers) -> PResult<InterfaceDef> {
        let span = self.span();
        self.expect(TokenKind::Interface, "expected 'interface'")?;
        let name = self.expect_name("expected interface name")?;
        self.expect(TokenKind::Colon, "expected ':' after interface name")?;
        let methods = self.parse_suite(|p| {
            let mut modifiers = Modifiers::default();
            p.parse_modifiers(&mut modifiers);
            if p.matches(TokenKind::Define) {
                p.parse_modifiers(&mut modifiers);
            }
            if !p.check(TokenKind::Function) {
                return Err(p.error("expected a method signature in interface body"));
            }
            p.parse_function(modifiers, false)
        })?;
        Ok(InterfaceDef {
            name,
            methods,
            visibility: modifiers.visibility,
            span,
        })
    }

    fn parse_variable(&mut self, kind: DeclKind, modifiers: Modifiers) -> PResult<VariableDecl> {
        let span = self.span();
        match kind {
            DeclKind::Variable => {
                self.expect(TokenKind::Variable, "expected 'variable'")?;
            }
            DeclKind::Constant => {
                self.expect(TokenKind::Constant, "expected 'constant'")?;
            }
            DeclKind::Create | DeclKind::Field => {}
        }
        let name = self.expect_name("expected variable name")?;
        let type_annotation = if self.matches(TokenKind::As) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let initializer = if self.matches(TokenKind::Assign) {
            Some(self.parse_expression()?)
        } else if kind == DeclKind::Constant {
            return Err(self.error(format!("expected '=' and a value for constant '{name}'")));
        } else {
            None
        };
        Ok(VariableDecl {
            name,
            type_annotation,
            initializer,
            kind,
            modifiers,
            span,
        })
    }

    // -----------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------

    fn parse_statement(&mut self) -> PResult<Stmt> {
        let span = self.span();
        let kind = self.peek_kind();
        if kind.is_modifier() {
            let mut modifiers = Modifiers::default();
            self.parse_modifiers(&mut modifiers);
            return self.parse_declaration(modifiers);
        }
        let stmt = match kind {
            TokenKind::Define | TokenKind::External | TokenKind::Variable | TokenKind::Constant => {
                return self.parse_declaration(Modifiers::default());
            }
            TokenKind::Import | TokenKind::From => {
                return Err(self.error("imports are only allowed at the top level"));
            }
            TokenKind::Create => self.parse_create()?,
            TokenKind::Set => self.parse_set()?,
            TokenKind::If => self.parse_if()?,
            TokenKind::For => self.parse_for()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::Try => self.parse_try()?,
            TokenKind::Return => self.parse_return()?,
            TokenKind::Throw => {
                self.advance();
                Stmt::Throw(ThrowStatement {
                    value: self.parse_expression()?,
                    span,
                })
            }
            TokenKind::Break => {
                self.advance();
                Stmt::Break(span)
            }
            TokenKind::Continue => {
                self.advance();
                Stmt::Continue(span)
            }
            TokenKind::Add if self.word_starts_statement() => self.parse_add_or_subtract()?,
            TokenKind::Subtract if self.word_starts_statement() => self.parse_add_or_subtract()?,
            TokenKind::Call if self.word_starts_statement() => {
                self.advance();
                let expr = self.parse_expression()?;
                if !matches!(expr, Expr::Call(_)) {
                    return Err(CoreError::parse(span, "expected a function call after 'call'"));
                }
                Stmt::Expression(expr)
            }
            TokenKind::Indent => return Err(self.error("unexpected indent")),
            _ => self.parse_expression_statement()?,
        };
        self.matches(TokenKind::Semicolon);
        Ok(stmt)
    }

    /// `add`, `subtract` and `call` open a statement unless they are used as
    /// an ordinary name (`add(1, 2)`, `add = 3`, `add.x`).
    fn word_starts_statement(&self) -> bool {
        !matches!(
            self.peek_kind_at(1),
            TokenKind::LParen
                | TokenKind::Assign
                | TokenKind::Dot
                | TokenKind::LBracket
                | TokenKind::Newline
                | TokenKind::Eof
        )
    }

    fn parse_create(&mut self) -> PResult<Stmt> {
        let span = self.span();
        self.expect(TokenKind::Create, "expected 'create'")?;
        let name = self.expect_name("expected variable name after 'create'")?;
        let mut type_annotation = None;
        let mut initializer = None;
        if self.matches(TokenKind::As) {
            if self.at_literal() {
                // `create total as 0`
                initializer = Some(self.parse_expression()?);
            } else {
                type_annotation = Some(self.parse_type()?);
                if self.matches(TokenKind::Assign) {
                    initializer = Some(self.parse_expression()?);
                }
            }
        } else if self.matches(TokenKind::Assign) {
            initializer = Some(self.parse_expression()?);
        } else {
            return Err(self.error("expected 'as' or '=' after variable name"));
        }
        Ok(Stmt::Variable(VariableDecl {
            name,
            type_annotation,
            initializer,
            kind: DeclKind::Create,
            modifiers: Modifiers::default(),
            span,
        }))
    }

    fn at_literal(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Number
                | TokenKind::Text
                | TokenKind::True
                | TokenKind::False
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::Minus
                | TokenKind::New
        )
    }

    fn parse_set(&mut self) -> PResult<Stmt> {
        let span = self.span();
        self.expect(TokenKind::Set, "expected 'set'")?;
        let target = self.parse_target()?;
        self.expect(TokenKind::To, "expected 'to' in set statement")?;
        let value = self.parse_expression()?;
        Ok(Stmt::Assignment(Assignment {
            target,
            op: AssignOp::Assign,
            value,
            span,
        }))
    }

    /// `add X to Y` and `subtract X from Y`.
    fn parse_add_or_subtract(&mut self) -> PResult<Stmt> {
        let span = self.span();
        let (op, joiner, message) = if self.matches(TokenKind::Add) {
            (AssignOp::AddAssign, TokenKind::To, "expected 'to' after the value to add")
        } else {
            self.expect(TokenKind::Subtract, "expected 'subtract'")?;
            (AssignOp::SubAssign, TokenKind::From, "expected 'from' after the value to subtract")
        };
        let value = self.parse_expression()?;
        self.expect(joiner, message)?;
        let target = self.parse_target()?;
        Ok(Stmt::Assignment(Assignment {
            target,
            op,
            value,
            span,
        }))
    }

    fn parse_target(&mut self) -> PResult<Expr> {
        let target = self.parse_expression()?;
        check_target(&target)?;
        Ok(target)
    }

    fn parse_expression_statement(&mut self) -> PResult<Stmt> {
        let span = self.span();
        let expr = self.parse_expression()?;
        if let Some(op) = self.match_assign_op() {
            check_target(&expr)?;
            let value = self.parse_expression()?;
            return Ok(Stmt::Assignment(Assignment {
                target: expr,
                op,
                value,
                span,
            }));
        }
        Ok(Stmt::Expression(expr))
    }

    /// `=`, or an arithmetic operator immediately followed by `=`.
    fn match_assign_op(&mut self) -> Option<AssignOp> {
        if self.matches(TokenKind::Assign) {
            return Some(AssignOp::Assign);
        }
        if self.peek_kind_at(1) != TokenKind::Assign {
            return None;
        }
        let op = match self.peek_kind() {
            TokenKind::Plus => AssignOp::AddAssign,
            TokenKind::Minus => AssignOp::SubAssign,
            TokenKind::Star => AssignOp::MulAssign,
            TokenKind::Slash => AssignOp::DivAssign,
            TokenKind::Percent => AssignOp::ModAssign,
            _ => return None,
        };
        self.advance();
        self.advance();
        Some(op)
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        let span = self.span();
        self.expect(TokenKind::If, "expected 'if'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Colon, "expected ':' after condition")?;
        let then_body = self.parse_body()?;

        let mut elif_branches = Vec::new();
        let mut else_body = None;
        loop {
            if self.at_clause(TokenKind::Elif) {
                self.advance();
            } else if self.at_clause(TokenKind::Else) {
                self.advance();
                if !self.matches(TokenKind::If) {
                    self.expect(TokenKind::Colon, "expected ':' after 'else'")?;
                    else_body = Some(self.parse_body()?);
                    break;
                }
            } else {
                break;
            }
            let condition = self.parse_expression()?;
            self.expect(TokenKind::Colon, "expected ':' after elif condition")?;
            let body = self.parse_body()?;
            elif_branches.push(ElifBranch { condition, body });
        }

        Ok(Stmt::If(IfStatement {
            condition,
            then_body,
            elif_branches,
            else_body,
            span,
        }))
    }

    fn parse_for(&mut self) -> PResult<Stmt> {
        let span = self.span();
        self.expect(TokenKind::For, "expected 'for'")?;
        self.matches(TokenKind::Each);
        let iterator = self.expect_name("expected iterator variable")?;
        self.expect(TokenKind::In, "expected 'in' in for loop")?;
        let iterable = self.parse_expression()?;
        self.expect(TokenKind::Colon, "expected ':' after for clause")?;
        let body = self.parse_body()?;
        Ok(Stmt::For(ForStatement {
            iterator,
            iterable,
            body,
            span,
        }))
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        let span = self.span();
        self.expect(TokenKind::While, "expected 'while'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Colon, "expected ':' after while condition")?;
        let body = self.parse_body()?;
        Ok(Stmt::While(WhileStatement {
            condition,
            body,
            span,
        }))
    }

    fn parse_try(&mut self) -> PResult<Stmt> {
        let span = self.span();
        self.expect(TokenKind::Try, "expected 'try'")?;
        self.expect(TokenKind::Colon, "expected ':' after 'try'")?;
        let body = self.parse_body()?;

        let mut catches = Vec::new();
        while self.at_clause(TokenKind::Catch) {
            let clause_span = self.span();
            self.advance();
            let exception_type = self.expect_name("expected exception type after 'catch'")?;
            let binding = if self.matches(TokenKind::As) || self.at_name() {
                Some(self.expect_name("expected a name for the caught exception")?)
            } else {
                None
            };
            self.expect(TokenKind::Colon, "expected ':' after catch clause")?;
            catches.push(CatchClause {
                exception_type,
                binding,
                body: self.parse_body()?,
                span: clause_span,
            });
        }

        let finally = if self.at_clause(TokenKind::Finally) {
            self.advance();
            self.expect(TokenKind::Colon, "expected ':' after 'finally'")?;
            Some(self.parse_body()?)
        } else {
            None
        };

        if catches.is_empty() && finally.is_none() {
            return Err(self.error("expected 'catch' or 'finally' after try block"));
        }
        Ok(Stmt::TryCatch(TryCatchStatement {
            body,
            catches,
            finally,
            span,
        }))
    }

    fn parse_return(&mut self) -> PResult<Stmt> {
        let span = self.span();
        self.expect(TokenKind::Return, "expected 'return'")?;
        let value = if self.at_statement_boundary() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        Ok(Stmt::Return(ReturnStatement { value, span }))
    }

    /// Whether the cursor cannot continue the current statement.
    fn at_statement_boundary(&self) -> bool {
        use TokenKind::*;
        matches!(
            self.peek_kind(),
            Newline
                | Dedent
                | Eof
                | Semicolon
                | Define
                | External
                | Variable
                | Constant
                | Return
                | If
                | Else
                | Elif
                | For
                | While
                | Break
                | Continue
                | Try
                | Catch
                | Finally
                | Throw
                | Create
                | Set
        )
    }

    // -----------------------------------------------------------------
    // Blocks
    // -----------------------------------------------------------------

    fn parse_body(&mut self) -> PResult<Vec<Stmt>> {
        self.parse_suite(Self::parse_statement)
    }

    /// Items after a `:`. Either an indented block, or the remainder of the
    /// current line when no newline follows the colon.
    fn parse_suite<T>(&mut self, item: impl FnMut(&mut Self) -> PResult<T>) -> PResult<Vec<T>> {
        self.nested(|p| p.parse_suite_items(item))
    }

    fn parse_suite_items<T>(&mut self, mut item: impl FnMut(&mut Self) -> PResult<T>) -> PResult<Vec<T>> {
        let mut items = Vec::new();
        if !self.check(TokenKind::Newline) {
            while !self.at_inline_end() {
                items.push(item(self)?);
            }
            return Ok(items);
        }

        self.skip_newlines();
        if !self.matches(TokenKind::Indent) {
            return Ok(items);
        }
        loop {
            while self.check(TokenKind::Newline) || self.check(TokenKind::Semicolon) {
                self.advance();
            }
            match self.peek_kind() {
                TokenKind::Dedent => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => break,
                TokenKind::Indent => return Err(self.error("unexpected indent")),
                _ => items.push(item(self)?),
            }
        }
        Ok(items)
    }

    fn at_inline_end(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Newline
                | TokenKind::Dedent
                | TokenKind::Eof
                | TokenKind::Elif
                | TokenKind::Else
                | TokenKind::Catch
                | TokenKind::Finally
        )
    }

    /// Whether `kind` continues the current compound statement, possibly on
    /// the next line. Newlines are only consumed on a match.
    fn at_clause(&mut self, kind: TokenKind) -> bool {
        let mut index = self.pos;
        while self.kind_at(index) == TokenKind::Newline {
            index += 1;
        }
        if self.kind_at(index) == kind {
            self.pos = index;
            true
        } else {
            false
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    // -----------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------

    fn parse_expression(&mut self) -> PResult<Expr> {
        self.nested(Self::parse_or)
    }

    // Each operator folded into a chain counts as one level of nesting,
    // since the resulting tree grows one node deeper.

    fn parse_or(&mut self) -> PResult<Expr> {
        let base = self.depth;
        let mut expr = self.parse_and()?;
        while self.matches(TokenKind::OrOr) || self.matches(TokenKind::Or) {
            self.descend()?;
            let right = self.parse_and()?;
            expr = Expr::binary(expr, BinaryOperator::Or, right);
        }
        self.depth = base;
        Ok(expr)
    }

    fn parse_and(&mut self) -> PResult<Expr> {
        let base = self.depth;
        let mut expr = self.parse_equality()?;
        while self.matches(TokenKind::AndAnd) || self.and_continues_expression() {
            self.descend()?;
            let right = self.parse_equality()?;
            expr = Expr::binary(expr, BinaryOperator::And, right);
        }
        self.depth = base;
        Ok(expr)
    }

    /// Word `and` is a logical operator except where it opens `and returns`.
    fn and_continues_expression(&mut self) -> bool {
        if self.check(TokenKind::And) && self.peek_kind_at(1) != TokenKind::Returns {
            self.advance();
            true
        } else {
            false
        }
    }

    fn parse_equality(&mut self) -> PResult<Expr> {
        let base = self.depth;
        let mut expr = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqualEqual | TokenKind::Equals => {
                    self.advance();
                    BinaryOperator::Eq
                }
                TokenKind::NotEqual => {
                    self.advance();
                    BinaryOperator::NotEq
                }
                // `is equals`, `is not`, `is not equals`, bare `is`
                TokenKind::Is => {
                    self.advance();
                    let op = if self.matches(TokenKind::Not) {
                        BinaryOperator::NotEq
                    } else {
                        BinaryOperator::Eq
                    };
                    self.matches(TokenKind::Equals);
                    op
                }
                _ => break,
            };
            self.descend()?;
            let right = self.parse_comparison()?;
            expr = Expr::binary(expr, op, right);
        }
        self.depth = base;
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> PResult<Expr> {
        let base = self.depth;
        let mut expr = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Is
                    if matches!(self.peek_kind_at(1), TokenKind::Less | TokenKind::Greater) =>
                {
                    self.advance();
                    self.parse_worded_comparison()?
                }
                TokenKind::Less | TokenKind::Greater => self.parse_worded_comparison()?,
                TokenKind::LessThan => {
                    self.advance();
                    BinaryOperator::Lt
                }
                TokenKind::GreaterThan => {
                    self.advance();
                    BinaryOperator::Gt
                }
                TokenKind::LessEqual => {
                    self.advance();
                    BinaryOperator::LtEq
                }
                TokenKind::GreaterEqual => {
                    self.advance();
                    BinaryOperator::GtEq
                }
                _ => break,
            };
            self.descend()?;
            let right = self.parse_additive()?;
            expr = Expr::binary(expr, op, right);
        }
        self.depth = base;
        Ok(expr)
    }

    /// `less than` / `greater than`.
    fn parse_worded_comparison(&mut self) -> PResult<BinaryOperator> {
        let op = if self.matches(TokenKind::Less) {
            BinaryOperator::Lt
        } else {
            self.expect(TokenKind::Greater, "expected 'less' or 'greater'")?;
            BinaryOperator::Gt
        };
        self.expect(TokenKind::Than, "expected 'than' in comparison")?;
        Ok(op)
    }

    fn parse_additive(&mut self) -> PResult<Expr> {
        let base = self.depth;
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Sub,
                _ => break,
            };
            // `x += 1` belongs to the statement level
            if self.peek_kind_at(1) == TokenKind::Assign {
                break;
            }
            self.advance();
            self.descend()?;
            let right = self.parse_multiplicative()?;
            expr = Expr::binary(expr, op, right);
        }
        self.depth = base;
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> PResult<Expr> {
        let base = self.depth;
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOperator::Mul,
                TokenKind::Slash => BinaryOperator::Div,
                TokenKind::Percent => BinaryOperator::Mod,
                _ => break,
            };
            if self.peek_kind_at(1) == TokenKind::Assign {
                break;
            }
            self.advance();
            self.descend()?;
            let right = self.parse_unary()?;
            expr = Expr::binary(expr, op, right);
        }
        self.depth = base;
        Ok(expr)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        let span = self.span();
        let op = match self.peek_kind() {
            TokenKind::Bang | TokenKind::Not => UnaryOperator::Not,
            TokenKind::Minus => UnaryOperator::Neg,
            TokenKind::Plus => UnaryOperator::Plus,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.nested(Self::parse_unary)?;
        Ok(Expr::Unary(UnaryOp {
            op,
            operand: Box::new(operand),
            span,
        }))
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let base = self.depth;
        let mut expr = self.parse_primary()?;
        loop {
            let span = self.span();
            if matches!(self.peek_kind(), TokenKind::Dot | TokenKind::LBracket) {
                self.descend()?;
            }
            if self.matches(TokenKind::Dot) {
                let name = self.expect_name("expected attribute name after '.'")?;
                if self.matches(TokenKind::LParen) {
                    let args = self.parse_arguments()?;
                    expr = Expr::Call(FunctionCall {
                        callee: name,
                        receiver: Some(Box::new(expr)),
                        args,
                        span,
                    });
                } else {
                    expr = Expr::Attribute(AttributeAccess {
                        object: Box::new(expr),
                        attribute: name,
                        span,
                    });
                }
            } else if self.matches(TokenKind::LBracket) {
                let index = self.parse_expression()?;
                self.expect(TokenKind::RBracket, "expected ']' after index")?;
                expr = Expr::Index(ArrayAccess {
                    array: Box::new(expr),
                    index: Box::new(index),
                    span,
                });
            } else {
                self.depth = base;
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let span = self.span();
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                let value = if token.lexeme.contains('.') {
                    token
                        .lexeme
                        .parse::<f64>()
                        .map(LiteralValue::Float)
                        .map_err(|_| CoreError::parse(span, format!("invalid number '{}'", token.lexeme)))?
                } else {
                    token.lexeme.parse::<i64>().map(LiteralValue::Int).map_err(|_| {
                        CoreError::parse(span, format!("integer literal '{}' is out of range", token.lexeme))
                    })?
                };
                Ok(Expr::Literal(Literal { value, span }))
            }
            TokenKind::Text => {
                self.advance();
                Ok(Expr::Literal(Literal {
                    value: LiteralValue::Text(token.lexeme),
                    span,
                }))
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                Ok(Expr::Literal(Literal {
                    value: LiteralValue::Bool(token.kind == TokenKind::True),
                    span,
                }))
            }
            TokenKind::This => {
                self.advance();
                let this = Expr::This(span);
                // natural member access: `this name`
                if self.check(TokenKind::Identifier) {
                    let attr_span = self.span();
                    let attribute = self.advance().lexeme;
                    return Ok(Expr::Attribute(AttributeAccess {
                        object: Box::new(this),
                        attribute,
                        span: attr_span,
                    }));
                }
                Ok(this)
            }
            TokenKind::New => {
                self.advance();
                let class_name = self.expect_name("expected class name after 'new'")?;
                let args = if self.matches(TokenKind::LParen) {
                    self.parse_arguments()?
                } else {
                    Vec::new()
                };
                Ok(Expr::New(NewExpression {
                    class_name,
                    args,
                    span,
                }))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "expected ')' after expression")?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.advance();
                let items = self.parse_sequence(TokenKind::RBracket, Self::parse_expression)?;
                Ok(Expr::List(ListLiteral { items, span }))
            }
            TokenKind::LBrace => {
                self.advance();
                let entries = self.parse_sequence(TokenKind::RBrace, |p| {
                    let key = p.parse_expression()?;
                    p.expect(TokenKind::Colon, "expected ':' after dictionary key")?;
                    Ok((key, p.parse_expression()?))
                })?;
                Ok(Expr::Dict(DictLiteral { entries, span }))
            }
            kind if kind == TokenKind::Identifier || is_soft_word(kind) => {
                self.advance();
                if self.matches(TokenKind::LParen) {
                    let args = self.parse_arguments()?;
                    return Ok(Expr::Call(FunctionCall {
                        callee: token.lexeme,
                        receiver: None,
                        args,
                        span,
                    }));
                }
                Ok(Expr::variable(token.lexeme, span))
            }
            _ => Err(self.error("expected expression")),
        }
    }

    /// Arguments after an opening `(`, through the closing `)`.
    fn parse_arguments(&mut self) -> PResult<Vec<Expr>> {
        self.parse_sequence(TokenKind::RParen, Self::parse_expression)
    }

    /// Comma separated items up to `close`, which is consumed. A trailing
    /// comma is allowed.
    fn parse_sequence<T>(
        &mut self,
        close: TokenKind,
        mut item: impl FnMut(&mut Self) -> PResult<T>,
    ) -> PResult<Vec<T>> {
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(item(self)?);
            if !self.matches(TokenKind::Comma) {
                break;
            }
        }
        let message = match close {
            TokenKind::RParen => "expected ')' after arguments",
            TokenKind::RBracket => "expected ']' after list items",
            _ => "expected '}' after dictionary entries",
        };
        self.expect(close, message)?;
        Ok(items)
    }

    // -----------------------------------------------------------------
    // Token helpers
    // -----------------------------------------------------------------

    fn kind_at(&self, index: usize) -> TokenKind {
        self.tokens
            .get(index)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.kind_at(self.pos)
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        self.kind_at(self.pos + offset)
    }

    fn span(&self) -> Span {
        self.peek().span
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> PResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(message))
        }
    }

    /// Whether the cursor is on something usable as a declared name.
    fn at_name(&self) -> bool {
        let kind = self.peek_kind();
        kind == TokenKind::Identifier || (kind.is_connective() && kind != TokenKind::This)
    }

    /// Names in declaration and member positions: identifiers, plus any
    /// connective word (`define function add ...`).
    fn expect_name(&mut self, message: &str) -> PResult<String> {
        if self.at_name() {
            Ok(self.advance().lexeme)
        } else {
            Err(self.error(message))
        }
    }

    /// Enter one more level of nesting, or fail once [`MAX_NESTING`] is
    /// reached.
    fn descend(&mut self) -> PResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(CoreError::parse(self.span(), NESTING_MESSAGE));
        }
        self.depth += 1;
        Ok(())
    }

    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        self.descend()?;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn error(&self, message: impl Into<String>) -> CoreError {
        let token = self.peek();
        let found = match token.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Indent => "indent".to_string(),
            TokenKind::Dedent => "dedent".to_string(),
            TokenKind::Text => format!("\"{}\"", token.lexeme),
            _ => format!("'{}'", token.lexeme),
        };
        CoreError::parse(token.span, format!("{}, found {found}", message.into()))
    }
}

enum Member {
    Field(VariableDecl),
    Method(FunctionDef),
    Constructor(ConstructorDef),
}

/// Connective words that read as plain names where an operand is expected.
fn is_soft_word(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        Add | Subtract
            | Multiply
            | Divide
            | Modulo
            | Each
            | With
            | Using
            | Call
            | The
            | Are
            | Takes
            | Returns
            | That
    )
}

fn check_target(expr: &Expr) -> PResult<()> {
    match expr {
        Expr::Variable(_) | Expr::Attribute(_) | Expr::Index(_) => Ok(()),
        other => Err(CoreError::parse(other.span(), "cannot assign to this expression")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::without_spans;

    fn parse_ok(src: &str) -> Program {
        parse_source(src).expect("source parses")
    }

    fn expr_of(src: &str) -> Expr {
        let program = parse_ok(src);
        match program.statements.into_iter().next() {
            Some(Stmt::Expression(expr)) => expr,
            other => panic!("expected an expression statement, got {other:?}"),
        }
    }

    #[test]
    fn parses_single_line_function() {
        let program = parse_ok(
            "define function add that takes a as Integer, b as Integer and returns Integer: return a + b",
        );
        let Some(Stmt::Function(f)) = program.statements.first() else {
            panic!("expected a function");
        };
        assert_eq!(f.name, "add");
        assert_eq!(f.params.len(), 2);
        assert_eq!(f.params[1].type_annotation, Some(TypeNode::named("Integer")));
        assert_eq!(f.return_type, Some(TypeNode::named("Integer")));
        assert!(matches!(
            f.body.as_slice(),
            [Stmt::Return(ReturnStatement { value: Some(Expr::Binary(_)), .. })]
        ));
    }

    #[test]
    fn inline_body_holds_several_statements() {
        let program = parse_ok("define function f: set x to 42 return x");
        let Some(Stmt::Function(f)) = program.statements.first() else {
            panic!("expected a function");
        };
        assert_eq!(f.body.len(), 2);
        assert!(matches!(f.body[0], Stmt::Assignment(_)));
        assert!(matches!(f.body[1], Stmt::Return(_)));
    }

    #[test]
    fn worded_and_symbolic_comparisons_agree() {
        let pairs = [
            ("a is less than b", "a < b"),
            ("a less than b", "a < b"),
            ("a is greater than b + 1", "a > b + 1"),
            ("a greater than b", "a > b"),
            ("a is equals b", "a == b"),
            ("a equals b", "a == b"),
            ("a is not b", "a != b"),
            ("not a and b or c", "!a && b || c"),
        ];
        for (worded, symbolic) in pairs {
            assert_eq!(
                without_spans(&expr_of(worded)),
                without_spans(&expr_of(symbolic)),
                "{worded} vs {symbolic}"
            );
        }
    }

    #[test]
    fn precedence_climbs_from_or_to_unary() {
        let expr = expr_of("a || b && c == d < e + f * -g");
        let Expr::Binary(or) = expr else { panic!("or at the root") };
        assert_eq!(or.op, BinaryOperator::Or);
        let Expr::Binary(and) = *or.right else { panic!("and under or") };
        assert_eq!(and.op, BinaryOperator::And);
        let Expr::Binary(eq) = *and.right else { panic!("== under and") };
        assert_eq!(eq.op, BinaryOperator::Eq);
        let Expr::Binary(lt) = *eq.right else { panic!("< under ==") };
        assert_eq!(lt.op, BinaryOperator::Lt);
        let Expr::Binary(add) = *lt.right else { panic!("+ under <") };
        assert_eq!(add.op, BinaryOperator::Add);
        let Expr::Binary(mul) = *add.right else { panic!("* under +") };
        assert_eq!(mul.op, BinaryOperator::Mul);
        assert!(matches!(*mul.right, Expr::Unary(UnaryOp { op: UnaryOperator::Neg, .. })));
    }

    #[test]
    fn compound_assignment_is_split_from_arithmetic() {
        let program = parse_ok("x += 2\ny = y - 1\nadd 3 to z\nsubtract 1 from w");
        let ops: Vec<AssignOp> = program
            .statements
            .iter()
            .map(|s| match s {
                Stmt::Assignment(a) => a.op,
                other => panic!("expected assignment, got {other:?}"),
            })
            .collect();
        assert_eq!(
            ops,
            vec![AssignOp::AddAssign, AssignOp::Assign, AssignOp::AddAssign, AssignOp::SubAssign]
        );
    }

    #[test]
    fn add_with_parentheses_is_a_call() {
        let expr = expr_of("add(1, 2)");
        assert!(matches!(expr, Expr::Call(FunctionCall { ref callee, .. }) if callee == "add"));
    }

    #[test]
    fn postfix_forms_chain() {
        let expr = expr_of("shop.items[0].name.upper()");
        let Expr::Call(call) = expr else { panic!("method call at the root") };
        assert_eq!(call.callee, "upper");
        let Some(receiver) = call.receiver else { panic!("receiver") };
        let Expr::Attribute(attr) = *receiver else { panic!("attribute") };
        assert_eq!(attr.attribute, "name");
        assert!(matches!(*attr.object, Expr::Index(_)));
    }

    #[test]
    fn indented_blocks_end_at_dedent() {
        let src = "\
if x is greater than 1:
    print(x)
    if y:
        print(y)
elif x == 0:
    print(0)
else:
    print(-1)
print(\"done\")
";
        let program = parse_ok(src);
        assert_eq!(program.statements.len(), 2);
        let Stmt::If(stmt) = &program.statements[0] else { panic!("if") };
        assert_eq!(stmt.then_body.len(), 2);
        assert_eq!(stmt.elif_branches.len(), 1);
        assert_eq!(stmt.else_body.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn sibling_definitions_do_not_absorb_each_other() {
        let src = "\
define class Shop:
    items as List<String>
    define constructor that takes owner as String:
        set this owner to owner
    define function count and returns Integer:
        return len(this.items)

define function main:
    create s = new Shop(\"me\")
";
        let program = parse_ok(src);
        assert_eq!(program.statements.len(), 2);
        let Stmt::Class(class) = &program.statements[0] else { panic!("class") };
        assert_eq!(class.fields.len(), 1);
        assert_eq!(class.fields[0].kind, DeclKind::Field);
        assert_eq!(class.constructors.len(), 1);
        assert_eq!(class.methods.len(), 1);
        let Stmt::Function(main) = &program.statements[1] else { panic!("function") };
        assert!(matches!(
            &main.body[0],
            Stmt::Variable(VariableDecl { initializer: Some(Expr::New(_)), .. })
        ));
    }

    #[test]
    fn modifiers_and_interfaces() {
        let src = "\
public define interface Shape:
    define function area and returns Float
define public final class Square extends Base implements Shape:
    private variable side as Float = 1.0
    define function area and returns Float:
        return this.side * this.side
";
        let program = parse_ok(src);
        let Stmt::Interface(shape) = &program.statements[0] else { panic!("interface") };
        assert_eq!(shape.visibility, Some(Visibility::Public));
        assert_eq!(shape.methods.len(), 1);
        assert!(shape.methods[0].body.is_empty());
        let Stmt::Class(square) = &program.statements[1] else { panic!("class") };
        assert!(square.modifiers.is_final);
        assert_eq!(square.superclasses, vec!["Base"]);
        assert_eq!(square.interfaces, vec!["Shape"]);
        assert_eq!(square.fields[0].modifiers.visibility, Some(Visibility::Private));
    }

    #[test]
    fn external_functions_and_imports() {
        let src = "\
import math as m
from collections import deque, Counter
external function sqrt(x as Float) from \"libm.so\" as Float
";
        let program = parse_ok(src);
        assert_eq!(program.imports.len(), 2);
        assert_eq!(program.imports[0].alias.as_deref(), Some("m"));
        assert_eq!(program.imports[1].names, vec!["deque", "Counter"]);
        let Stmt::External(ext) = &program.statements[0] else { panic!("external") };
        assert_eq!(ext.library, "libm.so");
        assert_eq!(ext.return_type, TypeNode::named("Float"));
    }

    #[test]
    fn types_carry_generics_arrays_and_nullability() {
        let program = parse_ok("variable m as Map<String, Integer[]>?");
        let Stmt::Variable(decl) = &program.statements[0] else { panic!("variable") };
        let ty = decl.type_annotation.as_ref().expect("annotated");
        assert!(ty.is_nullable);
        assert!(!ty.is_array);
        assert_eq!(ty.generic_args.len(), 2);
        assert!(ty.generic_args[1].is_array);
    }

    #[test]
    fn create_accepts_literal_after_as() {
        let program = parse_ok("create total as 0\ncreate name as String = \"x\"\nconstant LIMIT = 10");
        let decls: Vec<&VariableDecl> = program
            .statements
            .iter()
            .filter_map(|s| match s {
                Stmt::Variable(v) => Some(v),
                _ => None,
            })
            .collect();
        assert!(decls[0].type_annotation.is_none());
        assert!(decls[0].initializer.is_some());
        assert_eq!(decls[1].type_annotation, Some(TypeNode::named("String")));
        assert!(decls[2].is_constant());
    }

    #[test]
    fn loops_and_exceptions() {
        let src = "\
for each item in items:
    if item is less than 0: continue
    print(item)
while true: break
try:
    risky()
catch ValueError e:
    print(e)
finally:
    cleanup()
throw new Error(\"x\")
";
        let program = parse_ok(src);
        assert!(matches!(program.statements[0], Stmt::For(_)));
        assert!(matches!(program.statements[1], Stmt::While(_)));
        let Stmt::TryCatch(t) = &program.statements[2] else { panic!("try") };
        assert_eq!(t.catches[0].binding.as_deref(), Some("e"));
        assert!(t.finally.is_some());
        assert!(matches!(program.statements[3], Stmt::Throw(_)));
    }

    #[test]
    fn else_if_is_elif() {
        let a = parse_ok("if a: x()\nelse if b: y()\nelse: z()");
        let b = parse_ok("if a: x()\nelif b: y()\nelse: z()");
        assert_eq!(without_spans(&a), without_spans(&b));
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        let parens = format!("create x = {}1{}", "(".repeat(1000), ")".repeat(1000));
        let err = parse_source(&parens).expect_err("too deep");
        assert!(
            matches!(&err, CoreError::ParseError { message, .. } if message == NESTING_MESSAGE),
            "{err:?}"
        );

        let negations = format!("create y = {}1", "-".repeat(500));
        assert!(parse_source(&negations).is_err());

        let chain = vec!["1"; 500].join(" + ");
        assert!(parse_source(&format!("create z = {chain}")).is_err());

        let mut blocks = String::new();
        for level in 0..200 {
            blocks.push_str(&"    ".repeat(level));
            blocks.push_str("if a:\n");
        }
        blocks.push_str(&"    ".repeat(200));
        blocks.push_str("b()\n");
        assert!(parse_source(&blocks).is_err());
    }

    #[test]
    fn moderate_nesting_still_parses() {
        let parens = format!("create x = {}1{}", "(".repeat(20), ")".repeat(20));
        assert!(matches!(
            &parse_ok(&parens).statements[0],
            Stmt::Variable(decl) if decl.initializer.is_some()
        ));
        let chain = vec!["a"; 30].join(" + ");
        parse_ok(&format!("print({chain})"));
    }

    #[test]
    fn errors_name_the_offending_token() {
        let err = parse_source("define function: return 1").expect_err("missing name");
        match err {
            CoreError::ParseError { line, column, message } => {
                assert_eq!((line, column), (1, 16));
                assert!(message.contains("expected function name"), "{message}");
                assert!(message.contains("':'"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(parse_source("set 1 + 2 to x").is_err());
        assert!(parse_source("define thing").is_err());
    }
}
