//! Surface syntax tree for AGK.
//!
//! Every node owns its children; there is no sharing and no back edges.
//! `Program` is the only root. Spans are part of equality, so two trees
//! parsed from differently laid out source compare unequal even when they
//! have the same shape.

use core::fmt;

use crate::span::Span;

/// Root of a parsed compilation unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub imports: Vec<Import>,
    pub statements: Vec<Stmt>,
}

/// `import m [as a]` or `from m import x, y [as a]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub module: String,
    pub alias: Option<String>,
    /// Names listed after `from m import`; empty for a whole-module import.
    pub names: Vec<String>,
    pub span: Span,
}

/// A written type annotation. Resolution to a semantic type happens in
/// [`crate::types::Type::from_annotation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNode {
    pub name: String,
    pub is_array: bool,
    pub is_nullable: bool,
    pub generic_args: Vec<TypeNode>,
}

impl TypeNode {
    pub fn named(name: impl Into<String>) -> Self {
        TypeNode {
            name: name.into(),
            is_array: false,
            is_nullable: false,
            generic_args: Vec::new(),
        }
    }
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.generic_args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.generic_args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        if self.is_array {
            f.write_str("[]")?;
        }
        if self.is_nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub type_annotation: Option<TypeNode>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
    Protected,
}

impl Visibility {
    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Protected => "protected",
        }
    }
}

/// Modifier keywords written before a definition. Visibility stays `None`
/// when the source did not spell one out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub visibility: Option<Visibility>,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
}

impl Modifiers {
    pub fn is_empty(&self) -> bool {
        *self == Modifiers::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: Option<TypeNode>,
    pub body: Vec<Stmt>,
    pub modifiers: Modifiers,
    pub span: Span,
}

/// `external function NAME(params) from "library" as Type`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalFunctionDef {
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: TypeNode,
    pub library: String,
    pub visibility: Option<Visibility>,
    pub span: Span,
}

impl ExternalFunctionDef {
    /// The descriptive registration string handed to the foreign-function
    /// loader, e.g. `external function sqrt(x as Float) from "libm.so" as Float`.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| match &p.type_annotation {
                Some(ty) => format!("{} as {}", p.name, ty),
                None => p.name.clone(),
            })
            .collect();
        format!(
            "external function {}({}) from \"{}\" as {}",
            self.name,
            params.join(", "),
            self.library,
            self.return_type
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub superclasses: Vec<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<VariableDecl>,
    pub methods: Vec<FunctionDef>,
    pub constructors: Vec<ConstructorDef>,
    pub modifiers: Modifiers,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDef {
    pub params: Vec<Parameter>,
    pub body: Vec<Stmt>,
    pub visibility: Option<Visibility>,
    pub span: Span,
}

/// Interface methods are signatures only; their bodies are always empty.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDef {
    pub name: String,
    pub methods: Vec<FunctionDef>,
    pub visibility: Option<Visibility>,
    pub span: Span,
}

/// Which surface form introduced a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    /// `create x as T`
    Create,
    /// `variable x as T`
    Variable,
    /// `constant x as T = e`
    Constant,
    /// `x as T` directly inside a class body
    Field,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    pub type_annotation: Option<TypeNode>,
    pub initializer: Option<Expr>,
    pub kind: DeclKind,
    pub modifiers: Modifiers,
    pub span: Span,
}

impl VariableDecl {
    pub fn is_constant(&self) -> bool {
        self.kind == DeclKind::Constant
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::ModAssign => "%=",
        }
    }

    /// The arithmetic operator a compound assignment applies.
    pub fn binary(self) -> Option<BinaryOperator> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(BinaryOperator::Add),
            AssignOp::SubAssign => Some(BinaryOperator::Sub),
            AssignOp::MulAssign => Some(BinaryOperator::Mul),
            AssignOp::DivAssign => Some(BinaryOperator::Div),
            AssignOp::ModAssign => Some(BinaryOperator::Mod),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Expr,
    pub op: AssignOp,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElifBranch {
    pub condition: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expr,
    pub then_body: Vec<Stmt>,
    pub elif_branches: Vec<ElifBranch>,
    pub else_body: Option<Vec<Stmt>>,
    pub span: Span,
}

/// `for each NAME in EXPR:`; a single binding, no destructuring.
#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    pub iterator: String,
    pub iterable: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub exception_type: String,
    pub binding: Option<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryCatchStatement {
    pub body: Vec<Stmt>,
    pub catches: Vec<CatchClause>,
    pub finally: Option<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStatement {
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Function(FunctionDef),
    External(ExternalFunctionDef),
    Class(ClassDef),
    Interface(InterfaceDef),
    Variable(VariableDecl),
    Assignment(Assignment),
    If(IfStatement),
    For(ForStatement),
    While(WhileStatement),
    Return(ReturnStatement),
    Break(Span),
    Continue(Span),
    TryCatch(TryCatchStatement),
    Throw(ThrowStatement),
    Expression(Expr),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Function(f) => f.span,
            Stmt::External(e) => e.span,
            Stmt::Class(c) => c.span,
            Stmt::Interface(i) => i.span,
            Stmt::Variable(v) => v.span,
            Stmt::Assignment(a) => a.span,
            Stmt::If(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Break(span) | Stmt::Continue(span) => *span,
            Stmt::TryCatch(s) => s.span,
            Stmt::Throw(s) => s.span,
            Stmt::Expression(e) => e.span(),
        }
    }

    /// Definitions hoisted out of the executable body by the emitters.
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            Stmt::Function(_) | Stmt::External(_) | Stmt::Class(_) | Stmt::Interface(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Eq => "==",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Gt => ">",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }

    /// Binding strength, higher binds tighter. Mirrors the parser's
    /// precedence ladder.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Eq | BinaryOperator::NotEq => 3,
            BinaryOperator::Lt | BinaryOperator::Gt | BinaryOperator::LtEq | BinaryOperator::GtEq => 4,
            BinaryOperator::Add | BinaryOperator::Sub => 5,
            BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod => 6,
        }
    }

    pub fn is_arithmetic(self) -> bool {
        self.precedence() >= 5
    }

    pub fn is_comparison(self) -> bool {
        matches!(self.precedence(), 3 | 4)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Neg,
    Plus,
    Not,
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Neg => "-",
            UnaryOperator::Plus => "+",
            UnaryOperator::Not => "!",
        }
    }
}

/// Precedence of unary operands, above every binary operator.
pub const UNARY_PRECEDENCE: u8 = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub left: Box<Expr>,
    pub op: BinaryOperator,
    pub right: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOp {
    pub op: UnaryOperator,
    pub operand: Box<Expr>,
    pub span: Span,
}

/// `name(args)` or, with a receiver, `receiver.name(args)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub callee: String,
    pub receiver: Option<Box<Expr>>,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeAccess {
    pub object: Box<Expr>,
    pub attribute: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayAccess {
    pub array: Box<Expr>,
    pub index: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

/// Float spelling that always reads back as a float (`3.0`, not `3`).
pub fn float_text(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListLiteral {
    pub items: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DictLiteral {
    pub entries: Vec<(Expr, Expr)>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExpression {
    pub class_name: String,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary(BinaryOp),
    Unary(UnaryOp),
    Call(FunctionCall),
    Attribute(AttributeAccess),
    Index(ArrayAccess),
    Literal(Literal),
    Variable(Variable),
    This(Span),
    List(ListLiteral),
    Dict(DictLiteral),
    New(NewExpression),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Binary(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Attribute(e) => e.span,
            Expr::Index(e) => e.span,
            Expr::Literal(e) => e.span,
            Expr::Variable(e) => e.span,
            Expr::This(span) => *span,
            Expr::List(e) => e.span,
            Expr::Dict(e) => e.span,
            Expr::New(e) => e.span,
        }
    }

    /// Precedence of the expression as an operand, used to decide where
    /// parentheses are needed when rendering text.
    pub fn precedence(&self) -> u8 {
        match self {
            Expr::Binary(b) => b.op.precedence(),
            Expr::Unary(_) => UNARY_PRECEDENCE,
            _ => UNARY_PRECEDENCE + 1,
        }
    }

    pub fn variable(name: impl Into<String>, span: Span) -> Self {
        Expr::Variable(Variable {
            name: name.into(),
            span,
        })
    }

    pub fn int(value: i64, span: Span) -> Self {
        Expr::Literal(Literal {
            value: LiteralValue::Int(value),
            span,
        })
    }

    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        let span = left.span();
        Expr::Binary(BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
            span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::without_spans;

    #[test]
    fn equality_includes_positions_but_shape_does_not() {
        let a = Expr::variable("x", Span::new(1, 1));
        let b = Expr::variable("x", Span::new(9, 4));
        assert_ne!(a, b);
        assert_eq!(without_spans(&a), without_spans(&b));
        assert_ne!(without_spans(&a), without_spans(&Expr::variable("y", Span::new(1, 1))));
    }

    #[test]
    fn type_nodes_render_in_source_spelling() {
        let ty = TypeNode {
            name: "Map".into(),
            is_array: true,
            is_nullable: true,
            generic_args: vec![TypeNode::named("String"), TypeNode::named("Integer")],
        };
        assert_eq!(ty.to_string(), "Map<String, Integer>[]?");
    }

    #[test]
    fn external_signature_lists_typed_parameters() {
        let ext = ExternalFunctionDef {
            name: "sqrt".into(),
            params: vec![Parameter {
                name: "x".into(),
                type_annotation: Some(TypeNode::named("Float")),
                span: Span::default(),
            }],
            return_type: TypeNode::named("Float"),
            library: "libm.so".into(),
            visibility: None,
            span: Span::default(),
        };
        assert_eq!(
            ext.signature(),
            "external function sqrt(x as Float) from \"libm.so\" as Float"
        );
    }

    #[test]
    fn floats_keep_a_decimal_point() {
        assert_eq!(float_text(3.0), "3.0");
        assert_eq!(float_text(2.5), "2.5");
    }
}
