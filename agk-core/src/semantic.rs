//! Scoped semantic analysis.
//!
//! Analysis runs in two passes over one [`Program`]. The first registers
//! every top-level function, external, class and interface in the global
//! scope, so definitions may refer to each other in any order. The second
//! walks every statement, opening a child scope for each function, class,
//! loop and catch body.
//!
//! Nothing here aborts: every problem becomes a [`Diagnostic`] in a bounded
//! collector and the walk continues. A name reported as undeclared is bound
//! to a placeholder symbol so that later references to it stay quiet.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::ast::*;
use crate::builtins::{BUILTINS, find_builtin};
use crate::diagnostic::{Category, DEFAULT_MAX_ERRORS, Diagnostic, Diagnostics};
use crate::printer::print_expr;
use crate::scope::{ScopeId, ScopeKind, ScopeTree, Symbol, SymbolRole};
use crate::span::Span;
use crate::types::{Type, binary_result, is_compatible, unary_result};
use crate::visit;

const TYPE_MISMATCH_HINT: &str = "check the types of your variables and function return values";
const CONSTANT_HINT: &str = "declare it with 'variable' instead of 'constant' if it needs to change";

/// Outcome of analyzing one program. Analysis succeeds iff no error was
/// recorded; warnings never affect success.
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    /// Errors found after the limit was reached.
    pub suppressed: usize,
    /// Builtins actually called, in first-use order. A user definition that
    /// shadows a builtin does not count.
    pub used_builtins: Vec<&'static str>,
}

impl AnalysisReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.suppressed == 0
    }
}

pub fn analyze(program: &Program) -> AnalysisReport {
    analyze_with_limit(program, DEFAULT_MAX_ERRORS)
}

/// Analyze `program`, storing at most `max_errors` errors.
pub fn analyze_with_limit(program: &Program, max_errors: usize) -> AnalysisReport {
    let mut analyzer = Analyzer::new(max_errors);
    analyzer.declare_imports(&program.imports);
    for stmt in &program.statements {
        analyzer.declare_definition(stmt);
    }
    for stmt in &program.statements {
        if stmt.is_declaration() {
            analyzer.analyze_definition(stmt);
        } else {
            analyzer.analyze_stmt(stmt);
        }
    }
    let report = analyzer.finish();
    debug!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        suppressed = report.suppressed,
        "semantic analysis finished"
    );
    report
}

fn semantic_error(code: &'static str, span: Span, message: impl Into<String>) -> Diagnostic {
    Diagnostic::error(Category::Semantic, message)
        .with_code(code)
        .with_location(span)
}

fn type_error(code: &'static str, span: Span, message: impl Into<String>) -> Diagnostic {
    Diagnostic::error(Category::Type, message)
        .with_code(code)
        .with_location(span)
}

fn annotation(node: Option<&TypeNode>) -> Option<Type> {
    node.map(Type::from_annotation)
}

/// What calling `function` produces. Untyped functions that return a value
/// somewhere are treated as returning `any`.
fn function_return_type(function: &FunctionDef) -> Type {
    match &function.return_type {
        Some(ty) => Type::from_annotation(ty),
        None if visit::returns_value(&function.body) => Type::Any,
        None => Type::Void,
    }
}

#[derive(Debug, Default)]
struct ClassInfo {
    superclasses: Vec<String>,
    fields: HashMap<String, Option<Type>>,
    methods: HashMap<String, Type>,
}

enum Member {
    Field(Option<Type>),
    Method(Type),
    Missing,
    /// The class inherits from something the analyzer cannot see.
    Unknown,
}

struct FunctionContext {
    name: String,
    return_type: Option<Type>,
}

struct Analyzer {
    scopes: ScopeTree,
    global: ScopeId,
    current: ScopeId,
    diagnostics: Diagnostics,
    classes: HashMap<String, ClassInfo>,
    functions: Vec<FunctionContext>,
    used_builtins: Vec<&'static str>,
}

impl Analyzer {
    fn new(max_errors: usize) -> Self {
        let mut scopes = ScopeTree::new();
        let prelude = scopes.prelude();
        for builtin in BUILTINS {
            let symbol = Symbol::new(builtin.name, SymbolRole::Builtin, Span::default())
                .with_type(Some(builtin.kind.return_type()));
            // Builtin names are unique, so this cannot collide.
            let _ = scopes.declare(prelude, symbol);
        }
        let global = scopes.push(prelude, ScopeKind::Global, "global");
        Analyzer {
            scopes,
            global,
            current: global,
            diagnostics: Diagnostics::with_limit(max_errors),
            classes: HashMap::new(),
            functions: Vec::new(),
            used_builtins: Vec::new(),
        }
    }

    fn finish(self) -> AnalysisReport {
        let (errors, warnings, suppressed) = self.diagnostics.into_parts();
        AnalysisReport {
            errors,
            warnings,
            suppressed,
            used_builtins: self.used_builtins,
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    // -----------------------------------------------------------------
    // Scopes
    // -----------------------------------------------------------------

    fn enter(&mut self, kind: ScopeKind, name: &str) -> ScopeId {
        trace!(scope = name, "enter scope");
        self.current = self.scopes.push(self.current, kind, name);
        self.current
    }

    /// Leave the current scope, warning about variables nobody read.
    fn exit(&mut self) {
        let scope = self.current;
        if matches!(
            self.scopes.kind(scope),
            ScopeKind::Function | ScopeKind::Loop | ScopeKind::Block
        ) {
            let unused: Vec<(String, Span)> = self
                .scopes
                .symbols(scope)
                .iter()
                .filter(|s| s.role == SymbolRole::Variable && !s.used && !s.placeholder)
                .map(|s| (s.name.clone(), s.span))
                .collect();
            for (name, span) in unused {
                self.report(
                    Diagnostic::warning(
                        Category::Semantic,
                        format!("variable '{name}' is declared but never used"),
                    )
                    .with_code("W0002")
                    .with_location(span),
                );
            }
        }
        self.current = self.scopes.parent(scope).unwrap_or(self.global);
    }

    /// Where a redeclaration happened, for messages.
    fn place(&self) -> String {
        match self.scopes.kind(self.current) {
            ScopeKind::Class => format!("class '{}'", self.scopes.name(self.current)),
            ScopeKind::Function => format!("function '{}'", self.scopes.name(self.current)),
            _ => "this scope".to_string(),
        }
    }

    fn declare(&mut self, symbol: Symbol, what: &str) {
        let name = symbol.name.clone();
        let span = symbol.span;
        if let Err(previous) = self.scopes.declare(self.current, symbol) {
            let message = format!("{what} '{name}' is already declared in {}", self.place());
            self.report(
                semantic_error("E0201", span, message).with_suggestion(format!(
                    "rename it or remove the earlier declaration at line {}",
                    previous.line
                )),
            );
        }
    }

    /// Bind an undeclared name in the enclosing function, class or global
    /// scope, so it stays bound after the current loop or catch body ends.
    fn declare_placeholder(&mut self, name: &str, role: SymbolRole, span: Span) {
        let owner = self.scopes.enclosing_owner(self.current);
        // The name was just looked up and not found, so it is free there.
        let _ = self
            .scopes
            .declare(owner, Symbol::new(name, role, span).placeholder());
    }

    // -----------------------------------------------------------------
    // Declarations
    // -----------------------------------------------------------------

    fn declare_imports(&mut self, imports: &[Import]) {
        for import in imports {
            let mut bound = Vec::new();
            if import.names.is_empty() {
                let head = import.module.split('.').next().unwrap_or(&import.module);
                bound.push(import.alias.clone().unwrap_or_else(|| head.to_string()));
            } else if let (Some(alias), [_]) = (&import.alias, import.names.as_slice()) {
                bound.push(alias.clone());
            } else {
                bound.extend(import.names.iter().cloned());
            }
            for name in bound {
                let symbol = Symbol::new(name, SymbolRole::Imported, import.span);
                self.declare(symbol, "imported name");
            }
        }
    }

    /// Bind a definition's name in the current scope without looking at its
    /// body.
    fn declare_definition(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Function(function) => {
                let mut symbol = Symbol::new(&function.name, SymbolRole::Function, function.span)
                    .with_type(Some(function_return_type(function)));
                symbol.visibility = function.modifiers.visibility;
                self.declare(symbol, "function");
            }
            Stmt::External(external) => {
                let mut symbol = Symbol::new(&external.name, SymbolRole::Function, external.span)
                    .with_type(Some(Type::from_annotation(&external.return_type)));
                symbol.visibility = external.visibility;
                self.declare(symbol, "function");
            }
            Stmt::Class(class) => {
                self.register_class(class);
                let mut symbol = Symbol::new(&class.name, SymbolRole::Class, class.span)
                    .with_type(Some(Type::Named(class.name.clone())));
                symbol.visibility = class.modifiers.visibility;
                self.declare(symbol, "class");
            }
            Stmt::Interface(interface) => {
                let mut symbol = Symbol::new(&interface.name, SymbolRole::Interface, interface.span);
                symbol.visibility = interface.visibility;
                self.declare(symbol, "interface");
            }
            _ => {}
        }
    }

    fn register_class(&mut self, class: &ClassDef) {
        let mut info = ClassInfo {
            superclasses: class.superclasses.clone(),
            ..ClassInfo::default()
        };
        for field in &class.fields {
            info.fields
                .insert(field.name.clone(), annotation(field.type_annotation.as_ref()));
        }
        for method in &class.methods {
            info.methods
                .insert(method.name.clone(), function_return_type(method));
        }
        self.classes.insert(class.name.clone(), info);
    }

    fn analyze_definition(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Function(function) => self.analyze_function(function),
            Stmt::External(external) => self.check_parameters(&external.name, &external.params),
            Stmt::Class(class) => self.analyze_class(class),
            Stmt::Interface(interface) => {
                for method in &interface.methods {
                    self.check_parameters(&method.name, &method.params);
                }
            }
            _ => {}
        }
    }

    /// Duplicate parameter check for signatures that have no body scope.
    fn check_parameters(&mut self, owner: &str, params: &[Parameter]) {
        let mut seen = HashSet::new();
        for param in params {
            if !seen.insert(param.name.as_str()) {
                self.report(semantic_error(
                    "E0201",
                    param.span,
                    format!("parameter '{}' is already declared in function '{owner}'", param.name),
                ));
            }
        }
    }

    fn analyze_function(&mut self, function: &FunctionDef) {
        self.analyze_callable(
            &function.name,
            &function.params,
            &function.body,
            annotation(function.return_type.as_ref()),
        );
    }

    fn analyze_callable(
        &mut self,
        name: &str,
        params: &[Parameter],
        body: &[Stmt],
        return_type: Option<Type>,
    ) {
        let scope = self.enter(ScopeKind::Function, name);
        for param in params {
            let symbol = Symbol::new(&param.name, SymbolRole::Parameter, param.span)
                .with_type(annotation(param.type_annotation.as_ref()));
            if self.scopes.declare(scope, symbol).is_err() {
                self.report(semantic_error(
                    "E0201",
                    param.span,
                    format!("parameter '{}' is already declared in function '{name}'", param.name),
                ));
            }
        }
        self.functions.push(FunctionContext {
            name: name.to_string(),
            return_type,
        });
        self.analyze_block(body);
        self.functions.pop();
        self.exit();
    }

    fn analyze_class(&mut self, class: &ClassDef) {
        for parent in &class.superclasses {
            self.expect_type_name(parent, SymbolRole::Class, class.span);
        }
        for interface in &class.interfaces {
            self.expect_type_name(interface, SymbolRole::Interface, class.span);
        }

        self.enter(ScopeKind::Class, &class.name);
        for field in &class.fields {
            let mut symbol = Symbol::new(&field.name, SymbolRole::Variable, field.span)
                .with_type(annotation(field.type_annotation.as_ref()));
            symbol.is_constant = field.is_constant();
            symbol.visibility = field.modifiers.visibility;
            self.declare(symbol, "field");
        }
        for method in &class.methods {
            let mut symbol = Symbol::new(&method.name, SymbolRole::Function, method.span)
                .with_type(Some(function_return_type(method)));
            symbol.visibility = method.modifiers.visibility;
            self.declare(symbol, "method");
        }
        for field in &class.fields {
            if let Some(init) = &field.initializer {
                let actual = self.expr_type(init);
                self.check_initializer(field, &actual, init.span());
            }
        }
        for constructor in &class.constructors {
            self.analyze_callable("constructor", &constructor.params, &constructor.body, None);
        }
        for method in &class.methods {
            self.analyze_function(method);
        }
        self.exit();
    }

    /// `extends`/`implements` targets must name a class or interface.
    fn expect_type_name(&mut self, name: &str, want: SymbolRole, span: Span) {
        let role = self.scopes.lookup(self.current, name).map(|s| s.role);
        match role {
            None => self.report(
                semantic_error("E0200", span, format!("{} '{name}' is not declared", want.describe()))
                    .with_suggestion(format!("define '{name}' or import it")),
            ),
            Some(role) if role == want || role == SymbolRole::Imported => {}
            Some(role) => self.report(semantic_error(
                "E0202",
                span,
                format!("'{name}' is a {}, not a {}", role.describe(), want.describe()),
            )),
        }
    }

    // -----------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------

    fn analyze_block(&mut self, body: &[Stmt]) {
        for stmt in body {
            self.analyze_stmt(stmt);
        }
    }

    fn analyze_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Function(_) | Stmt::External(_) | Stmt::Class(_) | Stmt::Interface(_) => {
                self.declare_definition(stmt);
                self.analyze_definition(stmt);
            }
            Stmt::Variable(decl) => self.analyze_variable(decl),
            Stmt::Assignment(assignment) => self.analyze_assignment(assignment),
            Stmt::If(s) => {
                self.check_condition("if", &s.condition);
                self.analyze_block(&s.then_body);
                for branch in &s.elif_branches {
                    self.check_condition("elif", &branch.condition);
                    self.analyze_block(&branch.body);
                }
                if let Some(body) = &s.else_body {
                    self.analyze_block(body);
                }
            }
            Stmt::For(s) => {
                let iterable = self.expr_type(&s.iterable);
                if matches!(iterable, Type::Int | Type::Float | Type::Bool | Type::Void) {
                    self.report(type_error(
                        "E0206",
                        s.iterable.span(),
                        format!("cannot iterate over a value of type '{iterable}'"),
                    ));
                }
                self.enter(ScopeKind::Loop, "for");
                self.declare(Symbol::new(&s.iterator, SymbolRole::Binding, s.span), "variable");
                self.analyze_block(&s.body);
                self.exit();
            }
            Stmt::While(s) => {
                self.check_condition("while", &s.condition);
                self.enter(ScopeKind::Loop, "while");
                self.analyze_block(&s.body);
                self.exit();
            }
            Stmt::Return(r) => self.analyze_return(r),
            Stmt::Break(span) => self.check_in_loop("break", *span),
            Stmt::Continue(span) => self.check_in_loop("continue", *span),
            Stmt::TryCatch(t) => {
                self.analyze_block(&t.body);
                for clause in &t.catches {
                    self.enter(ScopeKind::Block, "catch");
                    if let Some(binding) = &clause.binding {
                        let symbol = Symbol::new(binding, SymbolRole::Binding, clause.span)
                            .with_type(Some(Type::Named(clause.exception_type.clone())));
                        self.declare(symbol, "variable");
                    }
                    self.analyze_block(&clause.body);
                    self.exit();
                }
                if let Some(body) = &t.finally {
                    self.analyze_block(body);
                }
            }
            Stmt::Throw(t) => {
                self.expr_type(&t.value);
            }
            Stmt::Expression(expr) => {
                self.expr_type(expr);
            }
        }
    }

    fn analyze_variable(&mut self, decl: &VariableDecl) {
        if let Some(init) = &decl.initializer {
            let actual = self.expr_type(init);
            self.check_initializer(decl, &actual, init.span());
        }
        let mut symbol = Symbol::new(&decl.name, SymbolRole::Variable, decl.span)
            .with_type(annotation(decl.type_annotation.as_ref()));
        symbol.is_constant = decl.is_constant();
        symbol.visibility = decl.modifiers.visibility;
        symbol.initialized = decl.initializer.is_some();
        let what = if decl.is_constant() { "constant" } else { "variable" };
        self.declare(symbol, what);
    }

    fn check_initializer(&mut self, decl: &VariableDecl, actual: &Type, span: Span) {
        let Some(expected) = annotation(decl.type_annotation.as_ref()) else {
            return;
        };
        if !is_compatible(actual, &expected) {
            self.report(
                type_error(
                    "E0204",
                    span,
                    format!(
                        "cannot initialize '{}' of type '{expected}' with a value of type '{actual}'",
                        decl.name
                    ),
                )
                .with_suggestion(TYPE_MISMATCH_HINT),
            );
        }
    }

    fn analyze_assignment(&mut self, assignment: &Assignment) {
        let value = self.expr_type(&assignment.value);
        match &assignment.target {
            Expr::Variable(target) => self.assign_variable(target, assignment.op, value),
            Expr::Attribute(target) => {
                let object = self.expr_type(&target.object);
                let expected = match &object {
                    Type::Named(class) => match self.class_member(class, &target.attribute) {
                        Member::Field(ty) => ty,
                        _ => None,
                    },
                    _ => None,
                };
                let described = print_expr(&assignment.target);
                self.check_assigned(&described, expected, assignment.op, value, target.span);
            }
            other => {
                let expected = self.expr_type(other);
                let described = print_expr(other);
                self.check_assigned(&described, Some(expected), assignment.op, value, other.span());
            }
        }
    }

    fn assign_variable(&mut self, target: &Variable, op: AssignOp, value: Type) {
        let found = self.scopes.lookup(self.current, &target.name).map(|s| {
            (s.role, s.is_constant, s.ty.clone(), s.initialized, s.placeholder)
        });
        let Some((role, is_constant, ty, initialized, placeholder)) = found else {
            self.report(
                semantic_error(
                    "E0200",
                    target.span,
                    format!("variable '{}' is not declared", target.name),
                )
                .with_suggestion(format!(
                    "declare '{0}' with 'create {0} as Type' before using it",
                    target.name
                )),
            );
            self.declare_placeholder(&target.name, SymbolRole::Variable, target.span);
            return;
        };
        if placeholder {
            return;
        }
        if !role.is_value() || role == SymbolRole::Imported {
            self.report(semantic_error(
                "E0203",
                target.span,
                format!("cannot assign to {} '{}'", role.describe(), target.name),
            ));
            return;
        }
        if is_constant {
            self.report(
                semantic_error(
                    "E0203",
                    target.span,
                    format!("cannot assign to constant '{}'", target.name),
                )
                .with_suggestion(CONSTANT_HINT),
            );
            return;
        }
        if op != AssignOp::Assign && !initialized {
            self.warn_uninitialized(&target.name, target.span);
        }
        self.check_assigned(&target.name, ty, op, value, target.span);
        if let Some(symbol) = self.scopes.lookup_mut(self.current, &target.name) {
            symbol.initialized = true;
            if op != AssignOp::Assign {
                symbol.used = true;
            }
        }
    }

    /// Type check of `target op value` against the target's declared type.
    fn check_assigned(
        &mut self,
        target: &str,
        expected: Option<Type>,
        op: AssignOp,
        value: Type,
        span: Span,
    ) {
        let stored = match op.binary() {
            None => value,
            Some(binary) => {
                let current = expected.clone().unwrap_or(Type::Any);
                match binary_result(&current, binary, &value) {
                    Some(result) => result,
                    None => {
                        self.report(type_error(
                            "E0206",
                            span,
                            format!("invalid operation: {current} {} {value}", op.symbol()),
                        ));
                        return;
                    }
                }
            }
        };
        if let Some(expected) = expected {
            if !is_compatible(&stored, &expected) {
                self.report(
                    type_error(
                        "E0204",
                        span,
                        format!(
                            "cannot assign value of type '{stored}' to '{target}' of type '{expected}'"
                        ),
                    )
                    .with_suggestion(TYPE_MISMATCH_HINT),
                );
            }
        }
    }

    fn check_condition(&mut self, construct: &str, condition: &Expr) {
        let ty = self.expr_type(condition);
        if !matches!(ty, Type::Bool | Type::Any) {
            self.report(
                type_error(
                    "E0205",
                    condition.span(),
                    format!("{construct} condition must be boolean, got {ty}"),
                )
                .with_suggestion("compare the value explicitly, e.g. 'x is greater than 0'"),
            );
        }
    }

    fn analyze_return(&mut self, ret: &ReturnStatement) {
        let actual = ret.value.as_ref().map(|value| self.expr_type(value));
        let Some(context) = self.functions.last() else {
            self.report(semantic_error("E0207", ret.span, "'return' used outside of a function"));
            return;
        };
        let name = context.name.clone();
        let declared = context.return_type.clone();
        match (declared, actual) {
            (Some(Type::Void), Some(actual)) if actual != Type::Void => {
                self.report(type_error(
                    "E0204",
                    ret.span,
                    format!("function '{name}' is declared to return nothing but returns '{actual}'"),
                ));
            }
            (Some(expected), None) if expected != Type::Void => {
                self.report(type_error(
                    "E0204",
                    ret.span,
                    format!("function '{name}' must return a value of type '{expected}'"),
                ));
            }
            (Some(expected), Some(actual)) if !is_compatible(&actual, &expected) => {
                self.report(
                    type_error(
                        "E0204",
                        ret.span,
                        format!(
                            "cannot return a value of type '{actual}' from function '{name}' declared to return '{expected}'"
                        ),
                    )
                    .with_suggestion(TYPE_MISMATCH_HINT),
                );
            }
            _ => {}
        }
    }

    fn check_in_loop(&mut self, keyword: &str, span: Span) {
        if self.scopes.enclosing(self.current, ScopeKind::Loop).is_none() {
            self.report(semantic_error(
                "E0207",
                span,
                format!("'{keyword}' used outside of a loop"),
            ));
        }
    }

    fn warn_uninitialized(&mut self, name: &str, span: Span) {
        self.report(
            Diagnostic::warning(Category::Semantic, format!("variable '{name}' may not be initialized"))
                .with_code("W0001")
                .with_location(span)
                .with_suggestion(format!("assign a value with 'set {name} to ...' before reading it")),
        );
    }

    // -----------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------

    /// Infer the type of `expr`, reporting problems found on the way.
    fn expr_type(&mut self, expr: &Expr) -> Type {
        match expr {
            Expr::Literal(literal) => Type::of_literal(&literal.value),
            Expr::Variable(variable) => self.variable_type(variable),
            Expr::This(span) => match self.scopes.enclosing_class(self.current) {
                Some(class) => Type::Named(self.scopes.name(class).to_string()),
                None => {
                    self.report(semantic_error("E0207", *span, "'this' used outside of a class"));
                    Type::Any
                }
            },
            Expr::Binary(binary) => {
                let left = self.expr_type(&binary.left);
                let right = self.expr_type(&binary.right);
                match binary_result(&left, binary.op, &right) {
                    Some(ty) => ty,
                    None => {
                        self.report(
                            type_error(
                                "E0206",
                                binary.span,
                                format!("invalid operation: {left} {} {right}", binary.op.symbol()),
                            )
                            .with_suggestion(TYPE_MISMATCH_HINT),
                        );
                        Type::Any
                    }
                }
            }
            Expr::Unary(unary) => {
                let operand = self.expr_type(&unary.operand);
                match unary_result(unary.op, &operand) {
                    Some(ty) => ty,
                    None => {
                        self.report(type_error(
                            "E0206",
                            unary.span,
                            format!("invalid operation: {}{operand}", unary.op.symbol()),
                        ));
                        Type::Any
                    }
                }
            }
            Expr::Call(call) => self.call_type(call),
            Expr::Attribute(access) => {
                let object = self.expr_type(&access.object);
                self.member_type(&object, &access.attribute, access.span, false)
            }
            Expr::Index(access) => {
                let container = self.expr_type(&access.array);
                let index = self.expr_type(&access.index);
                let element = match container {
                    Type::List(inner) => *inner,
                    Type::Text => Type::Text,
                    _ => return Type::Any,
                };
                if !matches!(index, Type::Int | Type::Any) {
                    self.report(type_error(
                        "E0206",
                        access.index.span(),
                        format!("index must be int, got {index}"),
                    ));
                }
                element
            }
            Expr::List(list) => {
                let mut first = None;
                for item in &list.items {
                    let ty = self.expr_type(item);
                    if first.is_none() {
                        first = Some(ty);
                    }
                }
                Type::List(Box::new(first.unwrap_or(Type::Any)))
            }
            Expr::Dict(dict) => {
                for (key, value) in &dict.entries {
                    self.expr_type(key);
                    self.expr_type(value);
                }
                Type::Dict
            }
            Expr::New(new) => self.new_type(new),
        }
    }

    fn variable_type(&mut self, variable: &Variable) -> Type {
        let found = self
            .scopes
            .lookup_mut(self.current, &variable.name)
            .map(|symbol| {
                symbol.used = true;
                let unset = symbol.role == SymbolRole::Variable
                    && !symbol.initialized
                    && !symbol.placeholder;
                let ty = if symbol.role.is_value() {
                    symbol.ty.clone().unwrap_or(Type::Any)
                } else {
                    Type::Any
                };
                (ty, unset)
            });
        match found {
            Some((ty, unset)) => {
                if unset {
                    self.warn_uninitialized(&variable.name, variable.span);
                }
                ty
            }
            None => {
                self.report(
                    semantic_error(
                        "E0200",
                        variable.span,
                        format!("variable '{}' is not declared", variable.name),
                    )
                    .with_suggestion(format!(
                        "declare '{0}' with 'create {0} as Type' before using it",
                        variable.name
                    )),
                );
                self.declare_placeholder(&variable.name, SymbolRole::Variable, variable.span);
                Type::Any
            }
        }
    }

    fn call_type(&mut self, call: &FunctionCall) -> Type {
        if let Some(receiver) = &call.receiver {
            let receiver = self.expr_type(receiver);
            self.analyze_arguments(&call.args);
            return self.member_type(&receiver, &call.callee, call.span, true);
        }
        let ty = self.free_call_type(call);
        self.analyze_arguments(&call.args);
        ty
    }

    /// Arguments are checked on their own; arity and parameter types are
    /// not matched against the callee's signature.
    fn analyze_arguments(&mut self, args: &[Expr]) {
        for arg in args {
            self.expr_type(arg);
        }
    }

    fn free_call_type(&mut self, call: &FunctionCall) -> Type {
        let found = self.scopes.lookup_mut(self.current, &call.callee).map(|symbol| {
            symbol.used = true;
            (symbol.role, symbol.ty.clone(), symbol.placeholder)
        });
        match found {
            None => {
                self.report(
                    semantic_error(
                        "E0200",
                        call.span,
                        format!("function '{}' is not declared", call.callee),
                    )
                    .with_suggestion(format!(
                        "define '{0}' with 'define function {0} that takes ...' or import it",
                        call.callee
                    )),
                );
                self.declare_placeholder(&call.callee, SymbolRole::Function, call.span);
                Type::Any
            }
            Some((_, _, true)) => Type::Any,
            Some((role, ty, _)) if role.is_callable() => {
                if role == SymbolRole::Builtin {
                    if let Some(builtin) = find_builtin(&call.callee) {
                        if !self.used_builtins.contains(&builtin.name) {
                            self.used_builtins.push(builtin.name);
                        }
                    }
                }
                ty.unwrap_or(Type::Any)
            }
            Some((SymbolRole::Class, _, _)) => {
                self.report(
                    semantic_error(
                        "E0202",
                        call.span,
                        format!("'{}' is a class, not a function", call.callee),
                    )
                    .with_suggestion(format!("create an instance with 'new {}(...)'", call.callee)),
                );
                Type::Named(call.callee.clone())
            }
            Some((role, _, _)) => {
                self.report(semantic_error(
                    "E0202",
                    call.span,
                    format!("'{}' is a {}, not a function", call.callee, role.describe()),
                ));
                Type::Any
            }
        }
    }

    fn new_type(&mut self, new: &NewExpression) -> Type {
        self.analyze_arguments(&new.args);
        let found = self.scopes.lookup_mut(self.current, &new.class_name).map(|symbol| {
            symbol.used = true;
            (symbol.role, symbol.placeholder)
        });
        match found {
            None => {
                self.report(
                    semantic_error(
                        "E0200",
                        new.span,
                        format!("class '{}' is not declared", new.class_name),
                    )
                    .with_suggestion(format!("define '{}' with 'define class' or import it", new.class_name)),
                );
                self.declare_placeholder(&new.class_name, SymbolRole::Class, new.span);
                Type::Named(new.class_name.clone())
            }
            Some((role, placeholder)) if placeholder || role.is_class() => {
                Type::Named(new.class_name.clone())
            }
            Some((role, _)) => {
                self.report(semantic_error(
                    "E0202",
                    new.span,
                    format!("'{}' is a {}, not a class", new.class_name, role.describe()),
                ));
                Type::Any
            }
        }
    }

    fn member_type(&mut self, object: &Type, member: &str, span: Span, is_call: bool) -> Type {
        let Type::Named(class) = object else {
            return Type::Any;
        };
        match self.class_member(class, member) {
            Member::Field(ty) => ty.unwrap_or(Type::Any),
            Member::Method(ty) if is_call => ty,
            Member::Method(_) | Member::Unknown => Type::Any,
            Member::Missing => {
                self.report(semantic_error(
                    "E0208",
                    span,
                    format!("class '{class}' has no member '{member}'"),
                ));
                Type::Any
            }
        }
    }

    /// Find `member` on `class` or any of its ancestors.
    fn class_member(&self, class: &str, member: &str) -> Member {
        let mut pending = vec![class];
        let mut seen = HashSet::new();
        let mut unknown = false;
        while let Some(name) = pending.pop() {
            if !seen.insert(name) {
                continue;
            }
            let Some(info) = self.classes.get(name) else {
                unknown = true;
                continue;
            };
            if let Some(ty) = info.fields.get(member) {
                return Member::Field(ty.clone());
            }
            if let Some(ty) = info.methods.get(member) {
                return Member::Method(ty.clone());
            }
            pending.extend(info.superclasses.iter().map(String::as_str));
        }
        if unknown { Member::Unknown } else { Member::Missing }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn report_for(src: &str) -> AnalysisReport {
        let program = parse_source(src).expect("source parses");
        analyze(&program)
    }

    fn messages(diagnostics: &[Diagnostic]) -> Vec<String> {
        diagnostics.iter().map(|d| d.message.clone()).collect()
    }

    #[test]
    fn typed_function_analyzes_cleanly() {
        let report = report_for(
            "define function add that takes a as Integer, b as Integer and returns Integer: return a + b",
        );
        assert!(report.is_success(), "{:?}", messages(&report.errors));
    }

    #[test]
    fn undeclared_name_is_reported_once() {
        let report = report_for("define function f: set x to 42 return x");
        assert_eq!(report.errors.len(), 1, "{:?}", messages(&report.errors));
        let error = &report.errors[0];
        assert!(error.message.contains("'x'"));
        assert_eq!(error.code, Some("E0200"));
        let location = error.location.expect("error has a location");
        assert_eq!((location.line, location.column), (1, 24));
    }

    #[test]
    fn undeclared_name_inside_a_loop_is_reported_once() {
        let report = report_for("define function f:\n    while true:\n        print(y)\n    print(y)\n");
        assert_eq!(messages(&report.errors), vec!["variable 'y' is not declared"]);

        let src = "\
try:
    for each n in [1]:
        set total to n
catch Error as e:
    print(total)
print(total)
";
        let report = report_for(src);
        assert_eq!(messages(&report.errors), vec!["variable 'total' is not declared"]);
    }

    #[test]
    fn loop_iterators_are_scoped_to_the_body() {
        let src = "\
for each i in [1, 2]:
    print(i)
print(i)
for j in 5:
    print(j)
";
        let report = report_for(src);
        let found: Vec<(String, u32, u32)> = report
            .errors
            .iter()
            .map(|e| {
                let at = e.location.unwrap_or_default();
                (e.message.clone(), at.line, at.column)
            })
            .collect();
        assert_eq!(
            found,
            vec![
                ("variable 'i' is not declared".to_string(), 3, 7),
                ("cannot iterate over a value of type 'int'".to_string(), 4, 10),
            ]
        );
        // the iterator is bound with a value, so reading it never warns
        assert!(report.warnings.is_empty(), "{:?}", messages(&report.warnings));
    }

    #[test]
    fn nested_loops_may_reuse_an_iterator_name() {
        let src = "\
define function grid:
    for each i in range(3):
        for each i in range(2):
            print(i)
        print(i)
";
        let report = report_for(src);
        assert!(report.is_success(), "{:?}", messages(&report.errors));
        assert!(report.warnings.is_empty(), "{:?}", messages(&report.warnings));
    }

    #[test]
    fn assigning_text_to_integer_is_a_type_error() {
        let report = report_for("create total as Integer\nset total to \"hello\"");
        assert_eq!(report.errors.len(), 1);
        let error = &report.errors[0];
        assert_eq!(error.category, Category::Type);
        assert_eq!(
            error.message,
            "cannot assign value of type 'string' to 'total' of type 'int'"
        );
    }

    #[test]
    fn same_scope_redeclaration_fails_but_shadowing_is_fine() {
        let report = report_for("create x as Integer = 1\ncreate x as Integer = 2");
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, Some("E0201"));

        let report = report_for(
            "create x as Integer = 1\ndefine function f:\n    create x as String = \"inner\"\n    print(x)\n",
        );
        assert!(report.is_success(), "{:?}", messages(&report.errors));
    }

    #[test]
    fn widening_only_goes_one_way() {
        assert!(report_for("create ratio as Float = 3").is_success());
        let report = report_for("create count as Integer = 2.5");
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, Some("E0204"));
    }

    #[test]
    fn definitions_may_be_used_before_they_appear() {
        let src = "\
define function first and returns Integer: return second()
define function second and returns Integer: return 2
";
        assert!(report_for(src).is_success());
    }

    #[test]
    fn conditions_must_be_boolean() {
        let report = report_for("create n as Integer = 1\nif n:\n    print(n)\nwhile n > 0:\n    set n to n - 1\n");
        assert_eq!(messages(&report.errors), vec!["if condition must be boolean, got int"]);
    }

    #[test]
    fn constants_reject_assignment() {
        let report = report_for("constant limit as Integer = 10\nset limit to 11");
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].code, Some("E0203"));
        assert_eq!(report.errors[0].suggestion.as_deref(), Some(CONSTANT_HINT));
    }

    #[test]
    fn reading_before_assignment_only_warns() {
        let report = report_for("create total as Integer\nprint(total)");
        assert!(report.is_success());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].code, Some("W0001"));
    }

    #[test]
    fn unused_locals_warn_when_their_function_ends() {
        let report = report_for("define function f:\n    create unused as Integer = 1\n    return\n");
        assert!(report.is_success());
        assert_eq!(messages(&report.warnings), vec!["variable 'unused' is declared but never used"]);
    }

    #[test]
    fn calling_a_variable_or_class_is_rejected() {
        let report = report_for("create n as Integer = 1\nn()");
        assert_eq!(messages(&report.errors), vec!["'n' is a variable, not a function"]);

        let report = report_for("define class Shop:\n    name as String\nShop()");
        assert_eq!(report.errors[0].code, Some("E0202"));
        assert!(report.errors[0].suggestion.as_deref().is_some_and(|s| s.contains("new Shop")));
    }

    #[test]
    fn misplaced_statements_are_reported() {
        let report = report_for("break\nreturn 1\nprint(this)");
        let codes: Vec<_> = report.errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![Some("E0207"); 3]);
    }

    #[test]
    fn return_values_follow_the_declared_type() {
        let report = report_for("define function f and returns Integer: return \"no\"");
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("declared to return 'int'"));
    }

    #[test]
    fn class_members_are_checked_through_inheritance() {
        let src = "\
define class Base:
    name as String
define class Shop extends Base:
    items as List<String>
    define function label and returns String:
        return this.name
define function main:
    create s as Shop = new Shop()
    print(s.label())
    print(s.missing)
";
        let report = report_for(src);
        assert_eq!(messages(&report.errors), vec!["class 'Shop' has no member 'missing'"]);
    }

    #[test]
    fn used_builtins_skip_shadowed_names() {
        let report = report_for("print(len([1, 2]))\nprint(range(3))");
        assert_eq!(report.used_builtins, vec!["print", "len", "range"]);

        let report = report_for("define function print that takes x: return\nprint(1)");
        assert!(report.used_builtins.is_empty());
    }

    #[test]
    fn error_limit_counts_the_overflow() {
        let program = parse_source("print(a)\nprint(b)\nprint(c)").expect("parses");
        let report = analyze_with_limit(&program, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.suppressed, 2);
        assert!(!report.is_success());
    }
}
