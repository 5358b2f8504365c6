//! Read-only traversal over the syntax tree.
//!
//! Every `visit_*` method defaults to the matching `walk_*` function, which
//! recurses into all children. Implementors override only the node kinds
//! they care about and call the walker to keep descending.

use crate::ast::*;

pub trait Visitor<'ast> {
    fn visit_program(&mut self, program: &'ast Program) {
        walk_program(self, program);
    }

    fn visit_import(&mut self, _import: &'ast Import) {}

    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }

    fn visit_function(&mut self, function: &'ast FunctionDef) {
        walk_function(self, function);
    }

    fn visit_external(&mut self, external: &'ast ExternalFunctionDef) {
        walk_external(self, external);
    }

    fn visit_class(&mut self, class: &'ast ClassDef) {
        walk_class(self, class);
    }

    fn visit_constructor(&mut self, constructor: &'ast ConstructorDef) {
        walk_constructor(self, constructor);
    }

    fn visit_variable_decl(&mut self, decl: &'ast VariableDecl) {
        walk_variable_decl(self, decl);
    }

    fn visit_call(&mut self, call: &'ast FunctionCall) {
        walk_call(self, call);
    }

    fn visit_parameter(&mut self, param: &'ast Parameter) {
        if let Some(ty) = &param.type_annotation {
            self.visit_type(ty);
        }
    }

    fn visit_type(&mut self, _ty: &'ast TypeNode) {}
}

pub fn walk_program<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, program: &'ast Program) {
    for import in &program.imports {
        visitor.visit_import(import);
    }
    walk_block(visitor, &program.statements);
}

pub fn walk_block<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, body: &'ast [Stmt]) {
    for stmt in body {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, stmt: &'ast Stmt) {
    match stmt {
        Stmt::Function(f) => visitor.visit_function(f),
        Stmt::External(e) => visitor.visit_external(e),
        Stmt::Class(c) => visitor.visit_class(c),
        Stmt::Interface(i) => {
            for method in &i.methods {
                visitor.visit_function(method);
            }
        }
        Stmt::Variable(v) => visitor.visit_variable_decl(v),
        Stmt::Assignment(a) => {
            visitor.visit_expr(&a.target);
            visitor.visit_expr(&a.value);
        }
        Stmt::If(s) => {
            visitor.visit_expr(&s.condition);
            walk_block(visitor, &s.then_body);
            for branch in &s.elif_branches {
                visitor.visit_expr(&branch.condition);
                walk_block(visitor, &branch.body);
            }
            if let Some(body) = &s.else_body {
                walk_block(visitor, body);
            }
        }
        Stmt::For(s) => {
            visitor.visit_expr(&s.iterable);
            walk_block(visitor, &s.body);
        }
        Stmt::While(s) => {
            visitor.visit_expr(&s.condition);
            walk_block(visitor, &s.body);
        }
        Stmt::Return(r) => {
            if let Some(value) = &r.value {
                visitor.visit_expr(value);
            }
        }
        Stmt::Break(_) | Stmt::Continue(_) => {}
        Stmt::TryCatch(t) => {
            walk_block(visitor, &t.body);
            for clause in &t.catches {
                walk_block(visitor, &clause.body);
            }
            if let Some(body) = &t.finally {
                walk_block(visitor, body);
            }
        }
        Stmt::Throw(t) => visitor.visit_expr(&t.value),
        Stmt::Expression(e) => visitor.visit_expr(e),
    }
}

pub fn walk_function<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, function: &'ast FunctionDef) {
    for param in &function.params {
        visitor.visit_parameter(param);
    }
    if let Some(ty) = &function.return_type {
        visitor.visit_type(ty);
    }
    walk_block(visitor, &function.body);
}

pub fn walk_external<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, external: &'ast ExternalFunctionDef) {
    for param in &external.params {
        visitor.visit_parameter(param);
    }
    visitor.visit_type(&external.return_type);
}

pub fn walk_class<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, class: &'ast ClassDef) {
    for field in &class.fields {
        visitor.visit_variable_decl(field);
    }
    for constructor in &class.constructors {
        visitor.visit_constructor(constructor);
    }
    for method in &class.methods {
        visitor.visit_function(method);
    }
}

pub fn walk_constructor<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, constructor: &'ast ConstructorDef) {
    for param in &constructor.params {
        visitor.visit_parameter(param);
    }
    walk_block(visitor, &constructor.body);
}

pub fn walk_variable_decl<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, decl: &'ast VariableDecl) {
    if let Some(ty) = &decl.type_annotation {
        visitor.visit_type(ty);
    }
    if let Some(init) = &decl.initializer {
        visitor.visit_expr(init);
    }
}

pub fn walk_call<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, call: &'ast FunctionCall) {
    if let Some(receiver) = &call.receiver {
        visitor.visit_expr(receiver);
    }
    for arg in &call.args {
        visitor.visit_expr(arg);
    }
}

pub fn walk_expr<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, expr: &'ast Expr) {
    match expr {
        Expr::Binary(b) => {
            visitor.visit_expr(&b.left);
            visitor.visit_expr(&b.right);
        }
        Expr::Unary(u) => visitor.visit_expr(&u.operand),
        Expr::Call(c) => visitor.visit_call(c),
        Expr::Attribute(a) => visitor.visit_expr(&a.object),
        Expr::Index(i) => {
            visitor.visit_expr(&i.array);
            visitor.visit_expr(&i.index);
        }
        Expr::List(l) => {
            for item in &l.items {
                visitor.visit_expr(item);
            }
        }
        Expr::Dict(d) => {
            for (key, value) in &d.entries {
                visitor.visit_expr(key);
                visitor.visit_expr(value);
            }
        }
        Expr::New(n) => {
            for arg in &n.args {
                visitor.visit_expr(arg);
            }
        }
        Expr::Literal(_) | Expr::Variable(_) | Expr::This(_) => {}
    }
}

/// Every `external function` declaration in the program, at any depth, in
/// source order.
pub fn external_functions(program: &Program) -> Vec<&ExternalFunctionDef> {
    struct Externals<'ast> {
        found: Vec<&'ast ExternalFunctionDef>,
    }
    impl<'ast> Visitor<'ast> for Externals<'ast> {
        fn visit_external(&mut self, external: &'ast ExternalFunctionDef) {
            self.found.push(external);
        }
        fn visit_expr(&mut self, _expr: &'ast Expr) {}
    }
    let mut externals = Externals { found: Vec::new() };
    externals.visit_program(program);
    externals.found
}

/// Whether a body contains `return <value>` outside nested definitions.
pub fn returns_value(body: &[Stmt]) -> bool {
    struct Finder {
        found: bool,
    }
    impl<'ast> Visitor<'ast> for Finder {
        fn visit_stmt(&mut self, stmt: &'ast Stmt) {
            if let Stmt::Return(ReturnStatement { value: Some(_), .. }) = stmt {
                self.found = true;
            }
            walk_stmt(self, stmt);
        }
        fn visit_function(&mut self, _function: &'ast FunctionDef) {}
        fn visit_class(&mut self, _class: &'ast ClassDef) {}
        fn visit_expr(&mut self, _expr: &'ast Expr) {}
    }
    let mut finder = Finder { found: false };
    walk_block(&mut finder, body);
    finder.found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    fn call(name: &str, args: Vec<Expr>) -> Expr {
        Expr::Call(FunctionCall {
            callee: name.into(),
            receiver: None,
            args,
            span: Span::default(),
        })
    }

    #[test]
    fn default_walk_reaches_nested_calls() {
        let program = Program {
            imports: vec![],
            statements: vec![Stmt::While(WhileStatement {
                condition: call("ready", vec![]),
                body: vec![Stmt::Expression(call("print", vec![call("len", vec![])]))],
                span: Span::default(),
            })],
        };
        struct Calls(Vec<String>);
        impl<'ast> Visitor<'ast> for Calls {
            fn visit_call(&mut self, call: &'ast FunctionCall) {
                self.0.push(call.callee.clone());
                walk_call(self, call);
            }
        }
        let mut calls = Calls(Vec::new());
        calls.visit_program(&program);
        assert_eq!(calls.0, vec!["ready", "print", "len"]);
    }

    #[test]
    fn return_finder_ignores_nested_functions() {
        let inner = FunctionDef {
            name: "inner".into(),
            params: vec![],
            return_type: None,
            body: vec![Stmt::Return(ReturnStatement {
                value: Some(Expr::int(1, Span::default())),
                span: Span::default(),
            })],
            modifiers: Modifiers::default(),
            span: Span::default(),
        };
        let body = vec![
            Stmt::Function(inner),
            Stmt::Return(ReturnStatement {
                value: None,
                span: Span::default(),
            }),
        ];
        assert!(!returns_value(&body));
    }
}
