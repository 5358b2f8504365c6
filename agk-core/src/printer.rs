//! Canonical AGK source rendering.
//!
//! Output always reparses to a tree equal to its input. Worded operators
//! come back in symbolic form (`is less than` prints as `<`) and
//! `x = e` prints as `set x to e`; both spellings parse to the same tree.

use crate::ast::*;

const INDENT: &str = "    ";

pub fn print_program(program: &Program) -> String {
    let mut printer = Printer::default();
    for import in &program.imports {
        printer.import(import);
    }
    if !program.imports.is_empty() && !program.statements.is_empty() {
        printer.out.push('\n');
    }
    printer.block(&program.statements);
    printer.out
}

pub fn print_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

#[derive(Default)]
struct Printer {
    out: String,
    depth: usize,
}

impl Printer {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn indented(&mut self, body: impl FnOnce(&mut Self)) {
        self.depth += 1;
        body(self);
        self.depth -= 1;
    }

    fn import(&mut self, import: &Import) {
        let mut text = if import.names.is_empty() {
            format!("import {}", import.module)
        } else {
            format!("from {} import {}", import.module, import.names.join(", "))
        };
        if let Some(alias) = &import.alias {
            text.push_str(&format!(" as {alias}"));
        }
        self.line(&text);
    }

    fn block(&mut self, body: &[Stmt]) {
        for stmt in body {
            self.stmt(stmt);
        }
    }

    fn suite(&mut self, header: String, body: &[Stmt]) {
        self.line(&format!("{header}:"));
        self.indented(|p| p.block(body));
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Function(f) => self.function(f, true),
            Stmt::External(e) => {
                let params: Vec<String> = e.params.iter().map(parameter).collect();
                let text = format!(
                    "{}external function {}({}) from \"{}\" as {}",
                    visibility_prefix(e.visibility),
                    e.name,
                    params.join(", "),
                    e.library,
                    e.return_type
                );
                self.line(&text);
            }
            Stmt::Class(c) => self.class(c),
            Stmt::Interface(i) => {
                self.line(&format!(
                    "{}define interface {}:",
                    visibility_prefix(i.visibility),
                    i.name
                ));
                self.indented(|p| {
                    for method in &i.methods {
                        p.function(method, false);
                    }
                });
            }
            Stmt::Variable(v) => self.line(&declaration(v)),
            Stmt::Assignment(a) => {
                let text = match a.op {
                    AssignOp::Assign => {
                        format!("set {} to {}", print_expr(&a.target), print_expr(&a.value))
                    }
                    op => format!(
                        "{} {} {}",
                        print_expr(&a.target),
                        op.symbol(),
                        print_expr(&a.value)
                    ),
                };
                self.line(&text);
            }
            Stmt::If(s) => {
                self.suite(format!("if {}", print_expr(&s.condition)), &s.then_body);
                for branch in &s.elif_branches {
                    self.suite(format!("elif {}", print_expr(&branch.condition)), &branch.body);
                }
                if let Some(body) = &s.else_body {
                    self.suite("else".to_string(), body);
                }
            }
            Stmt::For(s) => self.suite(
                format!("for each {} in {}", s.iterator, print_expr(&s.iterable)),
                &s.body,
            ),
            Stmt::While(s) => self.suite(format!("while {}", print_expr(&s.condition)), &s.body),
            Stmt::Return(r) => match &r.value {
                Some(value) => self.line(&format!("return {}", print_expr(value))),
                None => self.line("return"),
            },
            Stmt::Break(_) => self.line("break"),
            Stmt::Continue(_) => self.line("continue"),
            Stmt::TryCatch(t) => {
                self.suite("try".to_string(), &t.body);
                for clause in &t.catches {
                    let header = match &clause.binding {
                        Some(name) => format!("catch {} {}", clause.exception_type, name),
                        None => format!("catch {}", clause.exception_type),
                    };
                    self.suite(header, &clause.body);
                }
                if let Some(body) = &t.finally {
                    self.suite("finally".to_string(), body);
                }
            }
            Stmt::Throw(t) => self.line(&format!("throw {}", print_expr(&t.value))),
            Stmt::Expression(e) => self.line(&print_expr(e)),
        }
    }

    fn function(&mut self, f: &FunctionDef, with_body: bool) {
        let mut header = format!("{}define function {}", modifier_prefix(&f.modifiers), f.name);
        header.push_str(&signature(&f.params, f.return_type.as_ref()));
        if with_body || !f.body.is_empty() {
            self.suite(header, &f.body);
        } else {
            self.line(&header);
        }
    }

    fn class(&mut self, c: &ClassDef) {
        let mut header = format!("{}define class {}", modifier_prefix(&c.modifiers), c.name);
        if !c.superclasses.is_empty() {
            header.push_str(&format!(" extends {}", c.superclasses.join(", ")));
        }
        if !c.interfaces.is_empty() {
            header.push_str(&format!(" implements {}", c.interfaces.join(", ")));
        }
        self.line(&format!("{header}:"));
        self.indented(|p| {
            for field in &c.fields {
                p.line(&declaration(field));
            }
            for ctor in &c.constructors {
                let header = format!(
                    "{}define constructor{}",
                    visibility_prefix(ctor.visibility),
                    signature(&ctor.params, None)
                );
                p.suite(header, &ctor.body);
            }
            for method in &c.methods {
                p.function(method, true);
            }
        });
    }
}

fn visibility_prefix(visibility: Option<Visibility>) -> String {
    visibility
        .map(|v| format!("{} ", v.keyword()))
        .unwrap_or_default()
}

fn modifier_prefix(modifiers: &Modifiers) -> String {
    let mut out = visibility_prefix(modifiers.visibility);
    if modifiers.is_static {
        out.push_str("static ");
    }
    if modifiers.is_final {
        out.push_str("final ");
    }
    if modifiers.is_abstract {
        out.push_str("abstract ");
    }
    out
}

fn parameter(param: &Parameter) -> String {
    match &param.type_annotation {
        Some(ty) => format!("{} as {}", param.name, ty),
        None => param.name.clone(),
    }
}

fn signature(params: &[Parameter], return_type: Option<&TypeNode>) -> String {
    let mut out = String::new();
    if !params.is_empty() {
        let params: Vec<String> = params.iter().map(parameter).collect();
        out.push_str(&format!(" that takes {}", params.join(", ")));
    }
    if let Some(ty) = return_type {
        out.push_str(&format!(" and returns {ty}"));
    }
    out
}

fn declaration(decl: &VariableDecl) -> String {
    let mut out = modifier_prefix(&decl.modifiers);
    match decl.kind {
        DeclKind::Create => out.push_str("create "),
        DeclKind::Variable => out.push_str("variable "),
        DeclKind::Constant => out.push_str("constant "),
        DeclKind::Field => {}
    }
    out.push_str(&decl.name);
    match (&decl.type_annotation, decl.kind) {
        (Some(ty), _) => out.push_str(&format!(" as {ty}")),
        (None, DeclKind::Create) if decl.initializer.is_none() => out.push_str(" as Any"),
        (None, DeclKind::Field) => out.push_str(" as Any"),
        (None, _) => {}
    }
    if let Some(init) = &decl.initializer {
        out.push_str(&format!(" = {}", print_expr(init)));
    }
    out
}

fn write_operand(out: &mut String, expr: &Expr, parenthesize: bool) {
    if parenthesize {
        out.push('(');
        write_expr(out, expr);
        out.push(')');
    } else {
        write_expr(out, expr);
    }
}

fn write_list(out: &mut String, items: &[Expr]) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, item);
    }
}

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Binary(b) => {
            let prec = b.op.precedence();
            write_operand(out, &b.left, b.left.precedence() < prec);
            out.push_str(&format!(" {} ", b.op.symbol()));
            write_operand(out, &b.right, b.right.precedence() <= prec);
        }
        Expr::Unary(u) => {
            out.push_str(u.op.symbol());
            write_operand(out, &u.operand, u.operand.precedence() < UNARY_PRECEDENCE);
        }
        Expr::Call(c) => {
            if let Some(receiver) = &c.receiver {
                write_operand(out, receiver, receiver.precedence() <= UNARY_PRECEDENCE);
                out.push('.');
            }
            out.push_str(&c.callee);
            out.push('(');
            write_list(out, &c.args);
            out.push(')');
        }
        Expr::Attribute(a) => {
            write_operand(out, &a.object, a.object.precedence() <= UNARY_PRECEDENCE);
            out.push('.');
            out.push_str(&a.attribute);
        }
        Expr::Index(i) => {
            write_operand(out, &i.array, i.array.precedence() <= UNARY_PRECEDENCE);
            out.push('[');
            write_expr(out, &i.index);
            out.push(']');
        }
        Expr::Literal(l) => match &l.value {
            LiteralValue::Int(v) => out.push_str(&v.to_string()),
            LiteralValue::Float(v) => out.push_str(&float_text(*v)),
            LiteralValue::Text(s) => {
                let quote = if s.contains('"') { '\'' } else { '"' };
                out.push(quote);
                out.push_str(s);
                out.push(quote);
            }
            LiteralValue::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
        },
        Expr::Variable(v) => out.push_str(&v.name),
        Expr::This(_) => out.push_str("this"),
        Expr::List(l) => {
            out.push('[');
            write_list(out, &l.items);
            out.push(']');
        }
        Expr::Dict(d) => {
            out.push('{');
            for (i, (key, value)) in d.entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, key);
                out.push_str(": ");
                write_expr(out, value);
            }
            out.push('}');
        }
        Expr::New(n) => {
            out.push_str("new ");
            out.push_str(&n.class_name);
            out.push('(');
            write_list(out, &n.args);
            out.push(')');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::span::without_spans;

    fn round_trip(src: &str) {
        let first = parse_source(src).expect("source parses");
        let printed = print_program(&first);
        let second = parse_source(&printed)
            .unwrap_or_else(|e| panic!("printed source fails to parse: {e}\n{printed}"));
        assert_eq!(
            without_spans(&first),
            without_spans(&second),
            "round trip changed the tree:\n{printed}"
        );
    }

    #[test]
    fn round_trips_a_whole_program() {
        round_trip(
            "\
import math as m
from util import clamp, lerp

external function sqrt(x as Float) from \"libm.so\" as Float

public define interface Shape:
    define function area and returns Float

define final class Square extends Base implements Shape:
    private variable side as Float = 1.0
    label as String
    constant SIDES = 4
    define constructor that takes side as Float:
        set this side to side
    define function area and returns Float:
        return this.side * this.side

define function classify that takes n as Integer, tags as List<String>[] and returns String:
    create total as 0
    for each t in tags:
        add len(t) to total
    if n is less than 0 and not (total > 3):
        return \"negative\"
    elif n equals 0 || total - (1 - n) >= 2:
        return 'say \"zero\"'
    else:
        while total % 2 != 1:
            total -= 1
            if total < -10: break
    try:
        risky(n, [1, 2.5, true], {\"k\": n})
    catch ValueError e:
        throw new Error(e.message)
    finally:
        cleanup()
    return to_text(n).upper()[0]
",
        );
    }

    #[test]
    fn round_trips_empty_bodies() {
        round_trip("define function noop:\ndefine class Empty:\nif a:\nelse:\n    b()\n");
    }

    #[test]
    fn parenthesizes_only_where_needed() {
        let program = parse_source("x = (a + b) * c - (d - e)\ny = a - b - c\nz = -(a + b)")
            .expect("parses");
        let text = print_program(&program);
        assert_eq!(
            text,
            "set x to (a + b) * c - (d - e)\nset y to a - b - c\nset z to -(a + b)\n"
        );
    }

    #[test]
    fn worded_comparisons_print_symbolically() {
        let program = parse_source("if a is greater than b: c()").expect("parses");
        assert_eq!(print_program(&program), "if a > b:\n    c()\n");
    }
}
