//! Target code generation.
//!
//! [`generate`] makes one recursive pass over the tree and lowers each
//! statement and expression to target text for a [`Platform`]. Type names,
//! headers, entry-point scaffolds and builtin calls come from the platform's
//! [`PlatformTable`]; the statement shapes (braces or indentation, loop and
//! `try` forms) are decided here.
//!
//! Generation never fails. Unknown type names pass through unchanged and
//! nodes the analyzer rejected are still emitted as written.
//!
//! Output layout, top to bottom: prologue, optional container, foreign
//! function bindings, interfaces, classes, functions, then the entry point
//! holding the executable top-level statements.

use std::collections::HashSet;

use crate::ast::*;
use crate::builtins::find_builtin;
use crate::platform::{Platform, PlatformTable};
use crate::types::Type;
use crate::visit::{self, Visitor, walk_class, walk_function, walk_variable_decl};

/// Leading whitespace per nesting level, the same on every platform.
pub const INDENT_UNIT: &str = "    ";

/// Module-level flag whose initializer runs the foreign function
/// registrations on Kotlin and Swift.
const REGISTERED_FLAG: &str = "agkExternalsRegistered";

pub fn generate(program: &Program, platform: Platform) -> String {
    let mut emitter = Emitter::new(program, platform);
    emitter.program(program);
    emitter.out
}

/// Names the program declares itself. A call to one of these is never
/// lowered as a builtin, even where the builtin would still be visible.
fn declared_names(program: &Program) -> HashSet<String> {
    struct Names {
        found: HashSet<String>,
    }
    impl<'ast> Visitor<'ast> for Names {
        fn visit_function(&mut self, function: &'ast FunctionDef) {
            self.found.insert(function.name.clone());
            walk_function(self, function);
        }
        fn visit_external(&mut self, external: &'ast ExternalFunctionDef) {
            self.found.insert(external.name.clone());
        }
        fn visit_class(&mut self, class: &'ast ClassDef) {
            self.found.insert(class.name.clone());
            walk_class(self, class);
        }
        fn visit_variable_decl(&mut self, decl: &'ast VariableDecl) {
            self.found.insert(decl.name.clone());
            walk_variable_decl(self, decl);
        }
        fn visit_parameter(&mut self, param: &'ast Parameter) {
            self.found.insert(param.name.clone());
        }
        fn visit_expr(&mut self, _expr: &'ast Expr) {}
    }
    let mut names = Names {
        found: HashSet::new(),
    };
    names.visit_program(program);
    names.found
}

fn escape(text: &str, platform: Platform) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' if platform == Platform::Kotlin => out.push_str("\\$"),
            _ => out.push(ch),
        }
    }
    out
}

/// How a function-like definition is being emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Callable {
    /// Free function at the top of the definitions section.
    TopLevel,
    /// Function defined inside another body.
    Nested,
    Method,
    /// Signature inside an interface.
    Abstract,
}

struct Emitter {
    platform: Platform,
    table: &'static dyn PlatformTable,
    out: String,
    depth: usize,
    declared: HashSet<String>,
}

impl Emitter {
    fn new(program: &Program, platform: Platform) -> Self {
        Emitter {
            platform,
            table: platform.table(),
            out: String::new(),
            depth: 0,
            declared: declared_names(program),
        }
    }

    fn python(&self) -> bool {
        self.platform == Platform::Python
    }

    fn line(&mut self, text: &str) {
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(INDENT_UNIT);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    /// Scaffold lines already carry their indentation.
    fn raw_lines(&mut self, lines: &[&str]) {
        for text in lines {
            self.out.push_str(text);
            self.out.push('\n');
        }
    }

    fn indented(&mut self, body: impl FnOnce(&mut Self)) {
        self.depth += 1;
        body(self);
        self.depth -= 1;
    }

    fn terminated(&self, text: String) -> String {
        if self.platform.uses_semicolons() {
            format!("{text};")
        } else {
            text
        }
    }

    // -----------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------

    fn program(&mut self, program: &Program) {
        for text in self.table.prologue(&program.imports) {
            self.line(&text);
        }
        let scaffold = self.table.scaffold();
        self.raw_lines(scaffold.container_open);
        self.depth = scaffold.definition_depth;

        let externals = visit::external_functions(program);
        if !externals.is_empty() {
            self.ffi_preamble();
            self.ffi_registrations(&externals);
            for external in &externals {
                self.ffi_wrapper(external);
            }
        }

        let definitions = || program.statements.iter();
        for stmt in definitions().filter(|s| matches!(s, Stmt::Interface(_))) {
            self.stmt(stmt);
        }
        for stmt in definitions().filter(|s| matches!(s, Stmt::Class(_))) {
            self.stmt(stmt);
        }
        if self.platform == Platform::Cpp {
            self.cpp_prototypes(&program.statements);
        }
        for stmt in definitions().filter(|s| matches!(s, Stmt::Function(_))) {
            self.stmt(stmt);
        }

        self.depth = 0;
        self.raw_lines(scaffold.entry_open);
        self.depth = scaffold.entry_depth;
        for stmt in program.statements.iter().filter(|s| !s.is_declaration()) {
            self.stmt(stmt);
        }
        self.depth = 0;
        self.raw_lines(scaffold.entry_close);
    }

    /// Declarations for every top-level function whose signature is fully
    /// typed, so definitions may call each other in any order.
    fn cpp_prototypes(&mut self, statements: &[Stmt]) {
        let mut any = false;
        for stmt in statements {
            let Stmt::Function(function) = stmt else { continue };
            let typed_params = function.params.iter().all(|p| p.type_annotation.is_some());
            let typed_return =
                function.return_type.is_some() || !visit::returns_value(&function.body);
            if typed_params && typed_return {
                let header = self.signature(function, Callable::TopLevel);
                self.line(&format!("{header};"));
                any = true;
            }
        }
        if any {
            self.line("");
        }
    }

    // -----------------------------------------------------------------
    // Foreign functions
    // -----------------------------------------------------------------

    fn ffi_preamble(&mut self) {
        match self.platform {
            Platform::Python => {
                self.line("from agk_ffi import register_external_function, call_external_function");
            }
            _ => self.line("// AGK foreign function bindings"),
        }
    }

    /// Registration calls, ahead of every translated declaration. Compiled
    /// platforms run them from a static initializer.
    fn ffi_registrations(&mut self, externals: &[&ExternalFunctionDef]) {
        let calls: Vec<String> = externals
            .iter()
            .map(|external| {
                let signature = escape(&external.signature(), self.platform);
                let call = match self.platform {
                    Platform::Python | Platform::Cpp => {
                        format!("register_external_function(\"{signature}\")")
                    }
                    Platform::JavaScript | Platform::Kotlin | Platform::Swift => {
                        format!("registerExternalFunction(\"{signature}\")")
                    }
                    Platform::CSharp => format!("AgkFfi.RegisterExternalFunction(\"{signature}\")"),
                };
                self.terminated(call)
            })
            .collect();
        match self.platform {
            Platform::Python | Platform::JavaScript => {
                for call in &calls {
                    self.line(call);
                }
            }
            Platform::Kotlin => self.block(
                &format!("private val {REGISTERED_FLAG}: Boolean = run {{"),
                &calls,
                "true",
                "}",
            ),
            Platform::Swift => self.block(
                &format!("private let {REGISTERED_FLAG}: Bool = {{"),
                &calls,
                "return true",
                "}()",
            ),
            Platform::Cpp => self.block(
                "static const bool agk_externals_registered = [] {",
                &calls,
                "return true;",
                "}();",
            ),
            Platform::CSharp => self.block("static Program() {", &calls, "", "}"),
        }
        self.line("");
    }

    fn block(&mut self, open: &str, body: &[String], last: &str, close: &str) {
        self.line(open);
        self.indented(|e| {
            for text in body {
                e.line(text);
            }
            if !last.is_empty() {
                e.line(last);
            }
        });
        self.line(close);
    }

    /// A thin function that forwards its arguments to the call-by-name
    /// dispatcher.
    fn ffi_wrapper(&mut self, external: &ExternalFunctionDef) {
        let name = &external.name;
        let args: Vec<&str> = external.params.iter().map(|p| p.name.as_str()).collect();
        let args = args.join(", ");
        let returns = !matches!(Type::from_annotation(&external.return_type), Type::Void);
        let ret = self.table.map_type(&external.return_type);
        let params = self.params(&external.params);
        let (header, forward) = match self.platform {
            Platform::Python => (
                format!("def {name}({params}) -> {ret}:"),
                format!("call_external_function('{name}', [{args}])"),
            ),
            Platform::JavaScript => (
                format!("function {name}({params}) {{"),
                format!("callExternalFunction(\"{name}\", [{args}])"),
            ),
            Platform::Kotlin => (
                if returns {
                    format!("fun {name}({params}): {ret} {{")
                } else {
                    format!("fun {name}({params}) {{")
                },
                if returns {
                    format!("callExternalFunction(\"{name}\", listOf({args})) as {ret}")
                } else {
                    format!("callExternalFunction(\"{name}\", listOf({args}))")
                },
            ),
            Platform::Swift => (
                if returns {
                    format!("func {name}({params}) -> {ret} {{")
                } else {
                    format!("func {name}({params}) {{")
                },
                if returns {
                    format!("callExternalFunction(\"{name}\", [{args}]) as! {ret}")
                } else {
                    format!("callExternalFunction(\"{name}\", [{args}])")
                },
            ),
            Platform::Cpp => (
                format!("{ret} {name}({params}) {{"),
                if returns {
                    format!("std::any_cast<{ret}>(call_external_function(\"{name}\", {{{args}}}))")
                } else {
                    format!("call_external_function(\"{name}\", {{{args}}})")
                },
            ),
            Platform::CSharp => (
                format!("static {ret} {name}({params}) {{"),
                if returns {
                    format!("({ret})AgkFfi.CallExternalFunction(\"{name}\", new object[] {{ {args} }})")
                } else {
                    format!("AgkFfi.CallExternalFunction(\"{name}\", new object[] {{ {args} }})")
                },
            ),
        };
        self.line(&header);
        let body = if returns { format!("return {forward}") } else { forward };
        let body = self.terminated(body);
        // Swift globals initialize lazily, on first read.
        let touch = self.platform == Platform::Swift;
        self.indented(|e| {
            if touch {
                e.line(&format!("_ = {REGISTERED_FLAG}"));
            }
            e.line(&body);
        });
        if !self.python() {
            self.line("}");
        }
        self.line("");
    }

    // -----------------------------------------------------------------
    // Types and signatures
    // -----------------------------------------------------------------

    fn type_of(&self, annotation: Option<&TypeNode>) -> String {
        match annotation {
            Some(ty) => self.table.map_type(ty),
            None => self.table.any_type().to_string(),
        }
    }

    fn param(&self, param: &Parameter) -> String {
        let name = &param.name;
        let ty = param.type_annotation.as_ref();
        match self.platform {
            Platform::Python => match ty {
                Some(ty) => format!("{name}: {}", self.table.map_type(ty)),
                None => name.clone(),
            },
            Platform::JavaScript => name.clone(),
            Platform::Kotlin => format!("{name}: {}", self.type_of(ty)),
            Platform::Swift => format!("_ {name}: {}", self.type_of(ty)),
            Platform::Cpp | Platform::CSharp => format!("{} {name}", self.type_of(ty)),
        }
    }

    fn params(&self, params: &[Parameter]) -> String {
        params.iter().map(|p| self.param(p)).collect::<Vec<_>>().join(", ")
    }

    /// Spelled return type, or `None` when the function returns nothing.
    fn return_type(&self, function: &FunctionDef) -> Option<String> {
        match &function.return_type {
            Some(ty) if Type::from_annotation(ty) == Type::Void => None,
            Some(ty) => Some(self.table.map_type(ty)),
            None if visit::returns_value(&function.body) => Some(self.table.any_type().to_string()),
            None => None,
        }
    }

    fn void_name(&self) -> &'static str {
        self.table.primitive(&Type::Void).unwrap_or("void")
    }

    /// Declaration line of a function, without the opening brace or colon.
    fn signature(&self, function: &FunctionDef, callable: Callable) -> String {
        let name = &function.name;
        let ret = self.return_type(function);
        let is_static = function.modifiers.is_static;
        let visibility = function.modifiers.visibility.map(Visibility::keyword);
        match self.platform {
            Platform::Python => {
                let mut params = Vec::new();
                if matches!(callable, Callable::Method | Callable::Abstract) && !is_static {
                    params.push("self".to_string());
                }
                params.extend(function.params.iter().map(|p| self.param(p)));
                let ret = match (&function.return_type, ret) {
                    (Some(_), Some(ret)) => format!(" -> {ret}"),
                    (Some(_), None) => " -> None".to_string(),
                    (None, _) => String::new(),
                };
                format!("def {name}({}){ret}", params.join(", "))
            }
            Platform::JavaScript => {
                let params = self.params(&function.params);
                match callable {
                    Callable::Method | Callable::Abstract if is_static => format!("static {name}({params})"),
                    Callable::Method | Callable::Abstract => format!("{name}({params})"),
                    _ => format!("function {name}({params})"),
                }
            }
            Platform::Kotlin => {
                let params = self.params(&function.params);
                let ret = ret.map(|r| format!(": {r}")).unwrap_or_default();
                let prefix = match callable {
                    Callable::Method => visibility.map(|v| format!("{v} ")).unwrap_or_default(),
                    _ => String::new(),
                };
                format!("{prefix}fun {name}({params}){ret}")
            }
            Platform::Swift => {
                let params = self.params(&function.params);
                let ret = ret.map(|r| format!(" -> {r}")).unwrap_or_default();
                let mut prefix = String::new();
                if callable == Callable::Method {
                    if let Some(v) = visibility {
                        // Swift spells protected access as internal
                        prefix.push_str(if v == "protected" { "internal " } else { v });
                        if v != "protected" {
                            prefix.push(' ');
                        }
                    }
                    if is_static {
                        prefix.push_str("static ");
                    }
                }
                format!("{prefix}func {name}({params}){ret}")
            }
            Platform::Cpp => {
                let params = self.params(&function.params);
                let ret = ret.unwrap_or_else(|| self.void_name().to_string());
                match callable {
                    Callable::Nested => format!("auto {name} = [&]({params})"),
                    Callable::Abstract => format!("virtual {ret} {name}({params}) = 0"),
                    Callable::Method if is_static => format!("static {ret} {name}({params})"),
                    _ => format!("{ret} {name}({params})"),
                }
            }
            Platform::CSharp => {
                let params = self.params(&function.params);
                let ret = ret.unwrap_or_else(|| self.void_name().to_string());
                match callable {
                    Callable::TopLevel => format!("static {ret} {name}({params})"),
                    Callable::Nested | Callable::Abstract => format!("{ret} {name}({params})"),
                    Callable::Method => {
                        let visibility = visibility.unwrap_or("public");
                        let modifier = if is_static { " static" } else { "" };
                        format!("{visibility}{modifier} {ret} {name}({params})")
                    }
                }
            }
        }
    }

    /// JSDoc block carrying the types JavaScript cannot spell inline.
    fn js_doc(&mut self, function: &FunctionDef) {
        let typed = function.params.iter().any(|p| p.type_annotation.is_some())
            || function.return_type.is_some();
        if !typed {
            return;
        }
        self.line("/**");
        for param in &function.params {
            let ty = self.type_of(param.type_annotation.as_ref());
            self.line(&format!(" * @param {{{ty}}} {}", param.name));
        }
        if let Some(ty) = &function.return_type {
            let ty = self.table.map_type(ty);
            self.line(&format!(" * @returns {{{ty}}}"));
        }
        self.line(" */");
    }

    // -----------------------------------------------------------------
    // Blocks
    // -----------------------------------------------------------------

    fn body(&mut self, stmts: &[Stmt]) {
        self.indented(|e| {
            if stmts.is_empty() && e.python() {
                e.line("pass");
            }
            for stmt in stmts {
                e.stmt(stmt);
            }
        });
    }

    /// `header:` plus an indented body, or `header {` ... `}`.
    fn suite(&mut self, header: &str, stmts: &[Stmt]) {
        self.open(header);
        self.body(stmts);
        self.close();
    }

    fn open(&mut self, header: &str) {
        if self.python() {
            self.line(&format!("{header}:"));
        } else {
            self.line(&format!("{header} {{"));
        }
    }

    fn close(&mut self) {
        if !self.python() {
            self.line("}");
        }
    }

    /// `if c`, `if (c)`; Swift and Python need no parentheses.
    fn condition(&self, keyword: &str, condition: &Expr) -> String {
        let condition = self.expr(condition);
        match self.platform {
            Platform::Python | Platform::Swift => format!("{keyword} {condition}"),
            _ => format!("{keyword} ({condition})"),
        }
    }

    // -----------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Function(function) => {
                let callable = if self.depth > self.table.scaffold().definition_depth
                    || self.in_entry()
                {
                    Callable::Nested
                } else {
                    Callable::TopLevel
                };
                self.function(function, callable);
            }
            Stmt::External(_) => {}
            Stmt::Class(class) => self.class(class),
            Stmt::Interface(interface) => self.interface(interface),
            Stmt::Variable(decl) => {
                let text = self.declaration(decl);
                self.line(&text);
            }
            Stmt::Assignment(assignment) => {
                let text = format!(
                    "{} {} {}",
                    self.expr(&assignment.target),
                    assignment.op.symbol(),
                    self.expr(&assignment.value)
                );
                let text = self.terminated(text);
                self.line(&text);
            }
            Stmt::If(stmt) => self.if_statement(stmt),
            Stmt::For(stmt) => {
                let iterable = self.expr(&stmt.iterable);
                let name = &stmt.iterator;
                let header = match self.platform {
                    Platform::Python => format!("for {name} in {iterable}"),
                    Platform::JavaScript => format!("for (const {name} of {iterable})"),
                    Platform::Kotlin => format!("for ({name} in {iterable})"),
                    Platform::Swift => format!("for {name} in {iterable}"),
                    Platform::Cpp => format!("for (auto {name} : {iterable})"),
                    Platform::CSharp => format!("foreach (var {name} in {iterable})"),
                };
                self.suite(&header, &stmt.body);
            }
            Stmt::While(stmt) => {
                let header = self.condition("while", &stmt.condition);
                self.suite(&header, &stmt.body);
            }
            Stmt::Return(ret) => {
                let text = match &ret.value {
                    Some(value) => format!("return {}", self.expr(value)),
                    None => "return".to_string(),
                };
                let text = self.terminated(text);
                self.line(&text);
            }
            Stmt::Break(_) => {
                let text = self.terminated("break".to_string());
                self.line(&text);
            }
            Stmt::Continue(_) => {
                let text = self.terminated("continue".to_string());
                self.line(&text);
            }
            Stmt::TryCatch(stmt) => self.try_catch(stmt),
            Stmt::Throw(throw) => {
                let keyword = if self.python() { "raise" } else { "throw" };
                let text = self.terminated(format!("{keyword} {}", self.expr(&throw.value)));
                self.line(&text);
            }
            Stmt::Expression(expr) => {
                let text = self.terminated(self.expr(expr));
                self.line(&text);
            }
        }
    }

    /// Whether emission is currently inside the entry point. Python has no
    /// entry point, so its top level never counts.
    fn in_entry(&self) -> bool {
        let scaffold = self.table.scaffold();
        !scaffold.entry_open.is_empty() && self.depth >= scaffold.entry_depth && self.depth > 0
    }

    fn function(&mut self, function: &FunctionDef, callable: Callable) {
        if self.platform == Platform::JavaScript && callable != Callable::Nested {
            self.js_doc(function);
        }
        if self.python() && function.modifiers.is_static && callable == Callable::Method {
            self.line("@staticmethod");
        }
        let header = self.signature(function, callable);
        if self.platform == Platform::Cpp && callable == Callable::Nested {
            self.line(&format!("{header} {{"));
            self.body(&function.body);
            self.line("};");
        } else {
            self.suite(&header, &function.body);
        }
        if callable != Callable::Nested {
            self.line("");
        }
    }

    fn if_statement(&mut self, stmt: &IfStatement) {
        let header = self.condition("if", &stmt.condition);
        self.open(&header);
        self.body(&stmt.then_body);
        for branch in &stmt.elif_branches {
            if self.python() {
                let header = self.condition("elif", &branch.condition);
                self.line(&format!("{header}:"));
            } else {
                let header = self.condition("if", &branch.condition);
                self.line(&format!("}} else {header} {{"));
            }
            self.body(&branch.body);
        }
        if let Some(body) = &stmt.else_body {
            self.line(if self.python() { "else:" } else { "} else {" });
            self.body(body);
        }
        self.close();
    }

    fn exception_type(&self, name: &str) -> String {
        let generic = matches!(name, "Exception" | "Error");
        match self.platform {
            Platform::JavaScript if generic => "Error".to_string(),
            Platform::Swift if generic => "Error".to_string(),
            Platform::Cpp if generic => "std::exception".to_string(),
            Platform::Python | Platform::Kotlin | Platform::CSharp if generic => "Exception".to_string(),
            _ => name.to_string(),
        }
    }

    fn try_catch(&mut self, stmt: &TryCatchStatement) {
        match self.platform {
            Platform::Python => {
                self.suite("try", &stmt.body);
                for clause in &stmt.catches {
                    let ty = self.exception_type(&clause.exception_type);
                    let header = match &clause.binding {
                        Some(binding) => format!("except {ty} as {binding}"),
                        None => format!("except {ty}"),
                    };
                    self.suite(&header, &clause.body);
                }
                if let Some(body) = &stmt.finally {
                    self.suite("finally", body);
                }
                if stmt.catches.is_empty() && stmt.finally.is_none() {
                    self.suite("finally", &[]);
                }
            }
            Platform::JavaScript => {
                self.line("try {");
                self.body(&stmt.body);
                self.js_catches(&stmt.catches);
                if let Some(body) = &stmt.finally {
                    self.line("} finally {");
                    self.body(body);
                }
                if stmt.catches.is_empty() && stmt.finally.is_none() {
                    self.line("} finally {");
                }
                self.line("}");
            }
            Platform::Swift => {
                self.line("do {");
                self.body(&stmt.body);
                for clause in &stmt.catches {
                    let ty = self.exception_type(&clause.exception_type);
                    let header = match (&clause.binding, ty.as_str()) {
                        (Some(binding), "Error") => format!("}} catch let {binding} {{"),
                        (Some(binding), _) => format!("}} catch let {binding} as {ty} {{"),
                        (None, "Error") => "} catch {".to_string(),
                        (None, _) => format!("}} catch is {ty} {{"),
                    };
                    self.line(&header);
                    self.body(&clause.body);
                }
                self.line("}");
                if let Some(body) = &stmt.finally {
                    self.trailing_finally(body);
                }
            }
            Platform::Cpp => {
                self.line("try {");
                self.body(&stmt.body);
                for clause in &stmt.catches {
                    let ty = self.exception_type(&clause.exception_type);
                    let header = match &clause.binding {
                        Some(binding) => format!("}} catch (const {ty}& {binding}) {{"),
                        None => format!("}} catch (const {ty}&) {{"),
                    };
                    self.line(&header);
                    self.body(&clause.body);
                }
                if stmt.catches.is_empty() {
                    self.line("} catch (...) {");
                    self.indented(|e| e.line("throw;"));
                }
                self.line("}");
                if let Some(body) = &stmt.finally {
                    self.trailing_finally(body);
                }
            }
            Platform::Kotlin | Platform::CSharp => {
                self.line("try {");
                self.body(&stmt.body);
                for clause in &stmt.catches {
                    let ty = self.exception_type(&clause.exception_type);
                    let header = match (&clause.binding, self.platform) {
                        (Some(binding), Platform::Kotlin) => format!("}} catch ({binding}: {ty}) {{"),
                        (None, Platform::Kotlin) => format!("}} catch (e: {ty}) {{"),
                        (Some(binding), _) => format!("}} catch ({ty} {binding}) {{"),
                        (None, _) => format!("}} catch ({ty}) {{"),
                    };
                    self.line(&header);
                    self.body(&clause.body);
                }
                if let Some(body) = &stmt.finally {
                    self.line("} finally {");
                    self.body(body);
                }
                if stmt.catches.is_empty() && stmt.finally.is_none() {
                    self.line("} finally {");
                }
                self.line("}");
            }
        }
    }

    /// One JavaScript `catch` dispatching on `instanceof` when several
    /// clauses are present.
    fn js_catches(&mut self, catches: &[CatchClause]) {
        match catches {
            [] => {}
            [only] if self.exception_type(&only.exception_type) == "Error" => {
                let binding = only.binding.as_deref().unwrap_or("error");
                self.line(&format!("}} catch ({binding}) {{"));
                self.body(&only.body);
            }
            clauses => {
                self.line("} catch (error) {");
                self.indented(|e| {
                    for (i, clause) in clauses.iter().enumerate() {
                        let ty = e.exception_type(&clause.exception_type);
                        let header = if i == 0 {
                            format!("if (error instanceof {ty}) {{")
                        } else {
                            format!("}} else if (error instanceof {ty}) {{")
                        };
                        e.line(&header);
                        e.indented(|e| {
                            if let Some(binding) = &clause.binding {
                                e.line(&format!("const {binding} = error;"));
                            }
                        });
                        e.body(&clause.body);
                    }
                    e.line("} else {");
                    e.indented(|e| e.line("throw error;"));
                    e.line("}");
                });
            }
        }
    }

    /// Platforms without `finally` run the clause after the handlers.
    fn trailing_finally(&mut self, body: &[Stmt]) {
        self.line("// finally");
        for stmt in body {
            self.stmt(stmt);
        }
    }

    // -----------------------------------------------------------------
    // Declarations
    // -----------------------------------------------------------------

    /// Zero value of a primitive type, when the platform needs one.
    fn default_value(&self, ty: &Type) -> Option<&'static str> {
        let python = self.python();
        match ty {
            Type::Int => Some("0"),
            Type::Float => Some(match self.platform {
                Platform::Python | Platform::Swift => "0.0",
                Platform::JavaScript => "0",
                _ => "0.0f",
            }),
            Type::Text => Some("\"\""),
            Type::Bool => Some(if python { "False" } else { "false" }),
            _ => None,
        }
    }

    fn declaration(&self, decl: &VariableDecl) -> String {
        self.declaration_in(decl, false)
    }

    /// A variable, constant or field declaration. `field` selects the member
    /// spelling for class bodies.
    fn declaration_in(&self, decl: &VariableDecl, field: bool) -> String {
        let name = &decl.name;
        let constant = decl.is_constant() || decl.modifiers.is_final;
        let annotation = decl.type_annotation.as_ref();
        let semantic = annotation.map(Type::from_annotation);
        let init = decl.initializer.as_ref().map(|e| self.expr(e));
        let ty = annotation.map(|t| self.table.map_type(t));
        let default = semantic.as_ref().and_then(|t| self.default_value(t));

        match self.platform {
            Platform::Python => {
                let target = if field { format!("self.{name}") } else { name.clone() };
                let value = init.or(default.map(str::to_string)).unwrap_or_else(|| "None".into());
                match ty {
                    Some(ty) if !field => format!("{target}: {ty} = {value}"),
                    _ => format!("{target} = {value}"),
                }
            }
            Platform::JavaScript => {
                if field {
                    let value = init.or(default.map(str::to_string)).unwrap_or_else(|| "null".into());
                    let prefix = if decl.modifiers.is_static { "static " } else { "" };
                    return format!("{prefix}{name} = {value};");
                }
                let keyword = if constant { "const" } else { "let" };
                match init.or(default.map(str::to_string)) {
                    Some(value) => format!("{keyword} {name} = {value};"),
                    None => format!("let {name} = null;"),
                }
            }
            Platform::Kotlin => {
                let keyword = if constant { "val" } else { "var" };
                let prefix = match decl.modifiers.visibility {
                    Some(v) if field => format!("{} ", v.keyword()),
                    _ => String::new(),
                };
                match (ty, init) {
                    (Some(ty), Some(value)) => format!("{prefix}{keyword} {name}: {ty} = {value}"),
                    (None, Some(value)) => format!("{prefix}{keyword} {name} = {value}"),
                    (Some(ty), None) => match default {
                        Some(value) => format!("{prefix}{keyword} {name}: {ty} = {value}"),
                        None => format!("{prefix}{keyword} {name}: {} = null", self.table.nullable_type(&ty)),
                    },
                    (None, None) => format!("{prefix}var {name}: Any? = null"),
                }
            }
            Platform::Swift => {
                let keyword = if constant { "let" } else { "var" };
                let prefix = if decl.modifiers.is_static && field { "static " } else { "" };
                match (ty, init) {
                    (Some(ty), Some(value)) => format!("{prefix}{keyword} {name}: {ty} = {value}"),
                    (None, Some(value)) => format!("{prefix}{keyword} {name} = {value}"),
                    (Some(ty), None) => match default {
                        Some(value) => format!("{prefix}{keyword} {name}: {ty} = {value}"),
                        None => format!("{prefix}var {name}: {}", self.table.nullable_type(&ty)),
                    },
                    (None, None) => format!("{prefix}var {name}: Any?"),
                }
            }
            Platform::Cpp => {
                let konst = if constant && !field { "const " } else { "" };
                let stat = if decl.modifiers.is_static && field { "static " } else { "" };
                match (ty, init) {
                    (Some(ty), Some(value)) if ty != "auto" => format!("{stat}{konst}{ty} {name} = {value};"),
                    (_, Some(value)) if field => format!("{stat}std::any {name} = {value};"),
                    (_, Some(value)) => format!("{konst}auto {name} = {value};"),
                    (Some(ty), None) if ty != "auto" => format!("{stat}{ty} {name}{{}};"),
                    (_, None) => format!("{stat}std::any {name};"),
                }
            }
            Platform::CSharp => {
                let mut prefix = String::new();
                if field {
                    prefix.push_str(decl.modifiers.visibility.map(Visibility::keyword).unwrap_or("public"));
                    prefix.push(' ');
                    if decl.modifiers.is_static {
                        prefix.push_str("static ");
                    }
                    if constant {
                        prefix.push_str("readonly ");
                    }
                }
                match (ty, init) {
                    (Some(ty), Some(value)) => format!("{prefix}{ty} {name} = {value};"),
                    (None, Some(value)) if field => format!("{prefix}object {name} = {value};"),
                    (None, Some(value)) => format!("var {name} = {value};"),
                    (Some(ty), None) => format!("{prefix}{ty} {name} = default;"),
                    (None, None) => format!("{prefix}object {name} = null;"),
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Classes and interfaces
    // -----------------------------------------------------------------

    fn class_header(&self, class: &ClassDef) -> String {
        let name = &class.name;
        let bases: Vec<&str> = class
            .superclasses
            .iter()
            .chain(&class.interfaces)
            .map(String::as_str)
            .collect();
        match self.platform {
            Platform::Python if bases.is_empty() => format!("class {name}"),
            Platform::Python => format!("class {name}({})", bases.join(", ")),
            Platform::JavaScript => match class.superclasses.first() {
                Some(base) => format!("class {name} extends {base}"),
                None => format!("class {name}"),
            },
            Platform::Kotlin => {
                let keyword = if class.modifiers.is_abstract {
                    "abstract class"
                } else if class.modifiers.is_final {
                    "class"
                } else {
                    "open class"
                };
                let mut supers: Vec<String> = Vec::new();
                for base in &class.superclasses {
                    // secondary constructors delegate to super() themselves
                    if class.constructors.is_empty() {
                        supers.push(format!("{base}()"));
                    } else {
                        supers.push(base.clone());
                    }
                }
                supers.extend(class.interfaces.iter().cloned());
                if supers.is_empty() {
                    format!("{keyword} {name}")
                } else {
                    format!("{keyword} {name} : {}", supers.join(", "))
                }
            }
            Platform::Swift | Platform::CSharp if bases.is_empty() => format!("class {name}"),
            Platform::Swift => format!("class {name}: {}", bases.join(", ")),
            Platform::CSharp => format!("class {name} : {}", bases.join(", ")),
            Platform::Cpp if bases.is_empty() => format!("class {name}"),
            Platform::Cpp => {
                let bases: Vec<String> = bases.iter().map(|b| format!("public {b}")).collect();
                format!("class {name} : {}", bases.join(", "))
            }
        }
    }

    fn class(&mut self, class: &ClassDef) {
        let header = self.class_header(class);
        self.open(&header);
        self.indented(|e| {
            if e.platform == Platform::Cpp {
                e.depth -= 1;
                e.line("public:");
                e.depth += 1;
            }
            if e.python() {
                e.python_class_body(class);
                return;
            }
            for field in &class.fields {
                let text = e.declaration_in(field, true);
                e.line(&text);
            }
            if !class.fields.is_empty() {
                e.line("");
            }
            for constructor in &class.constructors {
                e.constructor(class, constructor);
            }
            for method in &class.methods {
                e.function(method, Callable::Method);
            }
            e.trim_blank_line();
        });
        if self.platform == Platform::Cpp {
            self.line("};");
        } else {
            self.close();
        }
        self.line("");
    }

    /// Python has no field declarations; fields are assigned in `__init__`.
    fn python_class_body(&mut self, class: &ClassDef) {
        let assign_fields = |e: &mut Self| {
            for field in &class.fields {
                let text = e.declaration_in(field, true);
                e.line(&text);
            }
        };
        if class.constructors.is_empty() && !class.fields.is_empty() {
            self.line("def __init__(self):");
            self.indented(assign_fields);
            self.line("");
        }
        for constructor in &class.constructors {
            let mut params = vec!["self".to_string()];
            params.extend(constructor.params.iter().map(|p| self.param(p)));
            self.line(&format!("def __init__({}):", params.join(", ")));
            self.indented(|e| {
                assign_fields(e);
                if constructor.body.is_empty() && class.fields.is_empty() {
                    e.line("pass");
                }
                for stmt in &constructor.body {
                    e.stmt(stmt);
                }
            });
            self.line("");
        }
        for method in &class.methods {
            self.function(method, Callable::Method);
        }
        if class.constructors.is_empty() && class.fields.is_empty() && class.methods.is_empty() {
            self.line("pass");
        }
        self.trim_blank_line();
    }

    fn constructor(&mut self, class: &ClassDef, constructor: &ConstructorDef) {
        let params = self.params(&constructor.params);
        let has_super = !class.superclasses.is_empty();
        let header = match self.platform {
            Platform::JavaScript => format!("constructor({params})"),
            Platform::Kotlin if has_super => format!("constructor({params}) : super()"),
            Platform::Kotlin => format!("constructor({params})"),
            Platform::Swift => format!("init({params})"),
            Platform::Cpp => format!("{}({params})", class.name),
            Platform::CSharp | Platform::Python => {
                let visibility = constructor.visibility.map(Visibility::keyword).unwrap_or("public");
                format!("{visibility} {}({params})", class.name)
            }
        };
        self.open(&header);
        self.indented(|e| {
            if e.platform == Platform::JavaScript && has_super {
                e.line("super();");
            }
            for stmt in &constructor.body {
                e.stmt(stmt);
            }
            if e.platform == Platform::Swift && has_super {
                e.line("super.init()");
            }
        });
        self.close();
        self.line("");
    }

    fn interface(&mut self, interface: &InterfaceDef) {
        let name = &interface.name;
        match self.platform {
            Platform::Python | Platform::JavaScript => {
                self.open(&format!("class {name}"));
                self.indented(|e| {
                    if interface.methods.is_empty() && e.python() {
                        e.line("pass");
                    }
                    for method in &interface.methods {
                        let header = e.signature(method, Callable::Abstract);
                        e.open(&header);
                        e.indented(|e| {
                            e.line(if e.python() {
                                "raise NotImplementedError"
                            } else {
                                "throw new Error(\"not implemented\");"
                            });
                        });
                        e.close();
                    }
                });
                self.close();
            }
            Platform::Cpp => {
                self.line(&format!("class {name} {{"));
                self.line("public:");
                self.indented(|e| {
                    e.line(&format!("virtual ~{name}() = default;"));
                    for method in &interface.methods {
                        let header = e.signature(method, Callable::Abstract);
                        e.line(&format!("{header};"));
                    }
                });
                self.line("};");
            }
            Platform::Kotlin | Platform::Swift | Platform::CSharp => {
                let keyword = if self.platform == Platform::Swift { "protocol" } else { "interface" };
                self.line(&format!("{keyword} {name} {{"));
                self.indented(|e| {
                    for method in &interface.methods {
                        let header = e.signature(method, Callable::Abstract);
                        let text = e.terminated(header);
                        e.line(&text);
                    }
                });
                self.line("}");
            }
        }
        self.line("");
    }

    fn trim_blank_line(&mut self) {
        if self.out.ends_with("\n\n") {
            self.out.pop();
        }
    }

    // -----------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------

    /// Binding strength of `expr` in target syntax. Python's `not` binds
    /// looser than comparisons.
    fn precedence(&self, expr: &Expr) -> u8 {
        match expr {
            Expr::Unary(UnaryOp { op: UnaryOperator::Not, .. }) if self.python() => {
                BinaryOperator::And.precedence()
            }
            other => other.precedence(),
        }
    }

    fn operand(&self, expr: &Expr, parenthesize: bool) -> String {
        let text = self.expr(expr);
        if parenthesize { format!("({text})") } else { text }
    }

    /// Operand of `.`, `[]` or a call receiver.
    fn postfix_operand(&self, expr: &Expr) -> String {
        self.operand(expr, self.precedence(expr) <= UNARY_PRECEDENCE)
    }

    fn list(&self, items: &[Expr]) -> String {
        items.iter().map(|e| self.expr(e)).collect::<Vec<_>>().join(", ")
    }

    fn this(&self) -> &'static str {
        match self.platform {
            Platform::Python | Platform::Swift => "self",
            _ => "this",
        }
    }

    /// `object.member`, with C++ reaching members of `this` through `->`.
    fn member(&self, object: &Expr, member: &str) -> String {
        match (object, self.platform) {
            (Expr::This(_), Platform::Cpp) => format!("this->{member}"),
            _ => format!("{}.{member}", self.postfix_operand(object)),
        }
    }

    fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Binary(b) => {
                let prec = b.op.precedence();
                let left = self.operand(&b.left, self.precedence(&b.left) < prec);
                let right = self.operand(&b.right, self.precedence(&b.right) <= prec);
                let symbol = match (b.op, self.python()) {
                    (BinaryOperator::And, true) => "and",
                    (BinaryOperator::Or, true) => "or",
                    (op, _) => op.symbol(),
                };
                format!("{left} {symbol} {right}")
            }
            Expr::Unary(u) => {
                let nested = matches!(*u.operand, Expr::Unary(_));
                let operand = self.operand(
                    &u.operand,
                    nested || self.precedence(&u.operand) < UNARY_PRECEDENCE,
                );
                match (u.op, self.python()) {
                    (UnaryOperator::Not, true) => format!("not {operand}"),
                    (op, _) => format!("{}{operand}", op.symbol()),
                }
            }
            Expr::Call(call) => self.call(call),
            Expr::Attribute(a) => self.member(&a.object, &a.attribute),
            Expr::Index(i) => format!("{}[{}]", self.postfix_operand(&i.array), self.expr(&i.index)),
            Expr::Literal(literal) => self.literal(&literal.value),
            Expr::Variable(v) => v.name.clone(),
            Expr::This(_) => self.this().to_string(),
            Expr::List(l) => self.list_literal(&l.items),
            Expr::Dict(d) => self.dict_literal(&d.entries),
            Expr::New(n) => {
                let args = self.list(&n.args);
                match self.platform {
                    Platform::JavaScript | Platform::CSharp => format!("new {}({args})", n.class_name),
                    _ => format!("{}({args})", n.class_name),
                }
            }
        }
    }

    fn call(&self, call: &FunctionCall) -> String {
        let args: Vec<String> = call.args.iter().map(|a| self.expr(a)).collect();
        if let Some(receiver) = &call.receiver {
            return format!("{}({})", self.member(receiver, &call.callee), args.join(", "));
        }
        match find_builtin(&call.callee) {
            Some(builtin) if !self.declared.contains(&call.callee) => {
                self.table.builtin(builtin.kind, &args)
            }
            _ => format!("{}({})", call.callee, args.join(", ")),
        }
    }

    fn literal(&self, value: &LiteralValue) -> String {
        match value {
            LiteralValue::Int(v) => v.to_string(),
            LiteralValue::Float(v) => {
                let text = float_text(*v);
                match self.platform {
                    Platform::Kotlin | Platform::Cpp | Platform::CSharp => format!("{text}f"),
                    _ => text,
                }
            }
            LiteralValue::Text(s) => {
                let quoted = format!("\"{}\"", escape(s, self.platform));
                if self.platform == Platform::Cpp {
                    format!("std::string({quoted})")
                } else {
                    quoted
                }
            }
            LiteralValue::Bool(v) => match (v, self.python()) {
                (true, true) => "True".to_string(),
                (false, true) => "False".to_string(),
                (v, false) => v.to_string(),
            },
        }
    }

    fn list_literal(&self, items: &[Expr]) -> String {
        let items_text = self.list(items);
        match self.platform {
            Platform::Python | Platform::JavaScript | Platform::Swift => format!("[{items_text}]"),
            Platform::Kotlin => format!("mutableListOf({items_text})"),
            Platform::Cpp if items.is_empty() => "std::vector<std::any>{}".to_string(),
            Platform::Cpp => format!("std::vector{{{items_text}}}"),
            Platform::CSharp if items.is_empty() => "new List<object>()".to_string(),
            Platform::CSharp => format!("new[] {{ {items_text} }}.ToList()"),
        }
    }

    fn dict_literal(&self, entries: &[(Expr, Expr)]) -> String {
        let pairs = |sep: &str| -> Vec<String> {
            entries
                .iter()
                .map(|(k, v)| format!("{}{sep}{}", self.expr(k), self.expr(v)))
                .collect()
        };
        match self.platform {
            Platform::Python => format!("{{{}}}", pairs(": ").join(", ")),
            Platform::JavaScript => {
                let entries: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("[{}, {}]", self.expr(k), self.expr(v)))
                    .collect();
                format!("new Map([{}])", entries.join(", "))
            }
            Platform::Kotlin => format!("mutableMapOf({})", pairs(" to ").join(", ")),
            Platform::Swift if entries.is_empty() => "[:]".to_string(),
            Platform::Swift => format!("[{}]", pairs(": ").join(", ")),
            Platform::Cpp if entries.is_empty() => "std::map<std::string, std::any>{}".to_string(),
            Platform::Cpp => {
                let entries: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("std::pair{{{}, {}}}", self.expr(k), self.expr(v)))
                    .collect();
                format!("std::map{{{}}}", entries.join(", "))
            }
            Platform::CSharp => {
                let entries: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("[{}] = {}", self.expr(k), self.expr(v)))
                    .collect();
                if entries.is_empty() {
                    "new Dictionary<object, object>()".to_string()
                } else {
                    format!("new Dictionary<object, object> {{ {} }}", entries.join(", "))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    const ADD: &str =
        "define function add that takes a as Integer, b as Integer and returns Integer: return a + b";

    fn emit(src: &str, platform: Platform) -> String {
        let program = parse_source(src).expect("source parses");
        generate(&program, platform)
    }

    #[test]
    fn add_is_emitted_with_two_parameters_everywhere() {
        let expected = [
            (Platform::Python, "def add(a: int, b: int) -> int:"),
            (Platform::JavaScript, "function add(a, b) {"),
            (Platform::Kotlin, "fun add(a: Int, b: Int): Int {"),
            (Platform::Swift, "func add(_ a: Int, _ b: Int) -> Int {"),
            (Platform::Cpp, "int add(int a, int b) {"),
            (Platform::CSharp, "    static int add(int a, int b) {"),
        ];
        for (platform, header) in expected {
            let out = emit(ADD, platform);
            assert!(out.lines().any(|l| l == header), "{platform}:\n{out}");
            assert!(out.contains("return a + b"), "{platform}:\n{out}");
        }
    }

    #[test]
    fn python_output_is_indented_and_headed() {
        let out = emit(ADD, Platform::Python);
        assert!(out.starts_with("#!/usr/bin/env python3\n\"\"\"Generated by AGK Compiler\"\"\"\n"));
        assert!(out.contains("def add(a: int, b: int) -> int:\n    return a + b\n"));
    }

    #[test]
    fn entry_points_wrap_top_level_statements() {
        let src = "create x as Integer = 1\nprint(x)";
        let cpp = emit(src, Platform::Cpp);
        assert!(cpp.contains(
            "int main(int argc, char** argv) {\n    int x = 1;\n    std::cout << x << std::endl;\n    return 0;\n}\n"
        ));
        let kotlin = emit(src, Platform::Kotlin);
        assert!(kotlin.contains("        var x: Int = 1\n        println(x)\n    }\n}\n"));
        let js = emit(src, Platform::JavaScript);
        assert!(js.contains("window.addEventListener('load', function() {\n    let x = 1;\n    console.log(x);\n});"));
        let csharp = emit(src, Platform::CSharp);
        assert!(csharp.contains("    static void Main(string[] args) {\n        int x = 1;\n        Console.WriteLine(x);\n    }\n}\n"));
    }

    #[test]
    fn external_functions_register_and_forward() {
        let src = "external function sqrt(x as Float) from \"libm.so\" as Float\nprint(sqrt(2.0))";
        let out = emit(src, Platform::Python);
        assert!(out.contains("from agk_ffi import register_external_function, call_external_function\n"));
        assert!(out.contains(
            "register_external_function(\"external function sqrt(x as Float) from \\\"libm.so\\\" as Float\")"
        ));
        assert!(out.contains("def sqrt(x: float) -> float:\n    return call_external_function('sqrt', [x])\n"));
        assert!(out.contains("print(sqrt(2.0))"));

        let cpp = emit(src, Platform::Cpp);
        assert!(cpp.contains("return std::any_cast<float>(call_external_function(\"sqrt\", {x}));"));
        assert!(cpp.contains(
            "static const bool agk_externals_registered = [] {\n    register_external_function(\"external function sqrt"
        ));
    }

    #[test]
    fn registrations_come_before_every_declaration() {
        let src = "\
define function twice that takes x as Float and returns Float: return x * 2.0
external function sqrt(x as Float) from \"libm.so\" as Float
print(twice(sqrt(2.0)))
";
        for platform in Platform::ALL {
            let out = emit(src, platform);
            let registered_at = out
                .find("xternalFunction(\"external function sqrt")
                .or_else(|| out.find("register_external_function(\"external function sqrt"))
                .unwrap_or_else(|| panic!("{platform}: no registration\n{out}"));
            let wrapper_at = ["_function('sqrt'", "_function(\"sqrt\"", "ExternalFunction(\"sqrt\""]
                .iter()
                .find_map(|forward| out.find(forward))
                .unwrap_or_else(|| panic!("{platform}: no wrapper\n{out}"));
            let function_at = out.find("twice(").unwrap_or_else(|| panic!("{platform}: no function\n{out}"));
            assert!(registered_at < wrapper_at, "{platform}:\n{out}");
            assert!(registered_at < function_at, "{platform}:\n{out}");
        }

        let csharp = emit(src, Platform::CSharp);
        assert!(csharp.contains("    static Program() {\n        AgkFfi.RegisterExternalFunction("), "{csharp}");
        let swift = emit(src, Platform::Swift);
        assert!(swift.contains("private let agkExternalsRegistered: Bool = {\n"), "{swift}");
        assert!(swift.contains("    _ = agkExternalsRegistered\n    return callExternalFunction(\"sqrt\""), "{swift}");
        let kotlin = emit(src, Platform::Kotlin);
        assert!(kotlin.contains("private val agkExternalsRegistered: Boolean = run {\n"), "{kotlin}");
    }

    #[test]
    fn builtins_lower_unless_shadowed() {
        let out = emit("print(len(\"abc\"))", Platform::JavaScript);
        assert!(out.contains("console.log(\"abc\".length);"));

        let src = "define function print that takes x:\n    return x\nprint(1)";
        let out = emit(src, Platform::JavaScript);
        assert!(out.contains("    print(1);"), "{out}");
        assert!(!out.contains("console.log"));
    }

    #[test]
    fn operators_follow_platform_spelling() {
        let src = "create ok = not (1 < 2) and true";
        assert!(emit(src, Platform::Python).contains("ok = not (1 < 2) and True"));
        assert!(emit(src, Platform::Swift).contains("var ok = !(1 < 2) && true"));
        let grouped = emit("create n = (1 + 2) * 3", Platform::Kotlin);
        assert!(grouped.contains("var n = (1 + 2) * 3"));
    }

    #[test]
    fn control_flow_uses_blocks_or_indentation() {
        let src = "\
create n as Integer = 0
while n < 3:
    if n == 1:
        break
    else:
        set n to n + 1
for each item in [1, 2]:
    print(item)
";
        let python = emit(src, Platform::Python);
        assert!(python.contains("while n < 3:\n    if n == 1:\n        break\n    else:\n        n = n + 1\n"));
        assert!(python.contains("for item in [1, 2]:\n    print(item)\n"));
        let swift = emit(src, Platform::Swift);
        assert!(swift.contains("while n < 3 {"));
        assert!(swift.contains("for item in [1, 2] {"));
        let csharp = emit(src, Platform::CSharp);
        assert!(csharp.contains("} else {"));
        assert!(csharp.contains("foreach (var item in new[] { 1, 2 }.ToList()) {"));
    }

    #[test]
    fn classes_become_platform_classes() {
        let src = "\
define class Counter:
    count as Integer = 0
    define function bump:
        set this.count to this.count + 1
";
        let python = emit(src, Platform::Python);
        assert!(python.contains("class Counter:\n    def __init__(self):\n        self.count = 0\n"));
        assert!(python.contains("    def bump(self):\n        self.count = self.count + 1\n"));
        let cpp = emit(src, Platform::Cpp);
        assert!(cpp.contains("class Counter {\npublic:\n    int count = 0;\n"));
        assert!(cpp.contains("this->count = this->count + 1;"));
        assert!(cpp.contains("\n};\n"));
        let kotlin = emit(src, Platform::Kotlin);
        assert!(kotlin.contains("open class Counter {\n    var count: Int = 0\n"));
    }

    #[test]
    fn unknown_types_pass_through() {
        let out = emit("variable s as Sensor", Platform::CSharp);
        assert!(out.contains("Sensor s = default;"));
        let out = emit("variable s as Sensor", Platform::Swift);
        assert!(out.contains("var s: Sensor?"));
    }

    #[test]
    fn strings_are_escaped() {
        let out = emit("print('say \"hi\"')", Platform::Python);
        assert!(out.contains(r#"print("say \"hi\"")"#));
        let out = emit("print(\"cost $5\")", Platform::Kotlin);
        assert!(out.contains(r#"println("cost \$5")"#));
    }
}
