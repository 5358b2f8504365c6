//! Lexical scopes for the analyzer.
//!
//! Scopes live in an arena owned by [`ScopeTree`] and refer to their parent
//! by [`ScopeId`], so a child never holds a borrow of its parent. Names are
//! unique within one scope; lookup walks outward until the prelude.

use std::collections::HashMap;

use crate::ast::Visibility;
use crate::span::Span;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Builtins; the root of every tree.
    Prelude,
    Global,
    Function,
    Class,
    Loop,
    /// A `catch` clause carrying its exception binding.
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolRole {
    Variable,
    Parameter,
    /// Loop iterators and `catch` bindings.
    Binding,
    Function,
    Builtin,
    Class,
    Interface,
    /// A name brought in by `import`; its shape is unknown, so it may be
    /// called, constructed or read.
    Imported,
}

impl SymbolRole {
    pub fn is_callable(self) -> bool {
        matches!(self, SymbolRole::Function | SymbolRole::Builtin | SymbolRole::Imported)
    }

    pub fn is_class(self) -> bool {
        matches!(self, SymbolRole::Class | SymbolRole::Imported)
    }

    pub fn is_value(self) -> bool {
        matches!(
            self,
            SymbolRole::Variable | SymbolRole::Parameter | SymbolRole::Binding | SymbolRole::Imported
        )
    }

    pub fn describe(self) -> &'static str {
        match self {
            SymbolRole::Variable | SymbolRole::Binding => "variable",
            SymbolRole::Parameter => "parameter",
            SymbolRole::Function | SymbolRole::Builtin => "function",
            SymbolRole::Class => "class",
            SymbolRole::Interface => "interface",
            SymbolRole::Imported => "imported name",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub role: SymbolRole,
    /// Declared type of a value, or return type of a function. `None` for
    /// untyped declarations.
    pub ty: Option<Type>,
    pub is_constant: bool,
    pub visibility: Option<Visibility>,
    pub initialized: bool,
    pub used: bool,
    /// Inserted after an undeclared-name error so later references to the
    /// same name stay quiet.
    pub placeholder: bool,
    pub span: Span,
}

impl Symbol {
    pub fn new(name: impl Into<String>, role: SymbolRole, span: Span) -> Self {
        Symbol {
            name: name.into(),
            role,
            ty: None,
            is_constant: false,
            visibility: None,
            initialized: true,
            used: false,
            placeholder: false,
            span,
        }
    }

    pub fn with_type(mut self, ty: Option<Type>) -> Self {
        self.ty = ty;
        self
    }

    pub fn uninitialized(mut self) -> Self {
        self.initialized = false;
        self
    }

    pub fn placeholder(mut self) -> Self {
        self.placeholder = true;
        self.used = true;
        self
    }
}

#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    kind: ScopeKind,
    name: String,
    symbols: Vec<Symbol>,
    index: HashMap<String, usize>,
    children: Vec<ScopeId>,
}

#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// A tree holding only the empty prelude scope.
    pub fn new() -> Self {
        ScopeTree {
            scopes: vec![Scope {
                parent: None,
                kind: ScopeKind::Prelude,
                name: "prelude".into(),
                symbols: Vec::new(),
                index: HashMap::new(),
                children: Vec::new(),
            }],
        }
    }

    pub fn prelude(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn push(&mut self, parent: ScopeId, kind: ScopeKind, name: impl Into<String>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            parent: Some(parent),
            kind,
            name: name.into(),
            symbols: Vec::new(),
            index: HashMap::new(),
            children: Vec::new(),
        });
        self.scopes[parent.0].children.push(id);
        id
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0].parent
    }

    pub fn kind(&self, scope: ScopeId) -> ScopeKind {
        self.scopes[scope.0].kind
    }

    pub fn name(&self, scope: ScopeId) -> &str {
        &self.scopes[scope.0].name
    }

    pub fn children(&self, scope: ScopeId) -> &[ScopeId] {
        &self.scopes[scope.0].children
    }

    /// Add a symbol to `scope`. Fails with the earlier declaration's span if
    /// the name is already taken in that same scope. A placeholder left by an
    /// undeclared-name error is silently replaced.
    pub fn declare(&mut self, scope: ScopeId, symbol: Symbol) -> Result<(), Span> {
        let scope = &mut self.scopes[scope.0];
        if let Some(&slot) = scope.index.get(&symbol.name) {
            let existing = &mut scope.symbols[slot];
            if !existing.placeholder {
                return Err(existing.span);
            }
            *existing = symbol;
            return Ok(());
        }
        scope.index.insert(symbol.name.clone(), scope.symbols.len());
        scope.symbols.push(symbol);
        Ok(())
    }

    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let scope = &self.scopes[scope.0];
        scope.index.get(name).map(|&slot| &scope.symbols[slot])
    }

    /// The scope that binds `name` as seen from `scope`.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if self.scopes[id.0].index.contains_key(name) {
                return Some(id);
            }
            current = self.scopes[id.0].parent;
        }
        None
    }

    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        self.resolve(scope, name)
            .and_then(|owner| self.lookup_local(owner, name))
    }

    pub fn lookup_mut(&mut self, scope: ScopeId, name: &str) -> Option<&mut Symbol> {
        let owner = self.resolve(scope, name)?;
        let scope = &mut self.scopes[owner.0];
        let slot = *scope.index.get(name)?;
        Some(&mut scope.symbols[slot])
    }

    /// Symbols of one scope in declaration order.
    pub fn symbols(&self, scope: ScopeId) -> &[Symbol] {
        &self.scopes[scope.0].symbols
    }

    /// Nearest enclosing scope of `kind`, searching no further than the
    /// first function or class boundary.
    pub fn enclosing(&self, scope: ScopeId, kind: ScopeKind) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let here = self.kind(id);
            if here == kind {
                return Some(id);
            }
            if matches!(here, ScopeKind::Function | ScopeKind::Class | ScopeKind::Global) {
                return None;
            }
            current = self.parent(id);
        }
        None
    }

    /// Nearest scope that outlives loop and catch bodies: `scope` itself
    /// unless it is a loop or block.
    pub fn enclosing_owner(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        while matches!(self.kind(current), ScopeKind::Loop | ScopeKind::Block) {
            match self.parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
    }

    /// Nearest enclosing class, looking through method and loop scopes.
    pub fn enclosing_class(&self, scope: ScopeId) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if self.kind(id) == ScopeKind::Class {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Symbol {
        Symbol::new(name, SymbolRole::Variable, Span::default())
    }

    #[test]
    fn redeclaring_in_the_same_scope_fails() {
        let mut tree = ScopeTree::new();
        let global = tree.push(tree.prelude(), ScopeKind::Global, "global");
        tree.declare(global, var("x")).expect("first declaration");
        assert!(tree.declare(global, var("x")).is_err());
    }

    #[test]
    fn inner_declarations_shadow_outer_ones() {
        let mut tree = ScopeTree::new();
        let global = tree.push(tree.prelude(), ScopeKind::Global, "global");
        let function = tree.push(global, ScopeKind::Function, "f");
        tree.declare(global, var("x").with_type(Some(Type::Int)))
            .expect("outer");
        tree.declare(function, var("x").with_type(Some(Type::Text)))
            .expect("shadowing is legal");

        assert_eq!(tree.lookup(function, "x").and_then(|s| s.ty.clone()), Some(Type::Text));
        assert_eq!(tree.lookup(global, "x").and_then(|s| s.ty.clone()), Some(Type::Int));
        assert_eq!(tree.resolve(function, "x"), Some(function));
    }

    #[test]
    fn lookup_walks_out_to_the_prelude() {
        let mut tree = ScopeTree::new();
        let prelude = tree.prelude();
        tree.declare(prelude, Symbol::new("print", SymbolRole::Builtin, Span::default()))
            .expect("builtin");
        let global = tree.push(prelude, ScopeKind::Global, "global");
        let body = tree.push(global, ScopeKind::Loop, "while");
        assert_eq!(tree.resolve(body, "print"), Some(prelude));
        assert!(tree.lookup(body, "missing").is_none());
        assert_eq!(tree.children(global), &[body]);
    }

    #[test]
    fn placeholders_give_way_to_real_declarations() {
        let mut tree = ScopeTree::new();
        let global = tree.push(tree.prelude(), ScopeKind::Global, "global");
        tree.declare(global, var("x").placeholder()).expect("placeholder");
        tree.declare(global, var("x").uninitialized())
            .expect("real declaration replaces placeholder");
        let symbol = tree.lookup(global, "x").expect("declared");
        assert!(!symbol.placeholder);
        assert!(!symbol.initialized);
    }

    #[test]
    fn owner_skips_loop_and_catch_bodies() {
        let mut tree = ScopeTree::new();
        let global = tree.push(tree.prelude(), ScopeKind::Global, "global");
        let function = tree.push(global, ScopeKind::Function, "f");
        let outer = tree.push(function, ScopeKind::Loop, "while");
        let catch = tree.push(outer, ScopeKind::Block, "catch");
        assert_eq!(tree.enclosing_owner(catch), function);
        assert_eq!(tree.enclosing_owner(function), function);
        assert_eq!(tree.enclosing_owner(global), global);
    }

    #[test]
    fn loop_search_stops_at_function_boundary() {
        let mut tree = ScopeTree::new();
        let global = tree.push(tree.prelude(), ScopeKind::Global, "global");
        let outer_loop = tree.push(global, ScopeKind::Loop, "for");
        let function = tree.push(outer_loop, ScopeKind::Function, "f");
        let catch = tree.push(function, ScopeKind::Block, "catch");
        assert_eq!(tree.enclosing(catch, ScopeKind::Loop), None);
        assert_eq!(tree.enclosing(outer_loop, ScopeKind::Loop), Some(outer_loop));
    }
}
