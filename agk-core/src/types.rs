//! Semantic types for AGK.
//!
//! Written annotations (`Integer`, `String[]`, `List<Float>`) are resolved
//! once, by [`Type::from_annotation`], so that every later comparison works
//! on canonical types. Compatibility is directional: a value may be widened
//! into a small set of other primitive types, never the other way.

use core::fmt;

use crate::ast::{BinaryOperator, LiteralValue, TypeNode, UnaryOperator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int,
    Float,
    Text,
    Bool,
    /// Result of calling a function that returns nothing.
    Void,
    /// Unknown or deliberately untyped; compatible with everything.
    Any,
    List(Box<Type>),
    Dict,
    /// Classes, interfaces and any name the compiler does not know.
    Named(String),
}

impl Type {
    /// Resolve a written annotation. Primitive aliases such as `Integer`,
    /// `int` and `INT` all land on the same type.
    pub fn from_annotation(node: &TypeNode) -> Type {
        let base = match node.name.to_lowercase().as_str() {
            "int" | "integer" => Type::Int,
            "float" => Type::Float,
            "string" | "str" | "text" => Type::Text,
            "boolean" | "bool" => Type::Bool,
            "void" => Type::Void,
            "any" => Type::Any,
            "dict" | "map" => Type::Dict,
            "list" | "array" => Type::List(Box::new(
                node.generic_args
                    .first()
                    .map(Type::from_annotation)
                    .unwrap_or(Type::Any),
            )),
            _ => Type::Named(node.name.clone()),
        };
        if node.is_array {
            Type::List(Box::new(base))
        } else {
            base
        }
    }

    pub fn of_literal(value: &LiteralValue) -> Type {
        match value {
            LiteralValue::Int(_) => Type::Int,
            LiteralValue::Float(_) => Type::Float,
            LiteralValue::Text(_) => Type::Text,
            LiteralValue::Bool(_) => Type::Bool,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Type::Any)
    }

    /// Types a value of `self` may be implicitly converted to, besides
    /// itself.
    fn widen_set(&self) -> &'static [Type] {
        match self {
            Type::Int => &[Type::Float, Type::Text],
            Type::Float => &[Type::Text],
            _ => &[],
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("int"),
            Type::Float => f.write_str("float"),
            Type::Text => f.write_str("string"),
            Type::Bool => f.write_str("boolean"),
            Type::Void => f.write_str("void"),
            Type::Any => f.write_str("any"),
            Type::List(inner) => write!(f, "{inner}[]"),
            Type::Dict => f.write_str("dict"),
            Type::Named(name) => f.write_str(name),
        }
    }
}

/// Whether a value of type `from` may be stored where `to` is expected.
pub fn is_compatible(from: &Type, to: &Type) -> bool {
    if from.is_any() || to.is_any() || from == to {
        return true;
    }
    match (from, to) {
        (Type::List(a), Type::List(b)) => is_compatible(a, b),
        _ => from.widen_set().contains(to),
    }
}

/// Result type of a binary operation, or `None` when the operand types
/// cannot be combined with `op`.
pub fn binary_result(left: &Type, op: BinaryOperator, right: &Type) -> Option<Type> {
    if op.is_arithmetic() {
        if left.is_numeric() && right.is_numeric() {
            return Some(if *left == Type::Float || *right == Type::Float {
                Type::Float
            } else {
                Type::Int
            });
        }
        let texty = |t: &Type| matches!(t, Type::Text);
        let operand = |t: &Type| t.is_numeric() || matches!(t, Type::Text | Type::Bool | Type::Any);
        if op == BinaryOperator::Add
            && (texty(left) || texty(right))
            && operand(left)
            && operand(right)
        {
            return Some(Type::Text);
        }
        if (left.is_any() || right.is_any())
            && (left.is_numeric() || right.is_numeric() || (left.is_any() && right.is_any()))
        {
            return Some(Type::Any);
        }
        return None;
    }
    if op.is_comparison() {
        return (is_compatible(left, right) || is_compatible(right, left)).then_some(Type::Bool);
    }
    let boolish = |t: &Type| matches!(t, Type::Bool | Type::Any);
    (boolish(left) && boolish(right)).then_some(Type::Bool)
}

pub fn unary_result(op: UnaryOperator, operand: &Type) -> Option<Type> {
    match op {
        UnaryOperator::Not => matches!(operand, Type::Bool | Type::Any).then_some(Type::Bool),
        UnaryOperator::Neg | UnaryOperator::Plus => {
            (operand.is_numeric() || operand.is_any()).then(|| operand.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotated(name: &str) -> Type {
        Type::from_annotation(&TypeNode::named(name))
    }

    #[test]
    fn aliases_normalize_to_one_type() {
        assert_eq!(annotated("Integer"), Type::Int);
        assert_eq!(annotated("int"), Type::Int);
        assert_eq!(annotated("String"), Type::Text);
        assert_eq!(annotated("Boolean"), Type::Bool);
        assert_eq!(annotated("Float"), Type::Float);
        assert_eq!(annotated("Shop"), Type::Named("Shop".into()));
    }

    #[test]
    fn arrays_and_lists_resolve_to_list() {
        let mut node = TypeNode::named("Integer");
        node.is_array = true;
        assert_eq!(Type::from_annotation(&node), Type::List(Box::new(Type::Int)));

        let mut generic = TypeNode::named("List");
        generic.generic_args.push(TypeNode::named("String"));
        assert_eq!(Type::from_annotation(&generic), Type::List(Box::new(Type::Text)));
    }

    #[test]
    fn compatibility_is_directional() {
        assert!(is_compatible(&Type::Int, &Type::Float));
        assert!(!is_compatible(&Type::Float, &Type::Int));
        assert!(is_compatible(&Type::Int, &Type::Text));
        assert!(is_compatible(&Type::Float, &Type::Text));
        assert!(!is_compatible(&Type::Text, &Type::Int));
        assert!(!is_compatible(&Type::Bool, &Type::Text));
        assert!(!is_compatible(&Type::Text, &Type::Bool));
        assert!(is_compatible(&Type::Any, &Type::Bool));
        assert!(is_compatible(&Type::Bool, &Type::Any));
    }

    #[test]
    fn arithmetic_widens_and_concatenates() {
        use BinaryOperator::*;
        assert_eq!(binary_result(&Type::Int, Add, &Type::Int), Some(Type::Int));
        assert_eq!(binary_result(&Type::Int, Mul, &Type::Float), Some(Type::Float));
        assert_eq!(binary_result(&Type::Text, Add, &Type::Int), Some(Type::Text));
        assert_eq!(binary_result(&Type::Text, Sub, &Type::Int), None);
        assert_eq!(binary_result(&Type::Bool, Add, &Type::Int), None);
        assert_eq!(binary_result(&Type::Any, Div, &Type::Int), Some(Type::Any));
    }

    #[test]
    fn comparisons_and_logic_yield_booleans() {
        use BinaryOperator::*;
        assert_eq!(binary_result(&Type::Float, Lt, &Type::Int), Some(Type::Bool));
        assert_eq!(binary_result(&Type::Text, Eq, &Type::Bool), None);
        assert_eq!(binary_result(&Type::Bool, And, &Type::Bool), Some(Type::Bool));
        assert_eq!(binary_result(&Type::Int, Or, &Type::Bool), None);
        assert_eq!(unary_result(UnaryOperator::Not, &Type::Int), None);
        assert_eq!(unary_result(UnaryOperator::Neg, &Type::Float), Some(Type::Float));
    }
}
