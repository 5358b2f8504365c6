//! Built-in functions visible to every AGK program.
//!
//! The analyzer predeclares these names in a prelude scope that user
//! definitions may shadow. The emitters map each [`BuiltinKind`] onto the
//! target platform's own spelling (`print`, `console.log`, `println`, ...).

use crate::types::Type;

/// Kind of builtin, used by the emitters to decide how to lower a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    /// Writes its arguments to standard output followed by a newline.
    Print,
    /// Number of elements in a list, or characters in a string.
    Length,
    /// Integers from `start` (default 0) up to but excluding `end`.
    Range,
    /// Reads one line from standard input, optionally after a prompt.
    Input,
    ToText,
    ToInteger,
    ToFloat,
}

impl BuiltinKind {
    pub fn return_type(self) -> Type {
        match self {
            BuiltinKind::Print => Type::Void,
            BuiltinKind::Length => Type::Int,
            BuiltinKind::Range => Type::List(Box::new(Type::Int)),
            BuiltinKind::Input => Type::Text,
            BuiltinKind::ToText => Type::Text,
            BuiltinKind::ToInteger => Type::Int,
            BuiltinKind::ToFloat => Type::Float,
        }
    }
}

/// Metadata about a single builtin symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinDescriptor {
    /// Name of the builtin at the AGK level (e.g., `print`).
    pub name: &'static str,

    /// Logical module the builtin belongs to. Informational; shown by the
    /// interactive help.
    pub logical_module: &'static str,

    /// One-line usage shown by the interactive help.
    pub usage: &'static str,

    pub kind: BuiltinKind,
}

/// The complete list of builtins known to the core.
pub const BUILTINS: &[BuiltinDescriptor] = &[
    BuiltinDescriptor {
        name: "print",
        logical_module: "io",
        usage: "print(value, ...)",
        kind: BuiltinKind::Print,
    },
    BuiltinDescriptor {
        name: "input",
        logical_module: "io",
        usage: "input([prompt]) -> String",
        kind: BuiltinKind::Input,
    },
    BuiltinDescriptor {
        name: "len",
        logical_module: "core",
        usage: "len(list_or_text) -> Integer",
        kind: BuiltinKind::Length,
    },
    BuiltinDescriptor {
        name: "range",
        logical_module: "core",
        usage: "range([start,] end) -> Integer[]",
        kind: BuiltinKind::Range,
    },
    BuiltinDescriptor {
        name: "to_text",
        logical_module: "convert",
        usage: "to_text(value) -> String",
        kind: BuiltinKind::ToText,
    },
    BuiltinDescriptor {
        name: "to_integer",
        logical_module: "convert",
        usage: "to_integer(value) -> Integer",
        kind: BuiltinKind::ToInteger,
    },
    BuiltinDescriptor {
        name: "to_float",
        logical_module: "convert",
        usage: "to_float(value) -> Float",
        kind: BuiltinKind::ToFloat,
    },
];

/// Look up a builtin by its AGK-level name.
///
/// The search is linear over `BUILTINS` because the table is small.
pub fn find_builtin(name: &str) -> Option<&'static BuiltinDescriptor> {
    BUILTINS.iter().find(|b| b.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_is_reachable_by_name() {
        for builtin in BUILTINS {
            assert_eq!(find_builtin(builtin.name), Some(builtin));
        }
        assert!(find_builtin("printf").is_none());
    }

    #[test]
    fn conversions_return_their_target_type() {
        assert_eq!(BuiltinKind::ToInteger.return_type(), Type::Int);
        assert_eq!(BuiltinKind::ToText.return_type(), Type::Text);
        assert_eq!(BuiltinKind::Print.return_type(), Type::Void);
    }
}
