//! Target platforms and their lookup tables.
//!
//! Each platform supplies a [`PlatformTable`]: how primitive types are
//! spelled, how arrays and generic types are built, which header, import and
//! entry-point scaffold surrounds the program, and how builtin calls look.
//! Statement and expression lowering itself lives in [`crate::codegen`].

use core::fmt;
use core::str::FromStr;

use crate::ast::{Import, TypeNode};
use crate::builtins::BuiltinKind;
use crate::error::CoreError;
use crate::types::Type;

const GENERATED_BY: &str = "// Generated by AGK Compiler";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Platform {
    /// General-purpose dynamic scripting.
    #[default]
    Python,
    /// Browser scripting.
    JavaScript,
    /// Android, managed runtime.
    Kotlin,
    /// watchOS/iOS, managed runtime.
    Swift,
    /// Systems-level compiled code.
    Cpp,
    /// .NET.
    CSharp,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::Python,
        Platform::JavaScript,
        Platform::Kotlin,
        Platform::Swift,
        Platform::Cpp,
        Platform::CSharp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Platform::Python => "python",
            Platform::JavaScript => "javascript",
            Platform::Kotlin => "kotlin",
            Platform::Swift => "swift",
            Platform::Cpp => "cpp",
            Platform::CSharp => "csharp",
        }
    }

    pub fn file_extension(self) -> &'static str {
        match self {
            Platform::Python => "py",
            Platform::JavaScript => "js",
            Platform::Kotlin => "kt",
            Platform::Swift => "swift",
            Platform::Cpp => "cpp",
            Platform::CSharp => "cs",
        }
    }

    pub fn table(self) -> &'static dyn PlatformTable {
        match self {
            Platform::Python => &PythonTable,
            Platform::JavaScript => &JavaScriptTable,
            Platform::Kotlin => &KotlinTable,
            Platform::Swift => &SwiftTable,
            Platform::Cpp => &CppTable,
            Platform::CSharp => &CSharpTable,
        }
    }

    /// Whether statements end with `;`.
    pub fn uses_semicolons(self) -> bool {
        matches!(self, Platform::JavaScript | Platform::Cpp | Platform::CSharp)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "python" | "py" => Ok(Platform::Python),
            "javascript" | "js" => Ok(Platform::JavaScript),
            "kotlin" | "kt" => Ok(Platform::Kotlin),
            "swift" => Ok(Platform::Swift),
            "cpp" | "c++" => Ok(Platform::Cpp),
            "csharp" | "cs" | "c#" => Ok(Platform::CSharp),
            _ => Err(CoreError::UnsupportedPlatform(s.to_string())),
        }
    }
}

/// Fixed lines that surround the emitted program.
///
/// Lines carry their own leading whitespace. Depths are in indent units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scaffold {
    /// Opened before external wrappers, classes and functions, for
    /// platforms where free functions must live inside a type.
    pub container_open: &'static [&'static str],
    /// Depth of hoisted definitions.
    pub definition_depth: usize,
    /// Opens the entry point that holds top-level statements.
    pub entry_open: &'static [&'static str],
    /// Depth of top-level statements.
    pub entry_depth: usize,
    pub entry_close: &'static [&'static str],
}

/// Type, scaffold and builtin conventions of one target platform.
pub trait PlatformTable: Sync {
    /// Spelling of a primitive type. `None` for non-primitive types.
    fn primitive(&self, ty: &Type) -> Option<&'static str>;

    /// Spelling of an unknown or deliberately untyped value.
    fn any_type(&self) -> &'static str;

    fn array_type(&self, element: &str) -> String;

    fn generic_type(&self, base: &str, args: &[String]) -> String {
        format!("{base}<{}>", args.join(", "))
    }

    fn dict_type(&self, key: &str, value: &str) -> String;

    fn nullable_type(&self, inner: &str) -> String {
        format!("{inner}?")
    }

    /// Header comment, includes and the program's own imports.
    fn prologue(&self, imports: &[Import]) -> Vec<String>;

    fn scaffold(&self) -> Scaffold;

    /// Call of a builtin with already rendered arguments.
    fn builtin(&self, kind: BuiltinKind, args: &[String]) -> String;

    /// Spell a written annotation for this platform. Names that are neither
    /// primitive nor a known collection pass through unchanged.
    fn map_type(&self, node: &TypeNode) -> String {
        let mapped = |n: Option<&TypeNode>| match n {
            Some(n) => self.map_type(n),
            None => self.any_type().to_string(),
        };
        let base = match Type::from_annotation(&TypeNode::named(node.name.as_str())) {
            Type::Any => self.any_type().to_string(),
            Type::List(_) => self.array_type(&mapped(node.generic_args.first())),
            Type::Dict => self.dict_type(&mapped(node.generic_args.first()), &mapped(node.generic_args.get(1))),
            ty => match self.primitive(&ty) {
                Some(name) => name.to_string(),
                None if node.generic_args.is_empty() => node.name.clone(),
                None => {
                    let args: Vec<String> = node.generic_args.iter().map(|a| self.map_type(a)).collect();
                    self.generic_type(&node.name, &args)
                }
            },
        };
        let base = if node.is_array { self.array_type(&base) } else { base };
        if node.is_nullable { self.nullable_type(&base) } else { base }
    }
}

/// Wrap a rendered argument so a postfix member access binds to all of it.
fn receiver(arg: &str) -> String {
    let simple = !arg.contains(' ') && !arg.starts_with(['-', '!', '+']);
    if simple { arg.to_string() } else { format!("({arg})") }
}

fn arg_or<'a>(args: &'a [String], index: usize, default: &'a str) -> &'a str {
    args.get(index).map(String::as_str).unwrap_or(default)
}

/// Start and end of a `range(...)` call; a single argument is the end.
fn range_bounds(args: &[String]) -> (&str, &str) {
    match args {
        [end] => ("0", end.as_str()),
        [start, end, ..] => (start.as_str(), end.as_str()),
        [] => ("0", "0"),
    }
}

// ---------------------------------------------------------------------
// Python
// ---------------------------------------------------------------------

pub struct PythonTable;

impl PlatformTable for PythonTable {
    fn primitive(&self, ty: &Type) -> Option<&'static str> {
        match ty {
            Type::Int => Some("int"),
            Type::Float => Some("float"),
            Type::Text => Some("str"),
            Type::Bool => Some("bool"),
            Type::Void => Some("None"),
            _ => None,
        }
    }

    fn any_type(&self) -> &'static str {
        "Any"
    }

    fn array_type(&self, element: &str) -> String {
        format!("List[{element}]")
    }

    fn generic_type(&self, base: &str, args: &[String]) -> String {
        format!("{base}[{}]", args.join(", "))
    }

    fn dict_type(&self, key: &str, value: &str) -> String {
        format!("Dict[{key}, {value}]")
    }

    fn nullable_type(&self, inner: &str) -> String {
        format!("Optional[{inner}]")
    }

    fn prologue(&self, imports: &[Import]) -> Vec<String> {
        let mut lines = vec![
            "#!/usr/bin/env python3".to_string(),
            "\"\"\"Generated by AGK Compiler\"\"\"".to_string(),
            "from typing import Any, Dict, List, Optional".to_string(),
        ];
        for import in imports {
            let alias = import
                .alias
                .as_ref()
                .map(|a| format!(" as {a}"))
                .unwrap_or_default();
            if import.names.is_empty() {
                lines.push(format!("import {}{alias}", import.module));
            } else {
                lines.push(format!("from {} import {}{alias}", import.module, import.names.join(", ")));
            }
        }
        lines.push(String::new());
        lines
    }

    fn scaffold(&self) -> Scaffold {
        Scaffold {
            container_open: &[],
            definition_depth: 0,
            entry_open: &[],
            entry_depth: 0,
            entry_close: &[],
        }
    }

    fn builtin(&self, kind: BuiltinKind, args: &[String]) -> String {
        let joined = args.join(", ");
        match kind {
            BuiltinKind::Print => format!("print({joined})"),
            BuiltinKind::Length => format!("len({joined})"),
            BuiltinKind::Range => format!("range({joined})"),
            BuiltinKind::Input => format!("input({joined})"),
            BuiltinKind::ToText => format!("str({joined})"),
            BuiltinKind::ToInteger => format!("int({joined})"),
            BuiltinKind::ToFloat => format!("float({joined})"),
        }
    }
}

// ---------------------------------------------------------------------
// JavaScript
// ---------------------------------------------------------------------

pub struct JavaScriptTable;

impl PlatformTable for JavaScriptTable {
    fn primitive(&self, ty: &Type) -> Option<&'static str> {
        match ty {
            Type::Int | Type::Float => Some("number"),
            Type::Text => Some("string"),
            Type::Bool => Some("boolean"),
            Type::Void => Some("void"),
            _ => None,
        }
    }

    fn any_type(&self) -> &'static str {
        "any"
    }

    fn array_type(&self, element: &str) -> String {
        format!("{element}[]")
    }

    fn dict_type(&self, key: &str, value: &str) -> String {
        format!("Map<{key}, {value}>")
    }

    fn nullable_type(&self, inner: &str) -> String {
        format!("?{inner}")
    }

    fn prologue(&self, imports: &[Import]) -> Vec<String> {
        let mut lines = vec![
            GENERATED_BY.to_string(),
            String::new(),
            "// JavaScript platform imports".to_string(),
        ];
        for import in imports {
            let module = &import.module;
            if module.starts_with("wearable") {
                lines.push(format!("// Wearable API: {module}"));
            } else if module.starts_with("tv") {
                lines.push(format!("// TV API: {module}"));
            } else if module.starts_with("automotive") {
                lines.push(format!("// Automotive API: {module}"));
            } else {
                lines.push(format!("// import {module}"));
            }
        }
        lines.push(String::new());
        lines
    }

    fn scaffold(&self) -> Scaffold {
        Scaffold {
            container_open: &[],
            definition_depth: 0,
            entry_open: &["// JavaScript platform setup", "window.addEventListener('load', function() {"],
            entry_depth: 1,
            entry_close: &["});"],
        }
    }

    fn builtin(&self, kind: BuiltinKind, args: &[String]) -> String {
        let joined = args.join(", ");
        match kind {
            BuiltinKind::Print => format!("console.log({joined})"),
            BuiltinKind::Length => format!("{}.length", receiver(arg_or(args, 0, "[]"))),
            BuiltinKind::Range => {
                let (start, end) = range_bounds(args);
                if start == "0" {
                    format!("Array.from({{ length: {end} }}, (_, i) => i)")
                } else {
                    format!("Array.from({{ length: ({end}) - ({start}) }}, (_, i) => ({start}) + i)")
                }
            }
            BuiltinKind::Input => format!("prompt({joined})"),
            BuiltinKind::ToText => format!("String({joined})"),
            BuiltinKind::ToInteger => format!("Number.parseInt({joined}, 10)"),
            BuiltinKind::ToFloat => format!("Number.parseFloat({joined})"),
        }
    }
}

// ---------------------------------------------------------------------
// Kotlin
// ---------------------------------------------------------------------

pub struct KotlinTable;

impl PlatformTable for KotlinTable {
    fn primitive(&self, ty: &Type) -> Option<&'static str> {
        match ty {
            Type::Int => Some("Int"),
            Type::Float => Some("Float"),
            Type::Text => Some("String"),
            Type::Bool => Some("Boolean"),
            Type::Void => Some("Unit"),
            _ => None,
        }
    }

    fn any_type(&self) -> &'static str {
        "Any"
    }

    fn array_type(&self, element: &str) -> String {
        format!("MutableList<{element}>")
    }

    fn dict_type(&self, key: &str, value: &str) -> String {
        format!("MutableMap<{key}, {value}>")
    }

    fn prologue(&self, imports: &[Import]) -> Vec<String> {
        let mut lines = vec![
            GENERATED_BY.to_string(),
            String::new(),
            "// Kotlin platform imports".to_string(),
            "import android.os.Bundle".to_string(),
            "import androidx.appcompat.app.AppCompatActivity".to_string(),
        ];
        for import in imports {
            if import.module.starts_with("wearable") {
                lines.push(format!("// Wearable API: {}", import.module));
            } else if import.names.is_empty() {
                lines.push(format!("import {}.*", import.module));
            } else {
                for name in &import.names {
                    lines.push(format!("import {}.{name}", import.module));
                }
            }
        }
        lines.push(String::new());
        lines
    }

    fn scaffold(&self) -> Scaffold {
        Scaffold {
            container_open: &[],
            definition_depth: 0,
            entry_open: &[
                "// Kotlin platform setup",
                "class MainActivity : AppCompatActivity() {",
                "    override fun onCreate(savedInstanceState: Bundle?) {",
                "        super.onCreate(savedInstanceState)",
            ],
            entry_depth: 2,
            entry_close: &["    }", "}"],
        }
    }

    fn builtin(&self, kind: BuiltinKind, args: &[String]) -> String {
        match kind {
            BuiltinKind::Print => match args {
                [] => "println()".to_string(),
                [single] => format!("println({single})"),
                many => format!("println(listOf({}).joinToString(\" \"))", many.join(", ")),
            },
            BuiltinKind::Length => format!("{}.count()", receiver(arg_or(args, 0, "\"\""))),
            BuiltinKind::Range => {
                let (start, end) = range_bounds(args);
                format!("({start} until {end}).toList()")
            }
            BuiltinKind::Input => match args.first() {
                Some(prompt) => format!("run {{ print({prompt}); readln() }}"),
                None => "readln()".to_string(),
            },
            BuiltinKind::ToText => format!("{}.toString()", receiver(arg_or(args, 0, "\"\""))),
            BuiltinKind::ToInteger => format!("{}.toString().toInt()", receiver(arg_or(args, 0, "0"))),
            BuiltinKind::ToFloat => format!("{}.toString().toFloat()", receiver(arg_or(args, 0, "0"))),
        }
    }
}

// ---------------------------------------------------------------------
// Swift
// ---------------------------------------------------------------------

pub struct SwiftTable;

impl PlatformTable for SwiftTable {
    fn primitive(&self, ty: &Type) -> Option<&'static str> {
        match ty {
            Type::Int => Some("Int"),
            Type::Float => Some("Float"),
            Type::Text => Some("String"),
            Type::Bool => Some("Bool"),
            Type::Void => Some("Void"),
            _ => None,
        }
    }

    fn any_type(&self) -> &'static str {
        "Any"
    }

    fn array_type(&self, element: &str) -> String {
        format!("[{element}]")
    }

    fn dict_type(&self, key: &str, value: &str) -> String {
        format!("[{key}: {value}]")
    }

    fn prologue(&self, imports: &[Import]) -> Vec<String> {
        let mut lines = vec![
            GENERATED_BY.to_string(),
            String::new(),
            "// Swift platform imports".to_string(),
            "import Foundation".to_string(),
            "import WatchKit".to_string(),
        ];
        let mut seen = Vec::new();
        for import in imports {
            let module = import.module.split('.').next().unwrap_or(&import.module);
            if !seen.contains(&module) {
                seen.push(module);
                lines.push(format!("import {module}"));
            }
        }
        lines.push(String::new());
        lines
    }

    fn scaffold(&self) -> Scaffold {
        Scaffold {
            container_open: &[],
            definition_depth: 0,
            entry_open: &[
                "// Swift platform setup",
                "class MainInterfaceController: WKInterfaceController {",
                "    override func awake(withContext context: Any?) {",
                "        super.awake(withContext: context)",
            ],
            entry_depth: 2,
            entry_close: &["    }", "}"],
        }
    }

    fn builtin(&self, kind: BuiltinKind, args: &[String]) -> String {
        let joined = args.join(", ");
        match kind {
            BuiltinKind::Print => format!("print({joined})"),
            BuiltinKind::Length => format!("{}.count", receiver(arg_or(args, 0, "\"\""))),
            BuiltinKind::Range => {
                let (start, end) = range_bounds(args);
                format!("Array({start}..<{end})")
            }
            BuiltinKind::Input => match args.first() {
                Some(prompt) => format!(
                    "{{ print({prompt}, terminator: \"\"); return readLine() ?? \"\" }}()"
                ),
                None => "(readLine() ?? \"\")".to_string(),
            },
            BuiltinKind::ToText => format!("String(describing: {joined})"),
            BuiltinKind::ToInteger => format!("(Int(\"\\({joined})\") ?? 0)"),
            BuiltinKind::ToFloat => format!("(Float(\"\\({joined})\") ?? 0)"),
        }
    }
}

// ---------------------------------------------------------------------
// C++
// ---------------------------------------------------------------------

pub struct CppTable;

impl PlatformTable for CppTable {
    fn primitive(&self, ty: &Type) -> Option<&'static str> {
        match ty {
            Type::Int => Some("int"),
            Type::Float => Some("float"),
            Type::Text => Some("std::string"),
            Type::Bool => Some("bool"),
            Type::Void => Some("void"),
            _ => None,
        }
    }

    fn any_type(&self) -> &'static str {
        "auto"
    }

    fn array_type(&self, element: &str) -> String {
        format!("std::vector<{}>", self.storable(element))
    }

    fn generic_type(&self, base: &str, args: &[String]) -> String {
        let args: Vec<&str> = args.iter().map(|a| self.storable(a)).collect();
        format!("{base}<{}>", args.join(", "))
    }

    fn dict_type(&self, key: &str, value: &str) -> String {
        format!("std::map<{}, {}>", self.storable(key), self.storable(value))
    }

    fn nullable_type(&self, inner: &str) -> String {
        format!("std::optional<{}>", self.storable(inner))
    }

    fn prologue(&self, imports: &[Import]) -> Vec<String> {
        let mut lines: Vec<String> = [
            GENERATED_BY,
            "#include <any>",
            "#include <iostream>",
            "#include <map>",
            "#include <optional>",
            "#include <string>",
            "#include <vector>",
            "",
            "// C++ platform includes",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        for import in imports {
            if import.module.starts_with("automotive") {
                lines.push("#include <automotive_api.h>".to_string());
            } else {
                lines.push(format!("#include \"{}.h\"", import.module.replace('.', "/")));
            }
        }
        lines.push(String::new());
        lines
    }

    fn scaffold(&self) -> Scaffold {
        Scaffold {
            container_open: &[],
            definition_depth: 0,
            entry_open: &["// C++ platform setup", "int main(int argc, char** argv) {"],
            entry_depth: 1,
            entry_close: &["    return 0;", "}"],
        }
    }

    fn builtin(&self, kind: BuiltinKind, args: &[String]) -> String {
        match kind {
            BuiltinKind::Print => {
                let mut out = String::from("std::cout");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" << \" \"");
                    }
                    out.push_str(&format!(" << {}", receiver(arg)));
                }
                out.push_str(" << std::endl");
                out
            }
            BuiltinKind::Length => format!("{}.size()", receiver(arg_or(args, 0, "std::string()"))),
            BuiltinKind::Range => {
                let (start, end) = range_bounds(args);
                format!(
                    "[&] {{ std::vector<int> r; for (int i = {start}; i < {end}; ++i) r.push_back(i); return r; }}()"
                )
            }
            BuiltinKind::Input => {
                let prompt = args
                    .first()
                    .map(|p| format!("std::cout << {p}; "))
                    .unwrap_or_default();
                format!("[&] {{ std::string line; {prompt}std::getline(std::cin, line); return line; }}()")
            }
            BuiltinKind::ToText => format!("std::to_string({})", args.join(", ")),
            BuiltinKind::ToInteger => format!("std::stoi({})", args.join(", ")),
            BuiltinKind::ToFloat => format!("std::stof({})", args.join(", ")),
        }
    }
}

impl CppTable {
    /// `auto` cannot be a template argument; containers of unknown values
    /// hold `std::any`.
    fn storable<'a>(&self, name: &'a str) -> &'a str {
        if name == "auto" { "std::any" } else { name }
    }
}

// ---------------------------------------------------------------------
// C#
// ---------------------------------------------------------------------

pub struct CSharpTable;

impl PlatformTable for CSharpTable {
    fn primitive(&self, ty: &Type) -> Option<&'static str> {
        match ty {
            Type::Int => Some("int"),
            Type::Float => Some("float"),
            Type::Text => Some("string"),
            Type::Bool => Some("bool"),
            Type::Void => Some("void"),
            _ => None,
        }
    }

    fn any_type(&self) -> &'static str {
        "object"
    }

    fn array_type(&self, element: &str) -> String {
        format!("List<{element}>")
    }

    fn dict_type(&self, key: &str, value: &str) -> String {
        format!("Dictionary<{key}, {value}>")
    }

    fn prologue(&self, imports: &[Import]) -> Vec<String> {
        let mut lines = vec![
            GENERATED_BY.to_string(),
            "using System;".to_string(),
            "using System.Collections.Generic;".to_string(),
            "using System.Linq;".to_string(),
            String::new(),
            "// C# platform imports".to_string(),
        ];
        for import in imports {
            match &import.alias {
                Some(alias) if import.names.is_empty() => {
                    lines.push(format!("using {alias} = {};", import.module));
                }
                _ => lines.push(format!("using {};", import.module)),
            }
        }
        lines.push(String::new());
        lines
    }

    fn scaffold(&self) -> Scaffold {
        Scaffold {
            container_open: &["// C# platform setup", "class Program {"],
            definition_depth: 1,
            entry_open: &["    static void Main(string[] args) {"],
            entry_depth: 2,
            entry_close: &["    }", "}"],
        }
    }

    fn builtin(&self, kind: BuiltinKind, args: &[String]) -> String {
        match kind {
            BuiltinKind::Print => match args {
                [] => "Console.WriteLine()".to_string(),
                [single] => format!("Console.WriteLine({single})"),
                many => format!("Console.WriteLine(string.Join(\" \", {}))", many.join(", ")),
            },
            BuiltinKind::Length => format!("{}.Count()", receiver(arg_or(args, 0, "\"\""))),
            BuiltinKind::Range => match args {
                [end] => format!("Enumerable.Range(0, {end}).ToList()"),
                [start, end, ..] => format!("Enumerable.Range({start}, ({end}) - ({start})).ToList()"),
                [] => "new List<int>()".to_string(),
            },
            BuiltinKind::Input => match args.first() {
                Some(prompt) => format!(
                    "((Func<string>)(() => {{ Console.Write({prompt}); return Console.ReadLine(); }}))()"
                ),
                None => "Console.ReadLine()".to_string(),
            },
            BuiltinKind::ToText => format!("Convert.ToString({})", args.join(", ")),
            BuiltinKind::ToInteger => format!("Convert.ToInt32({})", args.join(", ")),
            BuiltinKind::ToFloat => format!("Convert.ToSingle({})", args.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_aliases_parse() {
        assert_eq!("Python".parse::<Platform>().expect("python"), Platform::Python);
        assert_eq!("js".parse::<Platform>().expect("js"), Platform::JavaScript);
        assert_eq!("C++".parse::<Platform>().expect("c++"), Platform::Cpp);
        assert_eq!("c#".parse::<Platform>().expect("c#"), Platform::CSharp);
        assert!(matches!(
            "cobol".parse::<Platform>(),
            Err(CoreError::UnsupportedPlatform(name)) if name == "cobol"
        ));
        for platform in Platform::ALL {
            assert_eq!(platform.name().parse::<Platform>().expect("round trip"), platform);
        }
    }

    #[test]
    fn primitive_aliases_map_the_same_way() {
        let kotlin = Platform::Kotlin.table();
        assert_eq!(kotlin.map_type(&TypeNode::named("Integer")), "Int");
        assert_eq!(kotlin.map_type(&TypeNode::named("int")), "Int");
        assert_eq!(Platform::Cpp.table().map_type(&TypeNode::named("String")), "std::string");
        assert_eq!(Platform::Python.table().map_type(&TypeNode::named("Boolean")), "bool");
    }

    #[test]
    fn unknown_names_pass_through() {
        for platform in Platform::ALL {
            assert_eq!(platform.table().map_type(&TypeNode::named("Sensor")), "Sensor");
        }
    }

    #[test]
    fn arrays_generics_and_nullables_compose() {
        let mut node = TypeNode::named("Float");
        node.is_array = true;
        assert_eq!(Platform::Python.table().map_type(&node), "List[float]");
        assert_eq!(Platform::Swift.table().map_type(&node), "[Float]");
        assert_eq!(Platform::Cpp.table().map_type(&node), "std::vector<float>");

        let mut map = TypeNode::named("Map");
        map.generic_args = vec![TypeNode::named("String"), TypeNode::named("Integer")];
        assert_eq!(Platform::CSharp.table().map_type(&map), "Dictionary<string, int>");

        let mut list = TypeNode::named("List");
        list.generic_args = vec![TypeNode::named("Any")];
        assert_eq!(Platform::Cpp.table().map_type(&list), "std::vector<std::any>");

        let mut optional = TypeNode::named("String");
        optional.is_nullable = true;
        assert_eq!(Platform::Kotlin.table().map_type(&optional), "String?");
        assert_eq!(Platform::Python.table().map_type(&optional), "Optional[str]");

        let mut generic = TypeNode::named("Box");
        generic.generic_args = vec![TypeNode::named("Integer")];
        assert_eq!(Platform::Python.table().map_type(&generic), "Box[int]");
    }

    #[test]
    fn builtins_use_platform_spellings() {
        let args = vec!["x".to_string()];
        assert_eq!(Platform::JavaScript.table().builtin(BuiltinKind::Print, &args), "console.log(x)");
        assert_eq!(Platform::Kotlin.table().builtin(BuiltinKind::Print, &args), "println(x)");
        assert_eq!(
            Platform::Cpp.table().builtin(BuiltinKind::Print, &args),
            "std::cout << x << std::endl"
        );
        assert_eq!(Platform::CSharp.table().builtin(BuiltinKind::Print, &args), "Console.WriteLine(x)");
        assert_eq!(
            Platform::JavaScript.table().builtin(BuiltinKind::Length, &["a + b".to_string()]),
            "(a + b).length"
        );
    }

    #[test]
    fn entry_points_open_and_close() {
        let cpp = Platform::Cpp.table().scaffold();
        assert_eq!(cpp.entry_open.last(), Some(&"int main(int argc, char** argv) {"));
        assert_eq!(cpp.entry_close, &["    return 0;", "}"]);
        let python = Platform::Python.table().scaffold();
        assert!(python.entry_open.is_empty());
        assert_eq!(python.entry_depth, 0);
    }
}
