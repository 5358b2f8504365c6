//! Compilation driver.
//!
//! [`compile`] runs the whole pipeline on one source text: tokenize, parse,
//! analyze, generate. It never returns an error. Lexical and syntax failures
//! stop the pipeline and come back as a single fatal diagnostic; semantic
//! problems are collected and, unless [`CompileOptions::strict`] is set,
//! code is generated anyway.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info_span};

use crate::codegen::generate;
use crate::diagnostic::{DEFAULT_MAX_ERRORS, Diagnostic};
use crate::error::CoreError;
use crate::lexer::tokenize;
use crate::parser::parse;
use crate::platform::Platform;
use crate::semantic::analyze_with_limit;
use crate::sources::load_sources;

/// File name shown in diagnostics when the source did not come from disk.
pub const DEFAULT_FILE_NAME: &str = "<input>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub platform: Platform,
    /// Name used when rendering diagnostics.
    pub file_name: String,
    pub max_errors: usize,
    /// Withhold output when analysis reports errors.
    pub strict: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            platform: Platform::default(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            max_errors: DEFAULT_MAX_ERRORS,
            strict: false,
        }
    }
}

impl CompileOptions {
    pub fn for_platform(platform: Platform) -> Self {
        CompileOptions {
            platform,
            ..CompileOptions::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompilationArtifact {
    /// Generated target text. `None` after a lexical or syntax error, or in
    /// strict mode when analysis failed.
    pub output: Option<String>,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    /// Errors dropped after `max_errors` was reached.
    pub suppressed: usize,
    pub used_builtins: Vec<&'static str>,
}

impl CompilationArtifact {
    fn fatal(error: &CoreError) -> Self {
        CompilationArtifact {
            output: None,
            errors: vec![error.to_diagnostic()],
            warnings: Vec::new(),
            suppressed: 0,
            used_builtins: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.suppressed == 0
    }

    /// Errors then warnings, each rendered against `file`.
    pub fn rendered_diagnostics(&self, file: &str) -> Vec<String> {
        self.errors
            .iter()
            .chain(&self.warnings)
            .map(|d| d.render(file))
            .collect()
    }
}

pub fn compile(source: &str, options: &CompileOptions) -> CompilationArtifact {
    let span = info_span!("compile", platform = %options.platform, file = %options.file_name);
    let _guard = span.enter();

    let tokens = match tokenize(source) {
        Ok(tokens) => tokens,
        Err(err) => {
            debug!(error = %err, "tokenizer failed");
            return CompilationArtifact::fatal(&err);
        }
    };
    debug!(tokens = tokens.len(), "tokenized");

    let program = match parse(tokens) {
        Ok(program) => program,
        Err(err) => {
            debug!(error = %err, "parser failed");
            return CompilationArtifact::fatal(&err);
        }
    };
    debug!(
        imports = program.imports.len(),
        statements = program.statements.len(),
        "parsed"
    );

    let report = analyze_with_limit(&program, options.max_errors);
    debug!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        suppressed = report.suppressed,
        "analyzed"
    );

    let output = if options.strict && !report.is_success() {
        debug!("output withheld in strict mode");
        None
    } else {
        let text = generate(&program, options.platform);
        debug!(bytes = text.len(), "generated");
        Some(text)
    };

    CompilationArtifact {
        output,
        errors: report.errors,
        warnings: report.warnings,
        suppressed: report.suppressed,
        used_builtins: report.used_builtins,
    }
}

/// Compile a file from disk. Diagnostics name the file by its path.
pub fn compile_file(
    path: impl AsRef<Path>,
    options: &CompileOptions,
) -> Result<CompilationArtifact, CoreError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)?;
    let options = CompileOptions {
        file_name: path.display().to_string(),
        ..options.clone()
    };
    Ok(compile(&source, &options))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFile {
    /// Source path relative to the compiled root.
    pub path: PathBuf,
    pub artifact: CompilationArtifact,
}

impl CompiledFile {
    /// Relative path of the generated file: the source path with the
    /// platform's extension.
    pub fn output_path(&self, platform: Platform) -> PathBuf {
        self.path.with_extension(platform.file_extension())
    }
}

/// Compile every `.agk` file under `root`.
pub fn compile_tree(
    root: impl AsRef<Path>,
    options: &CompileOptions,
) -> Result<Vec<CompiledFile>, CoreError> {
    let root = root.as_ref();
    let files = load_sources(root)?;
    debug!(root = %root.display(), files = files.len(), "loaded sources");
    Ok(files
        .into_iter()
        .map(|file| {
            let options = CompileOptions {
                file_name: root.join(&file.path).display().to_string(),
                ..options.clone()
            };
            CompiledFile {
                artifact: compile(&file.contents, &options),
                path: file.path,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Category, Severity};

    const ADD: &str =
        "define function add that takes a as Integer, b as Integer and returns Integer: return a + b";

    #[test]
    fn well_typed_function_compiles_on_every_platform() {
        for platform in Platform::ALL {
            let artifact = compile(ADD, &CompileOptions::for_platform(platform));
            assert!(artifact.is_success(), "{platform}: {:?}", artifact.errors);
            let output = artifact.output.expect("output generated");
            assert!(output.contains("add("), "{platform}:\n{output}");
        }
    }

    #[test]
    fn undeclared_variable_fails_soft() {
        let artifact = compile("define function f: set x to 42 return x", &CompileOptions::default());
        assert_eq!(artifact.errors.len(), 1);
        assert!(artifact.errors[0].message.contains("'x'"));
        let output = artifact.output.expect("fail-soft output");
        assert!(!output.is_empty());
        assert!(output.contains("def f():"));
    }

    #[test]
    fn strict_mode_withholds_output() {
        let options = CompileOptions {
            strict: true,
            ..CompileOptions::default()
        };
        let artifact = compile("define function f: set x to 42 return x", &options);
        assert_eq!(artifact.errors.len(), 1);
        assert!(artifact.output.is_none());
        assert!(compile(ADD, &options).output.is_some());
    }

    #[test]
    fn bad_dedent_is_a_fatal_lexical_error() {
        let src = "define function f:\n    if x:\n        return 1\n  return 2\n";
        let artifact = compile(src, &CompileOptions::default());
        assert!(artifact.output.is_none());
        assert_eq!(artifact.errors.len(), 1);
        let error = &artifact.errors[0];
        assert_eq!(error.severity, Severity::Fatal);
        assert_eq!(error.category, Category::Lexical);
        assert_eq!(error.location.map(|s| s.line), Some(4));
        assert!(error.render("bad.agk").starts_with("[FATAL] Lexical Error at bad.agk:4:"));
    }

    #[test]
    fn syntax_errors_stop_before_analysis() {
        let artifact = compile("define function", &CompileOptions::default());
        assert!(artifact.output.is_none());
        assert_eq!(artifact.errors[0].category, Category::Syntax);
        assert_eq!(artifact.errors[0].code, Some("E0100"));
    }

    #[test]
    fn deeply_nested_input_is_reported_not_fatal_to_the_process() {
        let src = format!("print({}1{})", "(".repeat(1000), ")".repeat(1000));
        let artifact = compile(&src, &CompileOptions::default());
        assert!(artifact.output.is_none());
        assert_eq!(artifact.errors.len(), 1);
        assert_eq!(artifact.errors[0].category, Category::Syntax);
        assert_eq!(artifact.errors[0].code, Some("E0101"));
    }

    #[test]
    fn text_into_integer_is_reported() {
        let artifact = compile(
            "create total as Integer\nset total to \"hello\"",
            &CompileOptions::default(),
        );
        assert_eq!(artifact.errors.len(), 1);
        let message = &artifact.errors[0].message;
        assert!(message.contains("string") && message.contains("int"), "{message}");
    }

    #[test]
    fn used_builtins_are_reported() {
        let artifact = compile("print(len(range(3)))", &CompileOptions::default());
        assert_eq!(artifact.used_builtins, vec!["print", "len", "range"]);
    }

    #[test]
    fn compiles_a_directory_tree() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("lib")).expect("lib dir");
        std::fs::write(dir.path().join("main.agk"), "print(\"hi\")\n").expect("write main");
        std::fs::write(dir.path().join("lib/broken.agk"), "set y to 1\n").expect("write broken");

        let options = CompileOptions::for_platform(Platform::Kotlin);
        let compiled = compile_tree(dir.path(), &options).expect("tree compiles");
        assert_eq!(compiled.len(), 2);

        let broken = &compiled[0];
        assert_eq!(broken.path, PathBuf::from("lib").join("broken.agk"));
        assert_eq!(broken.output_path(Platform::Kotlin), PathBuf::from("lib").join("broken.kt"));
        assert_eq!(broken.artifact.errors.len(), 1);
        let rendered = broken.artifact.rendered_diagnostics("broken.agk");
        assert!(rendered[0].starts_with("[ERROR] Semantic Error at broken.agk:1:"));

        assert!(compiled[1].artifact.is_success());
    }

    #[test]
    fn compile_file_names_diagnostics_after_the_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("oops.agk");
        std::fs::write(&path, "print(missing)\n").expect("write");
        let artifact = compile_file(&path, &CompileOptions::default()).expect("readable");
        assert_eq!(artifact.errors.len(), 1);

        let missing = compile_file(dir.path().join("absent.agk"), &CompileOptions::default());
        assert!(matches!(missing, Err(CoreError::SourceIo(_))));
    }
}
