use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use agk_core::diagnostic::DEFAULT_MAX_ERRORS;
use agk_core::parser::parse_source;
use agk_core::printer::print_program;
use agk_core::{CompilationArtifact, CompileOptions, Platform, compile, compile_tree};
use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgAction, Parser};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod repl;

/// Compile AGK natural-language programs to other platforms.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Source file, or a directory of .agk files. Reads stdin when omitted.
    #[arg(value_name = "SOURCE")]
    source: Option<PathBuf>,

    /// Output file, or output directory for a directory source. Writes to
    /// stdout when omitted (next to each source for a directory).
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[arg(
        short,
        long,
        value_name = "NAME",
        default_value = "python",
        help = "Target platform: python, javascript, kotlin, swift, cpp, csharp"
    )]
    platform: Platform,

    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_ERRORS)]
    max_errors: usize,

    #[arg(long, help = "Do not write output when analysis reports errors")]
    strict: bool,

    #[arg(long, help = "Print the normalized AGK source instead of compiling")]
    pretty: bool,

    #[arg(long, help = "Start an interactive session")]
    repl: bool,

    #[arg(short, long, action = ArgAction::Count, help = "More log output on stderr (repeatable)")]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    execute(cli)
}

/// Logs go to stderr so generated code on stdout stays clean. `-v` flags
/// take precedence over `RUST_LOG`.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    };
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn execute(cli: Cli) -> Result<()> {
    let options = CompileOptions {
        platform: cli.platform,
        max_errors: cli.max_errors,
        strict: cli.strict,
        ..CompileOptions::default()
    };

    if cli.repl {
        let stdin = io::stdin();
        return repl::run(stdin.lock(), io::stdout(), options);
    }

    match &cli.source {
        Some(root) if root.is_dir() => {
            if cli.pretty {
                bail!("--pretty expects a single source file");
            }
            compile_directory(root, cli.output.as_deref(), &options)
        }
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read source file {}", path.display()))?;
            let options = CompileOptions {
                file_name: path.display().to_string(),
                ..options
            };
            run_single(&source, cli.output.as_deref(), &options, cli.pretty)
        }
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("failed to read source from stdin")?;
            run_single(&source, cli.output.as_deref(), &options, cli.pretty)
        }
    }
}

fn run_single(
    source: &str,
    output: Option<&Path>,
    options: &CompileOptions,
    pretty: bool,
) -> Result<()> {
    if pretty {
        let program = parse_source(source).map_err(|err| anyhow!("{}: {err}", options.file_name))?;
        return emit(output, &print_program(&program));
    }

    let artifact = compile(source, options);
    report(&artifact, &options.file_name);
    if let Some(text) = &artifact.output {
        emit(output, text)?;
    }
    if !artifact.is_success() {
        bail!("{}", failure_summary(&artifact));
    }
    Ok(())
}

fn compile_directory(root: &Path, output: Option<&Path>, options: &CompileOptions) -> Result<()> {
    let compiled = compile_tree(root, options)
        .with_context(|| format!("failed to compile sources under {}", root.display()))?;
    if compiled.is_empty() {
        bail!("no .agk files found under {}", root.display());
    }
    let out_root = output.unwrap_or(root);
    let mut failed = 0;
    for file in &compiled {
        let source_path = root.join(&file.path);
        report(&file.artifact, &source_path.display().to_string());
        if let Some(text) = &file.artifact.output {
            let target = out_root.join(file.output_path(options.platform));
            write_output(&target, text)?;
            info!(path = %target.display(), "wrote output");
        }
        if !file.artifact.is_success() {
            failed += 1;
        }
    }
    debug!(files = compiled.len(), failed, "directory compiled");
    if failed > 0 {
        bail!("{failed} of {} files failed to compile", compiled.len());
    }
    Ok(())
}

fn report(artifact: &CompilationArtifact, file: &str) {
    for rendered in artifact.rendered_diagnostics(file) {
        eprintln!("{rendered}");
    }
    if artifact.suppressed > 0 {
        eprintln!("... {} more errors not shown", artifact.suppressed);
    }
}

fn failure_summary(artifact: &CompilationArtifact) -> String {
    let count = artifact.errors.len() + artifact.suppressed;
    let noun = if count == 1 { "error" } else { "errors" };
    format!("compilation failed with {count} {noun}")
}

fn emit(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => write_output(path, text),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

fn write_output(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    fs::write(path, text).with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_cmd::Command;
    use predicates::prelude::*;
    use tempfile::tempdir;

    const ADD: &str =
        "define function add that takes a as Integer, b as Integer and returns Integer: return a + b\n";

    fn agk() -> Command {
        Command::cargo_bin("agk-cli").expect("binary exists")
    }

    #[test]
    fn compiles_to_stdout_by_default() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("add.agk");
        fs::write(&input_path, ADD).expect("write input");

        agk()
            .arg(&input_path)
            .assert()
            .success()
            .stdout(predicate::str::contains("def add(a: int, b: int) -> int:"));
    }

    #[test]
    fn writes_output_file_for_platform() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("add.agk");
        fs::write(&input_path, ADD).expect("write input");
        let output_path = dir.path().join("out/add.cpp");

        agk()
            .arg(&input_path)
            .arg(&output_path)
            .arg("--platform")
            .arg("c++")
            .assert()
            .success();

        let code = fs::read_to_string(&output_path).expect("read output");
        assert!(code.contains("int add(int a, int b) {"));
        assert!(code.contains("int main(int argc, char** argv) {"));
    }

    #[test]
    fn semantic_errors_fail_but_still_emit() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("f.agk");
        fs::write(&input_path, "define function f: set x to 42 return x\n").expect("write input");
        let output_path = dir.path().join("f.py");

        agk()
            .arg(&input_path)
            .arg(&output_path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("[ERROR] Semantic Error at"))
            .stderr(predicate::str::contains("variable 'x' is not declared"))
            .stderr(predicate::str::contains("Suggestion:"))
            .stderr(predicate::str::contains("compilation failed with 1 error"));

        assert!(output_path.exists(), "fail-soft output was not written");
    }

    #[test]
    fn strict_mode_writes_nothing() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("f.agk");
        fs::write(&input_path, "print(missing)\n").expect("write input");
        let output_path = dir.path().join("f.py");

        agk()
            .arg(&input_path)
            .arg(&output_path)
            .arg("--strict")
            .assert()
            .failure();

        assert!(!output_path.exists());
    }

    #[test]
    fn reports_indentation_errors() {
        let dir = tempdir().expect("tempdir");
        let input_path = dir.path().join("bad.agk");
        fs::write(
            &input_path,
            "define function f:\n    if x:\n        return 1\n  return 2\n",
        )
        .expect("write input");

        agk()
            .arg(&input_path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("[FATAL] Lexical Error at"))
            .stderr(predicate::str::contains(":4:"));
    }

    #[test]
    fn rejects_unknown_platform() {
        agk()
            .arg("--platform")
            .arg("cobol")
            .write_stdin("print(1)\n")
            .assert()
            .failure()
            .stderr(predicate::str::contains("unsupported target platform"));
    }

    #[test]
    fn reads_stdin_when_no_source_given() {
        agk()
            .arg("--platform")
            .arg("swift")
            .write_stdin("print(\"hi\")\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("print(\"hi\")"))
            .stdout(predicate::str::contains("import WatchKit"));
    }

    #[test]
    fn compiles_directories_file_by_file() {
        let dir = tempdir().expect("tempdir");
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("nested")).expect("create dirs");
        fs::write(src.join("main.agk"), "print(1)\n").expect("write main");
        fs::write(src.join("nested/add.agk"), ADD).expect("write nested");
        let out = dir.path().join("out");

        agk()
            .arg(&src)
            .arg(&out)
            .arg("-p")
            .arg("js")
            .assert()
            .success();

        assert!(out.join("main.js").exists());
        let nested = fs::read_to_string(out.join("nested/add.js")).expect("nested output");
        assert!(nested.contains("function add(a, b) {"));
    }

    #[test]
    fn pretty_prints_normalized_source() {
        agk()
            .arg("--pretty")
            .write_stdin("create x as Integer = 1\nif x is less than 2:\n    print(x)\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("if x < 2:"));
    }

    #[test]
    fn repl_compiles_lines() {
        agk()
            .arg("--repl")
            .write_stdin("print(2)\nquit\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("agk> "))
            .stdout(predicate::str::contains("print(2)"));
    }
}
