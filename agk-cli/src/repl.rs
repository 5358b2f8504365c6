//! Interactive loop: every input line is compiled on its own and the
//! generated code or the diagnostics are printed back.

use std::io::{BufRead, Write};

use agk_core::builtins::BUILTINS;
use agk_core::{CompileOptions, Platform, compile};
use anyhow::Result;

pub const PROMPT: &str = "agk> ";

pub fn run(mut input: impl BufRead, mut output: impl Write, mut options: CompileOptions) -> Result<()> {
    writeln!(output, "AGK interactive compiler ({} target)", options.platform)?;
    writeln!(output, "Type 'help' for commands, 'exit' or 'quit' to leave.")?;

    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }
        let line = line.trim();
        match line {
            "" => continue,
            "exit" | "quit" => break,
            "help" => print_help(&mut output)?,
            _ if line == "platform" || line.starts_with("platform ") => {
                let name = line.trim_start_matches("platform").trim();
                match name.parse::<Platform>() {
                    Ok(platform) => {
                        options.platform = platform;
                        writeln!(output, "target is now {platform}")?;
                    }
                    Err(err) => writeln!(output, "{err}")?,
                }
            }
            source => {
                let artifact = compile(source, &options);
                for rendered in artifact.rendered_diagnostics(&options.file_name) {
                    writeln!(output, "{rendered}")?;
                }
                if let Some(text) = artifact.output.filter(|_| artifact.errors.is_empty()) {
                    write!(output, "{text}")?;
                }
            }
        }
    }
    Ok(())
}

fn print_help(output: &mut impl Write) -> Result<()> {
    writeln!(output, "Commands:")?;
    writeln!(output, "  help             show this message")?;
    writeln!(output, "  platform <name>  switch target (python, javascript, kotlin, swift, cpp, csharp)")?;
    writeln!(output, "  exit, quit       leave")?;
    writeln!(output, "Builtins:")?;
    for builtin in BUILTINS {
        writeln!(output, "  {:<34} [{}]", builtin.usage, builtin.logical_module)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn session(script: &str) -> String {
        let mut out = Vec::new();
        run(Cursor::new(script), &mut out, CompileOptions::default()).expect("session runs");
        String::from_utf8(out).expect("utf-8 output")
    }

    #[test]
    fn compiles_each_line() {
        let out = session("print(1 + 2)\nquit\n");
        assert!(out.contains(PROMPT));
        assert!(out.contains("print(1 + 2)\n"));
    }

    #[test]
    fn reports_diagnostics_instead_of_code() {
        let out = session("print(missing)\n");
        assert!(out.contains("[ERROR] Semantic Error at <input>:1:7"));
        assert!(!out.contains("#!/usr/bin/env python3"));
    }

    #[test]
    fn switches_platform() {
        let out = session("platform js\nprint(1)\nplatform cobol\n");
        assert!(out.contains("target is now javascript"));
        assert!(out.contains("console.log(1);"));
        assert!(out.contains("unsupported target platform: cobol"));
    }

    #[test]
    fn names_starting_with_platform_are_source() {
        let out = session("platform_count = 1\n");
        assert!(!out.contains("unsupported target platform"), "{out}");
        assert!(out.contains("[ERROR] Semantic Error at <input>:1:1"), "{out}");
        assert!(out.contains("platform_count"), "{out}");

        let out = session("platform\n");
        assert!(out.contains("unsupported target platform: "), "{out}");
    }

    #[test]
    fn help_lists_builtins() {
        let out = session("help\nexit\n");
        for builtin in BUILTINS {
            assert!(out.contains(builtin.usage));
        }
    }
}
