use crate::prelude::*;
use hlsx_core::verify::RunOutcome;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Compiles a C translation unit and runs the resulting program.
pub trait CompilerRunner {
    /// Returns the program's stdout once it has run, even when it exits
    /// non-zero, or the captured stderr when it cannot be compiled or
    /// started. Only errors unrelated to the compiler itself are returned as
    /// `Err`.
    fn compile_and_run(&self, source: &Path) -> Result<RunOutcome>;
}

/// Runs `<cc> <source> -o <exe> -lm` followed by `<exe>`.
#[derive(Debug, Clone)]
pub struct CcRunner {
    compiler: PathBuf,
}

impl CcRunner {
    /// Resolve `compiler` on `PATH`.
    pub fn locate(compiler: &str) -> Result<Self> {
        let compiler =
            which::which(compiler).map_err(|_| Error::CompilerNotFound(compiler.to_string()))?;
        log::debug!("Using C compiler {}", compiler.display());
        Ok(Self { compiler })
    }
}

/// Program stdout, then stderr, then the exit status line.
fn exited_text(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(&format!("test program exited with {}\n", output.status));
    text
}

fn failure_text(what: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.trim().is_empty() {
        format!("{} exited with {}\n", what, output.status)
    } else {
        stderr.into_owned()
    }
}

impl CompilerRunner for CcRunner {
    fn compile_and_run(&self, source: &Path) -> Result<RunOutcome> {
        // The executable lives and dies with this directory.
        let work_dir = tempfile::Builder::new()
            .prefix("hlsx-run")
            .tempdir()
            .context("Failed to create a temporary directory for the test program")?;
        let executable = work_dir.path().join("test_program");

        let compiled = Command::new(&self.compiler)
            .arg(source)
            .arg("-o")
            .arg(&executable)
            .arg("-lm")
            .output();

        let compiled = match compiled {
            Ok(output) => output,
            Err(e) => {
                return Ok(RunOutcome::Failure {
                    stderr: format!("Failed to run {}: {}\n", self.compiler.display(), e),
                })
            }
        };

        if !compiled.status.success() {
            return Ok(RunOutcome::Failure {
                stderr: failure_text("compiler", &compiled),
            });
        }

        let ran = match Command::new(&executable).output() {
            Ok(output) => output,
            Err(e) => {
                return Ok(RunOutcome::Failure {
                    stderr: format!("Failed to run test program: {}\n", e),
                })
            }
        };

        if !ran.status.success() {
            return Ok(RunOutcome::Exited {
                output: exited_text(&ran),
            });
        }

        Ok(RunOutcome::Success {
            stdout: String::from_utf8_lossy(&ran.stdout).into_owned(),
        })
    }
}
