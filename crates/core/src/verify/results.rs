/// Captured result of compiling and running one test unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The program compiled and ran; holds its standard output.
    Success { stdout: String },
    /// The program ran but exited non-zero; holds its standard output
    /// followed by its standard error and the exit status.
    Exited { output: String },
    /// The program could not be compiled or started; holds the captured
    /// standard error.
    Failure { stderr: String },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }

    /// The captured text, whichever stream it came from.
    pub fn text(&self) -> &str {
        match self {
            RunOutcome::Success { stdout } => stdout,
            RunOutcome::Exited { output } => output,
            RunOutcome::Failure { stderr } => stderr,
        }
    }
}

/// Format one results-file entry: `<transformed-path>: <output>`.
///
/// The entry always ends with a newline so appended entries stay separated.
pub fn format_result_line(transformed_path: &str, outcome: &RunOutcome) -> String {
    let mut line = format!("{}: {}", transformed_path, outcome.text());
    if !line.ends_with('\n') {
        line.push('\n');
    }
    line
}
