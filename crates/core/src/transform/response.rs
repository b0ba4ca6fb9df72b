use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

/// Prefix applied to every commentary line in the annotated output.
pub const COMMENT_PREFIX: &str = "// ";

/// Failure to find a fenced C block in a model response.
///
/// Carries the full, untouched response so the caller can surface it for
/// manual inspection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Code block not found in the response for {file_name}")]
pub struct ExtractionFailure {
    pub file_name: String,
    pub response: String,
}

/// The three parts of a model response around its first fenced C block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Commentary before the opening fence, trimmed.
    pub before: String,
    /// Code body between the fences, verbatim.
    pub code: String,
    /// Commentary after the closing fence, trimmed.
    pub after: String,
}

/// Text written to disk for a transformed kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedOutput {
    text: String,
    code: Range<usize>,
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        // Opening and closing fences must each occupy a whole line. The body
        // group is optional so that an empty block still matches.
        Regex::new(r"(?m)^```c[ \t]*\n(?:([\s\S]*?)\n)?```[ \t]*$")
            .expect("fence pattern is valid")
    })
}

/// Locate the first fenced C block in `response`.
///
/// The first closing fence after the opening fence ends the block, even if
/// more fenced blocks follow.
pub fn extract(response: &str) -> Option<Extraction> {
    let captures = fence_regex().captures(response)?;
    let whole = captures.get(0)?;
    let code = captures.get(1).map(|m| m.as_str()).unwrap_or_default();

    Some(Extraction {
        before: response[..whole.start()].trim().to_string(),
        code: code.to_string(),
        after: response[whole.end()..].trim().to_string(),
    })
}

/// Extract and annotate a model response produced for `file_name`.
pub fn parse_response(file_name: &str, response: &str) -> Result<AnnotatedOutput, ExtractionFailure> {
    match extract(response) {
        Some(extraction) => Ok(annotate(&extraction)),
        None => Err(ExtractionFailure {
            file_name: file_name.to_string(),
            response: response.to_string(),
        }),
    }
}

fn comment_lines(text: &str) -> String {
    text.split('\n')
        .map(|line| format!("{COMMENT_PREFIX}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render an extraction as commented code.
///
/// Leading commentary comes first, then the code body verbatim, then the
/// trailing commentary. Empty commentary parts leave no trace.
pub fn annotate(extraction: &Extraction) -> AnnotatedOutput {
    let mut text = String::new();

    if !extraction.before.is_empty() {
        text.push_str(&comment_lines(&extraction.before));
        text.push('\n');
    }

    let start = text.len();
    text.push_str(&extraction.code);
    let end = text.len();

    if !extraction.after.is_empty() {
        text.push('\n');
        text.push_str(&comment_lines(&extraction.after));
    }

    AnnotatedOutput {
        text,
        code: start..end,
    }
}

impl AnnotatedOutput {
    /// The full text to persist.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// The code body exactly as it appeared between the fences.
    pub fn code(&self) -> &str {
        &self.text[self.code.clone()]
    }

    /// Leading and trailing commentary with the comment prefix removed.
    pub fn commentary(&self) -> (String, String) {
        let strip = |part: &str| {
            part.split('\n')
                .map(|line| line.strip_prefix(COMMENT_PREFIX).unwrap_or(line))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let before = self.text[..self.code.start]
            .strip_suffix('\n')
            .unwrap_or_default();
        let after = self.text[self.code.end..]
            .strip_prefix('\n')
            .unwrap_or_default();

        (strip(before), strip(after))
    }
}

impl std::fmt::Display for AnnotatedOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_commentary() {
        let output = parse_response("k.c", "Explanation.\n```c\nint x = 1;\n```\n").unwrap();
        assert_eq!(output.as_str(), "// Explanation.\nint x = 1;");
    }

    #[test]
    fn test_trailing_commentary() {
        let output = parse_response("k.c", "```c\nvoid f(){}\n```\nDone.").unwrap();
        assert_eq!(output.as_str(), "void f(){}\n// Done.");
    }

    #[test]
    fn test_no_code_block() {
        let err = parse_response("gemm_kernel.c", "no code here").unwrap_err();
        assert_eq!(err.file_name, "gemm_kernel.c");
        assert_eq!(err.response, "no code here");
        assert_eq!(
            err.to_string(),
            "Code block not found in the response for gemm_kernel.c"
        );
    }

    #[test]
    fn test_fence_only_is_verbatim() {
        let code = "void kernel(int n, double a[n])\n{\n  for (int i = 0; i < n; i++)\n    a[i] = 0.0;\n}";
        let response = format!("```c\n{code}\n```");
        let output = parse_response("k.c", &response).unwrap();
        assert_eq!(output.as_str(), code);
    }

    #[test]
    fn test_multiline_commentary_is_prefixed_per_line() {
        let response = "Here is the code.\nIt is tiled.\n\n```c\nint a;\n```\n\n1. Tiling\n2. Fusion\n";
        let output = parse_response("k.c", response).unwrap();
        assert_eq!(
            output.as_str(),
            "// Here is the code.\n// It is tiled.\nint a;\n// 1. Tiling\n// 2. Fusion"
        );
    }

    #[test]
    fn test_blank_commentary_lines_keep_prefix() {
        let response = "First.\n\nSecond.\n```c\nint a;\n```";
        let output = parse_response("k.c", response).unwrap();
        assert_eq!(output.as_str(), "// First.\n// \n// Second.\nint a;");
    }

    #[test]
    fn test_first_block_wins() {
        let response = "```c\nint first;\n```\nAnd another:\n```c\nint second;\n```";
        let extraction = extract(response).unwrap();
        assert_eq!(extraction.code, "int first;");
        assert_eq!(extraction.after, "And another:\n```c\nint second;\n```");
    }

    #[test]
    fn test_code_whitespace_is_preserved() {
        let code = "\n  for (i = 0; i < 4; i++) {\t\n      a[i] = 0;   \n  }\n\n";
        let response = format!("Intro\n```c\n{code}\n```\nOutro");
        let output = parse_response("k.c", &response).unwrap();
        assert_eq!(output.code(), code);
        assert_eq!(output.as_str(), format!("// Intro\n{code}\n// Outro"));
    }

    #[test]
    fn test_other_language_fences_are_ignored() {
        assert!(extract("```python\nprint(1)\n```").is_none());
        assert!(extract("```cpp\nint x;\n```").is_none());
    }

    #[test]
    fn test_inline_fence_marker_is_not_a_fence() {
        assert!(extract("see ```c\nint x;\n```").is_none());
        assert!(extract("```c\nint x;\n``` trailing").is_none());
    }

    #[test]
    fn test_empty_block() {
        let extraction = extract("Nothing to change.\n```c\n```").unwrap();
        assert_eq!(extraction.code, "");
        assert_eq!(extraction.before, "Nothing to change.");
    }

    #[test]
    fn test_fence_with_trailing_spaces() {
        let extraction = extract("```c  \nint x;\n```  \n").unwrap();
        assert_eq!(extraction.code, "int x;");
    }

    #[test]
    fn test_round_trip_recovers_code_and_commentary() {
        let code = "// existing comment\nvoid k() {\n#pragma ACCEL PIPELINE\n  return;\n}";
        let response = format!("Before one.\nBefore two.\n```c\n{code}\n```\nAfter.");
        let output = parse_response("k.c", &response).unwrap();

        assert_eq!(output.code(), code);
        assert_eq!(
            output.commentary(),
            ("Before one.\nBefore two.".to_string(), "After.".to_string())
        );
    }

    #[test]
    fn test_round_trip_without_commentary() {
        let output = parse_response("k.c", "```c\nint y = 2;\n```").unwrap();
        assert_eq!(output.code(), "int y = 2;");
        assert_eq!(output.commentary(), (String::new(), String::new()));
    }
}
