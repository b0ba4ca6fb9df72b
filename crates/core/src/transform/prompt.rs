use super::types::{PromptTemplate, TemplateError};

const CODE_SLOT: &str = "{code}";
const REPORT_SLOT: &str = "{merlin_table}";

const PROMPT_1: &str = "
Here is a C code snippet:
{code}

Apply code transformations such as loop permutation, loop tiling, loop distribution, or loop fusion to optimize this code for HLS. Provide the transformed code using markdown code block syntax and explain the rationale behind each transformation.
";

const PROMPT_1_1: &str = "
Here is a C code snippet:
{code}

Apply code transformations such as loop permutation, loop tiling, loop distribution, or loop fusion to optimize this code for HLS. Provide the full transformed code (including all of the original pragmas) using markdown code block syntax and explain the rationale behind each transformation.
";

const PROMPT_2: &str = "
Here is a C code snippet:
{code}

Apply code transformations such as loop permutation, loop tiling, loop distribution, or loop fusion to optimize this code for HLS. Provide the full transformed code (including all of the original pragmas) using markdown code block syntax and explain the rationale behind each transformation. Please make sure that the transformed code has same functionality as the original code.
";

const PROMPT_3: &str = "
Here is a C code snippet:

{code}

Using the provided performance estimate from the merlin.rpt file below, apply code transformations such as loop permutation, loop tiling, loop distribution, or loop fusion to optimize this code for High-Level Synthesis (HLS).
Consider the impact of each transformation on the trip count (TC), accumulated cycles (AC), and cycles per call (CPC) for improved performance.
Ensure to include all of the original pragmas in the transformed code. Use markdown code block syntax to present the full transformed code and explain the rationale behind each transformation based on the performance estimates.

{merlin_table}
";

/// Names of the built-in templates, in display order.
pub const BUILTIN_PROMPTS: &[&str] = &["prompt_1", "prompt_1_1", "prompt_2", "prompt_3"];

/// Look up a built-in template by name.
pub fn builtin(name: &str) -> Result<PromptTemplate, TemplateError> {
    let body = match name {
        "prompt_1" => PROMPT_1,
        "prompt_1_1" => PROMPT_1_1,
        "prompt_2" => PROMPT_2,
        "prompt_3" => PROMPT_3,
        other => return Err(TemplateError::UnknownTemplate(other.to_string())),
    };

    Ok(PromptTemplate {
        name: name.to_string(),
        body: body.to_string(),
    })
}

/// Build a template from user-supplied text.
///
/// The text must contain the `{code}` slot.
pub fn custom(name: &str, body: String) -> Result<PromptTemplate, TemplateError> {
    if !body.contains(CODE_SLOT) {
        return Err(TemplateError::MissingCodeSlot(name.to_string()));
    }

    Ok(PromptTemplate {
        name: name.to_string(),
        body,
    })
}

impl PromptTemplate {
    /// Whether the template expects a performance report.
    pub fn needs_report(&self) -> bool {
        self.body.contains(REPORT_SLOT)
    }
}

/// Fill a template with kernel source and an optional performance report.
///
/// Both slots are substituted in a single pass so that slot markers inside
/// the kernel source or the report are left alone.
pub fn build_prompt(
    template: &PromptTemplate,
    code: &str,
    report: Option<&str>,
) -> Result<String, TemplateError> {
    if template.needs_report() && report.is_none() {
        return Err(TemplateError::MissingReport(template.name.clone()));
    }

    let mut prompt = String::with_capacity(template.body.len() + code.len());
    let mut rest = template.body.as_str();

    loop {
        let next_code = rest.find(CODE_SLOT);
        let next_report = rest.find(REPORT_SLOT);

        let (pos, slot, value) = match (next_code, next_report) {
            (Some(c), Some(r)) if r < c => (r, REPORT_SLOT, report.unwrap_or_default()),
            (Some(c), _) => (c, CODE_SLOT, code),
            (None, Some(r)) => (r, REPORT_SLOT, report.unwrap_or_default()),
            (None, None) => break,
        };

        prompt.push_str(&rest[..pos]);
        prompt.push_str(value);
        rest = &rest[pos + slot.len()..];
    }

    prompt.push_str(rest);
    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names_resolve() {
        for name in BUILTIN_PROMPTS {
            let template = builtin(name).unwrap();
            assert_eq!(template.name, *name);
            assert!(template.body.contains(CODE_SLOT));
        }
    }

    #[test]
    fn test_unknown_builtin() {
        assert_eq!(
            builtin("prompt_9"),
            Err(TemplateError::UnknownTemplate("prompt_9".to_string()))
        );
    }

    #[test]
    fn test_only_prompt_3_needs_report() {
        assert!(!builtin("prompt_1").unwrap().needs_report());
        assert!(!builtin("prompt_2").unwrap().needs_report());
        assert!(builtin("prompt_3").unwrap().needs_report());
    }

    #[test]
    fn test_build_prompt_inserts_code() {
        let template = builtin("prompt_1").unwrap();
        let prompt = build_prompt(&template, "void k() {}", None).unwrap();
        assert!(prompt.starts_with("\nHere is a C code snippet:\nvoid k() {}\n\nApply code"));
        assert!(!prompt.contains(CODE_SLOT));
    }

    #[test]
    fn test_build_prompt_with_report() {
        let template = builtin("prompt_3").unwrap();
        let prompt = build_prompt(&template, "void k() {}", Some("|kernel_k|  |10|")).unwrap();
        assert!(prompt.contains("\n\nvoid k() {}\n\nUsing the provided"));
        assert!(prompt.ends_with("estimates.\n\n|kernel_k|  |10|\n"));
    }

    #[test]
    fn test_build_prompt_requires_report() {
        let template = builtin("prompt_3").unwrap();
        assert_eq!(
            build_prompt(&template, "void k() {}", None),
            Err(TemplateError::MissingReport("prompt_3".to_string()))
        );
    }

    #[test]
    fn test_slot_markers_in_code_are_not_expanded() {
        let template = custom("mine", "A {code} B {merlin_table}".to_string()).unwrap();
        let prompt = build_prompt(&template, "x {merlin_table} y", Some("R {code}")).unwrap();
        assert_eq!(prompt, "A x {merlin_table} y B R {code}");
    }

    #[test]
    fn test_custom_template_requires_code_slot() {
        assert_eq!(
            custom("bad", "no slot here".to_string()),
            Err(TemplateError::MissingCodeSlot("bad".to_string()))
        );
    }
}
