/// A C kernel read from the input directory.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Base file name, reused for the output file.
    pub name: String,
    /// Full text content of the file.
    pub content: String,
}

/// A prompt with a `{code}` slot and an optional `{merlin_table}` slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    /// Template name, used in output directory names.
    pub name: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Unknown prompt template: {0}")]
    UnknownTemplate(String),

    #[error("Prompt template {0} has no {{code}} slot")]
    MissingCodeSlot(String),

    #[error("Prompt template {0} needs a performance report")]
    MissingReport(String),
}
