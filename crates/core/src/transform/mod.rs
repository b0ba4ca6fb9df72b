pub mod prompt;
pub mod report;
pub mod response;
pub mod types;

pub use prompt::{build_prompt, BUILTIN_PROMPTS};
pub use report::extract_performance_table;
pub use response::{annotate, extract, parse_response, AnnotatedOutput, Extraction, ExtractionFailure};
pub use types::{PromptTemplate, SourceFile, TemplateError};
