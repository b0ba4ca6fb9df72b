#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{failed} of {total} items failed")]
    ItemsFailed { failed: usize, total: usize },

    #[error("OPENAI_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("C compiler not found on PATH: {0}")]
    CompilerNotFound(String),

    #[error("Model request failed: {0}")]
    Model(String),
}
