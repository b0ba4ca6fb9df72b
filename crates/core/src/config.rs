//! Settings file (`hlsx.toml`) schema.
//!
//! Every field is optional: command-line flags and environment variables
//! take precedence, and unset values fall back to built-in defaults.

use std::path::PathBuf;

use serde::Deserialize;

use crate::verify::RenameScope;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    Ollama,
}

/// What to do when a model response has no fenced C block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingBlockPolicy {
    /// Log the response, write nothing, continue with the next file.
    #[default]
    Skip,
    /// Abort the run.
    Fail,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSection {
    pub provider: Option<Provider>,
    pub models: Option<Vec<String>>,
    pub base_url: Option<String>,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformSection {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub prompts: Option<Vec<String>>,
    pub template: Option<PathBuf>,
    pub reports: Option<PathBuf>,
    pub runs: Option<u32>,
    pub on_missing_block: Option<MissingBlockPolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifySection {
    pub manifest: Option<PathBuf>,
    pub original: Option<PathBuf>,
    pub transformed: Option<Vec<PathBuf>>,
    pub tests: Option<PathBuf>,
    pub results: Option<PathBuf>,
    pub compiler: Option<String>,
    pub rename: Option<RenameScope>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub model: ModelSection,
    #[serde(default)]
    pub transform: TransformSection,
    #[serde(default)]
    pub verify: VerifySection,
}

impl FileConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
