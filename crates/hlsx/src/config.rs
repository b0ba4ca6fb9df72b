use crate::prelude::*;
use hlsx_core::config::FileConfig;
use std::path::Path;

/// Load the settings file, or defaults when it does not exist.
///
/// A file that exists but cannot be read or parsed is an error.
pub fn load(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        log::debug!("No settings file at {}, using defaults", path.display());
        return Ok(FileConfig::default());
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file '{}'", path.display()))?;

    let config = FileConfig::from_toml_str(&text)
        .with_context(|| format!("Failed to parse settings file '{}'", path.display()))?;

    log::debug!("Loaded settings from {}", path.display());
    Ok(config)
}

/// The OpenAI API key. Only ever read from the environment.
pub fn openai_api_key() -> Result<String> {
    std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| Error::MissingApiKey.into())
}
