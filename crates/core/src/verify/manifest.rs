//! Verification manifests: which kernel is checked against which harness.

use serde::Deserialize;

use super::assemble::kernel_name_for_test;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Invalid manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Manifest lists no kernels")]
    Empty,

    #[error("Kernel {0} is listed more than once")]
    Duplicate(String),
}

/// One kernel paired with its test harness.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KernelCase {
    /// Kernel file name, looked up in both the original and transformed
    /// directories.
    pub source: String,
    /// Test harness file name.
    pub test: String,
    /// Kernel function base name; derived from `test` when omitted.
    #[serde(default)]
    pub function: Option<String>,
}

impl KernelCase {
    pub fn kernel_name(&self) -> String {
        self.function
            .clone()
            .unwrap_or_else(|| kernel_name_for_test(&self.test))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    #[serde(default, rename = "kernel")]
    pub kernels: Vec<KernelCase>,
}

impl Manifest {
    /// Parse a manifest of `[[kernel]]` tables.
    pub fn from_toml_str(text: &str) -> Result<Self, ManifestError> {
        let manifest: Manifest = toml::from_str(text)?;

        if manifest.kernels.is_empty() {
            return Err(ManifestError::Empty);
        }

        let mut seen = std::collections::HashSet::new();
        for case in &manifest.kernels {
            if !seen.insert(case.source.as_str()) {
                return Err(ManifestError::Duplicate(case.source.clone()));
            }
        }

        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::from_toml_str(
            r#"
[[kernel]]
source = "atax_kernel.c"
test = "test_atax.c"

[[kernel]]
source = "md_kernel.c"
test = "test_md.c"
function = "md_kernel"
"#,
        )
        .unwrap();

        assert_eq!(manifest.kernels.len(), 2);
        assert_eq!(manifest.kernels[0].kernel_name(), "kernel_atax");
        assert_eq!(manifest.kernels[1].kernel_name(), "md_kernel");
    }

    #[test]
    fn test_empty_manifest() {
        assert!(matches!(
            Manifest::from_toml_str(""),
            Err(ManifestError::Empty)
        ));
    }

    #[test]
    fn test_duplicate_kernel() {
        let result = Manifest::from_toml_str(
            r#"
[[kernel]]
source = "atax_kernel.c"
test = "test_atax.c"

[[kernel]]
source = "atax_kernel.c"
test = "test_atax_2.c"
"#,
        );
        assert!(matches!(result, Err(ManifestError::Duplicate(name)) if name == "atax_kernel.c"));
    }

    #[test]
    fn test_missing_test_field() {
        let result = Manifest::from_toml_str("[[kernel]]\nsource = \"atax_kernel.c\"\n");
        assert!(matches!(result, Err(ManifestError::Parse(_))));
    }
}
