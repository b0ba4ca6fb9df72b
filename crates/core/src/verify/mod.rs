pub mod assemble;
pub mod manifest;
pub mod rename;
pub mod results;

pub use assemble::{assemble_test_unit, extract_main, kernel_name_for_test, TestSources};
pub use manifest::{KernelCase, Manifest, ManifestError};
pub use rename::{rename_void_functions, RenameScope};
pub use results::{format_result_line, RunOutcome};
